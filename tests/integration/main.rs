//! Integration tests for models and queries over the in-memory store.
//!
//! Every test seeds a fresh [`MemoryStore`](iblock_models::MemoryStore) and
//! asserts on results together with the store's call journal.

mod element_model;
mod element_query;
mod section_query;
