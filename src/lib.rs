//! # iblock-models
//!
//! Lazy, cache-aware models over an iblock content store.
//!
//! - [`ElementModel`]: fields, properties and section membership, each
//!   fetched on first use and cached until refreshed.
//! - [`SectionModel`]: fields as the only lazy sub-resource.
//! - [`Query`]: fluent list/count builder scoped to the model's iblock,
//!   with two cursor strategies and optional keyed results.
//! - Partial saves driven by dotted selectors such as
//!   `"PROPERTY_VALUES.COLOR"`.
//!
//! The store itself sits behind [`IblockStore`]; [`MemoryStore`] is an
//! in-process implementation and [`InstrumentedStore`] adds tracing, metrics
//! and logging around any other.
//!
//! ```ignore
//! use iblock_models::{iblock_element, iblock_section, ElementModel, MemoryStore};
//!
//! iblock_section!(pub struct Catalog; iblock = 5);
//! iblock_element!(pub struct Product; iblock = 5; sections = Catalog);
//!
//! let store = MemoryStore::new();
//! let products = ElementModel::<Product>::query().active().limit(10).get_list(&store)?;
//! ```

pub mod config;
pub mod error;
mod macros;
pub mod metrics;
pub mod model;
pub mod query;
pub mod store;
pub mod value;

pub use config::{ModelsConfig, QueryDefaults};
pub use error::{ModelError, StoreError};
pub use model::{
    DirectSection, ElementKind, ElementModel, IblockKind, NoSections, SectionKind, SectionModel,
};
pub use query::{
    Collection, ElementQuery, FetchUsing, Navigation, Query, QueryTarget, SectionQuery, Sort,
    SortOrder,
};
pub use store::{IblockStore, InstrumentedStore, MemoryStore, StoreCall};
pub use value::{Fields, Filter, Id, Properties, PropertyValues};
