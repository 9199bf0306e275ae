//! Declarative macros for model kinds.

mod kinds;
