//! Query builders for element and section models.
//!
//! One generic [`Query`] carries the settings both model kinds share; the
//! kind-specific parts (row materialization, counting, a few setters) live in
//! the `element` and `section` modules. Results come back as a
//! [`Collection`], keyed or not depending on [`Query::key_by`].

pub mod collection;
pub mod criteria;
mod element;
mod execution;
mod rows;
mod section;
pub mod select;

pub use collection::Collection;
pub use criteria::{FetchUsing, Navigation, Sort, SortOrder};
pub use select::Query;

use crate::error::ModelError;
use crate::model::{ElementModel, SectionModel};
use crate::store::IblockStore;
use crate::value::Id;

/// Query over elements of kind `K`
pub type ElementQuery<K> = Query<ElementModel<K>>;

/// Query over sections of kind `K`
pub type SectionQuery<K> = Query<SectionModel<K>>;

/// Model type a [`Query`] can materialize.
///
/// Implemented by [`ElementModel`] and [`SectionModel`].
pub trait QueryTarget: Sized {
    /// Collection every query of this target is scoped to
    fn iblock_id() -> Id;

    /// Fields the `FIELDS` select marker expands to
    fn standard_fields() -> &'static [&'static str];

    /// Wildcard requesting all custom fields when property data is selected
    fn custom_fields_wildcard() -> &'static str;

    /// Value of `field` used as the key of a keyed collection
    fn key_value(&self, field: &str) -> Option<String>;

    /// Run the list primitive and build one model per row, in store order
    fn fetch_rows<S>(query: &Query<Self>, store: &S) -> Result<Vec<Self>, ModelError>
    where
        S: IblockStore + ?Sized;

    /// Count the records matching the query's filter
    fn fetch_count<S>(query: &Query<Self>, store: &S) -> Result<u64, ModelError>
    where
        S: IblockStore + ?Sized;
}
