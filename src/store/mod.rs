//! Store contract consumed by the models and queries.
//!
//! The [`IblockStore`] trait abstracts the content store's primitive
//! operations, allowing different implementations (a remote API client, a
//! database gateway, [`MemoryStore`] for tests) to be used interchangeably.
//! Every call is synchronous; cancellation and timeouts belong to the store.
//!
//! # Element count convention
//!
//! There is no dedicated element count primitive. A call to
//! [`IblockStore::element_list`] with `sort == None` must answer
//! [`ElementListing::Count`]; any call with a sort answers a row cursor.

use crate::error::StoreError;
use crate::query::criteria::{Navigation, Sort};
use crate::value::{Fields, Filter, Id, Properties, PropertyValues};

pub mod instrumented;
pub mod memory;

pub use instrumented::InstrumentedStore;
pub use memory::{MemoryStore, StoreCall};

/// One element as returned by a by-id fetch or a row-object cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementRow {
    fields: Fields,
    properties: Properties,
}

impl ElementRow {
    pub fn new(fields: Fields, properties: Properties) -> Self {
        Self { fields, properties }
    }

    /// Plain fields of the element
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Property metadata keyed by property code
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn into_parts(self) -> (Fields, Properties) {
        (self.fields, self.properties)
    }
}

/// Cursor over element list results.
///
/// Both methods read from the same position; a caller picks one style per
/// iteration (see [`FetchUsing`](crate::query::FetchUsing)).
pub trait ElementCursor {
    /// Next row as a flat field map; selected properties appear inline
    fn get_next(&mut self) -> Result<Option<Fields>, StoreError>;

    /// Next row as an object exposing fields and properties separately
    fn get_next_element(&mut self) -> Result<Option<ElementRow>, StoreError>;
}

/// Cursor over section list results
pub trait SectionCursor {
    fn fetch(&mut self) -> Result<Option<Fields>, StoreError>;
}

/// Answer of an element list call
pub enum ElementListing<'a> {
    /// Returned when the call carried no sort
    Count(u64),
    Rows(Box<dyn ElementCursor + 'a>),
}

impl std::fmt::Debug for ElementListing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementListing::Count(n) => f.debug_tuple("Count").field(n).finish(),
            ElementListing::Rows(_) => f.write_str("Rows(..)"),
        }
    }
}

/// Arguments of an element list call
#[derive(Debug, Clone, Copy)]
pub struct ElementListParams<'a> {
    /// `None` requests a count instead of rows
    pub sort: Option<&'a Sort>,
    pub filter: &'a Filter,
    pub group_by: Option<&'a [String]>,
    pub navigation: Option<&'a Navigation>,
    /// Empty means the store's default field set
    pub select: &'a [String],
}

/// Arguments of a section list call
#[derive(Debug, Clone, Copy)]
pub struct SectionListParams<'a> {
    pub sort: &'a Sort,
    pub filter: &'a Filter,
    /// Annotate each row with `ELEMENT_CNT`
    pub count_elements: bool,
    pub select: &'a [String],
    pub navigation: Option<&'a Navigation>,
}

/// Primitive operations of the content store.
///
/// Implementations must handle persistence and transport; the models only
/// sequence these calls and cache what they return.
pub trait IblockStore {
    /// Fetch one element with its properties in a single call
    ///
    /// Returns `Ok(None)` when no such element exists.
    fn element_by_id(&self, id: Id) -> Result<Option<ElementRow>, StoreError>;

    /// Ids of all sections an element belongs to
    ///
    /// With `ids_only` the store answers bare ids rather than section records.
    fn element_groups(&self, element_id: Id, ids_only: bool) -> Result<Vec<Id>, StoreError>;

    /// List elements, or count them when `params.sort` is `None`
    fn element_list(&self, params: &ElementListParams<'_>) -> Result<ElementListing<'_>, StoreError>;

    /// Update plain fields of an element
    ///
    /// Returns whether the store accepted the update.
    fn element_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError>;

    /// Replace all property values of an element
    fn set_property_values(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError>;

    /// Write only the given property values, leaving the others untouched
    fn set_property_values_ex(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError>;

    /// Fetch one section's fields
    fn section_by_id(&self, id: Id) -> Result<Option<Fields>, StoreError>;

    fn section_list(&self, params: &SectionListParams<'_>) -> Result<Box<dyn SectionCursor + '_>, StoreError>;

    fn section_count(&self, filter: &Filter) -> Result<u64, StoreError>;

    fn section_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError>;
}

impl<S: IblockStore + ?Sized> IblockStore for &S {
    fn element_by_id(&self, id: Id) -> Result<Option<ElementRow>, StoreError> {
        (**self).element_by_id(id)
    }

    fn element_groups(&self, element_id: Id, ids_only: bool) -> Result<Vec<Id>, StoreError> {
        (**self).element_groups(element_id, ids_only)
    }

    fn element_list(&self, params: &ElementListParams<'_>) -> Result<ElementListing<'_>, StoreError> {
        (**self).element_list(params)
    }

    fn element_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError> {
        (**self).element_update(id, fields)
    }

    fn set_property_values(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError> {
        (**self).set_property_values(element_id, iblock_id, values)
    }

    fn set_property_values_ex(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError> {
        (**self).set_property_values_ex(element_id, iblock_id, values)
    }

    fn section_by_id(&self, id: Id) -> Result<Option<Fields>, StoreError> {
        (**self).section_by_id(id)
    }

    fn section_list(&self, params: &SectionListParams<'_>) -> Result<Box<dyn SectionCursor + '_>, StoreError> {
        (**self).section_list(params)
    }

    fn section_count(&self, filter: &Filter) -> Result<u64, StoreError> {
        (**self).section_count(filter)
    }

    fn section_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError> {
        (**self).section_update(id, fields)
    }
}
