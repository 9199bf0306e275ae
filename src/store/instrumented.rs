//! Instrumenting decorator for any [`IblockStore`].

use super::{
    ElementListParams, ElementListing, ElementRow, IblockStore, SectionCursor, SectionListParams,
};
use crate::error::StoreError;
use crate::value::{Fields, Filter, Id, PropertyValues};
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Wraps a store so every primitive call is traced, timed and logged.
///
/// ```ignore
/// let store = InstrumentedStore::new(MemoryStore::new());
/// let products = Product::query().get_list(&store)?;
/// ```
#[derive(Debug, Default)]
pub struct InstrumentedStore<S> {
    inner: S,
}

impl<S: IblockStore> InstrumentedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Get a reference to the wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn observe<'s, T>(
        &'s self,
        operation: &'static str,
        call: impl FnOnce(&'s S) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::store_call_span(operation).entered();

        let start = Instant::now();
        let result = call(&self.inner);
        let elapsed = start.elapsed();

        #[cfg(feature = "metrics")]
        METRICS.record_call(operation, elapsed);

        match &result {
            Ok(_) => log::trace!("store call {operation} finished in {elapsed:?}"),
            Err(e) => {
                #[cfg(feature = "metrics")]
                METRICS.record_error(operation);
                log::debug!("store call {operation} failed after {elapsed:?}: {e}");
            }
        }

        result
    }
}

impl<S: IblockStore> IblockStore for InstrumentedStore<S> {
    fn element_by_id(&self, id: Id) -> Result<Option<ElementRow>, StoreError> {
        self.observe("element_by_id", |s| s.element_by_id(id))
    }

    fn element_groups(&self, element_id: Id, ids_only: bool) -> Result<Vec<Id>, StoreError> {
        self.observe("element_groups", |s| s.element_groups(element_id, ids_only))
    }

    fn element_list(&self, params: &ElementListParams<'_>) -> Result<ElementListing<'_>, StoreError> {
        self.observe("element_list", |s| s.element_list(params))
    }

    fn element_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError> {
        self.observe("element_update", |s| s.element_update(id, fields))
    }

    fn set_property_values(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError> {
        self.observe("set_property_values", |s| {
            s.set_property_values(element_id, iblock_id, values)
        })
    }

    fn set_property_values_ex(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError> {
        self.observe("set_property_values_ex", |s| {
            s.set_property_values_ex(element_id, iblock_id, values)
        })
    }

    fn section_by_id(&self, id: Id) -> Result<Option<Fields>, StoreError> {
        self.observe("section_by_id", |s| s.section_by_id(id))
    }

    fn section_list(&self, params: &SectionListParams<'_>) -> Result<Box<dyn SectionCursor + '_>, StoreError> {
        self.observe("section_list", |s| s.section_list(params))
    }

    fn section_count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.observe("section_count", |s| s.section_count(filter))
    }

    fn section_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError> {
        self.observe("section_update", |s| s.section_update(id, fields))
    }
}
