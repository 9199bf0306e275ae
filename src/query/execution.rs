//! Execution methods for [`Query`].

use super::collection::{collect_keyed, Collection};
use super::criteria::Navigation;
use super::{Query, QueryTarget};
use crate::error::ModelError;
use crate::store::IblockStore;
use crate::value::Id;
use serde_json::json;

impl<T: QueryTarget> Query<T> {
    /// Fetch all matching models.
    ///
    /// Without [`key_by`](Self::key_by) the models come back as a list in
    /// store order; with it, keyed by that field.
    ///
    /// # Errors
    ///
    /// Store failures, or [`ModelError::MissingKey`] when a row lacks the
    /// key-by field.
    pub fn get_list<S>(&self, store: &S) -> Result<Collection<T>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let items = T::fetch_rows(self, store)?;
        collect_keyed(items, self.key_by.as_deref(), |item, field| item.key_value(field))
    }

    /// First matching model, or `None`
    pub fn first<S>(&self, store: &S) -> Result<Option<T>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let mut query = self.clone();
        query.navigation = Some(Navigation::top(1));
        Ok(T::fetch_rows(&query, store)?.into_iter().next())
    }

    /// Model with the given id inside this query's collection, or `None`.
    ///
    /// A zero id never matches and makes no store call. Sort and navigation
    /// of this query are ignored; filter and select are kept.
    pub fn get_by_id<S>(&self, store: &S, id: Id) -> Result<Option<T>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        if id == 0 {
            return Ok(None);
        }

        let mut query = self.clone();
        query.sort.clear();
        query.filter.insert("ID".to_string(), json!(id));
        query.navigation = Some(Navigation::top(1));
        Ok(T::fetch_rows(&query, store)?.into_iter().next())
    }

    /// Number of records matching the filter
    pub fn count<S>(&self, store: &S) -> Result<u64, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        T::fetch_count(self, store)
    }
}
