//! Result containers and the key-by policy shared by all queries.

use crate::error::ModelError;
use indexmap::IndexMap;

/// Models returned by a list query
#[derive(Debug, Clone, PartialEq)]
pub enum Collection<T> {
    /// Store return order
    List(Vec<T>),
    /// Keyed by the query's `key_by` field, in store return order. A later
    /// duplicate key replaces the earlier model in its original position.
    Keyed(IndexMap<String, T>),
}

impl<T> Collection<T> {
    pub fn len(&self) -> usize {
        match self {
            Collection::List(items) => items.len(),
            Collection::Keyed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_keyed(&self) -> bool {
        matches!(self, Collection::Keyed(_))
    }

    /// Model stored under `key`; always `None` for a plain list
    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            Collection::List(_) => None,
            Collection::Keyed(items) => items.get(key),
        }
    }

    /// Keys in order; empty for a plain list
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Collection::List(_) => Vec::new(),
            Collection::Keyed(items) => items.keys().map(String::as_str).collect(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Collection::List(items) => Box::new(items.iter()),
            Collection::Keyed(items) => Box::new(items.values()),
        }
    }

    /// Models in collection order, dropping keys
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::List(items) => items,
            Collection::Keyed(items) => items.into_values().collect(),
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

/// Put `items` into a collection, keyed by `key_by` when given.
///
/// # Errors
///
/// [`ModelError::MissingKey`] when an item has no value for the key field.
pub(crate) fn collect_keyed<T, F>(
    items: Vec<T>,
    key_by: Option<&str>,
    key_of: F,
) -> Result<Collection<T>, ModelError>
where
    F: Fn(&T, &str) -> Option<String>,
{
    let Some(field) = key_by else {
        return Ok(Collection::List(items));
    };

    let mut keyed = IndexMap::with_capacity(items.len());
    for item in items {
        let key = key_of(&item, field).ok_or_else(|| ModelError::MissingKey(field.to_string()))?;
        keyed.insert(key, item);
    }
    Ok(Collection::Keyed(keyed))
}
