//! Fluent query builder.
//!
//! This module provides [`Query`], which collects sort, filter, select,
//! navigation and key-by settings. Builder methods are defined here, while
//! execution methods are in the execution module.

use super::criteria::{FetchUsing, Navigation, Sort, SortOrder};
use super::QueryTarget;
use crate::config::QueryDefaults;
use crate::value::{Filter, IBLOCK_ID_FIELD};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::marker::PhantomData;

/// Select marker for "all standard fields"
pub const FIELDS_MARKER: &str = "FIELDS";
/// Select marker for "property values too"
pub const PROPS_MARKER: &str = "PROPS";
/// Alternate property marker, same meaning as [`PROPS_MARKER`]
pub const PROPERTY_VALUES_MARKER: &str = "PROPERTY_VALUES";

const MARKERS: &[&str] = &[FIELDS_MARKER, PROPS_MARKER, PROPERTY_VALUES_MARKER];

/// Query over the models of type `T`
///
/// Created by [`ElementModel::query`](crate::ElementModel::query) or
/// [`SectionModel::query`](crate::SectionModel::query) and chained with
/// setters before one of the execution methods is called.
///
/// # Example
///
/// ```ignore
/// let lamps = ElementModel::<Product>::query()
///     .filter(json!({"SECTION_ID": 99}).as_object().cloned().unwrap())
///     .select(["NAME", "PROPS"])
///     .key_by("ID")
///     .get_list(&store)?;
/// ```
pub struct Query<T> {
    pub(crate) sort: Sort,
    pub(crate) filter: Filter,
    pub(crate) select: Vec<String>,
    pub(crate) navigation: Option<Navigation>,
    pub(crate) key_by: Option<String>,
    pub(crate) group_by: Option<Vec<String>>,
    pub(crate) fetch_using: FetchUsing,
    pub(crate) count_elements: bool,
    _target: PhantomData<fn() -> T>,
}

impl<T: QueryTarget> Query<T> {
    /// Create a query with the built-in defaults
    pub fn new() -> Self {
        Self::with_defaults(&QueryDefaults::default())
    }

    /// Create a query starting from loaded [`QueryDefaults`]
    pub fn with_defaults(defaults: &QueryDefaults) -> Self {
        let mut query = Self {
            sort: defaults.sort.clone(),
            filter: Filter::new(),
            select: vec![FIELDS_MARKER.to_string(), PROPS_MARKER.to_string()],
            navigation: None,
            key_by: None,
            group_by: None,
            fetch_using: defaults.fetch_using,
            count_elements: false,
            _target: PhantomData,
        };
        query.scope_filter();
        query
    }

    /// Replace the sort
    pub fn sort<I, F>(mut self, sort: I) -> Self
    where
        I: IntoIterator<Item = (F, SortOrder)>,
        F: Into<String>,
    {
        self.sort = sort.into_iter().map(|(field, order)| (field.into(), order)).collect();
        self
    }

    /// Append one sort key
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Replace the filter wholesale.
    ///
    /// The collection scope is injected again afterwards, so a caller-provided
    /// `IBLOCK_ID` never survives.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self.scope_filter();
        self
    }

    /// Add or replace one filter constraint
    pub fn add_filter(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.filter.insert(key.into(), value);
        self.scope_filter();
        self
    }

    /// Only active records
    pub fn active(self) -> Self {
        self.add_filter("ACTIVE", json!("Y"))
    }

    /// Replace the select list; markers `FIELDS` and `PROPS` stay available
    pub fn select<I, F>(mut self, select: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.select = select.into_iter().map(Into::into).collect();
        self
    }

    pub fn navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = Some(navigation);
        self
    }

    /// Return at most `count` rows
    pub fn limit(self, count: u64) -> Self {
        self.navigation(Navigation::top(count))
    }

    /// Return page `page_num` (1-based) of `page_size` rows
    pub fn page(self, page_size: u64, page_num: u64) -> Self {
        self.navigation(Navigation::page(page_size, page_num))
    }

    /// Key the result collection by `field`
    pub fn key_by(mut self, field: impl Into<String>) -> Self {
        self.key_by = Some(field.into());
        self
    }

    /// Filter as it will be dispatched
    pub fn current_filter(&self) -> &Filter {
        &self.filter
    }

    pub fn current_sort(&self) -> &Sort {
        &self.sort
    }

    /// Whether the select asks for all standard fields
    pub fn fields_must_be_selected(&self) -> bool {
        self.select.iter().any(|field| field == FIELDS_MARKER)
    }

    /// Whether the select asks for property values
    pub fn props_must_be_selected(&self) -> bool {
        self.select
            .iter()
            .any(|field| field == PROPS_MARKER || field == PROPERTY_VALUES_MARKER)
    }

    /// Select list with markers expanded, then stripped.
    ///
    /// Section lists dispatch it as is. Element lists that select `FIELDS`
    /// send an empty select instead, so rows come back whole.
    pub fn normalized_select(&self) -> Vec<String> {
        let mut select = self.select.clone();
        if self.fields_must_be_selected() {
            select.extend(T::standard_fields().iter().map(|field| field.to_string()));
        }
        if self.props_must_be_selected() {
            select.push(IBLOCK_ID_FIELD.to_string());
            select.push(T::custom_fields_wildcard().to_string());
        }
        clear_select(select)
    }

    fn scope_filter(&mut self) {
        self.filter
            .insert(IBLOCK_ID_FIELD.to_string(), json!(T::iblock_id()));
    }
}

impl<T: QueryTarget> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            sort: self.sort.clone(),
            filter: self.filter.clone(),
            select: self.select.clone(),
            navigation: self.navigation,
            key_by: self.key_by.clone(),
            group_by: self.group_by.clone(),
            fetch_using: self.fetch_using,
            count_elements: self.count_elements,
            _target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sort", &self.sort)
            .field("filter", &self.filter)
            .field("select", &self.select)
            .field("navigation", &self.navigation)
            .field("key_by", &self.key_by)
            .field("group_by", &self.group_by)
            .field("fetch_using", &self.fetch_using)
            .field("count_elements", &self.count_elements)
            .finish()
    }
}

/// Drop markers and duplicates, keeping first occurrences in order
pub(crate) fn clear_select(select: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    select
        .into_iter()
        .filter(|field| !MARKERS.contains(&field.as_str()))
        .filter(|field| seen.insert(field.clone()))
        .collect()
}
