//! Section model: a tree node whose fields are its only lazy sub-resource.

use super::save::{normalize_fields_for_save, SaveSelection};
use super::SectionKind;
use crate::error::ModelError;
use crate::query::SectionQuery;
use crate::store::IblockStore;
use crate::value::{as_id, Fields, Id, PARENT_SECTION_FIELD};
use serde_json::Value as JsonValue;
use std::fmt;
use std::marker::PhantomData;

/// Annotation added to rows when a query counts elements per section
pub const ELEMENT_COUNT_FIELD: &str = "ELEMENT_CNT";

/// One section record of the iblock described by `K`
pub struct SectionModel<K: SectionKind> {
    id: Option<Id>,
    fields: Fields,
    fields_are_fetched: bool,
    _kind: PhantomData<fn() -> K>,
}

impl<K: SectionKind> SectionModel<K> {
    /// Model bound to store record `id`; nothing is fetched yet
    pub fn new(id: Id) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn query() -> SectionQuery<K> {
        SectionQuery::new()
    }

    pub fn get_by_id<S>(store: &S, id: Id) -> Result<Option<Self>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        Self::query().get_by_id(store, id)
    }

    pub fn id(&self) -> Option<Id> {
        self.id
    }

    pub fn fields_are_fetched(&self) -> bool {
        self.fields_are_fetched
    }

    /// Fill from a complete row; the fields count as fetched
    pub fn fill(&mut self, fields: Fields) -> &mut Self {
        self.seed(fields);
        self.fields_are_fetched = true;
        self
    }

    /// Seed from a partial row; the next [`get_fields`](Self::get_fields)
    /// still fetches the full record
    pub fn seed(&mut self, fields: Fields) -> &mut Self {
        if let Some(id) = fields.get("ID").and_then(as_id) {
            self.id = Some(id);
        }
        self.fields = fields;
        self
    }

    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: JsonValue) -> &mut Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Parent section id from the cached fields
    pub fn parent_id(&self) -> Option<Id> {
        self.fields.get(PARENT_SECTION_FIELD).and_then(as_id)
    }

    /// Element count, present when the query asked for it
    pub fn element_count(&self) -> Option<u64> {
        match self.fields.get(ELEMENT_COUNT_FIELD)? {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn to_map(&self) -> Fields {
        self.fields.clone()
    }

    pub fn get_fields<S>(&mut self, store: &S) -> Result<&Fields, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        if !self.fields_are_fetched {
            self.refresh_fields(store)?;
        }
        Ok(&self.fields)
    }

    /// Re-fetch the section's fields.
    ///
    /// A model without id ends up with empty fields and no store call is made.
    /// An element count seeded by a query is kept, as the by-id call never
    /// carries one.
    pub fn refresh_fields<S>(&mut self, store: &S) -> Result<&Fields, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let Some(id) = self.id else {
            self.fields.clear();
            return Ok(&self.fields);
        };

        let mut fields = store.section_by_id(id)?.ok_or(ModelError::NotFound(id))?;
        if let Some(count) = self.fields.remove(ELEMENT_COUNT_FIELD) {
            fields.entry(ELEMENT_COUNT_FIELD.to_string()).or_insert(count);
        }
        self.fields = fields;
        self.fields_are_fetched = true;
        log::debug!("section {id} of iblock {} refreshed", K::iblock_id());

        Ok(&self.fields)
    }

    /// Save the selected fields (all of them when `selected` is empty).
    ///
    /// Succeeds without a store call when there is nothing to update.
    pub fn save<S, I, F>(&self, store: &S, selected: I) -> Result<bool, ModelError>
    where
        S: IblockStore + ?Sized,
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        let selection = SaveSelection::parse(selected);
        let fields = normalize_fields_for_save(&self.fields, &selection, &[ELEMENT_COUNT_FIELD]);
        if fields.is_empty() {
            return Ok(true);
        }

        let id = self.id.ok_or(ModelError::MissingId)?;
        Ok(store.section_update(id, &fields)?)
    }
}

impl<K: SectionKind> Default for SectionModel<K> {
    fn default() -> Self {
        Self {
            id: None,
            fields: Fields::new(),
            fields_are_fetched: false,
            _kind: PhantomData,
        }
    }
}

impl<K: SectionKind> Clone for SectionModel<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fields: self.fields.clone(),
            fields_are_fetched: self.fields_are_fetched,
            _kind: PhantomData,
        }
    }
}

impl<K: SectionKind> fmt::Debug for SectionModel<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionModel")
            .field("iblock_id", &K::iblock_id())
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("fields_are_fetched", &self.fields_are_fetched)
            .finish()
    }
}
