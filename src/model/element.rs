//! Element model with lazily fetched fields, properties and sections.
//!
//! An [`ElementModel`] caches three sub-resources independently:
//!
//! - **fields**: the plain record, fetched by id;
//! - **properties**: fetched by the same by-id call as the fields (the store
//!   offers no separate property read), flattened into property values;
//! - **sections**: the full section membership, fetched by its own call and
//!   kept under `IBLOCK_SECTION` in the fields.
//!
//! Each has a fetched flag that flips once per refresh. Plain reads never
//! reset a flag; only an explicit refresh re-fetches.
//!
//! # Example
//!
//! ```ignore
//! let mut lamp = ElementModel::<Product>::new(42);
//! let name = lamp.get_fields(&store)?["NAME"].clone();   // one by-id fetch
//! let color = lamp.get_props(&store)?["COLOR"].clone();  // served from cache
//! lamp.set_property("COLOR", json!("blue"));
//! lamp.save(&store, ["PROPERTY_VALUES.COLOR"])?;          // selective write
//! ```

use super::save::{normalize_fields_for_save, SaveSelection};
use super::section::SectionModel;
use super::{ElementKind, SectionKind};
use crate::error::ModelError;
use crate::query::ElementQuery;
use crate::store::IblockStore;
use crate::value::{
    as_id, derive_values, ids_from_value, Fields, Id, Properties, PropertyValues,
    PARENT_SECTION_FIELD, SECTIONS_FIELD,
};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::marker::PhantomData;

/// Direct parent section of an element, as resolved by
/// [`ElementModel::get_section`]
#[derive(Debug, Clone, PartialEq)]
pub enum DirectSection {
    /// The element has no direct parent section
    Absent,
    /// Raw parent id (`with_props == false`)
    Id(Id),
    /// Full field mapping of the parent section
    Fields(Fields),
}

/// One element record of the iblock described by `K`
pub struct ElementModel<K: ElementKind> {
    id: Option<Id>,
    fields: Fields,
    properties: Option<Properties>,
    property_values: Option<PropertyValues>,
    fields_are_fetched: bool,
    props_are_fetched: bool,
    sections_are_fetched: bool,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ElementKind> ElementModel<K> {
    /// Model bound to store record `id`; nothing is fetched yet
    pub fn new(id: Id) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Model with no store record behind it
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Start a query over this element kind
    pub fn query() -> ElementQuery<K> {
        ElementQuery::new()
    }

    /// Fetch one element of this kind, or `None` if it does not exist
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

    pub fn props_are_fetched(&self) -> bool {
        self.props_are_fetched
    }

    pub fn sections_are_fetched(&self) -> bool {
        self.sections_are_fetched
    }

    /// Fill from a complete row; the fields count as fetched
    pub fn fill(&mut self, fields: Fields) -> &mut Self {
        self.take_row(fields);
        self.fields_are_fetched = true;
        self
    }

    /// Seed from a partial row; the next [`get_fields`](Self::get_fields)
    /// still fetches the full record
    pub fn seed(&mut self, fields: Fields) -> &mut Self {
        self.take_row(fields);
        self
    }

    /// Attach the nested properties of this element and derive its values
    pub fn fill_properties(&mut self, properties: Properties) -> &mut Self {
        self.properties = Some(properties);
        self.property_values = None;
        self.props_are_fetched = false;
        self.derive_property_values();
        self
    }

    /// Attach already flattened property values
    pub fn fill_property_values(&mut self, values: PropertyValues) -> &mut Self {
        self.property_values = Some(values);
        self.props_are_fetched = true;
        self
    }

    fn take_row(&mut self, mut fields: Fields) {
        if let Some(id) = fields.get("ID").and_then(as_id) {
            self.id = Some(id);
        }
        let explicit = match fields.remove("PROPERTY_VALUES") {
            Some(JsonValue::Object(values)) => {
                self.fill_property_values(values);
                true
            }
            _ => false,
        };
        if let Some(JsonValue::Object(properties)) = fields.remove("PROPERTIES") {
            if !explicit {
                self.property_values = None;
            }
            self.properties = Some(properties);
            self.derive_property_values();
        }
        self.fields = fields;
    }

    /// Derive `property_values` from `properties` unless already present.
    fn derive_property_values(&mut self) {
        if self.property_values.is_some() {
            self.props_are_fetched = true;
            return;
        }
        let Some(properties) = &self.properties else {
            return;
        };
        self.property_values = Some(derive_values(properties));
        self.props_are_fetched = true;
    }

    /// Cached field value; never fetches
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: JsonValue) -> &mut Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Cached property value; never fetches
    pub fn property(&self, code: &str) -> Option<&JsonValue> {
        self.property_values.as_ref()?.get(code)
    }

    /// Change one property value in memory.
    ///
    /// Does not mark properties as fetched: a later [`get_props`](Self::get_props)
    /// on an unfetched model replaces local changes with the stored values.
    pub fn set_property(&mut self, code: impl Into<String>, value: JsonValue) -> &mut Self {
        self.property_values
            .get_or_insert_with(PropertyValues::new)
            .insert(code.into(), value);
        self
    }

    /// Fields followed by `PROPERTIES` and `PROPERTY_VALUES` when known
    pub fn to_map(&self) -> Fields {
        let mut map = self.fields.clone();
        if let Some(properties) = &self.properties {
            map.insert("PROPERTIES".to_string(), JsonValue::Object(properties.clone()));
        }
        if let Some(values) = &self.property_values {
            map.insert("PROPERTY_VALUES".to_string(), JsonValue::Object(values.clone()));
        }
        map
    }

    /// All attributes: fields and property values, fetching what is missing
    pub fn get<S>(&mut self, store: &S) -> Result<Fields, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        self.get_fields(store)?;
        self.get_props(store)?;
        Ok(self.to_map())
    }

    /// Fields from cache, or from the store if not fetched yet
    pub fn get_fields<S>(&mut self, store: &S) -> Result<&Fields, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        if !self.fields_are_fetched {
            self.refresh_fields(store)?;
        }
        Ok(&self.fields)
    }

    /// Alias for [`refresh_fields`](Self::refresh_fields)
    pub fn refresh<S>(&mut self, store: &S) -> Result<&Fields, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        self.refresh_fields(store)
    }

    /// Re-fetch fields and properties in one by-id call.
    ///
    /// A model without id ends up with empty fields and no store call is made.
    /// Section membership cached before the call survives it unless the
    /// fetched record carries its own.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotFound`] if the record no longer exists, or the
    /// store error of the by-id call.
    pub fn refresh_fields<S>(&mut self, store: &S) -> Result<&Fields, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let Some(id) = self.id else {
            self.fields.clear();
            return Ok(&self.fields);
        };

        let sections_backup = self.fields.remove(SECTIONS_FIELD);

        let row = match store.element_by_id(id) {
            Ok(Some(row)) => row,
            Ok(None) => {
                self.restore_sections(sections_backup);
                return Err(ModelError::NotFound(id));
            }
            Err(e) => {
                self.restore_sections(sections_backup);
                return Err(e.into());
            }
        };
        let (fields, properties) = row.into_parts();

        self.fields = fields;
        self.properties = Some(properties);
        self.property_values = None;
        self.derive_property_values();
        self.restore_sections(sections_backup);

        self.fields_are_fetched = true;
        self.props_are_fetched = true;
        log::debug!("element {id} of iblock {} refreshed", K::iblock_id());

        Ok(&self.fields)
    }

    fn restore_sections(&mut self, backup: Option<JsonValue>) {
        let Some(sections) = backup else {
            return;
        };
        if is_empty_value(&sections) {
            return;
        }
        self.fields
            .entry(SECTIONS_FIELD.to_string())
            .or_insert(sections);
    }

    /// Property values from cache, deriving or fetching them as needed
    pub fn get_props<S>(&mut self, store: &S) -> Result<&PropertyValues, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        if !self.props_are_fetched && self.properties.is_some() {
            self.derive_property_values();
        }
        if !self.props_are_fetched {
            return self.refresh_props(store);
        }
        Ok(self.property_values_ref())
    }

    /// Re-fetch property values.
    ///
    /// Properties cannot be read apart from the fields, so this performs a
    /// full [`refresh_fields`](Self::refresh_fields).
    pub fn refresh_props<S>(&mut self, store: &S) -> Result<&PropertyValues, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        self.refresh_fields(store)?;
        Ok(self.property_values_ref())
    }

    fn property_values_ref(&mut self) -> &PropertyValues {
        self.property_values.get_or_insert_with(PropertyValues::new)
    }

    /// Ids of all sections the element belongs to, fetching them once
    pub fn get_sections<S>(&mut self, store: &S) -> Result<Vec<Id>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        if self.sections_are_fetched {
            return Ok(self
                .fields
                .get(SECTIONS_FIELD)
                .map(ids_from_value)
                .unwrap_or_default());
        }
        self.refresh_sections(store)
    }

    /// Re-fetch the element's section membership.
    ///
    /// A model without id yields an empty list and no store call is made.
    pub fn refresh_sections<S>(&mut self, store: &S) -> Result<Vec<Id>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let Some(id) = self.id else {
            return Ok(Vec::new());
        };

        let sections = store.element_groups(id, true)?;
        self.fields.insert(SECTIONS_FIELD.to_string(), json!(sections));
        self.sections_are_fetched = true;

        Ok(sections)
    }

    /// Direct parent section as an id or as the section's full fields.
    ///
    /// # Errors
    ///
    /// [`ModelError::Configuration`] when `with_props` is set and the kind
    /// has no section model.
    pub fn get_section<S>(&mut self, store: &S, with_props: bool) -> Result<DirectSection, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let parent = self.parent_section_id(store)?;
        if !with_props {
            return Ok(parent.map_or(DirectSection::Absent, DirectSection::Id));
        }

        ensure_section_binding::<K>()?;
        let Some(parent) = parent else {
            return Ok(DirectSection::Absent);
        };

        Ok(SectionModel::<K::Section>::get_by_id(store, parent)?
            .map_or(DirectSection::Absent, |section| DirectSection::Fields(section.to_map())))
    }

    /// Direct parent section as a model.
    ///
    /// Without `with_props` the section model is created lazily (nothing is
    /// fetched for it); with it the section is looked up eagerly.
    ///
    /// # Errors
    ///
    /// [`ModelError::Configuration`] when the kind has no section model.
    pub fn section<S>(
        &mut self,
        store: &S,
        with_props: bool,
    ) -> Result<Option<SectionModel<K::Section>>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let parent = self.parent_section_id(store)?;
        ensure_section_binding::<K>()?;

        let Some(parent) = parent else {
            return Ok(None);
        };
        if with_props {
            SectionModel::get_by_id(store, parent)
        } else {
            Ok(Some(SectionModel::new(parent)))
        }
    }

    fn parent_section_id<S>(&mut self, store: &S) -> Result<Option<Id>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        Ok(self.get_fields(store)?.get(PARENT_SECTION_FIELD).and_then(as_id))
    }

    /// Save everything: all property values in bulk, then all fields
    pub fn save_all<S>(&self, store: &S) -> Result<bool, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        self.save(store, std::iter::empty::<&str>())
    }

    /// Save the selected fields and properties.
    ///
    /// `selected` lists field names and `PROPERTY_VALUES.<CODE>` paths; an
    /// empty selection saves everything.
    ///
    /// Properties are written first:
    /// - empty selection: all property values in one bulk (replacing) write;
    /// - selection without properties: no property write;
    /// - otherwise: only the selected values, merged by a selective write.
    ///
    /// Then the selected plain fields go to one update call; if there is
    /// nothing to update the save succeeds without a store call.
    ///
    /// Returns the update call's answer. A failed property write is logged and
    /// does not stop the field update; it is not reflected in the result.
    pub fn save<S, I, F>(&self, store: &S, selected: I) -> Result<bool, ModelError>
    where
        S: IblockStore + ?Sized,
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        let selection = SaveSelection::parse(selected);

        self.save_props(store, &selection)?;

        let fields = normalize_fields_for_save(&self.fields, &selection, &[]);
        if fields.is_empty() {
            return Ok(true);
        }

        let id = self.id.ok_or(ModelError::MissingId)?;
        log::debug!("updating element {id}: {} field(s)", fields.len());
        Ok(store.element_update(id, &fields)?)
    }

    fn save_props<S>(&self, store: &S, selection: &SaveSelection) -> Result<(), ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let empty = PropertyValues::new();
        let values = self.property_values.as_ref().unwrap_or(&empty);

        let write = if selection.is_empty() {
            if values.is_empty() {
                return Ok(());
            }
            let id = self.id.ok_or(ModelError::MissingId)?;
            store.set_property_values(id, K::iblock_id(), values)
        } else {
            let selected = match selection.select_properties(values) {
                Some(selected) if !selected.is_empty() => selected,
                _ => return Ok(()),
            };
            let id = self.id.ok_or(ModelError::MissingId)?;
            store.set_property_values_ex(id, K::iblock_id(), &selected)
        };

        if let Err(e) = write {
            log::warn!(
                "property write for element {:?} of iblock {} failed: {e}",
                self.id,
                K::iblock_id()
            );
        }
        Ok(())
    }
}

fn ensure_section_binding<K: ElementKind>() -> Result<(), ModelError> {
    if <K::Section as SectionKind>::is_bound() {
        return Ok(());
    }
    Err(ModelError::Configuration(format!(
        "element kind {} has no section model bound",
        std::any::type_name::<K>()
    )))
}

fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}

impl<K: ElementKind> Default for ElementModel<K> {
    fn default() -> Self {
        Self {
            id: None,
            fields: Fields::new(),
            properties: None,
            property_values: None,
            fields_are_fetched: false,
            props_are_fetched: false,
            sections_are_fetched: false,
            _kind: PhantomData,
        }
    }
}

impl<K: ElementKind> Clone for ElementModel<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fields: self.fields.clone(),
            properties: self.properties.clone(),
            property_values: self.property_values.clone(),
            fields_are_fetched: self.fields_are_fetched,
            props_are_fetched: self.props_are_fetched,
            sections_are_fetched: self.sections_are_fetched,
            _kind: PhantomData,
        }
    }
}

impl<K: ElementKind> fmt::Debug for ElementModel<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementModel")
            .field("iblock_id", &K::iblock_id())
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("property_values", &self.property_values)
            .field("fields_are_fetched", &self.fields_are_fetched)
            .field("props_are_fetched", &self.props_are_fetched)
            .field("sections_are_fetched", &self.sections_are_fetched)
            .finish()
    }
}
