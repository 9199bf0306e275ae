//! In-memory [`IblockStore`] implementation.
//!
//! Keeps elements and sections in ordered maps and journals every primitive
//! call, so tests can assert exactly which store traffic a model or query
//! produced. Interior mutability follows the single-threaded contract of the
//! store trait: `MemoryStore` is not `Sync`.

use super::{
    ElementCursor, ElementListParams, ElementListing, ElementRow, IblockStore, SectionCursor,
    SectionListParams,
};
use crate::error::StoreError;
use crate::query::criteria::{Navigation, Sort, SortOrder};
use crate::value::{
    as_id, key_string, Fields, Filter, Id, Properties, PropertyValues, IBLOCK_ID_FIELD,
    PARENT_SECTION_FIELD, SECTIONS_FIELD,
};
use serde_json::{json, Value as JsonValue};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One journaled store call with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    ElementById(Id),
    ElementGroups(Id),
    ElementList {
        sort: Option<Sort>,
        filter: Filter,
        group_by: Option<Vec<String>>,
        navigation: Option<Navigation>,
        select: Vec<String>,
    },
    ElementUpdate {
        id: Id,
        fields: Fields,
    },
    SetPropertyValues {
        element_id: Id,
        iblock_id: Id,
        values: PropertyValues,
    },
    SetPropertyValuesEx {
        element_id: Id,
        iblock_id: Id,
        values: PropertyValues,
    },
    SectionById(Id),
    SectionList {
        sort: Sort,
        filter: Filter,
        count_elements: bool,
        select: Vec<String>,
        navigation: Option<Navigation>,
    },
    SectionCount(Filter),
    SectionUpdate {
        id: Id,
        fields: Fields,
    },
}

/// Element as kept by the memory store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredElement {
    pub fields: Fields,
    pub properties: Properties,
    pub sections: Vec<Id>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    elements: RefCell<BTreeMap<Id, StoredElement>>,
    sections: RefCell<BTreeMap<Id, Fields>>,
    calls: RefCell<Vec<StoreCall>>,
    fail_property_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element; `ID` and `IBLOCK_ID` are written into its fields
    pub fn add_element(
        &self,
        id: Id,
        iblock_id: Id,
        mut fields: Fields,
        properties: Properties,
        sections: Vec<Id>,
    ) {
        fields.insert("ID".to_string(), json!(id.to_string()));
        fields.insert(IBLOCK_ID_FIELD.to_string(), json!(iblock_id.to_string()));
        self.elements.borrow_mut().insert(
            id,
            StoredElement {
                fields,
                properties,
                sections,
            },
        );
    }

    /// Add a section; `ID` and `IBLOCK_ID` are written into its fields
    pub fn add_section(&self, id: Id, iblock_id: Id, mut fields: Fields) {
        fields.insert("ID".to_string(), json!(id.to_string()));
        fields.insert(IBLOCK_ID_FIELD.to_string(), json!(iblock_id.to_string()));
        self.sections.borrow_mut().insert(id, fields);
    }

    /// Snapshot of a stored element
    pub fn element(&self, id: Id) -> Option<StoredElement> {
        self.elements.borrow().get(&id).cloned()
    }

    /// Snapshot of a stored section
    pub fn section(&self, id: Id) -> Option<Fields> {
        self.sections.borrow().get(&id).cloned()
    }

    /// Make both property write primitives fail
    pub fn fail_property_writes(&self, fail: bool) {
        self.fail_property_writes.set(fail);
    }

    /// All calls issued so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    /// Number of journaled calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check_property_write(&self, operation: &'static str, element_id: Id) -> Result<(), StoreError> {
        if self.fail_property_writes.get() {
            return Err(StoreError::Rejected {
                operation,
                message: "property writes are disabled".to_string(),
            });
        }
        if !self.elements.borrow().contains_key(&element_id) {
            return Err(StoreError::Rejected {
                operation,
                message: format!("element {element_id} does not exist"),
            });
        }
        Ok(())
    }

    fn element_count_in(&self, section_id: Id) -> u64 {
        self.elements
            .borrow()
            .values()
            .filter(|element| element.sections.contains(&section_id))
            .count() as u64
    }
}

impl IblockStore for MemoryStore {
    fn element_by_id(&self, id: Id) -> Result<Option<ElementRow>, StoreError> {
        self.record(StoreCall::ElementById(id));
        Ok(self
            .elements
            .borrow()
            .get(&id)
            .map(|element| ElementRow::new(element.fields.clone(), element.properties.clone())))
    }

    fn element_groups(&self, element_id: Id, _ids_only: bool) -> Result<Vec<Id>, StoreError> {
        self.record(StoreCall::ElementGroups(element_id));
        Ok(self
            .elements
            .borrow()
            .get(&element_id)
            .map(|element| element.sections.clone())
            .unwrap_or_default())
    }

    fn element_list(&self, params: &ElementListParams<'_>) -> Result<ElementListing<'_>, StoreError> {
        self.record(StoreCall::ElementList {
            sort: params.sort.cloned(),
            filter: params.filter.clone(),
            group_by: params.group_by.map(<[String]>::to_vec),
            navigation: params.navigation.copied(),
            select: params.select.to_vec(),
        });

        let elements = self.elements.borrow();
        let mut matched: Vec<&StoredElement> = elements
            .values()
            .filter(|element| element_matches(element, params.filter))
            .collect();

        let Some(sort) = params.sort else {
            return Ok(ElementListing::Count(matched.len() as u64));
        };

        matched.sort_by(|a, b| compare_by_sort(&a.fields, &b.fields, sort));
        let rows = paginate(matched, params.navigation)
            .into_iter()
            .map(|element| MemoryElementRow {
                simple: project_element(element, params.select),
                row: ElementRow::new(
                    project(&element.fields, params.select),
                    element.properties.clone(),
                ),
            })
            .collect();

        Ok(ElementListing::Rows(Box::new(MemoryElementCursor { rows })))
    }

    fn element_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError> {
        self.record(StoreCall::ElementUpdate {
            id,
            fields: fields.clone(),
        });

        let mut elements = self.elements.borrow_mut();
        let Some(element) = elements.get_mut(&id) else {
            return Ok(false);
        };
        for (key, value) in fields {
            if key == SECTIONS_FIELD {
                element.sections = crate::value::ids_from_value(value);
            } else {
                element.fields.insert(key.clone(), value.clone());
            }
        }
        Ok(true)
    }

    fn set_property_values(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::SetPropertyValues {
            element_id,
            iblock_id,
            values: values.clone(),
        });
        self.check_property_write("set_property_values", element_id)?;

        let mut elements = self.elements.borrow_mut();
        if let Some(element) = elements.get_mut(&element_id) {
            // Bulk write replaces: properties missing from `values` are cleared.
            for (code, property) in element.properties.iter_mut() {
                let value = values.get(code).cloned().unwrap_or(JsonValue::Null);
                write_property_value(property, value);
            }
            for (code, value) in values {
                if !element.properties.contains_key(code) {
                    element.properties.insert(code.clone(), json!({ "VALUE": value }));
                }
            }
        }
        Ok(())
    }

    fn set_property_values_ex(
        &self,
        element_id: Id,
        iblock_id: Id,
        values: &PropertyValues,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::SetPropertyValuesEx {
            element_id,
            iblock_id,
            values: values.clone(),
        });
        self.check_property_write("set_property_values_ex", element_id)?;

        let mut elements = self.elements.borrow_mut();
        if let Some(element) = elements.get_mut(&element_id) {
            for (code, value) in values {
                let property = element
                    .properties
                    .entry(code.clone())
                    .or_insert_with(|| json!({}));
                write_property_value(property, value.clone());
            }
        }
        Ok(())
    }

    fn section_by_id(&self, id: Id) -> Result<Option<Fields>, StoreError> {
        self.record(StoreCall::SectionById(id));
        Ok(self.sections.borrow().get(&id).cloned())
    }

    fn section_list(&self, params: &SectionListParams<'_>) -> Result<Box<dyn SectionCursor + '_>, StoreError> {
        self.record(StoreCall::SectionList {
            sort: params.sort.clone(),
            filter: params.filter.clone(),
            count_elements: params.count_elements,
            select: params.select.to_vec(),
            navigation: params.navigation.copied(),
        });

        let sections = self.sections.borrow();
        let mut matched: Vec<(&Id, &Fields)> = sections
            .iter()
            .filter(|(_, fields)| fields_match(fields, params.filter))
            .collect();
        matched.sort_by(|a, b| compare_by_sort(a.1, b.1, params.sort));

        let rows = paginate(matched, params.navigation)
            .into_iter()
            .map(|(id, fields)| {
                let mut row = project(fields, params.select);
                if params.count_elements {
                    row.insert("ELEMENT_CNT".to_string(), json!(self.element_count_in(*id)));
                }
                row
            })
            .collect();

        Ok(Box::new(MemorySectionCursor { rows }))
    }

    fn section_count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.record(StoreCall::SectionCount(filter.clone()));
        Ok(self
            .sections
            .borrow()
            .values()
            .filter(|fields| fields_match(fields, filter))
            .count() as u64)
    }

    fn section_update(&self, id: Id, fields: &Fields) -> Result<bool, StoreError> {
        self.record(StoreCall::SectionUpdate {
            id,
            fields: fields.clone(),
        });
        let mut sections = self.sections.borrow_mut();
        let Some(section) = sections.get_mut(&id) else {
            return Ok(false);
        };
        for (key, value) in fields {
            section.insert(key.clone(), value.clone());
        }
        Ok(true)
    }
}

struct MemoryElementRow {
    simple: Fields,
    row: ElementRow,
}

struct MemoryElementCursor {
    rows: std::collections::VecDeque<MemoryElementRow>,
}

impl ElementCursor for MemoryElementCursor {
    fn get_next(&mut self) -> Result<Option<Fields>, StoreError> {
        Ok(self.rows.pop_front().map(|row| row.simple))
    }

    fn get_next_element(&mut self) -> Result<Option<ElementRow>, StoreError> {
        Ok(self.rows.pop_front().map(|row| row.row))
    }
}

struct MemorySectionCursor {
    rows: std::collections::VecDeque<Fields>,
}

impl SectionCursor for MemorySectionCursor {
    fn fetch(&mut self) -> Result<Option<Fields>, StoreError> {
        Ok(self.rows.pop_front())
    }
}

fn write_property_value(property: &mut JsonValue, value: JsonValue) {
    match property.as_object_mut() {
        Some(meta) => {
            meta.insert("VALUE".to_string(), value);
        }
        None => *property = json!({ "VALUE": value }),
    }
}

fn element_matches(element: &StoredElement, filter: &Filter) -> bool {
    filter.iter().all(|(key, expected)| {
        if key == "SECTION_ID" {
            let parent = element.fields.get(PARENT_SECTION_FIELD).and_then(as_id);
            return candidates(expected).iter().any(|candidate| {
                as_id(candidate).is_some_and(|id| element.sections.contains(&id) || parent == Some(id))
            });
        }
        constraint_holds(&element.fields, key, expected)
    })
}

fn fields_match(fields: &Fields, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(key, expected)| constraint_holds(fields, key, expected))
}

fn constraint_holds(fields: &Fields, key: &str, expected: &JsonValue) -> bool {
    match key.strip_prefix('!') {
        Some(field) => !value_in(fields.get(field), expected),
        None => value_in(fields.get(key), expected),
    }
}

fn candidates(expected: &JsonValue) -> Vec<&JsonValue> {
    match expected {
        JsonValue::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn value_in(actual: Option<&JsonValue>, expected: &JsonValue) -> bool {
    let actual = actual.and_then(key_string);
    candidates(expected)
        .into_iter()
        .any(|candidate| key_string(candidate) == actual)
}

fn compare_by_sort(a: &Fields, b: &Fields, sort: &Sort) -> Ordering {
    for (field, order) in sort {
        let ordering = compare_values(a.get(field), b.get(field));
        let ordering = match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.and_then(key_string);
    let b = b.and_then(key_string);
    match (&a, &b) {
        (Some(x), Some(y)) => match (x.parse::<f64>(), y.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => x.cmp(y),
        },
        _ => a.cmp(&b),
    }
}

fn paginate<T>(rows: Vec<T>, navigation: Option<&Navigation>) -> std::collections::VecDeque<T> {
    let (skip, take) = navigation.map(Navigation::window).unwrap_or((0, None));
    rows.into_iter()
        .skip(skip)
        .take(take.unwrap_or(usize::MAX))
        .collect()
}

fn project(fields: &Fields, select: &[String]) -> Fields {
    if select.is_empty() {
        return fields.clone();
    }
    fields
        .iter()
        .filter(|(key, _)| {
            key.as_str() == "ID"
                || select.iter().any(|selected| {
                    selected == *key
                        || selected
                            .strip_suffix('*')
                            .is_some_and(|prefix| prefix != "PROPERTY_" && key.starts_with(prefix))
                })
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn project_element(element: &StoredElement, select: &[String]) -> Fields {
    let mut row = project(&element.fields, select);
    if select.iter().any(|selected| selected == "PROPERTY_*") {
        for (code, property) in &element.properties {
            let value = property.get("VALUE").cloned().unwrap_or(JsonValue::Null);
            row.insert(format!("PROPERTY_{code}_VALUE"), value);
        }
    }
    row
}
