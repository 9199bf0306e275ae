//! Selection handling for partial saves.
//!
//! Callers name what to save as plain field names or dotted paths:
//! `"NAME"` selects a field, `"PROPERTY_VALUES.COLOR"` selects one property.
//! The list is parsed into a two-level selection before anything is written.

use crate::value::{Fields, PropertyValues};
use std::collections::{BTreeMap, BTreeSet};

/// Top-level key under which dotted property selectors are grouped
pub(crate) const PROPERTY_VALUES_KEY: &str = "PROPERTY_VALUES";

/// Fields never sent to an update call
const NON_SAVEABLE_FIELDS: &[&str] = &["ID", "IBLOCK_ID", "PROPERTIES", "PROPERTY_VALUES", "GROUPS"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selected {
    /// The whole top-level entry
    Whole,
    /// Only these sub-keys
    Keys(BTreeSet<String>),
}

/// Parsed save selection; empty means "save everything"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SaveSelection {
    entries: BTreeMap<String, Selected>,
}

impl SaveSelection {
    pub(crate) fn parse<I, S>(selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: BTreeMap<String, Selected> = BTreeMap::new();
        for item in selected {
            let item = item.as_ref();
            match item.split_once('.') {
                Some((field, sub_key)) => {
                    let entry = entries
                        .entry(field.to_string())
                        .or_insert_with(|| Selected::Keys(BTreeSet::new()));
                    if let Selected::Keys(keys) = entry {
                        keys.insert(sub_key.to_string());
                    }
                }
                None => {
                    entries.insert(item.to_string(), Selected::Whole);
                }
            }
        }
        Self { entries }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub(crate) fn get(&self, field: &str) -> Option<&Selected> {
        self.entries.get(field)
    }

    /// Property values covered by the selection's `PROPERTY_VALUES` entry
    ///
    /// Returns `None` when the selection names no property at all.
    pub(crate) fn select_properties(&self, values: &PropertyValues) -> Option<PropertyValues> {
        match self.get(PROPERTY_VALUES_KEY)? {
            Selected::Whole => Some(values.clone()),
            Selected::Keys(codes) if codes.is_empty() => None,
            Selected::Keys(codes) => Some(
                values
                    .iter()
                    .filter(|(code, _)| codes.contains(code.as_str()))
                    .map(|(code, value)| (code.clone(), value.clone()))
                    .collect(),
            ),
        }
    }
}

/// Build the update payload for `fields` restricted to `selection`.
///
/// Non-saveable keys, `~`-prefixed raw copies and inline `PROPERTY_*` keys
/// are always dropped, as is anything in `also_skip`.
pub(crate) fn normalize_fields_for_save(
    fields: &Fields,
    selection: &SaveSelection,
    also_skip: &[&str],
) -> Fields {
    fields
        .iter()
        .filter(|(field, _)| {
            let field = field.as_str();
            !(NON_SAVEABLE_FIELDS.contains(&field)
                || also_skip.contains(&field)
                || field.starts_with('~')
                || field.starts_with("PROPERTY_")
                || (!selection.is_empty() && !selection.contains(field)))
        })
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}
