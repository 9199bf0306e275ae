//! Element-specific query behaviour: row materialization and counting.

use super::criteria::FetchUsing;
use super::rows::{RawElement, Rows};
use super::{ElementQuery, Query, QueryTarget};
use crate::error::ModelError;
use crate::model::{ElementKind, ElementModel};
use crate::store::{ElementListParams, ElementListing, IblockStore};
use crate::value::{key_string, values_from_inline, Id};

impl<K: ElementKind> ElementQuery<K> {
    /// Group rows by these fields
    pub fn group_by<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.group_by = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Choose the cursor primitive rows are read with
    pub fn fetch_using(mut self, strategy: FetchUsing) -> Self {
        self.fetch_using = strategy;
        self
    }
}

impl<K: ElementKind> QueryTarget for ElementModel<K> {
    fn iblock_id() -> Id {
        K::iblock_id()
    }

    fn standard_fields() -> &'static [&'static str] {
        K::standard_fields()
    }

    fn custom_fields_wildcard() -> &'static str {
        "PROPERTY_*"
    }

    fn key_value(&self, field: &str) -> Option<String> {
        match self.field(field) {
            Some(value) => key_string(value),
            None if field == "ID" => self.id().map(|id| id.to_string()),
            None => None,
        }
    }

    fn fetch_rows<S>(query: &Query<Self>, store: &S) -> Result<Vec<Self>, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let complete = query.fields_must_be_selected();
        // A full row is only guaranteed by an empty select
        let select = if complete {
            Vec::new()
        } else {
            query.normalized_select()
        };
        let with_props = query.props_must_be_selected();

        let params = ElementListParams {
            sort: Some(&query.sort),
            filter: &query.filter,
            group_by: query.group_by.as_deref(),
            navigation: query.navigation.as_ref(),
            select: &select,
        };
        log::debug!(
            "listing elements of iblock {} using {:?}",
            K::iblock_id(),
            query.fetch_using
        );

        let cursor = match store.element_list(&params)? {
            ElementListing::Rows(cursor) => cursor,
            ElementListing::Count(_) => {
                return Err(ModelError::UnexpectedResult(
                    "element list with a sort answered a count".to_string(),
                ))
            }
        };

        let mut items = Vec::new();
        for row in Rows::new(cursor, query.fetch_using) {
            let RawElement { fields, properties } = row?;
            let inline = match (&properties, with_props) {
                (None, true) => values_from_inline(&fields),
                _ => None,
            };

            let mut item = ElementModel::<K>::unbound();
            if complete {
                item.fill(fields);
            } else {
                item.seed(fields);
            }
            if with_props {
                if let Some(properties) = properties {
                    item.fill_properties(properties);
                } else if let Some(values) = inline {
                    item.fill_property_values(values);
                }
            }
            items.push(item);
        }

        Ok(items)
    }

    fn fetch_count<S>(query: &Query<Self>, store: &S) -> Result<u64, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        let params = ElementListParams {
            sort: None,
            filter: &query.filter,
            group_by: None,
            navigation: None,
            select: &[],
        };

        match store.element_list(&params)? {
            ElementListing::Count(count) => Ok(count),
            ElementListing::Rows(_) => Err(ModelError::UnexpectedResult(
                "element list without a sort answered rows instead of a count".to_string(),
            )),
        }
    }
}
