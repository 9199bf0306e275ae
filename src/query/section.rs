//! Section-specific query behaviour.

use super::{Query, QueryTarget, SectionQuery};
use crate::error::ModelError;
use crate::model::{SectionKind, SectionModel};
use crate::store::{IblockStore, SectionListParams};
use crate::value::{key_string, Id};

impl<K: SectionKind> SectionQuery<K> {
    /// Annotate each row with the number of elements in the section
    pub fn count_elements(mut self, count_elements: bool) -> Self {
        self.count_elements = count_elements;
        self
    }
}

impl<K: SectionKind> QueryTarget for SectionModel<K> {
    fn iblock_id() -> Id {
        K::iblock_id()
    }

    fn standard_fields() -> &'static [&'static str] {
        K::standard_fields()
    }

    fn custom_fields_wildcard() -> &'static str {
        "UF_*"
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
        let select = query.normalized_select();
        let complete = query.fields_must_be_selected();

        let params = SectionListParams {
            sort: &query.sort,
            filter: &query.filter,
            count_elements: query.count_elements,
            select: &select,
            navigation: query.navigation.as_ref(),
        };
        log::debug!("listing sections of iblock {}", K::iblock_id());

        let mut cursor = store.section_list(&params)?;
        let mut items = Vec::new();
        while let Some(row) = cursor.fetch()? {
            let mut item = SectionModel::<K>::default();
            if complete {
                item.fill(row);
            } else {
                item.seed(row);
            }
            items.push(item);
        }

        Ok(items)
    }

    fn fetch_count<S>(query: &Query<Self>, store: &S) -> Result<u64, ModelError>
    where
        S: IblockStore + ?Sized,
    {
        Ok(store.section_count(&query.filter)?)
    }
}
