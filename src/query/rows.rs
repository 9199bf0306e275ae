//! Strategy-agnostic iteration over an element cursor.

use super::criteria::FetchUsing;
use crate::error::StoreError;
use crate::store::ElementCursor;
use crate::value::{Fields, Properties};

/// One element row as read by either strategy
pub(crate) struct RawElement {
    pub(crate) fields: Fields,
    /// Present for row objects only; simple rows carry properties inline
    pub(crate) properties: Option<Properties>,
}

/// Iterator reading a cursor with the configured [`FetchUsing`] strategy
pub(crate) struct Rows<'c> {
    cursor: Box<dyn ElementCursor + 'c>,
    strategy: FetchUsing,
}

impl<'c> Rows<'c> {
    pub(crate) fn new(cursor: Box<dyn ElementCursor + 'c>, strategy: FetchUsing) -> Self {
        Self { cursor, strategy }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<RawElement, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.strategy {
            FetchUsing::GetNext => self.cursor.get_next().map(|row| {
                row.map(|fields| RawElement {
                    fields,
                    properties: None,
                })
            }),
            FetchUsing::GetNextElement => self.cursor.get_next_element().map(|row| {
                row.map(|row| {
                    let (fields, properties) = row.into_parts();
                    RawElement {
                        fields,
                        properties: Some(properties),
                    }
                })
            }),
        };
        row.transpose()
    }
}
