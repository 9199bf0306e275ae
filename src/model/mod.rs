//! Element and section models.
//!
//! A model kind is a zero-sized type describing one iblock: which collection
//! it is bound to, which standard fields its rows carry and (for elements)
//! which section kind its sections resolve to. Kinds are resolved at compile
//! time; [`ElementModel<K>`] and [`SectionModel<K>`] are the per-record
//! entities built on them.
//!
//! Kinds are usually declared with [`iblock_element!`](crate::iblock_element)
//! and [`iblock_section!`](crate::iblock_section).

pub mod element;
pub(crate) mod save;
pub mod section;

pub use element::{DirectSection, ElementModel};
pub use section::SectionModel;

use crate::value::Id;

/// Standard element fields requested when a query selects all fields
pub const ELEMENT_STANDARD_FIELDS: &[&str] = &[
    "ID",
    "CODE",
    "XML_ID",
    "NAME",
    "IBLOCK_ID",
    "IBLOCK_SECTION_ID",
    "ACTIVE",
    "DATE_ACTIVE_FROM",
    "DATE_ACTIVE_TO",
    "SORT",
    "PREVIEW_PICTURE",
    "PREVIEW_TEXT",
    "PREVIEW_TEXT_TYPE",
    "DETAIL_PICTURE",
    "DETAIL_TEXT",
    "DETAIL_TEXT_TYPE",
    "SEARCHABLE_CONTENT",
    "DATE_CREATE",
    "CREATED_BY",
    "TIMESTAMP_X",
    "MODIFIED_BY",
    "TAGS",
    "SHOW_COUNTER",
    "DETAIL_PAGE_URL",
];

/// Standard section fields requested when a query selects all fields
pub const SECTION_STANDARD_FIELDS: &[&str] = &[
    "ID",
    "CODE",
    "EXTERNAL_ID",
    "IBLOCK_ID",
    "IBLOCK_SECTION_ID",
    "TIMESTAMP_X",
    "SORT",
    "NAME",
    "ACTIVE",
    "GLOBAL_ACTIVE",
    "PICTURE",
    "DESCRIPTION",
    "DESCRIPTION_TYPE",
    "LEFT_MARGIN",
    "RIGHT_MARGIN",
    "DEPTH_LEVEL",
    "SEARCHABLE_CONTENT",
    "SECTION_PAGE_URL",
    "MODIFIED_BY",
    "DATE_CREATE",
    "CREATED_BY",
    "DETAIL_PICTURE",
];

/// Binding of a model kind to its collection
pub trait IblockKind: 'static {
    /// Collection (iblock) id every query and property write is scoped to
    fn iblock_id() -> Id;
}

/// Kind of element models
pub trait ElementKind: IblockKind {
    /// Section kind the element's sections resolve to
    ///
    /// Use [`NoSections`] when the iblock has no section model.
    type Section: SectionKind;

    fn standard_fields() -> &'static [&'static str] {
        ELEMENT_STANDARD_FIELDS
    }
}

/// Kind of section models
pub trait SectionKind: IblockKind {
    fn standard_fields() -> &'static [&'static str] {
        SECTION_STANDARD_FIELDS
    }

    /// Whether this kind is a real section binding
    fn is_bound() -> bool {
        true
    }
}

/// Section kind for elements without a section model.
///
/// Resolving a section through it fails with
/// [`ModelError::Configuration`](crate::ModelError::Configuration).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSections;

impl IblockKind for NoSections {
    fn iblock_id() -> Id {
        0
    }
}

impl SectionKind for NoSections {
    fn is_bound() -> bool {
        false
    }
}
