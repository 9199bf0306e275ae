//! Plain criteria types passed from queries to the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// Ordered field to direction list
pub type Sort = Vec<(String, SortOrder)>;

/// Pagination parameters for a list call.
///
/// `top_count` caps the number of rows; `page_size` with `page_num`
/// (1-based) selects one page. When both are set, `top_count` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Navigation {
    pub top_count: Option<u64>,
    pub page_size: Option<u64>,
    pub page_num: Option<u64>,
}

impl Navigation {
    /// Limit the result to the first `count` rows
    #[must_use]
    pub fn top(count: u64) -> Self {
        Self {
            top_count: Some(count),
            ..Self::default()
        }
    }

    /// Select page `page_num` (1-based) of `page_size` rows
    #[must_use]
    pub fn page(page_size: u64, page_num: u64) -> Self {
        Self {
            top_count: None,
            page_size: Some(page_size),
            page_num: Some(page_num.max(1)),
        }
    }

    /// Rows to skip and maximum rows to take
    #[must_use]
    pub fn window(&self) -> (usize, Option<usize>) {
        if let Some(top) = self.top_count {
            return (0, Some(clamp_usize(top)));
        }
        match self.page_size {
            Some(size) => {
                let page = self.page_num.unwrap_or(1).max(1);
                let skip = (page - 1).saturating_mul(size);
                (clamp_usize(skip), Some(clamp_usize(size)))
            }
            None => (0, None),
        }
    }
}

// Windows past the addressable range saturate instead of wrapping
fn clamp_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Which cursor primitive element lists are read with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchUsing {
    /// Simple rows: one flat field map per element, properties inline
    GetNext,
    /// Row objects exposing fields and properties separately
    #[default]
    GetNextElement,
}
