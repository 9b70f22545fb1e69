//! Wire types shared by the controller and the data API.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Pagination block reported by the data API.
///
/// Always taken verbatim from the most recent applied response; nothing in
/// this crate recomputes `total_pages` locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub total_items: u64,
    pub total_pages: u32,
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Highest page a caller may navigate to. `total_pages == 0` still
    /// allows page 1.
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }
}

/// Response body of a list endpoint: `{ data: [...], pagination: {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Body of a lookup endpoint used by derived caches: `{ data: [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
}

/// The only part of an item the controller looks at.
pub trait Identified {
    type Id: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}
