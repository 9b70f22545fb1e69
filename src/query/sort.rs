//! Sort key/direction handling for list screens.

use serde::{Deserialize, Serialize};

/// Sort direction sent to the data API and kept in the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

enum_display_fromstr!(
    SortOrder,
    crate::error::ListError::invalid_sort_order,
    {
        Asc => "asc",
        Desc => "desc",
    }
);

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Resolve a click on a sortable column.
///
/// Clicking the active column flips the direction; clicking any other column
/// makes it active in ascending order.
pub fn next_sort(
    current_key: Option<&str>,
    current_order: SortOrder,
    clicked: &str,
) -> (String, SortOrder) {
    if current_key == Some(clicked) {
        (clicked.to_string(), current_order.toggle())
    } else {
        (clicked.to_string(), SortOrder::Asc)
    }
}
