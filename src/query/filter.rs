//! Typed filter sets for list screens.
//!
//! Every screen declares its filters as a plain struct implementing
//! [`FilterSet`]. The set of keys is closed: the query codec only reads and
//! writes the declared [`FilterField`]s, and [`FilterSet::put`] rejects
//! anything else.

use std::fmt::Debug;

use crate::error::{ListError, Result};

/// Value type accepted by a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    Integer,
    Boolean,
    TextList,
    IntegerList,
}

impl FilterKind {
    /// Human-readable description used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            FilterKind::Text => "text",
            FilterKind::Integer => "an integer",
            FilterKind::Boolean => "a boolean",
            FilterKind::TextList => "a list of text",
            FilterKind::IntegerList => "a list of integers",
        }
    }
}

/// A declared filter key together with its value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub kind: FilterKind,
}

impl FilterField {
    pub const fn new(name: &'static str, kind: FilterKind) -> Self {
        Self { name, kind }
    }
}

/// A set filter value. "Unset" is represented by `None` at the call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    TextList(Vec<String>),
    IntegerList(Vec<i64>),
}

impl FilterValue {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Text,
            FilterValue::Integer(_) => FilterKind::Integer,
            FilterValue::Boolean(_) => FilterKind::Boolean,
            FilterValue::TextList(_) => FilterKind::TextList,
            FilterValue::IntegerList(_) => FilterKind::IntegerList,
        }
    }

    /// Empty text and empty lists collapse to unset; empty list elements are
    /// dropped.
    pub fn normalize(self) -> Option<Self> {
        match self {
            FilterValue::Text(s) if s.is_empty() => None,
            FilterValue::TextList(items) => {
                let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
                (!items.is_empty()).then_some(FilterValue::TextList(items))
            }
            FilterValue::IntegerList(items) if items.is_empty() => None,
            other => Some(other),
        }
    }

    /// One query-string value per element (lists become repeated keys).
    pub fn to_query_values(&self) -> Vec<String> {
        match self {
            FilterValue::Text(s) => vec![s.clone()],
            FilterValue::Integer(n) => vec![n.to_string()],
            FilterValue::Boolean(b) => vec![b.to_string()],
            FilterValue::TextList(items) => items.clone(),
            FilterValue::IntegerList(items) => items.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Parse the raw query values collected for one key.
    ///
    /// Scalars use the first value. Returns `None` when nothing parseable
    /// remains, so the caller can fall back to its default.
    pub fn parse(kind: FilterKind, raw: &[String]) -> Option<Self> {
        let mut values = raw.iter().map(String::as_str).filter(|s| !s.is_empty());

        let parsed = match kind {
            FilterKind::Text => FilterValue::Text(values.next()?.to_string()),
            FilterKind::Integer => FilterValue::Integer(values.next()?.trim().parse().ok()?),
            FilterKind::Boolean => FilterValue::Boolean(parse_bool(values.next()?.trim())?),
            FilterKind::TextList => FilterValue::TextList(values.map(str::to_string).collect()),
            FilterKind::IntegerList => {
                let items: Option<Vec<i64>> = values.map(|s| s.trim().parse().ok()).collect();
                FilterValue::IntegerList(items?)
            }
        };

        parsed.normalize()
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_integer(self) -> Option<i64> {
        match self {
            FilterValue::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_boolean(self) -> Option<bool> {
        match self {
            FilterValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_text_list(self) -> Vec<String> {
        match self {
            FilterValue::TextList(items) => items,
            _ => Vec::new(),
        }
    }

    pub fn into_integer_list(self) -> Vec<i64> {
        match self {
            FilterValue::IntegerList(items) => items,
            _ => Vec::new(),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Integer(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::TextList(items)
    }
}

impl From<Vec<i64>> for FilterValue {
    fn from(items: Vec<i64>) -> Self {
        FilterValue::IntegerList(items)
    }
}

/// The filters of one list screen.
///
/// `Default::default()` is the screen's default filter state (for example
/// `status = active`); the codec omits fields equal to it.
///
/// Field names must not collide with the reserved query keys in
/// [`crate::query::RESERVED_KEYS`]; colliding fields are skipped by the codec.
pub trait FilterSet: Clone + Default + PartialEq + Debug + Send + Sync + 'static {
    const FIELDS: &'static [FilterField];

    /// Current value of `key`, `None` when unset or unknown.
    fn get(&self, key: &str) -> Option<FilterValue>;

    /// Set or clear `key`. Implementations should route the value through
    /// [`checked_value`] first.
    fn put(&mut self, key: &str, value: Option<FilterValue>) -> Result<()>;

    fn field(key: &str) -> Option<&'static FilterField> {
        Self::FIELDS.iter().find(|f| f.name == key)
    }

    /// Builder-style [`FilterSet::put`].
    fn with(mut self, key: &str, value: impl Into<FilterValue>) -> Result<Self> {
        self.put(key, Some(value.into()))?;
        Ok(self)
    }
}

/// Validate `value` against the declared kind of `key` and normalize it.
pub fn checked_value<F: FilterSet>(
    key: &str,
    value: Option<FilterValue>,
) -> Result<Option<FilterValue>> {
    let field = F::field(key).ok_or_else(|| ListError::UnknownFilter(key.to_string()))?;

    match value {
        None => Ok(None),
        Some(value) if value.kind() == field.kind => Ok(value.normalize()),
        Some(_) => Err(ListError::FilterType {
            key: key.to_string(),
            expected: field.kind.describe(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(
            FilterValue::parse(FilterKind::Integer, &raw(&["5"])),
            Some(FilterValue::Integer(5))
        );
        assert_eq!(FilterValue::parse(FilterKind::Integer, &raw(&["five"])), None);
        assert_eq!(FilterValue::parse(FilterKind::Integer, &raw(&[""])), None);
    }

    #[test]
    fn test_parse_boolean_variants() {
        assert_eq!(
            FilterValue::parse(FilterKind::Boolean, &raw(&["TRUE"])),
            Some(FilterValue::Boolean(true))
        );
        assert_eq!(
            FilterValue::parse(FilterKind::Boolean, &raw(&["0"])),
            Some(FilterValue::Boolean(false))
        );
        assert_eq!(FilterValue::parse(FilterKind::Boolean, &raw(&["maybe"])), None);
    }

    #[test]
    fn test_parse_lists() {
        assert_eq!(
            FilterValue::parse(FilterKind::TextList, &raw(&["rust", "", "go"])),
            Some(FilterValue::TextList(raw(&["rust", "go"])))
        );
        assert_eq!(
            FilterValue::parse(FilterKind::IntegerList, &raw(&["1", "2"])),
            Some(FilterValue::IntegerList(vec![1, 2]))
        );
        // One bad element discards the whole list
        assert_eq!(FilterValue::parse(FilterKind::IntegerList, &raw(&["1", "x"])), None);
        assert_eq!(FilterValue::parse(FilterKind::TextList, &raw(&[])), None);
    }

    #[test]
    fn test_normalize_empty_values() {
        assert_eq!(FilterValue::Text(String::new()).normalize(), None);
        assert_eq!(FilterValue::TextList(vec![]).normalize(), None);
        assert_eq!(FilterValue::IntegerList(vec![]).normalize(), None);
        assert_eq!(
            FilterValue::Integer(0).normalize(),
            Some(FilterValue::Integer(0))
        );
    }

    #[test]
    fn test_query_values_for_lists_repeat() {
        let value = FilterValue::IntegerList(vec![3, 4]);
        assert_eq!(value.to_query_values(), raw(&["3", "4"]));
    }
}
