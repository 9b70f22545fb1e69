//! List state and its query-string codec.
//!
//! The codec maps a [`ListState`] to and from URL query pairs. Conventions:
//! - reserved keys are `search`, `sortBy`, `sortOrder`, `page` and `pageSize`;
//!   every other key is a filter declared by the screen's [`FilterSet`]
//! - list filters are written as repeated keys (`skills=rust&skills=go`)
//! - a field equal to its default is omitted
//! - a filter or `sortBy` that is unset while its default is set is written
//!   with an empty value (`status=`)
//!
//! Decoding never fails: unknown keys are ignored and unparseable values fall
//! back to the supplied defaults.

pub mod filter;
pub mod sort;

use std::collections::HashMap;

use tracing::debug;

pub use filter::{FilterField, FilterKind, FilterSet, FilterValue, checked_value};
pub use sort::{SortOrder, next_sort};

pub const SEARCH_KEY: &str = "search";
pub const SORT_BY_KEY: &str = "sortBy";
pub const SORT_ORDER_KEY: &str = "sortOrder";
pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "pageSize";

/// Keys that belong to the URL or the data API request and can never be
/// filter names.
pub const RESERVED_KEYS: &[&str] = &[
    SEARCH_KEY,
    SORT_BY_KEY,
    SORT_ORDER_KEY,
    PAGE_KEY,
    PAGE_SIZE_KEY,
    "sort",
    "order",
    "limit",
    "include",
];

pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Ordered key/value pairs, the in-memory form of a query string.
pub type QueryPairs = Vec<(String, String)>;

/// Everything that determines which slice of a collection is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<F> {
    pub search: String,
    pub filters: F,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl<F: FilterSet> Default for ListState<F> {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: F::default(),
            sort_by: None,
            sort_order: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<F: FilterSet> ListState<F> {
    pub fn with_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(key.into());
        self.sort_order = order;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn filter_fields<F: FilterSet>() -> impl Iterator<Item = &'static FilterField> {
    F::FIELDS
        .iter()
        .filter(|field| !RESERVED_KEYS.contains(&field.name))
}

/// Encode `state` as query pairs, omitting every field equal to `defaults`.
pub fn encode<F: FilterSet>(state: &ListState<F>, defaults: &ListState<F>) -> QueryPairs {
    let mut pairs = QueryPairs::new();

    if state.search != defaults.search {
        pairs.push((SEARCH_KEY.to_string(), state.search.clone()));
    }
    if state.sort_by != defaults.sort_by {
        pairs.push((
            SORT_BY_KEY.to_string(),
            state.sort_by.clone().unwrap_or_default(),
        ));
    }
    if state.sort_order != defaults.sort_order {
        pairs.push((
            SORT_ORDER_KEY.to_string(),
            state.sort_order.as_str().to_string(),
        ));
    }
    if state.page != defaults.page {
        pairs.push((PAGE_KEY.to_string(), state.page.to_string()));
    }
    if state.page_size != defaults.page_size {
        pairs.push((PAGE_SIZE_KEY.to_string(), state.page_size.to_string()));
    }

    for field in filter_fields::<F>() {
        let value = state.filters.get(field.name);
        if value == defaults.filters.get(field.name) {
            continue;
        }
        match value {
            Some(value) => {
                for item in value.to_query_values() {
                    pairs.push((field.name.to_string(), item));
                }
            }
            None => pairs.push((field.name.to_string(), String::new())),
        }
    }

    pairs
}

/// Encode `state` as a form-urlencoded query string without the leading `?`.
/// An all-default state encodes to the empty string.
pub fn encode_query<F: FilterSet>(state: &ListState<F>, defaults: &ListState<F>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(encode(state, defaults))
        .finish()
}

/// Decode query pairs on top of `defaults`.
pub fn decode<F, I, K, V>(pairs: I, defaults: &ListState<F>) -> ListState<F>
where
    F: FilterSet,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in pairs {
        grouped
            .entry(key.as_ref().to_string())
            .or_default()
            .push(value.as_ref().to_string());
    }
    let mut state = defaults.clone();

    if let Some(search) = first_value(&grouped, SEARCH_KEY) {
        state.search = search.clone();
    }

    if let Some(sort_by) = first_value(&grouped, SORT_BY_KEY) {
        state.sort_by = (!sort_by.is_empty()).then(|| sort_by.clone());
    }

    if let Some(raw) = first_value(&grouped, SORT_ORDER_KEY) {
        match raw.parse::<SortOrder>() {
            Ok(order) => state.sort_order = order,
            Err(e) => debug!("ignoring query value: {e}"),
        }
    }

    if let Some(raw) = first_value(&grouped, PAGE_KEY) {
        match parse_positive(raw) {
            Some(page) => state.page = page,
            None => debug!("ignoring invalid page '{raw}'"),
        }
    }

    if let Some(raw) = first_value(&grouped, PAGE_SIZE_KEY) {
        match parse_positive(raw) {
            Some(page_size) => state.page_size = page_size,
            None => debug!("ignoring invalid page size '{raw}'"),
        }
    }

    for field in filter_fields::<F>() {
        let Some(raw) = grouped.get(field.name) else {
            continue;
        };

        let value = if raw.iter().all(|v| v.is_empty()) {
            None
        } else {
            match FilterValue::parse(field.kind, raw) {
                Some(value) => Some(value),
                None => {
                    debug!(
                        "ignoring filter '{}': expected {}",
                        field.name,
                        field.kind.describe()
                    );
                    continue;
                }
            }
        };

        if let Err(e) = state.filters.put(field.name, value) {
            debug!("ignoring filter '{}': {e}", field.name);
        }
    }

    state
}

/// Decode a raw query string (with or without the leading `?`).
pub fn decode_query<F: FilterSet>(query: &str, defaults: &ListState<F>) -> ListState<F> {
    let query = query.strip_prefix('?').unwrap_or(query);
    decode(url::form_urlencoded::parse(query.as_bytes()), defaults)
}

fn first_value<'a>(grouped: &'a HashMap<String, Vec<String>>, key: &str) -> Option<&'a String> {
    grouped.get(key).and_then(|values| values.first())
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

/// Request parameters for the data API.
///
/// `pageSize` is sent as `limit`, the sort as `sort` + `order`, unset filters
/// are left out entirely and `include` is passed through untouched.
pub fn to_api_params<F: FilterSet>(state: &ListState<F>, include: Option<&str>) -> QueryPairs {
    let mut params = QueryPairs::new();

    if !state.search.is_empty() {
        params.push(("search".to_string(), state.search.clone()));
    }

    for field in filter_fields::<F>() {
        if let Some(value) = state.filters.get(field.name) {
            for item in value.to_query_values() {
                params.push((field.name.to_string(), item));
            }
        }
    }

    if let Some(sort_by) = &state.sort_by {
        params.push(("sort".to_string(), sort_by.clone()));
        params.push(("order".to_string(), state.sort_order.as_str().to_string()));
    }

    params.push(("page".to_string(), state.page.to_string()));
    params.push(("limit".to_string(), state.page_size.to_string()));

    if let Some(include) = include.filter(|s| !s.is_empty()) {
        params.push(("include".to_string(), include.to_string()));
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestFilters {
        status: Option<String>,
        years_experience: Option<i64>,
        remote: Option<bool>,
        skills: Vec<String>,
        regions: Vec<i64>,
    }

    impl Default for TestFilters {
        fn default() -> Self {
            Self {
                status: Some("active".to_string()),
                years_experience: None,
                remote: None,
                skills: Vec::new(),
                regions: Vec::new(),
            }
        }
    }

    impl FilterSet for TestFilters {
        const FIELDS: &'static [FilterField] = &[
            FilterField::new("status", FilterKind::Text),
            FilterField::new("years_experience", FilterKind::Integer),
            FilterField::new("remote", FilterKind::Boolean),
            FilterField::new("skills", FilterKind::TextList),
            FilterField::new("regions", FilterKind::IntegerList),
        ];

        fn get(&self, key: &str) -> Option<FilterValue> {
            match key {
                "status" => self.status.clone().map(FilterValue::Text),
                "years_experience" => self.years_experience.map(FilterValue::Integer),
                "remote" => self.remote.map(FilterValue::Boolean),
                "skills" => FilterValue::TextList(self.skills.clone()).normalize(),
                "regions" => FilterValue::IntegerList(self.regions.clone()).normalize(),
                _ => None,
            }
        }

        fn put(&mut self, key: &str, value: Option<FilterValue>) -> Result<()> {
            let value = checked_value::<Self>(key, value)?;
            match key {
                "status" => self.status = value.and_then(FilterValue::into_text),
                "years_experience" => {
                    self.years_experience = value.and_then(FilterValue::into_integer)
                }
                "remote" => self.remote = value.and_then(FilterValue::into_boolean),
                "skills" => self.skills = value.map(FilterValue::into_text_list).unwrap_or_default(),
                "regions" => {
                    self.regions = value.map(FilterValue::into_integer_list).unwrap_or_default()
                }
                _ => return Err(crate::error::ListError::UnknownFilter(key.to_string())),
            }
            Ok(())
        }
    }

    fn defaults() -> ListState<TestFilters> {
        ListState::default().with_sort("created_at", SortOrder::Desc)
    }

    #[test]
    fn test_default_state_encodes_empty() {
        let defaults = defaults();
        assert_eq!(encode_query(&defaults, &defaults), "");
    }

    #[test]
    fn test_decode_deep_link_merges_defaults() {
        let state = decode_query("?search=kim&page=3&years_experience=5", &defaults());

        assert_eq!(state.search, "kim");
        assert_eq!(state.page, 3);
        assert_eq!(state.filters.years_experience, Some(5));
        assert_eq!(state.filters.status.as_deref(), Some("active"));
        assert_eq!(state.sort_by.as_deref(), Some("created_at"));
        assert_eq!(state.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_decode_ignores_garbage() {
        let state = decode_query(
            "page=abc&pageSize=0&sortOrder=up&years_experience=lots&unknown=1&%%%",
            &defaults(),
        );
        assert_eq!(state, defaults());
    }

    #[test]
    fn test_page_zero_falls_back() {
        let state = decode_query("page=0", &defaults());
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_cleared_default_filter_uses_empty_value() {
        let defaults = defaults();
        let mut state = defaults.clone();
        state.filters.put("status", None).unwrap();

        let query = encode_query(&state, &defaults);
        assert_eq!(query, "status=");
        assert!(!query.contains("undefined"));

        let decoded = decode_query(&query, &defaults);
        assert_eq!(decoded.filters.status, None);
    }

    #[test]
    fn test_unset_filter_left_out_of_api_params() {
        let mut state = defaults();
        state.filters.put("status", None).unwrap();

        let params = to_api_params(&state, None);
        assert!(params.iter().all(|(k, _)| k != "status"));
    }

    #[test]
    fn test_lists_encode_as_repeated_keys() {
        let defaults = defaults();
        let mut state = defaults.clone();
        state.filters.skills = vec!["rust".to_string(), "go".to_string()];

        insta::assert_snapshot!(encode_query(&state, &defaults), @"skills=rust&skills=go");

        let decoded = decode_query(&encode_query(&state, &defaults), &defaults);
        assert_eq!(decoded.filters.skills, vec!["rust", "go"]);
    }

    #[test]
    fn test_encode_escapes_values() {
        let defaults = defaults();
        let state = ListState {
            search: "kim & co".to_string(),
            ..defaults.clone()
        };
        insta::assert_snapshot!(encode_query(&state, &defaults), @"search=kim+%26+co");
    }

    #[test]
    fn test_unset_sort_round_trips() {
        let defaults = defaults();
        let state = ListState {
            sort_by: None,
            ..defaults.clone()
        };

        let query = encode_query(&state, &defaults);
        assert_eq!(query, "sortBy=");
        assert_eq!(decode_query(&query, &defaults), state);
    }

    #[test]
    fn test_api_params_shape() {
        let mut state = defaults();
        state.search = "kim".to_string();
        state.page = 2;
        state.filters.years_experience = Some(5);

        let params = to_api_params(&state, Some("companies"));
        let expected: QueryPairs = [
            ("search", "kim"),
            ("status", "active"),
            ("years_experience", "5"),
            ("sort", "created_at"),
            ("order", "desc"),
            ("page", "2"),
            ("limit", "25"),
            ("include", "companies"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn test_api_params_without_sort_or_include() {
        let state = ListState::<TestFilters>::default();
        let params = to_api_params(&state, Some(""));
        assert!(params.iter().all(|(k, _)| k != "sort" && k != "order" && k != "include"));
    }

    fn arb_state() -> impl Strategy<Value = ListState<TestFilters>> {
        let text = "[a-zA-Z0-9 &=?%+,]{1,12}";
        let filters = (
            proptest::option::of(text),
            proptest::option::of(any::<i64>()),
            proptest::option::of(any::<bool>()),
            proptest::collection::vec(text, 0..4),
            proptest::collection::vec(any::<i64>(), 0..4),
        )
            .prop_map(|(status, years_experience, remote, skills, regions)| TestFilters {
                status,
                years_experience,
                remote,
                skills,
                regions,
            });

        (
            "[a-zA-Z0-9 &=?%+,]{0,12}",
            filters,
            proptest::option::of("[a-z_]{1,10}"),
            any::<bool>(),
            1u32..500,
            1u32..200,
        )
            .prop_map(|(search, filters, sort_by, asc, page, page_size)| ListState {
                search,
                filters,
                sort_by,
                sort_order: if asc { SortOrder::Asc } else { SortOrder::Desc },
                page,
                page_size,
            })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(state in arb_state()) {
            let defaults = defaults();
            let query = encode_query(&state, &defaults);
            prop_assert_eq!(decode_query(&query, &defaults), state);
        }
    }
}
