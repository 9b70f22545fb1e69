//! Keeps a list screen's state and the address bar in sync.
//!
//! URL → state happens once on mount and again on external navigation
//! (back/forward). State → URL happens on every settled change. The binding
//! remembers the last query it wrote so a navigation event echoing that write
//! is ignored instead of re-hydrating.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::{FilterSet, ListState, decode_query, encode_query};

/// The browser location, or anything standing in for it.
pub trait Location: Send + Sync {
    /// Current query string, without the leading `?`
    fn query(&self) -> String;

    /// Overwrite the current history entry
    fn replace(&self, query: &str);

    /// Add a history entry
    fn push(&self, query: &str);
}

/// Which settled changes become their own back-button stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Every change replaces the current entry
    Replace,
    /// Page navigation pushes, everything else replaces
    #[default]
    PushOnPage,
}

enum_display_fromstr!(
    HistoryPolicy,
    crate::error::ListError::invalid_history_policy,
    {
        Replace => "replace",
        PushOnPage => "push_on_page",
    }
);

/// What kind of change is being written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// `go_to_page`
    Page,
    /// Search, filter, sort, page size, reset and clamping
    Refine,
}

pub struct UrlBinding {
    location: Arc<dyn Location>,
    policy: HistoryPolicy,
    last_written: Mutex<Option<String>>,
}

impl UrlBinding {
    pub fn new(location: Arc<dyn Location>, policy: HistoryPolicy) -> Self {
        Self {
            location,
            policy,
            last_written: Mutex::new(None),
        }
    }

    /// Initial state for the screen, read from the current URL. Never writes.
    pub fn hydrate<F: FilterSet>(&self, defaults: &ListState<F>) -> ListState<F> {
        let query = strip(&self.location.query()).to_string();
        let state = decode_query(&query, defaults);
        *self.last_written.lock() = Some(query);
        state
    }

    /// Reflect a settled state in the URL. Returns false when the URL already
    /// shows it.
    pub fn write<F: FilterSet>(
        &self,
        state: &ListState<F>,
        defaults: &ListState<F>,
        change: Change,
    ) -> bool {
        let query = encode_query(state, defaults);

        let mut last = self.last_written.lock();
        if last.as_deref() == Some(query.as_str()) {
            return false;
        }

        if self.policy == HistoryPolicy::PushOnPage && change == Change::Page {
            self.location.push(&query);
        } else {
            self.location.replace(&query);
        }
        *last = Some(query);
        true
    }

    /// Handle an external navigation to `query`.
    ///
    /// Returns the state to adopt, or `None` when the URL is the one this
    /// binding wrote last.
    pub fn on_navigate<F: FilterSet>(
        &self,
        query: &str,
        defaults: &ListState<F>,
    ) -> Option<ListState<F>> {
        let query = strip(query);

        let mut last = self.last_written.lock();
        if last.as_deref() == Some(query) {
            debug!("ignoring navigation to the current URL");
            return None;
        }
        *last = Some(query.to_string());
        Some(decode_query(query, defaults))
    }
}

fn strip(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}

#[derive(Debug, Default)]
struct History {
    entries: Vec<String>,
    index: usize,
    pushes: usize,
    replaces: usize,
}

/// In-memory session history with back/forward, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryLocation {
    history: Mutex<History>,
}

impl MemoryLocation {
    pub fn new(initial_query: &str) -> Self {
        Self {
            history: Mutex::new(History {
                entries: vec![strip(initial_query).to_string()],
                ..History::default()
            }),
        }
    }

    /// Step back one entry; returns the new query
    pub fn back(&self) -> Option<String> {
        let mut history = self.history.lock();
        if history.index == 0 {
            return None;
        }
        history.index -= 1;
        Some(history.entries[history.index].clone())
    }

    /// Step forward one entry; returns the new query
    pub fn forward(&self) -> Option<String> {
        let mut history = self.history.lock();
        if history.index + 1 >= history.entries.len() {
            return None;
        }
        history.index += 1;
        Some(history.entries[history.index].clone())
    }

    pub fn entries(&self) -> Vec<String> {
        self.history.lock().entries.clone()
    }

    pub fn push_count(&self) -> usize {
        self.history.lock().pushes
    }

    pub fn replace_count(&self) -> usize {
        self.history.lock().replaces
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> String {
        let history = self.history.lock();
        history.entries.get(history.index).cloned().unwrap_or_default()
    }

    fn replace(&self, query: &str) {
        let mut history = self.history.lock();
        let index = history.index;
        match history.entries.get_mut(index) {
            Some(entry) => *entry = query.to_string(),
            None => history.entries.push(query.to_string()),
        }
        history.replaces += 1;
    }

    fn push(&self, query: &str) {
        let mut history = self.history.lock();
        let keep = (history.index + 1).min(history.entries.len());
        history.entries.truncate(keep);
        history.entries.push(query.to_string());
        history.index = history.entries.len() - 1;
        history.pushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recruiters::{RecruiterFilters, recruiter_defaults};

    fn binding(initial: &str, policy: HistoryPolicy) -> (Arc<MemoryLocation>, UrlBinding) {
        let location = Arc::new(MemoryLocation::new(initial));
        let binding = UrlBinding::new(location.clone(), policy);
        (location, binding)
    }

    #[test]
    fn test_hydrate_reads_without_writing() {
        let (location, binding) = binding("?search=kim&page=3", HistoryPolicy::PushOnPage);
        let defaults = recruiter_defaults(25);

        let state: ListState<RecruiterFilters> = binding.hydrate(&defaults);
        assert_eq!(state.search, "kim");
        assert_eq!(state.page, 3);
        assert_eq!(location.push_count() + location.replace_count(), 0);
    }

    #[test]
    fn test_write_skips_unchanged_url() {
        let (location, binding) = binding("", HistoryPolicy::Replace);
        let defaults = recruiter_defaults(25);
        let state = binding.hydrate(&defaults);

        assert!(!binding.write(&state, &defaults, Change::Refine));
        assert_eq!(location.replace_count(), 0);

        let searched = ListState {
            search: "kim".to_string(),
            ..state
        };
        assert!(binding.write(&searched, &defaults, Change::Refine));
        assert_eq!(location.query(), "search=kim");
        assert_eq!(location.replace_count(), 1);
    }

    #[test]
    fn test_page_changes_push_under_default_policy() {
        let (location, binding) = binding("", HistoryPolicy::PushOnPage);
        let defaults = recruiter_defaults(25);
        let state = binding.hydrate(&defaults);

        let page_two = ListState { page: 2, ..state.clone() };
        binding.write(&page_two, &defaults, Change::Page);
        let refined = ListState {
            search: "kim".to_string(),
            ..state
        };
        binding.write(&refined, &defaults, Change::Refine);

        assert_eq!(location.push_count(), 1);
        assert_eq!(location.replace_count(), 1);
        assert_eq!(location.entries(), vec!["".to_string(), "search=kim".to_string()]);
    }

    #[test]
    fn test_replace_policy_never_pushes() {
        let (location, binding) = binding("", HistoryPolicy::Replace);
        let defaults = recruiter_defaults(25);
        let state = binding.hydrate(&defaults);

        binding.write(&ListState { page: 2, ..state }, &defaults, Change::Page);
        assert_eq!(location.push_count(), 0);
        assert_eq!(location.entries(), vec!["page=2".to_string()]);
    }

    #[test]
    fn test_navigation_echo_is_ignored() {
        let (_location, binding) = binding("", HistoryPolicy::PushOnPage);
        let defaults = recruiter_defaults(25);
        let state = binding.hydrate(&defaults);
        binding.write(&ListState { page: 4, ..state }, &defaults, Change::Page);

        assert!(binding.on_navigate("?page=4", &defaults).is_none());

        let back = binding.on_navigate("", &defaults).unwrap();
        assert_eq!(back.page, 1);
    }

    #[test]
    fn test_memory_location_back_and_forward() {
        let location = MemoryLocation::new("a=1");
        location.push("a=2");
        location.push("a=3");

        assert_eq!(location.back().as_deref(), Some("a=2"));
        assert_eq!(location.back().as_deref(), Some("a=1"));
        assert_eq!(location.back(), None);
        assert_eq!(location.forward().as_deref(), Some("a=2"));

        // Pushing from the middle discards forward entries
        location.push("b=1");
        assert_eq!(location.forward(), None);
        assert_eq!(location.entries(), vec!["a=1", "a=2", "b=1"]);
    }

    #[test]
    fn test_history_policy_parse() {
        assert_eq!(
            "push_on_page".parse::<HistoryPolicy>().unwrap(),
            HistoryPolicy::PushOnPage
        );
        assert!("sometimes".parse::<HistoryPolicy>().is_err());
    }
}
