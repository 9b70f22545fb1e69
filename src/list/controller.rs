//! The list controller.
//!
//! One controller owns the [`ListState`] of a mounted list screen. Every
//! mutator produces the next state under the controller's lock and then fires
//! the two side effects explicitly: the URL write and a gated fetch. Results
//! are published to subscribers through a `watch` channel.
//!
//! Lock order is `DebouncedInput` → controller. Nothing in here touches the
//! search input while holding the controller lock, because the input commits
//! while holding its own.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ListError, Result};
use crate::query::{FilterSet, FilterValue, ListState, next_sort, to_api_params};
use crate::remote::{ApiRequest, Transport};
use crate::types::{Page, Pagination};

use super::debounce::DebouncedInput;
use super::gate::{Epoch, GateOutcome, RequestGate};
use super::toast::Toast;
use super::url_binding::{Change, HistoryPolicy, Location, UrlBinding};

/// How a list screen is set up.
#[derive(Debug, Clone)]
pub struct ListOptions<F> {
    /// State used for every key the URL does not set
    pub defaults: ListState<F>,
    /// Related-data hint passed through to the data API
    pub include: Option<String>,
    pub debounce: Duration,
    pub history_policy: HistoryPolicy,
}

impl<F: FilterSet> ListOptions<F> {
    pub fn new(defaults: ListState<F>) -> Self {
        Self {
            defaults,
            include: None,
            debounce: Duration::from_millis(300),
            history_policy: HistoryPolicy::default(),
        }
    }

    /// Debounce delay and history policy from `config`
    pub fn from_config(config: &Config, defaults: ListState<F>) -> Self {
        Self {
            debounce: config.search_debounce(),
            history_policy: config.history_policy,
            ..Self::new(defaults)
        }
    }

    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }
}

/// What the UI renders from.
pub struct ListSnapshot<F, T> {
    pub state: ListState<F>,
    /// Last-good items
    pub data: Arc<Vec<T>>,
    /// `None` until the first response is applied
    pub pagination: Option<Pagination>,
    pub loading: bool,
    pub toast: Option<Toast>,
    pub mounted: bool,
}

impl<F: Clone, T> Clone for ListSnapshot<F, T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            data: Arc::clone(&self.data),
            pagination: self.pagination,
            loading: self.loading,
            toast: self.toast.clone(),
            mounted: self.mounted,
        }
    }
}

struct Inner<F, T> {
    state: ListState<F>,
    data: Arc<Vec<T>>,
    pagination: Option<Pagination>,
    gate: RequestGate,
    toast: Option<Toast>,
    tasks: Vec<AbortHandle>,
    snapshots: Option<watch::Sender<ListSnapshot<F, T>>>,
}

impl<F: FilterSet, T> Inner<F, T> {
    fn mounted(&self) -> bool {
        !self.gate.is_closed()
    }

    fn snapshot(&self) -> ListSnapshot<F, T> {
        ListSnapshot {
            state: self.state.clone(),
            data: Arc::clone(&self.data),
            pagination: self.pagination,
            loading: self.gate.is_loading(),
            toast: self.toast.clone(),
            mounted: self.mounted(),
        }
    }

    fn publish(&self) {
        if let Some(tx) = &self.snapshots {
            tx.send_replace(self.snapshot());
        }
    }

    /// Highest page `go_to_page` may reach
    fn last_page(&self) -> u32 {
        self.pagination.map_or(1, |p| p.last_page())
    }
}

struct Shared<F, T> {
    defaults: ListState<F>,
    include: Option<String>,
    transport: Arc<dyn Transport<T>>,
    url: UrlBinding,
    search: DebouncedInput,
    receiver: watch::Receiver<ListSnapshot<F, T>>,
    inner: Mutex<Inner<F, T>>,
}

impl<F, T> Shared<F, T>
where
    F: FilterSet,
    T: Send + Sync + 'static,
{
    /// Replace the state through `mutate`, write the URL and fetch. A failing
    /// `mutate` leaves the state untouched.
    fn try_update(
        self: &Arc<Self>,
        change: Change,
        mutate: impl FnOnce(&mut ListState<F>) -> Result<()>,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.mounted() {
            return Err(ListError::Unmounted);
        }

        let mut next = inner.state.clone();
        mutate(&mut next)?;
        inner.state = next;

        self.url.write(&inner.state, &self.defaults, change);
        self.issue(&mut inner);
        inner.publish();
        Ok(())
    }

    fn update(self: &Arc<Self>, change: Change, mutate: impl FnOnce(&mut ListState<F>)) {
        let result = self.try_update(change, |state| {
            mutate(state);
            Ok(())
        });
        if let Err(e) = result {
            debug!("ignoring update: {e}");
        }
    }

    fn commit_search(self: &Arc<Self>, value: String) {
        self.update(Change::Refine, |state| {
            state.search = value;
            state.page = 1;
        });
    }

    /// Start a fetch for the current state under a fresh epoch.
    fn issue(self: &Arc<Self>, inner: &mut Inner<F, T>) {
        let epoch = inner.gate.begin();
        let request = ApiRequest::new(to_api_params(&inner.state, self.include.as_deref()));
        debug!("issuing fetch {epoch} for page {}", inner.state.page);

        let transport = Arc::clone(&self.transport);
        let shared = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let result = transport.fetch(&request).await;
            if let Some(shared) = shared.upgrade() {
                shared.settle(epoch, result);
            }
        });

        inner.tasks.retain(|t| !t.is_finished());
        inner.tasks.push(task.abort_handle());
    }

    fn settle(self: &Arc<Self>, epoch: Epoch, result: Result<Page<T>>) {
        let mut inner = self.inner.lock();

        let outcome = inner.gate.settle(epoch, result);
        match outcome {
            Ok(GateOutcome::Applied(page)) => {
                let last_page = page.pagination.last_page();
                inner.pagination = Some(page.pagination);
                inner.toast = None;

                if inner.state.page > last_page {
                    debug!(
                        "page {} is past the last page {last_page}, clamping",
                        inner.state.page
                    );
                    inner.state.page = last_page;
                    self.url.write(&inner.state, &self.defaults, Change::Refine);

                    if page.pagination.total_pages == 0 {
                        // Nothing matches on any page
                        inner.data = Arc::new(page.data);
                    } else {
                        // Keep the last-good items and ask again for the last page
                        self.issue(&mut inner);
                    }
                } else {
                    debug!("applied fetch {epoch}: {} items", page.data.len());
                    inner.data = Arc::new(page.data);
                }
            }
            Ok(GateOutcome::Dropped) => {}
            Err(e) => {
                warn!("fetch {epoch} failed: {e}");
                inner.toast = Some(Toast::fetch_failed(&e));
            }
        }

        inner.publish();
    }
}

/// A paginated, sorted, filtered and searchable collection bound to the URL.
///
/// Requires a Tokio runtime. Dropping the controller unmounts it.
pub struct ListController<F, T>
where
    F: FilterSet,
    T: Send + Sync + 'static,
{
    shared: Arc<Shared<F, T>>,
}

impl<F, T> ListController<F, T>
where
    F: FilterSet,
    T: Send + Sync + 'static,
{
    /// Hydrate from `location` and issue the first fetch.
    ///
    /// The first request already carries whatever the URL deep-links to.
    pub fn mount(
        transport: Arc<dyn Transport<T>>,
        location: Arc<dyn Location>,
        options: ListOptions<F>,
    ) -> Self {
        let ListOptions {
            defaults,
            include,
            debounce,
            history_policy,
        } = options;

        let url = UrlBinding::new(location, history_policy);
        let state = url.hydrate(&defaults);
        debug!("mounted list at page {}", state.page);

        let inner = Inner {
            state: state.clone(),
            data: Arc::new(Vec::new()),
            pagination: None,
            gate: RequestGate::new(),
            toast: None,
            tasks: Vec::new(),
            snapshots: None,
        };
        let (tx, receiver) = watch::channel(inner.snapshot());

        let shared = Arc::new_cyclic(|weak: &Weak<Shared<F, T>>| {
            let weak = weak.clone();
            let search = DebouncedInput::new(debounce, move |value| {
                if let Some(shared) = weak.upgrade() {
                    shared.commit_search(value);
                }
            });
            search.set_value(state.search.clone());

            Shared {
                defaults,
                include,
                transport,
                url,
                search,
                receiver,
                inner: Mutex::new(Inner {
                    snapshots: Some(tx),
                    ..inner
                }),
            }
        });

        {
            let mut inner = shared.inner.lock();
            shared.issue(&mut inner);
            inner.publish();
        }

        Self { shared }
    }

    pub fn snapshot(&self) -> ListSnapshot<F, T> {
        self.shared.inner.lock().snapshot()
    }

    /// Receive a new snapshot after every change. The channel closes on
    /// unmount.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<F, T>> {
        match &self.shared.inner.lock().snapshots {
            Some(tx) => tx.subscribe(),
            None => self.shared.receiver.clone(),
        }
    }

    pub fn state(&self) -> ListState<F> {
        self.shared.inner.lock().state.clone()
    }

    pub fn data(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.shared.inner.lock().data)
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.shared.inner.lock().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.shared.inner.lock().gate.is_loading()
    }

    pub fn toast(&self) -> Option<Toast> {
        self.shared.inner.lock().toast.clone()
    }

    pub fn dismiss_toast(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.toast.take().is_some() {
            inner.publish();
        }
    }

    pub fn defaults(&self) -> &ListState<F> {
        &self.shared.defaults
    }

    /// The visible search text, possibly not committed yet
    pub fn search_input(&self) -> String {
        self.shared.search.value()
    }

    /// Set or clear one filter, back to page 1.
    ///
    /// Fails without side effects for an undeclared key, a value of the
    /// wrong kind, or after unmount.
    pub fn set_filter(&self, key: &str, value: Option<FilterValue>) -> Result<()> {
        self.shared.try_update(Change::Refine, |state| {
            state.filters.put(key, value)?;
            state.page = 1;
            Ok(())
        })
    }

    /// Replace every filter at once, back to page 1.
    pub fn set_filters(&self, filters: F) {
        self.shared.update(Change::Refine, |state| {
            state.filters = filters;
            state.page = 1;
        });
    }

    /// Feed a keystroke into the debounced search.
    pub fn set_search(&self, raw: impl Into<String>) {
        self.shared.search.on_change(raw);
    }

    /// Commit the typed search now instead of waiting out the delay.
    pub fn submit_search(&self) {
        self.shared.search.flush();
    }

    pub fn clear_search(&self) {
        self.shared.search.clear();
    }

    /// Column header click: flips the order of the active column, otherwise
    /// sorts by `key` ascending. An empty key is ignored.
    pub fn handle_sort(&self, key: &str) {
        if key.is_empty() {
            debug!("ignoring sort on an empty column key");
            return;
        }
        self.shared.update(Change::Refine, |state| {
            let (sort_by, sort_order) = next_sort(state.sort_by.as_deref(), state.sort_order, key);
            state.sort_by = Some(sort_by);
            state.sort_order = sort_order;
            state.page = 1;
        });
    }

    /// Move to page `n`, clamped to the last known page.
    pub fn go_to_page(&self, n: u32) {
        let shared = &self.shared;
        let mut inner = shared.inner.lock();
        if !inner.mounted() {
            return;
        }

        inner.state.page = n.clamp(1, inner.last_page());
        shared.url.write(&inner.state, &shared.defaults, Change::Page);
        shared.issue(&mut inner);
        inner.publish();
    }

    pub fn set_page_size(&self, page_size: u32) {
        self.shared.update(Change::Refine, |state| {
            state.page_size = page_size.max(1);
            state.page = 1;
        });
    }

    /// Fetch the current state again without changing it.
    pub fn refresh(&self) {
        let shared = &self.shared;
        let mut inner = shared.inner.lock();
        if !inner.mounted() {
            return;
        }
        shared.issue(&mut inner);
        inner.publish();
    }

    /// Back to the screen defaults, dropping any half-typed search.
    pub fn reset(&self) {
        let defaults = self.shared.defaults.clone();
        self.shared.search.set_value(defaults.search.clone());
        self.shared.update(Change::Refine, |state| *state = defaults);
    }

    /// External navigation (back/forward) to `query`.
    ///
    /// Re-hydrates and fetches without writing the URL. Returns false when
    /// the URL is the one the controller wrote last, or after unmount.
    pub fn navigate(&self, query: &str) -> bool {
        let shared = &self.shared;
        if !self.is_mounted() {
            return false;
        }
        let Some(state) = shared.url.on_navigate(query, &shared.defaults) else {
            return false;
        };
        shared.search.set_value(state.search.clone());

        let mut inner = shared.inner.lock();
        if !inner.mounted() {
            return false;
        }
        inner.state = state;
        shared.issue(&mut inner);
        inner.publish();
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.inner.lock().mounted()
    }

    /// Tear down: no fetch result, search commit or snapshot is delivered
    /// after this returns.
    pub fn unmount(&self) {
        self.shared.search.close();

        let mut inner = self.shared.inner.lock();
        if !inner.mounted() {
            return;
        }
        inner.gate.close();
        for task in inner.tasks.drain(..) {
            task.abort();
        }
        inner.publish();
        inner.snapshots = None;
        debug!("unmounted list");
    }
}

impl<F, T> Drop for ListController<F, T>
where
    F: FilterSet,
    T: Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recruiters::{RecruiterFilters, recruiter_defaults};
    use crate::list::url_binding::MemoryLocation;
    use futures::future::BoxFuture;

    /// Answers every request with one item per page number
    struct EchoTransport;

    impl Transport<u32> for EchoTransport {
        fn fetch<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<Page<u32>>> {
            Box::pin(async move {
                let page: u32 = request.param("page").and_then(|p| p.parse().ok()).unwrap_or(1);
                Ok(Page {
                    data: vec![page],
                    pagination: Pagination {
                        total_items: 100,
                        total_pages: 4,
                        page,
                        page_size: 25,
                    },
                })
            })
        }
    }

    fn mount(query: &str) -> (Arc<MemoryLocation>, ListController<RecruiterFilters, u32>) {
        let location = Arc::new(MemoryLocation::new(query));
        let controller = ListController::mount(
            Arc::new(EchoTransport),
            location.clone(),
            ListOptions::new(recruiter_defaults(25)),
        );
        (location, controller)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_hydrated_page() {
        let (_location, controller) = mount("page=2");
        assert!(controller.is_loading());

        settle().await;
        assert!(!controller.is_loading());
        assert_eq!(*controller.data(), vec![2]);
        assert_eq!(controller.pagination().unwrap().total_pages, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deep_link_past_the_end_is_clamped() {
        let (location, controller) = mount("page=9");
        settle().await;

        assert_eq!(controller.state().page, 4);
        assert_eq!(*controller.data(), vec![4]);
        assert_eq!(location.query(), "page=4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sort_key_is_ignored() {
        let (location, controller) = mount("");
        settle().await;

        controller.handle_sort("");
        settle().await;

        assert_eq!(controller.state(), *controller.defaults());
        assert_eq!(controller.state().sort_by.as_deref(), Some("created_at"));
        assert_eq!(location.replace_count(), 0);
        assert!(!controller.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_closes_everything() {
        let (_location, controller) = mount("");
        let mut rx = controller.subscribe();
        controller.unmount();

        settle().await;
        assert!(controller.data().is_empty());
        assert!(!controller.is_loading());
        assert!(!controller.is_mounted());

        controller.go_to_page(2);
        assert_eq!(controller.state().page, 1);

        // The final snapshot is still readable, then the channel ends
        assert!(!rx.borrow_and_update().mounted);
        assert!(rx.changed().await.is_err());
    }
}
