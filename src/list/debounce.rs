//! Debounced text input.
//!
//! Keystrokes update the visible value immediately; the value is committed
//! once no further change arrived for the configured delay. Only the latest
//! value of a burst is ever committed.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

type CommitFn = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Default)]
struct InputState {
    value: String,
    generation: u64,
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

impl InputState {
    fn cancel_timer(&mut self) {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// A text value with a delayed commit.
///
/// `on_commit` runs while the input's lock is held, so it must not call back
/// into the same `DebouncedInput`. Scheduling a commit requires a Tokio
/// runtime.
pub struct DebouncedInput {
    delay: Duration,
    on_commit: CommitFn,
    state: Arc<Mutex<InputState>>,
}

impl DebouncedInput {
    pub fn new(delay: Duration, on_commit: impl Fn(String) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            on_commit: Arc::new(on_commit),
            state: Arc::new(Mutex::new(InputState::default())),
        }
    }

    /// The visible, possibly uncommitted value
    pub fn value(&self) -> String {
        self.state.lock().value.clone()
    }

    /// Whether a commit is scheduled
    pub fn is_pending(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    /// Record a keystroke and (re)start the quiet period.
    pub fn on_change(&self, raw: impl Into<String>) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }

        state.value = raw.into();
        state.cancel_timer();

        if self.delay.is_zero() {
            (self.on_commit)(state.value.clone());
            return;
        }

        let generation = state.generation;
        let delay = self.delay;
        let shared = Arc::clone(&self.state);
        let on_commit = Arc::clone(&self.on_commit);

        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = shared.lock();
            if state.closed || state.generation != generation {
                return;
            }
            state.timer = None;
            on_commit(state.value.clone());
        }));
    }

    /// Commit an empty value now, dropping any scheduled commit.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.cancel_timer();
        state.value.clear();
        (self.on_commit)(String::new());
    }

    /// Commit the visible value now if a commit is scheduled (e.g. on Enter).
    pub fn flush(&self) {
        let mut state = self.state.lock();
        if state.closed || state.timer.is_none() {
            return;
        }
        state.cancel_timer();
        (self.on_commit)(state.value.clone());
    }

    /// Drop a scheduled commit, keeping the visible value.
    pub fn cancel(&self) {
        self.state.lock().cancel_timer();
    }

    /// Replace the visible value without committing (hydration, navigation).
    pub fn set_value(&self, value: impl Into<String>) {
        let mut state = self.state.lock();
        state.cancel_timer();
        state.value = value.into();
    }

    /// Tear down: no commit is emitted after this returns.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.cancel_timer();
        state.closed = true;
    }
}

impl Drop for DebouncedInput {
    fn drop(&mut self) {
        self.close();
    }
}
