//! Secondary lookups keyed off the loaded items.
//!
//! A [`DerivedCache`] holds related records (e.g. the companies of the
//! recruiters on screen). It only asks the data API again when the set of
//! keys changes, and runs its own [`SharedGate`] so a slow lookup for an old
//! page never overwrites a newer one.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::remote::Lookup;
use crate::types::Identified;

use super::gate::{GateOutcome, SharedGate};

struct CacheState<K, V> {
    /// Key set of the last lookup issued; `None` forces the next sync
    requested: Option<Vec<K>>,
    values: HashMap<K, V>,
}

pub struct DerivedCache<K, V> {
    lookup: Arc<dyn Lookup<K, V>>,
    gate: SharedGate,
    state: Arc<Mutex<CacheState<K, V>>>,
}

impl<K, V> DerivedCache<K, V>
where
    V: Identified<Id = K> + Clone + Send + Sync + 'static,
    K: Clone + Eq + std::hash::Hash + Ord + std::fmt::Debug + Send + Sync + 'static,
{
    pub fn new(lookup: Arc<dyn Lookup<K, V>>) -> Self {
        Self {
            lookup,
            gate: SharedGate::new(),
            state: Arc::new(Mutex::new(CacheState {
                requested: None,
                values: HashMap::new(),
            })),
        }
    }

    /// Bring the cache in line with `items`.
    ///
    /// Returns `Ok(true)` when a lookup was applied and `Ok(false)` when the
    /// key set was unchanged or a newer sync overtook this one. On failure
    /// the last good values stay in place.
    pub async fn sync<T>(&self, items: &[T], key_of: impl Fn(&T) -> Option<K>) -> Result<bool> {
        let keys: Vec<K> = items
            .iter()
            .filter_map(key_of)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        {
            let mut state = self.state.lock();
            if state.requested.as_ref() == Some(&keys) {
                return Ok(false);
            }
            state.requested = Some(keys.clone());
        }

        let state = Arc::clone(&self.state);
        let apply = move |values: Vec<V>| {
            let mut state = state.lock();
            state.values = values.into_iter().map(|v| (v.id(), v)).collect();
        };

        let outcome = if keys.is_empty() {
            self.gate.issue_with(async { Ok(Vec::new()) }, apply).await
        } else {
            debug!("looking up {} related records", keys.len());
            self.gate.issue_with(self.lookup.lookup(&keys), apply).await
        };

        match outcome {
            Ok(GateOutcome::Applied(())) => Ok(true),
            Ok(GateOutcome::Dropped) => Ok(false),
            Err(e) => {
                warn!("related lookup failed: {e}");
                self.state.lock().requested = None;
                Err(e)
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.state.lock().values.get(key).cloned()
    }

    pub fn values(&self) -> HashMap<K, V> {
        self.state.lock().values.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.gate.is_loading()
    }

    /// Drop whatever is in flight; later syncs are no-ops
    pub fn close(&self) {
        self.gate.close();
    }
}
