//! Data API seam.
//!
//! The controller only talks to the data API through [`Transport`]; derived
//! caches use [`Lookup`]. [`http`] provides the reqwest-backed
//! implementations used in production; tests substitute scripted ones.

pub mod http;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::query::QueryPairs;
use crate::types::Page;

pub use http::{HttpLookup, HttpTransport};

/// One outbound list request: the parameters of a single HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub params: QueryPairs,
}

impl ApiRequest {
    pub fn new(params: QueryPairs) -> Self {
        Self { params }
    }

    /// First value for `key`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order
    pub fn params_for(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Fetches one page of a collection.
///
/// Implementations need not support cancellation: the controller discards
/// stale results itself.
pub trait Transport<T>: Send + Sync {
    fn fetch<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<Page<T>>>;
}

/// Resolves related records for a set of keys (e.g. companies of the loaded
/// recruiters).
pub trait Lookup<K, V>: Send + Sync {
    fn lookup<'a>(&'a self, keys: &'a [K]) -> BoxFuture<'a, Result<Vec<V>>>;
}
