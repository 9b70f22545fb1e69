//! reqwest-backed data API client.
//!
//! # Security Note - Logging
//!
//! The bearer token is attached as a header value marked sensitive, so it is
//! printed as `Sensitive` if reqwest/hyper debug logging is enabled. Avoid
//! `RUST_LOG=reqwest=debug` in production regardless: other request details
//! still end up in the log.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::{ListError, Result};
use crate::types::{Listing, Page};

use super::{ApiRequest, Lookup, Transport};

/// Longest slice of an error body kept in [`ListError::Api`]
const ERROR_BODY_LIMIT: usize = 200;

/// GETs one resource of the data API, e.g. `<base>/recruiters`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    token: Option<Arc<SecretString>>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `resource` (a path below `api_base_url`).
    ///
    /// The client only gets a timeout when the config sets one.
    pub fn from_config(config: &Config, resource: &str) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: resource_url(&config.api_base_url, resource)?,
            token: config.api_token().map(|t| Arc::new(SecretString::from(t))),
        })
    }

    /// Same client and credentials, different resource.
    pub fn for_resource(&self, base_url: &str, resource: &str) -> Result<Self> {
        Ok(Self {
            client: self.client.clone(),
            endpoint: resource_url(base_url, resource)?,
            token: self.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for a list request
    pub fn request_url(&self, params: &[(String, String)]) -> Url {
        let mut url = self.endpoint.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    async fn get_json<R: DeserializeOwned>(&self, url: Url) -> Result<R> {
        debug!("GET {}", url.path());

        let mut request = self.client.get(url).header(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| ListError::Config("API token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            request = request.header(header::AUTHORIZATION, value);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ListError::Api {
                status,
                message: error_message(status, &body),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl<T> Transport<T> for HttpTransport
where
    T: DeserializeOwned + Send + 'static,
{
    fn fetch<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<Page<T>>> {
        Box::pin(async move { self.get_json(self.request_url(&request.params)).await })
    }
}

/// Batch lookup endpoint: `GET <resource>?ids=1&ids=2` returning `{ data }`.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    transport: HttpTransport,
    key_param: String,
}

impl HttpLookup {
    pub fn new(transport: HttpTransport, key_param: impl Into<String>) -> Self {
        Self {
            transport,
            key_param: key_param.into(),
        }
    }

    pub fn lookup_url<K: ToString>(&self, keys: &[K]) -> Url {
        let params: Vec<(String, String)> = keys
            .iter()
            .map(|k| (self.key_param.clone(), k.to_string()))
            .collect();
        self.transport.request_url(&params)
    }
}

impl<K, V> Lookup<K, V> for HttpLookup
where
    K: ToString + Send + Sync,
    V: DeserializeOwned + Send + 'static,
{
    fn lookup<'a>(&'a self, keys: &'a [K]) -> BoxFuture<'a, Result<Vec<V>>> {
        Box::pin(async move {
            let listing: Listing<V> = self.transport.get_json(self.lookup_url(keys)).await?;
            Ok(listing.data)
        })
    }
}

fn resource_url(base_url: &str, resource: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| ListError::Config(format!("API base URL cannot be a base: {base_url}")))?
        .pop_if_empty()
        .extend(resource.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
