pub mod transport;

use crate::api_defaults::{CONTENT_TYPE, CONTENT_TYPE_JSON, VERIFY_SESSION_ENDPOINT};
use crate::backoff::ExponentialBackoff;
use crate::cache::{Cache, CacheState, InMemoryCache};
use crate::config::{Config, ConfigProperties};
use crate::io::{safe_decode, HttpRunner, Response};
use crate::{log_debug, log_error, Result};
use serde::Serialize;
use std::collections::{hash_map, HashMap};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use transport::Transport;

/// Resilient client for the site REST API. Attaches session credentials and
/// JSON headers, retries transport failures with exponential backoff and
/// caches successful GET responses.
pub struct Client<R, C, D> {
    runner: Arc<R>,
    cache: C,
    config: D,
}

impl Client<Transport, InMemoryCache, Config> {
    /// Production client: `ureq` transport with a session cookie jar and a
    /// fresh in-memory cache using the configured TTL.
    pub fn from_config(config: Config) -> Self {
        let runner = Arc::new(Transport::new(&config));
        let cache = InMemoryCache::new(config.cache_ttl());
        Client::new(runner, cache, config)
    }
}

impl<R, C, D> Client<R, C, D> {
    pub fn new(runner: Arc<R>, cache: C, config: D) -> Self {
        Client {
            runner,
            cache,
            config,
        }
    }
}

impl<R: HttpRunner, C: Cache, D: ConfigProperties> Client<R, C, D> {
    /// Joins the configured base URL with the endpoint, adding the leading
    /// slash if the endpoint does not have one.
    pub fn url(&self, endpoint: &str) -> String {
        let base = self.config.base_url().trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    /// Key the cache stores the response of `request` under: resolved URL,
    /// serialized body and method.
    pub fn cache_key(&self, request: &Request) -> String {
        format!(
            "{}{}{}",
            self.url(request.endpoint()),
            request.body().unwrap_or_default(),
            request.method()
        )
    }

    fn prepare(&self, request: &Request) -> Request {
        let mut prepared = request.clone();
        prepared.set_url(&self.url(request.endpoint()));
        if !prepared.headers().contains(CONTENT_TYPE) {
            prepared.set_header(CONTENT_TYPE, CONTENT_TYPE_JSON);
        }
        prepared
    }

    /// Single attempt. HTTP error statuses come back as a response with
    /// `ok() == false`; only transport failures are errors.
    pub async fn call(&self, request: &Request) -> Result<Response> {
        let prepared = self.prepare(request);
        log_debug!("{} {}", prepared.method(), prepared.url());
        let response = self.runner.run(&prepared).await.map_err(|err| {
            log_error!("API call failed for {}: {}", request.endpoint(), err);
            err
        })?;
        Ok(response.into())
    }

    /// Like `call`, but transport failures are retried up to the request's
    /// `max_retries` (or the configured default) with exponential backoff.
    pub async fn call_with_retry(&self, request: &Request) -> Result<Response> {
        let prepared = self.prepare(request);
        let max_retries = request
            .max_retries()
            .unwrap_or_else(|| self.config.max_retries());
        let mut backoff = ExponentialBackoff::new(
            &self.runner,
            max_retries,
            self.config.backoff_base(),
            self.config.backoff_max(),
        );
        let response = backoff.retry_on_error(&prepared).await.map_err(|err| {
            log_error!("API call failed for {}: {:#}", request.endpoint(), err);
            err
        })?;
        Ok(response.into())
    }

    /// Serves cacheable requests (GET with `use_cache`) from the cache while
    /// the entry is live. On a miss the request goes to the network with
    /// retries and a successful body is stored before returning. Every other
    /// request bypasses the cache entirely.
    pub async fn cached_call(&self, request: &Request) -> Result<Response> {
        if !request.is_cacheable() {
            return self.call_with_retry(request).await;
        }
        let key = self.cache_key(request);
        match self.cache.get(&key)? {
            CacheState::Fresh(data) => {
                log_debug!("Cache hit: {}", key);
                return Ok(Response::from_json(200, Headers::new(), data));
            }
            CacheState::Expired => log_debug!("Cache expired: {}", key),
            CacheState::None => log_debug!("Cache miss: {}", key),
        }
        let response = self.call_with_retry(request).await?;
        if !response.ok() {
            return Ok(response);
        }
        let data = safe_decode(&response);
        self.cache.set(&key, &data)?;
        log_debug!("Cache set: {}", key);
        // Hits carry no headers, so neither does the response that filled
        // the entry.
        Ok(Response::from_json(response.status(), Headers::new(), data))
    }

    /// Removes every cache entry whose key contains `pattern`. Returns the
    /// number of entries removed.
    pub fn invalidate(&self, pattern: &str) -> Result<usize> {
        let removed = self.cache.invalidate(pattern)?;
        log_debug!("Invalidated {} cache entries matching {}", removed, pattern);
        Ok(removed)
    }

    /// Removes the cache entry stored under exactly `key`.
    pub fn invalidate_key(&self, key: &str) -> Result<bool> {
        self.cache.remove(key)
    }

    /// Whether the session cookie is still accepted by the server. Transport
    /// failures count as not authenticated.
    pub async fn check_authenticated(&self) -> bool {
        match self.call(&Request::get(VERIFY_SESSION_ENDPOINT)).await {
            Ok(response) => response.ok(),
            Err(err) => {
                log_error!("Session verification failed: {}", err);
                false
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Headers(HashMap::new())
    }

    /// Sets `key`, replacing any existing header with the same name
    /// regardless of case.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        self.0.retain(|name, _| !name.eq_ignore_ascii_case(&key));
        self.0.insert(key, value.into());
    }

    /// Adds `value` to `key`. An existing value for the same name keeps its
    /// place and the new one is joined after `separator`.
    pub fn append<K: Into<String>, V: AsRef<str>>(&mut self, key: K, value: V, separator: &str) {
        let key = key.into();
        match self
            .0
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
        {
            Some((_, existing)) => {
                existing.push_str(separator);
                existing.push_str(value.as_ref());
            }
            None => {
                self.0.insert(key, value.as_ref().to_string());
            }
        }
    }

    /// Case insensitive lookup, header names are not case sensitive.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> hash_map::Iter<String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Methods that change server state. Their responses are never cached.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct Request {
    #[builder(setter(into))]
    endpoint: String,
    #[builder(default)]
    method: Method,
    #[builder(default)]
    headers: Headers,
    /// Serialized JSON body.
    #[builder(setter(into, strip_option), default)]
    body: Option<String>,
    #[builder(default = "true")]
    use_cache: bool,
    #[builder(setter(strip_option), default)]
    max_retries: Option<u32>,
    #[builder(setter(skip))]
    url: String,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub fn new(endpoint: &str, method: Method) -> Self {
        Request {
            endpoint: endpoint.to_string(),
            method,
            headers: Headers::new(),
            body: None,
            use_cache: true,
            max_retries: None,
            url: String::new(),
        }
    }

    pub fn get(endpoint: &str) -> Self {
        Request::new(endpoint, Method::GET)
    }

    /// Serializes `body` as the JSON payload of the request.
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.headers.set(key, value);
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolved URL. Empty until the client prepares the request.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Only reads asked to use the cache may be served from or stored in it.
    pub fn is_cacheable(&self) -> bool {
        self.use_cache && self.method == Method::GET
    }
}
