use std::borrow::Cow;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    api_defaults::DEFAULT_ERROR_DETAIL,
    error::ApiError,
    http::{Headers, Request},
    log_info, log_warn,
    time::Milliseconds,
    Result,
};

/// A trait for the HTTP protocol. Implementors accept a prepared `Request`
/// whose URL has already been resolved and whose default headers are set.
/// They can do real HTTP calls against a remote server or mock the responses
/// for testing purposes.
///
/// HTTP error statuses are not errors: implementors must return them as an
/// `HttpResponse`. `Err` is reserved for transport failures
/// (`ApiError::HttpTransportError`), which are the only ones retried.
#[async_trait]
pub trait HttpRunner: Send + Sync {
    async fn run(&self, request: &Request) -> Result<HttpResponse>;
    /// Milliseconds to wait before executing the next request
    async fn throttle(&self, milliseconds: Milliseconds) {
        log_info!("Sleeping for {} milliseconds", milliseconds);
        tokio::time::sleep(milliseconds.into()).await;
    }
}

/// Anything that looks like an HTTP response: a status and a body that can
/// be read as text.
pub trait ResponseLike {
    fn status(&self) -> u16;
    fn text(&self) -> Cow<'_, str>;
    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

/// Adapts lower level transport output to a common response.
#[derive(Clone, Debug, Default, Builder)]
pub struct HttpResponse {
    #[builder(default)]
    pub status: u16,
    #[builder(setter(into), default)]
    pub body: String,
    #[builder(default)]
    pub headers: Headers,
}

impl HttpResponse {
    pub fn builder() -> HttpResponseBuilder {
        HttpResponseBuilder::default()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }
}

impl ResponseLike for HttpResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.body)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Payload {
    Text(String),
    Json(Value),
}

/// Envelope returned by every client operation. The same type and accessors
/// are used whether the data came from the network or from the cache.
#[derive(Clone, Debug)]
pub struct Response {
    status: u16,
    headers: Headers,
    payload: Payload,
}

impl Response {
    pub(crate) fn from_json(status: u16, headers: Headers, data: Value) -> Self {
        Response {
            status,
            headers,
            payload: Payload::Json(data),
        }
    }

    pub fn ok(&self) -> bool {
        ResponseLike::ok(self)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Decoded JSON body. Never fails, see `safe_decode`.
    pub fn json(&self) -> Value {
        match &self.payload {
            Payload::Json(data) => data.clone(),
            Payload::Text(_) => safe_decode(self),
        }
    }

    /// Turns an error response into an error carrying the server's `detail`
    /// message. Successful responses yield their decoded body.
    pub fn into_data(self) -> Result<Value> {
        let data = self.json();
        if self.ok() {
            return Ok(data);
        }
        let detail = data
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ERROR_DETAIL)
            .to_string();
        Err(ApiError::RemoteError {
            status: self.status,
            detail,
        }
        .into())
    }
}

impl ResponseLike for Response {
    fn status(&self) -> u16 {
        self.status
    }

    fn text(&self) -> Cow<'_, str> {
        match &self.payload {
            Payload::Text(body) => Cow::Borrowed(body),
            Payload::Json(data) => Cow::Owned(data.to_string()),
        }
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Response {
            status: response.status,
            headers: response.headers,
            payload: Payload::Text(response.body),
        }
    }
}

/// Reads the body as text and parses it as JSON. Empty bodies (204, 304) and
/// malformed JSON decode to an empty object so a decode problem never hides
/// the HTTP status from the caller.
pub fn safe_decode<R: ResponseLike + ?Sized>(response: &R) -> Value {
    let text = response.text();
    if text.trim().is_empty() {
        return empty_object();
    }
    match serde_json::from_str(&text) {
        Ok(data) => data,
        Err(err) => {
            log_warn!(
                "Failed to parse JSON body of response with status {}: {}",
                response.status(),
                err
            );
            empty_object()
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
