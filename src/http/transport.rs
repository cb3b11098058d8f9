//! Transport module performs the actual HTTP calls with `ureq`. Blocking I/O
//! runs on tokio's blocking pool so callers can await it.

use async_trait::async_trait;
use ureq::{
    http::HeaderMap,
    typestate::{WithBody, WithoutBody},
    Agent, RequestBuilder,
};

use crate::{
    config::ConfigProperties,
    error::ApiError,
    http::{Headers, Method, Request},
    io::{HttpResponse, HttpRunner},
    log_debug, Result,
};

/// HTTP transport backed by a single `ureq::Agent`. The agent keeps a cookie
/// jar, so session cookies set by the server travel with every later request
/// (the browser's `credentials: include`).
#[derive(Clone)]
pub struct Transport {
    agent: Agent,
}

impl Transport {
    pub fn new(config: &impl ConfigProperties) -> Self {
        let agent: Agent = Agent::config_builder()
            // 4xx and 5xx are data for the caller, not transport errors.
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout().into()))
            .build()
            .into();
        Transport { agent }
    }
}

#[async_trait]
impl HttpRunner for Transport {
    async fn run(&self, request: &Request) -> Result<HttpResponse> {
        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || send(&agent, &request))
            .await
            .map_err(|err| ApiError::ApplicationError(format!("HTTP task failed: {}", err)))?
    }
}

fn send(agent: &Agent, request: &Request) -> Result<HttpResponse> {
    let url = request.url();
    let headers = request.headers();
    let body = request.body();
    let result = match request.method() {
        Method::GET => send_optional_body(with_headers(agent.get(url), headers), body),
        Method::HEAD => send_optional_body(with_headers(agent.head(url), headers), body),
        Method::DELETE => send_optional_body(with_headers(agent.delete(url), headers), body),
        Method::POST => send_body(with_headers(agent.post(url), headers), body),
        Method::PUT => send_body(with_headers(agent.put(url), headers), body),
        Method::PATCH => send_body(with_headers(agent.patch(url), headers), body),
    };
    let mut response = result.map_err(transport_error)?;
    let status = response.status().as_u16();
    let headers = response_headers(response.headers());
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(transport_error)?;
    log_debug!("{} {} -> {}", request.method(), url, status);
    Ok(HttpResponse {
        status,
        body,
        headers,
    })
}

fn with_headers<B>(builder: RequestBuilder<B>, headers: &Headers) -> RequestBuilder<B> {
    headers
        .iter()
        .fold(builder, |builder, (key, value)| {
            builder.header(key.as_str(), value.as_str())
        })
}

type UreqResult = std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>;

fn send_body(builder: RequestBuilder<WithBody>, body: Option<&str>) -> UreqResult {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

/// GET, HEAD and DELETE carry a body only when the request has one. It is
/// part of the cache key, so it has to reach the server too.
fn send_optional_body(builder: RequestBuilder<WithoutBody>, body: Option<&str>) -> UreqResult {
    match body {
        Some(body) => builder.force_send_body().send(body.as_bytes()),
        None => builder.call(),
    }
}

/// Repeated response headers are kept in arrival order: `set-cookie` values
/// joined by newlines (cookie dates contain commas), the rest by `, `.
fn response_headers(map: &HeaderMap) -> Headers {
    map.iter().fold(Headers::new(), |mut headers, (name, value)| {
        let separator = if name.as_str() == "set-cookie" { "\n" } else { ", " };
        headers.append(name.as_str(), value.to_str().unwrap_or_default(), separator);
        headers
    })
}

fn transport_error(err: ureq::Error) -> anyhow::Error {
    ApiError::HttpTransportError(err.to_string()).into()
}
