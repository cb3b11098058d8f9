pub mod api_defaults;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod io;
pub mod logging;
pub mod time;
pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

#[macro_use]
extern crate log;

#[macro_use]
extern crate derive_builder;

pub use cache::{Cache, CacheState, InMemoryCache, NoCache};
pub use config::{Config, ConfigProperties};
pub use http::{Client, Headers, Method, Request};
pub use io::{safe_decode, HttpResponse, HttpRunner, Response, ResponseLike};
