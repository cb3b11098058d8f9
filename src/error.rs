use std::fmt::Display;

use anyhow::{anyhow, Context, Result};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    HttpTransportError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Cache error: {0}")]
    CacheError(String),
    #[error("Application error: {0}")]
    ApplicationError(String),
    #[error("Remote returned status {status}: {detail}")]
    RemoteError { status: u16, detail: String },
}

pub trait AddContext<T, E>: Context<T, E> {
    fn err_context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T, anyhow::Error>
    where
        Self: Sized,
    {
        self.with_context(|| msg.to_string())
    }
}

impl<U, T, E> AddContext<T, E> for U where U: Context<T, E> {}

pub fn gen<T: AsRef<str>>(msg: T) -> anyhow::Error {
    anyhow!(msg.as_ref().to_string())
}

/// Returns true if the error, or any error it wraps, is a transport level
/// failure. Those are the only failures worth retrying.
pub fn is_transport_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ApiError>(),
        Some(ApiError::HttpTransportError(_))
    )
}
