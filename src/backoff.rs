use std::sync::Arc;

use crate::error::{self, AddContext};
use crate::io::{HttpResponse, HttpRunner};
use crate::time::{backoff_delay, Milliseconds};
use crate::Error;
use crate::{http::Request, log_info, Result};

/// ExponentialBackoff wraps an HttpRunner and retries requests with an
/// exponential backoff retry mechanism. Only transport failures are retried,
/// HTTP error statuses are returned to the caller as they are.
pub struct ExponentialBackoff<'a, R> {
    runner: &'a Arc<R>,
    max_retries: u32,
    num_retries: u32,
    base_wait_time: Milliseconds,
    max_wait_time: Milliseconds,
}

impl<'a, R> ExponentialBackoff<'a, R> {
    pub fn new(
        runner: &'a Arc<R>,
        max_retries: u32,
        base_wait_time: Milliseconds,
        max_wait_time: Milliseconds,
    ) -> Self {
        ExponentialBackoff {
            runner,
            max_retries,
            num_retries: 0,
            base_wait_time,
            max_wait_time,
        }
    }

    fn wait_time(&self) -> Milliseconds {
        let wait_time = backoff_delay(self.num_retries, self.base_wait_time, self.max_wait_time);
        log_info!(
            "Retry {} of {}: waiting for {} milliseconds",
            self.num_retries,
            self.max_retries,
            wait_time
        );
        wait_time
    }

    /// Checks if the error is a candidate for retrying the request. A request
    /// can be retried if there is a network outage.
    fn should_retry_on_error(&self, err: &Error) -> bool {
        error::is_transport_error(err)
    }
}

impl<R: HttpRunner> ExponentialBackoff<'_, R> {
    pub async fn retry_on_error(&mut self, request: &Request) -> Result<HttpResponse> {
        loop {
            match self.runner.run(request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if !self.should_retry_on_error(&err) {
                        return Err(err);
                    }
                    self.num_retries += 1;
                    if self.num_retries > self.max_retries {
                        if self.max_retries == 0 {
                            return Err(err);
                        }
                        return Err(err)
                            .err_context(format!("Retried the request {} times", self.max_retries));
                    }
                    self.runner.throttle(self.wait_time()).await;
                }
            };
        }
    }
}
