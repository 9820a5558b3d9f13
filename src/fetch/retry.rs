use crate::config::FetchConfig;
use crate::fetch::transport::{HttpRequest, HttpResponse, Transport};
use crate::FetchError;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry keyed by response status
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Statuses worth another attempt
    pub retry_codes: Vec<u16>,

    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.retry_times,
            retry_codes: config.retry_http_codes.clone(),
            delay: config.retry_delay(),
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_codes.contains(&status)
    }
}

/// Sends a request, retrying transient errors and retryable statuses
///
/// # Returns
///
/// * `Ok(HttpResponse)` - A response with a 2xx status
/// * `Err(FetchError::Status)` - A non-retryable status, or a retryable
///   one that persisted through every attempt
/// * `Err(FetchError::Transient)` - The last attempt failed without a response
pub async fn get_with_retry(
    transport: &dyn Transport,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse, FetchError> {
    let attempts = policy.max_retries + 1;
    let mut last_error = FetchError::Transient {
        url: request.url.clone(),
        message: "no attempt made".to_string(),
    };

    for attempt in 1..=attempts {
        if attempt > 1 && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }

        match transport.get(request).await {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => {
                let error = FetchError::Status {
                    url: request.url.clone(),
                    status: response.status,
                };
                if !policy.should_retry_status(response.status) {
                    debug!("{}", error);
                    return Err(error);
                }
                warn!(
                    "HTTP {} for {} (attempt {}/{})",
                    response.status, request.url, attempt, attempts
                );
                last_error = error;
            }
            Err(error) if error.is_transient() => {
                warn!("{} (attempt {}/{})", error, attempt, attempts);
                last_error = error;
            }
            Err(error) => return Err(error),
        }
    }

    Err(last_error)
}
