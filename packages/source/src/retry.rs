//! HTTP retry for remote crash extracts.
//!
//! Remote sources go through [`send_text`] rather than calling
//! `reqwest::RequestBuilder::send()` directly, so transient failures
//! (timeouts, connection resets, 5xx, rate limiting) are retried with
//! exponential backoff.

use std::time::Duration;

use crate::SourceError;

/// Retries after the first attempt. Backoff is 2s, 4s, 8s.
const MAX_RETRIES: u32 = 3;

/// Sends the request built by `build_request` and returns the body text.
///
/// `build_request` is called once per attempt since request builders are
/// consumed by `send()`. HTTP 4xx other than 429 is not retried.
///
/// # Errors
///
/// Returns [`SourceError`] if the request still fails after all retries
/// or the server answers with a non-retryable status.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(build_request: F) -> Result<String, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let failure = match build_request().send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(response.text().await?);
            }
            Ok(response) => {
                let status = response.status();
                let err = SourceError::Status {
                    url: response.url().to_string(),
                    status: status.as_u16(),
                };
                if !is_retryable_status(status) {
                    return Err(err);
                }
                err
            }
            Err(e) if is_transient(&e) => SourceError::Http(e),
            Err(e) => return Err(SourceError::Http(e)),
        };

        if attempt >= MAX_RETRIES {
            log::error!("Giving up after {MAX_RETRIES} retries: {failure}");
            return Err(failure);
        }
        attempt += 1;

        let delay = backoff(attempt);
        log::warn!("{failure}; retry {attempt}/{MAX_RETRIES} in {delay:?}");
        tokio::time::sleep(delay).await;
    }
}

/// Delay before retry number `attempt` (1-based).
const fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

/// Rate limiting and server errors are worth another try.
fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn only_rate_limits_and_server_errors_are_retried() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }
}
