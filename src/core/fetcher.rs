//! Cached, retrying HTTP GET.
//!
//! The fetcher answers from [`ResponseCache`] when it can. Otherwise it calls
//! the [`Transport`], retrying transient failures with exponential backoff.

use crate::core::cache::ResponseCache;
use crate::domain::model::HttpResponse;
use crate::domain::ports::{ConfigProvider, Transport};
use crate::utils::error::FetchError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff_factor * 2^(n-1)` seconds.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_factor: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `failed_attempts`-th failure.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(30) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

pub struct Fetcher<T: Transport> {
    transport: T,
    cache: ResponseCache,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, cache: ResponseCache, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            cache,
            policy,
            timeout,
        }
    }

    pub fn from_config<C: ConfigProvider>(transport: T, config: &C) -> Self {
        Self::new(
            transport,
            ResponseCache::new(config.cache_dir(), config.cache_ttl()),
            RetryPolicy {
                max_attempts: config.retry_attempts(),
                backoff_factor: config.backoff_factor(),
            },
            config.request_timeout(),
        )
    }

    /// Body of a successful GET to `url`.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.cache.get(url) {
            Ok(Some(cached)) => {
                tracing::info!("📦 Using cached response for {}", url);
                return Ok(cached.body);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable cache entry"),
        }

        let response = self.fetch_with_retry(url).await?;

        if let Err(e) = self.cache.put(url, &response) {
            tracing::warn!(error = %e, "Could not store response in cache");
        }
        Ok(response.body)
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(attempt, max_attempts, "Making API request to: {}", url);

            let result = self
                .transport
                .get(url, self.timeout)
                .await
                .and_then(|response| check_status(url, response));

            match result {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(attempts = attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(FetchError::Timeout { .. }) => {
                    tracing::error!(attempts = attempt, "Request timed out on every attempt");
                    return Err(FetchError::Timeout { attempts: attempt });
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::error!(error = %e, attempts = attempt, "Retry attempts exhausted");
                    } else {
                        tracing::error!(error = %e, "Request failed with non-retryable error");
                    }
                    return Err(e);
                }
            }
        }
    }
}

fn check_status(url: &str, response: HttpResponse) -> Result<HttpResponse, FetchError> {
    tracing::debug!("API response status: {}", response.status);
    if response.is_success() {
        Ok(response)
    } else {
        Err(FetchError::Http {
            status: response.status,
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Plays back a fixed list of transport results, then keeps repeating the last one.
    #[derive(Clone)]
    struct ScriptedTransport {
        script: Arc<Mutex<VecDeque<Result<HttpResponse, FetchError>>>>,
        calls: Arc<AtomicU32>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<HttpResponse, FetchError>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<HttpResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    fn status(status: u16, body: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    fn fetcher(transport: ScriptedTransport, dir: &TempDir) -> Fetcher<ScriptedTransport> {
        Fetcher::new(
            transport,
            ResponseCache::new(dir.path(), Duration::from_secs(3600)),
            RetryPolicy {
                max_attempts: 5,
                backoff_factor: 0.0,
            },
            Duration::from_secs(10),
        )
    }

    const URL: &str = "http://api.test/users/";

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(2));
        assert_eq!(policy.delay_after(4), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![status(200, "[]")]);
        let fetcher = fetcher(transport.clone(), &dir);

        assert_eq!(fetcher.fetch(URL).await.unwrap(), "[]");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_status_then_succeeds() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![
            status(503, ""),
            Err(FetchError::Connection("reset".into())),
            status(200, "[{\"id\":1}]"),
        ]);
        let fetcher = fetcher(transport.clone(), &dir);

        assert_eq!(fetcher.fetch(URL).await.unwrap(), "[{\"id\":1}]");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![status(404, "missing")]);
        let fetcher = fetcher(transport.clone(), &dir);

        let err = fetcher.fetch(URL).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Http {
                status: 404,
                url: URL.to_string()
            }
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let transport =
            ScriptedTransport::new(vec![Err(FetchError::Connection("refused".into()))]);
        let fetcher = fetcher(transport.clone(), &dir);

        let err = fetcher.fetch(URL).await.unwrap_err();

        assert!(matches!(err, FetchError::Connection(_)));
        assert_eq!(transport.calls(), 5);
    }

    #[tokio::test]
    async fn test_timeout_reports_attempt_count() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![Err(FetchError::Timeout { attempts: 1 })]);
        let fetcher = fetcher(transport.clone(), &dir);

        let err = fetcher.fetch(URL).await.unwrap_err();

        assert_eq!(err, FetchError::Timeout { attempts: 5 });
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![status(200, "[1,2,3]")]);
        let fetcher = fetcher(transport.clone(), &dir);

        let first = fetcher.fetch(URL).await.unwrap();
        let second = fetcher.fetch(URL).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![status(404, ""), status(200, "[]")]);
        let fetcher = fetcher(transport.clone(), &dir);

        assert!(fetcher.fetch(URL).await.is_err());
        assert_eq!(fetcher.fetch(URL).await.unwrap(), "[]");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_network() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::new(vec![status(200, "[]")]);
        let fetcher = fetcher(transport.clone(), &dir);
        fetcher.fetch(URL).await.unwrap();
        let cached = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
        std::fs::write(&cached, b"{").unwrap();

        assert_eq!(fetcher.fetch(URL).await.unwrap(), "[]");
        assert_eq!(transport.calls(), 2);
    }
}
