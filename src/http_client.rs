// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Bounded Fetch Client
 * Throttled HTTP access with per-attempt timeout and exponential backoff
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{Client, Method};
use tracing::debug;

use crate::config::ScanOptions;
use crate::errors::{ScanError, ScanResult};
use crate::limiter::FetchLimiter;

/// Response bodies larger than this are truncated, not rejected
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// One completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub duration_ms: u64,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }
}

/// HTTP client every probe of a scan goes through. All failure modes
/// collapse to `None` so callers treat "could not determine" uniformly;
/// nothing here ever reaches a caller as an error.
pub struct FetchClient {
    client: Client,
    limiter: FetchLimiter,
    retries: u32,
    retry_base_delay: Duration,
}

impl FetchClient {
    pub fn new(options: &ScanOptions) -> ScanResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(options.user_agent.clone())
            .pool_max_idle_per_host(options.concurrency)
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ScanError::Http(e.to_string()))?;

        Ok(Self {
            client,
            limiter: FetchLimiter::new(options.concurrency),
            retries: options.retries,
            retry_base_delay: Duration::from_millis(options.retry_base_delay_ms),
        })
    }

    /// Shared limiter, exposed for instrumentation
    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    /// GET returning the body only on a 2xx response
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let response = self.fetch_response(url).await?;
        if response.is_success() {
            Some(response.body)
        } else {
            None
        }
    }

    /// GET returning any completed exchange, including non-2xx statuses
    /// outside the retryable class
    pub async fn fetch_response(&self, url: &str) -> Option<FetchResponse> {
        self.execute(Method::GET, url, None, None).await
    }

    /// HEAD probe for existence checks; same retry and throttle rules as GET
    pub async fn head(&self, url: &str) -> Option<FetchResponse> {
        self.execute(Method::HEAD, url, None, None).await
    }

    pub async fn post(&self, url: &str, body: String, content_type: &str) -> Option<FetchResponse> {
        self.execute(Method::POST, url, Some(body), Some(content_type.to_string()))
            .await
    }

    /// Single bounded exchange: one limiter slot held for the whole call,
    /// per-attempt timeout from the client, retry on transport errors and
    /// HTTP 429/5xx with delays of base * 2^(n-1).
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        content_type: Option<String>,
    ) -> Option<FetchResponse> {
        let _permit = self.limiter.acquire().await;

        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                let delay = self.retry_base_delay * 2u32.pow(attempt - 1);
                debug!(
                    url = %url,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }

            let started = Instant::now();
            let mut request = self.client.request(method.clone(), url);
            if let Some(ref payload) = body {
                request = request.body(payload.clone());
            }
            if let Some(ref ct) = content_type {
                request = request.header("Content-Type", ct.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if is_retryable_status(status) {
                        if attempt < self.retries {
                            attempt += 1;
                            continue;
                        }
                        debug!(url = %url, status = status, "Giving up after retries");
                        return None;
                    }

                    let headers: HashMap<String, String> = response
                        .headers()
                        .iter()
                        .map(|(name, value)| {
                            (
                                name.as_str().to_lowercase(),
                                value.to_str().unwrap_or("").to_string(),
                            )
                        })
                        .collect();

                    match response.text().await {
                        Ok(mut text) => {
                            if text.len() > MAX_BODY_SIZE {
                                let mut cut = MAX_BODY_SIZE;
                                while !text.is_char_boundary(cut) {
                                    cut -= 1;
                                }
                                text.truncate(cut);
                            }
                            return Some(FetchResponse {
                                status_code: status,
                                body: text,
                                headers,
                                duration_ms: started.elapsed().as_millis() as u64,
                            });
                        }
                        Err(e) => {
                            // Body read failure is a transport failure
                            if attempt < self.retries {
                                attempt += 1;
                                continue;
                            }
                            debug!(url = %url, error = %e, "Body read failed after retries");
                            return None;
                        }
                    }
                }
                Err(e) => {
                    if attempt < self.retries {
                        attempt += 1;
                        continue;
                    }
                    debug!(url = %url, error = %e, "Request failed after retries");
                    return None;
                }
            }
        }
    }
}

/// Transport-equivalent HTTP statuses: throttling and server-side failures
fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status_classification() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(301));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
    }

    #[test]
    fn test_client_construction() {
        let options = ScanOptions::default();
        let client = FetchClient::new(&options).unwrap();
        assert_eq!(client.limiter().limit(), options.concurrency);
    }

    #[test]
    fn test_response_helpers() {
        let mut headers = HashMap::new();
        headers.insert("server".to_string(), "nginx".to_string());
        let response = FetchResponse {
            status_code: 200,
            body: "WordPress 6.4.2".to_string(),
            headers,
            duration_ms: 12,
        };
        assert!(response.is_success());
        assert!(response.contains("WordPress"));
        assert_eq!(response.header("Server"), Some("nginx"));
        assert_eq!(response.header("x-missing"), None);
    }
}
