//! Shared outbound HTTP plumbing: one reqwest client, a per-host token
//! bucket, and bounded retries with exponential backoff and jitter.
//!
//! 429 and 5xx responses and network-level failures are retried; any other
//! 4xx is returned to the caller immediately. Callers decide whether a
//! final error is fatal (parsers) or a miss (geocoder).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use rand::Rng;
use tracing::warn;

use crate::util::env::env_parse;

const USER_AGENT: &str = concat!("compgather/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },
    #[error("request to {url} failed: {source}")]
    Net {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid url {0}")]
    BadUrl(String),
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    limiter: Arc<RateLimiter<String, DashMapStateStore<String>, DefaultClock>>,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpClient {
    pub fn new(
        rate_per_host: u32,
        timeout: Duration,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        let quota = Quota::per_second(std::num::NonZeroU32::new(rate_per_host.max(1)).unwrap());
        Ok(Self {
            http,
            limiter: Arc::new(RateLimiter::keyed(quota)),
            max_retries: max_retries.max(1),
            backoff_base: Duration::from_millis(backoff_base_ms.max(1)),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(
            env_parse("HTTP_RATE_PER_HOST", 4u32),
            Duration::from_secs(env_parse("HTTP_TIMEOUT_SECONDS", 30u64)),
            env_parse("HTTP_MAX_RETRIES", 3u32),
            env_parse("HTTP_BACKOFF_MS", 300u64),
        )
    }

    /// GET returning the response body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        let resp = self.get_with_retry(url).await?;
        resp.text().await.map_err(|source| HttpError::Net {
            url: url.to_string(),
            source,
        })
    }

    /// GET returning the response body parsed as JSON.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, HttpError> {
        let resp = self.get_with_retry(url).await?;
        resp.json().await.map_err(|source| HttpError::Net {
            url: url.to_string(),
            source,
        })
    }

    /// POST a JSON body and parse the JSON response. Used by the generic
    /// extractor backend; same retry policy as GETs.
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, HttpError> {
        let host = host_key(url)?;
        let mut attempt = 0u32;
        let mut delay = self.backoff_base;
        loop {
            attempt += 1;
            self.limiter.until_key_ready(&host).await;

            let outcome = self.http.post(url).json(body).send().await;
            match self.classify(url, outcome) {
                Outcome::Ok(resp) => {
                    return resp.json().await.map_err(|source| HttpError::Net {
                        url: url.to_string(),
                        source,
                    })
                }
                Outcome::Fatal(err) => return Err(err),
                Outcome::Retryable(err) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    warn!(url, attempt, error = %err, "retrying request");
                    tokio::time::sleep(with_jitter(delay)).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    async fn get_with_retry(&self, url: &str) -> Result<reqwest::Response, HttpError> {
        let host = host_key(url)?;
        let mut attempt = 0u32;
        let mut delay = self.backoff_base;
        loop {
            attempt += 1;
            self.limiter.until_key_ready(&host).await;

            let outcome = self.http.get(url).send().await;
            match self.classify(url, outcome) {
                Outcome::Ok(resp) => return Ok(resp),
                Outcome::Fatal(err) => return Err(err),
                Outcome::Retryable(err) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    warn!(url, attempt, error = %err, "retrying request");
                    tokio::time::sleep(with_jitter(delay)).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    fn classify(
        &self,
        url: &str,
        outcome: Result<reqwest::Response, reqwest::Error>,
    ) -> Outcome {
        match outcome {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    Outcome::Ok(resp)
                } else if status.as_u16() == 429 || status.is_server_error() {
                    Outcome::Retryable(HttpError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    })
                } else {
                    Outcome::Fatal(HttpError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    })
                }
            }
            Err(source) => Outcome::Retryable(HttpError::Net {
                url: url.to_string(),
                source,
            }),
        }
    }
}

enum Outcome {
    Ok(reqwest::Response),
    Retryable(HttpError),
    Fatal(HttpError),
}

fn host_key(url: &str) -> Result<String, HttpError> {
    let parsed = url::Url::parse(url).map_err(|_| HttpError::BadUrl(url.to_string()))?;
    parsed
        .host_str()
        .map(|h| h.to_string())
        .ok_or_else(|| HttpError::BadUrl(url.to_string()))
}

fn with_jitter(delay: Duration) -> Duration {
    let jitter_ms = rand::thread_rng().gen_range(0..=delay.as_millis().max(1) as u64 / 2);
    delay + Duration::from_millis(jitter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_key_extracts_host() {
        assert_eq!(
            host_key("https://api.postcodes.io/postcodes/CV129JA").unwrap(),
            "api.postcodes.io"
        );
        assert!(host_key("not a url").is_err());
    }

    #[test]
    fn jitter_stays_within_half_delay() {
        let base = Duration::from_millis(200);
        for _ in 0..50 {
            let jittered = with_jitter(base);
            assert!(jittered >= base);
            assert!(jittered <= base + Duration::from_millis(100));
        }
    }
}
