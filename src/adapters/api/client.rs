//! CLOB HTTP Client - Rate-limited Credential Issuance
//!
//! Wraps reqwest with a client-side rate limit, exponential-backoff
//! retries and L1 wallet authentication for the two Polymarket CLOB
//! endpoints that issue API credentials. Implements the `ExchangeAuth`
//! port: try `/auth/api-key` first, fall back to `/auth/derive-api-key`
//! when the exchange refuses to create a new key.

use std::num::NonZeroU32;
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, StatusCode};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::auth::l1_headers;
use super::types::{ApiKeyResponse, ErrorResponse};
use crate::crypto::SigningWallet;
use crate::domain::ExchangeCredentials;
use crate::error::{Result, VaultError};
use crate::ports::ExchangeAuth;

const CREATE_API_KEY: &str = "/auth/api-key";
const DERIVE_API_KEY: &str = "/auth/derive-api-key";

/// Configuration for the CLOB HTTP client.
#[derive(Debug, Clone)]
pub struct ClobClientConfig {
  /// Base URL for the CLOB API.
  pub base_url: String,
  /// Chain id the L1 signature is bound to.
  pub chain_id: u64,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Client-side request budget.
  pub requests_per_minute: u32,
}

impl Default for ClobClientConfig {
  fn default() -> Self {
    Self {
      base_url: "https://clob.polymarket.com".to_string(),
      chain_id: 137,
      timeout: Duration::from_secs(30),
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
      requests_per_minute: 60,
    }
  }
}

/// How a single auth request ended.
#[derive(Debug)]
enum RequestError {
  /// 401/403: signature or wallet rejected.
  Unauthorized(String),
  /// Other 4xx: the exchange refused this request.
  Rejected(String),
  /// Network, 429 or 5xx after all retries.
  Unavailable(String),
}

impl RequestError {
  fn into_vault_error(self) -> VaultError {
    match self {
      Self::Unauthorized(msg) | Self::Rejected(msg) => VaultError::ExchangeAuth(msg),
      Self::Unavailable(msg) => VaultError::ExchangeUnavailable(msg),
    }
  }
}

/// Outcome class of an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
  Success,
  Unauthorized,
  Retryable,
  Rejected,
}

fn classify(status: StatusCode) -> StatusClass {
  match status {
    s if s.is_success() => StatusClass::Success,
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StatusClass::Unauthorized,
    StatusCode::TOO_MANY_REQUESTS => StatusClass::Retryable,
    s if s.is_server_error() => StatusClass::Retryable,
    _ => StatusClass::Rejected,
  }
}

/// Rate-limited HTTP client for the Polymarket CLOB auth endpoints.
pub struct ClobClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: ClobClientConfig,
  /// Request budget shared by all users of this client.
  limiter: DefaultDirectRateLimiter,
}

impl ClobClient {
  /// Create a new CLOB client.
  ///
  /// # Errors
  /// `VaultError::Configuration` if the HTTP client cannot be built.
  pub fn new(config: ClobClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(5)
      .build()
      .map_err(|e| VaultError::Configuration(format!("failed to build HTTP client: {e}")))?;

    let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_minute(per_minute));

    Ok(Self {
      http,
      config,
      limiter,
    })
  }

  /// Send one L1-authenticated request with retries.
  async fn request_credentials(
    &self,
    method: Method,
    path: &str,
    wallet: &SigningWallet,
  ) -> std::result::Result<ExchangeCredentials, RequestError> {
    let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
    let mut last_error = String::from("no attempt made");

    for attempt in 0..=self.config.max_retries {
      if attempt > 0 {
        let delay = backoff_delay(self.config.retry_base_delay, attempt);
        debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      // Fresh timestamp and signature per attempt
      let headers = l1_headers(wallet, self.config.chain_id, U256::ZERO)
        .map_err(|e| RequestError::Unauthorized(e.to_string()))?;
      let mut req = self.http.request(method.clone(), &url);
      for (name, value) in headers {
        req = req.header(name, value);
      }

      let response = match req.send().await {
        Ok(response) => response,
        Err(e) => {
          warn!(error = %e, attempt, path, "Request failed");
          last_error = e.to_string();
          continue;
        }
      };

      let status = response.status();
      match classify(status) {
        StatusClass::Success => {
          return response
            .json::<ApiKeyResponse>()
            .await
            .map(ExchangeCredentials::from)
            .map_err(|e| RequestError::Unavailable(format!("malformed {path} response: {e}")));
        }
        StatusClass::Retryable => {
          warn!(status = %status, attempt, path, "Transient CLOB error, retrying");
          last_error = format!("{path} returned {status}");
        }
        StatusClass::Unauthorized => {
          let body = error_body(response).await;
          return Err(RequestError::Unauthorized(format!("{path} returned {status}: {body}")));
        }
        StatusClass::Rejected => {
          let body = error_body(response).await;
          return Err(RequestError::Rejected(format!("{path} returned {status}: {body}")));
        }
      }
    }

    Err(RequestError::Unavailable(last_error))
  }

  /// Check if the API is reachable.
  pub async fn health_check(&self) -> bool {
    let url = format!("{}/time", self.config.base_url.trim_end_matches('/'));
    matches!(self.http.get(url).send().await, Ok(r) if r.status().is_success())
  }
}

/// Exponential backoff before retry `attempt` (1-based), saturating.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
  base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

async fn error_body(response: reqwest::Response) -> String {
  let text = response.text().await.unwrap_or_default();
  serde_json::from_str::<ErrorResponse>(&text)
    .ok()
    .filter(|e| !e.error.is_empty())
    .map_or(text, |e| e.error)
}

#[async_trait]
impl ExchangeAuth for ClobClient {
  #[instrument(skip(self, wallet), fields(address = %wallet.address()))]
  async fn create_or_derive_api_key(&self, wallet: &SigningWallet) -> Result<ExchangeCredentials> {
    match self.request_credentials(Method::POST, CREATE_API_KEY, wallet).await {
      Ok(credentials) => {
        info!("Created new CLOB API key");
        Ok(credentials)
      }
      Err(RequestError::Unavailable(msg)) => Err(VaultError::ExchangeUnavailable(msg)),
      Err(e) => {
        debug!(reason = ?e, "API key creation refused, deriving existing key");
        let credentials = self
          .request_credentials(Method::GET, DERIVE_API_KEY, wallet)
          .await
          .map_err(RequestError::into_vault_error)?;
        info!("Derived existing CLOB API key");
        Ok(credentials)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_classification() {
    assert_eq!(classify(StatusCode::OK), StatusClass::Success);
    assert_eq!(classify(StatusCode::UNAUTHORIZED), StatusClass::Unauthorized);
    assert_eq!(classify(StatusCode::FORBIDDEN), StatusClass::Unauthorized);
    assert_eq!(classify(StatusCode::TOO_MANY_REQUESTS), StatusClass::Retryable);
    assert_eq!(classify(StatusCode::BAD_GATEWAY), StatusClass::Retryable);
    assert_eq!(classify(StatusCode::BAD_REQUEST), StatusClass::Rejected);
  }

  #[test]
  fn test_backoff_doubles_and_saturates() {
    let base = Duration::from_millis(200);
    assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
    assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
    // 2^32 would overflow u32
    assert_eq!(backoff_delay(base, 40), base.saturating_mul(u32::MAX));
  }

  #[test]
  fn test_request_errors_map_to_taxonomy() {
    assert!(matches!(
      RequestError::Unauthorized("401".into()).into_vault_error(),
      VaultError::ExchangeAuth(_)
    ));
    assert!(matches!(
      RequestError::Rejected("400".into()).into_vault_error(),
      VaultError::ExchangeAuth(_)
    ));
    let unavailable = RequestError::Unavailable("503".into()).into_vault_error();
    assert!(unavailable.is_retryable());
  }

  #[tokio::test]
  async fn test_unreachable_exchange_is_unavailable() {
    let client = ClobClient::new(ClobClientConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      max_retries: 1,
      retry_base_delay: Duration::from_millis(1),
      timeout: Duration::from_millis(500),
      ..ClobClientConfig::default()
    })
    .unwrap();
    let wallet = SigningWallet::from_private_key(
      "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
    )
    .unwrap();

    let err = client.create_or_derive_api_key(&wallet).await.unwrap_err();
    assert!(matches!(err, VaultError::ExchangeUnavailable(_)), "{err:?}");
  }
}
