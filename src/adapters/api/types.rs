//! CLOB API Request/Response Types
//!
//! Serialization types for the auth endpoints the vault calls.

use serde::Deserialize;

use crate::domain::ExchangeCredentials;

/// Response of `/auth/api-key` and `/auth/derive-api-key`.
#[derive(Deserialize)]
pub struct ApiKeyResponse {
  #[serde(rename = "apiKey")]
  pub api_key: String,
  pub secret: String,
  pub passphrase: String,
}

impl From<ApiKeyResponse> for ExchangeCredentials {
  fn from(resp: ApiKeyResponse) -> Self {
    Self::new(resp.api_key, resp.secret, resp.passphrase)
  }
}

/// Error body returned by the CLOB on 4xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
  #[serde(default)]
  pub error: String,
}
