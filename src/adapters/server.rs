//! Vault HTTP API - Routes for the Backend-for-Frontend
//!
//! Thin axum layer over `CredentialVault`:
//! - `POST /users/:id/wallet` creates the custodial wallet (signup)
//! - `GET /users/:id/balance` returns USDC and POL balances
//! - `POST /users/:id/trading-session` prepares the wallet for trading
//!
//! Responses carry addresses, tx hashes and status flags only. Keys and
//! credentials never leave the process.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::VaultError;
use crate::ports::{ChainClient, ExchangeAuth, UserStore};
use crate::usecases::CredentialVault;

/// Shared state for the vault routes.
pub struct AppState<S: UserStore, E: ExchangeAuth, C: ChainClient> {
    vault: Arc<CredentialVault<S, E, C>>,
}

// Manual impl: derive would require `S: Clone` etc.
impl<S: UserStore, E: ExchangeAuth, C: ChainClient> Clone for AppState<S, E, C> {
    fn clone(&self) -> Self {
        Self {
            vault: Arc::clone(&self.vault),
        }
    }
}

/// Router for the vault API.
pub fn routes<S, E, C>(vault: Arc<CredentialVault<S, E, C>>) -> Router
where
    S: UserStore,
    E: ExchangeAuth,
    C: ChainClient,
{
    Router::new()
        .route("/users/:id/wallet", post(create_wallet::<S, E, C>))
        .route("/users/:id/balance", get(balance::<S, E, C>))
        .route("/users/:id/trading-session", post(trading_session::<S, E, C>))
        .with_state(AppState { vault })
}

/// Optional signup body.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCreated {
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingSessionResponse {
    pub address: String,
    pub allowance_tx_hashes: Vec<String>,
    pub credentials_derived: bool,
    pub trade_ready: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tx_hashes: Vec<String>,
}

async fn create_wallet<S: UserStore, E: ExchangeAuth, C: ChainClient>(
    State(state): State<AppState<S, E, C>>,
    Path(user_id): Path<String>,
    body: Option<Json<SignupRequest>>,
) -> Result<(StatusCode, Json<WalletCreated>), ApiError> {
    check_user_id(&user_id)?;
    let email = body.and_then(|Json(req)| req.email);
    let address = state.vault.signup(&user_id, email).await?;
    Ok((StatusCode::CREATED, Json(WalletCreated { address })))
}

async fn balance<S: UserStore, E: ExchangeAuth, C: ChainClient>(
    State(state): State<AppState<S, E, C>>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    check_user_id(&user_id)?;
    let balances = state.vault.balances(&user_id).await?;
    Ok(Json(balances).into_response())
}

async fn trading_session<S: UserStore, E: ExchangeAuth, C: ChainClient>(
    State(state): State<AppState<S, E, C>>,
    Path(user_id): Path<String>,
) -> Result<Json<TradingSessionResponse>, ApiError> {
    check_user_id(&user_id)?;
    let session = state.vault.prepare_trading(&user_id).await?;
    Ok(Json(TradingSessionResponse {
        address: session.wallet.checksum_address(),
        allowance_tx_hashes: session.approval_tx_hashes,
        credentials_derived: session.credentials_derived,
        trade_ready: true,
    }))
}

fn check_user_id(user_id: &str) -> Result<(), ApiError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 128
        && user_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid user id {user_id:?}")))
    }
}

/// Error response with a status chosen by error class.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Vault(VaultError),
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        Self::Vault(err)
    }
}

/// HTTP status for a vault error.
pub fn status_for(err: &VaultError) -> StatusCode {
    match err {
        VaultError::UserNotFound { .. } | VaultError::WalletNotFound { .. } => StatusCode::NOT_FOUND,
        VaultError::PartialAllowance { source, .. } if source.is_user_error() => StatusCode::BAD_REQUEST,
        VaultError::ExchangeAuth(_) | VaultError::PartialAllowance { .. } => StatusCode::BAD_GATEWAY,
        VaultError::ExchangeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        VaultError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_user_error() => StatusCode::BAD_REQUEST,
        e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    tx_hashes: Vec::new(),
                },
            ),
            Self::Vault(err) => {
                let status = status_for(&err);
                if err.is_fatal() {
                    error!(error = %err, "Vault request failed");
                } else {
                    warn!(error = %err, status = status.as_u16(), "Vault request rejected");
                }
                // Fatal details stay in the logs.
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    "internal error".to_string()
                } else {
                    err.to_string()
                };
                let tx_hashes = match err {
                    VaultError::PartialAllowance { tx_hashes, .. } => tx_hashes,
                    _ => Vec::new(),
                };
                (
                    status,
                    ErrorBody {
                        error: message,
                        tx_hashes,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
