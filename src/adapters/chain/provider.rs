//! Polygon RPC Client - alloy-rs 0.9 Implementation of `ChainClient`
//!
//! Reads go through one shared HTTP provider. Writes build a short-lived
//! provider with the recommended fillers (nonce, gas, chain id) and the
//! request's signing wallet, so no key outlives its request. Every
//! submitted transaction is awaited under the configured confirmation
//! timeout.

use std::time::Duration;

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, U256};
use alloy::providers::{PendingTransactionBuilder, Provider, ProviderBuilder, RootProvider};
use alloy::transports::http::reqwest::Url;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::contracts::{IERC1155, IERC20};
use crate::crypto::SigningWallet;
use crate::error::{Result, VaultError};
use crate::ports::ChainClient;

/// Polygon JSON-RPC client.
pub struct PolygonChain {
    /// Read-only provider shared by all calls.
    provider: RootProvider<Http<Client>>,
    /// RPC endpoint, reused for per-request wallet providers.
    rpc_url: Url,
    /// Deadline for each transaction receipt.
    confirmation_timeout: Duration,
}

impl PolygonChain {
    /// Build the client. Does not touch the network.
    ///
    /// # Errors
    /// `VaultError::Configuration` for an unparsable RPC URL.
    pub fn new(rpc_url: &str, confirmation_timeout: Duration) -> Result<Self> {
        let rpc_url: Url = rpc_url
            .parse()
            .map_err(|e| VaultError::Configuration(format!("invalid RPC URL {rpc_url:?}: {e}")))?;
        let provider = ProviderBuilder::new().on_http(rpc_url.clone());

        Ok(Self {
            provider,
            rpc_url,
            confirmation_timeout,
        })
    }

    /// Query the chain id and compare it with the configured one.
    ///
    /// # Errors
    /// `Configuration` on mismatch, `Chain` if the RPC call fails.
    #[instrument(skip(self))]
    pub async fn verify_chain_id(&self, expected: u64) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| VaultError::Chain(format!("eth_chainId failed: {e}")))?;

        if chain_id != expected {
            return Err(VaultError::Configuration(format!(
                "RPC serves chain {chain_id}, expected {expected}"
            )));
        }

        info!(chain_id, "Connected to Polygon RPC");
        Ok(chain_id)
    }

    fn wallet_provider(&self, wallet: &SigningWallet) -> impl Provider<Http<Client>> {
        ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(wallet.signer().clone()))
            .on_http(self.rpc_url.clone())
    }

    /// Wait for the receipt and check it succeeded.
    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Http<Client>, Ethereum>,
        operation: &str,
    ) -> Result<String> {
        let tx_hash = format!("{:#x}", pending.tx_hash());
        info!(operation, tx_hash = %tx_hash, "Transaction submitted, awaiting receipt");

        let receipt = await_receipt(
            pending.get_receipt(),
            self.confirmation_timeout,
            operation,
            &tx_hash,
        )
        .await?;

        if !receipt.status() {
            warn!(operation, tx_hash = %tx_hash, "Transaction reverted");
            return Err(VaultError::Chain(format!("{operation} {tx_hash} reverted")));
        }

        info!(operation, tx_hash = %tx_hash, "Transaction confirmed");
        Ok(tx_hash)
    }
}

/// Bound a receipt wait by `deadline`; elapsing is `Timeout`, not a chain error.
async fn await_receipt<T, E, F>(receipt: F, deadline: Duration, operation: &str, tx_hash: &str) -> Result<T>
where
    F: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    tokio::time::timeout(deadline, receipt)
        .await
        .map_err(|_| VaultError::Timeout {
            operation: format!("{operation} receipt {tx_hash}"),
            seconds: deadline.as_secs(),
        })?
        .map_err(|e| VaultError::Chain(format!("{operation} {tx_hash}: {e}")))
}

/// Map a submission error, singling out missing gas funds.
fn submission_error(wallet: &SigningWallet, operation: &str, err: &impl std::fmt::Display) -> VaultError {
    let message = err.to_string();
    if message.to_lowercase().contains("insufficient funds") {
        VaultError::InsufficientGas {
            address: wallet.checksum_address(),
            detail: format!("{operation} rejected by node: {message}"),
        }
    } else {
        VaultError::Chain(format!("{operation} submission failed: {message}"))
    }
}

fn read_error(call: &str, err: &impl std::fmt::Display) -> VaultError {
    VaultError::Chain(format!("{call} failed: {err}"))
}

#[async_trait]
impl ChainClient for PolygonChain {
    #[instrument(skip(self))]
    async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);
        let allowance = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| read_error("allowance", &e))?;
        Ok(allowance._0)
    }

    #[instrument(skip(self))]
    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);
        let balance = contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| read_error("balanceOf", &e))?;
        Ok(balance._0)
    }

    #[instrument(skip(self))]
    async fn is_approved_for_all(&self, token: Address, owner: Address, operator: Address) -> Result<bool> {
        let contract = IERC1155::new(token, &self.provider);
        let approved = contract
            .isApprovedForAll(owner, operator)
            .call()
            .await
            .map_err(|e| read_error("isApprovedForAll", &e))?;
        Ok(approved._0)
    }

    #[instrument(skip(self))]
    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| read_error("eth_getBalance", &e))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| read_error("eth_gasPrice", &e))
    }

    async fn has_code(&self, address: Address) -> Result<bool> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| read_error("eth_getCode", &e))?;
        Ok(!code.is_empty())
    }

    #[instrument(skip(self, wallet), fields(owner = %wallet.address()))]
    async fn approve(
        &self,
        wallet: &SigningWallet,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<String> {
        let provider = self.wallet_provider(wallet);
        let contract = IERC20::new(token, &provider);
        let pending = contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| submission_error(wallet, "approve", &e))?;
        self.confirm(pending, "approve").await
    }

    #[instrument(skip(self, wallet), fields(owner = %wallet.address()))]
    async fn set_approval_for_all(
        &self,
        wallet: &SigningWallet,
        token: Address,
        operator: Address,
        approved: bool,
    ) -> Result<String> {
        let provider = self.wallet_provider(wallet);
        let contract = IERC1155::new(token, &provider);
        let pending = contract
            .setApprovalForAll(operator, approved)
            .send()
            .await
            .map_err(|e| submission_error(wallet, "setApprovalForAll", &e))?;
        self.confirm(pending, "setApprovalForAll").await
    }

    async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> SigningWallet {
        SigningWallet::from_private_key(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap()
    }

    #[test]
    fn test_insufficient_funds_maps_to_gas_error() {
        let err = submission_error(
            &wallet(),
            "approve",
            &"server returned an error response: error code -32000: INSUFFICIENT FUNDS for gas * price + value",
        );
        match err {
            VaultError::InsufficientGas { address, .. } => {
                assert_eq!(address, "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23");
            }
            other => panic!("expected InsufficientGas, got {other:?}"),
        }
    }

    #[test]
    fn test_other_submission_errors_are_chain_errors() {
        let err = submission_error(&wallet(), "approve", &"nonce too low");
        assert!(matches!(err, VaultError::Chain(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_receipt_wait_times_out() {
        let never = std::future::pending::<std::result::Result<(), String>>();
        let err = await_receipt(never, Duration::from_millis(1), "approve", "0xabc")
            .await
            .unwrap_err();
        match &err {
            VaultError::Timeout { operation, seconds } => {
                assert!(operation.contains("approve receipt 0xabc"));
                assert_eq!(*seconds, 0);
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_receipt_errors_are_chain_errors() {
        let failed = async { Err::<(), _>("connection reset") };
        let err = await_receipt(failed, Duration::from_secs(5), "approve", "0xabc")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::Chain(_)));
    }

    #[test]
    fn test_invalid_rpc_url_is_configuration_error() {
        let result = PolygonChain::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(VaultError::Configuration(_))));
    }
}
