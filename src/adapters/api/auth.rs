//! CLOB L1 Authentication - EIP-712 Wallet Attestation
//!
//! To obtain API credentials the custodial wallet signs a `ClobAuth`
//! typed-data message under the `ClobAuthDomain` domain. The exchange
//! recovers the signer from the `POLY_*` headers and issues (or
//! re-derives) the key bound to that address.

use alloy::primitives::{hex, U256};
use alloy::signers::SignerSync;
use alloy::sol_types::eip712_domain;

use crate::crypto::SigningWallet;
use crate::domain::clob_auth::unix_timestamp;
use crate::error::{Result, VaultError};

/// Text the wallet attests to in every L1 signature.
pub const ATTESTATION: &str = "This message attests that I control the given wallet";

mod typed {
    alloy::sol! {
        struct ClobAuth {
            address address;
            string timestamp;
            uint256 nonce;
            string message;
        }
    }
}

/// Sign the EIP-712 `ClobAuth` message for the given chain.
///
/// # Errors
/// `VaultError::Crypto` if signing fails.
pub fn sign_clob_auth(
    wallet: &SigningWallet,
    chain_id: u64,
    timestamp: &str,
    nonce: U256,
) -> Result<String> {
    let message = typed::ClobAuth {
        address: wallet.address(),
        timestamp: timestamp.to_string(),
        nonce,
        message: ATTESTATION.to_string(),
    };
    let domain = eip712_domain! {
        name: "ClobAuthDomain",
        version: "1",
        chain_id: chain_id,
    };
    let signature = wallet
        .signer()
        .sign_typed_data_sync(&message, &domain)
        .map_err(|e| VaultError::Crypto(format!("ClobAuth signing failed: {e}")))?;
    Ok(hex::encode_prefixed(signature.as_bytes()))
}

/// Headers for `/auth/api-key` and `/auth/derive-api-key`.
///
/// # Errors
/// Same as [`sign_clob_auth`].
pub fn l1_headers(wallet: &SigningWallet, chain_id: u64, nonce: U256) -> Result<Vec<(&'static str, String)>> {
    let ts = unix_timestamp();
    let signature = sign_clob_auth(wallet, chain_id, &ts, nonce)?;
    Ok(vec![
        ("POLY_ADDRESS", wallet.checksum_address()),
        ("POLY_SIGNATURE", signature),
        ("POLY_TIMESTAMP", ts),
        ("POLY_NONCE", nonce.to_string()),
    ])
}
