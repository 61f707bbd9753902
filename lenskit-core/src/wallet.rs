//! Wallet seam: account listing, message/typed-data signing, and contract
//! call submission.
//!
//! Browser deployments inject a provider-backed implementation; the crate
//! ships [`LocalWallet`] over a local private key for CLI and test use.

use alloy::dyn_abi::TypedData;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy_primitives::{Address, Bytes, Signature, B256};
use async_trait::async_trait;

use crate::error::LensKitError;

/// A wallet capable of backing the session, authoring, and action flows.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Lists the accounts this wallet controls.
    ///
    /// # Errors
    /// Returns [`LensKitError::WalletUnavailable`] if no wallet is present or
    /// the user rejected the request.
    async fn accounts(&self) -> Result<Vec<Address>, LensKitError>;

    /// Signs a plain-text message (EIP-191 personal sign).
    ///
    /// # Errors
    /// Returns an error if the signer fails or the user rejects the prompt.
    async fn sign_message(&self, message: &str) -> Result<Signature, LensKitError>;

    /// Signs an EIP-712 typed-data payload.
    ///
    /// # Errors
    /// Returns an error if the signer fails or the user rejects the prompt.
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, LensKitError>;

    /// Submits a contract call `(to, calldata)` and returns the transaction
    /// hash. No confirmation is awaited.
    ///
    /// # Errors
    /// Returns an error if submission fails or is unsupported.
    async fn send_transaction(&self, to: Address, calldata: Bytes)
        -> Result<B256, LensKitError>;
}

/// Wallet over a local private key. Transactions are submitted through the
/// configured JSON-RPC endpoint; the node serializes nonces.
pub struct LocalWallet {
    signer: PrivateKeySigner,
    rpc_url: Option<String>,
}

impl LocalWallet {
    /// Wraps an existing signer.
    #[must_use]
    pub const fn new(signer: PrivateKeySigner, rpc_url: Option<String>) -> Self {
        Self { signer, rpc_url }
    }

    /// Parses a 0x-prefixed hex private key.
    ///
    /// # Errors
    /// Returns an error if the key is not a valid secp256k1 private key.
    pub fn from_hex_key(key: &str, rpc_url: Option<String>) -> Result<Self, LensKitError> {
        let signer: PrivateKeySigner =
            key.parse().map_err(|_| LensKitError::InvalidInput {
                attribute: "private_key".to_string(),
                reason: "not a valid private key".to_string(),
            })?;
        Ok(Self::new(signer, rpc_url))
    }

    /// The wallet's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    async fn accounts(&self) -> Result<Vec<Address>, LensKitError> {
        Ok(vec![self.signer.address()])
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, LensKitError> {
        Ok(self.signer.sign_message(message.as_bytes()).await?)
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature, LensKitError> {
        Ok(self.signer.sign_dynamic_typed_data(payload).await?)
    }

    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> Result<B256, LensKitError> {
        let Some(rpc_url) = &self.rpc_url else {
            return Err(LensKitError::InvalidInput {
                attribute: "rpc_url".to_string(),
                reason: "no RPC endpoint configured for transaction submission"
                    .to_string(),
            });
        };
        let url: reqwest::Url =
            rpc_url.parse().map_err(|err| LensKitError::InvalidInput {
                attribute: "rpc_url".to_string(),
                reason: format!("{err}"),
            })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(url);
        let request = TransactionRequest::default().with_to(to).with_input(calldata);
        let pending = provider.send_transaction(request).await.map_err(|err| {
            LensKitError::Network {
                url: rpc_url.clone(),
                status: None,
                error: err.to_string(),
            }
        })?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(%tx_hash, "transaction submitted");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_signer, TEST_SIGNER_ADDRESS};

    #[tokio::test]
    async fn test_accounts_lists_signer_address() {
        let wallet = LocalWallet::new(test_signer(), None);
        assert_eq!(wallet.accounts().await.unwrap(), vec![TEST_SIGNER_ADDRESS]);
    }

    #[tokio::test]
    async fn test_send_without_rpc_is_rejected() {
        let wallet = LocalWallet::new(test_signer(), None);
        let result = wallet
            .send_transaction(TEST_SIGNER_ADDRESS, Bytes::new())
            .await;
        assert!(matches!(
            result,
            Err(LensKitError::InvalidInput { attribute, .. }) if attribute == "rpc_url"
        ));
    }

    #[test]
    fn test_from_hex_key_rejects_garbage() {
        assert!(LocalWallet::from_hex_key("0xnope", None).is_err());
    }
}
