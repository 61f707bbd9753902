//! Shared test fixtures: a deterministic signer and a recording wallet.

use std::sync::Mutex;
use std::time::Duration;

use alloy::dyn_abi::TypedData;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy_primitives::{address, Address, Bytes, Signature, B256};
use async_trait::async_trait;

use crate::config::{Config, IpfsConfig};
use crate::error::LensKitError;
use crate::graphql::ApiClient;
use crate::wallet::{LocalWallet, Wallet};

/// Address of [`test_signer`] (private key `0x...01`).
pub const TEST_SIGNER_ADDRESS: Address =
    address!("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");

pub fn test_signer() -> PrivateKeySigner {
    "0x0000000000000000000000000000000000000000000000000000000000000001"
        .parse()
        .unwrap()
}

pub fn test_wallet() -> LocalWallet {
    LocalWallet::new(test_signer(), None)
}

pub fn test_config(api_url: &str) -> Config {
    Config {
        api_url: api_url.to_string(),
        ipfs: IpfsConfig::default(),
        lens_hub: crate::config::DEFAULT_LENS_HUB,
        rpc_url: None,
        api_timeout: Duration::from_secs(5),
        upload_timeout: Duration::from_secs(5),
    }
}

pub fn test_api_client(api_url: &str) -> ApiClient {
    ApiClient::new(&test_config(api_url))
}

/// Wallet that signs with the deterministic test key and records every
/// submitted transaction instead of broadcasting it.
pub struct MockWallet {
    signer: PrivateKeySigner,
    accounts: Vec<Address>,
    pub sent: Mutex<Vec<(Address, Bytes)>>,
}

impl MockWallet {
    pub fn new() -> Self {
        let signer = test_signer();
        let accounts = vec![signer.address()];
        Self {
            signer,
            accounts,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn without_accounts() -> Self {
        Self {
            accounts: Vec::new(),
            ..Self::new()
        }
    }

    pub fn sent_transactions(&self) -> Vec<(Address, Bytes)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Wallet for MockWallet {
    async fn accounts(&self) -> Result<Vec<Address>, LensKitError> {
        if self.accounts.is_empty() {
            return Err(LensKitError::WalletUnavailable);
        }
        Ok(self.accounts.clone())
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
        self.sent.lock().unwrap().push((to, calldata));
        Ok(B256::repeat_byte(0x42))
    }
}

/// A realistic `createPostTypedData` response body for mock servers.
pub fn post_typed_data_body(content_uri: &str) -> String {
    serde_json::json!({
        "data": {
            "createPostTypedData": {
                "id": "td-1",
                "expiresAt": "2024-01-01T00:00:00Z",
                "typedData": {
                    "types": {
                        "__typename": "CreatePostEIP712TypedDataTypes",
                        "PostWithSig": [
                            { "name": "profileId", "type": "uint256" },
                            { "name": "contentURI", "type": "string" },
                            { "name": "collectModule", "type": "address" },
                            { "name": "collectModuleInitData", "type": "bytes" },
                            { "name": "referenceModule", "type": "address" },
                            { "name": "referenceModuleInitData", "type": "bytes" },
                            { "name": "nonce", "type": "uint256" },
                            { "name": "deadline", "type": "uint256" },
                        ],
                    },
                    "domain": {
                        "__typename": "EIP712TypedDataDomain",
                        "name": "Lens Protocol Profiles",
                        "chainId": 80001,
                        "version": "2",
                        "verifyingContract": "0xDb46d1Dc155634FbC732f92E853b10B288AD5a1d",
                    },
                    "value": {
                        "__typename": "CreatePostEIP712TypedDataValue",
                        "nonce": 0,
                        "deadline": 1_700_000_000u64,
                        "profileId": "0x01",
                        "contentURI": content_uri,
                        "collectModule": "0x0C3C4E1823C1E8121013Bf43A83fBEF2858F463e",
                        "collectModuleInitData": "0x",
                        "referenceModule": "0x0000000000000000000000000000000000000000",
                        "referenceModuleInitData": "0x",
                    },
                },
            },
        },
    })
    .to_string()
}

/// A realistic `createActOnOpenActionTypedData` response body.
pub fn act_typed_data_body() -> String {
    serde_json::json!({
        "data": {
            "createActOnOpenActionTypedData": {
                "id": "act-1",
                "expiresAt": "2024-01-01T00:00:00Z",
                "typedData": {
                    "types": {
                        "__typename": "CreateActOnOpenActionEIP712TypedDataTypes",
                        "Act": [
                            { "name": "publicationActedProfileId", "type": "uint256" },
                            { "name": "publicationActedId", "type": "uint256" },
                            { "name": "actorProfileId", "type": "uint256" },
                            { "name": "referrerProfileIds", "type": "uint256[]" },
                            { "name": "referrerPubIds", "type": "uint256[]" },
                            { "name": "actionModuleAddress", "type": "address" },
                            { "name": "actionModuleData", "type": "bytes" },
                            { "name": "nonce", "type": "uint256" },
                            { "name": "deadline", "type": "uint256" },
                        ],
                    },
                    "domain": {
                        "__typename": "EIP712TypedDataDomain",
                        "name": "Lens Protocol Profiles",
                        "chainId": 80001,
                        "version": "2",
                        "verifyingContract": "0xDb46d1Dc155634FbC732f92E853b10B288AD5a1d",
                    },
                    "value": {
                        "__typename": "CreateActOnOpenActionEIP712TypedDataValue",
                        "nonce": 0,
                        "deadline": 1_700_000_000u64,
                        "publicationActedProfileId": "0x01",
                        "publicationActedId": "0x02",
                        "actorProfileId": "0x03",
                        "referrerProfileIds": [],
                        "referrerPubIds": [],
                        "actionModuleAddress": "0x0C3C4E1823C1E8121013Bf43A83fBEF2858F463e",
                        "actionModuleData": "0x",
                    },
                },
            },
        },
    })
    .to_string()
}
