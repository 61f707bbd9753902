//! Operations against the Lens GraphQL API.
//!
//! Each operation is a typed wrapper over [`ApiClient::execute`] with the
//! GraphQL document transcribed from the upstream schema. Authenticated
//! operations take the bearer token explicitly.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::LensKitError;
use crate::graphql::ApiClient;
use crate::metadata::MetadataDocument;
use crate::typed_data::TypedDataRequest;

const CHALLENGE_QUERY: &str = r"
  query Challenge($signedBy: EvmAddress!, $for: ProfileId) {
    challenge(request: { signedBy: $signedBy, for: $for }) {
      id
      text
    }
  }
";

const AUTHENTICATE_MUTATION: &str = r"
  mutation Authenticate($id: ChallengeId!, $signature: Signature!) {
    authenticate(request: { id: $id, signature: $signature }) {
      accessToken
      refreshToken
    }
  }
";

const PROFILES_MANAGED_QUERY: &str = r"
  query ProfilesManaged($for: EvmAddress!) {
    profilesManaged(request: { for: $for }) {
      items {
        id
        handle {
          fullHandle
        }
      }
      pageInfo {
        next
      }
    }
  }
";

const VALIDATE_METADATA_QUERY: &str = r"
  query ValidatePublicationMetadata($metadatav2: PublicationMetadataV2Input!) {
    validatePublicationMetadata(request: { metadatav2: $metadatav2 }) {
      valid
      reason
    }
  }
";

const PUBLICATIONS_QUERY: &str = r"
  query Publications($request: PublicationsRequest!) {
    publications(request: $request) {
      items {
        ... on Post {
          openActionModules {
            ... on UnknownOpenActionModuleSettings {
              openActionModuleReturnData
              type
              contract {
                address
                chainId
              }
            }
          }
          id
          by {
            id
          }
          publishedOn {
            id
          }
          txHash
        }
      }
    }
  }
";

const CREATE_POST_TYPED_DATA_MUTATION: &str = r"
  mutation createPostTypedData($request: CreatePublicPostRequest!) {
    createPostTypedData(request: $request) {
      id
      expiresAt
      typedData {
        types {
          PostWithSig {
            name
            type
          }
        }
        domain {
          name
          chainId
          version
          verifyingContract
        }
        value {
          nonce
          deadline
          profileId
          contentURI
          collectModule
          collectModuleInitData
          referenceModule
          referenceModuleInitData
        }
      }
    }
  }
";

const CREATE_ACT_TYPED_DATA_MUTATION: &str = r"
  mutation CreateActOnOpenActionTypedData($request: ActOnOpenActionRequest!) {
    createActOnOpenActionTypedData(request: $request) {
      id
      expiresAt
      typedData {
        types {
          Act {
            name
            type
          }
        }
        domain {
          name
          chainId
          version
          verifyingContract
        }
        value {
          nonce
          deadline
          publicationActedProfileId
          publicationActedId
          actorProfileId
          referrerProfileIds
          referrerPubIds
          actionModuleAddress
          actionModuleData
        }
      }
    }
  }
";

const BROADCAST_ONCHAIN_MUTATION: &str = r"
  mutation BroadcastOnchain($request: BroadcastRequest!) {
    broadcastOnchain(request: $request) {
      __typename
      ... on RelaySuccess {
        txHash
        txId
      }
      ... on RelayError {
        reason
      }
    }
  }
";

const APPROVED_ALLOWANCE_QUERY: &str = r"
  query ApprovedModuleAllowanceAmount(
    $request: ApprovedModuleAllowanceAmountRequest!
  ) {
    approvedModuleAllowanceAmount(request: $request) {
      moduleName
      moduleContract {
        address
        chainId
      }
      allowance {
        asset {
          ... on Erc20 {
            name
            symbol
            decimals
            contract {
              address
              chainId
            }
          }
        }
        value
      }
    }
  }
";

/// A short-lived, single-use login challenge issued per (address, profile).
#[derive(Debug, Clone, Deserialize)]
pub struct ChallengeInfo {
    /// Challenge identifier, exchanged together with the signature.
    pub id: String,
    /// Plain-text message the wallet must sign.
    pub text: String,
}

/// Bearer token pair returned by a successful authentication.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Short-lived access token sent as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Refresh token. Token refresh on expiry is not implemented.
    pub refresh_token: String,
}

/// A profile managed by a wallet address.
#[derive(Debug, Clone, Deserialize)]
pub struct ManagedProfile {
    /// Profile identifier (e.g. `0x01`).
    pub id: String,
    /// The profile's handle, when one is set.
    pub handle: Option<ProfileHandle>,
}

/// A profile handle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHandle {
    /// Fully qualified handle (e.g. `lens/alice`).
    pub full_handle: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

/// Advisory result of metadata schema validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationResult {
    /// Whether the document passed validation.
    pub valid: bool,
    /// Reason for rejection, when invalid.
    pub reason: Option<String>,
}

/// Read-only projection of a published post.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    /// Publication identifier.
    pub id: String,
    /// The app the post was published on.
    pub published_on: Option<PublishedOn>,
    /// Open-action module settings attached to the post.
    #[serde(default)]
    pub open_action_modules: Vec<OpenActionModuleSettings>,
}

/// App attribution of a publication.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishedOn {
    /// App identifier.
    pub id: String,
}

/// Settings of an open-action module attached to a publication.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenActionModuleSettings {
    /// The module contract.
    pub contract: Option<ContractRef>,
    /// Module return data, when exposed.
    pub open_action_module_return_data: Option<String>,
}

/// Address/chain pair identifying a contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRef {
    /// The contract address.
    pub address: String,
    /// The chain the contract is deployed on.
    pub chain_id: Option<u64>,
}

/// A typed-data payload envelope returned by the API, carrying the signing
/// triple plus bookkeeping fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataEnvelope {
    /// Broadcast id, single-use.
    pub id: String,
    /// Expiry of the embedded deadline.
    pub expires_at: Option<String>,
    /// The EIP-712 domain/types/value triple to sign.
    pub typed_data: TypedDataRequest,
}

/// Relay outcome for a broadcast signed payload. Returned as a value, never
/// as an `Err`: a refused relay is an expected API answer, not a transport
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "__typename")]
pub enum RelayResult {
    /// The relay accepted the payload and submitted it on-chain.
    #[serde(rename = "RelaySuccess", rename_all = "camelCase")]
    Success {
        /// Transaction hash, when already available.
        tx_hash: Option<String>,
        /// Relay-internal transaction id.
        tx_id: Option<String>,
    },
    /// The relay refused the payload.
    #[serde(rename = "RelayError", rename_all = "camelCase")]
    Error {
        /// Machine-readable refusal reason (e.g. `INSUFFICIENT_ALLOWANCE`).
        reason: String,
    },
}

/// Module allowance granted by the authenticated profile's wallet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleAllowance {
    /// Human-readable module name, when known.
    pub module_name: Option<String>,
    /// The module contract the allowance applies to.
    pub module_contract: Option<ContractRef>,
    /// Current allowance.
    pub allowance: AllowanceAmount,
}

/// An amount of an ERC-20 asset, as reported by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceAmount {
    /// The asset the amount is denominated in.
    pub asset: Option<Erc20Asset>,
    /// Decimal string in whole-asset units (e.g. `"1.5"`).
    pub value: String,
}

/// ERC-20 asset descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct Erc20Asset {
    /// Token name.
    pub name: Option<String>,
    /// Token symbol.
    pub symbol: Option<String>,
    /// Token decimals.
    pub decimals: u8,
    /// Token contract.
    pub contract: Option<ContractRef>,
}

/// Collect/reference module configuration for post creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    /// The authoring profile.
    pub profile_id: String,
    /// Content URI of the uploaded metadata document.
    #[serde(rename = "contentURI")]
    pub content_uri: String,
    /// Collect module configuration.
    pub collect_module: serde_json::Value,
    /// Reference module configuration.
    pub reference_module: serde_json::Value,
}

impl PostRequest {
    /// Builds a post request with the module configuration used by this app:
    /// follower-only free collects, no follower restriction on references.
    #[must_use]
    pub fn new(profile_id: &str, content_uri: &str) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            content_uri: content_uri.to_string(),
            collect_module: serde_json::json!({
                "freeCollectModule": { "followerOnly": true },
            }),
            reference_module: serde_json::json!({
                "followerOnlyReferenceModule": false,
            }),
        }
    }
}

impl ApiClient {
    /// Requests a login challenge for `(signed_by, for_profile)`.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn challenge(
        &self,
        signed_by: Address,
        for_profile: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ChallengeInfo, LensKitError> {
        self.execute(
            CHALLENGE_QUERY,
            "challenge",
            serde_json::json!({
                "signedBy": signed_by.to_string(),
                "for": for_profile,
            }),
            None,
            cancel,
        )
        .await
    }

    /// Exchanges `(challenge_id, signature)` for a bearer token pair.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload
    /// (e.g. an invalid or expired signature).
    pub async fn authenticate(
        &self,
        challenge_id: &str,
        signature: &str,
        cancel: &CancellationToken,
    ) -> Result<AuthTokens, LensKitError> {
        self.execute(
            AUTHENTICATE_MUTATION,
            "authenticate",
            serde_json::json!({
                "id": challenge_id,
                "signature": signature,
            }),
            None,
            cancel,
        )
        .await
    }

    /// Lists the profiles managed by a wallet address.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn profiles_managed(
        &self,
        owner: Address,
        cancel: &CancellationToken,
    ) -> Result<Vec<ManagedProfile>, LensKitError> {
        let page: Page<ManagedProfile> = self
            .execute(
                PROFILES_MANAGED_QUERY,
                "profilesManaged",
                serde_json::json!({ "for": owner.to_string() }),
                None,
                cancel,
            )
            .await?;
        Ok(page.items)
    }

    /// Validates a metadata document against the API schema. Advisory only.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn validate_publication_metadata(
        &self,
        document: &MetadataDocument,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult, LensKitError> {
        self.execute(
            VALIDATE_METADATA_QUERY,
            "validatePublicationMetadata",
            serde_json::json!({ "metadatav2": document }),
            None,
            cancel,
        )
        .await
    }

    /// Fetches publications by author, filtered to those carrying the given
    /// open-action module.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn publications(
        &self,
        from_profile: &str,
        open_action_module: Address,
        cancel: &CancellationToken,
    ) -> Result<Vec<Publication>, LensKitError> {
        let page: Page<Publication> = self
            .execute(
                PUBLICATIONS_QUERY,
                "publications",
                serde_json::json!({
                    "request": {
                        "where": {
                            "from": from_profile,
                            "withOpenActions": [
                                { "address": open_action_module.to_string() },
                            ],
                        },
                    },
                }),
                None,
                cancel,
            )
            .await?;
        Ok(page.items)
    }

    /// Requests typed data for a new post. Authenticated.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn create_post_typed_data(
        &self,
        request: &PostRequest,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<TypedDataEnvelope, LensKitError> {
        self.execute(
            CREATE_POST_TYPED_DATA_MUTATION,
            "createPostTypedData",
            serde_json::json!({ "request": request }),
            Some(token),
            cancel,
        )
        .await
    }

    /// Requests typed data for acting on a publication through an unknown
    /// open-action module. Authenticated.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn create_act_on_open_action_typed_data(
        &self,
        publication_id: &str,
        module: Address,
        action_data: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<TypedDataEnvelope, LensKitError> {
        self.execute(
            CREATE_ACT_TYPED_DATA_MUTATION,
            "createActOnOpenActionTypedData",
            serde_json::json!({
                "request": {
                    "for": publication_id,
                    "actOn": {
                        "unknownOpenAction": {
                            "address": module.to_string(),
                            "data": action_data,
                        },
                    },
                },
            }),
            Some(token),
            cancel,
        )
        .await
    }

    /// Broadcasts a signed typed-data payload through the relay.
    ///
    /// A refused relay comes back as [`RelayResult::Error`], not as an `Err`.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn broadcast_onchain(
        &self,
        id: &str,
        signature: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<RelayResult, LensKitError> {
        self.execute(
            BROADCAST_ONCHAIN_MUTATION,
            "broadcastOnchain",
            serde_json::json!({
                "request": {
                    "id": id,
                    "signature": signature,
                },
            }),
            Some(token),
            cancel,
        )
        .await
    }

    /// Queries the allowance the wallet has granted to open-action modules
    /// for the given currency. Authenticated.
    ///
    /// # Errors
    /// Returns an error on transport failure or a GraphQL error payload.
    pub async fn approved_module_allowance_amount(
        &self,
        currency: Address,
        module: Address,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ModuleAllowance>, LensKitError> {
        self.execute(
            APPROVED_ALLOWANCE_QUERY,
            "approvedModuleAllowanceAmount",
            serde_json::json!({
                "request": {
                    "currencies": [currency.to_string()],
                    "unknownOpenActionModules": [module.to_string()],
                },
            }),
            Some(token),
            cancel,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_result_parses_success_and_error() {
        let success: RelayResult = serde_json::from_str(
            r#"{"__typename":"RelaySuccess","txHash":"0xabc","txId":"id-1"}"#,
        )
        .unwrap();
        assert_eq!(
            success,
            RelayResult::Success {
                tx_hash: Some("0xabc".to_string()),
                tx_id: Some("id-1".to_string()),
            }
        );

        let error: RelayResult = serde_json::from_str(
            r#"{"__typename":"RelayError","reason":"INSUFFICIENT_ALLOWANCE"}"#,
        )
        .unwrap();
        assert_eq!(
            error,
            RelayResult::Error {
                reason: "INSUFFICIENT_ALLOWANCE".to_string(),
            }
        );
    }

    #[test]
    fn test_publication_parses_projection() {
        let publication: Publication = serde_json::from_str(
            r#"{
                "id": "0x01-0x02",
                "publishedOn": { "id": "lensfrens" },
                "openActionModules": [
                    {
                        "type": "UnknownOpenActionModule",
                        "contract": {
                            "address": "0x0C3C4E1823C1E8121013Bf43A83fBEF2858F463e",
                            "chainId": 80001
                        }
                    }
                ],
                "by": { "id": "0x01" },
                "txHash": "0xdeadbeef"
            }"#,
        )
        .unwrap();
        assert_eq!(publication.id, "0x01-0x02");
        assert_eq!(publication.published_on.unwrap().id, "lensfrens");
        assert_eq!(publication.open_action_modules.len(), 1);
    }

    #[test]
    fn test_post_request_defaults_match_module_config() {
        let request = PostRequest::new("0x01", "ipfs://Qm123");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["profileId"], "0x01");
        assert_eq!(json["contentURI"], "ipfs://Qm123");
        assert_eq!(
            json["collectModule"]["freeCollectModule"]["followerOnly"],
            true
        );
        assert_eq!(
            json["referenceModule"]["followerOnlyReferenceModule"],
            false
        );
    }
}
