//! Authoring layer: media upload, metadata assembly, and post creation.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::PostRequest;
use crate::error::LensKitError;
use crate::graphql::ApiClient;
use crate::ipfs::StorageClient;
use crate::metadata::{MediaItem, MetadataDocument};
use crate::session::Session;
use crate::typed_data::SignatureComponents;
use crate::wallet::Wallet;
use crate::{contracts, Config};

/// A media file attached to a post.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// MIME type (e.g. `video/mp4`).
    pub mime_type: String,
    /// Filename forwarded to the storage gateway.
    pub filename: String,
}

/// User-entered content for a new post.
#[derive(Debug, Clone, Default)]
pub struct PostContent {
    /// Post body.
    pub text: String,
    /// Optional media attachment.
    pub media: Option<MediaUpload>,
    /// The author's handle, used for the document's external URL.
    pub author_handle: Option<String>,
}

/// Creates posts: uploads content, obtains typed data, signs it, and submits
/// the transaction directly to the hub's `postWithSig` entry point.
pub struct Publisher {
    api: Arc<ApiClient>,
    storage: Arc<StorageClient>,
    wallet: Arc<dyn Wallet>,
    lens_hub: Address,
}

impl Publisher {
    /// Creates a publisher over the given clients and wallet.
    #[must_use]
    pub fn new(
        api: Arc<ApiClient>,
        storage: Arc<StorageClient>,
        wallet: Arc<dyn Wallet>,
        config: &Config,
    ) -> Self {
        Self {
            api,
            storage,
            wallet,
            lens_hub: config.lens_hub,
        }
    }

    /// Creates an on-chain post from user-entered content.
    ///
    /// Media (when present) is uploaded first, then the metadata document is
    /// validated against the API schema (advisory: a rejection is logged and
    /// the flow continues, matching the upstream behavior) and uploaded. The
    /// resulting content URI goes into a `createPostTypedData` request; the
    /// returned payload is signed and submitted as `postWithSig`.
    ///
    /// Returns the transaction hash. No on-chain confirmation is awaited. A
    /// failure after the media upload leaves the uploaded content behind on
    /// the gateway; no cleanup is attempted.
    ///
    /// # Errors
    /// Returns an error if any upload, API call, signature, or submission
    /// step fails.
    pub async fn create_post(
        &self,
        session: &Session,
        content: &PostContent,
        cancel: &CancellationToken,
    ) -> Result<B256, LensKitError> {
        let media_item = match &content.media {
            Some(upload) => {
                let added = self
                    .storage
                    .add_bytes(upload.bytes.clone(), &upload.filename, cancel)
                    .await?;
                debug!(path = %added.path(), "media uploaded");
                Some(MediaItem {
                    mime_type: upload.mime_type.clone(),
                    item: added.content_uri(),
                })
            }
            None => None,
        };

        let document = MetadataDocument::new(
            &content.text,
            media_item,
            content.author_handle.as_deref(),
        );

        // Advisory only: the result is logged, never acted upon.
        match self.api.validate_publication_metadata(&document, cancel).await {
            Ok(result) if !result.valid => {
                warn!(reason = ?result.reason, "metadata failed schema validation");
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "metadata validation request failed"),
        }

        let added = self.storage.add_json(&document, "metadata.json", cancel).await?;
        let request = PostRequest::new(&session.profile_id, &added.content_uri());

        let envelope = self
            .api
            .create_post_typed_data(&request, session.access_token(), cancel)
            .await?;

        let payload = envelope.typed_data.to_signable()?;
        let signature = self.wallet.sign_typed_data(&payload).await?;
        let components = SignatureComponents::from_signature(&signature)?;

        let calldata =
            contracts::post_with_sig_calldata(&envelope.typed_data.value, &components)?;
        let tx_hash = self.wallet.send_transaction(self.lens_hub, calldata).await?;
        info!(%tx_hash, publication_request = %envelope.id, "post transaction submitted");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolCall;
    use mockito::Matcher;

    use super::*;
    use crate::contracts::postWithSigCall;
    use crate::testing::{post_typed_data_body, test_api_client, MockWallet};

    fn storage_client(server: &mockito::Server) -> StorageClient {
        let config = crate::config::IpfsConfig {
            api_url: server.url(),
            project_id: None,
            project_secret: None,
        };
        StorageClient::new(&config, std::time::Duration::from_secs(5))
    }

    fn test_session() -> Session {
        Session {
            wallet_address: crate::testing::TEST_SIGNER_ADDRESS,
            profile_id: "0x01".to_string(),
            tokens: crate::api::AuthTokens {
                access_token: "tok1".to_string(),
                refresh_token: "ref1".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_post_without_media() {
        let mut api_server = mockito::Server::new_async().await;
        let mut ipfs_server = mockito::Server::new_async().await;

        ipfs_server
            .mock("POST", "/api/v0/add")
            .with_status(200)
            .with_body(r#"{"Name":"metadata.json","Hash":"Qm123","Size":"42"}"#)
            .create_async()
            .await;

        // Validation must see a text-only document under the lensfrens app id.
        let validate = api_server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("ValidatePublicationMetadata".to_string()),
                Matcher::Regex(r#""media":\[\]"#.to_string()),
                Matcher::Regex(r#""appId":"lensfrens""#.to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data":{"validatePublicationMetadata":{"valid":true,"reason":null}}}"#,
            )
            .create_async()
            .await;

        // The post request must carry the content URI of the uploaded document.
        let create = api_server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("createPostTypedData".to_string()),
                Matcher::Regex(r#""contentURI":"ipfs://Qm123""#.to_string()),
            ]))
            .match_header("authorization", "Bearer tok1")
            .with_status(200)
            .with_body(post_typed_data_body("ipfs://Qm123"))
            .create_async()
            .await;

        let wallet = Arc::new(MockWallet::new());
        let config = crate::testing::test_config(&api_server.url());
        let publisher = Publisher::new(
            Arc::new(test_api_client(&api_server.url())),
            Arc::new(storage_client(&ipfs_server)),
            Arc::clone(&wallet) as Arc<dyn Wallet>,
            &config,
        );

        let tx_hash = publisher
            .create_post(
                &test_session(),
                &PostContent {
                    text: "hello".to_string(),
                    ..PostContent::default()
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(tx_hash, alloy_primitives::B256::repeat_byte(0x42));

        validate.assert_async().await;
        create.assert_async().await;

        // Exactly one transaction, to the hub, carrying postWithSig calldata
        // with the content URI inside.
        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        let (to, calldata) = &sent[0];
        assert_eq!(*to, config.lens_hub);
        assert_eq!(calldata[..4], postWithSigCall::SELECTOR);
        let uri = b"ipfs://Qm123";
        assert!(calldata.windows(uri.len()).any(|window| window == uri));
    }

    #[tokio::test]
    async fn test_create_post_with_media_uploads_twice() {
        let mut api_server = mockito::Server::new_async().await;
        let mut ipfs_server = mockito::Server::new_async().await;

        let add = ipfs_server
            .mock("POST", "/api/v0/add")
            .with_status(200)
            .with_body(r#"{"Name":"f","Hash":"QmVid","Size":"9"}"#)
            .expect(2)
            .create_async()
            .await;

        // Validation sees the video document.
        api_server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("ValidatePublicationMetadata".to_string()),
                Matcher::Regex(r#""appId":"lenstube""#.to_string()),
                Matcher::Regex(r#""item":"ipfs://QmVid""#.to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"data":{"validatePublicationMetadata":{"valid":true,"reason":null}}}"#,
            )
            .create_async()
            .await;
        api_server
            .mock("POST", "/")
            .match_body(Matcher::Regex("createPostTypedData".to_string()))
            .with_status(200)
            .with_body(post_typed_data_body("ipfs://QmVid"))
            .create_async()
            .await;

        let wallet = Arc::new(MockWallet::new());
        let config = crate::testing::test_config(&api_server.url());
        let publisher = Publisher::new(
            Arc::new(test_api_client(&api_server.url())),
            Arc::new(storage_client(&ipfs_server)),
            Arc::clone(&wallet) as Arc<dyn Wallet>,
            &config,
        );

        publisher
            .create_post(
                &test_session(),
                &PostContent {
                    text: "clip".to_string(),
                    media: Some(MediaUpload {
                        bytes: vec![0u8; 16],
                        mime_type: "video/mp4".to_string(),
                        filename: "clip.mp4".to_string(),
                    }),
                    author_handle: Some("lens/alice".to_string()),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        add.assert_async().await;
        assert_eq!(wallet.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_metadata_is_advisory_only() {
        let mut api_server = mockito::Server::new_async().await;
        let mut ipfs_server = mockito::Server::new_async().await;

        ipfs_server
            .mock("POST", "/api/v0/add")
            .with_status(200)
            .with_body(r#"{"Name":"metadata.json","Hash":"Qm123","Size":"42"}"#)
            .create_async()
            .await;
        api_server
            .mock("POST", "/")
            .match_body(Matcher::Regex("ValidatePublicationMetadata".to_string()))
            .with_status(200)
            .with_body(
                r#"{"data":{"validatePublicationMetadata":{"valid":false,"reason":"MISSING_FIELD"}}}"#,
            )
            .create_async()
            .await;
        api_server
            .mock("POST", "/")
            .match_body(Matcher::Regex("createPostTypedData".to_string()))
            .with_status(200)
            .with_body(post_typed_data_body("ipfs://Qm123"))
            .create_async()
            .await;

        let wallet = Arc::new(MockWallet::new());
        let config = crate::testing::test_config(&api_server.url());
        let publisher = Publisher::new(
            Arc::new(test_api_client(&api_server.url())),
            Arc::new(storage_client(&ipfs_server)),
            Arc::clone(&wallet) as Arc<dyn Wallet>,
            &config,
        );

        // The flow still completes; the validation result is only logged.
        publisher
            .create_post(
                &test_session(),
                &PostContent {
                    text: "hello".to_string(),
                    ..PostContent::default()
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(wallet.sent_transactions().len(), 1);
    }
}
