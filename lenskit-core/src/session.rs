//! Session layer: wallet connection and challenge/sign/authenticate login.

use std::sync::Arc;

use alloy_primitives::Address;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{AuthTokens, ManagedProfile};
use crate::error::LensKitError;
use crate::graphql::ApiClient;
use crate::store::{TokenStore, AUTH_TOKEN_KEY};
use crate::typed_data::signature_hex;
use crate::wallet::Wallet;

/// An authenticated session. Constructed only after the whole
/// challenge/sign/authenticate exchange succeeds; a failed login leaves no
/// partial session behind.
#[derive(Debug, Clone)]
pub struct Session {
    /// The wallet address the session was authenticated for.
    pub wallet_address: Address,
    /// The profile the session acts as.
    pub profile_id: String,
    /// Bearer token pair, held in memory for the session lifetime.
    pub tokens: AuthTokens,
}

impl Session {
    /// The access token sent on authenticated operations.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }
}

/// A wallet account the client is already connected to, with its first
/// managed profile when one exists.
#[derive(Debug, Clone)]
pub struct ConnectedAccount {
    /// The connected address.
    pub address: Address,
    /// The first profile managed by the address.
    pub profile: Option<ManagedProfile>,
}

/// Orchestrates wallet connection and login against the API.
pub struct SessionManager {
    api: Arc<ApiClient>,
    wallet: Arc<dyn Wallet>,
    store: Arc<dyn TokenStore>,
}

impl SessionManager {
    /// Creates a session manager over the given API client, wallet, and
    /// token store.
    #[must_use]
    pub fn new(
        api: Arc<ApiClient>,
        wallet: Arc<dyn Wallet>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self { api, wallet, store }
    }

    /// Requests wallet accounts and returns the first one.
    ///
    /// # Errors
    /// Returns [`LensKitError::WalletUnavailable`] if no wallet is present,
    /// the user rejected the request, or no account is exposed.
    pub async fn connect(&self) -> Result<Address, LensKitError> {
        let accounts = self.wallet.accounts().await?;
        accounts
            .first()
            .copied()
            .ok_or(LensKitError::WalletUnavailable)
    }

    /// Checks for an already-connected account and resolves its first
    /// managed profile for display.
    ///
    /// # Errors
    /// Returns an error if the profile lookup fails.
    pub async fn resume(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<ConnectedAccount>, LensKitError> {
        let accounts = match self.wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!(%err, "no wallet connection to resume");
                Vec::new()
            }
        };
        let Some(address) = accounts.first().copied() else {
            return Ok(None);
        };
        let profile = self
            .api
            .profiles_managed(address, cancel)
            .await?
            .into_iter()
            .next();
        Ok(Some(ConnectedAccount { address, profile }))
    }

    /// Performs the challenge/sign/authenticate exchange for
    /// `(address, profile_id)` and persists the access token under
    /// [`AUTH_TOKEN_KEY`].
    ///
    /// Login is atomic with respect to observable session state: failure at
    /// any step aborts with nothing persisted and no session returned. No
    /// retry is attempted; the caller re-invokes `login`.
    ///
    /// # Errors
    /// Returns an error if the challenge request, wallet signature,
    /// authentication exchange, or token persistence fails.
    pub async fn login(
        &self,
        address: Address,
        profile_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Session, LensKitError> {
        let challenge = self.api.challenge(address, Some(profile_id), cancel).await?;
        debug!(challenge_id = %challenge.id, "received login challenge");

        // Plain-text personal-message signing, not typed data.
        let signature = self.wallet.sign_message(&challenge.text).await?;

        let tokens = self
            .api
            .authenticate(&challenge.id, &signature_hex(&signature), cancel)
            .await?;

        self.store.put(AUTH_TOKEN_KEY, &tokens.access_token)?;
        info!(%address, profile_id, "session established");

        Ok(Session {
            wallet_address: address,
            profile_id: profile_id.to_string(),
            tokens,
        })
    }
}
