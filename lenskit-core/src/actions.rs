//! Action layer: act-on-open-action signing, allowance management, and relay
//! broadcast.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ModuleAllowance, RelayResult};
use crate::error::LensKitError;
use crate::graphql::ApiClient;
use crate::session::Session;
use crate::typed_data::signature_hex;
use crate::wallet::Wallet;
use crate::contracts;

/// Spender/amount configuration for the pre-act allowance check.
#[derive(Debug, Clone)]
pub struct AllowanceConfig {
    /// ERC-20 currency the module charges in.
    pub currency: Address,
    /// The open-action module to approve as spender.
    pub module: Address,
    /// Required allowance, in the currency's base units.
    pub amount: U256,
}

/// A signed act-on-open-action payload, ready for relay broadcast.
#[derive(Debug, Clone)]
pub struct SignedAct {
    /// Broadcast id minted with the typed data. Single-use: a failed
    /// broadcast requires a fresh `act` call, which mints a new id.
    pub id: String,
    /// 0x-prefixed 65-byte signature.
    pub signature: String,
}

/// Signs and relays open actions against published posts.
pub struct Actor {
    api: Arc<ApiClient>,
    wallet: Arc<dyn Wallet>,
}

impl Actor {
    /// Creates an actor over the given API client and wallet.
    #[must_use]
    pub fn new(api: Arc<ApiClient>, wallet: Arc<dyn Wallet>) -> Self {
        Self { api, wallet }
    }

    /// Checks the wallet's allowance towards `config.module` and submits an
    /// ERC-20 approval only when it is below `config.amount`.
    ///
    /// Returns the approval transaction hash when one was submitted.
    ///
    /// # Errors
    /// Returns an error if the allowance query or the approval submission
    /// fails.
    pub async fn ensure_allowance(
        &self,
        session: &Session,
        config: &AllowanceConfig,
        cancel: &CancellationToken,
    ) -> Result<Option<B256>, LensKitError> {
        let allowances = self
            .api
            .approved_module_allowance_amount(
                config.currency,
                config.module,
                session.access_token(),
                cancel,
            )
            .await?;
        let current = allowances
            .first()
            .map(allowance_in_base_units)
            .transpose()?
            .unwrap_or(U256::ZERO);

        if current >= config.amount {
            debug!(%current, required = %config.amount, "allowance sufficient");
            return Ok(None);
        }

        let calldata = contracts::approve_calldata(config.module, config.amount);
        let tx_hash = self.wallet.send_transaction(config.currency, calldata).await?;
        info!(%tx_hash, spender = %config.module, "allowance approval submitted");
        Ok(Some(tx_hash))
    }

    /// Requests typed data for acting on `publication_id` through `module`,
    /// tops up the allowance when a config is given, and signs the payload.
    ///
    /// The returned [`SignedAct`] is broadcast separately with
    /// [`Self::broadcast`].
    ///
    /// # Errors
    /// Returns an error if the typed-data request, allowance step, or
    /// signature fails.
    pub async fn act(
        &self,
        session: &Session,
        publication_id: &str,
        module: Address,
        action_data: &str,
        allowance: Option<&AllowanceConfig>,
        cancel: &CancellationToken,
    ) -> Result<SignedAct, LensKitError> {
        let envelope = self
            .api
            .create_act_on_open_action_typed_data(
                publication_id,
                module,
                action_data,
                session.access_token(),
                cancel,
            )
            .await?;
        debug!(id = %envelope.id, publication_id, "received act typed data");

        if let Some(config) = allowance {
            self.ensure_allowance(session, config, cancel).await?;
        }

        let payload = envelope.typed_data.to_signable()?;
        let signature = self.wallet.sign_typed_data(&payload).await?;

        Ok(SignedAct {
            id: envelope.id,
            signature: signature_hex(&signature),
        })
    }

    /// Broadcasts a signed act through the API relay.
    ///
    /// A refused relay is a value-level [`RelayResult::Error`], not an `Err`;
    /// the caller decides whether to restart the act flow.
    ///
    /// # Errors
    /// Returns an error only on transport failure or a GraphQL error payload.
    pub async fn broadcast(
        &self,
        session: &Session,
        act: &SignedAct,
        cancel: &CancellationToken,
    ) -> Result<RelayResult, LensKitError> {
        let result = self
            .api
            .broadcast_onchain(&act.id, &act.signature, session.access_token(), cancel)
            .await?;
        match &result {
            RelayResult::Success { tx_hash, tx_id } => {
                info!(?tx_hash, ?tx_id, "relay accepted broadcast");
            }
            RelayResult::Error { reason } => {
                warn!(%reason, "relay refused broadcast");
            }
        }
        Ok(result)
    }
}

/// Converts an API-reported allowance (decimal string in whole-asset units)
/// into base units using the asset's decimals. Assets of unknown decimals
/// are treated as 18-decimal.
fn allowance_in_base_units(entry: &ModuleAllowance) -> Result<U256, LensKitError> {
    let decimals = entry.allowance.asset.as_ref().map_or(18, |asset| asset.decimals);
    parse_units(&entry.allowance.value, decimals)
}

/// Parses a decimal string like `"1.5"` into base units. Fractional digits
/// beyond `decimals` are truncated.
pub(crate) fn parse_units(value: &str, decimals: u8) -> Result<U256, LensKitError> {
    let invalid = |reason: &str| LensKitError::InvalidInput {
        attribute: "allowance".to_string(),
        reason: format!("{reason}: {value}"),
    };

    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or("0");
    let fraction = parts.next().unwrap_or("");

    let whole: U256 = if whole.is_empty() {
        U256::ZERO
    } else {
        whole.parse().map_err(|_| invalid("not a decimal number"))?
    };

    let mut fraction_digits: String =
        fraction.chars().take(usize::from(decimals)).collect();
    while fraction_digits.len() < usize::from(decimals) {
        fraction_digits.push('0');
    }
    let fraction: U256 = if fraction_digits.is_empty() {
        U256::ZERO
    } else {
        fraction_digits
            .parse()
            .map_err(|_| invalid("not a decimal number"))?
    };

    let scale = U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| invalid("too many decimals"))?;
    whole
        .checked_mul(scale)
        .and_then(|base| base.checked_add(fraction))
        .ok_or_else(|| invalid("value out of range"))
}
