//! Endpoint and contract configuration.
//!
//! All defaults can be overridden by the caller; nothing in the crate reads
//! ambient state (environment variables, global storage) at request time.

use std::time::Duration;

use alloy_primitives::{address, Address};

use crate::Environment;

/// The `LensHub` proxy contract which `postWithSig` transactions are sent to.
pub static DEFAULT_LENS_HUB: Address =
    address!("0xDb46d1Dc155634FbC732f92E853b10B288AD5a1d");

/// Open-action module used by default when filtering publications and acting.
pub static DEFAULT_OPEN_ACTION_MODULE: Address =
    address!("0x0C3C4E1823C1E8121013Bf43A83fBEF2858F463e");

/// ERC-20 currency the default open-action module charges in (testnet WMATIC).
pub static DEFAULT_ALLOWANCE_CURRENCY: Address =
    address!("0x9c3C9283D3e44854697Cd22D3Faa240Cfb032889");

/// IPFS gateway configuration for content-addressed uploads.
#[derive(Debug, Clone)]
pub struct IpfsConfig {
    /// Base URL of the IPFS HTTP API (no trailing slash).
    pub api_url: String,
    /// Project id for basic-auth gateways (e.g. Infura).
    pub project_id: Option<String>,
    /// Project secret for basic-auth gateways.
    pub project_secret: Option<String>,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ipfs.infura.io:5001".to_string(),
            project_id: None,
            project_secret: None,
        }
    }
}

/// Client configuration: endpoints, contract addresses, and per-operation
/// timeouts.
#[derive(Debug, Clone)]
pub struct Config {
    /// The Lens GraphQL API endpoint.
    pub api_url: String,
    /// IPFS gateway used for media and metadata uploads.
    pub ipfs: IpfsConfig,
    /// The `LensHub` contract address for direct `postWithSig` submission.
    pub lens_hub: Address,
    /// JSON-RPC endpoint for direct transaction submission. When unset, only
    /// relay-based flows are available.
    pub rpc_url: Option<String>,
    /// Timeout applied to each API request.
    pub api_timeout: Duration,
    /// Timeout applied to each storage upload.
    pub upload_timeout: Duration,
}

impl Config {
    /// Returns the default configuration for a Lens API deployment.
    #[must_use]
    pub fn for_environment(environment: &Environment) -> Self {
        let api_url = match environment {
            Environment::Mainnet => "https://api-v2.lens.dev",
            Environment::Testnet => "https://api-v2-mumbai.lens.dev",
        };
        Self {
            api_url: api_url.to_string(),
            ipfs: IpfsConfig::default(),
            lens_hub: DEFAULT_LENS_HUB,
            rpc_url: None,
            api_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults() {
        let config = Config::for_environment(&Environment::Testnet);
        assert_eq!(config.api_url, "https://api-v2-mumbai.lens.dev");
        assert_eq!(config.lens_hub, DEFAULT_LENS_HUB);
        assert!(config.rpc_url.is_none());

        let config = Config::for_environment(&Environment::Mainnet);
        assert_eq!(config.api_url, "https://api-v2.lens.dev");
    }
}
