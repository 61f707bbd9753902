#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
//! Client SDK for the Lens Protocol V2 API.
//!
//! The crate is organized around three thin layers: a session layer
//! ([`session::SessionManager`]) which exchanges a wallet signature for a
//! bearer token pair, an authoring layer ([`publisher::Publisher`]) which
//! uploads content to IPFS and submits a `postWithSig` transaction, and an
//! action layer ([`actions::Actor`]) which signs and relays act-on-open-action
//! requests. Every network call takes an explicit cancellation token and is
//! bounded by the timeouts in [`config::Config`].

use strum::EnumString;

/// The Lens API deployment the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    /// Polygon mainnet deployment.
    Mainnet,
    /// Mumbai testnet deployment.
    Testnet,
}

pub mod actions;
pub mod api;
pub mod config;
pub mod contracts;
pub mod error;
pub mod graphql;
pub mod ipfs;
pub mod metadata;
pub mod publisher;
pub mod session;
pub mod store;
pub mod typed_data;
pub mod wallet;

// private modules
mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::LensKitError;
pub use graphql::ApiClient;
pub use session::{Session, SessionManager};
pub use wallet::{LocalWallet, Wallet};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Environment;

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            Environment::from_str("testnet").unwrap(),
            Environment::Testnet
        );
        assert_eq!(
            Environment::from_str("mainnet").unwrap(),
            Environment::Mainnet
        );
        assert!(Environment::from_str("devnet").is_err());
    }
}
