use thiserror::Error;

/// Error outputs from `lenskit`.
#[derive(Debug, Error)]
pub enum LensKitError {
    /// The presented input is not valid for the requested operation.
    #[error("invalid_input: {attribute}: {reason}")]
    InvalidInput {
        /// The attribute that failed validation.
        attribute: String,
        /// Why the attribute was rejected.
        reason: String,
    },
    /// No wallet account is available, or the user rejected the request.
    #[error("wallet_unavailable")]
    WalletUnavailable,
    /// Unexpected error serializing or deserializing information.
    #[error("serialization_error: {0}")]
    Serialization(String),
    /// Network connection error with details.
    #[error("network_error: {url} (status: {status:?}): {error}")]
    Network {
        /// The URL the request was sent to.
        url: String,
        /// The HTTP status code, when a response was received.
        status: Option<u16>,
        /// Underlying error details.
        error: String,
    },
    /// The API answered with a GraphQL-level error payload.
    #[error("graphql_error: {operation}: {message}")]
    GraphQl {
        /// The operation (response field) that failed.
        operation: String,
        /// Joined error messages from the payload.
        message: String,
    },
    /// The operation did not complete within the configured timeout.
    #[error("timeout: {url}")]
    Timeout {
        /// The URL of the request that timed out.
        url: String,
    },
    /// The operation was cancelled through its cancellation token.
    #[error("cancelled")]
    Cancelled,
    /// Client-side token storage failure.
    #[error("storage_error: {0}")]
    Storage(String),
    /// Wallet signing failure.
    #[error(transparent)]
    Signer(#[from] alloy::signers::Error),
}
