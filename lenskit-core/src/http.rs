use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::LensKitError;

/// A thin wrapper on an HTTP client. Sets sensible defaults such as a
/// per-operation timeout, user-agent & ensuring HTTPS, and checks the
/// caller's cancellation token. No retry is attempted; a failed operation is
/// re-invoked by the caller from the start.
pub(crate) struct Request {
    client: reqwest::Client,
    timeout: Duration,
}

impl Request {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Sends a JSON POST with an optional bearer token.
    pub(crate) async fn post_json<T>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &T,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, LensKitError>
    where
        T: Serialize + Send + Sync,
    {
        #[cfg(not(test))]
        assert!(url.starts_with("https"));

        let mut builder = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header(
                "User-Agent",
                format!("lenskit-core/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(body);
        if let Some(token) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        dispatch(url, builder, cancel).await
    }

    /// Sends a multipart POST with an optional pre-encoded basic-auth header.
    pub(crate) async fn post_multipart(
        &self,
        url: &str,
        basic_auth: Option<&str>,
        form: reqwest::multipart::Form,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, LensKitError> {
        #[cfg(not(test))]
        assert!(url.starts_with("https"));

        let mut builder = self
            .client
            .post(url)
            .timeout(self.timeout)
            .header(
                "User-Agent",
                format!("lenskit-core/{}", env!("CARGO_PKG_VERSION")),
            )
            .multipart(form);
        if let Some(auth) = basic_auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        dispatch(url, builder, cancel).await
    }
}

/// Races the request against the cancellation token. The token is checked
/// first so an already-cancelled operation never reaches the network.
async fn dispatch(
    url: &str,
    builder: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<reqwest::Response, LensKitError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LensKitError::Cancelled),
        result = builder.send() => match result {
            Ok(response) => Ok(response),
            Err(err) if err.is_timeout() => Err(LensKitError::Timeout {
                url: url.to_string(),
            }),
            Err(err) => Err(LensKitError::Network {
                url: url.to_string(),
                status: None,
                error: err.to_string(),
            }),
        },
    }
}
