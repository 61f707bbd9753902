//! GraphQL-over-HTTP transport for the Lens API.
//!
//! Authentication is explicit: authenticated operations take the bearer token
//! as an argument, there is no shared client reading ambient storage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::LensKitError;
use crate::http::Request;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Client for the Lens GraphQL API.
pub struct ApiClient {
    request: Request,
    url: String,
}

impl ApiClient {
    /// Initializes a client for the configured API endpoint.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            request: Request::new(config.api_timeout),
            url: config.api_url.clone(),
        }
    }

    /// Executes a GraphQL document and extracts `data.<field>` from the
    /// response.
    ///
    /// GraphQL-level errors are surfaced as [`LensKitError::GraphQl`];
    /// transport failures as [`LensKitError::Network`] / [`LensKitError::Timeout`].
    pub(crate) async fn execute<V, T>(
        &self,
        document: &str,
        field: &str,
        variables: V,
        bearer: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<T, LensKitError>
    where
        V: Serialize + Send + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::json!({
            "query": document,
            "variables": variables,
        });
        tracing::debug!(operation = field, "sending api request");

        let response = self.request.post_json(&self.url, bearer, &body, cancel).await?;
        let status = response.status();
        let text = response.text().await.map_err(|err| LensKitError::Network {
            url: self.url.clone(),
            status: Some(status.as_u16()),
            error: format!("failed to read response body: {err}"),
        })?;

        if !status.is_success() {
            return Err(LensKitError::Network {
                url: self.url.clone(),
                status: Some(status.as_u16()),
                error: text,
            });
        }

        let envelope: GraphQlResponse = serde_json::from_str(&text).map_err(|err| {
            LensKitError::Serialization(format!(
                "invalid response envelope for `{field}`: {err}"
            ))
        })?;

        if let Some(errors) = envelope.errors {
            if !errors.is_empty() {
                let message = errors
                    .into_iter()
                    .map(|entry| entry.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(LensKitError::GraphQl {
                    operation: field.to_string(),
                    message,
                });
            }
        }

        let data = envelope
            .data
            .and_then(|mut data| data.get_mut(field).map(serde_json::Value::take))
            .ok_or_else(|| {
                LensKitError::Serialization(format!("missing `{field}` in response"))
            })?;

        serde_json::from_value(data).map_err(|err| {
            LensKitError::Serialization(format!("invalid `{field}` payload: {err}"))
        })
    }
}
