//! Per-provider model fetching.
//!
//! The [`ModelFetcher`] trait is the seam between the catalog and remote
//! provider APIs: one capability, "list models", which can fail or hang.
//! Fetchers never retry internally - a failed fetch simply yields no models
//! for that provider in the current aggregation call.
//!
//! [`HttpModelFetcher`] speaks the OpenAI-compatible dialect
//! (`GET {base_url}/models`) and the watsonx.ai dialect
//! (`GET {base_url}/ml/v1/foundation_model_specs`).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::secrets::ApiKey;
use crate::types::{ModelDescriptor, ModelProvider, ProviderKind};
use crate::{Error, Result};

/// Watsonx API version pinned for the foundation-model-specs call.
const WATSONX_API_VERSION: &str = "2024-09-16";

/// Lists the models a provider currently serves.
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    /// Fetch the ordered model list from the provider's remote API.
    ///
    /// Fails with [`Error::ProviderUnavailable`] on network or server
    /// errors and [`Error::InvalidCredential`] when the API rejects the
    /// key. No internal retries.
    async fn fetch(
        &self,
        provider: &ModelProvider,
        api_key: &ApiKey,
    ) -> Result<Vec<ModelDescriptor>>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// Response from an OpenAI-compatible `/models` endpoint.
#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModel>,
}

/// One model entry from an OpenAI-compatible `/models` endpoint.
#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    owned_by: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl From<OpenAiModel> for ModelDescriptor {
    fn from(model: OpenAiModel) -> Self {
        Self {
            id: model.id,
            created: model.created,
            owned_by: model.owned_by,
            metadata: if model.extra.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::Object(model.extra)
            },
        }
    }
}

/// Response from watsonx's `/ml/v1/foundation_model_specs` endpoint.
#[derive(Debug, Deserialize)]
struct WatsonxModelSpecs {
    resources: Vec<WatsonxModelSpec>,
}

/// One foundation model spec from watsonx.
#[derive(Debug, Deserialize)]
struct WatsonxModelSpec {
    model_id: String,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl From<WatsonxModelSpec> for ModelDescriptor {
    fn from(spec: WatsonxModelSpec) -> Self {
        Self {
            id: spec.model_id,
            created: None,
            owned_by: None,
            metadata: if spec.extra.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::Value::Object(spec.extra)
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HttpModelFetcher
// ────────────────────────────────────────────────────────────────────────────

/// HTTP fetcher for remote provider APIs.
#[derive(Default)]
pub struct HttpModelFetcher {
    client: reqwest::Client,
}

impl HttpModelFetcher {
    /// Create a fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn endpoint(provider: &ModelProvider) -> String {
        let base = provider.base_url.as_str().trim_end_matches('/');
        match provider.kind {
            ProviderKind::OpenAi => format!("{base}/models"),
            ProviderKind::Watsonx => format!("{base}/ml/v1/foundation_model_specs"),
        }
    }

    async fn send(
        &self,
        provider: &ModelProvider,
        api_key: &ApiKey,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .get(Self::endpoint(provider))
            .bearer_auth(api_key.expose_secret());

        if provider.kind == ProviderKind::Watsonx {
            request = request.query(&[("version", WATSONX_API_VERSION)]);
            if let Some(project_id) = &provider.watsonx_project_id {
                request = request.query(&[("project_id", project_id)]);
            }
            if let Some(space_id) = &provider.watsonx_space_id {
                request = request.query(&[("space_id", space_id)]);
            }
        }

        let response = request.send().await.map_err(|e| Error::ProviderUnavailable {
            provider: provider.display_name().to_string(),
            reason: e.to_string(),
        })?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(Error::InvalidCredential(provider.display_name().to_string()))
            }
            status => Err(Error::ProviderUnavailable {
                provider: provider.display_name().to_string(),
                reason: format!("API returned status {status}"),
            }),
        }
    }
}

#[async_trait]
impl ModelFetcher for HttpModelFetcher {
    async fn fetch(
        &self,
        provider: &ModelProvider,
        api_key: &ApiKey,
    ) -> Result<Vec<ModelDescriptor>> {
        let response = self.send(provider, api_key).await?;
        let models = match provider.kind {
            ProviderKind::OpenAi => {
                let list: OpenAiModelList =
                    response.json().await.map_err(|e| Error::ProviderUnavailable {
                        provider: provider.display_name().to_string(),
                        reason: format!("malformed model list: {e}"),
                    })?;
                list.data.into_iter().map(Into::into).collect()
            }
            ProviderKind::Watsonx => {
                let specs: WatsonxModelSpecs =
                    response.json().await.map_err(|e| Error::ProviderUnavailable {
                        provider: provider.display_name().to_string(),
                        reason: format!("malformed model specs: {e}"),
                    })?;
                specs.resources.into_iter().map(Into::into).collect()
            }
        };
        Ok(models)
    }
}
