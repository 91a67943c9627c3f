//! Core types for provider records and remote model descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Kind of a registered model-serving backend.
///
/// Determines which remote API dialect the fetcher speaks and which
/// deployment parameters are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Generic OpenAI-compatible API (`GET {base_url}/models`).
    #[serde(rename = "openai")]
    OpenAi,
    /// IBM watsonx.ai (`GET {base_url}/ml/v1/foundation_model_specs`).
    Watsonx,
}

impl ProviderKind {
    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Watsonx => "watsonx",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered external model-serving backend.
///
/// Owned by the registry; immutable after creation except via explicit
/// update. The API key is stored separately in the secret store, keyed by
/// the provider id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProvider {
    /// Unique provider id.
    pub id: Uuid,
    /// Human-readable display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// API dialect of the backend.
    pub kind: ProviderKind,
    /// Base URL of the remote API.
    pub base_url: Url,
    /// Watsonx project id (watsonx providers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watsonx_project_id: Option<String>,
    /// Watsonx space id (watsonx providers only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watsonx_space_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ModelProvider {
    /// Create a new provider builder.
    pub fn builder(kind: ProviderKind, base_url: Url) -> ModelProviderBuilder {
        ModelProviderBuilder::new(kind, base_url)
    }

    /// Name to use in log lines and error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.base_url.as_str())
    }
}

/// Builder for constructing a [`ModelProvider`].
///
/// A fresh id and `created_at` are assigned on `build`.
#[derive(Debug)]
pub struct ModelProviderBuilder {
    name: Option<String>,
    description: Option<String>,
    kind: ProviderKind,
    base_url: Url,
    watsonx_project_id: Option<String>,
    watsonx_space_id: Option<String>,
}

impl ModelProviderBuilder {
    fn new(kind: ProviderKind, base_url: Url) -> Self {
        Self {
            name: None,
            description: None,
            kind,
            base_url,
            watsonx_project_id: None,
            watsonx_space_id: None,
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the watsonx project id.
    pub fn watsonx_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.watsonx_project_id = Some(project_id.into());
        self
    }

    /// Set the watsonx space id.
    pub fn watsonx_space_id(mut self, space_id: impl Into<String>) -> Self {
        self.watsonx_space_id = Some(space_id.into());
        self
    }

    /// Build the [`ModelProvider`].
    pub fn build(self) -> ModelProvider {
        ModelProvider {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            kind: self.kind,
            base_url: self.base_url,
            watsonx_project_id: self.watsonx_project_id,
            watsonx_space_id: self.watsonx_space_id,
            created_at: Utc::now(),
        }
    }
}

/// A model as reported by a provider's list-models capability.
///
/// The id is unique within its provider but not globally. Everything beyond
/// the id is provider-specific metadata the aggregation core treats as
/// opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Remote-reported model id.
    pub id: String,
    /// Creation timestamp as reported by the provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Owning organization as reported by the provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
    /// Opaque provider-specific metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl ModelDescriptor {
    /// Create a descriptor with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: None,
            owned_by: None,
            metadata: serde_json::Value::Null,
        }
    }
}
