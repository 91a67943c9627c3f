//! Error types for provider and catalog operations.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during provider and catalog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Model id not present in the freshly built index.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Provider not found in the registry.
    #[error("provider not found: {0}")]
    ProviderNotFound(Uuid),

    /// A provider with this id is already registered.
    #[error("provider already exists: {0}")]
    ProviderExists(Uuid),

    /// No API key stored for the provider.
    #[error("no credential stored for provider: {0}")]
    CredentialNotFound(Uuid),

    /// Provider API could not be reached or answered with an error.
    #[error("provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Provider API rejected the stored credential.
    #[error("provider '{0}' rejected the credential")]
    InvalidCredential(String),

    /// Failed to access the system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed provider base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
