//! Secret storage for provider credentials.
//!
//! API keys are stored separately from provider records, keyed by the
//! owning entity. The [`SecretStore`] trait is the seam to the platform's
//! secret backend; [`MemorySecretStore`] backs tests and single-process
//! deployments, [`KeyringSecretStore`] uses the OS keychain.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

/// Well-known secret key under which a provider's API key is stored.
pub const MODEL_API_KEY: &str = "API_KEY";

/// A secure API key that prevents accidental logging.
///
/// The key is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Use sparingly - only when actually sending to an API.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Kind of entity that owns a set of secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    /// A registered model provider.
    ModelProvider,
}

impl OwnerKind {
    /// Get the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelProvider => "model_provider",
        }
    }
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage of secrets keyed by owning entity.
///
/// Assumed concurrency-safe by callers; both shipped implementations are.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a single secret, or `None` if absent.
    async fn get(&self, owner: OwnerKind, owner_id: Uuid, key: &str) -> Result<Option<ApiKey>>;

    /// Get all known secrets for the given owners.
    ///
    /// Owners with no stored secrets are absent from the result.
    async fn get_all(
        &self,
        owner: OwnerKind,
        owner_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashMap<String, ApiKey>>>;

    /// Set (`Some`) or remove (`None`) secrets for one owner.
    async fn update(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        variables: HashMap<String, Option<String>>,
    ) -> Result<()>;
}

/// In-memory secret store.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: tokio::sync::RwLock<HashMap<(OwnerKind, Uuid), HashMap<String, ApiKey>>>,
}

impl MemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, owner: OwnerKind, owner_id: Uuid, key: &str) -> Result<Option<ApiKey>> {
        let secrets = self.secrets.read().await;
        Ok(secrets
            .get(&(owner, owner_id))
            .and_then(|vars| vars.get(key))
            .cloned())
    }

    async fn get_all(
        &self,
        owner: OwnerKind,
        owner_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashMap<String, ApiKey>>> {
        let secrets = self.secrets.read().await;
        Ok(owner_ids
            .iter()
            .filter_map(|id| secrets.get(&(owner, *id)).map(|vars| (*id, vars.clone())))
            .collect())
    }

    async fn update(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        variables: HashMap<String, Option<String>>,
    ) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        let vars = secrets.entry((owner, owner_id)).or_default();
        for (key, value) in variables {
            match value {
                Some(value) => {
                    vars.insert(key, ApiKey::new(value));
                }
                None => {
                    vars.remove(&key);
                }
            }
        }
        if vars.is_empty() {
            secrets.remove(&(owner, owner_id));
        }
        Ok(())
    }
}

/// Secret store backed by the system keyring.
///
/// Entries are stored under `{service_name}` with the user field
/// `{owner}/{owner_id}/{key}`. The keyring cannot enumerate entries, so
/// `get_all` only surfaces the well-known [`MODEL_API_KEY`] secret.
pub struct KeyringSecretStore {
    service_name: String,
}

impl KeyringSecretStore {
    /// Create a store scoped to a keyring service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, owner: OwnerKind, owner_id: Uuid, key: &str) -> Result<keyring::Entry> {
        let user = format!("{owner}/{owner_id}/{key}");
        keyring::Entry::new(&self.service_name, &user).map_err(|e| Error::Keyring(e.to_string()))
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn get(&self, owner: OwnerKind, owner_id: Uuid, key: &str) -> Result<Option<ApiKey>> {
        let entry = self.entry(owner, owner_id, key)?;
        match entry.get_password() {
            Ok(secret) => {
                debug!(%owner_id, key, "retrieved secret from keyring");
                Ok(Some(ApiKey::new(secret)))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }

    async fn get_all(
        &self,
        owner: OwnerKind,
        owner_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashMap<String, ApiKey>>> {
        let mut result = HashMap::new();
        for owner_id in owner_ids {
            if let Some(secret) = self.get(owner, *owner_id, MODEL_API_KEY).await? {
                result.insert(*owner_id, HashMap::from([(MODEL_API_KEY.to_string(), secret)]));
            }
        }
        Ok(result)
    }

    async fn update(
        &self,
        owner: OwnerKind,
        owner_id: Uuid,
        variables: HashMap<String, Option<String>>,
    ) -> Result<()> {
        for (key, value) in variables {
            let entry = self.entry(owner, owner_id, &key)?;
            match value {
                Some(value) => {
                    entry
                        .set_password(&value)
                        .map_err(|e| Error::Keyring(e.to_string()))?;
                    debug!(%owner_id, key, "stored secret in keyring");
                }
                None => match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => {}
                    Err(e) => return Err(Error::Keyring(e.to_string())),
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret-key-12345");
        let debug = format!("{:?}", key);
        assert_eq!(debug, "ApiKey([REDACTED])");
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn api_key_expose_secret_returns_value() {
        let key = ApiKey::new("sk-secret-key-12345");
        assert_eq!(key.expose_secret(), "sk-secret-key-12345");
    }

    #[test]
    fn api_key_from_string() {
        let key: ApiKey = "my-key".into();
        assert_eq!(key.expose_secret(), "my-key");

        let key: ApiKey = String::from("my-key").into();
        assert_eq!(key.expose_secret(), "my-key");
    }

    #[tokio::test]
    async fn memory_store_get_returns_none_when_absent() {
        let store = MemorySecretStore::new();
        let secret = store
            .get(OwnerKind::ModelProvider, Uuid::new_v4(), MODEL_API_KEY)
            .await
            .unwrap();
        assert!(secret.is_none());
    }

    #[tokio::test]
    async fn memory_store_update_then_get() {
        let store = MemorySecretStore::new();
        let id = Uuid::new_v4();
        store
            .update(
                OwnerKind::ModelProvider,
                id,
                HashMap::from([(MODEL_API_KEY.to_string(), Some("sk-123".to_string()))]),
            )
            .await
            .unwrap();

        let secret = store
            .get(OwnerKind::ModelProvider, id, MODEL_API_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(secret.expose_secret(), "sk-123");
    }

    #[tokio::test]
    async fn memory_store_update_with_none_removes_key() {
        let store = MemorySecretStore::new();
        let id = Uuid::new_v4();
        store
            .update(
                OwnerKind::ModelProvider,
                id,
                HashMap::from([(MODEL_API_KEY.to_string(), Some("sk-123".to_string()))]),
            )
            .await
            .unwrap();
        store
            .update(
                OwnerKind::ModelProvider,
                id,
                HashMap::from([(MODEL_API_KEY.to_string(), None)]),
            )
            .await
            .unwrap();

        let secret = store
            .get(OwnerKind::ModelProvider, id, MODEL_API_KEY)
            .await
            .unwrap();
        assert!(secret.is_none());
    }

    #[tokio::test]
    async fn memory_store_get_all_skips_owners_without_secrets() {
        let store = MemorySecretStore::new();
        let with_key = Uuid::new_v4();
        let without_key = Uuid::new_v4();
        store
            .update(
                OwnerKind::ModelProvider,
                with_key,
                HashMap::from([(MODEL_API_KEY.to_string(), Some("sk-abc".to_string()))]),
            )
            .await
            .unwrap();

        let all = store
            .get_all(OwnerKind::ModelProvider, &[with_key, without_key])
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key(&with_key));
        assert!(!all.contains_key(&without_key));
        assert_eq!(
            all[&with_key][MODEL_API_KEY].expose_secret(),
            "sk-abc"
        );
    }

    #[test]
    fn owner_kind_display() {
        assert_eq!(OwnerKind::ModelProvider.to_string(), "model_provider");
    }
}
