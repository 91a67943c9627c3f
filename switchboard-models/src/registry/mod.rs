//! Provider registry - the durable store of provider records.
//!
//! Persistence is an external collaborator; the catalog only depends on the
//! [`ProviderRegistry`] trait. [`MemoryProviderRegistry`] is the in-process
//! implementation used by tests and single-node deployments. List order is
//! insertion order, which is what makes the catalog's duplicate-model-id
//! tie-break deterministic.

use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;
use uuid::Uuid;

use crate::types::ModelProvider;
use crate::{Error, Result};

/// A lazy sequence of provider records.
///
/// This is a pinned, boxed stream that yields providers or errors.
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<ModelProvider>> + Send>>;

/// CRUD store of provider records.
#[async_trait]
pub trait ProviderRegistry: Send + Sync {
    /// Register a new provider.
    async fn create(&self, provider: ModelProvider) -> Result<()>;

    /// Get a provider by id.
    async fn get(&self, provider_id: Uuid) -> Result<ModelProvider>;

    /// List all registered providers as a lazy sequence, in a stable order.
    async fn list(&self) -> Result<ProviderStream>;

    /// Delete a provider by id. Returns the number of records removed.
    async fn delete(&self, provider_id: Uuid) -> Result<u64>;
}

/// In-memory provider registry preserving insertion order.
#[derive(Default)]
pub struct MemoryProviderRegistry {
    providers: tokio::sync::RwLock<Vec<ModelProvider>>,
}

impl MemoryProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProviderRegistry for MemoryProviderRegistry {
    async fn create(&self, provider: ModelProvider) -> Result<()> {
        let mut providers = self.providers.write().await;
        if providers.iter().any(|p| p.id == provider.id) {
            return Err(Error::ProviderExists(provider.id));
        }
        providers.push(provider);
        Ok(())
    }

    async fn get(&self, provider_id: Uuid) -> Result<ModelProvider> {
        let providers = self.providers.read().await;
        providers
            .iter()
            .find(|p| p.id == provider_id)
            .cloned()
            .ok_or(Error::ProviderNotFound(provider_id))
    }

    async fn list(&self) -> Result<ProviderStream> {
        let snapshot: Vec<ModelProvider> = self.providers.read().await.clone();
        Ok(Box::pin(tokio_stream::iter(snapshot.into_iter().map(Ok))))
    }

    async fn delete(&self, provider_id: Uuid) -> Result<u64> {
        let mut providers = self.providers.write().await;
        let before = providers.len();
        providers.retain(|p| p.id != provider_id);
        Ok((before - providers.len()) as u64)
    }
}
