//! Model catalog - the aggregation layer over registered providers.
//!
//! [`ModelCatalog`] answers "which models are available from which
//! provider" by querying every registered provider's remote API
//! concurrently, tolerating individual provider failures, and caching each
//! provider's result with a TTL. Point lookups route a model id to the
//! provider serving it.
//!
//! One aggregation call fans out at most one fetch per provider needing
//! refresh and joins all of them before returning - no detached background
//! work. A provider whose fetch fails contributes no models to that call
//! and is retried naturally on the next call.

mod index;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_stream::StreamExt;
use tracing::warn;
use uuid::Uuid;

pub use index::ModelIndex;

use crate::cache::ModelCache;
use crate::config::CatalogConfig;
use crate::fetch::ModelFetcher;
use crate::registry::ProviderRegistry;
use crate::secrets::{ApiKey, OwnerKind, SecretStore, MODEL_API_KEY};
use crate::types::{ModelDescriptor, ModelProvider};
use crate::{Error, Result};

/// Aggregation service over registered model providers.
///
/// Created once at process start; the internal model cache lives as long
/// as the catalog and is shared by all in-flight aggregation calls.
pub struct ModelCatalog {
    registry: Arc<dyn ProviderRegistry>,
    secrets: Arc<dyn SecretStore>,
    fetcher: Arc<dyn ModelFetcher>,
    cache: ModelCache,
    config: CatalogConfig,
}

impl ModelCatalog {
    /// Create a catalog with default configuration.
    pub fn new(
        registry: Arc<dyn ProviderRegistry>,
        secrets: Arc<dyn SecretStore>,
        fetcher: Arc<dyn ModelFetcher>,
    ) -> Self {
        Self::with_config(registry, secrets, fetcher, CatalogConfig::default())
    }

    /// Create a catalog with explicit configuration.
    pub fn with_config(
        registry: Arc<dyn ProviderRegistry>,
        secrets: Arc<dyn SecretStore>,
        fetcher: Arc<dyn ModelFetcher>,
        config: CatalogConfig,
    ) -> Self {
        let cache = ModelCache::new(config.cache_capacity, config.cache_ttl());
        Self {
            registry,
            secrets,
            fetcher,
            cache,
            config,
        }
    }

    /// Register a provider and store its API key.
    pub async fn create_provider(
        &self,
        provider: ModelProvider,
        api_key: impl Into<String>,
    ) -> Result<()> {
        let provider_id = provider.id;
        self.registry.create(provider).await?;
        self.secrets
            .update(
                OwnerKind::ModelProvider,
                provider_id,
                HashMap::from([(MODEL_API_KEY.to_string(), Some(api_key.into()))]),
            )
            .await
    }

    /// Get a provider record by id.
    pub async fn get_provider(&self, provider_id: Uuid) -> Result<ModelProvider> {
        self.registry.get(provider_id).await
    }

    /// List all registered providers.
    pub async fn list_providers(&self) -> Result<Vec<ModelProvider>> {
        self.collect_providers().await
    }

    /// Delete a provider, its stored API key, and its cache entry.
    ///
    /// Returns the number of registry records removed.
    pub async fn delete_provider(&self, provider_id: Uuid) -> Result<u64> {
        let removed = self.registry.delete(provider_id).await?;
        if removed > 0 {
            self.secrets
                .update(
                    OwnerKind::ModelProvider,
                    provider_id,
                    HashMap::from([(MODEL_API_KEY.to_string(), None)]),
                )
                .await?;
            self.cache.invalidate(&provider_id);
        }
        Ok(removed)
    }

    /// Get the stored API key for a provider.
    ///
    /// Fails with [`Error::ProviderNotFound`] if the provider does not
    /// exist and [`Error::CredentialNotFound`] if it has no stored key.
    pub async fn get_provider_api_key(&self, provider_id: Uuid) -> Result<ApiKey> {
        self.registry.get(provider_id).await?;
        self.secrets
            .get(OwnerKind::ModelProvider, provider_id, MODEL_API_KEY)
            .await?
            .ok_or(Error::CredentialNotFound(provider_id))
    }

    /// Build the current model index across all registered providers.
    ///
    /// Providers with a live cache entry are served from the cache; the
    /// rest are fetched concurrently. A failed or timed out fetch is
    /// logged and contributes no models - it never fails the call. Only
    /// registry or secret-store failures are fatal.
    ///
    /// Duplicate model ids across providers resolve to the later provider
    /// in registry list order.
    pub async fn list_all_models(&self) -> Result<ModelIndex> {
        let providers = self.collect_providers().await?;

        let provider_ids: Vec<Uuid> = providers.iter().map(|p| p.id).collect();
        let mut secrets = self
            .secrets
            .get_all(OwnerKind::ModelProvider, &provider_ids)
            .await?;

        let mut available: HashMap<Uuid, Vec<ModelDescriptor>> = HashMap::new();
        let mut fetches: JoinSet<(Uuid, Result<Vec<ModelDescriptor>>)> = JoinSet::new();

        for provider in &providers {
            if let Some(models) = self.cache.get(&provider.id) {
                available.insert(provider.id, models);
                continue;
            }
            let Some(api_key) = secrets
                .get_mut(&provider.id)
                .and_then(|vars| vars.remove(MODEL_API_KEY))
            else {
                warn!(provider_id = %provider.id, "no API key stored, provider contributes no models");
                continue;
            };

            let fetcher = Arc::clone(&self.fetcher);
            let provider = provider.clone();
            let fetch_timeout = self.config.fetch_timeout();
            fetches.spawn(async move {
                let outcome = match timeout(fetch_timeout, fetcher.fetch(&provider, &api_key)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::ProviderUnavailable {
                        provider: provider.display_name().to_string(),
                        reason: format!("fetch timed out after {:?}", fetch_timeout),
                    }),
                };
                (provider.id, outcome)
            });
        }

        // Fan-in: the call does not return until every dispatched fetch
        // has completed or failed.
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((provider_id, Ok(models))) => {
                    self.cache.put(provider_id, models.clone());
                    available.insert(provider_id, models);
                }
                Ok((provider_id, Err(err))) => {
                    warn!(%provider_id, error = %err, "failed to load models for provider");
                }
                Err(err) => {
                    warn!(error = %err, "model fetch task did not complete");
                }
            }
        }

        let mut model_index = ModelIndex::new();
        for provider in &providers {
            if let Some(models) = available.get(&provider.id) {
                for model in models {
                    model_index.insert(provider.clone(), model.clone());
                }
            }
        }
        Ok(model_index)
    }

    /// Resolve a model id to the provider serving it and its descriptor.
    ///
    /// Resolves against a freshly built index; a previously resolved id
    /// may no longer be valid once its provider was deleted or its cache
    /// entry expired and the refetch failed.
    pub async fn resolve_model(&self, model_id: &str) -> Result<(ModelProvider, ModelDescriptor)> {
        let index = self.list_all_models().await?;
        index
            .get(model_id)
            .cloned()
            .ok_or_else(|| Error::ModelNotFound(model_id.to_string()))
    }

    /// Resolve a model id to just the provider serving it.
    pub async fn provider_for_model(&self, model_id: &str) -> Result<ModelProvider> {
        let (provider, _) = self.resolve_model(model_id).await?;
        Ok(provider)
    }

    async fn collect_providers(&self) -> Result<Vec<ModelProvider>> {
        let mut stream = self.registry.list().await?;
        let mut providers = Vec::new();
        while let Some(provider) = stream.next().await {
            providers.push(provider?);
        }
        Ok(providers)
    }
}
