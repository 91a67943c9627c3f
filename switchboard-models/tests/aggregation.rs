//! End-to-end aggregation scenarios for `ModelCatalog`.
//!
//! These tests wire the catalog to the in-memory registry and secret store
//! and a scripted fetcher, and validate:
//! - The index contains every model from every provider whose fetch succeeded
//! - One provider failing (error or timeout) never fails the whole call
//! - Live cache entries suppress refetching within the TTL window
//! - Duplicate model ids resolve to the later provider in registry order

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use switchboard_models::fetch::ModelFetcher;
use switchboard_models::registry::{MemoryProviderRegistry, ProviderRegistry, ProviderStream};
use switchboard_models::secrets::{ApiKey, MemorySecretStore};
use switchboard_models::{
    CatalogConfig, Error, ModelCatalog, ModelDescriptor, ModelProvider, ProviderKind, Result,
};
use url::Url;
use uuid::Uuid;

/// What the scripted fetcher does for one provider.
enum FetchPlan {
    Models(Vec<&'static str>),
    Unavailable,
    Hang,
}

/// Fetcher that follows a per-provider script and counts invocations.
struct ScriptedFetcher {
    plans: std::sync::Mutex<HashMap<Uuid, FetchPlan>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self {
            plans: std::sync::Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn plan(&self, provider_id: Uuid, plan: FetchPlan) {
        self.plans.lock().unwrap().insert(provider_id, plan);
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        provider: &ModelProvider,
        _api_key: &ApiKey,
    ) -> Result<Vec<ModelDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        enum Action {
            Models(Vec<ModelDescriptor>),
            Unavailable,
            Hang,
        }
        let action = {
            let plans = self.plans.lock().unwrap();
            match plans.get(&provider.id) {
                Some(FetchPlan::Models(ids)) => {
                    Action::Models(ids.iter().map(|id| ModelDescriptor::new(*id)).collect())
                }
                Some(FetchPlan::Unavailable) | None => Action::Unavailable,
                Some(FetchPlan::Hang) => Action::Hang,
            }
        };
        match action {
            Action::Models(models) => Ok(models),
            Action::Unavailable => Err(Error::ProviderUnavailable {
                provider: provider.display_name().to_string(),
                reason: "simulated outage".to_string(),
            }),
            Action::Hang => {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(Vec::new())
            }
        }
    }
}

struct Fixture {
    catalog: ModelCatalog,
    fetcher: Arc<ScriptedFetcher>,
}

fn fixture(config: CatalogConfig) -> Fixture {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let catalog = ModelCatalog::with_config(
        Arc::new(MemoryProviderRegistry::new()),
        Arc::new(MemorySecretStore::new()),
        Arc::clone(&fetcher) as Arc<dyn ModelFetcher>,
        config,
    );
    Fixture { catalog, fetcher }
}

fn provider(name: &str) -> ModelProvider {
    ModelProvider::builder(
        ProviderKind::OpenAi,
        Url::parse("https://api.example.com/v1").unwrap(),
    )
    .name(name)
    .build()
}

async fn register(fixture: &Fixture, name: &str, plan: FetchPlan) -> ModelProvider {
    let p = provider(name);
    fixture.fetcher.plan(p.id, plan);
    fixture
        .catalog
        .create_provider(p.clone(), "sk-test")
        .await
        .unwrap();
    p
}

#[tokio::test]
async fn index_merges_models_from_all_successful_providers() {
    let fx = fixture(CatalogConfig::default());
    let a = register(&fx, "a", FetchPlan::Models(vec!["m1", "m2"])).await;
    let b = register(&fx, "b", FetchPlan::Models(vec!["m1"])).await;

    let index = fx.catalog.list_all_models().await.unwrap();

    assert_eq!(index.len(), 2);
    // m1 is reported by both; B is listed after A so B wins.
    assert_eq!(index.get("m1").unwrap().0.id, b.id);
    assert_eq!(index.get("m2").unwrap().0.id, a.id);
}

#[tokio::test]
async fn failing_provider_contributes_nothing_without_failing_the_call() {
    let fx = fixture(CatalogConfig::default());
    register(&fx, "a", FetchPlan::Models(vec!["a1"])).await;
    register(&fx, "b", FetchPlan::Models(vec!["b1"])).await;
    register(&fx, "c", FetchPlan::Unavailable).await;

    let index = fx.catalog.list_all_models().await.unwrap();

    assert_eq!(index.model_ids(), vec!["a1", "b1"]);
}

#[tokio::test]
async fn hanging_provider_is_timed_out_and_skipped() {
    let fx = fixture(CatalogConfig::default().with_fetch_timeout(Duration::from_secs(1)));
    register(&fx, "a", FetchPlan::Models(vec!["a1"])).await;
    register(&fx, "c", FetchPlan::Hang).await;

    let start = std::time::Instant::now();
    let index = fx.catalog.list_all_models().await.unwrap();

    assert_eq!(index.model_ids(), vec!["a1"]);
    assert!(
        start.elapsed() < Duration::from_secs(30),
        "hanging fetch must be bounded by the per-call timeout"
    );
}

#[tokio::test]
async fn second_call_within_ttl_reuses_cache_without_refetching() {
    let fx = fixture(CatalogConfig::default());
    register(&fx, "a", FetchPlan::Models(vec!["a1"])).await;
    register(&fx, "b", FetchPlan::Models(vec!["b1"])).await;

    let first = fx.catalog.list_all_models().await.unwrap();
    assert_eq!(fx.fetcher.call_count(), 2);

    let second = fx.catalog.list_all_models().await.unwrap();
    assert_eq!(fx.fetcher.call_count(), 2, "live entries must not refetch");
    assert_eq!(first.model_ids(), second.model_ids());
}

#[tokio::test]
async fn expired_entries_trigger_refetch_on_next_call() {
    let fx = fixture(CatalogConfig::default().with_cache_ttl(Duration::ZERO));
    register(&fx, "a", FetchPlan::Models(vec!["a1"])).await;

    fx.catalog.list_all_models().await.unwrap();
    fx.catalog.list_all_models().await.unwrap();

    assert_eq!(fx.fetcher.call_count(), 2);
}

#[tokio::test]
async fn failed_fetch_is_retried_on_the_next_call() {
    let fx = fixture(CatalogConfig::default());
    let c = register(&fx, "c", FetchPlan::Unavailable).await;

    let index = fx.catalog.list_all_models().await.unwrap();
    assert!(index.is_empty());

    // Provider recovers; failure was never cached.
    fx.fetcher.plan(c.id, FetchPlan::Models(vec!["c1"]));
    let index = fx.catalog.list_all_models().await.unwrap();
    assert_eq!(index.model_ids(), vec!["c1"]);
    assert_eq!(fx.fetcher.call_count(), 2);
}

#[tokio::test]
async fn resolve_model_routes_to_winning_provider() {
    let fx = fixture(CatalogConfig::default());
    register(&fx, "a", FetchPlan::Models(vec!["m1", "m2"])).await;
    let b = register(&fx, "b", FetchPlan::Models(vec!["m1"])).await;

    let (resolved, model) = fx.catalog.resolve_model("m1").await.unwrap();
    assert_eq!(resolved.id, b.id);
    assert_eq!(model.id, "m1");

    let for_model = fx.catalog.provider_for_model("m2").await.unwrap();
    assert_eq!(for_model.name.as_deref(), Some("a"));
}

#[tokio::test]
async fn resolve_unknown_model_fails_with_model_not_found() {
    let fx = fixture(CatalogConfig::default());
    register(&fx, "a", FetchPlan::Models(vec!["a1"])).await;

    let err = fx.catalog.resolve_model("unknown").await.unwrap_err();
    assert!(matches!(err, Error::ModelNotFound(id) if id == "unknown"));
}

#[tokio::test]
async fn deleted_provider_disappears_from_the_next_index() {
    let fx = fixture(CatalogConfig::default());
    register(&fx, "a", FetchPlan::Models(vec!["a1"])).await;
    let b = register(&fx, "b", FetchPlan::Models(vec!["b1"])).await;

    assert_eq!(fx.catalog.list_all_models().await.unwrap().len(), 2);

    fx.catalog.delete_provider(b.id).await.unwrap();
    let index = fx.catalog.list_all_models().await.unwrap();
    assert_eq!(index.model_ids(), vec!["a1"]);
}

#[tokio::test]
async fn concurrent_aggregation_calls_are_safe() {
    let fx = Arc::new(fixture(CatalogConfig::default()));
    register(&fx, "a", FetchPlan::Models(vec!["a1", "a2"])).await;
    register(&fx, "b", FetchPlan::Models(vec!["b1"])).await;

    let fx1 = Arc::clone(&fx);
    let fx2 = Arc::clone(&fx);
    let (first, second) = tokio::join!(
        async move { fx1.catalog.list_all_models().await },
        async move { fx2.catalog.list_all_models().await },
    );

    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.model_ids(), vec!["a1", "a2", "b1"]);
    assert_eq!(first.model_ids(), second.model_ids());
}

#[tokio::test]
async fn registry_failure_is_fatal_to_the_call() {
    // A registry whose list always fails - infrastructure errors propagate.
    struct BrokenRegistry;

    #[async_trait]
    impl ProviderRegistry for BrokenRegistry {
        async fn create(&self, _provider: ModelProvider) -> Result<()> {
            unimplemented!("not used")
        }
        async fn get(&self, provider_id: Uuid) -> Result<ModelProvider> {
            Err(Error::ProviderNotFound(provider_id))
        }
        async fn list(&self) -> Result<ProviderStream> {
            Err(Error::ProviderUnavailable {
                provider: "registry".to_string(),
                reason: "store unreachable".to_string(),
            })
        }
        async fn delete(&self, _provider_id: Uuid) -> Result<u64> {
            unimplemented!("not used")
        }
    }

    let catalog = ModelCatalog::new(
        Arc::new(BrokenRegistry),
        Arc::new(MemorySecretStore::new()),
        Arc::new(ScriptedFetcher::new()),
    );

    assert!(catalog.list_all_models().await.is_err());
}
