//! Model-id keyed index over aggregated provider results.

use std::collections::HashMap;

use crate::types::{ModelDescriptor, ModelProvider};

/// Ephemeral mapping from model id to the provider serving it.
///
/// Rebuilt on every aggregation call from current cache contents; derived
/// data only, never the source of truth for provider existence. A model id
/// resolved from one index is not guaranteed to resolve from the next.
#[derive(Debug, Clone, Default)]
pub struct ModelIndex {
    entries: HashMap<String, (ModelProvider, ModelDescriptor)>,
}

impl ModelIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a model under its remote-reported id.
    ///
    /// Model ids are unique within a provider but not globally. When two
    /// providers report the same id, the later insert wins; the catalog
    /// inserts in registry list order, so the later-listed provider takes
    /// the id. Returns the displaced entry, if any.
    pub fn insert(
        &mut self,
        provider: ModelProvider,
        model: ModelDescriptor,
    ) -> Option<(ModelProvider, ModelDescriptor)> {
        self.entries.insert(model.id.clone(), (provider, model))
    }

    /// Look up the provider and descriptor for a model id.
    pub fn get(&self, model_id: &str) -> Option<&(ModelProvider, ModelDescriptor)> {
        self.entries.get(model_id)
    }

    /// Whether the index contains a model id.
    pub fn contains(&self, model_id: &str) -> bool {
        self.entries.contains_key(model_id)
    }

    /// Number of distinct model ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(model_id, (provider, descriptor))` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &(ModelProvider, ModelDescriptor))> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// All model ids, sorted.
    pub fn model_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Distinct providers contributing at least one model.
    pub fn providers(&self) -> Vec<&ModelProvider> {
        let mut seen = HashMap::new();
        for (provider, _) in self.entries.values() {
            seen.entry(provider.id).or_insert(provider);
        }
        seen.into_values().collect()
    }
}
