//! Model management for switchboard.
//!
//! This crate provides:
//! - Provider registry for registering external model-serving backends
//! - Credential storage for provider API keys
//! - Catalog aggregation: a unified model-id -> provider view
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   ModelCatalog                       │
//! │   ┌───────────┐   ┌────────────┐   ┌────────────┐   │
//! │   │ Provider  │   │  Secret    │   │   Model    │   │
//! │   │ Registry  │   │  Store     │   │  Fetcher   │   │
//! │   └───────────┘   └────────────┘   └────────────┘   │
//! │                 ┌────────────────┐                   │
//! │                 │  ModelCache    │  (TTL + LRU)      │
//! │                 └────────────────┘                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! `list_all_models` snapshots the registered providers, serves the ones
//! with a live cache entry from the cache, fetches the rest concurrently,
//! and merges everything into a [`ModelIndex`]. A provider whose fetch
//! fails is logged and skipped; the call always succeeds with a possibly
//! partial index.

mod cache;
mod config;
mod error;
mod types;

pub mod catalog;
pub mod fetch;
pub mod registry;
pub mod secrets;

pub use cache::ModelCache;
pub use catalog::{ModelCatalog, ModelIndex};
pub use config::CatalogConfig;
pub use error::{Error, Result};
pub use types::{ModelDescriptor, ModelProvider, ModelProviderBuilder, ProviderKind};
