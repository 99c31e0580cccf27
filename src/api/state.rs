use std::sync::Arc;

use crate::{
    config::Config,
    db::{Cache, MemoryStore, RecommendationSource, Store},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// CRUD store backing users, restaurants and reviews
    pub store: Arc<dyn Store>,
    /// The same store, seen through the recommender's read interface
    pub recommendations: Arc<dyn RecommendationSource>,
    pub cache: Option<Cache>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new<S>(store: S, cache: Option<Cache>, config: Config) -> Self
    where
        S: Store + RecommendationSource + 'static,
    {
        let store = Arc::new(store);
        Self {
            store: store.clone(),
            recommendations: store,
            cache,
            config: Arc::new(config),
        }
    }

    /// Empty in-memory state with default configuration
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), None, Config::default())
    }

    /// Default limit when absent, capped at the configured maximum
    pub fn recommendation_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_recommendation_limit)
            .min(self.config.max_recommendation_limit)
    }
}
