pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod stores;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use models::*;

use std::sync::Arc;

use services::{HybridRecommender, ItemBasedCf, MaintenanceScheduler, UserBasedCf};
use stores::{
    CatalogStore, InMemoryCatalog, InMemoryInteractionStore, InMemoryRecommendationCache,
    InMemorySimilarityStore, InteractionStore, RecommendationCache, SimilarityStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub interactions: Arc<dyn InteractionStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub user_similarities: Arc<dyn SimilarityStore>,
    pub product_similarities: Arc<dyn SimilarityStore>,
    pub cache: Arc<dyn RecommendationCache>,
    pub user_based: Arc<UserBasedCf>,
    pub item_based: Arc<ItemBasedCf>,
    pub hybrid: Arc<HybridRecommender>,
    pub scheduler: Arc<MaintenanceScheduler>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let interactions: Arc<dyn InteractionStore> = Arc::new(InMemoryInteractionStore::new());
        let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::new());
        // User-user and product-product pairs live in separate stores so a
        // full recompute of one never touches the other.
        let user_similarities: Arc<dyn SimilarityStore> = Arc::new(InMemorySimilarityStore::new());
        let product_similarities: Arc<dyn SimilarityStore> =
            Arc::new(InMemorySimilarityStore::new());
        let cache: Arc<dyn RecommendationCache> = Arc::new(InMemoryRecommendationCache::new());

        let user_based = Arc::new(UserBasedCf::new(
            interactions.clone(),
            user_similarities.clone(),
            cache.clone(),
            catalog.clone(),
            config.clone(),
        ));

        let item_based = Arc::new(ItemBasedCf::new(
            interactions.clone(),
            product_similarities.clone(),
            cache.clone(),
            catalog.clone(),
            config.clone(),
        ));

        let hybrid = Arc::new(HybridRecommender::new(
            user_based.clone(),
            item_based.clone(),
            interactions.clone(),
            catalog.clone(),
            cache.clone(),
            config.clone(),
        ));

        let scheduler = Arc::new(MaintenanceScheduler::new(
            user_based.clone(),
            item_based.clone(),
            hybrid.clone(),
            config.clone(),
        ));

        Self {
            config,
            interactions,
            catalog,
            user_similarities,
            product_similarities,
            cache,
            user_based,
            item_based,
            hybrid,
            scheduler,
        }
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
