pub mod cache;
pub mod catalog;
pub mod interaction;
pub mod similarity;

pub use cache::{InMemoryRecommendationCache, RecommendationCache};
pub use catalog::{CatalogStore, InMemoryCatalog};
pub use interaction::{InMemoryInteractionStore, InteractionStore};
pub use similarity::{InMemorySimilarityStore, Neighbor, SimilarityStore};
