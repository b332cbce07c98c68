use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use rayon::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::models::{CachedRecommendation, Product, SimilarityMetric, SimilarityScore, Strategy};
use crate::stores::{CatalogStore, InteractionStore, RecommendationCache, SimilarityStore};
use crate::utils;

use super::user_based::ranked_ids;

/// Item-based collaborative filtering: expands products the user already
/// liked into their most similar items. More stable than the user-based
/// variant because item-item similarity drifts slowly.
pub struct ItemBasedCf {
    interactions: Arc<dyn InteractionStore>,
    product_similarities: Arc<dyn SimilarityStore>,
    cache: Arc<dyn RecommendationCache>,
    catalog: Arc<dyn CatalogStore>,
    config: Arc<Config>,
}

impl ItemBasedCf {
    pub fn new(
        interactions: Arc<dyn InteractionStore>,
        product_similarities: Arc<dyn SimilarityStore>,
        cache: Arc<dyn RecommendationCache>,
        catalog: Arc<dyn CatalogStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            interactions,
            product_similarities,
            cache,
            catalog,
            config,
        }
    }

    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<Product>> {
        info!("Generating item-based recommendations for user {}", user_id);

        if let Some(cached) = self.cache.get(user_id, Strategy::ItemBased).await? {
            info!("Returning {} cached item-based recommendations", cached.len());
            return self.catalog.find_by_ids(&ranked_ids(cached, limit)).await;
        }

        let preferences = self.interactions.preference_map(user_id).await?;
        if preferences.is_empty() {
            warn!("No interaction history for user {}", user_id);
            return self.catalog.find_trending(limit).await;
        }

        let mut candidate_scores: HashMap<Uuid, f64> = HashMap::new();
        for (&source_product, &user_score) in &preferences {
            let similar = self
                .product_similarities
                .most_similar(source_product, self.config.recommendation.top_k)
                .await?;

            for neighbor in similar {
                if preferences.contains_key(&neighbor.id) {
                    continue;
                }
                if neighbor.score < self.config.recommendation.min_similarity {
                    continue;
                }
                *candidate_scores.entry(neighbor.id).or_insert(0.0) +=
                    user_score * neighbor.score;
            }
        }

        let top = utils::top_n(&candidate_scores, limit);
        if top.is_empty() {
            warn!("No item-based candidates for user {}", user_id);
            return self.catalog.find_trending(limit).await;
        }

        self.cache_results(user_id, &candidate_scores, &top).await?;

        info!(
            "Generated {} item-based recommendations for user {}",
            top.len(),
            user_id
        );
        self.catalog.find_by_ids(&top).await
    }

    /// Direct similarity-store lookup for a fixed product ("customers also
    /// bought"). Independent of any user and deliberately uncached.
    pub async fn similar_to(&self, product_id: Uuid, limit: usize) -> Result<Vec<Product>> {
        info!("Finding similar products for product {}", product_id);

        let similar = self.product_similarities.most_similar(product_id, limit).await?;
        let ids: Vec<Uuid> = similar
            .into_iter()
            .filter(|n| n.score >= self.config.recommendation.min_similarity)
            .map(|n| n.id)
            .collect();

        self.catalog.find_by_ids(&ids).await
    }

    /// Full pairwise cosine over per-product interaction vectors (user ->
    /// weighted score). Upsert-as-you-go; a deadline abort keeps prior rows.
    pub async fn compute_product_similarities(&self, deadline: Option<Instant>) -> Result<usize> {
        info!("Starting product similarity computation");

        let matrix = self.interactions.interaction_matrix().await?;
        let mut products: Vec<(Uuid, HashMap<Uuid, f64>)> = matrix.into_iter().collect();
        products.sort_by_key(|(id, _)| *id);

        let threshold = self.config.recommendation.min_similarity;
        let mut written = 0;

        for (i, (product_a, vector_a)) in products.iter().enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(
                        "Product similarity computation hit its deadline after {} products; keeping {} rows",
                        i, written
                    );
                    return Ok(written);
                }
            }

            let rows: Vec<SimilarityScore> = products[i + 1..]
                .par_iter()
                .filter_map(|(product_b, vector_b)| {
                    let score = utils::cosine_similarity(vector_a, vector_b);
                    (score > threshold).then(|| {
                        SimilarityScore::new(*product_a, *product_b, score, SimilarityMetric::Cosine)
                    })
                })
                .collect();

            written += self.product_similarities.upsert_batch(rows).await?;

            if (i + 1) % 100 == 0 {
                info!("Processed {} products", i + 1);
            }
        }

        info!(
            "Product similarity computation completed: {} rows written",
            written
        );
        Ok(written)
    }

    /// Cheap alternative to the full cosine pass: purchase/cart
    /// co-occurrence counts, squashed into [0, 1].
    pub async fn compute_similarities_by_co_occurrence(&self) -> Result<usize> {
        info!("Computing product similarities from co-occurrence");

        let products = self.catalog.find_all_active().await?;
        let threshold = self.config.recommendation.min_similarity;
        let mut written = 0;

        for product in &products {
            let co_occurrences = self
                .interactions
                .co_occurrences(
                    product.product_id,
                    self.config.recommendation.co_occurrence_candidates,
                )
                .await?;

            let rows: Vec<SimilarityScore> = co_occurrences
                .into_iter()
                .filter_map(|(other, count)| {
                    let score = (count as f64 / 10.0).min(1.0);
                    (score > threshold).then(|| {
                        SimilarityScore::new(
                            product.product_id,
                            other,
                            score,
                            SimilarityMetric::Jaccard,
                        )
                    })
                })
                .collect();

            written += self.product_similarities.upsert_batch(rows).await?;
        }

        info!("Co-occurrence computation completed: {} rows written", written);
        Ok(written)
    }

    /// Names the already-seen product most similar to the recommended one.
    pub async fn explain(&self, user_id: Uuid, recommended: Uuid) -> Result<String> {
        let seen = self.interactions.product_ids_by_user(user_id).await?;

        let mut best: Option<(Uuid, f64)> = None;
        for product_id in seen {
            if let Some(row) = self
                .product_similarities
                .find_pair(product_id, recommended)
                .await?
            {
                if best.map_or(true, |(_, score)| row.score > score) {
                    best = Some((product_id, row.score));
                }
            }
        }

        if let Some((product_id, _)) = best {
            if let Some(product) = self.catalog.find_by_ids(&[product_id]).await?.first() {
                return Ok(format!("Similar to {} you viewed before", product.name));
            }
        }
        Ok("Customers who bought similar items also bought this".to_string())
    }

    async fn cache_results(
        &self,
        user_id: Uuid,
        candidate_scores: &HashMap<Uuid, f64>,
        top: &[Uuid],
    ) -> Result<()> {
        let normalized = utils::normalize_scores(candidate_scores);
        let now = Utc::now();
        let expires_at = Some(now + Duration::hours(self.config.recommendation.cache_ttl_hours));

        let entries = top
            .iter()
            .map(|&product_id| CachedRecommendation {
                user_id,
                product_id,
                strategy: Strategy::ItemBased,
                confidence_score: normalized.get(&product_id).copied().unwrap_or(0.0),
                generated_at: now,
                expires_at,
            })
            .collect();

        self.cache.put(user_id, Strategy::ItemBased, entries).await
    }
}
