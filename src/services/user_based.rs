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

/// User-based collaborative filtering: recommends products that users
/// similar to the target liked. Neighbor similarity comes from the
/// precomputed user-user store; `compute_user_similarities` refreshes it.
pub struct UserBasedCf {
    interactions: Arc<dyn InteractionStore>,
    user_similarities: Arc<dyn SimilarityStore>,
    cache: Arc<dyn RecommendationCache>,
    catalog: Arc<dyn CatalogStore>,
    config: Arc<Config>,
}

impl UserBasedCf {
    pub fn new(
        interactions: Arc<dyn InteractionStore>,
        user_similarities: Arc<dyn SimilarityStore>,
        cache: Arc<dyn RecommendationCache>,
        catalog: Arc<dyn CatalogStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            interactions,
            user_similarities,
            cache,
            catalog,
            config,
        }
    }

    /// Absence of similarity data or history is not an error: the result
    /// degrades to the trending signal.
    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<Product>> {
        info!("Generating user-based recommendations for user {}", user_id);

        if let Some(cached) = self.cache.get(user_id, Strategy::UserBased).await? {
            info!("Returning {} cached user-based recommendations", cached.len());
            return self.catalog.find_by_ids(&ranked_ids(cached, limit)).await;
        }

        let neighbors = self
            .user_similarities
            .most_similar(user_id, self.config.recommendation.top_k)
            .await?;

        if neighbors.is_empty() {
            warn!("No similar users found for user {}", user_id);
            return self.catalog.find_trending(limit).await;
        }

        let seen = self.interactions.product_ids_by_user(user_id).await?;

        let mut product_scores: HashMap<Uuid, f64> = HashMap::new();
        for neighbor in &neighbors {
            if neighbor.score < self.config.recommendation.min_similarity {
                continue;
            }

            // One interaction fetch per neighbor; the fan-out is bounded by K.
            for interaction in self.interactions.find_by_user(neighbor.id).await? {
                if seen.contains(&interaction.product_id) {
                    continue;
                }
                *product_scores.entry(interaction.product_id).or_insert(0.0) +=
                    neighbor.score * interaction.weighted_score();
            }
        }

        let top = utils::top_n(&product_scores, limit);
        if top.is_empty() {
            warn!("No user-based candidates for user {}", user_id);
            return self.catalog.find_trending(limit).await;
        }

        self.cache_results(user_id, &product_scores, &top).await?;

        info!(
            "Generated {} user-based recommendations for user {}",
            top.len(),
            user_id
        );
        self.catalog.find_by_ids(&top).await
    }

    /// Full pairwise Pearson over explicit rating vectors. Rows are upserted
    /// per source user, so hitting `deadline` mid-run keeps everything
    /// written so far and leaves older rows untouched. Returns rows written.
    pub async fn compute_user_similarities(&self, deadline: Option<Instant>) -> Result<usize> {
        info!("Starting user similarity computation");

        let vectors = self.interactions.rating_vectors().await?;
        let mut users: Vec<(Uuid, HashMap<Uuid, f64>)> = vectors.into_iter().collect();
        users.sort_by_key(|(id, _)| *id);

        let threshold = self.config.recommendation.min_similarity;
        let mut written = 0;

        for (i, (user_a, vector_a)) in users.iter().enumerate() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!(
                        "User similarity computation hit its deadline after {} users; keeping {} rows",
                        i, written
                    );
                    return Ok(written);
                }
            }

            let rows: Vec<SimilarityScore> = users[i + 1..]
                .par_iter()
                .filter_map(|(user_b, vector_b)| {
                    let score = utils::pearson_correlation(vector_a, vector_b);
                    (score.abs() > threshold).then(|| {
                        SimilarityScore::new(*user_a, *user_b, score, SimilarityMetric::Pearson)
                    })
                })
                .collect();

            written += self.user_similarities.upsert_batch(rows).await?;

            if (i + 1) % 100 == 0 {
                info!("Processed {} users", i + 1);
            }
        }

        info!(
            "User similarity computation completed: {} rows written",
            written
        );
        Ok(written)
    }

    /// Human-readable reason a product was recommended to a user.
    pub async fn explain(&self, user_id: Uuid, product_id: Uuid) -> Result<String> {
        let neighbors = self.user_similarities.most_similar(user_id, 5).await?;

        let mut count = 0;
        for neighbor in neighbors {
            let liked = self
                .interactions
                .product_ids_by_user(neighbor.id)
                .await?
                .contains(&product_id);
            if liked {
                count += 1;
            }
        }

        if count > 0 {
            Ok(format!("{count} similar shoppers liked this product"))
        } else {
            Ok("Recommended based on your preferences".to_string())
        }
    }

    async fn cache_results(
        &self,
        user_id: Uuid,
        product_scores: &HashMap<Uuid, f64>,
        top: &[Uuid],
    ) -> Result<()> {
        let normalized = utils::normalize_scores(product_scores);
        let now = Utc::now();
        let expires_at = Some(now + Duration::hours(self.config.recommendation.cache_ttl_hours));

        let entries = top
            .iter()
            .map(|&product_id| CachedRecommendation {
                user_id,
                product_id,
                strategy: Strategy::UserBased,
                confidence_score: normalized.get(&product_id).copied().unwrap_or(0.0),
                generated_at: now,
                expires_at,
            })
            .collect();

        self.cache.put(user_id, Strategy::UserBased, entries).await
    }
}

/// Order cached rows by confidence descending (ties by product id) and
/// truncate to the requested length.
pub(crate) fn ranked_ids(mut cached: Vec<CachedRecommendation>, limit: usize) -> Vec<Uuid> {
    cached.sort_by(|a, b| {
        b.confidence_score
            .partial_cmp(&a.confidence_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    cached
        .into_iter()
        .take(limit)
        .map(|entry| entry.product_id)
        .collect()
}
