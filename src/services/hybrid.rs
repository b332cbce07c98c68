use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    CachedRecommendation, Interaction, InteractionType, Product, Rating, Strategy,
};
use crate::stores::{CatalogStore, InteractionStore, RecommendationCache};

use super::item_based::ItemBasedCf;
use super::user_based::{ranked_ids, UserBasedCf};

/// Default public entry point. Blends user-based CF, item-based CF, and the
/// trending signal with fixed weights; also serves the product-page views
/// ("bought together", "also viewed") and records incoming interactions.
pub struct HybridRecommender {
    user_based: Arc<UserBasedCf>,
    item_based: Arc<ItemBasedCf>,
    interactions: Arc<dyn InteractionStore>,
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn RecommendationCache>,
    config: Arc<Config>,
}

impl HybridRecommender {
    pub fn new(
        user_based: Arc<UserBasedCf>,
        item_based: Arc<ItemBasedCf>,
        interactions: Arc<dyn InteractionStore>,
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn RecommendationCache>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            user_based,
            item_based,
            interactions,
            catalog,
            cache,
            config,
        }
    }

    pub async fn recommend(&self, user_id: Uuid, limit: usize) -> Result<Vec<Product>> {
        info!("Generating hybrid recommendations for user {}", user_id);

        if let Some(cached) = self.cache.get(user_id, Strategy::Hybrid).await? {
            info!("Returning {} cached hybrid recommendations", cached.len());
            return self.catalog.find_by_ids(&ranked_ids(cached, limit)).await;
        }

        let seen = self.interactions.product_ids_by_user(user_id).await?;
        let mut hybrid_scores: HashMap<Uuid, f64> = HashMap::new();

        // Missing personalization data surfaces as an empty source list and
        // simply contributes nothing; a store failure is not degraded data
        // and propagates.
        let user_list = self.user_based.recommend(user_id, limit * 2).await?;
        blend_source(
            &mut hybrid_scores,
            &seen,
            &user_list,
            self.config.recommendation.weight_user_based,
        );

        let item_list = self.item_based.recommend(user_id, limit * 2).await?;
        blend_source(
            &mut hybrid_scores,
            &seen,
            &item_list,
            self.config.recommendation.weight_item_based,
        );

        let trending_list = self.catalog.find_trending(limit * 2).await?;
        blend_source(
            &mut hybrid_scores,
            &seen,
            &trending_list,
            self.config.recommendation.weight_trending,
        );

        // Stable ranking: summed score descending, then product id, so equal
        // scores cannot reorder between runs.
        let mut ranked: Vec<(Uuid, f64)> = hybrid_scores.iter().map(|(&k, &v)| (k, v)).collect();
        ranked.sort_by(|(id_a, score_a), (id_b, score_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        });
        let top: Vec<Uuid> = ranked.into_iter().take(limit).map(|(id, _)| id).collect();

        if top.is_empty() {
            warn!("No hybrid candidates for user {}, falling back to trending", user_id);
            return self.catalog.find_trending(limit).await;
        }

        self.cache_results(user_id, &hybrid_scores, &top).await?;

        info!(
            "Generated {} hybrid recommendations for user {}",
            top.len(),
            user_id
        );
        self.catalog.find_by_ids(&top).await
    }

    /// Anonymous visitors go straight to trending; no blend is attempted
    /// without a user identity.
    pub async fn homepage_recommendations(
        &self,
        user_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Product>> {
        match user_id {
            Some(user_id) => self.recommend(user_id, limit).await,
            None => self.catalog.find_trending(limit).await,
        }
    }

    pub async fn frequently_bought_together(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Product>> {
        self.item_based.similar_to(product_id, limit).await
    }

    /// Raw co-occurrence frequency over a bounded user sample. Cheaper than
    /// the item-based engine and intentionally independent of the similarity
    /// store.
    pub async fn customers_also_viewed(
        &self,
        product_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Product>> {
        let users = self.interactions.user_ids_by_product(product_id).await?;
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let sample = self.config.recommendation.also_viewed_user_sample;
        let mut view_counts: HashMap<Uuid, u64> = HashMap::new();
        for user_id in users.iter().take(sample) {
            for interaction in self.interactions.find_by_user(*user_id).await? {
                if interaction.product_id != product_id {
                    *view_counts.entry(interaction.product_id).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(Uuid, u64)> = view_counts.into_iter().collect();
        ranked.sort_by(|(id_a, count_a), (id_b, count_b)| {
            count_b.cmp(count_a).then_with(|| id_a.cmp(id_b))
        });
        let top: Vec<Uuid> = ranked.into_iter().take(limit).map(|(id, _)| id).collect();

        self.catalog.find_by_ids(&top).await
    }

    /// Appends the interaction, bumps catalog counters where applicable, and
    /// invalidates every cached strategy for the user so the next request
    /// recomputes. No synchronous similarity recomputation happens here.
    pub async fn record_interaction(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        interaction_type: InteractionType,
        value: Option<f64>,
    ) -> Result<()> {
        let mut interaction = Interaction::new(user_id, product_id, interaction_type)
            .with_session(Uuid::new_v4().to_string());
        if let Some(value) = value {
            interaction = interaction.with_value(value);
        }
        self.interactions.record(interaction).await?;

        match interaction_type {
            InteractionType::View => self.catalog.increment_view_count(product_id).await?,
            InteractionType::Purchase => self.catalog.increment_purchase_count(product_id).await?,
            InteractionType::Rating => {
                // Keep the explicit-rating vector in sync for user-based CF;
                // a repeat rating updates in place.
                if let Some(value) = value {
                    self.interactions
                        .upsert_rating(Rating::new(user_id, product_id, value))
                        .await?;
                }
            }
            _ => {}
        }

        self.cache.invalidate_user(user_id).await?;

        info!(
            "Recorded {} interaction for user {} on product {}",
            interaction_type.as_str(),
            user_id,
            product_id
        );
        Ok(())
    }

    pub async fn cleanup_expired_cache(&self) -> Result<usize> {
        let deleted = self.cache.sweep_expired().await?;
        info!("Cleaned up {} expired recommendation sets", deleted);
        Ok(deleted)
    }

    async fn cache_results(
        &self,
        user_id: Uuid,
        scores: &HashMap<Uuid, f64>,
        top: &[Uuid],
    ) -> Result<()> {
        // Hybrid confidences are scaled against the best blended score.
        let max_score = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
        let max_score = if max_score > 0.0 { max_score } else { 1.0 };

        let now = Utc::now();
        let expires_at = Some(now + Duration::hours(self.config.recommendation.cache_ttl_hours));

        let entries = top
            .iter()
            .map(|&product_id| CachedRecommendation {
                user_id,
                product_id,
                strategy: Strategy::Hybrid,
                confidence_score: scores.get(&product_id).copied().unwrap_or(0.0) / max_score,
                generated_at: now,
                expires_at,
            })
            .collect();

        self.cache.put(user_id, Strategy::Hybrid, entries).await
    }
}

/// Linear rank decay within one source list, scaled by the source weight.
/// Position i of n contributes `weight * (1 - i/n)`; scores for the same
/// product sum across sources. Already-seen products never score.
fn blend_source(
    scores: &mut HashMap<Uuid, f64>,
    seen: &HashSet<Uuid>,
    source: &[Product],
    weight: f64,
) {
    let len = source.len() as f64;
    for (i, product) in source.iter().enumerate() {
        if seen.contains(&product.product_id) {
            continue;
        }
        let score = weight * (1.0 - i as f64 / len);
        *scores.entry(product.product_id).or_insert(0.0) += score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_decays_by_rank_and_sums_across_sources() {
        let a = Product::new(Uuid::new_v4(), "A", "tops");
        let b = Product::new(Uuid::new_v4(), "B", "tops");
        let mut scores = HashMap::new();
        let seen = HashSet::new();

        blend_source(&mut scores, &seen, &[a.clone(), b.clone()], 0.5);
        assert!((scores[&a.product_id] - 0.5).abs() < 1e-9);
        assert!((scores[&b.product_id] - 0.25).abs() < 1e-9);

        blend_source(&mut scores, &seen, &[b.clone()], 0.2);
        assert!((scores[&b.product_id] - 0.45).abs() < 1e-9);
    }

    #[test]
    fn blend_skips_seen_products() {
        let a = Product::new(Uuid::new_v4(), "A", "tops");
        let mut scores = HashMap::new();
        let mut seen = HashSet::new();
        seen.insert(a.product_id);

        blend_source(&mut scores, &seen, &[a], 0.5);
        assert!(scores.is_empty());
    }
}
