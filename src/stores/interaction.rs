use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Interaction, InteractionType, Rating};

/// Interaction and rating store consumed by the engines. Interactions are
/// append-only; ratings upsert per (user, product).
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn record(&self, interaction: Interaction) -> Result<()>;

    async fn upsert_rating(&self, rating: Rating) -> Result<()>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Interaction>>;

    /// Distinct products the user has touched with any interaction type.
    async fn product_ids_by_user(&self, user_id: Uuid) -> Result<HashSet<Uuid>>;

    /// Distinct users who touched the product, ordered by id for determinism.
    async fn user_ids_by_product(&self, product_id: Uuid) -> Result<Vec<Uuid>>;

    /// product -> weighted score per product the user touched. The most
    /// recent interaction per product wins.
    async fn preference_map(&self, user_id: Uuid) -> Result<HashMap<Uuid, f64>>;

    /// user -> (product -> rating value), for user-user Pearson.
    async fn rating_vectors(&self) -> Result<HashMap<Uuid, HashMap<Uuid, f64>>>;

    /// product -> (user -> weighted score), for item-item cosine.
    async fn interaction_matrix(&self) -> Result<HashMap<Uuid, HashMap<Uuid, f64>>>;

    /// Products co-occurring with `product_id` in the same users' purchase or
    /// add-to-cart history, with counts, most frequent first.
    async fn co_occurrences(&self, product_id: Uuid, limit: usize) -> Result<Vec<(Uuid, u64)>>;

    /// Retention cleanup; returns the number of interactions removed.
    async fn delete_older_than(&self, days: i64) -> Result<usize>;
}

#[derive(Default)]
pub struct InMemoryInteractionStore {
    interactions: RwLock<Vec<Interaction>>,
    ratings: RwLock<HashMap<(Uuid, Uuid), Rating>>,
}

impl InMemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InteractionStore for InMemoryInteractionStore {
    async fn record(&self, interaction: Interaction) -> Result<()> {
        self.interactions.write().await.push(interaction);
        Ok(())
    }

    async fn upsert_rating(&self, rating: Rating) -> Result<()> {
        let key = (rating.user_id, rating.product_id);
        let mut ratings = self.ratings.write().await;
        match ratings.get_mut(&key) {
            Some(existing) => {
                existing.rating_value = rating.rating_value;
                existing.review_text = rating.review_text;
                existing.updated_at = Utc::now();
            }
            None => {
                ratings.insert(key, rating);
            }
        }
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<Interaction>> {
        let interactions = self.interactions.read().await;
        Ok(interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn product_ids_by_user(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let interactions = self.interactions.read().await;
        Ok(interactions
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| i.product_id)
            .collect())
    }

    async fn user_ids_by_product(&self, product_id: Uuid) -> Result<Vec<Uuid>> {
        let interactions = self.interactions.read().await;
        let distinct: HashSet<Uuid> = interactions
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.user_id)
            .collect();
        let mut users: Vec<Uuid> = distinct.into_iter().collect();
        users.sort();
        Ok(users)
    }

    async fn preference_map(&self, user_id: Uuid) -> Result<HashMap<Uuid, f64>> {
        let interactions = self.interactions.read().await;
        let mut preferences = HashMap::new();
        for interaction in interactions.iter().filter(|i| i.user_id == user_id) {
            preferences.insert(interaction.product_id, interaction.weighted_score());
        }
        Ok(preferences)
    }

    async fn rating_vectors(&self) -> Result<HashMap<Uuid, HashMap<Uuid, f64>>> {
        let ratings = self.ratings.read().await;
        let mut vectors: HashMap<Uuid, HashMap<Uuid, f64>> = HashMap::new();
        for rating in ratings.values() {
            vectors
                .entry(rating.user_id)
                .or_default()
                .insert(rating.product_id, rating.rating_value);
        }
        Ok(vectors)
    }

    async fn interaction_matrix(&self) -> Result<HashMap<Uuid, HashMap<Uuid, f64>>> {
        let interactions = self.interactions.read().await;
        let mut matrix: HashMap<Uuid, HashMap<Uuid, f64>> = HashMap::new();
        for interaction in interactions.iter() {
            matrix
                .entry(interaction.product_id)
                .or_default()
                .insert(interaction.user_id, interaction.weighted_score());
        }
        Ok(matrix)
    }

    async fn co_occurrences(&self, product_id: Uuid, limit: usize) -> Result<Vec<(Uuid, u64)>> {
        let interactions = self.interactions.read().await;

        let strong = |t: InteractionType| {
            matches!(t, InteractionType::Purchase | InteractionType::AddToCart)
        };

        let buyers: HashSet<Uuid> = interactions
            .iter()
            .filter(|i| i.product_id == product_id && strong(i.interaction_type))
            .map(|i| i.user_id)
            .collect();

        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        let mut seen_pairs: HashSet<(Uuid, Uuid)> = HashSet::new();
        for interaction in interactions.iter() {
            if interaction.product_id == product_id
                || !strong(interaction.interaction_type)
                || !buyers.contains(&interaction.user_id)
            {
                continue;
            }
            // Count each (user, product) pair once, mirroring a DISTINCT join.
            if seen_pairs.insert((interaction.user_id, interaction.product_id)) {
                *counts.entry(interaction.product_id).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(Uuid, u64)> = counts.into_iter().collect();
        ranked.sort_by(|(id_a, count_a), (id_b, count_b)| {
            count_b.cmp(count_a).then_with(|| id_a.cmp(id_b))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn delete_older_than(&self, days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut interactions = self.interactions.write().await;
        let before = interactions.len();
        interactions.retain(|i| i.created_at >= cutoff);
        let removed = before - interactions.len();
        if removed > 0 {
            info!("Removed {} interactions older than {} days", removed, days);
        }
        Ok(removed)
    }
}
