use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CachedRecommendation, Strategy};

/// Read-through recommendation cache keyed by (user, strategy).
///
/// A non-expired set is authoritative and served without recomputation. Two
/// callers racing to fill the same key is a benign last-write-wins overwrite;
/// rankings are best-effort and idempotent-ish, so no cross-caller locking
/// exists on this path.
#[async_trait]
pub trait RecommendationCache: Send + Sync {
    /// Returns the ranked set only when it is non-empty and no row expired.
    async fn get(&self, user_id: Uuid, strategy: Strategy)
        -> Result<Option<Vec<CachedRecommendation>>>;

    /// Replaces the whole set for (user, strategy).
    async fn put(&self, user_id: Uuid, strategy: Strategy, entries: Vec<CachedRecommendation>)
        -> Result<()>;

    /// Drops every strategy's entries for the user. Called when a new
    /// interaction is recorded.
    async fn invalidate_user(&self, user_id: Uuid) -> Result<usize>;

    /// Background sweep reclaiming expired sets; reads never depend on it.
    async fn sweep_expired(&self) -> Result<usize>;
}

#[derive(Default)]
pub struct InMemoryRecommendationCache {
    entries: DashMap<(Uuid, Strategy), Vec<CachedRecommendation>>,
}

impl InMemoryRecommendationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecommendationCache for InMemoryRecommendationCache {
    async fn get(
        &self,
        user_id: Uuid,
        strategy: Strategy,
    ) -> Result<Option<Vec<CachedRecommendation>>> {
        let now = Utc::now();
        match self.entries.get(&(user_id, strategy)) {
            Some(set) if !set.is_empty() && !set.iter().any(|e| e.is_expired(now)) => {
                Ok(Some(set.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn put(
        &self,
        user_id: Uuid,
        strategy: Strategy,
        entries: Vec<CachedRecommendation>,
    ) -> Result<()> {
        debug!(
            "Caching {} {} recommendations for user {}",
            entries.len(),
            strategy.as_str(),
            user_id
        );
        self.entries.insert((user_id, strategy), entries);
        Ok(())
    }

    async fn invalidate_user(&self, user_id: Uuid) -> Result<usize> {
        let mut removed = 0;
        for strategy in Strategy::ALL {
            if self.entries.remove(&(user_id, strategy)).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, set| !set.iter().any(|e| e.is_expired(now)));
        Ok(before - self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(user: Uuid, strategy: Strategy, expires_in_hours: i64) -> CachedRecommendation {
        let now = Utc::now();
        CachedRecommendation {
            user_id: user,
            product_id: Uuid::new_v4(),
            strategy,
            confidence_score: 0.9,
            generated_at: now,
            expires_at: Some(now + Duration::hours(expires_in_hours)),
        }
    }

    #[tokio::test]
    async fn fresh_set_is_served_expired_set_is_not() {
        let cache = InMemoryRecommendationCache::new();
        let user = Uuid::new_v4();

        cache
            .put(user, Strategy::Hybrid, vec![entry(user, Strategy::Hybrid, 24)])
            .await
            .unwrap();
        assert!(cache.get(user, Strategy::Hybrid).await.unwrap().is_some());

        cache
            .put(user, Strategy::Hybrid, vec![entry(user, Strategy::Hybrid, -1)])
            .await
            .unwrap();
        assert!(cache.get(user, Strategy::Hybrid).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_user_clears_all_strategies() {
        let cache = InMemoryRecommendationCache::new();
        let user = Uuid::new_v4();
        for strategy in Strategy::ALL {
            cache
                .put(user, strategy, vec![entry(user, strategy, 24)])
                .await
                .unwrap();
        }

        let removed = cache.invalidate_user(user).await.unwrap();
        assert_eq!(removed, 3);
        for strategy in Strategy::ALL {
            assert!(cache.get(user, strategy).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn sweep_reclaims_only_expired_sets() {
        let cache = InMemoryRecommendationCache::new();
        let expired_user = Uuid::new_v4();
        let fresh_user = Uuid::new_v4();

        cache
            .put(
                expired_user,
                Strategy::ItemBased,
                vec![entry(expired_user, Strategy::ItemBased, -2)],
            )
            .await
            .unwrap();
        cache
            .put(
                fresh_user,
                Strategy::ItemBased,
                vec![entry(fresh_user, Strategy::ItemBased, 2)],
            )
            .await
            .unwrap();

        let swept = cache.sweep_expired().await.unwrap();
        assert_eq!(swept, 1);
        assert!(cache
            .get(fresh_user, Strategy::ItemBased)
            .await
            .unwrap()
            .is_some());
    }
}
