use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{canonical_pair, SimilarityScore};

/// One neighbor returned by a "most similar to X" query.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: Uuid,
    pub score: f64,
}

/// Pairwise similarity store. Used in two instances: user-user and
/// item-item. Rows are keyed by the canonical unordered pair (lower id
/// first); both lookup orderings resolve to the same row. Upserts are
/// per-row atomic, so a partially applied batch is a valid state.
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    async fn upsert(&self, score: SimilarityScore) -> Result<()>;

    /// Returns the number of rows written. Partial success is acceptable.
    async fn upsert_batch(&self, scores: Vec<SimilarityScore>) -> Result<usize>;

    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Option<SimilarityScore>>;

    /// K most similar counterparts to `id`, score descending, considering
    /// rows where `id` appears on either side of the pair.
    async fn most_similar(&self, id: Uuid, k: usize) -> Result<Vec<Neighbor>>;

    async fn delete_older_than(&self, days: i64) -> Result<usize>;

    async fn len(&self) -> Result<usize>;
}

#[derive(Default)]
pub struct InMemorySimilarityStore {
    rows: DashMap<(Uuid, Uuid), SimilarityScore>,
}

impl InMemorySimilarityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SimilarityStore for InMemorySimilarityStore {
    async fn upsert(&self, score: SimilarityScore) -> Result<()> {
        // SimilarityScore::new already canonicalized, but re-derive the key
        // so a hand-built row cannot break the invariant.
        let key = canonical_pair(score.id_a, score.id_b);
        self.rows.insert(key, score);
        Ok(())
    }

    async fn upsert_batch(&self, scores: Vec<SimilarityScore>) -> Result<usize> {
        let count = scores.len();
        for score in scores {
            self.upsert(score).await?;
        }
        Ok(count)
    }

    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Option<SimilarityScore>> {
        let key = canonical_pair(a, b);
        Ok(self.rows.get(&key).map(|row| row.clone()))
    }

    async fn most_similar(&self, id: Uuid, k: usize) -> Result<Vec<Neighbor>> {
        let mut neighbors: Vec<Neighbor> = self
            .rows
            .iter()
            .filter(|row| row.id_a == id || row.id_b == id)
            .map(|row| Neighbor {
                id: row.counterpart(id),
                score: row.score,
            })
            .collect();

        neighbors.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }

    async fn delete_older_than(&self, days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(days);
        let before = self.rows.len();
        self.rows.retain(|_, row| row.computed_at >= cutoff);
        Ok(before - self.rows.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.rows.len())
    }
}
