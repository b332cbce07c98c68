use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offline ranking quality for a recommendation list against held-out
/// relevant products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub f1_score: f64,
    pub ndcg_at_k: f64,
}

#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    k: usize,
}

impl MetricsCalculator {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    pub fn precision_at_k(&self, recommended: &[Uuid], relevant: &[Uuid]) -> f64 {
        if recommended.is_empty() {
            return 0.0;
        }

        let relevant_set: HashSet<_> = relevant.iter().collect();
        let hits = recommended
            .iter()
            .take(self.k)
            .filter(|id| relevant_set.contains(id))
            .count();

        hits as f64 / self.k.min(recommended.len()) as f64
    }

    pub fn recall_at_k(&self, recommended: &[Uuid], relevant: &[Uuid]) -> f64 {
        if relevant.is_empty() {
            return 0.0;
        }

        let relevant_set: HashSet<_> = relevant.iter().collect();
        let hits = recommended
            .iter()
            .take(self.k)
            .filter(|id| relevant_set.contains(id))
            .count();

        hits as f64 / relevant.len() as f64
    }

    pub fn f1_score(&self, precision: f64, recall: f64) -> f64 {
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    pub fn ndcg_at_k(&self, recommended: &[Uuid], relevance: &HashMap<Uuid, f64>) -> f64 {
        let dcg = self.dcg(recommended, relevance);
        let idcg = self.ideal_dcg(relevance);
        if idcg == 0.0 {
            0.0
        } else {
            dcg / idcg
        }
    }

    fn dcg(&self, recommended: &[Uuid], relevance: &HashMap<Uuid, f64>) -> f64 {
        recommended
            .iter()
            .take(self.k)
            .enumerate()
            .map(|(i, id)| {
                let gain = relevance.get(id).copied().unwrap_or(0.0);
                gain / ((i + 2) as f64).log2()
            })
            .sum()
    }

    fn ideal_dcg(&self, relevance: &HashMap<Uuid, f64>) -> f64 {
        let mut gains: Vec<f64> = relevance.values().copied().collect();
        gains.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        gains
            .iter()
            .take(self.k)
            .enumerate()
            .map(|(i, &gain)| gain / ((i + 2) as f64).log2())
            .sum()
    }

    pub fn all_metrics(
        &self,
        recommended: &[Uuid],
        relevant: &[Uuid],
        relevance: &HashMap<Uuid, f64>,
    ) -> RankingMetrics {
        let precision = self.precision_at_k(recommended, relevant);
        let recall = self.recall_at_k(recommended, relevant);
        RankingMetrics {
            precision_at_k: precision,
            recall_at_k: recall,
            f1_score: self.f1_score(precision, recall),
            ndcg_at_k: self.ndcg_at_k(recommended, relevance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_and_recall() {
        let calculator = MetricsCalculator::new(5);
        let recommended = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let relevant = vec![recommended[0], recommended[2]];

        let precision = calculator.precision_at_k(&recommended, &relevant);
        assert!((precision - 2.0 / 3.0).abs() < 1e-9);

        let recall = calculator.recall_at_k(&recommended, &relevant);
        assert!((recall - 1.0).abs() < 1e-9);

        let f1 = calculator.f1_score(precision, recall);
        assert!((f1 - 2.0 * precision * recall / (precision + recall)).abs() < 1e-9);
    }

    #[test]
    fn ndcg_perfect_order_is_one() {
        let calculator = MetricsCalculator::new(3);
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let relevance: HashMap<Uuid, f64> = ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, (3 - i) as f64))
            .collect();

        let ndcg = calculator.ndcg_at_k(&ids, &relevance);
        assert!((ndcg - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ndcg_bounded() {
        let calculator = MetricsCalculator::new(3);
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let mut relevance = HashMap::new();
        relevance.insert(ids[1], 1.0);
        let ndcg = calculator.ndcg_at_k(&ids, &relevance);
        assert!((0.0..=1.0).contains(&ndcg));
    }
}
