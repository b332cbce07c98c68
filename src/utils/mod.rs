use std::collections::{HashMap, HashSet};

use uuid::Uuid;

pub mod metrics;
pub mod validation;

/// Cosine similarity between two sparse vectors keyed by id.
///
/// The dot product runs over the key intersection, but both magnitudes are
/// taken over the full vectors. That penalizes pairs with many
/// non-overlapping dimensions, which matters for sparse users.
pub fn cosine_similarity(a: &HashMap<Uuid, f64>, b: &HashMap<Uuid, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(key, &va)| large.get(key).map(|&vb| va * vb))
        .sum();

    let magnitude_a: f64 = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let magnitude_b: f64 = b.values().map(|v| v * v).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        dot / (magnitude_a * magnitude_b)
    }
}

/// Pearson correlation over the key intersection of two rating vectors.
/// Returns 0 when fewer than 2 keys are shared or either variance is 0.
pub fn pearson_correlation(a: &HashMap<Uuid, f64>, b: &HashMap<Uuid, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let common: Vec<Uuid> = a.keys().filter(|k| b.contains_key(*k)).copied().collect();
    if common.len() < 2 {
        return 0.0;
    }

    let n = common.len() as f64;
    let mean_a: f64 = common.iter().map(|k| a[k]).sum::<f64>() / n;
    let mean_b: f64 = common.iter().map(|k| b[k]).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_a = 0.0;
    let mut variance_b = 0.0;
    for key in &common {
        let da = a[key] - mean_a;
        let db = b[key] - mean_b;
        covariance += da * db;
        variance_a += da * da;
        variance_b += db * db;
    }

    if variance_a == 0.0 || variance_b == 0.0 {
        0.0
    } else {
        covariance / (variance_a.sqrt() * variance_b.sqrt())
    }
}

/// Jaccard similarity (intersection over union). Two empty sets are
/// considered identical; one empty set against a non-empty one scores 0.
pub fn jaccard_similarity(a: &HashSet<Uuid>, b: &HashSet<Uuid>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Min-max normalize scores to [0, 1]. A single distinct value maps every
/// entry to 0.5, preserving "some value" semantics without dividing by zero.
pub fn normalize_scores(scores: &HashMap<Uuid, f64>) -> HashMap<Uuid, f64> {
    if scores.is_empty() {
        return HashMap::new();
    }

    let min = scores.values().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return scores.keys().map(|&k| (k, 0.5)).collect();
    }

    scores
        .iter()
        .map(|(&k, &v)| (k, (v - min) / (max - min)))
        .collect()
}

/// Top-N ids by score, descending. Ties break on the id itself so the result
/// is deterministic regardless of map iteration order.
pub fn top_n(scores: &HashMap<Uuid, f64>, n: usize) -> Vec<Uuid> {
    let mut entries: Vec<(Uuid, f64)> = scores.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_by(|(id_a, score_a), (id_b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| id_a.cmp(id_b))
    });
    entries.into_iter().take(n).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(pairs: &[(Uuid, f64)]) -> HashMap<Uuid, f64> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn cosine_is_symmetric_and_bounded() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let p3 = Uuid::new_v4();
        let a = vec_of(&[(p1, 3.0), (p2, 1.0)]);
        let b = vec_of(&[(p1, 2.0), (p3, 4.0)]);

        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn cosine_self_similarity_is_one() {
        let a = vec_of(&[(Uuid::new_v4(), 5.0), (Uuid::new_v4(), 2.0)]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_uses_full_magnitudes() {
        // One shared key out of many: the non-overlapping mass must drag the
        // score below intersection-only cosine (which would be 1.0 here).
        let shared = Uuid::new_v4();
        let a = vec_of(&[(shared, 1.0)]);
        let b = vec_of(&[(shared, 1.0), (Uuid::new_v4(), 3.0), (Uuid::new_v4(), 4.0)]);
        let sim = cosine_similarity(&a, &b);
        assert!(sim > 0.0 && sim < 0.5);
    }

    #[test]
    fn cosine_empty_or_zero_magnitude_is_zero() {
        let empty = HashMap::new();
        let a = vec_of(&[(Uuid::new_v4(), 1.0)]);
        let zeroes = vec_of(&[(Uuid::new_v4(), 0.0)]);
        assert_eq!(cosine_similarity(&empty, &a), 0.0);
        assert_eq!(cosine_similarity(&a, &zeroes), 0.0);
    }

    #[test]
    fn pearson_needs_two_common_keys() {
        let shared = Uuid::new_v4();
        let a = vec_of(&[(shared, 5.0), (Uuid::new_v4(), 3.0)]);
        let b = vec_of(&[(shared, 4.0), (Uuid::new_v4(), 2.0)]);
        assert_eq!(pearson_correlation(&a, &b), 0.0);
    }

    #[test]
    fn pearson_perfect_positive_and_negative() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let p3 = Uuid::new_v4();
        let a = vec_of(&[(p1, 1.0), (p2, 3.0), (p3, 5.0)]);
        let b = vec_of(&[(p1, 2.0), (p2, 4.0), (p3, 6.0)]);
        assert!((pearson_correlation(&a, &b) - 1.0).abs() < 1e-9);

        let c = vec_of(&[(p1, 5.0), (p2, 3.0), (p3, 1.0)]);
        assert!((pearson_correlation(&a, &c) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn pearson_zero_variance_is_zero() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let flat = vec_of(&[(p1, 3.0), (p2, 3.0)]);
        let varied = vec_of(&[(p1, 1.0), (p2, 5.0)]);
        assert_eq!(pearson_correlation(&flat, &varied), 0.0);
    }

    #[test]
    fn jaccard_edge_cases() {
        let empty: HashSet<Uuid> = HashSet::new();
        let mut s = HashSet::new();
        s.insert(Uuid::new_v4());

        assert_eq!(jaccard_similarity(&empty, &empty), 1.0);
        assert_eq!(jaccard_similarity(&s, &empty), 0.0);
        assert_eq!(jaccard_similarity(&s, &s), 1.0);
    }

    #[test]
    fn normalize_maps_to_unit_range() {
        let scores = vec_of(&[
            (Uuid::new_v4(), 2.0),
            (Uuid::new_v4(), 8.0),
            (Uuid::new_v4(), 5.0),
        ]);
        let normalized = normalize_scores(&scores);
        for v in normalized.values() {
            assert!((0.0..=1.0).contains(v));
        }
        assert!(normalized.values().any(|&v| v == 0.0));
        assert!(normalized.values().any(|&v| v == 1.0));
    }

    #[test]
    fn normalize_all_equal_yields_half() {
        let scores = vec_of(&[(Uuid::new_v4(), 7.0), (Uuid::new_v4(), 7.0)]);
        let normalized = normalize_scores(&scores);
        assert!(normalized.values().all(|&v| v == 0.5));
    }

    #[test]
    fn top_n_truncates_sorts_and_is_idempotent() {
        let scores = vec_of(&[
            (Uuid::new_v4(), 0.1),
            (Uuid::new_v4(), 0.9),
            (Uuid::new_v4(), 0.5),
            (Uuid::new_v4(), 0.3),
        ]);
        let top = top_n(&scores, 2);
        assert_eq!(top.len(), 2);
        assert!(scores[&top[0]] >= scores[&top[1]]);

        let subset: HashMap<Uuid, f64> = top.iter().map(|id| (*id, scores[id])).collect();
        assert_eq!(top_n(&subset, 2), top);
    }

    #[test]
    fn top_n_ties_break_by_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let scores = vec_of(&[(a, 1.0), (b, 1.0)]);
        let expected = if a < b { vec![a, b] } else { vec![b, a] };
        assert_eq!(top_n(&scores, 2), expected);
    }
}
