use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// A single user action on a product. Append-only; never mutated after the
/// fact. The scoring weight comes from the interaction type, except for
/// explicit ratings which carry their value inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub interaction_type: InteractionType,
    pub value: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub session_id: Option<String>,
}

impl Interaction {
    pub fn new(user_id: Uuid, product_id: Uuid, interaction_type: InteractionType) -> Self {
        Self {
            user_id,
            product_id,
            interaction_type,
            value: None,
            created_at: Utc::now(),
            session_id: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_session(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Weighted score used by every CF accumulation. Ratings use the explicit
    /// value; every other type uses its fixed weight.
    pub fn weighted_score(&self) -> f64 {
        match (self.interaction_type, self.value) {
            (InteractionType::Rating, Some(v)) => v,
            _ => self.interaction_type.weight(),
        }
    }
}

/// Closed set of interaction kinds, each with a fixed scoring weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    View,
    AddToCart,
    Purchase,
    Rating,
    Wishlist,
}

impl InteractionType {
    pub fn weight(&self) -> f64 {
        match self {
            InteractionType::View => 1.0,
            InteractionType::Wishlist => 2.0,
            InteractionType::AddToCart => 3.0,
            InteractionType::Rating => 5.0,
            InteractionType::Purchase => 10.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::View => "view",
            InteractionType::AddToCart => "add_to_cart",
            InteractionType::Purchase => "purchase",
            InteractionType::Rating => "rating",
            InteractionType::Wishlist => "wishlist",
        }
    }

    /// Fallible parse for external string input. Unknown values are rejected,
    /// never coerced to a default.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(InteractionType::View),
            "add_to_cart" => Ok(InteractionType::AddToCart),
            "purchase" => Ok(InteractionType::Purchase),
            "rating" => Ok(InteractionType::Rating),
            "wishlist" => Ok(InteractionType::Wishlist),
            other => Err(Error::UnknownInteractionType(other.to_string())),
        }
    }
}

/// Explicit product rating. At most one row per (user, product); a repeat
/// submission updates in place. User-based CF builds its Pearson vectors from
/// these exclusively, since they share a numeric scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub rating_value: f64,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: Uuid, product_id: Uuid, rating_value: f64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            product_id,
            rating_value,
            review_text: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    Cosine,
    Pearson,
    Jaccard,
}

/// A precomputed pairwise similarity row. The canonical-ordering invariant
/// (`id_a <= id_b`) holds for every stored row; construct through
/// [`SimilarityScore::new`] so the invariant is enforced at the single write
/// path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub id_a: Uuid,
    pub id_b: Uuid,
    pub score: f64,
    pub metric: SimilarityMetric,
    pub computed_at: DateTime<Utc>,
}

impl SimilarityScore {
    pub fn new(a: Uuid, b: Uuid, score: f64, metric: SimilarityMetric) -> Self {
        let (id_a, id_b) = canonical_pair(a, b);
        Self {
            id_a,
            id_b,
            score,
            metric,
            computed_at: Utc::now(),
        }
    }

    /// The other member of the pair, given one of the two ids.
    pub fn counterpart(&self, id: Uuid) -> Uuid {
        if self.id_a == id {
            self.id_b
        } else {
            self.id_a
        }
    }
}

/// Canonical unordered-pair key: lower id first. Every similarity writer goes
/// through this helper so each unordered pair has exactly one row.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Recommendation strategies served by the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    UserBased,
    ItemBased,
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::UserBased, Strategy::ItemBased, Strategy::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::UserBased => "user_based",
            Strategy::ItemBased => "item_based",
            Strategy::Hybrid => "hybrid",
        }
    }

    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user_based" => Ok(Strategy::UserBased),
            "item_based" => Ok(Strategy::ItemBased),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// One cached recommendation row. A full set of rows for (user, strategy) is
/// written and invalidated wholesale; `expires_at` bounds how long the set is
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRecommendation {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub strategy: Strategy,
    pub confidence_score: f64,
    pub generated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedRecommendation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(t) if t < now)
    }
}

/// Catalog view of a product. Owned by the external catalog; the core only
/// reads it (and bumps the two interaction counters through the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub view_count: u64,
    pub purchase_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(product_id: Uuid, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            product_id,
            name: name.into(),
            category: category.into(),
            view_count: 0,
            purchase_count: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Trending rank key: purchases dominate views 10:1.
    pub fn trending_score(&self) -> u64 {
        self.purchase_count * 10 + self.view_count
    }
}

/// Outcome of one batch maintenance task. `compute_all` collects these
/// instead of failing fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub task: String,
    pub success: bool,
    pub detail: String,
    pub duration_ms: u64,
}

impl TaskReport {
    pub fn success(task: impl Into<String>, detail: impl Into<String>, elapsed: std::time::Duration) -> Self {
        Self {
            task: task.into(),
            success: true,
            detail: detail.into(),
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failure(task: impl Into<String>, detail: impl Into<String>, elapsed: std::time::Duration) -> Self {
        Self {
            task: task.into(),
            success: false,
            detail: detail.into(),
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_weights() {
        assert_eq!(InteractionType::View.weight(), 1.0);
        assert_eq!(InteractionType::Wishlist.weight(), 2.0);
        assert_eq!(InteractionType::AddToCart.weight(), 3.0);
        assert_eq!(InteractionType::Rating.weight(), 5.0);
        assert_eq!(InteractionType::Purchase.weight(), 10.0);
    }

    #[test]
    fn rating_value_overrides_type_weight() {
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();
        let rated = Interaction::new(user, product, InteractionType::Rating).with_value(4.0);
        assert_eq!(rated.weighted_score(), 4.0);

        let purchase = Interaction::new(user, product, InteractionType::Purchase).with_value(7.0);
        assert_eq!(purchase.weighted_score(), 10.0);
    }

    #[test]
    fn interaction_type_parse_rejects_unknown() {
        assert!(matches!(
            InteractionType::parse("add_to_cart"),
            Ok(InteractionType::AddToCart)
        ));
        assert!(matches!(
            InteractionType::parse("swipe"),
            Err(Error::UnknownInteractionType(_))
        ));
    }

    #[test]
    fn canonical_pair_orders_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
        let (lo, hi) = canonical_pair(a, b);
        assert!(lo <= hi);
    }

    #[test]
    fn strategy_round_trip() {
        for s in Strategy::ALL {
            assert_eq!(Strategy::parse(s.as_str()).unwrap(), s);
        }
        assert!(Strategy::parse("popular").is_err());
    }
}
