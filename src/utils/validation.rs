use uuid::Uuid;

use crate::error::{Error, Result};

pub const MAX_LIMIT: usize = 1000;

/// Reject malformed limits before they reach the engines.
pub fn validate_limit(limit: usize) -> Result<usize> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(Error::InvalidLimit(limit));
    }
    Ok(limit)
}

/// Ratings come in on a 1-5 scale; anything else is a boundary error.
pub fn validate_rating_value(value: f64) -> Result<f64> {
    if !value.is_finite() || !(1.0..=5.0).contains(&value) {
        return Err(Error::InvalidRatingValue(value));
    }
    Ok(value)
}

pub fn validate_uuid_string(uuid_str: &str) -> Result<Uuid> {
    Uuid::parse_str(uuid_str).map_err(|_| Error::InvalidId(uuid_str.to_string()))
}
