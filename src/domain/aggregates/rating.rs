use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-product rating: one score per user, keyed by the user's slug.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub product_id: i64,
    pub rating_set: BTreeMap<String, i32>,
    pub slug: Option<String>,
}

impl Rating {
    pub fn for_product(product_id: i64, product_slug: &str) -> Self {
        Self { id: 0, product_id, rating_set: BTreeMap::new(), slug: Some(product_slug.to_string()) }
    }

    /// Inserts or replaces the user's score.
    pub fn rate(&mut self, user: &str, score: i32) {
        self.rating_set.insert(user.to_string(), score);
    }

    pub fn average_rating(&self) -> Option<f64> {
        if self.rating_set.is_empty() { return None; }
        let sum: i64 = self.rating_set.values().map(|&v| i64::from(v)).sum();
        Some(sum as f64 / self.rating_set.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_undefined_when_empty() {
        assert_eq!(Rating::for_product(1, "aspirin").average_rating(), None);
    }

    #[test]
    fn test_average_and_upsert() {
        let mut r = Rating::for_product(1, "aspirin");
        r.rate("alice", 5);
        r.rate("bob", 2);
        assert_eq!(r.average_rating(), Some(3.5));
        r.rate("bob", 4);
        assert_eq!(r.rating_set.len(), 2);
        assert_eq!(r.average_rating(), Some(4.5));
    }
}
