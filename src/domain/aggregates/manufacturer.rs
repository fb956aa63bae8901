use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub info: String,
}

impl Manufacturer {
    pub fn new(name: impl Into<String>, country: impl Into<String>, info: impl Into<String>) -> Self {
        Self { id: 0, name: name.into(), country: country.into(), info: info.into() }
    }

    /// Exact match on every writable field.
    pub fn matches(&self, name: &str, country: &str, info: &str) -> bool {
        self.name == name && self.country == country && self.info == info
    }
}
