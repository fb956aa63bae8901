//! Value Objects for the storefront

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// URL-safe identifier derived from a title.
///
/// Decomposes the title (NFKD) and drops what is left outside ASCII, so
/// accented Latin letters keep their base letter. Then lowercases, keeps
/// digits, `_` and `-`, turns runs of whitespace and hyphens into a single `-`
/// and drops every other character. Leading and trailing `-`/`_` are stripped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let slug = slugify(title);
        if slug.is_empty() { return Err(SlugError::Empty(title.to_string())); }
        Ok(Self(slug))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut separator = false;
    for c in value.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if separator && !slug.is_empty() { slug.push('-'); }
            separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            separator = true;
        }
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[derive(Debug, Clone)] pub enum SlugError { Empty(String) }
impl std::error::Error for SlugError {}
impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty(title) => write!(f, "Title '{}' does not produce a usable slug", title) }
    }
}

/// Postal index used for door delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostIndex(String);

impl PostIndex {
    pub const MAX_LEN: usize = 6;

    pub fn new(value: impl Into<String>) -> Result<Self, PostIndexError> {
        let value = value.into().trim().to_string();
        if value.chars().count() > Self::MAX_LEN { return Err(PostIndexError::TooLong); }
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) { return Err(PostIndexError::NotNumeric); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PostIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PostIndexError { TooLong, NotNumeric }
impl std::error::Error for PostIndexError {}
impl fmt::Display for PostIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => write!(f, "Post index should not be longer than {} symbols.", PostIndex::MAX_LEN),
            Self::NotNumeric => write!(f, "Post index should contain digits only."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Vitamin C 500mg"), "vitamin-c-500mg");
        assert_eq!(slugify("  Hello,  World!  "), "hello-world");
        assert_eq!(slugify("Cold -- & -- Flu"), "cold-flu");
        assert_eq!(slugify("_private_"), "private");
        assert_eq!(slugify("snake_case title"), "snake_case-title");
    }

    #[test]
    fn test_slugify_keeps_base_letters_of_accented_titles() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
        assert_eq!(slugify("Crème brûlée 250ml"), "creme-brulee-250ml");
        assert_eq!(slugify("Ａｓｐｉｒｉｎ"), "aspirin");
        assert!(Slug::from_title("Ибупрофен").is_err());
    }

    #[test]
    fn test_slug_is_idempotent() {
        let once = slugify("Omega 3 Fish Oil");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn test_empty_slug_rejected() {
        assert!(Slug::from_title("!!!").is_err());
        assert!(Slug::from_title("   ").is_err());
        assert_eq!(Slug::from_title("Aspirin").unwrap().as_str(), "aspirin");
    }

    #[test]
    fn test_post_index() {
        assert_eq!(PostIndex::new("12345").unwrap().as_str(), "12345");
        assert_eq!(PostIndex::new("123456").unwrap().as_str(), "123456");
        assert_eq!(PostIndex::new("1234567"), Err(PostIndexError::TooLong));
        assert_eq!(PostIndex::new("12a4"), Err(PostIndexError::NotNumeric));
    }
}
