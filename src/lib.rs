//! Pharmacy storefront
//!
//! Catalog and order management behind a JSON API.
//!
//! ## Features
//! - Products, categories and manufacturers with title-derived slugs
//! - Per-user product ratings and moderated comments
//! - Pharmacies with opening hours and stocked products
//! - Orders built from cart positions, with delivery and payment checkout rules
//! - Staff list views with filters

pub mod admin;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;

pub use error::{Result, StoreError};
