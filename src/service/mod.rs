//! Business operations over a [`CatalogStore`](crate::store::CatalogStore) or
//! [`OrderStore`](crate::store::OrderStore).

mod catalog;
pub mod input;
mod orders;

pub use catalog::{CatalogService, CategoryDetails, CommentDetails, ProductDetails};
pub use orders::{OrderDetails, OrderService};

use serde::{Deserialize, Serialize};

/// Authenticated caller as resolved by the upstream auth layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    /// Key under which the caller's product scores are stored.
    pub user_slug: String,
}
