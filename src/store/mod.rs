//! Persistence boundary.
//!
//! Every write goes through [`BeforeSave`](crate::domain::aggregates::BeforeSave)
//! so derived fields (slugs, order keys) are recomputed on each insert and update.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::domain::aggregates::{
    Category, Comment, Manufacturer, ModerationOutcome, Order, Pharmacy, Position, Product, Rating,
};
use crate::Result;

/// Product list filters. `category` and `brand` match exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub brand: Option<String>,
    pub in_stock: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category_id.map_or(true, |id| product.category_id == id)
            && self.brand.as_deref().map_or(true, |b| product.brand == b)
            && self.in_stock.map_or(true, |s| product.is_in_stock() == s)
    }
}

/// Product write plus the shared rows a nested update rewrites. The store
/// applies all of it or none of it.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductUpdate {
    pub product: Product,
    pub category: Option<Category>,
    pub manufacturer: Option<Manufacturer>,
}

impl From<Product> for ProductUpdate {
    fn from(product: Product) -> Self { Self { product, category: None, manufacturer: None } }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub product_id: Option<i64>,
    pub checked: Option<bool>,
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.product_id.map_or(true, |id| comment.product_id == id)
            && self.checked.map_or(true, |c| comment.checked == c)
    }
}

/// Catalog tables: categories, manufacturers, products, ratings, pharmacies, comments.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn category_by_id(&self, id: i64) -> Result<Option<Category>>;
    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    /// Exact match on the writable fields.
    async fn find_category(&self, title: &str) -> Result<Option<Category>>;
    async fn insert_category(&self, category: Category) -> Result<Category>;
    async fn update_category(&self, category: Category) -> Result<Category>;

    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>>;
    async fn manufacturer_by_id(&self, id: i64) -> Result<Option<Manufacturer>>;
    async fn find_manufacturer(&self, name: &str, country: &str, info: &str) -> Result<Option<Manufacturer>>;
    async fn insert_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer>;
    async fn update_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer>;

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;
    async fn product_by_id(&self, id: i64) -> Result<Option<Product>>;
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>>;
    async fn insert_product(&self, product: Product) -> Result<Product>;
    async fn update_product(&self, update: ProductUpdate) -> Result<Product>;
    async fn delete_product(&self, id: i64) -> Result<bool>;

    async fn list_ratings(&self) -> Result<Vec<Rating>>;
    async fn rating_for_product(&self, product_id: i64) -> Result<Option<Rating>>;
    /// Inserts or replaces the rating of `rating.product_id`.
    async fn save_rating(&self, rating: Rating) -> Result<Rating>;

    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>>;
    async fn pharmacy_by_id(&self, id: i64) -> Result<Option<Pharmacy>>;
    async fn insert_pharmacy(&self, pharmacy: Pharmacy, product_ids: &[i64]) -> Result<Pharmacy>;
    async fn pharmacy_products(&self, pharmacy_id: i64) -> Result<Vec<Product>>;

    async fn list_comments(&self, filter: CommentFilter) -> Result<Vec<Comment>>;
    async fn comment_by_id(&self, id: i64) -> Result<Option<Comment>>;
    async fn insert_comment(&self, comment: Comment) -> Result<Comment>;
    async fn delete_comment(&self, id: i64) -> Result<bool>;
    /// Marks `approved_ids` checked, then deletes every comment still unchecked.
    async fn moderate_comments(&self, approved_ids: &[i64]) -> Result<ModerationOutcome>;
}

/// Orders plus read access to cart positions.
#[async_trait]
pub trait OrderStore: CatalogStore {
    async fn positions_by_ids(&self, ids: &[i64]) -> Result<Vec<Position>>;

    async fn list_orders(&self, customer_id: Option<i64>) -> Result<Vec<Order>>;
    async fn order_by_id(&self, id: i64) -> Result<Option<Order>>;
    async fn insert_order(&self, order: Order) -> Result<Order>;
    async fn update_order(&self, order: Order) -> Result<Order>;
}
