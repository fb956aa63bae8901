use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CatalogStore, CommentFilter, OrderStore, ProductFilter, ProductUpdate};
use crate::domain::aggregates::{
    BeforeSave, Category, Comment, Manufacturer, ModerationOutcome, Order, OrderLine, Pharmacy, Position, Product,
    Rating,
};
use crate::error::StoreError;
use crate::Result;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    manufacturers: BTreeMap<i64, Manufacturer>,
    products: BTreeMap<i64, Product>,
    ratings: BTreeMap<i64, Rating>,
    pharmacies: BTreeMap<i64, Pharmacy>,
    pharmacy_products: BTreeMap<i64, Vec<i64>>,
    comments: BTreeMap<i64, Comment>,
    positions: BTreeMap<i64, Position>,
    orders: BTreeMap<i64, Order>,
    order_positions: BTreeMap<i64, Vec<i64>>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn hydrate(&self, mut order: Order) -> Order {
        let ids = self.order_positions.get(&order.id).map(Vec::as_slice).unwrap_or_default();
        order.lines = ids
            .iter()
            .filter_map(|id| self.positions.get(id))
            .filter_map(|p| {
                let product = self.products.get(&p.product_id)?.clone();
                Some(OrderLine { position_id: p.id, amount: p.amount, product })
            })
            .collect();
        order
    }

    fn check_category_slug(&self, category: &Category) -> Result<()> {
        if self.categories.values().any(|c| c.id != category.id && c.slug == category.slug) {
            return Err(StoreError::Conflict(format!("Category with slug '{}' already exists", category.slug)));
        }
        Ok(())
    }

    fn check_product_slug(&self, product: &Product) -> Result<()> {
        if self.products.values().any(|p| p.id != product.id && p.slug == product.slug) {
            return Err(StoreError::Conflict(format!("Product with slug '{}' already exists", product.slug)));
        }
        Ok(())
    }
}

/// In-process store for development and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Stands in for the cart module, which owns positions.
    pub async fn insert_position(&self, customer_id: i64, product_id: i64, amount: i32) -> Position {
        let mut tables = self.tables.write().await;
        let position = Position { id: tables.next_id(), customer_id, product_id, amount };
        tables.positions.insert(position.id, position.clone());
        position
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn category_by_id(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn find_category(&self, title: &str) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.values().find(|c| c.title == title).cloned())
    }

    async fn insert_category(&self, mut category: Category) -> Result<Category> {
        let mut tables = self.tables.write().await;
        category.before_save()?;
        category.id = 0;
        tables.check_category_slug(&category)?;
        category.id = tables.next_id();
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, mut category: Category) -> Result<Category> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&category.id) {
            return Err(StoreError::not_found("Category", category.id));
        }
        category.before_save()?;
        tables.check_category_slug(&category)?;
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> {
        Ok(self.tables.read().await.manufacturers.values().cloned().collect())
    }

    async fn manufacturer_by_id(&self, id: i64) -> Result<Option<Manufacturer>> {
        Ok(self.tables.read().await.manufacturers.get(&id).cloned())
    }

    async fn find_manufacturer(&self, name: &str, country: &str, info: &str) -> Result<Option<Manufacturer>> {
        let tables = self.tables.read().await;
        Ok(tables.manufacturers.values().find(|m| m.matches(name, country, info)).cloned())
    }

    async fn insert_manufacturer(&self, mut manufacturer: Manufacturer) -> Result<Manufacturer> {
        let mut tables = self.tables.write().await;
        manufacturer.id = tables.next_id();
        tables.manufacturers.insert(manufacturer.id, manufacturer.clone());
        Ok(manufacturer)
    }

    async fn update_manufacturer(&self, manufacturer: Manufacturer) -> Result<Manufacturer> {
        let mut tables = self.tables.write().await;
        match tables.manufacturers.get_mut(&manufacturer.id) {
            Some(slot) => {
                *slot = manufacturer.clone();
                Ok(manufacturer)
            }
            None => Err(StoreError::not_found("Manufacturer", manufacturer.id)),
        }
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables.products.values().filter(|p| filter.matches(p)).cloned().collect();
        products.sort_by(|a, b| a.addition_date.cmp(&b.addition_date).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn product_by_id(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.values().find(|p| p.slug == slug).cloned())
    }

    async fn insert_product(&self, mut product: Product) -> Result<Product> {
        let mut tables = self.tables.write().await;
        product.before_save()?;
        product.id = 0;
        tables.check_product_slug(&product)?;
        product.id = tables.next_id();
        product.addition_date = Utc::now().date_naive();
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, update: ProductUpdate) -> Result<Product> {
        let ProductUpdate { mut product, category, manufacturer } = update;
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&product.id) {
            return Err(StoreError::not_found("Product", product.id));
        }
        product.before_save()?;
        tables.check_product_slug(&product)?;
        let category = match category {
            Some(mut category) => {
                if !tables.categories.contains_key(&category.id) {
                    return Err(StoreError::not_found("Category", category.id));
                }
                category.before_save()?;
                tables.check_category_slug(&category)?;
                Some(category)
            }
            None => None,
        };
        if let Some(manufacturer) = &manufacturer {
            if !tables.manufacturers.contains_key(&manufacturer.id) {
                return Err(StoreError::not_found("Manufacturer", manufacturer.id));
            }
        }

        // Nothing is written until every check above has passed.
        if let Some(category) = category {
            tables.categories.insert(category.id, category);
        }
        if let Some(manufacturer) = manufacturer {
            tables.manufacturers.insert(manufacturer.id, manufacturer);
        }
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.ratings.remove(&id);
        tables.comments.retain(|_, c| c.product_id != id);
        for products in tables.pharmacy_products.values_mut() {
            products.retain(|&p| p != id);
        }
        let dropped: Vec<i64> = tables.positions.values().filter(|p| p.product_id == id).map(|p| p.id).collect();
        tables.positions.retain(|_, p| p.product_id != id);
        for ids in tables.order_positions.values_mut() {
            ids.retain(|p| !dropped.contains(p));
        }
        Ok(true)
    }

    async fn list_ratings(&self) -> Result<Vec<Rating>> {
        Ok(self.tables.read().await.ratings.values().cloned().collect())
    }

    async fn rating_for_product(&self, product_id: i64) -> Result<Option<Rating>> {
        Ok(self.tables.read().await.ratings.get(&product_id).cloned())
    }

    async fn save_rating(&self, mut rating: Rating) -> Result<Rating> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&rating.product_id) {
            return Err(StoreError::not_found("Product", rating.product_id));
        }
        rating.id = match tables.ratings.get(&rating.product_id) {
            Some(existing) => existing.id,
            None => tables.next_id(),
        };
        tables.ratings.insert(rating.product_id, rating.clone());
        Ok(rating)
    }

    async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>> {
        Ok(self.tables.read().await.pharmacies.values().cloned().collect())
    }

    async fn pharmacy_by_id(&self, id: i64) -> Result<Option<Pharmacy>> {
        Ok(self.tables.read().await.pharmacies.get(&id).cloned())
    }

    async fn insert_pharmacy(&self, mut pharmacy: Pharmacy, product_ids: &[i64]) -> Result<Pharmacy> {
        let mut tables = self.tables.write().await;
        if tables.pharmacies.values().any(|p| p.address == pharmacy.address) {
            return Err(StoreError::Conflict(format!("Pharmacy at '{}' already exists", pharmacy.address)));
        }
        if tables.pharmacies.values().any(|p| p.number == pharmacy.number) {
            return Err(StoreError::Conflict(format!("Pharmacy number '{}' is already taken", pharmacy.number)));
        }
        if let Some(missing) = product_ids.iter().find(|id| !tables.products.contains_key(*id)) {
            return Err(StoreError::not_found("Product", missing));
        }
        pharmacy.id = tables.next_id();
        tables.pharmacies.insert(pharmacy.id, pharmacy.clone());
        tables.pharmacy_products.insert(pharmacy.id, product_ids.to_vec());
        Ok(pharmacy)
    }

    async fn pharmacy_products(&self, pharmacy_id: i64) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let ids = tables.pharmacy_products.get(&pharmacy_id).map(Vec::as_slice).unwrap_or_default();
        Ok(ids.iter().filter_map(|id| tables.products.get(id)).cloned().collect())
    }

    async fn list_comments(&self, filter: CommentFilter) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.values().filter(|c| filter.matches(c)).cloned().collect())
    }

    async fn comment_by_id(&self, id: i64) -> Result<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert_comment(&self, mut comment: Comment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&comment.product_id) {
            return Err(StoreError::not_found("Product", comment.product_id));
        }
        comment.id = tables.next_id();
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }

    async fn moderate_comments(&self, approved_ids: &[i64]) -> Result<ModerationOutcome> {
        let mut tables = self.tables.write().await;
        let current: Vec<Comment> = tables.comments.values().cloned().collect();
        let outcome = ModerationOutcome::plan(&current, approved_ids);
        for id in &outcome.approved {
            if let Some(comment) = tables.comments.get_mut(id) {
                comment.checked = true;
            }
        }
        for id in &outcome.deleted {
            tables.comments.remove(id);
        }
        Ok(outcome)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn positions_by_ids(&self, ids: &[i64]) -> Result<Vec<Position>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.positions.get(id)).cloned().collect())
    }

    async fn list_orders(&self, customer_id: Option<i64>) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let orders = tables
            .orders
            .values()
            .filter(|o| customer_id.map_or(true, |c| o.customer_id == c))
            .cloned()
            .map(|o| tables.hydrate(o))
            .collect();
        Ok(orders)
    }

    async fn order_by_id(&self, id: i64) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&id).cloned().map(|o| tables.hydrate(o)))
    }

    async fn insert_order(&self, mut order: Order) -> Result<Order> {
        let mut tables = self.tables.write().await;
        order.before_save()?;
        order.id = tables.next_id();
        let position_ids = order.lines.iter().map(|l| l.position_id).collect();
        tables.order_positions.insert(order.id, position_ids);
        let mut stored = order.clone();
        stored.lines.clear();
        tables.orders.insert(order.id, stored);
        Ok(tables.hydrate(order))
    }

    async fn update_order(&self, mut order: Order) -> Result<Order> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&order.id) {
            return Err(StoreError::not_found("Order", order.id));
        }
        order.before_save()?;
        let mut stored = order.clone();
        stored.lines.clear();
        tables.orders.insert(order.id, stored);
        Ok(tables.hydrate(order))
    }
}
