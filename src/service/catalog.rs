use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use super::input::{
    CategoryInput, CommentInput, ManufacturerInput, ModerationInput, PharmacyInput, ProductInput, ProductPatch,
    RatingInput,
};
use super::Customer;
use crate::domain::aggregates::{Category, Comment, Manufacturer, ModerationOutcome, Pharmacy, Product, Rating};
use crate::error::StoreError;
use crate::store::{CatalogStore, CommentFilter, ProductFilter, ProductUpdate};
use crate::Result;

/// Category with its parent resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryDetails {
    pub category: Category,
    pub parent: Option<Category>,
}

impl CategoryDetails {
    pub fn parent_title(&self) -> Option<&str> { self.parent.as_ref().map(|p| p.title.as_str()) }
}

/// Product with its category and manufacturer rows attached.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductDetails {
    pub product: Product,
    pub category: CategoryDetails,
    pub manufacturer: Manufacturer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommentDetails {
    pub comment: Comment,
    pub product_title: String,
}

struct References {
    categories: HashMap<i64, Category>,
    manufacturers: HashMap<i64, Manufacturer>,
}

impl References {
    fn category(&self, id: i64) -> Result<CategoryDetails> {
        let category = self.categories.get(&id).cloned().ok_or_else(|| StoreError::not_found("Category", id))?;
        let parent = category.parent_id.and_then(|p| self.categories.get(&p).cloned());
        Ok(CategoryDetails { category, parent })
    }

    fn product(&self, product: Product) -> Result<ProductDetails> {
        let category = self.category(product.category_id)?;
        let manufacturer = self
            .manufacturers
            .get(&product.manufacturer_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Manufacturer", product.manufacturer_id))?;
        Ok(ProductDetails { product, category, manufacturer })
    }
}

fn not_logged_in() -> StoreError { StoreError::Validation("User is not logged in".into()) }

/// Catalog operations: categories, manufacturers, products, ratings, pharmacies, comments.
pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S> Clone for CatalogService<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }

    async fn references(&self) -> Result<References> {
        let categories = self.store.list_categories().await?.into_iter().map(|c| (c.id, c)).collect();
        let manufacturers = self.store.list_manufacturers().await?.into_iter().map(|m| (m.id, m)).collect();
        Ok(References { categories, manufacturers })
    }

    async fn product(&self, slug: &str) -> Result<Product> {
        self.store.product_by_slug(slug).await?.ok_or_else(|| StoreError::not_found("Product", slug))
    }

    async fn category(&self, slug: &str) -> Result<Category> {
        self.store.category_by_slug(slug).await?.ok_or_else(|| StoreError::not_found("Category", slug))
    }

    async fn manufacturer(&self, id: i64) -> Result<Manufacturer> {
        self.store.manufacturer_by_id(id).await?.ok_or_else(|| StoreError::not_found("Manufacturer", id))
    }

    async fn category_details(&self, category: Category) -> Result<CategoryDetails> {
        let parent = match category.parent_id {
            Some(id) => self.store.category_by_id(id).await?,
            None => None,
        };
        Ok(CategoryDetails { category, parent })
    }

    async fn details(&self, product: Product) -> Result<ProductDetails> {
        let category = self
            .store
            .category_by_id(product.category_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Category", product.category_id))?;
        let category = self.category_details(category).await?;
        let manufacturer = self.manufacturer(product.manufacturer_id).await?;
        Ok(ProductDetails { product, category, manufacturer })
    }

    async fn resolve_parent(&self, parent: Option<&str>) -> Result<Option<Category>> {
        let Some(slug) = parent else { return Ok(None) };
        match self.store.category_by_slug(slug).await? {
            Some(category) => Ok(Some(category)),
            None => Err(StoreError::Validation(format!("Parent category '{slug}' does not exist"))),
        }
    }

    async fn parent_links(&self) -> Result<HashMap<i64, Option<i64>>> {
        Ok(self.store.list_categories().await?.into_iter().map(|c| (c.id, c.parent_id)).collect())
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryDetails>> {
        let categories = self.store.list_categories().await?;
        let by_id: HashMap<i64, Category> = categories.iter().map(|c| (c.id, c.clone())).collect();
        Ok(categories
            .into_iter()
            .map(|category| {
                let parent = category.parent_id.and_then(|id| by_id.get(&id).cloned());
                CategoryDetails { category, parent }
            })
            .collect())
    }

    pub async fn get_category(&self, slug: &str) -> Result<CategoryDetails> {
        let category = self.category(slug).await?;
        self.category_details(category).await
    }

    pub async fn create_category(&self, input: CategoryInput) -> Result<CategoryDetails> {
        input.validate()?;
        let parent = self.resolve_parent(input.parent.as_deref()).await?;
        let category = Category::new(input.title, parent.as_ref().map(|p| p.id));
        let category = self.store.insert_category(category).await?;
        tracing::info!(category_id = category.id, slug = %category.slug, "category created");
        Ok(CategoryDetails { category, parent })
    }

    /// Replaces title and parent. The slug follows the new title.
    pub async fn update_category(&self, slug: &str, input: CategoryInput) -> Result<CategoryDetails> {
        input.validate()?;
        let mut category = self.category(slug).await?;
        let parent = self.resolve_parent(input.parent.as_deref()).await?;
        category.title = input.title;
        category.set_parent(parent.as_ref(), &self.parent_links().await?)?;
        let category = self.store.update_category(category).await?;
        tracing::info!(category_id = category.id, slug = %category.slug, "category updated");
        Ok(CategoryDetails { category, parent })
    }

    pub async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> { self.store.list_manufacturers().await }

    pub async fn get_manufacturer(&self, id: i64) -> Result<Manufacturer> { self.manufacturer(id).await }

    pub async fn create_manufacturer(&self, input: ManufacturerInput) -> Result<Manufacturer> {
        input.validate()?;
        let manufacturer = self
            .store
            .insert_manufacturer(Manufacturer::new(input.name, input.country, input.info))
            .await?;
        tracing::info!(manufacturer_id = manufacturer.id, "manufacturer created");
        Ok(manufacturer)
    }

    pub async fn update_manufacturer(&self, id: i64, input: ManufacturerInput) -> Result<Manufacturer> {
        input.validate()?;
        let mut manufacturer = self.manufacturer(id).await?;
        manufacturer.name = input.name;
        manufacturer.country = input.country;
        manufacturer.info = input.info;
        let manufacturer = self.store.update_manufacturer(manufacturer).await?;
        tracing::info!(manufacturer_id = manufacturer.id, "manufacturer updated");
        Ok(manufacturer)
    }

    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<ProductDetails>> {
        let products = self.store.list_products(filter).await?;
        let references = self.references().await?;
        products.into_iter().map(|p| references.product(p)).collect()
    }

    pub async fn get_product(&self, slug: &str) -> Result<ProductDetails> {
        let product = self.product(slug).await?;
        self.details(product).await
    }

    async fn match_category(&self, input: &CategoryInput) -> Result<Category> {
        let category = self
            .store
            .find_category(&input.title)
            .await?
            .ok_or_else(|| StoreError::Validation(format!("Category '{}' does not exist", input.title)))?;
        if input.parent.is_some() {
            let parent_id = self.resolve_parent(input.parent.as_deref()).await?.map(|p| p.id);
            if category.parent_id != parent_id {
                return Err(StoreError::Validation(format!(
                    "Category '{}' does not exist under the given parent",
                    input.title
                )));
            }
        }
        Ok(category)
    }

    async fn match_manufacturer(&self, input: &ManufacturerInput) -> Result<Manufacturer> {
        self.store
            .find_manufacturer(&input.name, &input.country, &input.info)
            .await?
            .ok_or_else(|| StoreError::Validation(format!("Manufacturer '{}' does not exist", input.name)))
    }

    /// Creates a product, resolving the nested category and manufacturer to
    /// existing rows. Nothing is created implicitly.
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductDetails> {
        input.validate()?;
        let category = self.match_category(&input.category).await?;
        let manufacturer = self.match_manufacturer(&input.manufacturer).await?;
        let product = Product {
            id: 0,
            title: input.title,
            slug: String::new(),
            category_id: category.id,
            price: input.price,
            brand: input.brand,
            manufacturer_id: manufacturer.id,
            expiration_date: input.expiration_date,
            addition_date: Utc::now().date_naive(),
            barcode: input.barcode,
            amount: input.amount,
            info: input.info,
        };
        let product = self.store.insert_product(product).await?;
        tracing::info!(product_id = product.id, slug = %product.slug, "product created");
        self.details(product).await
    }

    /// Nested payloads rewrite the referenced category and manufacturer rows
    /// in place, so every product sharing them sees the change. The product and
    /// both rows are written together or not at all.
    pub async fn update_product(&self, slug: &str, patch: ProductPatch) -> Result<ProductDetails> {
        patch.validate()?;
        let mut product = self.product(slug).await?;

        let category = match patch.category {
            Some(input) => {
                let mut category = self
                    .store
                    .category_by_id(product.category_id)
                    .await?
                    .ok_or_else(|| StoreError::not_found("Category", product.category_id))?;
                category.title = input.title;
                if input.parent.is_some() {
                    let parent = self.resolve_parent(input.parent.as_deref()).await?;
                    category.set_parent(parent.as_ref(), &self.parent_links().await?)?;
                }
                Some(category)
            }
            None => None,
        };

        let manufacturer = match patch.manufacturer {
            Some(input) => {
                let mut manufacturer = self.manufacturer(product.manufacturer_id).await?;
                manufacturer.name = input.name;
                manufacturer.country = input.country;
                manufacturer.info = input.info;
                Some(manufacturer)
            }
            None => None,
        };

        if let Some(title) = patch.title {
            product.title = title;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(brand) = patch.brand {
            product.brand = brand;
        }
        if let Some(expiration_date) = patch.expiration_date {
            product.expiration_date = expiration_date;
        }
        if let Some(barcode) = patch.barcode {
            product.barcode = barcode;
        }
        if let Some(amount) = patch.amount {
            product.amount = amount;
        }
        if let Some(info) = patch.info {
            product.info = info;
        }

        let rewrites_category = category.is_some();
        let rewrites_manufacturer = manufacturer.is_some();
        let product = self.store.update_product(ProductUpdate { product, category, manufacturer }).await?;
        tracing::info!(
            product_id = product.id,
            slug = %product.slug,
            category = rewrites_category,
            manufacturer = rewrites_manufacturer,
            "product updated"
        );
        self.details(product).await
    }

    pub async fn delete_product(&self, slug: &str) -> Result<()> {
        let product = self.product(slug).await?;
        if !self.store.delete_product(product.id).await? {
            return Err(StoreError::not_found("Product", slug));
        }
        tracing::info!(product_id = product.id, "product deleted");
        Ok(())
    }

    /// The product's rating; an empty one if nobody has rated it yet.
    pub async fn get_rating(&self, slug: &str) -> Result<Rating> {
        let product = self.product(slug).await?;
        Ok(self
            .store
            .rating_for_product(product.id)
            .await?
            .unwrap_or_else(|| Rating::for_product(product.id, &product.slug)))
    }

    pub async fn rate_product(&self, slug: &str, customer: Option<&Customer>, input: RatingInput) -> Result<Rating> {
        input.validate()?;
        let customer = customer.ok_or_else(not_logged_in)?;
        let product = self.product(slug).await?;
        let mut rating = self
            .store
            .rating_for_product(product.id)
            .await?
            .unwrap_or_else(|| Rating::for_product(product.id, &product.slug));
        rating.slug = Some(product.slug);
        rating.rate(&customer.user_slug, input.new_value);
        let rating = self.store.save_rating(rating).await?;
        tracing::info!(product_id = product.id, user = %customer.user_slug, score = input.new_value, "product rated");
        Ok(rating)
    }

    pub async fn list_pharmacies(&self) -> Result<Vec<Pharmacy>> { self.store.list_pharmacies().await }

    pub async fn get_pharmacy(&self, id: i64) -> Result<Pharmacy> {
        self.store.pharmacy_by_id(id).await?.ok_or_else(|| StoreError::not_found("Pharmacy", id))
    }

    pub async fn create_pharmacy(&self, input: PharmacyInput) -> Result<Pharmacy> {
        input.validate()?;
        for id in &input.products {
            if self.store.product_by_id(*id).await?.is_none() {
                return Err(StoreError::Validation(format!("Product '{id}' does not exist")));
            }
        }
        let pharmacy = Pharmacy {
            id: 0,
            address: input.address,
            opened_at: input.opened_at,
            closed_at: input.closed_at,
            number: input.number,
        };
        let pharmacy = self.store.insert_pharmacy(pharmacy, &input.products).await?;
        tracing::info!(pharmacy_id = pharmacy.id, products = input.products.len(), "pharmacy created");
        Ok(pharmacy)
    }

    pub async fn pharmacy_products(&self, id: i64) -> Result<Vec<ProductDetails>> {
        let pharmacy = self.get_pharmacy(id).await?;
        let products = self.store.pharmacy_products(pharmacy.id).await?;
        let references = self.references().await?;
        products.into_iter().map(|p| references.product(p)).collect()
    }

    /// Approved comments only.
    pub async fn product_comments(&self, slug: &str) -> Result<Vec<CommentDetails>> {
        let product = self.product(slug).await?;
        let filter = CommentFilter { product_id: Some(product.id), checked: Some(true) };
        let comments = self.store.list_comments(filter).await?;
        Ok(comments
            .into_iter()
            .map(|comment| CommentDetails { comment, product_title: product.title.clone() })
            .collect())
    }

    pub async fn add_comment(
        &self,
        slug: &str,
        customer: Option<&Customer>,
        input: CommentInput,
    ) -> Result<CommentDetails> {
        input.validate()?;
        let product = self.product(slug).await?;
        let customer = customer.ok_or_else(not_logged_in)?;
        let comment = Comment::new(product.id, customer.id, customer.user_slug.as_str(), input.comment_field);
        let comment = self.store.insert_comment(comment).await?;
        tracing::info!(comment_id = comment.id, product_id = product.id, customer_id = customer.id, "comment added");
        Ok(CommentDetails { comment, product_title: product.title })
    }

    pub async fn remove_comment(&self, slug: &str, id: i64, customer: Option<&Customer>) -> Result<()> {
        let customer = customer.ok_or_else(|| StoreError::Unauthorized("User is not logged in".into()))?;
        let product = self.product(slug).await?;
        let comment = self
            .store
            .comment_by_id(id)
            .await?
            .filter(|c| c.product_id == product.id)
            .ok_or_else(|| StoreError::not_found("Comment", id))?;
        if !comment.is_written_by(customer.id) {
            return Err(StoreError::Forbidden("Only the author can remove this comment".into()));
        }
        self.store.delete_comment(comment.id).await?;
        tracing::info!(comment_id = comment.id, customer_id = customer.id, "comment removed");
        Ok(())
    }

    /// Comments awaiting moderation, across all products.
    pub async fn pending_comments(&self) -> Result<Vec<CommentDetails>> {
        let comments = self.store.list_comments(CommentFilter { product_id: None, checked: Some(false) }).await?;
        let mut titles: HashMap<i64, String> = HashMap::new();
        let mut details = Vec::with_capacity(comments.len());
        for comment in comments {
            if !titles.contains_key(&comment.product_id) {
                let title = self.store.product_by_id(comment.product_id).await?.map(|p| p.title).unwrap_or_default();
                titles.insert(comment.product_id, title);
            }
            let product_title = titles.get(&comment.product_id).cloned().unwrap_or_default();
            details.push(CommentDetails { comment, product_title });
        }
        Ok(details)
    }

    /// Approves the listed comments and deletes every other unchecked one.
    pub async fn moderate_comments(&self, input: ModerationInput) -> Result<ModerationOutcome> {
        input.validate()?;
        let outcome = self.store.moderate_comments(&input.comments_ids).await?;
        tracing::info!(approved = outcome.approved.len(), "comments moderated");
        if !outcome.deleted.is_empty() {
            tracing::warn!(deleted = ?outcome.deleted, "unapproved comments deleted");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    pub(crate) async fn seeded() -> (Arc<MemoryStore>, CatalogService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = CatalogService::new(Arc::clone(&store));
        service
            .create_category(CategoryInput { title: "Pain Relief".into(), parent: None })
            .await
            .unwrap();
        service
            .create_manufacturer(ManufacturerInput { name: "Bayer AG".into(), country: "Germany".into(), info: String::new() })
            .await
            .unwrap();
        (store, service)
    }

    pub(crate) fn aspirin(amount: i32) -> ProductInput {
        ProductInput {
            title: "Aspirin".into(),
            category: CategoryInput { title: "Pain Relief".into(), parent: None },
            price: Decimal::new(1999, 2),
            brand: "Bayer".into(),
            manufacturer: ManufacturerInput { name: "Bayer AG".into(), country: "Germany".into(), info: String::new() },
            expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            barcode: "4600000000001".into(),
            amount,
            info: String::new(),
        }
    }

    fn alice() -> Customer { Customer { id: 7, user_slug: "alice".into() } }

    #[tokio::test]
    async fn test_nested_create_resolves_existing_rows() {
        let (_, service) = seeded().await;
        let details = service.create_product(aspirin(10)).await.unwrap();
        assert_eq!(details.product.slug, "aspirin");
        assert_eq!(details.category.category.title, "Pain Relief");
        assert_eq!(details.manufacturer.country, "Germany");
        assert!(details.product.is_in_stock());
    }

    #[tokio::test]
    async fn test_nested_create_without_match_fails() {
        let (_, service) = seeded().await;
        let mut input = aspirin(10);
        input.manufacturer.country = "France".into();
        let err = service.create_product(input).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let mut input = aspirin(10);
        input.category.title = "Vitamins".into();
        assert!(matches!(service.create_product(input).await.unwrap_err(), StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_nested_update_rewrites_references_and_reslugs() {
        let (_, service) = seeded().await;
        service.create_product(aspirin(10)).await.unwrap();
        let patch = ProductPatch {
            title: Some("Aspirin Cardio".into()),
            category: Some(CategoryInput { title: "Heart Care".into(), parent: None }),
            manufacturer: Some(ManufacturerInput {
                name: "Bayer AG".into(),
                country: "Germany".into(),
                info: "Leverkusen".into(),
            }),
            amount: Some(0),
            ..Default::default()
        };
        let details = service.update_product("aspirin", patch).await.unwrap();
        assert_eq!(details.product.slug, "aspirin-cardio");
        assert_eq!(details.category.category.slug, "heart-care");
        assert_eq!(details.manufacturer.info, "Leverkusen");
        assert!(!details.product.is_in_stock());
        assert!(service.get_product("aspirin").await.is_err());
        assert!(service.get_category("heart-care").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_nested_update_changes_nothing() {
        let (store, service) = seeded().await;
        service.create_product(aspirin(10)).await.unwrap();
        let mut ibuprofen = aspirin(5);
        ibuprofen.title = "Ibuprofen".into();
        service.create_product(ibuprofen).await.unwrap();

        let patch = ProductPatch {
            title: Some("Ibuprofen".into()),
            category: Some(CategoryInput { title: "Heart Care".into(), parent: None }),
            manufacturer: Some(ManufacturerInput {
                name: "Renamed".into(),
                country: "Germany".into(),
                info: String::new(),
            }),
            ..Default::default()
        };
        let err = service.update_product("aspirin", patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert!(service.get_category("heart-care").await.is_err());
        let details = service.get_product("aspirin").await.unwrap();
        assert_eq!(details.category.category.title, "Pain Relief");
        assert_eq!(details.manufacturer.name, "Bayer AG");
        let manufacturers = store.list_manufacturers().await.unwrap();
        assert!(manufacturers.iter().all(|m| m.name == "Bayer AG"));
    }

    #[tokio::test]
    async fn test_category_cannot_move_under_its_subcategory() {
        let (_, service) = seeded().await;
        service
            .create_category(CategoryInput { title: "Headache".into(), parent: Some("pain-relief".into()) })
            .await
            .unwrap();
        let looped = CategoryInput { title: "Pain Relief".into(), parent: Some("headache".into()) };
        let err = service.update_category("pain-relief", looped).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(!service.get_category("pain-relief").await.unwrap().category.is_subcategory());

        let renamed = CategoryInput { title: "Migraine".into(), parent: Some("pain-relief".into()) };
        let moved = service.update_category("headache", renamed).await.unwrap();
        assert_eq!(moved.parent_title(), Some("Pain Relief"));
    }

    #[tokio::test]
    async fn test_subcategory_parent_title() {
        let (_, service) = seeded().await;
        let child = service
            .create_category(CategoryInput { title: "Headache".into(), parent: Some("pain-relief".into()) })
            .await
            .unwrap();
        assert!(child.category.is_subcategory());
        assert_eq!(child.parent_title(), Some("Pain Relief"));

        let missing = CategoryInput { title: "Migraine".into(), parent: Some("nope".into()) };
        assert!(matches!(service.create_category(missing).await.unwrap_err(), StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rating_upsert_per_user() {
        let (_, service) = seeded().await;
        service.create_product(aspirin(10)).await.unwrap();
        assert_eq!(service.get_rating("aspirin").await.unwrap().average_rating(), None);

        let bob = Customer { id: 8, user_slug: "bob".into() };
        service.rate_product("aspirin", Some(&alice()), RatingInput { new_value: 5 }).await.unwrap();
        service.rate_product("aspirin", Some(&bob), RatingInput { new_value: 2 }).await.unwrap();
        let rating = service.rate_product("aspirin", Some(&bob), RatingInput { new_value: 4 }).await.unwrap();
        assert_eq!(rating.average_rating(), Some(4.5));
        assert_eq!(rating.slug.as_deref(), Some("aspirin"));

        let err = service.rate_product("aspirin", None, RatingInput { new_value: 1 }).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_comments_need_customer_and_moderation() {
        let (_, service) = seeded().await;
        service.create_product(aspirin(10)).await.unwrap();
        let input = CommentInput { comment_field: "Works".into() };

        let err = service.add_comment("aspirin", None, input.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "User is not logged in");
        let err = service.add_comment("ghost", Some(&alice()), input.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let first = service.add_comment("aspirin", Some(&alice()), input.clone()).await.unwrap();
        let second = service.add_comment("aspirin", Some(&alice()), input).await.unwrap();
        assert_eq!(first.comment.commenters_name(), Some("alice"));
        assert!(service.product_comments("aspirin").await.unwrap().is_empty());
        assert_eq!(service.pending_comments().await.unwrap()[0].product_title, "Aspirin");

        let outcome = service
            .moderate_comments(ModerationInput { comments_ids: vec![first.comment.id] })
            .await
            .unwrap();
        assert_eq!(outcome.deleted, vec![second.comment.id]);
        let visible = service.product_comments("aspirin").await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].comment.id, first.comment.id);
    }

    #[tokio::test]
    async fn test_only_author_removes_comment() {
        let (_, service) = seeded().await;
        service.create_product(aspirin(10)).await.unwrap();
        let created = service
            .add_comment("aspirin", Some(&alice()), CommentInput { comment_field: "ok".into() })
            .await
            .unwrap();
        let mallory = Customer { id: 99, user_slug: "mallory".into() };
        let err = service.remove_comment("aspirin", created.comment.id, Some(&mallory)).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        service.remove_comment("aspirin", created.comment.id, Some(&alice())).await.unwrap();
        assert!(service.pending_comments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pharmacy_products() {
        let (_, service) = seeded().await;
        let product = service.create_product(aspirin(10)).await.unwrap().product;
        let input = PharmacyInput {
            address: "Main St 1".into(),
            number: "+100200300".into(),
            opened_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closed_at: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            products: vec![product.id],
        };
        let pharmacy = service.create_pharmacy(input.clone()).await.unwrap();
        let stocked = service.pharmacy_products(pharmacy.id).await.unwrap();
        assert_eq!(stocked.len(), 1);
        assert_eq!(stocked[0].product.id, product.id);

        let duplicate = service.create_pharmacy(input.clone()).await.unwrap_err();
        assert!(matches!(duplicate, StoreError::Conflict(_)));

        let unknown = PharmacyInput { address: "Side St 2".into(), number: "+1".into(), products: vec![404], ..input };
        assert!(matches!(service.create_pharmacy(unknown).await.unwrap_err(), StoreError::Validation(_)));
    }
}
