//! Response representations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{
    Comment, DeliveryMethod, DeliveryStatus, Manufacturer, Order, OrderLine, PaymentMethod, PaymentStatus, Pharmacy,
    Product, Rating,
};
use crate::service::{CategoryDetails, CommentDetails, OrderDetails, ProductDetails};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub title: String,
    pub slug: String,
    pub is_subcategory: bool,
    pub parent_title: Option<String>,
}

impl From<&CategoryDetails> for CategoryView {
    fn from(details: &CategoryDetails) -> Self {
        Self {
            title: details.category.title.clone(),
            slug: details.category.slug.clone(),
            is_subcategory: details.category.is_subcategory(),
            parent_title: details.parent_title().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerView {
    pub name: String,
    pub country: String,
    pub info: String,
}

impl From<Manufacturer> for ManufacturerView {
    fn from(m: Manufacturer) -> Self { Self { name: m.name, country: m.country, info: m.info } }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub category: CategoryView,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub brand: String,
    pub manufacturer: ManufacturerView,
    pub expiration_date: NaiveDate,
    pub addition_date: NaiveDate,
    pub barcode: String,
    pub amount: i32,
    pub info: String,
    pub is_in_stock: bool,
}

impl From<ProductDetails> for ProductView {
    fn from(details: ProductDetails) -> Self {
        let category = CategoryView::from(&details.category);
        let p = details.product;
        Self {
            id: p.id,
            is_in_stock: p.is_in_stock(),
            title: p.title,
            slug: p.slug,
            category,
            price: p.price,
            brand: p.brand,
            manufacturer: details.manufacturer.into(),
            expiration_date: p.expiration_date,
            addition_date: p.addition_date,
            barcode: p.barcode,
            amount: p.amount,
            info: p.info,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleCategoryView {
    pub title: String,
}

/// Short product form used inside order positions and pharmacy listings.
#[derive(Debug, Clone, Serialize)]
pub struct SimpleProductView {
    pub id: i64,
    pub url: String,
    pub slug: String,
    pub title: String,
    pub category: SimpleCategoryView,
    pub brand: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub is_in_stock: bool,
}

impl SimpleProductView {
    pub fn new(product: &Product, category_title: &str, base_url: &str) -> Self {
        Self {
            id: product.id,
            url: product.url(base_url),
            slug: product.slug.clone(),
            title: product.title.clone(),
            category: SimpleCategoryView { title: category_title.to_string() },
            brand: product.brand.clone(),
            price: product.price,
            is_in_stock: product.is_in_stock(),
        }
    }

    pub fn from_details(details: &ProductDetails, base_url: &str) -> Self {
        Self::new(&details.product, &details.category.category.title, base_url)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    pub average_rating: Option<f64>,
}

impl From<&Rating> for RatingView {
    fn from(rating: &Rating) -> Self { Self { average_rating: rating.average_rating() } }
}

#[derive(Debug, Clone, Serialize)]
pub struct PharmacyView {
    pub id: i64,
    pub address: String,
    pub number: String,
    pub opened_at: NaiveTime,
    pub closed_at: NaiveTime,
    pub is_opened: bool,
}

impl From<Pharmacy> for PharmacyView {
    fn from(p: Pharmacy) -> Self {
        Self {
            id: p.id,
            is_opened: p.is_opened(),
            address: p.address,
            number: p.number,
            opened_at: p.opened_at,
            closed_at: p.closed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerCommentView {
    pub id: i64,
    pub product_name: String,
    pub commenters_name: Option<String>,
    pub comment_field: String,
    pub changed_at: DateTime<Utc>,
}

impl From<CommentDetails> for CustomerCommentView {
    fn from(details: CommentDetails) -> Self {
        let Comment { id, commenter, comment_field, changed_at, .. } = details.comment;
        Self { id, product_name: details.product_title, commenters_name: commenter, comment_field, changed_at }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerCommentView {
    pub id: i64,
    pub product_name: String,
    pub commenters_name: Option<String>,
    pub comment_field: String,
}

impl From<CommentDetails> for ManagerCommentView {
    fn from(details: CommentDetails) -> Self {
        let Comment { id, commenter, comment_field, .. } = details.comment;
        Self { id, product_name: details.product_title, commenters_name: commenter, comment_field }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub id: i64,
    pub product: SimpleProductView,
    pub amount: i32,
}

impl PositionView {
    fn new(line: &OrderLine, details: &OrderDetails, base_url: &str) -> Self {
        let category = details.category_title(line.product.category_id).unwrap_or_default();
        Self {
            id: line.position_id,
            product: SimpleProductView::new(&line.product, category, base_url),
            amount: line.amount,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleOrderView {
    pub id: i64,
    pub url: String,
    pub key: Option<String>,
    pub customer_id: i64,
    pub numb_of_positions: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub in_progress: bool,
    pub closed: bool,
}

impl SimpleOrderView {
    pub fn new(order: &Order, base_url: &str) -> Self {
        Self {
            id: order.id,
            url: order.url(base_url),
            key: order.key.clone(),
            customer_id: order.customer_id,
            numb_of_positions: order.numb_of_positions(),
            total_price: order.total_price(),
            created_at: order.created_at,
            payment_status: order.payment_status,
            is_paid: order.is_paid,
            in_progress: order.in_progress,
            closed: order.closed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOrderView {
    pub id: i64,
    pub autogenerated_key: Option<String>,
    pub customer_id: i64,
}

impl From<&Order> for AddOrderView {
    fn from(order: &Order) -> Self {
        Self { id: order.id, autogenerated_key: order.key.clone(), customer_id: order.customer_id }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub key: Option<String>,
    pub customer_id: i64,
    pub positions: Vec<PositionView>,
    pub numb_of_positions: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub delivery_method: Option<DeliveryMethod>,
    pub delivery_status: DeliveryStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub address: Option<String>,
    pub post_index: Option<String>,
    /// Pickup pharmacy id for self-delivery.
    pub pharmacy: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub receipt_time: Option<NaiveTime>,
    pub receipt_datetime: Option<NaiveDateTime>,
}

impl OrderView {
    pub fn new(details: &OrderDetails, base_url: &str) -> Self {
        let order = &details.order;
        Self {
            id: order.id,
            key: order.key.clone(),
            customer_id: order.customer_id,
            positions: order.lines.iter().map(|l| PositionView::new(l, details, base_url)).collect(),
            numb_of_positions: order.numb_of_positions(),
            total_price: order.total_price(),
            created_at: order.created_at,
            delivery_method: order.delivery_method,
            delivery_status: order.delivery_status,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            is_paid: order.is_paid,
            address: order.address.clone(),
            post_index: order.post_index.clone(),
            pharmacy: order.pharmacy_id,
            receipt_date: order.receipt_date,
            receipt_time: order.receipt_time,
            receipt_datetime: order.receipt_datetime(),
        }
    }
}
