//! Request payloads accepted by the services.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{Checkout, DeliveryMethod, PaymentMethod};

/// Prices carry at most two decimal places and ten digits in total.
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.round_dp(2) != *price {
        return Err(ValidationError::new("price_scale"));
    }
    if price.abs() >= Decimal::from(100_000_000) {
        return Err(ValidationError::new("price_digits"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 30))]
    pub title: String,
    /// Slug of the parent category.
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ManufacturerInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[serde(default)]
    pub info: String,
}

/// Product create payload. `category` and `manufacturer` must match existing rows exactly.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate]
    pub category: CategoryInput,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate]
    pub manufacturer: ManufacturerInput,
    pub expiration_date: NaiveDate,
    #[validate(length(min = 1, max = 50))]
    pub barcode: String,
    pub amount: i32,
    #[serde(default)]
    pub info: String,
}

/// Product update payload; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductPatch {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate]
    pub category: Option<CategoryInput>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,
    #[validate]
    pub manufacturer: Option<ManufacturerInput>,
    pub expiration_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 50))]
    pub barcode: Option<String>,
    pub amount: Option<i32>,
    pub info: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatingInput {
    pub new_value: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PharmacyInput {
    #[validate(length(min = 1, max = 30))]
    pub address: String,
    #[validate(length(min = 1, max = 15))]
    pub number: String,
    pub opened_at: NaiveTime,
    pub closed_at: NaiveTime,
    #[serde(default)]
    pub products: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1))]
    pub comment_field: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModerationInput {
    pub comments_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceOrderInput {
    /// Cart position ids.
    #[validate(length(min = 1))]
    pub positions: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutInput {
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "post_index")]
    pub post_index: Option<String>,
    #[serde(default)]
    pub pharmacy: Option<i64>,
    #[serde(default)]
    pub receipt_date: Option<NaiveDate>,
    #[serde(default)]
    pub receipt_time: Option<NaiveTime>,
}

impl From<CheckoutInput> for Checkout {
    fn from(input: CheckoutInput) -> Self {
        Self {
            delivery_method: input.delivery_method,
            payment_method: input.payment_method,
            address: input.address,
            post_index: input.post_index,
            pharmacy_id: input.pharmacy,
            receipt_date: input.receipt_date,
            receipt_time: input.receipt_time,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexValue {
    Text(String),
    Number(u64),
}

/// Post indexes arrive either as JSON strings or numbers.
fn post_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<IndexValue>::deserialize(deserializer)?.map(|v| match v {
        IndexValue::Text(s) => s,
        IndexValue::Number(n) => n.to_string(),
    }))
}
