//! Cart positions are owned by the cart module; orders only read them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub amount: i32,
}

/// A position joined with the product's current state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub position_id: i64,
    pub amount: i32,
    pub product: Product,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal { self.product.price * Decimal::from(self.amount) }
}
