use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use validator::Validate;

use super::input::{CheckoutInput, PlaceOrderInput};
use super::Customer;
use crate::domain::aggregates::{Checkout, Order, OrderLine};
use crate::error::StoreError;
use crate::store::OrderStore;
use crate::Result;

/// Order with the category titles its product lines refer to.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderDetails {
    pub order: Order,
    pub category_titles: HashMap<i64, String>,
}

impl OrderDetails {
    pub fn category_title(&self, category_id: i64) -> Option<&str> {
        self.category_titles.get(&category_id).map(String::as_str)
    }
}

pub struct OrderService<S> {
    store: Arc<S>,
}

impl<S> Clone for OrderService<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }

    async fn owned_order(&self, id: i64, customer: &Customer) -> Result<Order> {
        let order = self.store.order_by_id(id).await?.ok_or_else(|| StoreError::not_found("Order", id))?;
        if order.customer_id != customer.id {
            return Err(StoreError::Forbidden(format!("Order '{id}' belongs to another customer")));
        }
        Ok(order)
    }

    async fn details(&self, order: Order) -> Result<OrderDetails> {
        let category_titles = self.store.list_categories().await?.into_iter().map(|c| (c.id, c.title)).collect();
        Ok(OrderDetails { order, category_titles })
    }

    pub async fn list_orders(&self, customer: &Customer) -> Result<Vec<Order>> {
        self.store.list_orders(Some(customer.id)).await
    }

    pub async fn get_order(&self, id: i64, customer: &Customer) -> Result<OrderDetails> {
        let order = self.owned_order(id, customer).await?;
        self.details(order).await
    }

    /// Turns the caller's cart positions into a new order. Every position must
    /// exist, belong to the caller and point at an in-stock product.
    pub async fn place_order(&self, customer: &Customer, input: PlaceOrderInput) -> Result<Order> {
        input.validate()?;
        let ids: Vec<i64> = input.positions.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let positions = self.store.positions_by_ids(&ids).await?;

        let mut lines = Vec::with_capacity(positions.len());
        for id in &ids {
            let position = positions
                .iter()
                .find(|p| p.id == *id)
                .ok_or_else(|| StoreError::Validation(format!("Position '{id}' does not exist")))?;
            if position.customer_id != customer.id {
                return Err(StoreError::Validation(format!("Position '{id}' is not in your cart")));
            }
            let product = self
                .store
                .product_by_id(position.product_id)
                .await?
                .ok_or_else(|| StoreError::Validation(format!("Product '{}' does not exist", position.product_id)))?;
            if !product.is_in_stock() {
                return Err(StoreError::Validation(format!("'{}' is sold out", product.title)));
            }
            lines.push(OrderLine { position_id: position.id, amount: position.amount, product });
        }

        let order = self.store.insert_order(Order::place(customer.id, lines)).await?;
        tracing::info!(
            order_id = order.id,
            customer_id = customer.id,
            positions = order.numb_of_positions(),
            key = order.key.as_deref().unwrap_or_default(),
            "order placed"
        );
        Ok(order)
    }

    pub async fn checkout(&self, id: i64, customer: &Customer, input: CheckoutInput) -> Result<OrderDetails> {
        input.validate()?;
        let mut order = self.owned_order(id, customer).await?;
        let checkout = Checkout::from(input);

        if let Some(pharmacy_id) = checkout.pharmacy_id {
            if self.store.pharmacy_by_id(pharmacy_id).await?.is_none() {
                return Err(StoreError::Validation(format!("Pharmacy '{pharmacy_id}' does not exist")));
            }
        }

        if let Err(e) = order.check_out(checkout) {
            tracing::warn!(order_id = id, error = %e, "checkout rejected");
            return Err(e.into());
        }
        let order = self.store.update_order(order).await?;
        tracing::info!(
            order_id = order.id,
            payment_status = %order.payment_status,
            "order checked out"
        );
        self.details(order).await
    }
}
