use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::extract::{CurrentCustomer, ValidatedJson};
use super::views::{AddOrderView, OrderView, SimpleOrderView};
use super::AppState;
use crate::service::input::{CheckoutInput, PlaceOrderInput};
use crate::store::OrderStore;
use crate::Result;

pub async fn list_orders<S: OrderStore>(
    State(state): State<AppState<S>>,
    customer: CurrentCustomer,
) -> Result<Json<Vec<SimpleOrderView>>> {
    let customer = customer.require()?;
    let orders = state.orders.list_orders(&customer).await?;
    Ok(Json(orders.iter().map(|o| SimpleOrderView::new(o, &state.base_url)).collect()))
}

pub async fn place_order<S: OrderStore>(
    State(state): State<AppState<S>>,
    customer: CurrentCustomer,
    ValidatedJson(input): ValidatedJson<PlaceOrderInput>,
) -> Result<(StatusCode, Json<AddOrderView>)> {
    let customer = customer.require()?;
    let order = state.orders.place_order(&customer, input).await?;
    Ok((StatusCode::CREATED, Json(AddOrderView::from(&order))))
}

pub async fn get_order<S: OrderStore>(
    State(state): State<AppState<S>>,
    customer: CurrentCustomer,
    Path(id): Path<i64>,
) -> Result<Json<OrderView>> {
    let customer = customer.require()?;
    let details = state.orders.get_order(id, &customer).await?;
    Ok(Json(OrderView::new(&details, &state.base_url)))
}

pub async fn checkout<S: OrderStore>(
    State(state): State<AppState<S>>,
    customer: CurrentCustomer,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<CheckoutInput>,
) -> Result<Json<OrderView>> {
    let customer = customer.require()?;
    let details = state.orders.checkout(id, &customer, input).await?;
    Ok(Json(OrderView::new(&details, &state.base_url)))
}
