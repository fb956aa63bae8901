//! HTTP surface.

mod catalog;
pub mod extract;
mod orders;
pub mod views;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::admin::{AdminPage, AdminService};
use crate::service::{CatalogService, OrderService};
use crate::store::OrderStore;
use crate::Result;

pub struct AppState<S> {
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub admin: AdminService<S>,
    /// Prefix for product and order URLs.
    pub base_url: Arc<str>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            orders: self.orders.clone(),
            admin: self.admin.clone(),
            base_url: Arc::clone(&self.base_url),
        }
    }
}

impl<S: OrderStore> AppState<S> {
    pub fn new(store: S, base_url: &str) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: CatalogService::new(Arc::clone(&store)),
            orders: OrderService::new(Arc::clone(&store)),
            admin: AdminService::new(store),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}

pub fn router<S: OrderStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/catalog",
            get(catalog::list_products::<S>).post(catalog::create_product::<S>),
        )
        .route(
            "/api/v1/catalog/:slug",
            get(catalog::get_product::<S>)
                .put(catalog::update_product::<S>)
                .patch(catalog::update_product::<S>)
                .delete(catalog::delete_product::<S>),
        )
        .route(
            "/api/v1/catalog/:slug/rating",
            get(catalog::get_rating::<S>).put(catalog::rate_product::<S>),
        )
        .route(
            "/api/v1/catalog/:slug/comments",
            get(catalog::list_comments::<S>).post(catalog::add_comment::<S>),
        )
        .route(
            "/api/v1/catalog/:slug/comments/:id",
            axum::routing::delete(catalog::remove_comment::<S>),
        )
        .route(
            "/api/v1/categories",
            get(catalog::list_categories::<S>).post(catalog::create_category::<S>),
        )
        .route(
            "/api/v1/categories/:slug",
            get(catalog::get_category::<S>).put(catalog::update_category::<S>),
        )
        .route(
            "/api/v1/manufacturers",
            get(catalog::list_manufacturers::<S>).post(catalog::create_manufacturer::<S>),
        )
        .route(
            "/api/v1/manufacturers/:id",
            get(catalog::get_manufacturer::<S>).put(catalog::update_manufacturer::<S>),
        )
        .route(
            "/api/v1/pharmacies",
            get(catalog::list_pharmacies::<S>).post(catalog::create_pharmacy::<S>),
        )
        .route("/api/v1/pharmacies/:id", get(catalog::get_pharmacy::<S>))
        .route("/api/v1/pharmacies/:id/products", get(catalog::pharmacy_products::<S>))
        .route("/api/v1/manager/comments", get(catalog::pending_comments::<S>))
        .route("/api/v1/manager/comments/moderate", post(catalog::moderate_comments::<S>))
        .route(
            "/api/v1/orders",
            get(orders::list_orders::<S>).post(orders::place_order::<S>),
        )
        .route("/api/v1/orders/:id", get(orders::get_order::<S>))
        .route("/api/v1/orders/:id/checkout", put(orders::checkout::<S>))
        .route("/api/v1/admin/:entity", get(admin_list::<S>))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "pharma-storefront"}))
}

async fn admin_list<S: OrderStore>(
    State(state): State<AppState<S>>,
    Path(entity): Path<String>,
    Query(filters): Query<BTreeMap<String, String>>,
) -> Result<Json<AdminPage>> {
    Ok(Json(state.admin.list(&entity, &filters).await?))
}
