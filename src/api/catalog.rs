use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::extract::{CurrentCustomer, ValidatedJson};
use super::views::{
    CategoryView, CustomerCommentView, ManagerCommentView, PharmacyView, ProductView, RatingView, SimpleProductView,
};
use super::AppState;
use crate::domain::aggregates::{Manufacturer, ModerationOutcome};
use crate::error::StoreError;
use crate::service::input::{
    CategoryInput, CommentInput, ManufacturerInput, ModerationInput, PharmacyInput, ProductInput, ProductPatch,
    RatingInput,
};
use crate::store::{CatalogStore, ProductFilter};
use crate::Result;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    pub brand: Option<String>,
    pub in_stock: Option<bool>,
}

pub async fn list_products<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let category_id = match query.category.as_deref() {
        Some(slug) => match state.catalog.get_category(slug).await {
            Ok(details) => Some(details.category.id),
            Err(StoreError::NotFound(_)) => return Ok(Json(Vec::new())),
            Err(e) => return Err(e),
        },
        None => None,
    };
    let filter = ProductFilter { category_id, brand: query.brand, in_stock: query.in_stock };
    let products = state.catalog.list_products(filter).await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

pub async fn create_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let details = state.catalog.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

pub async fn get_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    Ok(Json(state.catalog.get_product(&slug).await?.into()))
}

pub async fn update_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
    ValidatedJson(patch): ValidatedJson<ProductPatch>,
) -> Result<Json<ProductView>> {
    Ok(Json(state.catalog.update_product(&slug, patch).await?.into()))
}

pub async fn delete_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<StatusCode> {
    state.catalog.delete_product(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_rating<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<RatingView>> {
    let rating = state.catalog.get_rating(&slug).await?;
    Ok(Json(RatingView::from(&rating)))
}

pub async fn rate_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    caller: CurrentCustomer,
    Path(slug): Path<String>,
    ValidatedJson(input): ValidatedJson<RatingInput>,
) -> Result<Json<RatingView>> {
    let rating = state.catalog.rate_product(&slug, caller.customer(), input).await?;
    Ok(Json(RatingView::from(&rating)))
}

pub async fn list_comments<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CustomerCommentView>>> {
    let comments = state.catalog.product_comments(&slug).await?;
    Ok(Json(comments.into_iter().map(CustomerCommentView::from).collect()))
}

pub async fn add_comment<S: CatalogStore>(
    State(state): State<AppState<S>>,
    caller: CurrentCustomer,
    Path(slug): Path<String>,
    ValidatedJson(input): ValidatedJson<CommentInput>,
) -> Result<(StatusCode, Json<CustomerCommentView>)> {
    let comment = state.catalog.add_comment(&slug, caller.customer(), input).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn remove_comment<S: CatalogStore>(
    State(state): State<AppState<S>>,
    caller: CurrentCustomer,
    Path((slug, id)): Path<(String, i64)>,
) -> Result<StatusCode> {
    state.catalog.remove_comment(&slug, id, caller.customer()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories<S: CatalogStore>(State(state): State<AppState<S>>) -> Result<Json<Vec<CategoryView>>> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(categories.iter().map(CategoryView::from).collect()))
}

pub async fn create_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<(StatusCode, Json<CategoryView>)> {
    let details = state.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(CategoryView::from(&details))))
}

pub async fn get_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryView>> {
    let details = state.catalog.get_category(&slug).await?;
    Ok(Json(CategoryView::from(&details)))
}

pub async fn update_category<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<Json<CategoryView>> {
    let details = state.catalog.update_category(&slug, input).await?;
    Ok(Json(CategoryView::from(&details)))
}

pub async fn list_manufacturers<S: CatalogStore>(State(state): State<AppState<S>>) -> Result<Json<Vec<Manufacturer>>> {
    Ok(Json(state.catalog.list_manufacturers().await?))
}

pub async fn create_manufacturer<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ValidatedJson(input): ValidatedJson<ManufacturerInput>,
) -> Result<(StatusCode, Json<Manufacturer>)> {
    Ok((StatusCode::CREATED, Json(state.catalog.create_manufacturer(input).await?)))
}

pub async fn get_manufacturer<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Manufacturer>> {
    Ok(Json(state.catalog.get_manufacturer(id).await?))
}

pub async fn update_manufacturer<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    ValidatedJson(input): ValidatedJson<ManufacturerInput>,
) -> Result<Json<Manufacturer>> {
    Ok(Json(state.catalog.update_manufacturer(id, input).await?))
}

pub async fn list_pharmacies<S: CatalogStore>(State(state): State<AppState<S>>) -> Result<Json<Vec<PharmacyView>>> {
    let pharmacies = state.catalog.list_pharmacies().await?;
    Ok(Json(pharmacies.into_iter().map(PharmacyView::from).collect()))
}

pub async fn create_pharmacy<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ValidatedJson(input): ValidatedJson<PharmacyInput>,
) -> Result<(StatusCode, Json<PharmacyView>)> {
    let pharmacy = state.catalog.create_pharmacy(input).await?;
    Ok((StatusCode::CREATED, Json(pharmacy.into())))
}

pub async fn get_pharmacy<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<PharmacyView>> {
    Ok(Json(state.catalog.get_pharmacy(id).await?.into()))
}

pub async fn pharmacy_products<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<SimpleProductView>>> {
    let products = state.catalog.pharmacy_products(id).await?;
    Ok(Json(products.iter().map(|p| SimpleProductView::from_details(p, &state.base_url)).collect()))
}

pub async fn pending_comments<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ManagerCommentView>>> {
    let comments = state.catalog.pending_comments().await?;
    Ok(Json(comments.into_iter().map(ManagerCommentView::from).collect()))
}

pub async fn moderate_comments<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ValidatedJson(input): ValidatedJson<ModerationInput>,
) -> Result<Json<ModerationOutcome>> {
    Ok(Json(state.catalog.moderate_comments(input).await?))
}
