//! HTTP tests over the in-memory store.
//!
//! These drive the full router with `oneshot` and check status codes and
//! JSON shapes as a client sees them.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pharma_storefront::api::{self, AppState};
use pharma_storefront::store::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt; // For oneshot()

const BASE_URL: &str = "http://shop.test";
const ALICE: Option<(i64, &str)> = Some((7, "alice"));

fn app() -> (MemoryStore, Router) {
    let store = MemoryStore::new();
    let app = api::router(AppState::new(store.clone(), BASE_URL));
    (store, app)
}

async fn send(app: &Router, method: &str, uri: &str, customer: Option<(i64, &str)>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, slug)) = customer {
        builder = builder.header("x-customer-id", id.to_string()).header("x-user-slug", slug);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn aspirin(amount: i32) -> Value {
    json!({
        "title": "Aspirin",
        "category": {"title": "Pain Relief"},
        "price": 19.99,
        "brand": "Bayer",
        "manufacturer": {"name": "Bayer AG", "country": "Germany", "info": ""},
        "expiration_date": "2030-01-01",
        "barcode": "4600000000001",
        "amount": amount
    })
}

async fn seed(app: &Router, amount: i32) -> Value {
    let (status, _) = send(app, "POST", "/api/v1/categories", None, Some(json!({"title": "Pain Relief"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let manufacturer = json!({"name": "Bayer AG", "country": "Germany", "info": ""});
    let (status, _) = send(app, "POST", "/api/v1/manufacturers", None, Some(manufacturer)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, product) = send(app, "POST", "/api/v1/catalog", None, Some(aspirin(amount))).await;
    assert_eq!(status, StatusCode::CREATED);
    product
}

#[tokio::test]
async fn test_health() {
    let (_, app) = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_product_create_list_and_reslug() {
    let (_, app) = app();
    let product = seed(&app, 10).await;
    assert_eq!(product["slug"], "aspirin");
    assert_eq!(product["price"], json!(19.99));
    assert_eq!(product["category"], json!({"title": "Pain Relief", "slug": "pain-relief", "is_subcategory": false, "parent_title": null}));
    assert_eq!(product["manufacturer"]["country"], "Germany");
    assert_eq!(product["is_in_stock"], true);

    let (_, listed) = send(&app, "GET", "/api/v1/catalog?category=pain-relief&in_stock=true", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, listed) = send(&app, "GET", "/api/v1/catalog?in_stock=false", None, None).await;
    assert!(listed.as_array().unwrap().is_empty());
    let (_, listed) = send(&app, "GET", "/api/v1/catalog?category=vitamins", None, None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, updated) =
        send(&app, "PATCH", "/api/v1/catalog/aspirin", None, Some(json!({"title": "Aspirin Cardio", "amount": 0}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "aspirin-cardio");
    assert_eq!(updated["is_in_stock"], false);

    let (status, body) = send(&app, "GET", "/api/v1/catalog/aspirin", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = send(&app, "DELETE", "/api/v1/catalog/aspirin-cardio", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_nested_create_requires_existing_references() {
    let (_, app) = app();
    seed(&app, 10).await;
    let mut payload = aspirin(1);
    payload["title"] = json!("Ibuprofen");
    payload["manufacturer"]["country"] = json!("France");
    let (status, body) = send(&app, "POST", "/api/v1/catalog", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");

    let mut payload = aspirin(1);
    payload["title"] = json!("");
    let (status, _) = send(&app, "POST", "/api/v1/catalog", None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rating_requires_identity() {
    let (_, app) = app();
    seed(&app, 10).await;
    let (status, body) = send(&app, "GET", "/api/v1/catalog/aspirin/rating", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"average_rating": null}));

    let (status, _) = send(&app, "PUT", "/api/v1/catalog/aspirin/rating", None, Some(json!({"new_value": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, "PUT", "/api/v1/catalog/aspirin/rating", ALICE, Some(json!({"new_value": 5}))).await;
    let (status, body) =
        send(&app, "PUT", "/api/v1/catalog/aspirin/rating", Some((8, "bob")), Some(json!({"new_value": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_rating"], json!(3.5));
}

#[tokio::test]
async fn test_comment_moderation_flow() {
    let (_, app) = app();
    seed(&app, 10).await;
    let uri = "/api/v1/catalog/aspirin/comments";

    let (status, body) = send(&app, "POST", uri, None, Some(json!({"comment_field": "Helps"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is not logged in");

    let mut ids = Vec::new();
    for text in ["Helps", "Buy cheap pills", "Fine"] {
        let (status, body) = send(&app, "POST", uri, ALICE, Some(json!({"comment_field": text}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["commenters_name"], "alice");
        assert_eq!(body["product_name"], "Aspirin");
        ids.push(body["id"].as_i64().unwrap());
    }

    let (_, visible) = send(&app, "GET", uri, None, None).await;
    assert!(visible.as_array().unwrap().is_empty());
    let (_, pending) = send(&app, "GET", "/api/v1/manager/comments", None, None).await;
    assert_eq!(pending.as_array().unwrap().len(), 3);

    let (status, outcome) = send(
        &app,
        "POST",
        "/api/v1/manager/comments/moderate",
        None,
        Some(json!({"comments_ids": [ids[0], ids[2]]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["deleted"], json!([ids[1]]));

    let (_, visible) = send(&app, "GET", uri, None, None).await;
    let visible: Vec<i64> = visible.as_array().unwrap().iter().map(|c| c["id"].as_i64().unwrap()).collect();
    assert_eq!(visible, vec![ids[0], ids[2]]);

    let own = format!("{uri}/{}", ids[0]);
    let (status, _) = send(&app, "DELETE", &own, Some((8, "bob")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &own, ALICE, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_order_placement_and_checkout() {
    let (store, app) = app();
    let product = seed(&app, 10).await;
    let position = store.insert_position(7, product["id"].as_i64().unwrap(), 3).await;
    let placement = json!({"positions": [position.id]});

    let (status, _) = send(&app, "POST", "/api/v1/orders", None, Some(placement.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, added) = send(&app, "POST", "/api/v1/orders", ALICE, Some(placement)).await;
    assert_eq!(status, StatusCode::CREATED);
    let key = added["autogenerated_key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 8);
    let id = added["id"].as_i64().unwrap();

    let (_, orders) = send(&app, "GET", "/api/v1/orders", ALICE, None).await;
    assert_eq!(orders[0]["url"], format!("{BASE_URL}/orders/7/{id}/"));
    assert_eq!(orders[0]["numb_of_positions"], 1);
    assert_eq!(orders[0]["total_price"], json!(59.97));

    let checkout = format!("/api/v1/orders/{id}/checkout");
    let (status, body) = send(
        &app,
        "PUT",
        &checkout,
        ALICE,
        Some(json!({"delivery_method": "Self-delivery", "payment_method": "Upon receipt", "address": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("don't need to enter the address"));

    let (status, _) = send(
        &app,
        "PUT",
        &checkout,
        ALICE,
        Some(json!({"delivery_method": "Door delivery", "payment_method": "Prepayment", "address": "X", "post_index": "1234567"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = send(
        &app,
        "PUT",
        &checkout,
        ALICE,
        Some(json!({"delivery_method": "Door delivery", "payment_method": "Prepayment", "address": "X", "post_index": "12345"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_status"], "Pending payment");
    assert_eq!(order["key"], key);
    assert_eq!(order["positions"][0]["amount"], 3);
    assert_eq!(order["positions"][0]["product"]["category"]["title"], "Pain Relief");

    let (status, _) = send(&app, "GET", &format!("/api/v1/orders/{id}"), Some((8, "bob")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_self_delivery_checkout_reports_pickup() {
    let (store, app) = app();
    let product = seed(&app, 10).await;
    let product_id = product["id"].as_i64().unwrap();
    let pharmacy = json!({
        "address": "Main St 1",
        "number": "+100200300",
        "opened_at": "08:00:00",
        "closed_at": "20:00:00",
        "products": [product_id]
    });
    let (status, pharmacy) = send(&app, "POST", "/api/v1/pharmacies", None, Some(pharmacy)).await;
    assert_eq!(status, StatusCode::CREATED);
    let pharmacy_id = pharmacy["id"].as_i64().unwrap();

    let position = store.insert_position(7, product_id, 1).await;
    let (_, added) = send(&app, "POST", "/api/v1/orders", ALICE, Some(json!({"positions": [position.id]}))).await;
    let checkout = format!("/api/v1/orders/{}/checkout", added["id"].as_i64().unwrap());
    let (status, order) = send(
        &app,
        "PUT",
        &checkout,
        ALICE,
        Some(json!({
            "delivery_method": "Self-delivery",
            "payment_method": "Upon receipt",
            "pharmacy": pharmacy_id,
            "receipt_date": "2030-05-01",
            "receipt_time": "12:30:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_status"], "Payment upon receipt");
    assert_eq!(order["delivery_status"], "Without action");
    assert_eq!(order["pharmacy"], pharmacy_id);
    assert_eq!(order["receipt_date"], "2030-05-01");
    assert_eq!(order["receipt_time"], "12:30:00");
    assert_eq!(order["receipt_datetime"], "2030-05-01T12:30:00");
}

#[tokio::test]
async fn test_admin_list_views() {
    let (_, app) = app();
    seed(&app, 0).await;
    let (status, page) = send(&app, "GET", "/api/v1/admin/product?brand=Bayer", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["columns"][0], "id");
    assert_eq!(page["rows"][0][3], "Pain Relief");
    assert_eq!(page["rows"][0][7], "false");

    let (_, page) = send(&app, "GET", "/api/v1/admin/manufacturer?country=France", None, None).await;
    assert!(page["rows"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/api/v1/admin/manufacturer?name=Bayer", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "GET", "/api/v1/admin/customer", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
