mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use food_order_api::{
    app::build_app,
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Role},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

async fn register(app: &Router, email: &str) -> anyhow::Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Asha", "email": email, "password": "secret123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok(body["data"]["token"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn register_login_and_profile() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = build_app(state);

    let token = register(&app, "asha@example.com").await?;

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "asha@example.com");
    assert_eq!(body["data"]["role"], "USER");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "secret123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(body["data"]["token"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "wrong-pass" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Asha", "email": "asha@example.com", "password": "secret123" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].as_str().unwrap().contains("already registered"));
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = build_app(state);

    let (status, _) = send(&app, "GET", "/api/cart", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/orders", Some("not-a-jwt"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Catalog reads are public.
    let (status, body) = send(&app, "GET", "/api/foods", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));
    Ok(())
}

#[tokio::test]
async fn cart_and_order_over_http() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let food = common::create_food(&state, "Masala Dosa", 450, "South Indian", true).await?;
    let app = build_app(state);
    let token = register(&app, "ravi@example.com").await?;

    let (status, _) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({ "food_id": food.id, "quantity": 0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({ "food_id": food.id, "quantity": 2 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total_price"], 900);
    assert_eq!(body["data"]["total_items"], 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders/place",
        Some(&token),
        Some(json!({ "delivery_address": "12 MG Road", "payment_method": "cash" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "PLACED");
    assert_eq!(body["data"]["total_price"], 900);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/cart", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/orders/{order_id}/status"),
        Some(&token),
        Some(json!({ "status": "DELIVERED" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/orders/{}", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let app = build_app(state);

    let (status, body) = send(&app, "GET", "/api/nowhere", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/nowhere");
    Ok(())
}

#[tokio::test]
async fn token_of_deleted_user_is_not_found() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let orm = state.orm.clone();
    let app = build_app(state);
    let token = register(&app, "temp@example.com").await?;

    let user = Users::find()
        .filter(UserCol::Email.eq("temp@example.com"))
        .one(&orm)
        .await?
        .unwrap();
    Users::delete_by_id(user.id).exec(&orm).await?;

    let (status, _) = send(&app, "GET", "/api/cart", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn role_is_read_from_the_user_row() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let orm = state.orm.clone();
    let app = build_app(state);
    let token = register(&app, "chef@example.com").await?;
    let new_food = json!({ "name": "Thali", "price": 1599, "category": "Specials" });

    let (status, _) = send(&app, "POST", "/api/foods", Some(&token), Some(new_food.clone())).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promotion takes effect without a new token.
    set_role(&orm, "chef@example.com", Role::Admin).await?;
    let (status, body) = send(&app, "POST", "/api/foods", Some(&token), Some(new_food.clone())).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, _) = send(
        &app,
        "POST",
        "/api/foods",
        Some(&token),
        Some(json!({ "name": "Gold Thali", "price": 100_000_001i64, "category": "Specials" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // So does demotion.
    set_role(&orm, "chef@example.com", Role::User).await?;
    let (status, _) = send(&app, "POST", "/api/foods", Some(&token), Some(new_food)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn cart_add_rejects_quantity_above_the_cap() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let food = common::create_food(&state, "Idli", 120, "South Indian", true).await?;
    let app = build_app(state);
    let token = register(&app, "meera@example.com").await?;

    let (status, body) = send(
        &app,
        "POST",
        "/api/cart/add",
        Some(&token),
        Some(json!({ "food_id": food.id, "quantity": 1000 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    Ok(())
}

async fn set_role(orm: &DatabaseConnection, email: &str, role: Role) -> anyhow::Result<()> {
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
        .unwrap();
    let mut active: UserActive = user.into();
    active.role = Set(role);
    active.update(orm).await?;
    Ok(())
}
