use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::foods::{CategoryList, FoodList, FoodQuery, FoodRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Food,
    response::ApiResponse,
    services::food_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_foods).post(create_food))
        .route("/categories", get(list_categories))
        .route("/{id}", get(get_food).put(update_food).delete(delete_food))
}

#[utoipa::path(
    get,
    path = "/api/foods",
    params(
        ("category" = Option<String>, Query, description = "Exact category, case-insensitive"),
        ("search" = Option<String>, Query, description = "Substring of name or description, case-insensitive"),
    ),
    responses(
        (status = 200, description = "List available foods", body = ApiResponse<FoodList>)
    ),
    tag = "Foods"
)]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodQuery>,
) -> AppResult<Json<ApiResponse<FoodList>>> {
    let resp = food_service::list_foods(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/foods/categories",
    responses(
        (status = 200, description = "Distinct categories, alphabetical", body = ApiResponse<CategoryList>)
    ),
    tag = "Foods"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = food_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/foods/{id}",
    params(
        ("id" = Uuid, Path, description = "Food ID")
    ),
    responses(
        (status = 200, description = "Get food", body = ApiResponse<Food>),
        (status = 404, description = "Food not found"),
    ),
    tag = "Foods"
)]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Food>>> {
    let resp = food_service::get_food(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/foods",
    request_body = FoodRequest,
    responses(
        (status = 201, description = "Create food", body = ApiResponse<Food>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn create_food(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<FoodRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Food>>)> {
    payload.validate()?;
    let resp = food_service::create_food(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/foods/{id}",
    params(
        ("id" = Uuid, Path, description = "Food ID")
    ),
    request_body = FoodRequest,
    responses(
        (status = 200, description = "Updated food", body = ApiResponse<Food>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Food not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn update_food(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<FoodRequest>,
) -> AppResult<Json<ApiResponse<Food>>> {
    payload.validate()?;
    let resp = food_service::update_food(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/foods/{id}",
    params(
        ("id" = Uuid, Path, description = "Food ID")
    ),
    responses(
        (status = 200, description = "Deleted food", body = ApiResponse<Food>),
        (status = 400, description = "Food is referenced by orders"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Food not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Foods"
)]
pub async fn delete_food(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Food>>> {
    let resp = food_service::delete_food(&state, &user, id).await?;
    Ok(Json(resp))
}
