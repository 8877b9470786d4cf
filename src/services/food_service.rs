use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::foods::{CategoryList, FoodList, FoodQuery, FoodRequest},
    entity::{
        foods::{ActiveModel, Column, Entity as Foods, Model as FoodModel},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Food,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_foods(state: &AppState, query: FoodQuery) -> AppResult<ApiResponse<FoodList>> {
    let category = non_blank(query.category);
    let search = non_blank(query.search);

    let mut condition = Condition::all().add(Column::IsAvailable.eq(true));

    if let Some(category) = category {
        condition = condition
            .add(Expr::expr(Func::lower(Expr::col(Column::Category))).eq(category.to_lowercase()));
    }

    if let Some(search) = search {
        let pattern = contains_pattern(&search.to_lowercase());
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(Column::Description))).like(pattern)),
        );
    }

    let items: Vec<Food> = Foods::find()
        .filter(condition)
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(food_from_entity)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Foods", FoodList { items }, Some(meta)))
}

pub async fn get_food(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Food>> {
    let food = find_food(state, id).await?;
    Ok(ApiResponse::success("Food", food_from_entity(food), None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<String> = Foods::find()
        .select_only()
        .column(Column::Category)
        .distinct()
        .order_by_asc(Column::Category)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn create_food(
    state: &AppState,
    user: &AuthUser,
    payload: FoodRequest,
) -> AppResult<ApiResponse<Food>> {
    ensure_admin(user)?;
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        category: Set(payload.category),
        image_url: Set(payload.image_url),
        is_available: Set(payload.is_available.unwrap_or(true)),
        created_at: Set(Utc::now().into()),
    };
    let food = active.insert(&state.orm).await?;

    tracing::info!(food_id = %food.id, admin_id = %user.user_id, "food created");

    Ok(ApiResponse::success(
        "Food created",
        food_from_entity(food),
        Some(Meta::empty()),
    ))
}

pub async fn update_food(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: FoodRequest,
) -> AppResult<ApiResponse<Food>> {
    ensure_admin(user)?;
    let existing = find_food(state, id).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.category = Set(payload.category);
    active.image_url = Set(payload.image_url);
    if let Some(is_available) = payload.is_available {
        active.is_available = Set(is_available);
    }

    let food = active.update(&state.orm).await?;

    tracing::info!(food_id = %food.id, admin_id = %user.user_id, "food updated");

    Ok(ApiResponse::success(
        "Updated",
        food_from_entity(food),
        Some(Meta::empty()),
    ))
}

/// Removes a catalog entry. Pending cart lines go with it; a food that
/// appears in any order is kept so order history stays intact.
pub async fn delete_food(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Food>> {
    ensure_admin(user)?;
    let food = find_food(state, id).await?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::FoodId.eq(id))
        .count(&state.orm)
        .await?;
    if ordered > 0 {
        return Err(AppError::InvalidState(format!(
            "Food item is part of existing orders and cannot be deleted: {}. Mark it unavailable instead.",
            food.name
        )));
    }

    Foods::delete_by_id(id).exec(&state.orm).await?;

    tracing::info!(food_id = %id, admin_id = %user.user_id, "food deleted");

    Ok(ApiResponse::success(
        "Deleted",
        food_from_entity(food),
        Some(Meta::empty()),
    ))
}

async fn find_food(state: &AppState, id: Uuid) -> AppResult<FoodModel> {
    Foods::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Food", "id", id))
}

const LIKE_ESCAPE: char = '!';

/// `%term%` with the term's own `%`, `_` and escape characters matched
/// literally.
fn contains_pattern(term: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape(LIKE_ESCAPE)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn food_from_entity(model: FoodModel) -> Food {
    Food {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        image_url: model.image_url,
        is_available: model.is_available,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
