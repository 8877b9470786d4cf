use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, MAX_QUANTITY, UpdateCartRequest},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        foods::{Entity as Foods, Model as FoodModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, line_subtotal},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = get_or_create_cart(&txn, user.user_id).await?;
    let view = load_cart(&txn, &cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("OK", view, None))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = get_or_create_cart(&txn, user.user_id).await?;

    let food = Foods::find_by_id(payload.food_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Food", "id", payload.food_id))?;

    if !food.is_available {
        return Err(AppError::InvalidState(format!(
            "Food item is not available: {}",
            food.name
        )));
    }

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::FoodId.eq(food.id))
        .one(&txn)
        .await?;

    let quantity = existing
        .as_ref()
        .map_or(Some(payload.quantity), |item| {
            item.quantity.checked_add(payload.quantity)
        })
        .filter(|quantity| *quantity <= MAX_QUANTITY)
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Quantity for {} cannot exceed {MAX_QUANTITY}",
                food.name
            ))
        })?;

    match existing {
        Some(item) => {
            // Keep the original price snapshot; only the quantity grows.
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                food_id: Set(food.id),
                quantity: Set(quantity),
                price_at_time: Set(food.price),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?;
        }
    }

    let view = load_cart(&txn, &cart).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        food_id = %food.id,
        quantity = payload.quantity,
        "cart item added"
    );

    Ok(ApiResponse::success("Added to cart", view, None))
}

/// Overwrites the quantity of one line. No lower bound is applied here.
pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    cart_item_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = get_or_create_cart(&txn, user.user_id).await?;
    let item = owned_item(&txn, &cart, cart_item_id).await?;

    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&txn).await?;

    let view = load_cart(&txn, &cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Cart updated", view, None))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    cart_item_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = get_or_create_cart(&txn, user.user_id).await?;
    let item = owned_item(&txn, &cart, cart_item_id).await?;

    CartItems::delete_by_id(item.id).exec(&txn).await?;

    let view = load_cart(&txn, &cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("Removed from cart", view, None))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let txn = state.orm.begin().await?;
    let cart = get_or_create_cart(&txn, user.user_id).await?;

    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, removed = result.rows_affected, "cart cleared");

    Ok(ApiResponse::success(
        "Cart cleared",
        Cart::new(cart.id, cart.user_id, Vec::new())?,
        Some(Meta::empty()),
    ))
}

/// Look the cart up; if absent insert one, tolerating a concurrent insert
/// for the same user, then read it back.
pub async fn get_or_create_cart<C>(conn: &C, user_id: Uuid) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    if let Some(cart) = find_cart(conn, user_id).await? {
        return Ok(cart);
    }

    // Tokens can outlive the user they were issued for.
    if Users::find_by_id(user_id).one(conn).await?.is_none() {
        return Err(AppError::not_found("User", "id", user_id));
    }

    Carts::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    find_cart(conn, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for user {user_id} vanished after insert")))
}

pub(crate) async fn find_cart<C>(conn: &C, user_id: Uuid) -> AppResult<Option<CartModel>>
where
    C: ConnectionTrait,
{
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?)
}

async fn owned_item<C>(conn: &C, cart: &CartModel, cart_item_id: Uuid) -> AppResult<CartItemModel>
where
    C: ConnectionTrait,
{
    let item = CartItems::find_by_id(cart_item_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("CartItem", "id", cart_item_id))?;

    if item.cart_id != cart.id {
        return Err(AppError::InvalidState(
            "Cart item does not belong to your cart".into(),
        ));
    }
    Ok(item)
}

/// Builds the cart view; totals are recomputed from the stored snapshots.
async fn load_cart<C>(conn: &C, cart: &CartModel) -> AppResult<Cart>
where
    C: ConnectionTrait,
{
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .find_also_related(Foods)
        .all(conn)
        .await?;

    let items = rows
        .into_iter()
        .map(|(item, food)| cart_item_from_entity(item, food))
        .collect::<AppResult<Vec<_>>>()?;

    Cart::new(cart.id, cart.user_id, items)
}

fn cart_item_from_entity(item: CartItemModel, food: Option<FoodModel>) -> AppResult<CartItem> {
    let food = food.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("cart item {} references a missing food", item.id))
    })?;
    Ok(CartItem {
        id: item.id,
        food_id: item.food_id,
        food_name: food.name,
        food_image_url: food.image_url,
        category: food.category,
        quantity: item.quantity,
        price_at_time: item.price_at_time,
        subtotal: line_subtotal(item.price_at_time, item.quantity)?,
    })
}
