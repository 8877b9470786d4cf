use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        foods::{Entity as Foods, Model as FoodModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            OrderStatus,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, line_subtotal, totals},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

/// Turns the caller's cart into a PLACED order and empties the cart. Both
/// happen in one transaction: on any error neither the order nor the cart
/// change is kept.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    auth_service::find_principal(&txn, user).await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::InvalidState("No active cart found".into()))?;

    let cart_items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .all(&txn)
        .await?;

    if cart_items.is_empty() {
        return Err(AppError::InvalidState(
            "Cart is empty. Add items before placing an order.".into(),
        ));
    }

    let (total_price, _) = totals(
        cart_items
            .iter()
            .map(|item| (item.price_at_time, item.quantity)),
    )?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_price: Set(total_price),
        status: Set(OrderStatus::Placed),
        delivery_address: Set(payload.delivery_address.trim().to_string()),
        payment_method: Set(payload.payment_method.trim().to_string()),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    // Quantity and unit price are copied verbatim; no re-pricing.
    for (line_no, item) in (1..).zip(&cart_items) {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            line_no: Set(line_no),
            food_id: Set(item.food_id),
            quantity: Set(item.quantity),
            price_at_time: Set(item.price_at_time),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        order_id = %order.id,
        total_price = order.total_price,
        items = cart_items.len(),
        "order placed"
    );

    let view = load_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order placed", view, Some(Meta::empty())))
}

/// The caller's orders, newest first.
pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = load_orders(&state.orm, orders).await?;
    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// Owners see their own orders; admins see any order.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_order(state, id).await?;

    if order.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::InvalidState("Order does not belong to you".into()));
    }

    let view = load_order(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

/// Any recognised status may follow any other; there is no transition table.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let existing = find_order(state, id).await?;

    let status: OrderStatus = payload.status.parse().map_err(|_| {
        AppError::InvalidInput(format!(
            "Invalid status: {}. Valid values: {}",
            payload.status,
            OrderStatus::valid_values()
        ))
    })?;

    let previous = existing.status;
    let mut active: OrderActive = existing.into();
    active.status = Set(status);
    let order = active.update(&state.orm).await?;

    tracing::info!(
        order_id = %order.id,
        admin_id = %user.user_id,
        from = previous.as_str(),
        to = status.as_str(),
        "order status updated"
    );

    let view = load_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order updated", view, Some(Meta::empty())))
}

async fn find_order(state: &AppState, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order", "id", id))
}

async fn load_order<C>(conn: &C, order: OrderModel) -> AppResult<Order>
where
    C: ConnectionTrait,
{
    let mut orders = load_orders(conn, vec![order]).await?;
    orders
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order view could not be built")))
}

/// Builds order views with their items and owner names in three queries,
/// preserving the order of `orders`.
async fn load_orders<C>(conn: &C, orders: Vec<OrderModel>) -> AppResult<Vec<Order>>
where
    C: ConnectionTrait,
{
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
    user_ids.sort();
    user_ids.dedup();

    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::OrderId)
        .order_by_asc(OrderItemCol::LineNo)
        .find_also_related(Foods)
        .all(conn)
        .await?;
    for (item, food) in rows {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item, food)?);
    }

    Ok(orders
        .into_iter()
        .map(|order| Order {
            id: order.id,
            user_id: order.user_id,
            user_name: names.get(&order.user_id).cloned().unwrap_or_default(),
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            total_price: order.total_price,
            status: order.status,
            delivery_address: order.delivery_address,
            payment_method: order.payment_method,
            created_at: order.created_at.with_timezone(&Utc),
        })
        .collect())
}

fn order_item_from_entity(item: OrderItemModel, food: Option<FoodModel>) -> AppResult<OrderItem> {
    let (food_name, food_image_url) = match food {
        Some(food) => (food.name, food.image_url),
        None => (String::new(), None),
    };
    Ok(OrderItem {
        id: item.id,
        food_id: item.food_id,
        food_name,
        food_image_url,
        quantity: item.quantity,
        price_at_time: item.price_at_time,
        subtotal: line_subtotal(item.price_at_time, item.quantity)?,
    })
}
