use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{orders::OrderStatus, users::Role},
    error::{AppError, AppResult},
};

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry. Prices are minor currency units (999 == 9.99).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub food_id: Uuid,
    pub food_name: String,
    pub food_image_url: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub price_at_time: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_price: i64,
    pub total_items: i64,
}

impl Cart {
    pub fn new(id: Uuid, user_id: Uuid, items: Vec<CartItem>) -> AppResult<Self> {
        let (total_price, total_items) =
            totals(items.iter().map(|item| (item.price_at_time, item.quantity)))?;
        Ok(Self {
            id,
            user_id,
            items,
            total_price,
            total_items,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub food_id: Uuid,
    pub food_name: String,
    pub food_image_url: Option<String>,
    pub quantity: i32,
    pub price_at_time: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub items: Vec<OrderItem>,
    pub total_price: i64,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

pub fn line_subtotal(price_at_time: i64, quantity: i32) -> AppResult<i64> {
    price_at_time
        .checked_mul(i64::from(quantity))
        .ok_or_else(amount_too_large)
}

/// Sum of subtotals and sum of quantities over `(unit price, quantity)` lines.
pub fn totals(lines: impl IntoIterator<Item = (i64, i32)>) -> AppResult<(i64, i64)> {
    lines
        .into_iter()
        .try_fold((0i64, 0i64), |(price, count), (unit, quantity)| {
            let price = price
                .checked_add(line_subtotal(unit, quantity)?)
                .ok_or_else(amount_too_large)?;
            let count = count
                .checked_add(i64::from(quantity))
                .ok_or_else(amount_too_large)?;
            Ok((price, count))
        })
}

fn amount_too_large() -> AppError {
    AppError::InvalidInput("Order amount is too large".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: i64, quantity: i32) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            food_id: Uuid::new_v4(),
            food_name: name.into(),
            food_image_url: None,
            category: "Test".into(),
            quantity,
            price_at_time: price,
            subtotal: line_subtotal(price, quantity).unwrap(),
        }
    }

    #[test]
    fn cart_totals_use_price_snapshots() {
        let cart = Cart::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![line("Pizza", 999, 2), line("Soda", 199, 3)],
        )
        .unwrap();
        assert_eq!(cart.total_price, 2595);
        assert_eq!(cart.total_items, 5);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let cart = Cart::new(Uuid::new_v4(), Uuid::new_v4(), Vec::new()).unwrap();
        assert_eq!((cart.total_price, cart.total_items), (0, 0));
    }

    #[test]
    fn subtotal_overflow_is_rejected() {
        let err = line_subtotal(i64::MAX / 2, 3).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");
    }

    #[test]
    fn total_overflow_is_rejected() {
        let err = totals([(i64::MAX / 2, 1), (i64::MAX / 2, 1), (2, 1)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)), "got {err:?}");
        assert_eq!(totals([(i64::MAX / 2, 2)]).unwrap().1, 2);
    }
}
