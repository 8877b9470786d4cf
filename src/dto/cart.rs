use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: i32 = 999;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub food_id: Uuid,
    pub quantity: i32,
}

impl AddToCartRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_quantity(self.quantity)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

impl UpdateCartRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::InvalidInput(
            "Quantity must be at least 1".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::InvalidInput(format!(
            "Quantity cannot exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}
