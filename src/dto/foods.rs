use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Food,
};

/// Upper bound on a catalog price in minor units (1,000,000.00).
pub const MAX_PRICE: i64 = 100_000_000;

/// Body for both create and update. Update overwrites every field except
/// `is_available`, which is only changed when present.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FoodRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

impl FoodRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidInput("Food name is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::InvalidInput("Category is required".into()));
        }
        if self.price <= 0 {
            return Err(AppError::InvalidInput("Price must be greater than 0".into()));
        }
        if self.price > MAX_PRICE {
            return Err(AppError::InvalidInput(format!(
                "Price cannot exceed {MAX_PRICE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FoodQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FoodList {
    pub items: Vec<Food>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<String>,
}
