use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Order,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub delivery_address: String,
    pub payment_method: String,
}

impl PlaceOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.delivery_address.trim().is_empty() {
            return Err(AppError::InvalidInput("Delivery address is required".into()));
        }
        if self.payment_method.trim().is_empty() {
            return Err(AppError::InvalidInput("Payment method is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

impl UpdateOrderStatusRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.status.trim().is_empty() {
            return Err(AppError::InvalidInput("Status is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
