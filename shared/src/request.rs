//! Request DTOs shared between the client and the backend contract

use crate::models::OrderStatus;
use crate::types::WaecType;
use serde::{Deserialize, Serialize};

/// Admin login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Filters for the admin order listing.
///
/// Every distinct combination serializes to a distinct query string,
/// which the client also uses as part of the cache key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waec_type: Option<WaecType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl OrderFilter {
    /// Render as a URL query string (empty filter -> empty string).
    pub fn to_query(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(status) = &self.status {
            // serde emits lowercase for OrderStatus
            let s = serde_json::to_string(status).unwrap_or_default();
            parts.push(format!("status={}", s.trim_matches('"')));
        }
        if let Some(waec_type) = &self.waec_type {
            parts.push(format!("waec_type={waec_type}"));
        }
        if let Some(phone) = &self.phone {
            parts.push(format!("phone={phone}"));
        }
        if let Some(page) = self.page {
            parts.push(format!("page={page}"));
        }
        parts.join("&")
    }
}

/// Filters for the admin checker listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckerFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waec_type: Option<WaecType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned: Option<bool>,
}

impl CheckerFilter {
    pub fn to_query(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(waec_type) = &self.waec_type {
            parts.push(format!("waec_type={waec_type}"));
        }
        if let Some(assigned) = self.assigned {
            parts.push(format!("assigned={assigned}"));
        }
        parts.join("&")
    }
}

/// Customer order initiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateOrderRequest {
    pub waec_type: WaecType,
    pub quantity: u32,
    pub phone: String,
    pub email: String,
}

/// Admin order status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Retrieve flow: request an OTP for a phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveInitiateRequest {
    pub phone: String,
}

/// Retrieve flow: verify the OTP.
///
/// `request_id` and `prefix` are the opaque correlation tokens issued
/// by the initiate call; both are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveVerifyRequest {
    pub phone: String,
    pub otp: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub prefix: String,
}
