//! Response DTOs for the backend's wire contract
//!
//! The backend wraps payloads inconsistently; the variant shapes are
//! modelled here so both the client normalizer and the mock backend
//! speak exactly the same wire format.

use crate::models::{Checker, Order};
use serde::{Deserialize, Serialize};

/// The common `{ "data": ... }` wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Admin login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// An order together with its assigned checkers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithCheckers {
    pub order: Order,
    #[serde(default)]
    pub checkers: Vec<Checker>,
}

/// The two observed payload shapes of `GET /admin/orders/:id`.
///
/// Some deployments return the detail object directly, others a
/// single-element array of it. Both must be accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderDetailPayload {
    Detail(OrderWithCheckers),
    List(Vec<OrderWithCheckers>),
}

/// Result of a CSV checker upload, as reported by the server.
/// Counts are authoritative only as reported here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadReport {
    pub inserted: u64,
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `GET /checkers/availability` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl AvailabilityResponse {
    /// Availability is derived, never read from a dedicated flag.
    pub fn is_available(&self) -> bool {
        self.status_code == 200 && self.count > 0
    }
}

/// `POST /orders/initiate` response: the payment gateway redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateOrderResponse {
    pub order_id: String,
    pub payment_url: String,
}

/// `GET /orders/verify/:reference` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerifyResponse {
    pub status: String,
    #[serde(default)]
    pub order: Option<OrderWithCheckers>,
}

/// `POST /retrieve/initiate` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveInitiateResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub prefix: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /retrieve/verify` response.
///
/// Success may be signalled by the `checkers` array, or only by the
/// message text, sometimes on a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetrieveVerifyResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub checkers: Option<Vec<Checker>>,
}

/// Plain error body used by the backend on 4xx/5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
