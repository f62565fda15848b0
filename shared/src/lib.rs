//! Shared types for the result-checker storefront
//!
//! Common types used by both the client library and the mock backend:
//! domain models, request/response DTOs, error types, and utilities.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiError, ApiResult};
pub use models::{Checker, InventoryItem, InventoryReport, Order, OrderStatus, PaymentStatus};
pub use response::{DataEnvelope, UploadReport};
pub use types::WaecType;
