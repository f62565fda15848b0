//! Checker Client - HTTP client for the result-checker backend
//!
//! Provides the storefront and admin surfaces of the checker shop as a
//! typed client library: OTP-based checker retrieval, CSV inventory
//! upload with preview, and a read-through TTL cache in front of the
//! admin API.

pub mod admin;
pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod pricing;
pub mod retrieve;
pub mod session;
pub mod storefront;
pub mod upload;

pub use admin::{AdminClient, Dashboard};
pub use cache::{CacheService, Clock, ManualClock, SystemClock, TtlClass};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use retrieve::{FlowState, NotifyStatus, RetrieveError, RetrieveFlow, VerifyOutcome};
pub use session::{Session, SessionHandle};
pub use storefront::StorefrontClient;
pub use upload::{CsvError, CsvFile, ParsedRow, UploadPipeline};

// Re-export shared types for convenience
pub use shared::models::{Checker, InventoryReport, Order, OrderStatus, PaymentStatus, StatsReport};
pub use shared::response::UploadReport;
pub use shared::types::WaecType;
