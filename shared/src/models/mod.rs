//! Domain models
//!
//! Client-side representations only; the backend owns persistence.

mod checker;
mod order;
mod report;

pub use checker::Checker;
pub use order::{Order, OrderStatus, PaymentStatus};
pub use report::{InventoryItem, InventoryReport, StatsReport, TypeSales};
