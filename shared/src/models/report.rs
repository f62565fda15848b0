//! Inventory and sales report models

use crate::types::WaecType;
use serde::{Deserialize, Serialize};

/// Per-type inventory utilization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub waec_type: WaecType,
    pub total: u64,
    pub assigned: u64,
    pub available: u64,
}

/// Inventory report as served by `GET /admin/inventory`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryReport {
    #[serde(rename = "byWaecType", default)]
    pub by_waec_type: Vec<InventoryItem>,
    #[serde(rename = "lowStock", default)]
    pub low_stock: Vec<String>,
}

/// Sales broken down by exam type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSales {
    pub waec_type: WaecType,
    pub quantity: u64,
    pub revenue: f64,
}

/// Aggregate analytics for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatsReport {
    pub revenue: f64,
    pub total_orders: u64,
    pub paid_orders: u64,
    #[serde(default)]
    pub by_waec_type: Vec<TypeSales>,
}
