//! Display-only price table
//!
//! Mirrors the backend's pricing for rendering totals before checkout.
//! The backend remains authoritative; the amount it returns on the
//! order is what the customer is charged.

use shared::types::WaecType;

/// Quantity tiers, highest threshold first.
const TIERS: [(u32, f64); 3] = [(10, 15.0), (5, 16.5), (1, 17.5)];

/// Unit price in GHS for a quantity of checkers.
///
/// The same tiering applies to every exam type.
pub fn unit_price(_waec_type: WaecType, quantity: u32) -> f64 {
    let quantity = quantity.max(1);
    TIERS
        .iter()
        .find(|(threshold, _)| quantity >= *threshold)
        .map(|(_, price)| *price)
        .unwrap_or(TIERS[TIERS.len() - 1].1)
}

/// Total display price for a prospective order.
pub fn total_price(waec_type: WaecType, quantity: u32) -> f64 {
    unit_price(waec_type, quantity) * quantity.max(1) as f64
}
