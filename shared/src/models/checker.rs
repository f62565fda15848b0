//! Checker Model

use crate::types::WaecType;
use serde::{Deserialize, Serialize};

/// A serial/PIN credential pair granting one result lookup.
///
/// Immutable once assigned to an order. Several endpoints return a
/// trimmed shape (retrieve/verify sends only id + serial + pin), so
/// everything past the credential pair is optional or defaulted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checker {
    pub id: String,
    pub serial: String,
    pub pin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waec_type: Option<WaecType>,
    #[serde(default)]
    pub assigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Checker {
    /// Minimal credential shape, as returned by the retrieve flow.
    pub fn credential(id: impl Into<String>, serial: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            serial: serial.into(),
            pin: pin.into(),
            waec_type: None,
            assigned: false,
            order_id: None,
            assigned_at: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_trimmed_shape() {
        let json = r#"{"id":"c1","serial":"S1","pin":"P1"}"#;
        let checker: Checker = serde_json::from_str(json).unwrap();
        assert_eq!(checker.serial, "S1");
        assert!(!checker.assigned);
        assert!(checker.waec_type.is_none());
    }
}
