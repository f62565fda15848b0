//! Common types for the shared crate

use serde::{Deserialize, Serialize};

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// Examination board / category a checker belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaecType {
    Bece,
    Wassce,
    Novdec,
    Ctvet,
    /// CSSPS school placement checker
    Placement,
}

impl WaecType {
    /// All known exam types, in display order.
    pub const ALL: [WaecType; 5] = [
        WaecType::Bece,
        WaecType::Wassce,
        WaecType::Novdec,
        WaecType::Ctvet,
        WaecType::Placement,
    ];

    /// Wire / CSV representation (uppercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            WaecType::Bece => "BECE",
            WaecType::Wassce => "WASSCE",
            WaecType::Novdec => "NOVDEC",
            WaecType::Ctvet => "CTVET",
            WaecType::Placement => "PLACEMENT",
        }
    }

    /// Parse a type name, tolerant of case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BECE" => Some(WaecType::Bece),
            "WASSCE" => Some(WaecType::Wassce),
            "NOVDEC" => Some(WaecType::Novdec),
            "CTVET" => Some(WaecType::Ctvet),
            "PLACEMENT" | "CSSPS" => Some(WaecType::Placement),
            _ => None,
        }
    }
}

impl std::fmt::Display for WaecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WaecType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown waec_type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_case() {
        assert_eq!(WaecType::parse("bece"), Some(WaecType::Bece));
        assert_eq!(WaecType::parse(" WASSCE "), Some(WaecType::Wassce));
        assert_eq!(WaecType::parse("cssps"), Some(WaecType::Placement));
        assert_eq!(WaecType::parse("gce"), None);
    }

    #[test]
    fn test_serde_uppercase() {
        let json = serde_json::to_string(&WaecType::Novdec).unwrap();
        assert_eq!(json, "\"NOVDEC\"");
        let back: WaecType = serde_json::from_str("\"CTVET\"").unwrap();
        assert_eq!(back, WaecType::Ctvet);
    }
}
