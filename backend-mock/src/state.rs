//! Mock backend state

use dashmap::DashMap;
use shared::models::{Checker, Order};
use shared::types::WaecType;
use uuid::Uuid;

/// Knobs for the mock, including the real backend's observed quirks.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub api_key: Option<String>,
    pub admin_email: String,
    pub admin_password: String,
    /// Fixed OTP code handed to every initiate call
    pub otp_code: String,
    /// Deliver OTP verification success as a 400 with a
    /// success-shaped message
    pub verify_success_via_error: bool,
    /// Wrap order detail in a single-element array
    pub detail_as_list: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            admin_email: "admin@example.com".into(),
            admin_password: "admin123".into(),
            otp_code: "1234".into(),
            verify_success_via_error: false,
            detail_as_list: false,
        }
    }
}

impl MockConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("ADMIN_API_KEY").ok(),
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            ..defaults
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_verify_success_via_error(mut self, quirk: bool) -> Self {
        self.verify_success_via_error = quirk;
        self
    }

    pub fn with_detail_as_list(mut self, quirk: bool) -> Self {
        self.detail_as_list = quirk;
        self
    }
}

/// A pending OTP challenge, keyed by request id.
#[derive(Debug, Clone)]
pub struct OtpSession {
    pub phone: String,
    pub prefix: String,
    pub code: String,
    pub attempts_remaining: u32,
}

/// All mock state, in memory.
pub struct AppState {
    pub config: MockConfig,
    pub tokens: DashMap<String, ()>,
    pub checkers: DashMap<String, Checker>,
    pub orders: DashMap<String, Order>,
    pub otp_sessions: DashMap<String, OtpSession>,
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            tokens: DashMap::new(),
            checkers: DashMap::new(),
            orders: DashMap::new(),
            otp_sessions: DashMap::new(),
        }
    }

    /// Seed one unassigned checker (test convenience).
    pub fn seed_checker(&self, serial: &str, pin: &str, waec_type: WaecType) -> String {
        let id = Uuid::new_v4().to_string();
        self.checkers.insert(
            id.clone(),
            Checker {
                id: id.clone(),
                serial: serial.into(),
                pin: pin.into(),
                waec_type: Some(waec_type),
                assigned: false,
                order_id: None,
                assigned_at: None,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                updated_at: None,
            },
        );
        id
    }

    pub fn available_count(&self, waec_type: WaecType) -> u64 {
        self.checkers
            .iter()
            .filter(|c| !c.assigned && c.waec_type == Some(waec_type))
            .count() as u64
    }
}
