//! Admin client
//!
//! Authenticated surface for the back-office: orders, checker
//! inventory, CSV upload, and dashboard analytics. All reads go
//! through the TTL cache; every mutation invalidates the resource
//! patterns it touches. A 401 clears the session and the cache before
//! the error propagates, so the caller's only job is to redirect to
//! login.

use crate::cache::{CacheService, Clock, SystemClock, TtlClass};
use crate::config::ClientConfig;
use crate::envelope::{normalize_order_detail, unwrap_data};
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::session::SessionHandle;
use crate::upload::CsvFile;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::models::{Checker, InventoryReport, Order, OrderStatus, StatsReport};
use shared::request::{CheckerFilter, LoginRequest, OrderFilter, UpdateOrderStatusRequest};
use shared::response::{DataEnvelope, LoginResponse, OrderDetailPayload, OrderWithCheckers, UploadReport};
use std::future::Future;
use std::sync::Arc;

/// Composed view for the admin landing page. The three fetches are
/// independent and issued concurrently.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub inventory: InventoryReport,
    pub recent_orders: Vec<Order>,
    pub stats: StatsReport,
}

/// Client for the admin backend.
#[derive(Clone)]
pub struct AdminClient {
    http: HttpClient,
    cache: Arc<CacheService>,
    session: SessionHandle,
}

impl AdminClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Construct with an injected clock (tests drive cache expiry).
    pub fn with_clock(config: &ClientConfig, clock: Arc<dyn Clock>) -> ClientResult<Self> {
        let session = SessionHandle::new();
        let mut http = HttpClient::new(&config.admin_base_url, config.timeout)?
            .with_session(session.clone());
        if let Some(key) = &config.api_key {
            http = http.with_api_key(key.clone());
        }
        Ok(Self {
            http,
            cache: Arc::new(CacheService::new(clock)),
            session,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Translate a 401 into a forced logout before rethrowing.
    fn guard<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(ClientError::Unauthorized) = &result {
            tracing::warn!("admin call returned 401; clearing session and cache");
            self.session.clear();
            self.cache.clear();
        }
        result
    }

    /// Read-through cache helper: hit -> no network; expired or miss
    /// -> fetch and store.
    async fn cached<T, F, Fut>(&self, key: &str, class: TtlClass, fetch: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(hit) = self.cache.get::<T>(key) {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }
        let value = self.guard(fetch().await)?;
        self.cache.insert(key, &value, class);
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Login and store the bearer token in the session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.http.post("auth/admin/login", &request).await?;
        self.session.set_login(response.access_token, None);
        self.cache.clear();
        Ok(())
    }

    /// Drop credentials and cached data.
    pub fn logout(&self) {
        self.session.clear();
        self.cache.clear();
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// List orders. Every distinct filter combination gets its own
    /// cache key so differently-filtered queries never shadow each
    /// other.
    pub async fn list_orders(&self, filter: &OrderFilter) -> ClientResult<Vec<Order>> {
        let query = filter.to_query();
        let key = format!("orders:{query}");
        let path = if query.is_empty() {
            "admin/orders".to_string()
        } else {
            format!("admin/orders?{query}")
        };
        self.cached(&key, TtlClass::Orders, || async {
            let envelope: DataEnvelope<Vec<Order>> = self.http.get(&path).await?;
            Ok(unwrap_data(envelope))
        })
        .await
    }

    /// Fetch one order with its checkers, whichever envelope shape the
    /// backend chose.
    pub async fn order_detail(&self, order_id: &str) -> ClientResult<OrderWithCheckers> {
        let key = format!("orders:detail:{order_id}");
        let path = format!("admin/orders/{order_id}");
        self.cached(&key, TtlClass::Orders, || async {
            let envelope: DataEnvelope<OrderDetailPayload> = self.http.get(&path).await?;
            normalize_order_detail(unwrap_data(envelope))
        })
        .await
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<Order> {
        let request = UpdateOrderStatusRequest { status };
        let result: ClientResult<DataEnvelope<Order>> = self
            .http
            .put(&format!("admin/orders/{order_id}/status"), &request)
            .await;
        let envelope = self.guard(result)?;
        self.cache.invalidate("orders");
        self.cache.invalidate("stats");
        Ok(unwrap_data(envelope))
    }

    pub async fn delete_order(&self, order_id: &str) -> ClientResult<()> {
        let result: ClientResult<serde_json::Value> =
            self.http.delete(&format!("admin/orders/{order_id}")).await;
        self.guard(result)?;
        // Deleting an order releases its checkers
        self.cache.invalidate("orders");
        self.cache.invalidate("checkers");
        self.cache.invalidate("inventory");
        self.cache.invalidate("stats");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Checkers / inventory
    // ------------------------------------------------------------------

    pub async fn list_checkers(&self, filter: &CheckerFilter) -> ClientResult<Vec<Checker>> {
        let query = filter.to_query();
        let key = format!("checkers:{query}");
        let path = if query.is_empty() {
            "admin/checkers".to_string()
        } else {
            format!("admin/checkers?{query}")
        };
        self.cached(&key, TtlClass::Checkers, || async {
            let envelope: DataEnvelope<Vec<Checker>> = self.http.get(&path).await?;
            Ok(unwrap_data(envelope))
        })
        .await
    }

    /// Submit the raw CSV file as multipart form data. The server
    /// validates, deduplicates, and inserts; its report is surfaced
    /// verbatim.
    pub async fn upload_checkers(&self, file: &CsvFile) -> ClientResult<UploadReport> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.content_type.as_deref().unwrap_or("text/csv"))
            .map_err(|err| ClientError::Validation(err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let result = self.http.post_multipart("admin/checkers/upload", form).await;
        let report: UploadReport = self.guard(result)?;

        self.cache.invalidate("checkers");
        self.cache.invalidate("inventory");
        self.cache.invalidate("stats");
        Ok(report)
    }

    pub async fn inventory(&self) -> ClientResult<InventoryReport> {
        self.cached("inventory", TtlClass::Inventory, || async {
            let envelope: DataEnvelope<InventoryReport> =
                self.http.get("admin/inventory").await?;
            Ok(unwrap_data(envelope))
        })
        .await
    }

    pub async fn stats(&self) -> ClientResult<StatsReport> {
        self.cached("stats", TtlClass::Stats, || async {
            let envelope: DataEnvelope<StatsReport> = self.http.get("admin/stats").await?;
            Ok(unwrap_data(envelope))
        })
        .await
    }

    /// Fetch the dashboard's independent resources concurrently and
    /// wait for all of them before composing the view.
    pub async fn dashboard(&self) -> ClientResult<Dashboard> {
        let filter = OrderFilter::default();
        let (inventory, recent_orders, stats) = tokio::try_join!(
            self.inventory(),
            self.list_orders(&filter),
            self.stats(),
        )?;
        Ok(Dashboard {
            inventory,
            recent_orders,
            stats,
        })
    }
}
