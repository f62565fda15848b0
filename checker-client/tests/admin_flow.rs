// checker-client/tests/admin_flow.rs
// Admin surface: login, CSV upload pipeline, cache behavior, and
// envelope normalization against the mock backend.

use backend_mock::{AppState, MockConfig};
use checker_client::{
    AdminClient, ClientConfig, ClientError, CsvFile, ManualClock, StorefrontClient,
    UploadPipeline, WaecType,
};
use shared::request::{CheckerFilter, InitiateOrderRequest, OrderFilter};
use std::sync::Arc;

const API_KEY: &str = "test-api-key";

async fn start_mock(config: MockConfig) -> (Arc<AppState>, ClientConfig) {
    let state = Arc::new(AppState::new(config));
    let (addr, _handle) = backend_mock::serve(state.clone()).await.unwrap();
    let client_config = ClientConfig::new(format!("http://{addr}")).with_api_key(API_KEY);
    (state, client_config)
}

async fn logged_in_admin(config: &ClientConfig, clock: Arc<ManualClock>) -> AdminClient {
    let admin = AdminClient::with_clock(config, clock).unwrap();
    admin.login("admin@example.com", "admin123").await.unwrap();
    assert!(admin.session().is_authenticated());
    admin
}

fn upload_csv(rows: &[(&str, &str, &str)]) -> CsvFile {
    let mut text = String::from("serial,pin,waec_type\n");
    for (serial, pin, waec_type) in rows {
        text.push_str(&format!("{serial},{pin},{waec_type}\n"));
    }
    CsvFile::new("batch.csv", text.into_bytes())
}

#[tokio::test]
async fn test_upload_report_counts_surface_verbatim() {
    let (_state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = logged_in_admin(&config, clock).await;

    // 8 unique rows, 2 duplicates, 1 unknown exam type
    let mut rows: Vec<(String, String, String)> = (0..8)
        .map(|i| (format!("S{i}"), format!("P{i}"), "BECE".to_string()))
        .collect();
    rows.push(("S0".into(), "P0".into(), "BECE".into()));
    rows.push(("S1".into(), "P1".into(), "BECE".into()));
    rows.push(("S9".into(), "P9".into(), "GCE".into()));
    let borrowed: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
        .collect();

    let mut pipeline = UploadPipeline::new();
    pipeline.select_file(upload_csv(&borrowed)).unwrap();
    assert_eq!(pipeline.total_rows(), 11);

    let report = pipeline.submit(&admin).await.unwrap();
    assert_eq!(report.inserted, 8);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("GCE"));

    // Batch discarded after acknowledgment, report retained
    assert!(!pipeline.has_file());
    assert_eq!(pipeline.report().unwrap().inserted, 8);
}

#[tokio::test]
async fn test_upload_failure_keeps_file_for_retry() {
    let (_state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = AdminClient::with_clock(&config, clock).unwrap();

    let mut pipeline = UploadPipeline::new();
    pipeline
        .select_file(upload_csv(&[("S1", "P1", "BECE")]))
        .unwrap();

    // Not logged in: the backend answers 401
    let err = pipeline.submit(&admin).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(pipeline.has_file());

    // Retry after login without re-selecting the file
    admin.login("admin@example.com", "admin123").await.unwrap();
    let report = pipeline.submit(&admin).await.unwrap();
    assert_eq!(report.inserted, 1);
}

#[tokio::test]
async fn test_mutation_invalidates_cached_reads() {
    let (_state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = logged_in_admin(&config, clock).await;

    let before = admin.inventory().await.unwrap();
    assert!(before.by_waec_type.is_empty());

    let file = upload_csv(&[("S1", "P1", "NOVDEC"), ("S2", "P2", "NOVDEC")]);
    admin.upload_checkers(&file).await.unwrap();

    // Upload invalidated the inventory key; the fresh report is
    // visible immediately, well inside the 2-minute TTL
    let after = admin.inventory().await.unwrap();
    assert_eq!(after.by_waec_type.len(), 1);
    assert_eq!(after.by_waec_type[0].total, 2);
    assert_eq!(after.by_waec_type[0].available, 2);
    assert!(after.low_stock.contains(&"NOVDEC".to_string()));
}

#[tokio::test]
async fn test_cached_list_served_until_ttl_expires() {
    let (state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = logged_in_admin(&config, clock.clone()).await;
    let storefront = StorefrontClient::new(&config).unwrap();

    for i in 0..3 {
        state.seed_checker(&format!("W{i}"), &format!("P{i}"), WaecType::Wassce);
    }

    let orders = admin.list_orders(&OrderFilter::default()).await.unwrap();
    assert!(orders.is_empty());

    // A customer orders behind the cache's back
    storefront
        .initiate_order(&InitiateOrderRequest {
            waec_type: WaecType::Wassce,
            quantity: 1,
            phone: "233543482189".into(),
            email: "c@example.com".into(),
        })
        .await
        .unwrap();

    // Still inside the 5-minute orders TTL: the stale list is served
    clock.advance_secs(299);
    let cached = admin.list_orders(&OrderFilter::default()).await.unwrap();
    assert!(cached.is_empty());

    // Past the TTL: the entry is evicted and refetched
    clock.advance_secs(2);
    let fresh = admin.list_orders(&OrderFilter::default()).await.unwrap();
    assert_eq!(fresh.len(), 1);
}

#[tokio::test]
async fn test_distinct_filters_use_distinct_cache_keys() {
    let (_state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = logged_in_admin(&config, clock).await;

    let file = upload_csv(&[("A1", "P1", "BECE"), ("A2", "P2", "WASSCE")]);
    admin.upload_checkers(&file).await.unwrap();

    let bece = admin
        .list_checkers(&CheckerFilter {
            waec_type: Some(WaecType::Bece),
            assigned: None,
        })
        .await
        .unwrap();
    let wassce = admin
        .list_checkers(&CheckerFilter {
            waec_type: Some(WaecType::Wassce),
            assigned: None,
        })
        .await
        .unwrap();

    assert_eq!(bece.len(), 1);
    assert_eq!(bece[0].serial, "A1");
    assert_eq!(wassce.len(), 1);
    assert_eq!(wassce[0].serial, "A2");
}

#[tokio::test]
async fn test_unauthorized_forces_logout_and_cache_clear() {
    let (_state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = AdminClient::with_clock(&config, clock).unwrap();

    // A stale token from a previous run
    admin.session().set_login("stale-token", None);
    assert!(admin.session().is_authenticated());

    let err = admin.inventory().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));
    assert!(!admin.session().is_authenticated());
    assert!(admin.cache().is_empty());
}

#[tokio::test]
async fn test_order_detail_normalizes_both_envelope_shapes() {
    for detail_as_list in [false, true] {
        let config = MockConfig::default()
            .with_api_key(API_KEY)
            .with_detail_as_list(detail_as_list);
        let (state, client_config) = start_mock(config).await;
        let clock = Arc::new(ManualClock::new(0));
        let admin = logged_in_admin(&client_config, clock).await;
        let storefront = StorefrontClient::new(&client_config).unwrap();

        state.seed_checker("D1", "P1", WaecType::Ctvet);
        let initiated = storefront
            .initiate_order(&InitiateOrderRequest {
                waec_type: WaecType::Ctvet,
                quantity: 1,
                phone: "233543482189".into(),
                email: "c@example.com".into(),
            })
            .await
            .unwrap();
        let reference = initiated.payment_url.rsplit('/').next().unwrap();
        storefront.verify_payment(reference).await.unwrap();

        let detail = admin.order_detail(&initiated.order_id).await.unwrap();
        assert_eq!(detail.order.id, initiated.order_id);
        assert_eq!(detail.checkers.len(), 1);
        assert_eq!(detail.checkers[0].serial, "D1");
    }
}

#[tokio::test]
async fn test_dashboard_composes_concurrent_fetches() {
    let (_state, config) = start_mock(MockConfig::default().with_api_key(API_KEY)).await;
    let clock = Arc::new(ManualClock::new(0));
    let admin = logged_in_admin(&config, clock).await;

    let file = upload_csv(&[("B1", "P1", "BECE")]);
    admin.upload_checkers(&file).await.unwrap();

    let dashboard = admin.dashboard().await.unwrap();
    assert_eq!(dashboard.inventory.by_waec_type.len(), 1);
    assert!(dashboard.recent_orders.is_empty());
    assert_eq!(dashboard.stats.total_orders, 0);
}
