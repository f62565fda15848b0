//! Mock backend API handlers

use crate::state::{AppState, OtpSession};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rand::Rng;
use shared::error::{ApiError, ApiResult};
use shared::models::{Checker, InventoryItem, InventoryReport, Order, OrderStatus, PaymentStatus, StatsReport, TypeSales};
use shared::request::{
    CheckerFilter, InitiateOrderRequest, LoginRequest, OrderFilter, RetrieveInitiateRequest,
    RetrieveVerifyRequest, UpdateOrderStatusRequest,
};
use shared::response::{
    AvailabilityResponse, DataEnvelope, InitiateOrderResponse, LoginResponse, OrderDetailPayload,
    OrderWithCheckers, PaymentVerifyResponse, RetrieveInitiateResponse, RetrieveVerifyResponse,
    UploadReport,
};
use shared::types::WaecType;
use std::collections::HashSet;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

const OTP_ATTEMPTS: u32 = 3;
const LOW_STOCK_THRESHOLD: u64 = 10;
const UNIT_PRICE: f64 = 17.5;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/admin/login", post(admin_login))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}", get(order_detail).delete(delete_order))
        .route("/admin/orders/{id}/status", put(update_order_status))
        .route("/admin/checkers", get(list_checkers))
        .route("/admin/checkers/upload", post(upload_checkers))
        .route("/admin/inventory", get(inventory))
        .route("/admin/stats", get(stats))
        .route("/checkers/availability", get(availability))
        .route("/orders/initiate", post(initiate_order))
        .route("/orders/verify/{reference}", get(verify_payment))
        .route("/retrieve/initiate", post(retrieve_initiate))
        .route("/retrieve/verify", post(retrieve_verify))
        .route("/retrieve/notify", post(retrieve_notify))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Auth
// ============================================================================

fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    if let Some(expected) = &state.config.api_key {
        let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Err(ApiError::Unauthorized);
        }
    }
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || !state.tokens.contains_key(token) {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.email != state.config.admin_email || req.password != state.config.admin_password {
        return Err(ApiError::Unauthorized);
    }
    let token = Uuid::new_v4().to_string();
    state.tokens.insert(token.clone(), ());
    tracing::debug!(email = %req.email, "admin login");
    Ok(Json(LoginResponse {
        access_token: token,
    }))
}

// ============================================================================
// Admin: orders
// ============================================================================

async fn list_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Json<DataEnvelope<Vec<Order>>>> {
    require_admin(&state, &headers)?;
    let mut orders: Vec<Order> = state
        .orders
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|order| {
            filter.status.map_or(true, |status| order.status == status)
                && filter
                    .waec_type
                    .map_or(true, |waec_type| order.waec_type == waec_type)
                && filter
                    .phone
                    .as_ref()
                    .map_or(true, |phone| &order.phone == phone)
        })
        .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(DataEnvelope { data: orders }))
}

fn checkers_for_order(state: &AppState, order_id: &str) -> Vec<Checker> {
    state
        .checkers
        .iter()
        .filter(|c| c.order_id.as_deref() == Some(order_id))
        .map(|c| c.value().clone())
        .collect()
}

async fn order_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<DataEnvelope<OrderDetailPayload>>> {
    require_admin(&state, &headers)?;
    let order = state
        .orders
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    let detail = OrderWithCheckers {
        checkers: checkers_for_order(&state, &order.id),
        order,
    };
    // Some deployments wrap the detail in a one-element array
    let payload = if state.config.detail_as_list {
        OrderDetailPayload::List(vec![detail])
    } else {
        OrderDetailPayload::Detail(detail)
    };
    Ok(Json(DataEnvelope { data: payload }))
}

async fn update_order_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<DataEnvelope<Order>>> {
    require_admin(&state, &headers)?;
    let mut order = state
        .orders
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    order.status = req.status;
    order.updated_at = Some(chrono::Utc::now().to_rfc3339());
    Ok(Json(DataEnvelope {
        data: order.clone(),
    }))
}

async fn delete_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_admin(&state, &headers)?;
    state
        .orders
        .remove(&id)
        .ok_or_else(|| ApiError::not_found("Order not found"))?;
    // Release the checkers the order held
    let freed: Vec<String> = state
        .checkers
        .iter()
        .filter(|c| c.order_id.as_deref() == Some(id.as_str()))
        .map(|c| c.id.clone())
        .collect();
    for checker_id in freed {
        if let Some(mut checker) = state.checkers.get_mut(&checker_id) {
            checker.assigned = false;
            checker.order_id = None;
            checker.assigned_at = None;
        }
    }
    Ok(Json(serde_json::json!({ "message": "Order deleted" })))
}

// ============================================================================
// Admin: checkers / inventory / stats
// ============================================================================

async fn list_checkers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filter): Query<CheckerFilter>,
) -> ApiResult<Json<DataEnvelope<Vec<Checker>>>> {
    require_admin(&state, &headers)?;
    let mut checkers: Vec<Checker> = state
        .checkers
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|checker| {
            filter
                .waec_type
                .map_or(true, |waec_type| checker.waec_type == Some(waec_type))
                && filter
                    .assigned
                    .map_or(true, |assigned| checker.assigned == assigned)
        })
        .collect();
    checkers.sort_by(|a, b| a.serial.cmp(&b.serial));
    Ok(Json(DataEnvelope { data: checkers }))
}

async fn upload_checkers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReport>> {
    require_admin(&state, &headers)?;

    let mut text: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("Malformed upload: {err}")))?
    {
        if field.name() == Some("file") {
            let data = field
                .text()
                .await
                .map_err(|err| ApiError::validation(format!("Unreadable file: {err}")))?;
            text = Some(data);
        }
    }
    let text = text.ok_or_else(|| ApiError::validation("Missing file field"))?;

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(ApiError::validation("CSV contains no data rows"));
    }
    let header: Vec<String> = lines[0]
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();
    let position = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ApiError::validation(format!("Missing required header: {name}")))
    };
    let serial_idx = position("serial")?;
    let pin_idx = position("pin")?;
    let type_idx = position("waec_type")?;

    let mut known_serials: HashSet<String> = state
        .checkers
        .iter()
        .map(|checker| checker.serial.clone())
        .collect();

    let mut report = UploadReport::default();
    for (line_no, line) in lines[1..].iter().enumerate() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let serial = fields.get(serial_idx).copied().unwrap_or("");
        let pin = fields.get(pin_idx).copied().unwrap_or("");
        let type_raw = fields.get(type_idx).copied().unwrap_or("");

        if serial.is_empty() || pin.is_empty() {
            report
                .errors
                .push(format!("row {}: missing serial or pin", line_no + 2));
            continue;
        }
        let Some(waec_type) = WaecType::parse(type_raw) else {
            report
                .errors
                .push(format!("row {}: unknown waec_type '{type_raw}'", line_no + 2));
            continue;
        };
        if !known_serials.insert(serial.to_string()) {
            report.skipped += 1;
            continue;
        }

        let id = Uuid::new_v4().to_string();
        state.checkers.insert(
            id.clone(),
            Checker {
                id,
                serial: serial.to_string(),
                pin: pin.to_string(),
                waec_type: Some(waec_type),
                assigned: false,
                order_id: None,
                assigned_at: None,
                created_at: Some(chrono::Utc::now().to_rfc3339()),
                updated_at: None,
            },
        );
        report.inserted += 1;
    }

    tracing::info!(
        inserted = report.inserted,
        skipped = report.skipped,
        errors = report.errors.len(),
        "checker upload processed"
    );
    Ok(Json(report))
}

async fn inventory(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<DataEnvelope<InventoryReport>>> {
    require_admin(&state, &headers)?;
    let mut report = InventoryReport::default();
    for waec_type in WaecType::ALL {
        let total = state
            .checkers
            .iter()
            .filter(|c| c.waec_type == Some(waec_type))
            .count() as u64;
        if total == 0 {
            continue;
        }
        let available = state.available_count(waec_type);
        report.by_waec_type.push(InventoryItem {
            waec_type,
            total,
            assigned: total - available,
            available,
        });
        if available < LOW_STOCK_THRESHOLD {
            report.low_stock.push(waec_type.to_string());
        }
    }
    Ok(Json(DataEnvelope { data: report }))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<DataEnvelope<StatsReport>>> {
    require_admin(&state, &headers)?;
    let mut report = StatsReport::default();
    for order in state.orders.iter() {
        report.total_orders += 1;
        if order.is_paid() {
            report.paid_orders += 1;
            report.revenue += order.paid_amount();
            match report
                .by_waec_type
                .iter_mut()
                .find(|entry| entry.waec_type == order.waec_type)
            {
                Some(entry) => {
                    entry.quantity += order.quantity as u64;
                    entry.revenue += order.paid_amount();
                }
                None => report.by_waec_type.push(TypeSales {
                    waec_type: order.waec_type,
                    quantity: order.quantity as u64,
                    revenue: order.paid_amount(),
                }),
            }
        }
    }
    Ok(Json(DataEnvelope { data: report }))
}

// ============================================================================
// Public: availability / purchase
// ============================================================================

#[derive(serde::Deserialize)]
struct AvailabilityQuery {
    waec_type: String,
}

async fn availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Json<AvailabilityResponse> {
    // The real backend reports errors inside the body of a 200
    let Some(waec_type) = WaecType::parse(&query.waec_type) else {
        return Json(AvailabilityResponse {
            status_code: 400,
            message: format!("Unknown waec_type '{}'", query.waec_type),
            count: 0,
            data: None,
        });
    };
    let count = state.available_count(waec_type);
    Json(AvailabilityResponse {
        status_code: 200,
        message: format!("{count} {waec_type} checkers available"),
        count,
        data: None,
    })
}

async fn initiate_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitiateOrderRequest>,
) -> ApiResult<Json<InitiateOrderResponse>> {
    if req.phone.is_empty() {
        return Err(ApiError::validation("Phone is required"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::validation("Invalid email"));
    }
    if req.quantity == 0 {
        return Err(ApiError::validation("Quantity must be at least 1"));
    }
    if state.available_count(req.waec_type) < req.quantity as u64 {
        return Err(ApiError::business_rule(format!(
            "{} checkers are currently unavailable",
            req.waec_type
        )));
    }

    let reference = Uuid::new_v4().simple().to_string();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        phone: req.phone,
        email: req.email,
        waec_type: req.waec_type,
        quantity: req.quantity,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        payment_reference: Some(reference.clone()),
        amount: Some(UNIT_PRICE * req.quantity as f64),
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: None,
    };
    let response = InitiateOrderResponse {
        order_id: order.id.clone(),
        payment_url: format!("https://pay.example.com/checkout/{reference}"),
    };
    state.orders.insert(order.id.clone(), order);
    Ok(Json(response))
}

async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Json<PaymentVerifyResponse>> {
    let order_id = state
        .orders
        .iter()
        .find(|o| o.payment_reference.as_deref() == Some(reference.as_str()))
        .map(|o| o.id.clone())
        .ok_or_else(|| ApiError::not_found("Unknown payment reference"))?;

    // Idempotent: a second verify returns the already-assigned set
    let (order, already_paid) = {
        let order = state.orders.get(&order_id).expect("order present").clone();
        let paid = order.is_paid();
        (order, paid)
    };

    if !already_paid {
        let candidates: Vec<String> = state
            .checkers
            .iter()
            .filter(|c| !c.assigned && c.waec_type == Some(order.waec_type))
            .take(order.quantity as usize)
            .map(|c| c.id.clone())
            .collect();
        if candidates.len() < order.quantity as usize {
            return Err(ApiError::business_rule("Insufficient checker inventory"));
        }
        let now = chrono::Utc::now().to_rfc3339();
        for checker_id in candidates {
            if let Some(mut checker) = state.checkers.get_mut(&checker_id) {
                checker.assigned = true;
                checker.order_id = Some(order_id.clone());
                checker.assigned_at = Some(now.clone());
            }
        }
        if let Some(mut stored) = state.orders.get_mut(&order_id) {
            stored.status = OrderStatus::Completed;
            stored.payment_status = PaymentStatus::Paid;
            stored.updated_at = Some(now);
        }
    }

    let order = state.orders.get(&order_id).expect("order present").clone();
    let checkers = checkers_for_order(&state, &order_id);
    Ok(Json(PaymentVerifyResponse {
        status: "paid".into(),
        order: Some(OrderWithCheckers { order, checkers }),
    }))
}

// ============================================================================
// Public: retrieve flow
// ============================================================================

fn checkers_for_phone(state: &AppState, phone: &str) -> Vec<Checker> {
    let order_ids: HashSet<String> = state
        .orders
        .iter()
        .filter(|o| o.phone == phone && o.is_paid())
        .map(|o| o.id.clone())
        .collect();
    state
        .checkers
        .iter()
        .filter(|c| {
            c.order_id
                .as_ref()
                .map_or(false, |order_id| order_ids.contains(order_id))
        })
        .map(|c| Checker::credential(c.id.clone(), c.serial.clone(), c.pin.clone()))
        .collect()
}

async fn retrieve_initiate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveInitiateRequest>,
) -> ApiResult<Json<RetrieveInitiateResponse>> {
    if req.phone.is_empty() {
        return Err(ApiError::validation("Phone is required"));
    }
    if checkers_for_phone(&state, &req.phone).is_empty() {
        return Err(ApiError::not_found("No checker found for this number"));
    }

    let request_id = Uuid::new_v4().to_string();
    let prefix = format!("{:04x}", rand::thread_rng().gen_range(0u32..0x1_0000));
    state.otp_sessions.insert(
        request_id.clone(),
        OtpSession {
            phone: req.phone,
            prefix: prefix.clone(),
            code: state.config.otp_code.clone(),
            attempts_remaining: OTP_ATTEMPTS,
        },
    );
    Ok(Json(RetrieveInitiateResponse {
        request_id,
        prefix,
        message: Some("OTP sent".into()),
    }))
}

async fn retrieve_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveVerifyRequest>,
) -> Response {
    let failure = |message: &str| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": message })),
        )
            .into_response()
    };

    let Some(mut session) = state.otp_sessions.get_mut(&req.request_id) else {
        return failure("Unknown or expired request");
    };
    if session.prefix != req.prefix || session.phone != req.phone {
        return failure("Request mismatch");
    }
    if session.code != req.otp {
        session.attempts_remaining = session.attempts_remaining.saturating_sub(1);
        let exhausted = session.attempts_remaining == 0;
        drop(session);
        if exhausted {
            state.otp_sessions.remove(&req.request_id);
            return failure("Too many attempts, request a new code");
        }
        return failure("Invalid code");
    }
    drop(session);
    state.otp_sessions.remove(&req.request_id);

    let checkers = checkers_for_phone(&state, &req.phone);

    // Quirk reproduction: some deployments answer a successful
    // verification with an error status whose message says otherwise
    if state.config.verify_success_via_error {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "message": "OTP verified successfully",
                "checkers": checkers,
            })),
        )
            .into_response();
    }

    Json(RetrieveVerifyResponse {
        status: Some("success".into()),
        message: Some("OTP verified successfully".into()),
        checkers: Some(checkers),
    })
    .into_response()
}

async fn retrieve_notify() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Notification sent" }))
}
