//! Public storefront client
//!
//! Unauthenticated calls to the customer backend: availability,
//! order initiation (payment redirect), payment verification, and the
//! raw endpoints behind the retrieve-by-OTP flow.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::retrieve::{map_initiate_response, map_verify_response, RetrieveError, VerifyOutcome};
use shared::request::{InitiateOrderRequest, RetrieveInitiateRequest, RetrieveVerifyRequest};
use shared::response::{
    AvailabilityResponse, InitiateOrderResponse, PaymentVerifyResponse, RetrieveInitiateResponse,
};
use shared::types::WaecType;

/// Client for the public / customer backend.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    http: HttpClient,
}

impl StorefrontClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::new(&config.public_base_url, config.timeout)?;
        Ok(Self { http })
    }

    /// Whether checkers of this type can currently be bought.
    pub async fn availability(&self, waec_type: WaecType) -> ClientResult<AvailabilityResponse> {
        self.http
            .get(&format!("checkers/availability?waec_type={waec_type}"))
            .await
    }

    /// Start a purchase; the caller redirects to `payment_url`.
    pub async fn initiate_order(
        &self,
        request: &InitiateOrderRequest,
    ) -> ClientResult<InitiateOrderResponse> {
        self.http.post("orders/initiate", request).await
    }

    /// Availability-gated purchase entry point.
    pub async fn buy(&self, request: &InitiateOrderRequest) -> ClientResult<InitiateOrderResponse> {
        let availability = self.availability(request.waec_type).await?;
        if !availability.is_available() {
            return Err(ClientError::Api {
                status: 503,
                message: format!(
                    "{} checkers are currently unavailable",
                    request.waec_type
                ),
            });
        }
        self.initiate_order(request).await
    }

    /// Check payment state after the gateway redirects back.
    pub async fn verify_payment(&self, reference: &str) -> ClientResult<PaymentVerifyResponse> {
        self.http.get(&format!("orders/verify/{reference}")).await
    }

    /// Request an OTP for a phone number (retrieve flow step one).
    pub async fn retrieve_initiate(
        &self,
        phone: &str,
    ) -> Result<RetrieveInitiateResponse, RetrieveError> {
        let request = RetrieveInitiateRequest {
            phone: phone.to_string(),
        };
        let raw = self.http.post_raw("retrieve/initiate", &request).await;
        map_initiate_response(raw)
    }

    /// Verify an OTP (retrieve flow step two). Never returns `Err`;
    /// every outcome, including connectivity failure, is a tagged
    /// variant the flow can act on.
    pub async fn retrieve_verify(&self, request: &RetrieveVerifyRequest) -> VerifyOutcome {
        let raw = self.http.post_raw("retrieve/verify", request).await;
        map_verify_response(raw)
    }

    /// Fire-and-forget confirmation after a successful retrieval.
    /// Failures are logged, never surfaced as flow errors. Returns
    /// whether the notification went out.
    pub async fn notify_retrieval(&self, phone: &str, checker_count: usize) -> bool {
        #[derive(serde::Serialize)]
        struct NotifyRequest<'a> {
            phone: &'a str,
            checker_count: usize,
        }
        let request = NotifyRequest {
            phone,
            checker_count,
        };
        match self
            .http
            .post::<serde_json::Value, _>("retrieve/notify", &request)
            .await
        {
            Ok(_) => {
                tracing::debug!(phone, "retrieval notification sent");
                true
            }
            Err(err) => {
                tracing::warn!(phone, %err, "retrieval notification failed");
                false
            }
        }
    }
}
