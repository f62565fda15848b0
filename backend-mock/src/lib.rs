//! Mock checker backend
//!
//! In-memory stand-in for the external REST backend, used by
//! integration tests and runnable standalone. It reproduces the real
//! service's contract including its quirks: the `{data: ...}`
//! envelope, the plain `{message}` error body, the two order-detail
//! shapes, and (optionally) OTP verification success delivered through
//! an error-status response.

mod api;
mod state;

pub use state::{AppState, MockConfig, OtpSession};

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Build the full router.
pub fn router(state: Arc<AppState>) -> Router {
    api::router(state)
}

/// Bind an ephemeral port and serve in the background.
pub async fn serve(state: Arc<AppState>) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state);
    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!(%err, "mock backend stopped");
        }
    });
    tracing::info!(%addr, "mock backend listening");
    Ok((addr, handle))
}
