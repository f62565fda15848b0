//! Authenticated HTTP wrapper
//!
//! Single choke point for network calls: attaches the bearer token and
//! static API key, enforces the 30-second abort timeout, and maps
//! non-2xx statuses onto the client error taxonomy.

use crate::error::{ClientError, ClientResult};
use crate::session::SessionHandle;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::response::ErrorBody;

/// HTTP client for one backend surface (admin or public).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    session: Option<SessionHandle>,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            session: None,
        })
    }

    /// Attach the static API key header to every call.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Attach the session; its bearer token is read per call.
    pub fn with_session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn apply_headers(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key.clone());
        }
        if let Some(token) = self.session.as_ref().and_then(|s| s.token()) {
            req = req.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        req
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.apply_headers(self.client.get(self.url(path)));
        let response = req.send().await.map_err(ClientError::from_transport)?;
        Self::handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.apply_headers(self.client.post(self.url(path)).json(body));
        let response = req.send().await.map_err(ClientError::from_transport)?;
        Self::handle_response(response).await
    }

    pub async fn put<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let req = self.apply_headers(self.client.put(self.url(path)).json(body));
        let response = req.send().await.map_err(ClientError::from_transport)?;
        Self::handle_response(response).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let req = self.apply_headers(self.client.delete(self.url(path)));
        let response = req.send().await.map_err(ClientError::from_transport)?;
        Self::handle_response(response).await
    }

    /// POST a multipart form (CSV upload).
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        let req = self.apply_headers(self.client.post(self.url(path)).multipart(form));
        let response = req.send().await.map_err(ClientError::from_transport)?;
        Self::handle_response(response).await
    }

    /// POST and hand back status + raw body without treating non-2xx
    /// as an error. The retrieve flow needs to read success-shaped
    /// messages that arrive on the error path.
    pub async fn post_raw<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<(StatusCode, String)> {
        let req = self.apply_headers(self.client.post(self.url(path)).json(body));
        let response = req.send().await.map_err(ClientError::from_transport)?;
        let status = response.status();
        let text = response.text().await.map_err(ClientError::from_transport)?;
        Ok((status, text))
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(ClientError::from_transport)?;
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            return match status {
                StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
                StatusCode::FORBIDDEN => Err(ClientError::Forbidden(message)),
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
                StatusCode::BAD_REQUEST => Err(ClientError::Validation(message)),
                _ => Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                }),
            };
        }
        response
            .json()
            .await
            .map_err(|err| ClientError::InvalidResponse(err.to_string()))
    }
}
