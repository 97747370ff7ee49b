//! HTTP client wrapper - attaches the session token, decodes response
//! envelopes and reports outcomes as notices

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::Envelope;

/// When a client instance reports an outcome to the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Never
    Silent,
    /// Failures only
    Errors,
    /// Successes (with the server message) and failures
    Verbose,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A toast-style message for the front end to display
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Shared REST client. Cloning is cheap; clones share the token slot.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    policy: NotifyPolicy,
    notices: Option<mpsc::UnboundedSender<Notice>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        ApiClient {
            http: create_client(config.request_timeout()),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            policy: NotifyPolicy::Errors,
            notices: None,
        }
    }

    /// Route notices to the given channel
    pub fn with_notices(mut self, notices: mpsc::UnboundedSender<Notice>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn with_policy(&self, policy: NotifyPolicy) -> Self {
        ApiClient {
            policy,
            ..self.clone()
        }
    }

    /// Instance that never notifies (background checks such as polling)
    pub fn silent(&self) -> Self {
        self.with_policy(NotifyPolicy::Silent)
    }

    /// Instance that notifies on failure only (plain fetches)
    pub fn errors(&self) -> Self {
        self.with_policy(NotifyPolicy::Errors)
    }

    /// Instance that notifies on success and failure (mutations)
    pub fn verbose(&self) -> Self {
        self.with_policy(NotifyPolicy::Verbose)
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|slot| slot.clone())
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let req = self.request(Method::GET, path).query(query);
        self.data(Method::GET, path, req).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.request(Method::POST, path).json(body);
        self.data(Method::POST, path, req).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.request(Method::PUT, path).json(body);
        self.data(Method::PUT, path, req).await
    }

    /// POST to an endpoint that answers with a message and no data
    pub async fn post_message<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<String>, ApiError> {
        let req = self.request(Method::POST, path).json(body);
        let envelope = self
            .execute::<serde_json::Value>(Method::POST, path, req)
            .await?;
        Ok(envelope.message)
    }

    /// PUT to an endpoint that answers with a message and no data
    pub async fn put_message<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<String>, ApiError> {
        let req = self.request(Method::PUT, path).json(body);
        let envelope = self
            .execute::<serde_json::Value>(Method::PUT, path, req)
            .await?;
        Ok(envelope.message)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, self.url(path))
            .header("Accept", "application/json");
        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn data<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let envelope = self.execute::<T>(method, path, req).await?;
        envelope.data.ok_or_else(|| {
            let err = ApiError::MissingData;
            self.notify_error(&err);
            err
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let start = Instant::now();
        tracing::info!(method = %method, path, "Sending request");

        let result = send(req).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match &result {
            Ok(envelope) => {
                tracing::info!(method = %method, path, time_ms = elapsed, "Request completed");
                if self.policy == NotifyPolicy::Verbose {
                    let message = envelope.message.clone().unwrap_or_else(|| "Done".to_string());
                    self.emit(Notice::success(message));
                }
            }
            Err(e) => {
                tracing::warn!(method = %method, path, time_ms = elapsed, error = %e, "Request failed");
                self.notify_error(e);
            }
        }
        result
    }

    fn notify_error(&self, err: &ApiError) {
        if self.policy != NotifyPolicy::Silent {
            self.emit(Notice::error(err.user_message()));
        }
    }

    fn emit(&self, notice: Notice) {
        if let Some(tx) = &self.notices {
            let _ = tx.send(notice);
        }
    }
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<Envelope<T>, ApiError> {
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    tracing::debug!(status = status.as_u16(), body = %body, "Response envelope");
    decode_envelope(status, &body)
}

/// Turns a raw HTTP response into an envelope, mapping failures to [`ApiError`]
pub fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Envelope<T>, ApiError> {
    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        return Err(ApiError::Status {
            code: status.as_u16(),
            message,
        });
    }

    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if !envelope.is_success() {
        return Err(ApiError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "Request was rejected".to_string()),
        });
    }
    Ok(envelope)
}

/// Create an HTTP client with the configured timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, timeout_secs = timeout.as_secs(), "Falling back to a default HTTP client without timeout");
            reqwest::Client::new()
        })
}
