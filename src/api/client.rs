use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use super::ApiError;
use crate::config::Session;
use crate::shared::{
    App, AppList, CommitStatusTest, DeployTask, StatusSnapshot, User, WebhookDiagnosis,
    WebhookSetup,
};

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("fabroku-cli/", env!("CARGO_PKG_VERSION"));

/// Platform operations the deploy workflow depends on
#[async_trait]
pub trait DeployApi: Send + Sync {
    /// Every app visible to the authenticated user
    async fn list_apps(&self) -> Result<Vec<App>, ApiError>;

    /// Queue a redeploy of an app
    async fn redeploy_app(&self, app_id: &str) -> Result<DeployTask, ApiError>;

    /// Progress of the app's current deploy task
    async fn app_status(&self, app_id: &str) -> Result<StatusSnapshot, ApiError>;
}

/// Authenticated HTTP client for the platform API
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given session
    ///
    /// The token, when present, is sent as `Authorization: CLI <token>`.
    pub fn new(session: &Session) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = session.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("CLI {}", token)).map_err(|_| {
                ApiError::Status {
                    status: 401,
                    detail: "stored token contains invalid characters".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: session.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and return the decoded JSON body
    ///
    /// Never retries. Non-success statuses become [`ApiError::Status`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = %method, url = %url, "API request");

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(method = %method, url = %url, status = status.as_u16(), "API response");

        if !status.is_success() {
            return Err(ApiError::from_body(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text).map_err(ApiError::Decode)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.request(Method::GET, path, None).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.request(Method::POST, path, None).await?;
        serde_json::from_value(value).map_err(ApiError::Decode)
    }

    /// Profile of the token's owner
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/api/auth/users/me/").await
    }

    pub async fn diagnose_webhook(&self, app_id: &str) -> Result<WebhookDiagnosis, ApiError> {
        self.get(&format!("/api/apps/apps/{}/diagnose_webhook/", app_id))
            .await
    }

    /// Create (or confirm) the GitHub webhook for an app
    pub async fn setup_webhook(&self, app_id: &str) -> Result<WebhookSetup, ApiError> {
        self.post(&format!("/api/apps/apps/{}/setup_webhook/", app_id))
            .await
    }

    /// Create and clean up a throwaway commit status on the app's branch
    pub async fn test_commit_status(&self, app_id: &str) -> Result<CommitStatusTest, ApiError> {
        self.post(&format!("/api/apps/apps/{}/test_commit_status/", app_id))
            .await
    }
}

#[async_trait]
impl DeployApi for ApiClient {
    async fn list_apps(&self) -> Result<Vec<App>, ApiError> {
        let list: AppList = self.get("/api/apps/apps/").await?;
        Ok(list.into_apps())
    }

    async fn redeploy_app(&self, app_id: &str) -> Result<DeployTask, ApiError> {
        self.post(&format!("/api/apps/apps/{}/redeploy/", app_id))
            .await
    }

    async fn app_status(&self, app_id: &str) -> Result<StatusSnapshot, ApiError> {
        self.get(&format!("/api/apps/apps/{}/get_app_status/", app_id))
            .await
    }
}
