//! One-shot local listener for the browser OAuth callback
//!
//! The platform redirects the browser to
//! `http://localhost:{port}/callback?token=..&user=..` (or `error`/`message`).
//! The first callback resolves the flow and shuts the server down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tower_http::trace::TraceLayer;

/// How long to wait for the browser to come back
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Query parameters of `/callback`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub token: Option<String>,
    pub user: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// What the browser reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Authenticated { token: String, user: String },
    Rejected { error: String, message: String },
}

impl From<CallbackParams> for CallbackOutcome {
    fn from(params: CallbackParams) -> Self {
        match params.token.filter(|t| !t.is_empty()) {
            Some(token) => CallbackOutcome::Authenticated {
                token,
                user: params
                    .user
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            None => CallbackOutcome::Rejected {
                error: params.error.unwrap_or_default(),
                message: params
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
        }
    }
}

#[derive(Clone)]
struct CallbackState {
    sender: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

/// Build the callback router; the first `/callback` hit is sent on `sender`
pub fn callback_router(sender: oneshot::Sender<CallbackOutcome>) -> Router {
    let state = CallbackState {
        sender: Arc::new(Mutex::new(Some(sender))),
    };

    Router::new()
        .route("/callback", get(handle_callback))
        .fallback(waiting_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let outcome = CallbackOutcome::from(params);

    let page = match &outcome {
        CallbackOutcome::Authenticated { .. } => html_page(
            "Fabroku CLI - Authenticated",
            "<h1>Login successful!</h1><p>You can close this window and return to the terminal.</p>",
        ),
        CallbackOutcome::Rejected { error, message } => {
            let detail = if message.is_empty() { error } else { message };
            html_page(
                "Fabroku CLI - Error",
                &format!("<h1>Authentication failed</h1><p>{}</p>", escape_html(detail)),
            )
        }
    };

    match state.sender.lock().await.take() {
        Some(sender) => {
            let _ = sender.send(outcome);
        }
        None => tracing::debug!("Ignoring repeated login callback"),
    }

    Html(page)
}

async fn waiting_page() -> Html<String> {
    Html(html_page("Fabroku CLI", "<p>Waiting for callback...</p>"))
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>{title}</title>
<style>
  body{{font-family:system-ui,sans-serif;display:flex;justify-content:center;
  align-items:center;min-height:100vh;margin:0;background:#1a1a2e;color:#eee}}
  div{{text-align:center;padding:2rem}}
  h1{{margin-bottom:1rem}}
</style></head>
<body><div>{body}</div></body></html>"#
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Local listener waiting for one callback
pub struct CallbackServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl CallbackServer {
    /// Bind an ephemeral port on localhost
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind local callback port")?;
        let addr = listener
            .local_addr()
            .context("Failed to read callback address")?;
        Ok(Self { listener, addr })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Serve until the first callback or `timeout`; `None` on timeout
    pub async fn wait(self, timeout: Duration) -> Result<Option<CallbackOutcome>> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tracing::debug!(addr = %self.addr, "Waiting for login callback");

        let server = tokio::spawn(
            axum::serve(self.listener, callback_router(outcome_tx))
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .into_future(),
        );

        let outcome = match tokio::time::timeout(timeout, outcome_rx).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(_)) => anyhow::bail!("Callback server stopped unexpectedly"),
            Err(_) => None,
        };

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(result) => result.context("Callback server error")?,
            Err(e) => tracing::debug!(error = %e, "Callback server task did not finish cleanly"),
        }

        Ok(outcome)
    }
}

/// Browser URL that starts the login for a callback on `port`
pub fn login_url(api_url: &str, port: u16) -> Result<url::Url> {
    let mut url = url::Url::parse(api_url.trim_end_matches('/'))
        .with_context(|| format!("Invalid API URL: {}", api_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("API URL cannot be a base: {}", api_url))?
        .pop_if_empty()
        .extend(["api", "auth", "cli", "login", ""]);
    url.query_pairs_mut()
        .append_pair("port", &port.to_string());
    Ok(url)
}
