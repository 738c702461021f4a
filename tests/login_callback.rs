//! Browser callback handling of the login flow

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fabroku::login::{CallbackOutcome, CallbackServer, callback_router};
use http_body_util::BodyExt;
use tokio::sync::oneshot;
use tower::util::ServiceExt;

async fn get(uri: &str) -> (StatusCode, String, oneshot::Receiver<CallbackOutcome>) {
    let (tx, rx) = oneshot::channel();
    let response = callback_router(tx)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap(), rx)
}

#[tokio::test]
async fn test_callback_with_token_authenticates() {
    let (status, body, rx) = get("/callback?token=abc123&user=octocat").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Login successful"));
    assert_eq!(
        rx.await.unwrap(),
        CallbackOutcome::Authenticated {
            token: "abc123".to_string(),
            user: "octocat".to_string(),
        }
    );
}

#[tokio::test]
async fn test_callback_error_is_escaped() {
    let (status, body, rx) =
        get("/callback?error=access_denied&message=%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("&lt;script&gt;"));
    assert!(!body.contains("<script>"));
    assert_eq!(
        rx.await.unwrap(),
        CallbackOutcome::Rejected {
            error: "access_denied".to_string(),
            message: "<script>alert(1)</script>".to_string(),
        }
    );
}

#[tokio::test]
async fn test_other_paths_keep_waiting() {
    let (status, body, rx) = get("/favicon.ico").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Waiting for callback"));
    // Router dropped without a callback: nothing was ever sent
    assert!(rx.await.is_err());
}

#[tokio::test]
async fn test_server_resolves_on_first_callback() {
    let server = CallbackServer::bind().await.unwrap();
    let url = format!(
        "http://127.0.0.1:{}/callback?token=tok&user=dev",
        server.port()
    );

    let waiter = tokio::spawn(server.wait(Duration::from_secs(5)));
    let response = reqwest::get(&url).await.unwrap();
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("Login successful"));

    let outcome = waiter.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        Some(CallbackOutcome::Authenticated {
            token: "tok".to_string(),
            user: "dev".to_string(),
        })
    );
}
