use reqwest::StatusCode;

/// Failure of a single platform API call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP status, with the server-provided detail
    #[error("[{status}] {detail}")]
    Status { status: u16, detail: String },

    /// Connection, TLS, or timeout failure
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Success status but a body that does not match the expected shape
    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status code, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Build a status error from a failed response body
    ///
    /// Prefers the JSON `detail` field, then the whole JSON document, then the raw text.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let detail = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(map)) => match map.get("detail") {
                Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail.clone(),
                Some(detail) if !detail.is_null() => detail.to_string(),
                _ => serde_json::Value::Object(map).to_string(),
            },
            Ok(other) => other.to_string(),
            Err(_) => body.to_string(),
        };

        ApiError::Status {
            status: status.as_u16(),
            detail,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(err: ApiError) -> String {
        match err {
            ApiError::Status { detail, .. } => detail,
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_detail_field_preferred() {
        let err = ApiError::from_body(StatusCode::CONFLICT, r#"{"detail": "deploy already running"}"#);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "[409] deploy already running");
        assert_eq!(detail(err), "deploy already running");
    }

    #[test]
    fn test_json_without_detail() {
        let err = ApiError::from_body(StatusCode::BAD_REQUEST, r#"{"git":["required"]}"#);
        assert_eq!(detail(err), r#"{"git":["required"]}"#);
    }

    #[test]
    fn test_raw_text_body() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");
        assert_eq!(detail(err), "<html>Bad Gateway</html>");
    }

    #[test]
    fn test_unauthorized() {
        let err = ApiError::from_body(StatusCode::UNAUTHORIZED, r#"{"detail": "invalid token"}"#);
        assert!(err.is_unauthorized());
    }
}
