use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport-level failure: connect, timeout, TLS, malformed response stream.
    #[error("connection: {0}")]
    Connection(#[from] reqwest::Error),

    /// The engine answered with a non-OK status. `message` carries the
    /// server-provided explanation when one could be extracted.
    #[error("engine returned {status}: {message}")]
    Http {
        status: u16,
        error_type: Option<String>,
        message: String,
    },

    /// A request could not even be built (missing mandatory id, bad base URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// HTTP status of the failed request, when the engine got far enough to answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            EngineError::Http { status, .. } => Some(*status),
            EngineError::Connection(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            EngineError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Build an [`EngineError::Http`] from a non-OK response body.
    ///
    /// The engine reports errors as `{"type": ..., "message": ...}`; anything
    /// else falls back to the raw body, or the bare status when the body is empty.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let error_type = parsed
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(|v| v.as_str())
            .map(str::to_owned);
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_owned()
                }
            });
        EngineError::Http {
            status,
            error_type,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── from_response: server message extraction ──────────────────

    #[test]
    fn extracts_engine_error_body() {
        let err = EngineError::from_response(
            400,
            r#"{"type":"InvalidRequestException","message":"query parameter broken"}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.message(), "query parameter broken");
        match err {
            EngineError::Http { error_type, .. } => {
                assert_eq!(error_type.as_deref(), Some("InvalidRequestException"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body() {
        let err = EngineError::from_response(502, "bad gateway");
        assert_eq!(err.message(), "bad gateway");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn falls_back_to_status_when_body_empty() {
        let err = EngineError::from_response(404, "");
        assert_eq!(err.message(), "HTTP 404");
    }

    #[test]
    fn non_json_body_keeps_type_none() {
        let err = EngineError::from_response(500, "<html>oops</html>");
        match err {
            EngineError::Http { error_type, .. } => assert!(error_type.is_none()),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    // ── Display ──────────────────────────────────────────────────

    #[test]
    fn display_http() {
        let err = EngineError::from_response(403, r#"{"message":"no access"}"#);
        assert_eq!(err.to_string(), "engine returned 403: no access");
    }

    #[test]
    fn display_invalid_request() {
        let err = EngineError::InvalidRequest("task id is mandatory".into());
        assert_eq!(err.to_string(), "invalid request: task id is mandatory");
        assert_eq!(err.status(), None);
    }
}
