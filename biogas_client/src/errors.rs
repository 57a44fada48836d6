use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request did not reach the server")]
    Network(#[from] reqwest::Error),
    #[error("server responded {status}: {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },
    #[error("session expired: no refresh token is stored")]
    NoRefreshToken,
    #[error("session expired: refresh token rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },
    #[error("session expired: token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("request rejected again after refreshing the session ({status}): {message}")]
    RetryExhausted { status: u16, message: String },
    #[error("no institution selected for institution-scoped endpoints")]
    InvalidInstitution,
    #[error("keyring operation failed")]
    Keyring(#[from] keyring::Error),
    #[error("token file operation failed")]
    Io(#[from] std::io::Error),
    #[error("serialization failed")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
}

impl ClientError {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Builds an `Http` error from a non-2xx response body.
    pub fn from_response(status: StatusCode, body: String) -> Self {
        Self::Http {
            status: status.as_u16(),
            message: server_message(status, &body),
            body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. }
            | Self::RefreshRejected { status, .. }
            | Self::RetryExhausted { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// True when the stored session is gone and the user has to log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::NoRefreshToken
                | Self::RefreshRejected { .. }
                | Self::RefreshFailed(_)
        )
    }

    pub fn display_chain(&self) -> DisplayChainedError<'_> {
        DisplayChainedError { inner: self }
    }
}

/// Outcome of a failed refresh, shared with every caller waiting on it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("no refresh token is stored")]
    NoRefreshToken,
    #[error("refresh token rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Failed(String),
}

impl From<RefreshFailure> for ClientError {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::NoRefreshToken => ClientError::NoRefreshToken,
            RefreshFailure::Rejected { status, message } => {
                ClientError::RefreshRejected { status, message }
            }
            RefreshFailure::Failed(reason) => ClientError::RefreshFailed(reason),
        }
    }
}

/// Picks the human-readable message out of an error body.
///
/// The backend answers with `{"detail": ..}`, `{"message": ..}`, `{"error": ..}`,
/// `{"mensaje": ..}` or serializer field errors such as `{"username": ["taken"]}`.
pub fn server_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| status.to_string())
    };

    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed.starts_with('<') {
            return fallback();
        }
        return trimmed.to_owned();
    };

    for key in ["detail", "message", "error", "mensaje"] {
        if let Some(Value::String(text)) = fields.get(key) {
            return text.clone();
        }
    }

    for (field, value) in &fields {
        if let Some(Value::String(first)) = value.as_array().and_then(|list| list.first()) {
            return format!("{field}: {first}");
        }
    }

    fallback()
}

pub struct DisplayChainedError<'a> {
    inner: &'a (dyn std::error::Error + 'static),
}

impl fmt::Debug for DisplayChainedError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self.inner);

        while let Some(err) = current {
            if first {
                first = false;
            } else {
                write!(f, " -> ")?;
            }

            write!(f, "{err}")?;
            current = err.source();
        }

        Ok(())
    }
}

impl fmt::Display for DisplayChainedError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{ClientError, RefreshFailure, server_message};

    #[test]
    fn prefers_detail_over_other_fields() {
        let body = r#"{"detail": "Credenciales inválidas", "message": "ignored"}"#;
        assert_eq!(
            server_message(StatusCode::UNAUTHORIZED, body),
            "Credenciales inválidas"
        );
    }

    #[test]
    fn falls_back_through_message_and_error() {
        assert_eq!(
            server_message(StatusCode::BAD_REQUEST, r#"{"message": "bad"}"#),
            "bad"
        );
        assert_eq!(
            server_message(StatusCode::FORBIDDEN, r#"{"error": "denied"}"#),
            "denied"
        );
    }

    #[test]
    fn reads_first_field_error() {
        let body = r#"{"username": ["Ya existe un usuario con este nombre."]}"#;
        assert_eq!(
            server_message(StatusCode::BAD_REQUEST, body),
            "username: Ya existe un usuario con este nombre."
        );
    }

    #[test]
    fn uses_reason_phrase_for_empty_or_html_bodies() {
        assert_eq!(
            server_message(StatusCode::NOT_FOUND, ""),
            "Not Found"
        );
        assert_eq!(
            server_message(StatusCode::BAD_GATEWAY, "<html>upstream</html>"),
            "Bad Gateway"
        );
        assert_eq!(
            server_message(StatusCode::NOT_FOUND, "Recurso no encontrado"),
            "Recurso no encontrado"
        );
    }

    #[test]
    fn refresh_failures_map_to_session_expiry() {
        let errors: Vec<ClientError> = vec![
            RefreshFailure::NoRefreshToken.into(),
            RefreshFailure::Rejected {
                status: 401,
                message: "Token is invalid or expired".to_owned(),
            }
            .into(),
            RefreshFailure::Failed("connection reset".to_owned()).into(),
        ];

        for err in &errors {
            assert!(err.is_session_expired(), "{err}");
        }
        assert!(!ClientError::message("other").is_session_expired());
        assert_eq!(errors[1].status(), Some(401));
    }

    #[test]
    fn display_chain_joins_sources() {
        let err = ClientError::from(
            serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json"),
        );
        let rendered = err.display_chain().to_string();
        assert!(rendered.starts_with("serialization failed -> "));
    }
}
