//! Error types for the users domain.

use serde_json::Value;
use thiserror::Error;

use super::mutations::MutationKind;

/// Shown when neither the transport nor the server gave anything readable.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failures talking to the users backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsersApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    Status {
        status: u16,
        /// Human-readable message taken from the error body, if any.
        message: Option<String>,
    },

    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    /// None of the known response envelopes matched.
    #[error("unrecognized response envelope; tried {tried}")]
    UnrecognizedEnvelope { tried: String },

    #[error("failed to build request: {0}")]
    Encode(String),
}

impl UsersApiError {
    /// Text for an operator-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_owned(),
        }
    }
}

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("select a plan first")]
    PlanNotSelected,

    #[error("session limit cannot be negative")]
    NegativeSessionCap,

    #[error("a session limit of 0 is ambiguous; use `unlimited` or `blocked`")]
    AmbiguousZeroSessionCap,

    #[error("invalid session limit `{0}`; expected `unlimited`, `blocked` or a positive number")]
    InvalidSessionCap(String),

    #[error("{0} needs a target user")]
    MissingTarget(MutationKind),
}

/// Reasons a driver-side submission is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("a request is already in progress")]
    Busy,

    #[error("no dialog is open")]
    NoDialog,

    #[error("the open dialog does not accept {requested}")]
    DialogMismatch { requested: MutationKind },

    #[error("the user has not finished loading")]
    NotLoaded,
}

/// Pull a readable message out of an error body.
///
/// Looks at `message`, then `error` (string), then `error.message`.
pub fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let candidates = [
        value.get("message"),
        value.get("error"),
        value.get("error").and_then(|e| e.get("message")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_top_level_message() {
        let body = br#"{"message":"Email already taken","error":"Conflict"}"#;
        assert_eq!(server_message(body).as_deref(), Some("Email already taken"));
    }

    #[test]
    fn server_message_falls_back_to_error_string() {
        let body = br#"{"error":"Plan not found"}"#;
        assert_eq!(server_message(body).as_deref(), Some("Plan not found"));
    }

    #[test]
    fn server_message_reads_nested_error_object() {
        let body = br#"{"error":{"code":42,"message":"Wallet locked"}}"#;
        assert_eq!(server_message(body).as_deref(), Some("Wallet locked"));
    }

    #[test]
    fn server_message_ignores_blank_and_non_json() {
        assert_eq!(server_message(br#"{"message":"  "}"#), None);
        assert_eq!(server_message(b"<html>502</html>"), None);
        assert_eq!(server_message(b""), None);
    }

    #[test]
    fn user_message_uses_generic_text_without_server_message() {
        let err = UsersApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert!(err.to_string().contains("500"));

        let err = UsersApiError::Transport("connection refused".into());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn user_message_surfaces_server_text() {
        let err = UsersApiError::Status {
            status: 422,
            message: Some("Amount exceeds balance".into()),
        };
        assert_eq!(err.user_message(), "Amount exceeds balance");
    }
}
