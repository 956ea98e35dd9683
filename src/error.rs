//! Error types for the admin console.
//!
//! Transport and server failures are caught at the fetcher boundary and turned
//! into notifications. Form errors never reach the network.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response payload: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message the server put in the response body, if there was one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Client-side validation failure on a form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("{field} not accepted: {reason}")]
    Unsupported { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_only_for_server_errors() {
        let err = ApiError::Server {
            status: 409,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.server_message(), Some("Email already registered"));
        assert_eq!(err.status(), Some(409));

        let empty = ApiError::Server {
            status: 500,
            message: String::new(),
        };
        assert_eq!(empty.server_message(), None);

        let transport = ApiError::Transport("connection refused".to_string());
        assert_eq!(transport.server_message(), None);
        assert_eq!(transport.status(), None);
    }

    #[test]
    fn test_form_error_display() {
        let err = FormError::TooShort {
            field: "description",
            min: 10,
        };
        assert_eq!(err.to_string(), "description must be at least 10 characters");
    }
}
