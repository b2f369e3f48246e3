//! # Error Types Module
//!
//! Errors raised at the boundary with the external recipe service. The
//! consolidation engine itself never fails; empty inputs yield empty results.

use crate::recipe_client::RequestKind;

/// Failures of a recipe-service request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroceryError {
    /// Input rejected before any request was sent
    Validation(String),
    /// A request of the same kind is still outstanding
    RequestInFlight(RequestKind),
    /// Connectivity failure or timeout
    Transport(String),
    /// The service answered with a non-success status
    Http { status: u16, message: String },
    /// The response body did not have the expected shape
    Protocol(String),
}

impl GroceryError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            GroceryError::Validation(msg)
            | GroceryError::Transport(msg)
            | GroceryError::Protocol(msg) => msg.clone(),
            GroceryError::RequestInFlight(kind) => {
                format!("A {} request is already in progress", kind)
            }
            GroceryError::Http { message, .. } => message.clone(),
        }
    }
}

impl std::fmt::Display for GroceryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroceryError::Validation(msg) => write!(f, "Validation error: {msg}"),
            GroceryError::RequestInFlight(kind) => write!(f, "Request in flight: {kind}"),
            GroceryError::Transport(msg) => write!(f, "Transport error: {msg}"),
            GroceryError::Http { status, message } => write!(f, "HTTP error {status}: {message}"),
            GroceryError::Protocol(msg) => write!(f, "Protocol error: {msg}"),
        }
    }
}

impl std::error::Error for GroceryError {}

impl From<reqwest::Error> for GroceryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GroceryError::Transport(
                "Request timeout: the server is taking too long to respond".to_string(),
            )
        } else if err.is_connect() {
            GroceryError::Transport("Network error: unable to connect to the server".to_string())
        } else if err.is_decode() {
            GroceryError::Protocol(format!("Malformed response: {err}"))
        } else {
            GroceryError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GroceryError {
    fn from(err: serde_json::Error) -> Self {
        GroceryError::Protocol(format!("Malformed response: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        let err = GroceryError::Validation("no ingredients".to_string());
        assert_eq!(err.to_string(), "Validation error: no ingredients");

        let err = GroceryError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 500: boom");
    }

    #[test]
    fn test_user_message() {
        let err = GroceryError::Http {
            status: 400,
            message: "Ingredients list cannot be empty.".to_string(),
        };
        assert_eq!(err.user_message(), "Ingredients list cannot be empty.");

        let err = GroceryError::RequestInFlight(RequestKind::GroceryList);
        assert_eq!(err.user_message(), "A grocery list request is already in progress");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = GroceryError::from(json_err);
        assert!(matches!(err, GroceryError::Protocol(_)));
    }
}
