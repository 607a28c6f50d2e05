//! Error types for the chat client and the local stores.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    /// The backend answered with a non-success status.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ChatError {
    /// Numeric HTTP status, when the failure came from the backend.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Status { status, .. } => Some(*status),
            ChatError::Transport(e) => e.status().map(|s| s.as_u16()),
            ChatError::Decode(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_kept_for_diagnostics() {
        let err = ChatError::Status { status: 500, body: "boom".to_string() };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let err: ChatError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.status(), None);
    }
}
