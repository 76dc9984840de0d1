//! Error types for signseq.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignseqError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Classifier errors
    #[error("Label map not found at {path}")]
    LabelMapNotFound { path: String },

    #[error("Failed to parse label map: {message}")]
    LabelMapParse { message: String },

    #[error("Classifier error: {message}")]
    Classifier { message: String },

    // Session errors
    #[error("Session {id} not found")]
    SessionNotFound { id: u64 },

    #[error("Session {id} is closed")]
    SessionClosed { id: u64 },

    #[error("Session {id} is already advancing; frames must be submitted one at a time")]
    ConcurrentAdvance { id: u64 },

    #[error("Session store lock poisoned")]
    StorePoisoned,

    #[error("No session ids left to issue")]
    SessionIdsExhausted,

    // Replay errors
    #[error("Invalid observation record at line {line}: {message}")]
    ReplayParse { line: usize, message: String },

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SignseqError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = SignseqError::ConfigInvalidValue {
            key: "segmenter.confidence_threshold".to_string(),
            message: "must be in [0, 1)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for segmenter.confidence_threshold: must be in [0, 1)"
        );
    }

    #[test]
    fn test_session_not_found_display() {
        let error = SignseqError::SessionNotFound { id: 7 };
        assert_eq!(error.to_string(), "Session 7 not found");
    }

    #[test]
    fn test_session_closed_display() {
        let error = SignseqError::SessionClosed { id: 3 };
        assert_eq!(error.to_string(), "Session 3 is closed");
    }

    #[test]
    fn test_session_ids_exhausted_display() {
        let error = SignseqError::SessionIdsExhausted;
        assert_eq!(error.to_string(), "No session ids left to issue");
    }

    #[test]
    fn test_concurrent_advance_display() {
        let error = SignseqError::ConcurrentAdvance { id: 1 };
        assert!(error.to_string().contains("one at a time"));
    }

    #[test]
    fn test_label_map_not_found_display() {
        let error = SignseqError::LabelMapNotFound {
            path: "/models/labels.json".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Label map not found at /models/labels.json"
        );
    }

    #[test]
    fn test_replay_parse_display() {
        let error = SignseqError::ReplayParse {
            line: 4,
            message: "expected value".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid observation record at line 4: expected value"
        );
    }

    #[test]
    fn test_ipc_protocol_display() {
        let error = SignseqError::IpcProtocol {
            message: "invalid message format".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "IPC protocol error: invalid message format"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: SignseqError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: SignseqError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: SignseqError = json_error.into();
        assert!(error.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: SignseqError = io_error.into();
        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SignseqError>();
        assert_sync::<SignseqError>();
    }
}
