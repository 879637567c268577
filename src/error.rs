//! Error types for the preview pipeline.
//!
//! Per-file problems (unresolved imports, component compile failures) never
//! surface here: they are isolated inside the generated document. Only the
//! conditions that abort a whole build pass, or reject host input outright,
//! are modelled as [`PreviewError`].

use thiserror::Error;

/// Errors that abort a build pass or reject host input.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Files exist but none of them can serve as the entry page.
    #[error("No HTML file found for preview (requested '{page}')")]
    EntryNotFound { page: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// A component file that could not be compiled.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranspileError {
    #[error("{file}: {message}")]
    Syntax { file: String, message: String },

    /// Syntax the native compiler deliberately does not lower.
    #[error("{file}: {construct} is not supported in preview components")]
    Unsupported { file: String, construct: String },
}

/// Failures decoding or encoding a shareable snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid share payload encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Share payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Share payload is not a valid snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Not a preview share link: {url}")]
    MalformedUrl { url: String },
}

/// Invalid preview configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse preview config: {0}")]
    Json(#[from] serde_json::Error),

    /// Token would let the sandbox navigate or escape the host window.
    #[error("Sandbox token '{token}' is not allowed")]
    ForbiddenSandboxToken { token: String },

    #[error("Sandbox attributes must include '{token}'")]
    MissingSandboxToken { token: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Messages arriving over the bridge that the host cannot act upon.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Envelope from an unknown source or with an unknown action.
    #[error("Unrecognized bridge message from '{source_tag}'")]
    Unrecognized { source_tag: String },

    #[error("Malformed bridge message: {message}")]
    Malformed { message: String },
}

/// Result type alias for preview operations.
pub type Result<T> = std::result::Result<T, PreviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_not_found_names_requested_page() {
        let err = PreviewError::EntryNotFound {
            page: "about.html".to_string(),
        };
        assert!(err.to_string().contains("No HTML file found"));
        assert!(err.to_string().contains("about.html"));
    }

    #[test]
    fn transpile_error_names_file() {
        let err = TranspileError::Unsupported {
            file: "Broken.tsx".to_string(),
            construct: "enum".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Broken.tsx: enum is not supported in preview components"
        );
    }

    #[test]
    fn config_error_converts_into_preview_error() {
        let err: PreviewError = ConfigError::ForbiddenSandboxToken {
            token: "allow-top-navigation".to_string(),
        }
        .into();
        assert!(matches!(err, PreviewError::Config(_)));
    }
}
