//! Error types for the preview pipeline.
//!
//! Nothing in here crosses the slot controller boundary as a panic or an
//! unwinding error: [`SlotError`] is what the UI sees, attached to a slot as
//! state. The other enums are internal plumbing between host, registry and
//! the binary.

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the binary-facing layers (config, IO, serialization).
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Failures reported by a [`crate::host::RenderResource`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("render host exhausted: {live} live resources (limit {limit})")]
    Exhausted { live: usize, limit: usize },

    #[error("preview document too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
}

/// Failures of the render resource registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// The caller's view of the slot's current handle is out of date.
    #[error("slot {slot}: expected handle does not match the installed one")]
    StaleHandle { slot: usize },

    /// The host could not create the resource; the prior handle is kept.
    #[error("slot {slot}: failed to build preview resource: {source}")]
    BuildFailure {
        slot: usize,
        #[source]
        source: HostError,
    },
}

/// User-facing condition attached to a slot after a failed transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The classifier found no code (ExtractionEmpty).
    #[error("no code available for preview")]
    NothingToPreview,

    /// The slot's content language has no preview builder.
    #[error("preview is not supported for {language}")]
    PreviewUnsupported { language: String },

    /// Building or installing the render resource failed.
    #[error("preview failed: {message}")]
    BuildFailure { message: String },
}

impl SlotError {
    /// Whether the slot's previous preview survives this error.
    pub fn keeps_previous_preview(&self) -> bool {
        matches!(self, SlotError::BuildFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::config("slots must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: slots must be at least 1"
        );
    }

    #[test]
    fn test_build_failure_carries_host_error() {
        let err = PreviewError::BuildFailure {
            slot: 2,
            source: HostError::Exhausted { live: 8, limit: 8 },
        };
        let msg = err.to_string();
        assert!(msg.contains("slot 2"));
        assert!(msg.contains("exhausted"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().starts_with("JSON error:"));
    }

    #[test]
    fn test_slot_error_messages() {
        assert_eq!(
            SlotError::NothingToPreview.to_string(),
            "no code available for preview"
        );
        let err = SlotError::PreviewUnsupported {
            language: "manim".to_string(),
        };
        assert!(err.to_string().contains("manim"));
    }

    #[test]
    fn test_only_build_failure_keeps_previous_preview() {
        assert!(SlotError::BuildFailure {
            message: "x".to_string()
        }
        .keeps_previous_preview());
        assert!(!SlotError::NothingToPreview.keeps_previous_preview());
    }
}
