//! # Error Types
//!
//! This module defines error types used throughout the carousel library.

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::export::pixels::StrategyFailure;

/// Main error type for carousel operations
#[derive(Debug, Error)]
pub enum CarouselError {
    /// The drawing surface could not be created (fatal for the whole export)
    #[error("No drawing surface: {0}")]
    Surface(String),

    /// Image loading or decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Font loading or glyph lookup error
    #[error("Font error: {0}")]
    Font(String),

    /// Every pixel export strategy failed for a slide
    #[error("Failed to encode slide {slide}: {}", describe_failures(.failures))]
    Encode {
        slide: usize,
        failures: Vec<StrategyFailure>,
    },

    /// Client-side archive assembly failed
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Both the client and the server archive paths failed
    #[error(
        "Export failed: client archive: {client}; server archive: {server} (check the log output for diagnostics)"
    )]
    Export { client: String, server: String },

    /// Invalid slide record or deck
    #[error("Invalid slide: {0}")]
    Slide(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Network-level errors (fallback endpoint, image download, binding)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_failures(failures: &[StrategyFailure]) -> String {
    if failures.is_empty() {
        return "no encode strategies configured".to_string();
    }
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_error_names_each_strategy() {
        let err = CarouselError::Encode {
            slide: 2,
            failures: vec![
                StrategyFailure::new("async-blob", "timed out after 15000ms"),
                StrategyFailure::new("data-url", "empty payload"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("slide 2"));
        assert!(msg.contains("async-blob: timed out after 15000ms"));
        assert!(msg.contains("data-url: empty payload"));
    }

    #[test]
    fn test_export_error_points_to_diagnostics() {
        let err = CarouselError::Export {
            client: "too many entries".into(),
            server: "HTTP 502".into(),
        };
        assert!(err.to_string().contains("diagnostics"));
    }
}
