//! Error handling for brushlayer
//!
//! Only input problems are errors. Degenerate parameters (empty canvas, zero
//! brush width) produce valid, possibly empty, output instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for brushlayer operations
pub type Result<T> = std::result::Result<T, PaintError>;

/// Main error type for brushlayer operations
#[derive(Error, Debug)]
pub enum PaintError {
    // Input errors
    #[error("couldn't load image {path}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("couldn't read style file {path}")]
    StyleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse style file {path}")]
    StyleParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid style: {reason}")]
    InvalidStyle { reason: String },

    // Output errors
    #[error("couldn't write canvas to {path}")]
    CanvasWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't read canvas {path}")]
    CanvasRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse canvas {path}")]
    CanvasParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaintError {
    /// Short machine-readable code, used in the CLI's exit diagnostic.
    pub fn error_code(&self) -> &'static str {
        match self {
            PaintError::ImageLoad { .. } => "IMAGE_LOAD",
            PaintError::StyleRead { .. } => "STYLE_READ",
            PaintError::StyleParse { .. } => "STYLE_PARSE",
            PaintError::InvalidStyle { .. } => "INVALID_STYLE",
            PaintError::CanvasWrite { .. } => "CANVAS_WRITE",
            PaintError::CanvasRead { .. } => "CANVAS_READ",
            PaintError::CanvasParse { .. } => "CANVAS_PARSE",
            PaintError::Serialization(_) => "SERIALIZATION_ERROR",
            PaintError::Io(_) => "IO_ERROR",
        }
    }

    pub(crate) fn invalid_style(reason: impl Into<String>) -> Self {
        PaintError::InvalidStyle {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_style_message() {
        let err = PaintError::invalid_style("canvasScale must be positive");
        assert_eq!(err.to_string(), "invalid style: canvasScale must be positive");
        assert_eq!(err.error_code(), "INVALID_STYLE");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PaintError = io.into();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
