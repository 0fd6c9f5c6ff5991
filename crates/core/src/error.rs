//! Error types for rasterfuse

use thiserror::Error;

/// Main error type for rasterfuse operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// An input is not usable as a georeferenced multi-band raster
    #[error("Unsupported raster input `{input}`: {reason}")]
    UnsupportedType { input: String, reason: String },

    /// The two inputs do not cover the same extent or grid
    #[error("Raster extents differ: x = {x}, y = {y}")]
    ExtentMismatch { x: String, y: String },

    #[error(
        "{rows} pixel row(s) contain missing values; enable drop_incomplete to exclude them"
    )]
    MissingData { rows: usize },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for rasterfuse operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_message_mentions_flag() {
        let msg = Error::MissingData { rows: 3 }.to_string();
        assert!(msg.contains("drop_incomplete"), "got: {}", msg);
        assert!(msg.starts_with("3 pixel"));
    }

    #[test]
    fn test_extent_mismatch_message() {
        let e = Error::ExtentMismatch {
            x: "2x2".into(),
            y: "3x3".into(),
        };
        assert_eq!(e.to_string(), "Raster extents differ: x = 2x2, y = 3x3");
    }
}
