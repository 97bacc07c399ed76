//! Fatal errors of an extraction run.
//!
//! Anything that can be recovered page by page is an
//! [`ExtractWarning`](pdf2csv_core::ExtractWarning) instead.

use pdf2csv_core::ConfigError;
use pdf2csv_parse::BackendError;
use thiserror::Error;

/// Error that aborts an extraction run.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid settings or page range; raised before any page is read.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The document could not be opened.
    #[error("failed to open PDF: {0}")]
    Open(#[from] BackendError),

    /// The CSV destination could not be written.
    #[error("failed to write output: {0}")]
    OutputWrite(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message() {
        let err = Error::from(ConfigError::BorderWidth(0.0));
        assert_eq!(
            err.to_string(),
            "invalid configuration: border width must be a positive finite number, got 0"
        );
    }

    #[test]
    fn open_wraps_backend_error() {
        let err = Error::from(BackendError::Encrypted);
        assert!(matches!(err, Error::Open(BackendError::Encrypted)));
        assert_eq!(err.to_string(), "failed to open PDF: PDF is encrypted");
    }

    #[test]
    fn io_errors_are_output_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = Error::from(io);
        assert!(matches!(err, Error::OutputWrite(_)));
    }
}
