//! Error types for office-to-pdf conversion.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed, unmatched or ambiguous print configuration.
///
/// Always names the offending field; names the sheet once the error has
/// passed through the resolver (see [`ConfigError::for_sheet`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid print configuration{}: `{field}` {message}", sheet_context(.sheet))]
pub struct ConfigError {
    /// Sheet being configured, when known.
    pub sheet: Option<String>,
    /// Config key that failed validation.
    pub field: &'static str,
    /// What is wrong with the value.
    pub message: String,
}

fn sheet_context(sheet: &Option<String>) -> String {
    match sheet {
        Some(name) => format!(" for sheet '{}'", name),
        None => String::new(),
    }
}

impl ConfigError {
    /// Create an error for `field` without sheet context.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            sheet: None,
            field,
            message: message.into(),
        }
    }

    /// Attach the sheet name, keeping an existing one.
    pub fn for_sheet(mut self, sheet: &str) -> Self {
        if self.sheet.is_none() {
            self.sheet = Some(sheet.to_string());
        }
        self
    }
}

/// Row or column metrics that cannot be paginated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InputDataError(pub String);

impl InputDataError {
    pub fn for_sheet(self, sheet: &str) -> ConversionError {
        ConversionError::InputData {
            sheet: sheet.to_string(),
            message: self.0,
        }
    }
}

/// Main error type for the office-to-pdf library.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// LibreOffice is not installed or not found in PATH.
    #[error("LibreOffice not found. Please install LibreOffice and ensure 'soffice' is in PATH")]
    LibreOfficeNotFound,

    /// LibreOffice process failed to start.
    #[error("Failed to start LibreOffice process: {0}")]
    ProcessStartFailed(std::io::Error),

    /// LibreOffice conversion failed.
    #[error("LibreOffice conversion failed for '{path}': {message}")]
    ConversionFailed { path: PathBuf, message: String },

    /// LibreOffice process timed out.
    #[error("LibreOffice conversion timed out after {timeout_secs} seconds for '{path}'")]
    Timeout { path: PathBuf, timeout_secs: u64 },

    /// Input file not found.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Unsupported file format.
    #[error(
        "Unsupported file format: {extension}. Supported: Excel, Word and PowerPoint documents"
    )]
    UnsupportedFormat { extension: String },

    /// Output directory creation or output write failed.
    #[error("Failed to write output '{path}': {message}")]
    OutputDirError { path: PathBuf, message: String },

    /// Pool exhausted - no available LibreOffice instances.
    #[error("LibreOffice pool exhausted, all {pool_size} instances are busy")]
    PoolExhausted { pool_size: usize },

    /// Pool shutdown.
    #[error("LibreOffice pool has been shut down")]
    PoolShutdown,

    /// Print configuration rejected for a sheet.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Row or column metrics are missing or inconsistent.
    #[error("Invalid layout input for sheet '{sheet}': {message}")]
    InputData { sheet: String, message: String },

    /// A configuration or scenario document could not be loaded.
    #[error("Failed to load '{path}': {message}")]
    ConfigLoad { path: PathBuf, message: String },

    /// Invalid configuration outside of print options.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The workbook could not be read or written.
    #[error("Workbook error for '{path}': {message}")]
    Workbook { path: PathBuf, message: String },

    /// The named sheet does not exist in the open workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sidecar serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConversionError {
    /// Whether the error is a per-sheet configuration problem.
    pub fn is_config(&self) -> bool {
        matches!(self, ConversionError::Config(_))
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConversionError>;

impl From<tokio::task::JoinError> for ConversionError {
    fn from(e: tokio::task::JoinError) -> Self {
        ConversionError::TaskFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_sheet_and_field() {
        let err = ConfigError::new("scaling_percent", "is required when scaling is custom")
            .for_sheet("Report");
        let msg = err.to_string();
        assert!(msg.contains("'Report'"));
        assert!(msg.contains("scaling_percent"));
        assert!(msg.contains("custom"));
    }

    #[test]
    fn test_config_error_without_sheet() {
        let err = ConfigError::new("margins", "missing `left`");
        let msg = err.to_string();
        assert!(!msg.contains("sheet"));
        assert!(msg.contains("`margins`"));
    }

    #[test]
    fn test_config_error_keeps_first_sheet() {
        let err = ConfigError::new("priority", "bad")
            .for_sheet("Data")
            .for_sheet("Other");
        assert_eq!(err.sheet.as_deref(), Some("Data"));
    }

    #[test]
    fn test_error_display_conversion_failed() {
        let err = ConversionError::ConversionFailed {
            path: PathBuf::from("/path/to/book.xlsx"),
            message: "Invalid format".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/path/to/book.xlsx"));
        assert!(msg.contains("Invalid format"));
    }

    #[test]
    fn test_error_display_timeout() {
        let err = ConversionError::Timeout {
            path: PathBuf::from("book.xlsx"),
            timeout_secs: 2700,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("2700 seconds"));
        assert!(msg.contains("book.xlsx"));
    }

    #[test]
    fn test_error_display_input_data() {
        let err = ConversionError::InputData {
            sheet: "Data".to_string(),
            message: "row 7 follows row 5".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'Data'"));
        assert!(msg.contains("row 7"));
    }

    #[test]
    fn test_config_error_converts_transparently() {
        let err: ConversionError = ConfigError::new("mode", "unknown").for_sheet("S1").into();
        assert!(err.is_config());
        assert!(err.to_string().starts_with("invalid print configuration for sheet 'S1'"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ConversionError = io_err.into();
        assert!(matches!(err, ConversionError::Io(_)));
    }

    #[test]
    fn test_error_display_unsupported_format() {
        let err = ConversionError::UnsupportedFormat {
            extension: "pdf".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("pdf"));
        assert!(msg.contains("Supported"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_error() -> Result<i32> {
            Err(ConversionError::PoolShutdown)
        }
        assert!(returns_error().is_err());
    }
}
