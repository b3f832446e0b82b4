//! # office-to-pdf-core
//!
//! Batch conversion of Office documents to PDF with sheet-aware pagination.
//!
//! Excel workbooks are laid out sheet by sheet before export:
//!
//! - a print configuration is **resolved** per sheet from a prioritized list,
//! - **page breaks** are planned from row heights and the printable area,
//! - each page's source rows are **annotated** in the page header and in a
//!   tracking column, so any PDF page can be traced back to its rows.
//!
//! The PDF itself is produced by **LibreOffice**, driven through a pool of
//! headless `soffice` processes. Word and PowerPoint files go straight to the
//! pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use office_to_pdf_core::{AppConfig, ConversionRequest, Converter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load("config.yaml".as_ref())?;
//!     let converter = Converter::new(config).await?;
//!
//!     let request = ConversionRequest::new("report.xlsx", "./output");
//!     let result = converter.convert(request).await?;
//!
//!     for sheet in &result.sheets {
//!         println!("{}: {} page(s)", sheet.sheet, sheet.pages.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Planning without exporting
//!
//! ```rust
//! use office_to_pdf_core::engine::{MemorySheet, MemoryWorkbook, TracingPageLog};
//! use office_to_pdf_core::layout::{layout_workbook, LayoutOptions};
//! use office_to_pdf_core::print_config::{LayoutMode, PrintConfig, PrintConfigSet};
//!
//! let mut book = MemoryWorkbook::new().with_sheet(MemorySheet::table("Data", 151, 15.0, 4, 48.0));
//! let configs = PrintConfigSet::Uniform(PrintConfig::default().mode(LayoutMode::TableRowBreak));
//! let options = LayoutOptions::default();
//! let plans = layout_workbook(&mut book, &configs, &options, &TracingPageLog, "demo").unwrap();
//! assert!(!plans[0].pages.is_empty());
//! ```

pub mod annotate;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod language;
pub mod layout;
pub mod pagination;
pub mod paper;
pub mod pool;
pub mod print_config;
pub mod resolver;
pub mod scaling;
pub mod scan;
pub mod scenario;
pub mod xlsx;

// Re-export main types for convenience
pub use annotate::{annotate, parse_header_text, RowIndexAnnotation};
pub use config::{
    AppConfig, BatchResult, ConversionProgress, ConversionRequest, ConversionStage, FailedFile,
    FileResult, LanguageConfig, LanguageMode, PoolConfig,
};
pub use converter::{Converter, ConverterBuilder};
pub use engine::{PageLogSink, SheetPageSetup, TracingPageLog, UsedRange, WorkbookSession};
pub use error::{ConfigError, ConversionError, InputDataError, Result};
pub use layout::{layout_workbook, plan_sheet, SheetLayoutReport, SheetPlan};
pub use pagination::{plan_column_breaks, plan_row_breaks, PageDescriptor, RowMetric};
pub use pool::LibreOfficePool;
pub use print_config::{LayoutMode, PrintConfig, PrintConfigSet};
pub use resolver::resolve;
pub use scaling::{resolve_scaling, ScalingParams};
pub use xlsx::XlsxSession;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The three document families the converter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Excel,
    Word,
    PowerPoint,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Excel,
        DocumentKind::Word,
        DocumentKind::PowerPoint,
    ];

    /// File extensions (lowercase, without dot) of this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            DocumentKind::Excel => &["xls", "xlsx", "xlsm", "xlsb"],
            DocumentKind::Word => &["doc", "docx", "docm", "dotx", "dotm"],
            DocumentKind::PowerPoint => &["ppt", "pptx", "pptm", "ppsx", "ppsm", "potx", "potm"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(self) -> &'static str {
        match self {
            DocumentKind::Excel => "excel",
            DocumentKind::Word => "word",
            DocumentKind::PowerPoint => "powerpoint",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excel" => Ok(DocumentKind::Excel),
            "word" => Ok(DocumentKind::Word),
            "powerpoint" => Ok(DocumentKind::PowerPoint),
            other => Err(format!(
                "unknown file type '{}' (expected excel, word or powerpoint)",
                other
            )),
        }
    }
}

/// Supported Office file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "xls", "xlsx", "xlsm", "xlsb", "doc", "docx", "docm", "dotx", "dotm", "ppt", "pptx", "pptm",
    "ppsx", "ppsm", "potx", "potm",
];

/// Check if a file extension is supported.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
