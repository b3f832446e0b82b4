//! Seams between the layout pipeline and the spreadsheet engine.
//!
//! The layout planner never touches a file format directly. It reads metrics
//! through a [`WorkbookSession`] and hands back a [`SheetPageSetup`] to apply;
//! per-page row-index lines go to a [`PageLogSink`].

use crate::error::{ConversionError, Result};
use crate::pagination::RowMetric;
use crate::paper::{Orientation, PageMargins, PaperSize};
use crate::scaling::ScalingParams;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Row height used when a row carries no explicit height.
pub const DEFAULT_ROW_HEIGHT_POINTS: f64 = 15.0;

/// Column width, in characters, used when a column carries no explicit width.
pub const DEFAULT_COLUMN_WIDTH_CHARS: f64 = 8.43;

/// Convert a column width in characters of the default font to points.
pub fn column_width_points(width_chars: f64) -> f64 {
    if width_chars <= 0.0 {
        return 0.0;
    }
    (width_chars * 7.0 + 5.0).trunc() * 0.75
}

/// The occupied rectangle of a sheet, 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedRange {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl UsedRange {
    pub fn new(first_row: u32, last_row: u32, first_col: u32, last_col: u32) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    pub fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub fn column_count(&self) -> u32 {
        self.last_col - self.first_col + 1
    }

    /// The first row holds the table header; data follows it.
    pub fn header_row(&self) -> u32 {
        self.first_row
    }

    /// Data rows, or `None` when the sheet is only a header.
    pub fn data_rows(&self) -> Option<(u32, u32)> {
        (self.last_row > self.first_row).then(|| (self.first_row + 1, self.last_row))
    }
}

/// Everything written to one sheet's page setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetPageSetup {
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub margins: PageMargins,
    /// Requested scaling, as resolved from the config.
    pub scaling: ScalingParams,
    /// Concrete zoom the requested scaling amounts to for this content.
    pub scale_percent: u32,
    /// Rows that start a new page (manual breaks are placed before them).
    pub row_breaks: Vec<u32>,
    /// Absolute columns that start a new page.
    pub column_breaks: Vec<u32>,
    /// Text for the page header, if any.
    pub header_text: Option<String>,
    /// Print the grid's row and column headings.
    pub print_headings: bool,
}

/// The tracking column written next to the used range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingColumn {
    pub column: u32,
    pub title_row: u32,
    pub title: String,
    /// `(row_index, label)` pairs.
    pub labels: Vec<(u32, String)>,
}

/// An open workbook the layout pipeline can measure and modify.
///
/// Implementations own the document for the duration of one file; nothing
/// is shared between files.
pub trait WorkbookSession {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Occupied range, or `None` for an empty sheet.
    fn used_range(&self, sheet: &str) -> Result<Option<UsedRange>>;

    /// Height of every row in the used range, in row order.
    fn row_heights(&self, sheet: &str) -> Result<Vec<RowMetric>>;

    /// Width in points of every column in the used range, in column order.
    fn column_widths(&self, sheet: &str) -> Result<Vec<f64>>;

    /// Up to `limit` text cells across all sheets, in reading order.
    fn text_samples(&self, limit: usize) -> Vec<String>;

    fn apply_page_setup(&mut self, sheet: &str, setup: &SheetPageSetup) -> Result<()>;

    fn write_tracking_column(&mut self, sheet: &str, column: &TrackingColumn) -> Result<()>;
}

/// Receives the per-page row-index lines of each laid-out sheet.
pub trait PageLogSink: Send + Sync {
    fn page_lines(&self, file: &str, sheet: &str, lines: &[String]);
}

/// Writes each page line as a `tracing` event tagged with file and sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPageLog;

impl PageLogSink for TracingPageLog {
    fn page_lines(&self, file: &str, sheet: &str, lines: &[String]) {
        for line in lines {
            info!(file = file, sheet = sheet, "{}", line);
        }
    }
}

/// One sheet of a [`MemoryWorkbook`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    pub name: String,
    pub range: Option<UsedRange>,
    /// One height per used row, starting at `range.first_row`.
    pub row_heights: Vec<f64>,
    /// One width in points per used column.
    pub column_widths: Vec<f64>,
    pub texts: Vec<String>,
    /// Last page setup applied.
    pub setup: Option<SheetPageSetup>,
    /// Last tracking column written.
    pub tracking: Option<TrackingColumn>,
}

impl MemorySheet {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A table anchored at A1 with uniform row heights and column widths.
    pub fn table(
        name: impl Into<String>,
        rows: u32,
        row_height: f64,
        columns: u32,
        column_width: f64,
    ) -> Self {
        Self {
            name: name.into(),
            range: (rows > 0 && columns > 0).then(|| UsedRange::new(1, rows, 1, columns)),
            row_heights: vec![row_height; rows as usize],
            column_widths: vec![column_width; columns as usize],
            ..Default::default()
        }
    }

    pub fn with_texts<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.texts = texts.into_iter().map(Into::into).collect();
        self
    }
}

/// Workbook held entirely in memory, for planning without a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryWorkbook {
    pub sheets: Vec<MemorySheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn sheet_or_err(&self, name: &str) -> Result<&MemorySheet> {
        self.sheet(name)
            .ok_or_else(|| ConversionError::SheetNotFound(name.to_string()))
    }

    fn sheet_mut_or_err(&mut self, name: &str) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| ConversionError::SheetNotFound(name.to_string()))
    }
}

impl WorkbookSession for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn used_range(&self, sheet: &str) -> Result<Option<UsedRange>> {
        Ok(self.sheet_or_err(sheet)?.range)
    }

    fn row_heights(&self, sheet: &str) -> Result<Vec<RowMetric>> {
        let sheet = self.sheet_or_err(sheet)?;
        let Some(range) = sheet.range else {
            return Ok(Vec::new());
        };
        Ok(sheet
            .row_heights
            .iter()
            .enumerate()
            .map(|(i, h)| RowMetric::new(range.first_row + i as u32, *h))
            .collect())
    }

    fn column_widths(&self, sheet: &str) -> Result<Vec<f64>> {
        Ok(self.sheet_or_err(sheet)?.column_widths.clone())
    }

    fn text_samples(&self, limit: usize) -> Vec<String> {
        self.sheets
            .iter()
            .flat_map(|s| s.texts.iter().cloned())
            .take(limit)
            .collect()
    }

    fn apply_page_setup(&mut self, sheet: &str, setup: &SheetPageSetup) -> Result<()> {
        self.sheet_mut_or_err(sheet)?.setup = Some(setup.clone());
        Ok(())
    }

    fn write_tracking_column(&mut self, sheet: &str, column: &TrackingColumn) -> Result<()> {
        self.sheet_mut_or_err(sheet)?.tracking = Some(column.clone());
        Ok(())
    }
}
