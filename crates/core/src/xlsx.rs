//! `.xlsx` / `.xlsm` workbooks through umya-spreadsheet.

use crate::engine::{
    column_width_points, SheetPageSetup, TrackingColumn, UsedRange, WorkbookSession,
    DEFAULT_COLUMN_WIDTH_CHARS, DEFAULT_ROW_HEIGHT_POINTS,
};
use crate::error::{ConversionError, Result};
use crate::pagination::RowMetric;
use crate::paper::Orientation;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use umya_spreadsheet::structs::{Break, OrientationValues};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Extensions whose page setup can be rewritten before export.
pub const EDITABLE_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

/// Whether `path` is a workbook [`XlsxSession`] can open.
pub fn is_editable_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| EDITABLE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// An open workbook, read fully into memory.
pub struct XlsxSession {
    path: PathBuf,
    book: Spreadsheet,
    sheet_names: Vec<String>,
}

impl std::fmt::Debug for XlsxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxSession")
            .field("path", &self.path)
            .field("sheet_names", &self.sheet_names)
            .finish()
    }
}

impl XlsxSession {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConversionError::InputNotFound(path.to_path_buf()));
        }
        let book =
            umya_spreadsheet::reader::xlsx::read(path).map_err(|e| ConversionError::Workbook {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let sheet_names = book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect();
        debug!("Opened workbook {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            book,
            sheet_names,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the (modified) workbook to `path`.
    pub fn save_as(&self, path: &Path) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path).map_err(|e| {
            ConversionError::Workbook {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }

    /// Auto-fit the width of unwrapped columns on every sheet. Returns the
    /// number of columns resized.
    ///
    /// Row heights are left to the engine: rows without a custom height
    /// grow to their wrapped content when the prepared copy is opened.
    pub fn enhance_layout(&mut self) -> Result<usize> {
        let mut resized = 0;
        for name in self.sheet_names.clone() {
            let ws = self.sheet_mut(&name)?;
            let Some(range) = occupied_range(ws) else {
                continue;
            };
            if range.column_count() >= AUTOFIT_MAX_COLUMNS {
                debug!("Sheet '{}' has {} columns, skipping auto-fit", name, range.column_count());
                continue;
            }

            let mut columns: BTreeMap<u32, Vec<CellExtent>> = BTreeMap::new();
            for cell in ws.get_cell_collection() {
                let text = cell.get_value();
                if text.trim().is_empty() {
                    continue;
                }
                let wraps = cell
                    .get_style()
                    .get_alignment()
                    .map_or(false, |a| *a.get_wrap_text());
                columns
                    .entry(*cell.get_coordinate().get_col_num())
                    .or_default()
                    .push(CellExtent {
                        chars: text.chars().count(),
                        wraps,
                    });
            }

            let mut sheet_resized = 0;
            for (col, cells) in &columns {
                if let Some(width) = autofit_width_chars(cells, range.row_count()) {
                    ws.get_column_dimension_by_number_mut(col).set_width(width);
                    sheet_resized += 1;
                }
            }
            if sheet_resized > 0 {
                info!("{}: enhanced width for {} column(s)", name, sheet_resized);
            }
            resized += sheet_resized;
        }
        Ok(resized)
    }

    fn sheet(&self, name: &str) -> Result<&Worksheet> {
        self.book
            .get_sheet_by_name(name)
            .ok_or_else(|| ConversionError::SheetNotFound(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Worksheet> {
        self.book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| ConversionError::SheetNotFound(name.to_string()))
    }
}

/// Sheets this wide are never auto-fitted.
pub const AUTOFIT_MAX_COLUMNS: u32 = 200;

/// Columns mixing wrapped and unwrapped cells keep their width past this
/// many used rows.
pub const AUTOFIT_MAX_MIXED_ROWS: u32 = 1000;

/// Widest column Excel accepts, in characters.
const MAX_COLUMN_WIDTH_CHARS: f64 = 255.0;

/// One non-empty cell of a column, as seen by column auto-fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellExtent {
    pub chars: usize,
    pub wraps: bool,
}

/// Auto-fit width in characters for a column, or `None` to keep it.
///
/// Only unwrapped cells are measured. A column whose cells all wrap keeps
/// its width, as does a mixed column once the sheet is taller than
/// [`AUTOFIT_MAX_MIXED_ROWS`].
pub fn autofit_width_chars(cells: &[CellExtent], used_rows: u32) -> Option<f64> {
    let wrapped = cells.iter().filter(|c| c.wraps).count();
    if wrapped == cells.len() {
        return None;
    }
    if wrapped > 0 && used_rows > AUTOFIT_MAX_MIXED_ROWS {
        return None;
    }
    let widest = cells.iter().filter(|c| !c.wraps).map(|c| c.chars).max()?;
    Some((widest as f64 + 1.0).min(MAX_COLUMN_WIDTH_CHARS))
}

fn occupied_range(sheet: &Worksheet) -> Option<UsedRange> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for cell in sheet.get_cell_collection() {
        if cell.get_value().is_empty() {
            continue;
        }
        let col = *cell.get_coordinate().get_col_num();
        let row = *cell.get_coordinate().get_row_num();
        bounds = Some(match bounds {
            None => (row, row, col, col),
            Some((r0, r1, c0, c1)) => (r0.min(row), r1.max(row), c0.min(col), c1.max(col)),
        });
    }
    bounds.map(|(r0, r1, c0, c1)| UsedRange::new(r0, r1, c0, c1))
}

impl WorkbookSession for XlsxSession {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    fn used_range(&self, sheet: &str) -> Result<Option<UsedRange>> {
        Ok(occupied_range(self.sheet(sheet)?))
    }

    fn row_heights(&self, sheet: &str) -> Result<Vec<RowMetric>> {
        let ws = self.sheet(sheet)?;
        let Some(range) = occupied_range(ws) else {
            return Ok(Vec::new());
        };
        Ok((range.first_row..=range.last_row)
            .map(|row| {
                let height = ws
                    .get_row_dimension(&row)
                    .map(|dim| *dim.get_height())
                    .filter(|h| *h > 0.0)
                    .unwrap_or(DEFAULT_ROW_HEIGHT_POINTS);
                RowMetric::new(row, height)
            })
            .collect())
    }

    fn column_widths(&self, sheet: &str) -> Result<Vec<f64>> {
        let ws = self.sheet(sheet)?;
        let Some(range) = occupied_range(ws) else {
            return Ok(Vec::new());
        };
        Ok((range.first_col..=range.last_col)
            .map(|col| {
                let chars = ws
                    .get_column_dimension_by_number(&col)
                    .map(|dim| *dim.get_width())
                    .filter(|w| *w > 0.0)
                    .unwrap_or(DEFAULT_COLUMN_WIDTH_CHARS);
                column_width_points(chars)
            })
            .collect())
    }

    fn text_samples(&self, limit: usize) -> Vec<String> {
        let mut samples = Vec::new();
        for ws in self.book.get_sheet_collection() {
            let mut cells: Vec<(u32, u32, String)> = ws
                .get_cell_collection()
                .iter()
                .map(|cell| {
                    (
                        *cell.get_coordinate().get_row_num(),
                        *cell.get_coordinate().get_col_num(),
                        cell.get_value().trim().to_string(),
                    )
                })
                .filter(|(_, _, text)| !text.is_empty())
                .collect();
            cells.sort_by_key(|(row, col, _)| (*row, *col));
            for (_, _, text) in cells {
                if samples.len() >= limit {
                    return samples;
                }
                samples.push(text);
            }
        }
        samples
    }

    fn apply_page_setup(&mut self, sheet: &str, setup: &SheetPageSetup) -> Result<()> {
        let ws = self.sheet_mut(sheet)?;

        let page = ws.get_page_setup_mut();
        page.set_orientation(match setup.orientation {
            Orientation::Portrait => OrientationValues::Portrait,
            Orientation::Landscape => OrientationValues::Landscape,
        });
        page.set_paper_size(setup.paper.xlsx_code());
        page.set_scale(setup.scale_percent);

        let margins = ws.get_page_margins_mut();
        margins.set_left(setup.margins.left);
        margins.set_right(setup.margins.right);
        margins.set_top(setup.margins.top);
        margins.set_bottom(setup.margins.bottom);
        margins.set_header(setup.margins.header);
        margins.set_footer(setup.margins.footer);

        if let Some(text) = &setup.header_text {
            ws.get_header_footer_mut()
                .get_odd_header_mut()
                .set_value(format!("&C{}", text.replace('&', "&&")));
        }

        // Only the planned breaks may split pages; the sheet's own go.
        ws.get_row_breaks_mut().get_break_list_mut().clear();
        ws.get_column_breaks_mut().get_break_list_mut().clear();

        // Break ids name the last row/column before the break.
        for row in &setup.row_breaks {
            let mut brk = Break::default();
            brk.set_id(row - 1);
            brk.set_manual_page_break(true);
            ws.get_row_breaks_mut().add_break_list(brk);
        }
        for col in &setup.column_breaks {
            let mut brk = Break::default();
            brk.set_id(col - 1);
            brk.set_manual_page_break(true);
            ws.get_column_breaks_mut().add_break_list(brk);
        }

        if setup.print_headings {
            warn!(
                "Sheet '{}': grid headings cannot be switched on in {:?}; exported without them",
                sheet, self.path
            );
        }
        Ok(())
    }

    fn write_tracking_column(&mut self, sheet: &str, column: &TrackingColumn) -> Result<()> {
        let ws = self.sheet_mut(sheet)?;
        ws.get_cell_mut((column.column, column.title_row))
            .set_value(column.title.clone());
        for (row, label) in &column.labels {
            ws.get_cell_mut((column.column, *row)).set_value(label.clone());
        }
        ws.get_column_dimension_by_number_mut(&column.column)
            .set_width(crate::layout::TRACKING_COLUMN_WIDTH_CHARS);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_editable_workbook() {
        assert!(is_editable_workbook(Path::new("book.xlsx")));
        assert!(is_editable_workbook(Path::new("BOOK.XLSM")));
        assert!(!is_editable_workbook(Path::new("legacy.xls")));
        assert!(!is_editable_workbook(Path::new("binary.xlsb")));
        assert!(!is_editable_workbook(Path::new("noext")));
    }

    fn extent(chars: usize, wraps: bool) -> CellExtent {
        CellExtent { chars, wraps }
    }

    fn setup_with_breaks(row_breaks: Vec<u32>) -> SheetPageSetup {
        use crate::paper::{PageMargins, PaperSize};
        use crate::scaling::ScalingParams;
        SheetPageSetup {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            margins: PageMargins::default(),
            scaling: ScalingParams::fit(Some(1), None),
            scale_percent: 100,
            row_breaks,
            column_breaks: Vec::new(),
            header_text: None,
            print_headings: false,
        }
    }

    #[test]
    fn test_autofit_measures_unwrapped_cells_only() {
        let cells = [extent(4, false), extent(30, true), extent(12, false)];
        assert_eq!(autofit_width_chars(&cells, 50), Some(13.0));
    }

    #[test]
    fn test_autofit_keeps_fully_wrapped_column() {
        let cells = [extent(40, true), extent(80, true)];
        assert_eq!(autofit_width_chars(&cells, 10), None);
        assert_eq!(autofit_width_chars(&[], 10), None);
    }

    #[test]
    fn test_autofit_skips_tall_mixed_column() {
        let cells = [extent(10, false), extent(80, true)];
        assert_eq!(autofit_width_chars(&cells, AUTOFIT_MAX_MIXED_ROWS), Some(11.0));
        assert_eq!(autofit_width_chars(&cells, AUTOFIT_MAX_MIXED_ROWS + 1), None);
        // Unmixed columns are fitted whatever the height.
        assert_eq!(autofit_width_chars(&[extent(10, false)], 5000), Some(11.0));
    }

    #[test]
    fn test_autofit_caps_width() {
        assert_eq!(autofit_width_chars(&[extent(1000, false)], 1), Some(255.0));
    }

    #[test]
    fn test_enhance_layout_leaves_wrapped_column_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrap.xlsx");
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut((1, 1)).set_value("Reference code");
        sheet.get_cell_mut((2, 1)).set_value("A long note that wraps inside its cell");
        sheet.get_style_mut((2, 1)).get_alignment_mut().set_wrap_text(true);
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut session = XlsxSession::open(&path).unwrap();
        assert_eq!(session.enhance_layout().unwrap(), 1);
        let widths = session.column_widths("Sheet1").unwrap();
        assert_eq!(widths[0], column_width_points(15.0));
        assert_eq!(widths[1], column_width_points(DEFAULT_COLUMN_WIDTH_CHARS));
    }

    #[test]
    fn test_page_setup_replaces_existing_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breaks.xlsx");
        let saved = dir.path().join("saved.xlsx");
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        for row in 1..=30u32 {
            sheet.get_cell_mut((1, row)).set_value(format!("row {}", row));
        }
        let mut old_row = Break::default();
        old_row.set_id(3);
        old_row.set_manual_page_break(true);
        sheet.get_row_breaks_mut().add_break_list(old_row);
        let mut old_col = Break::default();
        old_col.set_id(1);
        old_col.set_manual_page_break(true);
        sheet.get_column_breaks_mut().add_break_list(old_col);
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let mut session = XlsxSession::open(&path).unwrap();
        session
            .apply_page_setup("Sheet1", &setup_with_breaks(vec![12, 22]))
            .unwrap();
        session.save_as(&saved).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&saved).unwrap();
        let sheet = book.get_sheet_by_name("Sheet1").unwrap();
        let rows: Vec<u32> = sheet
            .get_row_breaks()
            .get_break_list()
            .iter()
            .map(|b| *b.get_id())
            .collect();
        assert_eq!(rows, vec![11, 21]);
        assert!(sheet.get_column_breaks().get_break_list().is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let err = XlsxSession::open(Path::new("/nonexistent/book.xlsx")).unwrap_err();
        assert!(matches!(err, ConversionError::InputNotFound(_)));
    }

    #[test]
    fn test_open_garbage_is_workbook_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        let err = XlsxSession::open(&path).unwrap_err();
        assert!(matches!(err, ConversionError::Workbook { .. }));
    }
}
