//! Sheet layout: resolve config, size the content, plan breaks, annotate.
//!
//! Sheets are handled one at a time in workbook order. Planning only reads
//! the session; applying writes the page setup and the tracking column.

use crate::annotate::{annotate, RowIndexAnnotation, DEFAULT_HEADER_BUDGET};
use crate::engine::{
    column_width_points, PageLogSink, SheetPageSetup, TrackingColumn, UsedRange, WorkbookSession,
};
use crate::error::{ConversionError, Result};
use crate::pagination::{
    plan_column_breaks, plan_row_breaks, row_break_positions, PageDescriptor, RowMetric,
};
use crate::paper::{printable_area, Orientation, PageMargins, PaperSize};
use crate::print_config::{
    LayoutMode, OrientationChoice, PrintConfig, PrintConfigSet, RowLabelStyle,
};
use crate::resolver::resolve;
use crate::scaling::{resolve_scaling, ScalingParams, MAX_ZOOM_PERCENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Width, in characters, given to the tracking column.
pub const TRACKING_COLUMN_WIDTH_CHARS: f64 = 18.0;

/// Smallest zoom the page setup accepts.
pub const MIN_SCALE_PERCENT: u32 = 10;

/// Default title of the tracking column.
pub const DEFAULT_TRACKING_TITLE: &str = "Page-Row Index";

/// Workbook-wide layout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    pub header_budget: usize,
    pub column_title: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            header_budget: DEFAULT_HEADER_BUDGET,
            column_title: DEFAULT_TRACKING_TITLE.to_string(),
        }
    }
}

/// What the pipeline decided for one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub sheet: String,
    pub mode: LayoutMode,
    pub used_range: Option<UsedRange>,
    /// `None` leaves the sheet's own page setup in place.
    pub setup: Option<SheetPageSetup>,
    pub pages: Vec<PageDescriptor>,
    pub annotation: Option<RowIndexAnnotation>,
    pub tracking: Option<TrackingColumn>,
}

/// Serializable summary of a [`SheetPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayoutReport {
    pub sheet: String,
    pub mode: LayoutMode,
    pub paper: Option<PaperSize>,
    pub orientation: Option<Orientation>,
    pub scale_percent: Option<u32>,
    pub pages: Vec<PageDescriptor>,
    pub column_breaks: Vec<u32>,
    pub header_text: Option<String>,
    pub tracking_column: Option<u32>,
}

impl SheetPlan {
    pub fn report(&self) -> SheetLayoutReport {
        SheetLayoutReport {
            sheet: self.sheet.clone(),
            mode: self.mode,
            paper: self.setup.as_ref().map(|s| s.paper),
            orientation: self.setup.as_ref().map(|s| s.orientation),
            scale_percent: self.setup.as_ref().map(|s| s.scale_percent),
            pages: self.pages.clone(),
            column_breaks: self
                .setup
                .as_ref()
                .map(|s| s.column_breaks.clone())
                .unwrap_or_default(),
            header_text: self.setup.as_ref().and_then(|s| s.header_text.clone()),
            tracking_column: self.tracking.as_ref().map(|t| t.column),
        }
    }

    fn untouched(sheet: &str, mode: LayoutMode, used_range: Option<UsedRange>) -> Self {
        Self {
            sheet: sheet.to_string(),
            mode,
            used_range,
            setup: None,
            pages: Vec::new(),
            annotation: None,
            tracking: None,
        }
    }
}

fn usable_height(row: &RowMetric) -> f64 {
    if row.height_points.is_finite() && row.height_points > 0.0 {
        row.height_points
    } else {
        0.0
    }
}

/// Whether the mode asks for manual row breaks under this config.
fn wants_row_breaks(config: &PrintConfig) -> bool {
    match config.mode {
        LayoutMode::TableRowBreak => true,
        LayoutMode::Auto => config.rows_per_page.is_some(),
        _ => false,
    }
}

/// Scale the engine ends up printing at, as a fraction of 100%.
///
/// Fit-to-page only ever shrinks.
fn effective_scale(
    scaling: &ScalingParams,
    content: (f64, f64),
    printable: (f64, f64),
) -> f64 {
    if let Some(zoom) = scaling.zoom {
        return f64::from(zoom) / 100.0;
    }
    let mut scale = 1.0f64;
    if let Some(wide) = scaling.fit_wide {
        if content.0 > 0.0 {
            scale = scale.min(printable.0 * f64::from(wide) / content.0);
        }
    }
    if let Some(tall) = scaling.fit_tall {
        if content.1 > 0.0 {
            scale = scale.min(printable.1 * f64::from(tall) / content.1);
        }
    }
    scale
}

fn scale_percent(scaling: &ScalingParams, scale: f64) -> u32 {
    if let Some(zoom) = scaling.zoom {
        return zoom;
    }
    let percent = (scale * 100.0).floor() as i64;
    percent.clamp(i64::from(MIN_SCALE_PERCENT), MAX_ZOOM_PERCENT) as u32
}

/// First paper of the ladder whose printable width holds the content at
/// 100%; otherwise the largest, fit to width.
fn auto_paper(
    orientation: Orientation,
    margins: &PageMargins,
    content_width: f64,
) -> (PaperSize, ScalingParams) {
    for paper in PaperSize::AUTO_LADDER {
        let (width, _) = printable_area(paper, orientation, margins);
        if content_width <= width {
            return (paper, ScalingParams::zoom(100));
        }
    }
    (PaperSize::A2, ScalingParams::fit(Some(1), None))
}

/// Plan one sheet with an already-resolved config.
pub fn plan_sheet<S>(
    session: &S,
    sheet: &str,
    config: &PrintConfig,
    options: &LayoutOptions,
) -> Result<SheetPlan>
where
    S: WorkbookSession + ?Sized,
{
    let range = session.used_range(sheet)?;
    if config.mode == LayoutMode::NativePrint {
        debug!("Sheet '{}' keeps its own page setup", sheet);
        return Ok(SheetPlan::untouched(sheet, config.mode, range));
    }
    let Some(range) = range else {
        debug!("Sheet '{}' is empty, skipping layout", sheet);
        return Ok(SheetPlan::untouched(sheet, config.mode, None));
    };

    let margins = config.margins.resolve().map_err(|e| e.for_sheet(sheet))?;
    let requested =
        resolve_scaling(config.scaling, config.scaling_percent).map_err(|e| e.for_sheet(sheet))?;
    let rows = session.row_heights(sheet)?;
    let widths = session.column_widths(sheet)?;

    let row_index = config.row_labels == RowLabelStyle::RowIndex && wants_row_breaks(config);
    let tracking_width = if row_index {
        column_width_points(TRACKING_COLUMN_WIDTH_CHARS)
    } else {
        0.0
    };

    let column_breaks = match (config.mode, config.columns_per_page) {
        (LayoutMode::TableRowBreak, Some(max)) => plan_column_breaks(range.column_count(), max)
            .map_err(|e| e.for_sheet(sheet))?
            .into_iter()
            .map(|offset| range.first_col + offset - 1)
            .collect(),
        _ => Vec::new(),
    };

    // With column breaks each page carries one chunk; size for the widest.
    let content_width = if column_breaks.is_empty() {
        widths.iter().sum::<f64>() + tracking_width
    } else {
        let mut chunk_starts: Vec<usize> = vec![0];
        chunk_starts.extend(column_breaks.iter().map(|c| (c - range.first_col) as usize));
        chunk_starts.push(widths.len());
        chunk_starts
            .windows(2)
            .map(|w| widths[w[0].min(widths.len())..w[1].min(widths.len())].iter().sum::<f64>())
            .fold(0.0, f64::max)
            + tracking_width
    };
    let content_height: f64 = rows.iter().map(usable_height).sum();

    let orientation = match config.orientation {
        OrientationChoice::Portrait => Orientation::Portrait,
        OrientationChoice::Landscape => Orientation::Landscape,
        OrientationChoice::Auto if content_width > content_height => Orientation::Landscape,
        OrientationChoice::Auto => Orientation::Portrait,
    };

    let configured_paper = config.page_size.paper().unwrap_or(PaperSize::A4);
    let (paper, scaling) = match config.mode {
        LayoutMode::OnePage => (configured_paper, ScalingParams::one_page()),
        LayoutMode::AutoPageSize => auto_paper(orientation, &margins, content_width),
        LayoutMode::UniformPageSize => (configured_paper, ScalingParams::fit(Some(1), None)),
        _ => (configured_paper, requested),
    };

    let printable = printable_area(paper, orientation, &margins);
    if printable.0 <= 0.0 || printable.1 <= 0.0 {
        return Err(ConversionError::InputData {
            sheet: sheet.to_string(),
            message: format!("margins leave no printable area on {} {:?}", paper, orientation),
        });
    }
    // Plan with the zoom actually written, not the unclamped fit.
    let fitted = effective_scale(&scaling, (content_width, content_height), printable);
    let percent = scale_percent(&scaling, fitted);
    let scale = f64::from(percent) / 100.0;

    let pages = if !wants_row_breaks(config) {
        Vec::new()
    } else if scaling.fits_rows() {
        debug!("Sheet '{}': scaling fits rows, no manual row breaks", sheet);
        Vec::new()
    } else if let Some((first_data, _)) = range.data_rows() {
        let header_height = rows
            .iter()
            .find(|r| r.row_index == range.header_row())
            .map(usable_height)
            .unwrap_or(0.0);
        let data: Vec<RowMetric> = rows
            .iter()
            .filter(|r| r.row_index >= first_data)
            .copied()
            .collect();
        // Break in unscaled content points, keeping room for the header row.
        let page_height = printable.1 / scale;
        let budget = if header_height < page_height {
            page_height - header_height
        } else {
            warn!(
                "Sheet '{}': header row ({:.1}pt) fills the page, planning without it",
                sheet, header_height
            );
            page_height
        };
        plan_row_breaks(&data, budget, config.rows_per_page).map_err(|e| e.for_sheet(sheet))?
    } else {
        Vec::new()
    };

    let annotation = (config.row_labels == RowLabelStyle::RowIndex && !pages.is_empty())
        .then(|| annotate(&pages, options.header_budget));
    let tracking = annotation.as_ref().map(|a| TrackingColumn {
        column: range.last_col + 1,
        title_row: range.header_row(),
        title: options.column_title.clone(),
        labels: a.column_labels.clone(),
    });
    let header_text = if config.print_header_footer {
        annotation.as_ref().map(|a| a.header_text.clone())
    } else {
        None
    };

    let setup = SheetPageSetup {
        paper,
        orientation,
        margins,
        scaling,
        scale_percent: percent,
        row_breaks: row_break_positions(&pages),
        column_breaks,
        header_text,
        print_headings: config.row_labels == RowLabelStyle::HeadingNumbers,
    };

    Ok(SheetPlan {
        sheet: sheet.to_string(),
        mode: config.mode,
        used_range: Some(range),
        setup: Some(setup),
        pages,
        annotation,
        tracking,
    })
}

/// Write a plan back through the session.
pub fn apply_plan<S>(session: &mut S, plan: &SheetPlan) -> Result<()>
where
    S: WorkbookSession + ?Sized,
{
    if let Some(setup) = &plan.setup {
        session.apply_page_setup(&plan.sheet, setup)?;
    }
    if let Some(tracking) = &plan.tracking {
        session.write_tracking_column(&plan.sheet, tracking)?;
    }
    Ok(())
}

/// Resolve, plan and apply every sheet of a workbook in order.
///
/// All sheets are resolved before the first one is modified, so a
/// configuration error leaves the workbook untouched.
pub fn layout_workbook<S>(
    session: &mut S,
    configs: &PrintConfigSet,
    options: &LayoutOptions,
    log: &dyn PageLogSink,
    file_label: &str,
) -> Result<Vec<SheetPlan>>
where
    S: WorkbookSession + ?Sized,
{
    let sheets = session.sheet_names();
    let resolved = sheets
        .iter()
        .map(|name| resolve(name, configs).map(|config| (name.as_str(), config)))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut plans = Vec::with_capacity(resolved.len());
    for (sheet, config) in resolved {
        let plan = plan_sheet(&*session, sheet, config, options)?;
        apply_plan(session, &plan)?;

        if let Some(annotation) = &plan.annotation {
            log.page_lines(file_label, sheet, &annotation.log_lines);
        }
        match &plan.setup {
            Some(setup) => info!(
                "[{}] {}: {:?} on {} {:?} at {}%, {} page(s) planned",
                file_label,
                sheet,
                plan.mode,
                setup.paper,
                setup.orientation,
                setup.scale_percent,
                plan.pages.len()
            ),
            None => info!("[{}] {}: page setup left as is", file_label, sheet),
        }
        if plan.setup.as_ref().map_or(false, |s| s.print_headings) {
            warn!(
                "[{}] {}: heading numbers requested; row-index labels are not written",
                file_label, sheet
            );
        }
        plans.push(plan);
    }
    Ok(plans)
}
