use super::load_config;
use anyhow::Context;
use office_to_pdf_core::layout::plan_sheet;
use office_to_pdf_core::{resolve, SheetLayoutReport, WorkbookSession, XlsxSession};
use std::path::Path;

pub fn run(workbook: &Path, config: Option<&Path>, json: bool) -> anyhow::Result<i32> {
    let config = load_config(config)?;
    let session = XlsxSession::open(workbook)
        .with_context(|| format!("opening {}", workbook.display()))?;
    let options = config.layout_options();

    let mut reports = Vec::new();
    for sheet in session.sheet_names() {
        let resolved = resolve(&sheet, &config.print_options)?;
        let plan = plan_sheet(&session, &sheet, resolved, &options)?;
        reports.push(plan.report());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }
    Ok(0)
}

fn print_report(report: &SheetLayoutReport) {
    println!("{} ({:?})", report.sheet, report.mode);
    match (report.paper, report.orientation, report.scale_percent) {
        (Some(paper), Some(orientation), Some(scale)) => {
            println!("  {} {:?} at {}%", paper, orientation, scale)
        }
        _ => println!("  page setup left as is"),
    }
    if !report.column_breaks.is_empty() {
        println!("  column breaks before {:?}", report.column_breaks);
    }
    for page in &report.pages {
        println!(
            "  page {}: rows {}-{} ({} rows)",
            page.page_number, page.start_row, page.end_row, page.row_count
        );
    }
    if let Some(header) = &report.header_text {
        println!("  header: {}", header);
    }
    if let Some(column) = report.tracking_column {
        println!("  tracking column: {}", column);
    }
}
