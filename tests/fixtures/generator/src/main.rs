//! Test fixture generator for office-to-pdf.
//!
//! Writes a small input tree of Office documents plus matching
//! configuration and scenario files under `tests/fixtures/output`.
//! The spreadsheets exercise the layout modes: long tables for row
//! breaks, tall rows, wide tables for column breaks, several sheets
//! for prioritized print options, and language-marked file names.

use anyhow::Result;
use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run};
use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

fn main() -> Result<()> {
    let output_dir = Path::new("tests/fixtures/output");
    let input_dir = output_dir.join("input");
    fs::create_dir_all(input_dir.join("finance"))?;
    fs::create_dir_all(input_dir.join("memos"))?;

    println!("Generating test fixtures...\n");

    // Spreadsheets
    generate_long_table(&input_dir.join("finance/long_table.xlsx"), 500)?;
    generate_tall_rows(&input_dir.join("finance/tall_rows.xlsx"))?;
    generate_wide_table(&input_dir.join("finance/wide_table.xlsx"))?;
    generate_multisheet(&input_dir.join("finance/multisheet.xlsx"))?;
    generate_long_table(&input_dir.join("finance/report_VN.xlsx"), 120)?;
    generate_long_table(&input_dir.join("finance/report_JP.xlsx"), 60)?;

    // Documents
    generate_simple_docx(&input_dir.join("memos/simple.docx"))?;
    generate_multipage_docx(&input_dir.join("memos/memo_EN.docx"))?;
    generate_corrupt_docx(&input_dir.join("memos/corrupt.docx"))?;

    // Files the scanner must skip
    write_text(&input_dir.join("finance/~$long_table.xlsx"), "lock")?;
    write_text(&input_dir.join("memos/notes.txt"), "not an office document")?;

    generate_config(&output_dir.join("config.yaml"))?;
    generate_scenario(output_dir, &input_dir)?;

    println!("\nAll fixtures generated successfully!");
    Ok(())
}

fn write_header(sheet: &mut Worksheet, titles: &[&str]) -> Result<()> {
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    for (col, title) in titles.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    Ok(())
}

/// A three-column table with `rows` data rows under one header row.
fn generate_long_table(path: &Path, rows: u32) -> Result<()> {
    println!("  Creating: {}", path.display());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Data")?;
    write_header(sheet, &["Code", "Description", "Amount"])?;
    for i in 1..=rows {
        sheet.write_string(i, 0, format!("C-{:05}", i))?;
        sheet.write_string(i, 1, format!("Line item {}", i))?;
        sheet.write_number(i, 2, f64::from(i) * 12.5)?;
    }
    sheet.set_column_width(1, 30.0)?;

    workbook.save(path)?;
    Ok(())
}

/// Rows of mixed height, so height-based breaks differ from a row count.
fn generate_tall_rows(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Notes")?;
    write_header(sheet, &["Date", "Note"])?;
    for i in 1..=80u32 {
        sheet.write_string(i, 0, format!("2024-01-{:02}", i % 28 + 1))?;
        sheet.write_string(i, 1, format!("Observation {} spanning several wrapped lines", i))?;
        let height = if i % 5 == 0 { 90.0 } else { 15.0 };
        sheet.set_row_height(i, height)?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Forty columns, for column-break planning.
fn generate_wide_table(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet().set_name("Matrix")?;
    let titles: Vec<String> = (1..=40).map(|c| format!("Col {}", c)).collect();
    let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
    write_header(sheet, &titles)?;
    for row in 1..=60u32 {
        for col in 0..40u16 {
            sheet.write_number(row, col, f64::from(row) * f64::from(col + 1))?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Summary, detail and notes sheets for per-sheet print options.
fn generate_multisheet(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());

    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet().set_name("Summary")?;
    summary.write_string_with_format(0, 0, "Quarterly Summary", &Format::new().set_bold())?;
    summary.write_string(2, 0, "Revenue")?;
    summary.write_number(2, 1, 152_000.0)?;
    summary.write_string(3, 0, "Expenses")?;
    summary.write_number(3, 1, 98_500.0)?;

    let detail = workbook.add_worksheet().set_name("Detail")?;
    write_header(detail, &["Month", "Account", "Amount"])?;
    let months = ["Jan", "Feb", "Mar"];
    for i in 1..=150u32 {
        detail.write_string(i, 0, months[(i as usize) % months.len()])?;
        detail.write_string(i, 1, format!("ACC-{:03}", i % 40))?;
        detail.write_number(i, 2, f64::from(i) * 101.0)?;
    }

    let notes = workbook.add_worksheet().set_name("Notes")?;
    notes.write_string(0, 0, "Prepared by finance.")?;

    workbook.save(path)?;
    Ok(())
}

fn generate_simple_docx(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());

    let docx = Docx::new()
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("Hello, World! This is a simple memo.")),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text("It contains two paragraphs of plain text.")),
        );

    let file = File::create(path)?;
    docx.build().pack(file)?;
    Ok(())
}

fn generate_multipage_docx(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());

    let mut docx = Docx::new().add_paragraph(
        Paragraph::new()
            .add_run(Run::new().add_text("Weekly Memo").bold().size(48))
            .align(AlignmentType::Center),
    );
    for i in 1..=40 {
        let text = format!(
            "Paragraph {} of the memo. The quarterly figures are attached and the \
             review meeting is scheduled for next week in the main conference room.",
            i
        );
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(&text)));
    }
    docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
    docx = docx.add_paragraph(
        Paragraph::new().add_run(Run::new().add_text("Appendix").bold().size(36)),
    );

    let file = File::create(path)?;
    docx.build().pack(file)?;
    Ok(())
}

/// Not a ZIP archive; conversion must fail for this file only.
fn generate_corrupt_docx(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());
    write_text(path, "This is not a valid DOCX file.")
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

fn generate_config(path: &Path) -> Result<()> {
    println!("  Creating: {}", path.display());
    write_text(
        path,
        r#"print_options:
  - sheets: ["Summary"]
    priority: 1
    mode: one_page
  - sheets: ["Matrix"]
    priority: 2
    mode: table_row_break
    columns_per_page: 10
    rows_per_page: 30
  - sheets: null
    priority: 99
    mode: table_row_break
    rows_per_page: 40
excel:
  output_suffix: "_x"
  row_index:
    write_sidecar: true
language_classification:
  enabled: true
  mode: filename
  filename_patterns:
    vi: ["_VN"]
    ja: ["_JP"]
    en: [""]
timeout_minutes: 10
"#,
    )
}

fn generate_scenario(output_dir: &Path, input_dir: &Path) -> Result<()> {
    let path = output_dir.join("scenario.yaml");
    println!("  Creating: {}", path.display());
    let text = format!(
        r#"name: Fixture run
description: Finance workbooks and memos
groups:
  - name: finance
    folders: ["{finance}"]
    config: "{config}"
    output: "{finance_out}"
  - name: memos
    folders: ["{memos}"]
    config_inline:
      word_options:
        output_suffix: "_memo"
"#,
        finance = input_dir.join("finance").display(),
        memos = input_dir.join("memos").display(),
        config = output_dir.join("config.yaml").display(),
        finance_out = output_dir.join("pdf/finance").display(),
    );
    write_text(&path, &text)
}
