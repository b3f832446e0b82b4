//! Row-index annotation: ties printed pages back to source rows.
//!
//! A planned page sequence becomes three artefacts:
//!
//! - a compact header string (`P1:R2-6, P2:R7-11`) printed on every page,
//! - one label per page for the tracking column, placed at the page's first row,
//! - one log line per page.

use crate::pagination::PageDescriptor;
use serde::{Deserialize, Serialize};

/// Character budget for the header text. Header fields in spreadsheet page
/// setup are short; past this the token list is cut and a count appended.
pub const DEFAULT_HEADER_BUDGET: usize = 100;

/// Everything written for one sheet's page map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIndexAnnotation {
    pub header_text: String,
    /// `(row_index, label)` pairs, one per page.
    pub column_labels: Vec<(u32, String)>,
    pub log_lines: Vec<String>,
}

fn header_token(page: &PageDescriptor) -> String {
    format!("P{}:R{}-{}", page.page_number, page.start_row, page.end_row)
}

fn truncation_marker(omitted: usize) -> String {
    format!("...+{}pages", omitted)
}

/// Build the header, tracking labels and log lines for `pages`.
pub fn annotate(pages: &[PageDescriptor], header_budget: usize) -> RowIndexAnnotation {
    let column_labels = pages
        .iter()
        .map(|p| {
            (
                p.start_row,
                format!("P{}: R{}-{}", p.page_number, p.start_row, p.end_row),
            )
        })
        .collect();
    let log_lines = pages
        .iter()
        .map(|p| {
            format!(
                "Page {}: Rows {}-{} ({} rows)",
                p.page_number, p.start_row, p.end_row, p.row_count
            )
        })
        .collect();

    RowIndexAnnotation {
        header_text: header_text(pages, header_budget),
        column_labels,
        log_lines,
    }
}

/// Comma-joined page tokens, cut to `budget` characters.
///
/// When the full list does not fit, the longest prefix of whole tokens that
/// fits together with `...+{N}pages` is kept, N being the pages left out.
pub fn header_text(pages: &[PageDescriptor], budget: usize) -> String {
    let tokens: Vec<String> = pages.iter().map(header_token).collect();
    let full = tokens.join(", ");
    if full.len() <= budget {
        return full;
    }

    let mut kept = tokens.len();
    while kept > 0 {
        kept -= 1;
        let candidate = join_with_marker(&tokens[..kept], tokens.len() - kept);
        if candidate.len() <= budget {
            return candidate;
        }
    }
    truncation_marker(tokens.len())
}

fn join_with_marker(kept: &[String], omitted: usize) -> String {
    let marker = truncation_marker(omitted);
    if kept.is_empty() {
        marker
    } else {
        format!("{}, {}", kept.join(", "), marker)
    }
}

/// Recover page descriptors from a header written by [`header_text`].
///
/// Returns `None` for text that is not a page map. A trailing truncation
/// marker is accepted and skipped, so a truncated header yields only the
/// pages it still lists.
pub fn parse_header_text(text: &str) -> Option<Vec<PageDescriptor>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Vec::new());
    }
    let mut pages = Vec::new();
    for token in text.split(',').map(str::trim) {
        if token.starts_with("...+") && token.ends_with("pages") {
            continue;
        }
        pages.push(parse_token(token)?);
    }
    Some(pages)
}

fn parse_token(token: &str) -> Option<PageDescriptor> {
    let rest = token.strip_prefix('P')?;
    let (page, rows) = rest.split_once(":R")?;
    let (start, end) = rows.split_once('-')?;
    let page_number: u32 = page.parse().ok()?;
    let start_row: u32 = start.parse().ok()?;
    let end_row: u32 = end.parse().ok()?;
    if page_number == 0 || start_row == 0 || end_row < start_row {
        return None;
    }
    Some(PageDescriptor::new(page_number, start_row, end_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{plan_row_breaks, RowMetric};

    fn pages_of(rows_per_page: u32, count: u32, first_row: u32) -> Vec<PageDescriptor> {
        (0..count)
            .map(|i| {
                let start = first_row + i * rows_per_page;
                PageDescriptor::new(i + 1, start, start + rows_per_page - 1)
            })
            .collect()
    }

    #[test]
    fn test_two_pages_after_header_row() {
        let pages = pages_of(5, 2, 2);
        let ann = annotate(&pages, DEFAULT_HEADER_BUDGET);
        assert_eq!(ann.header_text, "P1:R2-6, P2:R7-11");
        assert_eq!(
            ann.column_labels,
            vec![(2, "P1: R2-6".to_string()), (7, "P2: R7-11".to_string())]
        );
        assert_eq!(
            ann.log_lines,
            vec!["Page 1: Rows 2-6 (5 rows)", "Page 2: Rows 7-11 (5 rows)"]
        );
    }

    #[test]
    fn test_empty_pages() {
        let ann = annotate(&[], DEFAULT_HEADER_BUDGET);
        assert_eq!(ann.header_text, "");
        assert!(ann.column_labels.is_empty());
        assert!(ann.log_lines.is_empty());
    }

    #[test]
    fn test_fifty_pages_truncate_with_count() {
        let pages = pages_of(10, 50, 2);
        let text = header_text(&pages, DEFAULT_HEADER_BUDGET);
        assert!(text.len() <= DEFAULT_HEADER_BUDGET, "{} chars", text.len());

        let (listed, marker) = text.rsplit_once(", ").unwrap();
        let kept = listed.split(", ").count();
        assert_eq!(marker, format!("...+{}pages", 50 - kept));
        assert!(text.starts_with("P1:R2-11, P2:R12-21"));

        // One more token would not fit.
        let longer = join_with_marker(
            &pages[..kept + 1].iter().map(header_token).collect::<Vec<_>>(),
            50 - kept - 1,
        );
        assert!(longer.len() > DEFAULT_HEADER_BUDGET);
    }

    #[test]
    fn test_budget_is_configurable() {
        let pages = pages_of(5, 3, 2);
        assert_eq!(header_text(&pages, 28), "P1:R2-6, P2:R7-11, P3:R12-16");
        assert_eq!(header_text(&pages, 27), "P1:R2-6, ...+2pages");
        assert_eq!(header_text(&pages, 12), "...+3pages");
        // The marker alone is the floor even when it overflows.
        assert_eq!(header_text(&pages, 5), "...+3pages");
    }

    #[test]
    fn test_column_labels_one_per_page_at_start_row() {
        let pages = pages_of(3, 4, 5);
        let ann = annotate(&pages, DEFAULT_HEADER_BUDGET);
        let rows: Vec<u32> = ann.column_labels.iter().map(|(r, _)| *r).collect();
        assert_eq!(rows, vec![5, 8, 11, 14]);
    }

    #[test]
    fn test_parse_round_trip_from_planner() {
        let rows: Vec<RowMetric> = (2..=40)
            .map(|i| RowMetric::new(i, 15.0 + (i % 3) as f64))
            .collect();
        let pages = plan_row_breaks(&rows, 120.0, Some(6)).unwrap();
        let text = header_text(&pages, usize::MAX);
        assert_eq!(parse_header_text(&text).unwrap(), pages);
    }

    #[test]
    fn test_parse_skips_truncation_marker() {
        let parsed = parse_header_text("P1:R2-6, P2:R7-11, ...+3pages").unwrap();
        assert_eq!(parsed, pages_of(5, 2, 2));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_header_text("Page 1 of 3").is_none());
        assert!(parse_header_text("P1:R9-2").is_none());
        assert!(parse_header_text("P0:R1-2").is_none());
        assert_eq!(parse_header_text("  ").unwrap(), Vec::new());
    }
}
