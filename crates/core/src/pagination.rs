//! Page-break planning from row heights and row/column ceilings.

use crate::error::InputDataError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Height of one source row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowMetric {
    /// 1-based sheet row.
    pub row_index: u32,
    pub height_points: f64,
}

impl RowMetric {
    pub fn new(row_index: u32, height_points: f64) -> Self {
        Self {
            row_index,
            height_points,
        }
    }
}

/// One printed page and the source rows it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub page_number: u32,
    pub start_row: u32,
    pub end_row: u32,
    pub row_count: u32,
}

impl PageDescriptor {
    pub fn new(page_number: u32, start_row: u32, end_row: u32) -> Self {
        Self {
            page_number,
            start_row,
            end_row,
            row_count: end_row - start_row + 1,
        }
    }
}

/// Split rows into pages.
///
/// A page closes before a row that would push it past
/// `printable_height_points`, or once it holds `max_rows_per_page` rows.
/// A row taller than the printable height gets a page of its own. Rows must
/// be consecutive; negative or non-finite heights count as zero.
pub fn plan_row_breaks(
    rows: &[RowMetric],
    printable_height_points: f64,
    max_rows_per_page: Option<u32>,
) -> Result<Vec<PageDescriptor>, InputDataError> {
    if !printable_height_points.is_finite() || printable_height_points <= 0.0 {
        return Err(InputDataError(format!(
            "printable height must be positive, got {}",
            printable_height_points
        )));
    }
    if max_rows_per_page == Some(0) {
        return Err(InputDataError("row limit per page must be positive".into()));
    }

    let mut pages = Vec::new();
    let mut page_start = 0u32;
    let mut page_height = 0.0f64;
    let mut page_rows = 0u32;
    let mut previous: Option<u32> = None;

    for row in rows {
        if row.row_index == 0 {
            return Err(InputDataError("row indices are 1-based, got row 0".into()));
        }
        if let Some(prev) = previous {
            if row.row_index != prev + 1 {
                return Err(InputDataError(format!(
                    "rows must be consecutive, row {} follows row {}",
                    row.row_index, prev
                )));
            }
        }
        previous = Some(row.row_index);

        let height = if row.height_points.is_finite() && row.height_points >= 0.0 {
            row.height_points
        } else {
            warn!(
                "Row {} has unusable height {}, treating as 0",
                row.row_index, row.height_points
            );
            0.0
        };

        if page_rows > 0 {
            let over_height = page_height + height > printable_height_points;
            let over_count = max_rows_per_page.map_or(false, |max| page_rows >= max);
            if over_height || over_count {
                let number = pages.len() as u32 + 1;
                pages.push(PageDescriptor::new(number, page_start, row.row_index - 1));
                page_rows = 0;
                page_height = 0.0;
            }
        }

        if page_rows == 0 {
            page_start = row.row_index;
        }
        page_height += height;
        page_rows += 1;
    }

    if let Some(last) = previous {
        let number = pages.len() as u32 + 1;
        pages.push(PageDescriptor::new(number, page_start, last));
    }
    Ok(pages)
}

/// Column offsets (1-based, relative to the first used column) that start a
/// new page when at most `max_columns_per_page` columns fit on one.
pub fn plan_column_breaks(
    column_count: u32,
    max_columns_per_page: u32,
) -> Result<Vec<u32>, InputDataError> {
    if max_columns_per_page == 0 {
        return Err(InputDataError("column limit per page must be positive".into()));
    }
    Ok((1..)
        .map(|k| k * max_columns_per_page + 1)
        .take_while(|&offset| offset <= column_count)
        .collect())
}

/// First row of every page after the first, i.e. where manual breaks go.
pub fn row_break_positions(pages: &[PageDescriptor]) -> Vec<u32> {
    pages.iter().skip(1).map(|p| p.start_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn uniform(count: u32, height: f64) -> Vec<RowMetric> {
        (1..=count).map(|i| RowMetric::new(i, height)).collect()
    }

    #[test]
    fn test_row_limit_binds_before_height() {
        let pages = plan_row_breaks(&uniform(150, 5.0), 750.0, Some(100)).unwrap();
        assert_eq!(
            pages,
            vec![PageDescriptor::new(1, 1, 100), PageDescriptor::new(2, 101, 150)]
        );
        assert_eq!(pages[0].row_count, 100);
        assert_eq!(pages[1].row_count, 50);
    }

    #[test]
    fn test_height_binds_before_row_limit() {
        let pages = plan_row_breaks(&uniform(150, 15.0), 750.0, Some(100)).unwrap();
        assert_eq!(
            pages,
            vec![
                PageDescriptor::new(1, 1, 50),
                PageDescriptor::new(2, 51, 100),
                PageDescriptor::new(3, 101, 150),
            ]
        );
    }

    #[test]
    fn test_oversized_single_row() {
        let pages = plan_row_breaks(&[RowMetric::new(1, 900.0)], 750.0, None).unwrap();
        assert_eq!(pages, vec![PageDescriptor::new(1, 1, 1)]);
    }

    #[test]
    fn test_oversized_row_between_normal_rows_is_alone() {
        let rows = vec![
            RowMetric::new(1, 100.0),
            RowMetric::new(2, 900.0),
            RowMetric::new(3, 100.0),
        ];
        let pages = plan_row_breaks(&rows, 750.0, None).unwrap();
        assert_eq!(
            pages,
            vec![
                PageDescriptor::new(1, 1, 1),
                PageDescriptor::new(2, 2, 2),
                PageDescriptor::new(3, 3, 3),
            ]
        );
    }

    #[test]
    fn test_zero_rows_is_empty() {
        assert!(plan_row_breaks(&[], 750.0, Some(10)).unwrap().is_empty());
    }

    #[test]
    fn test_sequence_starts_at_first_data_row() {
        let rows: Vec<_> = (2..=26).map(|i| RowMetric::new(i, 15.0)).collect();
        let pages = plan_row_breaks(&rows, 750.0, Some(5)).unwrap();
        assert_eq!(pages.len(), 5);
        assert_eq!(pages[0], PageDescriptor::new(1, 2, 6));
        assert_eq!(pages[4], PageDescriptor::new(5, 22, 26));
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        let pages = plan_row_breaks(&uniform(10, 75.0), 750.0, None).unwrap();
        assert_eq!(pages, vec![PageDescriptor::new(1, 1, 10)]);
    }

    #[test]
    fn test_negative_height_treated_as_zero() {
        let rows = vec![
            RowMetric::new(1, 500.0),
            RowMetric::new(2, -40.0),
            RowMetric::new(3, 250.0),
        ];
        let pages = plan_row_breaks(&rows, 750.0, None).unwrap();
        assert_eq!(pages, vec![PageDescriptor::new(1, 1, 3)]);
    }

    #[test]
    fn test_gap_in_rows_is_fatal() {
        let rows = vec![RowMetric::new(1, 10.0), RowMetric::new(3, 10.0)];
        let err = plan_row_breaks(&rows, 750.0, None).unwrap_err();
        assert!(err.0.contains("row 3 follows row 1"));
    }

    #[test]
    fn test_non_positive_printable_height_is_fatal() {
        assert!(plan_row_breaks(&uniform(3, 10.0), 0.0, None).is_err());
        assert!(plan_row_breaks(&uniform(3, 10.0), -5.0, None).is_err());
        assert!(plan_row_breaks(&uniform(3, 10.0), f64::NAN, None).is_err());
    }

    #[test]
    fn test_zero_row_limit_is_rejected() {
        assert!(plan_row_breaks(&uniform(3, 10.0), 750.0, Some(0)).is_err());
    }

    #[test]
    fn test_column_breaks() {
        assert_eq!(plan_column_breaks(10, 3).unwrap(), vec![4, 7, 10]);
        assert_eq!(plan_column_breaks(3, 3).unwrap(), Vec::<u32>::new());
        assert_eq!(plan_column_breaks(0, 3).unwrap(), Vec::<u32>::new());
        assert_eq!(plan_column_breaks(4, 1).unwrap(), vec![2, 3, 4]);
        assert!(plan_column_breaks(5, 0).is_err());
    }

    #[test]
    fn test_row_break_positions() {
        let pages = plan_row_breaks(&uniform(150, 15.0), 750.0, None).unwrap();
        assert_eq!(row_break_positions(&pages), vec![51, 101]);
    }

    proptest! {
        #[test]
        fn prop_pages_are_contiguous_and_cover_every_row(
            first_row in 1u32..500,
            heights in proptest::collection::vec(0.0f64..1200.0, 1..300),
            printable in 1.0f64..1500.0,
            limit in proptest::option::of(1u32..120),
        ) {
            let rows: Vec<RowMetric> = heights
                .iter()
                .enumerate()
                .map(|(i, h)| RowMetric::new(first_row + i as u32, *h))
                .collect();
            let pages = plan_row_breaks(&rows, printable, limit).unwrap();

            prop_assert!(!pages.is_empty());
            prop_assert_eq!(pages[0].start_row, first_row);
            prop_assert_eq!(pages.last().unwrap().end_row, rows.last().unwrap().row_index);
            let mut covered = 0u32;
            for (i, page) in pages.iter().enumerate() {
                prop_assert_eq!(page.page_number, i as u32 + 1);
                prop_assert!(page.row_count >= 1);
                prop_assert_eq!(page.row_count, page.end_row - page.start_row + 1);
                if let Some(max) = limit {
                    prop_assert!(page.row_count <= max);
                }
                if i > 0 {
                    prop_assert_eq!(page.start_row, pages[i - 1].end_row + 1);
                }
                covered += page.row_count;
            }
            prop_assert_eq!(covered as usize, rows.len());
        }
    }
}
