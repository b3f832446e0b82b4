//! Per-sheet config resolution.

use crate::error::ConfigError;
use crate::print_config::{PrintConfig, PrintConfigSet};

/// Select the config that applies to `sheet_name`.
///
/// A uniform set always yields its only entry. In a prioritized list, every
/// entry whose selector matches is a candidate; the numerically smallest
/// priority wins and ties go to the entry listed first. The chosen config is
/// validated, and every error names the sheet.
pub fn resolve<'a>(
    sheet_name: &str,
    configs: &'a PrintConfigSet,
) -> Result<&'a PrintConfig, ConfigError> {
    let chosen = match configs {
        PrintConfigSet::Uniform(config) => config,
        PrintConfigSet::Prioritized(list) => list
            .iter()
            .filter(|c| c.sheet_names.matches(sheet_name))
            // min_by_key returns the first of equal minima.
            .min_by_key(|c| c.priority)
            .ok_or_else(|| {
                ConfigError::new(
                    "sheet_names",
                    format!(
                        "no entry of {} matches and no default (`sheets: null`) entry is present",
                        list.len()
                    ),
                )
                .for_sheet(sheet_name)
            })?,
    };
    chosen.validate().map_err(|e| e.for_sheet(sheet_name))?;
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print_config::{LayoutMode, ScalingMode};

    fn priority_law_set() -> PrintConfigSet {
        PrintConfigSet::Prioritized(vec![
            PrintConfig::for_sheets(["Report"]).priority(1).mode(LayoutMode::OnePage),
            PrintConfig::for_sheets(["Report", "Data"])
                .priority(2)
                .mode(LayoutMode::TableRowBreak),
            PrintConfig::default().priority(99),
        ])
    }

    #[test]
    fn test_priority_law() {
        let set = priority_law_set();
        let PrintConfigSet::Prioritized(list) = &set else {
            unreachable!()
        };
        assert_eq!(resolve("Report", &set).unwrap(), &list[0]);
        assert_eq!(resolve("Data", &set).unwrap(), &list[1]);
        assert_eq!(resolve("Other", &set).unwrap(), &list[2]);
    }

    #[test]
    fn test_order_of_listing_does_not_beat_priority() {
        let set = PrintConfigSet::Prioritized(vec![
            PrintConfig::default().priority(99),
            PrintConfig::for_sheets(["Report"]).priority(1),
        ]);
        assert_eq!(resolve("Report", &set).unwrap().priority, 1);
    }

    #[test]
    fn test_tie_goes_to_first_listed() {
        let set = PrintConfigSet::Prioritized(vec![
            PrintConfig::for_sheets(["S"]).priority(5).mode(LayoutMode::OnePage),
            PrintConfig::for_sheets(["S"]).priority(5).mode(LayoutMode::NativePrint),
            PrintConfig::default().priority(5).mode(LayoutMode::AutoPageSize),
        ]);
        assert_eq!(resolve("S", &set).unwrap().mode, LayoutMode::OnePage);
    }

    #[test]
    fn test_uniform_returns_config_unchanged() {
        let cfg = PrintConfig::for_sheets(["Only"]).mode(LayoutMode::AutoPageSize);
        let set = PrintConfigSet::Uniform(cfg.clone());
        // Uniform mode ignores the allowlist.
        assert_eq!(resolve("Anything", &set).unwrap(), &cfg);
    }

    #[test]
    fn test_no_match_without_default_fails_naming_sheet() {
        let set = PrintConfigSet::Prioritized(vec![PrintConfig::for_sheets(["A"])]);
        let err = resolve("B", &set).unwrap_err();
        assert_eq!(err.sheet.as_deref(), Some("B"));
        assert_eq!(err.field, "sheet_names");
    }

    #[test]
    fn test_empty_list_fails() {
        let set = PrintConfigSet::Prioritized(vec![]);
        assert!(resolve("Sheet1", &set).is_err());
    }

    #[test]
    fn test_invalid_chosen_config_names_sheet_and_field() {
        let set = PrintConfigSet::Prioritized(vec![
            PrintConfig::for_sheets(["Bad"]).priority(1).scaling(ScalingMode::Custom, None),
            PrintConfig::default(),
        ]);
        let err = resolve("Bad", &set).unwrap_err();
        assert_eq!(err.sheet.as_deref(), Some("Bad"));
        assert_eq!(err.field, "scaling_percent");
        // Other sheets fall through to the valid default.
        assert!(resolve("Good", &set).is_ok());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let set = priority_law_set();
        for name in ["Report", "Data", "Other", ""] {
            let first = resolve(name, &set).unwrap();
            for _ in 0..10 {
                assert!(std::ptr::eq(first, resolve(name, &set).unwrap()));
            }
        }
    }
}
