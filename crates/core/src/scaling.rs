//! Scaling policy: mode name to zoom / fit-to-page parameters.

use crate::error::ConfigError;
use crate::print_config::ScalingMode;
use serde::{Deserialize, Serialize};

/// Largest zoom percentage accepted for `custom` scaling.
pub const MAX_ZOOM_PERCENT: i64 = 400;

/// Concrete page-setup scaling. `None` means the property is switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub zoom: Option<u32>,
    pub fit_wide: Option<u32>,
    pub fit_tall: Option<u32>,
}

impl ScalingParams {
    pub const fn zoom(percent: u32) -> Self {
        Self {
            zoom: Some(percent),
            fit_wide: None,
            fit_tall: None,
        }
    }

    pub const fn fit(wide: Option<u32>, tall: Option<u32>) -> Self {
        Self {
            zoom: None,
            fit_wide: wide,
            fit_tall: tall,
        }
    }

    /// Fit everything on a single page.
    pub const fn one_page() -> Self {
        Self::fit(Some(1), Some(1))
    }

    /// Whether the engine will squeeze rows to a page count, which makes
    /// manual row breaks meaningless.
    pub fn fits_rows(&self) -> bool {
        self.fit_tall.is_some()
    }
}

/// Map a scaling mode (and its percent, for `custom`) to page-setup values.
pub fn resolve_scaling(
    mode: ScalingMode,
    percent: Option<i64>,
) -> Result<ScalingParams, ConfigError> {
    Ok(match mode {
        ScalingMode::NoScaling => ScalingParams::zoom(100),
        ScalingMode::FitSheet => ScalingParams::fit(Some(1), Some(1)),
        ScalingMode::FitColumns => ScalingParams::fit(Some(1), None),
        ScalingMode::FitRows => ScalingParams::fit(None, Some(1)),
        ScalingMode::Custom => match percent {
            None => {
                return Err(ConfigError::new(
                    "scaling_percent",
                    "is required when scaling is `custom`",
                ))
            }
            Some(p) if p <= 0 || p > MAX_ZOOM_PERCENT => {
                return Err(ConfigError::new(
                    "scaling_percent",
                    format!("must be between 1 and {}, got {}", MAX_ZOOM_PERCENT, p),
                ))
            }
            Some(p) => ScalingParams::zoom(p as u32),
        },
    })
}
