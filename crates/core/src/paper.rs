//! Paper sizes, orientation and margin presets.
//!
//! Physical dimensions are in points (1/72 inch), margins in inches as
//! spreadsheet page setup stores them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSize {
    A2,
    A3,
    A4,
    A5,
    B4,
    B5,
    Letter,
    Legal,
    Tabloid,
}

impl PaperSize {
    /// Every paper size, smallest area first within each family.
    pub const ALL: [PaperSize; 9] = [
        PaperSize::A5,
        PaperSize::A4,
        PaperSize::A3,
        PaperSize::A2,
        PaperSize::B5,
        PaperSize::B4,
        PaperSize::Letter,
        PaperSize::Legal,
        PaperSize::Tabloid,
    ];

    /// Sizes tried, in order, when the paper is chosen from content width.
    pub const AUTO_LADDER: [PaperSize; 3] = [PaperSize::A4, PaperSize::A3, PaperSize::A2];

    /// Portrait `(width, height)` in points.
    pub fn dimensions_points(self) -> (f64, f64) {
        match self {
            PaperSize::A2 => (1190.55, 1683.78),
            PaperSize::A3 => (841.89, 1190.55),
            PaperSize::A4 => (595.28, 841.89),
            PaperSize::A5 => (419.53, 595.28),
            PaperSize::B4 => (728.50, 1031.81),
            PaperSize::B5 => (515.91, 728.50),
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::Legal => (612.0, 1008.0),
            PaperSize::Tabloid => (792.0, 1224.0),
        }
    }

    /// `(width, height)` in points for the given orientation.
    pub fn oriented_points(self, orientation: Orientation) -> (f64, f64) {
        let (w, h) = self.dimensions_points();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// OpenXML `ST_PaperSize` code.
    pub fn xlsx_code(self) -> u32 {
        match self {
            PaperSize::Letter => 1,
            PaperSize::Tabloid => 3,
            PaperSize::Legal => 5,
            PaperSize::A3 => 8,
            PaperSize::A4 => 9,
            PaperSize::A5 => 11,
            PaperSize::B4 => 12,
            PaperSize::B5 => 13,
            PaperSize::A2 => 66,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
            PaperSize::B4 => "B4",
            PaperSize::B5 => "B5",
            PaperSize::Letter => "Letter",
            PaperSize::Legal => "Legal",
            PaperSize::Tabloid => "Tabloid",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PaperSize::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown paper size '{}'", s))
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        MarginPreset::Normal.margins()
    }
}

/// Named margin presets, matching the spreadsheet application's gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginPreset {
    #[default]
    Normal,
    Narrow,
    Wide,
    None,
}

impl MarginPreset {
    pub fn margins(self) -> PageMargins {
        match self {
            MarginPreset::Normal => PageMargins {
                left: 0.7,
                right: 0.7,
                top: 0.75,
                bottom: 0.75,
                header: 0.3,
                footer: 0.3,
            },
            MarginPreset::Narrow => PageMargins {
                left: 0.25,
                right: 0.25,
                top: 0.75,
                bottom: 0.75,
                header: 0.3,
                footer: 0.3,
            },
            MarginPreset::Wide => PageMargins {
                left: 1.0,
                right: 1.0,
                top: 1.0,
                bottom: 1.0,
                header: 0.5,
                footer: 0.5,
            },
            MarginPreset::None => PageMargins {
                left: 0.0,
                right: 0.0,
                top: 0.0,
                bottom: 0.0,
                header: 0.0,
                footer: 0.0,
            },
        }
    }
}

/// Usable `(width, height)` in points: the page minus its margins.
///
/// Either side may come out zero or negative when the margins exceed the
/// paper; callers treat that as unusable.
pub fn printable_area(
    paper: PaperSize,
    orientation: Orientation,
    margins: &PageMargins,
) -> (f64, f64) {
    let (w, h) = paper.oriented_points(orientation);
    (
        w - (margins.left + margins.right) * POINTS_PER_INCH,
        h - (margins.top + margins.bottom) * POINTS_PER_INCH,
    )
}
