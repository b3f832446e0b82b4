//! Per-sheet print configuration as it appears in the `print_options`
//! section of the configuration document.
//!
//! A document holds either one [`PrintConfig`] applied to every sheet or a
//! list of them with priorities and sheet-name allowlists; see
//! [`PrintConfigSet`] and [`crate::resolver::resolve`].

use crate::error::ConfigError;
use crate::paper::{MarginPreset, PageMargins, PaperSize};
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Priority given to entries that do not set one.
pub const DEFAULT_PRIORITY: i32 = 100;

/// Which sheets a config applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelector {
    /// Matches every sheet (`sheets: null` or key absent).
    #[default]
    All,
    /// Matches only the listed sheet names, compared exactly.
    Names(BTreeSet<String>),
}

impl SheetSelector {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SheetSelector::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, sheet_name: &str) -> bool {
        match self {
            SheetSelector::All => true,
            SheetSelector::Names(names) => names.contains(sheet_name),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SheetSelector::All)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SheetNamesRepr {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for SheetSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<SheetNamesRepr>::deserialize(deserializer)? {
            None => SheetSelector::All,
            Some(SheetNamesRepr::One(name)) => SheetSelector::names([name]),
            Some(SheetNamesRepr::Many(names)) => SheetSelector::names(names),
        })
    }
}

impl Serialize for SheetSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SheetSelector::All => serializer.serialize_none(),
            SheetSelector::Names(names) => serializer.collect_seq(names),
        }
    }
}

/// How a sheet is laid out on pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Configured scaling and orientation; breaks only when `rows_per_page` is set.
    #[default]
    Auto,
    /// The whole sheet on a single page.
    OnePage,
    /// Explicit page breaks from row heights and row/column ceilings.
    TableRowBreak,
    /// Smallest paper that holds the content width.
    AutoPageSize,
    /// Leave the workbook's own page setup untouched.
    NativePrint,
    /// Same paper for every sheet, fit to width.
    UniformPageSize,
}

/// Paper choice: a fixed size or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSizeChoice {
    #[default]
    Auto,
    Paper(PaperSize),
}

impl PageSizeChoice {
    pub fn paper(self) -> Option<PaperSize> {
        match self {
            PageSizeChoice::Auto => None,
            PageSizeChoice::Paper(p) => Some(p),
        }
    }
}

impl fmt::Display for PageSizeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSizeChoice::Auto => f.write_str("auto"),
            PageSizeChoice::Paper(p) => write!(f, "{}", p),
        }
    }
}

impl<'de> Deserialize<'de> for PageSizeChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().eq_ignore_ascii_case("auto") {
            return Ok(PageSizeChoice::Auto);
        }
        raw.parse::<PaperSize>()
            .map(PageSizeChoice::Paper)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for PageSizeChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Orientation choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationChoice {
    /// Landscape when the content is wider than tall.
    #[default]
    Auto,
    Portrait,
    Landscape,
}

/// Scaling mode names accepted in `scaling:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    NoScaling,
    FitSheet,
    #[default]
    FitColumns,
    FitRows,
    Custom,
}

/// Custom margins in inches. Every field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomMargins {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub header: Option<f64>,
    pub footer: Option<f64>,
}

impl CustomMargins {
    pub fn from_margins(m: PageMargins) -> Self {
        Self {
            left: Some(m.left),
            right: Some(m.right),
            top: Some(m.top),
            bottom: Some(m.bottom),
            header: Some(m.header),
            footer: Some(m.footer),
        }
    }

    fn resolve(&self) -> Result<PageMargins, ConfigError> {
        let take = |name: &str, value: Option<f64>| -> Result<f64, ConfigError> {
            match value {
                None => Err(ConfigError::new(
                    "margins",
                    format!("custom margins are missing `{}`", name),
                )),
                Some(v) if !v.is_finite() || v < 0.0 => Err(ConfigError::new(
                    "margins",
                    format!("custom margin `{}` must be >= 0, got {}", name, v),
                )),
                Some(v) => Ok(v),
            }
        };
        Ok(PageMargins {
            left: take("left", self.left)?,
            right: take("right", self.right)?,
            top: take("top", self.top)?,
            bottom: take("bottom", self.bottom)?,
            header: take("header", self.header)?,
            footer: take("footer", self.footer)?,
        })
    }
}

/// `margins:` is either a preset name or a mapping of the six fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarginSpec {
    Preset(MarginPreset),
    Custom(CustomMargins),
}

impl Default for MarginSpec {
    fn default() -> Self {
        MarginSpec::Preset(MarginPreset::Normal)
    }
}

impl MarginSpec {
    pub fn resolve(&self) -> Result<PageMargins, ConfigError> {
        match self {
            MarginSpec::Preset(preset) => Ok(preset.margins()),
            MarginSpec::Custom(custom) => custom.resolve(),
        }
    }
}

/// How printed pages are tied back to source rows.
///
/// Heading numbers print the grid's row/column headings on every page; the
/// row index writes a page->row map into the header and a tracking column.
/// The two are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowLabelStyle {
    None,
    #[default]
    RowIndex,
    /// Deprecated in favour of `RowIndex`.
    HeadingNumbers,
}

/// One print configuration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPrintConfig")]
pub struct PrintConfig {
    pub sheet_names: SheetSelector,
    pub priority: i32,
    pub mode: LayoutMode,
    pub page_size: PageSizeChoice,
    pub orientation: OrientationChoice,
    pub scaling: ScalingMode,
    pub scaling_percent: Option<i64>,
    pub margins: MarginSpec,
    pub rows_per_page: Option<u32>,
    pub columns_per_page: Option<u32>,
    pub print_header_footer: bool,
    pub row_labels: RowLabelStyle,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            sheet_names: SheetSelector::All,
            priority: DEFAULT_PRIORITY,
            mode: LayoutMode::Auto,
            page_size: PageSizeChoice::Auto,
            orientation: OrientationChoice::Auto,
            scaling: ScalingMode::FitColumns,
            scaling_percent: None,
            margins: MarginSpec::default(),
            rows_per_page: None,
            columns_per_page: None,
            print_header_footer: true,
            row_labels: RowLabelStyle::RowIndex,
        }
    }
}

impl PrintConfig {
    /// A config restricted to the given sheets.
    pub fn for_sheets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sheet_names: SheetSelector::names(names),
            ..Default::default()
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn mode(mut self, mode: LayoutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn page_size(mut self, paper: PaperSize) -> Self {
        self.page_size = PageSizeChoice::Paper(paper);
        self
    }

    pub fn orientation(mut self, orientation: OrientationChoice) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn scaling(mut self, scaling: ScalingMode, percent: Option<i64>) -> Self {
        self.scaling = scaling;
        self.scaling_percent = percent;
        self
    }

    pub fn margins(mut self, margins: MarginSpec) -> Self {
        self.margins = margins;
        self
    }

    pub fn rows_per_page(mut self, rows: u32) -> Self {
        self.rows_per_page = Some(rows);
        self
    }

    pub fn columns_per_page(mut self, columns: u32) -> Self {
        self.columns_per_page = Some(columns);
        self
    }

    pub fn print_header_footer(mut self, enabled: bool) -> Self {
        self.print_header_footer = enabled;
        self
    }

    pub fn row_labels(mut self, style: RowLabelStyle) -> Self {
        self.row_labels = style;
        self
    }

    /// Check the value invariants. Errors carry no sheet; the resolver adds it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::scaling::resolve_scaling(self.scaling, self.scaling_percent)?;
        self.margins.resolve()?;
        if self.rows_per_page == Some(0) {
            return Err(ConfigError::new("rows_per_page", "must be a positive integer"));
        }
        if self.columns_per_page == Some(0) {
            return Err(ConfigError::new(
                "columns_per_page",
                "must be a positive integer",
            ));
        }
        Ok(())
    }
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_true() -> bool {
    true
}

/// Wire shape: the legacy `print_row_col_headings` flag folds into
/// `row_labels` here.
#[derive(Deserialize)]
struct RawPrintConfig {
    #[serde(default, alias = "sheets")]
    sheet_names: SheetSelector,
    #[serde(default = "default_priority")]
    priority: i32,
    #[serde(default)]
    mode: LayoutMode,
    #[serde(default)]
    page_size: PageSizeChoice,
    #[serde(default)]
    orientation: OrientationChoice,
    #[serde(default)]
    scaling: ScalingMode,
    #[serde(default)]
    scaling_percent: Option<i64>,
    #[serde(default)]
    margins: MarginSpec,
    #[serde(default)]
    rows_per_page: Option<u32>,
    #[serde(default)]
    columns_per_page: Option<u32>,
    #[serde(default = "default_true")]
    print_header_footer: bool,
    #[serde(default)]
    print_row_col_headings: Option<bool>,
    #[serde(default)]
    row_labels: Option<RowLabelStyle>,
}

impl From<RawPrintConfig> for PrintConfig {
    fn from(raw: RawPrintConfig) -> Self {
        let row_labels = match (raw.row_labels, raw.print_row_col_headings) {
            (Some(style), _) => style,
            (None, Some(true)) => RowLabelStyle::HeadingNumbers,
            (None, _) => RowLabelStyle::RowIndex,
        };
        Self {
            sheet_names: raw.sheet_names,
            priority: raw.priority,
            mode: raw.mode,
            page_size: raw.page_size,
            orientation: raw.orientation,
            scaling: raw.scaling,
            scaling_percent: raw.scaling_percent,
            margins: raw.margins,
            rows_per_page: raw.rows_per_page,
            columns_per_page: raw.columns_per_page,
            print_header_footer: raw.print_header_footer,
            row_labels,
        }
    }
}

/// The `print_options` value: one config for every sheet, or a prioritized list.
///
/// The shape of the document (sequence or mapping) picks the variant, so a
/// bad field inside either shape reports its own error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrintConfigSet {
    Prioritized(Vec<PrintConfig>),
    Uniform(PrintConfig),
}

impl<'de> Deserialize<'de> for PrintConfigSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ShapeVisitor;

        impl<'de> Visitor<'de> for ShapeVisitor {
            type Value = PrintConfigSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a print configuration mapping or a list of them")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(PrintConfigSet::default())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> Result<Self::Value, A::Error> {
                Vec::deserialize(SeqAccessDeserializer::new(seq)).map(PrintConfigSet::Prioritized)
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                PrintConfig::deserialize(MapAccessDeserializer::new(map))
                    .map(PrintConfigSet::Uniform)
            }
        }

        deserializer.deserialize_any(ShapeVisitor)
    }
}

impl Default for PrintConfigSet {
    fn default() -> Self {
        PrintConfigSet::Uniform(PrintConfig::default())
    }
}

impl PrintConfigSet {
    /// Whether some entry matches every sheet.
    pub fn has_default(&self) -> bool {
        match self {
            PrintConfigSet::Uniform(_) => true,
            PrintConfigSet::Prioritized(list) => list.iter().any(|c| c.sheet_names.is_all()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PrintConfigSet::Uniform(_) => 1,
            PrintConfigSet::Prioritized(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
