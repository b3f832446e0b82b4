//! Configuration types for office-to-pdf conversion.
//!
//! The configuration document is YAML. Every section is optional and falls
//! back to the defaults documented on each field.

use crate::error::{ConversionError, Result};
use crate::layout::{LayoutOptions, SheetLayoutReport, DEFAULT_TRACKING_TITLE};
use crate::annotate::DEFAULT_HEADER_BUDGET;
use crate::print_config::PrintConfigSet;
use crate::DocumentKind;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default per-file timeout, in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 45;

/// Configuration for the LibreOffice process pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of LibreOffice instances in the pool.
    /// Default: number of CPU cores.
    pub pool_size: usize,

    /// Timeout for individual document conversions.
    /// Set from `timeout_minutes` of the configuration document.
    #[serde(skip)]
    pub conversion_timeout: Duration,

    /// Documents per instance before its profile is reported for recycling.
    /// Default: 100 documents.
    pub max_docs_per_instance: u32,

    /// Directory for prepared workbooks and intermediate PDFs.
    /// Default: system temp directory.
    pub temp_dir: Option<PathBuf>,

    /// Path to soffice binary. If None, searches PATH.
    pub soffice_path: Option<PathBuf>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: num_cpus::get(),
            conversion_timeout: Duration::from_secs(DEFAULT_TIMEOUT_MINUTES * 60),
            max_docs_per_instance: 100,
            temp_dir: None,
            soffice_path: None,
        }
    }
}

impl PoolConfig {
    /// Create a new pool config with specified pool size.
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Default::default()
        }
    }

    /// Set the conversion timeout.
    pub fn conversion_timeout(mut self, timeout: Duration) -> Self {
        self.conversion_timeout = timeout;
        self
    }

    /// Set the maximum documents per instance before recycling.
    pub fn max_docs_per_instance(mut self, max: u32) -> Self {
        self.max_docs_per_instance = max;
        self
    }

    /// Set the temporary directory.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    /// Set the soffice binary path.
    pub fn soffice_path(mut self, path: PathBuf) -> Self {
        self.soffice_path = Some(path);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(ConversionError::InvalidConfig(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if self.conversion_timeout.as_secs() == 0 {
            return Err(ConversionError::InvalidConfig(
                "conversion_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// `excel.row_index`: how page-to-row maps are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowIndexOptions {
    /// Title cell of the tracking column. Default: "Page-Row Index".
    pub column_title: String,
    /// Character budget of the header text. Default: 100.
    pub header_budget: usize,
    /// Write `<pdf>.rows.json` next to each exported workbook. Default: false.
    pub write_sidecar: bool,
}

impl Default for RowIndexOptions {
    fn default() -> Self {
        Self {
            column_title: DEFAULT_TRACKING_TITLE.to_string(),
            header_budget: DEFAULT_HEADER_BUDGET,
            write_sidecar: false,
        }
    }
}

/// `excel` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelOptions {
    pub output_suffix: String,
    /// When false every sheet is exported with its own page setup.
    pub optimize_layout: bool,
    /// Auto-fit the width of columns whose cells do not wrap, before layout.
    pub enhance_layout: bool,
    pub row_index: RowIndexOptions,
}

impl Default for ExcelOptions {
    fn default() -> Self {
        Self {
            output_suffix: "_x".to_string(),
            optimize_layout: true,
            enhance_layout: false,
            row_index: RowIndexOptions::default(),
        }
    }
}

/// `word_options` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordOptions {
    pub output_suffix: String,
}

impl Default for WordOptions {
    fn default() -> Self {
        Self {
            output_suffix: "_d".to_string(),
        }
    }
}

/// `powerpoint_options` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerPointOptions {
    pub output_suffix: String,
}

impl Default for PowerPointOptions {
    fn default() -> Self {
        Self {
            output_suffix: "_p".to_string(),
        }
    }
}

/// How a file's language is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageMode {
    /// Detect from workbook text, falling back to the filename.
    #[default]
    Auto,
    /// Match `filename_patterns` against the file stem.
    Filename,
}

/// Substrings that mark a file stem as one language. An empty pattern is a
/// catch-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePatterns {
    pub lang: String,
    pub patterns: Vec<String>,
}

/// `language_classification` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub enabled: bool,
    pub mode: LanguageMode,
    /// Language -> patterns, in document order.
    #[serde(
        serialize_with = "serialize_patterns",
        deserialize_with = "deserialize_patterns"
    )]
    pub filename_patterns: Vec<LanguagePatterns>,
    pub keep_folder_structure: bool,
    /// Output folder name; `{lang}` is replaced by the language code.
    pub output_suffix_format: String,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: LanguageMode::Auto,
            filename_patterns: Vec::new(),
            keep_folder_structure: true,
            output_suffix_format: "output-{lang}".to_string(),
        }
    }
}

impl LanguageConfig {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn mode(mut self, mode: LanguageMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn pattern<I, S>(mut self, lang: &str, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filename_patterns.push(LanguagePatterns {
            lang: lang.to_string(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Folder name for a language code.
    pub fn folder_name(&self, lang: &str) -> String {
        self.output_suffix_format.replace("{lang}", lang)
    }
}

fn serialize_patterns<S: Serializer>(
    patterns: &[LanguagePatterns],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(patterns.len()))?;
    for entry in patterns {
        map.serialize_entry(&entry.lang, &entry.patterns)?;
    }
    map.end()
}

fn deserialize_patterns<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<LanguagePatterns>, D::Error> {
    struct OrderedPatterns;

    impl<'de> Visitor<'de> for OrderedPatterns {
        type Value = Vec<LanguagePatterns>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of language codes to pattern lists")
        }

        fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut map: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some((lang, patterns)) = map.next_entry::<String, Vec<String>>()? {
                out.push(LanguagePatterns { lang, patterns });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(OrderedPatterns)
}

fn default_timeout_minutes() -> u64 {
    DEFAULT_TIMEOUT_MINUTES
}

/// The whole configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub print_options: PrintConfigSet,
    #[serde(default)]
    pub excel: ExcelOptions,
    #[serde(default)]
    pub word_options: WordOptions,
    #[serde(default)]
    pub powerpoint_options: PowerPointOptions,
    #[serde(default)]
    pub language_classification: LanguageConfig,
    /// Per-file export timeout. Default: 45 minutes.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            print_options: PrintConfigSet::default(),
            excel: ExcelOptions::default(),
            word_options: WordOptions::default(),
            powerpoint_options: PowerPointOptions::default(),
            language_classification: LanguageConfig::default(),
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            pool: PoolConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConversionError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_yaml_str(&text).map_err(|e| match e {
            ConversionError::ConfigLoad { message, .. } => ConversionError::ConfigLoad {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate a YAML document held in memory.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty document means "all defaults".
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text).map_err(|e| ConversionError::ConfigLoad {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an already-parsed YAML value (scenario `config_inline`).
    pub fn from_yaml_value(value: serde_yaml::Value) -> Result<Self> {
        let config: Self = serde_yaml::from_value(value).map_err(|e| ConversionError::ConfigLoad {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_minutes == 0 {
            return Err(ConversionError::InvalidConfig(
                "timeout_minutes must be greater than 0".to_string(),
            ));
        }
        if self.excel.row_index.header_budget == 0 {
            return Err(ConversionError::InvalidConfig(
                "excel.row_index.header_budget must be greater than 0".to_string(),
            ));
        }
        if self.print_options.is_empty() {
            return Err(ConversionError::InvalidConfig(
                "print_options list is empty".to_string(),
            ));
        }
        if !self.print_options.has_default() {
            warn!("print_options has no default entry; unmatched sheets will fail");
        }
        self.pool_config().validate()
    }

    /// Pool settings with the document's timeout applied.
    pub fn pool_config(&self) -> PoolConfig {
        let mut pool = self.pool.clone();
        pool.conversion_timeout = Duration::from_secs(self.timeout_minutes * 60);
        pool
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            header_budget: self.excel.row_index.header_budget,
            column_title: self.excel.row_index.column_title.clone(),
        }
    }

    /// Output filename suffix for a document kind.
    pub fn suffix_for(&self, kind: DocumentKind) -> &str {
        match kind {
            DocumentKind::Excel => &self.excel.output_suffix,
            DocumentKind::Word => &self.word_options.output_suffix,
            DocumentKind::PowerPoint => &self.powerpoint_options.output_suffix,
        }
    }
}

/// A single conversion request.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Path to the input Office document.
    pub input_path: PathBuf,

    /// Root directory the PDF is written under.
    pub output_root: PathBuf,

    /// Subdirectory of `output_root` mirroring the input's location.
    pub relative_dir: PathBuf,

    /// Exact output file, bypassing suffix and language routing.
    pub output_path: Option<PathBuf>,
}

impl ConversionRequest {
    /// Create a new conversion request.
    pub fn new(input_path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_root: output_root.into(),
            relative_dir: PathBuf::new(),
            output_path: None,
        }
    }

    /// Mirror the input's directory relative to `input_root`.
    pub fn relative_to(mut self, input_root: &Path) -> Self {
        self.relative_dir = self
            .input_path
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self
    }

    /// Write to exactly this file.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// File stem of the input, used to name the PDF.
    pub fn stem(&self) -> String {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string()
    }

    /// Where the PDF goes, given the kind suffix and the language folder
    /// (if classification put the file in one).
    pub fn resolve_output(&self, suffix: &str, language_folder: Option<&str>) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }
        let mut dir = self.output_root.clone();
        if let Some(folder) = language_folder {
            dir.push(folder);
        }
        dir.push(&self.relative_dir);
        dir.join(format!("{}{}.pdf", self.stem(), suffix))
    }
}

/// Progress information for a conversion operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionProgress {
    /// Index of the current file being processed.
    pub file_index: usize,

    /// Total number of files to process.
    pub total_files: usize,

    /// Name of the current file.
    pub current_file: String,

    /// Current stage of processing.
    pub stage: ConversionStage,
}

/// Stage of the conversion process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStage {
    /// Queued, waiting to start.
    Queued,
    /// Laying out sheets and writing the prepared workbook.
    PreparingLayout,
    /// Exporting to PDF via LibreOffice.
    ExportingPdf,
    /// Completed successfully.
    Completed,
    /// Failed with error.
    Failed,
}

/// Result for a single successfully converted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Original input path.
    pub input_path: PathBuf,

    /// Written PDF.
    pub output_path: PathBuf,

    pub kind: DocumentKind,

    /// Language code, when classification is enabled.
    pub language: Option<String>,

    /// Per-sheet layout decisions (Excel only).
    pub sheets: Vec<SheetLayoutReport>,

    /// Processing time for this file.
    pub duration: Duration,
}

/// Information about a failed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    /// Original input path.
    pub input_path: PathBuf,

    pub kind: Option<DocumentKind>,

    /// Error message.
    pub error: String,
}

/// Success/failure counts for one document kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of a batch conversion operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Successfully converted files.
    pub successful: Vec<FileResult>,

    /// Failed conversions.
    pub failed: Vec<FailedFile>,

    /// Total processing time.
    pub total_duration: Duration,

    pub by_kind: BTreeMap<DocumentKind, KindStats>,

    /// Successful files per language code.
    pub by_language: BTreeMap<String, usize>,
}

impl BatchResult {
    /// Fold per-file outcomes into a batch result.
    pub fn from_outcomes(
        outcomes: Vec<std::result::Result<FileResult, FailedFile>>,
        total_duration: Duration,
    ) -> Self {
        let mut batch = BatchResult {
            total_duration,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(file) => batch.push_success(file),
                Err(failed) => batch.push_failure(failed),
            }
        }
        batch
    }

    pub fn push_success(&mut self, file: FileResult) {
        self.by_kind.entry(file.kind).or_default().succeeded += 1;
        if let Some(lang) = &file.language {
            *self.by_language.entry(lang.clone()).or_default() += 1;
        }
        self.successful.push(file);
    }

    pub fn push_failure(&mut self, failed: FailedFile) {
        if let Some(kind) = failed.kind {
            self.by_kind.entry(kind).or_default().failed += 1;
        }
        self.failed.push(failed);
    }

    /// Merge another batch (e.g. another scenario group) into this one.
    pub fn merge(&mut self, other: BatchResult) {
        for file in other.successful {
            self.push_success(file);
        }
        for failed in other.failed {
            self.push_failure(failed);
        }
        self.total_duration += other.total_duration;
    }

    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// Total pages planned across every laid-out sheet.
    pub fn planned_pages(&self) -> usize {
        self.successful
            .iter()
            .flat_map(|f| f.sheets.iter())
            .map(|s| s.pages.len())
            .sum()
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Converted {}/{} file(s) in {:.1}s ({} failed)\n",
            self.successful.len(),
            self.total(),
            self.total_duration.as_secs_f64(),
            self.failed.len()
        );
        for (kind, stats) in &self.by_kind {
            out.push_str(&format!(
                "  {}: {} ok, {} failed\n",
                kind, stats.succeeded, stats.failed
            ));
        }
        if !self.by_language.is_empty() {
            out.push_str("  By language:\n");
            for (lang, count) in &self.by_language {
                out.push_str(&format!("    {}: {}\n", lang, count));
            }
        }
        for failed in self.failed.iter().take(10) {
            out.push_str(&format!("  FAILED {}: {}\n", failed.input_path.display(), failed.error));
        }
        if self.failed.len() > 10 {
            out.push_str(&format!("  ... and {} more\n", self.failed.len() - 10));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print_config::LayoutMode;

    // ---- PoolConfig

    #[test]
    fn test_pool_config_defaults() {
        let config = PoolConfig::default();
        assert!(config.pool_size > 0);
        assert_eq!(config.conversion_timeout.as_secs(), 45 * 60);
        assert_eq!(config.max_docs_per_instance, 100);
        assert!(config.temp_dir.is_none());
        assert!(config.soffice_path.is_none());
    }

    #[test]
    fn test_pool_config_builder_pattern() {
        let config = PoolConfig::with_pool_size(4)
            .conversion_timeout(Duration::from_secs(60))
            .max_docs_per_instance(50);

        assert_eq!(config.pool_size, 4);
        assert_eq!(config.conversion_timeout.as_secs(), 60);
        assert_eq!(config.max_docs_per_instance, 50);
    }

    #[test]
    fn test_pool_config_validation() {
        assert!(PoolConfig::with_pool_size(4).validate().is_ok());
        assert!(PoolConfig::with_pool_size(0).validate().is_err());
        let zero_timeout = PoolConfig::default().conversion_timeout(Duration::from_secs(0));
        assert!(zero_timeout.validate().is_err());
    }

    // ---- AppConfig

    #[test]
    fn test_empty_document_is_all_defaults() {
        let config = AppConfig::from_yaml_str("").unwrap();
        assert_eq!(config.timeout_minutes, 45);
        assert_eq!(config.excel.output_suffix, "_x");
        assert_eq!(config.word_options.output_suffix, "_d");
        assert_eq!(config.powerpoint_options.output_suffix, "_p");
        assert!(config.excel.optimize_layout);
        assert!(!config.excel.enhance_layout);
        assert_eq!(config.excel.row_index.column_title, "Page-Row Index");
        assert_eq!(config.excel.row_index.header_budget, 100);
        assert!(!config.language_classification.enabled);
        assert!(config.print_options.has_default());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
timeout_minutes: 10
excel:
  output_suffix: "_xl"
  row_index:
    header_budget: 80
    write_sidecar: true
word_options:
  output_suffix: "_w"
print_options:
  - sheets: ["Report"]
    priority: 1
    mode: table_row_break
    rows_per_page: 40
  - sheets: null
    priority: 99
language_classification:
  enabled: true
  mode: filename
  filename_patterns:
    vi: ["_VN", "_vi"]
    ja: ["_JP"]
    en: [""]
pool:
  pool_size: 2
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.timeout_minutes, 10);
        assert_eq!(config.pool_config().conversion_timeout.as_secs(), 600);
        assert_eq!(config.pool.pool_size, 2);
        assert_eq!(config.suffix_for(DocumentKind::Excel), "_xl");
        assert_eq!(config.suffix_for(DocumentKind::Word), "_w");
        assert_eq!(config.suffix_for(DocumentKind::PowerPoint), "_p");
        assert_eq!(config.layout_options().header_budget, 80);
        assert!(config.excel.row_index.write_sidecar);

        let PrintConfigSet::Prioritized(list) = &config.print_options else {
            panic!("expected list");
        };
        assert_eq!(list[0].mode, LayoutMode::TableRowBreak);

        let lang = &config.language_classification;
        assert_eq!(lang.mode, LanguageMode::Filename);
        let order: Vec<&str> = lang.filename_patterns.iter().map(|p| p.lang.as_str()).collect();
        assert_eq!(order, vec!["vi", "ja", "en"]);
        assert_eq!(lang.folder_name("vi"), "output-vi");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = AppConfig::from_yaml_str("timeout_minutes: 0\n").unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_print_options_list_rejected() {
        assert!(AppConfig::from_yaml_str("print_options: []\n").is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "print_options: [unclosed\n").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        match err {
            ConversionError::ConfigLoad { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            AppConfig::load(&dir.path().join("missing.yaml")),
            Err(ConversionError::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_load_reports_bad_print_option_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "print_options:\n  mode: bogus\n").unwrap();
        match AppConfig::load(&path).unwrap_err() {
            ConversionError::ConfigLoad { path: p, message } => {
                assert_eq!(p, path);
                assert!(message.contains("bogus"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_enhance_layout_flag() {
        let yaml = "excel:\n  enhance_layout: true\n  optimize_layout: false\n";
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert!(config.excel.enhance_layout);
        assert!(!config.excel.optimize_layout);
    }

    #[test]
    fn test_null_patterns_are_empty() {
        let yaml = "language_classification:\n  filename_patterns: null\n";
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert!(config.language_classification.filename_patterns.is_empty());
    }

    // ---- ConversionRequest

    #[test]
    fn test_request_output_mirrors_structure() {
        let request =
            ConversionRequest::new("/in/sales/2024/q1.xlsx", "/out").relative_to(Path::new("/in"));
        assert_eq!(request.relative_dir, PathBuf::from("sales/2024"));
        assert_eq!(
            request.resolve_output("_x", None),
            PathBuf::from("/out/sales/2024/q1_x.pdf")
        );
        assert_eq!(
            request.resolve_output("_x", Some("output-ja")),
            PathBuf::from("/out/output-ja/sales/2024/q1_x.pdf")
        );
    }

    #[test]
    fn test_request_explicit_output_wins() {
        let request = ConversionRequest::new("a.docx", "/out").with_output_path("/tmp/x.pdf");
        assert_eq!(request.resolve_output("_d", Some("output-en")), PathBuf::from("/tmp/x.pdf"));
    }

    #[test]
    fn test_request_outside_root_lands_at_root() {
        let request =
            ConversionRequest::new("/elsewhere/a.pptx", "/out").relative_to(Path::new("/in"));
        assert_eq!(request.resolve_output("_p", None), PathBuf::from("/out/a_p.pdf"));
    }

    // ---- BatchResult

    fn ok(kind: DocumentKind, lang: Option<&str>) -> std::result::Result<FileResult, FailedFile> {
        Ok(FileResult {
            input_path: PathBuf::from("in"),
            output_path: PathBuf::from("out.pdf"),
            kind,
            language: lang.map(str::to_string),
            sheets: Vec::new(),
            duration: Duration::from_millis(5),
        })
    }

    #[test]
    fn test_batch_stats() {
        let batch = BatchResult::from_outcomes(
            vec![
                ok(DocumentKind::Excel, Some("vi")),
                ok(DocumentKind::Excel, Some("en")),
                ok(DocumentKind::Word, Some("vi")),
                Err(FailedFile {
                    input_path: PathBuf::from("broken.xlsx"),
                    kind: Some(DocumentKind::Excel),
                    error: "bad".into(),
                }),
            ],
            Duration::from_secs(2),
        );
        assert_eq!(batch.total(), 4);
        assert_eq!(
            batch.by_kind[&DocumentKind::Excel],
            KindStats {
                succeeded: 2,
                failed: 1
            }
        );
        assert_eq!(batch.by_language["vi"], 2);
        let summary = batch.summary();
        assert!(summary.contains("3/4"));
        assert!(summary.contains("broken.xlsx"));
    }

    #[test]
    fn test_batch_merge() {
        let mut a =
            BatchResult::from_outcomes(vec![ok(DocumentKind::Excel, None)], Duration::from_secs(1));
        let b = BatchResult::from_outcomes(
            vec![ok(DocumentKind::PowerPoint, None)],
            Duration::from_secs(2),
        );
        a.merge(b);
        assert_eq!(a.successful.len(), 2);
        assert_eq!(a.total_duration, Duration::from_secs(3));
        assert!(a.by_language.is_empty());
    }

    #[test]
    fn test_batch_result_serializes_to_json() {
        let batch = BatchResult::from_outcomes(
            vec![ok(DocumentKind::Word, Some("ja"))],
            Duration::from_secs(1),
        );
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.contains("\"ja\""));
    }
}
