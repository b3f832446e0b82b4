//! Main converter orchestrator that ties together sheet layout, language
//! routing and the LibreOffice pool.
//!
//! Excel workbooks that can be edited are laid out first: each sheet's page
//! setup, breaks and row-index annotations are written into a prepared copy,
//! and that copy is exported. Everything else is exported as it is.

use crate::config::{
    AppConfig, BatchResult, ConversionProgress, ConversionRequest, ConversionStage, FailedFile,
    FileResult, LanguageConfig,
};
use crate::engine::{PageLogSink, TracingPageLog, WorkbookSession};
use crate::error::{ConversionError, Result};
use crate::language::{LanguageClassifier, LanguageDetect};
use crate::layout::{layout_workbook, SheetLayoutReport, SheetPlan};
use crate::pool::LibreOfficePool;
use crate::print_config::PrintConfigSet;
use crate::xlsx::{is_editable_workbook, XlsxSession};
use crate::DocumentKind;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What laying out one workbook produced.
#[derive(Debug, Clone)]
pub struct PreparedWorkbook {
    pub plans: Vec<SheetPlan>,
    pub language: Option<String>,
}

impl PreparedWorkbook {
    pub fn reports(&self) -> Vec<SheetLayoutReport> {
        self.plans.iter().map(SheetPlan::report).collect()
    }
}

/// Lay out every sheet of `input` and save the result to `prepared`.
///
/// Column auto-fit runs first when `excel.enhance_layout` is set, so the
/// planner measures the fitted widths.
///
/// The language is classified from the untouched workbook, before any
/// tracking column is written. A configuration error on any sheet fails the
/// whole file and nothing is saved.
pub fn prepare_workbook(
    input: &Path,
    prepared: &Path,
    config: &AppConfig,
    classifier: &LanguageClassifier,
    log: &dyn PageLogSink,
) -> Result<PreparedWorkbook> {
    let mut session = XlsxSession::open(input)?;
    let label = file_label(input);

    let language = classifier.classify(&stem_of(input), Some(&session as &dyn WorkbookSession));

    if config.excel.enhance_layout {
        let resized = session.enhance_layout()?;
        debug!("[{}] auto-fitted {} column(s)", label, resized);
    }
    let plans = if config.excel.optimize_layout {
        layout_workbook(
            &mut session,
            &config.print_options,
            &config.layout_options(),
            log,
            &label,
        )?
    } else {
        Vec::new()
    };
    session.save_as(prepared)?;
    debug!("Prepared {:?} as {:?}", input, prepared);

    Ok(PreparedWorkbook { plans, language })
}

/// Sidecar written next to a PDF: the page -> row map of every sheet.
pub fn sidecar_path(pdf: &Path) -> PathBuf {
    pdf.with_extension("rows.json")
}

fn write_sidecar(pdf: &Path, reports: &[SheetLayoutReport]) -> Result<PathBuf> {
    let path = sidecar_path(pdf);
    let json = serde_json::to_vec_pretty(reports)?;
    std::fs::write(&path, json).map_err(|e| ConversionError::OutputDirError {
        path: path.clone(),
        message: e.to_string(),
    })?;
    Ok(path)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Main converter for Office documents to PDF.
///
/// This is the primary interface for converting documents. It owns the
/// configuration and shares a pool of LibreOffice instances.
pub struct Converter {
    /// LibreOffice process pool.
    pool: Arc<LibreOfficePool>,
    /// Configuration.
    config: Arc<AppConfig>,
    classifier: LanguageClassifier,
    page_log: Arc<dyn PageLogSink>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl Converter {
    /// Create a new converter with its own pool.
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing converter with pool_size={}, timeout={} min",
            config.pool.pool_size, config.timeout_minutes
        );

        let pool = LibreOfficePool::new(config.pool_config()).await?;
        Self::with_pool(config, Arc::new(pool))
    }

    /// Create a converter on an existing pool, e.g. one shared by several
    /// scenario groups.
    pub fn with_pool(config: AppConfig, pool: Arc<LibreOfficePool>) -> Result<Self> {
        config.validate()?;
        let classifier = LanguageClassifier::new(config.language_classification.clone());
        Ok(Self {
            pool,
            config: Arc::new(config),
            classifier,
            page_log: Arc::new(TracingPageLog),
        })
    }

    /// Create a converter with default settings.
    pub async fn default() -> Result<Self> {
        Self::new(AppConfig::default()).await
    }

    /// Detect languages from workbook text with `detector`.
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetect>) -> Self {
        self.classifier = self.classifier.with_detector(detector);
        self
    }

    /// Send per-page row-index lines to `sink` instead of the log.
    pub fn with_page_log(mut self, sink: Arc<dyn PageLogSink>) -> Self {
        self.page_log = sink;
        self
    }

    /// Convert a single document to PDF.
    pub async fn convert(&self, request: ConversionRequest) -> Result<FileResult> {
        self.convert_with_stages(request, |_| {}).await
    }

    async fn convert_with_stages<F>(
        &self,
        request: ConversionRequest,
        on_stage: F,
    ) -> Result<FileResult>
    where
        F: Fn(ConversionStage),
    {
        let start = Instant::now();
        let input_path = request.input_path.clone();

        let kind = DocumentKind::from_path(&input_path).ok_or_else(|| {
            ConversionError::UnsupportedFormat {
                extension: input_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string(),
            }
        })?;
        if !input_path.exists() {
            return Err(ConversionError::InputNotFound(input_path));
        }

        info!("Converting {:?} ({})", input_path, kind);

        // Stage 1: lay out the workbook into a prepared copy
        let excel = &self.config.excel;
        let lays_out =
            kind == DocumentKind::Excel && (excel.optimize_layout || excel.enhance_layout);
        let mut prepared_dir = None;
        let (export_input, sheets, language) = if lays_out && is_editable_workbook(&input_path) {
            on_stage(ConversionStage::PreparingLayout);
            let dir = tempfile::Builder::new()
                .prefix("office-to-pdf-prepared-")
                .tempdir_in(self.pool.scratch_dir())?;
            let file_name = input_path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("workbook.xlsx"));
            let prepared_path = dir.path().join(file_name);

            let input = input_path.clone();
            let target = prepared_path.clone();
            let config = Arc::clone(&self.config);
            let classifier = self.classifier.clone();
            let log = Arc::clone(&self.page_log);
            let prepared = tokio::task::spawn_blocking(move || {
                prepare_workbook(&input, &target, &config, &classifier, log.as_ref())
            })
            .await??;

            prepared_dir = Some(dir);
            (prepared_path, prepared.reports(), prepared.language)
        } else {
            if lays_out {
                debug!("{:?} cannot be edited, exporting with its own page setup", input_path);
            }
            let language = self.classifier.classify(&request.stem(), None);
            (input_path.clone(), Vec::new(), language)
        };

        // Stage 2: export and route
        on_stage(ConversionStage::ExportingPdf);
        let output_path = self.output_path_for(&request, kind, language.as_deref());
        let written = self.pool.export_pdf(&export_input, kind, &output_path).await?;
        drop(prepared_dir);

        if kind == DocumentKind::Excel
            && self.config.excel.row_index.write_sidecar
            && sheets.iter().any(|s| !s.pages.is_empty())
        {
            let sidecar = write_sidecar(&written, &sheets)?;
            debug!("Wrote row map {:?}", sidecar);
        }

        info!(
            "Converted {:?} to {:?} in {:?}",
            input_path,
            written,
            start.elapsed()
        );

        Ok(FileResult {
            input_path,
            output_path: written,
            kind,
            language,
            sheets,
            duration: start.elapsed(),
        })
    }

    /// Where the PDF for `request` goes once its language is known.
    pub fn output_path_for(
        &self,
        request: &ConversionRequest,
        kind: DocumentKind,
        language: Option<&str>,
    ) -> PathBuf {
        route_output(
            request,
            self.config.suffix_for(kind),
            &self.config.language_classification,
            language,
        )
    }

    /// Convert multiple documents in batch.
    pub async fn convert_batch(&self, requests: Vec<ConversionRequest>) -> BatchResult {
        self.convert_batch_with_progress(requests, |_| {}).await
    }

    /// Convert multiple documents with progress callback.
    pub async fn convert_batch_with_progress<F>(
        &self,
        requests: Vec<ConversionRequest>,
        progress_callback: F,
    ) -> BatchResult
    where
        F: Fn(ConversionProgress) + Send + Sync,
    {
        let start = Instant::now();
        let total_files = requests.len();
        let mut outcomes = Vec::with_capacity(total_files);

        for (file_index, request) in requests.into_iter().enumerate() {
            let input_path = request.input_path.clone();
            let current_file = file_label(&input_path);
            let report = |stage: ConversionStage| {
                progress_callback(ConversionProgress {
                    file_index,
                    total_files,
                    current_file: current_file.clone(),
                    stage,
                })
            };

            report(ConversionStage::Queued);
            match self.convert_with_stages(request, &report).await {
                Ok(result) => {
                    report(ConversionStage::Completed);
                    outcomes.push(Ok(result));
                }
                Err(e) => {
                    error!("Failed to convert {:?}: {}", input_path, e);
                    report(ConversionStage::Failed);
                    outcomes.push(Err(failed_file(input_path, &e)));
                }
            }
        }

        BatchResult::from_outcomes(outcomes, start.elapsed())
    }

    /// Convert documents in parallel batches.
    ///
    /// This processes `concurrency` documents simultaneously; the pool's own
    /// size still bounds how many exports run at once.
    pub async fn convert_parallel(
        &self,
        requests: Vec<ConversionRequest>,
        concurrency: usize,
    ) -> BatchResult {
        let start = Instant::now();

        let outcomes: Vec<std::result::Result<FileResult, FailedFile>> = stream::iter(requests)
            .map(|request| async move {
                let input_path = request.input_path.clone();
                self.convert(request).await.map_err(|e| {
                    error!("Failed to convert {:?}: {}", input_path, e);
                    failed_file(input_path, &e)
                })
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        BatchResult::from_outcomes(outcomes, start.elapsed())
    }

    /// Get pool health information.
    pub async fn health(&self) -> crate::pool::PoolHealth {
        self.pool.health().await
    }

    /// Shutdown the converter and release resources.
    pub async fn shutdown(&self) {
        info!("Shutting down converter");
        self.pool.shutdown().await;
    }

    /// Get the current configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get statistics about processing.
    pub fn stats(&self) -> ConverterStats {
        ConverterStats {
            total_documents_processed: self.pool.total_processed(),
            pool_size: self.config.pool.pool_size,
            language_classification: self.classifier.is_enabled(),
        }
    }
}

fn failed_file(input_path: PathBuf, error: &ConversionError) -> FailedFile {
    FailedFile {
        kind: DocumentKind::from_path(&input_path),
        input_path,
        error: error.to_string(),
    }
}

/// Output path from the kind suffix and the language routing settings.
///
/// Classified files land under the language folder; without
/// `keep_folder_structure` they lose their relative directory.
pub fn route_output(
    request: &ConversionRequest,
    suffix: &str,
    languages: &LanguageConfig,
    language: Option<&str>,
) -> PathBuf {
    let Some(lang) = language.filter(|_| languages.enabled) else {
        return request.resolve_output(suffix, None);
    };
    let folder = languages.folder_name(lang);
    if languages.keep_folder_structure {
        request.resolve_output(suffix, Some(&folder))
    } else {
        let mut flat = request.clone();
        flat.relative_dir = PathBuf::new();
        flat.resolve_output(suffix, Some(&folder))
    }
}

/// Statistics about the converter.
#[derive(Debug, Clone)]
pub struct ConverterStats {
    /// Total documents exported since creation.
    pub total_documents_processed: usize,
    /// Pool size.
    pub pool_size: usize,
    /// Whether files are routed by language.
    pub language_classification: bool,
}

/// Builder for creating a Converter with custom settings.
pub struct ConverterBuilder {
    config: AppConfig,
    detector: Option<Arc<dyn LanguageDetect>>,
    page_log: Option<Arc<dyn PageLogSink>>,
}

impl ConverterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(AppConfig::default())
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config,
            detector: None,
            page_log: None,
        }
    }

    /// Set the pool size.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool.pool_size = size;
        self
    }

    /// Set the per-file export timeout.
    pub fn timeout_minutes(mut self, minutes: u64) -> Self {
        self.config.timeout_minutes = minutes;
        self
    }

    /// Set the path to soffice binary.
    pub fn soffice_path(mut self, path: PathBuf) -> Self {
        self.config.pool.soffice_path = Some(path);
        self
    }

    /// Set the temporary directory.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.config.pool.temp_dir = Some(dir);
        self
    }

    /// Set the print options used for every workbook.
    pub fn print_options(mut self, options: PrintConfigSet) -> Self {
        self.config.print_options = options;
        self
    }

    /// Set language routing.
    pub fn language_classification(mut self, languages: LanguageConfig) -> Self {
        self.config.language_classification = languages;
        self
    }

    pub fn detector(mut self, detector: Arc<dyn LanguageDetect>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn page_log(mut self, sink: Arc<dyn PageLogSink>) -> Self {
        self.page_log = Some(sink);
        self
    }

    /// Build the converter.
    pub async fn build(self) -> Result<Converter> {
        let mut converter = Converter::new(self.config).await?;
        if let Some(detector) = self.detector {
            converter = converter.with_detector(detector);
        }
        if let Some(sink) = self.page_log {
            converter = converter.with_page_log(sink);
        }
        if converter.classifier.wants_content() {
            debug!("Language detection reads workbook text");
        } else if converter.classifier.is_enabled() {
            warn!("No language detector; files are classified by name");
        }
        Ok(converter)
    }
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
