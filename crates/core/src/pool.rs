//! LibreOffice process pool for parallel PDF export.
//!
//! Each instance runs `soffice` in its own process with a separate user
//! profile, so several documents can be exported at the same time.

use crate::config::PoolConfig;
use crate::error::{ConversionError, Result};
use crate::DocumentKind;
use async_process::Command;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A single LibreOffice instance in the pool.
struct LibreOfficeInstance {
    /// Instance ID for logging.
    id: usize,
    /// Unique user profile directory (required for parallel execution).
    profile_dir: TempDir,
    /// Number of documents exported by this instance.
    docs_processed: AtomicU32,
    /// Whether this instance is currently exporting.
    is_busy: AtomicBool,
}

impl std::fmt::Debug for LibreOfficeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibreOfficeInstance")
            .field("id", &self.id)
            .field("profile_dir", &self.profile_dir.path())
            .field("docs_processed", &self.docs_processed.load(Ordering::SeqCst))
            .field("is_busy", &self.is_busy.load(Ordering::SeqCst))
            .finish()
    }
}

impl LibreOfficeInstance {
    fn new(id: usize, base: Option<&Path>) -> Result<Self> {
        let prefix = format!("lo-profile-{}-", id);
        let profile_dir = match base {
            Some(dir) => TempDir::with_prefix_in(&prefix, dir),
            None => TempDir::with_prefix(&prefix),
        }
        .map_err(ConversionError::ProcessStartFailed)?;

        debug!(
            "Created LibreOffice instance {} with profile at {:?}",
            id,
            profile_dir.path()
        );

        Ok(Self {
            id,
            profile_dir,
            docs_processed: AtomicU32::new(0),
            is_busy: AtomicBool::new(false),
        })
    }

    fn profile_path(&self) -> &Path {
        self.profile_dir.path()
    }

    /// Increment the document counter and return the new value.
    fn increment_docs(&self) -> u32 {
        self.docs_processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn docs_processed(&self) -> u32 {
        self.docs_processed.load(Ordering::SeqCst)
    }

    fn needs_recycling(&self, max_docs: u32) -> bool {
        self.docs_processed() >= max_docs
    }

    fn set_busy(&self, busy: bool) {
        self.is_busy.store(busy, Ordering::SeqCst);
    }

    /// Start over with a fresh profile.
    fn recycle(&mut self, base: Option<&Path>) -> Result<()> {
        let fresh = Self::new(self.id, base)?;
        self.profile_dir = fresh.profile_dir;
        self.docs_processed.store(0, Ordering::SeqCst);
        Ok(())
    }
}

/// Export filter for each document kind.
pub fn export_filter(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Excel => "pdf:calc_pdf_Export",
        DocumentKind::Word => "pdf:writer_pdf_Export",
        DocumentKind::PowerPoint => "pdf:impress_pdf_Export",
    }
}

/// Pool of LibreOffice instances for parallel PDF export.
#[derive(Debug)]
pub struct LibreOfficePool {
    /// Pool configuration.
    config: PoolConfig,
    /// Path to soffice binary.
    soffice_path: PathBuf,
    /// Instances in the pool.
    instances: Vec<Arc<Mutex<LibreOfficeInstance>>>,
    /// Semaphore to limit concurrent exports.
    semaphore: Arc<Semaphore>,
    /// Whether the pool is shut down.
    is_shutdown: AtomicBool,
    /// Scratch directory soffice writes PDFs into.
    output_temp_dir: TempDir,
    /// Total documents exported.
    total_processed: AtomicUsize,
}

impl LibreOfficePool {
    /// Create a new LibreOffice pool.
    pub async fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let soffice_path = Self::find_soffice(&config)?;
        info!("Found LibreOffice at: {:?}", soffice_path);

        let mut instances = Vec::with_capacity(config.pool_size);
        for i in 0..config.pool_size {
            let instance = LibreOfficeInstance::new(i, config.temp_dir.as_deref())?;
            instances.push(Arc::new(Mutex::new(instance)));
        }

        let output_temp_dir = match &config.temp_dir {
            Some(dir) => TempDir::with_prefix_in("office-to-pdf-exports-", dir),
            None => TempDir::with_prefix("office-to-pdf-exports-"),
        }
        .map_err(ConversionError::ProcessStartFailed)?;

        info!(
            "LibreOffice pool initialized with {} instances",
            config.pool_size
        );

        let pool_size = config.pool_size;
        Ok(Self {
            config,
            soffice_path,
            instances,
            semaphore: Arc::new(Semaphore::new(pool_size)),
            is_shutdown: AtomicBool::new(false),
            output_temp_dir,
            total_processed: AtomicUsize::new(0),
        })
    }

    /// Find the soffice binary.
    pub fn find_soffice(config: &PoolConfig) -> Result<PathBuf> {
        if let Some(ref path) = config.soffice_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(ConversionError::LibreOfficeNotFound);
        }

        let candidates = [
            // macOS
            "/Applications/LibreOffice.app/Contents/MacOS/soffice",
            // Linux
            "/usr/bin/soffice",
            "/usr/lib/libreoffice/program/soffice",
            "/opt/libreoffice/program/soffice",
            // Snap (Ubuntu)
            "/snap/bin/libreoffice.soffice",
            // Windows
            "C:\\Program Files\\LibreOffice\\program\\soffice.exe",
        ];

        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        which::which("soffice")
            .or_else(|_| which::which("libreoffice"))
            .map_err(|_| ConversionError::LibreOfficeNotFound)
    }

    /// Scratch directory for callers that stage files next to the exports.
    pub fn scratch_dir(&self) -> &Path {
        self.output_temp_dir.path()
    }

    /// Export `input_path` to PDF and move the result to `output_path`.
    ///
    /// `kind` picks the export filter; the input may be a prepared copy
    /// whose name differs from the original document.
    pub async fn export_pdf(
        &self,
        input_path: &Path,
        kind: DocumentKind,
        output_path: &Path,
    ) -> Result<PathBuf> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Err(ConversionError::PoolShutdown);
        }

        if !input_path.exists() {
            return Err(ConversionError::InputNotFound(input_path.to_path_buf()));
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ConversionError::PoolShutdown)?;

        let instance = self.get_available_instance().await?;

        let result = self.run_export(&instance, input_path, kind).await;

        {
            let mut inst = instance.lock().await;
            if inst.needs_recycling(self.config.max_docs_per_instance) {
                debug!("Recycling LibreOffice instance {}", inst.id);
                if let Err(e) = inst.recycle(self.config.temp_dir.as_deref()) {
                    warn!("Could not recycle instance {}: {}", inst.id, e);
                }
            }
            inst.set_busy(false);
        }

        let exported = result?;
        move_file(&exported, output_path)?;
        Ok(output_path.to_path_buf())
    }

    async fn get_available_instance(&self) -> Result<Arc<Mutex<LibreOfficeInstance>>> {
        for instance in &self.instances {
            let inst = instance.lock().await;
            if !inst.is_busy.load(Ordering::SeqCst) {
                inst.set_busy(true);
                drop(inst);
                return Ok(Arc::clone(instance));
            }
        }

        Err(ConversionError::PoolExhausted {
            pool_size: self.config.pool_size,
        })
    }

    /// Run soffice and return the PDF it wrote in the scratch directory.
    async fn run_export(
        &self,
        instance: &Arc<Mutex<LibreOfficeInstance>>,
        input_path: &Path,
        kind: DocumentKind,
    ) -> Result<PathBuf> {
        let start = Instant::now();

        let (instance_id, profile_path) = {
            let inst = instance.lock().await;
            (inst.id, inst.profile_path().to_path_buf())
        };

        debug!(
            "Instance {} exporting {:?}",
            instance_id,
            input_path.file_name()
        );

        let output_dir = self.output_temp_dir.path().join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&output_dir).map_err(|e| ConversionError::OutputDirError {
            path: output_dir.clone(),
            message: e.to_string(),
        })?;

        let mut cmd = Command::new(&self.soffice_path);
        cmd.args([
            "--headless",
            "--invisible",
            "--nologo",
            "--nofirststartwizard",
            "--norestore",
        ]);
        cmd.arg(profile_url(&profile_path));
        cmd.args(["--convert-to", export_filter(kind), "--outdir"]);
        cmd.arg(&output_dir);
        cmd.arg(input_path);

        let output = timeout(self.config.conversion_timeout, cmd.output())
            .await
            .map_err(|_| ConversionError::Timeout {
                path: input_path.to_path_buf(),
                timeout_secs: self.config.conversion_timeout.as_secs(),
            })?
            .map_err(ConversionError::ProcessStartFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("LibreOffice export failed for {:?}: {}", input_path, stderr);
            return Err(ConversionError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: stderr.to_string(),
            });
        }

        let pdf = find_pdf(&output_dir, input_path).ok_or_else(|| {
            ConversionError::ConversionFailed {
                path: input_path.to_path_buf(),
                message: "PDF output file not found".to_string(),
            }
        })?;

        debug!(
            "Instance {} exported {:?} in {:?}",
            instance_id,
            input_path.file_name(),
            start.elapsed()
        );
        {
            let inst = instance.lock().await;
            inst.increment_docs();
        }
        self.total_processed.fetch_add(1, Ordering::SeqCst);

        Ok(pdf)
    }

    /// Get pool health information.
    pub async fn health(&self) -> PoolHealth {
        let mut instances_info = Vec::with_capacity(self.instances.len());

        for instance in &self.instances {
            let inst = instance.lock().await;
            instances_info.push(InstanceHealth {
                id: inst.id,
                docs_processed: inst.docs_processed(),
                is_busy: inst.is_busy.load(Ordering::SeqCst),
                needs_recycling: inst.needs_recycling(self.config.max_docs_per_instance),
            });
        }

        PoolHealth {
            pool_size: self.config.pool_size,
            total_processed: self.total_processed.load(Ordering::SeqCst),
            is_shutdown: self.is_shutdown.load(Ordering::SeqCst),
            instances: instances_info,
        }
    }

    /// Shutdown the pool. Profiles and scratch files go with the pool.
    pub async fn shutdown(&self) {
        info!("Shutting down LibreOffice pool");
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    /// Get the total number of documents exported.
    pub fn total_processed(&self) -> usize {
        self.total_processed.load(Ordering::SeqCst)
    }
}

/// `-env:UserInstallation` argument for a profile directory.
fn profile_url(profile: &Path) -> String {
    let path = profile.display().to_string().replace('\\', "/");
    if path.starts_with('/') {
        format!("-env:UserInstallation=file://{}", path)
    } else {
        format!("-env:UserInstallation=file:///{}", path)
    }
}

/// The PDF named after the input, or any PDF soffice left in `dir`.
fn find_pdf(dir: &Path, input_path: &Path) -> Option<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let expected = dir.join(format!("{}.pdf", stem));
    if expected.exists() {
        return Some(expected);
    }
    std::fs::read_dir(dir).ok().and_then(|entries| {
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().map(|ext| ext == "pdf").unwrap_or(false))
    })
}

/// Move `from` to `to`, creating parent directories. Falls back to copy
/// when a rename crosses filesystems.
pub(crate) fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConversionError::OutputDirError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to).map_err(|e| ConversionError::OutputDirError {
        path: to.to_path_buf(),
        message: e.to_string(),
    })?;
    let _ = std::fs::remove_file(from);
    Ok(())
}

/// Health information for the pool.
#[derive(Debug, Clone)]
pub struct PoolHealth {
    /// Total pool size.
    pub pool_size: usize,
    /// Total documents exported.
    pub total_processed: usize,
    /// Whether the pool is shut down.
    pub is_shutdown: bool,
    /// Per-instance health info.
    pub instances: Vec<InstanceHealth>,
}

/// Health information for a single instance.
#[derive(Debug, Clone)]
pub struct InstanceHealth {
    /// Instance ID.
    pub id: usize,
    /// Documents exported by this instance since its last recycle.
    pub docs_processed: u32,
    /// Whether currently busy.
    pub is_busy: bool,
    /// Whether needs recycling.
    pub needs_recycling: bool,
}
