//! Scenario runs: several folder groups, each with its own configuration
//! and output directory, driven from one YAML file.
//!
//! ```yaml
//! name: Monthly reports
//! groups:
//!   - name: finance
//!     folders: [in/finance, in/shared]
//!     config: configs/finance.yaml
//!     output: out/finance
//!   - name: hr
//!     folders: [in/hr]
//!     config_inline:
//!       print_options: { mode: one_page }
//! ```

use crate::config::{AppConfig, ConversionRequest};
use crate::error::{ConversionError, Result};
use crate::scan::{scan_directory, FileTypeFilter};
use crate::DocumentKind;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct RawScenario {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    name: Option<String>,
    #[serde(default)]
    folders: Vec<PathBuf>,
    config: Option<PathBuf>,
    config_inline: Option<serde_yaml::Value>,
    output: Option<PathBuf>,
}

/// Where a group's configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Inline,
    /// No config given, or the named file does not exist.
    Defaults,
}

#[derive(Debug, Clone)]
pub struct ScenarioGroup {
    pub name: String,
    pub folders: Vec<PathBuf>,
    pub config: AppConfig,
    pub config_source: ConfigSource,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub groups: Vec<ScenarioGroup>,
}

/// One file picked up by a scenario, with its group and target.
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    pub group: usize,
    pub kind: DocumentKind,
    pub request: ConversionRequest,
}

fn scenario_error(path: &Path, message: impl Into<String>) -> ConversionError {
    ConversionError::ConfigLoad {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

impl Scenario {
    /// Load a scenario file. Group config files are loaded eagerly.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| scenario_error(path, e.to_string()))?;
        let scenario = Self::from_yaml_str(&text).map_err(|e| match e {
            ConversionError::InvalidConfig(message) => scenario_error(path, message),
            other => other,
        })?;
        info!("Loaded scenario '{}' from {:?}", scenario.name, path);
        Ok(scenario)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(ConversionError::InvalidConfig("empty scenario".to_string()));
        }
        let raw: RawScenario = serde_yaml::from_str(text)
            .map_err(|e| ConversionError::InvalidConfig(e.to_string()))?;
        if raw.groups.is_empty() {
            return Err(ConversionError::InvalidConfig(
                "no groups defined in scenario".to_string(),
            ));
        }

        let mut groups = Vec::with_capacity(raw.groups.len());
        for group in raw.groups {
            let name = group.name.unwrap_or_else(|| "Unnamed".to_string());
            if group.folders.is_empty() {
                warn!("Group '{}' has no folders, skipping", name);
                continue;
            }
            let (config, config_source) = match (group.config, group.config_inline) {
                (Some(path), _) if path.exists() => {
                    let config = AppConfig::load(&path)?;
                    (config, ConfigSource::File(path))
                }
                (Some(path), _) => {
                    warn!("Config file {:?} of group '{}' not found, using defaults", path, name);
                    (AppConfig::default(), ConfigSource::Defaults)
                }
                (None, Some(inline)) => (AppConfig::from_yaml_value(inline)?, ConfigSource::Inline),
                (None, None) => (AppConfig::default(), ConfigSource::Defaults),
            };
            let output = group
                .output
                .unwrap_or_else(|| PathBuf::from(format!("output_{}", name)));
            groups.push(ScenarioGroup {
                name,
                folders: group.folders,
                config,
                config_source,
                output,
            });
        }

        Ok(Self {
            name: raw.name.unwrap_or_else(|| "Unnamed".to_string()),
            description: raw.description,
            groups,
        })
    }

    /// The first group (and its folder) containing `path`.
    pub fn group_for(&self, path: &Path) -> Option<(usize, &Path)> {
        self.groups.iter().enumerate().find_map(|(index, group)| {
            group
                .folders
                .iter()
                .find(|folder| path.starts_with(folder))
                .map(|folder| (index, folder.as_path()))
        })
    }

    /// Every file of every group, each assigned to the first group whose
    /// folder contains it. Missing folders are skipped with a warning.
    ///
    /// PDFs keep the file's path relative to its source folder, under the
    /// group's output directory.
    pub fn collect_files(&self, filter: &FileTypeFilter) -> Result<Vec<ScenarioFile>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for group in &self.groups {
            for folder in &group.folders {
                if !folder.is_dir() {
                    warn!("Folder not found: {:?}", folder);
                    continue;
                }
                for path in scan_directory(folder, filter)? {
                    if !seen.insert(path.clone()) {
                        continue;
                    }
                    let Some((index, source)) = self.group_for(&path) else {
                        continue;
                    };
                    let Some(kind) = DocumentKind::from_path(&path) else {
                        continue;
                    };
                    let owner = &self.groups[index];
                    let relative = path.strip_prefix(source).unwrap_or(&path);
                    let output = owner.output.join(relative).with_extension("pdf");
                    let request = ConversionRequest::new(&path, &owner.output)
                        .relative_to(source)
                        .with_output_path(output);
                    files.push(ScenarioFile {
                        group: index,
                        kind,
                        request,
                    });
                }
            }
        }
        info!(
            "Found {} file(s) across {} group(s)",
            files.len(),
            self.groups.len()
        );
        Ok(files)
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Scenario: {}", self.name);
        let _ = writeln!(
            out,
            "Description: {}",
            self.description.as_deref().unwrap_or("No description")
        );
        let _ = writeln!(out, "Groups: {}", self.groups.len());
        for (i, group) in self.groups.iter().enumerate() {
            let _ = writeln!(out, "\nGroup {}: {}", i + 1, group.name);
            let _ = writeln!(out, "  Folders: {}", group.folders.len());
            for folder in &group.folders {
                let _ = writeln!(out, "    - {}", folder.display());
            }
            let _ = writeln!(out, "  Output: {}", group.output.display());
            let source = match &group.config_source {
                ConfigSource::File(path) => path.display().to_string(),
                ConfigSource::Inline => "inline".to_string(),
                ConfigSource::Defaults => "defaults".to_string(),
            };
            let _ = writeln!(out, "  Config: {}", source);
        }
        out
    }

    /// What a run would convert, grouped, without converting anything.
    pub fn dry_run(&self, files: &[ScenarioFile]) -> String {
        let mut out = String::new();
        for (index, group) in self.groups.iter().enumerate() {
            let members: Vec<&ScenarioFile> = files.iter().filter(|f| f.group == index).collect();
            let _ = writeln!(out, "[{}] {} file(s)", group.name, members.len());
            for file in members {
                let target = file.request.resolve_output("", None);
                let _ = writeln!(
                    out,
                    "  {} ({}) -> {}",
                    file.request.input_path.display(),
                    file.kind,
                    target.display()
                );
            }
        }
        let _ = writeln!(out, "Total: {} file(s)", files.len());
        out
    }
}
