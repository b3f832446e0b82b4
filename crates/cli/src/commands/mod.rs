pub mod convert;
pub mod plan;
pub mod scenario;

use anyhow::Context;
use office_to_pdf_core::{AppConfig, BatchResult};
use std::path::Path;

/// The configuration at `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

/// Print the summary, optionally save it as JSON, and pick the exit code.
pub fn finish(batch: &BatchResult, json: Option<&Path>) -> anyhow::Result<i32> {
    print!("{}", batch.summary());
    if let Some(path) = json {
        let text = serde_json::to_string_pretty(batch)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        println!("Batch result written to {}", path.display());
    }
    Ok(if batch.failed.is_empty() { 0 } else { 2 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_to_pdf_core::FailedFile;
    use std::path::PathBuf;

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.timeout_minutes, 45);
    }

    #[test]
    fn test_load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "timeout_minutes: 0\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("config.yaml"));
    }

    #[test]
    fn test_finish_exit_codes_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("result.json");

        let mut batch = BatchResult::default();
        assert_eq!(finish(&batch, Some(&json)).unwrap(), 0);
        assert!(json.exists());

        batch.push_failure(FailedFile {
            input_path: PathBuf::from("broken.docx"),
            kind: None,
            error: "boom".to_string(),
        });
        assert_eq!(finish(&batch, None).unwrap(), 2);
    }
}
