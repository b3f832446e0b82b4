use super::{finish, load_config};
use anyhow::Context;
use office_to_pdf_core::scan::{scan_directory, FileTypeFilter};
use office_to_pdf_core::{ConversionRequest, Converter};
use std::path::Path;
use tracing::info;

pub async fn run(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    file_types: &str,
    json: Option<&Path>,
) -> anyhow::Result<i32> {
    let config = load_config(config)?;
    let filter = FileTypeFilter::parse(file_types)?;

    let files = scan_directory(input, &filter)
        .with_context(|| format!("scanning {}", input.display()))?;
    if files.is_empty() {
        println!("No matching files under {}", input.display());
        return Ok(0);
    }
    println!("Found {} Office file(s) to convert", files.len());

    let concurrency = config.pool.pool_size;
    let converter = Converter::new(config).await?;
    let requests: Vec<ConversionRequest> = files
        .into_iter()
        .map(|path| ConversionRequest::new(path, output).relative_to(input))
        .collect();

    let batch = converter.convert_parallel(requests, concurrency).await;
    info!("Exported {} document(s)", converter.stats().total_documents_processed);
    converter.shutdown().await;

    finish(&batch, json)
}
