use super::finish;
use anyhow::Context;
use office_to_pdf_core::scan::FileTypeFilter;
use office_to_pdf_core::scenario::Scenario;
use office_to_pdf_core::{BatchResult, ConversionProgress, ConversionStage, Converter};
use std::path::Path;

pub async fn run(
    path: &Path,
    dry_run: bool,
    file_types: &str,
    json: Option<&Path>,
) -> anyhow::Result<i32> {
    let scenario = Scenario::load(path)
        .with_context(|| format!("loading scenario {}", path.display()))?;
    let filter = FileTypeFilter::parse(file_types)?;
    println!("{}", scenario.summary());

    let files = scenario.collect_files(&filter)?;
    if dry_run {
        print!("{}", scenario.dry_run(&files));
        return Ok(0);
    }
    if files.is_empty() {
        println!("No matching files in any group");
        return Ok(0);
    }

    let mut batch = BatchResult::default();
    for (index, group) in scenario.groups.iter().enumerate() {
        let requests: Vec<_> = files
            .iter()
            .filter(|f| f.group == index)
            .map(|f| f.request.clone())
            .collect();
        if requests.is_empty() {
            continue;
        }
        println!("[{}] converting {} file(s)", group.name, requests.len());

        let converter = Converter::new(group.config.clone())
            .await
            .with_context(|| format!("starting group {}", group.name))?;
        let result = converter
            .convert_batch_with_progress(requests, |p: ConversionProgress| {
                if matches!(p.stage, ConversionStage::Completed | ConversionStage::Failed) {
                    println!(
                        "  {}/{} {} {:?}",
                        p.file_index + 1,
                        p.total_files,
                        p.current_file,
                        p.stage
                    );
                }
            })
            .await;
        converter.shutdown().await;
        batch.merge(result);
    }

    finish(&batch, json)
}
