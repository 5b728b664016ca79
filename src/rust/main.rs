use anyhow::{Context, Result};
use lesion_labels::{Pipeline, PipelineConfig};
use log::info;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    info!("=== Starting label preparation ===");
    info!("Configuration: {:?}", config);

    let start_time = Instant::now();
    let pipeline = Pipeline::new(config).context("Invalid pipeline configuration")?;
    let report = pipeline.run().with_context(|| {
        format!(
            "Label preparation failed in {:?}",
            pipeline.config().label_dir
        )
    })?;
    let schema = &pipeline.config().schema;

    println!("\nSplits:");
    for (split, summary) in &report.splits {
        println!("  {}: {} images", split.as_str(), summary.num_rows);
    }

    println!("\nTraining subsets (per category):");
    println!("  {:<8}{:>10}{:>12}", "label", "labeled", "unlabeled");
    for (idx, name) in schema.iter().enumerate() {
        println!(
            "  {:<8}{:>10}{:>12}",
            name, report.labeled.class_counts[idx], report.unlabeled.class_counts[idx]
        );
    }
    println!(
        "  {:<8}{:>10}{:>12}",
        "total", report.labeled.num_rows, report.unlabeled.num_rows
    );

    println!("\nWritten files:");
    for manifest in &report.manifests {
        println!(
            "  {} ({} rows, sha256 {})",
            manifest.path.display(),
            manifest.rows,
            manifest.sha256
        );
    }

    info!("=== Done (took {:.2?}) ===", start_time.elapsed());
    Ok(())
}
