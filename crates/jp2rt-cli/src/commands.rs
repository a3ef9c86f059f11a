use std::path::Path;

use anyhow::{Context, Result};

use jp2rt_descriptors::{format_families, DescriptorEngine, ExternalEngine};
use jp2rt_models::codec;
use jp2rt_models::io::{load_dataset, load_descriptors, write_predictions};
use jp2rt_models::report::html::evaluation_report;
use jp2rt_models::report::plots::PlotlyRenderer;
use jp2rt_models::{evaluate_model, list_models, train_with_config};

use crate::config::EstimateConfig;

pub const TOOL: &str = "JP2RT";

pub fn compute_descriptors(src: &Path, dst: &Path, engine: Option<&str>) -> Result<()> {
    let engine = ExternalEngine::resolve(engine)?;
    let n = engine
        .annotate_file(src, dst)
        .with_context(|| format!("Failed to compute descriptors of {}", src.display()))?;
    println!("Descriptors of {} molecules written to {}", n, dst.display());
    Ok(())
}

pub fn list_descriptors(json: bool, engine: Option<&str>) -> Result<()> {
    let engine = ExternalEngine::resolve(engine)?;
    let families = engine.families().context("Failed to list descriptors")?;
    print!("{}", format_families(&families, json)?);
    if json {
        println!();
    }
    Ok(())
}

pub fn predict(model: &Path, src: &Path, dst: &Path) -> Result<()> {
    let pipeline = codec::load(model)
        .with_context(|| format!("Failed to load model {}", codec::archive_path(model).display()))?;
    let x = load_descriptors(src)?;
    println!(
        "Read {} molecules with {} descriptor values each",
        x.nrows(),
        x.ncols()
    );
    let predictions = pipeline.predict(x.view())?;
    write_predictions(src, dst, &predictions.to_vec())?;
    println!("Predicted retention times written to {}", dst.display());
    Ok(())
}

pub fn estimate_model(
    name: &str,
    src: &Path,
    dst: &Path,
    config: &EstimateConfig,
    evaluate: bool,
) -> Result<()> {
    let spec = config.pipeline_spec(name)?;
    let data = load_dataset(src)?;
    println!(
        "Read {} molecules with {} descriptor values each",
        data.x.nrows(),
        data.x.ncols()
    );

    println!("Estimating model...");
    let pipeline = train_with_config(&spec, data.x.view(), data.y.view())?;
    let size = codec::save(&pipeline, dst)
        .with_context(|| format!("Failed to save model to {}", dst.display()))?;
    let archive = codec::archive_path(dst);
    println!("Model saved to {} ({} bytes)", archive.display(), size);

    if evaluate {
        println!("Evaluating model...");
        let evaluation = config.evaluation_config();
        let renderer = PlotlyRenderer::default();
        let report = evaluate_model(
            &pipeline,
            data.x.view(),
            data.y.view(),
            &evaluation,
            Some(&renderer),
        )?;
        println!("{}", report.table);

        let resolved = EstimateConfig {
            regressor: Some(spec.regressor.clone()),
            evaluation,
            ..config.clone()
        };
        let config_json = serde_json::to_string_pretty(&resolved)?;
        let report_path = archive.with_extension("html");
        evaluation_report(&report, TOOL, clap::crate_version!(), Some(&config_json))
            .save_to_file(&report_path)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
        println!("Evaluation report saved to {}", report_path.display());
    }
    Ok(())
}

pub fn print_models() {
    for name in list_models() {
        println!("{}", name);
    }
}
