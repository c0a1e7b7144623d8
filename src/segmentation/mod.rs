pub mod model;
pub mod palette;
pub mod postprocess;
pub mod preprocessing;
pub mod relabel;
pub mod steps;
pub mod writer;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::EvalConfig;
use crate::models::EvalSummary;
use crate::pipeline::Pipeline;
use model::{RtenSegmenter, SegmentationModel};
use steps::*;

/// Resolve the weight file and load the network once for the whole run
pub fn load_model(config: &EvalConfig) -> Result<Arc<dyn SegmentationModel>> {
    let weights = config.resolve_weights()?;
    let model = RtenSegmenter::load(&weights, config.model)?;
    Ok(Arc::new(model))
}

/// Build the per-image pipeline for a configuration.
///
/// Relabeling and the palette are only added when the dataset (or
/// `--colorize`) asks for them. The save directory is created if absent.
pub fn build_pipeline(config: &EvalConfig, model: Arc<dyn SegmentationModel>) -> Result<Pipeline> {
    let save_dir = config.save_dir();
    std::fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create {}", save_dir.display()))?;

    let mut pipeline = Pipeline::new()
        .with_verbose(config.verbose)
        .add_step(Arc::new(PreprocessStep::new(config.im_size)))
        .add_step(Arc::new(InferenceStep::new(model)))
        .add_step(Arc::new(ArgmaxStep {
            num_classes: config.num_classes(),
        }));

    if let Some(table) = config.dataset.remap_table() {
        pipeline = pipeline.add_step(Arc::new(RelabelStep { table }));
    }
    if let Some(palette) = config.output_palette() {
        pipeline = pipeline.add_step(Arc::new(PaletteStep {
            palette: Arc::new(palette),
        }));
    }

    pipeline = pipeline
        .add_step(Arc::new(RestoreSizeStep))
        .add_step(Arc::new(WriteStep { save_dir }));

    if let Some(debug_dir) = &config.debug_out {
        pipeline = pipeline.with_debug(debug_dir.clone())?;
    }

    Ok(pipeline)
}

/// Run the pipeline over every image in order. The first failure aborts.
pub fn evaluate(pipeline: &Pipeline, image_list: &[PathBuf], show_progress: bool) -> Result<EvalSummary> {
    let pb = if show_progress {
        let pb = ProgressBar::new(image_list.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut summary = EvalSummary::default();
    for path in image_list {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let data = pipeline.run(path)?;
        if let Some(output) = data.output_path {
            summary.outputs.push(output);
        }
        summary.processed += 1;
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("Evaluated {} images", summary.processed);
    Ok(summary)
}
