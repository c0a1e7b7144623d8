use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use rten_tensor::NdTensor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::models::ImageRecord;
use crate::segmentation::palette::ColorPalette;

/// Per-image progress through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loaded,
    Preprocessed,
    Inferred,
    LabelMapped,
    Relabeled,
    Paletted,
    Resized,
    Written,
}

/// Data that flows through the pipeline, one image at a time
pub struct PipelineData {
    pub record: ImageRecord,

    /// Normalized (1, 3, H, W) network input
    pub tensor: Option<NdTensor<f32, 4>>,

    /// Raw (1, C, H, W) class scores
    pub scores: Option<NdTensor<f32, 4>>,

    /// Palette attached to the written mask
    pub palette: Option<Arc<ColorPalette>>,

    /// Where the mask was written
    pub output_path: Option<PathBuf>,

    pub stage: Stage,
}

impl PipelineData {
    pub fn from_record(record: ImageRecord) -> Self {
        Self {
            record,
            tensor: None,
            scores: None,
            palette: None,
            output_path: None,
            stage: Stage::Loaded,
        }
    }

    /// Decode an image file into a fresh pipeline item
    pub fn load(path: &Path) -> Result<Self> {
        let record = ImageRecord::load(path)?;
        Ok(Self::from_record(record))
    }

    pub fn labels(&self) -> Option<&GrayImage> {
        self.record.labels.as_ref()
    }

    /// Label map, or an error naming the step that needed it
    pub fn require_labels(&self, step: &str) -> Result<&GrayImage> {
        self.record
            .labels
            .as_ref()
            .with_context(|| format!("{step} requires a label map, item is at {:?}", self.stage))
    }

    /// Picture of the current state for debug output, if the stage has one
    fn preview(&self) -> Option<DynamicImage> {
        match (self.stage, self.labels()) {
            (Stage::Loaded | Stage::Preprocessed, _) => {
                Some(DynamicImage::ImageRgb8(self.record.image.clone()))
            }
            (_, Some(labels)) => {
                let palette = self
                    .palette
                    .clone()
                    .unwrap_or_else(|| Arc::new(ColorPalette::pascal_voc()));
                Some(DynamicImage::ImageRgb8(palette.colorize(labels)))
            }
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn debug_dir(&self) -> Option<&Path> {
        self.debug
            .as_ref()
            .filter(|d| d.enabled)
            .map(|d| d.output_dir.as_path())
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Advance one image by one stage
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug folders)
    fn name(&self) -> &str;
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                anyhow::bail!("Debug directory is not empty: {}", output_dir.display());
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step on one input image
    pub fn run(&self, input: &Path) -> Result<PipelineData> {
        self.run_partial(input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, input: &Path, num_steps: usize) -> Result<PipelineData> {
        let mut data = PipelineData::load(input)?;
        let stem = data.record.stem();
        debug!(
            "Loaded {} ({}x{})",
            input.display(),
            data.record.width,
            data.record.height
        );
        self.save_debug_output(&data, 0, "input", &stem)?;

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            if self.context.verbose {
                debug!("Running step {}: {}", step_idx + 1, step.name());
            }
            data = step
                .process(data, &self.context)
                .with_context(|| format!("{} failed on {}", step.name(), input.display()))?;
            self.save_debug_output(&data, step_idx + 1, step.name(), &stem)?;
        }

        Ok(data)
    }

    /// Save the item's preview under `<debug>/<NN>_<step>/<stem>.png`
    fn save_debug_output(
        &self,
        data: &PipelineData,
        step_idx: usize,
        step_name: &str,
        stem: &str,
    ) -> Result<()> {
        let Some(debug_root) = self.context.debug_dir() else {
            return Ok(());
        };
        let Some(preview) = data.preview() else {
            return Ok(());
        };

        let step_dir_name = format!(
            "{:02}_{}",
            step_idx,
            step_name.to_lowercase().replace(' ', "_")
        );
        let step_dir = debug_root.join(&step_dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let filename = format!("{stem}.png");
        preview
            .save(step_dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;

        if self.context.verbose {
            debug!("  Debug: saved {}/{}", step_dir_name, filename);
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
