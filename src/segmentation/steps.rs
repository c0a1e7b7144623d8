use anyhow::{Context, Result};
use rten_tensor::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::ImageSize;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep, Stage};
use crate::segmentation::model::SegmentationModel;
use crate::segmentation::palette::ColorPalette;
use crate::segmentation::relabel::LabelRemapTable;
use crate::segmentation::{postprocess, preprocessing, writer};

/// Resize to the network resolution and normalize into a tensor
pub struct PreprocessStep {
    pub size: ImageSize,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl PreprocessStep {
    /// ImageNet statistics
    pub fn new(size: ImageSize) -> Self {
        Self {
            size,
            mean: preprocessing::MEAN,
            std: preprocessing::STD,
        }
    }
}

impl PipelineStep for PreprocessStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let resized = preprocessing::resize_bilinear(&data.record.image, self.size);
        data.tensor = Some(preprocessing::to_normalized_tensor(
            &resized, self.mean, self.std,
        ));
        data.stage = Stage::Preprocessed;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Preprocess"
    }
}

/// Forward pass through the shared model
pub struct InferenceStep {
    model: Arc<dyn SegmentationModel>,
}

impl InferenceStep {
    pub fn new(model: Arc<dyn SegmentationModel>) -> Self {
        Self { model }
    }
}

impl PipelineStep for InferenceStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let input = data
            .tensor
            .take()
            .with_context(|| format!("Inference requires a preprocessed tensor, item is at {:?}", data.stage))?;

        let scores = self.model.forward(&input)?;
        debug!("{} produced scores of shape {:?}", self.model.name(), scores.shape());

        data.scores = Some(scores);
        data.stage = Stage::Inferred;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Inference"
    }
}

/// Reduce class scores to a label map
pub struct ArgmaxStep {
    /// Expected class count; a mismatch with the model output is reported
    pub num_classes: usize,
}

impl PipelineStep for ArgmaxStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let scores = data
            .scores
            .take()
            .with_context(|| format!("Label map requires model scores, item is at {:?}", data.stage))?;

        let classes = scores.shape()[1];
        if classes != self.num_classes {
            warn!(
                expected = self.num_classes,
                actual = classes,
                "model output class count differs from configuration"
            );
        }

        data.record.labels = Some(postprocess::argmax_labels(&scores)?);
        data.stage = Stage::LabelMapped;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Label Map"
    }
}

/// Convert training IDs to canonical label IDs
pub struct RelabelStep {
    pub table: LabelRemapTable,
}

impl PipelineStep for RelabelStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let remapped = self.table.apply(data.require_labels(self.name())?);
        data.record.labels = Some(remapped);
        data.stage = Stage::Relabeled;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Relabel"
    }
}

/// Tag the output with a display palette; stored labels are unchanged
pub struct PaletteStep {
    pub palette: Arc<ColorPalette>,
}

impl PipelineStep for PaletteStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        data.require_labels(self.name())?;
        data.palette = Some(self.palette.clone());
        data.stage = Stage::Paletted;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Palette"
    }
}

/// Nearest-neighbour resize back to the input resolution
pub struct RestoreSizeStep;

impl PipelineStep for RestoreSizeStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let restored = postprocess::restore_size(
            data.require_labels(self.name())?,
            data.record.width,
            data.record.height,
        );
        data.record.labels = Some(restored);
        data.stage = Stage::Resized;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Restore Size"
    }
}

/// Persist the mask as `<save_dir>/<stem>.png`
pub struct WriteStep {
    pub save_dir: PathBuf,
}

impl PipelineStep for WriteStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let path = writer::output_path(&self.save_dir, &data.record.path);
        writer::write_label_png(
            &path,
            data.require_labels(self.name())?,
            data.palette.as_deref(),
        )
        .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Wrote {}", path.display());
        data.output_path = Some(path);
        data.stage = Stage::Written;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Write"
    }
}
