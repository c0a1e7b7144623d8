pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod segmentation;
pub mod trainability;

pub use config::{Dataset, EvalConfig, ModelKind, Split};
pub use error::SegError;
pub use models::{EvalSummary, ImageRecord, ImageSize};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep, Stage};
pub use segmentation::model::{RtenSegmenter, SegmentationModel};
pub use segmentation::palette::ColorPalette;
pub use segmentation::relabel::{IGNORE_LABEL, LabelRemapTable};
