mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from segeval for tests
pub use segeval::{
    ColorPalette, Dataset, EvalConfig, ImageSize, LabelRemapTable, SegError, SegmentationModel,
    Split,
};
