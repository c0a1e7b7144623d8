use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use std::path::Path;
use tracing::info;

use crate::config::ModelKind;
use crate::error::{Result, SegError};

/// Pretrained weights shipped in the model zoo, keyed by
/// `<model>_<scale>` and `<dataset>_<W>x<H>`
const WEIGHT_MAP: &[(&str, &str, &str)] = &[
    ("espnetv2_2.0", "city_1024x512", "model_zoo/espnetv2/espnetv2_s_2.0_city_1024x512.rten"),
    ("espnetv2_2.0", "city_512x256", "model_zoo/espnetv2/espnetv2_s_2.0_city_512x256.rten"),
    ("espnetv2_2.0", "pascal_384x384", "model_zoo/espnetv2/espnetv2_s_2.0_pascal_384x384.rten"),
    ("espnetv2_2.0", "pascal_256x256", "model_zoo/espnetv2/espnetv2_s_2.0_pascal_256x256.rten"),
    ("espnetv2_1.5", "city_1024x512", "model_zoo/espnetv2/espnetv2_s_1.5_city_1024x512.rten"),
    ("espnetv2_1.5", "pascal_384x384", "model_zoo/espnetv2/espnetv2_s_1.5_pascal_384x384.rten"),
    ("espnetv2_1.0", "city_1024x512", "model_zoo/espnetv2/espnetv2_s_1.0_city_1024x512.rten"),
    ("espnetv2_1.0", "pascal_384x384", "model_zoo/espnetv2/espnetv2_s_1.0_pascal_384x384.rten"),
    ("dicenet_2.0", "city_1024x512", "model_zoo/dicenet/dicenet_s_2.0_city_1024x512.rten"),
    ("dicenet_2.0", "pascal_384x384", "model_zoo/dicenet/dicenet_s_2.0_pascal_384x384.rten"),
    ("dicenet_1.5", "city_1024x512", "model_zoo/dicenet/dicenet_s_1.5_city_1024x512.rten"),
    ("dicenet_1.5", "pascal_384x384", "model_zoo/dicenet/dicenet_s_1.5_pascal_384x384.rten"),
];

/// Relative weight path for a model/dataset pair, if one was published
pub fn lookup_weights(model_key: &str, dataset_key: &str) -> Option<&'static str> {
    WEIGHT_MAP
        .iter()
        .find(|(m, d, _)| *m == model_key && *d == dataset_key)
        .map(|(_, _, path)| *path)
}

/// A network mapping a normalized (1, 3, H, W) batch to (1, C, H', W')
/// per-class scores. Loaded once and shared read-only.
pub trait SegmentationModel: Send + Sync {
    fn forward(&self, input: &NdTensor<f32, 4>) -> Result<NdTensor<f32, 4>>;

    fn name(&self) -> &str;
}

/// Segmentation network exported to the rten format
pub struct RtenSegmenter {
    model: Model,
    name: String,
}

impl RtenSegmenter {
    pub fn load(path: &Path, kind: ModelKind) -> Result<Self> {
        if !path.is_file() {
            return Err(SegError::missing("weight file", path));
        }

        info!("Loading model weights from {}", path.display());
        let model = Model::load_file(path)
            .map_err(|e| SegError::Model(format!("failed to load {}: {e}", path.display())))?;
        info!("Weights loaded successfully");

        Ok(Self {
            model,
            name: kind.name().to_string(),
        })
    }
}

impl SegmentationModel for RtenSegmenter {
    fn forward(&self, input: &NdTensor<f32, 4>) -> Result<NdTensor<f32, 4>> {
        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| SegError::Model(format!("forward pass failed: {e}")))?;

        let scores: NdTensor<f32, 4> = output
            .try_into()
            .map_err(|e| SegError::Model(format!("expected rank-4 f32 scores: {e:?}")))?;
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_map_lookup() {
        assert_eq!(
            lookup_weights("espnetv2_2.0", "city_1024x512"),
            Some("model_zoo/espnetv2/espnetv2_s_2.0_city_1024x512.rten")
        );
        assert_eq!(lookup_weights("espnetv2_2.0", "city_640x480"), None);
        assert_eq!(lookup_weights("dicenet_0.5", "city_1024x512"), None);
    }

    #[test]
    fn load_rejects_missing_weights() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = RtenSegmenter::load(&dir.path().join("nope.rten"), ModelKind::Espnetv2)
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn load_rejects_corrupt_weights() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corrupt.rten");
        std::fs::write(&path, b"not a model").unwrap();
        let err = RtenSegmenter::load(&path, ModelKind::Dicenet).err().unwrap();
        assert!(matches!(err, SegError::Model(_)));
    }
}
