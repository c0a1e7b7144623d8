use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, SegError};
use crate::models::ImageSize;
use crate::segmentation::model::lookup_weights;
use crate::segmentation::palette::ColorPalette;
use crate::segmentation::relabel::LabelRemapTable;

pub const CITYSCAPES_CLASSES: [&str; 20] = [
    "road",
    "sidewalk",
    "building",
    "wall",
    "fence",
    "pole",
    "traffic light",
    "traffic sign",
    "vegetation",
    "terrain",
    "sky",
    "person",
    "rider",
    "car",
    "truck",
    "bus",
    "train",
    "motorcycle",
    "bicycle",
    "background",
];

pub const VOC_CLASSES: [&str; 21] = [
    "background",
    "aeroplane",
    "bicycle",
    "bird",
    "boat",
    "bottle",
    "bus",
    "car",
    "cat",
    "chair",
    "cow",
    "diningtable",
    "dog",
    "horse",
    "motorbike",
    "person",
    "pottedplant",
    "sheep",
    "sofa",
    "train",
    "tvmonitor",
];

/// Supported evaluation datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    /// Cityscapes: directory scan, training IDs remapped to label IDs
    City,
    /// Pascal VOC 2012: manifest file, paletted output
    Pascal,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::City => "city",
            Dataset::Pascal => "pascal",
        }
    }

    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            Dataset::City => &CITYSCAPES_CLASSES,
            Dataset::Pascal => &VOC_CLASSES,
        }
    }

    /// Cityscapes models emit training IDs, which the benchmark does not accept
    pub fn remap_table(&self) -> Option<LabelRemapTable> {
        match self {
            Dataset::City => Some(LabelRemapTable::cityscapes()),
            Dataset::Pascal => None,
        }
    }

    /// Pascal submissions are colour-indexed PNGs
    pub fn palette(&self) -> Option<ColorPalette> {
        match self {
            Dataset::City => None,
            Dataset::Pascal => Some(ColorPalette::pascal_voc()),
        }
    }

    /// Results directory layout expected by each benchmark
    pub fn save_dir(&self, output_root: &Path, split: Split) -> PathBuf {
        match self {
            Dataset::City => output_root
                .join(format!("results_city_{}", split.name()))
                .join("results"),
            Dataset::Pascal => output_root
                .join("results_pascal")
                .join("results")
                .join("VOC2012")
                .join("Segmentation")
                .join(format!("comp6_{}_cls", split.name())),
        }
    }
}

impl FromStr for Dataset {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "city" => Ok(Dataset::City),
            "pascal" => Ok(Dataset::Pascal),
            other => Err(SegError::Configuration(format!(
                "{other} dataset not yet supported"
            ))),
        }
    }
}

/// Supported segmentation networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelKind {
    Espnetv2,
    Dicenet,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Espnetv2 => "espnetv2",
            ModelKind::Dicenet => "dicenet",
        }
    }
}

impl FromStr for ModelKind {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "espnetv2" => Ok(ModelKind::Espnetv2),
            "dicenet" => Ok(ModelKind::Dicenet),
            other => Err(SegError::Configuration(format!(
                "{other} network not yet supported"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Split {
    Val,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Everything a run needs, typed and validated up front
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub model: ModelKind,
    /// Network width multiplier, part of the weight map key
    pub scale: f32,
    pub dataset: Dataset,
    pub data_path: PathBuf,
    pub split: Split,
    pub im_size: ImageSize,
    /// Explicit weight file; when absent the weight map is consulted
    pub weights: Option<PathBuf>,
    /// Prefix prepended to weight map entries
    pub weights_dir: PathBuf,
    /// Overrides the dataset's class count
    pub num_classes: Option<usize>,
    pub output_root: PathBuf,
    /// Evaluate only the first N images
    pub limit: Option<usize>,
    /// Attach a palette even when the dataset stores raw indices
    pub colorize: bool,
    pub debug_out: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Espnetv2,
            scale: 2.0,
            dataset: Dataset::City,
            data_path: PathBuf::from("data/cityscapes"),
            split: Split::Val,
            im_size: ImageSize::new(1024, 512),
            weights: None,
            weights_dir: PathBuf::new(),
            num_classes: None,
            output_root: PathBuf::from("."),
            limit: None,
            colorize: false,
            debug_out: None,
            verbose: false,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.im_size.width == 0 || self.im_size.height == 0 {
            return Err(SegError::Configuration(format!(
                "image size must be nonzero, got {}",
                self.im_size
            )));
        }
        let classes = self.num_classes();
        if classes == 0 || classes > 256 {
            return Err(SegError::Configuration(format!(
                "class count must be within 1..=256 to fit an 8-bit label map, got {classes}"
            )));
        }
        if self.limit == Some(0) {
            return Err(SegError::Configuration(
                "limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
            .unwrap_or_else(|| self.dataset.class_names().len())
    }

    pub fn save_dir(&self) -> PathBuf {
        self.dataset.save_dir(&self.output_root, self.split)
    }

    /// Keys into the weight map: ("espnetv2_2.0", "city_1024x512")
    pub fn weight_key(&self) -> (String, String) {
        (
            format!("{}_{:.1}", self.model.name(), self.scale),
            format!("{}_{}", self.dataset.name(), self.im_size),
        )
    }

    /// Locate the weight file, either given explicitly or via the weight map
    pub fn resolve_weights(&self) -> Result<PathBuf> {
        let path = match &self.weights {
            Some(path) => path.clone(),
            None => {
                let (model_key, dataset_key) = self.weight_key();
                let entry = lookup_weights(&model_key, &dataset_key).ok_or_else(|| {
                    SegError::Configuration(format!(
                        "no pretrained weights for {model_key} / {dataset_key}"
                    ))
                })?;
                self.weights_dir.join(entry)
            }
        };

        if !path.is_file() {
            return Err(SegError::missing("weight file", path));
        }
        Ok(path)
    }

    /// Palette for written masks, if any
    pub fn output_palette(&self) -> Option<ColorPalette> {
        self.dataset
            .palette()
            .or_else(|| self.colorize.then(ColorPalette::pascal_voc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_set_selectors() {
        assert_eq!("city".parse::<Dataset>().unwrap(), Dataset::City);
        assert_eq!("dicenet".parse::<ModelKind>().unwrap(), ModelKind::Dicenet);

        let err = "ade20k".parse::<Dataset>().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("ade20k dataset not yet supported"));
        assert!("resnet".parse::<ModelKind>().is_err());
    }

    #[test]
    fn save_dirs_follow_benchmark_layout() {
        let root = Path::new("/out");
        assert_eq!(
            Dataset::City.save_dir(root, Split::Val),
            PathBuf::from("/out/results_city_val/results")
        );
        assert_eq!(
            Dataset::Pascal.save_dir(root, Split::Test),
            PathBuf::from("/out/results_pascal/results/VOC2012/Segmentation/comp6_test_cls")
        );
    }

    #[test]
    fn class_count_defaults_to_dataset() {
        let mut config = EvalConfig::default();
        assert_eq!(config.num_classes(), 20);
        config.dataset = Dataset::Pascal;
        assert_eq!(config.num_classes(), 21);
        config.num_classes = Some(5);
        assert_eq!(config.num_classes(), 5);
    }

    #[test]
    fn validate_rejects_oversized_class_count() {
        let config = EvalConfig {
            num_classes: Some(300),
            ..EvalConfig::default()
        };
        assert!(config.validate().unwrap_err().is_configuration());

        let config = EvalConfig {
            im_size: ImageSize::new(0, 512),
            ..EvalConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(EvalConfig::default().validate().is_ok());
    }

    #[test]
    fn weight_key_formats_scale_with_one_decimal() {
        let config = EvalConfig {
            scale: 1.5,
            dataset: Dataset::Pascal,
            im_size: ImageSize::new(384, 384),
            ..EvalConfig::default()
        };
        assert_eq!(
            config.weight_key(),
            ("espnetv2_1.5".to_string(), "pascal_384x384".to_string())
        );
    }

    #[test]
    fn resolve_weights_requires_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();

        let config = EvalConfig {
            weights: Some(dir.path().join("missing.rten")),
            ..EvalConfig::default()
        };
        let err = config.resolve_weights().unwrap_err();
        assert!(matches!(err, SegError::MissingFile { kind: "weight file", .. }));

        let present = dir.path().join("model.rten");
        std::fs::write(&present, b"weights").unwrap();
        let config = EvalConfig {
            weights: Some(present.clone()),
            ..EvalConfig::default()
        };
        assert_eq!(config.resolve_weights().unwrap(), present);
    }

    #[test]
    fn resolve_weights_consults_weight_map() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EvalConfig {
            weights_dir: dir.path().to_path_buf(),
            ..EvalConfig::default()
        };

        // Known key, file not downloaded yet
        let err = config.resolve_weights().unwrap_err();
        assert!(matches!(err, SegError::MissingFile { .. }));

        let (model_key, dataset_key) = config.weight_key();
        let entry = lookup_weights(&model_key, &dataset_key).unwrap();
        let path = dir.path().join(entry);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"weights").unwrap();
        assert_eq!(config.resolve_weights().unwrap(), path);

        // Unknown key
        let config = EvalConfig {
            im_size: ImageSize::new(640, 480),
            ..config
        };
        let err = config.resolve_weights().unwrap_err();
        assert!(matches!(err, SegError::Configuration(_)));
    }

    #[test]
    fn colorize_falls_back_to_voc_palette() {
        let config = EvalConfig::default();
        assert!(config.output_palette().is_none());
        let config = EvalConfig {
            colorize: true,
            ..config
        };
        assert!(config.output_palette().is_some());
    }
}
