use image::{GrayImage, ImageReader, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::{Result, SegError};

/// A single input image as it moves through the pipeline
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub image: RgbImage,
    /// Original width, restored on the label map before writing
    pub width: u32,
    pub height: u32,
    /// Label map, present once scores have been reduced
    pub labels: Option<GrayImage>,
}

impl ImageRecord {
    /// Decode an image file to RGB and record its original size
    pub fn load(path: &Path) -> Result<Self> {
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|source| SegError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_image(path, decoded.to_rgb8()))
    }

    pub fn from_image(path: &Path, image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            path: path.to_path_buf(),
            image,
            width,
            height,
            labels: None,
        }
    }

    /// File stem used to name outputs ("frankfurt_000000_000294_leftImg8bit")
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// Target resolution, width first (W x H) as on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Outcome of one evaluation run
#[derive(Debug, Clone, Default)]
pub struct EvalSummary {
    pub processed: usize,
    pub outputs: Vec<PathBuf>,
}
