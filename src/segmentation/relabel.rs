use image::GrayImage;
use tracing::warn;

use crate::error::{Result, SegError};

/// Label value meaning "no ground truth"
pub const IGNORE_LABEL: u8 = 255;

/// Cityscapes training IDs to official label IDs
const CITYSCAPES_TRAIN_TO_LABEL_ID: [(u8, u8); 21] = [
    (0, 7),
    (1, 8),
    (2, 11),
    (3, 12),
    (4, 13),
    (5, 17),
    (6, 19),
    (7, 20),
    (8, 21),
    (9, 22),
    (10, 23),
    (11, 24),
    (12, 25),
    (13, 26),
    (14, 27),
    (15, 28),
    (16, 31),
    (17, 32),
    (18, 33),
    (19, IGNORE_LABEL),
    (IGNORE_LABEL, 0),
];

/// Fixed source to destination label mapping.
///
/// Every lookup reads the source label map untouched and writes into a new
/// buffer, so chained rules such as `19 -> 255` followed by `255 -> 0` never
/// feed into each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRemapTable {
    lut: [Option<u8>; 256],
}

/// Pixels whose value had no rule in the table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmappedLabels {
    pub pixels: usize,
    pub values: Vec<u8>,
}

impl LabelRemapTable {
    /// Build a table; each source value may appear only once
    pub fn new(rules: &[(u8, u8)]) -> Result<Self> {
        let mut lut = [None; 256];
        for &(src, dst) in rules {
            if let Some(existing) = lut[src as usize] {
                return Err(SegError::Configuration(format!(
                    "label {src} mapped twice ({existing} and {dst})"
                )));
            }
            lut[src as usize] = Some(dst);
        }
        Ok(Self { lut })
    }

    pub fn cityscapes() -> Self {
        let mut lut = [None; 256];
        for (src, dst) in CITYSCAPES_TRAIN_TO_LABEL_ID {
            lut[src as usize] = Some(dst);
        }
        Self { lut }
    }

    pub fn get(&self, src: u8) -> Option<u8> {
        self.lut[src as usize]
    }

    /// Source values covered by a rule, ascending
    pub fn sources(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|&v| self.lut[v as usize].is_some())
    }

    /// Distinct destination values, ascending
    pub fn codomain(&self) -> Vec<u8> {
        let mut values: Vec<u8> = self.lut.iter().flatten().copied().collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Remap a flat slice of labels into a fresh vector
    pub fn remap_values(&self, labels: &[u8]) -> (Vec<u8>, UnmappedLabels) {
        let mut out = vec![0; labels.len()];
        let unmapped = self.remap_into(labels, &mut out);
        (out, unmapped)
    }

    /// Read from `src`, write into `dst`. The two never alias.
    fn remap_into(&self, src: &[u8], dst: &mut [u8]) -> UnmappedLabels {
        let mut seen = [false; 256];
        let mut unmapped = UnmappedLabels::default();

        for (out, &v) in dst.iter_mut().zip(src) {
            *out = match self.lut[v as usize] {
                Some(mapped) => mapped,
                None => {
                    unmapped.pixels += 1;
                    seen[v as usize] = true;
                    v
                }
            };
        }

        unmapped.values = (0..=u8::MAX).filter(|&v| seen[v as usize]).collect();
        unmapped
    }

    /// Remap a label map. Values without a rule pass through unchanged and
    /// are reported as a warning.
    pub fn apply(&self, labels: &GrayImage) -> GrayImage {
        let (width, height) = labels.dimensions();
        let mut remapped = GrayImage::new(width, height);
        let unmapped = self.remap_into(labels.as_raw(), &mut remapped);

        if unmapped.pixels > 0 {
            warn!(
                pixels = unmapped.pixels,
                values = ?unmapped.values,
                "label values outside the remap table passed through unchanged"
            );
        }

        remapped
    }
}
