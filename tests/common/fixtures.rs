use image::{ImageBuffer, Rgb};
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;
use segeval::SegmentationModel;
use segeval::error::Result;
use std::path::{Path, PathBuf};

/// Writes a width x height RGB gradient PNG at `path`, creating parent directories.
pub fn write_test_image(path: &Path, width: u32, height: u32) -> PathBuf {
    std::fs::create_dir_all(path.parent().expect("image path has a parent"))
        .expect("Failed to create image directory");
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128u8])
    });
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path.to_path_buf()
}

/// Lays out `<root>/leftImg8bit/<split>/<city>/<name>` for each entry
pub fn make_cityscapes_tree(root: &Path, split: &str, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(city, name)| {
            let path = root.join("leftImg8bit").join(split).join(city).join(name);
            write_test_image(&path, 8, 4)
        })
        .collect()
}

/// Writes `<root>/VOC2012/list/<split>.txt` with the given lines
pub fn write_voc_manifest(root: &Path, split: &str, lines: &[&str]) -> PathBuf {
    let list_dir = root.join("VOC2012").join("list");
    std::fs::create_dir_all(&list_dir).expect("Failed to create list directory");
    let manifest = list_dir.join(format!("{split}.txt"));
    std::fs::write(&manifest, lines.join("\n")).expect("Failed to write manifest");
    manifest
}

/// Deterministic stand-in for a trained network: at every pixel the
/// winning class is `(x * classes / width + y) % classes`.
pub struct BandedModel {
    pub classes: usize,
}

impl SegmentationModel for BandedModel {
    fn forward(&self, input: &NdTensor<f32, 4>) -> Result<NdTensor<f32, 4>> {
        let [_, _, height, width] = input.shape();
        let mut scores = NdTensor::zeros([1, self.classes, height, width]);
        for y in 0..height {
            for x in 0..width {
                let class = (x * self.classes / width + y) % self.classes;
                scores[[0, class, y, x]] = 1.0;
            }
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        "banded"
    }
}
