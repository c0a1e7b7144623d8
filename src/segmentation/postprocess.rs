use image::GrayImage;
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;

use crate::error::{Result, SegError};

/// Reduce (1, C, H, W) scores to an H x W label map.
/// Ties go to the lowest class index.
pub fn argmax_labels(scores: &NdTensor<f32, 4>) -> Result<GrayImage> {
    let [batch, classes, height, width] = scores.shape();
    if batch != 1 {
        return Err(SegError::Model(format!(
            "expected a single-image batch, got {batch}"
        )));
    }
    if classes == 0 || classes > 256 {
        return Err(SegError::Model(format!(
            "cannot store {classes} classes in an 8-bit label map"
        )));
    }

    let mut labels = GrayImage::new(width as u32, height as u32);
    for (x, y, pixel) in labels.enumerate_pixels_mut() {
        let (x, y) = (x as usize, y as usize);
        let mut best = 0usize;
        let mut best_score = scores[[0, 0, y, x]];
        for c in 1..classes {
            let score = scores[[0, c, y, x]];
            if score > best_score {
                best = c;
                best_score = score;
            }
        }
        pixel[0] = best as u8;
    }

    Ok(labels)
}

/// Resize a label map with nearest-neighbour sampling so class IDs are
/// never blended. Each output pixel takes the source pixel under its centre.
pub fn restore_size(labels: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (src_w, src_h) = labels.dimensions();
    if (src_w, src_h) == (width, height) {
        return labels.clone();
    }

    let xs: Vec<u32> = (0..width).map(|x| nearest_source(x, width, src_w)).collect();
    let ys: Vec<u32> = (0..height).map(|y| nearest_source(y, height, src_h)).collect();

    GrayImage::from_fn(width, height, |x, y| {
        *labels.get_pixel(xs[x as usize], ys[y as usize])
    })
}

fn nearest_source(dst: u32, dst_len: u32, src_len: u32) -> u32 {
    let src = ((2 * dst as u64 + 1) * src_len as u64) / (2 * dst_len as u64);
    (src as u32).min(src_len.saturating_sub(1))
}
