use image::imageops::{self, FilterType};
use image::RgbImage;
use rten_tensor::NdTensor;

use crate::models::ImageSize;

/// ImageNet channel statistics the networks were trained with
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize to the network input resolution with bilinear interpolation
pub fn resize_bilinear(img: &RgbImage, size: ImageSize) -> RgbImage {
    if img.dimensions() == (size.width, size.height) {
        return img.clone();
    }
    imageops::resize(img, size.width, size.height, FilterType::Triangle)
}

/// Scale to [0, 1], normalize per channel and lay out as (1, 3, H, W)
pub fn to_normalized_tensor(img: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> NdTensor<f32, 4> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0f32; 3 * plane];

    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + offset] = (value - mean[c]) / std[c];
        }
    }

    NdTensor::from_data([1, 3, height as usize, width as usize], data)
}
