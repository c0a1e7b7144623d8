use image::GrayImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::{Result, SegError};
use crate::segmentation::palette::ColorPalette;

/// `<save_dir>/<stem>.png`
pub fn output_path(save_dir: &Path, input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("image"));
    save_dir.join(name.with_extension("png"))
}

/// Write a label map as PNG. With a palette the file is colour-indexed and
/// the stored indices are the labels themselves; otherwise 8-bit grayscale.
pub fn write_label_png(path: &Path, labels: &GrayImage, palette: Option<&ColorPalette>) -> Result<()> {
    let (width, height) = labels.dimensions();
    let writer = BufWriter::new(File::create(path)?);

    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_depth(png::BitDepth::Eight);
    match palette {
        Some(palette) => {
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_palette(palette.to_plte());
        }
        None => encoder.set_color(png::ColorType::Grayscale),
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(labels.as_raw())?;
    writer.finish()?;
    Ok(())
}

/// A label PNG read back without palette expansion
#[derive(Debug)]
pub struct LabelPng {
    pub labels: GrayImage,
    pub palette: Option<Vec<u8>>,
}

/// Read the raw indices of a PNG written by [`write_label_png`]
pub fn read_label_png(path: &Path) -> Result<LabelPng> {
    let mut decoder = png::Decoder::new(File::open(path)?);
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder
        .read_info()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if frame.bit_depth != png::BitDepth::Eight
        || !matches!(frame.color_type, png::ColorType::Indexed | png::ColorType::Grayscale)
    {
        return Err(SegError::Configuration(format!(
            "{} is not an 8-bit label map",
            path.display()
        )));
    }

    buf.truncate(frame.buffer_size());
    let palette = reader.info().palette.as_ref().map(|p| p.to_vec());
    let labels = GrayImage::from_raw(frame.width, frame.height, buf).ok_or_else(|| {
        SegError::Configuration(format!("{} has a truncated image buffer", path.display()))
    })?;

    Ok(LabelPng { labels, palette })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_extension() {
        let path = output_path(
            Path::new("/results"),
            Path::new("/data/VOC2012/JPEGImages/2007_000033.jpg"),
        );
        assert_eq!(path, PathBuf::from("/results/2007_000033.png"));

        // Only the final extension changes, even when it repeats earlier in the name
        let path = output_path(Path::new("out"), Path::new("a/png.image.png"));
        assert_eq!(path, PathBuf::from("out/png.image.png"));
    }

    #[test]
    fn paletted_png_keeps_indices() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mask.png");
        let labels = GrayImage::from_raw(3, 1, vec![0, 15, 255]).unwrap();
        let palette = ColorPalette::pascal_voc();

        write_label_png(&path, &labels, Some(&palette)).unwrap();
        let read = read_label_png(&path).unwrap();

        assert_eq!(read.labels, labels);
        assert_eq!(read.palette.unwrap(), palette.to_plte());
    }

    #[test]
    fn grayscale_png_has_no_palette() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mask.png");
        let labels = GrayImage::from_raw(2, 2, vec![7, 8, 33, 0]).unwrap();

        write_label_png(&path, &labels, None).unwrap();
        let read = read_label_png(&path).unwrap();

        assert_eq!(read.labels, labels);
        assert!(read.palette.is_none());
        // Plain image decoders see the same values
        let decoded = image::open(&path).unwrap().to_luma8();
        assert_eq!(decoded, labels);
    }
}
