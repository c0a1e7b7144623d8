use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::map::map_colors;

/// Label to display colour lookup, 256 entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: [[u8; 3]; 256],
}

impl ColorPalette {
    /// The Pascal VOC colormap: bits of the label index are spread across
    /// the high bits of R, G and B, three at a time.
    pub fn pascal_voc() -> Self {
        let mut colors = [[0u8; 3]; 256];
        for (label, color) in colors.iter_mut().enumerate() {
            let mut c = label;
            for shift in (0..8).rev() {
                color[0] |= ((c & 1) as u8) << shift;
                color[1] |= (((c >> 1) & 1) as u8) << shift;
                color[2] |= (((c >> 2) & 1) as u8) << shift;
                c >>= 3;
            }
        }
        Self { colors }
    }

    pub fn from_colors(colors: [[u8; 3]; 256]) -> Self {
        Self { colors }
    }

    pub fn color(&self, label: u8) -> [u8; 3] {
        self.colors[label as usize]
    }

    /// Flattened RGB triplets, as stored in a PNG PLTE chunk
    pub fn to_plte(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }

    /// Render a label map in colour (for inspection only)
    pub fn colorize(&self, labels: &GrayImage) -> RgbImage {
        map_colors(labels, |p: Luma<u8>| Rgb(self.color(p[0])))
    }
}
