use image::RgbImage;

/// Three-band pixel array in red/green/blue order, row-major.
///
/// Band values are either byte range [0,255] (the usual case for decoded
/// imagery) or already normalized to [0,1]; consumers normalize on entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSample {
    pub width: u32,
    pub height: u32,
    pub red: Vec<f64>,
    pub green: Vec<f64>,
    pub blue: Vec<f64>,
}

impl ImageSample {
    pub fn new(width: u32, height: u32, red: Vec<f64>, green: Vec<f64>, blue: Vec<f64>) -> Self {
        debug_assert_eq!(red.len(), (width * height) as usize);
        debug_assert_eq!(green.len(), red.len());
        debug_assert_eq!(blue.len(), red.len());
        ImageSample {
            width,
            height,
            red,
            green,
            blue,
        }
    }

    /// Split a decoded image into byte-range band buffers.
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let n = (width as usize) * (height as usize);
        let mut red = Vec::with_capacity(n);
        let mut green = Vec::with_capacity(n);
        let mut blue = Vec::with_capacity(n);
        for p in img.pixels() {
            red.push(p.0[0] as f64);
            green.push(p.0[1] as f64);
            blue.push(p.0[2] as f64);
        }
        ImageSample {
            width,
            height,
            red,
            green,
            blue,
        }
    }

    /// Pixel count.
    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    /// Largest value across all three bands; distinguishes byte-range
    /// samples from pre-normalized ones.
    pub fn max_value(&self) -> f64 {
        self.red
            .iter()
            .chain(self.green.iter())
            .chain(self.blue.iter())
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_splits_bands() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([10, 20, 30]));
        img.put_pixel(1, 0, image::Rgb([40, 50, 60]));
        let sample = ImageSample::from_rgb(&img);
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.red, vec![10.0, 40.0]);
        assert_eq!(sample.green, vec![20.0, 50.0]);
        assert_eq!(sample.blue, vec![30.0, 60.0]);
    }

    #[test]
    fn test_max_value_spans_bands() {
        let sample = ImageSample::new(1, 1, vec![0.2], vec![0.9], vec![0.4]);
        assert_eq!(sample.max_value(), 0.9);
    }
}
