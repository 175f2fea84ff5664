use crate::classify::sample::ImageSample;
use crate::classify::threshold::otsu_threshold;

/// Fallback threshold when the excess-green histogram is degenerate.
const EXG_FALLBACK: f64 = 0.1;

/// Clamp range for the adaptive excess-green cut. Protects against the
/// selector picking an unreasonably permissive or strict threshold.
const EXG_CUT_MIN: f64 = 0.05;
const EXG_CUT_MAX: f64 = 0.1;

/// Fixed cut for the shadow branch. Shadow pixels have compressed dynamic
/// range that defeats the histogram method, so this one is not adaptive.
const SHADOW_EXG_CUT: f64 = 0.05;

/// Vegetation percentage of a smoothed street-level image crop, in [0,100].
///
/// The sample is expected to be pre-segmented by a mean-shift-style region
/// smoothing step (see `classify::segment`); this function only scores it.
/// A pixel counts as vegetation when it passes the core band rule together
/// with an adaptive excess-green cut, or the darker shadow band rule
/// together with a fixed cut.
pub fn vegetation_percent(sample: &ImageSample) -> f64 {
    let n = sample.len();
    if n == 0 {
        return 0.0;
    }

    let scale = if sample.max_value() > 1.0 {
        1.0 / 255.0
    } else {
        1.0
    };

    let mut exg = Vec::with_capacity(n);
    for i in 0..n {
        let r = sample.red[i] * scale;
        let g = sample.green[i] * scale;
        let b = sample.blue[i] * scale;
        exg.push((g - r) + (g - b));
    }

    let cut = otsu_threshold(&exg, EXG_FALLBACK).clamp(EXG_CUT_MIN, EXG_CUT_MAX);

    let mut vegetation = 0usize;
    for i in 0..n {
        let r = sample.red[i] * scale;
        let g = sample.green[i] * scale;
        let b = sample.blue[i] * scale;
        let core = r < 0.6 && g < 0.9 && b < 0.6;
        let shadow = r < 0.3 && g < 0.3 && b < 0.3;
        if (core && exg[i] > cut) || (shadow && exg[i] > SHADOW_EXG_CUT) {
            vegetation += 1;
        }
    }

    100.0 * vegetation as f64 / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn uniform_sample(width: u32, height: u32, rgb: [f64; 3]) -> ImageSample {
        let n = (width * height) as usize;
        ImageSample::new(
            width,
            height,
            vec![rgb[0]; n],
            vec![rgb[1]; n],
            vec![rgb[2]; n],
        )
    }

    #[test]
    fn test_vegetation_green_scores_full() {
        // Realistic vegetation tone: green below the 0.9 band cap.
        let sample = uniform_sample(50, 50, [20.0, 180.0, 30.0]);
        assert_eq!(vegetation_percent(&sample), 100.0);
    }

    #[test]
    fn test_pure_red_scores_zero() {
        let sample = uniform_sample(50, 50, [255.0, 0.0, 0.0]);
        assert_eq!(vegetation_percent(&sample), 0.0);
    }

    #[test]
    fn test_mixed_image_scores_green_fraction() {
        // Half vegetation green, half neutral gray.
        let n = 100usize;
        let mut red = vec![20.0; 50];
        red.extend(vec![128.0; 50]);
        let mut green = vec![180.0; 50];
        green.extend(vec![128.0; 50]);
        let mut blue = vec![30.0; 50];
        blue.extend(vec![128.0; 50]);
        let sample = ImageSample::new(10, 10, red, green, blue);
        assert_eq!(n, sample.len());
        assert_eq!(vegetation_percent(&sample), 50.0);
    }

    #[test]
    fn test_byte_and_normalized_inputs_agree() {
        let bytes = uniform_sample(8, 8, [40.0, 150.0, 60.0]);
        let normalized = ImageSample::new(
            8,
            8,
            bytes.red.iter().map(|v| v / 255.0).collect(),
            bytes.green.iter().map(|v| v / 255.0).collect(),
            bytes.blue.iter().map(|v| v / 255.0).collect(),
        );
        assert_eq!(vegetation_percent(&bytes), vegetation_percent(&normalized));
    }

    #[test]
    fn test_shadow_branch_admits_dark_vegetation() {
        // Half the pixels are bright vegetation that drives the adaptive cut
        // to its upper clamp; the other half sit in shadow with an
        // excess-green value between the fixed shadow cut and the adaptive
        // one. Only the shadow rule admits them.
        let n = 100usize;
        let mut red = vec![50.0 / 255.0; 50];
        red.extend(vec![0.24; 50]);
        let mut green = vec![160.0 / 255.0; 50];
        green.extend(vec![0.28; 50]);
        let mut blue = vec![60.0 / 255.0; 50];
        blue.extend(vec![0.24; 50]);
        let sample = ImageSample::new(10, 10, red, green, blue);
        assert_eq!(n, sample.len());
        assert_eq!(vegetation_percent(&sample), 100.0);
    }

    #[test]
    fn test_result_always_within_percentage_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let n = 64usize;
            let red: Vec<f64> = (0..n).map(|_| rng.random_range(0..256) as f64).collect();
            let green: Vec<f64> = (0..n).map(|_| rng.random_range(0..256) as f64).collect();
            let blue: Vec<f64> = (0..n).map(|_| rng.random_range(0..256) as f64).collect();
            let sample = ImageSample::new(8, 8, red, green, blue);
            let p = vegetation_percent(&sample);
            assert!((0.0..=100.0).contains(&p));
        }
    }

    #[test]
    fn test_empty_sample_scores_zero() {
        let sample = ImageSample::new(0, 0, vec![], vec![], vec![]);
        assert_eq!(vegetation_percent(&sample), 0.0);
    }
}
