use crate::classify::sample::ImageSample;

/// Region smoothing applied to a crop before greenness scoring.
///
/// Full mean-shift region segmentation lives outside this crate; it is
/// modeled here as a narrow seam: an image in, a same-shape smoothed
/// image out.
pub trait Segmenter {
    fn segment(&self, sample: &ImageSample) -> ImageSample;
}

/// Parameters of the mean-shift-style smoothing collaborator.
#[derive(Debug, Clone, Copy)]
pub struct MeanShiftParams {
    /// Neighborhood radius in pixels.
    pub spatial_radius: u32,
    /// Color distance (byte units) within which neighbors are averaged.
    pub range_radius: f64,
    /// Neighborhoods with fewer in-range members than this are treated as
    /// noise and flattened to the plain window mean.
    pub min_density: u32,
}

impl Default for MeanShiftParams {
    fn default() -> Self {
        MeanShiftParams {
            spatial_radius: 6,
            range_radius: 7.0,
            min_density: 40,
        }
    }
}

/// Identity segmenter for pre-smoothed input and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSegmentation;

impl Segmenter for NoSegmentation {
    fn segment(&self, sample: &ImageSample) -> ImageSample {
        sample.clone()
    }
}

/// Single-pass windowed smoothing stand-in for the external mean-shift
/// segmenter. Each pixel becomes the mean of the neighbors within
/// `spatial_radius` whose color lies within `range_radius`; pixels whose
/// in-range neighborhood is smaller than `min_density` take the plain
/// window mean instead, which absorbs small noisy regions. Operates on
/// byte-range samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanShiftSmoother {
    pub params: MeanShiftParams,
}

impl MeanShiftSmoother {
    pub fn new(params: MeanShiftParams) -> Self {
        MeanShiftSmoother { params }
    }
}

impl Segmenter for MeanShiftSmoother {
    fn segment(&self, sample: &ImageSample) -> ImageSample {
        let w = sample.width as i64;
        let h = sample.height as i64;
        if w == 0 || h == 0 {
            return sample.clone();
        }
        let radius = self.params.spatial_radius as i64;
        let range_sq = self.params.range_radius * self.params.range_radius;

        let n = sample.len();
        let mut red = Vec::with_capacity(n);
        let mut green = Vec::with_capacity(n);
        let mut blue = Vec::with_capacity(n);

        for y in 0..h {
            for x in 0..w {
                let i = (y * w + x) as usize;
                let (cr, cg, cb) = (sample.red[i], sample.green[i], sample.blue[i]);

                let mut in_sum = [0.0f64; 3];
                let mut in_count = 0u32;
                let mut all_sum = [0.0f64; 3];
                let mut all_count = 0u32;

                for dy in -radius..=radius {
                    let ny = y + dy;
                    if ny < 0 || ny >= h {
                        continue;
                    }
                    for dx in -radius..=radius {
                        let nx = x + dx;
                        if nx < 0 || nx >= w {
                            continue;
                        }
                        let j = (ny * w + nx) as usize;
                        let (r, g, b) = (sample.red[j], sample.green[j], sample.blue[j]);
                        all_sum[0] += r;
                        all_sum[1] += g;
                        all_sum[2] += b;
                        all_count += 1;
                        let dist_sq =
                            (r - cr) * (r - cr) + (g - cg) * (g - cg) + (b - cb) * (b - cb);
                        if dist_sq <= range_sq {
                            in_sum[0] += r;
                            in_sum[1] += g;
                            in_sum[2] += b;
                            in_count += 1;
                        }
                    }
                }

                let (sum, count) = if in_count >= self.params.min_density {
                    (in_sum, in_count)
                } else {
                    (all_sum, all_count)
                };
                let count = count as f64;
                red.push(sum[0] / count);
                green.push(sum[1] / count);
                blue.push(sum[2] / count);
            }
        }

        ImageSample::new(sample.width, sample.height, red, green, blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(width: u32, height: u32, value: f64) -> ImageSample {
        let n = (width * height) as usize;
        ImageSample::new(
            width,
            height,
            vec![value; n],
            vec![value; n],
            vec![value; n],
        )
    }

    #[test]
    fn test_uniform_image_is_unchanged() {
        let sample = uniform(6, 6, 100.0);
        let smoothed = MeanShiftSmoother::new(MeanShiftParams {
            spatial_radius: 2,
            range_radius: 7.0,
            min_density: 4,
        })
        .segment(&sample);
        assert_eq!(smoothed, sample);
    }

    #[test]
    fn test_isolated_outlier_is_absorbed() {
        let mut sample = uniform(5, 5, 100.0);
        let center = 2 * 5 + 2;
        sample.red[center] = 200.0;
        sample.green[center] = 0.0;
        sample.blue[center] = 0.0;

        let smoothed = MeanShiftSmoother::new(MeanShiftParams {
            spatial_radius: 1,
            range_radius: 7.0,
            min_density: 5,
        })
        .segment(&sample);

        // The outlier's in-range neighborhood is just itself, below the
        // density floor, so it collapses to the window mean.
        assert!(smoothed.red[center] < 200.0);
        assert!(smoothed.green[center] > 0.0);
        // A corner pixel keeps its dense uniform neighborhood.
        assert_eq!(smoothed.red[0], 100.0);
    }

    #[test]
    fn test_identity_segmenter_is_a_no_op() {
        let sample = uniform(3, 3, 42.0);
        assert_eq!(NoSegmentation.segment(&sample), sample);
    }
}
