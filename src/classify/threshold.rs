/// Adaptive binarization threshold for a single-channel numeric index,
/// chosen by maximizing the between-class intensity variance (Otsu's method)
/// over a 256-bin histogram.
///
/// Inputs already normalized to [0,1] are stretched to byte range before
/// histogramming; inputs exceeding byte range are linearly rescaled to
/// [0,255]. Negative values are clamped to 0.
///
/// Returns `fallback` unchanged whenever the histogram is degenerate (for
/// example a constant input, where every candidate variance is undefined).
/// Never panics.
pub fn otsu_threshold(values: &[f64], fallback: f64) -> f64 {
    if values.is_empty() {
        return fallback;
    }

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if !max.is_finite() || !min.is_finite() {
        return fallback;
    }

    let mut hist = [0u64; 256];
    let mut total = 0u64;
    for &v in values {
        let v = if max <= 1.0 {
            v * 255.0
        } else if max >= 256.0 {
            let span = max - min;
            if span == 0.0 {
                return fallback;
            }
            (v - min) / span * 255.0
        } else {
            v
        };
        let v = v.max(0.0);
        let bin = (v.floor() as usize).min(255);
        hist[bin] += 1;
        total += 1;
    }

    // Cumulative class probability omega(t) and first moment mu(t), with
    // bin weights t+1 so the total moment matches the histogram convention.
    let n = total as f64;
    let mut omega = [0.0f64; 256];
    let mut mu = [0.0f64; 256];
    let mut cum_p = 0.0;
    let mut cum_mu = 0.0;
    for t in 0..256 {
        let p = hist[t] as f64 / n;
        cum_p += p;
        cum_mu += p * (t as f64 + 1.0);
        omega[t] = cum_p;
        mu[t] = cum_mu;
    }
    let mu_total = mu[255];

    // Between-class variance is undefined where omega is 0 or 1; the maximum
    // is taken over the remaining candidates, ties resolved by the mean of
    // the tying indices.
    let mut best = f64::NEG_INFINITY;
    let mut tie_sum = 0.0;
    let mut tie_count = 0u32;
    for t in 0..256 {
        let w = omega[t];
        if w <= 0.0 || w >= 1.0 {
            continue;
        }
        let num = mu_total * w - mu[t];
        let sigma_b = num * num / (w * (1.0 - w));
        if !sigma_b.is_finite() {
            continue;
        }
        if sigma_b > best {
            best = sigma_b;
            tie_sum = t as f64;
            tie_count = 1;
        } else if sigma_b == best {
            tie_sum += t as f64;
            tie_count += 1;
        }
    }

    if tie_count == 0 {
        return fallback;
    }
    let idx = tie_sum / tie_count as f64;
    let threshold = (idx - 1.0) / 255.0;
    if threshold.is_nan() {
        fallback
    } else {
        threshold
    }
}
