/// HSV histogram-based identity matcher.
///
/// A fast matcher that compares face crops by their color distribution
/// using 2D Hue-Saturation histograms with Pearson correlation.
/// No ML model required, useful when ArcFace is unavailable.
use crate::detection::domain::identity_matcher::{FaceOccurrence, IdentityMatcher};
use crate::shared::frame::Frame;

pub const DEFAULT_THRESHOLD: f64 = 0.7;

const HUE_BINS: usize = 32;
const SAT_BINS: usize = 32;

pub struct HistogramMatcher {
    threshold: f64,
}

impl HistogramMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for HistogramMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl IdentityMatcher for HistogramMatcher {
    fn signature(&self, crop: &Frame) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
        if crop.channels() != 3 {
            return Err(format!("expected RGB crop, got {} channels", crop.channels()).into());
        }
        Ok(Some(compute_histogram(crop.data(), crop.width(), crop.height())))
    }

    fn same_identity(&self, a: &FaceOccurrence, b: &FaceOccurrence) -> bool {
        match (&a.signature, &b.signature) {
            (Some(ha), Some(hb)) => pearson_correlation(ha, hb) >= self.threshold,
            _ => false,
        }
    }
}

fn compute_histogram(rgb_data: &[u8], width: u32, height: u32) -> Vec<f32> {
    let num_pixels = (width * height) as usize;
    let mut hist = vec![0.0f32; HUE_BINS * SAT_BINS];
    let mut count = 0usize;

    for pixel in rgb_data.chunks_exact(3).take(num_pixels) {
        let r = pixel[0] as f64 / 255.0;
        let g = pixel[1] as f64 / 255.0;
        let b = pixel[2] as f64 / 255.0;

        let (h, s, _v) = rgb_to_hsv(r, g, b);

        let h_bin = ((h / 360.0) * HUE_BINS as f64).min(HUE_BINS as f64 - 1.0) as usize;
        let s_bin = (s * SAT_BINS as f64).min(SAT_BINS as f64 - 1.0) as usize;

        hist[h_bin * SAT_BINS + s_bin] += 1.0;
        count += 1;
    }

    if count > 0 {
        let total = count as f32;
        for v in &mut hist {
            *v /= total;
        }
    }

    hist
}

fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h = if delta == 0.0 {
        0.0
    } else if (max - r).abs() < f64::EPSILON {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let h = if h < 0.0 { h + 360.0 } else { h };

    (h, s, v)
}

/// Pearson correlation coefficient.
///
/// Returns 1.0 when both inputs have zero variance (identical distributions),
/// and 0.0 when only one has zero variance (undefined, treated as uncorrelated).
fn pearson_correlation(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let n = len as f64;

    let mean_a = a[..len].iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b[..len].iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let da = x as f64 - mean_a;
        let db = y as f64 - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < f64::EPSILON {
        return if var_a < f64::EPSILON && var_b < f64::EPSILON {
            1.0
        } else {
            0.0
        };
    }

    cov / denom
}
