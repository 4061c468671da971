//! Random sources and normal variates.

use rand::Rng;
use tracing::warn;

use crate::error::FeatureError;

/// Cap on Box-Muller rejections before [`randn`] gives up.
///
/// Each draw is accepted with probability pi/4, so a healthy source never
/// comes close.
pub const MAX_NORMAL_ATTEMPTS: usize = 1000;

/// Uniform random numbers for feature generation.
///
/// Implemented for every [`rand::Rng`]; seed a `ChaCha8Rng` for reproducible runs.
pub trait RandomSource {
    /// Uniform integer in the closed range `[lo, hi]`. Returns `lo` when `hi <= lo`.
    fn next_int(&mut self, lo: i32, hi: i32) -> i32;

    /// Uniform double in `[0, 1)`.
    fn next_double(&mut self) -> f64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_int(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.gen_range(lo..=hi)
    }

    fn next_double(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Standard normal variate via the polar Box-Muller transform.
///
/// # Errors
///
/// Returns [`FeatureError::NormalSamplingExhausted`] if
/// [`MAX_NORMAL_ATTEMPTS`] consecutive draws fall outside the unit circle
/// or on its centre.
pub fn randn<R: RandomSource + ?Sized>(random: &mut R) -> Result<f64, FeatureError> {
    for _ in 0..MAX_NORMAL_ATTEMPTS {
        let u = 2.0 * random.next_double() - 1.0;
        let v = 2.0 * random.next_double() - 1.0;
        let w = u * u + v * v;
        if w == 0.0 || w > 1.0 {
            continue;
        }
        let x = (-2.0 * w.ln() / w).sqrt();
        return Ok(u * x);
    }
    warn!(
        attempts = MAX_NORMAL_ATTEMPTS,
        "random source never landed inside the unit circle"
    );
    Err(FeatureError::NormalSamplingExhausted {
        attempts: MAX_NORMAL_ATTEMPTS,
    })
}

/// Uniformly distributed unit vector in `dimensions` dimensions.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`FeatureError::ZeroDimension`] | `dimensions` is zero |
/// | [`FeatureError::NormalSamplingExhausted`] | A normal draw failed |
/// | [`FeatureError::DegenerateDirection`] | Every component was zero |
pub fn random_unit_direction<R: RandomSource + ?Sized>(
    random: &mut R,
    dimensions: usize,
) -> Result<Vec<f64>, FeatureError> {
    if dimensions == 0 {
        return Err(FeatureError::ZeroDimension);
    }
    let mut direction = (0..dimensions)
        .map(|_| randn(&mut *random))
        .collect::<Result<Vec<f64>, _>>()?;
    let norm = direction.iter().map(|c| c * c).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(FeatureError::DegenerateDirection);
    }
    for c in &mut direction {
        *c /= norm;
    }
    Ok(direction)
}
