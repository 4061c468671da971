//! Pixel-subtraction feature: f(x) = I(x + u) - I(x + v).

use depthforest_samples::DataPointCollection;

use crate::offset::Offset;
use crate::random::RandomSource;
use crate::response::FeatureResponse;

/// Difference of the intensities at two random offsets around the sample.
///
/// The dimension only sets the offset range `[-b, b]` with
/// `b = ceil(sqrt(dimension) / 2)`; exactly two offsets are drawn
/// whatever its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PixelSubtractionResponse {
    offset_0: Offset,
    offset_1: Offset,
    dimension: usize,
}

impl PixelSubtractionResponse {
    /// Build a response from two fixed offsets.
    #[must_use]
    pub fn from_offsets(offset_0: Offset, offset_1: Offset) -> Self {
        Self {
            offset_0,
            offset_1,
            dimension: 0,
        }
    }

    /// Half-width of the offset range for `dimension`.
    #[must_use]
    pub fn offset_bound(dimension: usize) -> i32 {
        ((dimension as f64).sqrt() / 2.0).ceil() as i32
    }

    /// The two offsets, minuend first.
    #[must_use]
    pub fn offsets(&self) -> [Offset; 2] {
        [self.offset_0, self.offset_1]
    }

    /// Dimension the offsets were drawn for.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl FeatureResponse for PixelSubtractionResponse {
    fn create_random<R: RandomSource + ?Sized>(random: &mut R, dimension: usize) -> Self {
        let bound = Self::offset_bound(dimension);
        let offset_0 = Offset::random(random, bound);
        let offset_1 = Offset::random(random, bound);
        Self {
            offset_0,
            offset_1,
            dimension,
        }
    }

    fn response(&self, data: &DataPointCollection, sample: usize) -> f64 {
        let a = data.intensity_at(sample, self.offset_0.dx, self.offset_0.dy);
        let b = data.intensity_at(sample, self.offset_1.dx, self.offset_1.dy);
        f64::from(a) - f64::from(b)
    }

    fn max_offset(&self) -> usize {
        self.offset_0.reach().max(self.offset_1.reach())
    }
}
