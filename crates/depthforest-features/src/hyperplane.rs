//! Random-hyperplane feature: f(x) = sum of I(x + o_i) over random offsets o_i.

use depthforest_samples::DataPointCollection;

use crate::offset::Offset;
use crate::random::RandomSource;
use crate::response::FeatureResponse;

/// Sum of the intensities at `dimension` random offsets around the sample.
///
/// Each offset coordinate is drawn from `[-b, b]` with
/// `b = trunc((sqrt(dimension) - 1) / 2)`, the half-width of a patch whose
/// area is `dimension`. A dimension of 0 yields no offsets and a constant
/// response of 0.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RandomHyperplaneResponse {
    offsets: Vec<Offset>,
    dimension: usize,
}

impl RandomHyperplaneResponse {
    /// Build a response from fixed offsets.
    #[must_use]
    pub fn from_offsets(offsets: Vec<Offset>) -> Self {
        let dimension = offsets.len();
        Self { offsets, dimension }
    }

    /// Half-width of the offset range for `dimension`.
    #[must_use]
    pub fn offset_bound(dimension: usize) -> i32 {
        let bound = ((dimension as f64).sqrt() - 1.0) / 2.0;
        // truncation toward zero; -0.5 for dimension 0 becomes 0
        (bound as i32).max(0)
    }

    /// Borrow the offsets.
    #[must_use]
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Dimension the offsets were drawn for.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl FeatureResponse for RandomHyperplaneResponse {
    fn create_random<R: RandomSource + ?Sized>(random: &mut R, dimension: usize) -> Self {
        let bound = Self::offset_bound(dimension);
        let offsets = (0..dimension)
            .map(|_| Offset::random(&mut *random, bound))
            .collect();
        Self { offsets, dimension }
    }

    fn response(&self, data: &DataPointCollection, sample: usize) -> f64 {
        self.offsets
            .iter()
            .map(|o| f64::from(data.intensity_at(sample, o.dx, o.dy)))
            .sum()
    }

    fn max_offset(&self) -> usize {
        self.offsets.iter().map(|o| o.reach()).max().unwrap_or(0)
    }
}
