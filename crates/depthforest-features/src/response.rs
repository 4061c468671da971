//! The split-feature capability shared by both response families.

use depthforest_samples::{DataPointCollection, FeatureGeometry};
use tracing::debug;

use crate::hyperplane::RandomHyperplaneResponse;
use crate::random::RandomSource;
use crate::subtraction::PixelSubtractionResponse;

/// A scalar feature evaluated at a sample, with randomized parameters fixed
/// at construction.
///
/// Implemented by exactly [`RandomHyperplaneResponse`] and
/// [`PixelSubtractionResponse`]; use [`AnyFeatureResponse`] to hold either.
pub trait FeatureResponse: Sized {
    /// Draw a new feature for samples prepared with `dimension`.
    fn create_random<R: RandomSource + ?Sized>(random: &mut R, dimension: usize) -> Self;

    /// Evaluate the feature at sample `sample` of `data`.
    ///
    /// # Panics
    ///
    /// Panics if any offset leaves the sample's image. Callers are
    /// responsible for querying in-bounds samples; see
    /// [`FeatureResponse::try_response`].
    fn response(&self, data: &DataPointCollection, sample: usize) -> f64;

    /// Largest Chebyshev distance any offset reaches from the sample.
    fn max_offset(&self) -> usize;

    /// Evaluate the feature, or `None` if the sample lies closer than
    /// [`FeatureResponse::max_offset`] to its image border.
    fn try_response(&self, data: &DataPointCollection, sample: usize) -> Option<f64> {
        data.offset_in_bounds(sample, self.max_offset())
            .then(|| self.response(data, sample))
    }
}

/// Either feature family, chosen by [`FeatureGeometry`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnyFeatureResponse {
    /// Sum of intensities at random offsets.
    Hyperplane(RandomHyperplaneResponse),
    /// Difference of intensities at two random offsets.
    PixelSubtraction(PixelSubtractionResponse),
}

impl AnyFeatureResponse {
    /// Draw a feature of the family matching `geometry`.
    pub fn create_random<R: RandomSource + ?Sized>(
        geometry: FeatureGeometry,
        random: &mut R,
        dimension: usize,
    ) -> Self {
        let feature = match geometry {
            FeatureGeometry::Hyperplane => {
                Self::Hyperplane(RandomHyperplaneResponse::create_random(random, dimension))
            }
            FeatureGeometry::PixelDifference => Self::PixelSubtraction(
                PixelSubtractionResponse::create_random(random, dimension),
            ),
        };
        debug!(
            ?geometry,
            dimension,
            max_offset = feature.max_offset(),
            "drew feature"
        );
        feature
    }

    /// Geometry of the wrapped family.
    #[must_use]
    pub fn geometry(&self) -> FeatureGeometry {
        match self {
            Self::Hyperplane(_) => FeatureGeometry::Hyperplane,
            Self::PixelSubtraction(_) => FeatureGeometry::PixelDifference,
        }
    }

    /// Evaluate the wrapped feature. Panics as [`FeatureResponse::response`].
    #[must_use]
    pub fn response(&self, data: &DataPointCollection, sample: usize) -> f64 {
        match self {
            Self::Hyperplane(f) => f.response(data, sample),
            Self::PixelSubtraction(f) => f.response(data, sample),
        }
    }

    /// Evaluate the wrapped feature if it stays inside the image.
    #[must_use]
    pub fn try_response(&self, data: &DataPointCollection, sample: usize) -> Option<f64> {
        match self {
            Self::Hyperplane(f) => f.try_response(data, sample),
            Self::PixelSubtraction(f) => f.try_response(data, sample),
        }
    }

    /// Largest offset reach of the wrapped feature.
    #[must_use]
    pub fn max_offset(&self) -> usize {
        match self {
            Self::Hyperplane(f) => f.max_offset(),
            Self::PixelSubtraction(f) => f.max_offset(),
        }
    }
}
