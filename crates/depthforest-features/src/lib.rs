//! Randomized pixel features for depth-forest split decisions.
//!
//! Two feature families share the [`FeatureResponse`] capability:
//! [`RandomHyperplaneResponse`] sums intensities at random offsets and
//! [`PixelSubtractionResponse`] subtracts the intensities at two. Both are
//! drawn from a [`RandomSource`] and evaluated against a
//! [`depthforest_samples::DataPointCollection`].

mod error;
mod hyperplane;
mod offset;
mod random;
mod response;
mod subtraction;

pub use error::FeatureError;
pub use hyperplane::RandomHyperplaneResponse;
pub use offset::Offset;
pub use random::{MAX_NORMAL_ATTEMPTS, RandomSource, randn, random_unit_direction};
pub use response::{AnyFeatureResponse, FeatureResponse};
pub use subtraction::PixelSubtractionResponse;
