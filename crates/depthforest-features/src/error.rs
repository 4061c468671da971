//! Error types for randomized feature generation.

/// Errors from normal variate and random direction sampling.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// Returned when the Box-Muller transform rejected every draw.
    #[error("normal variate sampling rejected {attempts} consecutive draws")]
    NormalSamplingExhausted {
        /// Number of draws attempted.
        attempts: usize,
    },

    /// Returned when a random direction is requested in zero dimensions.
    #[error("random direction needs at least one dimension")]
    ZeroDimension,

    /// Returned when every component of a random direction came out zero.
    #[error("random direction has zero length")]
    DegenerateDirection,
}
