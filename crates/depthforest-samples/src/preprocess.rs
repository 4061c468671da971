//! Intensity preprocessing applied before pixels are filtered.

use crate::frame::Frame;

/// Transforms a raw intensity frame before sample selection.
///
/// The returned frame must have the same size as the input.
pub trait IntensityPreprocessor: Send + Sync {
    /// Preprocess one intensity frame.
    fn preprocess(&self, intensity: &Frame<u8>) -> Frame<u8>;
}

/// Zeroes every pixel darker than `threshold`; brighter pixels are kept as is.
///
/// A threshold of 0 leaves the frame unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThresholdPreprocessor {
    threshold: u8,
}

impl ThresholdPreprocessor {
    /// Create a preprocessor with the given threshold.
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Return the threshold.
    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl IntensityPreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, intensity: &Frame<u8>) -> Frame<u8> {
        let threshold = self.threshold;
        intensity.map(|v| if v < threshold { 0 } else { v })
    }
}
