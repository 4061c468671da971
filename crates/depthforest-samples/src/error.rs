//! Error types for sample collection construction.

use std::path::PathBuf;

use crate::frame::{ImageSize, PixelFormat};

/// Fatal errors from depth binning and sample collection construction.
///
/// Configuration variants are raised before any frame is read. Format variants
/// abort a batch mid-way; no partial collection is returned.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// Returned when the training image directory does not exist.
    #[error("failed to find directory: {path}")]
    DirectoryNotFound {
        /// Directory that was expected to hold the frame pairs.
        path: PathBuf,
    },

    /// Returned when the patch size is even.
    #[error("patch size must be odd, got {patch_size}")]
    EvenPatchSize {
        /// The invalid patch size.
        patch_size: usize,
    },

    /// Returned when `first_index + image_count` does not fit in `usize`.
    #[error("image range starting at {first_index} with {image_count} images overflows")]
    ImageRangeOverflow {
        /// First frame index requested.
        first_index: usize,
        /// Number of frame pairs requested.
        image_count: usize,
    },

    /// Returned when the configured image size has a zero dimension.
    #[error("image size must be non-empty, got {size}")]
    EmptyImageSize {
        /// The invalid image size.
        size: ImageSize,
    },

    /// Returned when a bin table is requested with an unusable bin count.
    #[error("bin count must be in [1, 255], got {bins}")]
    InvalidBinCount {
        /// The invalid bin count.
        bins: usize,
    },

    /// Returned when a bin table is requested with a zero maximum depth.
    #[error("maximum depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid maximum depth.
        max_depth: u16,
    },

    /// Returned when a raster buffer does not hold exactly `width * height` pixels.
    #[error("frame of size {size} needs {expected} pixels, got {got}")]
    FrameDataLength {
        /// Declared frame size.
        size: ImageSize,
        /// Pixel count implied by `size`.
        expected: usize,
        /// Length of the supplied buffer.
        got: usize,
    },

    /// Returned when a decoded frame has an unexpected pixel layout.
    #[error("encountered image with unexpected content type {found} (expected {expected}): {path}")]
    UnexpectedPixelFormat {
        /// Path of the offending frame.
        path: PathBuf,
        /// Format this frame must have.
        expected: PixelFormat,
        /// Format the frame actually has.
        found: PixelFormat,
    },

    /// Returned when the intensity and depth frames of a pair differ in size.
    #[error("depth and intensity images not the same size ({intensity} vs {depth}): {intensity_path}, {depth_path}")]
    FrameSizeMismatch {
        /// Path of the intensity frame.
        intensity_path: PathBuf,
        /// Path of the depth frame.
        depth_path: PathBuf,
        /// Size of the intensity frame.
        intensity: ImageSize,
        /// Size of the depth frame.
        depth: ImageSize,
    },

    /// Returned when a frame does not match the size the collection addresses pixels with.
    #[error("frame {path} is {found}, expected {expected}")]
    ImageSizeMismatch {
        /// Path of the offending frame (empty for in-memory frames).
        path: PathBuf,
        /// Size configured for the collection.
        expected: ImageSize,
        /// Size of the frame.
        found: ImageSize,
    },
}

/// Non-fatal failure to read one frame of a pair.
///
/// Batch construction logs these and skips the image.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Returned when the frame file does not exist.
    #[error("failed to open image: {path}")]
    Missing {
        /// Path that was attempted.
        path: PathBuf,
    },

    /// Returned when the frame file exists but cannot be decoded.
    #[error("failed to decode image: {path}")]
    Decode {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },
}
