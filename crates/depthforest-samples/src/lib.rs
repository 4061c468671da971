//! Training-sample preparation for depth-labelled decision forests.
//!
//! Turns paired intensity/depth frames into an immutable
//! [`DataPointCollection`]: depth values are discretized into class labels
//! through a [`DepthBinTable`], pixels are filtered under the configured
//! policy, and samples are addressed either implicitly in raster order
//! (low-memory mode) or through an explicit index array.

mod binning;
mod collection;
mod config;
mod error;
mod frame;
mod preprocess;
mod source;

pub use binning::{
    BinTableGenerator, DepthBinTable, DepthUnits, INVALID_LABEL, RAW_MAX_DEPTH, UniformBins,
    bin_depth, label_histogram, tallest_bin,
};
pub use collection::{
    DataPointCollection, LoadReport, PixelPosition, SampleAddressing, SampleValues,
};
pub use config::{ClassSelector, CollectionConfig, FeatureGeometry, TrainingMode};
pub use error::{LoadError, SampleError};
pub use frame::{Frame, ImageSize, PixelFormat, RawFrame};
pub use preprocess::{IntensityPreprocessor, ThresholdPreprocessor};
pub use source::{DEPTH_SUFFIX, FrameNaming, ImageSource, InputDevice, MemoryImageSource, PngImageSource};
