//! Configuration builder for batch sample collection.

use crate::binning::{BinTableGenerator, DepthUnits, UniformBins};
use crate::collection::DataPointCollection;
use crate::error::SampleError;
use crate::frame::ImageSize;
use crate::preprocess::{IntensityPreprocessor, ThresholdPreprocessor};
use crate::source::{FrameNaming, ImageSource};

/// Which class labels a regression collection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClassSelector {
    /// Keep pixels of every depth bin.
    All,
    /// Keep only pixels whose depth bin equals this label.
    Class(u8),
}

impl ClassSelector {
    /// Return true if a pixel with `label` is selected.
    #[must_use]
    pub fn matches(self, label: u8) -> bool {
        match self {
            ClassSelector::All => true,
            ClassSelector::Class(class) => class == label,
        }
    }
}

/// What each sample records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TrainingMode {
    /// Record the depth bin label of every sample.
    Classification,
    /// Record the raw depth of every sample whose bin is selected.
    Regression {
        /// Depth bins to keep.
        target: ClassSelector,
    },
}

/// Feature family the collection's samples will be evaluated with.
///
/// Decides how the patch size becomes the feature dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FeatureGeometry {
    /// Two-pixel difference; dimension is the patch area.
    PixelDifference,
    /// Sum over random offsets; dimension is the patch side.
    Hyperplane,
}

impl FeatureGeometry {
    /// Feature dimension for a square patch of side `patch_size`.
    #[must_use]
    pub fn dimension(self, patch_size: usize) -> usize {
        match self {
            FeatureGeometry::PixelDifference => patch_size * patch_size,
            FeatureGeometry::Hyperplane => patch_size,
        }
    }
}

/// Configuration for loading a batch of intensity/depth frame pairs.
///
/// Construct via [`CollectionConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default                        |
/// |--------------------|--------------------------------|
/// | `patch_size`       | 5                              |
/// | `mode`             | `Classification`               |
/// | `train_on_zero`    | `false`                        |
/// | `closeup`          | `true`                         |
/// | `depth_units`      | `Millimeters { max_range: 1500 }` |
/// | `geometry`         | `PixelDifference`              |
/// | `bins`             | 4                              |
/// | `invert_bins`      | `true`                         |
/// | `threshold`        | 0                              |
/// | `background_label` | 1                              |
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub(crate) naming: FrameNaming,
    pub(crate) first_index: usize,
    pub(crate) image_count: usize,
    pub(crate) image_size: ImageSize,
    pub(crate) patch_size: usize,
    pub(crate) mode: TrainingMode,
    pub(crate) train_on_zero: bool,
    pub(crate) closeup: bool,
    pub(crate) depth_units: DepthUnits,
    pub(crate) geometry: FeatureGeometry,
    pub(crate) bins: usize,
    pub(crate) invert_bins: bool,
    pub(crate) threshold: u8,
    pub(crate) background_label: u8,
}

impl CollectionConfig {
    /// Create a config loading `image_count` pairs starting at `first_index`.
    ///
    /// An `image_count` of zero is accepted and loads an empty collection.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SampleError::ImageRangeOverflow`] | `first_index + image_count` overflows |
    /// | [`SampleError::EmptyImageSize`] | `image_size` has a zero dimension |
    pub fn new(
        naming: FrameNaming,
        first_index: usize,
        image_count: usize,
        image_size: ImageSize,
    ) -> Result<Self, SampleError> {
        if first_index.checked_add(image_count).is_none() {
            return Err(SampleError::ImageRangeOverflow {
                first_index,
                image_count,
            });
        }
        if image_size.is_empty() {
            return Err(SampleError::EmptyImageSize { size: image_size });
        }
        Ok(Self {
            naming,
            first_index,
            image_count,
            image_size,
            patch_size: 5,
            mode: TrainingMode::Classification,
            train_on_zero: false,
            closeup: true,
            depth_units: DepthUnits::Millimeters { max_range: 1500 },
            geometry: FeatureGeometry::PixelDifference,
            bins: 4,
            invert_bins: true,
            threshold: 0,
            background_label: 1,
        })
    }

    // --- Setters ---

    /// Set the side of the square feature patch. Must be odd.
    #[must_use]
    pub fn with_patch_size(mut self, patch_size: usize) -> Self {
        self.patch_size = patch_size;
        self
    }

    /// Set classification or regression mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TrainingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep pixels whose preprocessed intensity is zero.
    #[must_use]
    pub fn with_train_on_zero(mut self, train_on_zero: bool) -> Self {
        self.train_on_zero = train_on_zero;
        self
    }

    /// Set closeup capture mode. When `false`, frames dominated by the
    /// background label are discarded.
    #[must_use]
    pub fn with_closeup(mut self, closeup: bool) -> Self {
        self.closeup = closeup;
        self
    }

    /// Set the unit of the depth frames.
    #[must_use]
    pub fn with_depth_units(mut self, depth_units: DepthUnits) -> Self {
        self.depth_units = depth_units;
        self
    }

    /// Set the feature family the samples are prepared for.
    #[must_use]
    pub fn with_geometry(mut self, geometry: FeatureGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set the number of depth bins.
    #[must_use]
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Reverse the bin order so the farthest range gets label 1.
    #[must_use]
    pub fn with_invert_bins(mut self, invert_bins: bool) -> Self {
        self.invert_bins = invert_bins;
        self
    }

    /// Set the intensity threshold passed to the default preprocessor.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the label treated as background by the closeup heuristic.
    #[must_use]
    pub fn with_background_label(mut self, background_label: u8) -> Self {
        self.background_label = background_label;
        self
    }

    // --- Getters ---

    /// Return the frame naming scheme.
    #[must_use]
    pub fn naming(&self) -> &FrameNaming {
        &self.naming
    }

    /// Frame indices this config loads. `new` guarantees the end does not overflow.
    pub(crate) fn frame_indices(&self) -> std::ops::Range<usize> {
        self.first_index..self.first_index + self.image_count
    }

    /// Return the first image index.
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.first_index
    }

    /// Return the number of images requested.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    /// Return the size every frame must have.
    #[must_use]
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Return the patch side.
    #[must_use]
    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Return the training mode.
    #[must_use]
    pub fn mode(&self) -> TrainingMode {
        self.mode
    }

    /// Return whether zero-intensity pixels are kept.
    #[must_use]
    pub fn train_on_zero(&self) -> bool {
        self.train_on_zero
    }

    /// Return whether closeup mode is on.
    #[must_use]
    pub fn closeup(&self) -> bool {
        self.closeup
    }

    /// Return the depth units.
    #[must_use]
    pub fn depth_units(&self) -> DepthUnits {
        self.depth_units
    }

    /// Return the feature geometry.
    #[must_use]
    pub fn geometry(&self) -> FeatureGeometry {
        self.geometry
    }

    /// Return the number of depth bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Return whether bins are inverted.
    #[must_use]
    pub fn invert_bins(&self) -> bool {
        self.invert_bins
    }

    /// Return the preprocessing threshold.
    #[must_use]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Return the closeup background label.
    #[must_use]
    pub fn background_label(&self) -> u8 {
        self.background_label
    }

    /// Feature dimension implied by the geometry and patch size.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.geometry.dimension(self.patch_size)
    }

    /// Whether samples will be addressed implicitly in raster order.
    ///
    /// True when no per-pixel filtering can happen: zero pixels are kept and
    /// either every label is recorded (classification) or every bin is selected.
    #[must_use]
    pub fn low_memory(&self) -> bool {
        self.train_on_zero
            && matches!(
                self.mode,
                TrainingMode::Classification
                    | TrainingMode::Regression {
                        target: ClassSelector::All
                    }
            )
    }

    /// Load the configured frame pairs with uniform depth bins and a
    /// threshold preprocessor.
    ///
    /// # Errors
    ///
    /// See [`DataPointCollection::load_images`].
    pub fn load(&self, source: &impl ImageSource) -> Result<DataPointCollection, SampleError> {
        self.load_with(
            source,
            &ThresholdPreprocessor::new(self.threshold),
            &UniformBins,
        )
    }

    /// Load the configured frame pairs with caller-supplied collaborators.
    ///
    /// # Errors
    ///
    /// See [`DataPointCollection::load_images`].
    pub fn load_with(
        &self,
        source: &impl ImageSource,
        preprocessor: &impl IntensityPreprocessor,
        generator: &impl BinTableGenerator,
    ) -> Result<DataPointCollection, SampleError> {
        DataPointCollection::load_images(self, source, preprocessor, generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InputDevice;

    fn config() -> CollectionConfig {
        let naming = FrameNaming::new("/tmp", "", InputDevice::Infrared);
        CollectionConfig::new(naming, 0, 3, ImageSize::new(4, 4)).unwrap()
    }

    #[test]
    fn rejects_overflowing_range_and_empty_size() {
        let naming = FrameNaming::new("/tmp", "", InputDevice::Infrared);
        assert!(matches!(
            CollectionConfig::new(naming.clone(), usize::MAX, 1, ImageSize::new(4, 4)),
            Err(SampleError::ImageRangeOverflow {
                first_index: usize::MAX,
                image_count: 1,
            })
        ));
        assert!(CollectionConfig::new(naming.clone(), usize::MAX, 0, ImageSize::new(4, 4)).is_ok());
        assert!(CollectionConfig::new(naming.clone(), 0, 0, ImageSize::new(4, 4)).is_ok());
        assert!(matches!(
            CollectionConfig::new(naming, 0, 1, ImageSize::new(4, 0)),
            Err(SampleError::EmptyImageSize { .. })
        ));
    }

    #[test]
    fn dimension_follows_geometry() {
        let cfg = config().with_patch_size(7);
        assert_eq!(cfg.dimension(), 49);
        assert_eq!(cfg.with_geometry(FeatureGeometry::Hyperplane).dimension(), 7);
    }

    #[test]
    fn low_memory_only_without_filtering() {
        let cfg = config();
        assert!(!cfg.low_memory());
        assert!(cfg.clone().with_train_on_zero(true).low_memory());

        let all = TrainingMode::Regression {
            target: ClassSelector::All,
        };
        let one = TrainingMode::Regression {
            target: ClassSelector::Class(2),
        };
        assert!(cfg.clone().with_train_on_zero(true).with_mode(all).low_memory());
        assert!(!cfg.clone().with_train_on_zero(true).with_mode(one).low_memory());
        assert!(!cfg.with_mode(all).low_memory());
    }

    #[test]
    fn selector_matches() {
        assert!(ClassSelector::All.matches(9));
        assert!(ClassSelector::Class(3).matches(3));
        assert!(!ClassSelector::Class(3).matches(4));
    }
}
