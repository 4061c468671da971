//! Immutable training sample sets built from intensity/depth frame pairs.
//!
//! A sample is one pixel of the image corpus. It is identified by its
//! flattened address `image * step + row * width + col`. When no pixel is
//! filtered out the addresses are implicit (raster order); otherwise they
//! are stored explicitly, parallel to the labels or targets.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument, warn};

use crate::binning::{BinTableGenerator, DepthBinTable, DepthUnits, bin_depth, tallest_bin};
use crate::config::{ClassSelector, CollectionConfig, TrainingMode};
use crate::error::SampleError;
use crate::frame::{Frame, ImageSize, PixelFormat, RawFrame};
use crate::preprocess::IntensityPreprocessor;
use crate::source::ImageSource;

/// How sample indices map to flattened pixel addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleAddressing {
    /// Sample `i` is the pixel at flattened address `i` (low-memory mode).
    Implicit,
    /// Sample `i` is the pixel at `addresses[i]`.
    Explicit(Vec<usize>),
}

/// Per-sample values recorded alongside the addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleValues {
    /// Nothing recorded (inference collections).
    None,
    /// Depth bin label per sample (classification).
    Labels(Vec<u8>),
    /// Raw depth per sample (regression).
    Targets(Vec<u16>),
}

impl SampleValues {
    fn len(&self) -> Option<usize> {
        match self {
            SampleValues::None => None,
            SampleValues::Labels(l) => Some(l.len()),
            SampleValues::Targets(t) => Some(t.len()),
        }
    }
}

/// A flattened pixel address split into image, row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPosition {
    /// Image ordinal within the corpus.
    pub image: usize,
    /// Row within the image.
    pub row: usize,
    /// Column within the image.
    pub col: usize,
}

/// Outcome counts of a batch load.
///
/// Callers should check `loaded` rather than assume every requested image made it in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadReport {
    /// Number of frame pairs requested.
    pub requested: usize,
    /// Number of frame pairs that entered the corpus.
    pub loaded: usize,
    /// Pairs skipped because a frame was missing or undecodable.
    pub failed_loads: usize,
    /// Pairs skipped because the background bin dominated the frame.
    pub background_skips: usize,
}

/// Immutable set of training samples over an owned image corpus.
///
/// Built once through [`DataPointCollection::load_images`] (or
/// [`CollectionConfig::load`]) for training, or
/// [`DataPointCollection::from_frame`] for evaluating a single frame.
/// Safe to share between threads once built.
#[derive(Debug, Clone)]
pub struct DataPointCollection {
    images: Vec<Frame<u8>>,
    image_size: ImageSize,
    dimension: usize,
    addressing: SampleAddressing,
    values: SampleValues,
    bin_table: Option<DepthBinTable>,
    depth_units: Option<DepthUnits>,
    report: LoadReport,
}

/// Samples selected from one frame pair, addressed within that frame.
struct FrameSamples {
    image: Frame<u8>,
    offsets: Vec<usize>,
    values: SampleValues,
}

enum FrameOutcome {
    Kept(FrameSamples),
    Unreadable,
    Background,
}

/// Shared, read-only state for per-frame processing.
struct FrameContext<'a, S, P> {
    config: &'a CollectionConfig,
    source: &'a S,
    preprocessor: &'a P,
    table: &'a DepthBinTable,
    low_memory: bool,
}

impl<S: ImageSource, P: IntensityPreprocessor> FrameContext<'_, S, P> {
    fn process(&self, index: usize) -> Result<FrameOutcome, SampleError> {
        let naming = &self.config.naming;
        let intensity_path = naming.intensity_path(index);
        let depth_path = naming.depth_path(index);

        let (intensity, depth) = match (
            self.source.load(&intensity_path),
            self.source.load(&depth_path),
        ) {
            (Ok(intensity), Ok(depth)) => (intensity, depth),
            (Err(e), _) | (_, Err(e)) => {
                warn!(index, error = %e, "skipping unreadable frame pair");
                return Ok(FrameOutcome::Unreadable);
            }
        };

        let intensity = match intensity {
            RawFrame::Gray8(frame) => frame,
            other => {
                return Err(SampleError::UnexpectedPixelFormat {
                    path: intensity_path,
                    expected: PixelFormat::Gray8,
                    found: other.format(),
                });
            }
        };
        let depth = match depth {
            RawFrame::Gray16(frame) => frame,
            other => {
                return Err(SampleError::UnexpectedPixelFormat {
                    path: depth_path,
                    expected: PixelFormat::Gray16,
                    found: other.format(),
                });
            }
        };

        if intensity.size() != depth.size() {
            return Err(SampleError::FrameSizeMismatch {
                intensity_path,
                depth_path,
                intensity: intensity.size(),
                depth: depth.size(),
            });
        }
        if intensity.size() != self.config.image_size {
            return Err(SampleError::ImageSizeMismatch {
                path: intensity_path,
                expected: self.config.image_size,
                found: intensity.size(),
            });
        }

        let labels = bin_depth(&depth, self.table);

        if !self.config.closeup {
            let tallest = tallest_bin(&labels);
            if tallest == self.config.background_label {
                debug!(index, tallest, "skipping background-dominated frame");
                return Ok(FrameOutcome::Background);
            }
        }

        let image = self.preprocessor.preprocess(&intensity);
        debug_assert_eq!(image.size(), intensity.size());

        let (offsets, values) = match self.config.mode {
            TrainingMode::Classification => {
                select_labels(&image, &labels, self.config.train_on_zero)
            }
            TrainingMode::Regression { target } => select_targets(
                &image,
                &labels,
                &depth,
                target,
                self.config.train_on_zero,
                self.low_memory,
            ),
        };

        Ok(FrameOutcome::Kept(FrameSamples {
            image,
            offsets,
            values,
        }))
    }
}

/// Classification selection. Addresses are kept exactly when filtering is active.
fn select_labels(
    image: &Frame<u8>,
    labels: &Frame<u8>,
    train_on_zero: bool,
) -> (Vec<usize>, SampleValues) {
    let mut offsets = Vec::new();
    let mut kept = Vec::new();
    for (offset, (&ir, &label)) in image.as_slice().iter().zip(labels.as_slice()).enumerate() {
        if train_on_zero {
            kept.push(label);
        } else if ir != 0 {
            kept.push(label);
            offsets.push(offset);
        }
    }
    (offsets, SampleValues::Labels(kept))
}

/// Regression selection over the targeted depth bins.
fn select_targets(
    image: &Frame<u8>,
    labels: &Frame<u8>,
    depth: &Frame<u16>,
    target: ClassSelector,
    train_on_zero: bool,
    low_memory: bool,
) -> (Vec<usize>, SampleValues) {
    let mut offsets = Vec::new();
    let mut kept = Vec::new();
    let pixels = image
        .as_slice()
        .iter()
        .zip(labels.as_slice())
        .zip(depth.as_slice());
    for (offset, ((&ir, &label), &d)) in pixels.enumerate() {
        if !target.matches(label) {
            continue;
        }
        if train_on_zero {
            kept.push(d);
            if !low_memory {
                offsets.push(offset);
            }
        } else if ir != 0 {
            kept.push(d);
            offsets.push(offset);
        }
    }
    (offsets, SampleValues::Targets(kept))
}

impl DataPointCollection {
    /// Load a batch of intensity/depth frame pairs into a training collection.
    ///
    /// Frames are processed in parallel; the result is identical to
    /// processing them one by one in index order. A pair with a missing or
    /// undecodable frame is logged and skipped.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SampleError::DirectoryNotFound`] | The frame directory does not exist |
    /// | [`SampleError::EvenPatchSize`] | The patch size is even |
    /// | [`SampleError::InvalidBinCount`] / [`SampleError::InvalidMaxDepth`] | The bin generator rejects its parameters |
    /// | [`SampleError::UnexpectedPixelFormat`] | An intensity frame is not 8-bit gray or a depth frame is not 16-bit gray |
    /// | [`SampleError::FrameSizeMismatch`] | The frames of a pair differ in size |
    /// | [`SampleError::ImageSizeMismatch`] | A pair does not match the configured image size |
    #[instrument(skip_all, fields(
        directory = %config.naming.directory().display(),
        first = config.first_index,
        count = config.image_count
    ))]
    pub fn load_images(
        config: &CollectionConfig,
        source: &impl ImageSource,
        preprocessor: &impl IntensityPreprocessor,
        generator: &impl BinTableGenerator,
    ) -> Result<Self, SampleError> {
        let directory = config.naming.directory();
        if !directory.is_dir() {
            return Err(SampleError::DirectoryNotFound {
                path: directory.to_path_buf(),
            });
        }
        if config.patch_size % 2 == 0 {
            return Err(SampleError::EvenPatchSize {
                patch_size: config.patch_size,
            });
        }

        let table = generator.generate(
            config.invert_bins,
            config.bins,
            config.depth_units.max_depth(),
        )?;
        let low_memory = config.low_memory();

        debug!(
            dimension = config.dimension(),
            low_memory,
            table_len = table.len(),
            "loading frame pairs"
        );

        let ctx = FrameContext {
            config,
            source,
            preprocessor,
            table: &table,
            low_memory,
        };
        let outcomes: Vec<FrameOutcome> = config
            .frame_indices()
            .into_par_iter()
            .map(|index| ctx.process(index))
            .collect::<Result<_, _>>()?;

        let step = config.image_size.step();
        let mut report = LoadReport {
            requested: config.image_count,
            ..LoadReport::default()
        };
        let mut images = Vec::new();
        let mut addresses = Vec::new();
        let mut labels = Vec::new();
        let mut targets = Vec::new();

        for outcome in outcomes {
            let frame = match outcome {
                FrameOutcome::Kept(frame) => frame,
                FrameOutcome::Unreadable => {
                    report.failed_loads += 1;
                    continue;
                }
                FrameOutcome::Background => {
                    report.background_skips += 1;
                    continue;
                }
            };
            let base = images.len() * step;
            addresses.extend(frame.offsets.iter().map(|&offset| base + offset));
            match frame.values {
                SampleValues::Labels(local) => labels.extend(local),
                SampleValues::Targets(local) => targets.extend(local),
                SampleValues::None => {}
            }
            images.push(frame.image);
        }
        report.loaded = images.len();

        let values = match config.mode {
            TrainingMode::Classification => SampleValues::Labels(labels),
            TrainingMode::Regression { .. } => SampleValues::Targets(targets),
        };

        let addressing = if low_memory {
            SampleAddressing::Implicit
        } else {
            SampleAddressing::Explicit(addresses)
        };

        let collection = Self {
            images,
            image_size: config.image_size,
            dimension: config.dimension(),
            addressing,
            values,
            bin_table: Some(table),
            depth_units: Some(config.depth_units),
            report,
        };

        info!(
            requested = report.requested,
            loaded = report.loaded,
            failed_loads = report.failed_loads,
            background_skips = report.background_skips,
            samples = collection.count(),
            low_memory,
            "sample collection built"
        );

        Ok(collection)
    }

    /// Build an inference collection over one intensity frame.
    ///
    /// With `include_zero` every pixel is a sample in raster order; otherwise
    /// only pixels that are nonzero after optional preprocessing are kept.
    /// The feature dimension is 1.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::ImageSizeMismatch`] if `frame` is not `size`.
    pub fn from_frame(
        frame: Frame<u8>,
        size: ImageSize,
        include_zero: bool,
        preprocessor: Option<&dyn IntensityPreprocessor>,
    ) -> Result<Self, SampleError> {
        if frame.size() != size {
            return Err(SampleError::ImageSizeMismatch {
                path: Default::default(),
                expected: size,
                found: frame.size(),
            });
        }

        let image = match preprocessor {
            Some(p) => p.preprocess(&frame),
            None => frame,
        };

        let addressing = if include_zero {
            SampleAddressing::Implicit
        } else {
            let kept: Vec<usize> = image
                .as_slice()
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v != 0)
                .map(|(offset, _)| offset)
                .collect();
            SampleAddressing::Explicit(kept)
        };

        let collection = Self {
            images: vec![image],
            image_size: size,
            dimension: 1,
            addressing,
            values: SampleValues::None,
            bin_table: None,
            depth_units: None,
            report: LoadReport {
                requested: 1,
                loaded: 1,
                ..LoadReport::default()
            },
        };
        debug!(samples = collection.count(), include_zero, "single-frame collection built");
        Ok(collection)
    }

    /// Build an inference collection from a decoded frame of unknown format.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::UnexpectedPixelFormat`] if `raw` is not 8-bit
    /// gray, otherwise as [`DataPointCollection::from_frame`].
    pub fn from_raw_frame(
        raw: RawFrame,
        size: ImageSize,
        include_zero: bool,
        preprocessor: Option<&dyn IntensityPreprocessor>,
    ) -> Result<Self, SampleError> {
        match raw {
            RawFrame::Gray8(frame) => Self::from_frame(frame, size, include_zero, preprocessor),
            other => Err(SampleError::UnexpectedPixelFormat {
                path: Default::default(),
                expected: PixelFormat::Gray8,
                found: other.format(),
            }),
        }
    }

    // --- Shape ---

    /// Number of samples.
    #[must_use]
    pub fn count(&self) -> usize {
        match &self.addressing {
            SampleAddressing::Explicit(addresses) => addresses.len(),
            SampleAddressing::Implicit => self.images.len() * self.image_size.step(),
        }
    }

    /// Return true if the collection holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Feature dimension the samples were prepared for.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Size shared by every image in the corpus.
    #[must_use]
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Pixels per image.
    #[must_use]
    pub fn step(&self) -> usize {
        self.image_size.step()
    }

    /// Whether sample addresses are implicit.
    #[must_use]
    pub fn low_memory(&self) -> bool {
        self.addressing == SampleAddressing::Implicit
    }

    /// Number of images in the corpus.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Borrow the preprocessed image corpus.
    #[must_use]
    pub fn images(&self) -> &[Frame<u8>] {
        &self.images
    }

    /// Borrow the addressing scheme.
    #[must_use]
    pub fn addressing(&self) -> &SampleAddressing {
        &self.addressing
    }

    /// Borrow the per-sample values.
    #[must_use]
    pub fn values(&self) -> &SampleValues {
        &self.values
    }

    /// Explicit sample addresses, if stored.
    #[must_use]
    pub fn indices(&self) -> Option<&[usize]> {
        match &self.addressing {
            SampleAddressing::Explicit(addresses) => Some(addresses),
            SampleAddressing::Implicit => None,
        }
    }

    /// Class labels, for classification collections.
    #[must_use]
    pub fn labels(&self) -> Option<&[u8]> {
        match &self.values {
            SampleValues::Labels(labels) => Some(labels),
            _ => None,
        }
    }

    /// Depth targets, for regression collections.
    #[must_use]
    pub fn targets(&self) -> Option<&[u16]> {
        match &self.values {
            SampleValues::Targets(targets) => Some(targets),
            _ => None,
        }
    }

    /// Depth bin table used to label the corpus, if any.
    #[must_use]
    pub fn bin_table(&self) -> Option<&DepthBinTable> {
        self.bin_table.as_ref()
    }

    /// Depth units of the source frames, if any.
    #[must_use]
    pub fn depth_units(&self) -> Option<DepthUnits> {
        self.depth_units
    }

    /// Number of distinct class labels the bin table can produce, including 0.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.bin_table
            .as_ref()
            .map_or(0, |table| usize::from(table.max_label()) + 1)
    }

    /// Load outcome counts.
    #[must_use]
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    // --- Per-sample access ---

    /// Label of sample `sample`, if labels are recorded.
    #[must_use]
    pub fn label(&self, sample: usize) -> Option<u8> {
        self.labels().and_then(|labels| labels.get(sample).copied())
    }

    /// Depth target of sample `sample`, if targets are recorded.
    #[must_use]
    pub fn target(&self, sample: usize) -> Option<u16> {
        self.targets().and_then(|targets| targets.get(sample).copied())
    }

    /// Flattened pixel address of sample `sample`.
    ///
    /// # Panics
    ///
    /// Panics if `sample >= self.count()` with explicit addressing.
    #[must_use]
    pub fn address(&self, sample: usize) -> usize {
        match &self.addressing {
            SampleAddressing::Explicit(addresses) => addresses[sample],
            SampleAddressing::Implicit => sample,
        }
    }

    /// Split the address of sample `sample` into image, row and column.
    ///
    /// # Panics
    ///
    /// As [`DataPointCollection::address`].
    #[must_use]
    pub fn position(&self, sample: usize) -> PixelPosition {
        let address = self.address(sample);
        let step = self.image_size.step();
        let within = address % step;
        PixelPosition {
            image: address / step,
            row: within / self.image_size.width,
            col: within % self.image_size.width,
        }
    }

    /// Intensity at sample `sample` displaced by `(dx, dy)`, or `None` if the
    /// displaced pixel leaves its image.
    #[must_use]
    pub fn try_intensity_at(&self, sample: usize, dx: i32, dy: i32) -> Option<u8> {
        if sample >= self.count() {
            return None;
        }
        let pos = self.position(sample);
        let row = pos.row.checked_add_signed(dy as isize)?;
        let col = pos.col.checked_add_signed(dx as isize)?;
        self.images.get(pos.image)?.try_get(row, col)
    }

    /// Intensity at sample `sample` displaced by `(dx, dy)`.
    ///
    /// # Panics
    ///
    /// Panics if the displaced pixel leaves its image. Use
    /// [`DataPointCollection::offset_in_bounds`] to check first.
    #[must_use]
    pub fn intensity_at(&self, sample: usize, dx: i32, dy: i32) -> u8 {
        match self.try_intensity_at(sample, dx, dy) {
            Some(value) => value,
            None => panic!("offset ({dx}, {dy}) from sample {sample} leaves the image"),
        }
    }

    /// Intensity of sample `sample` itself.
    ///
    /// # Panics
    ///
    /// As [`DataPointCollection::intensity_at`].
    #[must_use]
    pub fn intensity(&self, sample: usize) -> u8 {
        self.intensity_at(sample, 0, 0)
    }

    /// Whether every offset within `radius` of sample `sample` stays inside its image.
    #[must_use]
    pub fn offset_in_bounds(&self, sample: usize, radius: usize) -> bool {
        if sample >= self.count() {
            return false;
        }
        let pos = self.position(sample);
        pos.row >= radius
            && pos.col >= radius
            && pos.row + radius < self.image_size.height
            && pos.col + radius < self.image_size.width
    }

    /// Check the length invariant between addresses and values.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match (&self.addressing, self.values.len()) {
            (SampleAddressing::Explicit(addresses), Some(n)) => addresses.len() == n,
            (SampleAddressing::Implicit, Some(n)) => n == self.count(),
            (_, None) => true,
        }
    }
}
