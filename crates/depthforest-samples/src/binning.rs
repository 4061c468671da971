//! Depth-to-class discretization through a precomputed lookup table.

use std::cmp::Reverse;

use tracing::debug;

use crate::error::SampleError;
use crate::frame::Frame;

/// Label reserved for invalid or background depth readings.
pub const INVALID_LABEL: u8 = 0;

/// Largest depth a raw-unit sensor frame is binned up to.
pub const RAW_MAX_DEPTH: u16 = 65_000;

/// Unit in which depth frames store their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DepthUnits {
    /// Raw sensor units; binned over `[0, 65000]`.
    Raw,
    /// Millimetres; binned over `[0, max_range]`.
    Millimeters {
        /// Farthest depth (mm) that receives a non-zero label.
        max_range: u16,
    },
}

impl DepthUnits {
    /// Return the maximum depth covered by the bin table.
    #[must_use]
    pub fn max_depth(self) -> u16 {
        match self {
            DepthUnits::Raw => RAW_MAX_DEPTH,
            DepthUnits::Millimeters { max_range } => max_range,
        }
    }
}

/// Lookup table mapping a depth value to a class label.
///
/// Depths at or beyond the table length map to [`INVALID_LABEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthBinTable(Vec<u8>);

impl DepthBinTable {
    /// Wrap a table where `labels[depth]` is the class of `depth`.
    #[must_use]
    pub fn new(labels: Vec<u8>) -> Self {
        Self(labels)
    }

    /// Return the label for one depth value.
    #[must_use]
    pub fn label(&self, depth: u16) -> u8 {
        self.0.get(usize::from(depth)).copied().unwrap_or(INVALID_LABEL)
    }

    /// Number of depth values covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the table covers no depth values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest label present in the table.
    #[must_use]
    pub fn max_label(&self) -> u8 {
        self.0.iter().copied().max().unwrap_or(INVALID_LABEL)
    }

    /// Borrow the raw table.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Produces depth bin tables.
///
/// Implementations must return a table of length at least `max_depth + 1`
/// and keep label 0 for invalid readings.
pub trait BinTableGenerator: Send + Sync {
    /// Build a table with `bins` classes over `[0, max_depth]`.
    ///
    /// # Errors
    ///
    /// Implementations return a [`SampleError`] for unusable parameters.
    fn generate(
        &self,
        invert: bool,
        bins: usize,
        max_depth: u16,
    ) -> Result<DepthBinTable, SampleError>;
}

/// Equal-width depth bins.
///
/// Depth 0 is invalid. Depths `1..=max_depth` are split into `bins` ranges
/// labelled `1..=bins` from near to far; `invert` reverses the order so the
/// farthest range gets label 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformBins;

impl BinTableGenerator for UniformBins {
    fn generate(
        &self,
        invert: bool,
        bins: usize,
        max_depth: u16,
    ) -> Result<DepthBinTable, SampleError> {
        if bins == 0 || bins > usize::from(u8::MAX) {
            return Err(SampleError::InvalidBinCount { bins });
        }
        if max_depth == 0 {
            return Err(SampleError::InvalidMaxDepth { max_depth });
        }

        let max = u64::from(max_depth);
        let n_bins = bins as u64;
        let mut labels = Vec::with_capacity(usize::from(max_depth) + 1);
        labels.push(INVALID_LABEL);
        for depth in 1..=max {
            // bin in [0, bins)
            let bin = (depth - 1) * n_bins / max;
            let label = if invert { n_bins - bin } else { bin + 1 };
            labels.push(label as u8);
        }

        debug!(bins, max_depth, invert, "generated depth bin table");
        Ok(DepthBinTable(labels))
    }
}

/// Map every pixel of a depth frame to its class label.
#[must_use]
pub fn bin_depth(depth: &Frame<u16>, table: &DepthBinTable) -> Frame<u8> {
    depth.map(|d| table.label(d))
}

/// Count how many entries carry each label.
#[must_use]
pub fn label_histogram(labels: &[u8]) -> [usize; 256] {
    let mut counts = [0usize; 256];
    for &label in labels {
        counts[usize::from(label)] += 1;
    }
    counts
}

/// Return the most populous label of a label frame. Ties go to the lowest label.
#[must_use]
pub fn tallest_bin(labels: &Frame<u8>) -> u8 {
    let counts = label_histogram(labels.as_slice());
    (0..=u8::MAX)
        .max_by_key(|&label| (counts[usize::from(label)], Reverse(label)))
        .unwrap_or(INVALID_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ImageSize;

    fn sparse_table() -> DepthBinTable {
        let mut labels = vec![0u8; 1000];
        labels[0] = 1;
        labels[10] = 1;
        labels[20] = 2;
        labels[999] = 0;
        DepthBinTable::new(labels)
    }

    #[test]
    fn synthetic_frame_matches_table_lookups() {
        let values = [0u16, 10, 20, 999];
        let depth = Frame::from_fn(ImageSize::new(4, 4), |r, c| values[(r + c) % 4]);
        let table = sparse_table();
        let labels = bin_depth(&depth, &table);
        for r in 0..4 {
            for c in 0..4 {
                let expected = match depth.get(r, c) {
                    0 | 10 => 1,
                    20 => 2,
                    _ => 0,
                };
                assert_eq!(labels.get(r, c), expected, "pixel ({r}, {c})");
            }
        }
    }

    #[test]
    fn depth_beyond_table_is_invalid() {
        let table = sparse_table();
        assert_eq!(table.label(1000), INVALID_LABEL);
        assert_eq!(table.label(u16::MAX), INVALID_LABEL);
        let depth = Frame::filled(ImageSize::new(2, 2), 4000u16);
        let labels = bin_depth(&depth, &table);
        assert!(labels.as_slice().iter().all(|&l| l == INVALID_LABEL));
    }

    #[test]
    fn label_matches_lookup_for_every_depth() {
        let table = UniformBins.generate(false, 7, 300).unwrap();
        let depth = Frame::from_fn(ImageSize::new(40, 10), |r, c| (r * 40 + c) as u16);
        let labels = bin_depth(&depth, &table);
        for (&d, &l) in depth.as_slice().iter().zip(labels.as_slice()) {
            let expected = if usize::from(d) < table.len() {
                table.as_slice()[usize::from(d)]
            } else {
                0
            };
            assert_eq!(l, expected);
        }
    }

    #[test]
    fn uniform_bins_cover_range() {
        let table = UniformBins.generate(false, 4, 100).unwrap();
        assert_eq!(table.len(), 101);
        assert_eq!(table.label(0), 0);
        assert_eq!(table.label(1), 1);
        assert_eq!(table.label(25), 1);
        assert_eq!(table.label(26), 2);
        assert_eq!(table.label(100), 4);
        assert_eq!(table.max_label(), 4);
    }

    #[test]
    fn inverted_bins_put_far_range_at_one() {
        let table = UniformBins.generate(true, 4, 100).unwrap();
        assert_eq!(table.label(0), 0);
        assert_eq!(table.label(1), 4);
        assert_eq!(table.label(100), 1);
    }

    #[test]
    fn uniform_bins_reject_bad_parameters() {
        assert!(matches!(
            UniformBins.generate(false, 0, 100),
            Err(SampleError::InvalidBinCount { bins: 0 })
        ));
        assert!(matches!(
            UniformBins.generate(false, 256, 100),
            Err(SampleError::InvalidBinCount { bins: 256 })
        ));
        assert!(matches!(
            UniformBins.generate(false, 4, 0),
            Err(SampleError::InvalidMaxDepth { max_depth: 0 })
        ));
    }

    #[test]
    fn raw_units_bin_to_65000() {
        assert_eq!(DepthUnits::Raw.max_depth(), 65_000);
        assert_eq!(DepthUnits::Millimeters { max_range: 1500 }.max_depth(), 1500);
    }

    #[test]
    fn tallest_bin_prefers_lowest_on_tie() {
        let labels = Frame::from_vec(ImageSize::new(4, 1), vec![3, 2, 3, 2]).unwrap();
        assert_eq!(tallest_bin(&labels), 2);
        let labels = Frame::from_vec(ImageSize::new(4, 1), vec![1, 1, 1, 2]).unwrap();
        assert_eq!(tallest_bin(&labels), 1);
        assert_eq!(label_histogram(labels.as_slice())[1], 3);
    }

    #[test]
    fn histogram_counts_flat_label_vectors() {
        let counts = label_histogram(&[0, 2, 2, 255, 2]);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[2], 3);
        assert_eq!(counts[255], 1);
        assert_eq!(counts.iter().sum::<usize>(), 5);
    }
}
