//! Single-channel raster frames and their decoded formats.

use std::fmt;

use crate::error::SampleError;

/// Width and height of every frame in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl ImageSize {
    /// Create a new image size.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels in one frame; the stride between consecutive images
    /// in a flattened pixel address.
    #[must_use]
    pub fn step(self) -> usize {
        self.width * self.height
    }

    /// Return true if either dimension is zero.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Native pixel layout of a decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single channel, 8 bits per pixel.
    Gray8,
    /// Single channel, 16 bits per pixel.
    Gray16,
    /// Anything else, described by the decoder.
    Other(String),
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Gray8 => write!(f, "8UC1"),
            PixelFormat::Gray16 => write!(f, "16UC1"),
            PixelFormat::Other(desc) => write!(f, "{desc}"),
        }
    }
}

/// Owned single-channel raster in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<T> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T: Copy> Frame<T> {
    /// Wrap a row-major pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::FrameDataLength`] if `data.len() != width * height`.
    pub fn from_vec(size: ImageSize, data: Vec<T>) -> Result<Self, SampleError> {
        if data.len() != size.step() {
            return Err(SampleError::FrameDataLength {
                size,
                expected: size.step(),
                got: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Wrap a buffer already known to hold `size.step()` pixels.
    pub(crate) fn new_unchecked(size: ImageSize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), size.step());
        Self { size, data }
    }

    /// Create a frame with every pixel set to `value`.
    #[must_use]
    pub fn filled(size: ImageSize, value: T) -> Self {
        Self {
            size,
            data: vec![value; size.step()],
        }
    }

    /// Create a frame by evaluating `f(row, col)` for every pixel.
    #[must_use]
    pub fn from_fn(size: ImageSize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(size.step());
        for row in 0..size.height {
            for col in 0..size.width {
                data.push(f(row, col));
            }
        }
        Self { size, data }
    }

    /// Return the frame size.
    #[must_use]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Return the pixel at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position lies outside the frame.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(
            row < self.size.height && col < self.size.width,
            "pixel ({row}, {col}) outside {} frame",
            self.size
        );
        self.data[row * self.size.width + col]
    }

    /// Return the pixel at `(row, col)`, or `None` outside the frame.
    #[must_use]
    pub fn try_get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.size.height && col < self.size.width {
            Some(self.data[row * self.size.width + col])
        } else {
            None
        }
    }

    /// Borrow the pixels in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Build a new frame of the same size by mapping every pixel.
    #[must_use]
    pub fn map<U: Copy>(&self, f: impl FnMut(T) -> U) -> Frame<U> {
        Frame {
            size: self.size,
            data: self.data.iter().copied().map(f).collect(),
        }
    }
}

/// A decoded frame that still carries its native format.
#[derive(Debug, Clone)]
pub enum RawFrame {
    /// 8-bit single-channel frame (intensity).
    Gray8(Frame<u8>),
    /// 16-bit single-channel frame (depth).
    Gray16(Frame<u16>),
    /// Frame in a layout this crate does not consume.
    Other {
        /// Decoder description of the layout.
        format: String,
        /// Frame size.
        size: ImageSize,
    },
}

impl RawFrame {
    /// Return the native pixel format.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        match self {
            RawFrame::Gray8(_) => PixelFormat::Gray8,
            RawFrame::Gray16(_) => PixelFormat::Gray16,
            RawFrame::Other { format, .. } => PixelFormat::Other(format.clone()),
        }
    }

    /// Return the frame size.
    #[must_use]
    pub fn size(&self) -> ImageSize {
        match self {
            RawFrame::Gray8(f) => f.size(),
            RawFrame::Gray16(f) => f.size(),
            RawFrame::Other { size, .. } => *size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_area() {
        assert_eq!(ImageSize::new(640, 480).step(), 307_200);
        assert!(ImageSize::new(0, 3).is_empty());
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        let result = Frame::from_vec(ImageSize::new(2, 2), vec![0u8; 3]);
        assert!(matches!(
            result,
            Err(SampleError::FrameDataLength {
                expected: 4,
                got: 3,
                ..
            })
        ));
    }

    #[test]
    fn from_fn_is_row_major() {
        let f = Frame::from_fn(ImageSize::new(3, 2), |r, c| (r * 10 + c) as u8);
        assert_eq!(f.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(f.get(1, 2), 12);
        assert_eq!(f.try_get(2, 0), None);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn get_panics_outside_frame() {
        let f = Frame::filled(ImageSize::new(2, 2), 0u8);
        let _ = f.get(0, 2);
    }

    #[test]
    fn raw_frame_reports_format() {
        let raw = RawFrame::Gray16(Frame::filled(ImageSize::new(4, 3), 7u16));
        assert_eq!(raw.format(), PixelFormat::Gray16);
        assert_eq!(raw.size(), ImageSize::new(4, 3));
        assert_eq!(PixelFormat::Gray8.to_string(), "8UC1");
    }
}
