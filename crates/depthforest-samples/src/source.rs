//! Frame pair naming and decoding.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::LoadError;
use crate::frame::{Frame, ImageSize, RawFrame};

/// Suffix of every depth frame file.
pub const DEPTH_SUFFIX: &str = "depth.png";

/// Device that captured the intensity frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InputDevice {
    /// Infrared sensor; intensity files end in `ir.png`.
    Infrared,
    /// Colour camera converted to gray; intensity files end in `cam.png`.
    Webcam,
}

impl InputDevice {
    /// File-name suffix of this device's intensity frames.
    #[must_use]
    pub fn intensity_suffix(self) -> &'static str {
        match self {
            InputDevice::Infrared => "ir.png",
            InputDevice::Webcam => "cam.png",
        }
    }
}

/// Resolves image ordinals to `{directory}/{prefix}{index}{suffix}` paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNaming {
    directory: PathBuf,
    prefix: String,
    device: InputDevice,
}

impl FrameNaming {
    /// Create a naming scheme rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>, device: InputDevice) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            device,
        }
    }

    /// Return the directory holding the frames.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Return the file-name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Return the intensity device.
    #[must_use]
    pub fn device(&self) -> InputDevice {
        self.device
    }

    /// Path of the intensity frame for `index`.
    #[must_use]
    pub fn intensity_path(&self, index: usize) -> PathBuf {
        self.path_with_suffix(index, self.device.intensity_suffix())
    }

    /// Path of the depth frame for `index`.
    #[must_use]
    pub fn depth_path(&self, index: usize) -> PathBuf {
        self.path_with_suffix(index, DEPTH_SUFFIX)
    }

    fn path_with_suffix(&self, index: usize, suffix: &str) -> PathBuf {
        self.directory.join(format!("{}{index}{suffix}", self.prefix))
    }
}

/// Decodes frames by path, preserving their native pixel format.
pub trait ImageSource: Send + Sync {
    /// Decode the frame stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the frame is missing or unreadable.
    fn load(&self, path: &Path) -> Result<RawFrame, LoadError>;
}

/// Decodes PNG (and any other format the `image` crate recognizes) from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngImageSource;

impl ImageSource for PngImageSource {
    fn load(&self, path: &Path) -> Result<RawFrame, LoadError> {
        let decoded = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(e) if e.kind() == ErrorKind::NotFound => {
                LoadError::Missing {
                    path: path.to_path_buf(),
                }
            }
            source => LoadError::Decode {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let size = ImageSize::new(decoded.width() as usize, decoded.height() as usize);
        Ok(match decoded {
            DynamicImage::ImageLuma8(buf) => RawFrame::Gray8(Frame::new_unchecked(size, buf.into_raw())),
            DynamicImage::ImageLuma16(buf) => {
                RawFrame::Gray16(Frame::new_unchecked(size, buf.into_raw()))
            }
            other => RawFrame::Other {
                format: format!("{:?}", other.color()),
                size,
            },
        })
    }
}

/// Serves already-decoded frames keyed by path.
///
/// Useful when frames come from a live capture rather than disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    frames: HashMap<PathBuf, RawFrame>,
}

impl MemoryImageSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `frame` under `path`, replacing any previous frame.
    pub fn insert(&mut self, path: impl Into<PathBuf>, frame: RawFrame) {
        self.frames.insert(path.into(), frame);
    }

    /// Register an intensity/depth pair for `index` under `naming`.
    pub fn insert_pair(
        &mut self,
        naming: &FrameNaming,
        index: usize,
        intensity: Frame<u8>,
        depth: Frame<u16>,
    ) {
        self.insert(naming.intensity_path(index), RawFrame::Gray8(intensity));
        self.insert(naming.depth_path(index), RawFrame::Gray16(depth));
    }

    /// Number of frames registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return true if no frames are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, path: &Path) -> Result<RawFrame, LoadError> {
        self.frames
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::Missing {
                path: path.to_path_buf(),
            })
    }
}
