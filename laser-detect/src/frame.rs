use crate::Roi;
use image::{Rgb, RgbImage};
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Bytes per pixel of every supported layout.
pub const CHANNELS: usize = 4;

/// Channel order of a 4-channel 8-bit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum PixelLayout {
    /// Blue, green, red, alpha. This is what the headset camera stream delivers.
    Bgra8,
    /// Red, green, blue, alpha.
    Rgba8,
}

impl PixelLayout {
    fn rgb(self, px: &[u8]) -> Rgb<u8> {
        match self {
            PixelLayout::Bgra8 => Rgb([px[2], px[1], px[0]]),
            PixelLayout::Rgba8 => Rgb([px[0], px[1], px[2]]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has zero size ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("frame dimensions {width}x{height} overflow the address space")]
    TooLarge { width: u32, height: u32 },
}

/// A borrowed view over one camera frame.
///
/// The buffer is owned by the frame source and is only read for the duration of one detection.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    layout: PixelLayout,
}

impl<'a> Frame<'a> {
    /// Wraps a pixel buffer, checking that it holds exactly `4 * width * height` bytes.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        layout: PixelLayout,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or(FrameError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(FrameError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn as_raw(&self) -> &'a [u8] {
        self.data
    }

    /// Copies the region into a 3-channel RGB image, dropping alpha.
    ///
    /// The region is clipped to the frame.
    pub fn crop_rgb(&self, roi: &Roi) -> RgbImage {
        let x0 = roi.x.min(self.width);
        let y0 = roi.y.min(self.height);
        let width = roi.width.min(self.width - x0);
        let height = roi.height.min(self.height - y0);
        let stride = self.width as usize * CHANNELS;
        RgbImage::from_fn(width, height, |x, y| {
            let start = (y0 + y) as usize * stride + (x0 + x) as usize * CHANNELS;
            self.layout.rgb(&self.data[start..start + CHANNELS])
        })
    }
}
