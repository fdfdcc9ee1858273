use image::{DynamicImage, Rgba};
use imageproc::{drawing, rect::Rect};
use laser_core::{convert::MATRIX_LEN, Pixel};
use laser_detect::Roi;
use std::str::FromStr;
use thiserror::Error;

/// Draws the searched region and, if found, a cross on the marker.
pub fn render_detection(image: &DynamicImage, roi: Roi, marker: Option<Pixel>) -> DynamicImage {
    let mut image = drawing::Blend(image.to_rgba8());
    if !roi.is_empty() {
        drawing::draw_hollow_rect_mut(
            &mut image,
            Rect::at(roi.x as i32, roi.y as i32).of_size(roi.width, roi.height),
            Rgba([255, 255, 0, 160]),
        );
    }
    if let Some(Pixel { x, y }) = marker {
        drawing::draw_cross_mut(&mut image, Rgba([0, 255, 255, 255]), x as i32, y as i32);
    }
    DynamicImage::ImageRgba8(image.0)
}

/// The image as an RGBA buffer with its width and height.
pub fn rgba_buffer(image: &DynamicImage) -> (Vec<u8>, u32, u32) {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    (rgba.into_raw(), width, height)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixArgError {
    #[error("expected 16 values, got {0}")]
    WrongLength(usize),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

/// A 4x4 matrix given on the command line as 16 row-major values separated by commas or spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMajor(pub Vec<f32>);

impl FromStr for RowMajor {
    type Err = MatrixArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<f32>()
                    .map_err(|_| MatrixArgError::InvalidNumber(part.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() != MATRIX_LEN {
            return Err(MatrixArgError::WrongLength(values.len()));
        }
        Ok(Self(values))
    }
}
