use derive_more::{Deref, DerefMut};
use image::{GrayImage, Luma, Rgb, RgbImage};
use palette::{FromColor, Hsv, Srgb};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Value of a set mask pixel.
pub const MASK_SET: u8 = 255;

/// An 8-bit HSV color with hue in `[0, 180]` (degrees halved) and saturation and value
/// in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Hsv8 {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl Hsv8 {
    pub fn new(hue: u8, saturation: u8, value: u8) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Converts an 8-bit sRGB color.
    ///
    /// ```
    /// use image::Rgb;
    /// use laser_detect::Hsv8;
    /// assert_eq!(Hsv8::from_rgb(Rgb([255, 60, 60])), Hsv8::new(0, 195, 255));
    /// assert_eq!(Hsv8::from_rgb(Rgb([0, 0, 255])), Hsv8::new(120, 255, 255));
    /// assert_eq!(Hsv8::from_rgb(Rgb([40, 40, 40])), Hsv8::new(0, 0, 40));
    /// ```
    pub fn from_rgb(Rgb([r, g, b]): Rgb<u8>) -> Self {
        let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
        let to_u8 = |v: f32, scale: f32| (v * scale).round().clamp(0.0, 255.0) as u8;
        Self {
            hue: to_u8(hsv.hue.to_positive_degrees(), 0.5).min(180),
            saturation: to_u8(hsv.saturation, 255.0),
            value: to_u8(hsv.value, 255.0),
        }
    }
}

/// An inclusive box in [`Hsv8`] space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HsvBand {
    pub lower: Hsv8,
    pub upper: Hsv8,
}

impl HsvBand {
    pub fn new(lower: Hsv8, upper: Hsv8) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, color: Hsv8) -> bool {
        (self.lower.hue..=self.upper.hue).contains(&color.hue)
            && (self.lower.saturation..=self.upper.saturation).contains(&color.saturation)
            && (self.lower.value..=self.upper.value).contains(&color.value)
    }
}

/// A binary image where [`MASK_SET`] marks candidate marker pixels and 0 marks the rest.
#[derive(Debug, Clone, PartialEq, Deref, DerefMut)]
pub struct Mask(pub GrayImage);

impl Mask {
    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.0.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.pixels().all(|p| p[0] == 0)
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.0.width() && y < self.0.height() && self.0[(x, y)][0] != 0
    }
}

/// Selects pixels whose color falls inside any of its bands.
///
/// The default segmenter looks for bright, moderately saturated red. Red wraps around the hue
/// circle so it takes two bands.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RedSegmenter {
    pub bands: Vec<HsvBand>,
}

impl RedSegmenter {
    pub fn new(bands: Vec<HsvBand>) -> Self {
        Self { bands }
    }

    pub fn matches(&self, color: Rgb<u8>) -> bool {
        let hsv = Hsv8::from_rgb(color);
        self.bands.iter().any(|band| band.contains(hsv))
    }

    /// Produces a mask with the same extent as `image`.
    pub fn segment(&self, image: &RgbImage) -> Mask {
        Mask(GrayImage::from_fn(image.width(), image.height(), |x, y| {
            if self.matches(image[(x, y)]) {
                Luma([MASK_SET])
            } else {
                Luma([0])
            }
        }))
    }
}

impl Default for RedSegmenter {
    fn default() -> Self {
        Self::new(vec![
            HsvBand::new(Hsv8::new(0, 30, 220), Hsv8::new(10, 240, 255)),
            HsvBand::new(Hsv8::new(170, 30, 220), Hsv8::new(180, 240, 255)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands_accept_laser_colors() {
        let segmenter = RedSegmenter::default();
        assert!(segmenter.matches(Rgb([255, 60, 60])));
        // Hue just under 360 degrees lands in the upper band.
        assert!(segmenter.matches(Rgb([255, 60, 70])));
        assert!(segmenter.matches(Rgb([240, 120, 110])));
    }

    #[test]
    fn default_bands_reject_other_colors() {
        let segmenter = RedSegmenter::default();
        // Fully saturated red is above the saturation band.
        assert!(!segmenter.matches(Rgb([255, 0, 0])));
        // Too dark.
        assert!(!segmenter.matches(Rgb([200, 60, 60])));
        // White has no saturation.
        assert!(!segmenter.matches(Rgb([255, 255, 255])));
        // Orange and magenta fall between the bands.
        assert!(!segmenter.matches(Rgb([255, 160, 60])));
        assert!(!segmenter.matches(Rgb([255, 60, 200])));
        assert!(!segmenter.matches(Rgb([60, 255, 60])));
    }

    #[test]
    fn mask_marks_only_matching_pixels() {
        let mut image = RgbImage::from_pixel(4, 3, Rgb([40, 40, 40]));
        image[(1, 2)] = Rgb([255, 60, 60]);
        image[(3, 0)] = Rgb([250, 80, 90]);
        let mask = RedSegmenter::default().segment(&image);
        assert_eq!(mask.dimensions(), (4, 3));
        assert_eq!(mask.count(), 2);
        assert!(mask.is_set(1, 2));
        assert!(mask.is_set(3, 0));
        assert!(!mask.is_set(0, 0));
        assert!(!mask.is_set(9, 9));
        assert_eq!(mask[(1, 2)][0], MASK_SET);
    }

    #[test]
    fn empty_image_gives_empty_mask() {
        let mask = RedSegmenter::default().segment(&RgbImage::new(0, 0));
        assert!(mask.is_empty());
        assert_eq!(mask.count(), 0);
    }
}
