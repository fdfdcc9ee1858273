#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle of a frame in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }
}

/// The fraction of the frame width and height searched for the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DetectionArea {
    pub width: f64,
    pub height: f64,
}

impl DetectionArea {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both fractions are finite and in `(0, 1]`.
    pub fn is_valid(&self) -> bool {
        let valid = |f: f64| f.is_finite() && f > 0.0 && f <= 1.0;
        valid(self.width) && valid(self.height)
    }
}

impl Default for DetectionArea {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Rounds `extent * fraction` to an even pixel count no larger than `extent`.
///
/// Halfway cases round to even, so `7 * 0.5 / 2 = 1.75` gives 4 and `10 * 0.5 / 2 = 2.5` gives 4.
fn even_extent(extent: u32, fraction: f64) -> u32 {
    let half = (f64::from(extent) * fraction / 2.0).round_ties_even();
    if !half.is_finite() || half <= 0.0 {
        return 0;
    }
    let full = half * 2.0;
    if full >= f64::from(extent) {
        extent
    } else {
        full as u32
    }
}

/// The centered region of a `width` by `height` frame covering `area`.
///
/// ```
/// use laser_detect::{centered_roi, DetectionArea, Roi};
/// let roi = centered_roi(1280, 720, DetectionArea::new(0.5, 0.5));
/// assert_eq!(roi, Roi::new(320, 180, 640, 360));
/// ```
pub fn centered_roi(width: u32, height: u32, area: DetectionArea) -> Roi {
    let roi_width = even_extent(width, area.width);
    let roi_height = even_extent(height, area.height);
    Roi {
        x: (width - roi_width) / 2,
        y: (height - roi_height) / 2,
        width: roi_width,
        height: roi_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn roi_is_even_centered_and_in_bounds(width: u16, height: u16, fx: u8, fy: u8) -> TestResult {
        if fx == 0 || fy == 0 {
            return TestResult::discard();
        }
        let (width, height) = (u32::from(width), u32::from(height));
        let area = DetectionArea::new(f64::from(fx) / 255.0, f64::from(fy) / 255.0);
        let roi = centered_roi(width, height, area);
        let even_or_full = |extent: u32, full: u32| extent % 2 == 0 || extent == full;
        let left = roi.x;
        let right = width - roi.x - roi.width;
        let top = roi.y;
        let bottom = height - roi.y - roi.height;
        TestResult::from_bool(
            roi.x + roi.width <= width
                && roi.y + roi.height <= height
                && even_or_full(roi.width, width)
                && even_or_full(roi.height, height)
                && left.abs_diff(right) <= 1
                && top.abs_diff(bottom) <= 1,
        )
    }

    #[test]
    fn halfway_rounds_to_even() {
        assert_eq!(even_extent(10, 0.5), 4);
        assert_eq!(even_extent(14, 0.5), 8);
        assert_eq!(even_extent(7, 0.5), 4);
    }

    #[test]
    fn full_area_is_clamped_to_frame() {
        // 5 / 2 = 2.5 rounds down to 2, 3 / 2 = 1.5 rounds up to 2 and is clamped.
        assert_eq!(
            centered_roi(5, 3, DetectionArea::new(1.0, 1.0)),
            Roi::new(0, 0, 4, 3)
        );
    }

    #[test]
    fn tiny_frames_degenerate_to_empty() {
        let roi = centered_roi(1, 1, DetectionArea::default());
        assert!(roi.is_empty());
        assert_eq!(roi, Roi::new(0, 0, 0, 0));
    }

    #[test]
    fn default_area_is_half() {
        assert!(DetectionArea::default().is_valid());
        assert!(!DetectionArea::new(0.0, 0.5).is_valid());
        assert!(!DetectionArea::new(0.5, 1.5).is_valid());
        assert!(!DetectionArea::new(f64::NAN, 0.5).is_valid());
    }
}
