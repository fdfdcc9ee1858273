//! Finds a laser pointer dot in a camera frame.
//!
//! Detection runs in three stages:
//!
//! 1. A centered region of interest is cropped out of the frame ([`centered_roi`]).
//! 2. Pixels whose color is bright, moderately saturated red are marked in a [`Mask`]
//!    ([`RedSegmenter`]).
//! 3. A [`PointScorer`] picks the most marker-like masked pixel.
//!
//! The result is expressed in full frame pixel coordinates.

mod frame;
pub mod image;
mod roi;
mod scorer;
mod segmentation;

pub use frame::*;
pub use roi::*;
pub use scorer::*;
pub use segmentation::*;

use crate::image::{smooth_rgb, LARGE_FRAME_WIDTH};
use laser_core::Pixel;
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Which [`PointScorer`] picks the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "lowercase"))]
pub enum Strategy {
    /// Red contrast against a box blur.
    Fast,
    /// Weighted Laplacians, with pre-smoothing on large frames.
    #[default]
    Accurate,
}

impl Strategy {
    pub fn scorer(self) -> &'static dyn PointScorer {
        match self {
            Strategy::Fast => &FastScorer,
            Strategy::Accurate => &AccurateScorer,
        }
    }

    /// Whether frames of this width are smoothed before segmentation.
    pub fn pre_smooths(self, frame_width: u32) -> bool {
        self == Strategy::Accurate && frame_width > LARGE_FRAME_WIDTH
    }
}

#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectorSettings {
    /// The fraction of the frame searched, centered.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub area: DetectionArea,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub strategy: Strategy,
}

/// Everything the detector computed for one frame.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub roi: Roi,
    pub mask: Mask,
    /// The marker in full frame coordinates.
    pub pixel: Option<Pixel>,
}

#[derive(Debug, Clone, Default)]
pub struct LaserDetector {
    settings: DetectorSettings,
    segmenter: RedSegmenter,
}

impl LaserDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            segmenter: RedSegmenter::default(),
        }
    }

    /// Replaces the default red bands.
    pub fn with_segmenter(self, segmenter: RedSegmenter) -> Self {
        Self { segmenter, ..self }
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// Finds the marker, if any reddish pixel exists in the region of interest.
    pub fn detect(&self, frame: &Frame<'_>) -> Option<Pixel> {
        self.analyze(frame).pixel
    }

    pub fn analyze(&self, frame: &Frame<'_>) -> Analysis {
        let roi = centered_roi(frame.width(), frame.height(), self.settings.area);
        trace!(
            "searching {}x{} at ({}, {}) of a {}x{} frame",
            roi.width,
            roi.height,
            roi.x,
            roi.y,
            frame.width(),
            frame.height()
        );
        let mut crop = frame.crop_rgb(&roi);
        if self.settings.strategy.pre_smooths(frame.width()) {
            trace!("smoothing crop of large frame");
            crop = smooth_rgb(&crop);
        }
        let mask = self.segmenter.segment(&crop);
        if mask.is_empty() {
            debug!("no marker candidates");
            return Analysis {
                roi,
                mask,
                pixel: None,
            };
        }
        debug!("{} marker candidates", mask.count());
        let pixel = self
            .settings
            .strategy
            .scorer()
            .score(&crop, &mask, frame.width())
            .map(|pixel| pixel.offset(roi.x, roi.y));
        trace!("marker at {:?}", pixel);
        Analysis { roi, mask, pixel }
    }
}
