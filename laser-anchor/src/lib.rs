//! Anchors a laser pointer dot seen by a headset camera in world space.
//!
//! [`LaserPointerTracker::process`] runs on the frame producer: it validates the frame and its
//! camera matrices, detects the marker and builds a world space ray through it. Casting that ray
//! into the [`Environment`] happens on the consumer side with [`MarkerRay::resolve`], usually
//! after passing the outcome through an [`outcome_queue`].
//!
//! ```
//! use laser_anchor::{EmptyEnvironment, FrameInput, LaserPointerTracker, TrackerSettings};
//! use laser_detect::PixelLayout;
//!
//! let (width, height) = (64, 48);
//! let mut data = vec![40u8; (width * height * 4) as usize];
//! // Paint a red dot at (30, 20) into the BGRA buffer.
//! let start = ((20 * width + 30) * 4) as usize;
//! data[start..start + 4].copy_from_slice(&[60, 60, 255, 255]);
//!
//! #[rustfmt::skip]
//! let pose = [
//!     1.0, 0.0, 0.0, 0.0,
//!     0.0, 1.0, 0.0, 1.6,
//!     0.0, 0.0, 1.0, 0.0,
//!     0.0, 0.0, 0.0, 1.0,
//! ];
//! #[rustfmt::skip]
//! let projection = [
//!     2.0, 0.0,  0.0, 0.0,
//!     0.0, 2.0,  0.0, 0.0,
//!     0.0, 0.0, -1.0, 0.0,
//!     0.0, 0.0, -1.0, 0.0,
//! ];
//! let input = FrameInput::new(&data, width, height, PixelLayout::Bgra8, &pose)
//!     .projection(&projection);
//!
//! let mut tracker = LaserPointerTracker::new(TrackerSettings::default()).unwrap();
//! let resolved = tracker.process_and_resolve(&input, &EmptyEnvironment);
//! let anchor = resolved.anchor.unwrap();
//! assert!(!anchor.hit);
//! assert_eq!(anchor.distance, 5.0);
//! ```

mod environment;
mod error;
mod fps;
pub mod queue;
mod settings;

pub use environment::*;
pub use error::*;
pub use fps::*;
pub use queue::{outcome_queue, OutcomeReceiver, OutcomeSender, PushError};
pub use settings::*;

use laser_core::nalgebra::Point3;
use laser_core::{convert, CameraModel, CameraToWorld, Pixel, WorldRay};
use laser_detect::{Frame, LaserDetector, PixelLayout};
use laser_pinhole::{Intrinsics, ProjectionCamera};
use log::*;
use std::time::{Duration, Instant};

/// One camera frame together with the camera state it was captured with.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    /// Camera-to-world transform, 16 row-major values.
    pub pose: &'a [f32],
    /// Projection matrix, 16 row-major values.
    pub projection: Option<&'a [f32]>,
    /// Takes precedence over the projection matrix when present.
    pub intrinsics: Option<Intrinsics>,
}

impl<'a> FrameInput<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        layout: PixelLayout,
        pose: &'a [f32],
    ) -> Self {
        Self {
            data,
            width,
            height,
            layout,
            pose,
            projection: None,
            intrinsics: None,
        }
    }

    pub fn projection(self, projection: &'a [f32]) -> Self {
        Self {
            projection: Some(projection),
            ..self
        }
    }

    pub fn intrinsics(self, intrinsics: impl Into<Intrinsics>) -> Self {
        Self {
            intrinsics: Some(intrinsics.into()),
            ..self
        }
    }
}

/// What the tracker made of one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The frame or its camera state was unusable.
    Skipped(SkipReason),
    /// No reddish pixel in the region of interest.
    NotFound,
    Found(MarkerRay),
}

impl FrameOutcome {
    pub fn marker(&self) -> Option<&MarkerRay> {
        match self {
            FrameOutcome::Found(marker) => Some(marker),
            _ => None,
        }
    }
}

/// A detected marker and the world space ray through it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerRay {
    pub pixel: Pixel,
    pub ray: WorldRay,
}

impl MarkerRay {
    /// Casts the ray into `environment`, falling back to a fixed distance when nothing is hit.
    pub fn resolve<E>(&self, environment: &E, settings: &RaycastSettings) -> Anchor
    where
        E: Environment + ?Sized,
    {
        let landing = cast_or_fallback(environment, &self.ray, settings);
        Anchor {
            pixel: self.pixel,
            point: landing.point,
            hit: landing.hit,
            distance: landing.distance,
        }
    }
}

/// The world position of the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pixel: Pixel,
    pub point: Point3<f64>,
    /// Whether a surface was hit, as opposed to falling back.
    pub hit: bool,
    /// Distance from the camera.
    pub distance: f64,
}

impl Anchor {
    pub fn world_point(&self) -> [f32; 3] {
        [
            self.point.x as f32,
            self.point.y as f32,
            self.point.z as f32,
        ]
    }
}

/// A frame outcome with its anchor, when a marker was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub outcome: FrameOutcome,
    pub anchor: Option<Anchor>,
}

impl Resolved {
    pub fn new<E>(outcome: FrameOutcome, environment: &E, settings: &RaycastSettings) -> Self
    where
        E: Environment + ?Sized,
    {
        let anchor = outcome
            .marker()
            .map(|marker| marker.resolve(environment, settings));
        Self { outcome, anchor }
    }

    pub fn found(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Counters kept across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    pub frames: u64,
    pub skipped: u64,
    pub found: u64,
    pub last_duration: Duration,
    pub total_duration: Duration,
}

impl PipelineStats {
    pub fn mean_duration(&self) -> Duration {
        match u32::try_from(self.frames) {
            Ok(0) => Duration::ZERO,
            Ok(frames) => self.total_duration / frames,
            Err(_) => Duration::from_secs_f64(
                self.total_duration.as_secs_f64() / self.frames as f64,
            ),
        }
    }

    fn record(&mut self, outcome: &FrameOutcome, duration: Duration) {
        self.frames += 1;
        match outcome {
            FrameOutcome::Skipped(_) => self.skipped += 1,
            FrameOutcome::Found(_) => self.found += 1,
            FrameOutcome::NotFound => {}
        }
        self.last_duration = duration;
        self.total_duration += duration;
    }
}

/// How the marker pixel is turned into a camera ray for one frame.
enum Unprojector {
    Intrinsics(Intrinsics),
    Projection(ProjectionCamera),
}

#[derive(Debug, Clone)]
pub struct LaserPointerTracker {
    settings: TrackerSettings,
    detector: LaserDetector,
    stats: PipelineStats,
}

impl LaserPointerTracker {
    pub fn new(settings: TrackerSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            detector: LaserDetector::new(settings.detector_settings()),
            settings,
            stats: PipelineStats::default(),
        })
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Detects the marker in one frame and builds the world ray through it.
    pub fn process(&mut self, input: &FrameInput<'_>) -> FrameOutcome {
        let start = Instant::now();
        let outcome = match self.track(input) {
            Ok(Some(marker)) => FrameOutcome::Found(marker),
            Ok(None) => FrameOutcome::NotFound,
            Err(reason) => {
                warn!("skipping frame: {}", reason);
                FrameOutcome::Skipped(reason)
            }
        };
        self.stats.record(&outcome, start.elapsed());
        outcome
    }

    /// [`process`](Self::process) followed by [`MarkerRay::resolve`] with the tracker's raycast
    /// settings.
    pub fn process_and_resolve<E>(&mut self, input: &FrameInput<'_>, environment: &E) -> Resolved
    where
        E: Environment + ?Sized,
    {
        let outcome = self.process(input);
        Resolved::new(outcome, environment, &self.settings.raycast)
    }

    fn track(&self, input: &FrameInput<'_>) -> Result<Option<MarkerRay>, SkipReason> {
        let frame = Frame::new(input.data, input.width, input.height, input.layout)?;
        let pose = CameraToWorld::from_row_major(input.pose).map_err(SkipReason::Pose)?;
        let unprojector = self.unprojector(input)?;

        let pixel = match self.detector.detect(&frame) {
            Some(pixel) => pixel,
            None => return Ok(None),
        };

        let camera_ray = match &unprojector {
            Unprojector::Intrinsics(intrinsics) => {
                let offset = self.settings.unprojection_offset;
                intrinsics.unproject(pixel).shifted(offset.x, offset.y)
            }
            Unprojector::Projection(camera) => camera.unproject(pixel),
        };
        let ray = pose
            .world_ray(camera_ray)
            .map_err(SkipReason::DegenerateRay)?;
        debug!(
            "marker at {:?} cast from {:?} towards {:?}",
            pixel,
            ray.origin,
            ray.direction.as_ref()
        );
        Ok(Some(MarkerRay { pixel, ray }))
    }

    fn unprojector(&self, input: &FrameInput<'_>) -> Result<Unprojector, SkipReason> {
        let projection = input
            .projection
            .map(convert::matrix_from_row_major)
            .transpose()
            .map_err(SkipReason::ProjectionMatrix)?;
        if let Some(intrinsics) = input.intrinsics {
            intrinsics.validate()?;
            return Ok(Unprojector::Intrinsics(intrinsics));
        }
        let projection = projection.ok_or(SkipReason::MissingProjection)?;
        let camera = ProjectionCamera::from_matrix(&projection, input.width, input.height)?;
        Ok(Unprojector::Projection(camera))
    }
}
