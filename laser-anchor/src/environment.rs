use crate::RaycastSettings;
use laser_core::nalgebra::{Point3, Unit, Vector3};
use laser_core::WorldRay;
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A set of environment layers, one bit per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(transparent))]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Layer 31, where the headset places its spatial mesh.
    pub const SPATIAL_AWARENESS: LayerMask = LayerMask(1 << 31);
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    /// The mask containing only `layer`, which must be below 32.
    pub fn layer(layer: u8) -> Self {
        LayerMask(1u32.checked_shl(u32::from(layer)).unwrap_or(0))
    }

    pub fn contains(self, layer: u8) -> bool {
        self.0 & Self::layer(layer).0 != 0
    }
}

/// A surface hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub point: Point3<f64>,
    /// Distance from the ray origin.
    pub distance: f64,
}

/// The scene a marker ray is cast into.
///
/// The headset supplies its spatial mesh here. Implementations must only report hits in front of
/// the ray origin on layers in `mask`, and no further than `max_distance` when given.
pub trait Environment {
    fn raycast(&self, ray: &WorldRay, max_distance: Option<f64>, mask: LayerMask)
        -> Option<RaycastHit>;
}

impl<E> Environment for &E
where
    E: Environment + ?Sized,
{
    fn raycast(
        &self,
        ray: &WorldRay,
        max_distance: Option<f64>,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        (**self).raycast(ray, max_distance, mask)
    }
}

/// Nothing to hit. Every ray falls back to the fixed distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl Environment for EmptyEnvironment {
    fn raycast(&self, _: &WorldRay, _: Option<f64>, _: LayerMask) -> Option<RaycastHit> {
        None
    }
}

/// An infinite plane on one layer, such as a wall or floor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Plane {
    pub point: Point3<f64>,
    pub normal: Unit<Vector3<f64>>,
    pub layer: u8,
}

impl Plane {
    pub fn new(point: Point3<f64>, normal: Unit<Vector3<f64>>, layer: u8) -> Self {
        Self {
            point,
            normal,
            layer,
        }
    }

    /// Distance along `ray` to the plane, if the ray crosses it in front of the origin.
    pub fn intersect(&self, ray: &WorldRay) -> Option<f64> {
        let denominator = self.normal.dot(ray.direction.as_ref());
        if denominator.abs() < 1e-12 {
            return None;
        }
        let distance = self.normal.dot(&(self.point - ray.origin)) / denominator;
        (distance >= 0.0).then_some(distance)
    }
}

/// A collection of planes standing in for a spatial mesh.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PlaneEnvironment {
    pub planes: Vec<Plane>,
}

impl PlaneEnvironment {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }
}

impl Environment for PlaneEnvironment {
    fn raycast(
        &self,
        ray: &WorldRay,
        max_distance: Option<f64>,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        self.planes
            .iter()
            .filter(|plane| mask.contains(plane.layer))
            .filter_map(|plane| plane.intersect(ray))
            .filter(|&distance| max_distance.map_or(true, |max| distance <= max))
            .min_by(|a, b| a.total_cmp(b))
            .map(|distance| RaycastHit {
                point: ray.point_at(distance),
                distance,
            })
    }
}

/// Where a ray ends up, whether it hit a surface or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub point: Point3<f64>,
    pub distance: f64,
    pub hit: bool,
}

/// Casts `ray` into `environment`, placing the point `settings.fallback_distance` along the ray
/// when nothing is hit.
pub fn cast_or_fallback<E>(environment: &E, ray: &WorldRay, settings: &RaycastSettings) -> Landing
where
    E: Environment + ?Sized,
{
    match environment.raycast(ray, settings.max_distance, settings.layer_mask) {
        Some(hit) => {
            trace!("ray hit surface at {:.3}", hit.distance);
            Landing {
                point: hit.point,
                distance: hit.distance,
                hit: true,
            }
        }
        None => {
            trace!("ray hit nothing, falling back");
            Landing {
                point: ray.point_at(settings.fallback_distance),
                distance: settings.fallback_distance,
                hit: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn forward_ray() -> WorldRay {
        WorldRay {
            origin: Point3::new(0.0, 1.0, 0.0),
            direction: Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)),
        }
    }

    fn wall(z: f64, layer: u8) -> Plane {
        Plane::new(Point3::new(0.0, 0.0, z), Vector3::z_axis(), layer)
    }

    #[test]
    fn layer_masks() {
        assert!(LayerMask::SPATIAL_AWARENESS.contains(31));
        assert!(!LayerMask::SPATIAL_AWARENESS.contains(0));
        assert!(LayerMask::ALL.contains(7));
        assert!(!LayerMask::NONE.contains(7));
        assert!(!LayerMask::ALL.contains(40));
    }

    #[test]
    fn nearest_plane_on_layer_wins() {
        let environment = PlaneEnvironment::new(vec![wall(-4.0, 31), wall(-2.0, 3), wall(-3.0, 31)]);
        let hit = environment
            .raycast(&forward_ray(), None, LayerMask::SPATIAL_AWARENESS)
            .unwrap();
        assert_relative_eq!(hit.distance, 3.0);
        assert_relative_eq!(hit.point, Point3::new(0.0, 1.0, -3.0));

        let any = environment.raycast(&forward_ray(), None, LayerMask::ALL).unwrap();
        assert_relative_eq!(any.distance, 2.0);
    }

    #[test]
    fn planes_behind_or_beyond_range_are_missed() {
        let environment = PlaneEnvironment::new(vec![wall(2.0, 31), wall(-8.0, 31)]);
        assert!(environment
            .raycast(&forward_ray(), Some(6.0), LayerMask::SPATIAL_AWARENESS)
            .is_none());
        assert!(environment
            .raycast(&forward_ray(), None, LayerMask::SPATIAL_AWARENESS)
            .is_some());
    }

    #[test]
    fn parallel_planes_are_missed() {
        let floor = Plane::new(Point3::origin(), Vector3::y_axis(), 31);
        assert_eq!(floor.intersect(&forward_ray()), None);
    }

    #[test]
    fn fallback_is_fixed_distance_along_ray() {
        let settings = RaycastSettings::default();
        let landing = cast_or_fallback(&EmptyEnvironment, &forward_ray(), &settings);
        assert!(!landing.hit);
        assert_eq!(landing.point, Point3::new(0.0, 1.0, -5.0));
        assert_eq!(landing.distance, 5.0);
    }
}
