use avian3d::prelude::*;
use bevy::prelude::*;

use super::config::ControllerConfig;

// Gap left between the chassis and the ground when snapping down.
const SNAP_SKIN: f32 = 0.005;

/// What the movement core is allowed to know about the body it steers.
/// The host motor implements this; the core never reaches past it.
pub trait Motor {
    fn is_stable_on_ground(&self) -> bool;
    fn ground_normal(&self) -> Vec3;
    fn up(&self) -> Vec3;
    fn forward(&self) -> Vec3;
    fn position(&self) -> Vec3;

    /// Reorients `direction` to lie in the plane of `normal`, keyed to the
    /// body's up axis. Unit length; callers rescale.
    fn direction_tangent_to_surface(&self, direction: Vec3, normal: Vec3) -> Vec3 {
        let right = direction.cross(self.up());
        normal.cross(right).normalize_or_zero()
    }
}

/// A surface contact reported back to the controller after the move commits.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceHit {
    pub entity: Entity,
    pub normal: Vec3,
    pub point: Vec3,
}

/// Mutable verdict on a contact. The controller may rewrite it in a future
/// extension; today it is passed through untouched.
#[derive(Clone, Copy, Debug)]
pub struct HitStabilityReport {
    pub is_stable: bool,
}

/// Host-side grounding state, refreshed by [`sense_ground`] every fixed tick.
#[derive(Component, Clone, Copy, Debug)]
pub struct GroundSensor {
    pub stable: bool,
    pub normal: Vec3,
    pub distance: Option<f32>,
    pub entity: Option<Entity>,
    pub point: Vec3,
}

impl Default for GroundSensor {
    fn default() -> Self {
        Self {
            stable: false,
            normal: Vec3::Y,
            distance: None,
            entity: None,
            point: Vec3::ZERO,
        }
    }
}

/// Immutable snapshot of the body handed to the controller for one tick.
#[derive(Clone, Copy, Debug)]
pub struct BodyMotor {
    pub stable: bool,
    pub normal: Vec3,
    pub rotation: Quat,
    pub position: Vec3,
}

impl BodyMotor {
    pub fn capture(sensor: &GroundSensor, transform: &Transform) -> Self {
        Self {
            stable: sensor.stable,
            normal: sensor.normal,
            rotation: transform.rotation,
            position: transform.translation,
        }
    }
}

impl Motor for BodyMotor {
    fn is_stable_on_ground(&self) -> bool {
        self.stable
    }

    fn ground_normal(&self) -> Vec3 {
        self.normal
    }

    fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

/// Shapecasts the chassis collider downward and records whether the hit
/// counts as stable ground (within the slope limit). While resting, the
/// chassis is kept snapped just above the surface.
pub fn sense_ground(
    spatial_query: SpatialQuery,
    config: Res<ControllerConfig>,
    player: Option<Single<(Entity, &mut Transform, &Collider, &LinearVelocity, &mut GroundSensor)>>,
) {
    let Some(player) = player else {
        return;
    };

    let (entity, mut transform, collider, velocity, mut sensor) = player.into_inner();
    let up = transform.rotation * Vec3::Y;

    let filter = SpatialQueryFilter::from_excluded_entities(vec![entity]);
    let shapecast = spatial_query.cast_shape(
        collider,
        transform.translation,
        transform.rotation,
        Dir3::NEG_Y,
        &ShapeCastConfig::from_max_distance(config.motion.ground_probe_distance),
        &filter,
    );
    let Some(hit) = shapecast else {
        sensor.stable = false;
        sensor.distance = None;
        sensor.entity = None;
        return;
    };

    sensor.distance = Some(hit.distance);
    sensor.entity = Some(hit.entity);
    sensor.point = hit.point1;
    sensor.normal = hit.normal1;

    let angle = hit.normal1.angle_between(up);
    sensor.stable = angle < config.motion.max_slope_degrees.to_radians();

    if sensor.stable && velocity.0.dot(up) <= 0.0 && hit.distance > SNAP_SKIN {
        transform.translation -= up * (hit.distance - SNAP_SKIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatGround;

    impl Motor for FlatGround {
        fn is_stable_on_ground(&self) -> bool {
            true
        }
        fn ground_normal(&self) -> Vec3 {
            Vec3::Y
        }
        fn up(&self) -> Vec3 {
            Vec3::Y
        }
        fn forward(&self) -> Vec3 {
            Vec3::NEG_Z
        }
        fn position(&self) -> Vec3 {
            Vec3::ZERO
        }
    }

    #[test]
    fn tangent_preserves_direction_on_flat_ground() {
        let motor = FlatGround;
        let tangent = motor.direction_tangent_to_surface(Vec3::new(0.0, 0.0, -3.0), Vec3::Y);
        assert!((tangent - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn tangent_follows_slope() {
        let motor = FlatGround;
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let tangent = motor.direction_tangent_to_surface(Vec3::NEG_Z, normal);
        assert!(tangent.length() > 0.99);
        assert!(tangent.dot(normal).abs() < 1e-5);
        // Still headed the same way.
        assert!(tangent.dot(Vec3::NEG_Z) > 0.0);
    }

    #[test]
    fn tangent_of_zero_direction_is_zero() {
        let motor = FlatGround;
        let tangent = motor.direction_tangent_to_surface(Vec3::ZERO, Vec3::Y);
        assert_eq!(tangent, Vec3::ZERO);
    }
}
