use bevy::prelude::*;

use super::config::CentrifugalConfig;

/// One hold gesture's worth of orbit state. The anchor is placed once when
/// the hold engages and never moves until release.
#[derive(Clone, Copy, Debug)]
pub struct CentrifugalGesture {
    pub anchor: Vec3,
    pub force: Vec3,
}

/// Outward pseudo-force used to steer while a wheel is held. The anchor
/// placement and force scale are tuning policy, not derived physics.
#[derive(Clone, Debug)]
pub struct CentrifugalModel {
    config: CentrifugalConfig,
    gesture: Option<CentrifugalGesture>,
}

impl CentrifugalModel {
    pub fn new(config: CentrifugalConfig) -> Self {
        Self {
            config,
            gesture: None,
        }
    }

    /// Engages, refreshes or releases the gesture for this tick. The anchor
    /// sits out to the side of the chassis, offset by current speed; a left
    /// hold orbits one way, a right hold the other.
    pub fn update(
        &mut self,
        left_held: bool,
        right_held: bool,
        position: Vec3,
        velocity: Vec3,
        forward: Vec3,
        up: Vec3,
    ) {
        if !left_held && !right_held {
            self.release();
            return;
        }

        if self.gesture.is_none() {
            let side = if left_held { 1.0 } else { -1.0 };
            let outward = forward.cross(up).normalize_or_zero() * side;
            let anchor =
                position + outward * (velocity.length() * self.config.anchor_distance_per_speed);
            self.gesture = Some(CentrifugalGesture {
                anchor,
                force: Vec3::ZERO,
            });
        }

        if let Some(gesture) = &mut self.gesture {
            gesture.force = (position - gesture.anchor) * self.config.force_scale;
        }
    }

    pub fn force(&self) -> Option<Vec3> {
        self.gesture.map(|gesture| gesture.force)
    }

    pub fn anchor(&self) -> Option<Vec3> {
        self.gesture.map(|gesture| gesture.anchor)
    }

    pub fn is_engaged(&self) -> bool {
        self.gesture.is_some()
    }

    /// Drops the gesture. Releasing with none present is a no-op.
    pub fn release(&mut self) {
        self.gesture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CentrifugalModel {
        CentrifugalModel::new(CentrifugalConfig::default())
    }

    #[test]
    fn anchor_created_once_per_gesture() {
        let mut model = model();
        let velocity = Vec3::NEG_Z * 8.0;

        model.update(true, false, Vec3::ZERO, velocity, Vec3::NEG_Z, Vec3::Y);
        let first = model.anchor().unwrap();

        // Chassis moves while held; anchor must stay put.
        model.update(true, false, Vec3::new(1.0, 0.0, -2.0), velocity, Vec3::NEG_Z, Vec3::Y);
        assert_eq!(model.anchor().unwrap(), first);
    }

    #[test]
    fn anchor_offset_scales_with_speed() {
        let mut model = model();
        let speed = 8.0;
        model.update(true, false, Vec3::ZERO, Vec3::NEG_Z * speed, Vec3::NEG_Z, Vec3::Y);

        let anchor = model.anchor().unwrap();
        let expected_distance = speed * CentrifugalConfig::default().anchor_distance_per_speed;
        assert!((anchor.length() - expected_distance).abs() < 1e-4);
    }

    #[test]
    fn left_and_right_holds_orbit_opposite_sides() {
        let mut left = model();
        let mut right = model();
        let velocity = Vec3::NEG_Z * 5.0;

        left.update(true, false, Vec3::ZERO, velocity, Vec3::NEG_Z, Vec3::Y);
        right.update(false, true, Vec3::ZERO, velocity, Vec3::NEG_Z, Vec3::Y);

        let left_anchor = left.anchor().unwrap();
        let right_anchor = right.anchor().unwrap();
        assert!((left_anchor + right_anchor).length() < 1e-4);
    }

    #[test]
    fn force_points_from_anchor_to_chassis() {
        let mut model = model();
        let position = Vec3::new(3.0, 0.0, 0.0);
        model.update(true, false, position, Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);

        // Zero speed puts the anchor at the chassis, so force starts zero.
        assert_eq!(model.force().unwrap(), Vec3::ZERO);

        let moved = position + Vec3::NEG_Z * 4.0;
        model.update(true, false, moved, Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let force = model.force().unwrap();
        let expected = (moved - model.anchor().unwrap()) * CentrifugalConfig::default().force_scale;
        assert_eq!(force, expected);
    }

    #[test]
    fn release_drops_the_gesture_and_is_idempotent() {
        let mut model = model();
        model.update(true, false, Vec3::ZERO, Vec3::NEG_Z * 8.0, Vec3::NEG_Z, Vec3::Y);
        assert!(model.is_engaged());

        model.update(false, false, Vec3::ZERO, Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        assert!(!model.is_engaged());
        assert_eq!(model.force(), None);

        // Releasing again with nothing engaged must not be an error.
        model.release();
        model.update(false, false, Vec3::ZERO, Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        assert!(!model.is_engaged());
    }
}
