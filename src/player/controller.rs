use bevy::prelude::*;

use super::{
    centrifugal::CentrifugalModel,
    config::{ConfigError, ControlScheme, ControllerConfig},
    drift::DriftModel,
    input::{PlayerInputs, SteerInput},
    motor::{HitStabilityReport, Motor, SurfaceHit},
};

/// The three ways the chassis can be moving. Exactly one is active;
/// transitions happen only at the top of `set_inputs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LocomotionMode {
    #[default]
    Grounded,
    Drifting,
    Airborne,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TickPhase {
    AwaitingInputs,
    InputsSet,
    RotationDone,
}

/// The movement core. Converts one tick of steering input plus the motor's
/// grounding state into a new velocity and rotation for the host to commit.
///
/// The host must drive the tick in strict order, each phase exactly once:
/// `set_inputs` → `update_rotation` → `update_velocity`. Later phases read
/// vectors derived by the earlier ones.
#[derive(Component, Clone, Debug)]
pub struct CharacterController {
    config: ControllerConfig,
    mode: LocomotionMode,
    velocity: Vec3,
    move_input: Vec3,
    look_input: Vec3,
    steer: SteerInput,
    drift: DriftModel,
    centrifugal: CentrifugalModel,
    phase: TickPhase,
}

impl CharacterController {
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            drift: DriftModel::new(config.drift.clone()),
            centrifugal: CentrifugalModel::new(config.centrifugal.clone()),
            config,
            mode: LocomotionMode::default(),
            velocity: Vec3::ZERO,
            move_input: Vec3::ZERO,
            look_input: Vec3::ZERO,
            steer: SteerInput::default(),
            phase: TickPhase::AwaitingInputs,
        })
    }

    /// Phase 1: pick the locomotion mode for this tick and derive the move
    /// and look vectors from the fresh input sample. Nothing is carried over
    /// from the previous tick except momentum.
    pub fn set_inputs(&mut self, inputs: &PlayerInputs, motor: &impl Motor) {
        debug_assert_eq!(
            self.phase,
            TickPhase::AwaitingInputs,
            "set_inputs must open the tick"
        );

        let steer = self.admitted_steer(inputs.steer);
        self.steer = steer;

        // Airborne beats everything; drift beats plain grounded.
        let speed = self.velocity.length();
        let next = if !motor.is_stable_on_ground() {
            LocomotionMode::Airborne
        } else if self.drift.wants_drift(speed, &steer) {
            LocomotionMode::Drifting
        } else {
            LocomotionMode::Grounded
        };
        self.transition_to(next);

        let up = motor.up();
        let (move_input, look_input) = match steer {
            SteerInput::Stick { forward, right } => {
                self.derive_stick_input(forward, right, inputs.camera_rotation, up)
            }
            SteerInput::Wheels { left, right, .. } => {
                self.derive_wheel_input(left, right, motor, up)
            }
        };
        self.move_input = move_input;
        self.look_input = look_input;

        let (left_held, right_held) = match steer {
            SteerInput::Wheels {
                left_held,
                right_held,
                ..
            } => (left_held, right_held),
            SteerInput::Stick { .. } => (false, false),
        };
        if self.mode == LocomotionMode::Airborne {
            // A held wheel cannot orbit mid-air.
            self.centrifugal.release();
        } else {
            self.centrifugal.update(
                left_held,
                right_held,
                motor.position(),
                self.velocity,
                motor.forward(),
                up,
            );
        }

        self.phase = TickPhase::InputsSet;
    }

    /// Phase 2: smooth the facing direction toward the look vector (stick),
    /// or apply differential / drift-steer yaw (wheels).
    pub fn update_rotation(&mut self, current: Quat, motor: &impl Motor, dt: f32) -> Quat {
        debug_assert_eq!(
            self.phase,
            TickPhase::InputsSet,
            "update_rotation must follow set_inputs"
        );
        self.phase = TickPhase::RotationDone;

        let up = motor.up();
        match self.steer {
            SteerInput::Stick { .. } => {
                let sharpness =
                    self.config.motion.orientation_sharpness * self.drift.turn_multiplier();
                if self.look_input == Vec3::ZERO || sharpness <= 0.0 {
                    return current;
                }
                let (Ok(from), Ok(to)) = (Dir3::new(motor.forward()), Dir3::new(self.look_input))
                else {
                    return current;
                };
                let smoothed = from.slerp(to, 1.0 - (-sharpness * dt).exp());
                Transform::default().looking_to(smoothed, up).rotation
            }
            SteerInput::Wheels {
                left,
                right,
                left_held,
                right_held,
            } => {
                if !left_held && !right_held {
                    // Differential steering: the harder-driven wheel swings
                    // the chassis toward the other side.
                    let rate = self.config.motion.turn_speed_degrees.to_radians()
                        * self.drift.turn_multiplier();
                    let yaw = -(left - right) * rate * dt;
                    if yaw == 0.0 {
                        return current;
                    }
                    Quat::from_axis_angle(up, yaw) * current
                } else {
                    // Drift-steer: decay the heading toward the outward force.
                    let Some(force) = self.centrifugal.force() else {
                        return current;
                    };
                    let (Some(momentum), Some(outward)) =
                        (self.velocity.try_normalize(), force.try_normalize())
                    else {
                        return current;
                    };
                    let angle = signed_angle(momentum, outward, up);
                    Quat::from_axis_angle(up, -angle * dt) * current
                }
            }
        }
    }

    /// Phase 3: blend momentum toward the steered target on stable ground,
    /// or integrate gravity in the air. Closes the tick.
    pub fn update_velocity(&mut self, current: Vec3, motor: &impl Motor, dt: f32) -> Vec3 {
        debug_assert_eq!(
            self.phase,
            TickPhase::RotationDone,
            "update_velocity must follow update_rotation"
        );

        let mut velocity = current;
        match self.mode {
            LocomotionMode::Grounded | LocomotionMode::Drifting => {
                // Carry speed across slope changes by re-aiming the current
                // velocity along the ground, then chase the steered target.
                let speed = velocity.length();
                let normal = motor.ground_normal();
                velocity = motor.direction_tangent_to_surface(velocity, normal) * speed;

                let input_right = self.move_input.cross(motor.up());
                let reoriented =
                    normal.cross(input_right).normalize_or_zero() * self.move_input.length();
                let target = reoriented * self.config.motion.max_stable_speed;

                let sharpness =
                    self.config.motion.stable_move_sharpness * self.drift.sharpness_factor();
                velocity = velocity.lerp(target, 1.0 - (-sharpness * dt).exp());
            }
            LocomotionMode::Airborne => {
                velocity += self.config.motion.gravity * dt;
            }
        }

        if !velocity.is_finite() {
            warn!(mode = ?self.mode, "discarding non-finite velocity update");
            velocity = self.velocity;
        }

        self.velocity = velocity;
        self.drift.advance(dt, DriftModel::opposing_hold(&self.steer));
        self.phase = TickPhase::AwaitingInputs;
        velocity
    }

    //
    // Mode machine
    //

    fn transition_to(&mut self, next: LocomotionMode) {
        if next == self.mode {
            return;
        }
        self.on_mode_exit(self.mode);
        let previous = self.mode;
        self.mode = next;
        self.on_mode_enter(next);
        debug!(from = ?previous, to = ?next, "locomotion mode change");
    }

    fn on_mode_exit(&mut self, mode: LocomotionMode) {
        match mode {
            LocomotionMode::Drifting => self.drift.end_episode(),
            LocomotionMode::Grounded => {}
            LocomotionMode::Airborne => {}
        }
    }

    fn on_mode_enter(&mut self, mode: LocomotionMode) {
        match mode {
            LocomotionMode::Drifting => self.drift.begin_episode(),
            LocomotionMode::Airborne => self.centrifugal.release(),
            LocomotionMode::Grounded => {}
        }
    }

    //
    // Input derivation
    //

    fn admitted_steer(&self, steer: SteerInput) -> SteerInput {
        match (&self.config.scheme, steer) {
            (ControlScheme::Stick, sample @ SteerInput::Stick { .. }) => sample,
            (ControlScheme::Wheels(_), sample @ SteerInput::Wheels { .. }) => sample,
            (ControlScheme::Stick, _) => {
                debug!("ignoring wheel input sample under stick control");
                SteerInput::NEUTRAL_STICK
            }
            (ControlScheme::Wheels(_), _) => {
                debug!("ignoring stick input sample under wheel control");
                SteerInput::NEUTRAL_WHEELS
            }
        }
    }

    fn derive_stick_input(
        &self,
        forward_axis: f32,
        right_axis: f32,
        camera_rotation: Quat,
        up: Vec3,
    ) -> (Vec3, Vec3) {
        let axes = Vec3::new(right_axis, 0.0, -forward_axis).clamp_length_max(1.0);

        let mut planar = (camera_rotation * Vec3::NEG_Z)
            .reject_from(up)
            .normalize_or_zero();
        if planar == Vec3::ZERO {
            // Camera is looking straight along the up axis; its own up
            // projects to a usable heading instead.
            planar = (camera_rotation * Vec3::Y)
                .reject_from(up)
                .normalize_or_zero();
        }
        if planar == Vec3::ZERO {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let planar_rotation = Transform::default().looking_to(planar, up).rotation;
        let move_input = planar_rotation * axes;
        (move_input, move_input.normalize_or_zero())
    }

    fn derive_wheel_input(
        &self,
        left: f32,
        right: f32,
        motor: &impl Motor,
        up: Vec3,
    ) -> (Vec3, Vec3) {
        let ControlScheme::Wheels(layout) = &self.config.scheme else {
            return (Vec3::ZERO, Vec3::ZERO);
        };

        let magnitude = ((left.abs() + right.abs()) / 2.0).clamp(0.0, 1.0);
        if magnitude == 0.0 {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let forward = motor.forward();
        let right_axis = forward.cross(up).normalize_or_zero();
        let to_world = |offset: Vec3| right_axis * offset.x + up * offset.y - forward * offset.z;

        // Each wheel pushes along the chassis forward; pulling its mount
        // point off the centerline angles the net push, so unequal pedals
        // steer as well as drive.
        let left_push = forward * left - to_world(layout.left_offset);
        let right_push = forward * right - to_world(layout.right_offset);

        let planar = (left_push + right_push).reject_from(up);
        let Some(direction) = planar.try_normalize() else {
            return (Vec3::ZERO, Vec3::ZERO);
        };

        (direction * magnitude, direction)
    }

    //
    // Collision callbacks, forwarded by the host after the move commits.
    // Intentionally empty; a future variant may rewrite the report.
    //

    pub fn on_ground_hit(&mut self, _hit: &SurfaceHit, _report: &mut HitStabilityReport) {}

    pub fn on_movement_hit(&mut self, _hit: &SurfaceHit, _report: &mut HitStabilityReport) {}

    pub fn process_hit_stability_report(
        &mut self,
        _hit: &SurfaceHit,
        _at_position: Vec3,
        _at_rotation: Quat,
        _report: &mut HitStabilityReport,
    ) {
    }

    pub fn on_discrete_collision_detected(&mut self, _other: Entity) {}

    //
    // Accessors
    //

    pub fn mode(&self) -> LocomotionMode {
        self.mode
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn move_input(&self) -> Vec3 {
        self.move_input
    }

    pub fn look_input(&self) -> Vec3 {
        self.look_input
    }

    pub fn is_drifting(&self) -> bool {
        self.drift.is_drifting()
    }

    pub fn centrifugal_force(&self) -> Option<Vec3> {
        self.centrifugal.force()
    }

    pub fn centrifugal_anchor(&self) -> Option<Vec3> {
        self.centrifugal.anchor()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    f32::atan2(from.cross(to).dot(axis), from.dot(to))
}
