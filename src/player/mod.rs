use avian3d::prelude::*;
use bevy::prelude::*;

mod centrifugal;
mod config;
mod controller;
mod drift;
mod input;
mod motor;

pub use centrifugal::{CentrifugalGesture, CentrifugalModel};
pub use config::{
    CentrifugalConfig, ConfigError, ControlScheme, ControllerConfig, DriftConfig, MotionConfig,
    TelemetryConfig, WheelLayout,
};
pub use controller::{CharacterController, LocomotionMode};
pub use drift::DriftModel;
pub use input::{Keybind, PlayerInputs, PlayerKeybinds, SteerInput};
pub use motor::{BodyMotor, GroundSensor, HitStabilityReport, Motor, SurfaceHit};

#[derive(Component)]
pub struct Player;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControllerConfig>();
        app.init_resource::<TelemetryConfig>();
        app.init_resource::<PlayerInputs>();
        app.init_resource::<PlayerKeybinds>();

        app.add_systems(Update, (add_required_components, log_motion_state));
        app.add_systems(
            FixedUpdate,
            (
                input::sample_input,
                motor::sense_ground,
                step_controller,
                forward_collision_events,
            )
                .chain(),
        );
    }
}

fn add_required_components(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut meshes: ResMut<Assets<Mesh>>,
    config: Res<ControllerConfig>,
    players: Query<Entity, Added<Player>>,
) {
    for entity in &players {
        let controller = CharacterController::new(config.clone())
            .unwrap_or_else(|err| panic!("invalid player configuration: {err}"));

        commands
            .entity(entity)
            .insert(controller)
            .insert(GroundSensor::default())
            .insert(RigidBody::Kinematic)
            .insert(LinearVelocity::default())
            .insert_if_new(Collider::capsule(0.45, 0.9))
            .insert_if_new(Transform::default())
            .insert_if_new(Visibility::Visible)
            .insert_if_new(Mesh3d(meshes.add(Capsule3d::new(0.45, 0.9).mesh().build())))
            .insert_if_new(MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.4, 1.0, 0.4),
                ..default()
            })));
    }
}

/// Runs the controller's three tick phases in order and commits the results
/// to the kinematic body.
fn step_controller(
    time: Res<Time>,
    inputs: Res<PlayerInputs>,
    player: Option<
        Single<(
            &GroundSensor,
            &mut Transform,
            &mut LinearVelocity,
            &mut CharacterController,
        )>,
    >,
) {
    let Some(player) = player else {
        return;
    };

    let (sensor, mut transform, mut linear_velocity, mut controller) = player.into_inner();
    let motor = BodyMotor::capture(sensor, &transform);
    let dt = time.delta_secs();

    controller.set_inputs(&inputs, &motor);
    transform.rotation = controller.update_rotation(transform.rotation, &motor, dt);
    linear_velocity.0 = controller.update_velocity(linear_velocity.0, &motor, dt);

    if sensor.stable {
        if let Some(ground) = sensor.entity {
            let hit = SurfaceHit {
                entity: ground,
                normal: sensor.normal,
                point: sensor.point,
            };
            let mut report = HitStabilityReport { is_stable: true };
            controller.on_ground_hit(&hit, &mut report);
        }
    }
}

fn forward_collision_events(
    mut events: EventReader<CollisionStarted>,
    player: Option<Single<(Entity, &mut CharacterController)>>,
) {
    let Some(player) = player else {
        events.clear();
        return;
    };

    let (entity, mut controller) = player.into_inner();
    for CollisionStarted(a, b) in events.read() {
        let other = if *a == entity {
            *b
        } else if *b == entity {
            *a
        } else {
            continue;
        };
        controller.on_discrete_collision_detected(other);
    }
}

fn log_motion_state(
    time: Res<Time>,
    telemetry: Res<TelemetryConfig>,
    mut elapsed: Local<f32>,
    player: Option<Single<(&CharacterController, &LinearVelocity)>>,
) {
    *elapsed += time.delta_secs();
    if *elapsed < telemetry.log_interval_secs {
        return;
    }
    *elapsed = 0.0;

    let Some(player) = player else {
        return;
    };
    let (controller, velocity) = player.into_inner();
    debug!(
        mode = ?controller.mode(),
        speed = velocity.0.length(),
        drifting = controller.is_drifting(),
        orbiting = controller.centrifugal_anchor().is_some(),
        "player motion"
    );
}
