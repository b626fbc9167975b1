use std::fs;

use anyhow::Context;
use avian3d::prelude::*;
use bevy::{prelude::*, window::PresentMode};

use freewheel::player::{ControllerConfig, Player, PlayerPlugin};

const SETTINGS_PATH: &str = "assets/player.ron";

fn main() {
    let config = match load_settings() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:#}; using default configuration");
            ControllerConfig::default()
        }
    };
    if let Err(err) = config.validate() {
        panic!("invalid player configuration: {err}");
    }

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                present_mode: PresentMode::AutoNoVsync,
                title: "Freewheel".to_string(),
                ..default()
            }),
            ..default()
        }),
    );

    app.add_plugins(PhysicsPlugins::default());

    app.insert_resource(config);
    app.add_plugins(PlayerPlugin);

    app.add_systems(Startup, setup_arena);
    app.add_systems(Update, chase_camera);

    app.run();
}

fn load_settings() -> anyhow::Result<ControllerConfig> {
    let text = fs::read_to_string(SETTINGS_PATH)
        .with_context(|| format!("reading {SETTINGS_PATH}"))?;
    let config = ron::from_str(&text).with_context(|| format!("parsing {SETTINGS_PATH}"))?;
    Ok(config)
}

fn setup_arena(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb(1.0, 1.0, 1.0),
        brightness: 300.0,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 5000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(Vec3::new(64.0, 128.0, 64.0)).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Flat arena floor.
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(200.0, 1.0, 200.0),
        Transform::from_translation(Vec3::new(0.0, -0.5, 0.0)),
        Mesh3d(meshes.add(Cuboid::new(200.0, 1.0, 200.0).mesh().build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.35, 0.35, 0.4),
            ..default()
        })),
    ));

    // A ramp to exercise slope handling and a few pillars to weave through.
    commands.spawn((
        RigidBody::Static,
        Collider::cuboid(12.0, 1.0, 12.0),
        Transform::from_translation(Vec3::new(-20.0, 1.5, -20.0))
            .with_rotation(Quat::from_rotation_x(20f32.to_radians())),
        Mesh3d(meshes.add(Cuboid::new(12.0, 1.0, 12.0).mesh().build())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.5, 0.4, 0.3),
            ..default()
        })),
    ));

    for (x, z) in [(10.0, -14.0), (16.0, -4.0), (24.0, -18.0)] {
        commands.spawn((
            RigidBody::Static,
            Collider::cylinder(1.0, 6.0),
            Transform::from_translation(Vec3::new(x, 3.0, z)),
            Mesh3d(meshes.add(Cylinder::new(1.0, 6.0).mesh().build())),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.6, 0.55, 0.5),
                ..default()
            })),
        ));
    }

    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(Vec3::new(0.0, 8.0, 14.0)).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((Player, Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))));
}

fn chase_camera(
    time: Res<Time>,
    player: Option<Single<&Transform, (With<Player>, Without<Camera3d>)>>,
    camera: Option<Single<&mut Transform, With<Camera3d>>>,
) {
    let (Some(player), Some(camera)) = (player, camera) else {
        return;
    };

    let target = player.translation;
    let mut camera = camera.into_inner();
    let desired = target + Vec3::new(0.0, 8.0, 14.0);
    camera.translation = camera
        .translation
        .lerp(desired, (time.delta_secs() * 4.0).min(1.0));
    camera.look_at(target, Vec3::Y);
}
