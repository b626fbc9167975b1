use bevy::prelude::*;

use super::config::{ControlScheme, ControllerConfig};

/// Steering half of an input snapshot. The variant mirrors the configured
/// [`ControlScheme`]; a mismatched sample reads as neutral.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SteerInput {
    Stick { forward: f32, right: f32 },
    Wheels {
        left: f32,
        right: f32,
        left_held: bool,
        right_held: bool,
    },
}

impl SteerInput {
    pub const NEUTRAL_STICK: Self = Self::Stick {
        forward: 0.0,
        right: 0.0,
    };
    pub const NEUTRAL_WHEELS: Self = Self::Wheels {
        left: 0.0,
        right: 0.0,
        left_held: false,
        right_held: false,
    };
}

impl Default for SteerInput {
    fn default() -> Self {
        Self::NEUTRAL_STICK
    }
}

/// Per-tick input snapshot. Rebuilt from scratch every tick; nothing in here
/// survives to the next one.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct PlayerInputs {
    pub steer: SteerInput,
    pub camera_rotation: Quat,
}

pub enum Keybind {
    Keyboard(KeyCode),
    Mouse(MouseButton),
}

impl Keybind {
    pub fn pressed(
        &self,
        keyboard: &ButtonInput<KeyCode>,
        mouse: &ButtonInput<MouseButton>,
    ) -> bool {
        match self {
            Keybind::Keyboard(key_code) => keyboard.pressed(*key_code),
            Keybind::Mouse(mouse_button) => mouse.pressed(*mouse_button),
        }
    }
}

#[derive(Resource)]
pub struct PlayerKeybinds {
    pub stick_forward: Keybind,
    pub stick_backward: Keybind,
    pub stick_left: Keybind,
    pub stick_right: Keybind,

    pub left_wheel_forward: Keybind,
    pub left_wheel_backward: Keybind,
    pub right_wheel_forward: Keybind,
    pub right_wheel_backward: Keybind,
    pub left_hold: Keybind,
    pub right_hold: Keybind,
}

impl Default for PlayerKeybinds {
    fn default() -> Self {
        Self {
            stick_forward: Keybind::Keyboard(KeyCode::KeyW),
            stick_backward: Keybind::Keyboard(KeyCode::KeyS),
            stick_left: Keybind::Keyboard(KeyCode::KeyA),
            stick_right: Keybind::Keyboard(KeyCode::KeyD),

            left_wheel_forward: Keybind::Keyboard(KeyCode::KeyW),
            left_wheel_backward: Keybind::Keyboard(KeyCode::KeyS),
            right_wheel_forward: Keybind::Keyboard(KeyCode::ArrowUp),
            right_wheel_backward: Keybind::Keyboard(KeyCode::ArrowDown),
            left_hold: Keybind::Keyboard(KeyCode::ShiftLeft),
            right_hold: Keybind::Keyboard(KeyCode::ShiftRight),
        }
    }
}

fn axis(
    positive: &Keybind,
    negative: &Keybind,
    keyboard: &ButtonInput<KeyCode>,
    mouse: &ButtonInput<MouseButton>,
) -> f32 {
    let mut value = 0.0;
    if positive.pressed(keyboard, mouse) {
        value += 1.0;
    }
    if negative.pressed(keyboard, mouse) {
        value -= 1.0;
    }
    value
}

/// Builds the tick's [`PlayerInputs`] from the keyboard and the active 3D
/// camera. Runs first in the fixed-tick chain.
pub fn sample_input(
    config: Res<ControllerConfig>,
    binds: Res<PlayerKeybinds>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    camera: Option<Single<&Transform, With<Camera3d>>>,
    mut inputs: ResMut<PlayerInputs>,
) {
    let camera_rotation = camera
        .map(|transform| transform.rotation)
        .unwrap_or(Quat::IDENTITY);

    let steer = match &config.scheme {
        ControlScheme::Stick => SteerInput::Stick {
            forward: axis(&binds.stick_forward, &binds.stick_backward, &keyboard, &mouse),
            right: axis(&binds.stick_right, &binds.stick_left, &keyboard, &mouse),
        },
        ControlScheme::Wheels(_) => SteerInput::Wheels {
            left: axis(
                &binds.left_wheel_forward,
                &binds.left_wheel_backward,
                &keyboard,
                &mouse,
            ),
            right: axis(
                &binds.right_wheel_forward,
                &binds.right_wheel_backward,
                &keyboard,
                &mouse,
            ),
            left_held: binds.left_hold.pressed(&keyboard, &mouse),
            right_held: binds.right_hold.pressed(&keyboard, &mouse),
        },
    };

    *inputs = PlayerInputs {
        steer,
        camera_rotation,
    };
}
