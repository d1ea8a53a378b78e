use std::collections::HashSet;

use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::{FlyCamera, ViewPreset};

/// Keys the sandbox reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    /// Tilt up
    U,
    /// Tilt down
    J,
    /// Tilt left
    H,
    /// Tilt right
    K,
    /// Reload shaders
    R,
    Digit(u8),
}

impl Key {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::KeyW => Key::W,
            KeyCode::KeyA => Key::A,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyU => Key::U,
            KeyCode::KeyJ => Key::J,
            KeyCode::KeyH => Key::H,
            KeyCode::KeyK => Key::K,
            KeyCode::KeyR => Key::R,
            KeyCode::Digit0 => Key::Digit(0),
            KeyCode::Digit1 => Key::Digit(1),
            KeyCode::Digit2 => Key::Digit(2),
            KeyCode::Digit3 => Key::Digit(3),
            KeyCode::Digit4 => Key::Digit(4),
            KeyCode::Digit5 => Key::Digit(5),
            KeyCode::Digit6 => Key::Digit(6),
            KeyCode::Digit7 => Key::Digit(7),
            _ => return None,
        };
        Some(key)
    }
}

/// Polled input for one frame
///
/// Window events write into it as they arrive; the scene reads it once per
/// tick. `end_frame` clears the per-frame edges and accumulators.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
    scroll: f32,
    mouse_delta: (f32, f32),
    /// Mouse motion only turns the camera while this is set
    pub mouse_look: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            if self.held.insert(key) {
                self.pressed.insert(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// True only on the frame the key went down
    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn add_scroll(&mut self, delta: f32) {
        self.scroll += delta;
    }

    pub fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        if self.mouse_look {
            self.mouse_delta.0 += dx;
            self.mouse_delta.1 += dy;
        }
    }

    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }

    pub fn take_mouse_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.mouse_delta)
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
        self.scroll = 0.0;
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
        self.end_frame();
    }
}

/// What the controller asks of the scene beyond moving the camera
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControllerActions {
    pub reload_shaders: bool,
}

/// Translates window events into [`InputState`] and input into camera commands
pub struct CameraController {
    pub scroll_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl CameraController {
    pub fn new(scroll_speed: f32) -> Self {
        Self { scroll_speed }
    }

    pub fn process_events(&self, event: &DeviceEvent, input: &mut InputState) {
        match event {
            DeviceEvent::MouseWheel { delta } => {
                let scroll_amount = match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32 / 20.0
                    }
                };
                input.add_scroll(scroll_amount * self.scroll_speed);
            }
            DeviceEvent::MouseMotion { delta } => {
                // Screen y grows downwards; pitch grows upwards.
                input.add_mouse_motion(delta.0 as f32, -delta.1 as f32);
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&self, event: &KeyEvent, input: &mut InputState) {
        if let PhysicalKey::Code(code) = event.physical_key {
            if let Some(key) = Key::from_key_code(code) {
                input.set_key(key, event.state == ElementState::Pressed);
            }
        }
    }

    /// Applies one frame of polled input to the camera
    pub fn update_camera(
        &self,
        input: &mut InputState,
        camera: &mut FlyCamera,
    ) -> ControllerActions {
        if input.is_held(Key::W) {
            camera.move_forward();
        }
        if input.is_held(Key::S) {
            camera.move_backward();
        }
        if input.is_held(Key::A) {
            camera.move_left();
        }
        if input.is_held(Key::D) {
            camera.move_right();
        }

        if input.is_held(Key::U) {
            camera.tilt_up();
        }
        if input.is_held(Key::J) {
            camera.tilt_down();
        }
        if input.is_held(Key::H) {
            camera.tilt_left();
        }
        if input.is_held(Key::K) {
            camera.tilt_right();
        }

        for digit in 0..=7 {
            if input.is_held(Key::Digit(digit)) {
                if let Some(preset) = ViewPreset::from_digit(digit) {
                    camera.snap_to(preset);
                }
            }
        }

        let (dx, dy) = input.take_mouse_delta();
        if dx != 0.0 || dy != 0.0 {
            camera.process_mouse(dx, dy);
        }

        let scroll = input.take_scroll();
        if scroll != 0.0 {
            camera.zoom(scroll);
        }

        ControllerActions {
            reload_shaders: input.was_pressed(Key::R),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_pressed_edge_only_on_transition() {
        let mut input = InputState::new();
        input.set_key(Key::R, true);
        assert!(input.was_pressed(Key::R));
        input.end_frame();
        // Key repeat while held is not a new press.
        input.set_key(Key::R, true);
        assert!(!input.was_pressed(Key::R));
        assert!(input.is_held(Key::R));
        input.set_key(Key::R, false);
        input.set_key(Key::R, true);
        assert!(input.was_pressed(Key::R));
    }

    #[test]
    fn test_held_movement_keys_move_camera() {
        let controller = CameraController::default();
        let mut camera = FlyCamera::default();
        camera.set_speed(1.0);
        let mut input = InputState::new();
        input.set_key(Key::W, true);

        controller.update_camera(&mut input, &mut camera);
        input.end_frame();
        controller.update_camera(&mut input, &mut camera);

        assert!((camera.position().z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_digit_snaps_to_preset() {
        let controller = CameraController::default();
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();
        input.set_key(Key::Digit(2), true);
        controller.update_camera(&mut input, &mut camera);
        assert_eq!(camera.position(), Vector3::new(-10.0, 0.0, 0.0));
    }

    #[test]
    fn test_scroll_zooms_once() {
        let controller = CameraController::default();
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();
        input.add_scroll(5.0);
        controller.update_camera(&mut input, &mut camera);
        assert_eq!(camera.zoom_degrees(), 40.0);
        controller.update_camera(&mut input, &mut camera);
        assert_eq!(camera.zoom_degrees(), 40.0);
    }

    #[test]
    fn test_mouse_motion_requires_mouse_look() {
        let controller = CameraController::default();
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();
        input.add_mouse_motion(50.0, 0.0);
        controller.update_camera(&mut input, &mut camera);
        assert_eq!(camera.yaw(), -90.0);

        input.mouse_look = true;
        input.add_mouse_motion(50.0, 0.0);
        controller.update_camera(&mut input, &mut camera);
        assert!((camera.yaw() + 85.0).abs() < 1e-4);
    }

    #[test]
    fn test_reload_action_is_edge_triggered() {
        let controller = CameraController::default();
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();
        input.set_key(Key::R, true);
        assert!(controller.update_camera(&mut input, &mut camera).reload_shaders);
        input.end_frame();
        assert!(!controller.update_camera(&mut input, &mut camera).reload_shaders);
    }
}
