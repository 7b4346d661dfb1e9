//! Keyboard and mouse state, sampled once per frame.
//!
//! Keys are level-triggered: a key counts while it is held. Mouse motion and
//! wheel input accumulate between frames and are cleared by `end_frame()`.
//! Raw mouse motion only counts while the window has focus.

use crate::config::Controls;
use std::collections::HashSet;
use winit::keyboard::KeyCode;

/// Camera deltas for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraInput {
    /// (forward, right, up) in world units.
    pub movement: nalgebra::Vector3<f32>,
    /// (yaw, pitch) in degrees.
    pub rotation: nalgebra::Vector2<f32>,
    pub zoom: f32,
}

#[derive(Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    mouse_delta: nalgebra::Vector2<f32>,
    wheel: f32,
    unfocused: bool,
}

impl InputState {
    pub fn key_down(&mut self, code: KeyCode) {
        self.held.insert(code);
    }

    pub fn key_up(&mut self, code: KeyCode) {
        self.held.remove(&code);
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        if self.unfocused {
            return;
        }
        self.mouse_delta += nalgebra::Vector2::new(dx as f32, dy as f32);
    }

    pub fn on_wheel(&mut self, delta: winit::event::MouseScrollDelta) {
        self.wheel += match delta {
            winit::event::MouseScrollDelta::LineDelta(_, lines) => lines,
            // Roughly one line per 20 logical pixels.
            winit::event::MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
        };
    }

    /// Feeds a window event; returns true if it was consumed.
    pub fn on_window_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        match *event {
            winit::event::WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                match state {
                    winit::event::ElementState::Pressed => self.key_down(key_code),
                    winit::event::ElementState::Released => self.key_up(key_code),
                }
                true
            }
            winit::event::WindowEvent::MouseWheel { delta, .. } => {
                self.on_wheel(delta);
                true
            }
            winit::event::WindowEvent::Focused(focused) => {
                self.unfocused = !focused;
                if !focused {
                    self.held.clear();
                    self.mouse_delta = nalgebra::Vector2::zeros();
                }
                false
            }
            _ => false,
        }
    }

    fn axis(&self, positive: &[KeyCode], negative: &[KeyCode]) -> f32 {
        let pos = positive.iter().any(|&code| self.is_held(code));
        let neg = negative.iter().any(|&code| self.is_held(code));
        pos as i32 as f32 - neg as i32 as f32
    }

    pub fn camera_input(&self, controls: &Controls) -> CameraInput {
        use KeyCode as Kc;

        let forward = self.axis(&[Kc::KeyW, Kc::ArrowUp], &[Kc::KeyS, Kc::ArrowDown]);
        let right = self.axis(&[Kc::KeyD, Kc::ArrowRight], &[Kc::KeyA, Kc::ArrowLeft]);
        let up = self.axis(&[Kc::Space], &[Kc::ShiftLeft]);
        CameraInput {
            movement: nalgebra::Vector3::new(forward, right, up) * controls.move_speed,
            rotation: self.mouse_delta * controls.look_sensitivity,
            zoom: self.wheel * controls.zoom_speed,
        }
    }

    pub fn end_frame(&mut self) {
        self.mouse_delta = nalgebra::Vector2::zeros();
        self.wheel = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> Controls {
        Controls {
            move_speed: 0.1,
            look_sensitivity: 0.05,
            zoom_speed: 2.0,
        }
    }

    #[test]
    fn idle_produces_no_motion() {
        let input = InputState::default();
        let camera = input.camera_input(&controls());
        assert_eq!(camera.movement, nalgebra::Vector3::zeros());
        assert_eq!(camera.rotation, nalgebra::Vector2::zeros());
        assert_eq!(camera.zoom, 0.0);
    }

    #[test]
    fn keys_map_to_axes() {
        let mut input = InputState::default();
        input.key_down(KeyCode::KeyW);
        input.key_down(KeyCode::ArrowLeft);
        input.key_down(KeyCode::Space);
        let camera = input.camera_input(&controls());
        assert_eq!(camera.movement, nalgebra::Vector3::new(0.1, -0.1, 0.1));

        input.key_up(KeyCode::KeyW);
        input.key_up(KeyCode::Space);
        input.key_down(KeyCode::ShiftLeft);
        input.key_down(KeyCode::ArrowDown);
        let camera = input.camera_input(&controls());
        assert_eq!(camera.movement, nalgebra::Vector3::new(-0.1, -0.1, -0.1));
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::default();
        input.key_down(KeyCode::KeyA);
        input.key_down(KeyCode::KeyD);
        input.key_down(KeyCode::KeyW);
        input.key_down(KeyCode::ArrowUp);
        let camera = input.camera_input(&controls());
        assert_eq!(camera.movement, nalgebra::Vector3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn mouse_accumulates_until_end_of_frame() {
        let mut input = InputState::default();
        input.on_mouse_motion(4.0, -2.0);
        input.on_mouse_motion(6.0, 0.0);
        input.on_wheel(winit::event::MouseScrollDelta::LineDelta(0.0, 1.5));
        let camera = input.camera_input(&controls());
        assert!((camera.rotation - nalgebra::Vector2::new(0.5, -0.1)).norm() < 1e-6);
        assert_eq!(camera.zoom, 3.0);

        input.key_down(KeyCode::KeyS);
        input.end_frame();
        let camera = input.camera_input(&controls());
        assert_eq!(camera.rotation, nalgebra::Vector2::zeros());
        assert_eq!(camera.zoom, 0.0);
        assert!(input.is_held(KeyCode::KeyS));
    }

    #[test]
    fn mouse_motion_ignored_without_focus() {
        let mut input = InputState::default();
        input.key_down(KeyCode::KeyW);
        input.on_mouse_motion(4.0, 0.0);
        assert!(!input.on_window_event(&winit::event::WindowEvent::Focused(false)));
        input.on_mouse_motion(10.0, 10.0);
        let camera = input.camera_input(&controls());
        assert_eq!(camera.rotation, nalgebra::Vector2::zeros());
        assert_eq!(camera.movement, nalgebra::Vector3::zeros());

        input.on_window_event(&winit::event::WindowEvent::Focused(true));
        input.on_mouse_motion(2.0, 0.0);
        let camera = input.camera_input(&controls());
        assert!((camera.rotation - nalgebra::Vector2::new(0.1, 0.0)).norm() < 1e-6);
    }
}
