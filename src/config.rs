use std::{fs, ops::Range, path::Path};

#[derive(serde::Deserialize)]
pub struct Window {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(serde::Deserialize)]
pub struct Assets {
    pub model: String,
    pub font: String,
}

#[derive(Clone, serde::Deserialize)]
pub struct Physics {
    pub gravity: [f32; 3],
    /// Simulation steps per second; each frame advances by exactly one step.
    pub step_rate: f32,
    pub box_half_extents: [f32; 3],
    pub box_position: [f32; 3],
    pub box_density: f32,
    pub bounciness: f32,
    pub inertia_scale: f32,
    pub platform_half_extents: [f32; 3],
}

impl Physics {
    pub fn time_step(&self) -> f32 {
        1.0 / self.step_rate
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize)]
pub enum Projection {
    Perspective,
    Orthographic,
}

#[derive(serde::Deserialize)]
pub struct Camera {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Vertical field of view in degrees, or view height for orthographic.
    pub fov_y: f32,
    pub projection: Projection,
    pub clip: Range<f32>,
}

#[derive(Clone, serde::Deserialize)]
pub struct Controls {
    pub move_speed: f32,
    pub look_sensitivity: f32,
    pub zoom_speed: f32,
}

#[derive(serde::Deserialize)]
pub struct Scene {
    pub box_scale: f32,
    pub box_color: [f32; 4],
    pub plane_size: [f32; 2],
    pub plane_color: [f32; 4],
    pub background: [f32; 4],
    pub text_color: [f32; 4],
    pub text_size: f32,
    pub text_origin: [f32; 2],
}

#[derive(serde::Deserialize)]
pub struct Config {
    pub window: Window,
    pub assets: Assets,
    pub physics: Physics,
    pub camera: Camera,
    pub controls: Controls,
    pub scene: Scene,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let bytes = fs::read(path).map_err(|source| crate::Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&bytes).map_err(|source| crate::Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ron::error::SpannedError> {
        ron::de::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_config_parses() {
        let config = Config::parse(include_bytes!("../data/config.ron")).unwrap();
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.window.target_fps, 60);
        assert_eq!(config.physics.gravity, [0.0, -9.81, 0.0]);
        assert!((config.physics.time_step() - 1.0 / 60.0).abs() < 1e-7);
        assert_eq!(config.physics.box_position, [0.0, 5.0, 0.0]);
        assert_eq!(config.physics.inertia_scale, 2.0);
        assert_eq!(config.camera.projection, Projection::Perspective);
        assert_eq!(config.camera.fov_y, 45.0);
        assert!(config.camera.clip.start < config.camera.clip.end);
        assert!(config.assets.model.ends_with(".gltf"));
    }

    #[test]
    fn missing_section_is_rejected() {
        let result = Config::parse(b"(window: (title: \"x\", width: 1, height: 1, target_fps: 1))");
        assert!(result.is_err());
    }
}
