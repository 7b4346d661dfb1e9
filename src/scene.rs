use crate::{
    config,
    euler::EulerAngles,
    physics::{BodyHandle, BodyState, Physics},
};

/// Pitch within this many radians of ±90° counts as gimbal lock.
const GIMBAL_LOCK_TOLERANCE: f32 = 1e-3;

/// Per-frame handoff from the physics world to the renderer.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    pub cube: BodyState,
    pub platform: BodyState,
    pub angles: EulerAngles,
}

impl Snapshot {
    pub fn box_rotation(&self) -> nalgebra::UnitQuaternion<f32> {
        self.angles.to_rotation()
    }

    /// Roll and yaw are ambiguous in this state.
    pub fn gimbal_locked(&self) -> bool {
        self.angles.is_gimbal_locked(GIMBAL_LOCK_TOLERANCE)
    }

    pub fn overlay_lines(&self) -> [String; 2] {
        let p = self.cube.position;
        [
            format!("Position: {:.6}, {:.6}, {:.6}", p.x, p.y, p.z),
            format!("Sleeping: {}", self.cube.sleeping),
        ]
    }
}

pub struct Scene {
    physics: Physics,
    cube: BodyHandle,
    platform: BodyHandle,
    was_sleeping: bool,
}

impl Scene {
    pub fn new(config: &config::Physics) -> Self {
        let mut physics = Physics::new(config);
        let platform = physics.create_platform(config);
        let cube = physics.create_box(config);
        Self {
            physics,
            cube,
            platform,
            was_sleeping: false,
        }
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn snapshot(&self) -> Snapshot {
        // Both handles are created by this world in `new`.
        let cube = self.physics.body_state(&self.cube).unwrap();
        let platform = self.physics.body_state(&self.platform).unwrap();
        Snapshot {
            cube,
            platform,
            angles: EulerAngles::from(cube.orientation),
        }
    }

    /// Advances the world by one fixed step, regardless of frame time.
    pub fn advance(&mut self) -> Snapshot {
        self.physics.step();
        let snapshot = self.snapshot();
        if snapshot.cube.sleeping != self.was_sleeping {
            log::debug!(
                "Box {} at t={:.3}s",
                if snapshot.cube.sleeping { "fell asleep" } else { "woke up" },
                self.physics.elapsed()
            );
            self.was_sleeping = snapshot.cube.sleeping;
        }
        log::trace!(
            "Box angles (deg): {:?}{}",
            snapshot.angles.to_degrees(),
            if snapshot.gimbal_locked() {
                ", gimbal locked"
            } else {
                ""
            }
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        let config = config::Config::parse(include_bytes!("../data/config.ron")).unwrap();
        Scene::new(&config.physics)
    }

    #[test]
    fn initial_snapshot() {
        let scene = scene();
        let snapshot = scene.snapshot();
        assert_eq!(snapshot.cube.position.y, 5.0);
        assert_eq!(snapshot.angles, EulerAngles::default());
        assert!(!snapshot.gimbal_locked());
        assert_eq!(
            snapshot.overlay_lines(),
            [
                "Position: 0.000000, 5.000000, 0.000000".to_string(),
                "Sleeping: false".to_string(),
            ]
        );
    }

    #[test]
    fn advance_steps_once() {
        let mut scene = scene();
        let first = scene.advance();
        assert!(first.cube.position.y < 5.0);
        assert!((scene.physics().elapsed() - 1.0 / 60.0).abs() < 1e-6);
        let second = scene.advance();
        assert!(second.cube.position.y < first.cube.position.y);
    }

    #[test]
    fn rotation_round_trips_through_angles() {
        let mut scene = scene();
        for _ in 0..120 {
            scene.advance();
        }
        let snapshot = scene.snapshot();
        let angle = snapshot.box_rotation().angle_to(&snapshot.cube.orientation);
        assert!(angle < 1e-3, "display rotation differs by {angle}");
    }

    #[test]
    fn box_eventually_sleeps() {
        let mut scene = scene();
        let mut snapshot = scene.snapshot();
        for _ in 0..900 {
            snapshot = scene.advance();
        }
        assert!(snapshot.cube.sleeping);
        assert_eq!(snapshot.overlay_lines()[1], "Sleeping: true");
        assert_eq!(snapshot.platform.position, nalgebra::Vector3::zeros());
    }

    #[test]
    fn pitch_at_quarter_turn_is_gimbal_locked() {
        let mut snapshot = scene().snapshot();
        snapshot.angles.pitch = std::f32::consts::FRAC_PI_2;
        assert!(snapshot.gimbal_locked());
        snapshot.angles.pitch = std::f32::consts::FRAC_PI_4;
        assert!(!snapshot.gimbal_locked());
    }
}
