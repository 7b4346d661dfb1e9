use crate::config;

pub struct BodyHandle {
    _collider: rapier3d::geometry::ColliderHandle,
    body: rapier3d::dynamics::RigidBodyHandle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: nalgebra::Vector3<f32>,
    pub orientation: nalgebra::UnitQuaternion<f32>,
    pub sleeping: bool,
}

#[derive(Default)]
pub struct Physics {
    gravity: nalgebra::Vector3<f32>,
    rigid_bodies: rapier3d::dynamics::RigidBodySet,
    integration_params: rapier3d::dynamics::IntegrationParameters,
    island_manager: rapier3d::dynamics::IslandManager,
    impulse_joints: rapier3d::dynamics::ImpulseJointSet,
    multibody_joints: rapier3d::dynamics::MultibodyJointSet,
    solver: rapier3d::dynamics::CCDSolver,
    colliders: rapier3d::geometry::ColliderSet,
    broad_phase: rapier3d::geometry::DefaultBroadPhase,
    narrow_phase: rapier3d::geometry::NarrowPhase,
    pipeline: rapier3d::pipeline::PhysicsPipeline,
    step_count: u64,
}

impl Physics {
    pub fn new(config: &config::Physics) -> Self {
        let mut physics = Self::default();
        physics.gravity = nalgebra::Vector3::from(config.gravity);
        physics.integration_params.dt = config.time_step();
        physics
    }

    /// Immovable platform with its top face at y = 0; fixed bodies are
    /// skipped by the integrator.
    pub fn create_platform(&mut self, config: &config::Physics) -> BodyHandle {
        let [hx, hy, hz] = config.platform_half_extents;
        let collider = rapier3d::geometry::ColliderBuilder::cuboid(hx, hy, hz)
            .translation(nalgebra::Vector3::new(0.0, -hy, 0.0))
            .build();
        let body =
            rapier3d::dynamics::RigidBodyBuilder::new(rapier3d::dynamics::RigidBodyType::Fixed)
                .build();
        self.insert(body, collider)
    }

    pub fn create_box(&mut self, config: &config::Physics) -> BodyHandle {
        let [hx, hy, hz] = config.box_half_extents;
        let shape = rapier3d::geometry::SharedShape::cuboid(hx, hy, hz);
        let base = shape.mass_properties(config.box_density);
        let mass_properties = rapier3d::dynamics::MassProperties::new(
            base.local_com,
            base.mass(),
            base.principal_inertia() * config.inertia_scale,
        );
        let collider = rapier3d::geometry::ColliderBuilder::new(shape)
            .restitution(config.bounciness)
            .restitution_combine_rule(rapier3d::dynamics::CoefficientCombineRule::Max)
            .mass_properties(mass_properties)
            .build();
        let body =
            rapier3d::dynamics::RigidBodyBuilder::new(rapier3d::dynamics::RigidBodyType::Dynamic)
                .translation(nalgebra::Vector3::from(config.box_position))
                .ccd_enabled(true)
                .build();
        self.insert(body, collider)
    }

    fn insert(
        &mut self,
        body: rapier3d::dynamics::RigidBody,
        collider: rapier3d::geometry::Collider,
    ) -> BodyHandle {
        let body_handle = self.rigid_bodies.insert(body);
        BodyHandle {
            _collider: self.colliders.insert_with_parent(
                collider,
                body_handle,
                &mut self.rigid_bodies,
            ),
            body: body_handle,
        }
    }

    /// Returns `None` only for a handle from another world.
    pub fn body_state(&self, handle: &BodyHandle) -> Option<BodyState> {
        let rb = self.rigid_bodies.get(handle.body)?;
        let isometry = rb.position();
        Some(BodyState {
            position: isometry.translation.vector,
            orientation: isometry.rotation,
            sleeping: rb.is_sleeping(),
        })
    }

    pub fn time_step(&self) -> f32 {
        self.integration_params.dt
    }

    pub fn elapsed(&self) -> f32 {
        self.step_count as f32 * self.integration_params.dt
    }

    pub fn step(&mut self) {
        profiling::scope!("Physics step");
        let query_pipeline = None;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.solver,
            query_pipeline,
            &physics_hooks,
            &event_handler,
        );
        self.step_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> config::Physics {
        config::Physics {
            gravity: [0.0, -9.81, 0.0],
            step_rate: 60.0,
            box_half_extents: [0.5, 0.5, 0.5],
            box_position: [0.0, 5.0, 0.0],
            box_density: 1.0,
            bounciness: 0.1,
            inertia_scale: 2.0,
            platform_half_extents: [5.0, 0.01, 5.0],
        }
    }

    #[test]
    fn bodies_start_where_configured() {
        let config = test_config();
        let mut physics = Physics::new(&config);
        let platform = physics.create_platform(&config);
        let cube = physics.create_box(&config);

        let state = physics.body_state(&cube).unwrap();
        assert_eq!(state.position, nalgebra::Vector3::new(0.0, 5.0, 0.0));
        assert_eq!(state.orientation, nalgebra::UnitQuaternion::identity());
        assert!(!state.sleeping);
        let state = physics.body_state(&platform).unwrap();
        assert_eq!(state.position, nalgebra::Vector3::zeros());
    }

    #[test]
    fn fixed_time_step() {
        let config = test_config();
        let mut physics = Physics::new(&config);
        assert!((physics.time_step() - 1.0 / 60.0).abs() < 1e-7);
        for _ in 0..30 {
            physics.step();
        }
        assert!((physics.elapsed() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn box_falls_under_gravity() {
        let config = test_config();
        let mut physics = Physics::new(&config);
        let _platform = physics.create_platform(&config);
        let cube = physics.create_box(&config);

        let mut last_y = physics.body_state(&cube).unwrap().position.y;
        for _ in 0..20 {
            physics.step();
            let y = physics.body_state(&cube).unwrap().position.y;
            assert!(y < last_y);
            last_y = y;
        }
    }

    #[test]
    fn box_settles_on_platform_and_sleeps() {
        let config = test_config();
        let mut physics = Physics::new(&config);
        let platform = physics.create_platform(&config);
        let cube = physics.create_box(&config);

        for _ in 0..900 {
            physics.step();
        }
        let state = physics.body_state(&cube).unwrap();
        // The platform's top face is level with the drawn plane at y = 0.
        let rest_height = config.box_half_extents[1];
        assert!(
            (state.position.y - rest_height).abs() < 0.005,
            "box rests at {}",
            state.position.y
        );
        assert!(state.position.x.abs() < 0.05 && state.position.z.abs() < 0.05);
        assert!(state.sleeping);

        let platform_state = physics.body_state(&platform).unwrap();
        assert_eq!(platform_state.position, nalgebra::Vector3::zeros());
        assert_eq!(
            platform_state.orientation,
            nalgebra::UnitQuaternion::identity()
        );
    }

    #[test]
    fn foreign_handle_is_none() {
        let config = test_config();
        let mut physics = Physics::new(&config);
        let cube = physics.create_box(&config);
        let other = Physics::new(&config);
        assert!(other.body_state(&cube).is_none());
    }
}
