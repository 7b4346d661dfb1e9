use crate::config::{self, Projection};
use std::ops::Range;

const MIN_TARGET_DISTANCE: f32 = 0.001;
// Keeps the view direction off the up axis.
const MAX_PITCH_COS: f32 = 0.999;

pub struct Camera {
    pub pos: nalgebra::Point3<f32>,
    pub target: nalgebra::Point3<f32>,
    pub up: nalgebra::Vector3<f32>,
    pub clip: Range<f32>,
    pub fov_y: f32,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: nalgebra::Point3::new(0.0, 10.0, 10.0),
            target: nalgebra::Point3::origin(),
            up: nalgebra::Vector3::y(),
            clip: 0.01..1000.0,
            fov_y: 45.0,
            projection: Projection::Perspective,
        }
    }
}

impl From<&config::Camera> for Camera {
    fn from(config: &config::Camera) -> Self {
        Self {
            pos: nalgebra::Point3::from(config.position),
            target: nalgebra::Point3::from(config.target),
            up: nalgebra::Vector3::from(config.up).normalize(),
            clip: config.clip.clone(),
            fov_y: config.fov_y,
            projection: config.projection,
        }
    }
}

impl Camera {
    pub fn forward(&self) -> nalgebra::Vector3<f32> {
        (self.target - self.pos).normalize()
    }

    pub fn right(&self) -> nalgebra::Vector3<f32> {
        self.forward().cross(&self.up).normalize()
    }

    fn translate(&mut self, offset: nalgebra::Vector3<f32>) {
        self.pos += offset;
        self.target += offset;
    }

    /// Moves along the view direction projected onto the ground plane.
    pub fn move_forward(&mut self, distance: f32) {
        let mut forward = self.forward();
        forward -= self.up * forward.dot(&self.up);
        if let Some(dir) = forward.try_normalize(f32::EPSILON) {
            self.translate(dir * distance);
        }
    }

    pub fn move_right(&mut self, distance: f32) {
        let mut right = self.right();
        right -= self.up * right.dot(&self.up);
        if let Some(dir) = right.try_normalize(f32::EPSILON) {
            self.translate(dir * distance);
        }
    }

    pub fn move_up(&mut self, distance: f32) {
        let up = self.up;
        self.translate(up * distance);
    }

    /// Rotates the target around the camera position about the up axis.
    pub fn yaw(&mut self, angle: f32) {
        let rotation = nalgebra::UnitQuaternion::from_axis_angle(
            &nalgebra::Unit::new_normalize(self.up),
            angle,
        );
        let view = self.target - self.pos;
        self.target = self.pos + rotation * view;
    }

    /// Rotates the target around the camera's right axis. Positive angles
    /// look up. Stops short of looking straight along the up axis.
    pub fn pitch(&mut self, angle: f32) {
        let view = self.target - self.pos;
        let right = match self.forward().cross(&self.up).try_normalize(f32::EPSILON) {
            Some(right) => right,
            None => return,
        };
        let rotation =
            nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_unchecked(right), angle);
        let rotated = rotation * view;
        if rotated.normalize().dot(&self.up).abs() > MAX_PITCH_COS {
            return;
        }
        self.target = self.pos + rotated;
    }

    /// Changes the distance to the target by `delta`; negative values move
    /// closer, never past `MIN_TARGET_DISTANCE`.
    pub fn move_to_target(&mut self, delta: f32) {
        let view = self.target - self.pos;
        let distance = (view.norm() + delta).max(MIN_TARGET_DISTANCE);
        self.pos = self.target - view.normalize() * distance;
    }

    /// Applies one frame of free-look input.
    ///
    /// `movement` is (forward, right, up) in world units, `rotation` is
    /// (yaw, pitch) in degrees where positive yaw turns right and positive
    /// pitch turns down, matching mouse motion.
    pub fn update(
        &mut self,
        movement: nalgebra::Vector3<f32>,
        rotation: nalgebra::Vector2<f32>,
        zoom: f32,
    ) {
        self.pitch(-rotation.y.to_radians());
        self.yaw(-rotation.x.to_radians());

        self.move_forward(movement.x);
        self.move_right(movement.y);
        self.move_up(movement.z);

        self.move_to_target(zoom);
    }

    pub fn view_matrix(&self) -> nalgebra::Matrix4<f32> {
        nalgebra::Isometry3::look_at_rh(&self.pos, &self.target, &self.up).to_homogeneous()
    }

    /// Projection with clip-space depth in `[0, 1]`.
    pub fn projection_matrix(&self, aspect: f32) -> nalgebra::Matrix4<f32> {
        let gl = match self.projection {
            Projection::Perspective => nalgebra::Perspective3::new(
                aspect,
                self.fov_y.to_radians(),
                self.clip.start,
                self.clip.end,
            )
            .to_homogeneous(),
            Projection::Orthographic => {
                let top = 0.5 * self.fov_y;
                let right = top * aspect;
                nalgebra::Orthographic3::new(
                    -right,
                    right,
                    -top,
                    top,
                    self.clip.start,
                    self.clip.end,
                )
                .to_homogeneous()
            }
        };
        // Remap z from [-1, 1] to [0, 1].
        let remap = nalgebra::Matrix4::new(
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.5, 0.5, //
            0.0, 0.0, 0.0, 1.0,
        );
        remap * gl
    }

    pub fn view_projection(&self, aspect: f32) -> nalgebra::Matrix4<f32> {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}
