//! Quaternion to Euler angle conversion.
//!
//! Angles follow the aerospace convention: roll about X, pitch about Y,
//! yaw about Z, applied in that order (`R = Rz(yaw) * Ry(pitch) * Rx(roll)`).

use std::f32::consts::FRAC_PI_2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl EulerAngles {
    /// Converts a rotation quaternion into roll/pitch/yaw radians.
    ///
    /// The pitch term is clamped into `[-1, 1]` before `asin`, so drift in a
    /// nominally unit quaternion yields `±π/2` instead of NaN.
    pub fn from_quaternion(q: &nalgebra::Quaternion<f32>) -> Self {
        let (w, x, y, z) = (q.w, q.i, q.j, q.k);
        let ysqr = y * y;

        let roll = f32::atan2(2.0 * (w * x + y * z), 1.0 - 2.0 * (x * x + ysqr));
        let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
        let yaw = f32::atan2(2.0 * (w * z + x * y), 1.0 - 2.0 * (ysqr + z * z));

        Self { roll, pitch, yaw }
    }

    pub fn to_rotation(&self) -> nalgebra::UnitQuaternion<f32> {
        nalgebra::UnitQuaternion::from_euler_angles(self.roll, self.pitch, self.yaw)
    }

    pub fn to_degrees(&self) -> [f32; 3] {
        [
            self.roll.to_degrees(),
            self.pitch.to_degrees(),
            self.yaw.to_degrees(),
        ]
    }

    /// True when pitch sits at a gimbal-lock singularity, where roll and
    /// yaw are no longer independent.
    pub fn is_gimbal_locked(&self, tolerance: f32) -> bool {
        (self.pitch.abs() - FRAC_PI_2).abs() <= tolerance
    }
}

impl From<nalgebra::UnitQuaternion<f32>> for EulerAngles {
    fn from(rot: nalgebra::UnitQuaternion<f32>) -> Self {
        Self::from_quaternion(rot.quaternion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const EPS: f32 = 1e-5;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn identity_is_zero() {
        let angles = EulerAngles::from_quaternion(&nalgebra::Quaternion::identity());
        assert_eq!(angles, EulerAngles::default());
    }

    #[test]
    fn quarter_turn_about_x() {
        let rot = nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::x_axis(), 0.5 * PI);
        let angles = EulerAngles::from(rot);
        assert_close(angles.roll, 0.5 * PI);
        assert_close(angles.pitch, 0.0);
        assert_close(angles.yaw, 0.0);
    }

    #[test]
    fn quarter_turn_about_z() {
        let rot = nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), 0.5 * PI);
        let angles = EulerAngles::from(rot);
        assert_close(angles.roll, 0.0);
        assert_close(angles.pitch, 0.0);
        assert_close(angles.yaw, 0.5 * PI);
    }

    #[test]
    fn pitch_argument_is_clamped() {
        // Slightly over-length quaternion: 2(wy - zx) lands above 1.
        let over = nalgebra::Quaternion::new(0.7072, 0.0, 0.7072, 0.0);
        assert!(2.0 * (over.w * over.j - over.k * over.i) > 1.0);
        let angles = EulerAngles::from_quaternion(&over);
        assert!(angles.pitch.is_finite());
        assert_close(angles.pitch, 0.5 * PI);

        let under = nalgebra::Quaternion::new(0.7072, 0.0, -0.7072, 0.0);
        let angles = EulerAngles::from_quaternion(&under);
        assert!(angles.pitch.is_finite());
        assert_close(angles.pitch, -0.5 * PI);
        assert!(angles.is_gimbal_locked(EPS));
    }

    #[test]
    fn results_stay_in_range() {
        for &(w, x, y, z) in &[
            (1.0001, 0.0, 1.0001, 0.0),
            (-0.9, 0.3, -0.7, 0.2),
            (0.0, 0.0, 0.0, 1.0),
            (0.5, -0.5, 0.5, -0.5),
        ] {
            let angles = EulerAngles::from_quaternion(&nalgebra::Quaternion::new(w, x, y, z));
            assert!(!angles.roll.is_nan() && !angles.yaw.is_nan());
            assert!(angles.pitch >= -0.5 * PI && angles.pitch <= 0.5 * PI);
        }
    }

    #[test]
    fn recovers_euler_triples() {
        let triples = [
            (0.3, -0.2, 1.1),
            (-1.2, 0.7, -2.5),
            (2.9, 1.2, 0.1),
            (0.0, -1.3, 3.0),
        ];
        for &(roll, pitch, yaw) in &triples {
            let original = EulerAngles { roll, pitch, yaw };
            let angles = EulerAngles::from(original.to_rotation());
            assert!(!angles.is_gimbal_locked(1e-2));
            assert!((angles.roll - roll).abs() < 1e-4, "{original:?} -> {angles:?}");
            assert!((angles.pitch - pitch).abs() < 1e-4, "{original:?} -> {angles:?}");
            assert!((angles.yaw - yaw).abs() < 1e-4, "{original:?} -> {angles:?}");
        }
    }

    #[test]
    fn agrees_with_nalgebra() {
        let rot = nalgebra::UnitQuaternion::from_euler_angles(0.4, -0.6, 2.0);
        let (roll, pitch, yaw) = rot.euler_angles();
        let angles = EulerAngles::from(rot);
        assert!((angles.roll - roll).abs() < 1e-4);
        assert!((angles.pitch - pitch).abs() < 1e-4);
        assert!((angles.yaw - yaw).abs() < 1e-4);
    }
}
