//! Axes for chains and radial patterns.

use gdmlkit_ir::{Rotation, Vec3};
use nalgebra::{Rotation3, Unit, Vector3};

/// An axis through the origin of a solid's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis (beam axis).
    #[default]
    Z,
    /// An arbitrary unit direction.
    Direction(Unit<Vector3<f64>>),
}

impl Axis {
    /// Axis along an arbitrary direction. `None` for a zero-length vector.
    pub fn direction(x: f64, y: f64, z: f64) -> Option<Self> {
        Unit::try_new(Vector3::new(x, y, z), 1e-12).map(Axis::Direction)
    }

    /// Unit vector of this axis.
    pub fn unit_vector(&self) -> Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
            Axis::Direction(dir) => *dir,
        }
    }

    /// Euler rotation (degrees) turning by `angle_deg` about this axis.
    ///
    /// Principal axes map directly onto one Euler angle so that the angle
    /// is written exactly as given.
    pub fn rotation(&self, angle_deg: f64) -> Rotation {
        match self {
            Axis::X => Rotation::degrees(angle_deg, 0.0, 0.0),
            Axis::Y => Rotation::degrees(0.0, angle_deg, 0.0),
            Axis::Z => Rotation::about_z(angle_deg),
            Axis::Direction(dir) => {
                let rot = Rotation3::from_axis_angle(dir, angle_deg.to_radians());
                let (roll, pitch, yaw) = rot.euler_angles();
                Rotation::degrees(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
            }
        }
    }

    /// Offset of `distance` along this axis.
    pub fn offset(&self, distance: f64) -> Vec3 {
        match self {
            Axis::X => Vec3::new(distance, 0.0, 0.0),
            Axis::Y => Vec3::new(0.0, distance, 0.0),
            Axis::Z => Vec3::along_z(distance),
            Axis::Direction(dir) => {
                let v = dir.into_inner() * distance;
                Vec3::new(v.x, v.y, v.z)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn principal_axes_are_exact() {
        assert_eq!(Axis::Z.rotation(45.0), Rotation::about_z(45.0));
        assert_eq!(Axis::X.rotation(90.0), Rotation::degrees(90.0, 0.0, 0.0));
        assert_eq!(Axis::Y.offset(2.5), Vec3::new(0.0, 2.5, 0.0));
    }

    #[test]
    fn direction_matches_principal_axis() {
        let axis = Axis::direction(0.0, 0.0, 3.0).unwrap();
        let rot = axis.rotation(45.0);
        assert_relative_eq!(rot.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(rot.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(rot.z, 45.0, epsilon = 1e-9);

        let off = axis.offset(10.0);
        assert_relative_eq!(off.z, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(Axis::direction(0.0, 0.0, 0.0).is_none());
    }
}
