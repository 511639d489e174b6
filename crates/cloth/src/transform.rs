//! Whole-mesh rigid transform applied on top of the per-vertex deformation.

use glam::{Mat4, Quat, Vec3};

use crate::raycast::Ray;

/// Rotation, tilt and translation of the mesh group.
///
/// Rotations compose in X, Y, Z order (the renderer's default Euler order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Spin about the vertical axis
    pub rotation_y: f32,
    /// Primary tilt about Z
    pub tilt_z: f32,
    /// Secondary tilt about X
    pub tilt_x: f32,
    pub translation: Vec3,
    pub scale: f32,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self {
            rotation_y: 0.0,
            tilt_z: 0.0,
            tilt_x: 0.0,
            translation: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl RigidTransform {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.tilt_x)
            * Quat::from_rotation_y(self.rotation_y)
            * Quat::from_rotation_z(self.tilt_z)
    }

    /// Mesh-local to world matrix.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            self.rotation(),
            self.translation,
        )
    }

    /// Map a world-space point into mesh-local space.
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        self.to_mat4().inverse().transform_point3(point)
    }

    /// Map a world-space ray into mesh-local space.
    ///
    /// The direction is renormalized; distances along the returned ray are in
    /// local units.
    pub fn world_ray_to_local(&self, ray: &Ray) -> Ray {
        let inverse = self.to_mat4().inverse();
        Ray {
            origin: inverse.transform_point3(ray.origin),
            direction: inverse.transform_vector3(ray.direction).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let transform = RigidTransform::default();
        assert_eq!(transform.to_mat4(), Mat4::IDENTITY);
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!((transform.world_to_local(p) - p).length() < 1e-6);
    }

    #[test]
    fn test_world_to_local_inverts_transform() {
        let transform = RigidTransform {
            rotation_y: 0.7,
            tilt_z: 0.2,
            tilt_x: 0.06,
            translation: Vec3::new(0.1, 0.0, -0.2),
            scale: 1.5,
        };
        let local = Vec3::new(0.3, -0.4, 0.25);
        let world = transform.to_mat4().transform_point3(local);
        assert!((transform.world_to_local(world) - local).length() < 1e-5);
    }

    #[test]
    fn test_world_ray_to_local_under_scale() {
        let transform = RigidTransform {
            scale: 2.0,
            ..Default::default()
        };
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 4.0),
            direction: Vec3::NEG_Z,
        };
        let local = transform.world_ray_to_local(&ray);
        assert!((local.origin - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-6);
        assert!((local.direction - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_spin_about_y() {
        let transform = RigidTransform {
            rotation_y: std::f32::consts::FRAC_PI_2,
            ..Default::default()
        };
        let world = transform.to_mat4().transform_point3(Vec3::X);
        assert!((world - Vec3::NEG_Z).length() < 1e-5);
    }
}
