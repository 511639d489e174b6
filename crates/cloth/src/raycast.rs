//! Ray picking against the deformed mesh.
//!
//! Picking runs against the current (deformed) positions, so the grabbed
//! point follows the surface as it moves.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Determinants and distances below this count as zero
const PICK_EPSILON: f32 = 1e-6;

/// A ray with an origin and a (normalized) direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance and barycentric weights where the ray crosses `corners`.
    ///
    /// Two-sided Moller-Trumbore: the plane is solved in edge coordinates via
    /// scalar triple products. Hits behind the origin and rays grazing the
    /// plane are rejected.
    pub fn cast_triangle(&self, corners: [Vec3; 3]) -> Option<(f32, Vec3)> {
        let [a, b, c] = corners;
        let ab = b - a;
        let ac = c - a;

        let across = self.direction.cross(ac);
        let det = ab.dot(across);
        if det.abs() < PICK_EPSILON {
            return None;
        }

        let from_a = self.origin - a;
        let w_b = from_a.dot(across) / det;
        if !(0.0..=1.0).contains(&w_b) {
            return None;
        }

        let up = from_a.cross(ab);
        let w_c = self.direction.dot(up) / det;
        if w_c < 0.0 || w_b + w_c > 1.0 {
            return None;
        }

        let distance = ac.dot(up) / det;
        (distance >= PICK_EPSILON).then(|| (distance, Vec3::new(1.0 - w_b - w_c, w_b, w_c)))
    }
}

/// Closest intersection of a ray with a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Hit point in the ray's space
    pub point: Vec3,
    /// Index of the hit triangle
    pub triangle: usize,
    /// Distance along the ray
    pub distance: f32,
    /// Weights of the triangle's three corners, summing to 1
    pub barycentric: Vec3,
}

/// Cast a ray against an indexed triangle list and return the closest hit.
///
/// Every triangle is tested; triangles referencing out-of-range vertices are
/// skipped.
pub fn raycast_mesh(ray: &Ray, positions: &[Vec3], indices: &[u32]) -> Option<MeshHit> {
    indices
        .chunks_exact(3)
        .enumerate()
        .filter_map(|(triangle, tri)| {
            let corners = [
                *positions.get(tri[0] as usize)?,
                *positions.get(tri[1] as usize)?,
                *positions.get(tri[2] as usize)?,
            ];
            let (distance, barycentric) = ray.cast_triangle(corners)?;
            Some(MeshHit {
                point: ray.at(distance),
                triangle,
                distance,
                barycentric,
            })
        })
        .min_by(|x, y| x.distance.total_cmp(&y.distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT_TRIANGLE: [Vec3; 3] = [Vec3::ZERO, Vec3::X, Vec3::Y];

    fn quad() -> (Vec<Vec3>, Vec<u32>) {
        (
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 1, 3, 2],
        )
    }

    #[test]
    fn test_cast_triangle_hit() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);
        let (distance, weights) = ray.cast_triangle(UNIT_TRIANGLE).unwrap();
        assert!((distance - 1.0).abs() < 1e-6);
        assert!((weights - Vec3::new(0.5, 0.25, 0.25)).length() < 1e-6);
    }

    #[test]
    fn test_cast_triangle_is_two_sided() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, -1.0), Vec3::Z);
        assert!(ray.cast_triangle(UNIT_TRIANGLE).is_some());
    }

    #[test]
    fn test_cast_triangle_miss_behind_and_parallel() {
        let outside = Ray::new(Vec3::new(2.0, 2.0, 1.0), Vec3::NEG_Z);
        assert!(outside.cast_triangle(UNIT_TRIANGLE).is_none());

        let behind = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(behind.cast_triangle(UNIT_TRIANGLE).is_none());

        let grazing = Ray::new(Vec3::new(-1.0, 0.25, 0.0), Vec3::X);
        assert!(grazing.cast_triangle(UNIT_TRIANGLE).is_none());
    }

    #[test]
    fn test_raycast_mesh_hits_second_triangle() {
        let (positions, indices) = quad();
        let ray = Ray::new(Vec3::new(0.8, 0.8, 2.0), Vec3::NEG_Z);
        let hit = raycast_mesh(&ray, &positions, &indices).unwrap();
        assert_eq!(hit.triangle, 1);
        assert!((hit.point - Vec3::new(0.8, 0.8, 0.0)).length() < 1e-5);
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.barycentric.element_sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_mesh_picks_closest_layer() {
        let mut positions = quad().0;
        positions.extend([
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(1.0, 0.0, 0.5),
            Vec3::new(0.0, 1.0, 0.5),
        ]);
        let indices = vec![0, 1, 2, 4, 5, 6];
        let ray = Ray::new(Vec3::new(0.2, 0.2, 3.0), Vec3::NEG_Z);
        let hit = raycast_mesh(&ray, &positions, &indices).unwrap();
        assert_eq!(hit.triangle, 1);
        assert!((hit.point.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_skips_out_of_range_triangles() {
        let (positions, _) = quad();
        let ray = Ray::new(Vec3::new(0.2, 0.2, 3.0), Vec3::NEG_Z);
        assert!(raycast_mesh(&ray, &positions, &[]).is_none());

        let hit = raycast_mesh(&ray, &positions, &[0, 1, 9, 0, 1, 2]).unwrap();
        assert_eq!(hit.triangle, 1);
    }
}
