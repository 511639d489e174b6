//! Per-vertex simulation storage.
//!
//! Rest pose, live positions, velocities and accelerations are kept as
//! parallel arrays indexed by vertex. The buffer has no behaviour of its own
//! beyond construction, reset and views for the renderer.

use glam::Vec3;

use crate::error::MeshError;

/// Axis-aligned bounding box of the rest pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        };
        for &p in points {
            aabb.min = aabb.min.min(p);
            aabb.max = aabb.max.max(p);
        }
        aabb
    }

    /// Vertical extent as `(min_y, max_y)`.
    pub fn y_range(&self) -> (f32, f32) {
        (self.min.y, self.max.y)
    }
}

/// Structure-of-arrays vertex state owned by the engine.
#[derive(Debug, Clone)]
pub struct VertexBuffer {
    pub(crate) rest: Vec<Vec3>,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) velocities: Vec<Vec3>,
    pub(crate) accelerations: Vec<Vec3>,
}

impl VertexBuffer {
    /// Copy rest positions and zero the dynamic state.
    pub fn init(rest: &[Vec3]) -> Result<Self, MeshError> {
        if rest.is_empty() {
            return Err(MeshError::Empty);
        }
        if let Some(index) = rest.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::NonFinite { index });
        }

        Ok(Self {
            rest: rest.to_vec(),
            positions: rest.to_vec(),
            velocities: vec![Vec3::ZERO; rest.len()],
            accelerations: vec![Vec3::ZERO; rest.len()],
        })
    }

    /// Build from a flat `[x, y, z, x, y, z, ...]` position array.
    pub fn from_flat(flat: &[f32]) -> Result<Self, MeshError> {
        if flat.len() % 3 != 0 {
            return Err(MeshError::RaggedPositions(flat.len()));
        }
        let rest: Vec<Vec3> = flat.chunks_exact(3).map(Vec3::from_slice).collect();
        Self::init(&rest)
    }

    /// Restore the rest pose and drop all motion.
    pub fn reset(&mut self) {
        self.positions.copy_from_slice(&self.rest);
        self.velocities.fill(Vec3::ZERO);
        self.accelerations.fill(Vec3::ZERO);
    }

    pub fn count(&self) -> usize {
        self.rest.len()
    }

    pub fn clear_accelerations(&mut self) {
        self.accelerations.fill(Vec3::ZERO);
    }

    pub fn rest(&self) -> &[Vec3] {
        &self.rest
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn accelerations(&self) -> &[Vec3] {
        &self.accelerations
    }

    /// Live positions as a flat `f32` slice, three floats per vertex.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Rest-pose bounds.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.rest)
    }

    /// Largest per-axis displacement from rest over all vertices.
    pub fn max_displacement(&self) -> Vec3 {
        self.positions
            .iter()
            .zip(&self.rest)
            .fold(Vec3::ZERO, |acc, (p, r)| acc.max((*p - *r).abs()))
    }

    /// Overwrite a vertex's live position (hosts and tests).
    pub fn set_position(&mut self, index: usize, position: Vec3) {
        if let Some(p) = self.positions.get_mut(index) {
            *p = position;
        }
    }

    /// Overwrite a vertex's velocity (hosts and tests).
    pub fn set_velocity(&mut self, index: usize, velocity: Vec3) {
        if let Some(v) = self.velocities.get_mut(index) {
            *v = velocity;
        }
    }
}
