//! Ground plane and sampled self-collision.
//!
//! Self-collision only checks vertices on a coarse index lattice so the cost
//! stays roughly constant as meshes grow. It keeps dense regions from
//! collapsing onto themselves; it does not prevent interpenetration.

use glam::Vec3;

use crate::buffer::VertexBuffer;

/// Pairs closer than this are treated as coincident and left alone.
const MIN_SEPARATION: f32 = 1e-4;

/// Snap vertices below `ground_height` onto it and bounce their vertical
/// velocity with `restitution`. Returns the contact count.
pub fn resolve_ground(buffer: &mut VertexBuffer, ground_height: f32, restitution: f32) -> usize {
    let mut contacts = 0;
    for (p, v) in buffer.positions.iter_mut().zip(buffer.velocities.iter_mut()) {
        if p.y < ground_height {
            p.y = ground_height;
            v.y = -v.y * restitution;
            contacts += 1;
        }
    }
    contacts
}

/// Index stride for self-collision sampling, never below 1.
pub fn collision_stride(count: usize, samples: usize) -> usize {
    (count / samples.max(1)).max(1)
}

/// Push sampled vertex pairs closer than `threshold` apart.
///
/// Each vertex of a colliding pair moves by half the penetration along the
/// line between them, and both velocities are scaled by `velocity_damping`.
/// Returns the contact count.
pub fn resolve_self(
    buffer: &mut VertexBuffer,
    threshold: f32,
    samples: usize,
    velocity_damping: f32,
) -> usize {
    let n = buffer.count();
    let stride = collision_stride(n, samples);
    let positions = &mut buffer.positions;
    let velocities = &mut buffer.velocities;
    let mut contacts = 0;

    for i in (0..n).step_by(stride) {
        for j in ((i + stride)..n).step_by(stride) {
            let delta = positions[j] - positions[i];
            let dist = delta.length();
            if dist >= threshold || dist <= MIN_SEPARATION {
                continue;
            }

            let push: Vec3 = delta / dist * ((threshold - dist) * 0.5);
            positions[i] -= push;
            positions[j] += push;
            velocities[i] *= velocity_damping;
            velocities[j] *= velocity_damping;
            contacts += 1;
        }
    }

    contacts
}
