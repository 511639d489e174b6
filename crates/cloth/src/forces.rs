//! Per-frame force accumulation.
//!
//! Every frame the acceleration array is cleared and rebuilt from, in order:
//! gravity, procedural wind, micro-wrinkle noise, structural springs, shear
//! springs, bend (shape) restoration and drag attraction. The order is fixed
//! so results are reproducible bit for bit.
//!
//! Spring pairs come from a bounded forward window over the vertex order
//! rather than real adjacency; mesh exporters emit spatially coherent vertex
//! order, so nearby indices are nearby points.

use glam::Vec3;
use wiggle_config::PhysicsConfig;

use crate::buffer::VertexBuffer;
use crate::drag::DragState;

/// Separations below this are treated as coincident (no direction).
const MIN_SEPARATION: f32 = 1e-4;

/// A spring between two vertices with its rest length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringPair {
    pub a: usize,
    pub b: usize,
    pub rest_length: f32,
}

/// Counters from one accumulation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForceStats {
    /// Structural springs that produced a force
    pub structural_active: usize,
    /// Shear springs that produced a force
    pub shear_active: usize,
    /// Vertices inside the drag radius
    pub dragged_vertices: usize,
}

/// Precomputed per-mesh data for force accumulation.
#[derive(Debug, Clone)]
pub struct ForceAccumulator {
    structural: Vec<SpringPair>,
    shear: Vec<SpringPair>,
    /// Wind/wrinkle phase shift per vertex, from anchor looseness
    phase_bias: Vec<f32>,
}

impl ForceAccumulator {
    /// Find spring pairs in the rest pose and bake the anchor phase bias.
    ///
    /// Structural pairs scan `i+1 .. i+window`; shear pairs scan
    /// `i+window .. i+2*window` every `shear_stride` indices with a looser
    /// rest-distance threshold.
    pub fn new(rest: &[Vec3], looseness: &[f32], config: &PhysicsConfig) -> Self {
        let n = rest.len();
        let window = config.structural_window.max(1);
        let stride = config.shear_stride.max(1);
        let mut structural = Vec::new();
        let mut shear = Vec::new();

        let structural_reach = window.min(n);
        let shear_reach = window.saturating_mul(2).min(n);

        for a in 0..n {
            for b in (a + 1)..a.saturating_add(structural_reach).min(n) {
                let rest_length = rest[a].distance(rest[b]);
                if rest_length < config.structural_rest_threshold {
                    structural.push(SpringPair { a, b, rest_length });
                }
            }

            let shear_start = a.saturating_add(window).min(n);
            for b in (shear_start..a.saturating_add(shear_reach).min(n)).step_by(stride) {
                let rest_length = rest[a].distance(rest[b]);
                if rest_length < config.shear_rest_threshold {
                    shear.push(SpringPair { a, b, rest_length });
                }
            }
        }

        let phase_bias = (0..n)
            .map(|i| looseness.get(i).copied().unwrap_or(0.0) * config.anchor_phase_bias)
            .collect();

        Self {
            structural,
            shear,
            phase_bias,
        }
    }

    pub fn structural_springs(&self) -> &[SpringPair] {
        &self.structural
    }

    pub fn shear_springs(&self) -> &[SpringPair] {
        &self.shear
    }

    /// Rebuild the acceleration array for this frame.
    ///
    /// Every term is written straight into the acceleration array; the tuned
    /// stiffnesses already fold in the vertex mass. The drag pass also damps
    /// the velocity of dragged vertices directly, which keeps the grabbed
    /// region from oscillating against the attraction.
    pub fn accumulate(
        &self,
        buffer: &mut VertexBuffer,
        drag: &DragState,
        config: &PhysicsConfig,
        time: f32,
    ) -> ForceStats {
        buffer.clear_accelerations();
        let VertexBuffer {
            rest,
            positions,
            velocities,
            accelerations,
        } = buffer;
        let mut stats = ForceStats::default();

        // External: gravity, wind, micro-wrinkle
        let wind_t = time * config.wind_frequency;
        let k = config.wrinkle_frequency;
        let amp = config.wrinkle_amplitude;
        for (i, (acc, &p)) in accelerations.iter_mut().zip(positions.iter()).enumerate() {
            let fi = i as f32;
            let phase = self.phase_bias.get(i).copied().unwrap_or(0.0);

            *acc += config.gravity;

            let wind = Vec3::new(
                (wind_t + fi * 0.1 + phase).sin(),
                0.0,
                (wind_t * 0.7 + fi * 0.15 + phase).cos(),
            ) * config.wind_strength;
            *acc += wind;

            let wrinkle = Vec3::new(
                (time * 1.5 + fi * k + p.x * 5.0 + phase).sin(),
                (time * 1.2 + fi * k * 0.8 + p.y * 5.0 + phase).cos(),
                (time * 1.3 + fi * k * 1.2 + p.z * 5.0 + phase).sin(),
            ) * amp;
            *acc += wrinkle;
        }

        // Structural springs, both ends
        let k_structural = config.structural_stiffness;
        for spring in &self.structural {
            if let Some(f) = spring_force(positions, spring, k_structural) {
                accelerations[spring.a] += f;
                accelerations[spring.b] -= f;
                stats.structural_active += 1;
            }
        }

        // Shear springs
        let k_shear = config.shear_stiffness;
        for spring in &self.shear {
            if let Some(f) = spring_force(positions, spring, k_shear) {
                accelerations[spring.a] += f;
                if config.symmetric_shear {
                    accelerations[spring.b] -= f;
                }
                stats.shear_active += 1;
            }
        }

        // Bend: zero-length spring to rest
        let k_bend = config.bend_stiffness;
        for ((acc, &p), &r) in accelerations.iter_mut().zip(positions.iter()).zip(rest.iter()) {
            *acc += (r - p) * k_bend;
        }

        // Drag interaction
        if let Some(point) = drag.attractor() {
            let radius = config.drag_radius;
            let (spread_x, spread_z) = (time * 3.0).sin_cos();

            for ((acc, vel), &p) in accelerations
                .iter_mut()
                .zip(velocities.iter_mut())
                .zip(positions.iter())
            {
                let to_point = point - p;
                let dist = to_point.length();
                if dist >= radius {
                    continue;
                }

                let influence = drag_influence(dist, radius, config.drag_falloff_power);
                let attraction = config.drag_stiffness * influence;
                let mut force = Vec3::ZERO;

                if dist > MIN_SEPARATION {
                    let dir = to_point / dist;
                    force += dir * attraction;

                    // Folds spreading outward from the grab
                    let spread = attraction * config.drag_radial_spread;
                    force.x -= dir.x * spread * spread_x;
                    force.z -= dir.z * spread * spread_z;
                }

                let ripple = (time * 8.0 - dist * 15.0).sin();
                force.y += ripple * config.drag_ripple_amplitude * influence;

                *acc += force;
                *vel *= 1.0 - config.drag_damping * influence;
                stats.dragged_vertices += 1;
            }
        }

        stats
    }
}

/// Drag influence at `dist` from the drag point, 1 at the point and 0 at the rim.
pub fn drag_influence(dist: f32, radius: f32, power: f32) -> f32 {
    (1.0 - (dist / radius).clamp(0.0, 1.0)).powf(power)
}

/// Hookean force on `spring.a`, along the current separation.
fn spring_force(positions: &[Vec3], spring: &SpringPair, stiffness: f32) -> Option<Vec3> {
    let delta = positions[spring.b] - positions[spring.a];
    let dist = delta.length();
    if dist <= MIN_SEPARATION {
        return None;
    }
    Some(delta / dist * ((dist - spring.rest_length) * stiffness))
}
