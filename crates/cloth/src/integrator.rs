//! Semi-implicit Euler integration and the displacement envelope.

use glam::Vec3;
use wiggle_config::{EnvelopeConfig, PhysicsConfig};

use crate::buffer::VertexBuffer;

/// Sanitize a frame delta: non-finite or negative becomes 0, otherwise it is
/// capped at `max_dt` so a stalled frame cannot blow the simulation up.
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if !dt.is_finite() || dt < 0.0 {
        return 0.0;
    }
    dt.min(max_dt)
}

/// Per-vertex, per-axis bound on displacement from rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    extents: Vec<Vec3>,
}

impl Envelope {
    /// Looser vertices (far from any anchor) get a wider envelope.
    pub fn from_looseness(looseness: &[f32], config: &EnvelopeConfig) -> Self {
        Self {
            extents: looseness.iter().map(|&l| config.extent(l)).collect(),
        }
    }

    /// Envelope half-extent of a vertex. Vertices past the end get zero.
    pub fn extent(&self, index: usize) -> Vec3 {
        self.extents.get(index).copied().unwrap_or(Vec3::ZERO)
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Whether `position` lies inside the envelope of vertex `index`.
    pub fn contains(&self, index: usize, rest: Vec3, position: Vec3) -> bool {
        let extent = self.extent(index);
        ((position - rest).abs() - extent).max_element() <= 1e-6
    }
}

/// Advance velocities and positions by `dt`, then enforce the envelope.
///
/// Returns the number of vertices the envelope had to clamp.
pub fn step(buffer: &mut VertexBuffer, envelope: &Envelope, config: &PhysicsConfig, dt: f32) -> usize {
    let VertexBuffer {
        positions,
        velocities,
        accelerations,
        ..
    } = &mut *buffer;

    for ((p, v), &a) in positions
        .iter_mut()
        .zip(velocities.iter_mut())
        .zip(accelerations.iter())
    {
        *v += a * dt;
        *v *= config.damping;
        *p += *v * dt;
    }

    enforce_envelope(buffer, envelope)
}

/// Clamp every axis into `[rest - extent, rest + extent]`.
///
/// Velocities are left alone; the per-frame damping bleeds off whatever
/// pushes against the wall.
pub fn enforce_envelope(buffer: &mut VertexBuffer, envelope: &Envelope) -> usize {
    let mut clamped = 0;
    for (i, (p, &r)) in buffer
        .positions
        .iter_mut()
        .zip(buffer.rest.iter())
        .enumerate()
    {
        let extent = envelope.extent(i);
        let bounded = p.clamp(r - extent, r + extent);
        if bounded != *p {
            *p = bounded;
            clamped += 1;
        }
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_envelope(count: usize) -> Envelope {
        Envelope::from_looseness(&vec![0.0; count], &EnvelopeConfig::default())
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(0.016, 1.0 / 30.0), 0.016);
        assert_eq!(clamp_dt(0.5, 1.0 / 30.0), 1.0 / 30.0);
        assert_eq!(clamp_dt(-0.1, 1.0 / 30.0), 0.0);
        assert_eq!(clamp_dt(f32::NAN, 1.0 / 30.0), 0.0);
        assert_eq!(clamp_dt(f32::INFINITY, 1.0 / 30.0), 0.0);
    }

    #[test]
    fn test_envelope_widens_with_looseness() {
        let config = EnvelopeConfig::default();
        let envelope = Envelope::from_looseness(&[0.0, 1.0, 10.0], &config);
        assert_eq!(envelope.len(), 3);
        assert_eq!(envelope.extent(0), config.base);
        assert_eq!(envelope.extent(1), config.base + config.growth);
        // Capped
        assert_eq!(envelope.extent(2), config.base + config.growth * config.looseness_cap);
        assert_eq!(envelope.extent(3), Vec3::ZERO);
    }

    #[test]
    fn test_step_semi_implicit_euler() {
        let config = PhysicsConfig {
            damping: 0.5,
            ..Default::default()
        };
        let mut buffer = VertexBuffer::init(&[Vec3::ZERO]).unwrap();
        buffer.accelerations[0] = Vec3::new(0.0, -1.0, 0.0);

        step(&mut buffer, &uniform_envelope(1), &config, 0.1);
        // v = (0 + -1 * 0.1) * 0.5, p = v * 0.1
        assert!((buffer.velocities()[0].y + 0.05).abs() < 1e-7);
        assert!((buffer.positions()[0].y + 0.005).abs() < 1e-7);
    }

    #[test]
    fn test_zero_dt_only_damps() {
        let config = PhysicsConfig::default();
        let mut buffer = VertexBuffer::init(&[Vec3::ZERO]).unwrap();
        buffer.set_velocity(0, Vec3::ONE);
        buffer.accelerations[0] = Vec3::splat(100.0);

        step(&mut buffer, &uniform_envelope(1), &config, 0.0);
        assert_eq!(buffer.positions()[0], Vec3::ZERO);
        assert_eq!(buffer.velocities()[0], Vec3::splat(config.damping));
    }

    #[test]
    fn test_step_enforces_envelope() {
        let config = PhysicsConfig::default();
        let envelope = uniform_envelope(1);
        let mut buffer = VertexBuffer::init(&[Vec3::ZERO]).unwrap();
        buffer.set_velocity(0, Vec3::new(100.0, -100.0, 0.0));

        let clamped = step(&mut buffer, &envelope, &config, 1.0 / 30.0);
        assert_eq!(clamped, 1);
        let p = buffer.positions()[0];
        assert_eq!(p.x, envelope.extent(0).x);
        assert_eq!(p.y, -envelope.extent(0).y);
        assert!(envelope.contains(0, Vec3::ZERO, p));
    }

    #[test]
    fn test_enforce_envelope_leaves_interior_alone() {
        let envelope = uniform_envelope(2);
        let mut buffer = VertexBuffer::init(&[Vec3::ZERO, Vec3::ONE]).unwrap();
        buffer.set_position(0, Vec3::new(0.01, -0.01, 0.0));
        buffer.set_position(1, Vec3::ONE + Vec3::new(0.5, 0.0, 0.0));

        assert_eq!(enforce_envelope(&mut buffer, &envelope), 1);
        assert_eq!(buffer.positions()[0], Vec3::new(0.01, -0.01, 0.0));
        assert_eq!(buffer.positions()[1].x, 1.0 + envelope.extent(1).x);
    }
}
