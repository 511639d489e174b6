//! Drag controller: pointer input to drag point and whole-mesh motion.
//!
//! ```text
//! Idle --down(hit)--> Dragging --up/leave--> Releasing --settled--> Idle
//!                        ^                       |
//!                        +-------down(hit)-------+
//! ```
//!
//! While dragging, horizontal pointer motion spins the mesh and feeds
//! targets for the translation offset and tilt, which follow through
//! critically damped springs. After release the spin, offset and tilt decay
//! multiplicatively and snap to exactly zero once negligible.

use std::ops::{Add, Mul, Sub};

use glam::Vec3;
use tracing::debug;
use wiggle_config::DragConfig;

use crate::transform::RigidTransform;

/// Lifecycle phase of a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
    Releasing,
}

/// What a pointer event did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Pointer-down hit the mesh; a drag started
    Grabbed,
    /// Pointer-down missed the mesh; nothing changed
    Missed,
    /// Drag updated by a move
    Moved,
    /// Drag ended; residual motion is decaying
    Released,
    /// Event not meaningful in the current phase
    Ignored,
}

/// Drag state read by the force pass and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    pub phase: DragPhase,
    /// Grabbed point in mesh-local space, set only while dragging
    pub drag_point_local: Option<Vec3>,
    pub rotation_velocity: f32,
    pub rotation_angle: f32,
    pub translation_offset: Vec3,
    pub tilt_angle: f32,
    offset_target: Vec3,
    offset_velocity: Vec3,
    tilt_target: f32,
    tilt_velocity: f32,
    last_pointer_x: f32,
}

impl DragState {
    /// True while the pointer is holding the mesh.
    pub fn active(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Drag point to attract toward, if the drag is active.
    pub fn attractor(&self) -> Option<Vec3> {
        if self.active() {
            self.drag_point_local
        } else {
            None
        }
    }

    /// Whether all residual motion has come to rest.
    pub fn is_settled(&self) -> bool {
        self.rotation_velocity == 0.0
            && self.translation_offset == Vec3::ZERO
            && self.tilt_angle == 0.0
    }
}

/// Converts pointer events into drag state.
#[derive(Debug, Clone)]
pub struct DragController {
    config: DragConfig,
    state: DragState,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            state: DragState::default(),
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn phase(&self) -> DragPhase {
        self.state.phase
    }

    /// Drop all drag state, keeping the configuration.
    pub fn reset(&mut self) {
        self.state = DragState::default();
    }

    /// Pointer pressed. `hit` is the mesh-local intersection, if any.
    pub fn pointer_down(&mut self, screen_x: f32, hit: Option<Vec3>) -> PointerOutcome {
        let Some(point) = hit else {
            debug!("pointer down missed the mesh; staying {:?}", self.state.phase);
            return PointerOutcome::Missed;
        };

        let state = &mut self.state;
        if state.phase != DragPhase::Dragging {
            debug!("drag {:?} -> Dragging at {:?}", state.phase, point);
        }
        state.phase = DragPhase::Dragging;
        state.drag_point_local = Some(point);
        state.last_pointer_x = screen_x;
        // Springs pick up from wherever residual motion left off
        state.offset_target = state.translation_offset;
        state.offset_velocity = Vec3::ZERO;
        state.tilt_target = state.tilt_angle;
        state.tilt_velocity = 0.0;
        PointerOutcome::Grabbed
    }

    /// Pointer moved. A fresh `hit` slides the drag point over the surface;
    /// a miss keeps the previous point.
    pub fn pointer_move(&mut self, screen_x: f32, hit: Option<Vec3>) -> PointerOutcome {
        if !self.state.active() {
            return PointerOutcome::Ignored;
        }

        let cfg = &self.config;
        let state = &mut self.state;
        let dx = screen_x - state.last_pointer_x;
        state.last_pointer_x = screen_x;

        state.rotation_velocity = dx * cfg.rotation_speed;
        state.rotation_angle += state.rotation_velocity;

        let lateral = dx * cfg.drag_force * 0.01 * 0.3;
        let forward = dx.abs() * cfg.drag_force * 0.008 * 0.3;
        state.offset_target =
            (state.offset_target + Vec3::new(lateral, 0.0, -forward)).clamp_length_max(cfg.max_offset);

        state.tilt_target = if dx == 0.0 {
            0.0
        } else {
            dx.signum() * (dx.abs() * cfg.tilt_per_pixel).min(cfg.max_tilt)
        };

        if let Some(point) = hit {
            state.drag_point_local = Some(point);
        }
        PointerOutcome::Moved
    }

    /// Pointer released. The drag point goes away immediately; motion decays.
    pub fn pointer_up(&mut self) -> PointerOutcome {
        if !self.state.active() {
            return PointerOutcome::Ignored;
        }
        debug!("drag Dragging -> Releasing");
        let state = &mut self.state;
        state.phase = DragPhase::Releasing;
        state.drag_point_local = None;
        state.offset_velocity = Vec3::ZERO;
        state.tilt_velocity = 0.0;
        PointerOutcome::Released
    }

    /// Pointer left the viewport; same as release.
    pub fn pointer_leave(&mut self) -> PointerOutcome {
        self.pointer_up()
    }

    /// Advance one simulation tick.
    pub fn tick(&mut self, dt: f32) -> DragPhase {
        match self.state.phase {
            DragPhase::Idle => {}
            DragPhase::Dragging => self.follow_targets(dt),
            DragPhase::Releasing => self.decay(),
        }
        self.state.phase
    }

    /// Whole-mesh transform for the current state.
    pub fn transform(&self, scale: f32) -> RigidTransform {
        RigidTransform {
            rotation_y: self.state.rotation_angle,
            tilt_z: self.state.tilt_angle,
            tilt_x: self.state.tilt_angle * self.config.secondary_tilt_ratio,
            translation: self.state.translation_offset,
            scale,
        }
    }

    fn follow_targets(&mut self, dt: f32) {
        let omega = std::f32::consts::TAU * self.config.follow_frequency_hz;
        let state = &mut self.state;

        (state.translation_offset, state.offset_velocity) = critically_damped_step(
            state.translation_offset,
            state.offset_velocity,
            state.offset_target,
            omega,
            dt,
        );
        (state.tilt_angle, state.tilt_velocity) = critically_damped_step(
            state.tilt_angle,
            state.tilt_velocity,
            state.tilt_target,
            omega,
            dt,
        );
    }

    fn decay(&mut self) {
        let cfg = &self.config;
        let eps = cfg.rest_epsilon;
        let state = &mut self.state;

        state.rotation_angle += state.rotation_velocity;
        state.rotation_velocity *= cfg.rotation_decay;
        if state.rotation_velocity.abs() < eps {
            state.rotation_velocity = 0.0;
        }

        state.translation_offset *= cfg.offset_retention();
        if state.translation_offset.length() < eps {
            state.translation_offset = Vec3::ZERO;
        }

        state.tilt_angle *= cfg.tilt_decay;
        if state.tilt_angle.abs() < eps {
            state.tilt_angle = 0.0;
        }

        if state.is_settled() {
            debug!("drag Releasing -> Idle");
            state.phase = DragPhase::Idle;
            state.offset_target = Vec3::ZERO;
            state.tilt_target = 0.0;
        }
    }
}

/// Exact step of a critically damped spring toward `target`.
///
/// Returns the new value and velocity. Never overshoots when starting at rest.
fn critically_damped_step<T>(current: T, velocity: T, target: T, omega: f32, dt: f32) -> (T, T)
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    let x0 = current - target;
    let c = velocity + x0 * omega;
    let decay = (-omega * dt).exp();
    let x = (x0 + c * dt) * decay;
    let v = (velocity - c * (omega * dt)) * decay;
    (target + x, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grabbed() -> DragController {
        let mut controller = DragController::new(DragConfig::default());
        assert_eq!(
            controller.pointer_down(100.0, Some(Vec3::ZERO)),
            PointerOutcome::Grabbed
        );
        controller
    }

    #[test]
    fn test_miss_stays_idle() {
        let mut controller = DragController::new(DragConfig::default());
        assert_eq!(controller.pointer_down(10.0, None), PointerOutcome::Missed);
        assert_eq!(controller.phase(), DragPhase::Idle);
        assert_eq!(controller.pointer_move(50.0, None), PointerOutcome::Ignored);
        assert_eq!(controller.state().rotation_velocity, 0.0);
    }

    #[test]
    fn test_move_spins_and_records_drag_point() {
        let mut controller = grabbed();
        let outcome = controller.pointer_move(150.0, Some(Vec3::new(0.1, 0.0, 0.0)));
        assert_eq!(outcome, PointerOutcome::Moved);

        let state = controller.state();
        assert!((state.rotation_velocity - 0.75).abs() < 1e-6);
        assert!((state.rotation_angle - 0.75).abs() < 1e-6);
        assert_eq!(state.drag_point_local, Some(Vec3::new(0.1, 0.0, 0.0)));
        assert_eq!(state.attractor(), Some(Vec3::new(0.1, 0.0, 0.0)));
    }

    #[test]
    fn test_move_miss_keeps_drag_point() {
        let mut controller = grabbed();
        controller.pointer_move(110.0, None);
        assert_eq!(controller.state().drag_point_local, Some(Vec3::ZERO));
    }

    #[test]
    fn test_offset_and_tilt_follow_targets() {
        let mut controller = grabbed();
        controller.pointer_move(130.0, None);

        let mut last_tilt = 0.0;
        for _ in 0..30 {
            controller.tick(1.0 / 60.0);
            let tilt = controller.state().tilt_angle;
            // Critically damped from rest: approaches without overshoot
            assert!(tilt >= last_tilt - 1e-6);
            assert!(tilt <= 0.3 + 1e-6);
            last_tilt = tilt;
        }
        let state = controller.state();
        assert!(state.tilt_angle > 0.25);
        assert!(state.translation_offset.x > 0.0);
        assert!(state.translation_offset.z < 0.0);
    }

    #[test]
    fn test_tilt_target_is_capped() {
        let mut controller = grabbed();
        controller.pointer_move(-900.0, None);
        for _ in 0..240 {
            controller.tick(1.0 / 60.0);
        }
        let tilt = controller.state().tilt_angle;
        assert!(tilt < 0.0);
        assert!((tilt + 0.4).abs() < 1e-3);
    }

    #[test]
    fn test_offset_target_is_bounded() {
        let mut controller = grabbed();
        for i in 1..200 {
            controller.pointer_move(100.0 + i as f32 * 400.0, None);
        }
        for _ in 0..240 {
            controller.tick(1.0 / 60.0);
        }
        assert!(controller.state().translation_offset.length() <= 0.6 + 1e-3);
    }

    #[test]
    fn test_release_clears_drag_point_but_keeps_motion() {
        let mut controller = grabbed();
        controller.pointer_move(150.0, None);
        controller.tick(1.0 / 60.0);
        assert_eq!(controller.pointer_up(), PointerOutcome::Released);

        let state = controller.state();
        assert_eq!(state.phase, DragPhase::Releasing);
        assert_eq!(state.drag_point_local, None);
        assert_eq!(state.attractor(), None);
        assert!(state.rotation_velocity > 0.0);
        assert!(state.translation_offset.length() > 0.0);
        assert!(state.tilt_angle > 0.0);
    }

    #[test]
    fn test_leave_behaves_like_up() {
        let mut controller = grabbed();
        assert_eq!(controller.pointer_leave(), PointerOutcome::Released);
        assert_eq!(controller.phase(), DragPhase::Releasing);
        assert_eq!(controller.pointer_leave(), PointerOutcome::Ignored);
    }

    #[test]
    fn test_release_decays_monotonically_to_exact_zero() {
        let mut controller = grabbed();
        controller.pointer_move(150.0, None);
        for _ in 0..10 {
            controller.tick(1.0 / 60.0);
        }
        controller.pointer_up();

        let mut prev = *controller.state();
        let mut ticks = 0;
        while controller.phase() == DragPhase::Releasing {
            controller.tick(1.0 / 60.0);
            let state = *controller.state();
            assert!(state.rotation_velocity.abs() <= prev.rotation_velocity.abs());
            assert!(state.translation_offset.length() <= prev.translation_offset.length());
            assert!(state.tilt_angle.abs() <= prev.tilt_angle.abs());
            if prev.rotation_velocity != 0.0 {
                assert!(state.rotation_velocity.abs() < prev.rotation_velocity.abs());
            }
            prev = state;
            ticks += 1;
            assert!(ticks < 500, "release never settled");
        }

        let state = controller.state();
        assert_eq!(state.phase, DragPhase::Idle);
        assert_eq!(state.rotation_velocity, 0.0);
        assert_eq!(state.translation_offset, Vec3::ZERO);
        assert_eq!(state.tilt_angle, 0.0);
        // Spin is kept, not unwound
        assert!(state.rotation_angle > 0.75);
    }

    #[test]
    fn test_regrab_during_release() {
        let mut controller = grabbed();
        controller.pointer_move(150.0, None);
        controller.pointer_up();
        controller.tick(1.0 / 60.0);
        let residual = controller.state().rotation_velocity;

        assert_eq!(
            controller.pointer_down(300.0, Some(Vec3::Y)),
            PointerOutcome::Grabbed
        );
        let state = controller.state();
        assert_eq!(state.phase, DragPhase::Dragging);
        assert_eq!(state.rotation_velocity, residual);
        assert_eq!(state.drag_point_local, Some(Vec3::Y));
    }

    #[test]
    fn test_transform_reflects_state() {
        let mut controller = grabbed();
        controller.pointer_move(120.0, None);
        controller.tick(1.0 / 60.0);
        let state = *controller.state();
        let transform = controller.transform(1.5);
        assert_eq!(transform.rotation_y, state.rotation_angle);
        assert_eq!(transform.tilt_z, state.tilt_angle);
        assert!((transform.tilt_x - state.tilt_angle * 0.3).abs() < 1e-7);
        assert_eq!(transform.translation, state.translation_offset);
        assert_eq!(transform.scale, 1.5);
    }

    #[test]
    fn test_critically_damped_step_converges() {
        let mut x = 0.0_f32;
        let mut v = 0.0_f32;
        for _ in 0..120 {
            (x, v) = critically_damped_step(x, v, 1.0, 25.0, 1.0 / 60.0);
            assert!(x <= 1.0 + 1e-6);
        }
        assert!((x - 1.0).abs() < 1e-3);
        assert!(v.abs() < 1e-2);
    }
}
