//! Simulation orchestration.
//!
//! One call to [`ClothEngine::step`] runs a full frame in a fixed order:
//! 1. Pending pointer events → mesh-local ray → raycast → drag controller
//! 2. Drag controller tick (follow springs or release decay)
//! 3. Force accumulation
//! 4. Integration + displacement envelope
//! 5. Ground collision, then sampled self-collision
//! 6. Envelope re-enforcement
//! 7. Dirty flag for normal recomputation
//!
//! The engine is single-threaded and frame-driven. It owns every piece of
//! per-mesh state; renderers borrow position and normal views between steps.

use glam::Vec3;
use tracing::{debug, info, trace, warn};
use wiggle_config::PhysicsConfig;

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

use crate::anchors::InfluenceAnchors;
use crate::buffer::VertexBuffer;
use crate::collision::{resolve_ground, resolve_self};
use crate::drag::{DragController, DragPhase, DragState, PointerOutcome};
use crate::error::{EngineError, MeshError};
use crate::forces::{ForceAccumulator, ForceStats};
use crate::input::{PointerEvent, PointerQueue};
use crate::integrator::{self, Envelope, clamp_dt, enforce_envelope};
use crate::normals::compute_vertex_normals;
use crate::raycast::{Ray, raycast_mesh};
use crate::transform::RigidTransform;

/// What happened during one [`ClothEngine::step`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Delta actually simulated, after clamping
    pub dt: f32,
    /// Simulation time after the step
    pub sim_time: f32,
    /// Drag phase after the controller tick
    pub phase: DragPhase,
    /// Pointer events consumed this step
    pub pointer_events: usize,
    pub forces: ForceStats,
    /// Vertices clamped by the envelope (both passes)
    pub envelope_clamped: usize,
    pub ground_contacts: usize,
    pub self_contacts: usize,
}

/// Drag-driven cloth deformation for one mesh.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bevy", derive(Resource))]
pub struct ClothEngine {
    config: PhysicsConfig,
    buffer: VertexBuffer,
    indices: Vec<u32>,
    anchors: InfluenceAnchors,
    looseness: Vec<f32>,
    envelope: Envelope,
    forces: ForceAccumulator,
    drag: DragController,
    pointer_queue: PointerQueue,
    normals: Vec<Vec3>,
    normals_dirty: bool,
    sim_time: f32,
}

impl ClothEngine {
    /// Validate the mesh and configuration and build all per-mesh state.
    ///
    /// `indices` is a triangle list; it may be empty, in which case the mesh
    /// can still be simulated but never picked.
    pub fn new(rest: &[Vec3], indices: &[u32], config: PhysicsConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let buffer = VertexBuffer::init(rest)?;
        validate_indices(indices, buffer.count())?;

        let anchors =
            InfluenceAnchors::build_with_layout(buffer.bounds().y_range(), &config.anchors);
        let looseness = anchors.looseness(buffer.rest(), config.envelope.looseness_cap);
        let envelope = Envelope::from_looseness(&looseness, &config.envelope);
        let forces = ForceAccumulator::new(buffer.rest(), &looseness, &config);

        let mut normals = Vec::with_capacity(buffer.count());
        compute_vertex_normals(buffer.positions(), indices, &mut normals);

        info!(
            "Cloth engine ready: {} vertices, {} triangles, {} anchors, {} structural / {} shear springs",
            buffer.count(),
            indices.len() / 3,
            anchors.len(),
            forces.structural_springs().len(),
            forces.shear_springs().len(),
        );

        Ok(Self {
            drag: DragController::new(config.drag.clone()),
            config,
            buffer,
            indices: indices.to_vec(),
            anchors,
            looseness,
            envelope,
            forces,
            pointer_queue: PointerQueue::new(),
            normals,
            normals_dirty: false,
            sim_time: 0.0,
        })
    }

    /// Build from a flat `[x, y, z, ...]` position array.
    pub fn from_flat(flat: &[f32], indices: &[u32], config: PhysicsConfig) -> Result<Self, EngineError> {
        let rest: Vec<Vec3> = VertexBuffer::from_flat(flat)?.rest().to_vec();
        Self::new(&rest, indices, config)
    }

    /// Queue a pointer event for the next step.
    pub fn push_pointer(&mut self, event: PointerEvent) {
        self.pointer_queue.push(event);
    }

    /// Advance the simulation by one frame.
    pub fn step(&mut self, dt: f32) -> StepReport {
        let clamped_dt = clamp_dt(dt, self.config.max_dt);
        if !dt.is_finite() || dt < 0.0 {
            warn!("Rejected frame delta {dt}; simulating a zero-length step");
        } else if clamped_dt < dt {
            warn!("Frame delta {dt:.4}s clamped to {clamped_dt:.4}s");
        }
        self.sim_time += clamped_dt;

        let pointer_events = self.process_pointer_events();
        let phase = self.drag.tick(clamped_dt);

        let forces =
            self.forces
                .accumulate(&mut self.buffer, self.drag.state(), &self.config, self.sim_time);

        let mut envelope_clamped =
            integrator::step(&mut self.buffer, &self.envelope, &self.config, clamped_dt);

        let ground_contacts =
            resolve_ground(&mut self.buffer, self.config.ground_height, self.config.restitution);
        let self_contacts = resolve_self(
            &mut self.buffer,
            self.config.collision_threshold,
            self.config.collision_samples,
            self.config.collision_velocity_damping,
        );

        envelope_clamped += enforce_envelope(&mut self.buffer, &self.envelope);
        self.normals_dirty = true;

        let report = StepReport {
            dt: clamped_dt,
            sim_time: self.sim_time,
            phase,
            pointer_events,
            forces,
            envelope_clamped,
            ground_contacts,
            self_contacts,
        };
        trace!("Cloth step: {:?}", report);
        report
    }

    /// Drain queued pointer events into the drag controller.
    ///
    /// Rays are mapped into mesh-local space with the transform current at the
    /// time each event is applied and tested against the deformed surface.
    fn process_pointer_events(&mut self) -> usize {
        let events: Vec<PointerEvent> = self.pointer_queue.drain().collect();
        for event in &events {
            let outcome = match *event {
                PointerEvent::Down { x, ray, .. } => {
                    let hit = self.pick(&ray);
                    self.drag.pointer_down(x, hit)
                }
                PointerEvent::Move { x, ray, .. } => {
                    if self.drag.state().active() {
                        let hit = self.pick(&ray);
                        self.drag.pointer_move(x, hit)
                    } else {
                        PointerOutcome::Ignored
                    }
                }
                PointerEvent::Up => self.drag.pointer_up(),
                PointerEvent::Leave => self.drag.pointer_leave(),
            };
            if outcome == PointerOutcome::Missed {
                debug!("Pointer down at {:?} missed the mesh", event);
            }
        }
        events.len()
    }

    /// Closest hit of a world-space ray on the deformed mesh, in local space.
    pub fn pick(&self, world_ray: &Ray) -> Option<Vec3> {
        let local = self.rigid_transform().world_ray_to_local(world_ray);
        raycast_mesh(&local, self.buffer.positions(), &self.indices).map(|hit| hit.point)
    }

    /// Whether positions changed since the last [`Self::recompute_normals`].
    pub fn needs_normal_recompute(&self) -> bool {
        self.normals_dirty
    }

    pub fn recompute_normals(&mut self) {
        compute_vertex_normals(self.buffer.positions(), &self.indices, &mut self.normals);
        self.normals_dirty = false;
    }

    pub fn positions(&self) -> &[Vec3] {
        self.buffer.positions()
    }

    pub fn positions_flat(&self) -> &[f32] {
        self.buffer.positions_flat()
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn normals_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn buffer(&self) -> &VertexBuffer {
        &self.buffer
    }

    /// Whole-mesh transform the renderer applies on top of the positions.
    pub fn rigid_transform(&self) -> RigidTransform {
        self.drag.transform(self.config.mesh_scale)
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn anchors(&self) -> &InfluenceAnchors {
        &self.anchors
    }

    pub fn looseness(&self) -> &[f32] {
        &self.looseness
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Back to the rest pose with no drag and no pending input.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.drag.reset();
        self.pointer_queue.clear();
        self.sim_time = 0.0;
        self.normals_dirty = true;
        debug!("Cloth engine reset to rest pose");
    }
}

fn validate_indices(indices: &[u32], count: usize) -> Result<(), MeshError> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::RaggedIndices(indices.len()));
    }
    match indices.iter().find(|&&i| i as usize >= count) {
        Some(&index) => Err(MeshError::IndexOutOfBounds { index, count }),
        None => Ok(()),
    }
}
