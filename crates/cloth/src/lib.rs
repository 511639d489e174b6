//! Real-time drag-driven cloth deformation for a single displayed mesh
//!
//! The engine treats a loaded garment mesh as a mass-spring cloth:
//! - **Forces**: gravity, procedural wind and wrinkle noise, approximate
//!   structural/shear springs over vertex order, and shape restoration
//! - **Drag**: a picked surface point attracts nearby vertices while the
//!   whole mesh spins and tilts with the pointer, then settles on release
//! - **Envelope**: every vertex stays inside a per-axis box around its rest
//!   position, wider far from the virtual skeleton's anchors
//! - **Collision**: a ground plane plus sampled self-collision
//!
//! Hosts feed [`PointerEvent`]s carrying world-space rays, call
//! [`ClothEngine::step`] once per frame, and upload [`ClothEngine::positions_flat`],
//! [`ClothEngine::normals_flat`] and [`ClothEngine::rigid_transform`].

pub mod anchors;
pub mod buffer;
pub mod collision;
pub mod drag;
pub mod engine;
pub mod error;
pub mod forces;
pub mod input;
pub mod integrator;
pub mod normals;
pub mod raycast;
pub mod transform;

pub use anchors::{AnchorKind, InfluenceAnchor, InfluenceAnchors};
pub use buffer::{Aabb, VertexBuffer};
pub use drag::{DragController, DragPhase, DragState, PointerOutcome};
pub use engine::{ClothEngine, StepReport};
pub use error::{EngineError, MeshError};
pub use forces::{ForceAccumulator, ForceStats};
pub use input::{PointerEvent, PointerQueue};
pub use integrator::Envelope;
pub use raycast::{MeshHit, Ray};
pub use transform::RigidTransform;
pub use wiggle_config::{AnchorLayout, ConfigError, DragConfig, EnvelopeConfig, PhysicsConfig};
