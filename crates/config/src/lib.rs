//! Shared configuration for the Wiggle cloth engine
//!
//! This crate is the single source of truth for every tunable constant of the
//! simulation: force stiffnesses, drag response, anchor placement and the
//! per-vertex displacement envelope. A configuration is built once (from
//! defaults or a JSON document), validated, and then only ever read.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

mod error;

pub use error::ConfigError;

/// Upper bound on a single integration step, in seconds.
pub const DEFAULT_MAX_DT: f32 = 1.0 / 30.0;

/// Default gravity acceleration (mesh units per second squared).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -0.025, 0.0);

/// Uniform scale the host applies to the mesh group.
pub const DEFAULT_MESH_SCALE: f32 = 1.5;

/// Largest spring search window over the vertex order.
pub const MAX_STRUCTURAL_WINDOW: usize = 1024;

/// Physical constants of the cloth simulation.
///
/// Missing fields in a JSON document fall back to their defaults, so a host
/// can override just the handful of values it cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct PhysicsConfig {
    /// Global velocity retention per step, in (0, 1]
    pub damping: f32,
    /// Nominal vertex mass; the stiffness values are tuned with it folded in
    pub mass: f32,
    /// Gravity acceleration
    pub gravity: Vec3,

    /// Procedural wind amplitude
    pub wind_strength: f32,
    /// Procedural wind angular frequency
    pub wind_frequency: f32,
    /// Micro-wrinkle noise amplitude
    pub wrinkle_amplitude: f32,
    /// Micro-wrinkle per-index phase frequency
    pub wrinkle_frequency: f32,

    /// Structural spring stiffness
    pub structural_stiffness: f32,
    /// Rest distance below which two vertices share a structural spring
    pub structural_rest_threshold: f32,
    /// Forward index window scanned for structural neighbours
    pub structural_window: usize,
    /// Shear spring stiffness
    pub shear_stiffness: f32,
    /// Rest distance below which two vertices share a shear spring
    pub shear_rest_threshold: f32,
    /// Index stride inside the shear window
    pub shear_stride: usize,
    /// Apply shear forces to both vertices of a pair
    pub symmetric_shear: bool,
    /// Pull of each vertex back toward its rest position
    pub bend_stiffness: f32,

    /// Attraction toward the drag point
    pub drag_stiffness: f32,
    /// Velocity damping applied to dragged vertices, in [0, 1]
    pub drag_damping: f32,
    /// Radius of the drag influence sphere
    pub drag_radius: f32,
    /// Falloff exponent of drag influence
    pub drag_falloff_power: f32,
    /// Amplitude of the vertical ripple around the drag point
    pub drag_ripple_amplitude: f32,
    /// Fraction of attraction re-applied as an oscillating radial spread
    pub drag_radial_spread: f32,

    /// Height of the ground plane
    pub ground_height: f32,
    /// Bounce factor on ground contact, in [0, 1]
    pub restitution: f32,
    /// Minimum separation enforced between sampled vertices
    pub collision_threshold: f32,
    /// Target number of sampled vertices per self-collision pass
    pub collision_samples: usize,
    /// Velocity retention of vertices involved in a self-collision, in [0, 1]
    pub collision_velocity_damping: f32,

    /// Largest timestep fed to the integrator, in seconds
    pub max_dt: f32,
    /// Wind/wrinkle phase shift per unit of anchor looseness, in radians
    pub anchor_phase_bias: f32,
    /// Uniform scale of the rendered mesh group
    pub mesh_scale: f32,

    pub drag: DragConfig,
    pub anchors: AnchorLayout,
    pub envelope: EnvelopeConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            damping: 0.92,
            mass: 0.12,
            gravity: DEFAULT_GRAVITY,
            wind_strength: 0.002,
            wind_frequency: 1.2,
            wrinkle_amplitude: 0.0008,
            wrinkle_frequency: 3.0,
            structural_stiffness: 0.15,
            structural_rest_threshold: 0.05,
            structural_window: 30,
            shear_stiffness: 0.08,
            shear_rest_threshold: 0.08,
            shear_stride: 3,
            symmetric_shear: true,
            bend_stiffness: 0.05,
            drag_stiffness: 1.8,
            drag_damping: 0.7,
            drag_radius: 1.125,
            drag_falloff_power: 2.5,
            drag_ripple_amplitude: 0.008,
            drag_radial_spread: 0.3,
            ground_height: -0.6,
            restitution: 0.2,
            collision_threshold: 0.02,
            collision_samples: 100,
            collision_velocity_damping: 0.8,
            max_dt: DEFAULT_MAX_DT,
            anchor_phase_bias: 0.35,
            mesh_scale: DEFAULT_MESH_SCALE,
            drag: DragConfig::default(),
            anchors: AnchorLayout::default(),
            envelope: EnvelopeConfig::default(),
        }
    }
}

impl PhysicsConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        in_range("damping", self.damping, f32::MIN_POSITIVE, 1.0)?;
        positive("mass", self.mass)?;
        finite_vec("gravity", self.gravity)?;

        non_negative("wind_strength", self.wind_strength)?;
        non_negative("wind_frequency", self.wind_frequency)?;
        non_negative("wrinkle_amplitude", self.wrinkle_amplitude)?;
        finite("wrinkle_frequency", self.wrinkle_frequency)?;

        positive("structural_stiffness", self.structural_stiffness)?;
        positive("structural_rest_threshold", self.structural_rest_threshold)?;
        at_least_one("structural_window", self.structural_window)?;
        if self.structural_window > MAX_STRUCTURAL_WINDOW {
            return Err(ConfigError::invalid("structural_window", "must be at most 1024"));
        }
        positive("shear_stiffness", self.shear_stiffness)?;
        positive("shear_rest_threshold", self.shear_rest_threshold)?;
        at_least_one("shear_stride", self.shear_stride)?;
        positive("bend_stiffness", self.bend_stiffness)?;

        positive("drag_stiffness", self.drag_stiffness)?;
        in_range("drag_damping", self.drag_damping, 0.0, 1.0)?;
        positive("drag_radius", self.drag_radius)?;
        positive("drag_falloff_power", self.drag_falloff_power)?;
        non_negative("drag_ripple_amplitude", self.drag_ripple_amplitude)?;
        non_negative("drag_radial_spread", self.drag_radial_spread)?;

        finite("ground_height", self.ground_height)?;
        in_range("restitution", self.restitution, 0.0, 1.0)?;
        positive("collision_threshold", self.collision_threshold)?;
        at_least_one("collision_samples", self.collision_samples)?;
        in_range(
            "collision_velocity_damping",
            self.collision_velocity_damping,
            0.0,
            1.0,
        )?;

        positive("max_dt", self.max_dt)?;
        finite("anchor_phase_bias", self.anchor_phase_bias)?;
        positive("mesh_scale", self.mesh_scale)?;

        self.drag.validate()?;
        self.anchors.validate()?;
        self.envelope.validate()
    }
}

/// Response of the whole-mesh transform to pointer drags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Y rotation per pixel of horizontal pointer motion (radians)
    pub rotation_speed: f32,
    /// Translation pulled out of each pixel of pointer motion
    pub drag_force: f32,
    /// Largest tilt the pointer can request (radians)
    pub max_tilt: f32,
    /// Tilt requested per pixel of pointer motion (radians)
    pub tilt_per_pixel: f32,
    /// Natural frequency of the offset/tilt follow springs while dragging
    pub follow_frequency_hz: f32,
    /// Largest translation the drag can accumulate
    pub max_offset: f32,
    /// Ratio of X tilt to Z tilt
    pub secondary_tilt_ratio: f32,
    /// Per-tick retention of rotation velocity after release
    pub rotation_decay: f32,
    /// Per-tick retention of the translation offset after release
    pub offset_damping: f32,
    /// Per-tick restoring pull on the translation offset after release
    pub offset_spring: f32,
    /// Per-tick retention of tilt after release
    pub tilt_decay: f32,
    /// Magnitude under which released motion snaps to exactly zero
    pub rest_epsilon: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 0.015,
            drag_force: 0.8,
            max_tilt: 0.4,
            tilt_per_pixel: 0.01,
            follow_frequency_hz: 4.0,
            max_offset: 0.6,
            secondary_tilt_ratio: 0.3,
            rotation_decay: 0.95,
            offset_damping: 0.85,
            offset_spring: 0.15,
            tilt_decay: 0.9,
            rest_epsilon: 0.001,
        }
    }
}

impl DragConfig {
    /// Per-tick retention of the translation offset after release.
    pub fn offset_retention(&self) -> f32 {
        self.offset_damping - self.offset_spring
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("drag.rotation_speed", self.rotation_speed)?;
        non_negative("drag.drag_force", self.drag_force)?;
        non_negative("drag.max_tilt", self.max_tilt)?;
        non_negative("drag.tilt_per_pixel", self.tilt_per_pixel)?;
        positive("drag.follow_frequency_hz", self.follow_frequency_hz)?;
        positive("drag.max_offset", self.max_offset)?;
        finite("drag.secondary_tilt_ratio", self.secondary_tilt_ratio)?;
        decay("drag.rotation_decay", self.rotation_decay)?;
        in_range("drag.offset_damping", self.offset_damping, 0.0, 1.0)?;
        in_range("drag.offset_spring", self.offset_spring, 0.0, 1.0)?;
        decay("drag.offset_damping - drag.offset_spring", self.offset_retention())?;
        decay("drag.tilt_decay", self.tilt_decay)?;
        positive("drag.rest_epsilon", self.rest_epsilon)
    }
}

/// Placement of the virtual skeleton's influence anchors.
///
/// Spine anchors are spread along the vertical extent of the mesh; the two
/// sleeve anchors sit at a fixed lateral offset on either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorLayout {
    pub spine_count: usize,
    pub spine_radius: f32,
    pub sleeve_offset: f32,
    /// Sleeve height as a fraction of the vertical extent, 0 = bottom
    pub sleeve_height: f32,
    pub sleeve_radius: f32,
}

impl Default for AnchorLayout {
    fn default() -> Self {
        Self {
            spine_count: 5,
            spine_radius: 0.4,
            sleeve_offset: 0.5,
            sleeve_height: 0.7,
            sleeve_radius: 0.35,
        }
    }
}

impl AnchorLayout {
    pub fn validate(&self) -> Result<(), ConfigError> {
        at_least_one("anchors.spine_count", self.spine_count)?;
        positive("anchors.spine_radius", self.spine_radius)?;
        non_negative("anchors.sleeve_offset", self.sleeve_offset)?;
        in_range("anchors.sleeve_height", self.sleeve_height, 0.0, 1.0)?;
        positive("anchors.sleeve_radius", self.sleeve_radius)
    }
}

/// Per-axis displacement envelope around the rest pose.
///
/// A vertex may stray `base + growth * looseness` from rest on each axis,
/// where looseness grows with distance from the nearest anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub base: Vec3,
    pub growth: Vec3,
    pub looseness_cap: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            base: Vec3::new(0.08, 0.06, 0.08),
            growth: Vec3::new(0.04, 0.03, 0.04),
            looseness_cap: 2.5,
        }
    }
}

impl EnvelopeConfig {
    /// Envelope half-extent for a vertex with the given looseness.
    pub fn extent(&self, looseness: f32) -> Vec3 {
        self.base + self.growth * looseness.clamp(0.0, self.looseness_cap)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        finite_vec("envelope.base", self.base)?;
        if self.base.min_element() <= 0.0 {
            return Err(ConfigError::invalid("envelope.base", "must be positive"));
        }
        finite_vec("envelope.growth", self.growth)?;
        if self.growth.min_element() < 0.0 {
            return Err(ConfigError::invalid("envelope.growth", "must not be negative"));
        }
        non_negative("envelope.looseness_cap", self.looseness_cap)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite"))
    }
}

fn finite_vec(field: &'static str, value: Vec3) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite"))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be positive"))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must not be negative"))
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "out of range"))
    }
}

/// Multiplicative decay factors must strictly shrink without flipping sign.
fn decay(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be in (0, 1)"))
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value >= 1 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be at least 1"))
    }
}
