//! Virtual skeleton: flat influence anchors.
//!
//! Anchors are independent points with an influence radius. They never move
//! and carry no transform. The simulation only asks how far each vertex rests
//! from its nearest anchor ("looseness"), which biases wind/wrinkle phase and
//! widens the displacement envelope toward the extremities.

use glam::Vec3;
use wiggle_config::AnchorLayout;

/// Role of an anchor in the skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    Spine,
    Sleeve,
}

/// A fixed spatial point biasing nearby vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceAnchor {
    pub position: Vec3,
    pub influence_radius: f32,
    pub kind: AnchorKind,
}

/// The immutable set of anchors for one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceAnchors {
    anchors: Vec<InfluenceAnchor>,
}

impl InfluenceAnchors {
    /// Place the default skeleton over the given vertical extent.
    pub fn build(bounds_y: (f32, f32)) -> Self {
        Self::build_with_layout(bounds_y, &AnchorLayout::default())
    }

    /// Place spine anchors evenly from bottom to top at the mesh centre line,
    /// and one sleeve anchor on each side.
    pub fn build_with_layout(bounds_y: (f32, f32), layout: &AnchorLayout) -> Self {
        let (min_y, max_y) = if bounds_y.0 <= bounds_y.1 {
            bounds_y
        } else {
            (bounds_y.1, bounds_y.0)
        };
        let height = max_y - min_y;

        let mut anchors = Vec::with_capacity(layout.spine_count + 2);

        if layout.spine_count == 1 {
            anchors.push(InfluenceAnchor {
                position: Vec3::new(0.0, min_y + height * 0.5, 0.0),
                influence_radius: layout.spine_radius,
                kind: AnchorKind::Spine,
            });
        } else {
            let last = (layout.spine_count - 1) as f32;
            for i in 0..layout.spine_count {
                let t = i as f32 / last;
                anchors.push(InfluenceAnchor {
                    position: Vec3::new(0.0, min_y + t * height, 0.0),
                    influence_radius: layout.spine_radius,
                    kind: AnchorKind::Spine,
                });
            }
        }

        let sleeve_y = min_y + layout.sleeve_height * height;
        for side in [-1.0, 1.0] {
            anchors.push(InfluenceAnchor {
                position: Vec3::new(side * layout.sleeve_offset, sleeve_y, 0.0),
                influence_radius: layout.sleeve_radius,
                kind: AnchorKind::Sleeve,
            });
        }

        Self { anchors }
    }

    pub fn as_slice(&self) -> &[InfluenceAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Distance to the nearest anchor in units of that anchor's radius.
    pub fn normalized_distance(&self, point: Vec3) -> f32 {
        self.anchors
            .iter()
            .map(|a| point.distance(a.position) / a.influence_radius)
            .fold(f32::INFINITY, f32::min)
    }

    /// Per-vertex looseness for a rest pose, capped at `cap`.
    pub fn looseness(&self, rest: &[Vec3], cap: f32) -> Vec<f32> {
        rest.iter()
            .map(|&p| {
                let d = self.normalized_distance(p);
                if d.is_finite() { d.min(cap) } else { cap }
            })
            .collect()
    }
}
