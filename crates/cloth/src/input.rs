//! Pointer input events and the per-frame event queue.
//!
//! Hosts push events whenever their windowing layer delivers them; the engine
//! drains the queue at the start of each step so drag state only changes on a
//! tick boundary.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::raycast::Ray;

/// Pointer input from the host, with a world-space picking ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { x: f32, y: f32, ray: Ray },
    Move { x: f32, y: f32, ray: Ray },
    Up,
    Leave,
}

/// FIFO of pointer events waiting for the next tick.
#[derive(Debug, Default, Clone)]
pub struct PointerQueue {
    pending: VecDeque<PointerEvent>,
}

impl PointerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PointerEvent) {
        self.pending.push_back(event);
    }

    /// Remove and return all pending events in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = PointerEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
