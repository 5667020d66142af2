//! [`IgnoreSet`] (spec §4.4): caller-supplied nodes the propagator treats
//! as dead ends. Populated via `(path, line, typeFilter, index)` lookups
//! (spec §6) after `parse()`, before `get_async_stacks` — see
//! `crate::engine::Engine`.

use ripple_core::FxHashSet;

use crate::ast::NodeId;

/// Nodes the [`crate::propagate::AsyncPropagator`] must treat as opaque:
/// neither recorded as an await site nor recursed through.
#[derive(Debug, Default)]
pub struct IgnoreSet {
    nodes: FxHashSet<NodeId>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
