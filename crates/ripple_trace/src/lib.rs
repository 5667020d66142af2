//! Trace - parser glue, scope analysis, reference indexing and async
//! propagation for the ripple analyzer (spec §4.2-§4.5).
//!
//! [`Engine`] is the one entry point a collaborator (CLI, tests) needs:
//! append source, `parse()`, locate a seed node, `get_async_stacks`.
//! Everything else in this crate is implementation detail reachable for
//! callers that want to inspect the arena directly (the `ripple_report`
//! crate does, for `ReportModel`).

pub mod ast;
mod engine;
mod ignore;
mod index;
mod materialize;
mod name;
mod propagate;
mod scope;

pub use ast::{AccessorKind, Arena, AstNode, MethodKind, NodeData, NodeId, NodeKind};
pub use engine::{Engine, EngineOptions};
pub use ignore::IgnoreSet;
pub use index::Indexed;
pub use materialize::{materialize, Materialized};
pub use name::name_of;
pub use propagate::{AsyncMap, AsyncPropagator, Edge};
pub use scope::{Binding, Scope, ScopeArena, ScopeId};
