//! [`Engine`] (spec §6): the one-stop collaborator a CLI or other driver
//! talks to — owns the [`SourceBuffer`], runs `parse()`, and exposes node
//! lookup plus [`AsyncPropagator::get_async_stacks`].

use ripple_core::{FxHashMap, RippleError, RippleResult};
use ripple_source::SourceBuffer;
use std::path::PathBuf;

use crate::ast::{Arena, NodeId, NodeKind};
use crate::ignore::IgnoreSet;
use crate::index::{build_index, Indexed};
use crate::materialize::{materialize, Materialized};
use crate::propagate::{AsyncMap, AsyncPropagator};
use crate::scope::ScopeArena;

/// Reserved for future recognized keys; spec §6 says "none currently
/// observable" — extra keys are simply ignored by whatever reads the raw
/// configuration document, so this stays an empty marker type rather than
/// a `HashMap` nobody writes into.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {}

/// The post-`parse()` state. Held behind an `Option` on [`Engine`] so a
/// caller cannot reach `getAsyncStacks` before `parse()` has run.
struct Parsed {
    arena: Arena,
    scopes: ScopeArena,
    owner_of_property: FxHashMap<NodeId, NodeId>,
    node_index: FxHashMap<(String, u32), Vec<NodeId>>,
    indexed: Indexed,
}

/// Drives a [`SourceBuffer`] through parsing, indexing and propagation.
/// Resource lifetime is tied to this value: dropping it releases the AST
/// arena and every derived map (spec §5).
pub struct Engine {
    source: SourceBuffer,
    options: EngineOptions,
    ignored: IgnoreSet,
    parsed: Option<Parsed>,
}

impl Engine {
    pub fn new(root_dir: impl Into<PathBuf>, options: EngineOptions) -> Self {
        Self {
            source: SourceBuffer::new(root_dir),
            options,
            ignored: IgnoreSet::new(),
            parsed: None,
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn append_source(&mut self, path: impl Into<String>, first_line: u32, text: impl Into<String>) -> RippleResult<()> {
        self.parsed = None;
        self.source.append_source(path, first_line, text)
    }

    pub fn append_file(&mut self, relative_path: impl AsRef<str>) -> RippleResult<()> {
        self.parsed = None;
        self.source.append_file(relative_path)
    }

    /// Runs §4.2 (materialize) and §4.3 (index) over everything appended
    /// so far. Safe to call again after further `appendSource`/`appendFile`
    /// calls — each call reparses the whole buffer from scratch, since
    /// nothing here is incremental (spec §5).
    pub fn parse(&mut self) -> RippleResult<()> {
        let text = self.source.text().to_string();
        tracing::debug!(buffer_lines = self.source.line_count(), "materializing source buffer");
        let Materialized { arena, scopes, node_index, owner_of_property, program } =
            materialize(&text, "buffer.js", self.source.line_map())?;
        tracing::trace!(nodes = arena.len(), scopes = scopes.len(), "materialized arena");

        let indexed = build_index(&arena, &scopes, &owner_of_property, program)?;
        tracing::debug!(
            names_with_calls = indexed.calls.len(),
            accessors = indexed.accessors.len(),
            "built reference index"
        );

        let node_index = node_index
            .into_iter()
            .map(|((path, line), nodes)| ((path.to_string(), line), nodes))
            .collect();

        self.parsed = Some(Parsed { arena, scopes, owner_of_property, node_index, indexed });
        Ok(())
    }

    pub fn mark_ignored(&mut self, node: NodeId) {
        self.ignored.mark(node);
    }

    fn parsed(&self) -> RippleResult<&Parsed> {
        self.parsed
            .as_ref()
            .ok_or_else(|| RippleError::InvalidInput("parse() has not run yet".to_string()))
    }

    /// `nodeByLineFilterIndex(path, line, index, predicate)` (spec §6): the
    /// `index`-th node at `(path, line)` (in visitation order) for which
    /// `predicate` returns `true`.
    pub fn node_by_line_filter_index(
        &self,
        path: &str,
        line: u32,
        index: usize,
        predicate: impl Fn(&Arena, NodeId) -> bool,
    ) -> RippleResult<NodeId> {
        let parsed = self.parsed()?;
        let nodes = parsed
            .node_index
            .get(&(path.to_string(), line))
            .ok_or_else(|| RippleError::NotFound(format!("{path}:{line}")))?;

        nodes
            .iter()
            .copied()
            .filter(|&id| predicate(&parsed.arena, id))
            .nth(index)
            .ok_or_else(|| RippleError::NotFound(format!("{path}:{line} (index {index})")))
    }

    /// `functionNodeFromLine(path, line, functionIndex)` (spec §6): sugar
    /// for [`Self::node_by_line_filter_index`] with predicate "function-like".
    pub fn function_node_from_line(&self, path: &str, line: u32, function_index: usize) -> RippleResult<NodeId> {
        self.node_by_line_filter_index(path, line, function_index, |arena, id| {
            arena.get(id).kind.is_function_like()
        })
    }

    /// `getAsyncStacks(seed)` (spec §4.5/§6).
    pub fn get_async_stacks(&self, seed: NodeId) -> RippleResult<AsyncMap> {
        let parsed = self.parsed()?;
        let propagator = AsyncPropagator::new(
            &parsed.arena,
            &parsed.scopes,
            &parsed.owner_of_property,
            &parsed.indexed,
            &self.ignored,
        );
        propagator.get_async_stacks(seed)
    }

    pub fn arena(&self) -> RippleResult<&Arena> {
        Ok(&self.parsed()?.arena)
    }

    /// `OwnerOfProperty` (spec §3): `Property.value`/`AssignmentExpression.right`
    /// → the key/target node `nameOf` recurses through. Exposed so report
    /// serializers can compute `nameOf` without re-running `parse()`.
    pub fn owner_of_property(&self) -> RippleResult<&FxHashMap<NodeId, NodeId>> {
        Ok(&self.parsed()?.owner_of_property)
    }

    pub fn is_async_syntax_error(&self, node: NodeId) -> RippleResult<bool> {
        let parsed = self.parsed()?;
        Ok(parsed.indexed.accessors.contains(&node) || parsed.indexed.constructors.contains(&node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_then_seed_by_function_index_propagates() {
        let mut engine = Engine::new("/project", EngineOptions::default());
        engine.append_source("a.js", 1, "function a() { b(); }\n").unwrap();
        engine.append_source("b.js", 1, "function b() {}\n").unwrap();
        engine.parse().unwrap();

        let b = engine.function_node_from_line("b.js", 1, 0).unwrap();
        assert_eq!(engine.arena().unwrap().get(b).kind, NodeKind::FunctionDeclaration);

        let map = engine.get_async_stacks(b).unwrap();
        assert_eq!(map.root()[0].async_node, Some(b));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn node_lookup_before_parse_is_an_error() {
        let engine = Engine::new("/project", EngineOptions::default());
        assert!(engine.function_node_from_line("a.js", 1, 0).is_err());
    }

    #[test]
    fn mark_ignored_removes_function_from_work_queue() {
        let mut engine = Engine::new("/project", EngineOptions::default());
        engine.append_source("a.js", 1, "function a() { b(); }\n").unwrap();
        engine.append_source("b.js", 1, "function b() {}\n").unwrap();
        engine.parse().unwrap();

        let b = engine.function_node_from_line("b.js", 1, 0).unwrap();
        let a = engine.function_node_from_line("a.js", 1, 0).unwrap();
        engine.mark_ignored(a);

        let map = engine.get_async_stacks(b).unwrap();
        // `b`'s one await candidate resolves to a call inside `a`; `a` is
        // ignored, so the edge records no new async marking.
        let b_edges = map.get(b).unwrap();
        assert!(b_edges[0].async_node.is_none());
    }
}
