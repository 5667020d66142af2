//! [`AsyncPropagator`] (spec §4.5): the worklist algorithm that turns a
//! single seed function into the full set of call sites and enclosing
//! functions that must become `async`/`await`.

use ripple_core::{FxHashMap, FxHashSet, RippleResult};
use std::collections::VecDeque;

use crate::ast::{Arena, NodeData, NodeId};
use crate::ignore::IgnoreSet;
use crate::index::Indexed;
use crate::name::name_of;
use crate::scope::ScopeArena;

/// One step in a function's path back to the seed: the call/read site that
/// forced it, and the function the propagator newly scheduled because of
/// it (`None` if that function was already `async` in source).
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub await_node: Option<NodeId>,
    pub async_node: Option<NodeId>,
}

/// `AsyncMap`: the sentinel `root` entry (a single edge pointing at the
/// seed) plus one entry per function the propagation reached, in the
/// order they were first scheduled.
#[derive(Debug, Default)]
pub struct AsyncMap {
    edges: Vec<(Option<NodeId>, Vec<Edge>)>,
}

impl AsyncMap {
    /// Entries in discovery order: `None` is the sentinel root entry.
    pub fn entries(&self) -> impl Iterator<Item = (Option<NodeId>, &[Edge])> {
        self.edges.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn get(&self, node: NodeId) -> Option<&[Edge]> {
        self.edges
            .iter()
            .find(|(k, _)| *k == Some(node))
            .map(|(_, v)| v.as_slice())
    }

    pub fn root(&self) -> &[Edge] {
        self.edges
            .iter()
            .find(|(k, _)| k.is_none())
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn insert(&mut self, key: Option<NodeId>, edges: Vec<Edge>) {
        self.edges.push((key, edges));
    }
}

pub struct AsyncPropagator<'a> {
    arena: &'a Arena,
    scopes: &'a ScopeArena,
    owner_of_property: &'a FxHashMap<NodeId, NodeId>,
    indexed: &'a Indexed,
    ignored: &'a IgnoreSet,
}

impl<'a> AsyncPropagator<'a> {
    pub fn new(
        arena: &'a Arena,
        scopes: &'a ScopeArena,
        owner_of_property: &'a FxHashMap<NodeId, NodeId>,
        indexed: &'a Indexed,
        ignored: &'a IgnoreSet,
    ) -> Self {
        Self { arena, scopes, owner_of_property, indexed, ignored }
    }

    /// `getAsyncStacks(seed)` (spec §4.5). `seed` is treated as newly async
    /// regardless of whether it already carries `async` in source.
    pub fn get_async_stacks(&self, seed: NodeId) -> RippleResult<AsyncMap> {
        tracing::debug!(?seed, "propagating async from seed");
        let mut map = AsyncMap::default();
        map.insert(None, vec![Edge { await_node: None, async_node: Some(seed) }]);

        let mut scheduled = FxHashSet::default();
        scheduled.insert(seed);
        let mut work = VecDeque::new();
        work.push_back(seed);

        while let Some(g) = work.pop_front() {
            if self.ignored.contains(g) {
                continue;
            }
            let awaits = self.await_candidates(g)?;
            if awaits.is_empty() {
                continue;
            }

            let mut edges = Vec::with_capacity(awaits.len());
            for a in awaits {
                if self.ignored.contains(a) {
                    continue;
                }
                let parent = self.arena.enclosing_function(a);
                let mut edge = Edge { await_node: Some(a), async_node: None };
                if let Some(parent) = parent {
                    if !self.ignored.contains(parent) {
                        edge.async_node = if self.is_async(parent) { None } else { Some(parent) };
                        if scheduled.insert(parent) {
                            work.push_back(parent);
                        }
                    }
                }
                edges.push(edge);
            }
            map.insert(Some(g), edges);
        }

        tracing::debug!(functions_marked = map.len() - 1, "propagation converged");
        Ok(map)
    }

    /// `awaitCandidates(g)` (spec §4.5): the filtered union of name-matched
    /// calls, accessor reads, and constructor-self-reference members,
    /// restricted to sites lexically reachable from `g`'s scope and not
    /// already inside some other `await`.
    fn await_candidates(&self, g: NodeId) -> RippleResult<Vec<NodeId>> {
        let name = name_of(self.arena, self.owner_of_property, g)?;
        let g_scope = self.arena.get(g).scope;

        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut push = |out: &mut Vec<NodeId>, c: NodeId| {
            if !seen.insert(c) {
                return;
            }
            if self.indexed.in_await.contains(&c) {
                return;
            }
            let c_scope = self.arena.get(c).scope;
            if self.scopes.is_ancestor_or_equal(g_scope, c_scope) {
                out.push(c);
            }
        };

        if let Some(calls) = self.indexed.calls.get(name.as_str()) {
            for &c in calls {
                push(&mut out, c);
            }
        }
        if self.indexed.accessors.contains(&g) {
            if let Some(reads) = self.indexed.reads.get(name.as_str()) {
                for &r in reads {
                    push(&mut out, r);
                }
            }
        }
        if let Some(&ctor) = self.indexed.constructor_map.get(&g) {
            if let Some(members) = self.indexed.members_of_constructor.get(&ctor) {
                for &p in members {
                    if name_of(self.arena, self.owner_of_property, p)? == name {
                        push(&mut out, p);
                    }
                }
            }
        }

        Ok(out)
    }

    fn is_async(&self, id: NodeId) -> bool {
        matches!(&self.arena.get(id).data, NodeData::Function { is_async, .. } if *is_async)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::index::build_index;
    use crate::materialize::materialize;
    use ripple_source::{LineMap, LineMapEntry};

    fn single_fragment(path: &str, source: &str) -> LineMap {
        let mut map = LineMap::new();
        map.push(LineMapEntry {
            start_buffer_line: 0,
            end_buffer_line_exclusive: source.split('\n').count() as u32,
            path: path.to_string(),
            first_line_in_file: 1,
        });
        map
    }

    fn find_fn_named(arena: &Arena, name: &str) -> NodeId {
        for i in 0..arena.len() as u32 {
            let id = NodeId::new(i);
            let node = arena.get(id);
            if node.kind.is_function_like() {
                if let NodeData::Function { name: Some(n), .. } = &node.data {
                    if n.as_str() == name {
                        return id;
                    }
                }
            }
        }
        panic!("no function named {name}");
    }

    #[test]
    fn two_functions_minimal_propagates_one_hop() {
        let source = "function a() { b(); }\nfunction b() {}\n";
        let m = materialize(source, "f.js", &single_fragment("f.js", source)).unwrap();
        let indexed = build_index(&m.arena, &m.scopes, &m.owner_of_property, m.program).unwrap();
        let ignored = IgnoreSet::new();
        let prop = AsyncPropagator::new(&m.arena, &m.scopes, &m.owner_of_property, &indexed, &ignored);

        let b = find_fn_named(&m.arena, "b");
        let a = find_fn_named(&m.arena, "a");
        let map = prop.get_async_stacks(b).unwrap();

        assert_eq!(map.root().len(), 1);
        assert_eq!(map.root()[0].async_node, Some(b));

        let b_edges = map.get(b).expect("b scheduled");
        assert_eq!(b_edges.len(), 1);
        assert_eq!(b_edges[0].async_node, Some(a));
        assert_eq!(
            m.arena.get(b_edges[0].await_node.unwrap()).kind,
            NodeKind::CallExpression
        );
    }

    #[test]
    fn ignored_call_site_is_excluded() {
        let source = "function a() { b(); }\nfunction b() {}\n";
        let m = materialize(source, "f.js", &single_fragment("f.js", source)).unwrap();
        let indexed = build_index(&m.arena, &m.scopes, &m.owner_of_property, m.program).unwrap();
        let b = find_fn_named(&m.arena, "b");
        let call_site = indexed.calls["b"][0];

        let mut ignored = IgnoreSet::new();
        ignored.mark(call_site);
        let prop = AsyncPropagator::new(&m.arena, &m.scopes, &m.owner_of_property, &indexed, &ignored);

        let map = prop.get_async_stacks(b).unwrap();
        // `b` is still scheduled (it is the seed) and still gets an entry —
        // the ignored call site just means that entry's edge list is empty,
        // not that the key is absent.
        assert!(map.get(b).unwrap().is_empty());
    }

    // Scenario H (SPEC_FULL §6, "class-constructor"): an ES `class`
    // constructor that calls `this.bar()` is reached through the same
    // `this.`-qualified path the prototype-assign form uses (`constructor`
    // stands in for `Foo`'s own body in that form), and it is flagged as a
    // syntax-error location once `new Foo()` has been observed.
    #[test]
    fn class_constructor_is_reached_via_this_qualified_member() {
        let source = "class Foo {\n  constructor() { this.bar(); }\n  bar() {}\n}\nnew Foo();\n";
        let m = materialize(source, "f.js", &single_fragment("f.js", source)).unwrap();
        let indexed = build_index(&m.arena, &m.scopes, &m.owner_of_property, m.program).unwrap();
        let ignored = IgnoreSet::new();
        let prop = AsyncPropagator::new(&m.arena, &m.scopes, &m.owner_of_property, &indexed, &ignored);

        // `constructor` is `MethodKind::Constructor`, never entered into
        // `ConstructorMap` itself (only `Method`/`Get`/`Set` values are), so
        // `bar`'s value node is the map's only key.
        let bar = *indexed
            .constructor_map
            .keys()
            .next()
            .expect("bar's value node is keyed in ConstructorMap");

        let map = prop.get_async_stacks(bar).unwrap();
        let ctor_fn = indexed.constructor_map[&bar];
        let bar_edges = map.get(bar).expect("bar scheduled as the seed");
        assert_eq!(bar_edges[0].async_node, Some(ctor_fn), "constructor must be reached via this.bar()");
        assert!(
            indexed.constructors.contains(&ctor_fn),
            "new Foo() must add Foo's constructor to ConstructorSet"
        );
    }

    #[test]
    fn already_async_parent_records_no_new_marking() {
        let source = "async function a() { b(); }\nfunction b() {}\n";
        let m = materialize(source, "f.js", &single_fragment("f.js", source)).unwrap();
        let indexed = build_index(&m.arena, &m.scopes, &m.owner_of_property, m.program).unwrap();
        let ignored = IgnoreSet::new();
        let prop = AsyncPropagator::new(&m.arena, &m.scopes, &m.owner_of_property, &indexed, &ignored);

        let b = find_fn_named(&m.arena, "b");
        let map = prop.get_async_stacks(b).unwrap();
        let b_edges = map.get(b).unwrap();
        assert_eq!(b_edges[0].async_node, None);
    }

    // Invariant 5 (spec §8): calling `getAsyncStacks(seed)` twice on the
    // same parsed engine yields identical AsyncMaps — same keys in the
    // same insertion order, same edges in the same order.
    #[test]
    fn get_async_stacks_is_idempotent() {
        let source = "function a() { b(); }\nfunction b() { c(); }\nfunction c() {}\n";
        let m = materialize(source, "f.js", &single_fragment("f.js", source)).unwrap();
        let indexed = build_index(&m.arena, &m.scopes, &m.owner_of_property, m.program).unwrap();
        let ignored = IgnoreSet::new();
        let prop = AsyncPropagator::new(&m.arena, &m.scopes, &m.owner_of_property, &indexed, &ignored);

        let c = find_fn_named(&m.arena, "c");
        let first = prop.get_async_stacks(c).unwrap();
        let second = prop.get_async_stacks(c).unwrap();

        let first_keys: Vec<_> = first.entries().map(|(k, _)| k).collect();
        let second_keys: Vec<_> = second.entries().map(|(k, _)| k).collect();
        assert_eq!(first_keys, second_keys, "same keys in the same insertion order");

        for ((k1, e1), (k2, e2)) in first.entries().zip(second.entries()) {
            assert_eq!(k1, k2);
            assert_eq!(e1.len(), e2.len());
            for (edge1, edge2) in e1.iter().zip(e2.iter()) {
                assert_eq!(edge1.await_node, edge2.await_node);
                assert_eq!(edge1.async_node, edge2.async_node);
            }
        }
    }
}
