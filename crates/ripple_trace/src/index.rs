//! `IndexBuilder`'s Pass 2 (spec §4.3): a single semantic walk over the
//! materialized [`Arena`] (Pass 1 already ran during
//! [`crate::materialize`]) that builds `NameIndex`, `InAwaitSet`,
//! `AccessorSet`, `ConstructorSet`, `ConstructorMap` and
//! `MembersOfConstructor`.
//!
//! [`AstNode::children`] flattens nested *expressions* onto their nearest
//! enclosing statement rather than nesting them under their immediate
//! parent (see `materialize`'s module doc), so a literal preorder walk
//! over `children` cannot recover await-nesting or the
//! `X.prototype = {…}` scoping the spec's algorithm depends on. This
//! walk instead follows [`NodeData::links`] — the true expression
//! tree — and falls back to `children` only at statement boundaries
//! (where `data` is [`NodeData::None`] and `children` really is the
//! next nesting level). A single global `reachable` set (every node
//! reachable via some other node's `links()`) tells the walk which
//! entries in a statement's `children` are genuine top-level starting
//! points versus nodes that will be reached again via a sibling's
//! structural links, so nothing is visited — and no await-depth or
//! prototype-scope fact recorded — twice.

use ripple_core::{CompactString, FxHashMap, FxHashSet, RippleResult};

use crate::ast::{AccessorKind, Arena, NodeData, NodeId, NodeKind};
use crate::name::name_of;
use crate::scope::{ScopeArena, ScopeId};

/// Everything Pass 2 derives.
#[derive(Debug, Default)]
pub struct Indexed {
    pub calls: FxHashMap<CompactString, Vec<NodeId>>,
    pub reads: FxHashMap<CompactString, Vec<NodeId>>,
    pub accessors: FxHashSet<NodeId>,
    pub constructors: FxHashSet<NodeId>,
    pub constructor_map: FxHashMap<NodeId, NodeId>,
    pub members_of_constructor: FxHashMap<NodeId, Vec<NodeId>>,
    pub in_await: FxHashSet<NodeId>,
}

pub fn build_index(
    arena: &Arena,
    scopes: &ScopeArena,
    owner_of_property: &FxHashMap<NodeId, NodeId>,
    program: NodeId,
) -> RippleResult<Indexed> {
    let reachable = reachable_via_links(arena);
    let mut builder = Builder {
        arena,
        scopes,
        owner_of_property,
        reachable,
        visited: FxHashSet::default(),
        out: Indexed::default(),
    };
    builder.walk_container(program, 0)?;
    Ok(builder.out)
}

/// Every `NodeId` reachable as a structural link from some other node
/// (`NodeData::links`). Used to tell top-level statement children apart
/// from nodes that are really nested sub-expressions of a later sibling.
fn reachable_via_links(arena: &Arena) -> FxHashSet<NodeId> {
    let mut set = FxHashSet::default();
    for i in 0..arena.len() as u32 {
        let id = NodeId::new(i);
        for link in arena.get(id).data.links() {
            set.insert(link);
        }
    }
    set
}

struct Builder<'a> {
    arena: &'a Arena,
    scopes: &'a ScopeArena,
    owner_of_property: &'a FxHashMap<NodeId, NodeId>,
    reachable: FxHashSet<NodeId>,
    visited: FxHashSet<NodeId>,
    out: Indexed,
}

impl<'a> Builder<'a> {
    /// Walk a statement-like node's `children`, recursing into only the
    /// ones that are not already reachable via some sibling's structural
    /// links (see module doc).
    fn walk_container(&mut self, id: NodeId, await_depth: u32) -> RippleResult<()> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        self.record(id, await_depth)?;

        let node = self.arena.get(id);
        for &child in node.children.iter() {
            if !self.reachable.contains(&child) {
                self.walk_any(child, await_depth)?;
            }
        }
        Ok(())
    }

    /// Walk any node: if it has structural links, follow those (true
    /// expression nesting); otherwise treat it as a container and fall
    /// back to `children` (statement nesting).
    fn walk_any(&mut self, id: NodeId, await_depth: u32) -> RippleResult<()> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        self.record(id, await_depth)?;

        let node = self.arena.get(id);
        let links = node.data.links();
        if links.is_empty() {
            for &child in node.children.iter() {
                if !self.reachable.contains(&child) {
                    self.walk_any(child, await_depth)?;
                }
            }
            return Ok(());
        }

        let next_depth = if node.kind == NodeKind::AwaitExpression {
            await_depth + 1
        } else {
            await_depth
        };
        for link in links {
            self.walk_any(link, next_depth)?;
        }
        Ok(())
    }

    /// Record the per-node facts spec §4.3 Pass 2 derives, for the node
    /// just entered at `await_depth` (the depth *outside* this node —
    /// spec excludes the `AwaitExpression` itself from its own
    /// `InAwaitSet` membership).
    fn record(&mut self, id: NodeId, await_depth: u32) -> RippleResult<()> {
        if await_depth > 0 {
            self.out.in_await.insert(id);
        }

        let node = self.arena.get(id);
        match (&node.kind, &node.data) {
            (NodeKind::Property, NodeData::Property { value, kind, .. }) => {
                if *kind != AccessorKind::Init {
                    self.out.accessors.insert(*value);
                }
            }
            (NodeKind::MethodDefinition, NodeData::MethodDefinition { value, kind, .. }) => {
                use crate::ast::MethodKind;
                if matches!(kind, MethodKind::Get | MethodKind::Set) {
                    self.out.accessors.insert(*value);
                }
                // Our own minimal-class extension (spec §9 design notes,
                // SPEC_FULL §5): an instance method reaches its class the
                // same way `X.prototype.m = function () {}` reaches `X` —
                // `MethodDefinition.parent` *is* the owning `ClassDeclaration`
                // node (real nesting, never flattened by `materialize`).
                if matches!(kind, MethodKind::Method) {
                    if let Some(class_id) = node.parent {
                        self.out.constructor_map.insert(*value, class_id);
                    }
                }
            }
            (NodeKind::AssignmentExpression, NodeData::Assignment { left, right }) => {
                self.try_record_prototype_form_a(*left, *right, node.scope)?;
                self.try_record_prototype_form_b(*left, *right, node.scope)?;
            }
            (NodeKind::NewExpression, NodeData::Call { callee, .. }) => {
                if let Some(ctor) = self.resolve_callee(*callee, node.scope) {
                    self.out.constructors.insert(self.resolve_class_constructor(ctor));
                }
            }
            (NodeKind::MemberExpression, NodeData::Member { object, property }) => {
                if matches!(self.arena.get(*object).kind, NodeKind::ThisExpression) {
                    if let Some(func) = self.arena.enclosing_function(id) {
                        let key = self.constructor_key_for(func);
                        self.out.members_of_constructor.entry(key).or_default().push(*property);
                    }
                }
            }
            _ => {}
        }

        if self.out.accessors.contains(&id) {
            return Ok(());
        }
        if !matches!(
            node.kind,
            NodeKind::CallExpression
                | NodeKind::NewExpression
                | NodeKind::MemberExpression
                | NodeKind::Identifier
                | NodeKind::VariableDeclarator
        ) {
            return Ok(());
        }

        let name = name_of(self.arena, self.owner_of_property, id)?;
        match node.kind {
            NodeKind::CallExpression | NodeKind::NewExpression => {
                self.out.calls.entry(name).or_default().push(id);
            }
            _ => {
                self.out.reads.entry(name).or_default().push(id);
            }
        }
        Ok(())
    }

    /// Resolve a callee expression to its definition node through the
    /// scope chain current at `scope` (spec §4.3, instantiation rule).
    fn resolve_callee(&self, callee: NodeId, scope: ScopeId) -> Option<NodeId> {
        let name = match &self.arena.get(callee).data {
            NodeData::Identifier { name } => name.clone(),
            _ => return None,
        };
        self.scopes.resolve(scope, &name)
    }

    /// Form A: `X.prototype = { … }`. Every property of the object
    /// literal has its value recorded in `ConstructorMap`, pointing to
    /// `X`'s function-like definition in the enclosing scope chain.
    fn try_record_prototype_form_a(&mut self, left: NodeId, right: NodeId, scope: ScopeId) -> RippleResult<()> {
        let NodeData::Member { object, property } = &self.arena.get(left).data else {
            return Ok(());
        };
        if !self.is_prototype_identifier(*property) {
            return Ok(());
        }
        let NodeData::Identifier { name } = &self.arena.get(*object).data else {
            return Ok(());
        };
        let Some(ctor) = self.scopes.resolve(scope, name) else {
            return Ok(());
        };
        let NodeData::ObjectExpr { properties } = &self.arena.get(right).data else {
            return Ok(());
        };
        for &prop_id in properties {
            if let NodeData::Property { value, .. } = &self.arena.get(prop_id).data {
                self.out.constructor_map.insert(*value, ctor);
            }
        }
        Ok(())
    }

    /// Form B: `X.prototype.foo = function (…) { … }`.
    fn try_record_prototype_form_b(&mut self, left: NodeId, right: NodeId, scope: ScopeId) -> RippleResult<()> {
        let NodeData::Member { object, .. } = &self.arena.get(left).data else {
            return Ok(());
        };
        let NodeData::Member { object: inner_object, property: inner_property } = &self.arena.get(*object).data
        else {
            return Ok(());
        };
        if !self.is_prototype_identifier(*inner_property) {
            return Ok(());
        }
        let NodeData::Identifier { name } = &self.arena.get(*inner_object).data else {
            return Ok(());
        };
        if let Some(ctor) = self.scopes.resolve(scope, name) {
            self.out.constructor_map.insert(right, ctor);
        }
        Ok(())
    }

    fn is_prototype_identifier(&self, id: NodeId) -> bool {
        matches!(&self.arena.get(id).data, NodeData::Identifier { name } if name.as_str() == "prototype")
    }

    /// Our own minimal-class extension (SPEC_FULL §5): `new Foo()` observes
    /// the class itself, but the node that must actually become `async` is
    /// `Foo`'s `constructor` method body, not the class declaration. Resolve
    /// to that function when one exists so `ConstructorSet` lines up with
    /// the node [`Self::constructor_key_for`] routes `this.`-member captures
    /// to, and with the node propagation later schedules as the real parent.
    fn resolve_class_constructor(&self, id: NodeId) -> NodeId {
        if let NodeData::Class { members, .. } = &self.arena.get(id).data {
            for &member in members {
                if let NodeData::MethodDefinition { value, kind, .. } = &self.arena.get(member).data {
                    if matches!(kind, crate::ast::MethodKind::Constructor) {
                        return *value;
                    }
                }
            }
        }
        id
    }

    /// Where a `this.<prop>` capture found inside `func` should be filed in
    /// `MembersOfConstructor`. A class's methods (constructor included) all
    /// carry the owning `ClassDeclaration`/`ClassExpression` as `parent`
    /// (real nesting, never flattened — see `materialize`'s module doc), so
    /// route every class-method capture to that shared class node — the
    /// same node `MethodDefinition`'s `ConstructorMap` entry already points
    /// to for its sibling methods.
    fn constructor_key_for(&self, func: NodeId) -> NodeId {
        match self.arena.get(func).parent {
            Some(p) if matches!(self.arena.get(p).kind, NodeKind::ClassDeclaration | NodeKind::ClassExpression) => p,
            _ => func,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::materialize;
    use ripple_source::{LineMap, LineMapEntry};

    fn index_source(source: &str) -> (Arena, ScopeArena, FxHashMap<NodeId, NodeId>, Indexed) {
        let mut map = LineMap::new();
        map.push(LineMapEntry {
            start_buffer_line: 0,
            end_buffer_line_exclusive: source.split('\n').count() as u32,
            path: "f.js".to_string(),
            first_line_in_file: 1,
        });
        let m = materialize(source, "f.js", &map).expect("parses");
        let indexed = build_index(&m.arena, &m.scopes, &m.owner_of_property, m.program).unwrap();
        (m.arena, m.scopes, m.owner_of_property, indexed)
    }

    #[test]
    fn await_marks_only_the_awaited_subtree() {
        let (_arena, _scopes, _owner, indexed) =
            index_source("function f() { return g(); }\nasync function h() { await f(); }\n");
        // `f()`'s callee `f` and the call node itself are inside the await.
        assert!(indexed.calls.get("f").map(|v| v.len()).unwrap_or(0) >= 1);
        let f_call = indexed.calls["f"][0];
        assert!(indexed.in_await.contains(&f_call));
    }

    #[test]
    fn prototype_form_a_populates_constructor_map() {
        let (arena, _scopes, owner, indexed) = index_source(
            "function Foo() { this.bar(); }\nFoo.prototype = { bar: function () {} };\n",
        );
        let bar_value = (0..arena.len() as u32)
            .map(NodeId::new)
            .find(|&id| arena.get(id).kind == NodeKind::FunctionExpression)
            .unwrap();
        assert!(indexed.constructor_map.contains_key(&bar_value));
        let foo = indexed.constructor_map[&bar_value];
        assert_eq!(name_of(&arena, &owner, foo).unwrap().as_str(), "Foo");
    }

    #[test]
    fn this_member_capture_records_members_of_constructor() {
        let (arena, _scopes, _owner, indexed) = index_source("function Foo() { this.bar(); }\n");
        let foo = (0..arena.len() as u32)
            .map(NodeId::new)
            .find(|&id| arena.get(id).kind == NodeKind::FunctionDeclaration)
            .unwrap();
        assert_eq!(indexed.members_of_constructor.get(&foo).map(|v| v.len()), Some(1));
    }
}
