//! `nameOf` (spec §4.3): the short, syntactically-derived identifier used
//! as the key for reference lookup. Intentionally local and name-based —
//! not a resolved symbol (spec §9).

use ripple_core::{CompactString, FxHashMap, RippleError, RippleResult};

use crate::ast::{Arena, NodeData, NodeId, NodeKind};

/// Compute `nameOf(n)` per the closed rule set in spec §4.3. Unknown node
/// kinds return `InvalidInput` rather than a best-effort guess, so test
/// suites notice missing cases (spec §7).
pub fn name_of(arena: &Arena, owner_of_property: &FxHashMap<NodeId, NodeId>, id: NodeId) -> RippleResult<CompactString> {
    // Rule 1: if n is a Property.value or AssignmentExpression.right (our
    // own MethodDefinition.value counts too, see materialize), recurse on
    // the key/target it was assigned to.
    if let Some(&owner) = owner_of_property.get(&id) {
        return name_of(arena, owner_of_property, owner);
    }

    let node = arena.get(id);

    // Rule 2: function-like nodes name themselves, or "(lambda)".
    if node.kind.is_function_like() {
        if let NodeData::Function { name, .. } = &node.data {
            return Ok(name.clone().unwrap_or_else(|| CompactString::new("(lambda)")));
        }
    }

    // Rule 3: dispatch by kind.
    match (&node.kind, &node.data) {
        (NodeKind::Identifier, NodeData::Identifier { name }) => Ok(name.clone()),
        (NodeKind::Literal, NodeData::Literal { raw }) => Ok(raw.clone()),
        (NodeKind::MemberExpression, NodeData::Member { property, .. }) => {
            name_of(arena, owner_of_property, *property)
        }
        (NodeKind::CallExpression, NodeData::Call { callee, .. })
        | (NodeKind::NewExpression, NodeData::Call { callee, .. }) => {
            name_of(arena, owner_of_property, *callee)
        }
        (NodeKind::Property, NodeData::Property { key, .. }) => name_of(arena, owner_of_property, *key),
        (NodeKind::VariableDeclarator, NodeData::VariableDeclarator { id, .. }) => {
            name_of(arena, owner_of_property, *id)
        }
        (NodeKind::ThisExpression, _) => Ok(CompactString::new("this")),
        (NodeKind::ArrayPattern | NodeKind::ObjectPattern, NodeData::Pattern { elements }) => {
            let mut parts = Vec::with_capacity(elements.len());
            for el in elements.iter().flatten() {
                parts.push(name_of(arena, owner_of_property, *el)?.to_string());
            }
            Ok(CompactString::new(parts.join(",")))
        }
        // Not in spec's closed list, but a reasonable extension so naming
        // an assignment directly (rather than via Rule 1, which only
        // triggers when some *other* node points at it) still resolves.
        (NodeKind::AssignmentExpression, NodeData::Assignment { right, .. }) => {
            name_of(arena, owner_of_property, *right)
        }
        _ => Err(RippleError::InvalidInput(format!(
            "nameOf: unsupported node kind {:?} at {}:{}",
            node.kind, node.path, node.line
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::materialize;
    use ripple_source::{LineMap, LineMapEntry};

    fn materialize_one(source: &str) -> (Arena, FxHashMap<NodeId, NodeId>) {
        let mut map = LineMap::new();
        map.push(LineMapEntry {
            start_buffer_line: 0,
            end_buffer_line_exclusive: source.split('\n').count() as u32,
            path: "f.js".to_string(),
            first_line_in_file: 1,
        });
        let m = materialize(source, "f.js", &map).expect("parses");
        (m.arena, m.owner_of_property)
    }

    fn find_kind(arena: &Arena, kind: NodeKind) -> NodeId {
        for i in 0..arena.len() as u32 {
            let id = NodeId::new(i);
            if arena.get(id).kind == kind {
                return id;
            }
        }
        panic!("no node of kind {kind:?}");
    }

    #[test]
    fn names_plain_function_declaration() {
        let (arena, owner) = materialize_one("function foo() {}\n");
        let foo = find_kind(&arena, NodeKind::FunctionDeclaration);
        assert_eq!(name_of(&arena, &owner, foo).unwrap().as_str(), "foo");
    }

    #[test]
    fn names_function_expression_via_property_value() {
        let (arena, owner) = materialize_one("const obj = { bar: function() {} };\n");
        let bar = find_kind(&arena, NodeKind::FunctionExpression);
        assert_eq!(name_of(&arena, &owner, bar).unwrap().as_str(), "bar");
    }
}
