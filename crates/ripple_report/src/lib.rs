//! Report - the read-only result structure handed back to callers (spec
//! §4.6): `ReportModel` wraps a parsed [`Engine`] and a seed's
//! [`AsyncMap`], and exposes `nameOf`/`serialize`/`isAsyncSyntaxError`.
//!
//! [`ReportDocument`] is this crate's own addition (SPEC_FULL §7): a
//! `serde`-serializable flattening of `ReportModel` for the out-of-scope
//! Markdown/HTML/JSON report writers (spec §1) to consume, grounded on
//! `vize_croquis::analysis` handing typed results to a separate codegen
//! consumer rather than making it re-walk the AST.

use ripple_core::{CompactString, RippleResult};
use ripple_trace::{name_of, AsyncMap, Engine, NodeId};
use serde::Serialize;

/// `{ seed, asyncMap }` plus the display helpers spec §4.6 lists.
pub struct ReportModel<'a> {
    engine: &'a Engine,
    seed: NodeId,
    async_map: AsyncMap,
}

impl<'a> ReportModel<'a> {
    /// Runs `getAsyncStacks(seed)` against an already-[`Engine::parse`]d
    /// engine and wraps the result.
    pub fn new(engine: &'a Engine, seed: NodeId) -> RippleResult<Self> {
        let async_map = engine.get_async_stacks(seed)?;
        Ok(Self { engine, seed, async_map })
    }

    pub fn seed(&self) -> NodeId {
        self.seed
    }

    pub fn async_map(&self) -> &AsyncMap {
        &self.async_map
    }

    /// The stable short name for display (spec §4.6, `nameOf`).
    pub fn name_of(&self, node: NodeId) -> RippleResult<CompactString> {
        let arena = self.engine.arena()?;
        let owner = self.engine.owner_of_property()?;
        name_of(arena, owner, node)
    }

    /// `"path:line <Kind>[indexOnLine]"` (spec §4.6).
    pub fn serialize(&self, node: NodeId) -> RippleResult<String> {
        let arena = self.engine.arena()?;
        let n = arena.get(node);
        let index_on_line = arena.index_on_line(node);
        Ok(format!("{}:{} {}[{}]", n.path, n.line, n.kind.label(), index_on_line))
    }

    /// `true` iff `node` is an accessor value or a constructor: async
    /// getters/setters and async constructors are illegal JavaScript, so
    /// the propagator may still mark them but the report flags them
    /// (spec §4.6).
    pub fn is_async_syntax_error(&self, node: NodeId) -> RippleResult<bool> {
        self.engine.is_async_syntax_error(node)
    }

    /// Flatten into the serializable [`ReportDocument`] (SPEC_FULL §7).
    pub fn to_document(&self) -> RippleResult<ReportDocument> {
        let seed_name = self.name_of(self.seed)?.to_string();
        let seed_location = self.serialize(self.seed)?;

        let mut functions = Vec::with_capacity(self.async_map.len());
        for (key, edges) in self.async_map.entries() {
            let Some(function) = key else {
                // The sentinel root entry is represented by `seed`/`seed_location`
                // above rather than as a function entry of its own.
                continue;
            };

            let mut edge_docs = Vec::with_capacity(edges.len());
            for edge in edges {
                edge_docs.push(EdgeDocument {
                    await_site: edge
                        .await_node
                        .map(|n| self.serialize(n))
                        .transpose()?,
                    newly_async: edge
                        .async_node
                        .map(|n| self.serialize(n))
                        .transpose()?,
                });
            }

            functions.push(FunctionDocument {
                name: self.name_of(function)?.to_string(),
                location: self.serialize(function)?,
                is_async_syntax_error: self.is_async_syntax_error(function)?,
                edges: edge_docs,
            });
        }

        Ok(ReportDocument { seed_name, seed_location, functions })
    }
}

/// Serializable view of one edge in [`FunctionDocument::edges`].
#[derive(Debug, Clone, Serialize)]
pub struct EdgeDocument {
    /// `None` only for the sentinel root edge, which this crate never
    /// emits into `functions` (see [`ReportModel::to_document`]).
    pub await_site: Option<String>,
    /// The enclosing function newly marked async by this edge, or `None`
    /// when it was already `async` in source ("no new marking needed",
    /// spec §4.5).
    pub newly_async: Option<String>,
}

/// Serializable view of one `AsyncMap` entry.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDocument {
    pub name: String,
    pub location: String,
    /// True for accessors/constructors: legal async markings do not exist
    /// for these in JavaScript (spec §4.6).
    pub is_async_syntax_error: bool,
    pub edges: Vec<EdgeDocument>,
}

/// Flattened, JSON-serializable view of a [`ReportModel`] (SPEC_FULL §7).
/// The out-of-scope Markdown/HTML report writers (spec §1) consume this
/// shape instead of reaching into `AsyncMap`/`Arena` directly.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub seed_name: String,
    pub seed_location: String,
    pub functions: Vec<FunctionDocument>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_trace::EngineOptions;

    fn engine_with(sources: &[(&str, &str)]) -> Engine {
        let mut engine = Engine::new("/project", EngineOptions::default());
        for (path, text) in sources {
            engine.append_source(*path, 1, *text).unwrap();
        }
        engine.parse().unwrap();
        engine
    }

    // Scenario A (spec §8): "two-functions-minimal".
    #[test]
    fn two_functions_minimal() {
        let engine = engine_with(&[("a.js", "function a() { b(); }\n"), ("b.js", "function b() {}\n")]);
        let b = engine.function_node_from_line("b.js", 1, 0).unwrap();
        let model = ReportModel::new(&engine, b).unwrap();

        assert_eq!(model.async_map().root().len(), 1);
        assert_eq!(model.async_map().root()[0].async_node, Some(b));

        let doc = model.to_document().unwrap();
        assert_eq!(doc.seed_name, "b");
        assert_eq!(doc.functions.len(), 1);
        assert_eq!(doc.functions[0].name, "b");
        assert_eq!(doc.functions[0].edges.len(), 1);
        assert_eq!(doc.functions[0].edges[0].newly_async.as_deref().map(|s| s.contains("a.js")), Some(true));
    }

    // Scenario C (spec §8): "name-collision" — callers in a sibling scope
    // sharing the seed's short name must not appear.
    #[test]
    fn name_collision_respects_scope_reachability() {
        let source = "\
function outer() {
    function callee() {}
    function caller() { callee(); }
    caller();
}
function sibling() {
    function callee() {}
    function otherCaller() { callee(); }
}
";
        let engine = engine_with(&[("fixture.js", source)]);
        // Seed the inner `callee` at its declaration line (line 3).
        let callee = engine.function_node_from_line("fixture.js", 3, 0).unwrap();
        let model = ReportModel::new(&engine, callee).unwrap();
        let doc = model.to_document().unwrap();

        let caller_entry = doc.functions.iter().find(|f| f.name == "caller");
        assert!(caller_entry.is_some(), "caller in the seed's own scope chain must be marked");

        let other_caller_entry = doc.functions.iter().find(|f| f.name == "otherCaller");
        assert!(
            other_caller_entry.is_none(),
            "otherCaller in a sibling scope sharing the same callee name must not be marked"
        );
    }

    // Scenario F / "class-constructor" (spec §8 Scenario F, SPEC_FULL §6
    // Scenario H): an accessor/constructor is flagged by
    // `is_async_syntax_error`.
    #[test]
    fn constructor_is_flagged_as_async_syntax_error() {
        let source = "\
function Foo() { this.bar(); }
Foo.prototype = { bar: function () {} };
new Foo();
";
        let engine = engine_with(&[("fixture.js", source)]);
        let bar = engine.function_node_from_line("fixture.js", 2, 0).unwrap();
        let model = ReportModel::new(&engine, bar).unwrap();
        let doc = model.to_document().unwrap();

        let foo_entry = doc.functions.iter().find(|f| f.name == "Foo");
        assert!(foo_entry.is_some(), "Foo's constructor must be reached via this.bar()");
        assert!(foo_entry.unwrap().is_async_syntax_error, "Foo was `new`-invoked, so marking it async is illegal");
    }

    // Scenario B (spec §8): "top-functions" — a 19-line fixture, seeded at
    // the function declared on line 19, whose serialized report must equal
    // an exact expected dump line for line.
    #[test]
    fn top_functions_serializes_exact_fixture() {
        let source = "\
function first() {
    second();
}

function second() {
    third();
}

function third() {
    fourth();
}

function fourth() {
    top();
}



function top() {}
";
        assert_eq!(source.split('\n').count(), 20, "19 lines plus the trailing newline's empty tail");

        let engine = engine_with(&[("fixture.js", source)]);
        let top = engine.function_node_from_line("fixture.js", 19, 0).unwrap();
        let model = ReportModel::new(&engine, top).unwrap();
        let doc = model.to_document().unwrap();

        assert_eq!(doc.seed_name, "top");
        assert_eq!(doc.seed_location, "fixture.js:19 FunctionDeclaration[0]");

        let mut actual = String::new();
        for f in &doc.functions {
            actual.push_str(&format!("{} ({})\n", f.name, f.location));
            for e in &f.edges {
                actual.push_str(&format!(
                    "  await {} -> async {}\n",
                    e.await_site.as_deref().unwrap_or("?"),
                    e.newly_async.as_deref().unwrap_or("(already async)")
                ));
            }
        }

        let expected = "\
top (fixture.js:19 FunctionDeclaration[0])
  await fixture.js:14 CallExpression[0] -> async fixture.js:13 FunctionDeclaration[0]
fourth (fixture.js:13 FunctionDeclaration[0])
  await fixture.js:10 CallExpression[0] -> async fixture.js:9 FunctionDeclaration[0]
third (fixture.js:9 FunctionDeclaration[0])
  await fixture.js:6 CallExpression[0] -> async fixture.js:5 FunctionDeclaration[0]
second (fixture.js:5 FunctionDeclaration[0])
  await fixture.js:2 CallExpression[0] -> async fixture.js:1 FunctionDeclaration[0]
";
        assert_eq!(actual, expected);
    }

    // Scenario D (spec §8): "object-define-this-match" — seeding an
    // object/prototype method named `c` whose constructor captures
    // `this.c()` must mark that `this.`-qualified caller, without pulling
    // in an unrelated free function that merely shares the name `c`.
    #[test]
    fn object_literal_this_match_excludes_unrelated_same_name_function() {
        let source = "\
function Obj() {
  this.c();
}
Obj.prototype = { c: function () {} };
function c() {}
new Obj();
";
        let engine = engine_with(&[("fixture.js", source)]);
        let seed = engine.function_node_from_line("fixture.js", 4, 0).unwrap();
        let free_c = engine.function_node_from_line("fixture.js", 5, 0).unwrap();
        assert_ne!(seed, free_c, "the prototype method and the free function must be distinct nodes");

        let model = ReportModel::new(&engine, seed).unwrap();
        let doc = model.to_document().unwrap();

        let obj_entry = doc.functions.iter().find(|f| f.name == "Obj");
        assert!(obj_entry.is_some(), "Obj must be reached via this.c()");

        assert!(
            model.async_map().get(free_c).is_none(),
            "the unrelated free function sharing the name `c` must never be scheduled"
        );
    }
}
