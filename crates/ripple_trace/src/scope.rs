//! Lexical scope tree.
//!
//! One [`Scope`] per function-like node plus the program (module) scope;
//! `vize_croquis::scope::chain::ScopeChain` is the precedent for keeping
//! scopes in a flat arena addressed by an integer id rather than as
//! `Rc<RefCell<..>>` nodes with back-pointers.

use ripple_core::{CompactString, FxHashMap};

use crate::ast::NodeId;

/// Unique identifier for a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The program (module-level) scope; always the first scope created.
    pub const ROOT: Self = Self(0);

    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// A definition site recorded when a name is bound in a scope.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    /// The node a reference to this name should resolve to: the
    /// `FunctionDeclaration` node for a function declaration, the
    /// function-like node for `const X = function () {}` / `const X = () =>
    /// {}`, or the simple binding site (`VariableDeclarator.id`,
    /// a parameter identifier, …) otherwise.
    pub definition: NodeId,
}

/// One scope in the tree. Entered on a function-like node, popped on leave;
/// the program scope (`ScopeId::ROOT`) has no parent.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    bindings: FxHashMap<CompactString, Binding>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>) -> Self {
        Self {
            id,
            parent,
            bindings: FxHashMap::default(),
        }
    }

    pub fn define(&mut self, name: impl Into<CompactString>, definition: NodeId) {
        self.bindings.insert(name.into(), Binding { definition });
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

/// The scope tree: a flat arena of [`Scope`], plus a cursor used while
/// walking the AST to track "the scope current at this node".
#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Create an arena containing only the program scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeId::ROOT, None)],
        }
    }

    pub fn enter(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, Some(parent)));
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.as_u32() as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.as_u32() as usize]
    }

    /// Walk up the parent chain from `from`, returning the nearest
    /// definition bound to `name`, if any.
    pub fn resolve(&self, from: ScopeId, name: &str) -> Option<NodeId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let scope = self.get(id);
            if let Some(binding) = scope.binding(name) {
                return Some(binding.definition);
            }
            cursor = scope.parent;
        }
        None
    }

    /// "Scope ancestor": the reflexive-transitive closure of a scope's
    /// parent chain. `true` iff `ancestor` is `descendant` or encloses it.
    pub fn is_ancestor_or_equal(&self, ancestor: ScopeId, descendant: ScopeId) -> bool {
        let mut cursor = Some(descendant);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
