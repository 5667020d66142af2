//! `oxc` AST → [`Arena`] conversion. This *is* spec §4.3's Pass 1: a single
//! preorder walk over the borrowed oxc tree that assigns each node's
//! `(path, line)` via the [`LineMap`](ripple_source::LineMap), maintains a
//! scope cursor that enters/pops on function-like nodes, and records
//! `OwnerOfProperty` for `Property.value`/`AssignmentExpression.right`
//! nodes. Pass 2 (semantic facts: `nameOf`, reference indexing,
//! prototype/constructor reasoning, await depth) runs afterwards, entirely
//! over the materialized [`Arena`] — see [`crate::index`].
//!
//! Grounded on `vize_croquis::script_parser::{mod, walk, process, extract}`:
//! same `Parser::new(&allocator, source, source_type).parse()` entry point,
//! same recursive-descent-over-`Expression`/`Statement` shape, same
//! `arg.as_expression()` / chain-unwrapping idioms for the constructs this
//! crate does not give first-class node kinds to.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    AssignmentTarget, BindingPattern, BindingPatternKind, ChainElement, ClassElement, Declaration,
    Expression, ForStatementLeft, MethodDefinitionKind, ObjectPropertyKind, Program, PropertyKey,
    PropertyKind as OxcPropertyKind, Statement, VariableDeclarator,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use ripple_core::{CompactString, FxHashMap, RippleError, RippleResult, SmallVec};
use ripple_source::LineMap;

use crate::ast::{AccessorKind, Arena, AstNode, MethodKind, NodeData, NodeId, NodeKind};
use crate::scope::{ScopeArena, ScopeId};

/// Everything [`materialize`] produces.
pub struct Materialized {
    pub arena: Arena,
    pub scopes: ScopeArena,
    /// `(path, line) → nodes visited at that line, in visitation order`.
    pub node_index: FxHashMap<(CompactString, u32), Vec<NodeId>>,
    /// `Property.value` / `AssignmentExpression.right` → key/target node.
    pub owner_of_property: FxHashMap<NodeId, NodeId>,
    pub program: NodeId,
}

/// Parse `source` (already the fully concatenated buffer) and materialize
/// it into an [`Arena`]. `line_map` resolves buffer byte offsets back to
/// `(path, line)` — offsets are first converted to buffer *lines* via a
/// scan for `\n`, then handed to [`LineMap::locate`].
pub fn materialize(source: &str, source_type_hint: &str, line_map: &LineMap) -> RippleResult<Materialized> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(source_type_hint).unwrap_or_default();
    let ret = Parser::new(&allocator, source, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser panicked".to_string());
        // oxc reports error spans via `miette::Diagnostic::labels()`; walking
        // that trait object is more machinery than this diagnostic is worth,
        // so the syntax error is anchored at the start of the buffer and the
        // parser's own message (which includes its own span text) carries
        // the precise location.
        let offset = 0u32;
        let line_starts = build_line_starts(source);
        let buffer_line = offset_to_buffer_line(&line_starts, offset);
        let (path, line) = line_map
            .locate(buffer_line)
            .unwrap_or_else(|_| ("<unknown>".to_string(), 0));
        return Err(RippleError::SyntaxError { path, line, message });
    }

    let mut m = Materializer {
        arena: Arena::new(),
        scopes: ScopeArena::new(),
        node_index: FxHashMap::default(),
        owner_of_property: FxHashMap::default(),
        current_scope: ScopeId::ROOT,
        line_starts: build_line_starts(source),
        line_map,
        source,
    };

    let program = m.convert_program(&ret.program)?;

    Ok(Materialized {
        arena: m.arena,
        scopes: m.scopes,
        node_index: m.node_index,
        owner_of_property: m.owner_of_property,
        program,
    })
}

fn build_line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

fn offset_to_buffer_line(line_starts: &[u32], offset: u32) -> u32 {
    match line_starts.binary_search(&offset) {
        Ok(idx) => idx as u32,
        Err(idx) => (idx.saturating_sub(1)) as u32,
    }
}

struct Materializer<'s> {
    arena: Arena,
    scopes: ScopeArena,
    node_index: FxHashMap<(CompactString, u32), Vec<NodeId>>,
    owner_of_property: FxHashMap<NodeId, NodeId>,
    current_scope: ScopeId,
    line_starts: Vec<u32>,
    line_map: &'s LineMap,
    source: &'s str,
}

impl<'s> Materializer<'s> {
    fn text(&self, start: u32, end: u32) -> CompactString {
        CompactString::new(self.source.get(start as usize..end as usize).unwrap_or(""))
    }

    fn alloc(
        &mut self,
        kind: NodeKind,
        start: u32,
        end: u32,
        parent: Option<NodeId>,
        data: NodeData,
    ) -> RippleResult<NodeId> {
        let buffer_line = offset_to_buffer_line(&self.line_starts, start);
        let (path, line) = self.line_map.locate(buffer_line)?;
        let path: CompactString = path.into();

        let id = self.arena.alloc(AstNode {
            kind,
            parent,
            children: SmallVec::new(),
            start,
            end,
            path: path.clone(),
            line,
            scope: self.current_scope,
            data,
        });

        if let Some(parent) = parent {
            self.arena.add_child(parent, id);
        }
        self.node_index.entry((path, line)).or_default().push(id);
        Ok(id)
    }

    // ---- program / statements -----------------------------------------

    fn convert_program(&mut self, program: &Program<'_>) -> RippleResult<NodeId> {
        let span = program.span;
        let id = self.alloc(NodeKind::Program, span.start, span.end, None, NodeData::None)?;
        for stmt in program.body.iter() {
            self.convert_statement(stmt, id)?;
        }
        Ok(id)
    }

    fn convert_statement(&mut self, stmt: &Statement<'_>, parent: NodeId) -> RippleResult<NodeId> {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                let span = decl.span();
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for declarator in decl.declarations.iter() {
                    self.convert_declarator(declarator, id)?;
                }
                Ok(id)
            }
            Statement::FunctionDeclaration(func) => {
                let span = func.span;
                let name = func.id.as_ref().map(|id| CompactString::new(id.name.as_str()));
                let fn_id = self.alloc(
                    NodeKind::FunctionDeclaration,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Function { name: name.clone(), is_async: func.r#async },
                )?;
                if let Some(name) = name {
                    self.scopes.get_mut(self.current_scope).define(name, fn_id);
                }
                self.with_function_scope(|m| {
                    for param in func.params.items.iter() {
                        m.bind_param(&param.pattern);
                    }
                    if let Some(body) = &func.body {
                        for s in body.statements.iter() {
                            m.convert_statement(s, fn_id)?;
                        }
                    }
                    Ok(())
                })?;
                Ok(fn_id)
            }
            Statement::ClassDeclaration(class) => {
                let id = self.convert_class(class, parent)?;
                Ok(id)
            }
            Statement::ExpressionStatement(expr_stmt) => {
                self.convert_expression(&expr_stmt.expression, parent)
            }
            Statement::ReturnStatement(ret) => {
                let span = ret.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                if let Some(arg) = &ret.argument {
                    self.convert_expression(arg, id)?;
                }
                Ok(id)
            }
            Statement::IfStatement(if_stmt) => {
                let span = if_stmt.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&if_stmt.test, id)?;
                self.convert_statement(&if_stmt.consequent, id)?;
                if let Some(alt) = &if_stmt.alternate {
                    self.convert_statement(alt, id)?;
                }
                Ok(id)
            }
            Statement::BlockStatement(block) => {
                let span = block.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for s in block.body.iter() {
                    self.convert_statement(s, id)?;
                }
                Ok(id)
            }
            Statement::WhileStatement(w) => {
                let span = w.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&w.test, id)?;
                self.convert_statement(&w.body, id)?;
                Ok(id)
            }
            Statement::DoWhileStatement(w) => {
                let span = w.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_statement(&w.body, id)?;
                self.convert_expression(&w.test, id)?;
                Ok(id)
            }
            Statement::ForStatement(f) => {
                let span = f.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                if let Some(init) = &f.init {
                    if let Some(expr) = init.as_expression() {
                        self.convert_expression(expr, id)?;
                    }
                }
                if let Some(test) = &f.test {
                    self.convert_expression(test, id)?;
                }
                if let Some(update) = &f.update {
                    self.convert_expression(update, id)?;
                }
                self.convert_statement(&f.body, id)?;
                Ok(id)
            }
            Statement::ForInStatement(f) => {
                let span = f.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_for_left(&f.left, id)?;
                self.convert_expression(&f.right, id)?;
                self.convert_statement(&f.body, id)?;
                Ok(id)
            }
            Statement::ForOfStatement(f) => {
                let span = f.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_for_left(&f.left, id)?;
                self.convert_expression(&f.right, id)?;
                self.convert_statement(&f.body, id)?;
                Ok(id)
            }
            Statement::TryStatement(t) => {
                let span = t.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for s in t.block.body.iter() {
                    self.convert_statement(s, id)?;
                }
                if let Some(handler) = &t.handler {
                    for s in handler.body.body.iter() {
                        self.convert_statement(s, id)?;
                    }
                }
                if let Some(finalizer) = &t.finalizer {
                    for s in finalizer.body.iter() {
                        self.convert_statement(s, id)?;
                    }
                }
                Ok(id)
            }
            Statement::SwitchStatement(s) => {
                let span = s.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&s.discriminant, id)?;
                for case in s.cases.iter() {
                    if let Some(test) = &case.test {
                        self.convert_expression(test, id)?;
                    }
                    for s in case.consequent.iter() {
                        self.convert_statement(s, id)?;
                    }
                }
                Ok(id)
            }
            Statement::ThrowStatement(t) => {
                let span = t.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&t.argument, id)?;
                Ok(id)
            }
            Statement::ExportNamedDeclaration(e) => {
                let span = e.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                if let Some(decl) = &e.declaration {
                    self.convert_declaration(decl, id)?;
                }
                Ok(id)
            }
            Statement::ExportDefaultDeclaration(e) => {
                let span = e.span;
                self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
            }
            other => {
                let span = other.span();
                self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
            }
        }
    }

    fn convert_declaration(&mut self, decl: &Declaration<'_>, parent: NodeId) -> RippleResult<NodeId> {
        match decl {
            Declaration::VariableDeclaration(decl) => {
                let span = decl.span();
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for declarator in decl.declarations.iter() {
                    self.convert_declarator(declarator, id)?;
                }
                Ok(id)
            }
            Declaration::FunctionDeclaration(f) => {
                let span = f.span;
                let name = f.id.as_ref().map(|id| CompactString::new(id.name.as_str()));
                let fn_id = self.alloc(
                    NodeKind::FunctionDeclaration,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Function { name: name.clone(), is_async: f.r#async },
                )?;
                if let Some(name) = name {
                    self.scopes.get_mut(self.current_scope).define(name, fn_id);
                }
                self.with_function_scope(|m| {
                    for param in f.params.items.iter() {
                        m.bind_param(&param.pattern);
                    }
                    if let Some(body) = &f.body {
                        for s in body.statements.iter() {
                            m.convert_statement(s, fn_id)?;
                        }
                    }
                    Ok(())
                })?;
                Ok(fn_id)
            }
            Declaration::ClassDeclaration(c) => self.convert_class(c, parent),
            other => {
                let span = other.span();
                self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
            }
        }
    }

    fn convert_declarator(&mut self, declarator: &VariableDeclarator<'_>, parent: NodeId) -> RippleResult<NodeId> {
        let span = declarator.span;
        let id_node = self.convert_binding_pattern(&declarator.id, parent)?;
        let init_node = match &declarator.init {
            Some(init) => Some(self.convert_expression(init, parent)?),
            None => None,
        };
        let decl_id = self.alloc(
            NodeKind::VariableDeclarator,
            span.start,
            span.end,
            Some(parent),
            NodeData::VariableDeclarator { id: id_node, init: init_node },
        )?;
        match init_node {
            Some(init_node) => self.bind_declarator(&declarator.id, decl_id, init_node),
            None => self.bind_pattern_to_definitions(&declarator.id, decl_id),
        }
        Ok(decl_id)
    }

    fn convert_for_left(&mut self, left: &ForStatementLeft<'_>, parent: NodeId) -> RippleResult<()> {
        if let ForStatementLeft::VariableDeclaration(decl) = left {
            for declarator in decl.declarations.iter() {
                self.bind_pattern_to_definitions(&declarator.id, parent);
            }
        }
        Ok(())
    }

    // ---- classes ---------------------------------------------------------

    fn convert_class(&mut self, class: &oxc_ast::ast::Class<'_>, parent: NodeId) -> RippleResult<NodeId> {
        let span = class.span;
        let name = class.id.as_ref().map(|id| CompactString::new(id.name.as_str()));
        let mut members = SmallVec::new();
        let class_id = self.alloc(
            NodeKind::ClassDeclaration,
            span.start,
            span.end,
            Some(parent),
            NodeData::Class { name: name.clone(), members: SmallVec::new() },
        )?;
        if let Some(name) = &name {
            self.scopes.get_mut(self.current_scope).define(name.clone(), class_id);
        }
        for element in class.body.body.iter() {
            if let ClassElement::MethodDefinition(method) = element {
                let m_span = method.span;
                let key_id = self.convert_property_key(&method.key, class_id)?;
                let kind = match method.kind {
                    MethodDefinitionKind::Constructor => MethodKind::Constructor,
                    MethodDefinitionKind::Get => MethodKind::Get,
                    MethodDefinitionKind::Set => MethodKind::Set,
                    MethodDefinitionKind::Method => MethodKind::Method,
                };
                let value_id = self.convert_function_value(&method.value, class_id, kind)?;
                self.owner_of_property.insert(value_id, key_id);
                let method_id = self.alloc(
                    NodeKind::MethodDefinition,
                    m_span.start,
                    m_span.end,
                    Some(class_id),
                    NodeData::MethodDefinition { key: key_id, value: value_id, kind },
                )?;
                members.push(method_id);
            }
        }
        if let NodeData::Class { members: slot, .. } = &mut self.arena.get_mut(class_id).data {
            *slot = members;
        }
        Ok(class_id)
    }

    fn convert_function_value(
        &mut self,
        func: &oxc_ast::ast::Function<'_>,
        parent: NodeId,
        method_kind: MethodKind,
    ) -> RippleResult<NodeId> {
        let span = func.span;
        let fn_id = self.alloc(
            NodeKind::FunctionExpression,
            span.start,
            span.end,
            Some(parent),
            NodeData::Function { name: None, is_async: func.r#async },
        )?;
        let _ = method_kind;
        self.with_function_scope(|m| {
            for param in func.params.items.iter() {
                m.bind_param(&param.pattern);
            }
            if let Some(body) = &func.body {
                for s in body.statements.iter() {
                    m.convert_statement(s, fn_id)?;
                }
            }
            Ok(())
        })?;
        Ok(fn_id)
    }

    // ---- expressions -------------------------------------------------

    fn convert_expression(&mut self, expr: &Expression<'_>, parent: NodeId) -> RippleResult<NodeId> {
        match expr {
            Expression::BooleanLiteral(_)
            | Expression::NumericLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::NullLiteral(_)
            | Expression::BigIntLiteral(_)
            | Expression::RegExpLiteral(_) => {
                let span = expr.span();
                let raw = self.text(span.start, span.end);
                self.alloc(NodeKind::Literal, span.start, span.end, Some(parent), NodeData::Literal { raw })
            }
            Expression::Identifier(ident) => {
                let span = ident.span;
                let name = CompactString::new(ident.name.as_str());
                self.alloc(NodeKind::Identifier, span.start, span.end, Some(parent), NodeData::Identifier { name })
            }
            Expression::ThisExpression(t) => {
                let span = t.span;
                self.alloc(NodeKind::ThisExpression, span.start, span.end, Some(parent), NodeData::None)
            }
            Expression::ArrowFunctionExpression(arrow) => {
                let span = arrow.span;
                let fn_id = self.alloc(
                    NodeKind::ArrowFunctionExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Function { name: None, is_async: arrow.r#async },
                )?;
                self.with_function_scope(|m| {
                    for param in arrow.params.items.iter() {
                        m.bind_param(&param.pattern);
                    }
                    if arrow.expression {
                        if let Some(Statement::ExpressionStatement(e)) = arrow.body.statements.first() {
                            m.convert_expression(&e.expression, fn_id)?;
                        }
                    } else {
                        for s in arrow.body.statements.iter() {
                            m.convert_statement(s, fn_id)?;
                        }
                    }
                    Ok(())
                })?;
                Ok(fn_id)
            }
            Expression::FunctionExpression(func) => {
                let span = func.span;
                let name = func.id.as_ref().map(|id| CompactString::new(id.name.as_str()));
                let fn_id = self.alloc(
                    NodeKind::FunctionExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Function { name, is_async: func.r#async },
                )?;
                self.with_function_scope(|m| {
                    for param in func.params.items.iter() {
                        m.bind_param(&param.pattern);
                    }
                    if let Some(body) = &func.body {
                        for s in body.statements.iter() {
                            m.convert_statement(s, fn_id)?;
                        }
                    }
                    Ok(())
                })?;
                Ok(fn_id)
            }
            Expression::ClassExpression(class) => {
                let id = self.convert_class(class, parent)?;
                self.arena.get_mut(id).kind = NodeKind::ClassExpression;
                Ok(id)
            }
            Expression::CallExpression(call) => {
                let span = call.span;
                let callee = self.convert_expression(&call.callee, parent)?;
                let mut arguments = SmallVec::new();
                for arg in call.arguments.iter() {
                    if let Some(e) = arg.as_expression() {
                        arguments.push(self.convert_expression(e, parent)?);
                    } else if let oxc_ast::ast::Argument::SpreadElement(s) = arg {
                        arguments.push(self.convert_expression(&s.argument, parent)?);
                    }
                }
                self.alloc(
                    NodeKind::CallExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Call { callee, arguments },
                )
            }
            Expression::NewExpression(call) => {
                let span = call.span;
                let callee = self.convert_expression(&call.callee, parent)?;
                let mut arguments = SmallVec::new();
                for arg in call.arguments.iter() {
                    if let Some(e) = arg.as_expression() {
                        arguments.push(self.convert_expression(e, parent)?);
                    } else if let oxc_ast::ast::Argument::SpreadElement(s) = arg {
                        arguments.push(self.convert_expression(&s.argument, parent)?);
                    }
                }
                self.alloc(
                    NodeKind::NewExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Call { callee, arguments },
                )
            }
            Expression::StaticMemberExpression(member) => {
                let span = member.span;
                let object = self.convert_expression(&member.object, parent)?;
                let p_span = member.property.span;
                let property = self.alloc(
                    NodeKind::Identifier,
                    p_span.start,
                    p_span.end,
                    Some(parent),
                    NodeData::Identifier { name: CompactString::new(member.property.name.as_str()) },
                )?;
                self.alloc(
                    NodeKind::MemberExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Member { object, property },
                )
            }
            Expression::ComputedMemberExpression(member) => {
                let span = member.span;
                let object = self.convert_expression(&member.object, parent)?;
                let property = self.convert_expression(&member.expression, parent)?;
                self.alloc(
                    NodeKind::MemberExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Member { object, property },
                )
            }
            Expression::ChainExpression(chain) => match &chain.expression {
                ChainElement::CallExpression(call) => self.convert_chain_call(call, parent),
                ChainElement::StaticMemberExpression(member) => {
                    self.convert_chain_static_member(member, parent)
                }
                ChainElement::ComputedMemberExpression(member) => {
                    self.convert_chain_computed_member(member, parent)
                }
                _ => {
                    let span = chain.span;
                    self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
                }
            },
            Expression::AssignmentExpression(assign) => {
                let span = assign.span;
                let left = self.convert_assignment_target(&assign.left, parent)?;
                let right = self.convert_expression(&assign.right, parent)?;
                self.owner_of_property.insert(right, left);
                self.alloc(
                    NodeKind::AssignmentExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Assignment { left, right },
                )
            }
            Expression::ObjectExpression(obj) => {
                let span = obj.span;
                let mut properties = SmallVec::new();
                for prop in obj.properties.iter() {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => {
                            let p_span = p.span;
                            let key = self.convert_property_key(&p.key, parent)?;
                            let value = self.convert_expression(&p.value, parent)?;
                            self.owner_of_property.insert(value, key);
                            let kind = match p.kind {
                                OxcPropertyKind::Init => AccessorKind::Init,
                                OxcPropertyKind::Get => AccessorKind::Get,
                                OxcPropertyKind::Set => AccessorKind::Set,
                            };
                            let prop_id = self.alloc(
                                NodeKind::Property,
                                p_span.start,
                                p_span.end,
                                Some(parent),
                                NodeData::Property { key, value, kind },
                            )?;
                            properties.push(prop_id);
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            properties.push(self.convert_expression(&spread.argument, parent)?);
                        }
                    }
                }
                self.alloc(
                    NodeKind::ObjectExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::ObjectExpr { properties },
                )
            }
            Expression::ArrayExpression(arr) => {
                let span = arr.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for el in arr.elements.iter() {
                    if let Some(e) = el.as_expression() {
                        self.convert_expression(e, id)?;
                    }
                }
                Ok(id)
            }
            Expression::AwaitExpression(await_expr) => {
                let span = await_expr.span;
                let argument = self.convert_expression(&await_expr.argument, parent)?;
                self.alloc(
                    NodeKind::AwaitExpression,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Await { argument },
                )
            }
            Expression::BinaryExpression(b) => {
                let span = b.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&b.left, id)?;
                self.convert_expression(&b.right, id)?;
                Ok(id)
            }
            Expression::LogicalExpression(b) => {
                let span = b.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&b.left, id)?;
                self.convert_expression(&b.right, id)?;
                Ok(id)
            }
            Expression::UnaryExpression(u) => {
                let span = u.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&u.argument, id)?;
                Ok(id)
            }
            Expression::ConditionalExpression(c) => {
                let span = c.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&c.test, id)?;
                self.convert_expression(&c.consequent, id)?;
                self.convert_expression(&c.alternate, id)?;
                Ok(id)
            }
            Expression::SequenceExpression(s) => {
                let span = s.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for e in s.expressions.iter() {
                    self.convert_expression(e, id)?;
                }
                Ok(id)
            }
            Expression::TemplateLiteral(t) => {
                let span = t.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                for e in t.expressions.iter() {
                    self.convert_expression(e, id)?;
                }
                Ok(id)
            }
            Expression::TaggedTemplateExpression(t) => {
                let span = t.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                self.convert_expression(&t.tag, id)?;
                for e in t.quasi.expressions.iter() {
                    self.convert_expression(e, id)?;
                }
                Ok(id)
            }
            Expression::ParenthesizedExpression(p) => self.convert_expression(&p.expression, parent),
            Expression::YieldExpression(y) => {
                let span = y.span;
                let id = self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)?;
                if let Some(arg) = &y.argument {
                    self.convert_expression(arg, id)?;
                }
                Ok(id)
            }
            Expression::TSAsExpression(e) => self.convert_expression(&e.expression, parent),
            Expression::TSSatisfiesExpression(e) => self.convert_expression(&e.expression, parent),
            Expression::TSNonNullExpression(e) => self.convert_expression(&e.expression, parent),
            Expression::TSTypeAssertion(e) => self.convert_expression(&e.expression, parent),
            Expression::TSInstantiationExpression(e) => self.convert_expression(&e.expression, parent),
            other => {
                let span = other.span();
                self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
            }
        }
    }

    fn convert_chain_call(&mut self, call: &oxc_ast::ast::CallExpression<'_>, parent: NodeId) -> RippleResult<NodeId> {
        let span = call.span;
        let callee = self.convert_expression(&call.callee, parent)?;
        let mut arguments = SmallVec::new();
        for arg in call.arguments.iter() {
            if let Some(e) = arg.as_expression() {
                arguments.push(self.convert_expression(e, parent)?);
            }
        }
        self.alloc(NodeKind::CallExpression, span.start, span.end, Some(parent), NodeData::Call { callee, arguments })
    }

    fn convert_chain_static_member(
        &mut self,
        member: &oxc_ast::ast::StaticMemberExpression<'_>,
        parent: NodeId,
    ) -> RippleResult<NodeId> {
        let span = member.span;
        let object = self.convert_expression(&member.object, parent)?;
        let p_span = member.property.span;
        let property = self.alloc(
            NodeKind::Identifier,
            p_span.start,
            p_span.end,
            Some(parent),
            NodeData::Identifier { name: CompactString::new(member.property.name.as_str()) },
        )?;
        self.alloc(NodeKind::MemberExpression, span.start, span.end, Some(parent), NodeData::Member { object, property })
    }

    fn convert_chain_computed_member(
        &mut self,
        member: &oxc_ast::ast::ComputedMemberExpression<'_>,
        parent: NodeId,
    ) -> RippleResult<NodeId> {
        let span = member.span;
        let object = self.convert_expression(&member.object, parent)?;
        let property = self.convert_expression(&member.expression, parent)?;
        self.alloc(NodeKind::MemberExpression, span.start, span.end, Some(parent), NodeData::Member { object, property })
    }

    fn convert_assignment_target(&mut self, target: &AssignmentTarget<'_>, parent: NodeId) -> RippleResult<NodeId> {
        match target {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                let span = id.span;
                self.alloc(
                    NodeKind::Identifier,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Identifier { name: CompactString::new(id.name.as_str()) },
                )
            }
            AssignmentTarget::StaticMemberExpression(member) => {
                let span = member.span;
                let object = self.convert_expression(&member.object, parent)?;
                let p_span = member.property.span;
                let property = self.alloc(
                    NodeKind::Identifier,
                    p_span.start,
                    p_span.end,
                    Some(parent),
                    NodeData::Identifier { name: CompactString::new(member.property.name.as_str()) },
                )?;
                self.alloc(NodeKind::MemberExpression, span.start, span.end, Some(parent), NodeData::Member { object, property })
            }
            AssignmentTarget::ComputedMemberExpression(member) => {
                let span = member.span;
                let object = self.convert_expression(&member.object, parent)?;
                let property = self.convert_expression(&member.expression, parent)?;
                self.alloc(NodeKind::MemberExpression, span.start, span.end, Some(parent), NodeData::Member { object, property })
            }
            other => {
                let span = other.span();
                self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
            }
        }
    }

    fn convert_property_key(&mut self, key: &PropertyKey<'_>, parent: NodeId) -> RippleResult<NodeId> {
        match key {
            PropertyKey::StaticIdentifier(id) => {
                let span = id.span;
                self.alloc(
                    NodeKind::Identifier,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Identifier { name: CompactString::new(id.name.as_str()) },
                )
            }
            PropertyKey::StringLiteral(s) => {
                let span = s.span;
                self.alloc(
                    NodeKind::Literal,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Literal { raw: CompactString::new(s.value.as_str()) },
                )
            }
            other => {
                // Computed key: `{ [expr]: ... }`. Best-effort: materialize the
                // inner expression if it is one, else an opaque leaf.
                if let PropertyKey::Expression(expr) = other {
                    self.convert_expression(expr, parent)
                } else {
                    let span = other.span();
                    self.alloc(NodeKind::Other, span.start, span.end, Some(parent), NodeData::None)
                }
            }
        }
    }

    // ---- patterns / scope bookkeeping ---------------------------------

    fn with_function_scope<F>(&mut self, f: F) -> RippleResult<()>
    where
        F: FnOnce(&mut Self) -> RippleResult<()>,
    {
        let outer = self.current_scope;
        self.current_scope = self.scopes.enter(outer);
        let result = f(self);
        self.current_scope = outer;
        result
    }

    /// Parameters have no dedicated definition-site node in our arena (bare
    /// parameter identifiers are not materialized); bind each parameter
    /// name to the function-like node itself, so a `new F()` or
    /// `F.prototype = …` written against a parameter name still resolves to
    /// *something* in scope rather than falling through to an unrelated
    /// outer binding of the same name.
    fn bind_param(&mut self, pattern: &BindingPattern<'_>) {
        self.bind_param_names(&pattern.kind);
    }

    fn bind_param_names(&mut self, kind: &BindingPatternKind<'_>) {
        match kind {
            BindingPatternKind::BindingIdentifier(_id) => {
                // Intentionally not bound: spec's propagation never
                // resolves a plain parameter reference through the scope
                // chain (only `X.prototype = …`/`new F()` targets and
                // `this.`-qualified members do), so there is nothing useful
                // to point the binding at without materializing a dedicated
                // parameter node this crate otherwise has no use for.
            }
            BindingPatternKind::ObjectPattern(obj) => {
                for p in obj.properties.iter() {
                    self.bind_param_names(&p.value.kind);
                }
            }
            BindingPatternKind::ArrayPattern(arr) => {
                for el in arr.elements.iter().flatten() {
                    self.bind_param_names(&el.kind);
                }
            }
            BindingPatternKind::AssignmentPattern(a) => {
                self.bind_param_names(&a.left.kind);
            }
        }
    }

    fn convert_binding_pattern(&mut self, pattern: &BindingPattern<'_>, parent: NodeId) -> RippleResult<NodeId> {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(id) => {
                let span = id.span;
                self.alloc(
                    NodeKind::Identifier,
                    span.start,
                    span.end,
                    Some(parent),
                    NodeData::Identifier { name: CompactString::new(id.name.as_str()) },
                )
            }
            BindingPatternKind::ObjectPattern(obj) => {
                let span = obj.span;
                let mut elements = SmallVec::new();
                for p in obj.properties.iter() {
                    let key = self.convert_property_key(&p.key, parent)?;
                    let value = self.convert_binding_pattern(&p.value, parent)?;
                    self.owner_of_property.insert(value, key);
                    let prop_id = self.alloc(
                        NodeKind::Property,
                        p.span.start,
                        p.span.end,
                        Some(parent),
                        NodeData::Property { key, value, kind: AccessorKind::Init },
                    )?;
                    elements.push(Some(prop_id));
                }
                self.alloc(NodeKind::ObjectPattern, span.start, span.end, Some(parent), NodeData::Pattern { elements })
            }
            BindingPatternKind::ArrayPattern(arr) => {
                let span = arr.span;
                let mut elements = SmallVec::new();
                for el in arr.elements.iter() {
                    match el {
                        Some(p) => elements.push(Some(self.convert_binding_pattern(p, parent)?)),
                        None => elements.push(None),
                    }
                }
                self.alloc(NodeKind::ArrayPattern, span.start, span.end, Some(parent), NodeData::Pattern { elements })
            }
            BindingPatternKind::AssignmentPattern(a) => self.convert_binding_pattern(&a.left, parent),
        }
    }

    /// Record scope bindings for every simple name in `pattern`, pointing
    /// each at `fallback` (used when there is no more specific definition
    /// node, e.g. a destructured parameter).
    fn bind_pattern_to_definitions(&mut self, pattern: &BindingPattern<'_>, fallback: NodeId) {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(id) => {
                let name = CompactString::new(id.name.as_str());
                self.scopes.get_mut(self.current_scope).define(name, fallback);
            }
            BindingPatternKind::ObjectPattern(obj) => {
                for p in obj.properties.iter() {
                    self.bind_pattern_to_definitions(&p.value, fallback);
                }
            }
            BindingPatternKind::ArrayPattern(arr) => {
                for el in arr.elements.iter().flatten() {
                    self.bind_pattern_to_definitions(el, fallback);
                }
            }
            BindingPatternKind::AssignmentPattern(a) => {
                self.bind_pattern_to_definitions(&a.left, fallback);
            }
        }
    }

    /// `const X = function () {}` / `const X = () => {}` bind `X` to the
    /// function-like node itself, so `ConstructorMap`/`new F()` resolution
    /// (spec §4.3, Form B and instantiation) can find "the function-like
    /// definition of X" through a simple scope lookup.
    fn bind_declarator(&mut self, pattern: &BindingPattern<'_>, decl_node: NodeId, init: NodeId) {
        if let BindingPatternKind::BindingIdentifier(id) = &pattern.kind {
            let name = CompactString::new(id.name.as_str());
            let target = if self.arena.get(init).kind.is_function_like() { init } else { decl_node };
            self.scopes.get_mut(self.current_scope).define(name, target);
        } else {
            self.bind_pattern_to_definitions(pattern, decl_node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_source::LineMapEntry;

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

    // Scenario G (spec §8): a deliberate syntax error is rejected with
    // the `SyntaxError` kind rather than a panic or a best-effort AST.
    #[test]
    fn rejects_syntactically_invalid_source() {
        let source = "function f( { return; }\n";
        let err = materialize(source, "fixture.js", &single_fragment("fixture.js", source)).unwrap_err();
        assert!(matches!(err, RippleError::SyntaxError { .. }));
    }
}
