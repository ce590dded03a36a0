//! The type inference engine.
//!
//! A post-order walk over the AST assigns a type term to every node. Type
//! storage is a side table keyed by `NodeId`; every assignment goes through
//! [`Inference::assign_type`], which unifies against any prior entry, so an
//! expression has at most one type record at any time.
//!
//! Call sites are typed through the candidate collector in `calls.rs`: the
//! subject's type is the union of the surviving candidates' result types.
//!
//! # Component structure
//!
//! ```text
//! Inference
//! ├── TypePool (term interning, union-find links)
//! ├── types (node -> type side table)
//! ├── rcalls (node -> candidate list)
//! ├── captured (names resolved in an enclosing scope)
//! └── undo stack (per-candidate rollback of probing joins)
//! ```

use rustc_hash::{FxHashMap, FxHashSet};

use xl_context::Context;
use xl_diagnostic::{Diagnostic, DiagnosticQueue, ErrorGuaranteed};
use xl_ir::{sym, Kind, Name, NodeArena, NodeId, ScopeId, StringInterner};

use crate::{Atom, Category, RewriteCalls, Term, TypeId, TypePool};

/// The mutable collaborators every inference step works against.
///
/// The engine owns its maps and pool; the arena, context, interner and
/// diagnostics sink belong to the driver and are borrowed per call.
pub struct Session<'a> {
    pub arena: &'a mut NodeArena,
    pub context: &'a mut Context,
    pub interner: &'a mut StringInterner,
    pub diagnostics: &'a mut DiagnosticQueue,
}

/// One undo frame: everything a candidate probe changed.
#[derive(Debug, Default)]
struct UndoFrame {
    links: usize,
    types: Vec<(NodeId, Option<TypeId>)>,
    rcalls: Vec<(NodeId, Option<usize>)>,
}

/// The per-root type inference engine.
pub struct Inference {
    pub(crate) pool: TypePool,
    pub(crate) types: FxHashMap<NodeId, TypeId>,
    pub(crate) rcalls: FxHashMap<NodeId, usize>,
    pub(crate) calls: Vec<RewriteCalls>,
    pub(crate) captured: FxHashMap<Name, NodeId>,
    pub(crate) scope: ScopeId,
    pub(crate) declaration: bool,
    pub(crate) codegen: bool,
    pub(crate) generics: u32,
    pub(crate) resolving_named: FxHashSet<TypeId>,
    undo: Vec<UndoFrame>,
}

impl Inference {
    /// Create an engine rooted at `scope`.
    pub fn new(scope: ScopeId) -> Self {
        Inference {
            pool: TypePool::new(),
            types: FxHashMap::default(),
            rcalls: FxHashMap::default(),
            calls: Vec::new(),
            captured: FxHashMap::default(),
            scope,
            declaration: false,
            codegen: false,
            generics: 0,
            resolving_named: FxHashSet::default(),
            undo: Vec::new(),
        }
    }

    /// A child engine inheriting this one's contents by snapshot.
    pub fn child(&self, scope: ScopeId) -> Self {
        Inference {
            pool: self.pool.clone(),
            types: self.types.clone(),
            rcalls: self.rcalls.clone(),
            calls: self.calls.clone(),
            captured: self.captured.clone(),
            scope,
            declaration: false,
            codegen: false,
            generics: self.generics,
            resolving_named: FxHashSet::default(),
            undo: Vec::new(),
        }
    }

    /// The root scope of this inference.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The type pool.
    pub fn pool(&self) -> &TypePool {
        &self.pool
    }

    /// Representative of a type's equivalence class.
    pub fn base_type(&self, ty: TypeId) -> TypeId {
        self.pool.base(ty)
    }

    /// The type already recorded for an expression, if any.
    pub fn known_type(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).copied()
    }

    /// The candidate list recorded for a subject, if any.
    pub fn rewrite_calls(&self, node: NodeId) -> Option<&RewriteCalls> {
        self.rcalls.get(&node).map(|&index| &self.calls[index])
    }

    /// Mutable access for the code generator's boxed-type slots.
    pub fn rewrite_calls_mut(&mut self, node: NodeId) -> Option<&mut RewriteCalls> {
        let index = *self.rcalls.get(&node)?;
        Some(&mut self.calls[index])
    }

    /// Names resolved in an enclosing scope, recorded for closure
    /// construction.
    pub fn captured(&self) -> &FxHashMap<Name, NodeId> {
        &self.captured
    }

    /// Whether the engine is in code generation mode.
    pub fn codegen(&self) -> bool {
        self.codegen
    }

    /// Run all inference steps for a program and enter codegen mode.
    pub fn analyze(&mut self, s: &mut Session, program: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        s.context.process_declarations(s.arena, self.scope, program);
        tracing::debug!(root = program.raw(), "type analysis");
        let ty = self.type_of(s, program);
        self.codegen = true;
        ty
    }

    /// The type associated with an expression, inferring it on first use.
    ///
    /// In codegen mode a missing type is a hard error: the driver must have
    /// completed a full pass first.
    pub fn type_of(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        if let Some(ty) = self.types.get(&node) {
            return Ok(*ty);
        }
        if self.codegen {
            let message = format!(
                "no type for {} during code generation",
                s.arena.display(s.interner, node)
            );
            let span = s.arena.span(node);
            return Err(s
                .diagnostics
                .emit(Diagnostic::error(message, span).with_code("missing-type")));
        }
        let ty = self.compute_type(s, node)?;
        self.assign_type(s, node, ty)
    }

    /// The type of something known to be a value.
    pub fn value_type(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        let saved = self.declaration;
        self.declaration = false;
        let result = self.type_of(s, node);
        self.declaration = saved;
        result
    }

    /// The type of something known to be a declaration.
    pub fn declaration_type(
        &mut self,
        s: &mut Session,
        node: NodeId,
    ) -> Result<TypeId, ErrorGuaranteed> {
        let saved = self.declaration;
        self.declaration = true;
        let result = self.type_of(s, node);
        self.declaration = saved;
        result
    }

    /// Set the type of `node`, unifying with any prior entry.
    pub fn assign_type(
        &mut self,
        s: &mut Session,
        node: NodeId,
        ty: TypeId,
    ) -> Result<TypeId, ErrorGuaranteed> {
        let ty = match self.types.get(&node).copied() {
            Some(existing) if existing != ty => self.unify(s, existing, ty)?,
            _ => ty,
        };
        self.insert_type(node, ty);
        Ok(ty)
    }

    // === Case rules ===

    fn compute_type(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        match s.arena.kind(node) {
            Kind::Integer | Kind::Real | Kind::Text => self.do_constant(s, node),
            Kind::Name => self.do_name(s, node),
            Kind::Block => self.do_block(s, node),
            Kind::Prefix => self.do_prefix(s, node),
            Kind::Postfix => self.evaluate_or_unknown(s, node),
            Kind::Infix => self.do_infix(s, node),
            Kind::Scope => Ok(TypeId::TREE),
        }
    }

    /// Constants have their kind's atom as type, unless some rule in scope
    /// can rewrite constants of that kind.
    fn do_constant(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        let kind = s.arena.kind(node);
        if s.context.has_rewrites_for(kind, self.scope) {
            return self.evaluate_or_unknown(s, node);
        }
        Ok(self.constant_atom(s, node))
    }

    pub(crate) fn constant_atom(&mut self, s: &Session, node: NodeId) -> TypeId {
        match s.arena.kind(node) {
            Kind::Integer => self.pool.atom(Atom::Integer),
            Kind::Real => self.pool.atom(Atom::Real),
            Kind::Text => {
                if s.arena.get(node).kind.is_character() {
                    self.pool.atom(Atom::Character)
                } else {
                    self.pool.atom(Atom::Text)
                }
            }
            _ => TypeId::TREE,
        }
    }

    fn do_name(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        let Some(name) = s.arena.as_name(node) else {
            return Ok(TypeId::TREE);
        };
        if self.declaration {
            let ty = self.type_of_unknown(s, node);
            s.context.define(s.arena, self.scope, node, node, node);
            return Ok(ty);
        }
        // The boolean constants are seeded: their defining rules are data
        // constructors, so their type cannot be read off a body.
        if name == sym::TRUE || name == sym::FALSE {
            return Ok(self.pool.atom(Atom::Boolean));
        }
        if let Some((body, rewrite_id, found_scope)) = s.context.bound(name, self.scope) {
            let rw = *s.context.rewrite(rewrite_id);
            let defined = s.arena.pattern_base(rw.pattern);
            if body != node && defined != node {
                if found_scope != self.scope {
                    self.captured.insert(name, defined);
                    tracing::trace!(name = ?name, "captured from enclosing scope");
                }
                let category = self
                    .category_of(s, rw.pattern, rw.body)
                    .unwrap_or(Category::Normal);
                let ty = match category {
                    Category::Normal => self.type_of(s, body)?,
                    _ => self.type_of(s, defined)?,
                };
                // Share the candidate list recorded for the definition.
                if let Some(&rc) = self.rcalls.get(&defined) {
                    self.insert_rcalls(node, rc);
                } else if let Some(&rc) = self.rcalls.get(&body) {
                    self.insert_rcalls(node, rc);
                }
                return Ok(ty);
            }
        }
        self.evaluate_or_unknown(s, node)
    }

    /// A block evaluates either as itself, or as its child.
    fn do_block(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        if let Some(ty) = self.evaluate(s, node, true)? {
            return Ok(ty);
        }
        let Some(child) = s.arena.block_child(node) else {
            return Ok(TypeId::TREE);
        };
        let saved = self.scope;
        self.scope = s.context.create_scope(saved);
        s.context.process_declarations(s.arena, self.scope, child);
        let result = self.type_of(s, child);
        self.scope = saved;
        let ty = result?;
        if let Some(&rc) = self.rcalls.get(&child) {
            self.insert_rcalls(node, rc);
        }
        Ok(ty)
    }

    fn do_prefix(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        if let Some((left, right)) = s.arena.as_prefix(node) {
            // A closure types as its wrapped value, in its captured scope.
            if let Some(closure_scope) = s.arena.as_scope(left) {
                let saved = self.scope;
                self.scope = closure_scope;
                let result = self.type_of(s, right);
                self.scope = saved;
                return result;
            }
            let head = s.arena.strip_blocks(left);
            if s.arena.as_name(head) == Some(sym::EXTERN) {
                return match s.context.cdecl(node) {
                    Some(definition) => self.type_of(s, definition),
                    None => {
                        let message = format!(
                            "no C declaration for {}",
                            s.arena.display(s.interner, node)
                        );
                        let span = s.arena.span(node);
                        Err(s
                            .diagnostics
                            .emit(Diagnostic::error(message, span).with_code("missing-cdecl")))
                    }
                };
            }
        }
        self.evaluate_or_unknown(s, node)
    }

    fn do_infix(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        if let Some((left, right)) = s.arena.as_sequence(node) {
            return self.statements(s, node, left, right);
        }
        if s.arena.is_type_annotation(node) {
            return self.type_declaration(s, node);
        }
        if s.arena.is_definition(node) {
            return self.type_of_rewrite(s, node);
        }
        self.evaluate_or_unknown(s, node)
    }

    /// The type of a statement sequence: the last statement's type, unless
    /// the last statement is a declaration and the first is not.
    fn statements(
        &mut self,
        s: &mut Session,
        node: NodeId,
        left: NodeId,
        right: NodeId,
    ) -> Result<TypeId, ErrorGuaranteed> {
        let lt = self.type_of(s, left)?;
        let rt = self.type_of(s, right)?;
        let left_is_rewrite = self.pool.base_term(lt).is_arrow();
        let right_is_rewrite = self.pool.base_term(rt).is_arrow();
        let ty = if right_is_rewrite && !left_is_rewrite {
            lt
        } else {
            rt
        };
        self.assign_type(s, node, ty)
    }

    /// `x : T` in expression position: unify the type of `x` with `T`.
    fn type_declaration(&mut self, s: &mut Session, node: NodeId) -> Result<TypeId, ErrorGuaranteed> {
        let Some((_, left, right)) = s.arena.as_infix(node) else {
            return Ok(TypeId::TREE);
        };
        let xt = self.type_of(s, left)?;
        let want = self.type_from_tree(s, right);
        let joined = self.unify(s, xt, want)?;
        self.assign_type(s, node, joined)
    }

    /// `pattern is body`: infer the pattern in declaration mode and the body
    /// in value mode, in a fresh child scope, and give the rewrite the type
    /// `type pattern => type body`.
    pub fn type_of_rewrite(
        &mut self,
        s: &mut Session,
        node: NodeId,
    ) -> Result<TypeId, ErrorGuaranteed> {
        let Some((pattern, body)) = s.arena.infix_named(node, sym::IS) else {
            return Ok(TypeId::TREE);
        };
        tracing::trace!(rewrite = node.raw(), "typing rewrite");
        let saved = self.scope;
        self.scope = s.context.create_scope(saved);
        let outcome = self.rewrite_types(s, pattern, body);
        self.scope = saved;
        let (declt, initt) = outcome?;
        let arrow = self.pool.intern(Term::Arrow(declt, initt));
        self.assign_type(s, node, arrow)
    }

    fn rewrite_types(
        &mut self,
        s: &mut Session,
        pattern: NodeId,
        body: NodeId,
    ) -> Result<(TypeId, TypeId), ErrorGuaranteed> {
        let base = s.arena.pattern_base(pattern);
        self.declare_parameters(s, base, true)?;
        let declt = self.pattern_type(s, base);
        let annotation = s
            .arena
            .pattern_result_type(pattern)
            .map(|t| self.type_from_tree(s, t));
        let category = self
            .category_of(s, pattern, body)
            .unwrap_or(Category::Normal);
        let initt = match category {
            Category::Normal => {
                s.context.process_declarations(s.arena, self.scope, body);
                let ty = self.value_type(s, body)?;
                match annotation {
                    Some(want) => self.unify(s, ty, want)?,
                    None => ty,
                }
            }
            Category::Data => declt,
            Category::Foreign { .. } | Category::Builtin { .. } => {
                annotation.unwrap_or_else(|| self.fresh_generic(s))
            }
        };
        if let Some(guard) = s.arena.pattern_guard(pattern) {
            if let Ok(gt) = self.value_type(s, guard) {
                let boolean = self.pool.atom(Atom::Boolean);
                let _ = self.try_unify(s, gt, boolean);
            }
        }
        // A plain-name definition gives the name its body's type.
        if s.arena.kind(base) == Kind::Name {
            let initt = self.unify(s, declt, initt)?;
            return Ok((declt, initt));
        }
        Ok((declt, initt))
    }

    /// Declare the binding names of a pattern into the current scope,
    /// honoring inner type annotations.
    fn declare_parameters(
        &mut self,
        s: &mut Session,
        node: NodeId,
        head_position: bool,
    ) -> Result<(), ErrorGuaranteed> {
        match s.arena.kind(node) {
            Kind::Integer | Kind::Real | Kind::Text | Kind::Scope => Ok(()),
            Kind::Name => {
                if head_position {
                    return Ok(());
                }
                let Some(name) = s.arena.as_name(node) else {
                    return Ok(());
                };
                // Names already meaningful in the enclosing scope are
                // references, not parameters.
                if name == sym::TRUE || name == sym::FALSE {
                    return Ok(());
                }
                if let Some(parent) = s.context.parent(self.scope) {
                    if s.context.bound(name, parent).is_some() {
                        return Ok(());
                    }
                }
                self.type_of_unknown(s, node);
                s.context.define(s.arena, self.scope, node, node, node);
                Ok(())
            }
            Kind::Block => {
                let Some(child) = s.arena.block_child(node) else {
                    return Ok(());
                };
                self.declare_parameters(s, child, head_position)
            }
            Kind::Prefix => {
                let Some((left, right)) = s.arena.as_prefix(node) else {
                    return Ok(());
                };
                let head = s.arena.as_name(s.arena.strip_blocks(left)).is_some();
                self.declare_parameters(s, left, head)?;
                self.declare_parameters(s, right, false)
            }
            Kind::Postfix => {
                let Some((left, right)) = s.arena.as_postfix(node) else {
                    return Ok(());
                };
                let tail = s.arena.as_name(s.arena.strip_blocks(right)).is_some();
                self.declare_parameters(s, left, false)?;
                self.declare_parameters(s, right, tail)
            }
            Kind::Infix => {
                let Some((operator, left, right)) = s.arena.as_infix(node) else {
                    return Ok(());
                };
                if operator == sym::WHEN {
                    return self.declare_parameters(s, left, false);
                }
                if operator == sym::COLON || operator == sym::AS {
                    let want = self.type_from_tree(s, right);
                    let target = s.arena.strip_blocks(left);
                    if s.arena.kind(target) == Kind::Name {
                        self.assign_type(s, target, want)?;
                        s.context.define(s.arena, self.scope, target, target, target);
                        return Ok(());
                    }
                    return self.declare_parameters(s, left, false);
                }
                self.declare_parameters(s, left, false)?;
                self.declare_parameters(s, right, false)
            }
        }
    }

    /// The type a pattern declares: an atom for constants, the name's type
    /// for plain names, a shape type for compound patterns.
    pub(crate) fn pattern_type(&mut self, s: &mut Session, base: NodeId) -> TypeId {
        match s.arena.kind(base) {
            Kind::Integer | Kind::Real | Kind::Text => self.constant_atom(s, base),
            Kind::Name => {
                if matches!(s.arena.as_name(base), Some(n) if n == sym::TRUE || n == sym::FALSE) {
                    self.pool.atom(Atom::Boolean)
                } else {
                    self.type_of_unknown(s, base)
                }
            }
            _ => self.pool.intern(Term::Shape(base)),
        }
    }

    fn evaluate_or_unknown(
        &mut self,
        s: &mut Session,
        node: NodeId,
    ) -> Result<TypeId, ErrorGuaranteed> {
        match self.evaluate(s, node, false)? {
            Some(ty) => Ok(ty),
            None => Ok(self.type_of_unknown(s, node)),
        }
    }

    /// Classify a rewrite: normal, data constructor, foreign function or
    /// builtin opcode. Malformed foreign/builtin bodies are structural
    /// errors and exclude the rule.
    pub fn category_of(
        &mut self,
        s: &mut Session,
        pattern: NodeId,
        body: NodeId,
    ) -> Result<Category, ErrorGuaranteed> {
        let body = s.arena.strip_blocks(body);
        let base = s.arena.pattern_base(pattern);
        let (defined, _) = self.defined_symbol(s, base);
        if let Some(name) = s.arena.as_name(body) {
            if name == sym::SELF_ {
                return Ok(Category::Data);
            }
            if name == sym::C {
                let label = self.valid_c_name(s, defined)?;
                return Ok(Category::Foreign { label });
            }
        }
        if let Some((left, right)) = s.arena.as_prefix(body) {
            if let Some(name) = s.arena.as_name(s.arena.strip_blocks(left)) {
                if name == sym::C {
                    let label = self.valid_c_name(s, right)?;
                    return Ok(Category::Foreign { label });
                }
                if name == sym::BUILTIN {
                    let op = s.arena.strip_blocks(right);
                    return match s.arena.as_name(op) {
                        Some(opcode) => Ok(Category::Builtin { opcode }),
                        None => {
                            let message = format!(
                                "invalid builtin name in {}",
                                s.arena.display(s.interner, body)
                            );
                            let span = s.arena.span(body);
                            Err(s.diagnostics.emit(
                                Diagnostic::error(message, span).with_code("bad-builtin"),
                            ))
                        }
                    };
                }
            }
        }
        Ok(Category::Normal)
    }

    /// Validate a C identifier: letters or underscore, digits allowed after
    /// the first character.
    fn valid_c_name(&mut self, s: &mut Session, node: NodeId) -> Result<String, ErrorGuaranteed> {
        let text = if let Some(name) = s.arena.as_name(node) {
            s.interner.resolve(name).to_string()
        } else if let Some((value, _)) = s.arena.as_text(node) {
            s.interner.resolve(value).to_string()
        } else {
            String::new()
        };
        if text.is_empty() {
            let message = format!("no valid C name in {}", s.arena.display(s.interner, node));
            let span = s.arena.span(node);
            return Err(s
                .diagnostics
                .emit(Diagnostic::error(message, span).with_code("bad-c-name")));
        }
        let valid = text.chars().enumerate().all(|(i, c)| {
            c.is_ascii_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit())
        });
        if !valid {
            let message = format!("C name {text} contains invalid characters");
            let span = s.arena.span(node);
            return Err(s
                .diagnostics
                .emit(Diagnostic::error(message, span).with_code("bad-c-name")));
        }
        Ok(text)
    }

    /// The defined symbol of a pattern base: the head name node for
    /// prefix/postfix shapes, the operator for infix shapes, the node
    /// itself otherwise.
    pub(crate) fn defined_symbol(&self, s: &Session, base: NodeId) -> (NodeId, String) {
        let named = |node: NodeId| -> Option<(NodeId, String)> {
            let name = s.arena.as_name(node)?;
            Some((node, s.interner.resolve(name).to_string()))
        };
        match s.arena.kind(base) {
            Kind::Prefix => {
                if let Some((left, _)) = s.arena.as_prefix(base) {
                    if let Some(found) = named(s.arena.strip_blocks(left)) {
                        return found;
                    }
                }
            }
            Kind::Postfix => {
                if let Some((_, right)) = s.arena.as_postfix(base) {
                    if let Some(found) = named(s.arena.strip_blocks(right)) {
                        return found;
                    }
                }
            }
            Kind::Infix => {
                if let Some((operator, _, _)) = s.arena.as_infix(base) {
                    return (base, s.interner.resolve(operator).to_string());
                }
            }
            _ => {
                if let Some(found) = named(base) {
                    return found;
                }
            }
        }
        (base, String::new())
    }

    // === Generics and the type side table ===

    /// The known type of an expression, or a freshly minted generic.
    pub(crate) fn type_of_unknown(&mut self, s: &mut Session, node: NodeId) -> TypeId {
        if let Some(&ty) = self.types.get(&node) {
            return ty;
        }
        let generic = self.fresh_generic(s);
        self.insert_type(node, generic);
        generic
    }

    /// Mint a fresh generic, `#A`, `#B`, ... `#Z`, `#BA`, ...
    pub(crate) fn fresh_generic(&mut self, s: &mut Session) -> TypeId {
        let seq = self.generics;
        self.generics += 1;
        let mut label = String::from("#");
        let mut digits = Vec::new();
        let mut value = seq;
        loop {
            digits.push((b'A' + (value % 26) as u8) as char);
            value /= 26;
            if value == 0 {
                break;
            }
        }
        label.extend(digits.iter().rev());
        let name = s.interner.intern(&label);
        self.pool.intern(Term::Generic { seq, name })
    }

    pub(crate) fn insert_type(&mut self, node: NodeId, ty: TypeId) {
        let previous = self.types.insert(node, ty);
        if let Some(frame) = self.undo.last_mut() {
            frame.types.push((node, previous));
        }
    }

    pub(crate) fn insert_rcalls(&mut self, node: NodeId, index: usize) {
        let previous = self.rcalls.insert(node, index);
        if let Some(frame) = self.undo.last_mut() {
            frame.rcalls.push((node, previous));
        }
    }

    pub(crate) fn push_undo(&mut self) {
        self.undo.push(UndoFrame {
            links: self.pool.checkpoint(),
            types: Vec::new(),
            rcalls: Vec::new(),
        });
    }

    pub(crate) fn commit_undo(&mut self) {
        if let Some(frame) = self.undo.pop() {
            if let Some(parent) = self.undo.last_mut() {
                parent.types.extend(frame.types);
                parent.rcalls.extend(frame.rcalls);
            }
        }
    }

    pub(crate) fn rollback_undo(&mut self) {
        if let Some(frame) = self.undo.pop() {
            self.pool.rollback(frame.links);
            for (node, previous) in frame.types.into_iter().rev() {
                match previous {
                    Some(ty) => {
                        self.types.insert(node, ty);
                    }
                    None => {
                        self.types.remove(&node);
                    }
                }
            }
            for (node, previous) in frame.rcalls.into_iter().rev() {
                match previous {
                    Some(index) => {
                        self.rcalls.insert(node, index);
                    }
                    None => {
                        self.rcalls.remove(&node);
                    }
                }
            }
        }
    }
}
