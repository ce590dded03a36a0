//! Scope frames, rewrite storage and lookup.

use rustc_hash::FxHashMap;

use xl_ir::{Kind, Name, NodeArena, NodeId, ScopeId};

/// Index of a rewrite in the context's rewrite arena.
///
/// Ids increase in declaration order, which makes them the tiebreaker for
/// candidate ordering within a frame.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct RewriteId(u32);

impl RewriteId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        RewriteId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A `pattern is body` rule.
#[derive(Copy, Clone, Debug)]
pub struct Rewrite {
    /// The full `is` node this rewrite came from; for synthesized bindings
    /// (parameters bound during dispatch) this is the pattern itself.
    pub definition: NodeId,
    /// Left-hand side, including guards and annotations.
    pub pattern: NodeId,
    /// Right-hand side.
    pub body: NodeId,
}

/// Head shape of a pattern base, used to bucket rewrites.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ShapeKey {
    Integer,
    Real,
    Text,
    Name(Name),
    Block,
    /// Prefix with a name head, e.g. `fact N`; `None` when the head is not
    /// a plain name.
    Prefix(Option<Name>),
    /// Postfix with a name tail, e.g. `N !`.
    Postfix(Option<Name>),
    /// Infix by operator, e.g. `X + Y`.
    Infix(Name),
}

impl ShapeKey {
    /// Shape key of a tree (callers pass the pattern base or the subject).
    pub fn of(arena: &NodeArena, tree: NodeId) -> Option<ShapeKey> {
        let tree = arena.strip_blocks(tree);
        Some(match arena.kind(tree) {
            Kind::Integer => ShapeKey::Integer,
            Kind::Real => ShapeKey::Real,
            Kind::Text => ShapeKey::Text,
            Kind::Name => ShapeKey::Name(arena.as_name(tree)?),
            Kind::Block => ShapeKey::Block,
            Kind::Prefix => {
                let (left, _) = arena.as_prefix(tree)?;
                ShapeKey::Prefix(arena.as_name(arena.strip_blocks(left)))
            }
            Kind::Postfix => {
                let (_, right) = arena.as_postfix(tree)?;
                ShapeKey::Postfix(arena.as_name(arena.strip_blocks(right)))
            }
            Kind::Infix => {
                let (name, _, _) = arena.as_infix(tree)?;
                ShapeKey::Infix(name)
            }
            Kind::Scope => return None,
        })
    }

    fn kind_bit(self) -> u16 {
        match self {
            ShapeKey::Integer => Kind::Integer.bit(),
            ShapeKey::Real => Kind::Real.bit(),
            ShapeKey::Text => Kind::Text.bit(),
            ShapeKey::Name(_) => Kind::Name.bit(),
            ShapeKey::Block => Kind::Block.bit(),
            ShapeKey::Prefix(_) => Kind::Prefix.bit(),
            ShapeKey::Postfix(_) => Kind::Postfix.bit(),
            ShapeKey::Infix(_) => Kind::Infix.bit(),
        }
    }
}

/// One scope frame.
#[derive(Debug, Default)]
struct ScopeFrame {
    parent: Option<ScopeId>,
    /// Rewrites bucketed by head shape, insertion order within a bucket.
    by_shape: FxHashMap<ShapeKey, Vec<RewriteId>>,
    /// Rewrites whose pattern base is a plain name.
    names: FxHashMap<Name, RewriteId>,
    /// Kinds for which this frame holds at least one rewrite.
    kinds: u16,
}

/// The scope arena plus rewrite storage.
///
/// Frames are never removed: "popping" a scope is the caller restoring its
/// previous `ScopeId`, which leaves the frame alive for any closure that
/// captured it.
#[derive(Debug)]
pub struct Context {
    scopes: Vec<ScopeFrame>,
    rewrites: Vec<Rewrite>,
    /// C-declaration records for `extern` forms, driver-populated.
    cdecls: FxHashMap<NodeId, NodeId>,
}

impl Context {
    /// Create a context with a root scope.
    pub fn new() -> Self {
        Context {
            scopes: vec![ScopeFrame::default()],
            rewrites: Vec::new(),
            cdecls: FxHashMap::default(),
        }
    }

    /// The root scope.
    #[inline]
    pub fn root(&self) -> ScopeId {
        ScopeId::from_raw(0)
    }

    /// Create a child scope of `parent`.
    pub fn create_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        self.scopes.push(ScopeFrame {
            parent: Some(parent),
            ..ScopeFrame::default()
        });
        id
    }

    /// Parent of a scope, if any.
    #[inline]
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    /// Length of the scope chain from `scope` to the root.
    pub fn depth(&self, scope: ScopeId) -> usize {
        let mut count = 1;
        let mut cursor = scope;
        while let Some(up) = self.parent(cursor) {
            count += 1;
            cursor = up;
        }
        count
    }

    /// Access a rewrite.
    #[inline]
    pub fn rewrite(&self, id: RewriteId) -> &Rewrite {
        &self.rewrites[id.index()]
    }

    /// Insert `pattern is body` into `scope`.
    ///
    /// `definition` is the original `is` node (or the pattern itself for
    /// synthesized bindings).
    pub fn define(
        &mut self,
        arena: &NodeArena,
        scope: ScopeId,
        pattern: NodeId,
        body: NodeId,
        definition: NodeId,
    ) -> RewriteId {
        let id = RewriteId::from_raw(self.rewrites.len() as u32);
        self.rewrites.push(Rewrite {
            definition,
            pattern,
            body,
        });
        let base = arena.pattern_base(pattern);
        let frame = &mut self.scopes[scope.index()];
        if let Some(key) = ShapeKey::of(arena, base) {
            frame.kinds |= key.kind_bit();
            frame.by_shape.entry(key).or_default().push(id);
            if let ShapeKey::Name(name) = key {
                frame.names.insert(name, id);
            }
        }
        id
    }

    /// Find the body bound to a plain `name`, walking outward from `scope`.
    ///
    /// Returns the body together with the defining rewrite and its scope.
    pub fn bound(
        &self,
        name: Name,
        scope: ScopeId,
    ) -> Option<(NodeId, RewriteId, ScopeId)> {
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            let frame = &self.scopes[current.index()];
            if let Some(&id) = frame.names.get(&name) {
                return Some((self.rewrite(id).body, id, current));
            }
            cursor = frame.parent;
        }
        None
    }

    /// Find the body bound to `name` in `scope` itself, not its parents.
    pub fn bound_here(&self, name: Name, scope: ScopeId) -> Option<(NodeId, RewriteId)> {
        let frame = &self.scopes[scope.index()];
        frame
            .names
            .get(&name)
            .map(|&id| (self.rewrite(id).body, id))
    }

    /// The pattern under which `name` was introduced.
    pub fn declared_pattern(&self, name: Name, scope: ScopeId) -> Option<NodeId> {
        self.bound(name, scope)
            .map(|(_, id, _)| self.rewrite(id).pattern)
    }

    /// Conservative test: could any rewrite in the chain match a subject of
    /// this kind? Used to skip evaluation of constant subjects.
    pub fn has_rewrites_for(&self, kind: Kind, scope: ScopeId) -> bool {
        let bit = kind.bit();
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            let frame = &self.scopes[current.index()];
            if frame.kinds & bit != 0 {
                return true;
            }
            cursor = frame.parent;
        }
        false
    }

    /// Rewrites of one frame whose head shape could match `subject`, in
    /// declaration order.
    fn frame_matches(&self, arena: &NodeArena, scope: ScopeId, subject: NodeId) -> Vec<RewriteId> {
        let frame = &self.scopes[scope.index()];
        let Some(key) = ShapeKey::of(arena, subject) else {
            return Vec::new();
        };
        let mut matches: Vec<RewriteId> = Vec::new();
        match key {
            // A prefix subject with a name head can match rules for that
            // head and rules with a computed head; with a computed head,
            // any prefix rule might apply after evaluation.
            ShapeKey::Prefix(head) => {
                for (bucket_key, bucket) in &frame.by_shape {
                    let applies = match (bucket_key, head) {
                        (ShapeKey::Prefix(None), _) => true,
                        (ShapeKey::Prefix(Some(_)), None) => true,
                        (ShapeKey::Prefix(Some(rule_head)), Some(head)) => *rule_head == head,
                        _ => false,
                    };
                    if applies {
                        matches.extend_from_slice(bucket);
                    }
                }
            }
            ShapeKey::Postfix(tail) => {
                for (bucket_key, bucket) in &frame.by_shape {
                    let applies = match (bucket_key, tail) {
                        (ShapeKey::Postfix(None), _) => true,
                        (ShapeKey::Postfix(Some(_)), None) => true,
                        (ShapeKey::Postfix(Some(rule_tail)), Some(tail)) => *rule_tail == tail,
                        _ => false,
                    };
                    if applies {
                        matches.extend_from_slice(bucket);
                    }
                }
            }
            key => {
                if let Some(bucket) = frame.by_shape.get(&key) {
                    matches.extend_from_slice(bucket);
                }
            }
        }
        // Ids increase in declaration order; merging buckets must restore it.
        matches.sort_unstable();
        matches
    }

    /// All rewrites in scope whose head shape could match `subject`,
    /// innermost frame first, declaration order within a frame, paired with
    /// their frame of discovery.
    ///
    /// The result is a snapshot: callers may add rules or scopes while
    /// walking it.
    pub fn matching(
        &self,
        arena: &NodeArena,
        scope: ScopeId,
        subject: NodeId,
    ) -> Vec<(ScopeId, RewriteId)> {
        let mut result = Vec::new();
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            for id in self.frame_matches(arena, current, subject) {
                result.push((current, id));
            }
            cursor = self.scopes[current.index()].parent;
        }
        result
    }

    /// Visit every rewrite in scope whose head shape could match `subject`,
    /// innermost frame first, declaration order within a frame. The visitor
    /// may return `Some` to short-circuit.
    pub fn lookup<T>(
        &self,
        arena: &NodeArena,
        scope: ScopeId,
        subject: NodeId,
        visit: &mut dyn FnMut(ScopeId, ScopeId, NodeId, RewriteId) -> Option<T>,
    ) -> Option<T> {
        for (frame, id) in self.matching(arena, scope, subject) {
            if let Some(result) = visit(scope, frame, subject, id) {
                return Some(result);
            }
        }
        None
    }

    /// Install every definition on the spine of a statement sequence into
    /// `scope`, making siblings visible to each other before any statement
    /// is inferred or evaluated.
    pub fn process_declarations(&mut self, arena: &NodeArena, scope: ScopeId, tree: NodeId) {
        let mut pending = vec![tree];
        while let Some(node) = pending.pop() {
            if let Some((left, right)) = arena.as_sequence(node) {
                pending.push(right);
                pending.push(left);
                continue;
            }
            if let Some((pattern, body)) = arena.infix_named(node, xl_ir::sym::IS) {
                self.define(arena, scope, pattern, body, node);
            }
        }
    }

    /// Register the C-declaration record for an `extern` form.
    pub fn register_cdecl(&mut self, extern_node: NodeId, rewrite_definition: NodeId) {
        self.cdecls.insert(extern_node, rewrite_definition);
    }

    /// The C-declaration record attached to an `extern` form, if any.
    pub fn cdecl(&self, extern_node: NodeId) -> Option<NodeId> {
        self.cdecls.get(&extern_node).copied()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
