//! Scope chain used by the type calculator.
//!
//! A [`Scope`] is one frame: a class body, a generic expansion, a method
//! body, a closure body or a `when` arm. Frames form a stack whose bottom
//! is the module frame; lookups walk from the innermost frame outwards and
//! finally consult the [`GlobalEnv`]. A frame is dropped when the walk of
//! its body finishes; only what was copied into the pool (ivar layout,
//! method signatures) survives.

use rustc_hash::FxHashMap;
use talon_ir::{Name, NodeId};

use crate::{GlobalEnv, Idx, ModuleId, TemplateId};

/// What a bare name means.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// A type name.
    Type(Idx),
    /// A variable of the given type.
    Value(Idx),
    /// A case of a generic data type; needs type arguments to construct.
    GenericCase { template: TemplateId, index: usize },
    /// An imported module.
    Module(ModuleId),
}

#[derive(Debug, Default)]
pub struct Scope {
    names: FxHashMap<Name, Binding>,
    /// Instance variables, kept apart so `@x` never collides with `x`.
    ivars: FxHashMap<Name, Idx>,
    templates: FxHashMap<Name, TemplateId>,
    traits: FxHashMap<Name, NodeId>,
    /// Class or data type whose body this frame belongs to.
    current_type: Option<Idx>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A frame for the body of `ty`, seeded with its declared ivars.
    pub fn for_type(ty: Idx, ivars: &[(Name, Idx)]) -> Self {
        Scope {
            ivars: ivars.iter().copied().collect(),
            current_type: Some(ty),
            ..Self::default()
        }
    }

    pub fn bind(&mut self, name: Name, binding: Binding) {
        self.names.insert(name, binding);
    }
}

/// The active stack of frames.
pub struct ScopeChain<'g> {
    global: &'g GlobalEnv,
    frames: Vec<Scope>,
}

impl<'g> ScopeChain<'g> {
    /// A chain holding only an empty module frame.
    pub fn new(global: &'g GlobalEnv) -> Self {
        ScopeChain {
            global,
            frames: vec![Scope::new()],
        }
    }

    pub fn global(&self) -> &'g GlobalEnv {
        self.global
    }

    pub fn push(&mut self, scope: Scope) {
        self.frames.push(scope);
    }

    /// Drop the innermost frame. The module frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Detach every frame above the module frame.
    ///
    /// Generic expansions are typed against the module scope only, no
    /// matter where the instantiation was requested.
    pub fn isolate(&mut self) -> Vec<Scope> {
        self.frames.split_off(1)
    }

    /// Reattach frames detached by [`isolate`](Self::isolate).
    pub fn restore(&mut self, frames: Vec<Scope>) {
        self.frames.truncate(1);
        self.frames.extend(frames);
    }

    fn innermost(&mut self) -> &mut Scope {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Bind in the innermost frame.
    pub fn bind(&mut self, name: Name, binding: Binding) {
        self.innermost().bind(name, binding);
    }

    /// Bind in the module frame.
    pub fn bind_module(&mut self, name: Name, binding: Binding) {
        self.frames[0].bind(name, binding);
    }

    pub fn lookup(&self, name: Name) -> Option<Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.names.get(&name).copied())
            .or_else(|| self.global.lookup_type(name).map(Binding::Type))
    }

    /// Type of the variable `name`, if `name` is a variable.
    pub fn lookup_value(&self, name: Name) -> Option<Idx> {
        match self.lookup(name)? {
            Binding::Value(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn lookup_type(&self, name: Name) -> Option<Idx> {
        match self.lookup(name)? {
            Binding::Type(ty) => Some(ty),
            _ => None,
        }
    }

    /// The class or data type whose body is being walked.
    pub fn current_type(&self) -> Option<Idx> {
        self.frames.iter().rev().find_map(|f| f.current_type)
    }

    /// Record or refine `@name` on the frame of the enclosing type.
    pub fn add_ivar(&mut self, name: Name, ty: Idx) {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.current_type.is_some());
        if let Some(frame) = frame {
            frame.ivars.insert(name, ty);
        }
    }

    pub fn lookup_ivar(&self, name: Name) -> Option<Idx> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.ivars.get(&name).copied())
    }

    pub fn register_template(&mut self, name: Name, id: TemplateId) {
        self.innermost().templates.insert(name, id);
    }

    pub fn find_template(&self, name: Name) -> Option<TemplateId> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.templates.get(&name).copied())
    }

    pub fn register_trait(&mut self, name: Name, body: NodeId) {
        self.innermost().traits.insert(name, body);
    }

    pub fn find_trait(&self, name: Name) -> Option<NodeId> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.traits.get(&name).copied())
    }
}
