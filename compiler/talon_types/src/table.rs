//! Results of the type calculator, read by the code generator.

use rustc_hash::FxHashMap;
use talon_diagnostic::{CompileError, CompileResult};
use talon_ir::NodeId;

use crate::{Builtin, Idx, InstanceId, Signature};

/// What an identifier or call resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A local, parameter or captured variable.
    Local,
    /// A case without fields, used as a value.
    Singleton(Idx),
    /// Call of a closure stored in a local.
    Closure(Signature),
    /// Method call on an explicit receiver.
    Method(Signature),
    /// Receiver-less call of a method of the enclosing type.
    SelfMethod(Signature),
    /// Field read on a built-in record (`c_str`, `name`, `type`).
    Element { index: u32 },
    /// Top-level function of this or an imported module.
    Function(Signature),
    /// Class construction, running `initialize` if the class declares it.
    Construct { ty: Idx, init: Option<Signature> },
    /// Data case construction; the signature lists the case fields.
    ConstructCase { case: Idx, sig: Signature },
    Builtin(Builtin),
}

type Key = (InstanceId, NodeId);

/// Memo from `(walk, node)` to everything the calculator decided.
///
/// Populated by the type calculator, then read-only. A missing entry for
/// a node the code generator visits is an internal error.
#[derive(Debug)]
pub struct TypeTable {
    types: FxHashMap<Key, Idx>,
    targets: FxHashMap<Key, Target>,
    signatures: FxHashMap<Key, Signature>,
    includes: FxHashMap<Key, InstanceId>,
    next_instance: u32,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable {
            types: FxHashMap::default(),
            targets: FxHashMap::default(),
            signatures: FxHashMap::default(),
            includes: FxHashMap::default(),
            next_instance: InstanceId::ROOT.raw() + 1,
        }
    }

    /// A walk id not used before in this module.
    pub fn fresh_instance(&mut self) -> InstanceId {
        let id = InstanceId::from_raw(self.next_instance);
        self.next_instance += 1;
        id
    }

    pub fn record(&mut self, instance: InstanceId, node: NodeId, ty: Idx) {
        self.types.insert((instance, node), ty);
    }

    pub fn get(&self, instance: InstanceId, node: NodeId) -> Option<Idx> {
        self.types.get(&(instance, node)).copied()
    }

    /// The recorded type of `node`, or an internal error.
    pub fn type_of(&self, instance: InstanceId, node: NodeId) -> CompileResult<Idx> {
        self.get(instance, node).ok_or_else(|| {
            CompileError::internal(format!(
                "no type recorded for node {} in walk {}",
                node.raw(),
                instance.raw()
            ))
        })
    }

    pub fn set_target(&mut self, instance: InstanceId, node: NodeId, target: Target) {
        self.targets.insert((instance, node), target);
    }

    pub fn target(&self, instance: InstanceId, node: NodeId) -> CompileResult<&Target> {
        self.targets.get(&(instance, node)).ok_or_else(|| {
            CompileError::internal(format!("no resolution recorded for node {}", node.raw()))
        })
    }

    pub fn set_signature(&mut self, instance: InstanceId, node: NodeId, sig: Signature) {
        self.signatures.insert((instance, node), sig);
    }

    /// Signature of a method or function declaration node.
    pub fn signature(&self, instance: InstanceId, node: NodeId) -> CompileResult<&Signature> {
        self.signatures.get(&(instance, node)).ok_or_else(|| {
            CompileError::internal(format!("no signature recorded for node {}", node.raw()))
        })
    }

    pub fn set_include(&mut self, instance: InstanceId, node: NodeId, body: InstanceId) {
        self.includes.insert((instance, node), body);
    }

    pub fn include(&self, instance: InstanceId, node: NodeId) -> Option<InstanceId> {
        self.includes.get(&(instance, node)).copied()
    }

    /// Number of typed nodes across all walks.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
