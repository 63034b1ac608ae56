//! Lexical environments
//!
//! A scope is a node in a reference-counted chain: bindings for this block
//! plus a parent pointer. `define` only ever touches the current scope;
//! `lookup` walks toward the root. The chain is a tree (children point up,
//! never down), so dropping the codegen of a block drops its scope.
//!
//! A slot carries everything later stages need to know about a name:
//! its storage, whether `set` may touch it, and its declared array type
//! when there is one.

use crate::compiler::ir::nodes::{FnSig, Value};
use crate::compiler::ir::types::IrType;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ScopeRef = Rc<Scope>;

#[derive(Debug, Clone)]
pub enum SlotKind {
    /// Stack allocation in the owning function's entry block
    Local { ptr: Value, ty: IrType },
    /// Module-level global variable
    Global { name: String, ty: IrType },
    /// Function reference
    Function { name: String, sig: FnSig },
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub kind: SlotKind,
    pub is_const: bool,
    /// Declared array type, kept so indexed access can reconstruct the
    /// element type
    pub array_ty: Option<IrType>,
}

impl Slot {
    pub fn local(ptr: Value, ty: IrType) -> Slot {
        Slot {
            kind: SlotKind::Local { ptr, ty },
            is_const: false,
            array_ty: None,
        }
    }

    pub fn global(name: impl Into<String>, ty: IrType) -> Slot {
        Slot {
            kind: SlotKind::Global {
                name: name.into(),
                ty,
            },
            is_const: false,
            array_ty: None,
        }
    }

    pub fn function(name: impl Into<String>, sig: FnSig) -> Slot {
        Slot {
            kind: SlotKind::Function {
                name: name.into(),
                sig,
            },
            is_const: false,
            array_ty: None,
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    bindings: RefCell<FxHashMap<String, Slot>>,
    parent: Option<ScopeRef>,
}

impl Scope {
    pub fn new_root() -> ScopeRef {
        Rc::new(Scope {
            bindings: RefCell::new(FxHashMap::default()),
            parent: None,
        })
    }

    pub fn make_child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(Scope {
            bindings: RefCell::new(FxHashMap::default()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Inserts into the current scope only. Returns false when the name was
    /// already bound here, so the caller can emit a redeclaration warning.
    pub fn define(&self, name: &str, slot: Slot) -> bool {
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), slot)
            .is_none()
    }

    /// Walks the chain toward the root. `None` means undefined, which every
    /// caller treats as fatal.
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        if let Some(slot) = self.bindings.borrow().get(name) {
            return Some(slot.clone());
        }

        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => None,
        }
    }

    pub fn defined_locally(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }
}
