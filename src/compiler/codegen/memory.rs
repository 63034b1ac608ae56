//! Arrays and memory intrinsics
//!
//! Array literals are compile-time constant aggregates; indexed access goes
//! through `getelementptr` with a leading zero index. The `mem-*` intrinsics
//! are thin wrappers over loads, stores and the C allocator, which is
//! declared on first use.

use crate::compiler::codegen::environment::{ScopeRef, SlotKind};
use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::ir::nodes::{FnSig, Inst, Value};
use crate::compiler::ir::types::IrType;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::{return_rule_error, return_syntax_error, return_type_error};

impl Codegen {
    /// `(array E1 ... En)`: a constant aggregate. The first element fixes
    /// the element type.
    pub(crate) fn gen_array(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() < 2 {
            return_syntax_error!("array requires at least one element");
        }

        let mut values = Vec::with_capacity(items.len() - 1);
        for node in &items[1..] {
            let value = self.gen(node, env)?;
            match value {
                Value::ConstInt { .. } | Value::ConstFloat(_) => values.push(value),
                _ => return_rule_error!("array elements must be compile-time constants"),
            }
        }

        let elem_ty = values[0].ty();
        for value in &values {
            if value.ty() != elem_ty {
                return_type_error!(
                    "array elements must share one type, got {} and {}",
                    elem_ty,
                    value.ty()
                );
            }
        }

        Ok(Value::ConstArray {
            elem: elem_ty,
            values,
        })
    }

    /// `(index NAME IDX)`: load one element of an array variable.
    pub(crate) fn gen_index(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        let (elem_ptr, elem_ty) = self.gen_element_ptr(items, env)?;
        Ok(self.emit_load(elem_ty, elem_ptr))
    }

    /// Computes the in-bounds element pointer for an `(index NAME IDX)`
    /// form. Shared between element loads and `(set (index ...) V)`.
    pub(crate) fn gen_element_ptr(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<(Value, IrType), CompileError> {
        if items.len() != 3 {
            return_syntax_error!("index requires a variable name and an index");
        }

        let name = match items[1].as_symbol() {
            Some(name) => name,
            None => return_syntax_error!("index target must be a variable name"),
        };

        let slot = match env.lookup(name) {
            Some(slot) => slot,
            None => return_rule_error!("Variable \"{}\" is not defined", name),
        };

        let array_ty = match &slot.array_ty {
            Some(ty) => ty.clone(),
            None => return_type_error!("Variable \"{}\" is not an array", name),
        };

        let elem_ty = match &array_ty {
            IrType::Array { elem, .. } => (**elem).clone(),
            _ => return_type_error!("Variable \"{}\" is not an array", name),
        };

        let base_ptr = match slot.kind {
            SlotKind::Local { ptr, .. } => ptr,
            SlotKind::Global { name, ty } => Value::GlobalRef { name, pointee: ty },
            SlotKind::Function { .. } => {
                return_type_error!("Variable \"{}\" is not an array", name)
            }
        };

        let idx = self.gen(&items[2], env)?;
        if !idx.ty().is_integer() {
            return_type_error!("array index must be an integer, got {}", idx.ty());
        }
        let idx = self.implicit_cast(idx, &IrType::I64);

        let result = self.new_reg();
        self.push_inst(Inst::Gep {
            result,
            base_ty: array_ty,
            ptr: base_ptr,
            indices: vec![Value::zero_i64(), idx],
        });

        Ok((
            Value::Reg {
                ty: IrType::Ptr,
                id: result,
            },
            elem_ty,
        ))
    }

    /// `(sizeof TYPETAG)`: allocation size of the resolved type, as i64.
    pub(crate) fn gen_sizeof(&mut self, items: &[AstNode]) -> Result<Value, CompileError> {
        if items.len() != 2 {
            return_syntax_error!("sizeof requires a type tag");
        }

        let tag = match items[1].as_symbol() {
            Some(tag) => tag,
            None => return_syntax_error!("sizeof requires a type tag"),
        };

        let ty = self.resolve_type_tag(tag, "sizeof")?;

        Ok(Value::int(IrType::I64, ty.alloc_size() as i64))
    }

    /// `(mem-alloc SIZE)`: `malloc(i64)`, declared lazily.
    pub(crate) fn gen_mem_alloc(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 2 {
            return_syntax_error!("mem-alloc requires a size");
        }

        self.ensure_malloc();

        let size = self.gen(&items[1], env)?;
        if !size.ty().is_integer() {
            return_type_error!("mem-alloc size must be an integer, got {}", size.ty());
        }
        let size = self.implicit_cast(size, &IrType::I64);

        self.emit_call(
            "malloc",
            FnSig::new(vec![IrType::I64], IrType::Ptr),
            vec![size],
        )
    }

    /// `(mem-free PTR)`: `free(ptr)`, declared lazily.
    pub(crate) fn gen_mem_free(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 2 {
            return_syntax_error!("mem-free requires a pointer");
        }

        self.ensure_free();

        let ptr = self.expect_pointer(&items[1], env, "mem-free")?;
        self.emit_call("free", FnSig::new(vec![IrType::Ptr], IrType::Void), vec![ptr])?;

        Ok(Value::zero_i64())
    }

    /// `(mem-read PTR TYPETAG)` / `(mem-deref PTR TYPETAG)`: typed load
    /// through a raw pointer.
    pub(crate) fn gen_mem_read(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 3 {
            return_syntax_error!("mem-read requires a pointer and a type tag");
        }

        let tag = match items[2].as_symbol() {
            Some(tag) => tag,
            None => return_syntax_error!("mem-read requires a type tag"),
        };
        let ty = self.resolve_type_tag(tag, "mem-read")?;

        let ptr = self.expect_pointer(&items[1], env, "mem-read")?;

        Ok(self.emit_load(ty, ptr))
    }

    /// `(mem-write PTR VALUE)`: store through a raw pointer with the
    /// value's own type.
    pub(crate) fn gen_mem_write(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 3 {
            return_syntax_error!("mem-write requires a pointer and a value");
        }

        let ptr = self.expect_pointer(&items[1], env, "mem-write")?;

        let value = self.gen(&items[2], env)?;
        if value.ty() == IrType::Void {
            return_type_error!("Cannot mem-write a void value");
        }

        self.emit_store(value.clone(), ptr);
        Ok(value)
    }

    /// `(mem-ptr NAME)`: a variable's storage as an opaque byte pointer.
    pub(crate) fn gen_mem_ptr(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 2 {
            return_syntax_error!("mem-ptr requires a variable name");
        }

        let name = match items[1].as_symbol() {
            Some(name) => name,
            None => return_syntax_error!("mem-ptr requires a variable name"),
        };

        let slot = match env.lookup(name) {
            Some(slot) => slot,
            None => return_rule_error!("Variable \"{}\" is not defined", name),
        };

        match slot.kind {
            SlotKind::Local { ptr, .. } => Ok(ptr),
            SlotKind::Global { name, ty } => Ok(Value::GlobalRef { name, pointee: ty }),
            SlotKind::Function { .. } => {
                return_type_error!("\"{}\" is a function, not a variable", name)
            }
        }
    }

    /// `(byte-read PTR)`: 8-bit load.
    pub(crate) fn gen_byte_read(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 2 {
            return_syntax_error!("byte-read requires a pointer");
        }

        let ptr = self.expect_pointer(&items[1], env, "byte-read")?;
        Ok(self.emit_load(IrType::I8, ptr))
    }

    /// `(byte-write PTR VAL)`: 8-bit store, narrowing the value first.
    pub(crate) fn gen_byte_write(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 3 {
            return_syntax_error!("byte-write requires a pointer and a value");
        }

        let ptr = self.expect_pointer(&items[1], env, "byte-write")?;

        let value = self.gen(&items[2], env)?;
        if !value.ty().is_integer() {
            return_type_error!("byte-write value must be an integer, got {}", value.ty());
        }
        let value = self.implicit_cast(value, &IrType::I8);

        self.emit_store(value.clone(), ptr);
        Ok(value)
    }

    fn expect_pointer(
        &mut self,
        node: &AstNode,
        env: &ScopeRef,
        form: &str,
    ) -> Result<Value, CompileError> {
        let ptr = self.gen(node, env)?;
        if ptr.ty() != IrType::Ptr {
            return_type_error!("{} expects a pointer, got {}", form, ptr.ty());
        }
        Ok(ptr)
    }
}
