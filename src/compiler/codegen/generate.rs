//! # IR generation
//!
//! The main walker over the AST. `gen` dispatches on the node kind; list
//! forms dispatch on their head symbol into the handlers spread across this
//! module's siblings (arithmetic, control flow, memory, I/O, functions).
//! Anything that isn't a known special form is compiled as a call.
//!
//! The walker owns all the state one compilation needs: the module under
//! construction, the active function, the current insertion block, the loop
//! frame stack and the global scope. Handlers that retarget insertion (loops,
//! conditionals) either leave the insertion point at an unterminated block or
//! at a terminated one (after `break`/`continue`); anything that follows
//! checks `is_terminated` before emitting a fall-through branch.

use crate::compiler::codegen::environment::{Scope, ScopeRef, Slot, SlotKind};
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler::compiler_messages::traceback;
use crate::compiler::ir::nodes::{
    FnSig, Inst, IrFunction, IrGlobal, IrModule, RegId, Terminator, Value,
};
use crate::compiler::ir::types::IrType;
use crate::compiler::ir::verify::verify_module;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::compiler::parsers::sexpr;
use crate::settings;
use crate::{codegen_log, return_rule_error, return_syntax_error, return_type_error};
use std::rc::Rc;

/// Branch targets for the innermost loop.
pub(crate) struct LoopFrame {
    pub break_to: usize,
    pub continue_to: usize,
}

pub struct Codegen {
    pub(crate) module: IrModule,
    pub(crate) warnings: Vec<CompilerWarning>,
    pub(crate) loop_stack: Vec<LoopFrame>,
    active_fn: usize,
    insert_block: usize,
    globals: ScopeRef,
    malloc_declared: bool,
    free_declared: bool,
}

impl Codegen {
    pub fn new() -> Codegen {
        let mut module = IrModule::new("LarkCompilationUnit", settings::TARGET_TRIPLE);

        // Runtime externs available to every program; heap functions are
        // declared lazily on first use
        let byte_ptr = IrType::Ptr;
        module.declare_extern("printf", FnSig::varargs(vec![byte_ptr.clone()], IrType::I64));
        module.declare_extern("scanf", FnSig::varargs(vec![byte_ptr], IrType::I64));
        module.declare_extern("getchar", FnSig::new(vec![], IrType::I64));

        module.globals.push(IrGlobal {
            name: "_VERSION".to_string(),
            ty: IrType::I64,
            init: Value::int(IrType::I64, settings::LANGUAGE_VERSION),
            is_const: true,
            align: 4,
        });

        let globals = Scope::new_root();
        globals.define("_VERSION", Slot::global("_VERSION", IrType::I64));

        Codegen {
            module,
            warnings: Vec::new(),
            loop_stack: Vec::new(),
            active_fn: 0,
            insert_block: 0,
            globals,
            malloc_declared: false,
            free_declared: false,
        }
    }

    /// Compiles one program to a verified module. The program is wrapped in
    /// an outer `scope` so multiple top-level forms are legal, and the whole
    /// thing becomes the body of the implicit `main`.
    pub fn compile(program: &str) -> Result<(IrModule, Vec<CompilerWarning>), CompileError> {
        traceback::clear();

        let ast = sexpr::parse(&format!("[scope {program}]"))?;

        let mut codegen = Codegen::new();
        codegen.build_main(&ast)?;

        verify_module(&codegen.module)?;

        Ok((codegen.module, codegen.warnings))
    }

    fn build_main(&mut self, ast: &AstNode) -> Result<(), CompileError> {
        let main_sig = FnSig::new(vec![], IrType::I64);
        self.module
            .functions
            .push(IrFunction::new("main".to_string(), main_sig));
        self.active_fn = self.module.functions.len() - 1;
        self.insert_block = 0;

        let env = Rc::clone(&self.globals);
        self.gen(ast, &env)?;

        if !self.is_terminated() {
            self.terminate(Terminator::Ret {
                value: Some(Value::zero_i64()),
            });
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Insertion-point plumbing
    // ---------------------------------------------------------------------

    pub(crate) fn func_mut(&mut self) -> &mut IrFunction {
        &mut self.module.functions[self.active_fn]
    }

    pub(crate) fn new_reg(&mut self) -> RegId {
        self.func_mut().new_reg()
    }

    pub(crate) fn new_block(&mut self, hint: &str) -> usize {
        self.func_mut().new_block(hint)
    }

    pub(crate) fn set_insert(&mut self, block: usize) {
        self.insert_block = block;
    }

    pub(crate) fn insert_index(&self) -> usize {
        self.insert_block
    }

    pub(crate) fn block_label(&self, block: usize) -> String {
        self.module.functions[self.active_fn].blocks[block]
            .label
            .clone()
    }

    pub(crate) fn insert_label(&self) -> String {
        self.block_label(self.insert_block)
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.module.functions[self.active_fn].blocks[self.insert_block].is_terminated()
    }

    pub(crate) fn push_inst(&mut self, inst: Inst) {
        let block = self.insert_block;
        self.func_mut().blocks[block].instructions.push(inst);
    }

    /// Sets the terminator of the insertion block, unless it already has one.
    pub(crate) fn terminate(&mut self, term: Terminator) {
        let block = self.insert_block;
        let block = &mut self.func_mut().blocks[block];
        if block.terminator.is_none() {
            block.terminator = Some(term);
        }
    }

    pub(crate) fn branch_to(&mut self, target: usize) {
        let target = self.block_label(target);
        self.terminate(Terminator::Br { target });
    }

    /// Allocates a stack slot in the active function's entry block, keeping
    /// all allocas together ahead of any real instructions.
    pub(crate) fn hoist_alloca(&mut self, ty: IrType) -> Value {
        let result = self.new_reg();

        let entry = self.func_mut().entry_block();
        let position = entry
            .instructions
            .iter()
            .take_while(|inst| matches!(inst, Inst::Alloca { .. }))
            .count();
        entry
            .instructions
            .insert(position, Inst::Alloca { result, ty });

        Value::Reg {
            ty: IrType::Ptr,
            id: result,
        }
    }

    pub(crate) fn save_position(&self) -> (usize, usize) {
        (self.active_fn, self.insert_block)
    }

    pub(crate) fn restore_position(&mut self, position: (usize, usize)) {
        self.active_fn = position.0;
        self.insert_block = position.1;
    }

    pub(crate) fn begin_function(&mut self, func: IrFunction) -> usize {
        self.module.functions.push(func);
        self.active_fn = self.module.functions.len() - 1;
        self.insert_block = 0;
        self.active_fn
    }

    pub(crate) fn ensure_malloc(&mut self) {
        if !self.malloc_declared {
            self.module
                .declare_extern("malloc", FnSig::new(vec![IrType::I64], IrType::Ptr));
            self.malloc_declared = true;
        }
    }

    pub(crate) fn ensure_free(&mut self) {
        if !self.free_declared {
            self.module
                .declare_extern("free", FnSig::new(vec![IrType::Ptr], IrType::Void));
            self.free_declared = true;
        }
    }

    // ---------------------------------------------------------------------
    // The dispatcher
    // ---------------------------------------------------------------------

    pub(crate) fn gen(&mut self, exp: &AstNode, env: &ScopeRef) -> Result<Value, CompileError> {
        traceback::push_expression(exp);

        match exp {
            AstNode::Number(n) => Ok(narrow_integer(*n)),
            AstNode::Fractional(x) => Ok(Value::ConstFloat(*x)),
            AstNode::Str(s) => Ok(self.gen_string_literal(s)),
            AstNode::Symbol(name) => self.gen_symbol(name, env),
            AstNode::List(items) => self.gen_list(items, env),
        }
    }

    fn gen_list(&mut self, items: &[AstNode], env: &ScopeRef) -> Result<Value, CompileError> {
        let head = match items.first() {
            Some(head) => head,
            None => return_rule_error!("Empty list expression"),
        };

        let head_symbol = match head {
            AstNode::Symbol(s) => s.as_str(),
            // A computed callee: evaluate it and call the result
            _ => return self.gen_call(head, &items[1..], env),
        };

        let oper = canonical_operator(head_symbol);

        match oper {
            "+" | "-" | "*" | "/" | ">" | "<" | ">=" | "<=" | "==" | "!=" => {
                self.gen_binary_form(oper, items, env)
            }

            "bit-and" | "bit-or" | "bit-xor" | "bit-shl" | "bit-shr" => {
                self.gen_bitwise_form(oper, items, env)
            }
            "bit-not" => self.gen_bitwise_not(items, env),

            "var" => self.gen_var_decl(items, env, false),
            "const" => self.gen_var_decl(items, env, true),
            "set" => self.gen_set(items, env),
            "scope" => self.gen_scope(items, env),

            "check" => self.gen_check(items, env),
            "if" => self.gen_if(items, env),
            "loop" => self.gen_infinite_loop(items, env),
            "while" => self.gen_while(items, env),
            "for" => self.gen_for(items, env),
            "break" => self.gen_break(items),
            "continue" => self.gen_continue(items),

            "func" => self.gen_func_def(items, env),

            "array" => self.gen_array(items, env),
            "index" => self.gen_index(items, env),
            "sizeof" => self.gen_sizeof(items),
            "mem-alloc" => self.gen_mem_alloc(items, env),
            "mem-free" => self.gen_mem_free(items, env),
            "mem-read" | "mem-deref" => self.gen_mem_read(items, env),
            "mem-write" => self.gen_mem_write(items, env),
            "mem-ptr" => self.gen_mem_ptr(items, env),
            "byte-read" => self.gen_byte_read(items, env),
            "byte-write" => self.gen_byte_write(items, env),

            "fprint" => self.gen_fprint(items, env),
            "finput" => self.gen_finput(items, env),

            _ => self.gen_call(head, &items[1..], env),
        }
    }

    // ---------------------------------------------------------------------
    // Literals, symbols, variables, blocks
    // ---------------------------------------------------------------------

    fn gen_string_literal(&mut self, raw: &str) -> Value {
        let unescaped = raw.replace("\\n", "\n").replace("\\t", "\t");
        self.module.intern_string(unescaped.into_bytes())
    }

    fn gen_symbol(&mut self, name: &str, env: &ScopeRef) -> Result<Value, CompileError> {
        if name == "true" || name == "false" {
            return Ok(Value::int(IrType::I8, (name == "true") as i64));
        }

        let slot = match env.lookup(name) {
            Some(slot) => slot,
            None => return_rule_error!("Variable \"{}\" is not defined", name),
        };

        match slot.kind {
            SlotKind::Function { name, sig } => Ok(Value::FuncRef { name, sig }),
            SlotKind::Local { ptr, ty } => Ok(self.emit_load(ty, ptr)),
            SlotKind::Global { name, ty } => {
                let ptr = Value::GlobalRef {
                    name,
                    pointee: ty.clone(),
                };
                Ok(self.emit_load(ty, ptr))
            }
        }
    }

    pub(crate) fn emit_load(&mut self, ty: IrType, ptr: Value) -> Value {
        let result = self.new_reg();
        self.push_inst(Inst::Load {
            result,
            ty: ty.clone(),
            ptr,
        });
        Value::Reg { ty, id: result }
    }

    pub(crate) fn emit_store(&mut self, value: Value, ptr: Value) {
        self.push_inst(Inst::Store { value, ptr });
    }

    /// `(var NAMEDECL INIT)` / `(const NAMEDECL INIT)`
    ///
    /// A bare name takes its type from the initializer, with integers always
    /// widened to int64; a `(NAME !tag)` declaration pins the type and only
    /// the implicit widening conversions may bridge a mismatch.
    fn gen_var_decl(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
        is_const: bool,
    ) -> Result<Value, CompileError> {
        let form = if is_const { "const" } else { "var" };

        if items.len() != 3 {
            return_syntax_error!("{} requires a name and an initializer", form);
        }

        let (name, declared_ty) = match &items[1] {
            AstNode::Symbol(name) => (name.as_str(), None),
            AstNode::List(decl) => match (decl.first(), decl.get(1), decl.len()) {
                (Some(AstNode::Symbol(name)), Some(AstNode::Symbol(tag)), 2) => {
                    let ty = self.resolve_type_tag(tag, name)?;
                    (name.as_str(), Some(ty))
                }
                _ => return_syntax_error!(
                    "Malformed declaration in {}: expected NAME or (NAME !type)",
                    form
                ),
            },
            _ => return_syntax_error!(
                "Malformed declaration in {}: expected NAME or (NAME !type)",
                form
            ),
        };

        codegen_log!("declare {form} {name}");

        let init = self.gen(&items[2], env)?;

        let (stored, var_ty) = match declared_ty {
            Some(ty) => {
                let coerced = self.coerce_widening(init, &ty)?;
                (coerced, ty)
            }
            None => {
                let init_ty = init.ty();
                if init_ty.is_integer() {
                    let widened = self.implicit_cast(init, &IrType::I64);
                    (widened, IrType::I64)
                } else if init_ty == IrType::Void {
                    return_type_error!("Cannot initialize \"{}\" with a void value", name);
                } else {
                    (init, init_ty)
                }
            }
        };

        if env.defined_locally(name) {
            self.warnings
                .push(CompilerWarning::new(name, WarningKind::Redeclaration));
        }

        let ptr = self.hoist_alloca(var_ty.clone());
        self.emit_store(stored.clone(), ptr.clone());

        let array_ty = matches!(var_ty, IrType::Array { .. }).then(|| var_ty.clone());

        env.define(
            name,
            Slot {
                kind: SlotKind::Local { ptr, ty: var_ty },
                is_const,
                array_ty,
            },
        );

        Ok(stored)
    }

    /// `(set TARGET VALUE)` where TARGET is a name or `(index NAME IDX)`
    fn gen_set(&mut self, items: &[AstNode], env: &ScopeRef) -> Result<Value, CompileError> {
        if items.len() != 3 {
            return_syntax_error!("set requires a target and a value");
        }

        match &items[1] {
            AstNode::Symbol(name) => {
                let slot = match env.lookup(name) {
                    Some(slot) => slot,
                    None => return_rule_error!("Variable \"{}\" is not defined", name),
                };

                // Constness is checked before the value is evaluated
                if slot.is_const {
                    return_rule_error!("Variable \"{}\" is constant", name);
                }

                let value = self.gen(&items[2], env)?;

                match slot.kind {
                    SlotKind::Local { ptr, ty } => {
                        let coerced = self.coerce_widening(value, &ty)?;
                        self.emit_store(coerced.clone(), ptr);
                        Ok(coerced)
                    }
                    SlotKind::Global { name, ty } => {
                        let coerced = self.coerce_widening(value, &ty)?;
                        let ptr = Value::GlobalRef { name, pointee: ty };
                        self.emit_store(coerced.clone(), ptr);
                        Ok(coerced)
                    }
                    SlotKind::Function { .. } => {
                        return_rule_error!("Cannot assign to function \"{}\"", name)
                    }
                }
            }

            AstNode::List(target) if target.first().is_some_and(|h| h.is_symbol("index")) => {
                let (elem_ptr, elem_ty) = self.gen_element_ptr(target, env)?;
                let value = self.gen(&items[2], env)?;
                let coerced = self.implicit_cast(value, &elem_ty);

                if coerced.ty() != elem_ty {
                    return_type_error!(
                        "Cannot store a {} into an array of {}",
                        coerced.ty(),
                        elem_ty
                    );
                }

                self.emit_store(coerced.clone(), elem_ptr);
                Ok(coerced)
            }

            _ => return_syntax_error!("set target must be a variable or (index NAME IDX)"),
        }
    }

    /// Widening-only assignment conversion: identity, integer widening, or
    /// integer to double. Anything else is a type error.
    pub(crate) fn coerce_widening(
        &mut self,
        value: Value,
        target: &IrType,
    ) -> Result<Value, CompileError> {
        let from = value.ty();

        if from == *target {
            return Ok(value);
        }

        if from.is_integer() && *target == IrType::F64 {
            return Ok(self.implicit_cast(value, target));
        }

        if let (Some(from_bits), Some(to_bits)) = (from.int_bits(), target.int_bits()) {
            if from_bits < to_bits {
                return Ok(self.implicit_cast(value, target));
            }
        }

        // Constant aggregates widen element-wise, still at compile time
        if let (
            Value::ConstArray { values, .. },
            IrType::Array {
                elem: target_elem,
                len,
            },
        ) = (&value, target)
        {
            if values.len() as u64 == *len {
                let mut widened = Vec::with_capacity(values.len());
                for element in values {
                    widened.push(self.coerce_widening(element.clone(), target_elem)?);
                }
                return Ok(Value::ConstArray {
                    elem: (**target_elem).clone(),
                    values: widened,
                });
            }
        }

        return_type_error!("Cannot convert {} to {}", from, target)
    }

    /// `(scope E1 ... En)` evaluates its children in a child environment and
    /// produces the last child's value.
    fn gen_scope(&mut self, items: &[AstNode], env: &ScopeRef) -> Result<Value, CompileError> {
        let block_env = Scope::make_child(env);

        let mut result = Value::zero_i64();
        for child in &items[1..] {
            result = self.gen(child, &block_env)?;
        }

        Ok(result)
    }

    // ---------------------------------------------------------------------
    // Calls
    // ---------------------------------------------------------------------

    pub(crate) fn gen_call(
        &mut self,
        callee: &AstNode,
        arg_nodes: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        let callee_value = self.gen(callee, env)?;

        let (fn_name, sig) = match callee_value {
            Value::FuncRef { name, sig } => (name, sig),
            _ => return_type_error!("Expression \"{}\" is not callable", callee),
        };

        codegen_log!("call {fn_name}");

        let mut args = Vec::with_capacity(arg_nodes.len());
        for node in arg_nodes {
            args.push(self.gen(node, env)?);
        }

        if !sig.varargs && args.len() != sig.params.len() {
            return_rule_error!(
                "Function \"{}\" expects {} arguments, got {}",
                fn_name,
                sig.params.len(),
                args.len()
            );
        }

        let params = sig.params.clone();
        let mut cast_args = Vec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            match params.get(i) {
                Some(param_ty) => cast_args.push(self.implicit_cast(arg, param_ty)),
                None => cast_args.push(self.promote_variadic_arg(arg)),
            }
        }

        self.emit_call(&fn_name, sig, cast_args)
    }

    pub(crate) fn emit_call(
        &mut self,
        fn_name: &str,
        sig: FnSig,
        args: Vec<Value>,
    ) -> Result<Value, CompileError> {
        if sig.ret == IrType::Void {
            self.push_inst(Inst::Call {
                result: None,
                callee: fn_name.to_string(),
                sig,
                args,
            });
            return Ok(Value::Unit);
        }

        let result = self.new_reg();
        let ret = sig.ret.clone();
        self.push_inst(Inst::Call {
            result: Some(result),
            callee: fn_name.to_string(),
            sig,
            args,
        });

        Ok(Value::Reg { ty: ret, id: result })
    }
}

/// Integer literals materialize as the narrowest signed width that fits.
fn narrow_integer(n: i64) -> Value {
    let ty = if (-128..=127).contains(&n) {
        IrType::I8
    } else if (-32768..=32767).contains(&n) {
        IrType::I16
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&n) {
        IrType::I32
    } else {
        IrType::I64
    };

    Value::int(ty, n)
}

/// The parser front-end mangles operators in some positions; both spellings
/// route to the same handler.
fn canonical_operator(head: &str) -> &str {
    match head {
        "__PLUS_OPERAND__" => "+",
        "__SUB_OPERAND__" => "-",
        "__MUL_OPERAND__" => "*",
        "__DIV_OPERAND__" => "/",
        "__CMPG__" => ">",
        "__CMPL__" => "<",
        "__CMPGE__" => ">=",
        "__CMPLE__" => "<=",
        "__CMPEQ__" => "==",
        "__CMPNE__" => "!=",
        other => other,
    }
}
