//! Function definitions
//!
//! `(func NAME (PARAMS) [-> RET] BODY)` builds a new module-level function.
//! The reference is installed in the defining scope before the body compiles
//! so recursive calls resolve, parameters are spilled to entry-block slots,
//! and the body's value becomes the return value. The previous insertion
//! point is restored afterwards, so a nested definition never disturbs the
//! code around it.

use crate::compiler::codegen::environment::{Scope, ScopeRef, Slot};
use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler::ir::nodes::{FnSig, IrFunction, Terminator, Value};
use crate::compiler::ir::types::IrType;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::{codegen_log, return_syntax_error, return_type_error};

impl Codegen {
    pub(crate) fn gen_func_def(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() < 4 {
            return_syntax_error!("func requires a name, a parameter list and a body");
        }

        let name = match items[1].as_symbol() {
            Some(name) => name,
            None => return_syntax_error!("Function name must be a symbol"),
        };

        codegen_log!("func {name}");

        let param_nodes = match items[2].as_list() {
            Some(params) => params,
            None => return_syntax_error!("Parameters of \"{}\" must be a list", name),
        };

        // A literal `->` after the parameter list declares the return type
        let has_return_type = items[3].is_symbol("->");

        let ret_ty = if has_return_type {
            let tag = match items.get(4).and_then(|n| n.as_symbol()) {
                Some(tag) => tag,
                None => return_syntax_error!("Missing return type after '->' in \"{}\"", name),
            };
            self.resolve_type_tag(tag, name)?
        } else {
            IrType::I64
        };

        let body_index = if has_return_type { 5 } else { 3 };
        let body = match items.get(body_index) {
            Some(body) => body,
            None => return_syntax_error!("Function \"{}\" is missing a body", name),
        };

        // Each parameter is a bare symbol or (NAME TYPETAG)
        let mut params = Vec::with_capacity(param_nodes.len());
        for node in param_nodes {
            match node {
                AstNode::Symbol(pname) => params.push((pname.clone(), IrType::I64)),
                AstNode::List(decl) => match (decl.first(), decl.get(1), decl.len()) {
                    (Some(AstNode::Symbol(pname)), Some(AstNode::Symbol(tag)), 2) => {
                        let ty = self.resolve_type_tag(tag, pname)?;
                        params.push((pname.clone(), ty));
                    }
                    _ => return_syntax_error!(
                        "Malformed parameter declaration in \"{}\": expected NAME or (NAME !type)",
                        name
                    ),
                },
                _ => return_syntax_error!(
                    "Malformed parameter declaration in \"{}\": expected NAME or (NAME !type)",
                    name
                ),
            }
        }

        let sig = FnSig::new(params.iter().map(|(_, ty)| ty.clone()).collect(), ret_ty);

        // Bind before compiling the body so recursion resolves
        let fn_name = self.module.unique_function_name(name);
        if env.defined_locally(name) {
            self.warnings
                .push(CompilerWarning::new(name, WarningKind::Redeclaration));
        }
        env.define(name, Slot::function(fn_name.clone(), sig.clone()));

        let saved = self.save_position();
        self.begin_function(IrFunction::new(fn_name.clone(), sig.clone()));

        let fn_env = Scope::make_child(env);

        for (index, (pname, pty)) in params.iter().enumerate() {
            let slot_ptr = self.hoist_alloca(pty.clone());
            self.emit_store(
                Value::Param {
                    ty: pty.clone(),
                    index,
                },
                slot_ptr.clone(),
            );
            if fn_env.defined_locally(pname) {
                self.warnings
                    .push(CompilerWarning::new(pname, WarningKind::Redeclaration));
            }
            fn_env.define(pname, Slot::local(slot_ptr, pty.clone()));
        }

        let body_value = self.gen(body, &fn_env)?;

        if !self.is_terminated() {
            if sig.ret == IrType::Void {
                self.terminate(Terminator::Ret { value: None });
            } else {
                let body_ty = body_value.ty();
                let returned = match self.coerce_widening(body_value, &sig.ret) {
                    Ok(value) => value,
                    Err(_) => return_type_error!(
                        "Function \"{}\" returns {} but its body produces {}",
                        name,
                        sig.ret,
                        body_ty
                    ),
                };
                self.terminate(Terminator::Ret {
                    value: Some(returned),
                });
            }
        }

        self.restore_position(saved);

        Ok(Value::FuncRef { name: fn_name, sig })
    }
}
