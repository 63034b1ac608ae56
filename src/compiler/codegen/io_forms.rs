//! Formatted I/O forms
//!
//! `fprint` and `finput` compile to calls of the variadic C `printf` and
//! `scanf`. String input gets special treatment: `%s` is swapped for a
//! whole-line scanset, each string target receives a fresh 256-byte stack
//! buffer, and leftover input is drained through `getchar` so the next read
//! starts on a clean line.

use crate::compiler::codegen::environment::{ScopeRef, SlotKind};
use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::ir::nodes::{BinaryOp, CmpPred, FnSig, Inst, Terminator, Value};
use crate::compiler::ir::types::IrType;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::{codegen_log, return_rule_error, return_syntax_error, return_type_error};

const INPUT_BUFFER_BYTES: u64 = 256;

impl Codegen {
    /// `(fprint FMT ARG...)`: `printf` with promoted variadic arguments.
    pub(crate) fn gen_fprint(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        codegen_log!("fprint");

        if items.len() < 2 {
            return_syntax_error!("fprint requires a format string");
        }

        let mut args = Vec::with_capacity(items.len() - 1);
        for node in &items[1..] {
            let value = self.gen(node, env)?;
            args.push(self.promote_variadic_arg(value));
        }

        if args[0].ty() != IrType::Ptr {
            return_type_error!("fprint format must be a string, got {}", args[0].ty());
        }

        let sig = self
            .module
            .extern_sig("printf")
            .cloned()
            .unwrap_or_else(|| FnSig::varargs(vec![IrType::Ptr], IrType::I64));

        self.emit_call("printf", sig, args)
    }

    /// `(finput FMT VAR...)`: `scanf` into variable slots. Pointer-typed
    /// targets are treated as strings: the format's `%s` becomes `%[^\n]`,
    /// the variable is pointed at a stack buffer, and trailing input is
    /// consumed up to the newline.
    pub(crate) fn gen_finput(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        codegen_log!("finput");

        if items.len() < 2 {
            return_syntax_error!("finput requires a format string");
        }

        let format = match &items[1] {
            AstNode::Str(s) => s.clone(),
            _ => return_syntax_error!("finput format must be a string literal"),
        };

        // Resolve every target slot up front; the format rewrite depends on
        // whether any of them holds a string
        let mut targets = Vec::with_capacity(items.len() - 2);
        for node in &items[2..] {
            let name = match node.as_symbol() {
                Some(name) => name,
                None => return_syntax_error!("finput targets must be variable names"),
            };

            let slot = match env.lookup(name) {
                Some(slot) => slot,
                None => return_rule_error!("Variable \"{}\" is not defined", name),
            };

            match slot.kind {
                SlotKind::Local { ptr, ty } => targets.push((ptr, ty)),
                _ => return_rule_error!("finput target \"{}\" must be a local variable", name),
            }
        }

        let any_string = targets.iter().any(|(_, ty)| *ty == IrType::Ptr);

        let format = if any_string {
            format.replace("%s", "%[^\\n]")
        } else {
            format
        };

        let unescaped = format.replace("\\n", "\n").replace("\\t", "\t");
        let format_ptr = self.module.intern_string(unescaped.into_bytes());

        let mut args = vec![format_ptr];
        for (slot_ptr, ty) in &targets {
            if *ty == IrType::Ptr {
                // Fresh line buffer; the variable now points at it
                let buffer = self.hoist_alloca(IrType::array(IrType::I8, INPUT_BUFFER_BYTES));
                self.emit_store(buffer.clone(), slot_ptr.clone());
                args.push(buffer);
            } else {
                args.push(slot_ptr.clone());
            }
        }

        let sig = self
            .module
            .extern_sig("scanf")
            .cloned()
            .unwrap_or_else(|| FnSig::varargs(vec![IrType::Ptr], IrType::I64));

        let result = self.emit_call("scanf", sig, args)?;

        if any_string {
            self.drain_input_line()?;
        }

        Ok(result)
    }

    /// Reads characters until newline or EOF so the next `finput` starts
    /// clean.
    fn drain_input_line(&mut self) -> Result<(), CompileError> {
        let drain_block = self.new_block("getch.drain");
        let done_block = self.new_block("getch.done");

        self.branch_to(drain_block);
        self.set_insert(drain_block);

        let getchar_sig = FnSig::new(vec![], IrType::I64);
        let ch = self.emit_call("getchar", getchar_sig, Vec::new())?;

        let newline = self.new_reg();
        self.push_inst(Inst::Cmp {
            result: newline,
            pred: CmpPred::IEq,
            ty: IrType::I64,
            lhs: ch.clone(),
            rhs: Value::int(IrType::I64, i64::from(b'\n')),
        });

        let eof = self.new_reg();
        self.push_inst(Inst::Cmp {
            result: eof,
            pred: CmpPred::IEq,
            ty: IrType::I64,
            lhs: ch,
            rhs: Value::int(IrType::I64, -1),
        });

        let stop = self.new_reg();
        self.push_inst(Inst::Binary {
            result: stop,
            op: BinaryOp::Or,
            ty: IrType::I1,
            lhs: Value::Reg {
                ty: IrType::I1,
                id: newline,
            },
            rhs: Value::Reg {
                ty: IrType::I1,
                id: eof,
            },
        });

        self.terminate(Terminator::CondBr {
            cond: Value::Reg {
                ty: IrType::I1,
                id: stop,
            },
            then_label: self.block_label(done_block),
            else_label: self.block_label(drain_block),
        });

        self.set_insert(done_block);

        Ok(())
    }
}
