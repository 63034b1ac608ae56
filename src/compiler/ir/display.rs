//! Textual IR emission
//!
//! Prints an [`IrModule`] in LLVM assembly form, ready for `opt`. Float
//! constants are printed as raw bit patterns so the round-trip through the
//! external parser is exact. String constants use the `c"..."` byte syntax
//! with a trailing NUL.

use crate::compiler::ir::nodes::{
    Block, FnSig, Inst, IrFunction, IrGlobal, IrModule, StringLit, Terminator, Value,
};
use std::fmt;

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f, "target triple = \"{}\"", self.target_triple)?;
        writeln!(f)?;

        for s in &self.strings {
            writeln!(f, "{}", display_string_lit(s))?;
        }
        if !self.strings.is_empty() {
            writeln!(f)?;
        }

        for g in &self.globals {
            writeln!(f, "{}", display_global(g))?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }

        for (name, sig) in &self.extern_fns {
            writeln!(f, "declare {} @{}({})", sig.ret, name, declare_params(sig))?;
        }
        if !self.extern_fns.is_empty() {
            writeln!(f)?;
        }

        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", display_function(func))?;
        }

        Ok(())
    }
}

fn declare_params(sig: &FnSig) -> String {
    let mut parts: Vec<String> = sig.params.iter().map(|t| t.to_string()).collect();
    if sig.varargs {
        parts.push("...".to_string());
    }
    parts.join(", ")
}

fn display_string_lit(s: &StringLit) -> String {
    let mut escaped = String::with_capacity(s.bytes.len() + 8);
    for &b in &s.bytes {
        match b {
            b'"' | b'\\' => escaped.push_str(&format!("\\{b:02X}")),
            0x20..=0x7e => escaped.push(b as char),
            _ => escaped.push_str(&format!("\\{b:02X}")),
        }
    }

    format!(
        "@{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
        s.name,
        s.bytes.len() + 1,
        escaped
    )
}

fn display_global(g: &IrGlobal) -> String {
    let kind = if g.is_const { "constant" } else { "global" };
    format!(
        "@{} = {} {} {}, align {}",
        g.name,
        kind,
        g.ty,
        operand(&g.init),
        g.align
    )
}

fn display_function(func: &IrFunction) -> String {
    let params: Vec<String> = func
        .sig
        .params
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{ty} %a{i}"))
        .collect();

    let mut out = format!(
        "define {} @{}({}) {{\n",
        func.sig.ret,
        func.name,
        params.join(", ")
    );

    for block in &func.blocks {
        out.push_str(&display_block(block));
    }

    out.push_str("}\n");
    out
}

fn display_block(block: &Block) -> String {
    let mut out = format!("{}:\n", block.label);

    for inst in &block.instructions {
        out.push_str("  ");
        out.push_str(&display_inst(inst));
        out.push('\n');
    }

    if let Some(term) = &block.terminator {
        out.push_str("  ");
        out.push_str(&display_terminator(term));
        out.push('\n');
    }

    out
}

fn display_inst(inst: &Inst) -> String {
    match inst {
        Inst::Alloca { result, ty } => format!("%t{result} = alloca {ty}"),
        Inst::Load { result, ty, ptr } => {
            format!("%t{result} = load {ty}, ptr {}", operand(ptr))
        }
        Inst::Store { value, ptr } => {
            format!("store {} {}, ptr {}", value.ty(), operand(value), operand(ptr))
        }
        Inst::Binary {
            result,
            op,
            ty,
            lhs,
            rhs,
        } => format!(
            "%t{result} = {} {ty} {}, {}",
            op.opcode(),
            operand(lhs),
            operand(rhs)
        ),
        Inst::Cmp {
            result,
            pred,
            ty,
            lhs,
            rhs,
        } => {
            let opcode = if pred.is_float() { "fcmp" } else { "icmp" };
            format!(
                "%t{result} = {opcode} {} {ty} {}, {}",
                pred.keyword(),
                operand(lhs),
                operand(rhs)
            )
        }
        Inst::Cast {
            result,
            op,
            value,
            to,
        } => format!(
            "%t{result} = {} {} {} to {to}",
            op.opcode(),
            value.ty(),
            operand(value)
        ),
        Inst::Gep {
            result,
            base_ty,
            ptr,
            indices,
        } => {
            let idx: Vec<String> = indices
                .iter()
                .map(|v| format!("{} {}", v.ty(), operand(v)))
                .collect();
            format!(
                "%t{result} = getelementptr inbounds {base_ty}, ptr {}, {}",
                operand(ptr),
                idx.join(", ")
            )
        }
        Inst::Phi {
            result,
            ty,
            incoming,
        } => {
            let arms: Vec<String> = incoming
                .iter()
                .map(|(v, label)| format!("[ {}, %{} ]", operand(v), label))
                .collect();
            format!("%t{result} = phi {ty} {}", arms.join(", "))
        }
        Inst::Call {
            result,
            callee,
            sig,
            args,
        } => {
            let typed_args: Vec<String> = args
                .iter()
                .map(|v| format!("{} {}", v.ty(), operand(v)))
                .collect();

            // Variadic calls spell out the full function type
            let callee_ty = if sig.varargs {
                format!("{} ({})", sig.ret, declare_params(sig))
            } else {
                sig.ret.to_string()
            };

            let call = format!("call {callee_ty} @{callee}({})", typed_args.join(", "));
            match result {
                Some(r) => format!("%t{r} = {call}"),
                None => call,
            }
        }
    }
}

fn display_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Br { target } => format!("br label %{target}"),
        Terminator::CondBr {
            cond,
            then_label,
            else_label,
        } => format!(
            "br i1 {}, label %{then_label}, label %{else_label}",
            operand(cond)
        ),
        Terminator::Ret { value } => match value {
            Some(v) => format!("ret {} {}", v.ty(), operand(v)),
            None => "ret void".to_string(),
        },
    }
}

/// Renders a value as a bare operand, without its leading type.
pub fn operand(value: &Value) -> String {
    match value {
        Value::ConstInt { value, .. } => value.to_string(),
        Value::ConstFloat(x) => format!("0x{:016X}", x.to_bits()),
        Value::ConstArray { values, .. } => {
            let elems: Vec<String> = values
                .iter()
                .map(|v| format!("{} {}", v.ty(), operand(v)))
                .collect();
            format!("[{}]", elems.join(", "))
        }
        Value::Reg { id, .. } => format!("%t{id}"),
        Value::Param { index, .. } => format!("%a{index}"),
        Value::GlobalRef { name, .. } => format!("@{name}"),
        Value::FuncRef { name, .. } => format!("@{name}"),
        Value::Unit => "void".to_string(),
    }
}
