//! Arithmetic, comparison and bitwise codegen
//!
//! One routine handles every binary operator: find the common type (double
//! wins, otherwise the left operand decides), cast both sides, then pick the
//! float or integer opcode. Comparisons produce the 1-bit predicate value.
//! Integer division and the ordering predicates are signed; width changes
//! between integers use unsigned extension and truncation.

use crate::compiler::codegen::environment::ScopeRef;
use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::ir::nodes::{BinaryOp, CastOp, CmpPred, Inst, Value};
use crate::compiler::ir::types::IrType;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::{return_syntax_error, return_type_error};

impl Codegen {
    pub(crate) fn gen_binary_form(
        &mut self,
        oper: &str,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 3 {
            return_syntax_error!("Operator '{}' requires two operands", oper);
        }

        let lhs = self.gen(&items[1], env)?;
        let rhs = self.gen(&items[2], env)?;

        self.emit_binary_op(oper, lhs, rhs)
    }

    pub(crate) fn emit_binary_op(
        &mut self,
        oper: &str,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, CompileError> {
        let common = if lhs.ty() == IrType::F64 || rhs.ty() == IrType::F64 {
            IrType::F64
        } else {
            lhs.ty()
        };

        if !common.is_numeric() {
            return_type_error!(
                "Operator '{}' expects numeric operands, got {} and {}",
                oper,
                lhs.ty(),
                rhs.ty()
            );
        }

        let lhs = self.implicit_cast(lhs, &common);
        let rhs = self.implicit_cast(rhs, &common);

        if common == IrType::F64 {
            self.emit_float_op(oper, lhs, rhs)
        } else {
            self.emit_integer_op(oper, common, lhs, rhs)
        }
    }

    fn emit_float_op(&mut self, oper: &str, lhs: Value, rhs: Value) -> Result<Value, CompileError> {
        let arith = match oper {
            "+" => Some(BinaryOp::FAdd),
            "-" => Some(BinaryOp::FSub),
            "*" => Some(BinaryOp::FMul),
            "/" => Some(BinaryOp::FDiv),
            _ => None,
        };

        if let Some(op) = arith {
            return Ok(self.emit_binary_inst(op, IrType::F64, lhs, rhs));
        }

        let pred = match oper {
            ">" => CmpPred::FOgt,
            "<" => CmpPred::FOlt,
            ">=" => CmpPred::FOge,
            "<=" => CmpPred::FOle,
            "==" => CmpPred::FOeq,
            "!=" => CmpPred::FOne,
            _ => return_syntax_error!("Unknown operator '{}'", oper),
        };

        Ok(self.emit_cmp_inst(pred, IrType::F64, lhs, rhs))
    }

    fn emit_integer_op(
        &mut self,
        oper: &str,
        ty: IrType,
        lhs: Value,
        rhs: Value,
    ) -> Result<Value, CompileError> {
        let arith = match oper {
            "+" => Some(BinaryOp::Add),
            "-" => Some(BinaryOp::Sub),
            "*" => Some(BinaryOp::Mul),
            "/" => Some(BinaryOp::SDiv),
            _ => None,
        };

        if let Some(op) = arith {
            return Ok(self.emit_binary_inst(op, ty, lhs, rhs));
        }

        let pred = match oper {
            ">" => CmpPred::ISgt,
            "<" => CmpPred::ISlt,
            ">=" => CmpPred::ISge,
            "<=" => CmpPred::ISle,
            "==" => CmpPred::IEq,
            "!=" => CmpPred::INe,
            _ => return_syntax_error!("Unknown operator '{}'", oper),
        };

        Ok(self.emit_cmp_inst(pred, ty, lhs, rhs))
    }

    pub(crate) fn gen_bitwise_form(
        &mut self,
        oper: &str,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 3 {
            return_syntax_error!("Operator '{}' requires two operands", oper);
        }

        let lhs = self.gen(&items[1], env)?;
        let rhs = self.gen(&items[2], env)?;

        if !lhs.ty().is_integer() || !rhs.ty().is_integer() {
            return_type_error!(
                "Operator '{}' expects integer operands, got {} and {}",
                oper,
                lhs.ty(),
                rhs.ty()
            );
        }

        // Widths are unified to the wider operand
        let bits = lhs
            .ty()
            .int_bits()
            .unwrap_or(64)
            .max(rhs.ty().int_bits().unwrap_or(64));
        let ty = IrType::int_with_bits(bits);

        let lhs = self.implicit_cast(lhs, &ty);
        let rhs = self.implicit_cast(rhs, &ty);

        let op = match oper {
            "bit-and" => BinaryOp::And,
            "bit-or" => BinaryOp::Or,
            "bit-xor" => BinaryOp::Xor,
            "bit-shl" => BinaryOp::Shl,
            "bit-shr" => BinaryOp::LShr,
            _ => return_syntax_error!("Unknown operator '{}'", oper),
        };

        Ok(self.emit_binary_inst(op, ty, lhs, rhs))
    }

    /// `(bit-not X)` is an xor against all-ones.
    pub(crate) fn gen_bitwise_not(
        &mut self,
        items: &[AstNode],
        env: &ScopeRef,
    ) -> Result<Value, CompileError> {
        if items.len() != 2 {
            return_syntax_error!("Operator 'bit-not' requires one operand");
        }

        let value = self.gen(&items[1], env)?;
        let ty = value.ty();

        if !ty.is_integer() {
            return_type_error!("Operator 'bit-not' expects an integer operand, got {}", ty);
        }

        let all_ones = Value::int(ty.clone(), -1);
        Ok(self.emit_binary_inst(BinaryOp::Xor, ty, value, all_ones))
    }

    fn emit_binary_inst(&mut self, op: BinaryOp, ty: IrType, lhs: Value, rhs: Value) -> Value {
        let result = self.new_reg();
        self.push_inst(Inst::Binary {
            result,
            op,
            ty: ty.clone(),
            lhs,
            rhs,
        });
        Value::Reg { ty, id: result }
    }

    fn emit_cmp_inst(&mut self, pred: CmpPred, ty: IrType, lhs: Value, rhs: Value) -> Value {
        let result = self.new_reg();
        self.push_inst(Inst::Cmp {
            result,
            pred,
            ty,
            lhs,
            rhs,
        });
        Value::Reg {
            ty: IrType::I1,
            id: result,
        }
    }

    /// Implicit conversion toward `target`: identity, signed int-to-double,
    /// pointer-to-pointer (a no-op under opaque pointers), and zext/trunc
    /// between integer widths. Anything else passes through unchanged and
    /// the caller's own type check decides.
    pub(crate) fn implicit_cast(&mut self, value: Value, target: &IrType) -> Value {
        let from = value.ty();

        if from == *target {
            return value;
        }

        // Integer constants re-type without emitting an instruction
        if let Value::ConstInt { value: n, .. } = &value {
            let n = *n;
            if *target == IrType::F64 {
                return Value::ConstFloat(n as f64);
            }
            if let Some(bits) = target.int_bits() {
                return Value::int(target.clone(), wrap_to_width(n, bits));
            }
        }

        if from.is_integer() && *target == IrType::F64 {
            return self.emit_cast(CastOp::SIToFP, value, IrType::F64);
        }

        if from == IrType::Ptr && *target == IrType::Ptr {
            return value;
        }

        if let (Some(from_bits), Some(to_bits)) = (from.int_bits(), target.int_bits()) {
            if from_bits < to_bits {
                return self.emit_cast(CastOp::ZExt, value, target.clone());
            }
            if from_bits > to_bits {
                return self.emit_cast(CastOp::Trunc, value, target.clone());
            }
        }

        value
    }

    fn emit_cast(&mut self, op: CastOp, value: Value, to: IrType) -> Value {
        let result = self.new_reg();
        self.push_inst(Inst::Cast {
            result,
            op,
            value,
            to: to.clone(),
        });
        Value::Reg { ty: to, id: result }
    }

    /// Widens a value inside an already-terminated block. Used by the
    /// φ-merge handlers, which discover the common type only after every
    /// branch has been generated; instructions sit before the terminator in
    /// the block layout, so appending here is safe.
    pub(crate) fn widen_in_block(&mut self, block: usize, value: Value, target: &IrType) -> Value {
        let from = value.ty();

        if from == *target {
            return value;
        }

        if let Value::ConstInt { value: n, .. } = &value {
            let n = *n;
            if *target == IrType::F64 {
                return Value::ConstFloat(n as f64);
            }
            if let Some(bits) = target.int_bits() {
                return Value::int(target.clone(), wrap_to_width(n, bits));
            }
        }

        let op = if *target == IrType::F64 {
            CastOp::SIToFP
        } else {
            CastOp::ZExt
        };

        let result = self.new_reg();
        let inst = Inst::Cast {
            result,
            op,
            value,
            to: target.clone(),
        };
        self.func_mut().blocks[block].instructions.push(inst);

        Value::Reg {
            ty: target.clone(),
            id: result,
        }
    }

    /// Branch conditions must be 1-bit; anything numeric is compared against
    /// zero first.
    pub(crate) fn to_condition(&mut self, value: Value) -> Result<Value, CompileError> {
        let ty = value.ty();

        if ty == IrType::I1 {
            return Ok(value);
        }

        if ty.is_integer() {
            let zero = Value::int(ty.clone(), 0);
            return Ok(self.emit_cmp_inst(CmpPred::INe, ty, value, zero));
        }

        if ty == IrType::F64 {
            let zero = Value::ConstFloat(0.0);
            return Ok(self.emit_cmp_inst(CmpPred::FOne, IrType::F64, value, zero));
        }

        return_type_error!("Condition must be numeric, got {}", ty)
    }

    /// C-style default argument promotion for variadic calls: integers
    /// narrower than 64 bits widen so `%d`-style format reads see a full
    /// register.
    pub(crate) fn promote_variadic_arg(&mut self, value: Value) -> Value {
        match value.ty().int_bits() {
            Some(bits) if bits < 64 => self.implicit_cast(value, &IrType::I64),
            _ => value,
        }
    }
}

/// Wraps a constant into the value range of an integer width, keeping the
/// canonical signed representation.
fn wrap_to_width(n: i64, bits: u32) -> i64 {
    if bits >= 64 {
        return n;
    }

    let mask = (1i128 << bits) - 1;
    let wrapped = (n as i128) & mask;
    let sign_bit = 1i128 << (bits - 1);

    if wrapped >= sign_bit {
        (wrapped - (1i128 << bits)) as i64
    } else {
        wrapped as i64
    }
}
