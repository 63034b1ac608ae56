//! IR node definitions
//!
//! An [`IrModule`] is a list of globals, interned string constants, external
//! declarations and functions. Functions hold basic blocks; each block is a
//! straight-line instruction sequence plus at most one terminator. The
//! codegen stage is responsible for leaving every block with exactly one
//! terminator by the time the module is verified.
//!
//! Values are in single-assignment form: every instruction that produces a
//! result writes a fresh `%tN` register.

use crate::compiler::ir::types::IrType;

pub type RegId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct FnSig {
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub varargs: bool,
}

impl FnSig {
    pub fn new(params: Vec<IrType>, ret: IrType) -> FnSig {
        FnSig {
            params,
            ret,
            varargs: false,
        }
    }

    pub fn varargs(params: Vec<IrType>, ret: IrType) -> FnSig {
        FnSig {
            params,
            ret,
            varargs: true,
        }
    }
}

/// An SSA value usable as an instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    ConstInt { ty: IrType, value: i64 },
    ConstFloat(f64),
    /// Constant aggregate, every element itself a constant
    ConstArray { elem: IrType, values: Vec<Value> },
    /// Result of an earlier instruction
    Reg { ty: IrType, id: RegId },
    /// Incoming function argument
    Param { ty: IrType, index: usize },
    /// Address of a module-level global or string constant
    GlobalRef { name: String, pointee: IrType },
    /// Direct function reference
    FuncRef { name: String, sig: FnSig },
    /// The absence of a value (void calls)
    Unit,
}

impl Value {
    pub fn int(ty: IrType, value: i64) -> Value {
        Value::ConstInt { ty, value }
    }

    pub fn zero_i64() -> Value {
        Value::ConstInt {
            ty: IrType::I64,
            value: 0,
        }
    }

    pub fn ty(&self) -> IrType {
        match self {
            Value::ConstInt { ty, .. } => ty.clone(),
            Value::ConstFloat(_) => IrType::F64,
            Value::ConstArray { elem, values } => IrType::array(elem.clone(), values.len() as u64),
            Value::Reg { ty, .. } => ty.clone(),
            Value::Param { ty, .. } => ty.clone(),
            Value::GlobalRef { .. } => IrType::Ptr,
            Value::FuncRef { .. } => IrType::Ptr,
            Value::Unit => IrType::Void,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
}

impl BinaryOp {
    pub fn opcode(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::LShr => "lshr",
            BinaryOp::FAdd => "fadd",
            BinaryOp::FSub => "fsub",
            BinaryOp::FMul => "fmul",
            BinaryOp::FDiv => "fdiv",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            BinaryOp::FAdd | BinaryOp::FSub | BinaryOp::FMul | BinaryOp::FDiv
        )
    }
}

/// Comparison predicates. Integer comparisons are signed; float comparisons
/// are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPred {
    IEq,
    INe,
    ISgt,
    ISlt,
    ISge,
    ISle,
    FOeq,
    FOne,
    FOgt,
    FOlt,
    FOge,
    FOle,
}

impl CmpPred {
    pub fn is_float(self) -> bool {
        matches!(
            self,
            CmpPred::FOeq
                | CmpPred::FOne
                | CmpPred::FOgt
                | CmpPred::FOlt
                | CmpPred::FOge
                | CmpPred::FOle
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            CmpPred::IEq => "eq",
            CmpPred::INe => "ne",
            CmpPred::ISgt => "sgt",
            CmpPred::ISlt => "slt",
            CmpPred::ISge => "sge",
            CmpPred::ISle => "sle",
            CmpPred::FOeq => "oeq",
            CmpPred::FOne => "one",
            CmpPred::FOgt => "ogt",
            CmpPred::FOlt => "olt",
            CmpPred::FOge => "oge",
            CmpPred::FOle => "ole",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    ZExt,
    Trunc,
    SIToFP,
}

impl CastOp {
    pub fn opcode(self) -> &'static str {
        match self {
            CastOp::ZExt => "zext",
            CastOp::Trunc => "trunc",
            CastOp::SIToFP => "sitofp",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    Alloca {
        result: RegId,
        ty: IrType,
    },
    Load {
        result: RegId,
        ty: IrType,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Binary {
        result: RegId,
        op: BinaryOp,
        ty: IrType,
        lhs: Value,
        rhs: Value,
    },
    Cmp {
        result: RegId,
        pred: CmpPred,
        ty: IrType,
        lhs: Value,
        rhs: Value,
    },
    Cast {
        result: RegId,
        op: CastOp,
        value: Value,
        to: IrType,
    },
    /// `getelementptr inbounds` over an aggregate
    Gep {
        result: RegId,
        base_ty: IrType,
        ptr: Value,
        indices: Vec<Value>,
    },
    /// SSA merge; incoming pairs are (value, predecessor block label)
    Phi {
        result: RegId,
        ty: IrType,
        incoming: Vec<(Value, String)>,
    },
    Call {
        result: Option<RegId>,
        callee: String,
        sig: FnSig,
        args: Vec<Value>,
    },
}

impl Inst {
    pub fn result(&self) -> Option<RegId> {
        match self {
            Inst::Alloca { result, .. }
            | Inst::Load { result, .. }
            | Inst::Binary { result, .. }
            | Inst::Cmp { result, .. }
            | Inst::Cast { result, .. }
            | Inst::Gep { result, .. }
            | Inst::Phi { result, .. } => Some(*result),
            Inst::Call { result, .. } => *result,
            Inst::Store { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Br {
        target: String,
    },
    CondBr {
        cond: Value,
        then_label: String,
        else_label: String,
    },
    Ret {
        value: Option<Value>,
    },
}

#[derive(Debug, Clone)]
pub struct Block {
    pub label: String,
    pub instructions: Vec<Inst>,
    pub terminator: Option<Terminator>,
}

impl Block {
    pub fn new(label: String) -> Block {
        Block {
            label,
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub sig: FnSig,
    pub blocks: Vec<Block>,
    next_reg: RegId,
}

impl IrFunction {
    /// Creates the function with its `entry` block in place.
    pub fn new(name: String, sig: FnSig) -> IrFunction {
        IrFunction {
            name,
            sig,
            blocks: vec![Block::new("entry".to_string())],
            next_reg: 0,
        }
    }

    pub fn new_reg(&mut self) -> RegId {
        let id = self.next_reg;
        self.next_reg += 1;
        id
    }

    /// Appends a new block with a unique label derived from `hint`.
    pub fn new_block(&mut self, hint: &str) -> usize {
        let mut label = hint.to_string();
        let mut suffix = 1;
        while self.blocks.iter().any(|b| b.label == label) {
            label = format!("{hint}.{suffix}");
            suffix += 1;
        }

        self.blocks.push(Block::new(label));
        self.blocks.len() - 1
    }

    pub fn entry_block(&mut self) -> &mut Block {
        &mut self.blocks[0]
    }
}

#[derive(Debug, Clone)]
pub struct IrGlobal {
    pub name: String,
    pub ty: IrType,
    pub init: Value,
    pub is_const: bool,
    pub align: u32,
}

/// A read-only byte array backing a string literal, NUL terminator implied.
#[derive(Debug, Clone)]
pub struct StringLit {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct IrModule {
    pub name: String,
    pub target_triple: String,
    pub globals: Vec<IrGlobal>,
    pub strings: Vec<StringLit>,
    pub extern_fns: Vec<(String, FnSig)>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new(name: impl Into<String>, target_triple: impl Into<String>) -> IrModule {
        IrModule {
            name: name.into(),
            target_triple: target_triple.into(),
            globals: Vec::new(),
            strings: Vec::new(),
            extern_fns: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Adds an external declaration if one with this name doesn't exist yet.
    pub fn declare_extern(&mut self, name: &str, sig: FnSig) {
        if !self.extern_fns.iter().any(|(n, _)| n == name) {
            self.extern_fns.push((name.to_string(), sig));
        }
    }

    pub fn extern_sig(&self, name: &str) -> Option<&FnSig> {
        self.extern_fns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sig)| sig)
    }

    /// Interns a string constant, reusing an existing one with equal bytes.
    /// Returns a pointer value to the interned array.
    pub fn intern_string(&mut self, bytes: Vec<u8>) -> Value {
        let array_ty = IrType::array(IrType::I8, bytes.len() as u64 + 1);

        if let Some(existing) = self.strings.iter().find(|s| s.bytes == bytes) {
            return Value::GlobalRef {
                name: existing.name.clone(),
                pointee: array_ty,
            };
        }

        let name = if self.strings.is_empty() {
            ".str".to_string()
        } else {
            format!(".str.{}", self.strings.len())
        };

        self.strings.push(StringLit {
            name: name.clone(),
            bytes,
        });

        Value::GlobalRef {
            name,
            pointee: array_ty,
        }
    }

    /// Picks an unused symbol name for a new function definition.
    pub fn unique_function_name(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.functions.iter().any(|f| f.name == candidate)
                || self.extern_fns.iter().any(|(n, _)| n == candidate)
        };

        if !taken(base) {
            return base.to_string();
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{base}.{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
