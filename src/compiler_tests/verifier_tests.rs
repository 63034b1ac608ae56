use crate::compiler::ir::nodes::{
    FnSig, Inst, IrFunction, IrModule, Terminator, Value,
};
use crate::compiler::ir::types::IrType;
use crate::compiler::ir::verify::verify_module;
use crate::settings;

fn empty_module() -> IrModule {
    IrModule::new("test", settings::TARGET_TRIPLE)
}

fn returning_function(name: &str) -> IrFunction {
    let mut func = IrFunction::new(name.to_string(), FnSig::new(vec![], IrType::I64));
    func.blocks[0].terminator = Some(Terminator::Ret {
        value: Some(Value::zero_i64()),
    });
    func
}

#[test]
fn a_terminated_function_verifies() {
    let mut module = empty_module();
    module.functions.push(returning_function("main"));

    assert!(verify_module(&module).is_ok());
}

#[test]
fn a_block_without_terminator_fails() {
    let mut module = empty_module();
    module
        .functions
        .push(IrFunction::new("main".to_string(), FnSig::new(vec![], IrType::I64)));

    let err = verify_module(&module).unwrap_err();
    assert!(err.msg.contains("no terminator"));
}

#[test]
fn a_branch_to_an_unknown_block_fails() {
    let mut module = empty_module();
    let mut func = IrFunction::new("main".to_string(), FnSig::new(vec![], IrType::I64));
    func.blocks[0].terminator = Some(Terminator::Br {
        target: "nowhere".to_string(),
    });
    module.functions.push(func);

    let err = verify_module(&module).unwrap_err();
    assert!(err.msg.contains("unknown block"));
}

#[test]
fn phi_incoming_must_match_predecessors() {
    let mut module = empty_module();
    let mut func = IrFunction::new("main".to_string(), FnSig::new(vec![], IrType::I64));

    let merge = func.new_block("merge");
    func.blocks[0].terminator = Some(Terminator::Br {
        target: "merge".to_string(),
    });

    // Claims a predecessor that doesn't branch here
    let result = func.new_reg();
    func.blocks[merge].instructions.push(Inst::Phi {
        result,
        ty: IrType::I64,
        incoming: vec![(Value::zero_i64(), "elsewhere".to_string())],
    });
    func.blocks[merge].terminator = Some(Terminator::Ret {
        value: Some(Value::zero_i64()),
    });

    module.functions.push(func);

    let err = verify_module(&module).unwrap_err();
    assert!(err.msg.contains("predecessors"));
}

#[test]
fn phi_with_matching_predecessors_verifies() {
    let mut module = empty_module();
    let mut func = IrFunction::new("main".to_string(), FnSig::new(vec![], IrType::I64));

    let merge = func.new_block("merge");
    func.blocks[0].terminator = Some(Terminator::Br {
        target: "merge".to_string(),
    });

    let result = func.new_reg();
    func.blocks[merge].instructions.push(Inst::Phi {
        result,
        ty: IrType::I64,
        incoming: vec![(Value::zero_i64(), "entry".to_string())],
    });
    func.blocks[merge].terminator = Some(Terminator::Ret {
        value: Some(Value::Reg {
            ty: IrType::I64,
            id: result,
        }),
    });

    module.functions.push(func);

    assert!(verify_module(&module).is_ok());
}

#[test]
fn phi_after_a_non_phi_instruction_fails() {
    let mut module = empty_module();
    let mut func = IrFunction::new("main".to_string(), FnSig::new(vec![], IrType::I64));

    let merge = func.new_block("merge");
    func.blocks[0].terminator = Some(Terminator::Br {
        target: "merge".to_string(),
    });

    let slot = func.new_reg();
    func.blocks[merge].instructions.push(Inst::Alloca {
        result: slot,
        ty: IrType::I64,
    });

    let result = func.new_reg();
    func.blocks[merge].instructions.push(Inst::Phi {
        result,
        ty: IrType::I64,
        incoming: vec![(Value::zero_i64(), "entry".to_string())],
    });
    func.blocks[merge].terminator = Some(Terminator::Ret {
        value: Some(Value::zero_i64()),
    });

    module.functions.push(func);

    let err = verify_module(&module).unwrap_err();
    assert!(err.msg.contains("phi after a non-phi"));
}

#[test]
fn phi_value_types_must_agree() {
    let mut module = empty_module();
    let mut func = IrFunction::new("main".to_string(), FnSig::new(vec![], IrType::I64));

    let merge = func.new_block("merge");
    func.blocks[0].terminator = Some(Terminator::Br {
        target: "merge".to_string(),
    });

    let result = func.new_reg();
    func.blocks[merge].instructions.push(Inst::Phi {
        result,
        ty: IrType::I64,
        incoming: vec![(Value::int(IrType::I8, 1), "entry".to_string())],
    });
    func.blocks[merge].terminator = Some(Terminator::Ret {
        value: Some(Value::zero_i64()),
    });

    module.functions.push(func);

    let err = verify_module(&module).unwrap_err();
    assert!(err.msg.contains("mixes value types"));
}

#[test]
fn duplicate_function_names_fail() {
    let mut module = empty_module();
    module.functions.push(returning_function("main"));
    module.functions.push(returning_function("main"));

    let err = verify_module(&module).unwrap_err();
    assert!(err.msg.contains("Duplicate function"));
}

#[test]
fn unique_function_names_get_suffixes() {
    let mut module = empty_module();
    module.functions.push(returning_function("main"));

    assert_eq!(module.unique_function_name("main"), "main.1");
    assert_eq!(module.unique_function_name("other"), "other");
}
