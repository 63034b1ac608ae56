//! End-to-end compilations through the public API.
//!
//! The emitted IR is checked textually; running it through opt/clang++ is
//! the CLI's job and needs the external toolchain, so these tests stop at
//! the verified module.

use larkc::{compile_to_ir, ErrorType};

#[test]
fn bare_number_program() {
    let (ir, warnings) = compile_to_ir("42").unwrap();

    assert!(ir.contains("define i64 @main()"));
    assert!(ir.contains("ret i64 0"));
    assert!(warnings.is_empty());
}

#[test]
fn hello_version_print() {
    let (ir, _) = compile_to_ir("[fprint \"V: %d\\n\" 2025]").unwrap();

    assert!(ir.contains("c\"V: %d\\0A\\00\""));
    assert!(ir.contains("call i64 (ptr, ...) @printf(ptr @.str, i64 2025)"));
}

#[test]
fn arithmetic_into_variable_and_print() {
    let (ir, _) = compile_to_ir("[var x (+ 100 1)] [fprint \"X: %d\\n\" x]").unwrap();

    assert!(ir.contains("add i8 100, 1"));
    assert!(ir.contains("zext i8"));
    assert!(ir.contains("@printf"));
}

#[test]
fn countdown_loop() {
    let program = "[var a 10] [while (> a 0) [scope [set a (- a 1)] [fprint \"%d \" a]]]";
    let (ir, _) = compile_to_ir(program).unwrap();

    assert!(ir.contains("while.cond:"));
    assert!(ir.contains("icmp sgt i64"));
    assert!(ir.contains("sub i64"));
    assert!(ir.contains("br label %while.cond"));
}

#[test]
fn function_definition_and_call() {
    let program = "[func square ((first !int)) -> !int (* first first)] [fprint \"%d\\n\" (square 10)]";
    let (ir, _) = compile_to_ir(program).unwrap();

    assert!(ir.contains("define i64 @square(i64 %a0)"));
    assert!(ir.contains("mul i64"));
    assert!(ir.contains("call i64 @square(i64 10)"));
}

#[test]
fn writing_a_constant_is_a_compile_error() {
    let err = compile_to_ir("[const PI 3.14] [set PI 3.0]").unwrap_err();

    assert_eq!(err.error_type, ErrorType::Rule);
    assert!(err.msg.contains("PI"));
}

#[test]
fn every_emitted_block_is_terminated() {
    // A program exercising every control-flow construct still verifies
    let program = "\
        [var a 0] \
        [for (var i 0) (< i 10) (set i (+ i 1)) \
            [scope \
                (check (> i 5) (break) 0) \
                [if (> i 2) [set a (+ a 2)] elif (> i 1) [set a (+ a 1)] else [set a 0]] \
                [while (> a 10) (set a (- a 1))] \
            ] \
        ] \
        [loop (break)]";

    // Codegen runs its own verifier before returning, so Ok means every
    // block got exactly one terminator and every phi matched its preds
    assert!(compile_to_ir(program).is_ok());
}

#[test]
fn deterministic_output_for_a_fixed_program() {
    let program = "[func twice ((n !int)) -> !int (* n 2)] [fprint \"%d\" (twice 21)]";

    let (first, _) = compile_to_ir(program).unwrap();
    let (second, _) = compile_to_ir(program).unwrap();

    assert_eq!(first, second);
}

#[test]
fn compile_errors_leave_no_partial_module() {
    // All-or-nothing: an error mid-program yields Err, never partial IR
    let result = compile_to_ir("[var ok 1] [set missing 2]");
    assert!(result.is_err());
}
