use crate::build::compile_to_ir;
use crate::ErrorType;

fn compile(program: &str) -> String {
    let (ir, _) = compile_to_ir(program).expect("program should compile");
    ir
}

#[test]
fn check_merges_both_branches_with_a_phi() {
    let ir = compile("[var r (check (> 1 0) 10 20)]");

    assert!(ir.contains("br i1"));
    assert!(ir.contains("phi i8 [ 10, %then ], [ 20, %else ]"));
}

#[test]
fn check_widens_numeric_branches_to_a_common_type() {
    // One arm is a narrow literal, the other a 64-bit value
    let ir = compile("[var a 5] [var r (check (> a 0) 1 a)]");
    assert!(ir.contains("phi i64"));
}

#[test]
fn check_rejects_incompatible_branch_types() {
    let err = compile_to_ir("[var r (check true 1 \"no\")]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
    assert!(err.msg.contains("same type"));
}

#[test]
fn check_requires_both_branches() {
    let err = compile_to_ir("[check true 1]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Syntax);
}

#[test]
fn conditions_are_coerced_to_one_bit() {
    // A bool variable loads as i8 and must be compared against zero before
    // the conditional branch
    let ir = compile("[var (flag !bool) true] [check flag 1 2]");
    assert!(ir.contains("icmp ne i8"));
}

#[test]
fn if_chain_shape() {
    let ir = compile("[var a 5] [if (> a 3) [fprint \"big\"] elif (> a 1) [fprint \"mid\"] else [fprint \"small\"]]");

    assert!(ir.contains("if.then:"));
    assert!(ir.contains("if.next:"));
    assert!(ir.contains("elif.then:"));
    assert!(ir.contains("elif.next:"));
    assert!(ir.contains("if.end:"));
}

#[test]
fn if_with_else_merges_branch_values() {
    let ir = compile("[var a 5] [var r (if (> a 3) 1 else 2)]");
    assert!(ir.contains("phi i8"));
}

#[test]
fn if_without_else_produces_zero() {
    // No else, so the form's value is a constant zero and no phi is needed
    let ir = compile("[var a 5] [var r (if (> a 3) 9)]");
    assert!(!ir.contains("phi"));
    assert!(ir.contains("store i64 0"));
}

#[test]
fn if_branch_type_mismatch_is_fatal() {
    let err = compile_to_ir("[var r (if true 1 else \"no\")]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
}

#[test]
fn while_loop_block_shape() {
    let ir = compile("[var a 10] [while (> a 0) [scope [set a (- a 1)] [fprint \"%d \" a]]]");

    assert!(ir.contains("while.cond:"));
    assert!(ir.contains("while.body:"));
    assert!(ir.contains("while.continue:"));
    assert!(ir.contains("while.break:"));

    // continue rejoins the condition
    assert!(ir.contains("br label %while.cond"));
}

#[test]
fn for_loop_binds_init_locally() {
    let ir = compile("[for (var i 0) (< i 3) (set i (+ i 1)) (fprint \"%d\" i)]");

    assert!(ir.contains("for.cond:"));
    assert!(ir.contains("for.body:"));
    assert!(ir.contains("for.step:"));
    assert!(ir.contains("for.break:"));

    // The induction variable is not visible after the loop
    let err =
        compile_to_ir("[scope [for (var i 0) (< i 3) (set i (+ i 1)) 0] i]").unwrap_err();
    assert!(err.msg.contains("not defined"));
}

#[test]
fn infinite_loop_with_break() {
    let ir = compile("[var a 0] [loop [set a (+ a 1)] (check (> a 3) (break) 0)]");

    assert!(ir.contains("loop.body:"));
    assert!(ir.contains("loop.exit:"));
    assert!(ir.contains("br label %loop.exit"));
    assert!(ir.contains("after_break:"));
}

#[test]
fn loop_body_falls_through_to_itself() {
    let ir = compile("[var a 0] [loop [set a (+ a 1)]]");
    assert!(ir.contains("br label %loop.body"));
}

#[test]
fn continue_branches_to_the_loop_head() {
    let ir = compile("[var a 10] [while (> a 0) [scope [set a (- a 1)] (continue)]]");
    assert!(ir.contains("after_continue:"));
    assert!(ir.contains("br label %while.continue"));
}

#[test]
fn break_outside_loop_is_fatal() {
    let err = compile_to_ir("[break]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Rule);
    assert!(err.msg.contains("break outside of loop"));
}

#[test]
fn continue_outside_loop_is_fatal() {
    let err = compile_to_ir("[continue]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Rule);
    assert!(err.msg.contains("continue outside of loop"));
}

#[test]
fn break_applies_to_the_innermost_loop() {
    let ir = compile("[loop [while true (break)] (break)]");

    // The while's break target comes from the inner frame
    assert!(ir.contains("br label %while.break"));
    assert!(ir.contains("br label %loop.exit"));
}

#[test]
fn nested_conditionals_keep_unique_labels() {
    let ir = compile("[var a 1] [check (> a 0) (check (> a 1) 1 2) 3]");

    assert!(ir.contains("then.1:"));
    assert!(ir.contains("ifend.1:"));
}
