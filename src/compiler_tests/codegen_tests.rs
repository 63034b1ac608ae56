use crate::build::compile_to_ir;
use crate::compiler::compiler_messages::compiler_warnings::WarningKind;
use crate::ErrorType;

fn compile(program: &str) -> String {
    let (ir, _) = compile_to_ir(program).expect("program should compile");
    ir
}

#[test]
fn bare_number_compiles_to_main_returning_zero() {
    let ir = compile("42");

    assert!(ir.contains("define i64 @main()"));
    assert!(ir.contains("ret i64 0"));
    assert!(ir.contains("target triple = \"x86_64-unknown-linux-gnu\""));
}

#[test]
fn version_global_is_emitted() {
    let ir = compile("_VERSION");
    assert!(ir.contains("@_VERSION = constant i64 300, align 4"));
    assert!(ir.contains("load i64, ptr @_VERSION"));
}

#[test]
fn runtime_externs_are_declared() {
    let ir = compile("42");
    assert!(ir.contains("declare i64 @printf(ptr, ...)"));
    assert!(ir.contains("declare i64 @scanf(ptr, ...)"));
    assert!(ir.contains("declare i64 @getchar()"));
}

#[test]
fn integer_literals_narrow_to_the_smallest_width() {
    // Both constants fit in i8, so the add happens at i8 and the result is
    // widened for the default-typed variable
    let ir = compile("[var x (+ 100 1)]");

    assert!(ir.contains("add i8 100, 1"));
    assert!(ir.contains("zext i8"));
    assert!(ir.contains("alloca i64"));
}

#[test]
fn float_operands_route_to_float_opcodes() {
    let ir = compile("[var x (+ 1.5 2.5)]");
    assert!(ir.contains("fadd double"));
    assert!(!ir.contains("add i"));
}

#[test]
fn mixed_int_and_float_promotes_to_double() {
    let ir = compile("[var x (* 2 2.5)]");
    assert!(ir.contains("fmul double"));
}

#[test]
fn division_is_signed() {
    let ir = compile("[var a 10] [var b (/ a 3)]");
    assert!(ir.contains("sdiv i64"));
}

#[test]
fn comparisons_are_signed_and_produce_i1() {
    let ir = compile("[var a 5] [var b (check (< a 10) 1 0)]");
    assert!(ir.contains("icmp slt i64"));
}

#[test]
fn float_comparisons_are_ordered() {
    let ir = compile("[var x (check (> 1.5 0.5) 1 0)]");
    assert!(ir.contains("fcmp ogt double"));
}

#[test]
fn operator_synonyms_compile_like_their_plain_spelling() {
    let plain = compile("[var x (+ 1 2)]");
    let mangled = compile("[var x (__PLUS_OPERAND__ 1 2)]");
    assert_eq!(plain, mangled);
}

#[test]
fn bitwise_ops_unify_widths() {
    let ir = compile("[var a 1000] [var b (bit-and a 7)]");
    assert!(ir.contains("and i64"));

    let ir = compile("[var x (bit-shl 1 4)]");
    assert!(ir.contains("shl i8 1, 4"));
}

#[test]
fn bit_not_is_xor_with_all_ones() {
    let ir = compile("[var a 5] [var b (bit-not a)]");
    assert!(ir.contains("xor i64"));
    assert!(ir.contains(", -1"));
}

#[test]
fn bitwise_rejects_floats() {
    let result = compile_to_ir("[var x (bit-and 1.0 2)]");
    assert_eq!(result.unwrap_err().error_type, ErrorType::Type);
}

#[test]
fn booleans_are_eight_bit() {
    let ir = compile("[var (flag !bool) true]");
    assert!(ir.contains("alloca i8"));
    assert!(ir.contains("store i8 1"));
}

#[test]
fn bare_declarations_infer_from_the_initializer() {
    // Integers widen to int64, other types keep their own shape
    let ir = compile("[var x 3.14]");
    assert!(ir.contains("alloca double"));

    let ir = compile("[var s \"hi\"]");
    assert!(ir.contains("alloca ptr"));
}

#[test]
fn declared_types_accept_only_widening() {
    let ir = compile("[var (x !frac) 2]");
    assert!(ir.contains("store double"));

    let narrowing = compile_to_ir("[var (x !int8) 300]");
    assert_eq!(narrowing.unwrap_err().error_type, ErrorType::Type);

    let float_to_int = compile_to_ir("[var (x !int) 2.5]");
    assert_eq!(float_to_int.unwrap_err().error_type, ErrorType::Type);
}

#[test]
fn string_literals_are_interned_with_escapes() {
    let ir = compile("[fprint \"V: %d\\n\" 2025]");

    assert!(ir.contains("@.str = private unnamed_addr constant [7 x i8] c\"V: %d\\0A\\00\""));
    assert!(ir.contains("call i64 (ptr, ...) @printf(ptr @.str, i64 2025)"));
}

#[test]
fn equal_string_literals_share_one_constant() {
    let ir = compile("[scope [fprint \"x\"] [fprint \"x\"]]");
    assert_eq!(ir.matches("private unnamed_addr constant").count(), 1);
}

#[test]
fn set_stores_with_widening() {
    let ir = compile("[var a 10] [set a (- a 1)]");
    assert!(ir.contains("sub i64"));
    assert!(ir.contains("store i64"));
}

#[test]
fn set_rejects_constants() {
    let result = compile_to_ir("[const PI 3.14] [set PI 3.0]");

    let err = result.unwrap_err();
    assert_eq!(err.error_type, ErrorType::Rule);
    assert!(err.msg.contains("constant"));
}

#[test]
fn set_rejects_unknown_names() {
    let err = compile_to_ir("[set ghost 1]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Rule);
    assert!(err.msg.contains("not defined"));
}

#[test]
fn undefined_variable_reads_are_fatal() {
    let err = compile_to_ir("[fprint \"%d\" ghost]").unwrap_err();
    assert!(err.msg.contains("\"ghost\" is not defined"));
}

#[test]
fn redeclaration_warns_but_compiles() {
    let (_, warnings) = compile_to_ir("[scope [var x 1] [var x 2]]").unwrap();

    assert!(warnings
        .iter()
        .any(|w| w.warning_kind == WarningKind::Redeclaration));
}

#[test]
fn inner_scopes_shadow_without_warning() {
    let (_, warnings) = compile_to_ir("[scope [var x 1] [scope [var x 2]]]").unwrap();
    assert!(warnings.is_empty());
}

#[test]
fn scope_visibility_is_lexical() {
    // The inner binding dies with its scope
    let err = compile_to_ir("[scope [scope [var hidden 1]] hidden]").unwrap_err();
    assert!(err.msg.contains("not defined"));
}

#[test]
fn functions_define_and_call() {
    let ir = compile("[func square ((first !int)) -> !int (* first first)] [fprint \"%d\\n\" (square 10)]");

    assert!(ir.contains("define i64 @square(i64 %a0)"));
    assert!(ir.contains("mul i64"));
    assert!(ir.contains("call i64 @square(i64 10)"));
}

#[test]
fn function_default_return_type_is_int64() {
    let ir = compile("[func id ((x !int)) x] [id 5]");
    assert!(ir.contains("define i64 @id(i64 %a0)"));
}

#[test]
fn recursion_resolves_through_the_defining_scope() {
    let ir = compile(
        "[func fact ((n !int)) -> !int (check (< n 2) 1 (* n (fact (- n 1))))] [fact 5]",
    );
    assert!(ir.contains("call i64 @fact"));
}

#[test]
fn call_arity_is_checked() {
    let err = compile_to_ir("[func id ((x !int)) x] [id 1 2]").unwrap_err();
    assert!(err.msg.contains("expects 1 arguments, got 2"));
}

#[test]
fn calling_a_number_is_a_type_error() {
    let err = compile_to_ir("[var x 1] [x 1]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
}

#[test]
fn arguments_cast_to_parameter_types() {
    let ir = compile("[func half ((x !frac)) -> !frac (/ x 2.0)] [half 3]");
    assert!(ir.contains("call double @half(double"));
}

#[test]
fn codegen_is_deterministic() {
    let program = "[var a 10] [while (> a 0) [scope [set a (- a 1)] [fprint \"%d \" a]]]";
    assert_eq!(compile(program), compile(program));
}
