use crate::build::compile_to_ir;
use crate::ErrorType;

fn compile(program: &str) -> String {
    let (ir, _) = compile_to_ir(program).expect("program should compile");
    ir
}

#[test]
fn array_literals_store_as_constant_aggregates() {
    let ir = compile("[var (a !array<!int,3>) (array 1 2 3)]");

    assert!(ir.contains("alloca [3 x i64]"));
    assert!(ir.contains("store [3 x i64] [i64 1, i64 2, i64 3]"));
}

#[test]
fn array_elements_must_be_constants() {
    let err = compile_to_ir("[var x 1] [var (a !array<!int,2>) (array x 2)]").unwrap_err();
    assert!(err.msg.contains("compile-time constants"));
}

#[test]
fn array_elements_must_share_a_type() {
    let err = compile_to_ir("[var (a !array<!int,2>) (array 1 2.5)]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
}

#[test]
fn array_length_mismatch_is_fatal() {
    let err = compile_to_ir("[var (a !array<!int,3>) (array 1 2)]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
}

#[test]
fn index_loads_through_an_element_pointer() {
    let ir = compile("[var (a !array<!int,3>) (array 1 2 3)] [fprint \"%d\" (index a 1)]");

    assert!(ir.contains("getelementptr inbounds [3 x i64]"));
    assert!(ir.contains("i64 0, i64 1"));
    assert!(ir.contains("load i64"));
}

#[test]
fn set_index_stores_the_cast_element() {
    let ir = compile("[var (a !array<!int,3>) (array 1 2 3)] [set (index a 0) 9]");

    assert!(ir.contains("getelementptr inbounds [3 x i64]"));
    assert!(ir.contains("store i64 9"));
}

#[test]
fn indexing_a_scalar_is_fatal() {
    let err = compile_to_ir("[var x 1] [index x 0]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
    assert!(err.msg.contains("not an array"));
}

#[test]
fn index_must_be_an_integer() {
    let err =
        compile_to_ir("[var (a !array<!int,2>) (array 1 2)] [index a 1.5]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
}

#[test]
fn sizeof_is_a_constant() {
    let ir = compile("[fprint \"%d\" (sizeof !int32)]");
    assert!(ir.contains("i64 4"));

    let ir = compile("[fprint \"%d\" (sizeof !array<!int,3>)]");
    assert!(ir.contains("i64 24"));
}

#[test]
fn heap_intrinsics_declare_the_allocator_lazily() {
    let without = compile("42");
    assert!(!without.contains("@malloc"));
    assert!(!without.contains("@free"));

    let with = compile("[var p (mem-alloc 8)] [mem-free p]");
    assert!(with.contains("declare ptr @malloc(i64)"));
    assert!(with.contains("declare void @free(ptr)"));
    assert!(with.contains("call ptr @malloc(i64 8)"));
    assert!(with.contains("call void @free(ptr"));
}

#[test]
fn mem_read_and_write_are_typed_accesses() {
    let ir = compile("[var p (mem-alloc 8)] [mem-write p 1000000] [fprint \"%d\" (mem-read p !int)]");

    assert!(ir.contains("store i32 1000000"));
    assert!(ir.contains("load i64, ptr"));
}

#[test]
fn mem_ptr_returns_the_variable_storage() {
    let ir = compile("[var x 1] [var p (mem-ptr x)]");

    // The slot's own alloca is stored into p without a load in between
    assert!(ir.contains("store ptr %t0"));
}

#[test]
fn byte_accessors_are_eight_bit() {
    let ir = compile("[var p (mem-alloc 4)] [byte-write p 65] [fprint \"%d\" (byte-read p)]");

    assert!(ir.contains("store i8 65"));
    assert!(ir.contains("load i8, ptr"));
}

#[test]
fn mem_free_requires_a_pointer() {
    let err = compile_to_ir("[mem-free 5]").unwrap_err();
    assert_eq!(err.error_type, ErrorType::Type);
}
