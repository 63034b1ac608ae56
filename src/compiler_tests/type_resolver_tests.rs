use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_warnings::WarningKind;
use crate::compiler::ir::types::IrType;

fn resolve(tag: &str) -> Result<IrType, String> {
    let mut codegen = Codegen::new();
    codegen
        .resolve_type_tag(tag, "test_var")
        .map_err(|e| e.msg)
}

#[test]
fn primitive_tags() {
    assert_eq!(resolve("!int").unwrap(), IrType::I64);
    assert_eq!(resolve("!int64").unwrap(), IrType::I64);
    assert_eq!(resolve("!int32").unwrap(), IrType::I32);
    assert_eq!(resolve("!int16").unwrap(), IrType::I16);
    assert_eq!(resolve("!int8").unwrap(), IrType::I8);
    assert_eq!(resolve("!bool").unwrap(), IrType::I8);
    assert_eq!(resolve("!str").unwrap(), IrType::Ptr);
    assert_eq!(resolve("!ptr").unwrap(), IrType::Ptr);
    assert_eq!(resolve("!frac").unwrap(), IrType::F64);
    assert_eq!(resolve("!none").unwrap(), IrType::Void);
}

#[test]
fn pointer_tags_stay_opaque() {
    assert_eq!(resolve("!ptr<!int32>").unwrap(), IrType::Ptr);
    assert_eq!(resolve("!ptr<!ptr<!frac>>").unwrap(), IrType::Ptr);
}

#[test]
fn array_tags() {
    assert_eq!(
        resolve("!array<!int,3>").unwrap(),
        IrType::array(IrType::I64, 3)
    );
    assert_eq!(
        resolve("!array<!int8,256>").unwrap(),
        IrType::array(IrType::I8, 256)
    );
}

#[test]
fn nested_array_splits_on_the_top_level_comma_only() {
    assert_eq!(
        resolve("!array<!array<!int16,2>,4>").unwrap(),
        IrType::array(IrType::array(IrType::I16, 2), 4)
    );
}

#[test]
fn array_length_must_be_positive() {
    assert!(resolve("!array<!int,0>").is_err());
    assert!(resolve("!array<!int,-2>").is_err());
    assert!(resolve("!array<!int,many>").is_err());
    assert!(resolve("!array<!int>").is_err());
}

#[test]
fn size_assertions() {
    assert_eq!(resolve("!size:8:!int").unwrap(), IrType::I64);
    assert_eq!(resolve("!size:4:!int32").unwrap(), IrType::I32);
    assert_eq!(resolve("!size:24:!array<!int,3>").unwrap(), IrType::array(IrType::I64, 3));

    let err = resolve("!size:2:!int").unwrap_err();
    assert!(err.contains("Size assertion failed"));
}

#[test]
fn unknown_tags_warn_and_default_to_int64() {
    let mut codegen = Codegen::new();
    let ty = codegen.resolve_type_tag("!wibble", "test_var").unwrap();

    assert_eq!(ty, IrType::I64);
    assert!(codegen
        .warnings
        .iter()
        .any(|w| w.warning_kind == WarningKind::UnknownTypeTag));
}

#[test]
fn allocation_sizes() {
    assert_eq!(IrType::I8.alloc_size(), 1);
    assert_eq!(IrType::I16.alloc_size(), 2);
    assert_eq!(IrType::I32.alloc_size(), 4);
    assert_eq!(IrType::I64.alloc_size(), 8);
    assert_eq!(IrType::F64.alloc_size(), 8);
    assert_eq!(IrType::Ptr.alloc_size(), 8);
    assert_eq!(IrType::array(IrType::I32, 5).alloc_size(), 20);
}
