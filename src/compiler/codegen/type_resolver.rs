//! Type tag resolution
//!
//! Maps declared `!`-tags to IR types. Compound tags nest:
//! `!ptr<T>` validates the inner type but stays an opaque pointer,
//! `!array<T,N>` splits on the top-level comma only, and `!size:N:T`
//! asserts the allocation size of `T` at compile time.

use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::compiler_messages::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler::ir::types::IrType;
use crate::return_syntax_error;

impl Codegen {
    pub(crate) fn resolve_type_tag(
        &mut self,
        tag: &str,
        var_name: &str,
    ) -> Result<IrType, CompileError> {
        match tag {
            "!int" | "!int64" => return Ok(IrType::I64),
            "!int32" => return Ok(IrType::I32),
            "!int16" => return Ok(IrType::I16),
            "!int8" => return Ok(IrType::I8),
            "!bool" => return Ok(IrType::I8),
            "!str" | "!ptr" => return Ok(IrType::Ptr),
            "!frac" => return Ok(IrType::F64),
            "!none" => return Ok(IrType::Void),
            _ => {}
        }

        if let Some(inner) = strip_compound(tag, "!ptr<") {
            // The pointer is opaque; the inner type is only validated
            self.resolve_type_tag(inner, var_name)?;
            return Ok(IrType::Ptr);
        }

        if let Some(inner) = strip_compound(tag, "!array<") {
            let (elem_tag, len_str) = match split_top_level_comma(inner) {
                Some(parts) => parts,
                None => return_syntax_error!(
                    "Malformed array type \"{}\" for \"{}\": expected !array<TYPE,LENGTH>",
                    tag,
                    var_name
                ),
            };

            let elem = self.resolve_type_tag(elem_tag.trim(), var_name)?;

            let len: u64 = match len_str.trim().parse() {
                Ok(n) if n > 0 => n,
                _ => return_syntax_error!(
                    "Array length in \"{}\" for \"{}\" must be a positive integer",
                    tag,
                    var_name
                ),
            };

            return Ok(IrType::array(elem, len));
        }

        if let Some(rest) = tag.strip_prefix("!size:") {
            let (size_str, inner_tag) = match rest.split_once(':') {
                Some(parts) => parts,
                None => return_syntax_error!(
                    "Malformed size assertion \"{}\" for \"{}\": expected !size:N:TYPE",
                    tag,
                    var_name
                ),
            };

            let expected: u64 = match size_str.parse() {
                Ok(n) => n,
                Err(_) => return_syntax_error!(
                    "Size in \"{}\" for \"{}\" must be an integer",
                    tag,
                    var_name
                ),
            };

            let inner = self.resolve_type_tag(inner_tag, var_name)?;
            let actual = inner.alloc_size();

            if actual != expected {
                return_syntax_error!(
                    "Size assertion failed for \"{}\": {} occupies {} bytes, not {}",
                    var_name,
                    inner_tag,
                    actual,
                    expected
                );
            }

            return Ok(inner);
        }

        self.warnings
            .push(CompilerWarning::new(tag, WarningKind::UnknownTypeTag));

        Ok(IrType::I64)
    }
}

/// `!ptr<T>` -> `T` when the tag has the given prefix and a closing `>`.
fn strip_compound<'a>(tag: &'a str, prefix: &str) -> Option<&'a str> {
    tag.strip_prefix(prefix)?.strip_suffix('>')
}

/// Splits `T,N` at the first comma not nested inside `<...>` brackets.
fn split_top_level_comma(inner: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;

    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                return Some((&inner[..i], &inner[i + 1..]));
            }
            _ => {}
        }
    }

    None
}
