//! # Compiler Error Handling
//!
//! One unified error type for every stage of the pipeline. The compiler is
//! all-or-nothing: any error aborts IR emission, the CLI prints the formatted
//! error plus the expression traceback and exits with code 1.
//!
//! Error categories:
//! - **Syntax**: malformed source or malformed special forms (wrong arity,
//!   ill-formed type tags, unknown heads)
//! - **Type**: init/assign/branch types incompatible beyond the implicit
//!   widening rules
//! - **Rule**: semantic violations (undefined names, constant writes,
//!   `break`/`continue` outside a loop)
//! - **File**: file system problems at the CLI boundary
//! - **Toolchain**: the external `opt`/`clang++` steps failed
//! - **Compiler**: internal bugs (not the user's fault)
//!
//! The `return_*_error!` macros below are the only way errors are created in
//! practice; all of them accept either a plain message or a format string
//! with arguments.

use crate::compiler::compiler_messages::traceback;
use colour::{e_dark_magenta, e_red_ln, e_yellow, e_yellow_ln};

#[derive(Debug, Clone)]
pub struct CompileError {
    pub msg: String,
    pub error_type: ErrorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Syntax,
    Type,
    Rule,
    File,
    Toolchain,
    Compiler,
}

impl CompileError {
    pub fn new(msg: impl Into<String>, error_type: ErrorType) -> CompileError {
        CompileError {
            msg: msg.into(),
            error_type,
        }
    }

    pub fn file_error(msg: impl Into<String>) -> CompileError {
        CompileError::new(msg, ErrorType::File)
    }

    pub fn toolchain_error(msg: impl Into<String>) -> CompileError {
        CompileError::new(msg, ErrorType::Toolchain)
    }

    /// Internal bug, not caused by user code.
    pub fn compiler_error(msg: impl Into<String>) -> CompileError {
        CompileError::new(msg, ErrorType::Compiler)
    }
}

pub fn error_type_to_str(e_type: ErrorType) -> &'static str {
    match e_type {
        ErrorType::Syntax => "Syntax Error",
        ErrorType::Type => "Type Error",
        ErrorType::Rule => "Language Rule Violation",
        ErrorType::File => "File Error",
        ErrorType::Toolchain => "Toolchain Error",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Returns a new CompileError for syntax violations.
///
/// Usage: `return_syntax_error!("Unclosed '{}'", bracket)`;
#[macro_export]
macro_rules! return_syntax_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompileError::new(
            format!($($arg)*),
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Syntax,
        ))
    };
}

/// Returns a new CompileError for type system violations.
///
/// Usage: `return_type_error!("Cannot assign {} to {}", found, expected)`;
#[macro_export]
macro_rules! return_type_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompileError::new(
            format!($($arg)*),
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Type,
        ))
    };
}

/// Returns a new CompileError for semantic rule violations such as undefined
/// variables, constant writes and loop-context misuse.
///
/// Usage: `return_rule_error!("Variable \"{}\" is not defined", name)`;
#[macro_export]
macro_rules! return_rule_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompileError::new(
            format!($($arg)*),
            $crate::compiler::compiler_messages::compiler_errors::ErrorType::Rule,
        ))
    };
}

/// Returns a new CompileError for internal compiler bugs.
#[macro_export]
macro_rules! return_compiler_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompileError::compiler_error(
            format!($($arg)*),
        ))
    };
}

/// Returns a new CompileError for file system problems.
#[macro_export]
macro_rules! return_file_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompileError::file_error(
            format!($($arg)*),
        ))
    };
}

/// Returns a new CompileError for failures of the external opt/clang++ steps.
#[macro_export]
macro_rules! return_toolchain_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_messages::compiler_errors::CompileError::toolchain_error(
            format!($($arg)*),
        ))
    };
}

pub fn print_formatted_error(e: &CompileError) {
    match e.error_type {
        ErrorType::Compiler => {
            e_yellow!("COMPILER BUG - ");
            e_yellow_ln!("compiler developer skill issue (not your fault)");
        }
        _ => {
            e_dark_magenta!("{}: ", error_type_to_str(e.error_type));
        }
    }

    e_red_ln!("{}", e.msg);

    // The last few expressions the codegen walked into, oldest first
    traceback::print_traceback();
}
