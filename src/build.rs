//! Build pipeline
//!
//! Drives one compilation end to end: emit `<out>.ll`, optimize it with
//! `opt -O3` into `<out>-opt.ll`, link with `clang++` into the final binary,
//! then clean up the intermediates unless the user asked to keep them.

use crate::compiler::codegen::generate::Codegen;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::compiler_messages::compiler_warnings::CompilerWarning;
use crate::settings::{Settings, REQUIRED_TOOLS};
use crate::{return_file_error, return_toolchain_error, timer_log};
use colour::grey_ln;
use std::path::Path;
use std::process::Command;
use std::time::Instant;
use std::fs;

/// Compiles `program` to textual IR without touching the external toolchain.
/// This is the whole compiler as a library call; the CLI and the tests both
/// go through here.
pub fn compile_to_ir(program: &str) -> Result<(String, Vec<CompilerWarning>), CompileError> {
    let (module, warnings) = Codegen::compile(program)?;
    Ok((module.to_string(), warnings))
}

/// Full pipeline: IR emission, optimization, native linking, cleanup.
pub fn build_program(
    program: &str,
    settings: &Settings,
) -> Result<Vec<CompilerWarning>, CompileError> {
    check_required_tools()?;

    let _timer = Instant::now();

    let (ir, warnings) = compile_to_ir(program)?;

    timer_log!(_timer, "IR generated in: ");

    let ll_file = format!("{}.ll", settings.output_base);
    let opt_ll_file = format!("{}-opt.ll", settings.output_base);
    let bin_file = settings.output_base.clone();

    if let Err(e) = fs::write(&ll_file, &ir) {
        return_file_error!("Cannot write IR to \"{}\": {}", ll_file, e);
    }

    grey_ln!("Optimizing code...");
    run_tool(
        "opt",
        &[&ll_file, "-O3", "-S", "-o", &opt_ll_file],
        "Code optimization failed",
    )?;

    if !file_exists_nonempty(&opt_ll_file) {
        return_toolchain_error!("Optimized IR code not created");
    }

    grey_ln!("Compiling optimized code...");
    run_tool(
        "clang++",
        &["-O3", &opt_ll_file, "-o", &bin_file],
        "Binary compilation failed",
    )?;

    if !file_exists_nonempty(&bin_file) {
        return_toolchain_error!("Binary file \"{}\" not created", bin_file);
    }

    if settings.keep_temp_files {
        grey_ln!("IR code saved: {ll_file}");
    } else {
        cleanup_temp_files(settings);
    }

    Ok(warnings)
}

fn check_required_tools() -> Result<(), CompileError> {
    for tool in REQUIRED_TOOLS {
        if !is_tool_available(tool) {
            return_toolchain_error!(
                "Required utility \"{}\" not found. Please install it.",
                tool
            );
        }
    }
    Ok(())
}

fn is_tool_available(tool: &str) -> bool {
    let probe = if cfg!(windows) {
        Command::new("where").arg(tool).output()
    } else {
        Command::new("sh")
            .args(["-c", &format!("command -v {tool}")])
            .output()
    };

    matches!(probe, Ok(output) if output.status.success())
}

fn run_tool(tool: &str, args: &[&str], failure_msg: &str) -> Result<(), CompileError> {
    let output = match Command::new(tool).args(args).output() {
        Ok(output) => output,
        Err(e) => return_toolchain_error!("{}: could not run {}: {}", failure_msg, tool, e),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return_toolchain_error!("{}:\n{}", failure_msg, stderr.trim_end());
    }

    Ok(())
}

fn file_exists_nonempty(path: &str) -> bool {
    fs::metadata(Path::new(path)).map(|m| m.len() > 0).unwrap_or(false)
}

fn cleanup_temp_files(settings: &Settings) {
    for suffix in [".ll", "-opt.ll"] {
        let path = format!("{}{}", settings.output_base, suffix);
        if Path::new(&path).exists() && fs::remove_file(&path).is_err() {
            grey_ln!("Could not remove file \"{path}\"");
        }
    }
}
