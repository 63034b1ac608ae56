//! Command line front-end
//!
//! Hand-rolled option parsing: `-e/--expression`, `-f/--file`, `-o/--output`
//! (with `--output=NAME` syntax), `-l/--lint`, `-k/--keep`, `-h/--help` and
//! `-v/--version`. Exit codes: 0 success, 1 failure, 2 lint warnings only.

use crate::build;
use crate::compiler::compiler_messages::compiler_errors::print_formatted_error;
use crate::compiler::compiler_messages::compiler_warnings::print_formatted_warning;
use crate::compiler::linter::Linter;
use crate::compiler::parsers::sexpr;
use crate::settings::{self, Settings};
use colour::{e_red_ln, green_ln_bold, grey_ln, red_ln, yellow_ln};
use std::path::PathBuf;
use std::time::Instant;
use std::{env, fs};

enum Command {
    Help,
    Version,
    CompileExpression(String),
    CompileFile(PathBuf),
    Lint(PathBuf),
}

pub fn start_cli() -> i32 {
    let compiler_args: Vec<String> = env::args().collect();

    let (command, settings) = match parse_args(&compiler_args[1..]) {
        Ok(parsed) => parsed,
        Err(e) => {
            red_ln!("{}", e);
            print_help();
            return 1;
        }
    };

    match command {
        Command::Help => {
            print_help();
            0
        }

        Command::Version => {
            println!("larkc {}", env!("CARGO_PKG_VERSION"));
            0
        }

        Command::Lint(path) => run_lint(&path),

        Command::CompileExpression(program) => run_build(&program, &settings),

        Command::CompileFile(path) => {
            let program = match read_program_file(&path) {
                Ok(program) => program,
                Err(e) => {
                    e_red_ln!("{}", e);
                    return 1;
                }
            };
            run_build(&program, &settings)
        }
    }
}

fn run_build(program: &str, settings: &Settings) -> i32 {
    let start = Instant::now();

    match build::build_program(program, settings) {
        Ok(warnings) => {
            for warning in &warnings {
                print_formatted_warning(warning);
            }

            let duration = start.elapsed();
            grey_ln!("------------------------------------");
            print!("Compiled in: ");
            green_ln_bold!("{:?}", duration);
            green_ln_bold!("Successfully compiled to {}", settings.output_base);
            0
        }
        Err(e) => {
            print_formatted_error(&e);
            1
        }
    }
}

fn run_lint(path: &PathBuf) -> i32 {
    let program = match read_program_file(path) {
        Ok(program) => program,
        Err(e) => {
            e_red_ln!("{}", e);
            return 1;
        }
    };

    let mut linter = Linter::new();

    let syntax_errors = linter.check_syntax(&program);
    if !syntax_errors.is_empty() {
        e_red_ln!("Syntax errors in {}:", path.display());
        for error in syntax_errors {
            e_red_ln!("  {}", error);
        }
        return 1;
    }

    let ast = match sexpr::parse(&format!("[scope {program}]")) {
        Ok(ast) => ast,
        Err(e) => {
            e_red_ln!("Linting failed: {}", e.msg);
            return 1;
        }
    };

    let issues = linter.lint(&ast);
    if issues.is_empty() {
        println!("No lint issues found in {}", path.display());
        return 0;
    }

    yellow_ln!("Lint issues in {}:", path.display());
    for issue in issues {
        yellow_ln!("  {}", issue);
    }

    // Warnings only; distinct from a hard failure
    2
}

fn read_program_file(path: &PathBuf) -> Result<String, String> {
    if !path.exists() {
        return Err(format!("File \"{}\" not found", path.display()));
    }

    let program = fs::read_to_string(path)
        .map_err(|e| format!("Cannot open file \"{}\": {}", path.display(), e))?;

    if program.trim().is_empty() {
        return Err(format!("File \"{}\" is empty", path.display()));
    }

    Ok(program)
}

fn parse_args(args: &[String]) -> Result<(Command, Settings), String> {
    let mut settings = Settings::default();
    let mut command: Option<Command> = None;
    let mut output_name: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let token = args[i].as_str();

        // --option=value syntax
        let (token, inline_value) = match token.split_once('=') {
            Some((opt, value)) if opt.starts_with("--") => (opt, Some(value.to_string())),
            _ => (token, None),
        };

        let mut take_value = |i: &mut usize| -> Result<String, String> {
            if let Some(value) = &inline_value {
                return Ok(value.clone());
            }
            *i += 1;
            match args.get(*i) {
                Some(value) => Ok(value.clone()),
                None => Err(format!("Missing argument for: {token}")),
            }
        };

        match token {
            "-h" | "--help" => {
                return Ok((Command::Help, settings));
            }
            "-v" | "--version" => {
                return Ok((Command::Version, settings));
            }
            "-e" | "--expression" => {
                let expr = take_value(&mut i)?;
                if expr.is_empty() {
                    return Err("Empty expression".to_string());
                }
                set_input(&mut command, Command::CompileExpression(expr))?;
            }
            "-f" | "--file" => {
                let path = take_value(&mut i)?;
                set_input(&mut command, Command::CompileFile(PathBuf::from(path)))?;
            }
            "-l" | "--lint" => {
                let path = take_value(&mut i)?;
                set_input(&mut command, Command::Lint(PathBuf::from(path)))?;
            }
            "-o" | "--output" => {
                output_name = Some(take_value(&mut i)?);
            }
            "-k" | "--keep" => {
                settings.keep_temp_files = true;
            }
            _ => {
                return Err(format!("Unknown option: {token}"));
            }
        }

        i += 1;
    }

    if let Some(name) = output_name {
        if !settings::is_valid_output_name(&name) {
            return Err(format!("Invalid output name: {name}"));
        }
        settings.output_base = name;
    }

    match command {
        Some(command) => Ok((command, settings)),
        None => Err("No input specified (use -e or -f)".to_string()),
    }
}

fn set_input(slot: &mut Option<Command>, command: Command) -> Result<(), String> {
    if slot.is_some() {
        return Err("Options -e, -f and -l are mutually exclusive".to_string());
    }
    *slot = Some(command);
    Ok(())
}

fn print_help() {
    grey_ln!("------------------------------------");
    green_ln_bold!("The Lark compiler");
    println!("Usage: larkc [options]");
    green_ln_bold!("\nOptions:");
    println!("  -h, --help                Print this help message");
    println!("  -v, --version             Print the compiler version");
    println!("  -e, --expression <expr>   Expression to compile");
    println!("  -f, --file <file>         File to compile");
    println!("  -l, --lint <file>         File to lint");
    println!("  -o, --output <name>       Output binary name (default: out)");
    println!("  -k, --keep                Keep temporary files");
}
