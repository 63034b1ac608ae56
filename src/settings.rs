//! Compiler-wide configuration constants and per-invocation settings.

pub const TARGET_TRIPLE: &str = "x86_64-unknown-linux-gnu";

/// Value of the `_VERSION` global every program can read.
pub const LANGUAGE_VERSION: i64 = 300;

pub const DEFAULT_OUTPUT_BASE: &str = "out";

const FORBIDDEN_OUTPUT_CHARS: &str = "/\\:*?\"<>|";

/// External tools the build pipeline shells out to.
pub const REQUIRED_TOOLS: [&str; 2] = ["opt", "clang++"];

#[derive(Debug, Clone)]
pub struct Settings {
    /// Base name for the emitted `.ll`, the optimized `.ll` and the binary
    pub output_base: String,

    /// Keep the intermediate `.ll` files after a successful build
    pub keep_temp_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_base: DEFAULT_OUTPUT_BASE.to_string(),
            keep_temp_files: false,
        }
    }
}

pub fn is_valid_output_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| FORBIDDEN_OUTPUT_CHARS.contains(c))
}
