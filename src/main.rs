use std::process::exit;

fn main() {
    exit(larkc::cli::start_cli());
}
