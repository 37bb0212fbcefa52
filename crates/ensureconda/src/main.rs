//! ensureconda CLI application
//!
//! Prints the path of a compatible conda/mamba executable on stdout,
//! installing one first when necessary.

// The resolved path goes to stdout and status lines to stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

use ensureconda::cli::{
    self, CliError, EXIT_FATAL, EXIT_FOUND, EXIT_NOT_FOUND, exit_code_for, render_error,
};
use ensureconda::tracing::init_tracing;

fn main() {
    // NOTE: tracing may not be initialized (or may be corrupted) during a panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    if let Err(e) = init_tracing(&cli.tracing_config()) {
        render_error(CliError::config(e.to_string()));
        std::process::exit(EXIT_FATAL);
    }

    let code = match cli::run(&cli) {
        Ok(Some(exe)) => {
            eprintln!("Found compatible executable");
            println!("{}", exe.display());
            EXIT_FOUND
        }
        Ok(None) => {
            eprintln!("Could not find compatible executable");
            EXIT_NOT_FOUND
        }
        Err(e) => {
            let code = exit_code_for(&e);
            render_error(e);
            code
        }
    };
    std::process::exit(code);
}
