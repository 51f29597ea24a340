//! `architecture-lint [CLIENT_DIR]`
//!
//! Lints the client crate's layer boundaries. Without an argument the
//! client directory is resolved from this tool's manifest location
//! (`tools/architecture-lint/../../client`).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let client_dir = std::env::args_os()
        .nth(1)
        .map_or_else(default_client_dir, PathBuf::from);

    let outcome = if client_dir.join("src").is_dir() {
        architecture_lint::lint_client_sources(&client_dir).map_err(|err| err.to_string())
    } else {
        Err(format!(
            "{} has no src/ directory; pass the client crate directory",
            client_dir.display()
        ))
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        // A closed stderr leaves nowhere else to report to.
        Err(report) => match writeln!(io::stderr().lock(), "{report}") {
            Ok(()) | Err(_) => ExitCode::FAILURE,
        },
    }
}

fn default_client_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../client")
}
