//! Pixology - command-line front end for editing and previewing pixel-art projects

use std::process::ExitCode;

use pixology::cli;

fn main() -> ExitCode {
    cli::run()
}
