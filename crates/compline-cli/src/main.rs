//! compline CLI binary entry point.

use std::process::ExitCode;

use compline_cli::error::{exit_code_from_error, report};

#[tokio::main]
async fn main() -> ExitCode {
    match compline_cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}
