use std::process::ExitCode;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    ap_cli::run(ap_cli::Cli::parse()).await
}
