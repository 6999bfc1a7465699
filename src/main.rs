use std::process::ExitCode;

use clap::Parser;

use crossbook::adapter::inbound::cli::{self, command::Cli, output};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    // One process-wide rustls provider for both websocket and HTTP clients.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    match cli::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
