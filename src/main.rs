use chatstream::cli::{parse_args, run_chat, run_cli_command, CliCommand};
use chatstream::config::ChatConfig;
use chatstream::session::ChatSession;

use color_eyre::Result;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout carries only reply text.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let command = parse_args(std::env::args());
    if let Some(result) = run_cli_command(&command) {
        return result;
    }

    color_eyre::install()?;
    init_tracing();

    let prompt = match command {
        CliCommand::Prompt(prompt) => Some(prompt),
        _ => None,
    };

    let config = ChatConfig::from_env();
    tracing::debug!("Using chat endpoint {}", config.endpoint());
    let session = ChatSession::new(&config)?;

    if !run_chat(&session, prompt).await? {
        std::process::exit(1);
    }
    Ok(())
}
