//! CLI module for chatstream.
//!
//! - Argument parsing
//! - Version and help display
//! - The streaming chat front end
//!
//! # Usage
//!
//! ```ignore
//! use chatstream::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args());
//! if let Some(result) = run_cli_command(&command) {
//!     std::process::exit(if result.is_ok() { 0 } else { 1 });
//! }
//! // Prompt or Interactive: start a chat session
//! ```

pub mod args;
pub mod chat;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use chat::{run_chat, run_interactive, run_prompt, run_turn};
pub use version::{handle_version_command, VERSION};

use color_eyre::Result;

/// Run an informational CLI command if applicable.
///
/// # Returns
///
/// * `None` - for `Prompt` and `Interactive`, which need a chat session
/// * `Some(Ok(()))` - if the command executed successfully
///
/// # Note
///
/// The `Version` command never returns as it calls `std::process::exit(0)`.
pub fn run_cli_command(command: &CliCommand) -> Option<Result<()>> {
    match command {
        CliCommand::Version => {
            handle_version_command();
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Some(Ok(()))
        }
        CliCommand::Prompt(_) | CliCommand::Interactive => None,
    }
}
