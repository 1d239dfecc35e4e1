//! Command-line argument parsing for the chatstream CLI.

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: chatstream [OPTIONS] [PROMPT]...

Streams a chat reply to stdout. With no prompt, reads one message per
line from stdin until EOF or /quit. Ctrl-C cancels the reply in flight.

Options:
  -h, --help       Print this help
  -V, --version    Print version

Environment:
  CHATSTREAM_URL               Backend base URL
  CHATSTREAM_CHAT_PATH         Chat endpoint path
  CHATSTREAM_API_KEY           Bearer key sent with each request
  CHATSTREAM_CONNECT_TIMEOUT   Connect timeout in seconds
  CHATSTREAM_NO_GREETING       Start without the assistant greeting
  CHATSTREAM_DISCARD_ON_ABORT  Drop partial replies on Ctrl-C
  RUST_LOG                     Log filter (logs go to stderr)";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Send one prompt and exit
    Prompt(String),
    /// Read prompts from stdin (default)
    Interactive,
}

/// Parse command-line arguments and return the appropriate command.
///
/// Flags win over positional words; the remaining words are joined with
/// spaces to form the prompt.
///
/// # Examples
///
/// ```
/// use chatstream::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["chatstream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut words = Vec::new();
    for arg in args.skip(1) {
        // Skip the program name
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            _ => words.push(arg),
        }
    }

    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        CliCommand::Interactive
    } else {
        CliCommand::Prompt(prompt)
    }
}
