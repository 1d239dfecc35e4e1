//! Terminal front end for a chat session.
//!
//! Reply text goes to stdout as it streams; errors and notices go to
//! stderr so the reply can be piped.

use std::io::Write;

use color_eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::SessionError;
use crate::models::Message;
use crate::session::{ChatSession, TurnReport};

/// Line that ends interactive mode.
pub const QUIT_COMMAND: &str = "/quit";

/// Exit status after Ctrl-C at the prompt.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Text the reply at `reply_index` gained since `printed` bytes were shown.
///
/// A reply that shrank (discarded on abort) yields nothing.
pub fn unseen_reply<'a>(messages: &'a [Message], reply_index: usize, printed: usize) -> Option<&'a str> {
    let reply = messages.get(reply_index).filter(|m| m.is_assistant())?;
    reply.content.get(printed..).filter(|rest| !rest.is_empty())
}

fn print_unseen<W: Write>(
    messages: &[Message],
    reply_index: usize,
    printed: &mut usize,
    out: &mut W,
) -> std::io::Result<()> {
    if let Some(rest) = unseen_reply(messages, reply_index, *printed) {
        out.write_all(rest.as_bytes())?;
        out.flush()?;
        *printed += rest.len();
    }
    Ok(())
}

/// Run one turn, echoing the reply to `out` as it grows.
///
/// Ctrl-C cancels the turn. Returns `Ok(None)` when the turn failed; the
/// failure has already been reported on stderr.
pub async fn run_turn<W: Write>(
    session: &ChatSession,
    prompt: &str,
    out: &mut W,
) -> Result<Option<TurnReport>> {
    // The user message lands at the current end, its reply right after.
    let reply_index = session.transcript().len() + 1;
    let mut printed = 0;
    let mut updates = session.subscribe_transcript();
    updates.borrow_and_update();

    let turn = session.send_message(prompt);
    tokio::pin!(turn);
    let mut listening = true;

    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            signal = tokio::signal::ctrl_c(), if listening => match signal {
                Ok(()) => session.cancel(),
                Err(e) => {
                    tracing::warn!("Unable to listen for Ctrl-C: {}", e);
                    listening = false;
                }
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    break (&mut turn).await;
                }
                let messages = updates.borrow_and_update().clone();
                print_unseen(&messages, reply_index, &mut printed, out)?;
            }
        }
    };

    print_unseen(&session.messages(), reply_index, &mut printed, out)?;

    match result {
        Ok(report) => {
            if printed > 0 {
                writeln!(out)?;
            }
            if report.is_aborted() {
                eprintln!("(cancelled)");
            }
            Ok(Some(report))
        }
        Err(SessionError::Transport(err)) => {
            if printed > 0 {
                writeln!(out)?;
            }
            eprintln!("Error: {}", err.user_message());
            tracing::debug!("Turn failed with {}: {}", err.error_code(), err);
            Ok(None)
        }
        Err(err) => {
            eprintln!("{}", err);
            Ok(None)
        }
    }
}

/// Send a single prompt. Returns false if the turn failed.
pub async fn run_prompt(session: &ChatSession, prompt: &str) -> Result<bool> {
    let mut stdout = std::io::stdout();
    Ok(run_turn(session, prompt, &mut stdout).await?.is_some())
}

/// Read prompts from stdin until EOF or [`QUIT_COMMAND`].
///
/// Ctrl-C at the prompt exits; during a reply it cancels the reply.
pub async fn run_interactive(session: &ChatSession) -> Result<()> {
    if let Some(greeting) = session.transcript().last() {
        println!("{}", greeting.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    let mut listening = true;

    loop {
        eprint!("> ");
        let next = tokio::select! {
            next = lines.next_line() => next?,
            signal = tokio::signal::ctrl_c(), if listening => match signal {
                Ok(()) => std::process::exit(INTERRUPTED_EXIT_CODE),
                Err(e) => {
                    tracing::warn!("Unable to listen for Ctrl-C: {}", e);
                    listening = false;
                    continue;
                }
            },
        };
        let Some(line) = next else {
            break;
        };
        let line = line.trim();
        if line == QUIT_COMMAND {
            break;
        }
        if line.is_empty() {
            continue;
        }
        run_turn(session, line, &mut stdout).await?;
    }

    Ok(())
}

/// Dispatch to one-shot or interactive mode. Returns false if a one-shot
/// turn failed.
pub async fn run_chat(session: &ChatSession, prompt: Option<String>) -> Result<bool> {
    match prompt {
        Some(prompt) => run_prompt(session, &prompt).await,
        None => {
            run_interactive(session).await?;
            Ok(true)
        }
    }
}
