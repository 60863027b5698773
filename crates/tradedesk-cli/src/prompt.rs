// crates/tradedesk-cli/src/prompt.rs
// ============================================================================
// Module: Secret Prompt
// Description: Masked terminal prompt for password-bearing arguments.
// Purpose: Collect omitted secrets interactively without echoing them.
// Dependencies: crossterm, tradedesk-core
// ============================================================================

//! ## Overview
//! A secret argument may name a trigger argument. When the trigger is
//! supplied and the secret is not, [`fill_secrets`] asks a [`SecretPrompt`]
//! for the value before validation runs. [`TerminalPrompt`] reads keystrokes
//! in raw mode so nothing is echoed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::IsTerminal;
use std::io::Write;

use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use thiserror::Error;
use tradedesk_core::CommandDescriptor;
use tradedesk_core::ErrorKind;
use tradedesk_core::Failure;
use tradedesk_core::RawArguments;

use crate::t;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Secret prompt failures.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Stdin is not an interactive terminal.
    #[error("{0}")]
    NotATerminal(String),
    /// The user cancelled the prompt.
    #[error("{0}")]
    Cancelled(String),
    /// Terminal I/O failed.
    #[error("{0}")]
    Io(String),
}

impl From<PromptError> for Failure {
    fn from(error: PromptError) -> Self {
        Self::new(ErrorKind::LocalIo, error.to_string())
    }
}

// ============================================================================
// SECTION: Prompt Trait
// ============================================================================

/// Source of interactively supplied secrets.
pub trait SecretPrompt {
    /// Reads one secret for the argument shown as `label`.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when no value can be read.
    fn read_secret(&self, label: &str) -> Result<String, PromptError>;
}

/// Fills omitted secrets whose trigger argument is present.
///
/// # Errors
///
/// Returns [`PromptError`] when a required prompt fails.
pub fn fill_secrets(
    descriptor: &CommandDescriptor,
    raw: &mut RawArguments,
    prompt: &dyn SecretPrompt,
) -> Result<(), PromptError> {
    for spec in descriptor.arguments.iter().filter(|spec| spec.secret) {
        let Some(trigger) = &spec.prompt_when else {
            continue;
        };
        if raw.contains(&spec.name) || !raw.contains(trigger) {
            continue;
        }
        let value = prompt.read_secret(&spec.display_name())?;
        raw.insert(spec.name.clone(), vec![value]);
    }
    Ok(())
}

// ============================================================================
// SECTION: Terminal Prompt
// ============================================================================

/// Masked prompt on the controlling terminal; the label goes to stderr.
pub struct TerminalPrompt;

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    /// Switches the terminal to raw mode.
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl SecretPrompt for TerminalPrompt {
    fn read_secret(&self, label: &str) -> Result<String, PromptError> {
        if !io::stdin().is_terminal() {
            return Err(PromptError::NotATerminal(t!("prompt.not_terminal", argument = label)));
        }
        let io_error =
            |err: io::Error| PromptError::Io(t!("prompt.failed", argument = label, error = err));
        let mut stderr = io::stderr();
        write!(stderr, "{}", t!("prompt.secret", argument = label)).map_err(io_error)?;
        stderr.flush().map_err(io_error)?;

        let mut secret = String::new();
        {
            let _guard = RawModeGuard::enable().map_err(io_error)?;
            loop {
                let Event::Key(key) = event::read().map_err(io_error)? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Enter => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        let _ = writeln!(stderr);
                        return Err(PromptError::Cancelled(t!(
                            "prompt.cancelled",
                            argument = label
                        )));
                    }
                    KeyCode::Esc => {
                        let _ = writeln!(stderr);
                        return Err(PromptError::Cancelled(t!(
                            "prompt.cancelled",
                            argument = label
                        )));
                    }
                    KeyCode::Char(ch) => secret.push(ch),
                    KeyCode::Backspace => {
                        secret.pop();
                    }
                    _ => {}
                }
            }
        }
        writeln!(stderr).map_err(io_error)?;
        Ok(secret)
    }
}
