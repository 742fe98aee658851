//! Confirmation of destructive operations.

use std::io::{self, BufRead, Write};

/// Asks the user to approve an action before it happens.
pub trait Confirm {
    /// Return `true` to proceed with the action described by `prompt`.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Approves everything. Used for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Prompts on a writer and reads a `y`/`yes` answer from a reader.
#[derive(Debug)]
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr and read from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Prompt on `output` and read answers from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt} [y/N] ").is_err() || self.output.flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if self.input.read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
