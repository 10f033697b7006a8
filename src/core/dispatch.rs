//! Command dispatch
//!
//! Hands a submitted command line to the interpreter and renders the
//! synchronous verdict. Anything the interpreter prints afterwards arrives
//! separately as output events.

use std::time::Instant;

use tracing::{debug, info};

use super::buffer::CommandBuffer;
use super::term::Emulator;

/// Synchronous answer to a submitted command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Recognized,
    Unrecognized,
}

/// External command interpreter
pub trait Interpreter {
    /// Decide whether `command` is known. A recognized command owns all
    /// further output, including the next prompt.
    fn parse(&mut self, command: &str) -> Verdict;

    /// Release any output scheduled for `now` or earlier
    fn poll(&mut self, _now: Instant) {}
}

/// Message written for an unknown command
pub fn not_found_message(command: &str, prompt: &str) -> String {
    format!(
        "Command '\x1b[3m{}\x1b[23m' not found.\n\n{}",
        command.trim(),
        prompt
    )
}

pub struct CommandDispatcher<I> {
    interpreter: I,
    prompt: String,
}

impl<I: Interpreter> CommandDispatcher<I> {
    pub fn new(interpreter: I, prompt: impl Into<String>) -> Self {
        Self {
            interpreter,
            prompt: prompt.into(),
        }
    }

    #[cfg(test)]
    pub fn interpreter(&self) -> &I {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut I {
        &mut self.interpreter
    }

    /// Submit the buffer: newline, clear, ask the interpreter, and print
    /// either nothing (recognized), a not-found message, or a bare prompt.
    pub fn submit(&mut self, buffer: &mut CommandBuffer, emulator: &mut dyn Emulator) -> Verdict {
        emulator.write("\n");

        let command = buffer.take();
        let verdict = self.interpreter.parse(&command);

        match verdict {
            Verdict::Recognized => {
                info!("Dispatched command: {:?}", command);
            }
            Verdict::Unrecognized if command.is_empty() => {
                emulator.write(&self.prompt);
            }
            Verdict::Unrecognized => {
                debug!("Unrecognized command: {:?}", command);
                emulator.write(&not_found_message(&command, &self.prompt));
            }
        }

        verdict
    }
}
