//! Built-in command interpreter
//!
//! Small stand-in for an external interpreter. Verdicts are returned
//! synchronously; everything printed goes through the output channel, and
//! timed output waits in a queue until [`Interpreter::poll`] releases it.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::core::dispatch::{Interpreter, Verdict};
use crate::core::output::OutputEvent;

const DEFAULT_PROGRESS_SECS: f64 = 3.0;
const MAX_PROGRESS_SECS: f64 = 3600.0;
const PROGRESS_STEPS: u32 = 10;

const HELP: &[&str] = &[
    "Available commands:",
    "  help               show this list",
    "  echo ARGS          print ARGS",
    "  version            print the version",
    "  progress [SECONDS] run a timed task with a progress bar",
    "",
    "Shortcuts: Ctrl+L clear, Ctrl+M maximize, Ctrl+J close, Ctrl+` focus, Ctrl+Q quit",
];

/// Output channel between interpreter and controller
pub fn channel() -> (Sender<OutputEvent>, Receiver<OutputEvent>) {
    mpsc::channel()
}

pub struct BuiltinInterpreter {
    tx: Sender<OutputEvent>,
    prompt: String,
    /// Pending output ordered by due time
    scheduled: Vec<(Instant, OutputEvent)>,
}

impl BuiltinInterpreter {
    pub fn new(tx: Sender<OutputEvent>, prompt: impl Into<String>) -> Self {
        Self {
            tx,
            prompt: prompt.into(),
            scheduled: Vec::new(),
        }
    }

    /// Number of events still waiting for their due time
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    fn emit(&self, event: OutputEvent) {
        if self.tx.send(event).is_err() {
            debug!("Output receiver dropped");
        }
    }

    fn emit_prompt(&self) {
        self.emit(OutputEvent::text(self.prompt.clone()));
    }

    fn schedule(&mut self, due: Instant, event: OutputEvent) {
        let idx = self.scheduled.partition_point(|(at, _)| *at <= due);
        self.scheduled.insert(idx, (due, event));
    }

    fn run_progress(&mut self, arg: Option<&str>, now: Instant) {
        let secs = match arg.map(str::parse::<f64>) {
            None => DEFAULT_PROGRESS_SECS,
            Some(Ok(secs)) if secs.is_finite() && (0.0..=MAX_PROGRESS_SECS).contains(&secs) => {
                secs
            }
            _ => {
                self.emit(OutputEvent::text(format!(
                    "Error: invalid duration '{}'",
                    arg.unwrap_or_default()
                )));
                self.emit_prompt();
                return;
            }
        };

        self.emit(OutputEvent::text(format!("Working for {}s...", secs)).with_progress(0.0));
        let step = Duration::from_secs_f64(secs / PROGRESS_STEPS as f64);
        for i in 1..=PROGRESS_STEPS {
            let value = (i * 100 / PROGRESS_STEPS) as f32;
            self.schedule(now + step * i, OutputEvent::progress(value));
        }
        let done = now + step * PROGRESS_STEPS;
        self.schedule(done, OutputEvent::text("Done."));
        self.schedule(done, OutputEvent::text(self.prompt.clone()));
    }
}

impl Interpreter for BuiltinInterpreter {
    fn parse(&mut self, command: &str) -> Verdict {
        let line = command.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (line, ""),
        };

        match name {
            "help" => {
                for text in HELP {
                    self.emit(OutputEvent::text(*text));
                }
            }
            "echo" => self.emit(OutputEvent::text(rest)),
            "version" => self.emit(OutputEvent::text(format!(
                "termdock {}",
                env!("CARGO_PKG_VERSION")
            ))),
            "progress" => {
                let arg = rest.split_whitespace().next();
                self.run_progress(arg, Instant::now());
                info!("Started progress task");
                return Verdict::Recognized;
            }
            _ => return Verdict::Unrecognized,
        }

        self.emit_prompt();
        Verdict::Recognized
    }

    fn poll(&mut self, now: Instant) {
        let due = self.scheduled.partition_point(|(at, _)| *at <= now);
        for (_, event) in self.scheduled.drain(..due).collect::<Vec<_>>() {
            self.emit(event);
        }
    }
}
