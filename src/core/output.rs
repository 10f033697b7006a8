//! Output rendering
//!
//! Writes interpreter output into the emulator without clobbering a command
//! the user is still typing. State is always re-derived from the live line,
//! never from a snapshot taken at submit time, because output and keystrokes
//! interleave freely.

use super::term::Emulator;

/// Message from the interpreter
#[derive(Clone, Debug, PartialEq)]
pub struct OutputEvent {
    pub text: String,
    /// Completion percentage, 0-100
    pub progress: Option<f32>,
}

impl OutputEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            progress: None,
        }
    }

    /// Event carrying only a progress update
    pub fn progress(value: f32) -> Self {
        Self {
            text: String::new(),
            progress: Some(value),
        }
    }

    pub fn with_progress(mut self, value: f32) -> Self {
        self.progress = Some(value);
        self
    }

    fn is_progress_only(&self) -> bool {
        self.text.is_empty() && self.progress.is_some()
    }
}

/// Progress indicator state (0-100)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressIndicator {
    value: Option<f32>,
}

impl ProgressIndicator {
    /// Update the value. NaN is ignored, everything else is clamped.
    pub fn set(&mut self, value: f32) {
        if !value.is_nan() {
            self.value = Some(value.clamp(0.0, 100.0));
        }
    }

    pub fn value(&self) -> Option<f32> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Colors used to tag output lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputStyle {
    pub text: (u8, u8, u8),
    pub error: (u8, u8, u8),
    pub warning: (u8, u8, u8),
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            text: (220, 220, 220),
            error: (240, 80, 80),
            warning: (230, 200, 60),
        }
    }
}

impl OutputStyle {
    /// Wrap text in a foreground color picked from its leading word
    pub fn colorize(&self, text: &str) -> String {
        let lower = text.trim_start().to_ascii_lowercase();
        let (r, g, b) = if lower.starts_with("error") {
            self.error
        } else if lower.starts_with("warning") || lower.starts_with("warn:") {
            self.warning
        } else {
            self.text
        };
        format!("\x1b[38;2;{};{};{}m{}\x1b[39m", r, g, b, text)
    }
}

/// What a single event turned into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rendered {
    Line,
    Prompt,
    ProgressOnly,
}

pub struct OutputRenderer {
    prompt: String,
    style: OutputStyle,
}

impl OutputRenderer {
    pub fn new(prompt: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            prompt: prompt.into(),
            style,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Does the line hold typed text after its prompt?
    ///
    /// Emulators report lines with trailing blanks trimmed, so the marker is
    /// matched without its trailing whitespace. A line without a marker
    /// counts as pending when it holds anything at all.
    pub fn has_pending_input(&self, line: &str) -> bool {
        let marker = self.prompt.trim_end();
        let after = match line.find(marker) {
            Some(idx) if !marker.is_empty() => &line[idx + marker.len()..],
            _ => line,
        };
        !after.trim().is_empty()
    }

    pub fn render(
        &self,
        event: &OutputEvent,
        emulator: &mut dyn Emulator,
        progress: &mut ProgressIndicator,
    ) -> Rendered {
        if let Some(value) = event.progress {
            progress.set(value);
        }
        if event.is_progress_only() {
            return Rendered::ProgressOnly;
        }

        let line = emulator.current_line();
        if self.has_pending_input(&line) {
            emulator.write("\n");
        } else {
            emulator.write("\x1b[2K\r");
        }

        let rendered = if event.text == self.prompt {
            emulator.write(&self.prompt);
            Rendered::Prompt
        } else {
            emulator.write_line(&self.style.colorize(&event.text));
            Rendered::Line
        };

        emulator.scroll_to_bottom();
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::{TermEmulator, DEFAULT_SCROLLBACK};

    fn setup() -> (OutputRenderer, TermEmulator, ProgressIndicator) {
        let renderer = OutputRenderer::new("$ ", OutputStyle::default());
        let emu = TermEmulator::new(16, DEFAULT_SCROLLBACK);
        (renderer, emu, ProgressIndicator::default())
    }

    #[test]
    fn test_pending_input_detection() {
        let (renderer, _, _) = setup();
        assert!(!renderer.has_pending_input(""));
        assert!(!renderer.has_pending_input("$"));
        assert!(!renderer.has_pending_input("$    "));
        assert!(renderer.has_pending_input("$ ls -la"));
        assert!(renderer.has_pending_input("partial output"));
    }

    #[test]
    fn test_output_replaces_idle_prompt_line() {
        let (renderer, mut emu, mut progress) = setup();
        emu.write("$ ");

        let rendered = renderer.render(&OutputEvent::text("hello"), &mut emu, &mut progress);
        assert_eq!(rendered, Rendered::Line);
        assert_eq!(emu.lines(), vec!["hello", ""]);

        renderer.render(&OutputEvent::text("$ "), &mut emu, &mut progress);
        assert_eq!(emu.lines(), vec!["hello", "$"]);
        assert_eq!(emu.state.cursor_col, 2);
    }

    #[test]
    fn test_output_preserves_typed_command() {
        let (renderer, mut emu, mut progress) = setup();
        emu.write("$ ls -la");

        renderer.render(&OutputEvent::text("build finished"), &mut emu, &mut progress);
        assert_eq!(emu.lines(), vec!["$ ls -la", "build finished", ""]);
    }

    #[test]
    fn test_progress_only_event_writes_nothing() {
        let (renderer, mut emu, mut progress) = setup();
        emu.write("$ ");

        let rendered = renderer.render(&OutputEvent::progress(42.0), &mut emu, &mut progress);
        assert_eq!(rendered, Rendered::ProgressOnly);
        assert_eq!(emu.lines(), vec!["$"]);
        assert_eq!(progress.value(), Some(42.0));
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut progress = ProgressIndicator::default();
        progress.set(150.0);
        assert_eq!(progress.value(), Some(100.0));
        progress.set(-3.0);
        assert_eq!(progress.value(), Some(0.0));
        progress.set(f32::NAN);
        assert_eq!(progress.value(), Some(0.0));
    }

    #[test]
    fn test_colorize_tags_errors() {
        let style = OutputStyle::default();
        assert!(style.colorize("Error: boom").starts_with("\x1b[38;2;240;80;80m"));
        assert!(style.colorize("fine").starts_with("\x1b[38;2;220;220;220m"));
        assert!(style.colorize("fine").ends_with("fine\x1b[39m"));
    }
}
