//! Session controller
//!
//! Owns the command buffer, the panel layout and the emulator handle, and
//! routes every host event through them. Key strokes go through the
//! shortcut router first, then the input classifier; interpreter output
//! arrives on its own channel and is drained on each tick.
//!
//! Every handler is a no-op while no emulator is mounted.

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use tracing::{debug, info};
use unicode_width::UnicodeWidthChar;

use crate::config::Config;
use crate::core::buffer::CommandBuffer;
use crate::core::dispatch::{CommandDispatcher, Interpreter};
use crate::core::input::{classify, KeyAction, KeyStroke};
use crate::core::layout::{BoundsError, PanelBounds, PanelLayout};
use crate::core::output::{OutputEvent, OutputRenderer, OutputStyle, ProgressIndicator, Rendered};
use crate::core::term::{Emulator, Viewport};
use crate::ui::clipboard::ClipboardBridge;
use crate::ui::keybinds::{KeybindRouter, Shortcut};
use crate::ui::keymapper::KeyMapper;

/// Settings the controller is built from
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub prompt: String,
    pub greeting: Option<String>,
    pub bounds: PanelBounds,
    pub refit_interval: Duration,
    pub keybinds: bool,
    pub style: OutputStyle,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Result<Self, BoundsError> {
        Ok(Self {
            prompt: config.prompt.clone(),
            greeting: config.greeting.clone(),
            bounds: config.panel.bounds()?,
            refit_interval: config.panel.refit_interval(),
            keybinds: config.keybinds.enabled,
            style: config.get_color_scheme().output_style(),
        })
    }
}

/// Periodic re-fit, in case a resize notification was missed
#[derive(Clone, Debug)]
struct RefitTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl RefitTimer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    fn start(&mut self, now: Instant) {
        self.last = Some(now);
    }

    fn stop(&mut self) {
        self.last = None;
    }

    /// True once per elapsed interval
    fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) >= self.interval => {
                self.last = Some(now);
                true
            }
            _ => false,
        }
    }
}

/// Write `text`, recording the column each char starts at
fn echo<E: Emulator>(emulator: &mut E, cols: &mut Vec<u16>, text: &str) {
    let mut utf8 = [0; 4];
    for ch in text.chars() {
        cols.push(emulator.cursor_col());
        emulator.write(ch.encode_utf8(&mut utf8));
    }
}

/// Columns to blank when `ch` is erased. Falls back to the char width when
/// the echo start is unknown or the cursor has wrapped past it.
fn erase_width(ch: char, start: Option<u16>, cursor: u16) -> usize {
    match start {
        Some(start) if start < cursor => (cursor - start) as usize,
        _ => ch.width().unwrap_or(0),
    }
}

pub struct SessionController<E, I> {
    emulator: Option<E>,
    dispatcher: CommandDispatcher<I>,
    buffer: CommandBuffer,
    /// Column where each buffered char's echo started
    echo_cols: Vec<u16>,
    layout: PanelLayout,
    output_rx: Receiver<OutputEvent>,
    renderer: OutputRenderer,
    progress: ProgressIndicator,
    keybinds: KeybindRouter,
    clipboard: ClipboardBridge,
    refit_timer: RefitTimer,
    greeting: Option<String>,
    host_cols: u16,
    dirty: bool,
}

impl<E: Emulator, I: Interpreter> SessionController<E, I> {
    pub fn new(
        interpreter: I,
        output_rx: Receiver<OutputEvent>,
        clipboard: ClipboardBridge,
        options: SessionOptions,
    ) -> Self {
        Self {
            emulator: None,
            dispatcher: CommandDispatcher::new(interpreter, options.prompt.clone()),
            buffer: CommandBuffer::new(),
            echo_cols: Vec::new(),
            layout: PanelLayout::new(options.bounds),
            output_rx,
            renderer: OutputRenderer::new(options.prompt, options.style),
            progress: ProgressIndicator::default(),
            keybinds: KeybindRouter::new(options.keybinds),
            clipboard,
            refit_timer: RefitTimer::new(options.refit_interval),
            greeting: options.greeting,
            host_cols: 80,
            dirty: true,
        }
    }

    // ---- lifecycle ----

    /// Attach an emulator: fit it, print the greeting and first prompt, and
    /// give it focus. A previously mounted emulator is unmounted first.
    pub fn mount(&mut self, mut emulator: E, cols: u16, now: Instant) {
        if self.emulator.is_some() {
            self.unmount();
        }
        self.host_cols = cols;
        emulator.fit_to_container(self.viewport());
        if let Some(greeting) = &self.greeting {
            emulator.write_line(greeting);
        }
        emulator.write(self.renderer.prompt());
        emulator.focus();

        self.emulator = Some(emulator);
        self.refit_timer.start(now);
        self.dirty = true;
        info!("Session mounted ({} cols, {}px)", cols, self.layout.height());
    }

    /// Detach the emulator. The buffer is cleared and the layout returns to
    /// its initial state.
    pub fn unmount(&mut self) -> Option<E> {
        let emulator = self.emulator.take()?;
        self.buffer.clear();
        self.echo_cols.clear();
        self.layout.reset();
        self.progress.reset();
        self.refit_timer.stop();
        self.dirty = true;
        info!("Session unmounted");
        Some(emulator)
    }

    // ---- accessors ----

    pub fn emulator(&self) -> Option<&E> {
        self.emulator.as_ref()
    }

    pub fn emulator_mut(&mut self) -> Option<&mut E> {
        self.dirty = true;
        self.emulator.as_mut()
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn progress(&self) -> Option<f32> {
        self.progress.value()
    }

    /// Was anything changed since the last call?
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            cols: self.host_cols,
            height_px: self.layout.content_height(),
        }
    }

    // ---- keyboard ----

    /// Route a host key event. Returns true when it was used.
    pub fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        let Some(emulator) = self.emulator.as_ref() else {
            return false;
        };
        if let Some(shortcut) = self.keybinds.match_event(event) {
            self.run_shortcut(shortcut);
            return true;
        }
        if !emulator.has_focus() {
            return false;
        }
        match KeyMapper::map(event) {
            Some(stroke) => self.handle_stroke(&stroke),
            None => false,
        }
    }

    /// Classify a stroke as the emulator reports it and apply the result
    pub fn handle_stroke(&mut self, stroke: &KeyStroke) -> bool {
        if self.emulator.is_none() {
            return false;
        }
        match classify(stroke) {
            Some(action) => {
                self.apply(action);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, action: KeyAction) {
        let Some(emulator) = self.emulator.as_mut() else {
            return;
        };
        match action {
            KeyAction::Submit => {
                emulator.scroll_to_bottom();
                self.dispatcher.submit(&mut self.buffer, emulator);
                self.echo_cols.clear();
            }
            KeyAction::Backspace => {
                if let Some(ch) = self.buffer.delete_last() {
                    let start = self.echo_cols.pop();
                    let width = erase_width(ch, start, emulator.cursor_col());
                    if width > 0 {
                        let back = "\x08".repeat(width);
                        emulator.write(&format!("{}{}{}", back, " ".repeat(width), back));
                    }
                }
                emulator.scroll_to_bottom();
            }
            KeyAction::PrintableChar(ch) => {
                self.buffer.append(ch);
                echo(emulator, &mut self.echo_cols, ch.encode_utf8(&mut [0; 4]));
                emulator.scroll_to_bottom();
            }
            KeyAction::ClearShortcut => self.clear(),
            KeyAction::MaximizeShortcut => self.toggle_maximize(),
            KeyAction::CloseShortcut => self.toggle_close(),
        }
        self.dirty = true;
    }

    fn run_shortcut(&mut self, shortcut: Shortcut) {
        debug!("Shortcut: {:?}", shortcut);
        match shortcut {
            Shortcut::Clear => self.clear(),
            Shortcut::FocusOrClose => self.focus_or_close(),
            Shortcut::ToggleClose => self.toggle_close(),
            Shortcut::ToggleMaximize => self.toggle_maximize(),
            Shortcut::Copy => {
                self.copy_selection();
            }
            Shortcut::Paste => self.paste_from_clipboard(),
        }
    }

    // ---- paste / clipboard ----

    /// Pasted text goes to the emulator and the buffer as is, without
    /// classification
    pub fn handle_paste(&mut self, text: &str) {
        let Some(emulator) = self.emulator.as_mut() else {
            return;
        };
        echo(emulator, &mut self.echo_cols, text);
        emulator.scroll_to_bottom();
        self.buffer.append_str(text);
        self.dirty = true;
    }

    /// Copy the emulator selection. Returns true when something was copied.
    pub fn copy_selection(&mut self) -> bool {
        let Some(emulator) = self.emulator.as_ref() else {
            return false;
        };
        self.clipboard.copy(emulator.selection())
    }

    pub fn paste_from_clipboard(&mut self) {
        if self.emulator.is_none() {
            return;
        }
        if let Some(text) = self.clipboard.paste() {
            self.handle_paste(&text);
        }
    }

    // ---- output ----

    /// Render one interpreter event. Discarded while unmounted.
    pub fn handle_output(&mut self, event: OutputEvent) {
        let Some(emulator) = self.emulator.as_mut() else {
            debug!("Dropping output while unmounted: {:?}", event.text);
            return;
        };
        let rendered = self.renderer.render(&event, emulator, &mut self.progress);
        if rendered == Rendered::Prompt && !self.buffer.is_empty() {
            // Keep the line in step with what is still buffered
            self.echo_cols.clear();
            echo(emulator, &mut self.echo_cols, self.buffer.as_str());
        }
        self.dirty = true;
    }

    /// Render everything waiting on the output channel
    pub fn drain_output(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.output_rx.try_recv() {
            self.handle_output(event);
            count += 1;
        }
        count
    }

    // ---- layout ----

    pub fn toggle_maximize(&mut self) {
        if self.emulator.is_none() {
            return;
        }
        let was_closed = self.layout.is_closed();
        if self.layout.toggle_maximize() {
            self.after_layout_change(was_closed);
        }
    }

    pub fn toggle_close(&mut self) {
        if self.emulator.is_none() {
            return;
        }
        let was_closed = self.layout.is_closed();
        if self.layout.toggle_close() {
            self.after_layout_change(was_closed);
        }
    }

    /// Resize by a drag delta in pixels (positive grows)
    pub fn drag_resize(&mut self, delta_px: i32) {
        if self.emulator.is_none() {
            return;
        }
        let was_closed = self.layout.is_closed();
        if self.layout.drag_resize(delta_px) {
            self.after_layout_change(was_closed);
        }
    }

    /// Clear the emulator screen. The buffer is left alone.
    pub fn clear(&mut self) {
        if let Some(emulator) = self.emulator.as_mut() {
            emulator.clear();
            self.dirty = true;
        }
    }

    /// Close when the emulator has focus, otherwise focus it. A closed panel
    /// is blurred by construction, so the chord reopens it and opening
    /// focuses it.
    pub fn focus_or_close(&mut self) {
        let Some(emulator) = self.emulator.as_mut() else {
            return;
        };
        if emulator.has_focus() || self.layout.is_closed() {
            self.toggle_close();
        } else {
            emulator.focus();
            self.dirty = true;
        }
    }

    fn after_layout_change(&mut self, was_closed: bool) {
        let is_closed = self.layout.is_closed();
        if let Some(emulator) = self.emulator.as_mut() {
            if is_closed && !was_closed {
                emulator.blur();
            } else if was_closed && !is_closed {
                emulator.focus();
            }
        }
        info!("Panel {:?} ({}px)", self.layout.state(), self.layout.height());
        self.refit();
    }

    // ---- geometry / timers ----

    /// Host width changed
    pub fn handle_host_resize(&mut self, cols: u16) {
        self.host_cols = cols;
        self.refit();
    }

    /// Recompute the emulator geometry for the current panel height
    pub fn refit(&mut self) {
        let viewport = self.viewport();
        if let Some(emulator) = self.emulator.as_mut() {
            emulator.fit_to_container(viewport);
            self.dirty = true;
        }
    }

    /// One event-loop turn: release scheduled interpreter output, render it,
    /// and run the periodic re-fit when due
    pub fn tick(&mut self, now: Instant) {
        self.dispatcher.interpreter_mut().poll(now);
        self.drain_output();
        if self.refit_timer.due(now) {
            self.refit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::NativeKey;
    use crate::core::layout::PanelState;
    use crate::core::term::{TermEmulator, DEFAULT_SCROLLBACK};
    use crate::interpreter::{channel, BuiltinInterpreter};
    use crate::ui::clipboard::tests::MemoryClipboard;
    use crate::ui::keybinds::primary_modifier;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc::Sender;

    type Controller = SessionController<TermEmulator, BuiltinInterpreter>;

    fn options(keybinds: bool) -> SessionOptions {
        SessionOptions {
            prompt: "$ ".to_string(),
            greeting: None,
            bounds: PanelBounds::new(30, 200, 500).unwrap(),
            refit_interval: Duration::from_secs(3),
            keybinds,
            style: OutputStyle::default(),
        }
    }

    struct Harness {
        controller: Controller,
        tx: Sender<OutputEvent>,
        clipboard: MemoryClipboard,
        now: Instant,
    }

    fn harness_with(options: SessionOptions) -> Harness {
        let (tx, rx) = channel();
        let interpreter = BuiltinInterpreter::new(tx.clone(), "$ ");
        let clipboard = MemoryClipboard::default();
        let bridge = ClipboardBridge::new(Box::new(clipboard.clone()));
        let mut controller = SessionController::new(interpreter, rx, bridge, options);
        let now = Instant::now();
        controller.mount(TermEmulator::new(16, DEFAULT_SCROLLBACK), 80, now);
        Harness {
            controller,
            tx,
            clipboard,
            now,
        }
    }

    fn harness() -> Harness {
        harness_with(options(true))
    }

    impl Harness {
        fn lines(&self) -> Vec<String> {
            self.controller.emulator().unwrap().lines()
        }

        fn type_str(&mut self, text: &str) {
            for ch in text.chars() {
                self.controller
                    .handle_stroke(&KeyStroke::new(ch.to_string(), NativeKey::Char(ch)));
            }
        }

        fn enter(&mut self) {
            self.controller
                .handle_stroke(&KeyStroke::new("\r", NativeKey::Enter));
        }

        fn backspace(&mut self) {
            self.controller
                .handle_stroke(&KeyStroke::new("\x7f", NativeKey::Backspace));
        }

        fn chord(&mut self, ch: char) -> bool {
            let event = KeyEvent::new(KeyCode::Char(ch), primary_modifier());
            self.controller.handle_key_event(&event)
        }

        fn has_focus(&self) -> bool {
            self.controller.emulator().unwrap().has_focus()
        }
    }

    #[test]
    fn test_mount_writes_greeting_and_prompt() {
        let mut opts = options(true);
        opts.greeting = Some("hello there".to_string());
        let h = harness_with(opts);
        assert_eq!(h.lines(), vec!["hello there", "$"]);
        assert!(h.has_focus());

        let emulator = h.controller.emulator().unwrap();
        assert_eq!(emulator.rows(), (200 - 30) / 16);
        assert_eq!(emulator.cols(), 80);
    }

    #[test]
    fn test_typing_echoes_and_buffers() {
        let mut h = harness();
        h.type_str("ls 日");
        assert_eq!(h.controller.buffer().as_str(), "ls 日");
        assert_eq!(h.lines(), vec!["$ ls 日"]);

        h.backspace();
        h.backspace();
        assert_eq!(h.controller.buffer().as_str(), "ls");
        assert_eq!(h.lines(), vec!["$ ls"]);
    }

    #[test]
    fn test_backspace_on_empty_buffer_keeps_prompt() {
        let mut h = harness();
        h.type_str("a");
        for _ in 0..4 {
            h.backspace();
        }
        assert!(h.controller.buffer().is_empty());
        assert_eq!(h.lines(), vec!["$"]);
        assert_eq!(h.controller.emulator().unwrap().state.cursor_col, 2);
    }

    #[test]
    fn test_unknown_command() {
        let mut h = harness();
        h.type_str("foo");
        h.enter();
        assert!(h.controller.buffer().is_empty());
        assert_eq!(h.lines(), vec!["$ foo", "Command 'foo' not found.", "", "$"]);
    }

    #[test]
    fn test_bare_enter_writes_prompt_only() {
        let mut h = harness();
        h.enter();
        assert_eq!(h.lines(), vec!["$", "$"]);
    }

    #[test]
    fn test_recognized_command_output_arrives_on_tick() {
        let mut h = harness();
        h.type_str("echo hi");
        h.enter();
        assert_eq!(h.lines(), vec!["$ echo hi", ""]);

        let now = h.now;
        h.controller.tick(now);
        assert_eq!(h.lines(), vec!["$ echo hi", "hi", "$"]);
    }

    #[test]
    fn test_output_preserves_typed_command() {
        let mut h = harness();
        h.type_str("ls -la");
        h.tx.send(OutputEvent::text("build finished")).unwrap();
        h.controller.drain_output();

        assert_eq!(h.controller.buffer().as_str(), "ls -la");
        assert_eq!(h.lines(), vec!["$ ls -la", "build finished", ""]);

        // Next prompt brings the pending command back into view
        h.tx.send(OutputEvent::text("$ ")).unwrap();
        h.controller.drain_output();
        assert_eq!(h.lines(), vec!["$ ls -la", "build finished", "$ ls -la"]);

        h.enter();
        assert_eq!(h.controller.buffer().as_str(), "");
    }

    #[test]
    fn test_progress_updates_indicator_only() {
        let mut h = harness();
        h.tx.send(OutputEvent::progress(140.0)).unwrap();
        h.controller.drain_output();
        assert_eq!(h.controller.progress(), Some(100.0));
        assert_eq!(h.lines(), vec!["$"]);
    }

    #[test]
    fn test_layout_walkthrough_refits() {
        let mut h = harness();
        h.controller.drag_resize(400);
        assert_eq!(h.controller.layout().state(), PanelState::Maximized);
        assert_eq!(h.controller.emulator().unwrap().rows(), (500 - 30) / 16);

        h.controller.toggle_maximize();
        assert_eq!(h.controller.layout().height(), 200);

        h.controller.toggle_close();
        assert_eq!(h.controller.layout().height(), 0);
        assert_eq!(h.controller.emulator().unwrap().rows(), 0);
        assert!(!h.has_focus());

        h.controller.toggle_close();
        assert_eq!(h.controller.layout().state(), PanelState::Default);
        assert!(h.has_focus());
    }

    #[test]
    fn test_control_byte_shortcuts_via_classifier() {
        let mut h = harness_with(options(false));
        let ctrl_m = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::CONTROL);
        assert!(h.controller.handle_key_event(&ctrl_m));
        assert!(h.controller.layout().is_maximized());

        let ctrl_j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert!(h.controller.handle_key_event(&ctrl_j));
        assert!(h.controller.layout().is_closed());
        assert!(h.controller.buffer().is_empty());
    }

    #[test]
    fn test_chords_are_consumed() {
        let mut h = harness();
        h.type_str("ls");
        assert!(h.chord('m'));
        assert!(h.controller.layout().is_maximized());
        // Nothing leaked into the buffer or the line
        assert_eq!(h.controller.buffer().as_str(), "ls");
        assert_eq!(h.lines(), vec!["$ ls"]);

        h.type_str(" -la");
        h.tx.send(OutputEvent::text("old")).unwrap();
        h.controller.drain_output();
        assert!(h.chord('l'));
        assert_eq!(h.lines(), vec![""]);
        assert_eq!(h.controller.buffer().as_str(), "ls -la");
    }

    #[test]
    fn test_focus_or_close() {
        let mut h = harness();
        assert!(h.chord('`'));
        assert!(h.controller.layout().is_closed());
        assert!(!h.has_focus());

        // Unfocused keys are ignored, chords still work
        let a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(!h.controller.handle_key_event(&a));
        assert!(h.controller.buffer().is_empty());

        assert!(h.chord('`'));
        assert!(!h.controller.layout().is_closed());
        assert!(h.has_focus());

        h.controller.emulator_mut().unwrap().blur();
        assert!(h.chord('`'));
        assert!(h.has_focus());
        assert!(!h.controller.layout().is_closed());
    }

    #[test]
    fn test_paste_bypasses_classifier() {
        let mut h = harness();
        h.controller.handle_paste("echo a\tb");
        assert_eq!(h.controller.buffer().as_str(), "echo a\tb");

        *h.clipboard.text.borrow_mut() = Some("!".to_string());
        assert!(h.chord('v'));
        assert_eq!(h.controller.buffer().as_str(), "echo a\tb!");
    }

    #[test]
    fn test_backspace_erases_pasted_tab() {
        let mut h = harness();
        h.controller.handle_paste("a\t");
        assert_eq!(h.controller.emulator().unwrap().state.cursor_col, 8);

        h.backspace();
        assert_eq!(h.controller.buffer().as_str(), "a");
        assert_eq!(h.controller.emulator().unwrap().state.cursor_col, 3);

        h.type_str("b");
        assert_eq!(h.lines(), vec!["$ ab"]);
    }

    #[test]
    fn test_erase_width_falls_back_to_char_width() {
        assert_eq!(erase_width('日', Some(4), 6), 2);
        assert_eq!(erase_width('日', Some(79), 2), 2);
        assert_eq!(erase_width('a', None, 3), 1);
        assert_eq!(erase_width('\u{301}', Some(3), 3), 0);
    }

    #[test]
    fn test_copy_selection() {
        let mut h = harness();
        h.type_str("ls -la");
        {
            let emulator = h.controller.emulator_mut().unwrap();
            emulator.state.start_selection(2, 0);
            emulator.state.update_selection(3, 0);
            emulator.state.end_selection();
        }
        assert!(h.chord('c'));
        assert_eq!(h.clipboard.text.borrow().as_deref(), Some("ls"));
        assert_eq!(h.controller.buffer().as_str(), "ls -la");
    }

    #[test]
    fn test_periodic_refit() {
        let mut h = harness();
        h.controller.emulator_mut().unwrap().state.resize(10, 1);

        let now = h.now;
        h.controller.tick(now + Duration::from_secs(1));
        assert_eq!(h.controller.emulator().unwrap().cols(), 10);

        h.controller.tick(now + Duration::from_secs(3));
        assert_eq!(h.controller.emulator().unwrap().cols(), 80);
        assert_eq!(h.controller.emulator().unwrap().rows(), 10);
    }

    #[test]
    fn test_host_resize_refits() {
        let mut h = harness();
        h.controller.handle_host_resize(120);
        assert_eq!(h.controller.emulator().unwrap().cols(), 120);
    }

    #[test]
    fn test_unmounted_handlers_are_noops() {
        let mut h = harness();
        h.type_str("pending");
        h.controller.toggle_maximize();
        let emulator = h.controller.unmount();
        assert!(emulator.is_some());
        assert!(h.controller.buffer().is_empty());
        assert_eq!(h.controller.layout().state(), PanelState::Default);

        assert!(!h.controller.handle_stroke(&KeyStroke::new("a", NativeKey::Char('a'))));
        assert!(!h.chord('m'));
        h.controller.toggle_close();
        h.controller.drag_resize(100);
        h.controller.handle_paste("x");
        assert!(!h.controller.copy_selection());
        assert_eq!(h.controller.layout().state(), PanelState::Default);
        assert!(h.controller.buffer().is_empty());

        h.tx.send(OutputEvent::text("late")).unwrap();
        assert_eq!(h.controller.drain_output(), 1);
        assert!(h.controller.unmount().is_none());

        // Remount starts clean
        let now = h.now;
        h.controller
            .mount(TermEmulator::new(16, DEFAULT_SCROLLBACK), 80, now);
        assert_eq!(h.lines(), vec!["$"]);
    }

    #[test]
    fn test_progress_command_end_to_end() {
        let mut h = harness();
        h.type_str("progress 1");
        h.enter();
        let now = h.now;
        h.controller.tick(now);
        assert_eq!(h.controller.progress(), Some(0.0));

        h.type_str("ec");
        h.controller.tick(now + Duration::from_secs(2));
        assert_eq!(h.controller.progress(), Some(100.0));

        let lines = h.lines();
        assert_eq!(lines.last().map(String::as_str), Some("$ ec"));
        assert!(lines.iter().any(|l| l == "Done."));
        assert_eq!(h.controller.buffer().as_str(), "ec");
    }
}
