//! Emulator widget contract and the in-process implementation.
//!
//! The controller only talks to an [`Emulator`]; [`TermEmulator`] is the
//! line-buffer implementation used by the terminal host and by tests.

mod parser;
mod state;

pub use parser::VtParser;
pub use state::{AttrFlags, CellAttrs, Color, TerminalState, DEFAULT_SCROLLBACK};

/// Pixel box the emulator is asked to fill on re-fit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    /// Width in character columns
    pub cols: u16,
    /// Height available for text, in pixels
    pub height_px: u32,
}

/// Operations the controller needs from an emulator widget
pub trait Emulator {
    /// Write text verbatim (escape sequences interpreted)
    fn write(&mut self, text: &str);

    /// Write text followed by a newline
    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// Clear the buffer, keeping the current line
    fn clear(&mut self);

    fn focus(&mut self);

    fn blur(&mut self);

    fn has_focus(&self) -> bool;

    /// Currently selected text, if any
    fn selection(&self) -> Option<String>;

    /// Text of the line holding the cursor, trailing blanks trimmed
    fn current_line(&self) -> String;

    /// Column of the cursor on the current line
    fn cursor_col(&self) -> u16;

    fn scroll_to_bottom(&mut self);

    /// Recompute rows and columns for a new container size
    fn fit_to_container(&mut self, viewport: Viewport);
}

/// Line-buffer emulator
pub struct TermEmulator {
    pub state: TerminalState,
    parser: VtParser,
    cell_height_px: u32,
    focused: bool,
}

impl TermEmulator {
    pub fn new(cell_height_px: u32, scrollback: usize) -> Self {
        Self {
            state: TerminalState::new(80, 0, scrollback),
            parser: VtParser::new(),
            cell_height_px: cell_height_px.max(1),
            focused: false,
        }
    }

    #[cfg(test)]
    pub fn cols(&self) -> u16 {
        self.state.cols
    }

    pub fn rows(&self) -> u16 {
        self.state.rows
    }

    /// Plain text of every buffered line
    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.state.lines.iter().map(state::Line::text).collect()
    }
}

impl Emulator for TermEmulator {
    fn write(&mut self, text: &str) {
        self.parser.feed_str(text, &mut self.state);
    }

    fn clear(&mut self) {
        self.state.clear_keep_current();
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn selection(&self) -> Option<String> {
        self.state.get_selected_text()
    }

    fn current_line(&self) -> String {
        self.state.current_line_text()
    }

    fn cursor_col(&self) -> u16 {
        self.state.cursor_col.min(u16::MAX as usize) as u16
    }

    fn scroll_to_bottom(&mut self) {
        self.state.scroll_to_bottom();
    }

    fn fit_to_container(&mut self, viewport: Viewport) {
        let rows = (viewport.height_px / self.cell_height_px).min(u16::MAX as u32) as u16;
        if (viewport.cols, rows) != (self.state.cols, self.state.rows) {
            tracing::debug!("Emulator fit: {}x{}", viewport.cols, rows);
            self.state.resize(viewport.cols, rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_computes_rows_from_pixels() {
        let mut emu = TermEmulator::new(16, DEFAULT_SCROLLBACK);
        emu.fit_to_container(Viewport { cols: 100, height_px: 170 });
        assert_eq!((emu.cols(), emu.rows()), (100, 10));

        emu.fit_to_container(Viewport { cols: 100, height_px: 0 });
        assert_eq!(emu.rows(), 0);
    }

    #[test]
    fn test_write_line_and_current_line() {
        let mut emu = TermEmulator::new(16, DEFAULT_SCROLLBACK);
        emu.write_line("\x1b[32mok\x1b[39m");
        emu.write("$ ");
        assert_eq!(emu.lines(), vec!["ok", "$"]);
        assert_eq!(emu.current_line(), "$");
    }
}
