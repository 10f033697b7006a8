//! Terminal state management
//!
//! This module defines the panel's line buffer, cursor, pen attributes and
//! text selection. The panel only ever writes at the end of its buffer, so
//! the cursor always sits on the last line and lines grow without wrapping.

use bitflags::bitflags;
use std::collections::VecDeque;
use unicode_width::UnicodeWidthChar;

/// Default number of lines kept in the buffer
pub const DEFAULT_SCROLLBACK: usize = 1000;

/// Terminal state holding all buffered lines
pub struct TerminalState {
    pub cols: u16,
    pub rows: u16,
    /// Logical lines, oldest first. Never empty.
    pub lines: VecDeque<Line>,
    /// Cursor column on the last line
    pub cursor_col: usize,
    pub current_attrs: CellAttrs,
    /// Lines scrolled back from the bottom (0 = live view)
    pub scroll_offset: usize,
    /// Text selection state
    pub selection: Option<Selection>,
    scrollback_limit: usize,
}

/// Text selection
#[derive(Clone, Debug)]
pub struct Selection {
    /// Start position (col, absolute line)
    pub start: (u16, usize),
    /// End position (col, absolute line)
    pub end: (u16, usize),
    /// Whether selection is active (mouse button held)
    pub active: bool,
}

impl TerminalState {
    pub fn new(cols: u16, rows: u16, scrollback_limit: usize) -> Self {
        let mut lines = VecDeque::new();
        lines.push_back(Line::default());
        Self {
            cols,
            rows,
            lines,
            cursor_col: 0,
            current_attrs: CellAttrs::default(),
            scroll_offset: 0,
            selection: None,
            scrollback_limit: scrollback_limit.max(1),
        }
    }

    /// Resize the visible window
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
    }

    fn current_line_mut(&mut self) -> &mut Line {
        if self.lines.is_empty() {
            self.lines.push_back(Line::default());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Put a character at the current cursor position
    pub fn put_char(&mut self, ch: char) {
        let width = ch.width().unwrap_or(0);

        if width == 0 {
            // Combining character - append to previous cell
            let col = self.cursor_col;
            let line = self.current_line_mut();
            if col > 0 && col <= line.cells.len() {
                line.cells[col - 1].grapheme.push(ch);
            }
            return;
        }

        let col = self.cursor_col;
        let attrs = self.current_attrs.clone();
        let line = self.current_line_mut();
        line.pad_to(col + width);
        line.clear_wide_overlap(col);
        if width == 2 {
            line.clear_wide_overlap(col + 1);
        }

        line.cells[col] = Cell {
            grapheme: ch.to_string(),
            width: width as u8,
            attrs: attrs.clone(),
        };
        if width == 2 {
            line.cells[col + 1] = Cell::continuation(&attrs);
        }

        self.cursor_col += width;
    }

    /// Carriage return - move cursor to column 0
    pub fn carriage_return(&mut self) {
        self.cursor_col = 0;
    }

    /// Start a new line. The panel treats LF as CR+LF.
    pub fn newline(&mut self) {
        self.lines.push_back(Line::default());
        self.cursor_col = 0;

        if self.lines.len() > self.scrollback_limit {
            while self.lines.len() > self.scrollback_limit {
                self.lines.pop_front();
            }
            // Absolute line numbers shifted
            self.selection = None;
        }
        if self.scroll_offset > 0 {
            self.scroll_offset = (self.scroll_offset + 1).min(self.max_scroll_offset());
        }
    }

    /// Backspace - move cursor left
    pub fn backspace(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    /// Horizontal tab
    pub fn horizontal_tab(&mut self) {
        let next = ((self.cursor_col / 8) + 1) * 8;
        let line = self.current_line_mut();
        line.pad_to(next);
        self.cursor_col = next;
    }

    /// Cursor forward (right)
    pub fn cursor_forward(&mut self, n: u16) {
        let target = self.cursor_col + n as usize;
        self.current_line_mut().pad_to(target);
        self.cursor_col = target;
    }

    /// Cursor backward (left)
    pub fn cursor_backward(&mut self, n: u16) {
        self.cursor_col = self.cursor_col.saturating_sub(n as usize);
    }

    /// Set cursor column (1-indexed parameter)
    pub fn cursor_column(&mut self, col: u16) {
        let target = col.saturating_sub(1) as usize;
        self.current_line_mut().pad_to(target);
        self.cursor_col = target;
    }

    /// Erase in line
    pub fn erase_in_line(&mut self, mode: u16) {
        let col = self.cursor_col;
        let line = self.current_line_mut();
        match mode {
            0 => line.cells.truncate(col),
            1 => {
                let end = (col + 1).min(line.cells.len());
                for cell in &mut line.cells[..end] {
                    *cell = Cell::default();
                }
            }
            2 => line.cells.clear(),
            _ => {}
        }
    }

    /// Erase in display. Mode 0 only touches the current line since
    /// nothing ever follows it.
    pub fn erase_in_display(&mut self, mode: u16) {
        match mode {
            0 => self.erase_in_line(0),
            2 | 3 => {
                self.lines.clear();
                self.lines.push_back(Line::default());
                self.selection = None;
                self.scroll_offset = 0;
            }
            _ => {}
        }
    }

    /// Drop every line except the current one
    pub fn clear_keep_current(&mut self) {
        let current = self.lines.pop_back().unwrap_or_default();
        self.lines.clear();
        self.lines.push_back(current);
        self.selection = None;
        self.scroll_offset = 0;
    }

    /// Text of a line with trailing blanks removed
    #[cfg(test)]
    pub fn line_text(&self, index: usize) -> Option<String> {
        self.lines.get(index).map(Line::text)
    }

    /// Text of the last line with trailing blanks removed
    pub fn current_line_text(&self) -> String {
        self.lines.back().map(Line::text).unwrap_or_default()
    }

    fn max_scroll_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.rows.max(1) as usize)
    }

    pub fn scroll_view_up(&mut self, n: usize) {
        self.scroll_offset = (self.scroll_offset + n).min(self.max_scroll_offset());
    }

    pub fn scroll_view_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn is_scrolled(&self) -> bool {
        self.scroll_offset > 0
    }

    /// Absolute index of the first line in the visible window
    pub fn first_visible_line(&self) -> usize {
        let bottom = self.lines.len().saturating_sub(self.scroll_offset);
        bottom.saturating_sub(self.rows as usize)
    }

    /// Convert a visible row to an absolute line index
    pub fn visible_row_to_absolute(&self, row: u16) -> usize {
        self.first_visible_line() + row as usize
    }

    /// Start text selection at a visible position
    pub fn start_selection(&mut self, col: u16, row: u16) {
        let abs = self.visible_row_to_absolute(row);
        self.selection = Some(Selection {
            start: (col, abs),
            end: (col, abs),
            active: true,
        });
    }

    /// Update selection end point
    pub fn update_selection(&mut self, col: u16, row: u16) {
        let abs = self.visible_row_to_absolute(row);
        if let Some(ref mut sel) = self.selection {
            sel.end = (col, abs);
        }
    }

    /// End selection (mouse released)
    pub fn end_selection(&mut self) {
        if let Some(ref mut sel) = self.selection {
            sel.active = false;
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Check if a cell is within the selection
    pub fn is_selected(&self, col: u16, abs_line: usize) -> bool {
        let Some(sel) = &self.selection else {
            return false;
        };
        let (start, end) = normalize_selection(sel);

        if abs_line < start.1 || abs_line > end.1 {
            return false;
        }
        if start.1 == end.1 {
            col >= start.0 && col <= end.0
        } else if abs_line == start.1 {
            col >= start.0
        } else if abs_line == end.1 {
            col <= end.0
        } else {
            true
        }
    }

    /// Get selected text
    pub fn get_selected_text(&self) -> Option<String> {
        let sel = self.selection.as_ref()?;
        let (start, end) = normalize_selection(sel);
        let mut result = String::new();

        for abs in start.1..=end.1 {
            let Some(line) = self.lines.get(abs) else {
                continue;
            };
            let col_start = if abs == start.1 { start.0 as usize } else { 0 };
            let col_end = if abs == end.1 {
                end.0 as usize + 1
            } else {
                line.cells.len()
            };

            for cell in line.cells.iter().take(col_end).skip(col_start) {
                if !cell.is_continuation() {
                    result.push_str(cell.display_char());
                }
            }

            if abs < end.1 {
                let trimmed = result.trim_end_matches(' ').len();
                result.truncate(trimmed);
                result.push('\n');
            }
        }

        let trimmed = result.trim_end_matches(' ').len();
        result.truncate(trimmed);

        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }
}

/// Normalize selection so start is before end
fn normalize_selection(sel: &Selection) -> ((u16, usize), (u16, usize)) {
    let (start, end) = (sel.start, sel.end);
    if start.1 < end.1 || (start.1 == end.1 && start.0 <= end.0) {
        (start, end)
    } else {
        (end, start)
    }
}

/// A logical line of cells
#[derive(Clone, Default)]
pub struct Line {
    pub cells: Vec<Cell>,
}

impl Line {
    fn pad_to(&mut self, len: usize) {
        if self.cells.len() < len {
            self.cells.resize(len, Cell::default());
        }
    }

    /// Blank out the other half of a wide character touching `col`
    fn clear_wide_overlap(&mut self, col: usize) {
        if col >= self.cells.len() {
            return;
        }
        if col > 0 && self.cells[col].is_continuation() {
            self.cells[col - 1] = Cell::default();
            self.cells[col] = Cell::default();
        }
        if self.cells[col].width == 2 && col + 1 < self.cells.len() {
            self.cells[col + 1] = Cell::default();
        }
    }

    /// Plain text with trailing blanks removed
    pub fn text(&self) -> String {
        let mut out = String::new();
        for cell in &self.cells {
            if !cell.is_continuation() {
                out.push_str(cell.display_char());
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}

#[derive(Clone)]
pub struct Cell {
    pub grapheme: String,
    pub width: u8,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            attrs: CellAttrs::default(),
        }
    }
}

impl Cell {
    pub fn continuation(attrs: &CellAttrs) -> Self {
        Self {
            grapheme: String::new(),
            width: 0,
            attrs: attrs.clone(),
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Get the display character (space if empty)
    pub fn display_char(&self) -> &str {
        if self.grapheme.is_empty() {
            " "
        } else {
            &self.grapheme
        }
    }
}

/// Cell attributes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl CellAttrs {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Color definition
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    /// Convert to crossterm color
    pub fn to_crossterm(self) -> crossterm::style::Color {
        match self {
            Color::Default => crossterm::style::Color::Reset,
            Color::Indexed(n) => crossterm::style::Color::AnsiValue(n),
            Color::Rgb(r, g, b) => crossterm::style::Color::Rgb { r, g, b },
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0000_0001;
        const DIM       = 0b0000_0010;
        const ITALIC    = 0b0000_0100;
        const UNDERLINE = 0b0000_1000;
        const INVERSE   = 0b0001_0000;
    }
}
