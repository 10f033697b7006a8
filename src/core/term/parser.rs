//! VT sequence parser
//!
//! Parses the subset of ANSI/VT escape sequences the panel emits and applies
//! them to the line buffer. Anything outside that subset is consumed and
//! dropped so stray sequences never show up as literal text.

use super::state::{AttrFlags, Color, TerminalState};

/// Parser state machine
pub struct VtParser {
    state: ParserState,
    params: Vec<u16>,
    intermediates: Vec<char>,
    current_param: Option<u16>,
}

#[derive(Clone, Copy, Default, PartialEq)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    CsiEntry,
    CsiParam,
    OscString,
    EscapeInOsc,
}

impl Default for VtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VtParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Ground,
            params: Vec::with_capacity(16),
            intermediates: Vec::with_capacity(4),
            current_param: None,
        }
    }

    /// Feed a whole string
    pub fn feed_str(&mut self, text: &str, state: &mut TerminalState) {
        for ch in text.chars() {
            self.feed(ch, state);
        }
    }

    /// Feed a single character to the parser
    pub fn feed(&mut self, ch: char, state: &mut TerminalState) {
        let in_osc = matches!(self.state, ParserState::OscString | ParserState::EscapeInOsc);

        // Handle C0 controls anywhere outside OSC
        if !in_osc && (ch < ' ' || ch == '\x7f') {
            match ch {
                '\x1b' => self.enter_escape(),
                '\x08' => state.backspace(),
                '\t' => state.horizontal_tab(),
                '\n' | '\x0b' | '\x0c' => state.newline(),
                '\r' => state.carriage_return(),
                _ => {}
            }
            return;
        }

        match self.state {
            ParserState::Ground => state.put_char(ch),
            ParserState::Escape => self.escape(ch),
            ParserState::CsiEntry | ParserState::CsiParam => self.csi(ch, state),
            ParserState::OscString => self.osc_string(ch),
            ParserState::EscapeInOsc => {
                // ST (ESC \) or anything else ends the OSC
                self.state = ParserState::Ground;
                if ch != '\\' {
                    self.enter_escape();
                    self.escape(ch);
                }
            }
        }
    }

    fn enter_escape(&mut self) {
        self.state = ParserState::Escape;
        self.params.clear();
        self.intermediates.clear();
        self.current_param = None;
    }

    fn escape(&mut self, ch: char) {
        match ch {
            '[' => self.state = ParserState::CsiEntry,
            ']' => self.state = ParserState::OscString,
            _ => {
                tracing::debug!("Ignoring ESC {:?}", ch);
                self.state = ParserState::Ground;
            }
        }
    }

    fn osc_string(&mut self, ch: char) {
        match ch {
            '\x07' | '\u{9c}' => self.state = ParserState::Ground,
            '\x1b' => self.state = ParserState::EscapeInOsc,
            _ => {}
        }
    }

    fn csi(&mut self, ch: char, state: &mut TerminalState) {
        match ch {
            '0'..='9' => {
                let digit = ch as u16 - '0' as u16;
                self.current_param = Some(
                    self.current_param
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(digit),
                );
                self.state = ParserState::CsiParam;
            }
            ';' | ':' => {
                self.params.push(self.current_param.take().unwrap_or(0));
                self.state = ParserState::CsiParam;
            }
            '?' | '>' | '!' | '=' | ' '..='/' => {
                self.intermediates.push(ch);
            }
            '@'..='~' => {
                if let Some(p) = self.current_param.take() {
                    self.params.push(p);
                }
                self.execute_csi(ch, state);
                self.state = ParserState::Ground;
            }
            _ => {
                self.state = ParserState::Ground;
            }
        }
    }

    fn execute_csi(&mut self, final_char: char, state: &mut TerminalState) {
        if !self.intermediates.is_empty() {
            tracing::debug!(
                "Ignoring private CSI: intermediates={:?}, params={:?}, final={:?}",
                self.intermediates,
                self.params,
                final_char
            );
            return;
        }

        let first = self.params.first().copied();
        match final_char {
            'C' => state.cursor_forward(first.unwrap_or(1).max(1)),
            'D' => state.cursor_backward(first.unwrap_or(1).max(1)),
            'G' => state.cursor_column(first.unwrap_or(1)),
            'K' => state.erase_in_line(first.unwrap_or(0)),
            'J' => state.erase_in_display(first.unwrap_or(0)),
            'm' => self.execute_sgr(state),
            _ => {
                tracing::debug!(
                    "Unknown CSI: params={:?}, final={:?}",
                    self.params,
                    final_char
                );
            }
        }
    }

    fn execute_sgr(&self, state: &mut TerminalState) {
        if self.params.is_empty() {
            state.current_attrs.reset();
            return;
        }

        let attrs = &mut state.current_attrs;
        let mut iter = self.params.iter().copied();

        while let Some(param) = iter.next() {
            match param {
                0 => attrs.reset(),
                1 => attrs.flags |= AttrFlags::BOLD,
                2 => attrs.flags |= AttrFlags::DIM,
                3 => attrs.flags |= AttrFlags::ITALIC,
                4 => attrs.flags |= AttrFlags::UNDERLINE,
                7 => attrs.flags |= AttrFlags::INVERSE,
                22 => attrs.flags &= !(AttrFlags::BOLD | AttrFlags::DIM),
                23 => attrs.flags &= !AttrFlags::ITALIC,
                24 => attrs.flags &= !AttrFlags::UNDERLINE,
                27 => attrs.flags &= !AttrFlags::INVERSE,
                30..=37 => attrs.fg = Color::Indexed((param - 30) as u8),
                38 => attrs.fg = extended_color(&mut iter).unwrap_or(attrs.fg),
                39 => attrs.fg = Color::Default,
                40..=47 => attrs.bg = Color::Indexed((param - 40) as u8),
                48 => attrs.bg = extended_color(&mut iter).unwrap_or(attrs.bg),
                49 => attrs.bg = Color::Default,
                90..=97 => attrs.fg = Color::Indexed((param - 90 + 8) as u8),
                100..=107 => attrs.bg = Color::Indexed((param - 100 + 8) as u8),
                _ => {}
            }
        }
    }
}

/// Parse the tail of a `38;5;n` / `38;2;r;g;b` sequence
fn extended_color(iter: &mut impl Iterator<Item = u16>) -> Option<Color> {
    match iter.next()? {
        5 => iter.next().map(|n| Color::Indexed(n as u8)),
        2 => {
            let r = iter.next().unwrap_or(0) as u8;
            let g = iter.next().unwrap_or(0) as u8;
            let b = iter.next().unwrap_or(0) as u8;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
