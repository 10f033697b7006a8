//! Key mapping for panel input
//!
//! Converts crossterm key events into the [`KeyStroke`] an emulator widget
//! would report: the bytes a terminal sends for the key, plus the key that
//! produced them.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::input::{KeyStroke, NativeKey};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// Key mapper for converting key events to strokes
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent. Releases and keys with no terminal
    /// encoding yield `None`.
    pub fn map(event: &KeyEvent) -> Option<KeyStroke> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mods = Modifiers::from(event.modifiers);

        let stroke = match event.code {
            KeyCode::Char(ch) => KeyStroke::new(Self::map_char(ch, mods), NativeKey::Char(ch)),

            KeyCode::Enter => KeyStroke::new("\r", NativeKey::Enter),

            KeyCode::Backspace => {
                let text = if mods.contains(Modifiers::ALT) { "\x1b\x7f" } else { "\x7f" };
                KeyStroke::new(text, NativeKey::Backspace)
            }

            KeyCode::Tab => KeyStroke::new("\t", NativeKey::Tab),
            KeyCode::BackTab => KeyStroke::new("\x1b[Z", NativeKey::Tab),

            KeyCode::Esc => KeyStroke::new("\x1b", NativeKey::Escape),

            // Arrow keys
            KeyCode::Up => Self::other(Self::special_key('A', mods)),
            KeyCode::Down => Self::other(Self::special_key('B', mods)),
            KeyCode::Right => Self::other(Self::special_key('C', mods)),
            KeyCode::Left => Self::other(Self::special_key('D', mods)),

            // Navigation keys
            KeyCode::Home => Self::other(Self::special_key('H', mods)),
            KeyCode::End => Self::other(Self::special_key('F', mods)),
            KeyCode::PageUp => Self::other(Self::tilde_key(5, mods)),
            KeyCode::PageDown => Self::other(Self::tilde_key(6, mods)),
            KeyCode::Insert => Self::other(Self::tilde_key(2, mods)),
            KeyCode::Delete => Self::other(Self::tilde_key(3, mods)),

            KeyCode::F(n) => Self::other(Self::function_key(n, mods)?),

            _ => return None,
        };
        Some(stroke)
    }

    fn other(text: String) -> KeyStroke {
        KeyStroke::new(text, NativeKey::Other)
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> String {
        // Ctrl + letter = control character
        if mods.contains(Modifiers::CTRL) && !mods.contains(Modifiers::ALT) {
            if ch.is_ascii_alphabetic() {
                let ctrl_code = (ch.to_ascii_lowercase() as u8) - b'a' + 1;
                return (ctrl_code as char).to_string();
            }
            // Special Ctrl combinations
            let code: Option<u8> = match ch {
                '@' | '`' | ' ' => Some(0x00), // Ctrl+@ = NUL
                '[' => Some(0x1B),             // Ctrl+[ = ESC
                '\\' => Some(0x1C),            // Ctrl+\ = FS
                ']' => Some(0x1D),             // Ctrl+] = GS
                '^' | '~' => Some(0x1E),       // Ctrl+^ = RS
                '_' | '?' => Some(0x1F),       // Ctrl+_ = US
                _ => None,
            };
            if let Some(code) = code {
                return (code as char).to_string();
            }
        }

        // Ctrl + Alt + letter
        if mods.contains(Modifiers::CTRL | Modifiers::ALT) && ch.is_ascii_alphabetic() {
            let ctrl_code = (ch.to_ascii_lowercase() as u8) - b'a' + 1;
            return format!("\x1b{}", ctrl_code as char);
        }

        // Alt + key = ESC + key
        if mods.contains(Modifiers::ALT) && !mods.contains(Modifiers::CTRL) {
            return format!("\x1b{}", ch);
        }

        ch.to_string()
    }

    /// Cursor-style key (arrows, Home, End)
    fn special_key(key: char, mods: Modifiers) -> String {
        if mods.is_empty() {
            format!("\x1b[{}", key)
        } else {
            format!("\x1b[1;{}{}", Self::modifier_code(mods), key)
        }
    }

    /// Tilde key sequence (PageUp, PageDown, Insert, Delete)
    fn tilde_key(code: u8, mods: Modifiers) -> String {
        if mods.is_empty() {
            format!("\x1b[{}~", code)
        } else {
            format!("\x1b[{};{}~", code, Self::modifier_code(mods))
        }
    }

    /// Function key sequence
    fn function_key(n: u8, mods: Modifiers) -> Option<String> {
        let ss3 = match n {
            1 => Some('P'),
            2 => Some('Q'),
            3 => Some('R'),
            4 => Some('S'),
            _ => None,
        };
        if let Some(key) = ss3 {
            return Some(if mods.is_empty() {
                format!("\x1bO{}", key)
            } else {
                format!("\x1b[1;{}{}", Self::modifier_code(mods), key)
            });
        }

        let code = match n {
            5 => 15,
            6 => 17,
            7 => 18,
            8 => 19,
            9 => 20,
            10 => 21,
            11 => 23,
            12 => 24,
            _ => return None,
        };
        Some(Self::tilde_key(code, mods))
    }

    /// Calculate xterm modifier code
    fn modifier_code(mods: Modifiers) -> u8 {
        1 + if mods.contains(Modifiers::SHIFT) { 1 } else { 0 }
            + if mods.contains(Modifiers::ALT) { 2 } else { 0 }
            + if mods.contains(Modifiers::CTRL) { 4 } else { 0 }
    }
}
