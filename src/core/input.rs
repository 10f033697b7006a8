//! Input classification
//!
//! Turns a key event reported by the emulator widget (the text it would send
//! plus the native key that produced it) into a semantic [`KeyAction`].
//! Classification is pure; applying the action is the controller's job.

/// Form feed, sent by Ctrl+L
pub const CLEAR_BYTE: &str = "\x0c";
/// Carriage return, sent by Ctrl+M
pub const MAXIMIZE_BYTE: &str = "\r";
/// Line feed, sent by Ctrl+J
pub const CLOSE_BYTE: &str = "\n";

/// Native key that produced a stroke
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeKey {
    Enter,
    Backspace,
    Tab,
    Escape,
    Char(char),
    Other,
}

/// A key event as the emulator widget reports it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyStroke {
    pub text: String,
    pub key: NativeKey,
}

impl KeyStroke {
    pub fn new(text: impl Into<String>, key: NativeKey) -> Self {
        Self {
            text: text.into(),
            key,
        }
    }
}

/// Semantic result of classifying a key stroke
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    Backspace,
    PrintableChar(char),
    ClearShortcut,
    MaximizeShortcut,
    CloseShortcut,
}

/// Classify a key stroke. Unrecognized control bytes and escape sequences
/// yield `None`.
pub fn classify(stroke: &KeyStroke) -> Option<KeyAction> {
    match stroke.key {
        NativeKey::Enter => return Some(KeyAction::Submit),
        NativeKey::Backspace => return Some(KeyAction::Backspace),
        _ => {}
    }

    match stroke.text.as_str() {
        CLEAR_BYTE => return Some(KeyAction::ClearShortcut),
        MAXIMIZE_BYTE => return Some(KeyAction::MaximizeShortcut),
        CLOSE_BYTE => return Some(KeyAction::CloseShortcut),
        _ => {}
    }

    let mut chars = stroke.text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if is_printable(ch) => Some(KeyAction::PrintableChar(ch)),
        _ => None,
    }
}

fn is_printable(ch: char) -> bool {
    !ch.is_control()
}
