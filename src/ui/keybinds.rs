//! Panel-wide shortcuts
//!
//! Chords on the primary modifier work no matter what has focus. A matched
//! chord is consumed and never reaches the input classifier.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Action bound to a chord
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortcut {
    Clear,
    /// Close when the emulator has focus, otherwise focus it
    FocusOrClose,
    ToggleClose,
    ToggleMaximize,
    Copy,
    Paste,
}

/// Modifier that every chord requires: Cmd on macOS, Ctrl elsewhere
pub fn primary_modifier() -> KeyModifiers {
    #[cfg(target_os = "macos")]
    {
        KeyModifiers::SUPER
    }
    #[cfg(not(target_os = "macos"))]
    {
        KeyModifiers::CONTROL
    }
}

pub struct KeybindRouter {
    enabled: bool,
    primary: KeyModifiers,
}

impl KeybindRouter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            primary: primary_modifier(),
        }
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Match a key event against the chord table
    pub fn match_event(&self, event: &KeyEvent) -> Option<Shortcut> {
        if !self.enabled || event.kind == KeyEventKind::Release {
            return None;
        }
        // Shift is tolerated so that caps-lock style uppercase still matches
        let mods = event.modifiers - KeyModifiers::SHIFT;
        if mods != self.primary {
            return None;
        }

        let KeyCode::Char(ch) = event.code else {
            return None;
        };
        match ch.to_ascii_lowercase() {
            'l' => Some(Shortcut::Clear),
            // Terminals without key disambiguation report Ctrl+` as NUL
            '`' | ' ' => Some(Shortcut::FocusOrClose),
            'j' => Some(Shortcut::ToggleClose),
            'm' => Some(Shortcut::ToggleMaximize),
            'c' => Some(Shortcut::Copy),
            'v' => Some(Shortcut::Paste),
            _ => None,
        }
    }
}
