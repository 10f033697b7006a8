//! User interface rendering and input handling.
//!
//! This module provides all crossterm-facing functionality:
//!
//! - **keymapper**: Key events to the strokes an emulator widget reports
//! - **keybinds**: Panel-wide shortcut chords
//! - **clipboard**: System clipboard bridge
//! - **renderer**: Docked panel renderer and terminal mode guard

pub mod clipboard;
pub mod keybinds;
pub mod keymapper;
pub mod renderer;

pub use clipboard::ClipboardBridge;
pub use keybinds::primary_modifier;
pub use renderer::{Control, Frame, HitTarget, PanelGeometry, PanelRenderer, TerminalGuard};
