//! Core panel components.
//!
//! Host-independent pieces of the terminal panel:
//!
//! - **term**: emulator contract plus the line-buffer emulator
//! - **input**: key stroke classification
//! - **buffer**: pending command line
//! - **dispatch**: interpreter contract and command submission
//! - **output**: interpreter output rendering and progress
//! - **layout**: panel height state machine
//!
//! # Data Flow
//!
//! ```text
//! key stroke ──> input::classify ──> buffer edit | dispatch::submit | layout
//! interpreter ──> OutputEvent ──> output::OutputRenderer ──> Emulator
//! ```

pub mod buffer;
pub mod dispatch;
pub mod input;
pub mod layout;
pub mod output;
pub mod term;
