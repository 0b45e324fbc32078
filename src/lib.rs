//! `promptline` — interactive line editing for terminals.
//!
//! Given a raw byte stream from a keyboard-attached TTY and a writer back
//! to that TTY, a [`Prompt`] presents a prompt, accepts and edits one
//! logical input (possibly spanning multiple lines), and returns the
//! completed text. It is a library to embed, not an application.
//!
//! # Architecture At A Glance
//!
//! - `input`: decoder turning terminal bytes into logical keys with
//!   modifier bits, via a fixed trie of common escape sequences
//! - `screen`: the text buffer, wrap cache, and ANSI diff renderer that
//!   reconciles the terminal with the intended display
//! - `kill_ring` / `history` / `complete`: the editing sub-systems, each a
//!   dispatcher in the per-keystroke command chain
//! - `bind`: the `bind <key> <command>` table and base editing commands
//! - `prompt`: the driver owning the read loop and the state lock
//! - `terminal`: raw mode, size queries, and SIGWINCH plumbing
//! - `vis`: the libedit history-file encoding
//!
//! # Data Flow
//!
//! ```text
//! TTY bytes -> input::parse_key -> binding lookup
//!     -> kill ring -> history -> completion -> base commands
//!     -> screen mutations -> buffered ANSI -> flushed to the TTY
//! ```
//!
//! Every command for one keystroke is applied, and the resulting output
//! flushed, before the next key is decoded, so the terminal never observes
//! a half-rendered state.
//!
//! # Example
//!
//! ```no_run
//! use promptline::{Prompt, PromptOptions};
//!
//! let mut prompt = Prompt::new(
//!     PromptOptions::new().input_finished(|text| text.trim_end().ends_with(';')),
//! );
//! while let Ok(line) = prompt.read_line("demo> ") {
//!     println!("read: {line}");
//! }
//! ```

// Crate-level lint configuration
#![warn(unsafe_code)] // Unsafe code needs justification (required for termios FFI)
#![allow(dead_code)] // Public API functions not yet used internally
#![allow(clippy::cast_possible_truncation)] // Intentional size casts
#![allow(clippy::cast_possible_wrap)] // Intentional index conversions
#![allow(clippy::cast_sign_loss)] // Intentional index conversions
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::module_name_repetitions)] // Allow vis::VisError etc
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine

mod bind;
mod complete;
mod debug;
pub mod error;
mod history;
pub mod input;
mod kill_ring;
mod options;
mod prompt;
mod screen;
mod terminal;
mod vis;

pub use complete::Completer;
pub use error::{Error, Result};
pub use input::{KeyCode, KeyEvent, KeyModifiers};
pub use options::{InputFinished, PromptOptions};
pub use prompt::Prompt;
