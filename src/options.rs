//! Prompt configuration.

use crate::complete::Completer;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Callback deciding whether the input is complete when Enter is pressed.
/// Returning `false` inserts a newline instead of finishing the read.
pub type InputFinished = Box<dyn Fn(&str) -> bool + Send>;

/// Configuration for [`crate::Prompt`], applied at construction.
///
/// With no options set, the prompt reads from stdin and writes to stdout,
/// entering raw mode and tracking resizes when stdin is a terminal.
#[derive(Default)]
pub struct PromptOptions {
    pub(crate) tty: Option<File>,
    pub(crate) input: Option<Box<dyn Read + Send>>,
    pub(crate) output: Option<Box<dyn Write + Send>>,
    pub(crate) size: Option<(usize, usize)>,
    pub(crate) completer: Option<Completer>,
    pub(crate) input_finished: Option<InputFinished>,
    pub(crate) history_path: Option<PathBuf>,
    pub(crate) history_max_size: Option<isize>,
}

impl PromptOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `tty` for both input and output instead of stdin/stdout.
    #[must_use]
    pub fn tty(mut self, tty: File) -> Self {
        self.tty = Some(tty);
        self
    }

    /// Read input from `reader` instead of a terminal. Raw mode and resize
    /// tracking are disabled. Primarily useful for tests.
    #[must_use]
    pub fn input<R: Read + Send + 'static>(mut self, reader: R) -> Self {
        self.input = Some(Box::new(reader));
        self
    }

    /// Write output to `writer` instead of a terminal. Primarily useful
    /// for tests.
    #[must_use]
    pub fn output<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.output = Some(Box::new(writer));
        self
    }

    /// Set the initial width and height. Normally the terminal size is
    /// detected; this is for tests combined with [`Self::input`] and
    /// [`Self::output`].
    #[must_use]
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Provide completion candidates for the word `text[word_start..word_end]`
    /// at the cursor, in priority order.
    #[must_use]
    pub fn completer<F>(mut self, completer: F) -> Self
    where
        F: Fn(&[char], usize, usize) -> Vec<String> + Send + 'static,
    {
        self.completer = Some(Box::new(completer));
        self
    }

    /// Decide whether Enter finishes the input. When the callback returns
    /// `false`, a newline is inserted and editing continues.
    #[must_use]
    pub fn input_finished<F>(mut self, finished: F) -> Self
    where
        F: Fn(&str) -> bool + Send + 'static,
    {
        self.input_finished = Some(Box::new(finished));
        self
    }

    /// Persist history to `path`, keeping at most `max_size` entries
    /// (0 disables history, -1 removes the bound). The file is read by
    /// [`crate::Prompt::load_history`].
    #[must_use]
    pub fn history(mut self, path: impl Into<PathBuf>, max_size: isize) -> Self {
        self.history_path = Some(path.into());
        self.history_max_size = Some(max_size);
        self
    }

    /// Bound the number of in-memory history entries without persisting
    /// them to a file.
    #[must_use]
    pub fn history_size(mut self, max_size: isize) -> Self {
        self.history_max_size = Some(max_size);
        self
    }
}
