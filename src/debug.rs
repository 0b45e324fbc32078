//! Trace-file debugging.
//!
//! When `PROMPT_DEBUG=<path>` is set in the environment, decoded input and
//! flushed output are appended to the named file. The file is opened once,
//! lazily, on first use; without the variable every call is a no-op.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::sync::{Mutex, OnceLock};

fn debug_file() -> &'static Option<Mutex<File>> {
    static FILE: OnceLock<Option<Mutex<File>>> = OnceLock::new();
    FILE.get_or_init(|| {
        let path = std::env::var_os("PROMPT_DEBUG")?;
        File::create(path).ok().map(Mutex::new)
    })
}

/// Write a formatted trace record, if tracing is enabled.
pub(crate) fn printf(args: fmt::Arguments<'_>) {
    if let Some(file) = debug_file() {
        if let Ok(mut file) = file.lock() {
            let _ = file.write_fmt(args);
        }
    }
}
