//! TTY collaborators: raw mode, size queries, and resize notification.

mod raw;
mod winch;

pub(crate) use raw::{RawModeGuard, is_tty, window_size};
pub(crate) use winch::WinchListener;
