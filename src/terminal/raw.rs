//! Raw mode and terminal size queries.
//!
//! Uses termios via libc to put the controlling terminal into raw mode for
//! the duration of a read, restoring the saved state on drop.
//!
//! # Safety
//! This module uses unsafe code for FFI calls to libc termios functions.
//! These are necessary for low-level terminal control and cannot be avoided.

#![allow(unsafe_code)]

use std::io;
use std::os::unix::io::RawFd;

/// Saved terminal state, restored when dropped.
#[derive(Debug)]
pub(crate) struct RawModeGuard {
    fd: RawFd,
    original: libc::termios,
}

impl RawModeGuard {
    /// Enter raw mode on the given file descriptor.
    pub fn new(fd: RawFd) -> io::Result<Self> {
        let original = get_termios(fd)?;

        let mut raw = original;

        // Input modes: no break, no CR to NL, no parity check, no strip
        // char, no start/stop output control.
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);

        // Output modes: disable post processing.
        raw.c_oflag &= !libc::OPOST;

        // Control modes: 8 bit chars.
        raw.c_cflag |= libc::CS8;

        // Local modes: echo off, canonical off, no extended functions,
        // no signal chars (^C, ^Z).
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

        // Reads block until at least one byte arrives; escape-sequence
        // reassembly is handled above the read loop.
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        set_termios(fd, &raw)?;

        Ok(Self { fd, original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = set_termios(self.fd, &self.original);
    }
}

/// Check if the given file descriptor is a TTY.
#[must_use]
pub(crate) fn is_tty(fd: RawFd) -> bool {
    // SAFETY: isatty is safe to call with any fd.
    unsafe { libc::isatty(fd) == 1 }
}

/// Get the terminal size for `fd` as (width, height).
pub(crate) fn window_size(fd: RawFd) -> io::Result<(u16, u16)> {
    // SAFETY: zeroed winsize is a valid argument for TIOCGWINSZ.
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };

    // SAFETY: ioctl with TIOCGWINSZ is safe when passed a valid winsize.
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else if size.ws_col == 0 || size.ws_row == 0 {
        // Zero dimensions would wreck the wrap arithmetic.
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "terminal reported zero dimensions",
        ))
    } else {
        Ok((size.ws_col, size.ws_row))
    }
}

fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    // SAFETY: tcgetattr fills the passed termios struct.
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(termios)
    }
}

fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: tcsetattr reads the passed termios struct.
    let result = unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
