//! Terminal resize notification.
//!
//! A listener thread drains SIGWINCH and applies the new size to the
//! screen under the prompt-state lock, flushing the resulting re-render.
//! Dropping the listener closes the signal iterator and joins the thread.

use crate::prompt::Shared;
use crate::terminal::window_size;
use signal_hook::consts::SIGWINCH;
use signal_hook::iterator::{Handle, Signals};
use std::io;
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

pub(crate) struct WinchListener {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl WinchListener {
    /// Install the SIGWINCH listener for the terminal on `fd`.
    pub fn install(fd: RawFd, shared: Arc<Mutex<Shared>>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGWINCH])?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("promptline-winch".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    let Ok((width, height)) = window_size(fd) else {
                        continue;
                    };
                    if let Ok(mut shared) = shared.lock() {
                        let Shared { state, out } = &mut *shared;
                        state.screen.set_size(width as usize, height as usize);
                        state.screen.flush(&mut **out);
                    }
                }
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for WinchListener {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
