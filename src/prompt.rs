//! The prompt driver: reading keys, dispatching commands, flushing output.

use crate::bind::{self, Command};
use crate::complete::{self, Completion};
use crate::debug;
use crate::error::{Error, Result};
use crate::history::{self, DEFAULT_MAX_SIZE, History};
use crate::input::{KeyEvent, ParseError, parse_key};
use crate::kill_ring::{self, KillRing};
use crate::options::{InputFinished, PromptOptions};
use crate::screen::Screen;
use crate::terminal::{self, RawModeGuard, WinchListener};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Arc, Mutex};

/// The shared mutable editing state. The sub-components are siblings: the
/// kill ring, history, and completion all reach through here to the screen,
/// and the screen never refers back to any of them.
pub(crate) struct State {
    pub screen: Screen,
    pub history: History,
    pub kill_ring: KillRing,
    pub completion: Completion,
    pub input_finished: Option<InputFinished>,
}

/// State plus the output writer, guarded by one mutex. The resize listener
/// contends with the read loop for this lock.
pub(crate) struct Shared {
    pub state: State,
    pub out: Box<dyn Write + Send>,
}

/// Reads single- or multi-line input from a terminal. Like readline,
/// libedit, and other line-reading libraries, `Prompt` provides cursor
/// movement, deletion, a kill ring, history with incremental search, and
/// tab completion.
///
/// `Prompt` recognizes the common subset of key input sequences used by
/// roughly 75% of the terminals in a terminfo database, including all
/// modern terminals, without consulting terminfo itself. For rendering it
/// requires only a minimal set of ANSI escape sequences:
///
/// - cursor-up: `ESC[A`
/// - cursor-down: `ESC[B`
/// - cursor-right: `ESC[C`
/// - cursor-left: `ESC[D`
/// - cursor-home: `ESC[H`
/// - erase-line-to-right: `ESC[K`
/// - erase-screen: `ESC[2J`
///
/// More advanced operations such as insert mode and delete-character are
/// eschewed; the cost is re-rendering a few hundred extra bytes on some
/// edits, the benefit is output that cannot be corrupted by a wrong
/// terminfo entry.
pub struct Prompt {
    /// File descriptor for raw mode, size queries, and resize tracking;
    /// `None` when the input is not a terminal.
    fd: Option<RawFd>,
    input: Box<dyn Read + Send>,
    /// Unconsumed input, possibly ending in a partial escape sequence.
    in_bytes: Vec<u8>,
    /// Key to command mapping. Keys absent from the map insert themselves.
    bindings: HashMap<KeyEvent, Command>,
    shared: Arc<Mutex<Shared>>,
}

impl Prompt {
    /// Create a prompt from `options`. With default options the prompt
    /// uses stdin and stdout.
    ///
    /// # Panics
    ///
    /// Panics if the built-in binding table fails to parse, which would be
    /// a bug rather than a runtime condition.
    #[must_use]
    pub fn new(options: PromptOptions) -> Self {
        let mut bindings = HashMap::new();
        bind::parse_bindings(&mut bindings, bind::DEFAULT_BINDINGS)
            .expect("default bindings must parse");

        let mut state = State {
            screen: Screen::new(),
            history: History::default(),
            kill_ring: KillRing::default(),
            completion: Completion::default(),
            input_finished: options.input_finished,
        };

        if let Some((width, height)) = options.size {
            state.screen.set_size(width, height);
        }
        if let Some(completer) = options.completer {
            state.completion.set_completer(completer);
        }
        state.history.configure(
            options.history_path,
            options.history_max_size.unwrap_or(DEFAULT_MAX_SIZE),
        );

        let mut fd = None;
        let input: Box<dyn Read + Send>;
        let out: Box<dyn Write + Send>;
        if let Some(tty) = options.tty {
            fd = Some(tty.as_raw_fd());
            let tty = Arc::new(tty);
            input = Box::new(SharedFile(Arc::clone(&tty)));
            out = Box::new(SharedFile(tty));
        } else {
            input = match options.input {
                Some(reader) => reader,
                None => {
                    let stdin_fd = io::stdin().as_raw_fd();
                    if terminal::is_tty(stdin_fd) {
                        fd = Some(stdin_fd);
                    }
                    Box::new(io::stdin())
                }
            };
            out = match options.output {
                Some(writer) => writer,
                None => Box::new(io::stdout()),
            };
        }

        Self {
            fd,
            input,
            in_bytes: Vec::new(),
            bindings,
            shared: Arc::new(Mutex::new(Shared { state, out })),
        }
    }

    /// Load history from the configured file.
    ///
    /// A malformed file is reported as [`Error::History`]; the prompt
    /// remains usable without the persisted entries, so the caller decides
    /// whether that is fatal.
    pub fn load_history(&mut self) -> Result<()> {
        let mut shared = self.shared.lock().expect("prompt state lock");
        shared.state.history.load()
    }

    /// Close the prompt, releasing any open resources.
    pub fn close(&mut self) -> Result<()> {
        let mut shared = self.shared.lock().expect("prompt state lock");
        shared.state.history.close()
    }

    /// Read one logical input, displaying `prompt` before it.
    ///
    /// Blocks until the input is finished (the text is returned without
    /// its terminating newline), canceled on an empty line
    /// ([`Error::Eof`]), or the input reader fails.
    pub fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.update_size()?;

        // On a real terminal: track resizes and switch to raw mode,
        // restoring on exit.
        let mut _winch = None;
        let mut _raw = None;
        if let Some(fd) = self.fd {
            _winch = Some(WinchListener::install(fd, Arc::clone(&self.shared))?);
            _raw = Some(RawModeGuard::new(fd)?);
        }

        {
            let mut shared = self.shared.lock().expect("prompt state lock");
            let Shared { state, out } = &mut *shared;
            state.screen.reset(prompt);
            state.screen.flush(&mut **out);
        }

        let mut read_buf = [0u8; 256];
        loop {
            {
                let mut shared = self.shared.lock().expect("prompt state lock");
                if let Some(result) =
                    process_input(&mut shared, &mut self.in_bytes, &self.bindings)?
                {
                    return Ok(result);
                }
            }

            // The lock is released across the blocking read so the resize
            // listener can re-render in the meantime.
            let n = self.input.read(&mut read_buf)?;
            if n == 0 {
                return Err(Error::Eof);
            }
            self.in_bytes.extend_from_slice(&read_buf[..n]);
        }
    }

    /// Query the terminal size and apply it to the screen.
    fn update_size(&self) -> Result<()> {
        let Some(fd) = self.fd else {
            return Ok(());
        };
        let (width, height) = terminal::window_size(fd)?;
        let mut shared = self.shared.lock().expect("prompt state lock");
        let Shared { state, out } = &mut *shared;
        state.screen.set_size(width as usize, height as usize);
        state.screen.flush(&mut **out);
        Ok(())
    }
}

/// Decode and dispatch every whole key waiting in `in_bytes`, then flush.
///
/// Returns `Ok(Some(text))` when a command finished the input,
/// `Ok(None)` when more input is needed, and an error otherwise.
fn process_input(
    shared: &mut Shared,
    in_bytes: &mut Vec<u8>,
    bindings: &HashMap<KeyEvent, Command>,
) -> Result<Option<String>> {
    let mut result: Result<()> = Ok(());
    while !in_bytes.is_empty() {
        match parse_key(in_bytes) {
            Err(ParseError::Empty | ParseError::Incomplete) => break,
            Err(ParseError::InvalidUtf8) => {
                // Skip the offending byte and resynchronize.
                in_bytes.drain(..1);
            }
            Ok((key, consumed)) => {
                debug::printf(format_args!(
                    " input: {:?} -> {}\n",
                    &in_bytes[..consumed],
                    key
                ));
                in_bytes.drain(..consumed);
                if let Err(err) = dispatch_key(&mut shared.state, bindings, key) {
                    result = Err(err);
                    break;
                }
            }
        }
    }

    if matches!(result, Ok(()) | Err(Error::Eof)) {
        let Shared { state, out } = &mut *shared;
        state.screen.flush(&mut **out);
    }

    match result {
        Ok(()) => Ok(None),
        Err(Error::Eof) => {
            let text = shared.state.screen.text_string();
            if !text.is_empty() {
                shared.state.history.add(&text);
                return Ok(Some(text));
            }
            Err(Error::Eof)
        }
        Err(err) => Err(err),
    }
}

/// Offer the key's command to each sub-dispatcher in order, falling
/// through to the base commands.
fn dispatch_key(
    state: &mut State,
    bindings: &HashMap<KeyEvent, Command>,
    key: KeyEvent,
) -> Result<()> {
    let cmd = bindings.get(&key).copied().unwrap_or(Command::InsertChar);
    tracing::trace!(key = %key, command = ?cmd, "dispatch");

    if kill_ring::dispatch(state, cmd, key)? {
        return Ok(());
    }
    if history::dispatch(state, cmd, key)? {
        return Ok(());
    }
    if complete::dispatch(state, cmd, key)? {
        return Ok(());
    }
    bind::dispatch_base(state, cmd, key)?;
    Ok(())
}

/// Read/write adapter sharing one open terminal between the input and
/// output sides of the prompt.
struct SharedFile(Arc<File>);

impl Read for SharedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self.0).read(buf)
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}
