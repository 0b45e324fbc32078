//! An in-memory terminal for end-to-end tests.
//!
//! [`MockTerm`] interprets exactly the escape sequences the renderer is
//! allowed to emit (relative cursor moves, home, erase screen, erase line
//! to right, SGR) plus CR/LF and printable text, maintaining a character
//! grid that tests assert against.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use unicode_width::UnicodeWidthChar;

pub struct MockTerm {
    contents: Vec<char>,
    width: usize,
    height: usize,
    cursor_x: usize,
    cursor_y: usize,
}

impl MockTerm {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            contents: vec!['\0'; width * height],
            width,
            height,
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    /// Row `y` as a string with trailing blanks trimmed. The placeholder
    /// cell after a wide character is skipped.
    pub fn line(&self, y: usize) -> String {
        let mut out = String::new();
        let mut prev_wide = false;
        for x in 0..self.width {
            let c = self.contents[self.position(x, y)];
            if prev_wide {
                prev_wide = false;
                continue;
            }
            prev_wide = UnicodeWidthChar::width(c).unwrap_or(0) == 2;
            out.push(if c == '\0' { ' ' } else { c });
        }
        out.trim_end().to_string()
    }

    /// All rows, trimmed, with trailing empty rows dropped.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = (0..self.height).map(|y| self.line(y)).collect();
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }

    fn position(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    fn move_to(&mut self, x: usize, y: usize) {
        self.cursor_x = x.min(self.width);
        self.cursor_y = y.min(self.height);
    }

    fn move_rel(&mut self, dx: isize, dy: isize) {
        let x = (self.cursor_x as isize + dx).max(0) as usize;
        let y = (self.cursor_y as isize + dy).max(0) as usize;
        self.move_to(x, y);
    }

    fn erase_screen(&mut self, n: usize) {
        match n {
            0 => {
                // Clear from the cursor to the end of the screen.
                self.fill(self.cursor_x, self.cursor_y, self.width - self.cursor_x, 1);
                if self.cursor_y + 1 < self.height {
                    self.fill(0, self.cursor_y + 1, self.width, self.height - self.cursor_y - 1);
                }
            }
            1 => {
                self.fill(0, 0, self.width, self.cursor_y);
                self.fill(0, self.cursor_y, self.cursor_x, 1);
            }
            _ => {
                self.move_to(0, 0);
                self.fill(0, 0, self.width, self.height);
            }
        }
    }

    fn erase_line(&mut self, n: usize) {
        match n {
            0 => self.fill(self.cursor_x, self.cursor_y, self.width - self.cursor_x, 1),
            1 => self.fill(0, self.cursor_y, self.cursor_x, 1),
            _ => self.fill(0, self.cursor_y, self.width, 1),
        }
    }

    fn scroll(&mut self) {
        for y in 1..self.height {
            let (src, dst) = (y * self.width, (y - 1) * self.width);
            for x in 0..self.width {
                self.contents[dst + x] = self.contents[src + x];
            }
        }
        self.fill(0, self.cursor_y, self.width, 1);
    }

    fn fill(&mut self, x: usize, y: usize, width: usize, height: usize) {
        for dy in 0..height {
            for dx in 0..width {
                let pos = self.position(x + dx, y + dy);
                self.contents[pos] = '\0';
            }
        }
    }

    fn put(&mut self, c: char) {
        match c {
            '\r' => self.cursor_x = 0,
            '\n' => {
                if self.cursor_y + 1 < self.height {
                    self.cursor_y += 1;
                } else {
                    self.cursor_x = 0;
                    self.scroll();
                }
            }
            _ => match UnicodeWidthChar::width(c).unwrap_or(0) {
                0 => {}
                2 => {
                    if self.cursor_x + 2 >= self.width {
                        self.cursor_x = 0;
                        self.scroll();
                    }
                    let pos = self.position(self.cursor_x, self.cursor_y);
                    self.contents[pos] = c;
                    self.contents[pos + 1] = '\0';
                    self.cursor_x += 2;
                }
                _ => {
                    let pos = self.position(self.cursor_x, self.cursor_y);
                    self.contents[pos] = c;
                    // The cursor does not advance past the last column.
                    if self.cursor_x + 1 < self.width {
                        self.cursor_x += 1;
                    }
                }
            },
        }
    }

    fn interpret(&mut self, s: &str) -> io::Result<()> {
        let cs: Vec<char> = s.chars().collect();
        let mut i = 0;
        while i < cs.len() {
            if cs[i] == '\x1b' && cs.get(i + 1) == Some(&'[') {
                let mut j = i + 2;
                let mut n = 0usize;
                let mut has_count = false;
                while j < cs.len() && cs[j].is_ascii_digit() {
                    n = n * 10 + cs[j] as usize - '0' as usize;
                    has_count = true;
                    j += 1;
                }
                let Some(&cmd) = cs.get(j) else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "truncated escape sequence",
                    ));
                };
                let count = if has_count { n } else { 1 };
                match cmd {
                    'A' => self.move_rel(0, -(count as isize)),
                    'B' => self.move_rel(0, count as isize),
                    'C' => self.move_rel(count as isize, 0),
                    'D' => self.move_rel(-(count as isize), 0),
                    'H' => self.move_to(0, 0),
                    'J' => self.erase_screen(if has_count { n } else { 0 }),
                    'K' => self.erase_line(if has_count { n } else { 0 }),
                    'm' => {} // attributes are not modeled
                    other => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("unexpected CSI command {other:?}"),
                        ));
                    }
                }
                i = j + 1;
                continue;
            }
            self.put(cs[i]);
            i += 1;
        }
        Ok(())
    }
}

/// Clonable [`Write`] handle to a [`MockTerm`], so a test can keep reading
/// the grid while the prompt owns the writer.
#[derive(Clone)]
pub struct SharedTerm(Arc<Mutex<MockTerm>>);

impl SharedTerm {
    pub fn new(width: usize, height: usize) -> Self {
        Self(Arc::new(Mutex::new(MockTerm::new(width, height))))
    }

    pub fn line(&self, y: usize) -> String {
        self.0.lock().expect("mock term lock").line(y)
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().expect("mock term lock").lines()
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.0.lock().expect("mock term lock").cursor()
    }
}

impl Write for SharedTerm {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = std::str::from_utf8(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.0.lock().expect("mock term lock").interpret(s)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
