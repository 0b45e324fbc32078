//! The screen model: prompt, input text, and their rendering.
//!
//! [`Screen`] owns the displayed text and produces a byte stream that
//! reconciles the terminal with the intended display. Rendering assumes
//! support for a minimal set of ANSI escape sequences: relative cursor
//! movement (`ESC[<n>{A,B,C,D}`), move to top left (`ESC[H`), erase screen
//! (`ESC[2J`), and erase line to right (`ESC[K`).
//!
//! More advanced terminal operations (insert/delete character, insert mode,
//! scroll regions) are deliberately not used. That costs some re-rendering
//! on edits, but the same output works on every terminal rather than
//! depending on terminfo capability lookups.

pub mod attrs;
mod wrap;

pub use wrap::is_printable;

use crate::debug;
use attrs::AttrSpan;
use std::fmt::Write as _;
use std::io::Write;
use wrap::{LineInfo, char_width, fit_graphemes, is_word};

const BELL: char = '\x07';

/// A prompt, input text, and the display of both on a terminal.
///
/// The text buffer is partitioned `prefix ++ input ++ suffix`: the prompt is
/// stored as a prefix, an ephemeral annotation (the history-search banner)
/// as a suffix, and the user input between them. The cursor index always
/// stays within the input partition.
pub(crate) struct Screen {
    /// Text displayed before the input.
    prefix: Vec<char>,
    /// Text displayed after the input; never part of the returned input.
    suffix: Vec<char>,
    /// The full displayed text: `prefix ++ input ++ suffix`.
    text: Vec<char>,
    /// Cached placement of rendered lines; `None` after any mutation.
    lines: Option<Vec<LineInfo>>,
    /// Attribute spans over `text`, sorted by `start_pos`.
    attrs: Vec<AttrSpan>,
    /// Attributes applied to text inserted by `insert`; empty for none.
    insert_attrs: String,
    /// Terminal width in columns.
    width: usize,
    /// Terminal height in rows.
    height: usize,
    /// Cursor index within `text`. Always in
    /// `[prefix.len(), text.len() - suffix.len()]`.
    cursor_pos: usize,
    /// 0-indexed cursor column.
    cursor_x: usize,
    /// 0-indexed cursor row.
    cursor_y: usize,
    /// The deepest row rendered so far; erasures blank down to here.
    max_y: usize,
    /// Buffered bytes awaiting a flush to the terminal.
    outbuf: String,
}

impl Screen {
    pub fn new() -> Self {
        Self {
            prefix: Vec::new(),
            suffix: Vec::new(),
            text: Vec::new(),
            lines: None,
            attrs: Vec::new(),
            insert_attrs: String::new(),
            // Defaults, usually overridden by set_size.
            width: 80,
            height: 40,
            cursor_pos: 0,
            cursor_x: 0,
            cursor_y: 0,
            max_y: 0,
            outbuf: String::new(),
        }
    }

    /// Write the buffered drawing commands to `w` and clear the buffer.
    /// Best-effort: write errors are dropped, the buffer is cleared anyway.
    pub fn flush(&mut self, w: &mut dyn Write) {
        debug::printf(format_args!("output: {:?}\n", self.outbuf));
        tracing::trace!(bytes = self.outbuf.len(), "screen flush");
        let _ = w.write_all(self.outbuf.as_bytes());
        let _ = w.flush();
        self.outbuf.clear();
    }

    /// Reset the buffer to read a new input. Prior screen content is left
    /// in place above the new prompt.
    pub fn reset(&mut self, prefix: &str) {
        self.prefix = prefix.chars().collect();
        self.suffix.clear();
        self.text = self.prefix.clone();
        self.attrs.clear();
        self.insert_attrs.clear();
        self.lines = None;
        self.cursor_pos = 0;
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.max_y = 0;
        self.render_text(self.text.len());
        self.move_to(0);
    }

    /// Cancel the current input, leaving it on screen, and reset state to
    /// read a new input.
    pub fn cancel(&mut self) {
        self.move_to(self.text.len());
        if self.cursor_x != 0 {
            self.outbuf.push_str("\r\n");
        }
        let prefix: String = self.prefix.iter().collect();
        self.reset(&prefix);
    }

    /// Set the width and height of the screen and re-render to account for
    /// the new size.
    pub fn set_size(&mut self, width: usize, height: usize) {
        let width = width.max(1);
        let old_width = self.width;
        self.width = width;
        self.height = height;

        if width == old_width {
            return;
        }

        if width < old_width {
            // Some terminals truncate lines that were too long when
            // horizontally shrinking, others rewrap them. In the rewrapping
            // case there is no way to know how many lines were added or
            // where the cursor ended up, so redraw everything.
            self.refresh();
            return;
        }

        // Growing: rewrap from the origin and blank whatever the old,
        // narrower layout left behind below the new one.
        let old_rows = self.max_y;
        self.cursor_x = width;
        self.lines = None;
        let saved = self.cursor_pos.saturating_sub(self.prefix.len());
        self.cursor_pos = 0;
        self.move_cursor(0, 0);
        self.render_text(self.text.len());
        self.erase_line_to_right();
        while self.cursor_y < old_rows {
            let y = self.cursor_y + 1;
            self.move_cursor(0, y);
            self.erase_line_to_right();
        }
        self.move_to(saved);
    }

    /// Replace the suffix displayed after the input text (the history
    /// search banner).
    pub fn set_suffix(&mut self, new_suffix: &str) {
        let old_len = self.suffix.len();
        self.suffix = new_suffix.chars().collect();
        self.text.truncate(self.text.len() - old_len);
        self.text.extend(self.suffix.iter().copied());

        let saved = self.cursor_pos.saturating_sub(self.prefix.len());
        self.lines = None;
        self.move_to(self.text.len());
        self.render_text(self.text.len());
        self.erase_line_to_right();
        while self.cursor_y < self.max_y {
            self.outbuf.push_str("\r\n");
            self.cursor_x = 0;
            self.cursor_y += 1;
            self.erase_line_to_right();
        }
        self.move_to(saved);
    }

    /// Clear the screen and redraw the prompt and text from the top left.
    pub fn refresh(&mut self) {
        self.erase_screen();
        self.lines = None;
        let saved = self.cursor_pos.saturating_sub(self.prefix.len());
        self.cursor_pos = 0;
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.render_text(self.text.len());
        self.move_to(saved);
    }

    /// Move the cursor to `pos`, an index within the input. Clamped to the
    /// input partition.
    pub fn move_to(&mut self, pos: usize) {
        self.recompute_lines();

        let pos = pos.min(self.input_len()) + self.prefix.len();
        let line = self.find_line(pos);
        let (_, fitted, _) = fit_graphemes(&self.text[line.start_pos..pos], self.width - line.x);
        let mut x = line.x + fitted;
        let y = line.y + x / self.width;
        x %= self.width;

        self.cursor_pos = pos;
        self.move_cursor(x, y);
    }

    /// Set the attributes applied to subsequently inserted text. An empty
    /// string turns attributed insertion off.
    pub fn set_attrs(&mut self, value: &str) {
        self.insert_attrs = value.to_string();
    }

    /// Insert text at the cursor, moving the cursor past it.
    ///
    /// Characters the display cannot represent are dropped; if any were,
    /// the bell is rung once.
    pub fn insert(&mut self, text: &[char]) {
        let filtered: Vec<char> = text.iter().copied().filter(|&c| is_printable(c)).collect();
        if filtered.len() < text.len() {
            self.outbuf.push(BELL);
        }
        if filtered.is_empty() {
            return;
        }

        self.lines = None;
        let n = filtered.len();
        self.text
            .splice(self.cursor_pos..self.cursor_pos, filtered.iter().copied());

        // Update existing attribute spans for the newly inserted text.
        attrs::shift_for_insert(&mut self.attrs, self.cursor_pos, n);
        if !self.insert_attrs.is_empty() {
            self.attrs.push(AttrSpan {
                start_pos: self.cursor_pos,
                end_pos: self.cursor_pos + n,
                value: self.insert_attrs.clone(),
            });
            self.attrs.sort_by_key(|a| a.start_pos);
        }

        let new_pos = self.cursor_pos + n - self.prefix.len();
        self.render_text(self.text.len());
        self.move_to(new_pos);
    }

    /// Erase the characters between the cursor and `pos` (an input index,
    /// clamped), returning the erased text. The cursor lands at the start
    /// of the erased range.
    pub fn erase_to(&mut self, pos: usize) -> String {
        let pos = pos.min(self.input_len()) + self.prefix.len();

        let erased: String;
        if pos == self.cursor_pos {
            return String::new();
        } else if pos < self.cursor_pos {
            attrs::clip_for_erase(&mut self.attrs, pos, self.cursor_pos);
            erased = self.text[pos..self.cursor_pos].iter().collect();
            self.text.drain(pos..self.cursor_pos);
            // The line cache still describes what is on screen; use it to
            // walk back before re-rendering.
            let target = pos - self.prefix.len();
            self.move_to(target);
        } else {
            attrs::clip_for_erase(&mut self.attrs, self.cursor_pos, pos);
            erased = self.text[self.cursor_pos..pos].iter().collect();
            self.text.drain(self.cursor_pos..pos);
        }

        self.lines = None;
        let new_pos = self.cursor_pos - self.prefix.len();
        self.render_text(self.text.len());

        self.erase_line_to_right();
        while self.cursor_y < self.max_y {
            self.outbuf.push_str("\r\n");
            self.cursor_x = 0;
            self.cursor_y += 1;
            self.erase_line_to_right();
        }
        self.move_to(new_pos);
        erased
    }

    /// The position just past the end of the displayed text. Useful as an
    /// argument to `move_to`/`erase_to`, which clamp into the input.
    pub fn end(&self) -> usize {
        self.text.len()
    }

    /// The current input text.
    pub fn text(&self) -> &[char] {
        &self.text[self.prefix.len()..self.text.len() - self.suffix.len()]
    }

    /// The current input text as an owned string.
    pub fn text_string(&self) -> String {
        self.text().iter().collect()
    }

    /// The cursor position within the input.
    pub fn position(&self) -> usize {
        self.cursor_pos.saturating_sub(self.prefix.len())
    }

    fn input_len(&self) -> usize {
        self.text.len() - self.suffix.len() - self.prefix.len()
    }

    /// The end of the grapheme after the cursor: one non-zero-width
    /// character plus any trailing zero-width characters. A newline counts
    /// as a grapheme.
    pub fn next_grapheme_end(&self) -> usize {
        let text = self.text();
        let mut pos = self.position();
        let mut n = 0;
        while n < 1 && pos < text.len() {
            if text[pos] == '\n' || char_width(text[pos]) != 0 {
                n += 1;
            }
            pos += 1;
        }
        while pos < text.len() && text[pos] != '\n' && char_width(text[pos]) == 0 {
            pos += 1;
        }
        pos
    }

    /// The start of the grapheme before the cursor.
    pub fn prev_grapheme_start(&self) -> usize {
        if self.cursor_pos <= self.prefix.len() {
            return 0;
        }
        let end = self.cursor_pos - self.prefix.len();
        let text = &self.text()[..end];
        let mut pos = text.len();
        let mut n = 0;
        while n < 1 && pos > 0 {
            if text[pos - 1] == '\n' || char_width(text[pos - 1]) != 0 {
                n += 1;
            }
            pos -= 1;
        }
        pos
    }

    /// The end of the word at or after `pos`: skip non-word characters,
    /// then consume letters and digits.
    pub fn next_word_end(&self, mut pos: usize) -> usize {
        let text = self.text();
        while pos < text.len() {
            if is_word(text[pos]) {
                break;
            }
            pos += 1;
        }
        while pos < text.len() {
            if !is_word(text[pos]) {
                break;
            }
            pos += 1;
        }
        pos
    }

    /// The start of the word before `pos`.
    pub fn prev_word_start(&self, pos: usize) -> usize {
        let text = self.text();
        if pos == 0 {
            return 0;
        }
        let mut pos = pos - 1;
        while pos > 0 {
            if is_word(text[pos]) {
                break;
            }
            pos -= 1;
        }
        while pos > 0 {
            if !is_word(text[pos - 1]) {
                break;
            }
            pos -= 1;
        }
        pos
    }

    /// Emit a bare CRLF. Used when input is accepted: the cursor model is
    /// not updated because the screen is reset before the next read.
    pub fn newline(&mut self) {
        self.outbuf.push_str("\r\n");
    }

    /// Ring the terminal bell.
    pub fn bell(&mut self) {
        self.outbuf.push(BELL);
    }

    fn recompute_lines(&mut self) {
        if self.lines.is_some() {
            return;
        }

        let mut lines: Vec<LineInfo> = Vec::new();
        let mut pos = 0;
        let mut x = 0;
        let mut y = 0;

        loop {
            lines.push(LineInfo {
                start_pos: pos,
                end_pos: pos,
                x,
                y,
            });
            if pos == self.text.len() {
                break;
            }

            let (consumed, width, newline) = fit_graphemes(&self.text[pos..], self.width - x);
            x += width;
            y += x / self.width;
            x %= self.width;

            if let Some(line) = lines.last_mut() {
                line.end_pos = pos + consumed;
            }
            pos += consumed;

            if newline || consumed == 0 {
                x = 0;
                y += 1;
                if newline {
                    pos += 1;
                }
            }
        }

        if self.max_y < y {
            self.max_y = y;
        }
        self.lines = Some(lines);
    }

    fn find_line(&self, pos: usize) -> LineInfo {
        self.lines
            .as_deref()
            .unwrap_or_default()
            .iter()
            .copied()
            .find(|l| pos <= l.end_pos)
            .unwrap_or_default()
    }

    /// Render `text[cursor_pos..end]`, advancing the cursor to `end`.
    fn render_text(&mut self, end: usize) {
        // Track the attributes active at the cursor as it advances. When a
        // span becomes active its escape is emitted; when one ends, the
        // terminal cannot subtract a single attribute, so emit a full reset
        // and re-establish the spans still active.
        let mut active: Vec<AttrSpan> = Vec::new();
        let mut next = 0;
        while next < self.attrs.len() && self.attrs[next].end_pos < self.cursor_pos {
            next += 1;
        }

        while self.cursor_pos < end {
            let avail = self.width - self.cursor_x;
            let (consumed, width, newline) =
                fit_graphemes(&self.text[self.cursor_pos..end], avail);

            for _ in 0..consumed {
                start_attrs(
                    &self.attrs,
                    &mut next,
                    &mut active,
                    &mut self.outbuf,
                    self.cursor_pos,
                );
                self.outbuf.push(self.text[self.cursor_pos]);
                end_attrs(&mut active, &mut self.outbuf, self.cursor_pos);
                self.cursor_pos += 1;
            }

            if width > 0 {
                self.cursor_x += width;
                self.cursor_y += self.cursor_x / self.width;
                self.cursor_x %= self.width;
                if self.cursor_x == 0 {
                    // Terminals advance the position when writing a
                    // character, except for the last column of a line; a
                    // character written there leaves the cursor in place
                    // until the next one forces the wrap. Since rendering
                    // stops exactly at the edge, write the line break
                    // explicitly to get the cursor onto the next row.
                    self.outbuf.push_str("\r\n");
                }
            }

            if newline || consumed == 0 {
                self.erase_line_to_right();
                self.outbuf.push_str("\r\n");
                self.cursor_x = 0;
                self.cursor_y += 1;
                if newline {
                    end_attrs(&mut active, &mut self.outbuf, self.cursor_pos);
                    self.cursor_pos += 1;
                }
            }
        }

        if !active.is_empty() {
            self.outbuf.push_str(attrs::RESET);
        }
    }

    /// Emit relative cursor movement from the tracked position to `(x, y)`.
    /// The step count is omitted when it is exactly one.
    fn move_cursor(&mut self, x: usize, y: usize) {
        if y < self.cursor_y {
            let up = self.cursor_y - y;
            if up == 1 {
                self.outbuf.push_str("\x1b[A");
            } else {
                let _ = write!(self.outbuf, "\x1b[{up}A");
            }
        }
        if y > self.cursor_y {
            let down = y - self.cursor_y;
            if down == 1 {
                self.outbuf.push_str("\x1b[B");
            } else {
                let _ = write!(self.outbuf, "\x1b[{down}B");
            }
        }
        if x < self.cursor_x {
            let left = self.cursor_x - x;
            if left == 1 {
                self.outbuf.push_str("\x1b[D");
            } else {
                let _ = write!(self.outbuf, "\x1b[{left}D");
            }
        }
        if x > self.cursor_x {
            let right = x - self.cursor_x;
            if right == 1 {
                self.outbuf.push_str("\x1b[C");
            } else {
                let _ = write!(self.outbuf, "\x1b[{right}C");
            }
        }
        self.cursor_x = x;
        self.cursor_y = y;
    }

    /// Erase from the cursor to the end of the line.
    fn erase_line_to_right(&mut self) {
        self.outbuf.push_str("\x1b[K");
    }

    /// Move to the top left corner and erase the screen.
    fn erase_screen(&mut self) {
        self.outbuf.push_str("\x1b[H\x1b[2J");
    }

    #[cfg(test)]
    pub(crate) fn take_output(&mut self) -> String {
        std::mem::take(&mut self.outbuf)
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }
}

/// Activate any spans beginning at `pos`, advancing `next` past spans that
/// start at or before it.
fn start_attrs(
    spans: &[AttrSpan],
    next: &mut usize,
    active: &mut Vec<AttrSpan>,
    outbuf: &mut String,
    pos: usize,
) {
    while *next < spans.len() {
        if pos < spans[*next].start_pos {
            break;
        }
        if pos < spans[*next].end_pos {
            outbuf.push_str(&spans[*next].value);
            active.push(spans[*next].clone());
        }
        *next += 1;
    }
}

/// Deactivate spans ending after the character at `pos`. Ending any span
/// forces a reset and re-emission of the spans still active.
fn end_attrs(active: &mut Vec<AttrSpan>, outbuf: &mut String, pos: usize) {
    let before = active.len();
    active.retain(|attr| pos + 1 != attr.end_pos);
    if active.len() != before {
        outbuf.push_str(attrs::RESET);
        for attr in active.iter() {
            outbuf.push_str(&attr.value);
        }
    }
}
