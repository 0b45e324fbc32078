//! Input history: a circular list of prior inputs with incremental search
//! and optional persistence in the libedit history file format.
//!
//! Adjacent duplicate entries are suppressed. Forward and reverse
//! incremental search cover both the history entries and the pending input,
//! positioning the cursor within the matched line; repeating the search
//! advances through multiple matches on the same line.

use crate::bind::Command;
use crate::debug;
use crate::error::{Error, Result};
use crate::input::KeyEvent;
use crate::prompt::State;
use crate::screen::Screen;
use crate::vis::{decode_vis, encode_vis};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// The marker stored on the first line of libedit history files.
const HISTORY_COOKIE: &str = "_HiStOrY_V2_";

/// Default bound on the number of retained entries.
pub(crate) const DEFAULT_MAX_SIZE: isize = 100;

/// A fixed-size circular list of history entries.
pub(crate) struct History {
    path: Option<PathBuf>,
    file: Option<File>,
    /// The live input, saved when navigation first leaves it.
    pending: String,
    entries: Vec<String>,
    /// Index of the newest entry within `entries`.
    head: usize,
    /// Maximum number of entries: 0 disables history, -1 is unbounded.
    max_size: isize,
    /// Offset from the newest entry; -1 denotes the live input.
    index: isize,
    /// Search direction: 0 inactive, +1 forward, -1 reverse.
    search_dir: i8,
    search_matched: bool,
    search_key: String,
    /// The most recent search key that produced a match.
    search_matched_key: String,
}

impl Default for History {
    fn default() -> Self {
        Self {
            path: None,
            file: None,
            pending: String::new(),
            entries: Vec::new(),
            head: 0,
            max_size: DEFAULT_MAX_SIZE,
            index: -1,
            search_dir: 0,
            search_matched: false,
            search_key: String::new(),
            search_matched_key: String::new(),
        }
    }
}

impl History {
    pub fn configure(&mut self, path: Option<PathBuf>, max_size: isize) {
        self.path = path;
        self.max_size = max_size;
    }

    /// Load history entries from the configured file, creating it if
    /// necessary.
    ///
    /// The first line must be the `_HiStOrY_V2_` cookie; each subsequent
    /// line is one vis-encoded entry. When the file holds 25% more entries
    /// than `max_size`, it is rewritten in place with only the newest
    /// entries. The file handle is kept open so new entries can be appended
    /// as they are added.
    pub fn load(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut n = 0usize;
        for line in BufReader::new(&file).lines() {
            let line = line?;
            if n == 0 {
                if line != HISTORY_COOKIE {
                    return Err(Error::History(format!(
                        "bad cookie: {line:?} != {HISTORY_COOKIE:?}"
                    )));
                }
                n += 1;
                continue;
            }
            let entry = decode_vis(&line).map_err(|e| Error::History(e.to_string()))?;
            self.add(&entry);
            n += 1;
        }

        let count = n as isize - 1;
        if count < 0 {
            // Empty file: write the cookie to initialize it.
            writeln!(file, "{HISTORY_COOKIE}")?;
        } else if self.max_size > 0 && count > (self.max_size * 5) / 4 {
            // The file is 25% larger than the bound: rewrite it with the
            // retained entries, oldest first.
            drop(file);
            let mut file = OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(&path)?;
            writeln!(file, "{HISTORY_COOKIE}")?;
            for i in (0..self.entries.len() as isize).rev() {
                writeln!(file, "{}", encode_vis(self.entry(i)))?;
            }
            self.file = Some(file);
            return Ok(());
        }

        self.file = Some(file);
        Ok(())
    }

    /// Close the history file, if one is open.
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Add an entry, overwriting the oldest when full. Resets navigation to
    /// the live input. Duplicates of the newest entry are elided.
    pub fn add(&mut self, s: &str) {
        if self.max_size == 0 {
            debug::printf(format_args!("history: disabled\n"));
            return;
        }
        if self.entry(0) == s {
            debug::printf(format_args!("history: elide duplicate\n"));
            return;
        }
        if self.max_size == -1 || (self.entries.len() as isize) < self.max_size {
            self.entries.push(String::new());
        }
        self.head = (self.head + 1) % self.entries.len();
        self.entries[self.head] = s.to_string();
        self.index = -1;

        if let Some(file) = &mut self.file {
            let _ = writeln!(file, "{}", encode_vis(s));
        }
    }

    /// Save the displayed text, advance toward newer entries, and show the
    /// new entry. With an active search, advances the forward search
    /// instead.
    fn next(&mut self, screen: &mut Screen) -> Result<bool> {
        if self.search_dir != 0 {
            return self.forward_search(screen);
        }
        if self.index == -1 {
            return Ok(false);
        }
        self.save(&screen.text_string());
        self.index -= 1;
        self.show_entry(screen, self.index);
        Ok(true)
    }

    /// Save the displayed text, advance toward older entries, and show the
    /// new entry. With an active search, advances the reverse search
    /// instead.
    fn previous(&mut self, screen: &mut Screen) -> Result<bool> {
        if self.search_dir != 0 {
            return self.reverse_search(screen);
        }
        if self.index + 1 >= self.entries.len() as isize {
            return Ok(false);
        }
        self.save(&screen.text_string());
        self.index += 1;
        self.show_entry(screen, self.index);
        Ok(true)
    }

    /// If the last search failed to match, restore the last matching key;
    /// otherwise cancel the search.
    fn abort_search(&mut self, screen: &mut Screen) -> Result<bool> {
        if self.search_dir == 0 {
            return Ok(false);
        }
        if !self.search_matched {
            self.search_key = self.search_matched_key.clone();
            self.update_search(screen, false);
            return Ok(true);
        }
        self.cancel_search(screen)
    }

    /// Leave search mode, dropping the banner and restoring normal editing.
    fn cancel_search(&mut self, screen: &mut Screen) -> Result<bool> {
        if self.search_dir == 0 {
            return Ok(false);
        }
        screen.set_suffix("");
        self.search_dir = 0;
        self.search_matched = false;
        self.search_key.clear();
        self.search_matched_key.clear();
        Ok(true)
    }

    /// Start history search if inactive and switch to forward search.
    fn forward_search(&mut self, screen: &mut Screen) -> Result<bool> {
        self.maybe_init_search(screen);
        self.search_dir = 1;
        self.update_search(screen, true);
        Ok(true)
    }

    /// Start history search if inactive and switch to reverse search.
    fn reverse_search(&mut self, screen: &mut Screen) -> Result<bool> {
        self.maybe_init_search(screen);
        self.search_dir = -1;
        self.update_search(screen, true);
        Ok(true)
    }

    /// Extend the search pattern with one character.
    fn append_search_key(&mut self, screen: &mut Screen, key: KeyEvent) -> Result<bool> {
        if self.search_dir == 0 {
            return Ok(false);
        }
        if let Some(c) = key.printable_char() {
            self.search_key.push(c);
            self.update_search(screen, false);
        }
        Ok(true)
    }

    /// Trim the last character from the search pattern.
    fn truncate_search_key(&mut self, screen: &mut Screen) -> Result<bool> {
        if self.search_dir == 0 {
            return Ok(false);
        }
        if self.search_key.pop().is_some() {
            self.update_search(screen, false);
        }
        Ok(true)
    }

    fn entry(&self, n: isize) -> &str {
        if n == -1 {
            return &self.pending;
        }
        match self.entry_index(n) {
            Some(i) => &self.entries[i],
            None => "",
        }
    }

    fn entry_index(&self, n: isize) -> Option<usize> {
        if n < 0 || n >= self.entries.len() as isize {
            return None;
        }
        let mut index = self.head as isize - n;
        if index < 0 {
            index += self.entries.len() as isize;
        }
        Some(index as usize)
    }

    /// Write the displayed text back to wherever navigation is pointed: the
    /// pending slot for the live input, the entry itself otherwise.
    fn save(&mut self, cur: &str) {
        if self.index == -1 {
            self.pending = cur.to_string();
            return;
        }
        if let Some(index) = self.entry_index(self.index) {
            self.entries[index] = cur.to_string();
        }
    }

    /// Replace the visible input with entry `n`.
    fn show_entry(&mut self, screen: &mut Screen, n: isize) {
        screen.move_to(0);
        let end = screen.end();
        screen.erase_to(end);
        let entry: Vec<char> = self.entry(n).chars().collect();
        screen.insert(&entry);
    }

    /// Look for the search key within entry `i`, continuing from the cursor
    /// when `i` is the entry already shown. On a hit, show the entry with
    /// the cursor at the match.
    fn search_entry(&mut self, screen: &mut Screen, i: isize, advance: bool) -> bool {
        let entry: Vec<char> = self.entry(i).chars().collect();
        let key: Vec<char> = self.search_key.chars().collect();

        let pos = match self.search_dir {
            1 => {
                let mut n = 0;
                if i == self.index {
                    n = screen.position();
                    if advance {
                        n += 1;
                    }
                    n = n.min(entry.len());
                }
                index_of(&entry[n..], &key).map(|pos| pos + n)
            }
            -1 => {
                let mut n = entry.len();
                if i == self.index {
                    let mut m = screen.position() + key.len();
                    if advance {
                        m = m.saturating_sub(1);
                    }
                    n = m.min(entry.len());
                }
                last_index_of(&entry[..n], &key)
            }
            _ => None,
        };

        let Some(pos) = pos else {
            return false;
        };

        self.save(&screen.text_string());
        self.index = i;
        screen.move_to(0);
        let end = screen.end();
        screen.erase_to(end);
        screen.insert(&entry);
        screen.move_to(pos);
        true
    }

    /// Re-run the search and refresh the status banner.
    fn update_search(&mut self, screen: &mut Screen, advance: bool) {
        self.search_matched = false;
        if !self.search_key.is_empty() {
            match self.search_dir {
                1 => {
                    let mut i = self.index;
                    while i >= -1 {
                        if self.search_entry(screen, i, advance) {
                            self.search_matched = true;
                            self.search_matched_key = self.search_key.clone();
                            break;
                        }
                        i -= 1;
                    }
                }
                -1 => {
                    let mut i = self.index;
                    while i < self.entries.len() as isize {
                        if self.search_entry(screen, i, advance) {
                            self.search_matched = true;
                            self.search_matched_key = self.search_key.clone();
                            break;
                        }
                        i += 1;
                    }
                }
                _ => {}
            }
        }

        let dir = if self.search_dir < 0 { "bck" } else { "fwd" };
        let matched = if self.search_key.is_empty() || self.search_matched {
            ":"
        } else {
            "?"
        };
        let suffix = format!("\n{dir}{matched}`{}'", self.search_key);
        screen.set_suffix(&suffix);
    }

    fn maybe_init_search(&mut self, screen: &Screen) {
        if self.search_dir != 0 {
            return;
        }
        if self.entries.is_empty() {
            self.index = -1;
        }
        self.save(&screen.text_string());
        self.search_matched_key.clear();
    }
}

/// Process `cmd` if it is a history command. Any other command cancels an
/// active search before declining.
pub(crate) fn dispatch(s: &mut State, cmd: Command, key: KeyEvent) -> Result<bool> {
    let history = &mut s.history;
    let screen = &mut s.screen;
    match cmd {
        Command::Abort => history.abort_search(screen),
        Command::BackwardDeleteChar => history.truncate_search_key(screen),
        Command::Cancel => history.cancel_search(screen),
        Command::ForwardSearchHistory => history.forward_search(screen),
        Command::InsertChar => history.append_search_key(screen, key),
        Command::ReverseSearchHistory => history.reverse_search(screen),
        Command::NextHistory => history.next(screen),
        Command::PreviousHistory => history.previous(screen),
        _ => {
            history.cancel_search(screen)?;
            Ok(false)
        }
    }
}

fn index_of(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn last_index_of(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(haystack.len());
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Screen {
        let mut s = Screen::new();
        s.set_size(80, 24);
        s.reset("> ");
        s
    }

    fn type_text(screen: &mut Screen, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        screen.insert(&chars);
    }

    #[test]
    fn test_add_elides_duplicates() {
        let mut h = History::default();
        h.add("one");
        h.add("one");
        h.add("two");
        h.add("one");
        assert_eq!(h.entry(0), "one");
        assert_eq!(h.entry(1), "two");
        assert_eq!(h.entry(2), "one");
        assert_eq!(h.entry(3), "");
    }

    #[test]
    fn test_disabled_history() {
        let mut h = History::default();
        h.configure(None, 0);
        h.add("one");
        assert_eq!(h.entry(0), "");
    }

    #[test]
    fn test_capacity_overwrites_oldest() {
        let mut h = History::default();
        h.configure(None, 3);
        for s in ["a", "b", "c", "d"] {
            h.add(s);
        }
        assert_eq!(h.entry(0), "d");
        assert_eq!(h.entry(1), "c");
        assert_eq!(h.entry(2), "b");
        assert_eq!(h.entry(3), "");
    }

    #[test]
    fn test_navigation_round_trip() {
        let mut h = History::default();
        let mut s = screen();
        h.add("first");
        h.add("second");

        type_text(&mut s, "live");
        assert!(h.previous(&mut s).unwrap());
        assert_eq!(s.text_string(), "second");
        assert!(h.previous(&mut s).unwrap());
        assert_eq!(s.text_string(), "first");
        // Past the oldest entry navigation declines.
        assert!(!h.previous(&mut s).unwrap());

        assert!(h.next(&mut s).unwrap());
        assert_eq!(s.text_string(), "second");
        assert!(h.next(&mut s).unwrap());
        // Back at the live input, restored from the pending slot.
        assert_eq!(s.text_string(), "live");
        assert!(!h.next(&mut s).unwrap());
    }

    #[test]
    fn test_edits_to_entry_are_saved_during_navigation() {
        let mut h = History::default();
        let mut s = screen();
        h.add("first");
        h.add("second");

        h.previous(&mut s).unwrap();
        type_text(&mut s, " edited");
        h.previous(&mut s).unwrap();
        h.next(&mut s).unwrap();
        assert_eq!(s.text_string(), "second edited");
    }

    #[test]
    fn test_reverse_search_walks_matches() {
        let mut h = History::default();
        let mut s = screen();
        h.add("ABC");
        h.add("ABD");

        h.reverse_search(&mut s).unwrap();
        let key = KeyEvent::char('A');
        h.append_search_key(&mut s, key).unwrap();
        h.append_search_key(&mut s, KeyEvent::char('B')).unwrap();
        assert_eq!(s.text_string(), "ABD");
        assert_eq!(s.position(), 0);
        assert!(h.search_matched);

        h.reverse_search(&mut s).unwrap();
        assert_eq!(s.text_string(), "ABC");

        // No further match: the key is flagged in the banner and the
        // display is unchanged.
        h.reverse_search(&mut s).unwrap();
        assert_eq!(s.text_string(), "ABC");
        assert!(!h.search_matched);

        // Abort restores the last matching key.
        h.abort_search(&mut s).unwrap();
        assert!(h.search_matched);
        assert_eq!(h.search_key, "AB");

        // A second abort cancels the search entirely.
        h.abort_search(&mut s).unwrap();
        assert_eq!(h.search_dir, 0);
        assert!(h.search_key.is_empty());
    }

    #[test]
    fn test_forward_search_within_entry() {
        let mut h = History::default();
        let mut s = screen();
        h.add("foo foo foo");

        h.reverse_search(&mut s).unwrap();
        for c in "foo".chars() {
            h.append_search_key(&mut s, KeyEvent::char(c)).unwrap();
        }
        // Reverse search finds the last occurrence first.
        assert_eq!(s.position(), 8);
        h.reverse_search(&mut s).unwrap();
        assert_eq!(s.position(), 4);
        h.forward_search(&mut s).unwrap();
        assert_eq!(s.position(), 8);
    }

    #[test]
    fn test_truncate_search_key() {
        let mut h = History::default();
        let mut s = screen();
        h.add("needle");

        h.reverse_search(&mut s).unwrap();
        for c in "neex".chars() {
            h.append_search_key(&mut s, KeyEvent::char(c)).unwrap();
        }
        assert!(!h.search_matched);
        h.truncate_search_key(&mut s).unwrap();
        assert!(h.search_matched);
        assert_eq!(s.text_string(), "needle");
    }

    #[test]
    fn test_cancel_search_restores_editing() {
        let mut h = History::default();
        let mut s = screen();
        h.add("entry");

        h.reverse_search(&mut s).unwrap();
        h.append_search_key(&mut s, KeyEvent::char('e')).unwrap();
        assert!(h.cancel_search(&mut s).unwrap());
        assert_eq!(h.search_dir, 0);
        // Inactive search declines.
        assert!(!h.cancel_search(&mut s).unwrap());
    }

    #[test]
    fn test_search_banner() {
        let mut h = History::default();
        let mut s = screen();
        h.add("ABC");

        h.reverse_search(&mut s).unwrap();
        let mut out = s.take_output();
        assert!(out.contains("bck:`'"), "{out:?}");

        h.append_search_key(&mut s, KeyEvent::char('Z')).unwrap();
        out = s.take_output();
        assert!(out.contains("bck?`Z'"), "{out:?}");
    }
}
