//! The kill ring.
//!
//! Commands described as killing text save the deleted text for later
//! retrieval. Consecutive kills accumulate into a single entry that can be
//! yanked all at once; any non-kill command seals the current entry.

use crate::bind::Command;
use crate::error::Result;
use crate::input::KeyEvent;
use crate::prompt::State;

const KILL_RING_MAX: usize = 10;

/// A fixed-size ring of killed text, newest entry last.
#[derive(Debug, Default)]
pub(crate) struct KillRing {
    entries: Vec<String>,
    /// Set while a run of consecutive kill commands accumulates.
    killing: bool,
    /// Set after a yank, enabling yank-pop rotation.
    yanking: bool,
}

impl KillRing {
    /// Append text to the current kill ring entry, starting a new entry if
    /// the previous command was not a kill.
    pub fn append(&mut self, e: &str) {
        self.maybe_begin_kill();
        if let Some(head) = self.entries.last_mut() {
            head.push_str(e);
        }
    }

    /// Prepend text to the current kill ring entry, starting a new entry if
    /// the previous command was not a kill.
    pub fn prepend(&mut self, e: &str) {
        self.maybe_begin_kill();
        if let Some(head) = self.entries.last_mut() {
            head.insert_str(0, e);
        }
    }

    /// Return the newest kill ring entry and arm yank-pop.
    pub fn yank(&mut self) -> Vec<char> {
        match self.entries.last() {
            Some(entry) => {
                self.yanking = true;
                entry.chars().collect()
            }
            None => Vec::new(),
        }
    }

    /// Rotate the ring: the newest entry becomes the oldest and the next
    /// newest becomes current.
    pub fn rotate(&mut self) {
        if let Some(last) = self.entries.pop() {
            self.entries.insert(0, last);
        }
    }

    pub fn is_yanking(&self) -> bool {
        self.yanking
    }

    /// Begin a new kill sequence if one is not already in progress,
    /// discarding the oldest entry at capacity. Starting a kill sequence
    /// also disarms yank-pop.
    fn maybe_begin_kill(&mut self) {
        if self.killing {
            return;
        }
        self.killing = true;
        self.yanking = false;

        if self.entries.len() < KILL_RING_MAX {
            self.entries.push(String::new());
        } else {
            self.entries.remove(0);
            self.entries.push(String::new());
        }
    }

    #[cfg(test)]
    fn entries_newest_first(&self) -> Vec<&str> {
        self.entries.iter().rev().map(String::as_str).collect()
    }
}

/// Process `cmd` if it is a kill or yank command, clearing the accumulation
/// latches when it is neither.
pub(crate) fn dispatch(s: &mut State, cmd: Command, _key: KeyEvent) -> Result<bool> {
    match cmd {
        Command::BackwardKillLine => {
            // Erase to the beginning of the input.
            let e = s.screen.erase_to(0);
            if !e.is_empty() {
                s.kill_ring.prepend(&e);
            }
            return Ok(true);
        }
        Command::BackwardKillWord => {
            let start = s.screen.prev_word_start(s.screen.position());
            let e = s.screen.erase_to(start);
            if !e.is_empty() {
                s.kill_ring.prepend(&e);
            }
            return Ok(true);
        }
        Command::KillLine => {
            // Delete everything from the cursor to the end of the input.
            let end = s.screen.end();
            let e = s.screen.erase_to(end);
            if !e.is_empty() {
                s.kill_ring.append(&e);
            }
            return Ok(true);
        }
        Command::KillWord => {
            let end = s.screen.next_word_end(s.screen.position());
            let e = s.screen.erase_to(end);
            if !e.is_empty() {
                s.kill_ring.append(&e);
            }
            return Ok(true);
        }
        _ => {}
    }
    s.kill_ring.killing = false;

    match cmd {
        Command::Yank => {
            let text = s.kill_ring.yank();
            s.screen.insert(&text);
            return Ok(true);
        }
        Command::YankPop => {
            if !s.kill_ring.yanking {
                return Ok(true);
            }
            let yanked = s.kill_ring.yank();
            let target = s.screen.position().saturating_sub(yanked.len());
            s.screen.erase_to(target);
            s.kill_ring.rotate();
            let text = s.kill_ring.yank();
            s.screen.insert(&text);
            return Ok(true);
        }
        _ => {}
    }
    s.kill_ring.yanking = false;

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulation() {
        let mut r = KillRing::default();
        r.append("foo");
        r.append(" bar");
        assert_eq!(r.entries_newest_first(), vec!["foo bar"]);

        r.prepend("pre ");
        assert_eq!(r.entries_newest_first(), vec!["pre foo bar"]);

        // A non-kill command seals the entry.
        r.killing = false;
        r.append("baz");
        assert_eq!(r.entries_newest_first(), vec!["baz", "pre foo bar"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut r = KillRing::default();
        for i in 0..15 {
            r.killing = false;
            r.append(&format!("kill{i}"));
        }
        assert_eq!(r.entries.len(), KILL_RING_MAX);
        assert_eq!(r.entries_newest_first()[0], "kill14");
        assert_eq!(r.entries_newest_first()[KILL_RING_MAX - 1], "kill5");
    }

    #[test]
    fn test_yank_and_rotate() {
        let mut r = KillRing::default();
        assert!(r.yank().is_empty());
        assert!(!r.yanking);

        r.append("one");
        r.killing = false;
        r.append("two");

        assert_eq!(r.yank().iter().collect::<String>(), "two");
        assert!(r.yanking);

        r.rotate();
        assert_eq!(r.yank().iter().collect::<String>(), "one");
        r.rotate();
        assert_eq!(r.yank().iter().collect::<String>(), "two");
    }

    #[test]
    fn test_kill_disarms_yank_pop() {
        let mut r = KillRing::default();
        r.append("one");
        let _ = r.yank();
        assert!(r.yanking);
        r.killing = false;
        r.append("two");
        assert!(!r.yanking);
    }
}
