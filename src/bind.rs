//! Key bindings and the base editing commands.
//!
//! Bindings are declared in a small text form, `bind <key> <command>`,
//! where `<key>` is zero or more `Control-`/`Meta-` prefixes followed by a
//! named key or a single character. The default table is parsed at
//! construction; since it is static configuration, a parse failure there is
//! a programming error and panics.

use crate::error::{Error, Result};
use crate::input::{KeyCode, KeyEvent, KeyModifiers};
use crate::prompt::State;
use std::collections::HashMap;

/// An editing command a key can be bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Command {
    Abort,
    BackwardChar,
    BackwardDeleteChar,
    BackwardKillLine,
    BackwardKillWord,
    BackwardWord,
    BeginningOfLine,
    Cancel,
    ClearScreen,
    Complete,
    DeleteChar,
    DeleteHorizontalSpace,
    EndOfLine,
    Enter,
    ExitOrDeleteChar,
    FinishOrEnter,
    ForwardChar,
    ForwardSearchHistory,
    ForwardWord,
    InsertChar,
    KillLine,
    KillWord,
    NextHistory,
    PreviousHistory,
    ReverseSearchHistory,
    SetMark,
    TransposeChars,
    TransposeWords,
    Undo,
    Yank,
    YankPop,
}

impl Command {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "abort" => Self::Abort,
            "backward-char" => Self::BackwardChar,
            "backward-delete-char" => Self::BackwardDeleteChar,
            "backward-kill-line" => Self::BackwardKillLine,
            "backward-kill-word" => Self::BackwardKillWord,
            "backward-word" => Self::BackwardWord,
            "beginning-of-line" => Self::BeginningOfLine,
            "cancel" => Self::Cancel,
            "clear-screen" => Self::ClearScreen,
            "complete" => Self::Complete,
            "delete-char" => Self::DeleteChar,
            "delete-horizontal-space" => Self::DeleteHorizontalSpace,
            "end-of-line" => Self::EndOfLine,
            "enter" => Self::Enter,
            "exit-or-delete-char" => Self::ExitOrDeleteChar,
            "finish-or-enter" => Self::FinishOrEnter,
            "forward-char" => Self::ForwardChar,
            "forward-search-history" => Self::ForwardSearchHistory,
            "forward-word" => Self::ForwardWord,
            "insert-char" => Self::InsertChar,
            "kill-line" => Self::KillLine,
            "kill-word" => Self::KillWord,
            "next-history" => Self::NextHistory,
            "previous-history" => Self::PreviousHistory,
            "reverse-search-history" => Self::ReverseSearchHistory,
            "set-mark" => Self::SetMark,
            "transpose-chars" => Self::TransposeChars,
            "transpose-words" => Self::TransposeWords,
            "undo" => Self::Undo,
            "yank" => Self::Yank,
            "yank-pop" => Self::YankPop,
            // Aliases.
            "unix-line-discard" => Self::BackwardKillLine,
            _ => return None,
        })
    }
}

pub(crate) const DEFAULT_BINDINGS: &str = r"
bind Backspace       backward-delete-char
bind Delete          delete-char
bind Down            next-history
bind End             end-of-line
bind Enter           finish-or-enter
bind Home            beginning-of-line
bind Left            backward-char
bind Right           forward-char
bind Tab             complete
bind Up              previous-history
bind Control-Left    backward-word
bind Control-Right   forward-word
bind Control-Space   set-mark
bind Control-_       undo
bind Control-a       beginning-of-line
bind Control-b       backward-char
bind Control-c       cancel
bind Control-d       exit-or-delete-char
bind Control-e       end-of-line
bind Control-f       forward-char
bind Control-g       abort
bind Control-h       backward-delete-char
bind Control-k       kill-line
bind Control-l       clear-screen
bind Control-n       next-history
bind Control-p       previous-history
bind Control-r       reverse-search-history
bind Control-s       forward-search-history
bind Control-t       transpose-chars
bind Control-u       backward-kill-line
bind Control-w       backward-kill-word
bind Control-y       yank
bind Meta-Backspace  backward-kill-word
bind Meta-Control-h  backward-kill-word
bind Meta-Enter      enter
bind Meta-Left       backward-word
bind Meta-Right      forward-word
bind Meta-\          delete-horizontal-space
bind Meta-b          backward-word
bind Meta-d          kill-word
bind Meta-f          forward-word
bind Meta-t          transpose-words
bind Meta-y          yank-pop
";

fn named_key(name: &str) -> Option<KeyCode> {
    Some(match name {
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "down" => KeyCode::Down,
        "end" => KeyCode::End,
        "enter" => KeyCode::Enter,
        "home" => KeyCode::Home,
        "left" => KeyCode::Left,
        "page-down" => KeyCode::PageDown,
        "page-up" => KeyCode::PageUp,
        "right" => KeyCode::Right,
        "space" => KeyCode::Char(' '),
        "tab" => KeyCode::Tab,
        "up" => KeyCode::Up,
        _ => return None,
    })
}

/// Parse one `bind <key> <command>` declaration.
pub(crate) fn parse_binding(binding: &str) -> Result<(KeyEvent, Command)> {
    const CONTROL_PREFIX: &str = "Control-";
    const META_PREFIX: &str = "Meta-";

    let parts: Vec<&str> = binding.split_whitespace().collect();
    if parts.len() != 3 || parts[0] != "bind" {
        return Err(Error::Binding(format!("[{binding}]")));
    }

    let cmd = Command::from_name(parts[2])
        .ok_or_else(|| Error::Binding(format!("unknown command: {}", parts[2])))?;

    let orig_key = parts[1];
    let mut mods = KeyModifiers::empty();
    let mut spec = parts[1];
    loop {
        if let Some(rest) = spec.strip_prefix(CONTROL_PREFIX) {
            if mods.contains(KeyModifiers::CTRL) {
                return Err(Error::Binding(format!("invalid key: {orig_key:?}")));
            }
            mods |= KeyModifiers::CTRL;
            spec = rest;
            continue;
        }
        if let Some(rest) = spec.strip_prefix(META_PREFIX) {
            if mods.contains(KeyModifiers::ALT) {
                return Err(Error::Binding(format!("invalid key: {orig_key:?}")));
            }
            mods |= KeyModifiers::ALT;
            spec = rest;
            continue;
        }
        break;
    }

    let code = match named_key(&spec.to_lowercase()) {
        Some(code) => code,
        None => {
            let mut chars = spec.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return Err(Error::Binding(format!("invalid key: {orig_key:?}"))),
            }
        }
    };

    Ok((KeyEvent::new(code, mods), cmd))
}

/// Parse a block of binding declarations into `map`. When Meta is bound on
/// a cased character, the opposite case is bound to the same command.
pub(crate) fn parse_bindings(
    map: &mut HashMap<KeyEvent, Command>,
    data: &str,
) -> Result<()> {
    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, cmd) = parse_binding(line)?;
        map.insert(key, cmd);
        if key.modifiers.contains(KeyModifiers::ALT) {
            if let KeyCode::Char(c) = key.code {
                let twin = if c.is_lowercase() {
                    c.to_ascii_uppercase()
                } else if c.is_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    continue;
                };
                map.insert(KeyEvent::new(KeyCode::Char(twin), key.modifiers), cmd);
            }
        }
    }
    Ok(())
}

/// Run `cmd` if it is a base editing command. Unknown commands are accepted
/// no-ops so that sub-dispatcher commands falling through do not error.
pub(crate) fn dispatch_base(s: &mut State, cmd: Command, key: KeyEvent) -> Result<bool> {
    match cmd {
        Command::BackwardChar => {
            let target = s.screen.prev_grapheme_start();
            s.screen.move_to(target);
        }
        Command::BackwardDeleteChar => {
            let target = s.screen.prev_grapheme_start();
            s.screen.erase_to(target);
        }
        Command::BackwardWord => {
            let target = s.screen.prev_word_start(s.screen.position());
            s.screen.move_to(target);
        }
        Command::BeginningOfLine => {
            s.screen.move_to(0);
        }
        Command::Cancel => {
            if s.screen.text().is_empty() {
                return Err(Error::Eof);
            }
            // Leave the canceled input on screen.
            s.screen.cancel();
        }
        Command::ClearScreen => {
            s.screen.refresh();
        }
        Command::DeleteChar => {
            let target = s.screen.next_grapheme_end();
            s.screen.erase_to(target);
        }
        Command::DeleteHorizontalSpace => {
            // Delete all whitespace around the cursor.
            let pos = s.screen.position();
            let text = s.screen.text();
            let mut prev_word_end = pos;
            while prev_word_end > 0 {
                if !text[prev_word_end - 1].is_whitespace() {
                    break;
                }
                prev_word_end -= 1;
            }
            let mut next_word_start = prev_word_end;
            while next_word_start < text.len() {
                if !text[next_word_start].is_whitespace() {
                    break;
                }
                next_word_start += 1;
            }
            if next_word_start >= pos && prev_word_end < next_word_start {
                s.screen.move_to(prev_word_end);
                s.screen.erase_to(next_word_start);
            }
        }
        Command::EndOfLine => {
            let end = s.screen.end();
            s.screen.move_to(end);
        }
        Command::Enter => {
            s.screen.insert(&['\n']);
        }
        Command::ExitOrDeleteChar => {
            if s.screen.text().is_empty() {
                return Err(Error::Eof);
            }
            let target = s.screen.next_grapheme_end();
            s.screen.erase_to(target);
        }
        Command::FinishOrEnter => {
            let finished = match &s.input_finished {
                None => true,
                Some(finished) => finished(&s.screen.text_string()),
            };
            if finished {
                s.screen.newline();
                return Err(Error::Eof);
            }
            s.screen.insert(&['\n']);
        }
        Command::ForwardChar => {
            let target = s.screen.next_grapheme_end();
            s.screen.move_to(target);
        }
        Command::ForwardWord => {
            let target = s.screen.next_word_end(s.screen.position());
            s.screen.move_to(target);
        }
        Command::InsertChar => match key.printable_char() {
            Some(c) => s.screen.insert(&[c]),
            None => s.screen.bell(),
        },
        Command::SetMark | Command::Undo => {
            // Bound but deliberately inert.
        }
        Command::TransposeChars => {
            // Swap the graphemes on either side of the cursor.
            let target = s.screen.prev_grapheme_start();
            let erased = s.screen.erase_to(target);
            if !erased.is_empty() {
                let target = s.screen.next_grapheme_end();
                s.screen.move_to(target);
                let chars: Vec<char> = erased.chars().collect();
                s.screen.insert(&chars);
            }
        }
        Command::TransposeWords => {
            // Swap the word before the cursor with the word after it.
            let next_word_end = s.screen.next_word_end(s.screen.position());
            let next_word_start = s.screen.prev_word_start(next_word_end);
            let prev_word_start = s.screen.prev_word_start(next_word_start);
            let prev_word_end = s.screen.next_word_end(prev_word_start);
            if prev_word_start != next_word_start {
                s.screen.move_to(next_word_start);
                let next_word = s.screen.erase_to(next_word_end);
                s.screen.move_to(prev_word_start);
                let prev_word = s.screen.erase_to(prev_word_end);
                let chars: Vec<char> = next_word.chars().collect();
                s.screen.insert(&chars);
                let target = s.screen.position() + (next_word_start - prev_word_end);
                s.screen.move_to(target);
                let chars: Vec<char> = prev_word.chars().collect();
                s.screen.insert(&chars);
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}
