//! Tab completion.
//!
//! Completions for the word at the cursor are shown inline as a dimmed,
//! non-committed hint appended to the word: the first candidate's tail,
//! followed by a comma-separated summary of the alternatives. Accepting a
//! hint commits only the unambiguous extension (the candidates' common
//! prefix) and then re-queries at the new cursor.

use crate::bind::Command;
use crate::error::Result;
use crate::input::KeyEvent;
use crate::prompt::State;
use crate::screen::{Screen, attrs};

/// Host-provided completion callback: given the input text and the word
/// bracketing the cursor as `text[word_start..word_end]`, returns candidate
/// completions in priority order.
pub type Completer = Box<dyn Fn(&[char], usize, usize) -> Vec<String> + Send>;

/// Column budget for the inline hint before it is truncated with `,...`.
const MAX_HINT_LEN: usize = 20;

/// A displayed hint and the word it annotates.
#[derive(Debug)]
struct Hint {
    word_start: usize,
    word_end: usize,
    /// The first candidate's head, replacing the word (and its casing) on
    /// accept.
    prefix: String,
    /// The dimmed text inserted after the word.
    suffix: Vec<char>,
    /// How many leading characters of `suffix` are common to every
    /// candidate.
    shared: usize,
}

#[derive(Default)]
pub(crate) struct Completion {
    completer: Option<Completer>,
    hint: Option<Hint>,
}

impl Completion {
    pub fn set_completer(&mut self, completer: Completer) {
        self.completer = Some(completer);
    }

    /// Compute and display a hint for the word at the cursor.
    fn try_complete(&mut self, screen: &mut Screen) {
        let Some(completer) = &self.completer else {
            return;
        };

        let pos = screen.position();
        let word_start = screen.prev_word_start(pos);
        let word_end = screen.next_word_end(word_start);
        if pos < word_start || pos > word_end {
            return;
        }

        let text: Vec<char> = screen.text().to_vec();
        let candidates = completer(&text, word_start, word_end);
        if candidates.is_empty() {
            return;
        }

        let word_len = word_end - word_start;
        let first: Vec<char> = candidates[0].chars().collect();
        let head = word_len.min(first.len());

        let mut suffix: Vec<char> = first[head..].to_vec();
        for cand in &candidates[1..] {
            let cand_len = cand.chars().count();
            if suffix.len() + 1 + cand_len > MAX_HINT_LEN {
                suffix.extend(",...".chars());
                break;
            }
            suffix.push(',');
            suffix.extend(cand.chars());
        }
        if suffix.is_empty() {
            return;
        }

        let hint = Hint {
            word_start,
            word_end,
            prefix: first[..head].iter().collect(),
            suffix,
            shared: common_prefix_len(&candidates).saturating_sub(word_len),
        };

        screen.move_to(word_end);
        screen.set_attrs(attrs::DIM);
        screen.insert(&hint.suffix);
        screen.set_attrs("");
        screen.move_to(pos);
        self.hint = Some(hint);
    }

    /// Accept the displayed hint: replace the word with the candidates'
    /// common prefix, then query again at the new cursor. Without a hint,
    /// just query.
    fn accept(&mut self, screen: &mut Screen) {
        if let Some(hint) = self.hint.take() {
            screen.move_to(hint.word_start);
            screen.erase_to(hint.word_end + hint.suffix.len());
            let mut replacement: Vec<char> = hint.prefix.chars().collect();
            replacement.extend(&hint.suffix[..hint.shared.min(hint.suffix.len())]);
            screen.insert(&replacement);
        }
        self.try_complete(screen);
    }

    /// Remove the displayed hint, if any, leaving the cursor where it was.
    ///
    /// An earlier dispatcher may have rewritten the buffer since the hint
    /// was displayed, so the recorded positions are clamped rather than
    /// trusted.
    fn cancel(&mut self, screen: &mut Screen) {
        if let Some(hint) = self.hint.take() {
            let saved = screen.position().min(hint.word_end);
            screen.move_to(hint.word_end);
            screen.erase_to(hint.word_end + hint.suffix.len());
            screen.move_to(saved);
        }
    }
}

/// Process the complete command; any other command removes a displayed
/// hint and declines.
pub(crate) fn dispatch(s: &mut State, cmd: Command, _key: KeyEvent) -> Result<bool> {
    let completion = &mut s.completion;
    let screen = &mut s.screen;
    match cmd {
        Command::Complete => {
            completion.accept(screen);
            Ok(true)
        }
        _ => {
            completion.cancel(screen);
            Ok(false)
        }
    }
}

/// Length in characters of the longest common prefix of `candidates`.
fn common_prefix_len(candidates: &[String]) -> usize {
    let first: Vec<char> = candidates[0].chars().collect();
    let mut shared = first.len();
    for cand in &candidates[1..] {
        let n = cand
            .chars()
            .zip(first.iter())
            .take_while(|(a, b)| a == *b)
            .count();
        shared = shared.min(n);
    }
    shared
}
