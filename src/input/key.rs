//! Key event types.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// The decoder only ever reports Ctrl and Alt; terminals fold Shift into
    /// the character itself for the sequences this crate understands.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        /// Control key.
        const CTRL = 0b0000_0001;
        /// Alt/Meta key (also produced by a leading ESC).
        const ALT = 0b0000_0010;
    }
}

/// A key code produced by the input decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key, including space and newline.
    Char(char),
    /// Backspace (DEL, 0x7f).
    Backspace,
    /// Enter/Return (CR).
    Enter,
    /// Tab.
    Tab,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page Up.
    PageUp,
    /// Page Down.
    PageDown,
    /// Forward delete.
    Delete,
    /// Bracketed paste start marker (`ESC [ 200 ~`).
    PasteStart,
    /// Bracketed paste end marker (`ESC [ 201 ~`).
    PasteEnd,
    /// An escape sequence the decoder does not recognize.
    Unknown,
}

impl KeyCode {
    /// Get the character if this is a character key.
    #[must_use]
    pub fn char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }
}

/// A decoded key with its modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key code.
    pub code: KeyCode,
    /// Modifier keys held.
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a new key event.
    #[must_use]
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Create a key event with no modifiers.
    #[must_use]
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    /// Create a character key event.
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }

    /// Create a Ctrl+char event.
    #[must_use]
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CTRL)
    }

    /// Create an Alt+char event.
    #[must_use]
    pub fn alt(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::ALT)
    }

    /// Add modifiers to this event.
    #[must_use]
    pub fn with_modifiers(self, modifiers: KeyModifiers) -> Self {
        Self::new(self.code, self.modifiers | modifiers)
    }

    /// The character this key would insert into the input, if any.
    ///
    /// Returns `None` for named keys, for keys carrying modifiers, and for
    /// characters the screen refuses to display: anything below space other
    /// than newline, and the zero-width joiner (multi-codepoint emoji are
    /// unsupported).
    #[must_use]
    pub fn printable_char(&self) -> Option<char> {
        if !self.modifiers.is_empty() {
            return None;
        }
        match self.code {
            KeyCode::Char(c) if crate::screen::is_printable(c) => Some(c),
            _ => None,
        }
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        Self::char(c)
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::key(code)
    }
}

impl fmt::Display for KeyEvent {
    /// Render the key the way binding declarations spell it, for trace
    /// output: `Control-a`, `Meta-<left>`, `x`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CTRL) {
            f.write_str("Control-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Meta-")?;
        }
        match self.code {
            KeyCode::Char(c) if c < ' ' => write!(f, "{:?}", c),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Backspace => f.write_str("<backspace>"),
            KeyCode::Enter => f.write_str("<enter>"),
            KeyCode::Tab => f.write_str("<tab>"),
            KeyCode::Up => f.write_str("<up>"),
            KeyCode::Down => f.write_str("<down>"),
            KeyCode::Left => f.write_str("<left>"),
            KeyCode::Right => f.write_str("<right>"),
            KeyCode::Home => f.write_str("<home>"),
            KeyCode::End => f.write_str("<end>"),
            KeyCode::PageUp => f.write_str("<page-up>"),
            KeyCode::PageDown => f.write_str("<page-down>"),
            KeyCode::Delete => f.write_str("<delete>"),
            KeyCode::PasteStart => f.write_str("<paste-start>"),
            KeyCode::PasteEnd => f.write_str("<paste-end>"),
            KeyCode::Unknown => f.write_str("<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_event_creation() {
        let event = KeyEvent::char('a');
        assert_eq!(event.code, KeyCode::Char('a'));
        assert!(event.modifiers.is_empty());

        let event = KeyEvent::ctrl('w');
        assert!(event.modifiers.contains(KeyModifiers::CTRL));
        assert!(!event.modifiers.contains(KeyModifiers::ALT));
    }

    #[test]
    fn test_printable_char() {
        assert_eq!(KeyEvent::char('x').printable_char(), Some('x'));
        assert_eq!(KeyEvent::char('\n').printable_char(), Some('\n'));
        assert_eq!(KeyEvent::char('日').printable_char(), Some('日'));
        assert_eq!(KeyEvent::ctrl('x').printable_char(), None);
        assert_eq!(KeyEvent::alt('x').printable_char(), None);
        assert_eq!(KeyEvent::key(KeyCode::Left).printable_char(), None);
        // Control characters other than newline are rejected.
        assert_eq!(KeyEvent::char('\x07').printable_char(), None);
        // Zero-width joiner is dropped by design.
        assert_eq!(KeyEvent::char('\u{200d}').printable_char(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyEvent::ctrl('a').to_string(), "Control-a");
        assert_eq!(KeyEvent::alt('b').to_string(), "Meta-b");
        assert_eq!(
            KeyEvent::new(KeyCode::Left, KeyModifiers::ALT).to_string(),
            "Meta-<left>"
        );
        assert_eq!(
            KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CTRL | KeyModifiers::ALT).to_string(),
            "Control-Meta-h"
        );
        assert_eq!(KeyEvent::key(KeyCode::Unknown).to_string(), "<unknown>");
    }
}
