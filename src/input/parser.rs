//! Terminal input decoder.
//!
//! Turns raw bytes from the terminal into [`KeyEvent`]s. Rather than the
//! termcap/terminfo approach of deriving input sequences from `$TERM`, the
//! decoder recognizes a fixed set of escape sequences used by the large
//! majority (~75%) of the terminals in a terminfo database, and all modern
//! terminals. The same approach is used by linenoise and its descendants.
//!
//! See <https://invisible-island.net/xterm/xterm-function-keys.html> for the
//! xterm function keys and
//! <https://en.wikipedia.org/wiki/ANSI_escape_code#Terminal_input_sequences>
//! for the general structure of terminal input sequences.

use crate::input::key::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::OnceLock;

/// Error type for input decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Input buffer is empty.
    Empty,
    /// A recognized sequence prefix (or partial UTF-8 scalar) ran out of
    /// bytes. No input is consumed; read more and retry with the same buffer.
    Incomplete,
    /// The leading byte does not begin a valid UTF-8 scalar. The caller
    /// should discard one byte and retry.
    InvalidUtf8,
}

/// Result of decoding one key: the event and the number of bytes consumed.
pub type ParseResult = std::result::Result<(KeyEvent, usize), ParseError>;

const ESC: u8 = 0x1b;

/// The supported escape sequences.
///
/// The same control sequence is sometimes used by different terminals to
/// represent different keys, so no fixed table can cover everything; this
/// one covers the common subset.
const SUPPORTED_SEQS: &[(&[u8], KeyCode, KeyModifiers)] = &[
    (b"\x1b[3~", KeyCode::Delete, KeyModifiers::empty()),
    (b"\x1bOB", KeyCode::Down, KeyModifiers::empty()),
    (b"\x1b[B", KeyCode::Down, KeyModifiers::empty()),
    (b"\x1bOb", KeyCode::Down, KeyModifiers::CTRL),
    (b"\x1b[1;5B", KeyCode::Down, KeyModifiers::CTRL),
    (b"\x1b[1;3B", KeyCode::Down, KeyModifiers::ALT),
    (b"\x1b[1;9B", KeyCode::Down, KeyModifiers::ALT),
    (b"\x1bOF", KeyCode::End, KeyModifiers::empty()),
    (b"\x1b[F", KeyCode::End, KeyModifiers::empty()),
    (b"\x1b[4~", KeyCode::End, KeyModifiers::empty()),
    (b"\x1b[8~", KeyCode::End, KeyModifiers::empty()),
    (b"\x1bOH", KeyCode::Home, KeyModifiers::empty()),
    (b"\x1b[H", KeyCode::Home, KeyModifiers::empty()),
    (b"\x1b[1~", KeyCode::Home, KeyModifiers::empty()),
    (b"\x1b[7~", KeyCode::Home, KeyModifiers::empty()),
    (b"\x1bOD", KeyCode::Left, KeyModifiers::empty()),
    (b"\x1b[D", KeyCode::Left, KeyModifiers::empty()),
    (b"\x1bOd", KeyCode::Left, KeyModifiers::CTRL),
    (b"\x1b[1;5D", KeyCode::Left, KeyModifiers::CTRL),
    (b"\x1b[1;3D", KeyCode::Left, KeyModifiers::ALT),
    (b"\x1b[1;9D", KeyCode::Left, KeyModifiers::ALT),
    (b"\x1b[6~", KeyCode::PageDown, KeyModifiers::empty()),
    (b"\x1b[5~", KeyCode::PageUp, KeyModifiers::empty()),
    (b"\x1b[200~", KeyCode::PasteStart, KeyModifiers::empty()),
    (b"\x1b[201~", KeyCode::PasteEnd, KeyModifiers::empty()),
    (b"\x1bOC", KeyCode::Right, KeyModifiers::empty()),
    (b"\x1b[C", KeyCode::Right, KeyModifiers::empty()),
    (b"\x1bOc", KeyCode::Right, KeyModifiers::CTRL),
    (b"\x1b[1;5C", KeyCode::Right, KeyModifiers::CTRL),
    (b"\x1b[1;3C", KeyCode::Right, KeyModifiers::ALT),
    (b"\x1b[1;9C", KeyCode::Right, KeyModifiers::ALT),
    (b"\x1bOA", KeyCode::Up, KeyModifiers::empty()),
    (b"\x1b[A", KeyCode::Up, KeyModifiers::empty()),
    (b"\x1bOa", KeyCode::Up, KeyModifiers::CTRL),
    (b"\x1b[1;5A", KeyCode::Up, KeyModifiers::CTRL),
    (b"\x1b[1;3A", KeyCode::Up, KeyModifiers::ALT),
    (b"\x1b[1;9A", KeyCode::Up, KeyModifiers::ALT),
];

/// Prefix trie over [`SUPPORTED_SEQS`].
#[derive(Debug, Default)]
struct SeqTrie {
    children: Vec<SeqTrie>,
    key: u8,
    value: Option<(KeyCode, KeyModifiers)>,
}

impl SeqTrie {
    fn find_child(&self, b: u8) -> Option<&SeqTrie> {
        self.children.iter().find(|c| c.key == b)
    }

    fn find_child_mut(&mut self, b: u8) -> Option<usize> {
        self.children.iter().position(|c| c.key == b)
    }

    fn add(&mut self, seq: &[u8], value: (KeyCode, KeyModifiers)) {
        let mut node = self;
        for &b in seq {
            let idx = match node.find_child_mut(b) {
                Some(idx) => idx,
                None => {
                    node.children.push(SeqTrie {
                        key: b,
                        ..SeqTrie::default()
                    });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        node.value = Some(value);
    }

    /// Match the longest sequence prefix of `buf`.
    ///
    /// An unrecognized sequence is consumed through its terminator: by
    /// convention, the first byte in `[a-zA-Z~]` ends a sequence, which is
    /// the best that can be done without knowing every terminal's tables.
    fn lookup(&self, buf: &[u8], mods: KeyModifiers) -> ParseResult {
        let mut node = self;
        for (i, &b) in buf.iter().enumerate() {
            node = match node.find_child(b) {
                Some(child) => child,
                None => {
                    for (j, &t) in buf.iter().enumerate().skip(i) {
                        if t.is_ascii_alphabetic() || t == b'~' {
                            return Ok((KeyEvent::key(KeyCode::Unknown), j + 1));
                        }
                    }
                    return Err(ParseError::Incomplete);
                }
            };
            if node.children.is_empty() {
                let (code, seq_mods) = node.value.unwrap_or((KeyCode::Unknown, KeyModifiers::empty()));
                // The paste markers never carry modifiers, even when the
                // sequence arrived with an ESC prefix.
                let event = match code {
                    KeyCode::PasteStart | KeyCode::PasteEnd => KeyEvent::key(code),
                    _ => KeyEvent::new(code, seq_mods | mods),
                };
                return Ok((event, i + 1));
            }
        }
        // Matching a known prefix but out of bytes.
        Err(ParseError::Incomplete)
    }
}

fn seq_trie() -> &'static SeqTrie {
    static TRIE: OnceLock<SeqTrie> = OnceLock::new();
    TRIE.get_or_init(|| {
        let mut t = SeqTrie::default();
        for &(seq, code, mods) in SUPPORTED_SEQS {
            t.add(seq, (code, mods));
        }
        t
    })
}

/// Decode a single key from the front of `buf`.
///
/// On success, returns the key and the number of bytes consumed. On
/// [`ParseError::Incomplete`] nothing is consumed and the caller should read
/// more input before retrying with the extended buffer.
pub fn parse_key(buf: &[u8]) -> ParseResult {
    if buf.is_empty() {
        return Err(ParseError::Empty);
    }

    // A leading run of escapes that do not introduce a CSI/SS3 sequence each
    // set the Alt modifier: `ESC ESC [ D` is Alt+Left, `ESC b` is Alt+b.
    let mut mods = KeyModifiers::empty();
    let mut pos = 0;
    while buf.len() - pos >= 2 && buf[pos] == ESC && buf[pos + 1] != b'O' && buf[pos + 1] != b'[' {
        mods |= KeyModifiers::ALT;
        pos += 1;
    }

    if buf[pos] != ESC {
        let (event, n) = decode_scalar(&buf[pos..])?;
        return Ok((event.with_modifiers(mods), pos + n));
    }

    let (event, n) = seq_trie().lookup(&buf[pos..], mods)?;
    Ok((event, pos + n))
}

/// Decode a single non-escape byte or UTF-8 scalar.
fn decode_scalar(buf: &[u8]) -> ParseResult {
    let b = buf[0];
    let event = match b {
        0x7f => KeyEvent::key(KeyCode::Backspace),
        b'\r' => KeyEvent::key(KeyCode::Enter),
        b'\t' => KeyEvent::key(KeyCode::Tab),
        // A literal line feed inserts a newline rather than acting as Ctrl-J.
        b'\n' => KeyEvent::char('\n'),
        // NUL is what terminals send for Ctrl-Space.
        0x00 => KeyEvent::ctrl(' '),
        0x01..=0x1a => KeyEvent::ctrl((b - 1 + b'a') as char),
        // 0x1c-0x1f: Ctrl-\, Ctrl-], Ctrl-^, Ctrl-_.
        0x1c..=0x1f => KeyEvent::ctrl((b + 0x40) as char),
        0x20..=0x7e => KeyEvent::char(b as char),
        _ => {
            let len = utf8_len(b).ok_or(ParseError::InvalidUtf8)?;
            if buf.len() < len {
                return Err(ParseError::Incomplete);
            }
            let s = std::str::from_utf8(&buf[..len]).map_err(|_| ParseError::InvalidUtf8)?;
            let c = s.chars().next().ok_or(ParseError::InvalidUtf8)?;
            return Ok((KeyEvent::char(c), len));
        }
    };
    Ok((event, 1))
}

/// Expected length of a UTF-8 sequence from its leading byte.
fn utf8_len(b: u8) -> Option<usize> {
    if b & 0b1110_0000 == 0b1100_0000 {
        Some(2)
    } else if b & 0b1111_0000 == 0b1110_0000 {
        Some(3)
    } else if b & 0b1111_1000 == 0b1111_0000 {
        Some(4)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(buf: &[u8]) -> KeyEvent {
        let (event, _) = parse_key(buf).expect("complete key");
        event
    }

    #[test]
    fn test_parse_char() {
        assert_eq!(key(b"a"), KeyEvent::char('a'));
        let (event, consumed) = parse_key("«tail".as_bytes()).unwrap();
        assert_eq!(event, KeyEvent::char('«'));
        assert_eq!(consumed, '«'.len_utf8());
    }

    #[test]
    fn test_parse_control_bytes() {
        assert_eq!(key(&[0x01]), KeyEvent::ctrl('a'));
        assert_eq!(key(&[0x17]), KeyEvent::ctrl('w'));
        assert_eq!(key(&[0x1f]), KeyEvent::ctrl('_'));
        assert_eq!(key(&[0x00]), KeyEvent::ctrl(' '));
        assert_eq!(key(&[0x7f]), KeyEvent::key(KeyCode::Backspace));
        assert_eq!(key(b"\r"), KeyEvent::key(KeyCode::Enter));
        assert_eq!(key(b"\t"), KeyEvent::key(KeyCode::Tab));
        assert_eq!(key(b"\n"), KeyEvent::char('\n'));
    }

    #[test]
    fn test_parse_sequences() {
        let cases: &[(&[u8], KeyEvent)] = &[
            (b"\x1bb", KeyEvent::alt('b')),
            ("\x1b«".as_bytes(), KeyEvent::alt('«')),
            (b"\x1bOA", KeyEvent::key(KeyCode::Up)),
            (b"\x1bOb", KeyEvent::new(KeyCode::Down, KeyModifiers::CTRL)),
            (b"\x1b[A", KeyEvent::key(KeyCode::Up)),
            (b"\x1b[B", KeyEvent::key(KeyCode::Down)),
            (b"\x1b[C", KeyEvent::key(KeyCode::Right)),
            (b"\x1b[D", KeyEvent::key(KeyCode::Left)),
            (b"\x1b[H", KeyEvent::key(KeyCode::Home)),
            (b"\x1b[F", KeyEvent::key(KeyCode::End)),
            (b"\x1b[1;3A", KeyEvent::new(KeyCode::Up, KeyModifiers::ALT)),
            (b"\x1b[1;9C", KeyEvent::new(KeyCode::Right, KeyModifiers::ALT)),
            (b"\x1b[1;5D", KeyEvent::new(KeyCode::Left, KeyModifiers::CTRL)),
            (b"\x1b[1~", KeyEvent::key(KeyCode::Home)),
            (b"\x1b[3~", KeyEvent::key(KeyCode::Delete)),
            (b"\x1b[4~", KeyEvent::key(KeyCode::End)),
            (b"\x1b[5~", KeyEvent::key(KeyCode::PageUp)),
            (b"\x1b[6~", KeyEvent::key(KeyCode::PageDown)),
            (b"\x1b[7~", KeyEvent::key(KeyCode::Home)),
            (b"\x1b[8~", KeyEvent::key(KeyCode::End)),
            (b"\x1b[200~", KeyEvent::key(KeyCode::PasteStart)),
            (b"\x1b[201~", KeyEvent::key(KeyCode::PasteEnd)),
        ];
        for &(seq, expected) in cases {
            let (event, consumed) = parse_key(seq).unwrap_or_else(|e| panic!("{seq:?}: {e:?}"));
            assert_eq!(event, expected, "{seq:?}");
            assert_eq!(consumed, seq.len(), "{seq:?}");
        }
    }

    #[test]
    fn test_escape_prefix_adds_alt() {
        // An ESC prefix on any sequence adds Alt, except the paste markers
        // which never carry modifiers.
        let cases: &[&[u8]] = &[b"a", b"\x01", b"\x1bOA", b"\x1b[D", b"\x1b[3~", b"\x1bb"];
        for &seq in cases {
            let base = key(seq);
            let mut prefixed = vec![ESC];
            prefixed.extend_from_slice(seq);
            assert_eq!(
                key(&prefixed),
                base.with_modifiers(KeyModifiers::ALT),
                "{seq:?}"
            );
        }

        assert_eq!(key(b"\x1b\x1b[200~"), KeyEvent::key(KeyCode::PasteStart));
        assert_eq!(key(b"\x1b\x1b[201~"), KeyEvent::key(KeyCode::PasteEnd));
    }

    #[test]
    fn test_meta_ctrl() {
        // ESC followed by a control byte: Meta-Control-h.
        assert_eq!(
            key(b"\x1b\x08"),
            KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CTRL | KeyModifiers::ALT)
        );
        assert_eq!(
            key(b"\x1b\x7f"),
            KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT)
        );
        assert_eq!(
            key(b"\x1b\r"),
            KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)
        );
    }

    #[test]
    fn test_incomplete_sequences() {
        let incomplete: &[&[u8]] = &[b"\x1b", b"\x1b\x1b", b"\x1b[10", b"\x1b[1;", b"\x1b[9"];
        for &seq in incomplete {
            assert_eq!(parse_key(seq), Err(ParseError::Incomplete), "{seq:?}");
        }
        assert_eq!(parse_key(b""), Err(ParseError::Empty));
    }

    #[test]
    fn test_incomplete_utf8() {
        let bytes = "日".as_bytes();
        assert_eq!(parse_key(&bytes[..1]), Err(ParseError::Incomplete));
        assert_eq!(parse_key(&bytes[..2]), Err(ParseError::Incomplete));
        let (event, consumed) = parse_key(bytes).unwrap();
        assert_eq!(event, KeyEvent::char('日'));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(parse_key(&[0xff]), Err(ParseError::InvalidUtf8));
        assert_eq!(parse_key(&[0xc3, 0x28]), Err(ParseError::InvalidUtf8));
    }

    #[test]
    fn test_unknown_sequence_consumes_through_terminator() {
        // The unrecognized bytes are consumed up to and including the
        // conventional [a-zA-Z~] terminator; the remainder survives.
        let (event, consumed) = parse_key(b"\x1b[Gxyz").unwrap();
        assert_eq!(event, KeyEvent::key(KeyCode::Unknown));
        assert_eq!(consumed, 3);

        let (event, consumed) = parse_key(b"\x1b[1;5Eq").unwrap();
        assert_eq!(event, KeyEvent::key(KeyCode::Unknown));
        assert_eq!(consumed, 6);

        let (event, consumed) = parse_key(b"\x1b[9~rest").unwrap();
        assert_eq!(event, KeyEvent::key(KeyCode::Unknown));
        assert_eq!(consumed, 4);
    }
}
