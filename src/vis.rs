//! The "vis" visual encoding used by libedit for history file entries.
//!
//! Encoding maps whitespace and backslash to 3-digit octal escapes and other
//! control characters to `\^X` form, leaving everything else verbatim, so
//! that each history entry fits on one line of a text file. Decoding accepts
//! the wider escape set libedit itself understands. The `%<hex>`, `&<amp>`,
//! and `=<mime>` schemes are not used in history files and not handled.

use std::fmt;
use std::fmt::Write as _;

/// Error type for vis decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum VisError {
    /// The input ended in the middle of an escape.
    Truncated,
    /// An escape with an unknown introducer character.
    UnknownEscape(char),
    /// An octal or hex escape with non-digit characters.
    BadDigits,
    /// The escape decodes to a value that is not a Unicode scalar.
    BadCodepoint(u32),
}

impl fmt::Display for VisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated escape"),
            Self::UnknownEscape(c) => write!(f, "unknown escape \\{c}"),
            Self::BadDigits => write!(f, "invalid digits in escape"),
            Self::BadCodepoint(v) => write!(f, "escape denotes invalid codepoint {v:#x}"),
        }
    }
}

impl std::error::Error for VisError {}

/// Encode a string for storage as one line of a history file.
pub(crate) fn encode_vis(s: &str) -> String {
    let mut buf = String::new();
    for c in s.chars() {
        if c.is_whitespace() || c == '\\' {
            let _ = write!(buf, "\\{:03o}", c as u32);
        } else if c.is_control() {
            buf.push('\\');
            buf.push('^');
            if let Some(shifted) = char::from_u32(c as u32 + 0x40) {
                buf.push(shifted);
            }
        } else {
            buf.push(c);
        }
    }
    buf
}

/// Decode one vis-encoded history file line.
pub(crate) fn decode_vis(s: &str) -> Result<String, VisError> {
    let chars: Vec<char> = s.chars().collect();
    let mut buf = String::new();
    let mut i = 0;

    let mut next = |i: &mut usize| -> Result<char, VisError> {
        let c = *chars.get(*i).ok_or(VisError::Truncated)?;
        *i += 1;
        Ok(c)
    };

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' {
            buf.push(c);
            continue;
        }

        let esc = next(&mut i)?;
        match esc {
            '0'..='7' => {
                let d1 = octal_digit(esc)?;
                let d2 = octal_digit(next(&mut i)?)?;
                let d3 = octal_digit(next(&mut i)?)?;
                push_codepoint(&mut buf, (d1 << 6) | (d2 << 3) | d3)?;
            }
            'x' => {
                let d1 = hex_digit(next(&mut i)?)?;
                let d2 = hex_digit(next(&mut i)?)?;
                push_codepoint(&mut buf, (d1 << 4) | d2)?;
            }
            'a' => buf.push('\x07'),
            'b' => buf.push('\x08'),
            'f' => buf.push('\x0c'),
            'n' => buf.push('\n'),
            'r' => buf.push('\r'),
            't' => buf.push('\t'),
            'v' => buf.push('\x0b'),
            '\\' => buf.push('\\'),
            'M' => {
                // Meta: \M-X sets the high bit on X, \M^X on the control
                // form of X.
                match next(&mut i)? {
                    '-' => {
                        let c = next(&mut i)?;
                        push_codepoint(&mut buf, c as u32 | 0x80)?;
                    }
                    '^' => {
                        let c = next(&mut i)?;
                        push_codepoint(&mut buf, control_value(c) | 0x80)?;
                    }
                    other => return Err(VisError::UnknownEscape(other)),
                }
            }
            '^' => {
                let c = next(&mut i)?;
                push_codepoint(&mut buf, control_value(c))?;
            }
            's' => buf.push(' '),
            'E' => buf.push('\x1b'),
            // Hidden newline or end marker.
            '\n' | '$' => {}
            other => return Err(VisError::UnknownEscape(other)),
        }
    }

    Ok(buf)
}

fn control_value(c: char) -> u32 {
    if c == '?' {
        0x7f
    } else {
        c as u32 & 0x1f
    }
}

fn octal_digit(c: char) -> Result<u32, VisError> {
    c.to_digit(8).ok_or(VisError::BadDigits)
}

fn hex_digit(c: char) -> Result<u32, VisError> {
    c.to_digit(16).ok_or(VisError::BadDigits)
}

fn push_codepoint(buf: &mut String, v: u32) -> Result<(), VisError> {
    let c = char::from_u32(v).ok_or(VisError::BadCodepoint(v))?;
    buf.push(c);
    Ok(())
}
