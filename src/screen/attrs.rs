//! Text attribute spans and the SGR escape sequences that drive them.

/// Reset all attributes to default.
pub const RESET: &str = "\x1b[0m";
/// Bold.
pub const BOLD: &str = "\x1b[1m";
/// Dim / faint.
pub const DIM: &str = "\x1b[2m";
/// Underline.
pub const UNDERLINE: &str = "\x1b[4m";
/// Reverse video.
pub const REVERSE: &str = "\x1b[7m";

pub const FG_DEFAULT: &str = "\x1b[39m";
pub const FG_BLACK: &str = "\x1b[30m";
pub const FG_BLUE: &str = "\x1b[94m";
pub const FG_BROWN: &str = "\x1b[33m";
pub const FG_CYAN: &str = "\x1b[36m";
pub const FG_DARK_BLUE: &str = "\x1b[34m";
pub const FG_DARK_GRAY: &str = "\x1b[90m";
pub const FG_DARK_GREEN: &str = "\x1b[32m";
pub const FG_DARK_RED: &str = "\x1b[31m";
pub const FG_FUCHSIA: &str = "\x1b[95m";
pub const FG_GREEN: &str = "\x1b[92m";
pub const FG_LIGHT_GRAY: &str = "\x1b[37m";
pub const FG_PURPLE: &str = "\x1b[35m";
pub const FG_RED: &str = "\x1b[91m";
pub const FG_TURQUOISE: &str = "\x1b[96m";
pub const FG_WHITE: &str = "\x1b[97m";
pub const FG_YELLOW: &str = "\x1b[93m";

pub const BG_DEFAULT: &str = "\x1b[49m";
pub const BG_BLACK: &str = "\x1b[40m";
pub const BG_BLUE: &str = "\x1b[104m";
pub const BG_BROWN: &str = "\x1b[43m";
pub const BG_CYAN: &str = "\x1b[46m";
pub const BG_DARK_BLUE: &str = "\x1b[44m";
pub const BG_DARK_GRAY: &str = "\x1b[100m";
pub const BG_DARK_GREEN: &str = "\x1b[42m";
pub const BG_DARK_RED: &str = "\x1b[41m";
pub const BG_FUCHSIA: &str = "\x1b[105m";
pub const BG_GREEN: &str = "\x1b[102m";
pub const BG_LIGHT_GRAY: &str = "\x1b[47m";
pub const BG_PURPLE: &str = "\x1b[45m";
pub const BG_RED: &str = "\x1b[101m";
pub const BG_TURQUOISE: &str = "\x1b[106m";
pub const BG_WHITE: &str = "\x1b[107m";
pub const BG_YELLOW: &str = "\x1b[103m";

/// An escape applied to a contiguous span of displayed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AttrSpan {
    /// The range of text to apply the attribute to, as
    /// `text[start_pos..end_pos]`.
    pub start_pos: usize,
    pub end_pos: usize,
    /// The escape sequence establishing the attribute.
    pub value: String,
}

/// Adjust spans for an insertion of `n` characters at `cursor`.
///
/// Spans ending at or before the cursor are untouched, spans starting after
/// it shift right, and spans straddling it grow to cover the new text.
pub(crate) fn shift_for_insert(attrs: &mut [AttrSpan], cursor: usize, n: usize) {
    for attr in attrs.iter_mut() {
        if attr.end_pos <= cursor {
            continue;
        }
        if attr.start_pos > cursor {
            attr.start_pos += n;
        }
        attr.end_pos += n;
    }
}

/// Adjust spans for an erasure of `text[start..end]`.
///
/// Spans after the hole shift left, spans overlapping it are clipped by the
/// overlap, and spans left empty are dropped.
pub(crate) fn clip_for_erase(attrs: &mut Vec<AttrSpan>, start: usize, end: usize) {
    attrs.retain_mut(|attr| {
        if start >= attr.end_pos {
            // Attribute fully before the erased span.
            //     attr: +-------+
            //     span:         +-------+
            return true;
        }
        if end <= attr.start_pos {
            // Attribute fully after the erased span.
            //     attr:         +-------+
            //     span: +-------+
            attr.start_pos -= end - start;
            attr.end_pos -= end - start;
            return true;
        }
        let overlap_start = attr.start_pos.max(start);
        let overlap_end = attr.end_pos.min(end);
        attr.end_pos -= overlap_end - overlap_start;
        if attr.start_pos >= attr.end_pos {
            return false;
        }
        if start < attr.start_pos {
            attr.end_pos -= attr.start_pos - start;
            attr.start_pos = start;
        }
        true
    });
}
