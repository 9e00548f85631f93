//! Smart punctuation: curly quotes, dashes and ellipses

use super::delimiters::flanking;

const EN_DASH: &str = "\u{2013}";
const EM_DASH: &str = "\u{2014}";

/// Curly replacement for a straight quote between `before` and `after`.
///
/// Quotes are decided locally from their flanking: a quote that can only
/// open becomes an opening quote, anything else a closing one (double
/// quotes that can do neither open).
pub(crate) fn quote(ch: u8, before: Option<char>, after: Option<char>) -> &'static str {
    let (left, right) = flanking(before, after);
    let can_open = left && !right;
    match ch {
        b'\'' if can_open => "\u{2018}",
        b'\'' => "\u{2019}",
        _ if can_open => "\u{201C}",
        _ if right => "\u{201D}",
        _ => "\u{201C}",
    }
}

/// Replacement for a run of `count` hyphens (`count >= 2`).
///
/// Runs divisible by three become em dashes, even runs en dashes; other
/// lengths use em dashes followed by one or two en dashes.
pub(crate) fn dashes(count: usize) -> String {
    let (em, en) = if count % 3 == 0 {
        (count / 3, 0)
    } else if count % 2 == 0 {
        (0, count / 2)
    } else if count % 3 == 2 {
        ((count - 2) / 3, 1)
    } else {
        ((count - 4) / 3, 2)
    };
    let mut out = String::with_capacity((em + en) * 3);
    for _ in 0..em {
        out.push_str(EM_DASH);
    }
    for _ in 0..en {
        out.push_str(EN_DASH);
    }
    out
}

pub(crate) const ELLIPSIS: &str = "\u{2026}";
