use std::borrow::Cow;

use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

/// Ellipsis appended to excerpts that were cut short
const ELLIPSIS: &str = "...";

/// Applies canonical composition (NFC) to a string.
///
/// Returns `Cow::Borrowed` when the input is already known to be in NFC,
/// which is the overwhelmingly common case for feed text.
pub fn to_nfc(s: &str) -> Cow<'_, str> {
    match is_nfc_quick(s.chars()) {
        IsNormalized::Yes => Cow::Borrowed(s),
        _ => Cow::Owned(s.nfc().collect()),
    }
}

/// Normalizes a feed text field: NFC composition, then surrounding whitespace trimmed.
///
/// # Examples
///
/// ```
/// use feedsift::util::normalize_text;
///
/// // "e" + COMBINING ACUTE ACCENT composes to a single "é"
/// assert_eq!(normalize_text("  Cafe\u{301}  "), "Caf\u{e9}");
/// ```
pub fn normalize_text(s: &str) -> String {
    to_nfc(s).trim().to_string()
}

/// Folds text into the form used for keyword comparison.
///
/// The result is NFC-normalized and lowercased. Lowercasing can produce
/// decomposed sequences (e.g. `İ` → `i̇`), so NFC is applied again afterwards.
/// No diacritic stripping happens: `"Café"` and `"cafe"` stay distinct.
pub fn fold_for_match(s: &str) -> String {
    let lowered = to_nfc(s).to_lowercase();
    to_nfc(&lowered).into_owned()
}

/// Shortens `s` to at most `max_chars` characters, appending "..." when cut.
///
/// Counts Unicode scalar values, never splitting a character. A `max_chars`
/// of zero disables truncation.
pub fn excerpt(s: &str, max_chars: usize) -> Cow<'_, str> {
    if max_chars == 0 {
        return Cow::Borrowed(s);
    }
    match s.char_indices().nth(max_chars) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => Cow::Owned(format!("{}{}", s[..cut].trim_end(), ELLIPSIS)),
    }
}

/// SEC-001: Removes control characters before feed text is written to a terminal.
///
/// Tab and newline survive; every other C0 control, DEL and the C1 range are
/// dropped. Dropping ESC defuses ANSI sequences, leaving their parameters as
/// inert printable text.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c.is_control() && c != '\t' && c != '\n';

    if !s.chars().any(is_unsafe) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_unsafe(c)).collect())
}
