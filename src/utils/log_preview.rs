// Helpers for keeping extracted text safe to log.

use std::borrow::Cow;

/// Returns at most `max_chars` characters of `s` on a single line, with
/// `suffix` appended when something was cut. Newlines become spaces so a
/// preview never breaks a log line.
pub fn text_preview<'a>(s: &'a str, max_chars: usize, suffix: &str) -> Cow<'a, str> {
    let needs_cut = s.char_indices().nth(max_chars).map(|(idx, _)| idx);
    let single_line = !s.contains(['\n', '\r']);

    match (needs_cut, single_line) {
        (None, true) => Cow::Borrowed(s),
        (None, false) => Cow::Owned(flatten(s)),
        (Some(end), _) => {
            let mut out = flatten(&s[..end]);
            out.push_str(suffix);
            Cow::Owned(out)
        }
    }
}

fn flatten(s: &str) -> String {
    s.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
