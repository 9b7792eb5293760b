//! String helpers for IRC length limits.

/// Truncate `s` to at most `max_bytes` bytes without splitting a UTF-8
/// codepoint.
///
/// ```
/// use purple_proto::util::truncate_utf8_safe;
///
/// assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
/// assert_eq!(truncate_utf8_safe("héllo", 2), "h");
/// assert_eq!(truncate_utf8_safe("hi", 10), "hi");
/// ```
#[inline]
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Split a message body into pieces no longer than `max_bytes`.
///
/// The body is first split on newlines; empty lines are dropped. Each line
/// is then cut on UTF-8 boundaries. A `max_bytes` of zero is treated as one.
///
/// ```
/// use purple_proto::util::split_message;
///
/// let chunks: Vec<_> = split_message("Hello World!\nbye", 5).collect();
/// assert_eq!(chunks, vec!["Hello", " Worl", "d!", "bye"]);
/// ```
pub fn split_message(s: &str, max_bytes: usize) -> impl Iterator<Item = &str> {
    let max_bytes = max_bytes.max(1);
    s.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .flat_map(move |line| SplitLine {
            remaining: line,
            max_bytes,
        })
}

struct SplitLine<'a> {
    remaining: &'a str,
    max_bytes: usize,
}

impl<'a> Iterator for SplitLine<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let mut chunk = truncate_utf8_safe(self.remaining, self.max_bytes);
        if chunk.is_empty() {
            // A single codepoint wider than the budget still has to go out.
            let width = self.remaining.chars().next().map_or(0, char::len_utf8);
            chunk = &self.remaining[..width];
        }
        self.remaining = &self.remaining[chunk.len()..];
        Some(chunk)
    }
}
