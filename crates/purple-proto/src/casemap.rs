//! RFC 1459 case mapping.
//!
//! IRC treats `[]\~` as the uppercase forms of `{}|^`. Nick and channel
//! lookups go through [`irc_to_lower`] so two spellings of one name land on
//! the same key.

/// Lowercase a single character using RFC 1459 case mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Lowercase a string using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive comparison under RFC 1459 case mapping.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars()
            .zip(b.chars())
            .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

/// Normalize a nick or channel name for use as a lookup key.
pub fn normalize(name: &str) -> String {
    irc_to_lower(name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irc_to_lower() {
        assert_eq!(irc_to_lower("HELLO"), "hello");
        assert_eq!(irc_to_lower("#Channel[1]"), "#channel{1}");
        assert_eq!(irc_to_lower("Nick\\Away"), "nick|away");
        assert_eq!(irc_to_lower("Test~Name"), "test^name");
    }

    #[test]
    fn test_irc_eq() {
        assert!(irc_eq("Nick[a]", "nick{A}"));
        assert!(!irc_eq("nick", "nick_"));
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize(" Bob "), "bob");
    }
}
