//! Helpers for `nick!user@host` message sources.

/// Nickname part of a `nick!user@host` source.
///
/// ```
/// use purple_proto::mask_nick;
///
/// assert_eq!(mask_nick("nick!user@host"), "nick");
/// assert_eq!(mask_nick("irc.example.net"), "irc.example.net");
/// ```
pub fn mask_nick(source: &str) -> &str {
    match source.find('!') {
        Some(bang) => &source[..bang],
        None => source,
    }
}

/// `user@host` part of a `nick!user@host` source, empty when there is none.
///
/// ```
/// use purple_proto::mask_userhost;
///
/// assert_eq!(mask_userhost("nick!user@host"), "user@host");
/// assert_eq!(mask_userhost("nick"), "");
/// ```
pub fn mask_userhost(source: &str) -> &str {
    match source.find('!') {
        Some(bang) => &source[bang + 1..],
        None => "",
    }
}

/// True if `name` looks like a channel (`#` or `&` prefixed).
pub fn is_channel(name: &str) -> bool {
    name.starts_with('#') || name.starts_with('&')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_nick_empty_nick() {
        assert_eq!(mask_nick("!user@host"), "");
    }

    #[test]
    fn test_is_channel() {
        assert!(is_channel("#rust"));
        assert!(is_channel("&local"));
        assert!(!is_channel("nick"));
        assert!(!is_channel(""));
    }
}
