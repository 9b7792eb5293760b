//! Property-based tests for IRC line parsing.
//!
//! Checks that the parser never panics on arbitrary input, that padding
//! always yields at least the requested arity without disturbing real
//! arguments, and that formatted lines parse back to the same arguments.

use proptest::prelude::*;
use purple_proto::{format::LineBuilder, Message};

fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

fn middle_param_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^: \r\n\0][^ \r\n\0]{0,20}").expect("valid regex")
}

fn trailing_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0]{0,200}").expect("valid regex")
}

fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[A-Z]{3,8}").expect("valid regex"),
        (0u16..1000).prop_map(|n| format!("{:03}", n)),
    ]
}

proptest! {
    #[test]
    fn parse_never_panics(line in "\\PC{0,600}") {
        let _ = line.parse::<Message>();
    }

    #[test]
    fn padding_covers_arity(
        command in command_strategy(),
        params in prop::collection::vec(middle_param_strategy(), 0..10),
        arity in 0usize..15,
    ) {
        let line = format!("{} {}", command, params.join(" "));
        let msg: Message = line.parse().unwrap();
        let padded = msg.padded(arity);

        prop_assert!(padded.len() >= arity);
        prop_assert_eq!(padded.len(), params.len().max(arity));
        for (i, p) in params.iter().enumerate() {
            prop_assert_eq!(padded[i], p.as_str());
        }
        for extra in padded.iter().skip(params.len()) {
            prop_assert_eq!(*extra, "");
        }
    }

    #[test]
    fn formatted_lines_parse_back(
        nick in nickname_strategy(),
        target in middle_param_strategy(),
        text in trailing_strategy(),
    ) {
        let line = LineBuilder::new("PRIVMSG").nick(&target).verbatim(&text).build();
        prop_assert!(line.ends_with("\r\n"));
        prop_assert_eq!(line.matches('\n').count(), 1);

        let prefixed = format!(":{}!u@h {}", nick, line);
        let msg: Message = prefixed.parse().unwrap();
        prop_assert_eq!(msg.source_nick(), Some(nick.as_str()));
        prop_assert_eq!(msg.arg(0), target.as_str());
        prop_assert_eq!(msg.arg(1), text.as_str());
    }
}
