//! Nick collision fallback during registration.

use rand::Rng;

/// Fallbacks tried by bumping the last digit before a random suffix is
/// appended instead.
pub const MAX_DIGIT_FALLBACKS: u32 = 9;

/// Next nick to try after the server rejected `rejected` as in use.
///
/// If the server shortened our nick, or we are already falling back, the
/// rejected nick is the base; otherwise a `0` is appended. The last
/// character then becomes the next digit: `1`..`8` are incremented and
/// anything else is replaced by `1`.
///
/// ```
/// use purple_irc::session::nick::fallback_nick;
///
/// assert_eq!(fallback_nick("purple", "purple", false), "purple1");
/// assert_eq!(fallback_nick("purple1", "purple", true), "purple2");
/// assert_eq!(fallback_nick("purpl", "purple", false), "purp1");
/// ```
pub fn fallback_nick(rejected: &str, reqnick: &str, nickused: bool) -> String {
    let mut nick = if rejected.len() < reqnick.len() || nickused {
        rejected.to_string()
    } else {
        format!("{rejected}0")
    };

    match nick.pop() {
        Some(c @ '1'..='8') => nick.push((c as u8 + 1) as char),
        _ => nick.push('1'),
    }
    nick
}

/// `base` with a random three-digit suffix, for when the digit fallbacks
/// keep colliding.
pub fn random_nick(base: &str) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(100..1000);
    format!("{base}{suffix}")
}
