use std::fmt;

use zeroize::Zeroizing;

use super::plain::PlainMechanism;
use crate::error::SaslError;

/// Credentials and transport facts a mechanism may need.
#[derive(Default)]
pub struct Credentials {
    /// Authentication identity.
    pub username: String,
    /// Password, wiped from memory on drop.
    pub password: Zeroizing<String>,
    /// Authorization identity; usually empty.
    pub authzid: String,
    /// Whether the transport is already encrypted.
    pub tls: bool,
    /// Whether clear-text mechanisms may run over an unencrypted transport.
    pub allow_clear_text: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("authzid", &self.authzid)
            .field("tls", &self.tls)
            .field("allow_clear_text", &self.allow_clear_text)
            .finish()
    }
}

/// A client-side SASL mechanism.
pub trait Mechanism: Send {
    /// Registered mechanism name, e.g. `PLAIN`.
    fn name(&self) -> &'static str;

    /// Check whether the mechanism can run with `creds`.
    fn possible(&self, creds: &Credentials) -> Result<(), SaslError>;

    /// Produce the response to one server challenge.
    fn step(&mut self, creds: &Credentials, input: &[u8]) -> Result<Zeroizing<Vec<u8>>, SaslError>;
}

fn mechanism_for(name: &str) -> Option<Box<dyn Mechanism>> {
    match name.to_ascii_uppercase().as_str() {
        "PLAIN" => Some(Box::<PlainMechanism>::default()),
        _ => None,
    }
}

/// Walks candidate mechanisms and steps the current one.
///
/// The context starts positioned before the first candidate; call
/// [`SaslContext::next`] to select one.
pub struct SaslContext {
    candidates: Vec<String>,
    index: Option<usize>,
    current: Option<Box<dyn Mechanism>>,
    creds: Credentials,
}

impl SaslContext {
    /// Create a context over the given candidate mechanism names, in order.
    pub fn new<I, S>(mechanisms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: mechanisms.into_iter().map(Into::into).collect(),
            index: None,
            current: None,
            creds: Credentials::default(),
        }
    }

    /// Set the authentication identity.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.creds.username = username.into();
        self
    }

    /// Set the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.creds.password = Zeroizing::new(password.into());
        self
    }

    /// Set the authorization identity.
    #[must_use]
    pub fn authzid(mut self, authzid: impl Into<String>) -> Self {
        self.creds.authzid = authzid.into();
        self
    }

    /// Record whether the transport is encrypted.
    #[must_use]
    pub fn tls(mut self, tls: bool) -> Self {
        self.creds.tls = tls;
        self
    }

    /// Allow clear-text mechanisms over an unencrypted transport.
    #[must_use]
    pub fn allow_clear_text(mut self, allow: bool) -> Self {
        self.creds.allow_clear_text = allow;
        self
    }

    /// Advance to the next usable mechanism.
    ///
    /// Unknown mechanisms and ones that are not possible with the current
    /// credentials are skipped. Returns `None` once the candidates are
    /// exhausted; the context then has no current mechanism.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&'static str> {
        self.current = None;
        loop {
            let idx = self.index.map_or(0, |i| i + 1);
            if idx >= self.candidates.len() {
                self.index = Some(self.candidates.len());
                return None;
            }
            self.index = Some(idx);

            let name = &self.candidates[idx];
            let Some(mech) = mechanism_for(name) else {
                skipping(name, "unknown mechanism");
                continue;
            };

            match mech.possible(&self.creds) {
                Ok(()) => {
                    let selected = mech.name();
                    self.current = Some(mech);
                    return Some(selected);
                }
                Err(err) => skipping(name, &err.to_string()),
            }
        }
    }

    /// Name of the mechanism currently selected.
    pub fn current_mechanism(&self) -> Option<&'static str> {
        self.current.as_ref().map(|m| m.name())
    }

    /// Step the current mechanism with a decoded server challenge.
    pub fn step(&mut self, input: &[u8]) -> Result<Zeroizing<Vec<u8>>, SaslError> {
        let mech = self.current.as_mut().ok_or(SaslError::NoMechanism)?;
        mech.step(&self.creds, input)
    }

    /// Whether the transport was recorded as encrypted.
    pub fn is_tls(&self) -> bool {
        self.creds.tls
    }
}

impl fmt::Debug for SaslContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslContext")
            .field("candidates", &self.candidates)
            .field("index", &self.index)
            .field("current", &self.current_mechanism())
            .field("creds", &self.creds)
            .finish()
    }
}

#[cfg(feature = "tracing")]
fn skipping(name: &str, reason: &str) {
    tracing::info!(mechanism = %name, "skipping mechanism '{}': {}", name, reason);
}

#[cfg(not(feature = "tracing"))]
fn skipping(_name: &str, _reason: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_mechanism_before_next() {
        let mut ctx = SaslContext::new(["PLAIN"]).username("u").password("p");
        assert_eq!(ctx.current_mechanism(), None);
        assert_eq!(ctx.step(b""), Err(SaslError::NoMechanism));
    }

    #[test]
    fn test_skips_unknown_and_impossible() {
        let mut ctx = SaslContext::new(["SCRAM-SHA-1", "PLAIN"])
            .username("u")
            .password("p");
        // No TLS and clear text not allowed: PLAIN is impossible too.
        assert_eq!(ctx.next(), None);
        assert_eq!(ctx.current_mechanism(), None);
        assert_eq!(ctx.next(), None);
    }

    #[test]
    fn test_clear_text_allowed() {
        let mut ctx = SaslContext::new(["PLAIN"])
            .username("u")
            .password("p")
            .allow_clear_text(true);
        assert_eq!(ctx.next(), Some("PLAIN"));
        assert_eq!(ctx.current_mechanism(), Some("PLAIN"));
        assert_eq!(ctx.next(), None);
        assert_eq!(ctx.current_mechanism(), None);
    }

    #[test]
    fn test_authzid_in_response() {
        let mut ctx = SaslContext::new(["plain"])
            .username("u")
            .password("p")
            .authzid("z")
            .tls(true);
        ctx.next();
        assert_eq!(ctx.step(b"").unwrap().as_slice(), b"z\0u\0p");
    }

    #[test]
    fn test_debug_redacts_password() {
        let ctx = SaslContext::new(["PLAIN"]).password("sekrit");
        assert!(!format!("{ctx:?}").contains("sekrit"));
    }
}
