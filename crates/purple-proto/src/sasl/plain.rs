//! PLAIN SASL mechanism (RFC 4616).

use zeroize::Zeroizing;

use super::context::{Credentials, Mechanism};
use crate::error::SaslError;

/// Sends `authzid NUL authcid NUL password` in a single step.
#[derive(Debug, Default)]
pub struct PlainMechanism {
    sent: bool,
}

impl Mechanism for PlainMechanism {
    fn name(&self) -> &'static str {
        "PLAIN"
    }

    fn possible(&self, creds: &Credentials) -> Result<(), SaslError> {
        if creds.username.is_empty() {
            return Err(SaslError::NotPossible("missing username"));
        }
        if creds.password.is_empty() {
            return Err(SaslError::NotPossible("missing password"));
        }
        if !creds.tls && !creds.allow_clear_text {
            return Err(SaslError::NotPossible("plain text is not allowed without TLS"));
        }
        Ok(())
    }

    fn step(&mut self, creds: &Credentials, _input: &[u8]) -> Result<Zeroizing<Vec<u8>>, SaslError> {
        if self.sent {
            return Err(SaslError::AlreadyComplete("PLAIN"));
        }
        self.sent = true;

        let mut out = Zeroizing::new(Vec::with_capacity(
            creds.authzid.len() + creds.username.len() + creds.password.len() + 2,
        ));
        out.extend_from_slice(creds.authzid.as_bytes());
        out.push(0);
        out.extend_from_slice(creds.username.as_bytes());
        out.push(0);
        out.extend_from_slice(creds.password.as_bytes());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(user: &str, pass: &str, tls: bool) -> Credentials {
        Credentials {
            username: user.into(),
            password: Zeroizing::new(pass.into()),
            tls,
            ..Default::default()
        }
    }

    #[test]
    fn test_possible_errors() {
        let mech = PlainMechanism::default();
        assert_eq!(
            mech.possible(&creds("", "p", true)),
            Err(SaslError::NotPossible("missing username"))
        );
        assert_eq!(
            mech.possible(&creds("u", "", true)),
            Err(SaslError::NotPossible("missing password"))
        );
        assert_eq!(
            mech.possible(&creds("u", "p", false)),
            Err(SaslError::NotPossible("plain text is not allowed without TLS"))
        );
        assert!(mech.possible(&creds("u", "p", true)).is_ok());
    }

    #[test]
    fn test_single_step() {
        let mut mech = PlainMechanism::default();
        let c = creds("testuser", "testpass", true);
        assert_eq!(mech.step(&c, b"").unwrap().as_slice(), b"\0testuser\0testpass");
        assert_eq!(mech.step(&c, b""), Err(SaslError::AlreadyComplete("PLAIN")));
    }
}
