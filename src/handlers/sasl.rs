//! SASL over `CAP REQ :sasl` and `AUTHENTICATE`.

use purple_proto::Message;
use purple_proto::format::LineBuilder;
use purple_proto::sasl::{SaslContext, decode_challenge, encode_response};
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, HandlerResult};
use crate::session::Session;

const MECHANISMS: [&str; 1] = ["PLAIN"];

pub(crate) fn cap(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    if args[2].trim() != "sasl" {
        return Ok(());
    }

    if args[1] != "ACK" {
        finish(session);
        return Err(ConnectionError::AuthenticationImpossible(
            "SASL authentication failed: Server does not support SASL authentication.".into(),
        ));
    }

    let password = session
        .account
        .password
        .as_ref()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let context = SaslContext::new(MECHANISMS)
        .username(session.display_nick())
        .password(password)
        .authzid("")
        .tls(session.is_tls())
        .allow_clear_text(session.account.auth_plain_in_clear);
    session.sasl = Some(context);

    attempt(session)
}

/// Try the next candidate mechanism.
fn attempt(session: &mut Session) -> HandlerResult {
    let Some(context) = session.sasl.as_mut() else {
        return Ok(());
    };

    if let Some(failed) = context.current_mechanism() {
        info!(mechanism = failed, "SASL mechanism failed");
    }

    match context.next() {
        Some(mechanism) => {
            debug!(mechanism, "trying SASL mechanism");
            session.send_builder(LineBuilder::new("AUTHENTICATE").verbatim(mechanism));
            Ok(())
        }
        None => {
            finish(session);
            Err(ConnectionError::AuthenticationImpossible(
                "SASL authentication failed: No worthy authentication mechanisms found.".into(),
            ))
        }
    }
}

pub(crate) fn authenticate(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let Some(context) = session.sasl.as_mut() else {
        warn!("got AUTHENTICATE without a SASL exchange in progress");
        return Ok(());
    };

    let response = decode_challenge(args[0]).and_then(|challenge| context.step(&challenge));
    match response {
        Ok(response) => {
            for chunk in encode_response(&response) {
                session.send_builder(LineBuilder::new("AUTHENTICATE").verbatim(&chunk));
            }
            Ok(())
        }
        Err(err) => {
            finish(session);
            Err(ConnectionError::AuthenticationImpossible(format!(
                "SASL authentication failed: {err}"
            )))
        }
    }
}

/// 903
pub(crate) fn success(session: &mut Session, _msg: &Message, _args: &[&str]) -> HandlerResult {
    info!("SASL authentication succeeded");
    finish(session);
    Ok(())
}

/// 904 to 908: the current mechanism failed or was aborted.
pub(crate) fn failed(session: &mut Session, msg: &Message, _args: &[&str]) -> HandlerResult {
    debug!(numeric = %msg.command, "SASL attempt rejected");
    attempt(session)
}

/// End the exchange with exactly one `CAP END`.
fn finish(session: &mut Session) {
    session.sasl = None;
    session.send_builder(LineBuilder::new("CAP").verbatim("END"));
}

#[cfg(test)]
mod tests {
    use crate::config::AccountConfig;
    use crate::error::ConnectionError;
    use crate::session::Session;

    fn sasl_session(tls: bool, clear: bool) -> Session {
        let mut config = AccountConfig::new("purple@irc.example.net");
        config.password = Some("secret".into());
        config.sasl = true;
        config.auth_plain_in_clear = clear;
        let mut s = Session::login(&config).unwrap();
        s.start(tls);
        s.drain_outbound();
        s
    }

    fn cap_ends(lines: &[String]) -> usize {
        lines.iter().filter(|l| l.as_str() == "CAP END\r\n").count()
    }

    #[test]
    fn plain_over_tls() {
        let mut s = sasl_session(true, false);
        s.handle_line(":srv CAP * ACK :sasl ");
        assert_eq!(s.drain_outbound(), vec!["AUTHENTICATE PLAIN\r\n"]);
        assert!(s.sasl_active());

        s.handle_line("AUTHENTICATE +");
        // Empty authzid, then authcid and password.
        assert_eq!(s.drain_outbound(), vec!["AUTHENTICATE AHB1cnBsZQBzZWNyZXQ=\r\n"]);

        s.handle_line(":srv 903 purple :SASL authentication successful");
        assert_eq!(s.drain_outbound(), vec!["CAP END\r\n"]);
        assert!(!s.sasl_active());
        assert!(s.error().is_none());
    }

    #[test]
    fn nak_is_fatal() {
        let mut s = sasl_session(true, false);
        s.handle_line(":srv CAP * NAK :sasl");
        assert_eq!(cap_ends(&s.drain_outbound()), 1);
        assert!(matches!(
            s.error(),
            Some(ConnectionError::AuthenticationImpossible(_))
        ));
    }

    #[test]
    fn other_capabilities_ignored() {
        let mut s = sasl_session(true, false);
        s.handle_line(":srv CAP * ACK :multi-prefix");
        assert!(s.drain_outbound().is_empty());
        assert!(!s.sasl_active());
    }

    #[test]
    fn plain_refused_in_clear() {
        let mut s = sasl_session(false, false);
        s.handle_line(":srv CAP * ACK :sasl");
        let lines = s.drain_outbound();
        assert_eq!(lines, vec!["CAP END\r\n"]);
        assert_eq!(
            s.error(),
            Some(&ConnectionError::AuthenticationImpossible(
                "SASL authentication failed: No worthy authentication mechanisms found.".into()
            ))
        );
    }

    #[test]
    fn exhausted_after_failure() {
        let mut s = sasl_session(false, true);
        s.handle_line(":srv CAP * ACK :sasl");
        assert_eq!(s.drain_outbound(), vec!["AUTHENTICATE PLAIN\r\n"]);
        s.handle_line(":srv 904 purple :SASL authentication failed");
        assert_eq!(cap_ends(&s.drain_outbound()), 1);
        assert!(s.error().is_some());
        // A late failure numeric does not end the exchange a second time.
        s.handle_line(":srv 904 purple :SASL authentication failed");
        assert_eq!(cap_ends(&s.drain_outbound()), 0);
    }

    #[test]
    fn authenticate_without_exchange_is_ignored() {
        let mut s = sasl_session(true, false);
        s.handle_line("AUTHENTICATE +");
        assert!(s.drain_outbound().is_empty());
        assert!(s.error().is_none());
    }
}
