//! SASL support for IRC (IRCv3 `sasl` capability).
//!
//! [`SaslContext`] walks an ordered list of candidate mechanisms, skipping
//! any that cannot work with the configured credentials, and steps the
//! current one through server challenges. Only `PLAIN` is implemented.
//!
//! ```
//! use purple_proto::sasl::{encode_response, SaslContext};
//!
//! let mut ctx = SaslContext::new(["PLAIN"])
//!     .username("alice")
//!     .password("hunter2")
//!     .tls(true);
//!
//! assert_eq!(ctx.next(), Some("PLAIN"));
//! let response = ctx.step(&[]).unwrap();
//! assert_eq!(response.as_slice(), b"\0alice\0hunter2");
//! assert_eq!(encode_response(&response), vec!["AGFsaWNlAGh1bnRlcjI=".to_string()]);
//! ```
//!
//! # Reference
//! - IRCv3 SASL: <https://ircv3.net/specs/extensions/sasl-3.1>
//! - RFC 4616 (PLAIN): <https://tools.ietf.org/html/rfc4616>

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::SaslError;

mod context;
mod plain;

pub use context::{Credentials, Mechanism, SaslContext};
pub use plain::PlainMechanism;

/// Maximum length of a single AUTHENTICATE payload (400 bytes).
pub const SASL_CHUNK_SIZE: usize = 400;

/// Decode an AUTHENTICATE payload; `+` is the empty message.
pub fn decode_challenge(encoded: &str) -> Result<Vec<u8>, SaslError> {
    if encoded == "+" {
        return Ok(Vec::new());
    }
    BASE64
        .decode(encoded.trim())
        .map_err(|e| SaslError::InvalidChallenge(e.to_string()))
}

/// Encode a client response into AUTHENTICATE payloads.
///
/// An empty response is a single `+`. Encoded responses are split into
/// 400-byte chunks; if the last chunk is exactly 400 bytes a lone `+`
/// follows so the server knows the response ended.
pub fn encode_response(response: &[u8]) -> Vec<String> {
    if response.is_empty() {
        return vec!["+".to_owned()];
    }

    let encoded = BASE64.encode(response);
    let mut chunks: Vec<String> = encoded
        .as_bytes()
        .chunks(SASL_CHUNK_SIZE)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();

    if encoded.len() % SASL_CHUNK_SIZE == 0 {
        chunks.push("+".to_owned());
    }
    chunks
}
