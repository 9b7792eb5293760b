//! Line-based codec for tokio.
//!
//! Frames a byte stream into IRC lines and converts between the account's
//! charset and UTF-8. Over-long lines are discarded instead of failing the
//! stream, since a chat client has to ride out server quirks.

use std::borrow::Cow;

use bytes::BytesMut;
#[cfg(feature = "encoding")]
use encoding::Encoding;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error;

/// Default upper bound on a single inbound line, terminator included:
/// 8191 bytes of IRCv3 tags plus a 512-byte message.
pub const DEFAULT_MAX_LEN: usize = 8191 + 512;

/// Line codec for IRC connections.
///
/// Decoded lines have their CR/LF terminator removed. Encoded lines get a
/// CRLF appended if the caller did not supply one.
pub struct LineCodec {
    #[cfg(feature = "encoding")]
    encoding: &'static Encoding,
    autodetect_utf8: bool,
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Dropping bytes until the next newline after an over-long line.
    discarding: bool,
}

impl LineCodec {
    /// Create a codec for the given charset label (e.g. "UTF-8",
    /// "ISO-8859-1").
    pub fn new(label: &str) -> error::Result<Self> {
        Ok(Self {
            #[cfg(feature = "encoding")]
            encoding: Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| error::ProtocolError::UnknownEncoding(label.to_owned()))?,
            #[cfg(not(feature = "encoding"))]
            autodetect_utf8: {
                if !is_utf8_label(label) {
                    return Err(error::ProtocolError::UnknownEncoding(label.to_owned()));
                }
                true
            },
            #[cfg(feature = "encoding")]
            autodetect_utf8: true,
            next_index: 0,
            max_len: DEFAULT_MAX_LEN,
            discarding: false,
        })
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_len(label: &str, max_len: usize) -> error::Result<Self> {
        let mut codec = Self::new(label)?;
        codec.max_len = max_len;
        Ok(codec)
    }

    /// Whether inbound bytes that are valid UTF-8 bypass the configured
    /// charset. Defaults to on.
    #[must_use]
    pub fn autodetect_utf8(mut self, enabled: bool) -> Self {
        self.autodetect_utf8 = enabled;
        self
    }

    /// Maximum accepted line length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn decode_line(&self, raw: &[u8]) -> String {
        if self.autodetect_utf8 {
            if let Ok(s) = std::str::from_utf8(raw) {
                return s.to_owned();
            }
        }

        #[cfg(feature = "encoding")]
        {
            let (text, had_errors) = self.encoding.decode_without_bom_handling(raw);
            if had_errors {
                warn!(
                    encoding = self.encoding.name(),
                    len = raw.len(),
                    "line did not decode cleanly"
                );
            }
            text.into_owned()
        }

        #[cfg(not(feature = "encoding"))]
        {
            let text = String::from_utf8_lossy(raw);
            if let Cow::Owned(_) = text {
                warn!(len = raw.len(), "line was not valid UTF-8");
            }
            text.into_owned()
        }
    }
}

#[cfg(not(feature = "encoding"))]
fn is_utf8_label(label: &str) -> bool {
    matches!(
        label.trim().to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "unicode-1-1-utf-8"
    )
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();

                if !self.discarding && src.len() > self.max_len {
                    warn!(len = src.len(), limit = self.max_len, "discarding over-long line");
                    self.discarding = true;
                }
                if self.discarding {
                    src.clear();
                    self.next_index = 0;
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }

            if line.len() > self.max_len {
                warn!(len = line.len(), limit = self.max_len, "discarding over-long line");
                continue;
            }

            return Ok(Some(self.decode_line(trim_terminator(&line))));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() || self.discarding {
            src.clear();
            return Ok(None);
        }
        let rest = src.split();
        self.next_index = 0;
        Ok(Some(self.decode_line(trim_terminator(&rest))))
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        let line: Cow<'_, str> = if msg.ends_with("\r\n") {
            Cow::Borrowed(&msg)
        } else {
            Cow::Owned(format!("{}\r\n", msg.trim_end_matches(['\r', '\n'])))
        };

        #[cfg(feature = "encoding")]
        {
            let (bytes, _enc, had_errors) = self.encoding.encode(&line);
            if had_errors {
                warn!(encoding = self.encoding.name(), "line had unmappable characters");
            }
            dst.extend_from_slice(&bytes);
        }

        #[cfg(not(feature = "encoding"))]
        {
            dst.extend_from_slice(line.as_bytes());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"x\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :x".to_string()));
    }

    #[test]
    fn test_decode_skips_too_long() {
        let mut codec = LineCodec::with_max_len("utf-8", 10).unwrap();
        let mut buf = BytesMut::from("this is way too long\nPING\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING".to_string()));
    }

    #[test]
    fn test_decode_accepts_lines_past_rfc_length() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let line = format!(":bridge!b@h PRIVMSG #chan :{}", "x".repeat(600));
        let mut buf = BytesMut::from(format!("{line}\r\n").as_str());
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(line));

        let tagged = format!("@{} PING :x", "k=v;".repeat(2000));
        let mut buf = BytesMut::from(format!("{tagged}\r\n").as_str());
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(tagged));
    }

    #[test]
    fn test_decode_discards_partial_overflow() {
        let mut codec = LineCodec::with_max_len("utf-8", 4).unwrap();
        let mut buf = BytesMut::from("abcdefgh");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        buf.extend_from_slice(b"ij\nOK\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("OK".to_string()));
    }

    #[test]
    fn test_decode_eof_flushes_tail() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("ERROR :bye");
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("ERROR :bye".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            LineCodec::new("no-such-charset"),
            Err(error::ProtocolError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();

        codec.encode("PONG :test".to_string(), &mut buf).unwrap();
        codec.encode("NICK a\r\n".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\nNICK a\r\n");
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_latin1_fallback_and_autodetect() {
        let mut codec = LineCodec::new("ISO-8859-1").unwrap();
        let mut buf = BytesMut::from(&b"caf\xe9\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("café".to_string()));

        let mut buf = BytesMut::from("caf\u{e9}\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("café".to_string()));

        let mut out = BytesMut::new();
        codec.encode("café".to_string(), &mut out).unwrap();
        assert_eq!(&out[..], b"caf\xe9\r\n");
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_autodetect_disabled_uses_charset() {
        let mut codec = LineCodec::new("ISO-8859-1").unwrap().autodetect_utf8(false);
        let mut buf = BytesMut::from("caf\u{e9}\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("cafÃ©".to_string()));
    }
}
