//! Text command codec and line framing
//!
//! Every command is one line of text:
//! ```text
//! <device_token>:<trigger>[:<key1>=<value1>[,<key2>=<value2>...]]
//! ```
//!
//! There is no escaping. Tokens, triggers, keys and values must not contain
//! `:`, `,` or `=`; callers that encode such values produce lines that decode
//! to something else. Stream transports terminate each line with `\n`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::{Args, Message};

/// Separates token, trigger and argument list
pub const FIELD_SEPARATOR: char = ':';

/// Separates arguments from each other
pub const ARG_SEPARATOR: char = ',';

/// Separates an argument key from its value
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Maximum line size (4 KB) accepted from a stream
pub const MAX_LINE_LEN: usize = 4096;

/// Malformed command text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("missing separator")]
    MissingSeparator,

    #[error("wrong field count: {0} (expected 2 or 3)")]
    WrongFieldCount(usize),

    #[error("malformed argument: {0:?}")]
    MalformedArgument(String),
}

/// Errors that can occur while framing lines from a byte stream
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Line too long: {0} bytes (max: {MAX_LINE_LEN})")]
    LineTooLong(usize),

    #[error("Line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Decode a raw command string into a [`Message`]
pub fn decode(raw: &str) -> Result<Message, ProtocolError> {
    let raw = raw.trim();

    if !raw.contains(FIELD_SEPARATOR) {
        return Err(ProtocolError::MissingSeparator);
    }

    // Doubled separators leave empty fields behind; they carry no meaning
    let fields: Vec<&str> = raw
        .split(FIELD_SEPARATOR)
        .filter(|field| !field.is_empty())
        .collect();

    let (device_token, trigger, raw_args) = match fields.as_slice() {
        [token, trigger] => (*token, *trigger, None),
        [token, trigger, args] => (*token, *trigger, Some(*args)),
        other => return Err(ProtocolError::WrongFieldCount(other.len())),
    };

    let mut args = Args::new();
    if let Some(raw_args) = raw_args {
        for argument in raw_args.split(ARG_SEPARATOR) {
            let (key, value) = split_argument(argument)?;
            // Duplicate keys: last one wins
            args.insert(key.to_owned(), value.to_owned());
        }
    }

    Ok(Message {
        device_token: device_token.to_owned(),
        trigger: trigger.to_owned(),
        args,
    })
}

fn split_argument(argument: &str) -> Result<(&str, &str), ProtocolError> {
    let mut parts = argument.split(KEY_VALUE_SEPARATOR);

    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) if !key.is_empty() && !value.is_empty() => {
            Ok((key, value))
        }
        _ => Err(ProtocolError::MalformedArgument(argument.to_owned())),
    }
}

/// Encode a command into its wire form
///
/// Arguments are appended only when there are any.
pub fn encode(device_token: &str, trigger: &str, args: &Args) -> String {
    let mut out = String::with_capacity(device_token.len() + trigger.len() + 1);
    out.push_str(device_token);
    out.push(FIELD_SEPARATOR);
    out.push_str(trigger);

    for (i, (key, value)) in args.iter().enumerate() {
        out.push(if i == 0 { FIELD_SEPARATOR } else { ARG_SEPARATOR });
        out.push_str(key);
        out.push(KEY_VALUE_SEPARATOR);
        out.push_str(value);
    }

    out
}

/// Frame a raw command as a newline-terminated line
pub fn encode_line(raw: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(raw.len() + 1);
    buf.put_slice(raw.as_bytes());
    buf.put_u8(b'\n');
    buf.freeze()
}

/// Streaming line decoder
///
/// Lines end with `\n` (an optional `\r` before it is stripped). A line that
/// grows past [`MAX_LINE_LEN`] is rejected as a whole: everything up to its
/// terminator is dropped, even when that arrives in later chunks.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Bytes of a partial line being accumulated
    buffer: BytesMut,
    /// Skipping the rest of an oversized line
    discarding: bool,
}

impl LineDecoder {
    /// Create a new line decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(1024),
            discarding: false,
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next line from the buffer
    ///
    /// Returns:
    /// - `Ok(Some(line))` with the terminator stripped
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the line is oversized or not UTF-8; the offending bytes are consumed
    ///
    /// Call this repeatedly until it returns `Ok(None)` to drain all complete lines
    pub fn decode_next(&mut self) -> Result<Option<String>, CodecError> {
        if self.discarding {
            let Some(pos) = find_newline(&self.buffer) else {
                self.buffer.clear();
                return Ok(None);
            };
            self.buffer.advance(pos + 1);
            self.discarding = false;
        }

        let Some(pos) = find_newline(&self.buffer) else {
            if self.buffer.len() > MAX_LINE_LEN {
                let len = self.buffer.len();
                self.buffer.clear();
                self.discarding = true;
                return Err(CodecError::LineTooLong(len));
            }
            return Ok(None);
        };

        let mut line = self.buffer.split_to(pos);
        self.buffer.advance(1);

        if pos > MAX_LINE_LEN {
            return Err(CodecError::LineTooLong(pos));
        }

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        let text = std::str::from_utf8(&line)?;
        Ok(Some(text.to_owned()))
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

fn find_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|b| *b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_without_args() {
        let msg = decode("t:a").expect("decode failed");
        assert_eq!(msg.device_token, "t");
        assert_eq!(msg.trigger, "a");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_decode_with_args() {
        let msg = decode("4:skip_button_pressed:time=19.78,x=16,y=19").expect("decode failed");
        assert_eq!(msg.device_token, "4");
        assert_eq!(msg.trigger, "skip_button_pressed");
        assert_eq!(msg.args.len(), 3);
        assert_eq!(msg.arg("time"), Some("19.78"));
        assert_eq!(msg.arg("x"), Some("16"));
        assert_eq!(msg.arg("y"), Some("19"));
    }

    #[test]
    fn test_token_is_not_numeric() {
        let msg = decode("phone-A7:ping").expect("decode failed");
        assert_eq!(msg.device_token, "phone-A7");
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(decode("ping"), Err(ProtocolError::MissingSeparator));
        assert_eq!(decode(""), Err(ProtocolError::MissingSeparator));
    }

    #[test]
    fn test_wrong_field_count() {
        assert_eq!(decode("t:"), Err(ProtocolError::WrongFieldCount(1)));
        assert_eq!(decode(":"), Err(ProtocolError::WrongFieldCount(0)));
        assert_eq!(decode("t:a:k=v:extra"), Err(ProtocolError::WrongFieldCount(4)));
    }

    #[test]
    fn test_empty_fields_discarded() {
        let msg = decode("t::a::k=v").expect("decode failed");
        assert_eq!(msg.trigger, "a");
        assert_eq!(msg.arg("k"), Some("v"));

        let msg = decode(":t:a:").expect("decode failed");
        assert_eq!(msg.device_token, "t");
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_malformed_argument() {
        assert_eq!(
            decode("t:a:k"),
            Err(ProtocolError::MalformedArgument("k".into()))
        );
        assert_eq!(
            decode("t:a:k=v,other"),
            Err(ProtocolError::MalformedArgument("other".into()))
        );
        assert_eq!(
            decode("t:a:k=v=w"),
            Err(ProtocolError::MalformedArgument("k=v=w".into()))
        );
        assert!(matches!(decode("t:a:=v"), Err(ProtocolError::MalformedArgument(_))));
        assert!(matches!(decode("t:a:k="), Err(ProtocolError::MalformedArgument(_))));
    }

    #[test]
    fn test_empty_argument_rejected() {
        for raw in ["t:a:k=v,", "t:a:,", "t:a:k=v,,j=w"] {
            assert_eq!(
                decode(raw),
                Err(ProtocolError::MalformedArgument(String::new())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let msg = decode("t:a:k=1,k=2").expect("decode failed");
        assert_eq!(msg.args.len(), 1);
        assert_eq!(msg.arg("k"), Some("2"));
    }

    #[test]
    fn test_decode_trims_line_endings() {
        let msg = decode("d1:ping\r\n").expect("decode failed");
        assert_eq!(msg.trigger, "ping");
    }

    #[test]
    fn test_encode() {
        let mut args = Args::new();
        assert_eq!(encode("d1", "ping", &args), "d1:ping");

        args.insert("speed".into(), "1.23".into());
        assert_eq!(encode("d1", "speed", &args), "d1:speed:speed=1.23");

        args.clear();
        args.insert("value".into(), "-2".into());
        args.insert("time".into(), "0".into());
        assert_eq!(encode("d1", "seek", &args), "d1:seek:time=0,value=-2");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        for raw in ["t:a", "t:a:k=v", "t:a:k1=v1,k2=v2"] {
            let decoded = decode(raw).expect("decode failed");
            let reencoded = decoded.encode();
            assert_eq!(decode(&reencoded).expect("decode failed"), decoded);
        }
    }

    #[test]
    fn test_line_decoder() {
        let mut decoder = LineDecoder::new();

        // Feed data in chunks
        decoder.extend(b"d1:pi");
        assert!(decoder.decode_next().expect("decode error").is_none());

        decoder.extend(b"ng\r\nd2:seekbar_changed:progress=3\n");
        assert_eq!(
            decoder.decode_next().expect("decode error").as_deref(),
            Some("d1:ping")
        );
        assert_eq!(
            decoder.decode_next().expect("decode error").as_deref(),
            Some("d2:seekbar_changed:progress=3")
        );
        assert!(decoder.decode_next().expect("decode error").is_none());
        assert_eq!(decoder.buffer_len(), 0);
    }

    #[test]
    fn test_line_too_long() {
        let mut decoder = LineDecoder::new();
        decoder.extend(&vec![b'x'; MAX_LINE_LEN + 1]);

        let result = decoder.decode_next();
        assert!(matches!(result, Err(CodecError::LineTooLong(_))));
        assert_eq!(decoder.buffer_len(), 0);

        // The tail of the rejected line arrives separately and is dropped
        decoder.extend(b"xx:evil");
        assert!(decoder.decode_next().expect("decode error").is_none());
        decoder.extend(b":k=v\n");
        assert!(decoder.decode_next().expect("decode error").is_none());

        // The decoder recovers on the next line
        decoder.extend(b"d1:ping\n");
        assert_eq!(
            decoder.decode_next().expect("decode error").as_deref(),
            Some("d1:ping")
        );
    }

    #[test]
    fn test_terminated_long_line_rejected() {
        let mut decoder = LineDecoder::new();
        let mut data = vec![b'x'; MAX_LINE_LEN + 1];
        data.extend_from_slice(b"\nd1:ping\n");
        decoder.extend(&data);

        assert!(matches!(decoder.decode_next(), Err(CodecError::LineTooLong(_))));
        assert_eq!(
            decoder.decode_next().expect("decode error").as_deref(),
            Some("d1:ping")
        );
    }

    #[test]
    fn test_invalid_utf8_line_is_consumed() {
        let mut decoder = LineDecoder::new();
        decoder.extend(&[0xff, 0xfe, b'\n']);
        decoder.extend(b"d1:ping\n");

        assert!(matches!(decoder.decode_next(), Err(CodecError::InvalidUtf8(_))));
        assert_eq!(
            decoder.decode_next().expect("decode error").as_deref(),
            Some("d1:ping")
        );
    }

    #[test]
    fn test_encode_line() {
        assert_eq!(&encode_line("d1:ping")[..], b"d1:ping\n");
    }
}
