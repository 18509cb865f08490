//! Opaque pagination cursor.
//!
//! A cursor wraps a resume position chosen by whoever issued it: the record
//! store uses the last id of the page, the search index uses a hit offset.
//! Clients only ever see the encoded token.

use std::fmt;

use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;

/// Token prefix guarding against arbitrary base64 strings decoding to a position.
const PREFIX: &str = "p:";

/// Resume position for paginated reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(u64);

impl Cursor {
    #[must_use]
    pub const fn new(position: u64) -> Self {
        Self(position)
    }

    #[must_use]
    pub const fn position(self) -> u64 {
        self.0
    }

    /// Encode as a URL-safe token.
    #[must_use]
    pub fn encode(self) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(format!("{PREFIX}{}", self.0))
    }

    /// Decode a token produced by [`Cursor::encode`].
    ///
    /// Returns `None` for anything that is not a well-formed token.
    #[must_use]
    pub fn decode(token: &str) -> Option<Self> {
        let bytes = BASE64_URL_SAFE_NO_PAD.decode(token).ok()?;
        let text = std::str::from_utf8(&bytes).ok()?;
        text.strip_prefix(PREFIX)?.parse().ok().map(Self)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cursor_token_is_url_safe() {
        let token = Cursor::new(u64::MAX).encode();

        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(Cursor::decode(&token), Some(Cursor::new(u64::MAX)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(Cursor::decode(""), None);
        assert_eq!(Cursor::decode("not a cursor!"), None);
        // Valid base64 without the prefix.
        assert_eq!(Cursor::decode(&BASE64_URL_SAFE_NO_PAD.encode("10")), None);
        assert_eq!(Cursor::decode(&BASE64_URL_SAFE_NO_PAD.encode("p:-1")), None);
    }
}
