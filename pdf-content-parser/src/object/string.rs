//! String objects (literal or hex source syntax, same runtime representation).

/// The maximum number of bytes a parsed string retains; longer results are
/// truncated, not rejected.
pub const MAX_STRING_LENGTH: usize = 32_767;

/// A decoded PDF string. Literal and hex source syntax both resolve to this
/// one byte-string representation; nothing downstream needs to know which
/// surface syntax produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    /// Wrap already-decoded bytes, truncating to [`MAX_STRING_LENGTH`].
    pub fn new(mut bytes: Vec<u8>) -> Self {
        bytes.truncate(MAX_STRING_LENGTH);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a lowercase hex string, e.g. for round-tripping a hex
    /// string's content.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(self.0.len() * 2);
        for b in &self.0 {
            s.push_str(&format!("{:02x}", b));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_overlong_strings() {
        let s = PdfString::new(vec![b'a'; MAX_STRING_LENGTH + 10]);
        assert_eq!(s.len(), MAX_STRING_LENGTH);
    }

    #[test]
    fn hex_round_trip_is_lowercase() {
        let s = PdfString::new(b"Hello".to_vec());
        assert_eq!(s.to_hex(), "48656c6c6f");
    }
}
