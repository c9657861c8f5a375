//! ASCII85 decoding.

/// Decode an ASCII85 stream starting at `src[0]`. Returns the decoded bytes
/// together with the number of source bytes consumed through and including
/// the `~>` terminator (or the whole input, if no terminator is found).
pub fn decode(src: &[u8]) -> Option<(Vec<u8>, usize)> {
    let mut decoded = Vec::new();
    let mut group = [0u8; 5];
    let mut group_len = 0usize;
    let mut i = 0;

    while i < src.len() {
        let b = src[i];
        i += 1;

        if b == b'~' {
            // Consume the mandatory trailing `>`, if present.
            if src.get(i) == Some(&b'>') {
                i += 1;
            }
            break;
        }
        if matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0c | 0x00) {
            continue;
        }
        if b == b'z' && group_len == 0 {
            decoded.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(0x21..=0x75).contains(&b) {
            return None;
        }

        group[group_len] = b;
        group_len += 1;
        if group_len == 5 {
            decoded.extend_from_slice(&word_85(group)?);
            group_len = 0;
        }
    }

    if group_len > 0 {
        let consumed_digits = group_len;
        for slot in group.iter_mut().skip(group_len) {
            *slot = b'u';
        }
        let word = word_85(group)?;
        decoded.extend_from_slice(&word[..consumed_digits - 1]);
    }

    Some((decoded, i))
}

fn word_85(group: [u8; 5]) -> Option<[u8; 4]> {
    let mut value: u64 = 0;
    for b in group {
        if !(0x21..=0x75).contains(&b) {
            return None;
        }
        value = value * 85 + (b - 0x21) as u64;
    }
    let value = u32::try_from(value).ok()?;
    Some(value.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_simple() {
        let (out, consumed) = decode(b"87cURDZ~>").unwrap();
        assert_eq!(out, b"Hello");
        assert_eq!(consumed, b"87cURDZ~>".len());
    }

    #[test]
    fn decode_z_shortcut() {
        let (out, _) = decode(b"z~>").unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn decode_ignores_interspersed_whitespace() {
        let (out, _) = decode(b"87  cURD  Z~>").unwrap();
        assert_eq!(out, b"Hello");
    }

    #[test]
    fn consumed_count_stops_after_terminator() {
        let data = b"87cURDZ~> q 1 0 0 1 0 0 cm";
        let (_, consumed) = decode(data).unwrap();
        assert_eq!(consumed, 9);
    }
}
