//! LZWDecode, via `weezl`.

use weezl::decode::Decoder as WeezlDecoder;
use weezl::{BitOrder, LzwStatus};

/// Decode a PDF-flavored LZW stream (MSB bit order, early code-width change
/// enabled, per PDF 1.7 §7.4.4.2) and report the number of source bytes the
/// decoder consumed.
pub fn decode(src: &[u8]) -> Option<(Vec<u8>, usize)> {
    let mut decoder = WeezlDecoder::with_tiff_size_switch(BitOrder::Msb, 8);
    let mut out = Vec::new();
    let mut consumed = 0usize;
    let mut input = src;
    let mut buf = [0u8; 4096];

    loop {
        let result = decoder.decode_bytes(input, &mut buf);
        out.extend_from_slice(&buf[..result.consumed_out]);
        consumed += result.consumed_in;
        input = &input[result.consumed_in..];

        match result.status {
            Ok(LzwStatus::Ok) => {
                if result.consumed_in == 0 && result.consumed_out == 0 {
                    // No forward progress without more input.
                    return None;
                }
            }
            Ok(LzwStatus::Done) => return Some((out, consumed)),
            Ok(LzwStatus::NoProgress) => return None,
            Err(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_with_weezl_encoder() {
        let original = b"0 0 0 0 0 0 0 1 1 1 1 1 1 1 1 2 2 2 2 2";
        let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(BitOrder::Msb, 8);
        let compressed = encoder.encode(original).unwrap();

        let (decoded, consumed) = decode(&compressed).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(consumed, compressed.len());
    }
}
