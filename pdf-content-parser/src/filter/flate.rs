//! FlateDecode, via `flate2`.

use flate2::read::ZlibDecoder;
use std::io::Read;

/// Decode a zlib/deflate stream, reporting how many source bytes the
/// decompressor actually consumed (`flate2` tracks this on the underlying
/// `Decompress` state, which is what lets an inline image's payload length
/// be recovered without a pre-known `Length`).
pub fn decode(src: &[u8]) -> Option<(Vec<u8>, usize)> {
    let mut decoder = ZlibDecoder::new(src);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).ok()?;
    let consumed = decoder.total_in() as usize;
    Some((out, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zlib_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn round_trip() {
        let original = b"q 1 0 0 1 0 0 cm 0 0 100 100 re f Q";
        let compressed = zlib_compress(original);
        let (decoded, consumed) = decode(&compressed).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(consumed, compressed.len());
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let original = b"hello world";
        let mut compressed = zlib_compress(original);
        compressed.extend_from_slice(b"EI");
        let (decoded, consumed) = decode(&compressed).unwrap();
        assert_eq!(decoded, original);
        assert!(consumed < compressed.len());
    }
}
