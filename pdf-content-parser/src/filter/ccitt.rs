//! CCITTFaxDecode, via the sibling `pdf-content-ccitt` crate.

use pdf_content_ccitt::{decode as ccitt_decode, DecodeSettings, Decoder, EncodingMode};

/// Parameters read from `DecodeParms` for a CCITTFaxDecode filter.
#[derive(Debug, Clone, Copy)]
pub struct CcittParams {
    pub k: i32,
    pub columns: u32,
    pub rows: u32,
    pub end_of_line: bool,
    pub encoded_byte_align: bool,
    pub black_is_1: bool,
}

impl Default for CcittParams {
    fn default() -> Self {
        Self {
            k: 0,
            columns: 1728,
            rows: 0,
            end_of_line: false,
            encoded_byte_align: false,
            black_is_1: false,
        }
    }
}

/// Pack decoded pixels into a `pitch * height` scanline buffer, one bit per
/// pixel, MSB first — the representation `read_inline_stream`'s scanline
/// path expects from every fax-style codec.
struct ScanlinePacker<'a> {
    buf: &'a mut [u8],
    pitch: usize,
    row: usize,
    bit_in_row: usize,
    black_is_1: bool,
}

impl Decoder for ScanlinePacker<'_> {
    fn push_pixel(&mut self, white: bool) {
        // BlackIs1=false (the PDF default) means white pixels are the 1
        // bits; BlackIs1=true flips that.
        let set = white != self.black_is_1;
        if set {
            let byte = self.row * self.pitch + self.bit_in_row / 8;
            if let Some(slot) = self.buf.get_mut(byte) {
                *slot |= 0x80 >> (self.bit_in_row % 8);
            }
        }
        self.bit_in_row += 1;
    }

    fn push_pixel_chunk(&mut self, white: bool, chunk_count: u32) {
        let set = white != self.black_is_1;
        if set {
            for _ in 0..chunk_count {
                let byte = self.row * self.pitch + self.bit_in_row / 8;
                if let Some(slot) = self.buf.get_mut(byte) {
                    *slot |= 0xFF;
                }
                self.bit_in_row += 8;
            }
        } else {
            self.bit_in_row += 8 * chunk_count as usize;
        }
    }

    fn next_line(&mut self) {
        self.row += 1;
        self.bit_in_row = 0;
    }
}

/// Decode a CCITT fax stream into a `pitch * height` scanline buffer, per
/// the scanline-decoder rule: `pitch = ceil(width / 8)`, fail if
/// `height == 0` or `pitch * height` would overflow 2^30.
pub fn decode(src: &[u8], params: &CcittParams) -> Option<(Vec<u8>, usize)> {
    let width = params.columns as usize;
    let height = params.rows as usize;
    if height == 0 {
        return None;
    }
    let pitch = width.div_ceil(8);
    let total = pitch.checked_mul(height)?;
    if total >= (1 << 30) {
        return None;
    }

    let mut buf = vec![0u8; total];
    let mut packer = ScanlinePacker {
        buf: &mut buf,
        pitch,
        row: 0,
        bit_in_row: 0,
        black_is_1: params.black_is_1,
    };

    let encoding = if params.k < 0 {
        EncodingMode::Group4
    } else if params.k == 0 {
        EncodingMode::Group3_1D
    } else {
        EncodingMode::Group3_2D { k: params.k as u32 }
    };

    let settings = DecodeSettings {
        columns: params.columns,
        rows: params.rows,
        end_of_block: true,
        end_of_line: params.end_of_line,
        rows_are_byte_aligned: params.encoded_byte_align,
        encoding,
        invert_black: false,
    };

    let consumed = ccitt_decode(src, &mut packer, &settings).ok()?;
    Some((buf, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_height_fails() {
        let params = CcittParams {
            rows: 0,
            ..Default::default()
        };
        assert!(decode(b"", &params).is_none());
    }

    #[test]
    fn pitch_height_overflow_fails() {
        let params = CcittParams {
            columns: 1 << 29,
            rows: 1 << 29,
            ..Default::default()
        };
        assert!(decode(b"", &params).is_none());
    }
}
