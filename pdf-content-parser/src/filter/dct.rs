//! DCTDecode (baseline JPEG), via `zune-jpeg`.

use zune_jpeg::zune_core::colorspace::ColorSpace;
use zune_jpeg::zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode a JPEG stream. `color_transform` mirrors the `ColorTransform`
/// decode parameter (default `1`, meaning YCbCr/YCCK input); it only affects
/// which color space zune-jpeg is asked to convert into.
pub fn decode(src: &[u8], color_transform: i32) -> Option<(Vec<u8>, usize)> {
    let mut decoder = JpegDecoder::new(src);
    decoder.decode_headers().ok()?;

    let out_colorspace = match decoder.get_input_colorspace()? {
        // ColorTransform=0 means the encoder did not apply YCCK->CMYK; the
        // sample data is already plain CMYK, so request it untransformed.
        ColorSpace::YCCK if color_transform == 0 => ColorSpace::CMYK,
        ColorSpace::CMYK | ColorSpace::YCCK => ColorSpace::CMYK,
        ColorSpace::Luma | ColorSpace::LumaA => ColorSpace::Luma,
        _ => ColorSpace::RGB,
    };
    decoder.set_options(DecoderOptions::default().jpeg_set_out_colorspace(out_colorspace));
    let decoded = decoder.decode().ok()?;

    let consumed = end_of_image(src).unwrap_or(src.len());
    Some((decoded, consumed))
}

/// Locate the end-of-image marker (`0xFFD9`) so the inline-image assembler
/// can recover a consumed-byte count; zune-jpeg itself only reports decoded
/// pixels, not how far into `src` it read.
fn end_of_image(src: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 1 < src.len() {
        if src[i] == 0xFF && src[i + 1] == 0xD9 {
            return Some(i + 2);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_image_scans_for_marker() {
        let mut data = vec![0xFF, 0xD8, 0x01, 0x02];
        data.extend_from_slice(&[0xFF, 0xD9]);
        data.extend_from_slice(b"EI");
        assert_eq!(end_of_image(&data), Some(6));
    }

    #[test]
    fn end_of_image_missing_marker_is_none() {
        assert_eq!(end_of_image(b"no marker here"), None);
    }
}
