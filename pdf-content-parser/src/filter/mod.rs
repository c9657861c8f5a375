//! Dispatching a named filter (long or abbreviated) to its decoder.

mod ascii85;
mod ascii_hex;
mod ccitt;
mod dct;
mod flate;
mod lzw;
mod run_length;

use crate::error::FilterError;
use crate::object::{Dict, Name};

/// The result of a successful filter dispatch: decoded bytes plus the count
/// of source bytes the codec consumed to produce them.
pub struct DecodedPayload {
    pub data: Vec<u8>,
    pub consumed: usize,
}

/// Dispatch `name` (long or abbreviated form) to its decoder. `width` and
/// `height` only matter to the scanline codecs (`CCITTFaxDecode`); `params`
/// is the stream's (or inline image's) `DecodeParms` dictionary.
pub fn dispatch(
    name: &[u8],
    src: &[u8],
    width: u32,
    height: u32,
    params: Option<&Dict>,
) -> Result<DecodedPayload, FilterError> {
    match name {
        b"ASCII85Decode" | b"A85" => ascii85::decode(src)
            .map(|(data, consumed)| DecodedPayload { data, consumed })
            .ok_or(FilterError::CodecRejected),
        b"ASCIIHexDecode" | b"AHx" => ascii_hex::decode(src)
            .map(|(data, consumed)| DecodedPayload { data, consumed })
            .ok_or(FilterError::CodecRejected),
        b"RunLengthDecode" | b"RL" => run_length::decode(src)
            .map(|(data, consumed)| DecodedPayload { data, consumed })
            .ok_or(FilterError::CodecRejected),
        b"FlateDecode" | b"Fl" => flate::decode(src)
            .map(|(data, consumed)| DecodedPayload { data, consumed })
            .ok_or(FilterError::CodecRejected),
        b"LZWDecode" | b"LZW" => lzw::decode(src)
            .map(|(data, consumed)| DecodedPayload { data, consumed })
            .ok_or(FilterError::CodecRejected),
        b"DCTDecode" | b"DCT" => {
            let color_transform = params
                .and_then(|d| d.get_by_bytes(b"ColorTransform"))
                .and_then(|o| o.as_number())
                .map(|n| n.as_i32())
                .unwrap_or(1);
            dct::decode(src, color_transform)
                .map(|(data, consumed)| DecodedPayload { data, consumed })
                .ok_or(FilterError::CodecRejected)
        }
        b"CCITTFaxDecode" | b"CCF" => {
            let ccitt_params = read_ccitt_params(width, height, params);
            ccitt::decode(src, &ccitt_params)
                .map(|(data, consumed)| DecodedPayload { data, consumed })
                .ok_or(FilterError::InvalidScanlineGeometry)
        }
        _ => Err(FilterError::UnknownFilter),
    }
}

fn read_ccitt_params(width: u32, height: u32, params: Option<&Dict>) -> ccitt::CcittParams {
    let mut p = ccitt::CcittParams {
        columns: if width > 0 { width } else { 1728 },
        rows: height,
        ..Default::default()
    };
    let Some(dict) = params else { return p };

    if let Some(n) = dict.get_by_bytes(b"K").and_then(|o| o.as_number()) {
        p.k = n.as_i32();
    }
    if let Some(n) = dict.get_by_bytes(b"Columns").and_then(|o| o.as_number()) {
        p.columns = n.as_i32().max(0) as u32;
    }
    if let Some(n) = dict.get_by_bytes(b"Rows").and_then(|o| o.as_number()) {
        if n.as_i32() > 0 {
            p.rows = n.as_i32() as u32;
        }
    }
    if let Some(o) = dict.get_by_bytes(b"EndOfLine") {
        p.end_of_line = matches!(o, crate::object::Object::Boolean(true));
    }
    if let Some(o) = dict.get_by_bytes(b"EncodedByteAlign") {
        p.encoded_byte_align = matches!(o, crate::object::Object::Boolean(true));
    }
    if let Some(o) = dict.get_by_bytes(b"BlackIs1") {
        p.black_is_1 = matches!(o, crate::object::Object::Boolean(true));
    }
    p
}

/// Resolve a filter `Name` entry (possibly the first element of an Array)
/// together with its matching `DecodeParms` entry.
pub fn first_filter_and_params(dict: &Dict) -> Option<(Name, Option<Dict>)> {
    let filter_obj = dict
        .get_by_bytes(b"Filter")
        .or_else(|| dict.get_by_bytes(b"F"))?;

    let filter_name = match filter_obj {
        crate::object::Object::Name(n) => n.clone(),
        crate::object::Object::Array(arr) => arr.get(0)?.as_name()?.clone(),
        _ => return None,
    };

    let parms_obj = dict
        .get_by_bytes(b"DecodeParms")
        .or_else(|| dict.get_by_bytes(b"DP"));
    let parms = match parms_obj {
        Some(crate::object::Object::Dict(d)) => Some(d.clone()),
        Some(crate::object::Object::Array(arr)) => {
            arr.get(0).and_then(|o| o.as_dict()).cloned()
        }
        _ => None,
    };

    Some((filter_name, parms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_filter_is_unknown_filter_error() {
        let err = dispatch(b"Whatever", b"", 0, 0, None).unwrap_err();
        assert_eq!(err, FilterError::UnknownFilter);
    }

    #[test]
    fn ascii_hex_dispatches_by_long_and_short_name() {
        assert_eq!(
            dispatch(b"ASCIIHexDecode", b"41>", 0, 0, None).unwrap().data,
            b"A"
        );
        assert_eq!(dispatch(b"AHx", b"41>", 0, 0, None).unwrap().data, b"A");
    }
}
