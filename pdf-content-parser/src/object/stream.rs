//! Stream objects produced by inline-image assembly.

use super::Dict;

/// A dictionary paired with an owned byte payload — the result of
/// [`crate::inline_image::read_inline_stream`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dict: Dict,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Self { dict, data }
    }

    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    pub fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Dict, Vec<u8>) {
        (self.dict, self.data)
    }
}
