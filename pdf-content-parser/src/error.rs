//! Distinguished error kinds.
//!
//! Token and object reading stay `Option`-returning throughout — a malformed
//! dictionary, a nested array where none is allowed, running off the end of
//! the buffer, these are all routine and recovered from locally by returning
//! `None`. A few named error kinds get an explicit
//! enum instead, so a caller that cares *why* inline-image assembly or
//! filter dispatch failed can inspect it rather than just seeing `None`.

use thiserror::Error;

/// Failure modes of [`crate::inline_image::read_inline_stream`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InlineImageError {
    /// Width × height × bits-per-component × components overflowed while
    /// computing the undecoded payload size.
    #[error("inline image geometry overflowed while computing payload size")]
    OverflowedGeometry,

    /// The named filter's decoder rejected the payload.
    #[error("filter {0} failed to decode the inline image payload")]
    CodecFailure(#[source] FilterError),
}

/// Failure modes of filter dispatch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter name is not one of the known long or abbreviated forms.
    #[error("unknown filter name")]
    UnknownFilter,

    /// A scanline-oriented codec's `pitch * height` computation overflowed
    /// 2^30, or `height == 0`.
    #[error("scanline geometry overflowed or height is zero")]
    InvalidScanlineGeometry,

    /// The underlying codec rejected the data it was given.
    #[error("codec rejected input data")]
    CodecRejected,
}

/// Failure modes of [`crate::driver::ContentDriver`] setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverSetupError {
    /// The page (or its form dictionary) was missing the resources needed
    /// to even begin parsing.
    #[error("page or form dictionary missing required entries")]
    MissingContent,

    /// `Contents` was present but neither a Stream nor an Array.
    #[error("Contents entry has an unsupported type")]
    UnsupportedContentsType,
}
