//! A token/object scanner, inline-image assembler and incremental content
//! driver for PDF page and form-XObject content streams.
//!
//! A PDF content stream is a terse, mostly-textual sequence of operators and
//! operands with embedded inline images whose bodies are opaque binary
//! filtered data. This crate consumes such a byte buffer and produces a
//! stream of tokens and composite values — numbers, names, strings, arrays,
//! dictionaries, keywords, and inline-image streams — without itself
//! interpreting what any operator *means*. That interpretation (`q`, `cm`,
//! `Do`, `Tj`, `re`, `f`, `S`, …) is an external collaborator this crate only
//! talks to through the [`driver::SubParser`] trait.
//!
//! The three pieces that matter most:
//!
//! - [`scanner::Scanner`] — the bounds-checked token/object scanner.
//! - [`inline_image::read_inline_stream`] — assembles the bytes between
//!   `ID` and `EI`, either by invoking a filter to learn the consumed
//!   length or by re-tokenizing forward without being fooled by `EI` bytes
//!   inside the payload.
//! - [`driver::ContentDriver`] — the pausable state machine that gathers one
//!   or more content streams belonging to a page, feeds them to a content
//!   parser in bounded steps, and finalizes page objects (clip-path
//!   simplification in particular).
//!
//! Low-level filter codecs, the operator-level interpreter, document object
//! graph ownership, color-space loading, fonts, cross-reference tables,
//! encryption and rendering are all out of scope: this crate calls out to
//! them through narrow interfaces and otherwise stays a pure transformer
//! over an in-memory buffer.
#![forbid(unsafe_code)]

pub mod driver;
pub mod error;
pub mod filter;
pub mod inline_image;
pub mod object;
pub mod page_objects;
pub mod reader;
pub mod scanner;
pub mod trivia;

pub use driver::{ContentDriver, ContentSource, FormSetup, Matrix, PauseSignal, Rect, Status, SubParser};
pub use error::{DriverSetupError, FilterError, InlineImageError};
pub use object::{Array, Dict, Name, Number, Object, PdfString, Stream};
pub use page_objects::{ClipPath, ObjectKind, PageObject, SubPath};
pub use reader::Reader;
pub use scanner::{Scanner, Token, TokenKind};
