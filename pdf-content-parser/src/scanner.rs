//! Token and object reading over a content-stream byte buffer.

use crate::object::{number, Array, Dict, Name, Object, PdfString};
use crate::reader::Reader;
use crate::trivia;

/// Word buffers (for `Number`/`Keyword`/`Name` tokens and for the raw words
/// `read_object` reads internally) are never grown past this length; excess
/// bytes are still consumed from input, just not stored.
pub const MAX_WORD_LENGTH: usize = 256;

/// The classification of a token returned by [`Scanner::next_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Name,
    Keyword,
    /// A composite object, or a keyword-like literal (`true`/`false`/`null`).
    /// The parsed value is available via [`Scanner::last_object`].
    Other,
    EndOfData,
}

/// A single token: its classification plus the raw word bytes that produced
/// it (empty for `Other` and `EndOfData`, since those either carry a
/// composite object or nothing at all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub word: Vec<u8>,
}

impl Token {
    fn end_of_data() -> Self {
        Self {
            kind: TokenKind::EndOfData,
            word: Vec::new(),
        }
    }
}

/// A raw word as accumulated by the scanner's internal word reader — the
/// building block both `next_token` and `read_object` use, though each
/// drives it slightly differently (see [`Scanner::raw_word`]).
struct Word {
    bytes: Vec<u8>,
    is_number: bool,
}

/// The token/object scanner over a borrowed content-stream buffer.
pub struct Scanner<'a> {
    reader: Reader<'a>,
    last_object: Option<Object>,
    last_word: Vec<u8>,
}

/// Path-construction operators recognized by [`Scanner::skip_path_object`].
const PATH_OPERATORS: &[&[u8]] = &[b"m", b"l", b"c", b"v", b"y", b"h", b"re"];

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
            last_object: None,
            last_word: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn seek(&mut self, pos: usize) {
        self.reader.seek(pos);
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.reader.tail()
    }

    /// A slice of the underlying buffer by absolute byte offsets, clamped to
    /// empty if out of range.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        self.reader.slice(start, end).unwrap_or(&[])
    }

    /// The object parsed by the most recent `Other`-kind token or
    /// `read_object` call. Cleared at the start of every `next_token`.
    pub fn last_object(&mut self) -> Option<Object> {
        self.last_object.take()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            self.reader.eat_while(trivia::is_white_space);
            if self.reader.peek() == Some(b'%') {
                self.reader.advance();
                loop {
                    match self.reader.advance() {
                        None => return,
                        Some(b) if trivia::is_line_ending(b) => break,
                        _ => {}
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Skip trivia, dispatch on the first non-trivial byte, classify the
    /// accumulated word.
    pub fn next_token(&mut self) -> Token {
        self.last_object = None;
        self.skip_whitespace_and_comments();

        let Some(ch) = self.reader.peek() else {
            return Token::end_of_data();
        };

        if trivia::is_delimiter(ch) && ch != b'/' {
            // Don't consume; read_object re-examines this byte itself.
            self.last_object = self.read_object(true, false);
            return Token {
                kind: TokenKind::Other,
                word: Vec::new(),
            };
        }

        let mut word = Vec::new();
        let mut is_number = true;
        loop {
            let b = self.reader.advance().expect("peeked above");
            if word.len() < MAX_WORD_LENGTH {
                word.push(b);
            }
            if !trivia::is_numeric(b) {
                is_number = false;
            }
            match self.reader.peek() {
                None => break,
                Some(next) if trivia::is_delimiter(next) || trivia::is_white_space(next) => break,
                _ => {}
            }
        }

        if is_number {
            return Token {
                kind: TokenKind::Number,
                word,
            };
        }
        if word.first() == Some(&b'/') {
            return Token {
                kind: TokenKind::Name,
                word,
            };
        }
        if word == b"true" {
            self.last_object = Some(Object::Boolean(true));
            return Token {
                kind: TokenKind::Other,
                word,
            };
        }
        if word == b"null" {
            self.last_object = Some(Object::Null);
            return Token {
                kind: TokenKind::Other,
                word,
            };
        }
        if word == b"false" {
            self.last_object = Some(Object::Boolean(false));
            return Token {
                kind: TokenKind::Other,
                word,
            };
        }
        Token {
            kind: TokenKind::Keyword,
            word,
        }
    }

    /// The internal raw-word reader `read_object` drives: like the word
    /// accumulation in `next_token`, but delimiters are stored as the word's
    /// first byte rather than dispatched away, and `/`, `<`, `>` get their
    /// own continuation rules (a name body, or a doubled character forming
    /// `<<`/`>>`). This is what lets `read_object` recognize dictionary
    /// termination (`>>`) and array termination (`]`) as ordinary words.
    fn raw_word(&mut self) -> Word {
        self.skip_whitespace_and_comments();

        let mut word = Vec::new();
        let mut is_number = true;

        let Some(ch) = self.reader.peek() else {
            self.last_word.clear();
            return Word {
                bytes: word,
                is_number: false,
            };
        };

        if trivia::is_delimiter(ch) {
            self.reader.advance();
            word.push(ch);
            is_number = false;
            match ch {
                b'/' => {
                    while let Some(b) = self.reader.peek() {
                        if !trivia::is_regular(b) {
                            break;
                        }
                        self.reader.advance();
                        if word.len() < MAX_WORD_LENGTH {
                            word.push(b);
                        }
                    }
                }
                b'<' if self.reader.peek() == Some(b'<') => {
                    self.reader.advance();
                    word.push(b'<');
                }
                b'>' if self.reader.peek() == Some(b'>') => {
                    self.reader.advance();
                    word.push(b'>');
                }
                _ => {}
            }
        } else {
            loop {
                let b = self.reader.advance().expect("peeked above");
                if word.len() < MAX_WORD_LENGTH {
                    word.push(b);
                }
                if !trivia::is_numeric(b) {
                    is_number = false;
                }
                match self.reader.peek() {
                    None => break,
                    Some(next) if trivia::is_delimiter(next) || trivia::is_white_space(next) => {
                        break
                    }
                    _ => {}
                }
            }
        }

        self.last_word = word.clone();
        Word {
            bytes: word,
            is_number,
        }
    }

    /// Parse one complete object. `allow_nested_array`
    /// controls whether an array may itself contain an array when
    /// `in_array` is true; both are forwarded unchanged into dictionary
    /// values, which may always nest regardless of the outer context.
    pub fn read_object(&mut self, allow_nested_array: bool, in_array: bool) -> Option<Object> {
        let w = self.raw_word();
        if w.bytes.is_empty() {
            return None;
        }
        if w.is_number {
            return Some(Object::Number(number::parse(&w.bytes)));
        }

        match w.bytes[0] {
            b'/' => Some(Object::Name(Name::decode(&w.bytes[1..]))),
            b'(' => Some(Object::String(PdfString::new(self.read_string()))),
            b'<' => {
                if w.bytes.len() == 1 {
                    Some(Object::String(PdfString::new(self.read_hex_string())))
                } else {
                    self.read_dict()
                }
            }
            b'[' => {
                if in_array && !allow_nested_array {
                    log::warn!("nested array not allowed in this context, discarding it");
                    return None;
                }
                Some(self.read_array(allow_nested_array))
            }
            _ => match w.bytes.as_slice() {
                b"true" => Some(Object::Boolean(true)),
                b"false" => Some(Object::Boolean(false)),
                b"null" => Some(Object::Null),
                _ => None,
            },
        }
    }

    fn read_dict(&mut self) -> Option<Object> {
        let mut dict = Dict::new();
        loop {
            let kw = self.raw_word();
            if kw.bytes.is_empty() {
                log::warn!("dictionary missing closing >> before end of data");
                return None;
            }
            if kw.bytes == b">>" {
                break;
            }
            if kw.bytes[0] != b'/' {
                log::warn!("dictionary key is not a name, discarding partial dictionary");
                return None;
            }
            let key = Name::decode(&kw.bytes[1..]);
            let value = self.read_object(true, false)?;
            if !key.is_empty() {
                dict.insert(key, value);
            }
        }
        Some(Object::Dict(dict))
    }

    fn read_array(&mut self, allow_nested_array: bool) -> Object {
        let mut items = Array::new();
        loop {
            match self.read_object(allow_nested_array, true) {
                Some(obj) => items.push(obj),
                None => {
                    if self.last_word.is_empty() || self.last_word[0] == b']' {
                        break;
                    }
                    // Garbage token inside the array: it was already
                    // consumed by raw_word, so retry from the new position.
                }
            }
        }
        Object::Array(items)
    }

    /// Literal string state machine. Entry: position is just
    /// past the opening `(`.
    pub fn read_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut depth: u32 = 0;
        let mut state: u8 = 0;
        let mut octal: u8 = 0;

        loop {
            let Some(b) = self.reader.advance() else {
                break;
            };
            match state {
                0 => match b {
                    b')' => {
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                        push_capped(&mut out, b')');
                    }
                    b'(' => {
                        depth += 1;
                        push_capped(&mut out, b'(');
                    }
                    b'\\' => state = 1,
                    _ => push_capped(&mut out, b),
                },
                1 => {
                    match b {
                        b'0'..=b'7' => {
                            octal = b - b'0';
                            state = 2;
                        }
                        b'n' => {
                            push_capped(&mut out, b'\n');
                            state = 0;
                        }
                        b'r' => {
                            push_capped(&mut out, b'\r');
                            state = 0;
                        }
                        b't' => {
                            push_capped(&mut out, b'\t');
                            state = 0;
                        }
                        b'b' => {
                            push_capped(&mut out, 0x08);
                            state = 0;
                        }
                        b'f' => {
                            push_capped(&mut out, 0x0c);
                            state = 0;
                        }
                        b'\r' => state = 4,
                        b'\n' => state = 0,
                        _ => {
                            push_capped(&mut out, b);
                            state = 0;
                        }
                    }
                }
                2 | 3 => {
                    if (b'0'..=b'7').contains(&b) {
                        octal = (octal << 3) | (b - b'0');
                        if state == 2 {
                            state = 3;
                        } else {
                            push_capped(&mut out, octal);
                            state = 0;
                        }
                    } else {
                        push_capped(&mut out, octal);
                        state = 0;
                        // Reprocess this byte in state 0.
                        self.reader.seek(self.reader.position() - 1);
                        continue;
                    }
                }
                4 => {
                    // CRLF continuation: \r was already consumed transitioning
                    // into this state; absorb a following \n, then resume.
                    state = 0;
                    if b != b'\n' {
                        self.reader.seek(self.reader.position() - 1);
                    }
                }
                _ => unreachable!(),
            }
        }

        if state == 2 || state == 3 {
            push_capped(&mut out, octal);
        }

        out.truncate(crate::object::MAX_STRING_LENGTH);
        out
    }

    /// Hex string reader. Entry: position is just past the
    /// opening `<` (the non-`<<` case has already been distinguished by the
    /// caller).
    pub fn read_hex_string(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut high: Option<u8> = None;

        loop {
            let Some(b) = self.reader.advance() else {
                break;
            };
            if b == b'>' {
                break;
            }
            let Some(v) = hex_val(b) else {
                continue;
            };
            match high.take() {
                Some(h) => push_capped(&mut out, (h << 4) | v),
                None => high = Some(v),
            }
        }

        if let Some(h) = high {
            push_capped(&mut out, h << 4);
        }

        out.truncate(crate::object::MAX_STRING_LENGTH);
        out
    }

    /// Discards zero-or-more numeric operands followed by a path-constructor
    /// operator keyword. On any mismatch, position is restored to where the
    /// scan started.
    pub fn skip_path_object(&mut self) -> bool {
        let start = self.reader.position();
        loop {
            let tok = self.next_token();
            match tok.kind {
                TokenKind::Number => continue,
                TokenKind::Keyword if PATH_OPERATORS.contains(&tok.word.as_slice()) => {
                    return true;
                }
                _ => {
                    self.reader.seek(start);
                    return false;
                }
            }
        }
    }
}

fn push_capped(out: &mut Vec<u8>, b: u8) {
    if out.len() < crate::object::MAX_STRING_LENGTH {
        out.push(b);
    }
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn scenario_tokens_and_dict() {
        let mut s = Scanner::new(b"123 /Name <</Key 4>>");
        let t1 = s.next_token();
        assert_eq!(t1.kind, TokenKind::Number);
        assert_eq!(t1.word, b"123");

        let t2 = s.next_token();
        assert_eq!(t2.kind, TokenKind::Name);
        assert_eq!(t2.word, b"/Name");

        let t3 = s.next_token();
        assert_eq!(t3.kind, TokenKind::Other);
        let obj = s.last_object().expect("dict parsed");
        let dict = obj.as_dict().expect("is a dict");
        assert_eq!(
            dict.get(&Name::decode(b"Key")),
            Some(&Object::Number(number::parse(b"4")))
        );

        let t4 = s.next_token();
        assert_eq!(t4.kind, TokenKind::EndOfData);
    }

    #[test]
    fn literal_string_with_escaped_parens() {
        let mut s = Scanner::new(b"(He said \\(hi\\))");
        assert_eq!(s.reader.advance(), Some(b'('));
        let out = s.read_string();
        assert_eq!(out, b"He said (hi)");
        assert_eq!(out.len(), 12);
    }

    #[test]
    fn hex_string_scenario() {
        let mut s = Scanner::new(b"<48656C6C6F>");
        assert_eq!(s.reader.advance(), Some(b'<'));
        assert_eq!(s.read_hex_string(), b"Hello");
    }

    #[test]
    fn odd_length_hex_string_pads_low_nibble() {
        let mut s = Scanner::new(b"<48656C6C6>");
        assert_eq!(s.reader.advance(), Some(b'<'));
        assert_eq!(s.read_hex_string(), b"Hell\x60");
    }

    #[test]
    fn nested_balanced_parens_round_trip() {
        let input = b"(((((((((())))))))))".to_vec();
        let mut s = Scanner::new(&input);
        assert_eq!(s.reader.advance(), Some(b'('));
        let out = s.read_string();
        assert_eq!(out, b"((((((((()))))))))");
    }

    #[test]
    fn octal_escape_sequences() {
        let mut s = Scanner::new(b"(\\101\\102)");
        assert_eq!(s.reader.advance(), Some(b'('));
        assert_eq!(s.read_string(), b"AB");
    }

    #[test]
    fn line_continuation_absorbs_following_newline() {
        let mut s = Scanner::new(b"(abc\\\r\ndef)");
        assert_eq!(s.reader.advance(), Some(b'('));
        assert_eq!(s.read_string(), b"abcdef");
    }

    #[test]
    fn word_buffer_is_capped_but_input_fully_consumed() {
        let mut long_word = vec![b'a'; 257];
        long_word.push(b' ');
        let mut s = Scanner::new(&long_word);
        let tok = s.next_token();
        assert_eq!(tok.kind, TokenKind::Keyword);
        assert_eq!(tok.word.len(), MAX_WORD_LENGTH);
        assert_eq!(s.position(), 258);
    }

    #[test]
    fn empty_input_is_end_of_data() {
        let mut s = Scanner::new(b"");
        assert_eq!(s.next_token().kind, TokenKind::EndOfData);
    }

    #[test]
    fn array_of_numbers() {
        let mut s = Scanner::new(b"[1 2 3]");
        let obj = s.read_object(true, false).unwrap();
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn disallowed_nested_array_returns_null() {
        let mut s = Scanner::new(b"[1 [2 3] 4]");
        // allow_nested_array = false: the nested `[` aborts immediately with
        // last_word == "[" (neither empty nor `]`), so the outer loop keeps
        // going and slurps the inner array's own elements (2, 3) as if they
        // were the outer array's; its closing `]` then ends the outer array
        // early, leaving the trailing `4]` unconsumed.
        let obj = s.read_object(false, false).unwrap();
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(0), Some(&Object::Number(number::parse(b"1"))));
        assert_eq!(arr.get(1), Some(&Object::Number(number::parse(b"2"))));
        assert_eq!(arr.get(2), Some(&Object::Number(number::parse(b"3"))));
    }

    #[test]
    fn dict_missing_closing_marker_returns_none() {
        let mut s = Scanner::new(b"<</Key 1");
        assert!(s.read_object(true, false).is_none());
    }

    #[test]
    fn skip_path_object_restores_position_on_mismatch() {
        let mut s = Scanner::new(b"1 2 Tj");
        assert!(!s.skip_path_object());
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn skip_path_object_consumes_numeric_operands_and_operator() {
        let mut s = Scanner::new(b"1 2 3 4 re");
        assert!(s.skip_path_object());
        assert_eq!(s.position(), 10);
    }
}
