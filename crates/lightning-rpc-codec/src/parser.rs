use serde_json::{Map, Number, Value};

use crate::error::{CodecError, Result};

/// Default maximum nesting depth of arrays and objects.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum length of a single string or number token: 16 MiB.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 16 * 1024 * 1024;

/// Limits applied by the stream parser.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum nesting depth. Default: 128.
    pub max_depth: usize,
    /// Maximum bytes held for one in-progress string or number. Default: 16 MiB.
    pub max_token_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    FirstValueOrEnd,
    Value,
    CommaOrEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    FirstKeyOrEnd,
    Key,
    Colon,
    Value,
    CommaOrEnd,
}

/// An array or object still being assembled.
#[derive(Debug)]
enum Container {
    Array {
        items: Vec<Value>,
        state: ArrayState,
    },
    Object {
        map: Map<String, Value>,
        key: Option<String>,
        state: ObjectState,
    },
}

#[derive(Debug, Clone, Copy)]
enum Literal {
    True,
    False,
    Null,
}

impl Literal {
    fn text(self) -> &'static [u8] {
        match self {
            Literal::True => b"true",
            Literal::False => b"false",
            Literal::Null => b"null",
        }
    }

    fn value(self) -> Value {
        match self {
            Literal::True => Value::Bool(true),
            Literal::False => Value::Bool(false),
            Literal::Null => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Escape {
    None,
    Backslash,
    Unicode { code: u32, digits: u8 },
}

#[derive(Debug)]
struct StrToken {
    buf: Vec<u8>,
    key: bool,
    escape: Escape,
    high_surrogate: Option<u32>,
}

impl StrToken {
    fn new(key: bool) -> Self {
        Self {
            buf: Vec::new(),
            key,
            escape: Escape::None,
            high_surrogate: None,
        }
    }

    /// Consume one byte of string content. Returns `true` on the closing quote.
    fn push(&mut self, byte: u8, offset: u64, max_len: usize) -> Result<bool> {
        match self.escape {
            Escape::None => {
                if self.high_surrogate.is_some() && byte != b'\\' {
                    return Err(syntax(offset, byte, "a low surrogate escape"));
                }
                match byte {
                    b'"' => return Ok(true),
                    b'\\' => self.escape = Escape::Backslash,
                    0x00..=0x1f => return Err(syntax(offset, byte, "a non-control character")),
                    _ => self.buf.push(byte),
                }
            }
            Escape::Backslash => {
                if self.high_surrogate.is_some() && byte != b'u' {
                    return Err(syntax(offset, byte, "a low surrogate escape"));
                }
                let unescaped = match byte {
                    b'"' => b'"',
                    b'\\' => b'\\',
                    b'/' => b'/',
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'u' => {
                        self.escape = Escape::Unicode { code: 0, digits: 0 };
                        return Ok(false);
                    }
                    _ => return Err(syntax(offset, byte, "an escape character")),
                };
                self.buf.push(unescaped);
                self.escape = Escape::None;
            }
            Escape::Unicode { code, digits } => {
                let digit = (byte as char)
                    .to_digit(16)
                    .ok_or_else(|| syntax(offset, byte, "a hex digit"))?;
                let code = code * 16 + digit;
                if digits + 1 < 4 {
                    self.escape = Escape::Unicode {
                        code,
                        digits: digits + 1,
                    };
                } else {
                    self.escape = Escape::None;
                    self.push_code_unit(code, offset, byte)?;
                }
            }
        }

        if self.buf.len() > max_len {
            return Err(CodecError::TokenTooLong {
                len: self.buf.len(),
                max: max_len,
            });
        }
        Ok(false)
    }

    fn push_code_unit(&mut self, code: u32, offset: u64, byte: u8) -> Result<()> {
        let scalar = match self.high_surrogate.take() {
            Some(high) => {
                if !(0xDC00..=0xDFFF).contains(&code) {
                    return Err(syntax(offset, byte, "a low surrogate"));
                }
                0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00)
            }
            None if (0xD800..=0xDBFF).contains(&code) => {
                self.high_surrogate = Some(code);
                return Ok(());
            }
            None if (0xDC00..=0xDFFF).contains(&code) => {
                return Err(syntax(offset, byte, "a leading surrogate before a trailing one"));
            }
            None => code,
        };
        let ch = char::from_u32(scalar).ok_or_else(|| syntax(offset, byte, "a unicode scalar"))?;
        let mut utf8 = [0u8; 4];
        self.buf
            .extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        Ok(())
    }
}

#[derive(Debug, Default)]
enum Token {
    #[default]
    None,
    Str(StrToken),
    Number(String),
    Literal { literal: Literal, matched: usize },
}

/// Push parser that splits an undelimited byte stream into top-level JSON values.
///
/// Bytes may be fed in arbitrary chunks, including one at a time. Values that
/// complete while nested inside an array or object are folded into their
/// parent; only values completing at depth zero are returned.
///
/// After an error the parser state is meaningless: call [`reset`](Self::reset)
/// or drop it.
#[derive(Debug)]
pub struct JsonStreamParser {
    config: DecoderConfig,
    stack: Vec<Container>,
    token: Token,
    offset: u64,
}

impl Default for JsonStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStreamParser {
    /// Create a parser with default limits.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a parser with explicit limits.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
            token: Token::None,
            offset: 0,
        }
    }

    /// Feed bytes until one top-level value completes.
    ///
    /// Returns how many bytes were consumed and the value, if any. Bytes past
    /// the returned count have not been looked at and must be fed again.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(usize, Option<Value>)> {
        for (index, &byte) in bytes.iter().enumerate() {
            if let Some(value) = self.push(byte)? {
                return Ok((index + 1, Some(value)));
            }
        }
        Ok((bytes.len(), None))
    }

    /// Feed a single byte.
    pub fn push(&mut self, byte: u8) -> Result<Option<Value>> {
        let offset = self.offset;
        self.offset += 1;

        match std::mem::take(&mut self.token) {
            Token::None => self.structural(byte, offset),
            Token::Str(mut token) => {
                if token.push(byte, offset, self.config.max_token_len)? {
                    let text = String::from_utf8(token.buf)
                        .map_err(|_| CodecError::InvalidUtf8 { offset })?;
                    self.finish_string(text, token.key)
                } else {
                    self.token = Token::Str(token);
                    Ok(None)
                }
            }
            Token::Number(mut text) => {
                if is_number_byte(byte) {
                    text.push(byte as char);
                    if text.len() > self.config.max_token_len {
                        return Err(CodecError::TokenTooLong {
                            len: text.len(),
                            max: self.config.max_token_len,
                        });
                    }
                    self.token = Token::Number(text);
                    return Ok(None);
                }
                let emitted = self.finish_number(text, offset)?;
                let next = self.structural(byte, offset)?;
                Ok(emitted.or(next))
            }
            Token::Literal { literal, matched } => {
                let text = literal.text();
                if text[matched] != byte {
                    return Err(syntax(offset, byte, "a literal (true, false or null)"));
                }
                if matched + 1 == text.len() {
                    self.complete(literal.value())
                } else {
                    self.token = Token::Literal {
                        literal,
                        matched: matched + 1,
                    };
                    Ok(None)
                }
            }
        }
    }

    /// Signal end of input.
    ///
    /// A top-level number has no closing token, so it completes here. Any
    /// other partial value is [`CodecError::Truncated`].
    pub fn finish(&mut self) -> Result<Option<Value>> {
        match std::mem::take(&mut self.token) {
            Token::None if self.stack.is_empty() => Ok(None),
            Token::Number(text) if self.stack.is_empty() => {
                let offset = self.offset;
                self.finish_number(text, offset)
            }
            _ => {
                self.reset();
                Err(CodecError::Truncated)
            }
        }
    }

    /// Discard all partial state.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.token = Token::None;
    }

    /// Current nesting depth (number of open arrays and objects).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether the parser sits between top-level values.
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty() && matches!(self.token, Token::None)
    }

    /// Current limits.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn structural(&mut self, byte: u8, offset: u64) -> Result<Option<Value>> {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => Ok(None),
            b'{' => {
                self.expect_value(byte, offset)?;
                self.open(Container::Object {
                    map: Map::new(),
                    key: None,
                    state: ObjectState::FirstKeyOrEnd,
                })
            }
            b'[' => {
                self.expect_value(byte, offset)?;
                self.open(Container::Array {
                    items: Vec::new(),
                    state: ArrayState::FirstValueOrEnd,
                })
            }
            b'}' => self.close_object(byte, offset),
            b']' => self.close_array(byte, offset),
            b',' => match self.stack.last_mut() {
                Some(Container::Array { state, .. }) if *state == ArrayState::CommaOrEnd => {
                    *state = ArrayState::Value;
                    Ok(None)
                }
                Some(Container::Object { state, .. }) if *state == ObjectState::CommaOrEnd => {
                    *state = ObjectState::Key;
                    Ok(None)
                }
                _ => Err(self.unexpected(byte, offset)),
            },
            b':' => match self.stack.last_mut() {
                Some(Container::Object { state, .. }) if *state == ObjectState::Colon => {
                    *state = ObjectState::Value;
                    Ok(None)
                }
                _ => Err(self.unexpected(byte, offset)),
            },
            b'"' => {
                let key = matches!(
                    self.stack.last(),
                    Some(Container::Object {
                        state: ObjectState::FirstKeyOrEnd | ObjectState::Key,
                        ..
                    })
                );
                if !key {
                    self.expect_value(byte, offset)?;
                }
                self.token = Token::Str(StrToken::new(key));
                Ok(None)
            }
            b'-' | b'0'..=b'9' => {
                self.expect_value(byte, offset)?;
                self.token = Token::Number(String::from(byte as char));
                Ok(None)
            }
            b't' | b'f' | b'n' => {
                self.expect_value(byte, offset)?;
                let literal = match byte {
                    b't' => Literal::True,
                    b'f' => Literal::False,
                    _ => Literal::Null,
                };
                self.token = Token::Literal {
                    literal,
                    matched: 1,
                };
                Ok(None)
            }
            _ => Err(self.unexpected(byte, offset)),
        }
    }

    fn expect_value(&self, byte: u8, offset: u64) -> Result<()> {
        let accepts = match self.stack.last() {
            None => true,
            Some(Container::Array { state, .. }) => {
                matches!(state, ArrayState::FirstValueOrEnd | ArrayState::Value)
            }
            Some(Container::Object { state, .. }) => *state == ObjectState::Value,
        };
        if accepts {
            Ok(())
        } else {
            Err(self.unexpected(byte, offset))
        }
    }

    fn open(&mut self, container: Container) -> Result<Option<Value>> {
        if self.stack.len() >= self.config.max_depth {
            return Err(CodecError::DepthExceeded {
                max: self.config.max_depth,
            });
        }
        self.stack.push(container);
        Ok(None)
    }

    fn close_object(&mut self, byte: u8, offset: u64) -> Result<Option<Value>> {
        let closable = matches!(
            self.stack.last(),
            Some(Container::Object {
                state: ObjectState::FirstKeyOrEnd | ObjectState::CommaOrEnd,
                ..
            })
        );
        if !closable {
            return Err(self.unexpected(byte, offset));
        }
        match self.stack.pop() {
            Some(Container::Object { map, .. }) => self.complete(Value::Object(map)),
            _ => Err(syntax(offset, byte, "an open object")),
        }
    }

    fn close_array(&mut self, byte: u8, offset: u64) -> Result<Option<Value>> {
        let closable = matches!(
            self.stack.last(),
            Some(Container::Array {
                state: ArrayState::FirstValueOrEnd | ArrayState::CommaOrEnd,
                ..
            })
        );
        if !closable {
            return Err(self.unexpected(byte, offset));
        }
        match self.stack.pop() {
            Some(Container::Array { items, .. }) => self.complete(Value::Array(items)),
            _ => Err(syntax(offset, byte, "an open array")),
        }
    }

    fn finish_string(&mut self, text: String, key: bool) -> Result<Option<Value>> {
        if key {
            if let Some(Container::Object { key, state, .. }) = self.stack.last_mut() {
                *key = Some(text);
                *state = ObjectState::Colon;
            }
            return Ok(None);
        }
        self.complete(Value::String(text))
    }

    fn finish_number(&mut self, text: String, offset: u64) -> Result<Option<Value>> {
        let number: Number = serde_json::from_str(&text)
            .map_err(|_| CodecError::InvalidNumber { offset, text })?;
        self.complete(Value::Number(number))
    }

    /// Attach a finished value to its parent, or hand it out at depth zero.
    fn complete(&mut self, value: Value) -> Result<Option<Value>> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(Container::Array { items, state }) => {
                items.push(value);
                *state = ArrayState::CommaOrEnd;
                Ok(None)
            }
            Some(Container::Object { map, key, state }) => {
                if let Some(key) = key.take() {
                    map.insert(key, value);
                }
                *state = ObjectState::CommaOrEnd;
                Ok(None)
            }
        }
    }

    fn unexpected(&self, byte: u8, offset: u64) -> CodecError {
        let expected = match self.stack.last() {
            None => "a JSON value",
            Some(Container::Array { state, .. }) => match state {
                ArrayState::FirstValueOrEnd => "a value or ']'",
                ArrayState::Value => "a value",
                ArrayState::CommaOrEnd => "',' or ']'",
            },
            Some(Container::Object { state, .. }) => match state {
                ObjectState::FirstKeyOrEnd => "a string key or '}'",
                ObjectState::Key => "a string key",
                ObjectState::Colon => "':'",
                ObjectState::Value => "a value",
                ObjectState::CommaOrEnd => "',' or '}'",
            },
        };
        syntax(offset, byte, expected)
    }
}

fn is_number_byte(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E')
}

fn syntax(offset: u64, byte: u8, expected: &'static str) -> CodecError {
    CodecError::Syntax {
        offset,
        byte,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse_all(parser: &mut JsonStreamParser, mut bytes: &[u8]) -> Vec<Value> {
        let mut values = Vec::new();
        while !bytes.is_empty() {
            let (consumed, value) = parser.feed(bytes).unwrap();
            values.extend(value);
            bytes = &bytes[consumed..];
        }
        values
    }

    fn parse_chunked(input: &[u8], chunk: usize) -> Vec<Value> {
        let mut parser = JsonStreamParser::new();
        let mut values = Vec::new();
        for piece in input.chunks(chunk) {
            values.extend(parse_all(&mut parser, piece));
        }
        values.extend(parser.finish().unwrap());
        values
    }

    const STREAM: &str = concat!(
        r#"{"id":"1","result":{"alias":"node","peers":[{"id":"02ab","channels":[]}]}}"#,
        r#"{"id":"2","error":"unknown command"}"#,
        "\n  ",
        r#"{"id":"3","result":[1,-2.5,3e2,true,false,null,"x\"y"]}"#,
    );

    fn expected_stream() -> Vec<Value> {
        vec![
            json!({"id":"1","result":{"alias":"node","peers":[{"id":"02ab","channels":[]}]}}),
            json!({"id":"2","error":"unknown command"}),
            json!({"id":"3","result":[1,-2.5,300.0,true,false,null,"x\"y"]}),
        ]
    }

    #[test]
    fn emits_only_top_level_values() {
        let values = parse_chunked(STREAM.as_bytes(), STREAM.len());
        assert_eq!(values, expected_stream());
    }

    #[test]
    fn byte_by_byte_delivery() {
        let values = parse_chunked(STREAM.as_bytes(), 1);
        assert_eq!(values, expected_stream());
    }

    #[test]
    fn every_chunk_size_yields_same_values() {
        for chunk in 1..=STREAM.len() {
            let values = parse_chunked(STREAM.as_bytes(), chunk);
            assert_eq!(values, expected_stream(), "chunk size {chunk}");
        }
    }

    #[test]
    fn feed_stops_after_first_value() {
        let mut parser = JsonStreamParser::new();
        let input = br#"{"a":1}{"b":2}"#;
        let (consumed, value) = parser.feed(input).unwrap();
        assert_eq!(consumed, 7);
        assert_eq!(value, Some(json!({"a":1})));
        assert!(parser.is_idle());

        let (consumed, value) = parser.feed(&input[7..]).unwrap();
        assert_eq!(consumed, 7);
        assert_eq!(value, Some(json!({"b":2})));
    }

    #[test]
    fn depth_tracks_open_containers() {
        let mut parser = JsonStreamParser::new();
        parser.feed(br#"{"a":[[{"#).unwrap();
        assert_eq!(parser.depth(), 4);
        assert!(!parser.is_idle());
        parser.feed(br#"}]]"#).unwrap();
        assert_eq!(parser.depth(), 1);
        let (_, value) = parser.feed(b"}").unwrap();
        assert_eq!(value, Some(json!({"a":[[{}]]})));
        assert_eq!(parser.depth(), 0);
    }

    #[test]
    fn top_level_scalars() {
        let values = parse_chunked(br#""a" true null 12 [] -3.5"#, 3);
        assert_eq!(
            values,
            vec![json!("a"), json!(true), json!(null), json!(12), json!([]), json!(-3.5)]
        );
    }

    #[test]
    fn number_followed_directly_by_object() {
        let values = parse_chunked(br#"7{"x":0}"#, 1);
        assert_eq!(values, vec![json!(7), json!({"x":0})]);
    }

    #[test]
    fn string_escapes_and_unicode() {
        let input = r#"{"s":"tab\tnl\nslash\/q\"bs\\ é 😀 café","u":"\u00e9\ud83d\ude00\u26a1"}"#;
        let values = parse_chunked(input.as_bytes(), 2);
        assert_eq!(
            values,
            vec![json!({"s":"tab\tnl\nslash/q\"bs\\ é 😀 café","u":"é😀⚡"})]
        );
    }

    #[test]
    fn raw_utf8_split_across_chunks() {
        let input = "[\"ünïcødé ⚡\"]".as_bytes();
        let values = parse_chunked(input, 1);
        assert_eq!(values, vec![json!(["ünïcødé ⚡"])]);
    }

    #[test]
    fn duplicate_keys_keep_last() {
        let values = parse_chunked(br#"{"a":1,"a":2}"#, 4);
        assert_eq!(values, vec![json!({"a":2})]);
    }

    fn first_error(input: &[u8]) -> CodecError {
        let mut parser = JsonStreamParser::new();
        for &byte in input {
            if let Err(err) = parser.push(byte) {
                return err;
            }
        }
        parser.finish().unwrap_err()
    }

    #[test]
    fn rejects_garbage_between_values() {
        let err = first_error(br#"{"id":"1"}x"#);
        assert!(matches!(
            err,
            CodecError::Syntax {
                offset: 10,
                byte: b'x',
                ..
            }
        ));
        assert!(err.is_malformed());
    }

    #[test]
    fn rejects_trailing_commas() {
        assert!(matches!(first_error(b"[1,]"), CodecError::Syntax { .. }));
        assert!(matches!(first_error(br#"{"a":1,}"#), CodecError::Syntax { .. }));
    }

    #[test]
    fn rejects_missing_colon_and_bare_keys() {
        assert!(matches!(first_error(br#"{"a" 1}"#), CodecError::Syntax { .. }));
        assert!(matches!(first_error(br#"{a:1}"#), CodecError::Syntax { .. }));
    }

    #[test]
    fn rejects_bad_literal() {
        assert!(matches!(first_error(b"[tru]"), CodecError::Syntax { .. }));
    }

    #[test]
    fn rejects_invalid_number() {
        assert!(matches!(
            first_error(b"[1-2]"),
            CodecError::InvalidNumber { .. }
        ));
        assert!(matches!(first_error(b"[--]"), CodecError::InvalidNumber { .. }));
    }

    #[test]
    fn rejects_control_characters_in_strings() {
        assert!(matches!(first_error(b"\"a\nb\""), CodecError::Syntax { .. }));
    }

    #[test]
    fn rejects_lone_surrogates() {
        assert!(matches!(
            first_error(br#""\ud83d x""#),
            CodecError::Syntax { .. }
        ));
        assert!(matches!(
            first_error(br#""\ude00""#),
            CodecError::Syntax { .. }
        ));
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            first_error(b"\"\xff\xfe\""),
            CodecError::InvalidUtf8 { .. }
        ));
    }

    #[test]
    fn truncated_value_at_end_of_stream() {
        let mut parser = JsonStreamParser::new();
        parser.feed(br#"{"id":"1","res"#).unwrap();
        assert!(matches!(parser.finish(), Err(CodecError::Truncated)));
        assert!(parser.is_idle());
    }

    #[test]
    fn finish_when_idle_is_clean() {
        let mut parser = JsonStreamParser::new();
        parser.feed(b"  \n").unwrap();
        assert_eq!(parser.finish().unwrap(), None);
    }

    #[test]
    fn enforces_depth_limit() {
        let mut parser = JsonStreamParser::with_config(DecoderConfig {
            max_depth: 3,
            ..DecoderConfig::default()
        });
        parser.feed(b"[[[").unwrap();
        let err = parser.feed(b"[").unwrap_err();
        assert!(matches!(err, CodecError::DepthExceeded { max: 3 }));
    }

    #[test]
    fn enforces_token_limit() {
        let mut parser = JsonStreamParser::with_config(DecoderConfig {
            max_token_len: 4,
            ..DecoderConfig::default()
        });
        let err = parser.feed(br#"["abcdef"]"#).unwrap_err();
        assert!(matches!(err, CodecError::TokenTooLong { max: 4, .. }));
    }

    #[test]
    fn reset_discards_partial_state() {
        let mut parser = JsonStreamParser::new();
        parser.feed(br#"{"id":"1","result":[1,2"#).unwrap();
        parser.reset();
        let (_, value) = parser.feed(br#"{"id":"2"}"#).unwrap();
        assert_eq!(value, Some(json!({"id":"2"})));
    }
}
