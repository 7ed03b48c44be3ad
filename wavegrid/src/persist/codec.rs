//! Compact URL-friendly encoding of widget state.
//!
//! Grammar:
//!
//! ```text
//! value  := object | array | scalar
//! object := "(" [ key "~" value { "_" key "~" value } ] ")"
//! array  := "!" [ value { "_" value } ] "*"
//! scalar := "true" | "false" | "null" | number | string
//! ```
//!
//! Reserved characters inside keys and strings are written as `%XX`. A
//! string that is empty, or would read back as a number, boolean or null,
//! carries a leading `'`.

use serde_json::{Map, Number, Value};
use thiserror::Error;

const RESERVED: [char; 8] = ['(', ')', '~', '_', '!', '*', '\'', '%'];
const STRING_MARK: char = '\'';

/// Errors decoding an encoded state string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Unexpected '{found}' at {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("Invalid escape at {position}")]
    InvalidEscape { position: usize },

    #[error("Trailing input at {position}")]
    TrailingInput { position: usize },
}

/// Encode a value.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use wavegrid::persist::{decode, encode};
///
/// let state = json!({"tabs": {"activeIndex": 2}, "open": ["a", "b"]});
/// let encoded = encode(&state);
/// assert_eq!(encoded, "(tabs~(activeIndex~2)_open~!a_b*)");
/// assert_eq!(decode(&encoded).unwrap(), state);
/// ```
pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('!');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('_');
                }
                write_value(out, item);
            }
            out.push('*');
        }
        Value::Object(map) => {
            out.push('(');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push('_');
                }
                write_string(out, key);
                out.push('~');
                write_value(out, item);
            }
            out.push(')');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    if reads_as_literal(s) {
        out.push(STRING_MARK);
    }
    for ch in s.chars() {
        if RESERVED.contains(&ch) {
            out.push_str(&format!("%{:02X}", ch as u32));
        } else {
            out.push(ch);
        }
    }
}

fn reads_as_literal(s: &str) -> bool {
    s.is_empty() || matches!(s, "true" | "false" | "null") || s.parse::<Number>().is_ok()
}

/// Decode an encoded string.
pub fn decode(input: &str) -> Result<Value, CodecError> {
    let mut decoder = Decoder { input, pos: 0 };
    let value = decoder.value()?;
    if decoder.pos < input.len() {
        return Err(CodecError::TrailingInput { position: decoder.pos });
    }
    Ok(value)
}

struct Decoder<'a> {
    input: &'a str,
    pos: usize,
}

impl Decoder<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn expect(&mut self, wanted: char) -> Result<(), CodecError> {
        let position = self.pos;
        match self.bump() {
            Some(ch) if ch == wanted => Ok(()),
            Some(found) => Err(CodecError::UnexpectedChar { found, position }),
            None => Err(CodecError::UnexpectedEnd),
        }
    }

    fn value(&mut self) -> Result<Value, CodecError> {
        match self.peek() {
            None => Err(CodecError::UnexpectedEnd),
            Some('(') => self.object(),
            Some('!') => self.array(),
            Some(_) => self.scalar(),
        }
    }

    fn object(&mut self) -> Result<Value, CodecError> {
        self.expect('(')?;
        let mut map = Map::new();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(Value::Object(map));
        }
        loop {
            let (key, _) = self.token()?;
            self.expect('~')?;
            let item = self.value()?;
            map.insert(key, item);
            let position = self.pos;
            match self.bump() {
                Some('_') => continue,
                Some(')') => return Ok(Value::Object(map)),
                Some(found) => return Err(CodecError::UnexpectedChar { found, position }),
                None => return Err(CodecError::UnexpectedEnd),
            }
        }
    }

    fn array(&mut self) -> Result<Value, CodecError> {
        self.expect('!')?;
        let mut items = Vec::new();
        if self.peek() == Some('*') {
            self.bump();
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.value()?);
            let position = self.pos;
            match self.bump() {
                Some('_') => continue,
                Some('*') => return Ok(Value::Array(items)),
                Some(found) => return Err(CodecError::UnexpectedChar { found, position }),
                None => return Err(CodecError::UnexpectedEnd),
            }
        }
    }

    fn scalar(&mut self) -> Result<Value, CodecError> {
        let (text, marked) = self.token()?;
        if marked {
            return Ok(Value::String(text));
        }
        Ok(match text.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            _ => match text.parse::<Number>() {
                Ok(n) => Value::Number(n),
                Err(_) => Value::String(text),
            },
        })
    }

    /// Read an unescaped token up to the next delimiter. Returns the text and
    /// whether it carried the string mark.
    fn token(&mut self) -> Result<(String, bool), CodecError> {
        let start = self.pos;
        let marked = self.peek() == Some(STRING_MARK);
        if marked {
            self.bump();
        }
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '(' | ')' | '~' | '_' | '!' | '*' | '\'' => break,
                '%' => {
                    let position = self.pos;
                    self.bump();
                    let hex = self
                        .input
                        .get(self.pos..self.pos + 2)
                        .ok_or(CodecError::InvalidEscape { position })?;
                    let byte = u8::from_str_radix(hex, 16)
                        .ok()
                        .filter(u8::is_ascii)
                        .ok_or(CodecError::InvalidEscape { position })?;
                    text.push(byte as char);
                    self.pos += 2;
                }
                _ => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
        if text.is_empty() && !marked {
            return match self.peek() {
                Some(found) => Err(CodecError::UnexpectedChar { found, position: start }),
                None => Err(CodecError::UnexpectedEnd),
            };
        }
        Ok((text, marked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_containers() {
        assert_eq!(encode(&json!({})), "()");
        assert_eq!(encode(&json!([])), "!*");
        assert_eq!(decode("(a~()_b~!*)").unwrap(), json!({"a": {}, "b": []}));
    }

    #[test]
    fn test_literal_looking_strings_are_marked() {
        assert_eq!(encode(&json!("12")), "'12");
        assert_eq!(encode(&json!("true")), "'true");
        assert_eq!(encode(&json!("")), "'");
        assert_eq!(decode("'12").unwrap(), json!("12"));
        assert_eq!(decode("12").unwrap(), json!(12));
        assert_eq!(decode("'").unwrap(), json!(""));
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let value = json!({"a_b": "x~(y)!*'%"});
        let encoded = encode(&value);
        assert_eq!(encoded, "(a%5Fb~x%7E%28y%29%21%2A%27%25)");
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_nested_round_trip() {
        let value = json!({
            "grid": {"page": 3, "sel": ["1", 2, null, true], "sort": {"field": "name"}},
            "tab": -1.5,
            "name": "Grüße"
        });
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode(""), Err(CodecError::UnexpectedEnd));
        assert_eq!(decode("(a~1"), Err(CodecError::UnexpectedEnd));
        assert_eq!(
            decode("(a~1)x"),
            Err(CodecError::TrailingInput { position: 5 })
        );
        assert_eq!(
            decode("(a~1~2)"),
            Err(CodecError::UnexpectedChar { found: '~', position: 4 })
        );
        assert_eq!(decode("a%zz"), Err(CodecError::InvalidEscape { position: 1 }));
        assert_eq!(
            decode("!_*"),
            Err(CodecError::UnexpectedChar { found: '_', position: 1 })
        );
    }
}
