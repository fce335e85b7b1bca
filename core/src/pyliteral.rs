//! Python literal text form.
//!
//! A handful of web API actions only speak the textual literal form of
//! Python data (what `repr()` writes and `ast.literal_eval` reads) instead
//! of JSON. This module maps that grammar onto `serde_json::Value` in both
//! directions.
//!
//! The reader accepts both Python 2 and Python 3 spellings: `u''`/`b''`/`r''`
//! string prefixes, `L`-suffixed longs, tuples and sets (both become
//! arrays), adjacent string literals (`'a' 'b'`, which `pprint` produces for
//! long values) and triple-quoted strings. Dict keys that are not strings
//! are stored under their literal text.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Deepest container nesting the reader accepts.
pub const MAX_DEPTH: usize = 128;

/// Parse failure with the character offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Render `value` as a Python literal.
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Parse a Python literal into a JSON value.
pub fn from_str(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.current().is_some() {
        return Err(parser.error("trailing characters after literal"));
    }
    Ok(value)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => out.push_str(&i.to_string()),
            (None, Some(u), _) => out.push_str(&u.to_string()),
            // Debug keeps the decimal point on whole floats ("1.0").
            (None, None, Some(f)) => out.push_str(&format!("{f:?}")),
            (None, None, None) => out.push_str(&n.to_string()),
        },
        Value::String(s) => write_str(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_str(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_str(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push(quote);
}

struct Parser {
    chars: Vec<char>,
    position: usize,
    depth: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
            depth: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.position,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.current() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Run `parse` one container level deeper.
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting exceeds {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.current() {
            None => Err(self.error("unexpected end of input")),
            Some('{') => self.nested(Self::parse_braces),
            Some('[') => self.nested(|p| {
                p.advance();
                let (items, _) = p.parse_items(']')?;
                Ok(Value::Array(items))
            }),
            Some('(') => self.nested(|p| {
                p.advance();
                let (mut items, saw_comma) = p.parse_items(')')?;
                if items.len() == 1 && !saw_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Array(items))
                }
            }),
            Some('\'' | '"') => self.parse_strings(),
            Some(_) if self.at_prefixed_string() => self.parse_strings(),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
        }
    }

    /// Comma-separated values up to `close`. Reports whether a comma was
    /// seen so `(x)` and `(x,)` can be told apart.
    fn parse_items(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_whitespace();
            if self.current() == Some(close) {
                self.advance();
                return Ok((items, saw_comma));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.current() {
                Some(',') => {
                    saw_comma = true;
                    self.advance();
                }
                Some(c) if c == close => {}
                _ => return Err(self.error(format!("expected ',' or '{close}'"))),
            }
        }
    }

    /// `{...}` is a dict, or a set when the first entry has no colon.
    fn parse_braces(&mut self) -> Result<Value, LiteralError> {
        self.advance();
        self.skip_whitespace();
        if self.current() == Some('}') {
            self.advance();
            return Ok(Value::Object(Map::new()));
        }

        let first = self.parse_value()?;
        self.skip_whitespace();
        if self.current() != Some(':') {
            let mut items = vec![first];
            match self.current() {
                Some(',') => {
                    self.advance();
                    let (rest, _) = self.parse_items('}')?;
                    items.extend(rest);
                }
                Some('}') => self.advance(),
                _ => return Err(self.error("expected ':', ',' or '}'")),
            }
            return Ok(Value::Array(items));
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key_text(key), value);
            self.skip_whitespace();
            match self.current() {
                Some(',') => {
                    self.advance();
                    self.skip_whitespace();
                    if self.current() == Some('}') {
                        self.advance();
                        break;
                    }
                }
                Some('}') => {
                    self.advance();
                    break;
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
            key = self.parse_value()?;
        }
        Ok(Value::Object(map))
    }

    fn at_prefixed_string(&self) -> bool {
        let is_prefix = |c: Option<char>| matches!(c, Some('u' | 'U' | 'r' | 'R' | 'b' | 'B'));
        let is_quote = |c: Option<char>| matches!(c, Some('\'' | '"'));
        is_prefix(self.peek(0))
            && (is_quote(self.peek(1)) || (is_prefix(self.peek(1)) && is_quote(self.peek(2))))
    }

    fn parse_strings(&mut self) -> Result<Value, LiteralError> {
        let mut text = self.parse_string()?;
        loop {
            self.skip_whitespace();
            if matches!(self.current(), Some('\'' | '"')) || self.at_prefixed_string() {
                text.push_str(&self.parse_string()?);
            } else {
                return Ok(Value::String(text));
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        while let Some(c @ ('u' | 'U' | 'r' | 'R' | 'b' | 'B')) = self.current() {
            raw |= matches!(c, 'r' | 'R');
            self.advance();
        }
        let quote = match self.current() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected string quote")),
        };
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.position += if triple { 3 } else { 1 };

        let mut text = String::new();
        loop {
            let Some(c) = self.current() else {
                return Err(self.error("unterminated string"));
            };
            if c == quote {
                if !triple {
                    self.advance();
                    return Ok(text);
                }
                if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                    self.position += 3;
                    return Ok(text);
                }
            }
            if c == '\n' && !triple {
                return Err(self.error("unterminated string"));
            }
            self.advance();
            if c != '\\' {
                text.push(c);
                continue;
            }
            let Some(escaped) = self.current() else {
                return Err(self.error("unterminated string"));
            };
            self.advance();
            if raw {
                text.push('\\');
                text.push(escaped);
                continue;
            }
            match escaped {
                '\n' => {}
                'n' => text.push('\n'),
                'r' => text.push('\r'),
                't' => text.push('\t'),
                'a' => text.push('\u{07}'),
                'b' => text.push('\u{08}'),
                'f' => text.push('\u{0c}'),
                'v' => text.push('\u{0b}'),
                'x' => text.push(self.parse_code_point(2)?),
                'u' => text.push(self.parse_code_point(4)?),
                'U' => text.push(self.parse_code_point(8)?),
                '0'..='7' => {
                    let mut code = escaped.to_digit(8).unwrap_or(0);
                    for _ in 0..2 {
                        match self.current().and_then(|d| d.to_digit(8)) {
                            Some(d) => {
                                code = code * 8 + d;
                                self.advance();
                            }
                            None => break,
                        }
                    }
                    text.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                '\\' | '\'' | '"' => text.push(escaped),
                other => {
                    text.push('\\');
                    text.push(other);
                }
            }
        }
    }

    fn parse_code_point(&mut self, digits: usize) -> Result<char, LiteralError> {
        let start = self.position;
        let hex: String = self.chars.iter().skip(start).take(digits).collect();
        if hex.chars().count() != digits {
            return Err(self.error("truncated escape sequence"));
        }
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| self.error(format!("invalid escape digits '{hex}'")))?;
        self.position += digits;
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {code:#x}")))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.position;
        let mut literal = String::new();
        while let Some(c @ ('-' | '+')) = self.current() {
            literal.push(c);
            self.advance();
        }
        while let Some(c) = self.current() {
            let exponent_sign = matches!(c, '+' | '-') && matches!(literal.chars().last(), Some('e' | 'E'));
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                literal.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let negative = literal.chars().filter(|c| *c == '-').count() % 2 == 1;
        let body: String = literal
            .trim_start_matches(['-', '+'])
            .trim_end_matches(['L', 'l'])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let invalid = || LiteralError {
            offset: start,
            message: format!("invalid number '{literal}'"),
        };

        let radix = match body.get(..2) {
            Some("0x" | "0X") => Some(16),
            Some("0o" | "0O") => Some(8),
            Some("0b" | "0B") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            let magnitude = i64::from_str_radix(&body[2..], radix).map_err(|_| invalid())?;
            return Ok(Value::from(if negative { -magnitude } else { magnitude }));
        }

        let signed = if negative { format!("-{body}") } else { body.clone() };
        if !body.contains(['.', 'e', 'E']) {
            if let Ok(i) = signed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            if let Ok(u) = signed.parse::<u64>() {
                return Ok(Value::from(u));
            }
        }
        let float = signed.parse::<f64>().map_err(|_| invalid())?;
        Number::from_f64(float).map(Value::Number).ok_or_else(invalid)
    }

    fn parse_name(&mut self) -> Result<Value, LiteralError> {
        let start = self.position;
        let mut name = String::new();
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match name.as_str() {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            other => Err(LiteralError {
                offset: start,
                message: format!("unknown name '{other}'"),
            }),
        }
    }
}

fn key_text(key: Value) -> String {
    match key {
        Value::String(s) => s,
        other => to_string(&other),
    }
}
