//! Parser for the response body literal.
//!
//! Accepts exactly what [`Value`]'s `Display` produces, plus whitespace and a
//! trailing comma inside lists. Used by host-side consumers to turn a framed
//! response back into values.
//!
//! Lists may nest at most [`MAX_DEPTH`] levels deep.

use crate::{
    errors::{ProtocolError, Result},
    value::Value,
};

/// Deepest list nesting accepted by [`parse`].
pub const MAX_DEPTH: usize = 256;

/// Parse a single literal. Trailing whitespace is allowed, trailing data is
/// not.
pub fn parse(input: &str) -> Result<Value> {
    let mut parser = Parser { input, pos: 0 };
    let value = parser.value(0)?;
    parser.skip_whitespace();
    if parser.pos != input.len() {
        return Err(parser.error("trailing data after literal"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &'static str) -> ProtocolError {
        ProtocolError::InvalidLiteral { offset: self.pos, reason }
    }

    fn rest(&self) -> &str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.list(depth + 1),
            Some(quote @ ('\'' | '"')) => self.string(quote).map(Value::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) if self.rest().starts_with("inf") => {
                self.pos += 3;
                Ok(Value::Float(f64::INFINITY))
            },
            Some(_) if self.rest().starts_with("nan") => {
                self.pos += 3;
                Ok(Value::Float(f64::NAN))
            },
            Some(_) => Err(self.error("expected list, string or number")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn list(&mut self, depth: usize) -> Result<Value> {
        debug_assert_eq!(self.peek(), Some('['));
        if depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.bump();

        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::List(items));
            }

            items.push(self.value(depth)?);

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {},
                Some(']') => return Ok(Value::List(items)),
                _ => return Err(self.error("expected ',' or ']' in list")),
            }
        }
    }

    fn string(&mut self, delimiter: char) -> Result<String> {
        self.bump();

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == delimiter => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<()> {
        match self.bump() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('x') => out.push(self.code_point(2)?),
            Some('u') => out.push(self.code_point(4)?),
            Some('U') => out.push(self.code_point(8)?),
            // Unknown escapes keep their backslash
            Some(c) => {
                out.push('\\');
                out.push(c);
            },
            None => return Err(self.error("unterminated escape")),
        }
        Ok(())
    }

    fn code_point(&mut self, digits: usize) -> Result<char> {
        let hex = self.rest().get(..digits).ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        let c = char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?;
        self.pos += digits;
        Ok(c)
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
            if self.rest().starts_with("inf") {
                self.pos += 3;
                return Ok(Value::Float(f64::NEG_INFINITY));
            }
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {},
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.bump();
                    }
                    continue;
                },
                _ => break,
            }
            self.bump();
        }

        let text = self.input.get(start..self.pos).unwrap_or_default();
        if is_float {
            text.parse().map(Value::Float).map_err(|_| self.error("invalid float"))
        } else {
            text.parse().map(Value::Int).map_err(|_| self.error("invalid integer"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_table() {
        let value = parse("[['name'], ['heute', 0, 0.5], ['example.com', -3, 1e-05]]").unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::from(vec!["name"]),
                Value::List(vec![Value::from("heute"), Value::Int(0), Value::Float(0.5)]),
                Value::List(vec![Value::from("example.com"), Value::Int(-3), Value::Float(1e-5)]),
            ])
        );
    }

    #[test]
    fn parses_escapes_in_both_quote_styles() {
        assert_eq!(parse(r"'a\'b\nc'").unwrap(), Value::from("a'b\nc"));
        assert_eq!(parse(r#""it's""#).unwrap(), Value::from("it's"));
        assert_eq!(parse(r"'\x01\u00e9'").unwrap(), Value::from("\u{1}\u{e9}"));
        assert_eq!(parse(r"'C:\d'").unwrap(), Value::from("C:\\d"));
    }

    #[test]
    fn tolerates_whitespace_and_trailing_comma() {
        assert_eq!(parse(" [ 1 ,2, ] ").unwrap(), Value::from(vec![1, 2]));
        assert_eq!(parse("[]").unwrap(), Value::List(vec![]));
    }

    #[test]
    fn special_floats() {
        assert_eq!(parse("[inf, -inf]").unwrap(), Value::from(vec![f64::INFINITY, f64::NEG_INFINITY]));
        assert!(matches!(parse("nan").unwrap(), Value::Float(x) if x.is_nan()));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse("['a'"), Err(ProtocolError::InvalidLiteral { .. })));
        assert!(matches!(parse("'abc"), Err(ProtocolError::InvalidLiteral { .. })));
        assert!(matches!(parse("[1] x"), Err(ProtocolError::InvalidLiteral { offset: 4, .. })));
        assert!(matches!(parse("{}"), Err(ProtocolError::InvalidLiteral { offset: 0, .. })));
        assert!(matches!(parse(""), Err(ProtocolError::InvalidLiteral { .. })));
    }

    #[test]
    fn nesting_is_bounded() {
        let nested = |levels: usize| format!("{}{}", "[".repeat(levels), "]".repeat(levels));

        assert!(parse(&nested(MAX_DEPTH)).is_ok());
        assert!(matches!(
            parse(&nested(MAX_DEPTH + 1)),
            Err(ProtocolError::InvalidLiteral { offset, reason: "nesting too deep" })
                if offset == MAX_DEPTH
        ));
        // Far past any stack limit
        assert!(matches!(
            parse(&nested(200_000)),
            Err(ProtocolError::InvalidLiteral { reason: "nesting too deep", .. })
        ));
    }

    #[test]
    fn display_output_parses_back() {
        let value = Value::List(vec![
            Value::from(vec!["it's", "tab\there"]),
            Value::List(vec![Value::Float(1.0), Value::Int(i64::MIN), Value::Float(1e300)]),
        ]);
        assert_eq!(parse(&value.to_string()).unwrap(), value);
    }
}
