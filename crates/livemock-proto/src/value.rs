//! Cell values and their canonical literal form.
//!
//! Tables are untyped: every cell carries its own type, and comparisons infer
//! the type from the row value. [`Value`] is the closed set of types the
//! simulator understands.
//!
//! The `Display` implementation produces the canonical literal used as the
//! response body: single-quoted strings with backslash escapes, integers,
//! floats that always carry a fraction or exponent, and `[a, b]` lists. The
//! literal is parsed back by [`crate::literal::parse`].

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// A table row: column name to cell value.
pub type Row = BTreeMap<String, Value>;

/// A single cell value.
///
/// Deserializes untagged, so JSON fixture data maps naturally: integral
/// numbers become [`Value::Int`], other numbers [`Value::Float`], strings
/// [`Value::Str`] and arrays [`Value::List`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Str(String),
    /// Ordered list (host parents, group members, ...)
    List(Vec<Value>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
        }
    }

    /// The string content, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer content, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Values of different types are unordered. Lists compare element-wise,
/// then by length.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.partial_cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Str(a), Self::Str(b)) => a.partial_cmp(b),
            (Self::List(a), Self::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.partial_cmp(y)? {
                        Ordering::Equal => {},
                        unequal => return Some(unequal),
                    }
                }
                Some(a.len().cmp(&b.len()))
            },
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Str(s) => f.write_str(&quote(s)),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            },
        }
    }
}

/// Quote a string as a single-quoted literal.
///
/// Double quotes are used instead when the text contains a single quote but
/// no double quote. Backslashes, the active quote character and characters
/// that do not print are escaped. This is also how query text is shown in
/// error messages, so stray whitespace and newlines stay visible.
pub fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            },
            c if !is_printable(c) => {
                let code = c as u32;
                if code < 0x100 {
                    out.push_str(&format!("\\x{code:02x}"));
                } else if code < 0x1_0000 {
                    out.push_str(&format!("\\u{code:04x}"));
                } else {
                    out.push_str(&format!("\\U{code:08x}"));
                }
            },
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

/// Whether `c` renders as a visible glyph (or the ASCII space).
///
/// Controls, separators other than the space, format characters and
/// private-use code points do not. Unassigned code points are not tracked and
/// pass through unescaped.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c,
        '\u{ad}'
            | '\u{600}'..='\u{605}'
            | '\u{61c}'
            | '\u{6dd}'
            | '\u{70f}'
            | '\u{8e2}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206f}'
            | '\u{feff}'
            | '\u{fff9}'..='\u{fffb}'
            | '\u{e000}'..='\u{f8ff}'
            | '\u{e0001}'
            | '\u{e0020}'..='\u{e007f}'
            | '\u{f0000}'..='\u{10ffff}'
    )
}

/// Shortest round-trip float text.
///
/// Plain notation between 1e-4 and 1e16 (always with a fractional part),
/// scientific notation with a signed two-digit exponent outside that range.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let scientific = format!("{x:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if x != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }

    let plain = format!("{x}");
    if plain.contains('.') { plain } else { format!("{plain}.0") }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}
