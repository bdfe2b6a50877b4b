//! Runtime values for the interpreter

use crate::model::names::UNDEFINED;
use std::collections::BTreeMap;
use std::fmt;

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit integer (covers every integral source type, chars included)
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// Boolean, produced by comparisons and logical operators
    Bool(bool),
    /// Text
    Str(String),
    /// Array value, copied on write
    Array(Vec<Value>),
    /// Struct-like aggregate: field name -> value
    Struct(BTreeMap<String, Value>),
    /// Never assigned, or produced by a failed operation
    Undefined,
}

impl Value {
    /// Check if value is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Struct(_) => true,
            Value::Undefined => false,
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Undefined => "undefined",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Try to convert to i64 (booleans count as 0/1)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Try to convert to f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Value of a constant's literal text.
    ///
    /// Integers, floats and booleans are recognized; quoted text loses its
    /// quotes and escapes; anything else (type names, callee names) stays text.
    pub fn parse_literal(text: &str) -> Value {
        let trimmed = text.trim();
        if let Some(inner) = unquote(trimmed) {
            return Value::Str(unescape(inner));
        }
        match trimmed {
            "true" | "True" => return Value::Bool(true),
            "false" | "False" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Value::Int(n);
        }
        if trimmed.chars().any(|c| c.is_ascii_digit())
            && let Ok(f) = trimmed.trim_end_matches(['f', 'F']).parse::<f64>()
        {
            return Value::Float(f);
        }
        Value::Str(text.to_string())
    }

    /// Value of an input token read as a declared type
    pub fn from_input(token: &str, ty: &str) -> Option<Value> {
        let token = token.trim();
        match ty.trim() {
            "int" | "long" | "short" | "unsigned" | "long long" | "unsigned int" => {
                token.parse::<i64>().ok().map(Value::Int)
            }
            "float" | "double" | "long double" => token.parse::<f64>().ok().map(Value::Float),
            "char" => match token.parse::<i64>() {
                Ok(n) => Some(Value::Int(n)),
                Err(_) => token.chars().next().map(|c| Value::Int(c as i64)),
            },
            "bool" => match token {
                "1" | "true" | "True" => Some(Value::Bool(true)),
                "0" | "false" | "False" => Some(Value::Bool(false)),
                _ => None,
            },
            "str" | "string" | "char*" | "char *" => Some(Value::Str(token.to_string())),
            _ => Some(Value::parse_literal(token)),
        }
    }
}

fn unquote(text: &str) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    ['"', '\'']
        .into_iter()
        .find_map(|q| text.strip_prefix(q).and_then(|t| t.strip_suffix(q)))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
            Value::Undefined => write!(f, "{UNDEFINED}"),
        }
    }
}

/// Deep equality. Numbers of different kinds are different values;
/// NaN equals NaN so that identical runs compare equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(format!("{}", Value::Int(42)), "42");
        assert_eq!(format!("{}", Value::Float(3.5)), "3.5");
        assert_eq!(format!("{}", Value::Bool(true)), "true");
        assert_eq!(format!("{}", Value::Undefined), "<undef>");
        assert_eq!(
            format!("{}", Value::Array(vec![Value::Int(1), Value::Str("a".into())])),
            "[1, a]"
        );
    }

    #[test]
    fn test_value_truthy() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Undefined.is_truthy());
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("12"), Value::Int(12));
        assert_eq!(Value::parse_literal("-3"), Value::Int(-3));
        assert_eq!(Value::parse_literal("2.5"), Value::Float(2.5));
        assert_eq!(Value::parse_literal("1.0f"), Value::Float(1.0));
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("\"a\\n\""), Value::Str("a\n".into()));
        assert_eq!(Value::parse_literal("int"), Value::Str("int".into()));
        assert_eq!(Value::parse_literal("inf"), Value::Str("inf".into()));
    }

    #[test]
    fn test_from_input() {
        assert_eq!(Value::from_input("7", "int"), Some(Value::Int(7)));
        assert_eq!(Value::from_input("x", "int"), None);
        assert_eq!(Value::from_input("1.5", "double"), Some(Value::Float(1.5)));
        assert_eq!(Value::from_input("a", "char"), Some(Value::Int(97)));
        assert_eq!(Value::from_input("hi", "string"), Some(Value::Str("hi".into())));
    }

    #[test]
    fn test_deep_equality() {
        let a = Value::Array(vec![Value::Int(1), Value::Array(vec![Value::Float(f64::NAN)])]);
        assert_eq!(a.clone(), a);
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Undefined, Value::Int(0));
    }
}
