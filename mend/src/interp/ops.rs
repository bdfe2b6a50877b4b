//! Operator semantics over evaluated operands
//!
//! Everything here is pure: operands are already evaluated, left to right.
//! Short-circuit operators, `ite` and `FuncCall` need the evaluator and live there.

use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use crate::model::names::{
    ARITH_OPS, COMP_OPS, MATH_FUNCS, OP_ARRAY_ASSIGN, OP_ARRAY_INDEX, OP_CAST, OP_LIST_HEAD,
    OP_LIST_TAIL, OP_STR_APPEND, OP_STR_FORMAT,
};
use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Apply operator `name` to evaluated operands
pub fn apply(name: &str, args: &[Value]) -> InterpResult<Value> {
    match (name, args) {
        (op, [left, right]) if ARITH_OPS.contains(&op) => arith(op, left, right),
        (op, [left, right]) if COMP_OPS.contains(&op) => compare(op, left, right),
        ("-", [value]) => negate(value),
        ("+", [value]) => match value {
            Value::Int(_) | Value::Float(_) => Ok(value.clone()),
            _ => Err(RuntimeError::type_error("numeric", value.type_name())),
        },
        ("!", [value]) => defined(value).map(|v| Value::Bool(!v.is_truthy())),
        ("&&", [left, right]) => {
            Ok(Value::Bool(defined(left)?.is_truthy() && defined(right)?.is_truthy()))
        }
        ("||", [left, right]) => {
            Ok(Value::Bool(defined(left)?.is_truthy() || defined(right)?.is_truthy()))
        }
        (OP_STR_APPEND, parts) => str_append(parts),
        (OP_STR_FORMAT, [fmt, rest @ ..]) => match fmt {
            Value::Str(fmt) => format_printf(fmt, rest).map(Value::Str),
            other => Err(RuntimeError::type_error("format string", other.type_name())),
        },
        (OP_ARRAY_ASSIGN, [array, path @ .., value]) if !path.is_empty() => {
            array_assign(array, path, value.clone())
        }
        (OP_ARRAY_INDEX, [array, path @ ..]) if !path.is_empty() => {
            path.iter().try_fold(array.clone(), |acc, idx| array_get(&acc, idx))
        }
        (OP_LIST_HEAD, [ty, list]) => list_head(list, ty.as_str()),
        (OP_LIST_HEAD, [list]) => list_head(list, None),
        (OP_LIST_TAIL, [list]) => list_tail(list),
        (OP_CAST, [ty, value]) => cast(ty, value),
        (name, args) if MATH_FUNCS.contains(&name) => builtin_math(name, args),
        (name, args) => Err(RuntimeError::unknown_operator(name, args.len())),
    }
}

fn defined(value: &Value) -> InterpResult<&Value> {
    if value.is_undefined() {
        Err(RuntimeError::type_error("defined value", value.type_name()))
    } else {
        Ok(value)
    }
}

fn arith(op: &str, left: &Value, right: &Value) -> InterpResult<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) if op == "+" => Ok(Value::Str(format!("{a}{b}"))),
        (Value::Int(_), Value::Int(0)) if op == "/" || op == "%" => {
            Err(RuntimeError::division_by_zero())
        }
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
            "+" => a.wrapping_add(*b),
            "-" => a.wrapping_sub(*b),
            "*" => a.wrapping_mul(*b),
            "/" => a.wrapping_div(*b),
            _ => a.wrapping_rem(*b),
        })),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) if !matches!((left, right), (Value::Bool(_), Value::Bool(_))) => {
                Ok(Value::Float(match op {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    "/" => a / b,
                    _ => a % b,
                }))
            }
            _ => Err(RuntimeError::type_error(
                "numeric",
                &format!("{} {op} {}", left.type_name(), right.type_name()),
            )),
        },
    }
}

fn negate(value: &Value) -> InterpResult<Value> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        Value::Float(f) => Ok(Value::Float(-f)),
        _ => Err(RuntimeError::type_error("numeric", value.type_name())),
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> InterpResult<Value> {
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Undefined, _) | (_, Value::Undefined) => {
            return Err(RuntimeError::type_error(
                "defined operands",
                &format!("{} {op} {}", left.type_name(), right.type_name()),
            ));
        }
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ if op == "==" => return Ok(Value::Bool(left == right)),
            _ if op == "!=" => return Ok(Value::Bool(left != right)),
            _ => {
                return Err(RuntimeError::type_error(
                    "comparable operands",
                    &format!("{} {op} {}", left.type_name(), right.type_name()),
                ));
            }
        },
    };
    // NaN compares false except for !=
    let result = match ordering {
        None => op == "!=",
        Some(ord) => match op {
            "<" => ord == Ordering::Less,
            "<=" => ord != Ordering::Greater,
            ">" => ord == Ordering::Greater,
            ">=" => ord != Ordering::Less,
            "==" => ord == Ordering::Equal,
            _ => ord != Ordering::Equal,
        },
    };
    Ok(Value::Bool(result))
}

fn str_append(parts: &[Value]) -> InterpResult<Value> {
    let mut out = String::new();
    for part in parts {
        out.push_str(&defined(part)?.to_string());
    }
    Ok(Value::Str(out))
}

fn index_of(idx: &Value, len: usize) -> InterpResult<usize> {
    let n = idx
        .as_int()
        .ok_or_else(|| RuntimeError::type_error("int index", idx.type_name()))?;
    usize::try_from(n)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| RuntimeError::index_out_of_bounds(n, len))
}

/// `ArrayCreate(d1, d2, ..)`: nested arrays of undefined cells, at most `limit` cells
pub fn array_create(dims: &[Value], limit: usize) -> InterpResult<Value> {
    let lens = dims
        .iter()
        .map(|dim| {
            dim.as_int()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| RuntimeError::type_error("array length", dim.type_name()))
        })
        .collect::<InterpResult<Vec<usize>>>()?;
    let total = lens.iter().try_fold(1usize, |acc, len| acc.checked_mul(*len));
    if lens.iter().any(|len| *len > limit) || total.is_none_or(|total| total > limit) {
        return Err(RuntimeError::array_too_large(&lens, limit));
    }
    filled(&lens, limit)
}

fn filled(lens: &[usize], limit: usize) -> InterpResult<Value> {
    let Some((len, rest)) = lens.split_first() else {
        return Ok(Value::Undefined);
    };
    let item = filled(rest, limit)?;
    let mut items = Vec::new();
    items
        .try_reserve_exact(*len)
        .map_err(|_| RuntimeError::array_too_large(lens, limit))?;
    items.resize(*len, item);
    Ok(Value::Array(items))
}

fn array_get(array: &Value, idx: &Value) -> InterpResult<Value> {
    match array {
        Value::Array(items) => Ok(items[index_of(idx, items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let c = chars[index_of(idx, chars.len())?];
            Ok(Value::Int(c as i64))
        }
        _ => Err(RuntimeError::type_error("array", array.type_name())),
    }
}

fn array_assign(array: &Value, path: &[Value], value: Value) -> InterpResult<Value> {
    let Value::Array(items) = array else {
        return Err(RuntimeError::type_error("array", array.type_name()));
    };
    let Some((idx, rest)) = path.split_first() else {
        return Ok(value);
    };
    let i = index_of(idx, items.len())?;
    let mut items = items.clone();
    items[i] = if rest.is_empty() {
        value
    } else {
        array_assign(&items[i], rest, value)?
    };
    Ok(Value::Array(items))
}

fn list_head(list: &Value, ty: Option<&str>) -> InterpResult<Value> {
    let Value::Array(items) = list else {
        return Err(RuntimeError::type_error("input list", list.type_name()));
    };
    let head = items
        .first()
        .ok_or_else(|| RuntimeError::invalid_input("input exhausted"))?;
    match (ty, head) {
        (Some(ty), Value::Str(token)) => Value::from_input(token, ty)
            .ok_or_else(|| RuntimeError::invalid_input(&format!("`{token}` is not a {ty}"))),
        _ => Ok(head.clone()),
    }
}

fn list_tail(list: &Value) -> InterpResult<Value> {
    match list {
        Value::Array(items) => Ok(Value::Array(items.iter().skip(1).cloned().collect())),
        _ => Err(RuntimeError::type_error("input list", list.type_name())),
    }
}

fn cast(ty: &Value, value: &Value) -> InterpResult<Value> {
    let ty = ty.as_str().unwrap_or_default();
    let value = defined(value)?;
    let converted = match ty {
        "int" | "long" | "short" | "char" | "unsigned" => match value {
            Value::Float(f) => Some(Value::Int(*f as i64)),
            Value::Str(s) => s.trim().parse().ok().map(Value::Int),
            other => other.as_int().map(Value::Int),
        },
        "float" | "double" => match value {
            Value::Str(s) => s.trim().parse().ok().map(Value::Float),
            other => other.as_float().map(Value::Float),
        },
        "bool" => Some(Value::Bool(value.is_truthy())),
        "str" | "string" => Some(Value::Str(value.to_string())),
        _ => Some(value.clone()),
    };
    converted.ok_or_else(|| RuntimeError::type_error(ty, value.type_name()))
}

/// Math functions usable without a program definition
pub fn builtin_math(name: &str, args: &[Value]) -> InterpResult<Value> {
    match name {
        "abs" => builtin_abs(args),
        "min" | "max" => builtin_min_max(name, args),
        "pow" => {
            if args.len() != 2 {
                return Err(RuntimeError::arity_mismatch(name, 2, args.len()));
            }
            Ok(Value::Float(float_arg(&args[0])?.powf(float_arg(&args[1])?)))
        }
        _ => {
            if args.len() != 1 {
                return Err(RuntimeError::arity_mismatch(name, 1, args.len()));
            }
            let x = float_arg(&args[0])?;
            let result = match name {
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                "sqrt" => x.sqrt(),
                "log2" => x.log2(),
                "log10" => x.log10(),
                "log" => x.ln(),
                "exp" => x.exp(),
                _ => return Err(RuntimeError::undefined_function(name)),
            };
            Ok(Value::Float(result))
        }
    }
}

fn float_arg(value: &Value) -> InterpResult<f64> {
    match value {
        Value::Int(_) | Value::Float(_) => value
            .as_float()
            .ok_or_else(|| RuntimeError::type_error("numeric", value.type_name())),
        _ => Err(RuntimeError::type_error("numeric", value.type_name())),
    }
}

fn builtin_abs(args: &[Value]) -> InterpResult<Value> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_mismatch("abs", 1, args.len()));
    }
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        _ => Err(RuntimeError::type_error("numeric", args[0].type_name())),
    }
}

fn builtin_min_max(name: &str, args: &[Value]) -> InterpResult<Value> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_mismatch(name, 2, args.len()));
    }
    let pick_min = name == "min";
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(if pick_min { *a.min(b) } else { *a.max(b) })),
        (a, b) => {
            let (a, b) = (float_arg(a)?, float_arg(b)?);
            Ok(Value::Float(if pick_min { a.min(b) } else { a.max(b) }))
        }
    }
}

/// Largest accepted width or precision of a directive
const MAX_FIELD_WIDTH: usize = 1 << 16;

/// One parsed `%` directive
#[derive(Debug, Default)]
struct Directive {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

/// printf-style formatting.
///
/// Supports the flags `-+ 0#`, width, precision, the length modifiers `hlLqjzt`
/// (ignored) and the conversions `d i u c s f F e E g G x X o %`.
pub fn format_printf(fmt: &str, args: &[Value]) -> InterpResult<String> {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut d = Directive::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => d.left = true,
                '+' => d.plus = true,
                ' ' => d.space = true,
                '0' => d.zero = true,
                '#' => d.alt = true,
                _ => break,
            }
            chars.next();
        }
        d.width = field_number(&mut chars)?;
        if chars.next_if_eq(&'.').is_some() {
            d.precision = Some(field_number(&mut chars)?);
        }
        while chars.next_if(|c| "hlLqjzt".contains(*c)).is_some() {}
        d.conversion = chars
            .next()
            .ok_or_else(|| RuntimeError::invalid_input("format ends inside a directive"))?;

        if d.conversion == '%' {
            out.push('%');
            continue;
        }
        let arg = args
            .next()
            .ok_or_else(|| RuntimeError::invalid_input("not enough arguments for format"))?;
        let rendered = render(&d, defined(arg)?)?;
        out.push_str(&pad(&d, rendered));
    }
    Ok(out)
}

/// Decimal width or precision; zero when no digits follow
fn field_number(chars: &mut Peekable<Chars<'_>>) -> InterpResult<usize> {
    let mut n: usize = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = n.saturating_mul(10).saturating_add(digit as usize);
        chars.next();
    }
    if n > MAX_FIELD_WIDTH {
        return Err(RuntimeError::format_field_too_wide(MAX_FIELD_WIDTH));
    }
    Ok(n)
}

fn render(d: &Directive, arg: &Value) -> InterpResult<String> {
    let text = match d.conversion {
        'd' | 'i' | 'u' => {
            let n = int_arg(arg)?;
            let digits = n.unsigned_abs().to_string();
            let digits = match d.precision {
                Some(p) if digits.len() < p => format!("{digits:0>p$}"),
                _ => digits,
            };
            signed(d, n < 0, digits)
        }
        'x' => format!("{}{:x}", if d.alt { "0x" } else { "" }, int_arg(arg)?),
        'X' => format!("{}{:X}", if d.alt { "0X" } else { "" }, int_arg(arg)?),
        'o' => format!("{}{:o}", if d.alt { "0" } else { "" }, int_arg(arg)?),
        'c' => match arg {
            Value::Str(s) => s.chars().next().map(String::from).unwrap_or_default(),
            other => {
                let code = int_arg(other)?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            }
        },
        's' => {
            let s = arg.to_string();
            match d.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            }
        }
        'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
            let x = float_arg(arg)?;
            let body = float_body(d, x.abs());
            signed(d, x.is_sign_negative() && !x.is_nan(), body)
        }
        other => return Err(RuntimeError::invalid_input(&format!("unsupported conversion %{other}"))),
    };
    Ok(text)
}

fn int_arg(value: &Value) -> InterpResult<i64> {
    match value {
        Value::Float(f) => Ok(*f as i64),
        other => other
            .as_int()
            .ok_or_else(|| RuntimeError::type_error("int", other.type_name())),
    }
}

fn signed(d: &Directive, negative: bool, body: String) -> String {
    let sign = if negative {
        "-"
    } else if d.plus {
        "+"
    } else if d.space {
        " "
    } else {
        ""
    };
    format!("{sign}{body}")
}

/// Digits of a non-negative float, without sign
fn float_body(d: &Directive, x: f64) -> String {
    let upper = d.conversion.is_ascii_uppercase();
    if !x.is_finite() {
        let s = if x.is_nan() { "nan" } else { "inf" };
        return if upper { s.to_uppercase() } else { s.to_string() };
    }
    let precision = d.precision.unwrap_or(6);
    let body = match d.conversion.to_ascii_lowercase() {
        'f' => format!("{x:.precision$}"),
        'e' => exponent_form(x, precision),
        _ => {
            let p = precision.max(1);
            let exp = if x == 0.0 { 0 } else { x.log10().floor() as i32 };
            let formatted = if exp < -4 || exp >= p as i32 {
                exponent_form(x, p - 1)
            } else {
                let decimals = (p as i32 - 1 - exp).max(0) as usize;
                format!("{x:.decimals$}")
            };
            if d.alt { formatted } else { strip_zeros(&formatted) }
        }
    };
    if upper { body.to_uppercase() } else { body }
}

/// `1.500000e+02` style
fn exponent_form(x: f64, precision: usize) -> String {
    let rust = format!("{x:.precision$e}");
    match rust.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => rust,
    }
}

fn strip_zeros(text: &str) -> String {
    match text.split_once('e') {
        Some((mantissa, exp)) => format!("{}e{exp}", strip_zeros(mantissa)),
        None if text.contains('.') => text.trim_end_matches('0').trim_end_matches('.').to_string(),
        None => text.to_string(),
    }
}

fn pad(d: &Directive, text: String) -> String {
    let len = text.chars().count();
    if len >= d.width {
        return text;
    }
    let fill = d.width - len;
    if d.left {
        format!("{text}{}", " ".repeat(fill))
    } else if d.zero && "diufFeEgGxXo".contains(d.conversion) {
        let sign_len = usize::from(text.starts_with(['-', '+', ' ']));
        let (sign, digits) = text.split_at(sign_len);
        format!("{sign}{}{digits}", "0".repeat(fill))
    } else {
        format!("{}{text}", " ".repeat(fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|n| Value::Int(*n)).collect()
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(apply("+", &ints(&[2, 3])).unwrap(), Value::Int(5));
        assert_eq!(apply("/", &ints(&[7, 2])).unwrap(), Value::Int(3));
        assert_eq!(apply("/", &ints(&[-7, 2])).unwrap(), Value::Int(-3));
        assert_eq!(apply("%", &ints(&[-7, 2])).unwrap(), Value::Int(-1));
        assert_eq!(apply("-", &ints(&[4])).unwrap(), Value::Int(-4));
        assert_eq!(apply("*", &ints(&[i64::MAX, 2])).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_division_by_zero() {
        let err = apply("/", &ints(&[1, 0])).unwrap_err();
        assert_eq!(err.kind, super::super::ErrorKind::DivisionByZero);
        assert_eq!(
            apply("/", &[Value::Float(1.0), Value::Int(0)]).unwrap(),
            Value::Float(f64::INFINITY)
        );
    }

    #[test]
    fn test_mixed_arithmetic_promotes() {
        assert_eq!(
            apply("+", &[Value::Int(1), Value::Float(0.5)]).unwrap(),
            Value::Float(1.5)
        );
        assert!(apply("+", &[Value::Int(1), Value::Undefined]).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(apply("<", &ints(&[1, 2])).unwrap(), Value::Bool(true));
        assert_eq!(
            apply("==", &[Value::Int(1), Value::Float(1.0)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            apply("!=", &[Value::Str("a".into()), Value::Str("b".into())]).unwrap(),
            Value::Bool(true)
        );
        assert!(apply(">", &[Value::Undefined, Value::Int(1)]).is_err());
    }

    #[test]
    fn test_unknown_operator() {
        let err = apply("frobnicate", &ints(&[1])).unwrap_err();
        assert_eq!(err.kind, super::super::ErrorKind::UnknownOperator);
    }

    #[test]
    fn test_arrays() {
        let arr = array_create(&ints(&[3]), 16).unwrap();
        let arr = apply(OP_ARRAY_ASSIGN, &[arr, Value::Int(1), Value::Int(7)]).unwrap();
        assert_eq!(
            apply(OP_ARRAY_INDEX, &[arr.clone(), Value::Int(1)]).unwrap(),
            Value::Int(7)
        );
        assert!(apply(OP_ARRAY_INDEX, &[arr, Value::Int(3)]).is_err());

        let grid = array_create(&ints(&[2, 2]), 16).unwrap();
        let grid = apply(OP_ARRAY_ASSIGN, &[grid, Value::Int(1), Value::Int(0), Value::Int(4)])
            .unwrap();
        assert_eq!(
            apply(OP_ARRAY_INDEX, &[grid, Value::Int(1), Value::Int(0)]).unwrap(),
            Value::Int(4)
        );
    }

    #[test]
    fn test_array_size_limit() {
        let err = array_create(&ints(&[i64::MAX]), 1 << 20).unwrap_err();
        assert_eq!(err.kind, super::super::ErrorKind::ResourceLimit);
        assert!(!err.is_fatal());
        // an empty outer dimension does not hide an oversized inner one
        assert!(array_create(&ints(&[0, i64::MAX]), 1 << 20).is_err());
        assert!(array_create(&ints(&[1 << 16, 1 << 16]), 1 << 20).is_err());
        assert!(array_create(&ints(&[-1]), 16).is_err());
        assert_eq!(array_create(&ints(&[0]), 16).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_input_list() {
        let list = Value::Array(vec![Value::Str("12".into()), Value::Str("x".into())]);
        assert_eq!(
            apply(OP_LIST_HEAD, &[Value::Str("int".into()), list.clone()]).unwrap(),
            Value::Int(12)
        );
        let tail = apply(OP_LIST_TAIL, &[list]).unwrap();
        assert!(apply(OP_LIST_HEAD, &[Value::Str("int".into()), tail.clone()]).is_err());
        let empty = apply(OP_LIST_TAIL, &[tail]).unwrap();
        assert!(apply(OP_LIST_HEAD, &[empty]).is_err());
    }

    #[test]
    fn test_math_builtins() {
        assert_eq!(builtin_math("abs", &ints(&[-3])).unwrap(), Value::Int(3));
        assert_eq!(builtin_math("max", &ints(&[2, 9])).unwrap(), Value::Int(9));
        assert_eq!(
            builtin_math("pow", &ints(&[2, 10])).unwrap(),
            Value::Float(1024.0)
        );
        assert_eq!(builtin_math("floor", &[Value::Float(2.7)]).unwrap(), Value::Float(2.0));
        assert!(builtin_math("sqrt", &ints(&[1, 2])).is_err());
    }

    #[test]
    fn test_printf_integers_and_strings() {
        let out = format_printf("%d|%5d|%-4d|%03d|%+d", &ints(&[7, 42, 1, 5, 3])).unwrap();
        assert_eq!(out, "7|   42|1   |005|+3");
        let out = format_printf(
            "%s=%c%%",
            &[Value::Str("x".into()), Value::Int('A' as i64)],
        )
        .unwrap();
        assert_eq!(out, "x=A%");
    }

    #[test]
    fn test_printf_floats() {
        let out = format_printf("%f %.2f %.0f", &[
            Value::Float(1.5),
            Value::Float(3.14159),
            Value::Float(2.7),
        ])
        .unwrap();
        assert_eq!(out, "1.500000 3.14 3");
        assert_eq!(format_printf("%e", &[Value::Float(150.0)]).unwrap(), "1.500000e+02");
        assert_eq!(format_printf("%g", &[Value::Float(0.5)]).unwrap(), "0.5");
        assert_eq!(format_printf("%g", &[Value::Float(1e10)]).unwrap(), "1e+10");
        assert_eq!(format_printf("%.1f", &[Value::Float(-0.26)]).unwrap(), "-0.3");
        assert_eq!(format_printf("%lf", &[Value::Int(2)]).unwrap(), "2.000000");
    }

    #[test]
    fn test_printf_missing_argument() {
        assert!(format_printf("%d %d", &ints(&[1])).is_err());
    }

    #[test]
    fn test_printf_oversized_fields() {
        let err = format_printf("%99999999999999999999999d", &ints(&[1])).unwrap_err();
        assert_eq!(err.kind, super::super::ErrorKind::ResourceLimit);
        assert!(format_printf("%.99999999999999999999999f", &[Value::Float(1.0)]).is_err());
        assert!(format_printf("%100000d", &ints(&[1])).is_err());
        assert_eq!(format_printf("%8d", &ints(&[1])).unwrap(), "       1");
    }
}
