use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::{EvalError, EvalResult};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

pub type BuiltinFn = fn(&[Value]) -> EvalResult<Value>;

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: BuiltinFn,
}

lazy_static! {
    static ref BUILTINS: HashMap<&'static str, Builtin> = {
        let table: [(&'static str, Arity, BuiltinFn); 11] = [
            ("len", Arity::Exact(1), len),
            ("is_empty", Arity::Exact(1), is_empty),
            ("contains", Arity::Exact(2), contains),
            ("sum", Arity::Exact(1), sum),
            ("min", Arity::AtLeast(1), min),
            ("max", Arity::AtLeast(1), max),
            ("round", Arity::Range(1, 2), round),
            ("lower", Arity::Exact(1), lower),
            ("upper", Arity::Exact(1), upper),
            ("matches", Arity::Exact(2), matches),
            ("if_null", Arity::Exact(2), if_null),
        ];
        table
            .into_iter()
            .map(|(name, arity, func)| (name, Builtin { name, arity, func }))
            .collect()
    };
}

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

/// Resolve a call site without running it.
pub fn resolve(name: &str, argument_count: usize) -> EvalResult<&'static Builtin> {
    let builtin = lookup(name).ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    if !builtin.arity.accepts(argument_count) {
        return Err(EvalError::Arity {
            function: name.to_string(),
            expected: builtin.arity.to_string(),
            found: argument_count,
        });
    }
    Ok(builtin)
}

pub fn call(name: &str, args: &[Value]) -> EvalResult<Value> {
    let builtin = resolve(name, args.len())?;
    (builtin.func)(args)
}

fn invalid(function: &str, message: impl Into<String>) -> EvalError {
    EvalError::InvalidArgument {
        function: function.to_string(),
        message: message.into(),
    }
}

fn len(args: &[Value]) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::Null => 0,
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(invalid(
                "len",
                format!("expected string, list or map, got {}", other.type_name()),
            ))
        }
    };
    Ok(Value::Integer(n as i64))
}

fn is_empty(args: &[Value]) -> EvalResult<Value> {
    let empty = match &args[0] {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    };
    Ok(Value::Boolean(empty))
}

fn contains(args: &[Value]) -> EvalResult<Value> {
    let found = match (&args[0], &args[1]) {
        (Value::Null, _) => false,
        (Value::List(items), needle) => items.iter().any(|item| loose_eq(item, needle)),
        (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
        (Value::Map(map), Value::String(key)) => map.contains_key(key),
        (haystack, needle) => {
            return Err(invalid(
                "contains",
                format!(
                    "cannot search {} in {}",
                    needle.type_name(),
                    haystack.type_name()
                ),
            ))
        }
    };
    Ok(Value::Boolean(found))
}

/// Numeric equality across integer/float, structural otherwise.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(l), Value::Float(r)) | (Value::Float(r), Value::Integer(l)) => {
            (*l as f64) == *r
        }
        _ => left == right,
    }
}

fn numbers<'a>(function: &str, args: &'a [Value]) -> EvalResult<Vec<&'a Value>> {
    // a single list argument is spread; nulls are unanswered and skipped
    let items: Vec<&Value> = match args {
        [Value::List(items)] => items.iter().collect(),
        _ => args.iter().collect(),
    };
    items
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::Integer(_) | Value::Float(_) => Ok(v),
            other => Err(invalid(
                function,
                format!("expected numbers, got {}", other.type_name()),
            )),
        })
        .collect()
}

fn sum(args: &[Value]) -> EvalResult<Value> {
    if !matches!(args[0], Value::List(_) | Value::Null) {
        return Err(invalid("sum", format!("expected list, got {}", args[0].type_name())));
    }
    let mut total = Value::Integer(0);
    for value in numbers("sum", args)? {
        total = match (&total, value) {
            (Value::Integer(l), Value::Integer(r)) => {
                Value::Integer(l.checked_add(*r).ok_or(EvalError::Overflow)?)
            }
            (l, r) => Value::Float(l.as_f64()? + r.as_f64()?),
        };
    }
    Ok(total)
}

fn extreme(function: &str, args: &[Value], pick_right: fn(f64, f64) -> bool) -> EvalResult<Value> {
    let mut best: Option<&Value> = None;
    for value in numbers(function, args)? {
        best = match best {
            Some(current) if !pick_right(current.as_f64()?, value.as_f64()?) => Some(current),
            _ => Some(value),
        };
    }
    Ok(best.cloned().unwrap_or_default())
}

fn min(args: &[Value]) -> EvalResult<Value> {
    extreme("min", args, |current, candidate| candidate < current)
}

fn max(args: &[Value]) -> EvalResult<Value> {
    extreme("max", args, |current, candidate| candidate > current)
}

fn round(args: &[Value]) -> EvalResult<Value> {
    let digits = match args.get(1) {
        None => 0,
        Some(Value::Integer(d)) if (0..=15).contains(d) => *d as i32,
        Some(other) => return Err(invalid("round", format!("invalid digit count {}", other))),
    };
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Integer(i) => Ok(Value::Integer(*i)),
        Value::Float(x) if digits == 0 => {
            let rounded = x.round();
            if rounded.is_finite() && rounded.abs() < i64::MAX as f64 {
                Ok(Value::Integer(rounded as i64))
            } else {
                Ok(Value::Float(rounded))
            }
        }
        Value::Float(x) => {
            let factor = 10f64.powi(digits);
            Ok(Value::Float((x * factor).round() / factor))
        }
        other => Err(invalid("round", format!("expected number, got {}", other.type_name()))),
    }
}

fn map_string(function: &str, value: &Value, f: fn(&str) -> String) -> EvalResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(f(s))),
        other => Err(invalid(
            function,
            format!("expected string, got {}", other.type_name()),
        )),
    }
}

fn lower(args: &[Value]) -> EvalResult<Value> {
    map_string("lower", &args[0], str::to_lowercase)
}

fn upper(args: &[Value]) -> EvalResult<Value> {
    map_string("upper", &args[0], str::to_uppercase)
}

fn matches(args: &[Value]) -> EvalResult<Value> {
    let pattern = args[1].as_str()?;
    let regex = Regex::new(pattern).map_err(|e| EvalError::InvalidRegex(e.to_string()))?;
    match &args[0] {
        Value::Null => Ok(Value::Boolean(false)),
        Value::String(s) => Ok(Value::Boolean(regex.is_match(s))),
        other => Err(invalid(
            "matches",
            format!("expected string, got {}", other.type_name()),
        )),
    }
}

fn if_null(args: &[Value]) -> EvalResult<Value> {
    Ok(if args[0].is_null() {
        args[1].clone()
    } else {
        args[0].clone()
    })
}
