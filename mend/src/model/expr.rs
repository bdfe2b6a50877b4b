//! Expression tree of the intermediate representation
//!
//! An expression is one of three node kinds. The persisted form carries a
//! `tokentype` discriminator on every node so that argument lists decode
//! without outside type hints.

use super::names::{self, OP_FUNC_CALL, OP_ITE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Expression node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tokentype")]
pub enum Expression {
    Constant(Constant),
    Variable(Variable),
    Operation(Operation),
}

/// Literal value, kept as source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constant {
    pub value: String,
    #[serde(default)]
    pub line: u32,
}

/// Variable reference
///
/// Unprimed variables belong to the reference program, primed ones to the
/// submission. Equality, hashing and ordering look at the unprimed name only,
/// so `x` and `x'` are the same key. Containers that must keep both apart
/// use [`VarKey`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawVariable")]
pub struct Variable {
    name: String,
    primed: bool,
    line: u32,
}

/// Persisted variable as read; the name may still carry its prime
#[derive(Deserialize)]
struct RawVariable {
    name: String,
    #[serde(default)]
    primed: bool,
    #[serde(default)]
    line: u32,
}

impl From<RawVariable> for Variable {
    fn from(raw: RawVariable) -> Self {
        Variable::with_origin(raw.name, raw.primed).at_line(raw.line)
    }
}

/// Operator applied to an ordered argument list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub args: Vec<Expression>,
    #[serde(default)]
    pub line: u32,
}

/// Variable identity that keeps the origin tag: `x` and `x'` differ
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarKey {
    pub name: String,
    pub primed: bool,
}

impl Constant {
    pub fn new(value: impl Into<String>, line: u32) -> Self {
        Constant {
            value: value.into(),
            line,
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Constant {}

impl Variable {
    /// A trailing `'` in `name` always moves into the origin flag
    fn with_origin(name: String, primed: bool) -> Self {
        match name.strip_suffix('\'') {
            Some(base) => Variable {
                name: base.to_string(),
                primed: true,
                line: 0,
            },
            None => Variable {
                name,
                primed,
                line: 0,
            },
        }
    }

    /// Reference-side variable
    pub fn new(name: impl Into<String>) -> Self {
        Variable::with_origin(name.into(), false)
    }

    /// Submission-side variable
    pub fn primed(name: impl Into<String>) -> Self {
        Variable::with_origin(name.into(), true)
    }

    /// Read a printed name, where a trailing `'` marks the submission side
    pub fn parse(name: &str) -> Self {
        match name.strip_suffix('\'') {
            Some(base) => Variable::primed(base),
            None => Variable::new(name),
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Name including the trailing `'` of primed variables; also the memory key
    pub fn name(&self) -> String {
        if self.is_primed() {
            format!("{}'", self.unprimed_name())
        } else {
            self.name.clone()
        }
    }

    /// Name without any prime
    pub fn unprimed_name(&self) -> &str {
        self.name.strip_suffix('\'').unwrap_or(&self.name)
    }

    pub fn is_primed(&self) -> bool {
        self.primed || self.name.ends_with('\'')
    }

    pub fn set_primed(&mut self, primed: bool) {
        self.primed = primed;
    }

    /// Submission-side copy of this variable
    pub fn to_primed(&self) -> Variable {
        Variable {
            name: self.unprimed_name().to_string(),
            primed: true,
            line: self.line,
        }
    }

    /// Reference-side copy of this variable
    pub fn to_unprimed(&self) -> Variable {
        Variable {
            name: self.unprimed_name().to_string(),
            primed: false,
            line: self.line,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn key(&self) -> VarKey {
        VarKey {
            name: self.unprimed_name().to_string(),
            primed: self.is_primed(),
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.unprimed_name() == other.unprimed_name()
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unprimed_name().hash(state);
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Variable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.unprimed_name().cmp(other.unprimed_name())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.primed {
            write!(f, "{}'", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl Operation {
    pub fn new(name: impl Into<String>, args: Vec<Expression>, line: u32) -> Self {
        Operation {
            name: name.into(),
            args,
            line,
        }
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl Eq for Operation {}

impl Expression {
    pub fn constant(value: impl Into<String>) -> Self {
        Expression::Constant(Constant::new(value, 0))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expression::Variable(Variable::new(name))
    }

    pub fn primed_var(name: impl Into<String>) -> Self {
        Expression::Variable(Variable::primed(name))
    }

    pub fn op(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Operation(Operation::new(name, args, 0))
    }

    /// Shorthand for a two-argument operation
    pub fn binary(name: impl Into<String>, left: Expression, right: Expression) -> Self {
        Expression::op(name, vec![left, right])
    }

    pub fn ite(cond: Expression, then: Expression, otherwise: Expression) -> Self {
        Expression::op(OP_ITE, vec![cond, then, otherwise])
    }

    /// Set the source line of this node
    pub fn at_line(mut self, line: u32) -> Self {
        match &mut self {
            Expression::Constant(c) => c.line = line,
            Expression::Variable(v) => v.line = line,
            Expression::Operation(o) => o.line = line,
        }
        self
    }

    pub fn line(&self) -> u32 {
        match self {
            Expression::Constant(c) => c.line,
            Expression::Variable(v) => v.line,
            Expression::Operation(o) => o.line,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Expression::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_operation(&self) -> Option<&Operation> {
        match self {
            Expression::Operation(o) => Some(o),
            _ => None,
        }
    }

    /// Mark every variable of the tree as submission-side
    pub fn prime(self) -> Self {
        self.map_variables(&mut |v| {
            let mut v = v.clone();
            v.set_primed(true);
            Expression::Variable(v)
        })
    }

    /// Mark every variable of the tree as reference-side
    pub fn unprime(self) -> Self {
        self.map_variables(&mut |v| Expression::Variable(v.to_unprimed()))
    }

    /// Prime only the variables named in `names`
    pub fn prime_only(self, names: &BTreeSet<String>) -> Self {
        self.map_variables(&mut |v| {
            if names.contains(v.unprimed_name()) {
                Expression::Variable(v.to_primed())
            } else {
                Expression::Variable(v.clone())
            }
        })
    }

    /// Replace every variable printed as `name` with `with`
    pub fn replace(self, name: &str, with: &Expression) -> Self {
        self.map_variables(&mut |v| {
            if v.name() == name {
                with.clone()
            } else {
                Expression::Variable(v.clone())
            }
        })
    }

    fn map_variables(self, f: &mut impl FnMut(&Variable) -> Expression) -> Self {
        match self {
            Expression::Variable(v) => f(&v),
            Expression::Constant(_) => self,
            Expression::Operation(mut o) => {
                o.args = o.args.into_iter().map(|a| a.map_variables(f)).collect();
                Expression::Operation(o)
            }
        }
    }

    /// Rebuild the tree, replacing each variable by the result of `f`.
    /// The first error aborts the rewrite.
    pub fn try_map_variables<E>(
        &self,
        f: &mut impl FnMut(&Variable) -> Result<Expression, E>,
    ) -> Result<Expression, E> {
        match self {
            Expression::Variable(v) => f(v),
            Expression::Constant(_) => Ok(self.clone()),
            Expression::Operation(o) => {
                let args = o
                    .args
                    .iter()
                    .map(|a| a.try_map_variables(f))
                    .collect::<Result<Vec<_>, E>>()?;
                Ok(Expression::Operation(Operation::new(o.name.clone(), args, o.line)))
            }
        }
    }

    /// Variable occurrences in left-to-right order
    pub fn variables(&self) -> Vec<&Variable> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Variable>) {
        match self {
            Expression::Variable(v) => out.push(v),
            Expression::Constant(_) => {}
            Expression::Operation(o) => {
                for arg in &o.args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        match self {
            Expression::Constant(_) | Expression::Variable(_) => 1,
            Expression::Operation(o) => 1 + o.args.iter().map(Expression::size).sum::<usize>(),
        }
    }

    /// Human-facing rendering used in repair messages
    pub fn pretty(&self) -> Pretty<'_> {
        Pretty(self)
    }
}

/// Canonical prefix form, primes included: `+(5, x')`
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c.value),
            Expression::Variable(v) => write!(f, "{v}"),
            Expression::Operation(o) => {
                write!(f, "{}(", o.name)?;
                for (i, arg) in o.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Infix rendering with primes stripped: `5 + x`, `ite(c, t, e)`
pub struct Pretty<'a>(&'a Expression);

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expression::Constant(c) => write!(f, "{}", c.value),
            Expression::Variable(v) => write!(f, "{}", v.unprimed_name()),
            Expression::Operation(o) => {
                let (head, args): (&str, &[Expression]) = match o.args.split_first() {
                    Some((callee, rest)) if o.name == OP_FUNC_CALL => {
                        write!(f, "{}", callee.pretty())?;
                        ("", rest)
                    }
                    _ => (o.name.as_str(), &o.args),
                };
                if names::is_symbolic(head) && args.len() >= 2 {
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {head} ")?;
                        }
                        write!(f, "{}", arg.pretty())?;
                    }
                    Ok(())
                } else if names::is_symbolic(head) && args.len() == 1 {
                    write!(f, "{head}{}", args[0].pretty())
                } else {
                    write!(f, "{head}(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg.pretty())?;
                    }
                    write!(f, ")")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn add(l: Expression, r: Expression) -> Expression {
        Expression::binary("+", l, r)
    }

    #[test]
    fn test_primed_and_unprimed_variables_are_equal() {
        assert_eq!(Variable::new("x"), Variable::primed("x"));
        assert_eq!(Variable::new("x"), Variable::parse("x'"));
        assert_ne!(Variable::new("x"), Variable::new("y"));
    }

    #[test]
    fn test_decoded_prime_is_not_doubled() {
        let text = r#"{"tokentype":"Variable","name":"x'","primed":true}"#;
        let decoded: Expression = serde_json::from_str(text).unwrap();
        let var = decoded.as_variable().unwrap();
        assert_eq!(var.name(), "x'");
        assert_eq!(var.key(), Variable::primed("x").key());

        let text = r#"{"tokentype":"Variable","name":"y'"}"#;
        let decoded: Expression = serde_json::from_str(text).unwrap();
        assert_eq!(decoded.as_variable().unwrap().name(), "y'");
        assert_eq!(decoded.pretty().to_string(), "y");

        let mut var = Variable::new("z'");
        assert_eq!(var.name(), "z'");
        var.set_primed(false);
        assert_eq!(var.name(), "z");
    }

    #[test]
    fn test_prime_collision_in_maps() {
        let mut map = HashMap::new();
        map.insert(Variable::new("x"), 1);
        map.insert(Variable::primed("x"), 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Variable::new("x")], 2);
    }

    #[test]
    fn test_var_key_keeps_origin() {
        assert_ne!(Variable::new("x").key(), Variable::primed("x").key());
        assert_eq!(Variable::parse("x'").key(), Variable::primed("x").key());
    }

    #[test]
    fn test_variable_names() {
        let v = Variable::primed("count");
        assert_eq!(v.name(), "count'");
        assert_eq!(v.unprimed_name(), "count");
        assert!(v.is_primed());
        assert_eq!(v.to_unprimed().name(), "count");
    }

    #[test]
    fn test_equality_ignores_lines() {
        let a = add(Expression::constant("1"), Expression::var("x")).at_line(3);
        let b = add(Expression::constant("1").at_line(9), Expression::var("x"));
        assert_eq!(a, b);
        assert_ne!(a, add(Expression::constant("2"), Expression::var("x")));
    }

    #[test]
    fn test_canonical_display() {
        let e = add(Expression::constant("5"), Expression::primed_var("x"));
        assert_eq!(e.to_string(), "+(5, x')");
    }

    #[test]
    fn test_pretty_infix() {
        let e = add(Expression::constant("5"), Expression::primed_var("x"));
        assert_eq!(e.pretty().to_string(), "5 + x");
    }

    #[test]
    fn test_pretty_ite() {
        let cond = Expression::binary("==", Expression::var("x"), Expression::constant("1"));
        let e = Expression::ite(cond, Expression::constant("1"), Expression::constant("0"));
        assert_eq!(e.pretty().to_string(), "ite(x == 1, 1, 0)");
    }

    #[test]
    fn test_pretty_unary_and_calls() {
        let neg = Expression::op("-", vec![Expression::var("n")]);
        assert_eq!(neg.pretty().to_string(), "-n");

        let call = Expression::op(
            OP_FUNC_CALL,
            vec![Expression::var("gcd"), Expression::var("a"), Expression::var("b")],
        );
        assert_eq!(call.pretty().to_string(), "gcd(a, b)");

        let append = Expression::op(
            "StrAppend",
            vec![Expression::var("$out"), Expression::constant("\"hi\"")],
        );
        assert_eq!(append.pretty().to_string(), "StrAppend($out, \"hi\")");
    }

    #[test]
    fn test_nested_infix_has_no_parentheses() {
        let e = Expression::binary(
            "-",
            Expression::binary("*", Expression::var("a1"), Expression::var("b2")),
            Expression::binary("*", Expression::var("a2"), Expression::var("b1")),
        );
        assert_eq!(e.pretty().to_string(), "a1 * b2 - a2 * b1");
    }

    #[test]
    fn test_prime_and_unprime() {
        let e = add(Expression::var("x"), Expression::var("y")).prime();
        assert!(e.variables().iter().all(|v| v.is_primed()));
        let e = e.unprime();
        assert!(e.variables().iter().all(|v| !v.is_primed()));
    }

    #[test]
    fn test_prime_only_selected() {
        let names: BTreeSet<String> = ["x".to_string()].into();
        let e = add(Expression::var("x"), Expression::var("y")).prime_only(&names);
        let vars = e.variables();
        assert!(vars[0].is_primed());
        assert!(!vars[1].is_primed());
    }

    #[test]
    fn test_replace_variable() {
        let e = add(Expression::var("x"), Expression::var("y"))
            .replace("x", &Expression::constant("4"));
        assert_eq!(e.to_string(), "+(4, y)");
    }

    #[test]
    fn test_try_map_variables_stops_on_error() {
        let e = add(Expression::var("x"), Expression::var("missing"));
        let result: Result<Expression, String> = e.try_map_variables(&mut |v| {
            if v.unprimed_name() == "x" {
                Ok(Expression::Variable(v.to_primed()))
            } else {
                Err(v.name())
            }
        });
        assert_eq!(result, Err("missing".to_string()));
    }

    #[test]
    fn test_size() {
        let e = add(Expression::constant("1"), add(Expression::var("a"), Expression::var("b")));
        assert_eq!(e.size(), 5);
    }
}
