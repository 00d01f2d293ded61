use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type AssocMap = HashMap<String, Value>;

/// A symbolic expression tree. Atoms carry their own payload; `List` and
/// `Expr` are the ordered, indexable node kinds the matcher walks into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Real(f64),
    BigReal(String),
    Rational { num: i64, den: i64 },
    String(String),
    Symbol(String),
    Boolean(bool),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Assoc(AssocMap),
    Expr { head: Box<Value>, args: Vec<Value> },
}

impl Value {
    pub fn symbol<S: Into<String>>(s: S) -> Self { Value::Symbol(s.into()) }
    pub fn string<S: Into<String>>(s: S) -> Self { Value::String(s.into()) }
    pub fn list(items: Vec<Value>) -> Self { Value::List(items) }
    pub fn assoc(pairs: Vec<(impl Into<String>, Value)>) -> Self {
        let mut m = AssocMap::with_capacity(pairs.len());
        for (k, v) in pairs { m.insert(k.into(), v); }
        Value::Assoc(m)
    }
    pub fn expr(head: Value, args: Vec<Value>) -> Self { Value::Expr { head: Box::new(head), args } }

    /// The head tag of this node: the type name for atoms and collections,
    /// the head symbol's name for compound expressions. `None` when a
    /// compound expression has a non-symbol head.
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Value::Integer(_) => Some("Integer"),
            Value::Real(_) => Some("Real"),
            Value::BigReal(_) => Some("BigReal"),
            Value::Rational { .. } => Some("Rational"),
            Value::String(_) => Some("String"),
            Value::Symbol(_) => Some("Symbol"),
            Value::Boolean(_) => Some("Boolean"),
            Value::Bytes(_) => Some("ByteArray"),
            Value::List(_) => Some("List"),
            Value::Assoc(_) => Some("Assoc"),
            Value::Expr { head, .. } => match &**head {
                Value::Symbol(s) => Some(s.as_str()),
                _ => None,
            },
        }
    }

    /// Ordered children for the list-like node kinds. Associations are
    /// unordered and expose no sibling sequence.
    pub fn children(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            Value::Expr { args, .. } => Some(args),
            _ => None,
        }
    }

    pub fn is_list_like(&self) -> bool {
        self.children().is_some()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::pretty::format_value(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn head_symbols_for_atoms() {
        assert_eq!(Value::Integer(1).head_symbol(), Some("Integer"));
        assert_eq!(Value::Real(1.5).head_symbol(), Some("Real"));
        assert_eq!(Value::string("s").head_symbol(), Some("String"));
        assert_eq!(Value::symbol("x").head_symbol(), Some("Symbol"));
        assert_eq!(Value::Boolean(true).head_symbol(), Some("Boolean"));
        assert_eq!(Value::Bytes(vec![1, 2]).head_symbol(), Some("ByteArray"));
        assert_eq!(Value::Rational { num: 1, den: 2 }.head_symbol(), Some("Rational"));
    }

    #[test]
    fn head_symbol_of_compound_is_its_head() {
        let e = Value::expr(Value::symbol("Plus"), vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(e.head_symbol(), Some("Plus"));

        let nested_head = Value::expr(
            Value::expr(Value::symbol("Derivative"), vec![Value::Integer(1)]),
            vec![Value::symbol("f")],
        );
        assert_eq!(nested_head.head_symbol(), None);
    }

    #[test]
    fn children_only_for_list_like() {
        let list = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(list.children().map(<[Value]>::len), Some(2));

        let e = Value::expr(Value::symbol("f"), vec![Value::symbol("x")]);
        assert_eq!(e.children().map(<[Value]>::len), Some(1));

        assert_eq!(Value::Integer(3).children(), None);
        assert_eq!(Value::assoc(vec![("k", Value::Integer(1))]).children(), None);
    }

    #[test]
    fn structural_equality() {
        let a = Value::expr(Value::symbol("f"), vec![Value::list(vec![Value::Integer(1)])]);
        let b = Value::expr(Value::symbol("f"), vec![Value::list(vec![Value::Integer(1)])]);
        assert_eq!(a, b);
        let c = Value::expr(Value::symbol("g"), vec![Value::list(vec![Value::Integer(1)])]);
        assert_ne!(a, c);
    }
}
