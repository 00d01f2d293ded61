use std::fmt;
use std::sync::Arc;

use vela_core::value::Value;

/// A user-supplied test applied to a candidate expression after the
/// structural part of the pattern already matched.
pub type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The pattern algebra. Immutable once built; compile once, match many.
#[derive(Clone)]
pub enum Pattern {
    /// Matches a structurally equal expression.
    Literal(Value),
    /// Matches any expression whose head tag equals the given name.
    Head(String),
    /// Matches any single expression.
    Any,
    /// Matches consecutive sibling expressions, one sub-pattern per element
    /// except for a quantified tail. As an element of an enclosing sequence
    /// it matches one list-like child whose children match the items.
    Sequence(Vec<Pattern>),
    /// Matches if any alternative matches.
    Alt(Vec<Pattern>),
    /// Matches one expression the inner pattern does not match.
    Not(Box<Pattern>),
    ZeroOrMore { inner: Box<Pattern>, greedy: bool },
    OneOrMore { inner: Box<Pattern>, greedy: bool },
    Optional { inner: Box<Pattern>, greedy: bool },
    /// Records the expressions matched by the inner pattern under `name`.
    Named { name: String, inner: Box<Pattern> },
    /// Structural match plus a user test. `label` names the test in
    /// diagnostics; the closure itself is opaque.
    Predicate { inner: Box<Pattern>, test: PredicateFn, label: String },
    /// Matches one list-like expression with the required head (any
    /// list-like head when `None`) whose children match `items`.
    Compound { head: Option<String>, items: Vec<Pattern> },
}

impl Pattern {
    pub fn literal(v: Value) -> Self { Pattern::Literal(v) }
    pub fn head<S: Into<String>>(name: S) -> Self { Pattern::Head(name.into()) }
    pub fn any() -> Self { Pattern::Any }
    pub fn sequence(items: Vec<Pattern>) -> Self { Pattern::Sequence(items) }
    pub fn alt(alternatives: Vec<Pattern>) -> Self { Pattern::Alt(alternatives) }
    pub fn not(inner: Pattern) -> Self { Pattern::Not(Box::new(inner)) }

    pub fn zero_or_more(inner: Pattern, greedy: bool) -> Self {
        Pattern::ZeroOrMore { inner: Box::new(inner), greedy }
    }
    pub fn one_or_more(inner: Pattern, greedy: bool) -> Self {
        Pattern::OneOrMore { inner: Box::new(inner), greedy }
    }
    pub fn optional(inner: Pattern, greedy: bool) -> Self {
        Pattern::Optional { inner: Box::new(inner), greedy }
    }

    pub fn named<S: Into<String>>(name: S, inner: Pattern) -> Self {
        Pattern::Named { name: name.into(), inner: Box::new(inner) }
    }

    pub fn predicate<S, F>(inner: Pattern, label: S, test: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Pattern::Predicate { inner: Box::new(inner), test: Arc::new(test), label: label.into() }
    }

    pub fn compound(head: Option<String>, items: Vec<Pattern>) -> Self {
        Pattern::Compound { head, items }
    }
}

/// Run a user predicate without letting it take the engine down: a panic in
/// the closure counts as "did not match" and is logged at debug level.
pub(crate) fn run_predicate(test: &PredicateFn, label: &str, candidate: &Value) -> bool {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| test(candidate))) {
        Ok(ok) => ok,
        Err(_) => {
            log::debug!("predicate {} panicked; treated as non-match", label);
            false
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Pattern::Head(h) => f.debug_tuple("Head").field(h).finish(),
            Pattern::Any => write!(f, "Any"),
            Pattern::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Pattern::Alt(alts) => f.debug_tuple("Alt").field(alts).finish(),
            Pattern::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Pattern::ZeroOrMore { inner, greedy } => f
                .debug_struct("ZeroOrMore")
                .field("inner", inner)
                .field("greedy", greedy)
                .finish(),
            Pattern::OneOrMore { inner, greedy } => f
                .debug_struct("OneOrMore")
                .field("inner", inner)
                .field("greedy", greedy)
                .finish(),
            Pattern::Optional { inner, greedy } => f
                .debug_struct("Optional")
                .field("inner", inner)
                .field("greedy", greedy)
                .finish(),
            Pattern::Named { name, inner } => f
                .debug_struct("Named")
                .field("name", name)
                .field("inner", inner)
                .finish(),
            Pattern::Predicate { inner, label, .. } => f
                .debug_struct("Predicate")
                .field("inner", inner)
                .field("label", label)
                .finish(),
            Pattern::Compound { head, items } => f
                .debug_struct("Compound")
                .field("head", head)
                .field("items", items)
                .finish(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        use Pattern::*;
        match (self, other) {
            (Literal(a), Literal(b)) => a == b,
            (Head(a), Head(b)) => a == b,
            (Any, Any) => true,
            (Sequence(a), Sequence(b)) => a == b,
            (Alt(a), Alt(b)) => a == b,
            (Not(a), Not(b)) => a == b,
            (ZeroOrMore { inner: a, greedy: ga }, ZeroOrMore { inner: b, greedy: gb }) => {
                ga == gb && a == b
            }
            (OneOrMore { inner: a, greedy: ga }, OneOrMore { inner: b, greedy: gb }) => {
                ga == gb && a == b
            }
            (Optional { inner: a, greedy: ga }, Optional { inner: b, greedy: gb }) => {
                ga == gb && a == b
            }
            (Named { name: na, inner: a }, Named { name: nb, inner: b }) => na == nb && a == b,
            // Closures have no structural identity; two predicates are equal
            // only when they share the same closure.
            (
                Predicate { inner: a, test: ta, label: la },
                Predicate { inner: b, test: tb, label: lb },
            ) => la == lb && Arc::ptr_eq(ta, tb) && a == b,
            (Compound { head: ha, items: a }, Compound { head: hb, items: b }) => {
                ha == hb && a == b
            }
            _ => false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(v) => write!(f, "{}", v),
            Pattern::Head(h) => write!(f, "_{}", h),
            Pattern::Any => write!(f, "_"),
            Pattern::Sequence(items) => {
                write!(f, "(")?;
                for (i, p) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")
            }
            Pattern::Alt(alts) => {
                for (i, p) in alts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", p)?;
                }
                Ok(())
            }
            Pattern::Not(inner) => write!(f, "!{}", inner),
            Pattern::ZeroOrMore { inner, greedy } => {
                write!(f, "{}*{}", inner, if *greedy { "" } else { "?" })
            }
            Pattern::OneOrMore { inner, greedy } => {
                write!(f, "{}+{}", inner, if *greedy { "" } else { "?" })
            }
            Pattern::Optional { inner, greedy } => {
                write!(f, "{}?{}", inner, if *greedy { "" } else { "?" })
            }
            Pattern::Named { name, inner } => write!(f, "{}:{}", name, inner),
            Pattern::Predicate { inner, label, .. } => write!(f, "{}?{}", inner, label),
            Pattern::Compound { head, items } => {
                match head {
                    Some(h) => write!(f, "{}[", h)?,
                    None => write!(f, "_[")?,
                }
                for (i, p) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_surface_notation() {
        assert_eq!(Pattern::any().to_string(), "_");
        assert_eq!(Pattern::head("Integer").to_string(), "_Integer");
        assert_eq!(Pattern::named("x", Pattern::head("Integer")).to_string(), "x:_Integer");
        assert_eq!(
            Pattern::alt(vec![Pattern::head("Integer"), Pattern::head("Real")]).to_string(),
            "_Integer | _Real"
        );
        assert_eq!(Pattern::zero_or_more(Pattern::any(), true).to_string(), "_*");
        assert_eq!(Pattern::zero_or_more(Pattern::any(), false).to_string(), "_*?");
        assert_eq!(Pattern::not(Pattern::head("String")).to_string(), "!_String");
        assert_eq!(
            Pattern::compound(Some("Plus".into()), vec![Pattern::any(), Pattern::any()]).to_string(),
            "Plus[_, _]"
        );
    }

    #[test]
    fn predicate_equality_is_by_closure_identity() {
        let p1 = Pattern::predicate(Pattern::any(), "positive", |v| {
            matches!(v, Value::Integer(n) if *n > 0)
        });
        let p2 = p1.clone();
        assert_eq!(p1, p2);

        let p3 = Pattern::predicate(Pattern::any(), "positive", |v| {
            matches!(v, Value::Integer(n) if *n > 0)
        });
        assert!(p1 != p3);
    }
}
