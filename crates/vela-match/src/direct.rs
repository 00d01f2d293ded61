//! Structural engine for patterns the analyzer approves: flat sequences of
//! literal/head/wildcard tests with at most a trailing repeat. Single-pass
//! recursive descent, no machine state, no backtracking.

use vela_core::value::Value;

use crate::pattern::{run_predicate, Pattern, PredicateFn};
use crate::{Bindings, MatchResult, DEFAULT_MAX_DEPTH};

#[derive(Debug)]
pub struct DirectMatcher {
    pattern: Pattern,
    max_depth: usize,
}

enum QuantKind {
    ZeroOrMore,
    OneOrMore,
    Optional,
}

impl DirectMatcher {
    pub fn new(pattern: Pattern) -> Self {
        Self { pattern, max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn match_expr(&self, expr: &Value) -> MatchResult {
        let mut bindings = Bindings::new();
        match &self.pattern {
            Pattern::Sequence(items) => match expr.children() {
                Some(children) if self.match_items(items, children, &mut bindings, 0) => {
                    let consumed = children.len();
                    MatchResult::success(bindings, consumed)
                }
                _ => MatchResult::failure(),
            },
            Pattern::Compound { head, items } => match expr.children() {
                Some(children)
                    if head.as_deref().map_or(true, |h| expr.head_symbol() == Some(h))
                        && self.match_items(items, children, &mut bindings, 0) =>
                {
                    let consumed = children.len();
                    MatchResult::success(bindings, consumed)
                }
                _ => MatchResult::failure(),
            },
            other => {
                if self.match_one(other, expr, &mut bindings, 0) {
                    MatchResult::success(bindings, 1)
                } else {
                    MatchResult::failure()
                }
            }
        }
    }

    /// Match an already-extracted sibling sequence. The entry head
    /// requirement applies to `match_expr` only.
    pub fn match_children(&self, input: &[Value]) -> MatchResult {
        let mut bindings = Bindings::new();
        let ok = match &self.pattern {
            Pattern::Sequence(items) | Pattern::Compound { items, .. } => {
                self.match_items(items, input, &mut bindings, 0)
            }
            other => input.len() == 1 && self.match_one(other, &input[0], &mut bindings, 0),
        };
        if ok {
            MatchResult::success(bindings, input.len())
        } else {
            MatchResult::failure()
        }
    }

    fn match_one(&self, pattern: &Pattern, expr: &Value, bindings: &mut Bindings, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        match pattern {
            Pattern::Literal(v) => v == expr,
            Pattern::Head(h) => expr.head_symbol() == Some(h.as_str()),
            Pattern::Any => true,
            Pattern::Predicate { inner, test, label } => {
                self.match_one(inner, expr, bindings, depth) && run_predicate(test, label, expr)
            }
            Pattern::Named { name, inner } => {
                if self.match_one(inner, expr, bindings, depth) {
                    // Slot semantics: a later capture under the same name
                    // overwrites, matching the machine engine.
                    bindings.insert(name.clone(), expr.clone());
                    true
                } else {
                    false
                }
            }
            Pattern::Sequence(items) => expr
                .children()
                .map_or(false, |children| self.match_items(items, children, bindings, depth + 1)),
            Pattern::Compound { head, items } => match expr.children() {
                Some(children) => {
                    head.as_deref().map_or(true, |h| expr.head_symbol() == Some(h))
                        && self.match_items(items, children, bindings, depth + 1)
                }
                None => false,
            },
            // Branching, inversion and bare quantifiers are routed to the
            // machine by the analyzer; none of them matches a single
            // element here.
            Pattern::Alt(_)
            | Pattern::Not(_)
            | Pattern::ZeroOrMore { .. }
            | Pattern::OneOrMore { .. }
            | Pattern::Optional { .. } => false,
        }
    }

    /// Children must 1:1-match the items, except that a quantified tail is
    /// handled in closed form: the fixed prefix matches exactly, then every
    /// remaining child independently satisfies the quantifier's inner test.
    fn match_items(&self, items: &[Pattern], exprs: &[Value], bindings: &mut Bindings, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let Some((last, prefix)) = items.split_last() else {
            return exprs.is_empty();
        };
        if let Some((kind, inner, guards)) = trailing_quantifier(last) {
            if exprs.len() < prefix.len() {
                return false;
            }
            let (front, tail) = exprs.split_at(prefix.len());
            for (p, e) in prefix.iter().zip(front) {
                if !self.match_one(p, e, bindings, depth) {
                    return false;
                }
            }
            match kind {
                QuantKind::OneOrMore if tail.is_empty() => return false,
                QuantKind::Optional if tail.len() > 1 => return false,
                _ => {}
            }
            tail.iter().all(|e| {
                self.match_one(inner, e, bindings, depth)
                    && guards.iter().all(|(test, label)| run_predicate(test, label, e))
            })
        } else {
            exprs.len() == items.len()
                && items.iter().zip(exprs).all(|(p, e)| self.match_one(p, e, bindings, depth))
        }
    }
}

/// Recognize a quantified tail, looking through predicate wrappers and
/// collecting their tests; they apply to each remaining child.
fn trailing_quantifier(p: &Pattern) -> Option<(QuantKind, &Pattern, Vec<(&PredicateFn, &str)>)> {
    let mut guards = Vec::new();
    let mut current = p;
    loop {
        match current {
            Pattern::Predicate { inner, test, label } => {
                guards.push((test, label.as_str()));
                current = inner;
            }
            Pattern::ZeroOrMore { inner, .. } => return Some((QuantKind::ZeroOrMore, inner, guards)),
            Pattern::OneOrMore { inner, .. } => return Some((QuantKind::OneOrMore, inner, guards)),
            Pattern::Optional { inner, .. } => return Some((QuantKind::Optional, inner, guards)),
            _ => return None,
        }
    }
}
