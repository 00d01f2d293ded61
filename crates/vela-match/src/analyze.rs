use crate::pattern::Pattern;

/// Which engine a compiled pattern runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Recursive structural matcher, no machine state.
    Direct,
    /// Bytecode NFA simulation.
    Nfa,
}

/// Classify a pattern. Pure and deterministic; run once per compilation.
///
/// The direct matcher handles flat literal/head/wildcard sequences with at
/// most a trailing repeat. Branching, inversion, non-trailing repetition and
/// capture groups that need boundary tracking all go to the machine.
pub fn analyze(pattern: &Pattern) -> Strategy {
    if is_direct(pattern) {
        Strategy::Direct
    } else {
        Strategy::Nfa
    }
}

fn is_direct(p: &Pattern) -> bool {
    match p {
        Pattern::Literal(_) | Pattern::Head(_) | Pattern::Any => true,
        Pattern::Predicate { inner, .. } => is_direct(inner),
        Pattern::Alt(_) | Pattern::Not(_) => false,
        // A quantifier is only direct-matchable as the tail of a sequence,
        // handled in direct_items below.
        Pattern::ZeroOrMore { .. } | Pattern::OneOrMore { .. } | Pattern::Optional { .. } => false,
        Pattern::Named { inner, .. } => {
            is_direct(inner) && !contains_named(inner) && !is_quantifier(inner)
        }
        Pattern::Sequence(items) | Pattern::Compound { items, .. } => direct_items(items),
    }
}

fn direct_items(items: &[Pattern]) -> bool {
    let Some((last, prefix)) = items.split_last() else {
        return true;
    };
    if prefix.iter().any(is_quantifier) || !prefix.iter().all(is_direct) {
        return false;
    }
    if is_quantifier(last) {
        // Closed-form slicing only works when one-element membership needs
        // no machine state of its own.
        is_atomic(quantifier_inner(last))
    } else {
        is_direct(last)
    }
}

/// Quantifier test, looking through predicate wrappers (a predicate inherits
/// its inner pattern's classification).
fn is_quantifier(p: &Pattern) -> bool {
    match p {
        Pattern::ZeroOrMore { .. } | Pattern::OneOrMore { .. } | Pattern::Optional { .. } => true,
        Pattern::Predicate { inner, .. } => is_quantifier(inner),
        _ => false,
    }
}

fn quantifier_inner(p: &Pattern) -> &Pattern {
    match p {
        Pattern::ZeroOrMore { inner, .. }
        | Pattern::OneOrMore { inner, .. }
        | Pattern::Optional { inner, .. } => inner,
        Pattern::Predicate { inner, .. } => quantifier_inner(inner),
        _ => p,
    }
}

fn is_atomic(p: &Pattern) -> bool {
    match p {
        Pattern::Literal(_) | Pattern::Head(_) | Pattern::Any => true,
        Pattern::Predicate { inner, .. } => is_atomic(inner),
        _ => false,
    }
}

fn contains_named(p: &Pattern) -> bool {
    match p {
        Pattern::Named { .. } => true,
        Pattern::Literal(_) | Pattern::Head(_) | Pattern::Any => false,
        Pattern::Sequence(items) | Pattern::Alt(items) | Pattern::Compound { items, .. } => {
            items.iter().any(contains_named)
        }
        Pattern::Not(inner)
        | Pattern::ZeroOrMore { inner, .. }
        | Pattern::OneOrMore { inner, .. }
        | Pattern::Optional { inner, .. }
        | Pattern::Predicate { inner, .. } => contains_named(inner),
    }
}
