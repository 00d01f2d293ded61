//! Symbolic pattern matching over expression trees.
//!
//! A `Pattern` compiles once into a `CompiledMatcher` and is then matched
//! against many expressions. The analyzer routes structurally simple
//! patterns to a recursive direct matcher; anything with branching,
//! negation or non-trailing repetition runs on a bytecode NFA whose cost is
//! bounded by instructions × input length.

pub mod analyze;
pub mod captures;
pub mod compile;
pub mod direct;
pub mod pattern;
pub mod vm;

use std::collections::HashMap;
use std::sync::Arc;

use vela_core::value::Value;

pub use analyze::{analyze, Strategy};
pub use compile::{CompileError, Entry, Guard, Inst, Program, Test};
pub use direct::DirectMatcher;
pub use pattern::{Pattern, PredicateFn};
pub use vm::Executor;

pub type Bindings = HashMap<String, Value>;

/// Nesting bound for recursion into sub-lists; exceeding it is a non-match.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Outcome of one match. Total: a non-matching input yields
/// `matched == false`, never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Captured bindings. An empty capture is absent; a one-element capture
    /// binds the element; a longer capture binds a list preserving order.
    pub bindings: Bindings,
    /// Input elements consumed at the entry level, for diagnostics.
    pub consumed: usize,
}

impl MatchResult {
    pub fn success(bindings: Bindings, consumed: usize) -> Self {
        Self { matched: true, bindings, consumed }
    }

    pub fn failure() -> Self {
        Self { matched: false, bindings: Bindings::new(), consumed: 0 }
    }
}

/// A pattern compiled for one of the two engines. Immutable; reuse across
/// any number of match calls.
#[derive(Debug)]
pub struct CompiledMatcher {
    strategy: Strategy,
    engine: Engine,
}

#[derive(Debug)]
enum Engine {
    Direct(DirectMatcher),
    Nfa(Executor),
}

/// Compile a pattern, picking the engine by analysis. Fails only on
/// structurally invalid patterns.
pub fn compile_pattern(pattern: &Pattern) -> Result<CompiledMatcher, CompileError> {
    compile::validate(pattern)?;
    match analyze(pattern) {
        Strategy::Direct => Ok(CompiledMatcher {
            strategy: Strategy::Direct,
            engine: Engine::Direct(DirectMatcher::new(pattern.clone())),
        }),
        Strategy::Nfa => compile_pattern_nfa(pattern),
    }
}

/// Compile for the machine engine regardless of classification. The two
/// engines agree on every pattern the analyzer routes directly; this entry
/// point is how that equivalence is cross-checked, and is also handy when
/// debugging a compiled program.
pub fn compile_pattern_nfa(pattern: &Pattern) -> Result<CompiledMatcher, CompileError> {
    let program = compile::compile(pattern)?;
    Ok(CompiledMatcher {
        strategy: Strategy::Nfa,
        engine: Engine::Nfa(Executor::new(Arc::new(program))),
    })
}

impl CompiledMatcher {
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.engine = match self.engine {
            Engine::Direct(d) => Engine::Direct(d.with_max_depth(max_depth)),
            Engine::Nfa(e) => Engine::Nfa(e.with_max_depth(max_depth)),
        };
        self
    }

    /// Match one expression. Sequence-shaped patterns consume the
    /// expression's children; everything else treats it as a one-element
    /// sequence.
    pub fn match_expr(&self, expr: &Value) -> MatchResult {
        match &self.engine {
            Engine::Direct(d) => d.match_expr(expr),
            Engine::Nfa(e) => e.match_expr(expr),
        }
    }

    /// Match an already-extracted sibling sequence.
    pub fn match_children(&self, input: &[Value]) -> MatchResult {
        match &self.engine {
            Engine::Direct(d) => d.match_children(input),
            Engine::Nfa(e) => e.match_children(input),
        }
    }
}
