//! Thompson construction over tree-sibling sequences.
//!
//! Patterns compile to a flat instruction array with split/jump opcodes.
//! One consuming instruction eats one sibling expression; capture boundaries
//! and control flow are epsilon instructions. Nested list patterns compile
//! to independent sub-programs owned by their parent instruction, with group
//! slots drawn from one compiler-local counter so a slot inside a sub-list
//! can never collide with a slot at the enclosing level.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use vela_core::value::Value;

use crate::pattern::{Pattern, PredicateFn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("sequence pattern must have at least one element")]
    EmptySequence,
    #[error("alternation pattern must have at least one alternative")]
    EmptyAlternation,
    #[error("unsupported pattern kind: {0}")]
    UnsupportedPatternKind(String),
}

/// Structural test a consuming instruction applies to one sibling element.
#[derive(Debug, Clone)]
pub enum Test {
    Lit(Value),
    Head(String),
    Any,
    /// The element must be list-like with the required head (any list-like
    /// head when `None`); its children must match the sub-program.
    Sublist { program: Arc<Program>, head: Option<String> },
    /// The sub-program is evaluated against the element as a one-element
    /// sequence. Produced for negated composites.
    Elem { program: Arc<Program> },
    Not(Box<Test>),
}

/// A predicate layered onto a consuming instruction; runs only after the
/// structural test matched.
#[derive(Clone)]
pub struct Guard {
    pub label: String,
    pub test: PredicateFn,
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("label", &self.label).finish()
    }
}

#[derive(Debug, Clone)]
pub enum Inst {
    /// Consume one element if the test (and every guard) passes.
    Match { test: Test, guards: Vec<Guard> },
    /// Fork the thread; `next` has priority over `alt`.
    Split { next: usize, alt: usize },
    Jump(usize),
    CaptureStart(usize),
    CaptureEnd(usize),
    /// Accept if all input is consumed.
    End,
    /// Kill the thread.
    Fail,
}

/// How a program consumes its input at the entry level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// The matched expression is a one-element sequence.
    Single,
    /// The instructions consume the children of a list-like expression with
    /// the required head (any list-like head when `None`).
    Children { head: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub entry: Entry,
    /// Size of the capture table; covers every slot allocated up to the end
    /// of this program's compilation, sub-programs included.
    pub slot_count: usize,
    /// Slot/name pairs in allocation (pre-order) order. The top-level
    /// program sees every group of every nesting level.
    pub groups: Vec<(usize, String)>,
}

/// Reject structurally invalid patterns before any strategy is chosen.
pub fn validate(pattern: &Pattern) -> Result<(), CompileError> {
    match pattern {
        Pattern::Literal(_) | Pattern::Head(_) | Pattern::Any => Ok(()),
        Pattern::Sequence(items) => {
            if items.is_empty() {
                return Err(CompileError::EmptySequence);
            }
            items.iter().try_for_each(validate)
        }
        Pattern::Alt(alts) => {
            if alts.is_empty() {
                return Err(CompileError::EmptyAlternation);
            }
            alts.iter().try_for_each(validate)
        }
        // A compound may have zero items: it then matches an empty list.
        Pattern::Compound { items, .. } => items.iter().try_for_each(validate),
        Pattern::Not(inner)
        | Pattern::ZeroOrMore { inner, .. }
        | Pattern::OneOrMore { inner, .. }
        | Pattern::Optional { inner, .. }
        | Pattern::Named { inner, .. }
        | Pattern::Predicate { inner, .. } => validate(inner),
    }
}

/// Compile a pattern into a program for the machine engine.
pub fn compile(pattern: &Pattern) -> Result<Program, CompileError> {
    validate(pattern)?;
    let mut slots = SlotAlloc::default();
    let mut compiler = Compiler { insts: Vec::new(), slots: &mut slots };
    let mut scope = HashMap::new();

    let entry = match pattern {
        Pattern::Sequence(items) => {
            for item in items {
                compiler.compile_element(item, &mut scope)?;
            }
            Entry::Children { head: None }
        }
        Pattern::Compound { head, items } => {
            for item in items {
                compiler.compile_element(item, &mut scope)?;
            }
            Entry::Children { head: head.clone() }
        }
        other => {
            compiler.compile_element(other, &mut scope)?;
            Entry::Single
        }
    };
    compiler.emit(Inst::End);

    let insts = compiler.insts;
    Ok(Program { insts, entry, slot_count: slots.next, groups: slots.groups })
}

/// Group-slot allocator for one compilation pass. Shared across sub-program
/// compilation so slot indices stay globally unique within the pass.
#[derive(Default)]
struct SlotAlloc {
    next: usize,
    groups: Vec<(usize, String)>,
}

impl SlotAlloc {
    fn alloc(&mut self, name: &str) -> usize {
        let slot = self.next;
        self.next += 1;
        self.groups.push((slot, name.to_string()));
        slot
    }
}

struct Compiler<'a> {
    insts: Vec<Inst>,
    slots: &'a mut SlotAlloc,
}

impl Compiler<'_> {
    fn emit(&mut self, inst: Inst) -> usize {
        self.insts.push(inst);
        self.insts.len() - 1
    }

    fn here(&self) -> usize {
        self.insts.len()
    }

    fn patch_split(&mut self, at: usize, next: usize, alt: usize) {
        self.insts[at] = Inst::Split { next, alt };
    }

    fn patch_jump(&mut self, at: usize, target: usize) {
        self.insts[at] = Inst::Jump(target);
    }

    /// Emit the fragment matching `pattern` as consecutive sibling elements.
    fn compile_element(
        &mut self,
        pattern: &Pattern,
        scope: &mut HashMap<String, usize>,
    ) -> Result<(), CompileError> {
        match pattern {
            Pattern::Literal(v) => {
                self.emit(Inst::Match { test: Test::Lit(v.clone()), guards: Vec::new() });
                Ok(())
            }
            Pattern::Head(h) => {
                self.emit(Inst::Match { test: Test::Head(h.clone()), guards: Vec::new() });
                Ok(())
            }
            Pattern::Any => {
                self.emit(Inst::Match { test: Test::Any, guards: Vec::new() });
                Ok(())
            }
            Pattern::Sequence(items) => {
                if items.is_empty() {
                    return Err(CompileError::EmptySequence);
                }
                let program = self.compile_subprogram_items(items, None)?;
                self.emit(Inst::Match {
                    test: Test::Sublist { program, head: None },
                    guards: Vec::new(),
                });
                Ok(())
            }
            Pattern::Compound { head, items } => {
                let program = self.compile_subprogram_items(items, head.clone())?;
                self.emit(Inst::Match {
                    test: Test::Sublist { program, head: head.clone() },
                    guards: Vec::new(),
                });
                Ok(())
            }
            Pattern::Alt(alts) => {
                let Some((last, rest)) = alts.split_last() else {
                    return Err(CompileError::EmptyAlternation);
                };
                let mut exits = Vec::new();
                for alt in rest {
                    let split = self.emit(Inst::Fail);
                    let body = self.here();
                    self.compile_element(alt, scope)?;
                    exits.push(self.emit(Inst::Fail));
                    let next_alt = self.here();
                    self.patch_split(split, body, next_alt);
                }
                self.compile_element(last, scope)?;
                let after = self.here();
                for exit in exits {
                    self.patch_jump(exit, after);
                }
                Ok(())
            }
            Pattern::ZeroOrMore { inner, greedy } => {
                let split = self.emit(Inst::Fail);
                let body = self.here();
                self.compile_element(inner, scope)?;
                self.emit(Inst::Jump(split));
                let after = self.here();
                if *greedy {
                    self.patch_split(split, body, after);
                } else {
                    self.patch_split(split, after, body);
                }
                Ok(())
            }
            Pattern::OneOrMore { inner, greedy } => {
                let body = self.here();
                self.compile_element(inner, scope)?;
                let split = self.emit(Inst::Fail);
                let after = self.here();
                if *greedy {
                    self.patch_split(split, body, after);
                } else {
                    self.patch_split(split, after, body);
                }
                Ok(())
            }
            Pattern::Optional { inner, greedy } => {
                let split = self.emit(Inst::Fail);
                let body = self.here();
                self.compile_element(inner, scope)?;
                let after = self.here();
                if *greedy {
                    self.patch_split(split, body, after);
                } else {
                    self.patch_split(split, after, body);
                }
                Ok(())
            }
            Pattern::Named { name, inner } => {
                let slot = match scope.get(name.as_str()) {
                    Some(slot) => *slot,
                    None => {
                        let slot = self.slots.alloc(name);
                        scope.insert(name.clone(), slot);
                        slot
                    }
                };
                self.emit(Inst::CaptureStart(slot));
                self.compile_element(inner, scope)?;
                self.emit(Inst::CaptureEnd(slot));
                Ok(())
            }
            Pattern::Predicate { inner, test, label } => {
                let start = self.here();
                self.compile_element(inner, scope)?;
                let end = self.here();
                for inst in &mut self.insts[start..end] {
                    if let Inst::Match { guards, .. } = inst {
                        guards.push(Guard { label: label.clone(), test: Arc::clone(test) });
                    }
                }
                Ok(())
            }
            Pattern::Not(inner) => {
                let test = self.element_test(inner)?;
                self.emit(Inst::Match { test: Test::Not(Box::new(test)), guards: Vec::new() });
                Ok(())
            }
        }
    }

    /// Build the single-element test a pattern denotes, for use under `Not`.
    fn element_test(&mut self, pattern: &Pattern) -> Result<Test, CompileError> {
        match pattern {
            Pattern::Literal(v) => Ok(Test::Lit(v.clone())),
            Pattern::Head(h) => Ok(Test::Head(h.clone())),
            Pattern::Any => Ok(Test::Any),
            Pattern::Sequence(items) => {
                if items.is_empty() {
                    return Err(CompileError::EmptySequence);
                }
                let program = self.compile_subprogram_items(items, None)?;
                Ok(Test::Sublist { program, head: None })
            }
            Pattern::Compound { head, items } => {
                let program = self.compile_subprogram_items(items, head.clone())?;
                Ok(Test::Sublist { program, head: head.clone() })
            }
            Pattern::Not(inner) => Ok(Test::Not(Box::new(self.element_test(inner)?))),
            Pattern::ZeroOrMore { .. } | Pattern::OneOrMore { .. } | Pattern::Optional { .. } => {
                Err(CompileError::UnsupportedPatternKind(
                    "negated quantifier has no single-element meaning".into(),
                ))
            }
            // Alternation, captures and predicates keep their meaning by
            // running as a sub-program over the one element.
            other => {
                let program = self.compile_subprogram_single(other)?;
                Ok(Test::Elem { program })
            }
        }
    }

    /// Compile items as an independent sub-program consuming a child
    /// sequence. The capture scope starts fresh: a name inside the sub-list
    /// gets its own slot, never the enclosing level's.
    fn compile_subprogram_items(
        &mut self,
        items: &[Pattern],
        head: Option<String>,
    ) -> Result<Arc<Program>, CompileError> {
        let mut sub = Compiler { insts: Vec::new(), slots: &mut *self.slots };
        let mut scope = HashMap::new();
        for item in items {
            sub.compile_element(item, &mut scope)?;
        }
        sub.emit(Inst::End);
        let insts = sub.insts;
        Ok(Arc::new(Program {
            insts,
            entry: Entry::Children { head },
            slot_count: self.slots.next,
            groups: self.slots.groups.clone(),
        }))
    }

    fn compile_subprogram_single(&mut self, pattern: &Pattern) -> Result<Arc<Program>, CompileError> {
        let mut sub = Compiler { insts: Vec::new(), slots: &mut *self.slots };
        let mut scope = HashMap::new();
        sub.compile_element(pattern, &mut scope)?;
        sub.emit(Inst::End);
        let insts = sub.insts;
        Ok(Arc::new(Program {
            insts,
            entry: Entry::Single,
            slot_count: self.slots.next,
            groups: self.slots.groups.clone(),
        }))
    }
}
