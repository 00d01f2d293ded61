//! Machine engine: parallel-thread simulation of a compiled program.
//!
//! Threads are simulation paths, not OS threads. Each step consumes one
//! sibling expression for every live thread; epsilon instructions are
//! expanded eagerly when a thread is added to a list, with a
//! generation-stamped visited array indexed by program counter so a state is
//! entered at most once per step. Total work is bounded by
//! instructions × input length.

use std::sync::Arc;

use vela_core::value::Value;

use crate::captures::CaptureTable;
use crate::compile::{Entry, Guard, Inst, Program, Test};
use crate::pattern::run_predicate;
use crate::{MatchResult, DEFAULT_MAX_DEPTH};

#[derive(Debug)]
pub struct Executor {
    program: Arc<Program>,
    max_depth: usize,
}

struct Thread {
    pc: usize,
    caps: CaptureTable,
}

impl Executor {
    pub fn new(program: Arc<Program>) -> Self {
        Self { program, max_depth: DEFAULT_MAX_DEPTH }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn match_expr(&self, expr: &Value) -> MatchResult {
        match &self.program.entry {
            Entry::Children { head } => match expr.children() {
                Some(children) if head_matches(head.as_deref(), expr) => {
                    self.match_children(children)
                }
                _ => MatchResult::failure(),
            },
            Entry::Single => self.match_children(std::slice::from_ref(expr)),
        }
    }

    /// Match an already-extracted sibling sequence. The entry head
    /// requirement applies to `match_expr` only.
    pub fn match_children(&self, input: &[Value]) -> MatchResult {
        match run(&self.program, input, 0, self.max_depth) {
            Some(caps) => {
                let bindings = caps.bindings(&self.program.groups, input);
                MatchResult::success(bindings, input.len())
            }
            None => MatchResult::failure(),
        }
    }
}

fn head_matches(required: Option<&str>, expr: &Value) -> bool {
    required.map_or(true, |h| expr.head_symbol() == Some(h))
}

/// Simulate the program over the input sequence. Returns the winning
/// thread's capture table, or `None` when no thread accepts.
fn run(program: &Program, input: &[Value], depth: usize, max_depth: usize) -> Option<CaptureTable> {
    if depth > max_depth {
        log::debug!("sub-list nesting exceeded {} levels; treating as non-match", max_depth);
        return None;
    }

    let mut current: Vec<Thread> = Vec::new();
    let mut next: Vec<Thread> = Vec::new();
    let mut visited = vec![0u32; program.insts.len()];
    let mut generation: u32 = 0;

    generation += 1;
    let start = Thread { pc: 0, caps: CaptureTable::new(program.slot_count) };
    add_thread(program, &mut current, start, 0, generation, &mut visited);

    for pos in 0..=input.len() {
        if current.is_empty() {
            return None;
        }
        let elem = input.get(pos);
        generation += 1;
        for thread in current.drain(..) {
            match &program.insts[thread.pc] {
                Inst::Match { test, guards } => {
                    let Some(elem) = elem else { continue };
                    let Some(caps) = step_test(test, elem, &thread.caps, depth, max_depth) else {
                        continue;
                    };
                    if !guards.iter().all(|g| run_guard(g, elem)) {
                        continue;
                    }
                    let stepped = Thread { pc: thread.pc + 1, caps };
                    add_thread(program, &mut next, stepped, pos + 1, generation, &mut visited);
                }
                Inst::End => {
                    // Anchored match: accept only with all input consumed.
                    // Threads are in priority order, so the first accepting
                    // one is the leftmost-greedy winner.
                    if elem.is_none() {
                        return Some(thread.caps);
                    }
                }
                // `Fail`, or an epsilon opcode that was already expanded.
                _ => {}
            }
        }
        std::mem::swap(&mut current, &mut next);
    }
    None
}

/// Add a thread and everything epsilon-reachable from it, in priority
/// order. Iterative so deeply nested control flow cannot grow the call
/// stack; the generation stamp keeps each program counter to one visit.
fn add_thread(
    program: &Program,
    list: &mut Vec<Thread>,
    thread: Thread,
    pos: usize,
    generation: u32,
    visited: &mut [u32],
) {
    let mut stack = vec![thread];
    while let Some(Thread { pc, mut caps }) = stack.pop() {
        if visited[pc] == generation {
            continue;
        }
        visited[pc] = generation;
        match &program.insts[pc] {
            Inst::Jump(target) => stack.push(Thread { pc: *target, caps }),
            Inst::Split { next, alt } => {
                // The priority arm is pushed last so it is expanded first.
                stack.push(Thread { pc: *alt, caps: caps.clone() });
                stack.push(Thread { pc: *next, caps });
            }
            Inst::CaptureStart(slot) => {
                caps.open(*slot, pos);
                stack.push(Thread { pc: pc + 1, caps });
            }
            Inst::CaptureEnd(slot) => {
                caps.close(*slot, pos);
                stack.push(Thread { pc: pc + 1, caps });
            }
            Inst::Match { .. } | Inst::End | Inst::Fail => list.push(Thread { pc, caps }),
        }
    }
}

/// Apply a structural test to one element. On success returns the capture
/// table the stepped thread continues with; sub-list matches fold their
/// bindings in here.
fn step_test(
    test: &Test,
    elem: &Value,
    caps: &CaptureTable,
    depth: usize,
    max_depth: usize,
) -> Option<CaptureTable> {
    match test {
        Test::Lit(v) => (v == elem).then(|| caps.clone()),
        Test::Head(h) => (elem.head_symbol() == Some(h.as_str())).then(|| caps.clone()),
        Test::Any => Some(caps.clone()),
        Test::Sublist { program, head } => {
            if let Some(h) = head {
                if elem.head_symbol() != Some(h.as_str()) {
                    return None;
                }
            }
            let children = elem.children()?;
            let sub = run(program, children, depth + 1, max_depth)?;
            let mut merged = caps.clone();
            merged.merge_resolved(&sub, children);
            Some(merged)
        }
        Test::Elem { program } => {
            run(program, std::slice::from_ref(elem), depth + 1, max_depth).map(|_| caps.clone())
        }
        Test::Not(inner) => match step_test(inner, elem, caps, depth, max_depth) {
            Some(_) => None,
            None => Some(caps.clone()),
        },
    }
}

fn run_guard(guard: &Guard, elem: &Value) -> bool {
    run_predicate(&guard.test, &guard.label, elem)
}
