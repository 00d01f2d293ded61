use std::sync::Arc;

use vela_core::value::Value;

use crate::Bindings;

/// State of one capture slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Capture {
    /// Opened, not yet closed.
    Open { start: usize },
    /// Half-open span over the sequence being matched.
    Span { start: usize, end: usize },
    /// Binding already materialized against a sub-list's child sequence.
    /// `None` records a deliberately empty capture.
    Resolved(Option<Value>),
}

/// Slot table shared between simulation threads. Cloning is an `Arc` bump;
/// mutation goes through `Arc::make_mut`, which writes in place when this
/// table is the sole owner and clones the storage first otherwise.
#[derive(Debug, Clone, Default)]
pub struct CaptureTable {
    slots: Arc<Vec<Option<Capture>>>,
}

impl CaptureTable {
    pub fn new(slot_count: usize) -> Self {
        Self { slots: Arc::new(vec![None; slot_count]) }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Capture> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn open(&mut self, slot: usize, pos: usize) {
        Arc::make_mut(&mut self.slots)[slot] = Some(Capture::Open { start: pos });
    }

    pub fn close(&mut self, slot: usize, pos: usize) {
        let slots = Arc::make_mut(&mut self.slots);
        if let Some(Capture::Open { start }) = slots[slot] {
            slots[slot] = Some(Capture::Span { start, end: pos });
        }
    }

    pub fn set_resolved(&mut self, slot: usize, value: Option<Value>) {
        Arc::make_mut(&mut self.slots)[slot] = Some(Capture::Resolved(value));
    }

    /// Turn one closed slot into its bound value against the sequence the
    /// slot indexes. Zero captured elements bind nothing, one binds the
    /// element itself, several bind a list preserving order. `None` when the
    /// slot is unset or was never closed.
    pub fn materialize(&self, slot: usize, input: &[Value]) -> Option<Option<Value>> {
        match self.get(slot)? {
            Capture::Open { .. } => None,
            Capture::Span { start, end } => match end - start {
                0 => Some(None),
                1 => Some(Some(input[*start].clone())),
                _ => Some(Some(Value::List(input[*start..*end].to_vec()))),
            },
            Capture::Resolved(v) => Some(v.clone()),
        }
    }

    /// Copy every materialized slot of a completed sub-list match into this
    /// table. Sub-spans are resolved against the child sequence here, so
    /// they can never be re-read against the enclosing sequence.
    pub fn merge_resolved(&mut self, sub: &CaptureTable, child_input: &[Value]) {
        for slot in 0..sub.len() {
            if let Some(value) = sub.materialize(slot, child_input) {
                self.set_resolved(slot, value);
            }
        }
    }

    /// Build the final name -> value map. Groups are visited in slot order,
    /// so with a name shared across levels the later-numbered slot wins.
    pub fn bindings(&self, groups: &[(usize, String)], input: &[Value]) -> Bindings {
        let mut out = Bindings::new();
        for (slot, name) in groups {
            // An empty capture materializes to `None` and stays absent.
            if let Some(Some(value)) = self.materialize(*slot, input) {
                out.insert(name.clone(), value);
            }
        }
        out
    }
}
