/// Injectable randomness and instance-id generation.

use rand::rngs::StdRng;
use rand::Rng;

use crate::schema::block::InstanceId;

/// A source of uniform floats in `[0, 1)`.
///
/// Layout and repair draw all of their randomness through this trait so
/// tests can substitute a seeded generator or a scripted sequence.
pub trait RandomSource {
    fn next_uniform(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
///
/// An empty script always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Uniformly pick one element, or `None` for an empty slice.
pub fn pick<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let i = (rng.next_uniform() * items.len() as f64).floor() as usize;
    items.get(i.min(items.len() - 1))
}

/// Monotonic instance-id counter, owned by whoever creates instances.
///
/// The counter saturates at `u64::MAX`: once an id that large has been
/// seen or handed out, every further id is `u64::MAX`.
#[derive(Debug, Clone, Default)]
pub struct InstanceIdGenerator {
    next: u64,
}

impl InstanceIdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start after the largest id already present, so ids stay unique
    /// when extending an existing layout.
    pub fn starting_after(max_existing: u64) -> Self {
        Self {
            next: max_existing.saturating_add(1),
        }
    }

    /// Make sure the next id is above `existing`.
    pub fn advance_past(&mut self, existing: InstanceId) {
        self.next = self.next.max(existing.0.saturating_add(1));
    }

    pub fn next_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next.max(1));
        self.next = id.0.saturating_add(1);
        id
    }
}
