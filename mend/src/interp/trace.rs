//! Memories and execution traces

use super::value::Value;
use crate::model::Loc;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Variable name -> current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Memory(BTreeMap<String, Value>);

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Memory {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Memory(iter.into_iter().collect())
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

/// One visit of a block: where, and the memory right after the block ran
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub function: String,
    pub location: Loc,
    pub memory: Memory,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(fnc={}, loc={}, mem={})",
            self.function, self.location, self.memory
        )
    }
}

/// Ordered record of every block visit of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    entries: Vec<TraceEntry>,
    truncated: bool,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, function: impl Into<String>, location: Loc, memory: Memory) {
        self.entries.push(TraceEntry {
            function: function.into(),
            location,
            memory,
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TraceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The run stopped on its step or time budget
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    /// Visits of `loc` in `function`, in execution order
    pub fn entries_at<'a>(
        &'a self,
        function: &'a str,
        loc: Loc,
    ) -> impl Iterator<Item = &'a TraceEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.function == function && e.location == loc)
    }

    /// Visits of blocks in `function`, in execution order
    pub fn entries_in<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a TraceEntry> + 'a {
        self.entries.iter().filter(move |e| e.function == function)
    }

    pub fn last_entry(&self) -> Option<&TraceEntry> {
        self.entries.last()
    }

    /// Value of a variable after the run, read from the last entry
    pub fn final_value(&self, name: &str) -> Option<&Value> {
        self.last_entry().and_then(|e| e.memory.get(name))
    }

    /// Cursor handing out each entry at most once
    pub fn cursor(&self) -> TraceCursor<'_> {
        TraceCursor::new(self)
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceEntry;
    type IntoIter = std::slice::Iter<'a, TraceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trace [")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{entry}")?;
        }
        write!(f, "]")?;
        if self.truncated {
            write!(f, " (truncated)")?;
        }
        Ok(())
    }
}

/// One-shot lookup over a trace.
///
/// Each call returns the next not-yet-returned visit of the requested block,
/// so two lookups of the same block yield its first and second visits.
#[derive(Debug, Clone)]
pub struct TraceCursor<'a> {
    trace: &'a Trace,
    next: HashMap<(String, Loc), usize>,
}

impl<'a> TraceCursor<'a> {
    pub fn new(trace: &'a Trace) -> Self {
        TraceCursor {
            trace,
            next: HashMap::new(),
        }
    }

    /// Next unconsumed visit of `loc` in `function`
    pub fn next_unique(&mut self, function: &str, loc: Loc) -> Option<&'a TraceEntry> {
        let key = (function.to_string(), loc);
        let start = self.next.get(&key).copied().unwrap_or(0);
        let trace: &'a Trace = self.trace;
        let (index, entry) = trace
            .entries
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, e)| e.function == function && e.location == loc)?;
        self.next.insert(key, index + 1);
        Some(entry)
    }

    /// Forget what was handed out
    pub fn reset(&mut self) {
        self.next.clear();
    }
}
