//! Error localization: where do reference and submission runs diverge?
//!
//! Both programs run on the same inputs. The reference trace is walked in
//! order; each visit is paired with the next unconsumed visit of the
//! structurally matching submission location, and the mapped variables of
//! the two memories are compared.

use crate::align::{StructuralMapping, VariableBijection, VariableMapping};
use crate::error::Result;
use crate::interp::{Interpreter, Trace, TraceEntry};
use crate::model::{Input, Loc, Program, Variable};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Why a reference location has no submission counterpart
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnmatchedCause {
    #[error("function `{0}` has no structural mapping")]
    MissingFunction(String),

    #[error("location {loc} of `{function}` has no structural counterpart")]
    MissingLocation { function: String, loc: Loc },
}

/// What diverged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationKind {
    /// Mapped variables hold different values; the reference-side variables
    /// are listed in bijection order
    VariableValueMismatch(Vec<Variable>),
    /// The submission visited the matching location fewer times
    TraceEntryMismatch,
    /// The reference location has no structural counterpart
    UnmatchedException(UnmatchedCause),
}

/// One divergence between the two runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    pub kind: LocationKind,
    pub ref_loc: Loc,
    pub sub_loc: Option<Loc>,
    /// Input of the run that exposed it
    pub input: Option<Input>,
}

impl ErrorLocation {
    pub fn variable_mismatch(ref_loc: Loc, sub_loc: Loc, variables: Vec<Variable>) -> Self {
        ErrorLocation {
            kind: LocationKind::VariableValueMismatch(variables),
            ref_loc,
            sub_loc: Some(sub_loc),
            input: None,
        }
    }

    pub fn trace_entry_mismatch(ref_loc: Loc, sub_loc: Loc) -> Self {
        ErrorLocation {
            kind: LocationKind::TraceEntryMismatch,
            ref_loc,
            sub_loc: Some(sub_loc),
            input: None,
        }
    }

    pub fn unmatched(ref_loc: Loc, sub_loc: Option<Loc>, cause: UnmatchedCause) -> Self {
        ErrorLocation {
            kind: LocationKind::UnmatchedException(cause),
            ref_loc,
            sub_loc,
            input: None,
        }
    }

    pub fn with_input(mut self, input: Input) -> Self {
        self.input = Some(input);
        self
    }

    /// Reference variables with mismatching values; empty for other kinds
    pub fn erroneous_variables(&self) -> &[Variable] {
        match &self.kind {
            LocationKind::VariableValueMismatch(vars) => vars,
            _ => &[],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LocationKind::VariableValueMismatch(_) => "VariableValueMismatch",
            LocationKind::TraceEntryMismatch => "TraceEntryMismatch",
            LocationKind::UnmatchedException(_) => "UnmatchedException",
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sub = self
            .sub_loc
            .map_or_else(|| "None".to_string(), |l| l.to_string());
        write!(f, "{} at reference {} / submission {sub}", self.kind_name(), self.ref_loc)?;
        match &self.kind {
            LocationKind::VariableValueMismatch(vars) => {
                let names: Vec<String> = vars.iter().map(Variable::name).collect();
                write!(f, ": [{}]", names.join(", "))?;
            }
            LocationKind::UnmatchedException(cause) => write!(f, ": {cause}")?,
            LocationKind::TraceEntryMismatch => {}
        }
        if let Some(input) = &self.input {
            write!(f, " for {input}")?;
        }
        Ok(())
    }
}

/// Error locations of one variable mapping candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLocations {
    pub bijection: VariableBijection,
    pub locations: Vec<ErrorLocation>,
}

/// Error locations indexed by function, then by candidate position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocalisation {
    functions: BTreeMap<String, Vec<CandidateLocations>>,
}

impl ErrorLocalisation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate of `function`; returns its index
    pub fn add_candidate(&mut self, function: impl Into<String>, bijection: VariableBijection) -> usize {
        let candidates = self.functions.entry(function.into()).or_default();
        candidates.push(CandidateLocations {
            bijection,
            locations: Vec::new(),
        });
        candidates.len() - 1
    }

    /// Record a location for a registered candidate; unknown candidates are ignored
    pub fn add_location(&mut self, function: &str, candidate: usize, location: ErrorLocation) {
        if let Some(entry) = self
            .functions
            .get_mut(function)
            .and_then(|c| c.get_mut(candidate))
        {
            entry.locations.push(location);
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn candidates(&self, function: &str) -> &[CandidateLocations] {
        self.functions.get(function).map_or(&[], Vec::as_slice)
    }

    pub fn error_locations(&self, function: &str, candidate: usize) -> &[ErrorLocation] {
        self.candidates(function)
            .get(candidate)
            .map_or(&[], |c| c.locations.as_slice())
    }

    /// Total number of recorded locations
    pub fn len(&self) -> usize {
        self.functions
            .values()
            .flatten()
            .map(|c| c.locations.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for ErrorLocalisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (function, candidates) in &self.functions {
            for (i, candidate) in candidates.iter().enumerate() {
                writeln!(f, "{function} #{i} {}", candidate.bijection)?;
                for location in &candidate.locations {
                    writeln!(f, "  {location}")?;
                }
            }
        }
        Ok(())
    }
}

/// Compares reference and submission traces under each variable mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorLocalizer;

impl ErrorLocalizer {
    pub fn new() -> Self {
        ErrorLocalizer
    }

    /// Localize errors of `function` for every candidate of `variables` and every input.
    ///
    /// `function` must exist in the reference. A missing entry function or a
    /// malformed program is an error too; a truncated trace is not.
    #[allow(clippy::too_many_arguments)]
    pub fn localize_errors(
        &self,
        submission: &Program,
        reference: &Program,
        inputs: &[Input],
        function: &str,
        structural: &StructuralMapping,
        variables: &VariableMapping,
        interpreter: &Interpreter,
    ) -> Result<ErrorLocalisation> {
        reference.require_function(function)?;
        let mut runs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let ref_trace = interpreter.execute_program(reference, input)?;
            let sub_trace = interpreter.execute_program(submission, input)?;
            debug!(
                "{input}: {} reference / {} submission entries",
                ref_trace.len(),
                sub_trace.len()
            );
            runs.push((input, ref_trace, sub_trace));
        }

        let mut localisation = ErrorLocalisation::new();
        for bijection in variables.mappings(function) {
            let candidate = localisation.add_candidate(function, bijection.clone());
            for (input, ref_trace, sub_trace) in &runs {
                let found = compare_traces(function, ref_trace, sub_trace, structural, bijection);
                for location in found {
                    debug!("{function} #{candidate}: {location}");
                    localisation.add_location(function, candidate, location.with_input((*input).clone()));
                }
            }
        }
        Ok(localisation)
    }
}

/// Walk the reference trace of `function`; stops at the first structural
/// or iteration-count divergence
fn compare_traces(
    function: &str,
    ref_trace: &Trace,
    sub_trace: &Trace,
    structural: &StructuralMapping,
    bijection: &VariableBijection,
) -> Vec<ErrorLocation> {
    let mut found = Vec::new();
    let mut cursor = sub_trace.cursor();
    for entry in ref_trace.entries_in(function) {
        let ref_loc = entry.location;
        let Some(sub_loc) = structural.matching_loc(function, ref_loc) else {
            let cause = if structural.mapping(function).is_none() {
                UnmatchedCause::MissingFunction(function.to_string())
            } else {
                UnmatchedCause::MissingLocation {
                    function: function.to_string(),
                    loc: ref_loc,
                }
            };
            found.push(ErrorLocation::unmatched(ref_loc, None, cause));
            break;
        };
        let Some(sub_entry) = cursor.next_unique(function, sub_loc) else {
            found.push(ErrorLocation::trace_entry_mismatch(ref_loc, sub_loc));
            break;
        };
        let mismatching = mismatching_variables(entry, sub_entry, bijection);
        if !mismatching.is_empty() {
            found.push(ErrorLocation::variable_mismatch(ref_loc, sub_loc, mismatching));
        }
    }
    found
}

/// Reference variables whose value differs from their counterpart's.
/// Two missing values are equal.
fn mismatching_variables(
    ref_entry: &TraceEntry,
    sub_entry: &TraceEntry,
    bijection: &VariableBijection,
) -> Vec<Variable> {
    bijection
        .iter()
        .filter(|(r, s)| {
            ref_entry.memory.get(r.unprimed_name()) != sub_entry.memory.get(s.unprimed_name())
        })
        .map(|(r, _)| r.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{Memory, Value};

    fn entry(loc: Loc, pairs: &[(&str, i64)]) -> TraceEntry {
        let memory: Memory = pairs
            .iter()
            .map(|(n, v)| (n.to_string(), Value::Int(*v)))
            .collect();
        TraceEntry {
            function: "main".to_string(),
            location: loc,
            memory,
        }
    }

    fn trace(entries: Vec<TraceEntry>) -> Trace {
        let mut trace = Trace::new();
        for e in entries {
            trace.push(e.function, e.location, e.memory);
        }
        trace
    }

    fn identity(locs: &[Loc]) -> StructuralMapping {
        let mut mapping = StructuralMapping::new();
        for loc in locs {
            mapping.insert("main", *loc, *loc);
        }
        mapping
    }

    fn bijection(names: &[&str]) -> VariableBijection {
        names
            .iter()
            .map(|n| (Variable::new(*n), Variable::new(*n)))
            .collect()
    }

    #[test]
    fn test_value_mismatch_lists_reference_variables() {
        let r = trace(vec![entry(1, &[("x", 1), ("y", 2)])]);
        let s = trace(vec![entry(1, &[("x", 1), ("y", 6)])]);
        let found = compare_traces("main", &r, &s, &identity(&[1]), &bijection(&["x", "y"]));
        assert_eq!(found, vec![ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")])]);
    }

    #[test]
    fn test_missing_values_compare_equal() {
        let r = trace(vec![entry(1, &[("x", 1)])]);
        let s = trace(vec![entry(1, &[("x", 1)])]);
        let found = compare_traces("main", &r, &s, &identity(&[1]), &bijection(&["x", "z"]));
        assert!(found.is_empty());
    }

    #[test]
    fn test_exhausted_submission_stops_walk() {
        let r = trace(vec![entry(1, &[]), entry(2, &[]), entry(2, &[]), entry(3, &[("x", 1)])]);
        let s = trace(vec![entry(1, &[]), entry(2, &[]), entry(3, &[("x", 2)])]);
        let found = compare_traces("main", &r, &s, &identity(&[1, 2, 3]), &bijection(&["x"]));
        assert_eq!(found, vec![ErrorLocation::trace_entry_mismatch(2, 2)]);
    }

    #[test]
    fn test_unmatched_location() {
        let r = trace(vec![entry(1, &[]), entry(2, &[])]);
        let s = trace(vec![entry(1, &[]), entry(2, &[])]);
        let found = compare_traces("main", &r, &s, &identity(&[1]), &bijection(&[]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ref_loc, 2);
        assert_eq!(found[0].sub_loc, None);
        assert!(matches!(
            found[0].kind,
            LocationKind::UnmatchedException(UnmatchedCause::MissingLocation { loc: 2, .. })
        ));

        let found = compare_traces("main", &r, &s, &StructuralMapping::new(), &bijection(&[]));
        assert!(matches!(
            found[0].kind,
            LocationKind::UnmatchedException(UnmatchedCause::MissingFunction(_))
        ));
    }

    #[test]
    fn test_localisation_index() {
        let mut localisation = ErrorLocalisation::new();
        let a = localisation.add_candidate("main", bijection(&["x"]));
        let b = localisation.add_candidate("main", bijection(&["x"]));
        localisation.add_location("main", b, ErrorLocation::trace_entry_mismatch(1, 1));
        localisation.add_location("main", 7, ErrorLocation::trace_entry_mismatch(1, 1));
        assert_eq!(localisation.candidates("main").len(), 2);
        assert!(localisation.error_locations("main", a).is_empty());
        assert_eq!(localisation.error_locations("main", b).len(), 1);
        assert_eq!(localisation.len(), 1);
        assert!(localisation.error_locations("helper", 0).is_empty());
    }

    #[test]
    fn test_error_location_display() {
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")])
            .with_input(Input::from_stream("4"));
        assert_eq!(
            location.to_string(),
            "VariableValueMismatch at reference 1 / submission 1: [y] for Input{inputs=[\"4\"], args=[]}"
        );
    }
}
