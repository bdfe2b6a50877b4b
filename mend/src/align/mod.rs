//! Correspondences between a reference and a submission program
//!
//! Alignment itself is pluggable through [`StructuralAlignment`] and
//! [`VariableAlignment`]; the localizer and synthesizer only consume the
//! resulting [`StructuralMapping`] and [`VariableMapping`].

mod name;

pub use name::NameAlignment;

use crate::model::{Loc, Program, Variable, json};
use serde::{Deserialize, Serialize};
use serde_json_any_key::any_key_map;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Alignment failure; fatal for the pair of programs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignmentError {
    #[error("Alignment failed, function sizes not equal")]
    FunctionSizesNotEqual,

    #[error("Alignment failed, same function not found")]
    SameFunctionNotFound,

    #[error("Alignment failed: {0}")]
    Failed(String),
}

/// Produces the location correspondence of two programs
pub trait StructuralAlignment {
    fn generate_structural_alignment(
        &self,
        reference: &Program,
        submission: &Program,
    ) -> Result<StructuralMapping, AlignmentError>;
}

/// Produces candidate variable bijections of two structurally aligned programs
pub trait VariableAlignment {
    fn generate_variable_alignment(
        &self,
        reference: &Program,
        submission: &Program,
        structural: &StructuralMapping,
    ) -> Result<VariableMapping, AlignmentError>;
}

/// Per function: reference location -> submission location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralMapping {
    mapping: BTreeMap<String, BTreeMap<Loc, Loc>>,
}

impl StructuralMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the location mapping of a function, returning the previous one
    pub fn put(
        &mut self,
        function: impl Into<String>,
        locations: BTreeMap<Loc, Loc>,
    ) -> Option<BTreeMap<Loc, Loc>> {
        self.mapping.insert(function.into(), locations)
    }

    /// Map a single location
    pub fn insert(&mut self, function: impl Into<String>, reference: Loc, submission: Loc) {
        self.mapping
            .entry(function.into())
            .or_default()
            .insert(reference, submission);
    }

    pub fn mapping(&self, function: &str) -> Option<&BTreeMap<Loc, Loc>> {
        self.mapping.get(function)
    }

    /// Submission location matching `loc` of the reference
    pub fn matching_loc(&self, function: &str, loc: Loc) -> Option<Loc> {
        self.mapping.get(function)?.get(&loc).copied()
    }

    pub fn all(&self) -> &BTreeMap<String, BTreeMap<Loc, Loc>> {
        &self.mapping
    }
}

impl fmt::Display for StructuralMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (function, locs)) in self.mapping.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let pairs: Vec<String> = locs.iter().map(|(r, s)| format!("{r}={s}")).collect();
            write!(f, "{function}={{{}}}", pairs.join(", "))?;
        }
        write!(f, "}}")
    }
}

/// One candidate bijection: reference variable -> submission variable.
///
/// Keys compare by unprimed name, like [`Variable`] itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBijection(#[serde(with = "any_key_map")] BTreeMap<Variable, Variable>);

impl VariableBijection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: Variable, submission: Variable) -> Option<Variable> {
        self.0.insert(reference, submission)
    }

    pub fn get(&self, reference: &Variable) -> Option<&Variable> {
        self.0.get(reference)
    }

    /// Lookup by printed name; a trailing `'` is ignored
    pub fn get_by_name(&self, name: &str) -> Option<&Variable> {
        self.0.get(&Variable::parse(name))
    }

    pub fn contains(&self, reference: &Variable) -> bool {
        self.0.contains_key(reference)
    }

    /// Pairs in reference-variable order
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Variable)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Variable, Variable)> for VariableBijection {
    fn from_iter<I: IntoIterator<Item = (Variable, Variable)>>(iter: I) -> Self {
        VariableBijection(iter.into_iter().collect())
    }
}

impl fmt::Display for VariableBijection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|(r, s)| format!("{r}={s}")).collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// Per function: candidate bijections, best first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableMapping {
    mappings: BTreeMap<String, Vec<VariableBijection>>,
}

impl VariableMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate for `function`
    pub fn add(&mut self, function: impl Into<String>, bijection: VariableBijection) {
        self.mappings.entry(function.into()).or_default().push(bijection);
    }

    /// Replace all candidates of `function`, returning the previous ones
    pub fn put(
        &mut self,
        function: impl Into<String>,
        bijections: Vec<VariableBijection>,
    ) -> Option<Vec<VariableBijection>> {
        self.mappings.insert(function.into(), bijections)
    }

    /// Candidates of `function`; empty when none were produced
    pub fn mappings(&self, function: &str) -> &[VariableBijection] {
        self.mappings.get(function).map_or(&[], Vec::as_slice)
    }

    pub fn all(&self) -> &BTreeMap<String, Vec<VariableBijection>> {
        &self.mappings
    }

    pub fn top_mapping(&self, function: &str) -> Option<&VariableBijection> {
        self.mappings(function).first()
    }

    /// Submission counterparts of `variable` across all candidates of `function`
    pub fn matching_variables(&self, function: &str, variable: &Variable) -> Vec<&Variable> {
        self.mappings(function)
            .iter()
            .filter_map(|bijection| bijection.get(variable))
            .collect()
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        json::to_string(self)
    }
}

impl StructuralMapping {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        json::to_string(self)
    }
}

impl fmt::Display for VariableMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (function, bijections)) in self.mappings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let items: Vec<String> = bijections.iter().map(ToString::to_string).collect();
            write!(f, "{function}=[{}]", items.join(", "))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bijection(pairs: &[(&str, &str)]) -> VariableBijection {
        pairs
            .iter()
            .map(|(r, s)| (Variable::new(*r), Variable::new(*s)))
            .collect()
    }

    #[test]
    fn test_structural_mapping() {
        let mut mapping = StructuralMapping::new();
        mapping.insert("main", 1, 1);
        mapping.insert("main", 2, 3);
        assert_eq!(mapping.matching_loc("main", 2), Some(3));
        assert_eq!(mapping.matching_loc("main", 9), None);
        assert_eq!(mapping.matching_loc("helper", 1), None);
        assert_eq!(mapping.to_string(), "{main={1=1, 2=3}}");
    }

    #[test]
    fn test_structural_mapping_json() {
        let mut mapping = StructuralMapping::new();
        mapping.put("main", BTreeMap::from([(1, 1), (2, 2)]));
        let json = mapping.to_json().unwrap();
        assert_eq!(json, r#"{"main":{"1":1,"2":2}}"#);
        assert_eq!(StructuralMapping::from_json(&json).unwrap(), mapping);
    }

    #[test]
    fn test_variable_mapping() {
        let mut mapping = VariableMapping::new();
        mapping.add("main", bijection(&[("a", "x"), ("b", "y")]));
        mapping.add("main", bijection(&[("a", "y"), ("b", "x")]));

        assert_eq!(mapping.mappings("main").len(), 2);
        assert!(mapping.mappings("helper").is_empty());
        assert_eq!(mapping.top_mapping("main").unwrap().get_by_name("a'").unwrap().name(), "x");
        let matches: Vec<String> = mapping
            .matching_variables("main", &Variable::new("a"))
            .into_iter()
            .map(Variable::name)
            .collect();
        assert_eq!(matches, vec!["x", "y"]);
    }

    #[test]
    fn test_variable_mapping_json_round_trip() {
        let mut mapping = VariableMapping::new();
        mapping.add("main", bijection(&[("$ret", "$ret"), ("a", "x")]));
        let json = mapping.to_json().unwrap();
        assert_eq!(VariableMapping::from_json(&json).unwrap(), mapping);
    }

    #[test]
    fn test_alignment_error_messages() {
        assert_eq!(
            AlignmentError::FunctionSizesNotEqual.to_string(),
            "Alignment failed, function sizes not equal"
        );
        assert_eq!(
            AlignmentError::SameFunctionNotFound.to_string(),
            "Alignment failed, same function not found"
        );
    }
}
