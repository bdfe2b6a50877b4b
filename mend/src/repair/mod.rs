//! Repair synthesis: turn error locations into concrete assignment edits
//!
//! Each variable mapping candidate is repaired independently. A candidate
//! whose rewrite cannot be completed is dropped; the others still produce
//! their [`RepairCandidate`].

mod distance;

pub use distance::{repair_cost, tree_distance};

use crate::align::{VariableBijection, VariableMapping};
use crate::localize::{ErrorLocalisation, ErrorLocation, LocationKind};
use crate::model::names::{OP_FUNC_CALL, is_reserved};
use crate::model::{Expression, Function, Loc, ModelError, Operation, Program, VarKey, Variable};
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// The edit a local repair applies to one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    Change { old: Expression, new: Expression },
    Add { new: Expression },
    Delete { old: Expression },
}

/// One edit of one submission variable at one location
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRepair {
    /// Candidate mapping the edit was derived under
    pub bijection: VariableBijection,
    pub cost: f64,
    /// Submission variable being repaired
    pub variable: Variable,
    pub action: RepairAction,
    pub function: String,
    pub ref_loc: Loc,
    pub sub_loc: Loc,
}

impl LocalRepair {
    /// Current submission expression, if any
    pub fn old(&self) -> Option<&Expression> {
        match &self.action {
            RepairAction::Change { old, .. } | RepairAction::Delete { old } => Some(old),
            RepairAction::Add { .. } => None,
        }
    }

    /// Replacement expression, if any
    pub fn new_expr(&self) -> Option<&Expression> {
        match &self.action {
            RepairAction::Change { new, .. } | RepairAction::Add { new } => Some(new),
            RepairAction::Delete { .. } => None,
        }
    }
}

impl fmt::Display for LocalRepair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let var = self.variable.unprimed_name();
        match &self.action {
            RepairAction::Change { old, new } => write!(
                f,
                "Change {var} = {} to {var} = {}",
                old.pretty(),
                new.pretty()
            )?,
            RepairAction::Add { new } => write!(f, "Add {var} = {}", new.pretty())?,
            RepairAction::Delete { old } => write!(f, "Delete {var} = {}", old.pretty())?,
        }
        write!(f, " at location {}", self.sub_loc)
    }
}

/// One line per repair, no trailing newline
pub fn format_repairs(repairs: &[LocalRepair]) -> String {
    repairs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Consistent set of local repairs for one variable mapping candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairCandidate {
    local_repairs: Vec<LocalRepair>,
}

impl RepairCandidate {
    pub fn new(local_repairs: Vec<LocalRepair>) -> Self {
        RepairCandidate { local_repairs }
    }

    pub fn local_repairs(&self) -> &[LocalRepair] {
        &self.local_repairs
    }

    pub fn add_local_repair(&mut self, repair: LocalRepair) {
        self.local_repairs.push(repair);
    }

    /// Sum of the local repair costs
    pub fn cost(&self) -> f64 {
        self.local_repairs.iter().map(|r| r.cost).sum()
    }

    pub fn len(&self) -> usize {
        self.local_repairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_repairs.is_empty()
    }
}

impl fmt::Display for RepairCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_repairs(&self.local_repairs))
    }
}

/// Produces repair candidates from localized errors
pub trait Repair {
    fn repair(
        &self,
        reference: &Program,
        submission: &Program,
        localisation: &ErrorLocalisation,
        variables: &VariableMapping,
    ) -> Vec<RepairCandidate>;
}

/// Why a candidate was dropped
#[derive(Debug, Error)]
enum SynthesisError {
    #[error("variable `{0}` has no counterpart in the mapping")]
    Unresolved(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Rewrites reference assignments into the submission's variable space
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairSynthesizer;

impl RepairSynthesizer {
    pub fn new() -> Self {
        RepairSynthesizer
    }
}

impl Repair for RepairSynthesizer {
    fn repair(
        &self,
        reference: &Program,
        submission: &Program,
        localisation: &ErrorLocalisation,
        variables: &VariableMapping,
    ) -> Vec<RepairCandidate> {
        let mut candidates = Vec::new();
        for function in localisation.functions() {
            let (Some(ref_fnc), Some(sub_fnc)) =
                (reference.function(function), submission.function(function))
            else {
                debug!("`{function}` is missing from one of the programs, nothing to repair");
                continue;
            };
            let stored = localisation.candidates(function);
            if stored.len() != variables.mappings(function).len() {
                debug!(
                    "`{function}` was localized under {} candidate(s), the mapping now has {}",
                    stored.len(),
                    variables.mappings(function).len()
                );
            }
            for (index, candidate) in stored.iter().enumerate() {
                let (bijection, locations) = (&candidate.bijection, candidate.locations.as_slice());
                match repair_candidate(ref_fnc, sub_fnc, bijection, locations) {
                    Ok(repairs) if repairs.is_empty() => {}
                    Ok(repairs) => candidates.push(RepairCandidate::new(repairs)),
                    Err(err) => debug!("dropping candidate #{index} of `{function}`: {err}"),
                }
            }
        }
        candidates
    }
}

fn repair_candidate(
    reference: &Function,
    submission: &Function,
    bijection: &VariableBijection,
    locations: &[ErrorLocation],
) -> Result<Vec<LocalRepair>, SynthesisError> {
    let mut repairs = Vec::new();
    let mut seen: BTreeSet<(VarKey, Loc, Loc)> = BTreeSet::new();

    for location in locations {
        let (ref_loc, sub_loc) = match (&location.kind, location.sub_loc) {
            (LocationKind::UnmatchedException(_), _) | (_, None) => continue,
            (_, Some(sub_loc)) => (location.ref_loc, sub_loc),
        };
        let pairs = match &location.kind {
            LocationKind::VariableValueMismatch(vars) => vars
                .iter()
                .map(|r| Ok((r.clone(), resolve(bijection, r)?)))
                .collect::<Result<Vec<_>, SynthesisError>>()?,
            _ => assigned_pairs(reference, submission, bijection, ref_loc, sub_loc)?,
        };

        for (ref_var, sub_var) in pairs {
            if !seen.insert((sub_var.key(), ref_loc, sub_loc)) {
                continue;
            }
            let old = submission
                .assigned_expr(sub_loc, sub_var.unprimed_name())?
                .cloned();
            let new = reference
                .assigned_expr(ref_loc, ref_var.unprimed_name())?
                .map(|expr| rewrite(expr, bijection))
                .transpose()?;
            let cost = repair_cost(old.as_ref(), new.as_ref());
            let action = match (old, new) {
                (Some(old), Some(new)) if old != new => RepairAction::Change { old, new },
                (None, Some(new)) => RepairAction::Add { new },
                (Some(old), None) => RepairAction::Delete { old },
                _ => continue,
            };
            repairs.push(LocalRepair {
                bijection: bijection.clone(),
                cost,
                variable: sub_var.to_unprimed(),
                action,
                function: reference.name().to_string(),
                ref_loc,
                sub_loc,
            });
        }
    }
    Ok(repairs)
}

/// Submission counterpart of a reference variable; reserved names map to themselves
fn resolve(bijection: &VariableBijection, var: &Variable) -> Result<Variable, SynthesisError> {
    match bijection.get(var) {
        Some(mapped) => Ok(mapped.clone()),
        None if is_reserved(var.unprimed_name()) => Ok(var.clone()),
        None => Err(SynthesisError::Unresolved(var.name())),
    }
}

/// Reference expression in submission variables, primed; callee names are kept
fn rewrite(expr: &Expression, bijection: &VariableBijection) -> Result<Expression, SynthesisError> {
    match expr {
        Expression::Constant(_) => Ok(expr.clone()),
        Expression::Variable(var) => {
            let mapped = resolve(bijection, var)?;
            Ok(Expression::Variable(mapped.to_primed().at_line(var.line())))
        }
        Expression::Operation(op) => {
            let (callee, rest) = match op.args.split_first() {
                Some((callee, rest)) if op.name == OP_FUNC_CALL => (Some(callee.clone()), rest),
                _ => (None, op.args.as_slice()),
            };
            let mut args: Vec<Expression> = callee.into_iter().collect();
            for arg in rest {
                args.push(rewrite(arg, bijection)?);
            }
            Ok(Expression::Operation(Operation::new(op.name.clone(), args, op.line)))
        }
    }
}

/// Every mapped pair assigned at either location, plus unmapped reserved
/// variables assigned there
fn assigned_pairs(
    reference: &Function,
    submission: &Function,
    bijection: &VariableBijection,
    ref_loc: Loc,
    sub_loc: Loc,
) -> Result<Vec<(Variable, Variable)>, SynthesisError> {
    let ref_assigned: BTreeSet<&str> = reference.exprs(ref_loc)?.iter().map(|(v, _)| v.as_str()).collect();
    let sub_assigned: BTreeSet<&str> = submission.exprs(sub_loc)?.iter().map(|(v, _)| v.as_str()).collect();

    let mut pairs: Vec<(Variable, Variable)> = bijection
        .iter()
        .filter(|(r, s)| {
            ref_assigned.contains(r.unprimed_name()) || sub_assigned.contains(s.unprimed_name())
        })
        .map(|(r, s)| (r.clone(), s.clone()))
        .collect();
    for name in ref_assigned.union(&sub_assigned) {
        let var = Variable::new(*name);
        if is_reserved(name) && !bijection.contains(&var) {
            pairs.push((var.clone(), var));
        }
    }
    Ok(pairs)
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

    fn single_block(assignments: &[(&str, Expression)]) -> Function {
        let mut f = Function::new("main", vec![], "int");
        let loc = f.add_location(None, "the beginning of main");
        for (var, expr) in assignments {
            f.add_expr(loc, *var, expr.clone()).unwrap();
        }
        f
    }

    fn plus(l: Expression, r: Expression) -> Expression {
        Expression::binary("+", l, r)
    }

    #[test]
    fn test_change_prints_reference_expression() {
        let reference = single_block(&[("y", plus(Expression::constant("1"), Expression::var("x")))]);
        let submission = single_block(&[("y", plus(Expression::constant("5"), Expression::var("x")))]);
        let map = bijection(&[("x", "x"), ("y", "y")]);
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")]);

        let repairs = repair_candidate(&reference, &submission, &map, &[location]).unwrap();
        assert_eq!(repairs.len(), 1);
        assert_eq!(repairs[0].to_string(), "Change y = 5 + x to y = 1 + x at location 1");
        assert_eq!(repairs[0].cost, 1.0);

        let new = repairs[0].new_expr().unwrap().as_operation().unwrap();
        assert_eq!(new.args[0], Expression::constant("1"));
        assert!(new.args[1].as_variable().unwrap().is_primed());
        assert_eq!(new.args[1].as_variable().unwrap().name(), "x'");
    }

    #[test]
    fn test_add_and_delete() {
        let reference = single_block(&[("y", Expression::var("x"))]);
        let submission = single_block(&[("z", Expression::constant("0"))]);
        let map = bijection(&[("x", "x"), ("y", "y"), ("w", "z")]);
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("w"), Variable::new("y")]);

        let repairs = repair_candidate(&reference, &submission, &map, &[location]).unwrap();
        assert_eq!(
            format_repairs(&repairs),
            "Delete z = 0 at location 1\nAdd y = x at location 1"
        );
    }

    #[test]
    fn test_renamed_variables_are_rewritten() {
        let reference = single_block(&[("b", plus(Expression::var("a"), Expression::constant("1")))]);
        let submission = single_block(&[("y", plus(Expression::var("x"), Expression::constant("2")))]);
        let map = bijection(&[("a", "x"), ("b", "y")]);
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("b")]);

        let repairs = repair_candidate(&reference, &submission, &map, &[location]).unwrap();
        assert_eq!(repairs[0].to_string(), "Change y = x + 2 to y = x + 1 at location 1");
    }

    #[test]
    fn test_unresolved_variable_drops_candidate() {
        let reference = single_block(&[("y", plus(Expression::var("t"), Expression::constant("1")))]);
        let submission = single_block(&[("y", Expression::constant("0"))]);
        let map = bijection(&[("y", "y")]);
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")]);

        let err = repair_candidate(&reference, &submission, &map, &[location]).unwrap_err();
        assert!(matches!(err, SynthesisError::Unresolved(name) if name == "t"));
    }

    #[test]
    fn test_reserved_variables_map_to_themselves() {
        let cond = |bound: &str| {
            Expression::binary("<", Expression::var("i"), Expression::constant(bound))
        };
        let reference = single_block(&[("$cond", cond("10"))]);
        let submission = single_block(&[("$cond", cond("9"))]);
        let map = bijection(&[("i", "i")]);
        let location = ErrorLocation::trace_entry_mismatch(1, 1);

        let repairs = repair_candidate(&reference, &submission, &map, &[location]).unwrap();
        assert_eq!(format_repairs(&repairs), "Change $cond = i < 9 to $cond = i < 10 at location 1");
    }

    #[test]
    fn test_duplicates_and_unmatched_are_skipped() {
        let reference = single_block(&[("y", Expression::constant("1"))]);
        let submission = single_block(&[("y", Expression::constant("2"))]);
        let map = bijection(&[("y", "y")]);
        let mismatch = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")]);
        let unmatched = ErrorLocation::unmatched(
            2,
            None,
            crate::localize::UnmatchedCause::MissingFunction("main".into()),
        );

        let repairs = repair_candidate(
            &reference,
            &submission,
            &map,
            &[mismatch.clone(), unmatched, mismatch],
        )
        .unwrap();
        assert_eq!(repairs.len(), 1);
    }

    #[test]
    fn test_callee_names_are_not_rewritten() {
        let call = |name: &str, arg: Expression| {
            Expression::op(OP_FUNC_CALL, vec![Expression::var(name), arg])
        };
        let reference = single_block(&[("y", call("abs", call("square", Expression::var("a"))))]);
        let submission = single_block(&[("y", Expression::var("x"))]);
        let map = bijection(&[("a", "x"), ("y", "y")]);
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")]);

        let repairs = repair_candidate(&reference, &submission, &map, &[location]).unwrap();
        assert_eq!(
            repairs[0].to_string(),
            "Change y = x to y = abs(square(x)) at location 1"
        );
        let new = repairs[0].new_expr().unwrap().as_operation().unwrap();
        assert!(!new.args[0].as_variable().unwrap().is_primed());
    }

    fn program_of(function: Function) -> Program {
        let mut p = Program::new();
        p.add_function(function);
        p
    }

    #[test]
    fn test_repairs_follow_localized_bijections() {
        let reference = program_of(single_block(&[(
            "c",
            Expression::binary("-", Expression::var("a"), Expression::var("b")),
        )]));
        let submission = program_of(single_block(&[(
            "c",
            Expression::binary("-", Expression::var("y"), Expression::var("x")),
        )]));
        let mut localisation = ErrorLocalisation::new();
        let index = localisation.add_candidate("main", bijection(&[("a", "x"), ("b", "y"), ("c", "c")]));
        localisation.add_location(
            "main",
            index,
            ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("c")]),
        );

        // the mapping passed along lists the swapped candidate only
        let mut variables = VariableMapping::new();
        variables.add("main", bijection(&[("a", "y"), ("b", "x"), ("c", "c")]));

        let candidates = RepairSynthesizer::new().repair(&reference, &submission, &localisation, &variables);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].to_string(), "Change c = y - x to c = x - y at location 1");

        let candidates =
            RepairSynthesizer::new().repair(&reference, &submission, &localisation, &VariableMapping::new());
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_equal_expressions_yield_nothing() {
        let reference = single_block(&[("y", Expression::var("x"))]);
        let submission = single_block(&[("y", Expression::var("x"))]);
        let map = bijection(&[("x", "x"), ("y", "y")]);
        let location = ErrorLocation::variable_mismatch(1, 1, vec![Variable::new("y")]);
        let repairs = repair_candidate(&reference, &submission, &map, &[location]).unwrap();
        assert!(repairs.is_empty());
    }
}
