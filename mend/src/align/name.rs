use super::{
    AlignmentError, StructuralAlignment, StructuralMapping, VariableAlignment, VariableBijection,
    VariableMapping,
};
use crate::model::names::{VAR_IN, VAR_OUT, VAR_RET};
use crate::model::{Function, Program, Variable};
use log::debug;
use std::collections::BTreeSet;

/// Baseline aligner for programs with the same shape.
///
/// Structurally, every function must exist on both sides with identical
/// location ids and edges; locations then map to themselves. Variables are
/// paired by name, giving a single candidate per function.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameAlignment;

impl NameAlignment {
    pub fn new() -> Self {
        NameAlignment
    }
}

impl StructuralAlignment for NameAlignment {
    fn generate_structural_alignment(
        &self,
        reference: &Program,
        submission: &Program,
    ) -> Result<StructuralMapping, AlignmentError> {
        if reference.functions().len() != submission.functions().len() {
            return Err(AlignmentError::FunctionSizesNotEqual);
        }
        let mut mapping = StructuralMapping::new();
        for (name, ref_fnc) in reference.functions() {
            let sub_fnc = submission
                .function(name)
                .ok_or(AlignmentError::SameFunctionNotFound)?;
            check_same_shape(ref_fnc, sub_fnc)?;
            mapping.put(name.clone(), ref_fnc.locations().map(|loc| (loc, loc)).collect());
        }
        Ok(mapping)
    }
}

fn check_same_shape(reference: &Function, submission: &Function) -> Result<(), AlignmentError> {
    let ref_locs: Vec<_> = reference.locations().collect();
    let sub_locs: Vec<_> = submission.locations().collect();
    if ref_locs != sub_locs {
        return Err(AlignmentError::Failed(format!(
            "locations of `{}` differ",
            reference.name()
        )));
    }
    for loc in ref_locs {
        let same_edges = matches!(
            (reference.transition(loc), submission.transition(loc)),
            (Ok(a), Ok(b)) if a == b
        );
        if !same_edges {
            return Err(AlignmentError::Failed(format!(
                "control flow of `{}` differs at location {loc}",
                reference.name()
            )));
        }
    }
    Ok(())
}

/// Parameters, declared and assigned variables, plus the streams and `$ret`
fn variables_of(function: &Function) -> BTreeSet<String> {
    let mut names: BTreeSet<String> = [VAR_IN, VAR_OUT, VAR_RET].map(String::from).into();
    names.extend(function.params().iter().map(|(_, name)| name.clone()));
    names.extend(function.types().keys().cloned());
    names.extend(function.assigned_variables().into_iter().map(String::from));
    names
}

impl VariableAlignment for NameAlignment {
    fn generate_variable_alignment(
        &self,
        reference: &Program,
        submission: &Program,
        structural: &StructuralMapping,
    ) -> Result<VariableMapping, AlignmentError> {
        let mut mapping = VariableMapping::new();
        for name in structural.all().keys() {
            let (Some(ref_fnc), Some(sub_fnc)) = (reference.function(name), submission.function(name))
            else {
                return Err(AlignmentError::SameFunctionNotFound);
            };
            let sub_vars = variables_of(sub_fnc);
            let bijection: VariableBijection = variables_of(ref_fnc)
                .into_iter()
                .filter(|var| sub_vars.contains(var))
                .map(|var| (Variable::new(var.clone()), Variable::new(var)))
                .collect();
            debug!("{name}: paired {} variable(s) by name", bijection.len());
            mapping.add(name.clone(), bijection);
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Expression;

    fn program(extra_var: Option<&str>, loop_back: bool) -> Program {
        let mut f = Function::new("main", vec![("int".into(), "n".into())], "int");
        let l1 = f.add_location(None, "the beginning of main");
        let l2 = f.add_location(None, "the end of main");
        f.add_expr(l1, "x", Expression::var("n")).unwrap();
        if let Some(var) = extra_var {
            f.add_expr(l1, var, Expression::constant("0")).unwrap();
        }
        f.add_expr(l2, VAR_RET, Expression::var("x")).unwrap();
        if loop_back {
            f.add_transition(l1, Some(l2), Some(l1)).unwrap();
        } else {
            f.add_transition(l1, Some(l2), None).unwrap();
        }
        let mut p = Program::new();
        p.add_function(f);
        p
    }

    #[test]
    fn test_identity_structure() {
        let aligner = NameAlignment::new();
        let mapping = aligner
            .generate_structural_alignment(&program(None, false), &program(Some("t"), false))
            .unwrap();
        assert_eq!(mapping.matching_loc("main", 1), Some(1));
        assert_eq!(mapping.matching_loc("main", 2), Some(2));
    }

    #[test]
    fn test_shape_mismatch() {
        let aligner = NameAlignment::new();
        let err = aligner
            .generate_structural_alignment(&program(None, false), &program(None, true))
            .unwrap_err();
        assert!(matches!(err, AlignmentError::Failed(_)));
    }

    #[test]
    fn test_function_count_mismatch() {
        let mut bigger = program(None, false);
        bigger.add_function(Function::new("helper", vec![], "void"));
        let err = NameAlignment::new()
            .generate_structural_alignment(&program(None, false), &bigger)
            .unwrap_err();
        assert_eq!(err, AlignmentError::FunctionSizesNotEqual);
    }

    #[test]
    fn test_variables_paired_by_name() {
        let aligner = NameAlignment::new();
        let reference = program(None, false);
        let submission = program(Some("t"), false);
        let structural = aligner
            .generate_structural_alignment(&reference, &submission)
            .unwrap();
        let mapping = aligner
            .generate_variable_alignment(&reference, &submission, &structural)
            .unwrap();
        let names: Vec<String> = mapping
            .top_mapping("main")
            .unwrap()
            .iter()
            .map(|(r, _)| r.name())
            .collect();
        assert_eq!(names, vec!["$in", "$out", "$ret", "n", "x"]);
    }
}
