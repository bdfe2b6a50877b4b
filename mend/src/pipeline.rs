//! Alignment, localization and synthesis in one call

use crate::align::{StructuralAlignment, StructuralMapping, VariableAlignment, VariableMapping};
use crate::error::Result;
use crate::interp::{ExecConfig, Interpreter};
use crate::localize::{ErrorLocalisation, ErrorLocalizer};
use crate::model::{Input, Program};
use crate::repair::{Repair, RepairCandidate, RepairSynthesizer};
use log::debug;

/// Everything one pipeline run produced
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub structural: StructuralMapping,
    pub variables: VariableMapping,
    pub localisation: ErrorLocalisation,
    pub candidates: Vec<RepairCandidate>,
}

/// Align `reference` and `submission`, localize errors of `function` on
/// `inputs`, then synthesize repairs.
///
/// An alignment failure aborts the run before anything is executed.
pub fn repair_programs<S, V>(
    reference: &Program,
    submission: &Program,
    inputs: &[Input],
    function: &str,
    aligners: (&S, &V),
    config: ExecConfig,
) -> Result<RepairOutcome>
where
    S: StructuralAlignment + ?Sized,
    V: VariableAlignment + ?Sized,
{
    let (structural_aligner, variable_aligner) = aligners;
    let structural = structural_aligner.generate_structural_alignment(reference, submission)?;
    let variables = variable_aligner.generate_variable_alignment(reference, submission, &structural)?;
    debug!(
        "{function}: {} variable mapping candidate(s)",
        variables.mappings(function).len()
    );
    repair_with_mappings(reference, submission, inputs, function, structural, variables, config)
}

/// Like [`repair_programs`] with precomputed mappings
pub fn repair_with_mappings(
    reference: &Program,
    submission: &Program,
    inputs: &[Input],
    function: &str,
    structural: StructuralMapping,
    variables: VariableMapping,
    config: ExecConfig,
) -> Result<RepairOutcome> {
    let interpreter = Interpreter::new(config);
    let localisation = ErrorLocalizer::new().localize_errors(
        submission,
        reference,
        inputs,
        function,
        &structural,
        &variables,
        &interpreter,
    )?;
    let candidates = RepairSynthesizer::new().repair(reference, submission, &localisation, &variables);
    debug!("{function}: {} repair candidate(s)", candidates.len());
    Ok(RepairOutcome {
        structural,
        variables,
        localisation,
        candidates,
    })
}
