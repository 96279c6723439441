//! Searches that drive whole machines or pipelines once per candidate.

use crate::info;
use crate::pipeline::amplifier::{Pipeline, Topology};
use crate::pipeline::errors::PipelineError;
use crate::virtual_machine::isa::Variant;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Execution, VM};
use itertools::{Itertools, iproduct};

/// Address overwritten with the noun before a run.
pub const NOUN_ADDRESS: usize = 1;
/// Address overwritten with the verb before a run.
pub const VERB_ADDRESS: usize = 2;
/// Largest noun and verb tried by [`find_noun_verb`].
pub const MAX_NOUN_VERB: i64 = 99;

/// Tries every ordering of `phases` and returns the highest final signal with
/// the ordering that produced it.
///
/// When several orderings tie, the first one in lexicographic permutation order
/// of the input sequence wins. Any stage error aborts the search.
pub fn best_over_permutations<I>(
    program: &Program,
    phases: I,
    topology: Topology,
) -> Result<(i64, Vec<i64>), PipelineError>
where
    I: IntoIterator<Item = i64>,
{
    let phases: Vec<i64> = phases.into_iter().collect();
    if phases.is_empty() {
        return Err(PipelineError::EmptyPhases);
    }

    let pipeline = Pipeline::new(program.clone());
    let mut best: Option<(i64, Vec<i64>)> = None;
    for candidate in phases.iter().copied().permutations(phases.len()) {
        let signal = pipeline.run(topology, &candidate)?;
        if best.as_ref().is_none_or(|(top, _)| signal > *top) {
            best = Some((signal, candidate));
        }
    }

    let (signal, order) = best.ok_or(PipelineError::EmptyPhases)?;
    info!("best signal {} from phases {:?}", signal, order);
    Ok((signal, order))
}

/// Runs `program` with `noun` and `verb` written to addresses 1 and 2 and
/// returns the value left at address 0.
pub fn output_for(
    program: &Program,
    noun: i64,
    verb: i64,
    variant: Variant,
) -> Result<i64, PipelineError> {
    let patched = program
        .with_patches(&[(NOUN_ADDRESS, noun), (VERB_ADDRESS, verb)])
        .map_err(PipelineError::stage(0))?;
    let mut vm = VM::with_variant(&patched, variant);
    match vm.run([]).map_err(PipelineError::stage(0))? {
        Execution::Halted => vm.memory_at(0).map_err(PipelineError::stage(0)),
        Execution::Blocked => Err(PipelineError::Starved { stage: 0 }),
    }
}

/// Finds the first `(noun, verb)` in `0..=99` for which the program leaves `target`
/// at address 0. Nouns are tried in the outer loop.
pub fn find_noun_verb(
    program: &Program,
    target: i64,
    variant: Variant,
) -> Result<Option<(i64, i64)>, PipelineError> {
    for (noun, verb) in iproduct!(0..=MAX_NOUN_VERB, 0..=MAX_NOUN_VERB) {
        if output_for(program, noun, verb, variant)? == target {
            info!("noun {} verb {} produce {}", noun, verb, target);
            return Ok(Some((noun, verb)));
        }
    }
    Ok(None)
}
