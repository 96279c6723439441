//! Amplifier orchestration.
//!
//! One program is instantiated once per phase value and the machines are chained:
//! each stage's output becomes the next stage's input.
//!
//! - **Linear**: every stage runs once to completion, fed `[phase, signal]`.
//! - **Ring**: the last stage feeds the first; stages are driven round-robin
//!   until the last stage halts.
//!
//! Every stage receives its phase as its first input value.

use crate::pipeline::errors::PipelineError;
use crate::virtual_machine::isa::Variant;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::vm::{Execution, VM};
use crate::{debug, info, warn};
use std::iter;

/// Shape of an amplifier chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Single pass starting from `initial_signal`.
    Linear { initial_signal: i64 },
    /// Feedback loop starting from signal 0.
    Ring,
}

/// One program driven as a chain of stages.
#[derive(Clone, Debug)]
pub struct Pipeline {
    program: Program,
    variant: Variant,
}

impl Pipeline {
    /// Creates a pipeline whose stages use the full instruction set.
    pub fn new(program: Program) -> Self {
        Self::with_variant(program, Variant::Full)
    }

    /// Creates a pipeline whose stages are restricted to `variant`.
    pub fn with_variant(program: Program, variant: Variant) -> Self {
        Self { program, variant }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Runs the chain described by `topology` and returns its final signal.
    pub fn run(&self, topology: Topology, phases: &[i64]) -> Result<i64, PipelineError> {
        match topology {
            Topology::Linear { initial_signal } => self.linear(phases, initial_signal),
            Topology::Ring => self.ring(phases),
        }
    }

    /// Runs one fresh machine per phase in sequence.
    ///
    /// Stage `i` receives `[phases[i], signal]` and must halt; its last output
    /// becomes the signal for stage `i + 1`.
    pub fn linear(&self, phases: &[i64], initial_signal: i64) -> Result<i64, PipelineError> {
        if phases.is_empty() {
            return Err(PipelineError::EmptyPhases);
        }

        let mut signal = initial_signal;
        for (stage, &phase) in phases.iter().enumerate() {
            let mut vm = VM::with_variant(&self.program, self.variant);
            match vm
                .run([phase, signal])
                .map_err(PipelineError::stage(stage))?
            {
                Execution::Halted => {
                    signal = vm
                        .output()
                        .last()
                        .copied()
                        .ok_or(PipelineError::NoSignal { stage })?;
                }
                Execution::Blocked => return Err(PipelineError::Starved { stage }),
            }
        }
        Ok(signal)
    }

    /// Runs one machine per phase in a feedback loop.
    ///
    /// On the first round stage `i` receives its phase followed by whatever the
    /// previous stage produced (stage 0 gets signal 0). On later rounds each
    /// stage receives only the previous stage's fresh output. The result is the
    /// last value the final stage produced before halting.
    pub fn ring(&self, phases: &[i64]) -> Result<i64, PipelineError> {
        if phases.is_empty() {
            return Err(PipelineError::EmptyPhases);
        }

        let last = phases.len() - 1;
        let mut stages: Vec<VM> = phases
            .iter()
            .map(|_| VM::with_variant(&self.program, self.variant))
            .collect();
        let mut retired = vec![false; phases.len()];
        let mut carried = vec![0];
        let mut final_signal = None;

        let mut round = 0usize;
        loop {
            let mut moved = false;

            for (stage, vm) in stages.iter_mut().enumerate() {
                if retired[stage] {
                    return Err(PipelineError::RetiredStage { stage });
                }

                let input = std::mem::take(&mut carried);
                let result = if round == 0 {
                    vm.run(iter::once(phases[stage]).chain(input))
                } else {
                    vm.run(input)
                }
                .map_err(PipelineError::stage(stage))?;

                carried = vm.drain_output();
                moved |= !carried.is_empty();
                if stage == last && !carried.is_empty() {
                    final_signal = carried.last().copied();
                }

                if result == Execution::Halted {
                    retired[stage] = true;
                    debug!("stage {} halted in round {}", stage, round);
                    if stage == last {
                        let signal = final_signal.ok_or(PipelineError::NoSignal { stage })?;
                        info!("ring of {} stages settled on {}", phases.len(), signal);
                        return Ok(signal);
                    }
                    warn!("stage {} halted before stage {}", stage, last);
                }
            }

            if !moved {
                return Err(PipelineError::Stalled);
            }
            round += 1;
        }
    }
}

/// Runs `program` as a linear chain over `phases`, starting from `initial_signal`.
pub fn run_linear(
    program: &Program,
    phases: &[i64],
    initial_signal: i64,
) -> Result<i64, PipelineError> {
    Pipeline::new(program.clone()).linear(phases, initial_signal)
}

/// Runs `program` as a feedback ring over `phases`.
pub fn run_ring(program: &Program, phases: &[i64]) -> Result<i64, PipelineError> {
    Pipeline::new(program.clone()).ring(phases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::errors::VMError;

    fn program(source: &str) -> Program {
        Program::parse(source).unwrap()
    }

    #[test]
    fn linear_examples() {
        let cases = [
            (
                "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0",
                [4, 3, 2, 1, 0],
                43210,
            ),
            (
                "3,23,3,24,1002,24,10,24,1002,23,-1,23,101,5,23,23,1,24,23,23,4,23,99,0,0",
                [0, 1, 2, 3, 4],
                54321,
            ),
            (
                "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,1002,33,7,33,1,33,31,31,1,32,31,31,4,31,99,0,0,0",
                [1, 0, 4, 3, 2],
                65210,
            ),
        ];
        for (source, phases, expected) in cases {
            assert_eq!(run_linear(&program(source), &phases, 0).unwrap(), expected);
        }
    }

    #[test]
    fn linear_with_restricted_variant() {
        let pipeline = Pipeline::with_variant(
            program("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0"),
            Variant::Minimal,
        );
        assert_eq!(pipeline.linear(&[4, 3, 2, 1, 0], 0).unwrap(), 43210);
    }

    #[test]
    fn linear_uses_initial_signal() {
        // Outputs phase + signal.
        let p = program("3,11,3,12,1,11,12,11,4,11,99,0,0");
        assert_eq!(run_linear(&p, &[1, 2, 3], 10).unwrap(), 16);
    }

    #[test]
    fn ring_examples() {
        let cases = [
            (
                "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
                [9, 8, 7, 6, 5],
                139629729,
            ),
            (
                "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,-5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
                [9, 7, 8, 5, 6],
                18216,
            ),
        ];
        for (source, phases, expected) in cases {
            assert_eq!(run_ring(&program(source), &phases).unwrap(), expected);
        }
    }

    #[test]
    fn ring_of_one_feeds_itself() {
        // Adds one and doubles, once per unit of phase, then halts.
        let p = program("3,30,3,31,1001,31,1,31,1002,31,2,31,4,31,1001,30,-1,30,1005,30,2,99");
        assert_eq!(run_ring(&p, &[3]).unwrap(), 14);
    }

    #[test]
    fn ring_size_follows_phase_count() {
        let p = program(
            "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
        );
        assert!(run_ring(&p, &[9, 8, 7]).is_ok());
        assert!(run_ring(&p, &[9, 8, 7, 6, 5, 9, 8]).is_ok());
    }

    #[test]
    fn ring_with_linear_program_matches_linear() {
        let p = program("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0");
        assert_eq!(run_ring(&p, &[4, 3, 2, 1, 0]).unwrap(), 43210);
    }

    #[test]
    fn ring_rejects_retired_stage() {
        // Phase 0 halts after one pass; any other phase loops forever.
        let p = program("3,30,1005,30,11,3,31,4,31,99,0,3,31,4,31,1105,1,11");
        assert_eq!(
            run_ring(&p, &[0, 1]).unwrap_err(),
            PipelineError::RetiredStage { stage: 0 }
        );
    }

    #[test]
    fn ring_detects_stall() {
        // Consumes input forever without output.
        let p = program("3,5,1105,1,0,0");
        assert_eq!(run_ring(&p, &[1, 2]).unwrap_err(), PipelineError::Stalled);
    }

    #[test]
    fn last_stage_without_output() {
        let p = program("3,5,3,6,99");
        assert_eq!(
            run_ring(&p, &[0]).unwrap_err(),
            PipelineError::NoSignal { stage: 0 }
        );
        assert_eq!(
            run_linear(&p, &[0, 1], 0).unwrap_err(),
            PipelineError::NoSignal { stage: 0 }
        );
    }

    #[test]
    fn linear_stage_starved() {
        let p = program("3,0,3,1,3,2,99");
        assert_eq!(
            run_linear(&p, &[0], 0).unwrap_err(),
            PipelineError::Starved { stage: 0 }
        );
    }

    #[test]
    fn empty_phases_rejected() {
        let p = program("99");
        assert_eq!(run_linear(&p, &[], 0).unwrap_err(), PipelineError::EmptyPhases);
        assert_eq!(run_ring(&p, &[]).unwrap_err(), PipelineError::EmptyPhases);
    }

    #[test]
    fn stage_errors_carry_stage_index() {
        // Phase 0 outputs its signal, phase 1 jumps into an unknown opcode.
        let p = program("3,11,3,12,1005,11,10,4,12,99,42,0,0");
        assert_eq!(
            run_linear(&p, &[0, 1], 5).unwrap_err(),
            PipelineError::Stage {
                stage: 1,
                source: VMError::UnknownOpcode {
                    opcode: 42,
                    offset: 10
                }
            }
        );
    }

    #[test]
    fn topology_dispatch() {
        let pipeline = Pipeline::new(program("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0"));
        assert_eq!(
            pipeline
                .run(Topology::Linear { initial_signal: 0 }, &[4, 3, 2, 1, 0])
                .unwrap(),
            43210
        );
        assert_eq!(pipeline.run(Topology::Ring, &[4, 3, 2, 1, 0]).unwrap(), 43210);
    }
}
