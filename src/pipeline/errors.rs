use crate::virtual_machine::errors::VMError;
use intcode_derive::Error;

/// Errors raised while driving a set of machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A machine failed while running stage `stage`.
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: usize,
        #[source]
        source: VMError,
    },
    /// A halted stage was scheduled again.
    #[error("stage {stage} already halted and cannot be run again")]
    RetiredStage { stage: usize },
    /// A stage halted without producing a signal.
    #[error("stage {stage} halted without output")]
    NoSignal { stage: usize },
    /// A single-pass stage asked for more input than it was given.
    #[error("stage {stage} blocked waiting for input")]
    Starved { stage: usize },
    /// Every live stage is blocked and no value moved during a full round.
    #[error("ring stalled: no stage produced output")]
    Stalled,
    /// The phase list is empty.
    #[error("no phases given")]
    EmptyPhases,
}

impl PipelineError {
    /// Wraps a machine error raised by `stage`.
    pub fn stage(stage: usize) -> impl FnOnce(VMError) -> Self {
        move |source| PipelineError::Stage { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn stage_error_exposes_source() {
        let err = PipelineError::stage(2)(VMError::ProtocolViolation);
        assert_eq!(
            err.to_string(),
            "stage 2 failed: run called on a halted or failed vm"
        );
        let source = err.source().expect("missing source");
        assert_eq!(source.to_string(), "run called on a halted or failed vm");
    }

    #[test]
    fn leaf_errors_have_no_source() {
        assert!(PipelineError::Stalled.source().is_none());
        assert!(PipelineError::RetiredStage { stage: 0 }.source().is_none());
        assert_eq!(
            PipelineError::NoSignal { stage: 4 }.to_string(),
            "stage 4 halted without output"
        );
    }
}
