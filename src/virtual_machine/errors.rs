use intcode_derive::Error;

/// Errors that can occur while loading or executing an Intcode program.
///
/// Every variant is fatal: it describes an invalid program or an invalid use of
/// the VM, never a transient condition. Running out of input is not an error,
/// see [`Execution::Blocked`](super::vm::Execution::Blocked).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VMError {
    /// A token in the program source is not a base-10 integer.
    #[error("malformed program: token {index} ({token:?}) is not an integer")]
    MalformedProgram { token: String, index: usize },
    /// Decoded opcode is not part of the active instruction set.
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: i64, offset: usize },
    /// Addressing mode digit is not supported.
    #[error("invalid addressing mode {mode} at offset {offset}")]
    InvalidMode { mode: i64, offset: usize },
    /// A write destination was encoded in immediate mode.
    #[error("write target in immediate mode at offset {offset}")]
    InvalidWriteTarget { offset: usize },
    /// Negative address, or an address past the end of bounded memory.
    #[error("address {address} out of range (capacity {capacity})")]
    OutOfRangeAddress { address: i64, capacity: usize },
    /// Jump to a negative instruction pointer.
    #[error("invalid jump target {target} at offset {offset}")]
    InvalidJumpTarget { target: i64, offset: usize },
    /// `run` called on a VM that already halted or failed.
    #[error("run called on a halted or failed vm")]
    ProtocolViolation,
}
