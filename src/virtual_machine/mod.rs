//! Intcode virtual machine.
//!
//! Runs programs made of signed integers where code and data share one memory.
//! The machine blocks instead of failing when it needs input, so several
//! machines can be chained by a driver that moves values between them.
//!
//! # Architecture
//!
//! - **Memory**: private copy of the program image per machine, bounded or sparse
//! - **Registers**: instruction pointer and relative base, both starting at 0
//! - **Instruction format**: decimal word `ABCDE`, opcode `DE`, one mode digit per parameter
//! - **Execution model**: [`vm::VM::run`] returns [`vm::Execution::Halted`] or
//!   [`vm::Execution::Blocked`]; every other condition is a [`errors::VMError`]
//! - **Variants**: [`isa::Variant`] restricts the instruction set and memory model
//!
//! # Modules
//!
//! - [`errors`]: Load and execution error types
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`operand`]: Instruction word decoding
//! - [`program`]: Program image and text loader
//! - [`vm`]: Executor, memory and I/O queues

pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod vm;
