//! Intcode executor.
//!
//! A [`VM`] owns a private copy of a [`Program`]'s memory, an instruction pointer,
//! a relative base and its I/O queues. [`VM::run`] steps until the machine halts
//! or needs input it does not have, and reports which one happened as an
//! [`Execution`]. Blocking is a normal outcome: feed more input and call `run` again.

mod io;
mod memory;

pub use memory::DENSE_LIMIT;

use crate::debug;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::isa::{Instruction, Variant};
use crate::virtual_machine::operand::{Decoded, Mode, decode};
use crate::virtual_machine::program::Program;
use io::Channel;
use memory::Memory;

/// Outcome of a single [`VM::run`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Execution {
    /// The machine executed `HALT`. It must not be run again.
    Halted,
    /// The machine needs input. The instruction pointer rests on the `IN` instruction.
    Blocked,
}

/// Lifecycle state of a [`VM`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Running,
    Blocked,
    Halted,
    /// A [`VMError`] was raised. The machine cannot be run again.
    Failed,
}

macro_rules! exec_vm {
    // Entry point
    (
        vm = $vm:ident,
        instr = $instr:ident,
        { $( $variant:ident => $handler:ident ( $( $field:ident : $kind:ident ),* $(,)? ) ),* $(,)? }
    ) => {{
        match $instr {
            $(
                Instruction::$variant => {
                    $( let $field = exec_vm!(@read $vm, $kind)?; )*
                    $vm.$handler($( $field ),*)
                }
            ),*
        }
    }};

    // Resolve a parameter to a value
    (@read $vm:ident, Read) => {{
        $vm.read_param()
    }};

    // Resolve a parameter to a destination address
    (@read $vm:ident, Write) => {{
        $vm.write_param()
    }};
}

/// Intcode virtual machine.
///
/// Executes one instruction at a time from the instruction pointer until `HALT`
/// or until an `IN` instruction finds the input queue empty.
pub struct VM {
    /// Private memory, initialized from the program image.
    memory: Memory,
    /// Input and output queues.
    io: Channel,
    /// Address of the next instruction word.
    ip: usize,
    /// Base added to relative-mode parameters.
    relative_base: i64,
    /// Capability tier.
    variant: Variant,
    status: Status,
    /// Number of instructions executed.
    steps: u64,
    /// Address of the instruction currently executing.
    instr_offset: usize,
    /// Mode digits of the instruction currently executing.
    decoded: Decoded,
    /// Index of the next parameter to resolve.
    param_cursor: usize,
}

impl VM {
    /// Creates a VM with the full instruction set and sparse memory.
    pub fn new(program: &Program) -> Self {
        Self::with_variant(program, Variant::Full)
    }

    /// Creates a VM restricted to `variant`.
    pub fn with_variant(program: &Program, variant: Variant) -> Self {
        let memory = if variant.sparse_memory() {
            Memory::sparse(program.words())
        } else {
            Memory::bounded(program.words())
        };
        Self {
            memory,
            io: Channel::default(),
            ip: 0,
            relative_base: 0,
            variant,
            status: Status::Running,
            steps: 0,
            instr_offset: 0,
            decoded: Decoded::default(),
            param_cursor: 0,
        }
    }

    /// Appends `input` to the pending queue and executes until the machine halts or blocks.
    ///
    /// Any error is fatal: the machine moves to [`Status::Failed`]. Running a halted
    /// or failed machine returns [`VMError::ProtocolViolation`].
    pub fn run<I: IntoIterator<Item = i64>>(&mut self, input: I) -> Result<Execution, VMError> {
        if matches!(self.status, Status::Halted | Status::Failed) {
            return Err(VMError::ProtocolViolation);
        }
        self.io.feed(input);
        self.status = Status::Running;

        while self.status == Status::Running {
            if let Err(err) = self.step() {
                self.status = Status::Failed;
                return Err(err);
            }
        }

        match self.status {
            Status::Halted => {
                debug!("halted at ip {} after {} steps", self.ip, self.steps);
                Ok(Execution::Halted)
            }
            _ => {
                debug!("blocked at ip {} awaiting input", self.ip);
                Ok(Execution::Blocked)
            }
        }
    }

    /// Returns the output produced since the last drain, without consuming it.
    pub fn output(&self) -> &[i64] {
        self.io.output()
    }

    /// Removes and returns all output produced since the last drain.
    pub fn drain_output(&mut self) -> Vec<i64> {
        self.io.drain_output()
    }

    /// Reads memory at `address`. Unwritten cells of sparse memory read as 0.
    pub fn memory_at(&self, address: i64) -> Result<i64, VMError> {
        self.memory.read(address)
    }

    /// Returns the contiguous memory, starting at address 0.
    pub fn memory_image(&self) -> &[i64] {
        self.memory.image()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    /// Returns the number of instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Returns the number of input values not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.io.pending_input()
    }

    /// Decodes and executes the instruction at the instruction pointer.
    fn step(&mut self) -> Result<(), VMError> {
        let offset = self.ip;
        let word = self.memory.fetch(offset)?;
        let decoded = decode(word, offset)?;
        let instr = Instruction::try_from(decoded.opcode())
            .ok()
            .filter(|instr| self.variant.supports(*instr))
            .ok_or(VMError::UnknownOpcode {
                opcode: decoded.opcode(),
                offset,
            })?;

        self.instr_offset = decoded.offset();
        self.decoded = decoded;
        self.param_cursor = 0;
        self.ip = offset + 1;

        self.exec(instr).inspect_err(|err| {
            debug!("{} at offset {} failed: {}", instr.mnemonic(), offset, err);
        })?;
        if self.status != Status::Blocked {
            self.steps += 1;
        }
        Ok(())
    }

    /// Executes a single decoded instruction.
    fn exec(&mut self, instruction: Instruction) -> Result<(), VMError> {
        exec_vm! {
            vm = self,
            instr = instruction,
            {
                Add => op_add(a: Read, b: Read, dst: Write),
                Mul => op_mul(a: Read, b: Read, dst: Write),
                Input => op_input(dst: Write),
                Output => op_output(src: Read),
                JumpIfTrue => op_jump_if_true(cond: Read, target: Read),
                JumpIfFalse => op_jump_if_false(cond: Read, target: Read),
                LessThan => op_less_than(a: Read, b: Read, dst: Write),
                Equals => op_equals(a: Read, b: Read, dst: Write),
                AdjustBase => op_adjust_base(offset: Read),
                Halt => op_halt(),
            }
        }
    }

    /// Reads the next raw parameter word and its mode, advancing the instruction pointer.
    fn next_param(&mut self) -> Result<(Mode, i64), VMError> {
        let mode = self.decoded.mode(self.param_cursor)?;
        if mode == Mode::Relative && !self.variant.relative_mode() {
            return Err(VMError::InvalidMode {
                mode: Mode::Relative as i64,
                offset: self.instr_offset,
            });
        }
        let raw = self.memory.fetch(self.ip)?;
        self.ip += 1;
        self.param_cursor += 1;
        Ok((mode, raw))
    }

    fn read_param(&mut self) -> Result<i64, VMError> {
        match self.next_param()? {
            (Mode::Position, address) => self.memory.read(address),
            (Mode::Immediate, value) => Ok(value),
            (Mode::Relative, offset) => self.memory.read(self.relative_base.wrapping_add(offset)),
        }
    }

    fn write_param(&mut self) -> Result<i64, VMError> {
        match self.next_param()? {
            (Mode::Position, address) => Ok(address),
            (Mode::Immediate, _) => Err(VMError::InvalidWriteTarget {
                offset: self.instr_offset,
            }),
            (Mode::Relative, offset) => Ok(self.relative_base.wrapping_add(offset)),
        }
    }

    fn jump(&mut self, target: i64) -> Result<(), VMError> {
        self.ip = usize::try_from(target).map_err(|_| VMError::InvalidJumpTarget {
            target,
            offset: self.instr_offset,
        })?;
        Ok(())
    }

    fn op_add(&mut self, a: i64, b: i64, dst: i64) -> Result<(), VMError> {
        self.memory.write(dst, a.wrapping_add(b))
    }

    fn op_mul(&mut self, a: i64, b: i64, dst: i64) -> Result<(), VMError> {
        self.memory.write(dst, a.wrapping_mul(b))
    }

    fn op_input(&mut self, dst: i64) -> Result<(), VMError> {
        match self.io.pop_input() {
            Some(value) => self.memory.write(dst, value),
            None => {
                self.ip = self.instr_offset;
                self.status = Status::Blocked;
                Ok(())
            }
        }
    }

    fn op_output(&mut self, src: i64) -> Result<(), VMError> {
        self.io.push_output(src);
        Ok(())
    }

    fn op_jump_if_true(&mut self, cond: i64, target: i64) -> Result<(), VMError> {
        if cond != 0 {
            self.jump(target)?;
        }
        Ok(())
    }

    fn op_jump_if_false(&mut self, cond: i64, target: i64) -> Result<(), VMError> {
        if cond == 0 {
            self.jump(target)?;
        }
        Ok(())
    }

    fn op_less_than(&mut self, a: i64, b: i64, dst: i64) -> Result<(), VMError> {
        self.memory.write(dst, (a < b) as i64)
    }

    fn op_equals(&mut self, a: i64, b: i64, dst: i64) -> Result<(), VMError> {
        self.memory.write(dst, (a == b) as i64)
    }

    fn op_adjust_base(&mut self, offset: i64) -> Result<(), VMError> {
        self.relative_base = self.relative_base.wrapping_add(offset);
        Ok(())
    }

    fn op_halt(&mut self) -> Result<(), VMError> {
        self.status = Status::Halted;
        Ok(())
    }
}
