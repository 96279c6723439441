//! Instruction Set Architecture (ISA) definitions.
//!
//! Defines the Intcode instruction set. The [`for_each_instruction!`](crate::for_each_instruction)
//! macro holds the canonical instruction definitions and invokes a callback macro for
//! code generation, so the opcode table is written once and shared by the decoder,
//! the executor dispatch and the static checks.
//!
//! This module generates:
//! - The [`Instruction`] enum with opcode mappings
//! - `TryFrom<i64>` for decoding opcodes
//!
//! It also defines [`Variant`], the capability tiers of the machine.
//!
//! # Instruction Format
//!
//! An instruction word is a decimal number: the low two digits select the opcode,
//! each higher digit is the addressing mode of one parameter (least significant
//! first). Parameters follow the word, one memory cell each.
//!
//! - `Read` parameters resolve to a value (position, immediate or relative).
//! - `Write` parameters resolve to an address (position or relative, never immediate).

use crate::virtual_machine::errors::VMError;

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each entry is `Name = opcode, "MNEMONIC" => [param: Kind, ...], Variant`, where
/// `Variant` is the least capable [`Variant`] that implements the instruction.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Arithmetic
            // =========================
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "ADD" => [a: Read, b: Read, dst: Write], Minimal,
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "MUL" => [a: Read, b: Read, dst: Write], Minimal,
            // =========================
            // I/O
            // =========================
            /// IN dst ; dst = next input value, blocks when the input queue is empty
            Input = 3, "IN" => [dst: Write], Minimal,
            /// OUT src ; append src to the output queue
            Output = 4, "OUT" => [src: Read], Minimal,
            // =========================
            // Control flow / comparison
            // =========================
            /// JNZ cond, target ; ip = target if cond != 0
            JumpIfTrue = 5, "JNZ" => [cond: Read, target: Read], Extended,
            /// JZ cond, target ; ip = target if cond == 0
            JumpIfFalse = 6, "JZ" => [cond: Read, target: Read], Extended,
            /// LT a, b, dst ; dst = (a < b) as 0/1
            LessThan = 7, "LT" => [a: Read, b: Read, dst: Write], Extended,
            /// EQ a, b, dst ; dst = (a == b) as 0/1
            Equals = 8, "EQ" => [a: Read, b: Read, dst: Write], Extended,
            // =========================
            // Relative addressing
            // =========================
            /// ARB offset ; relative_base += offset
            AdjustBase = 9, "ARB" => [offset: Read], Full,
            /// HALT ; stop execution
            Halt = 99, "HALT" => [], Minimal,
        }
    };
}

/// Capability tier of the machine.
///
/// Each tier is a strict superset of the previous one.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Variant {
    /// Opcodes 1-4 and 99, bounded memory, position and immediate modes.
    Minimal,
    /// Adds jumps and comparisons (5-8).
    Extended,
    /// Adds relative base adjustment (9), relative mode and sparse memory.
    #[default]
    Full,
}

impl Variant {
    /// Returns `true` if `instruction` is part of this tier's instruction set.
    pub fn supports(self, instruction: Instruction) -> bool {
        instruction.variant() <= self
    }

    /// Returns `true` if addresses past the loaded image are readable (as 0) and writable.
    pub const fn sparse_memory(self) -> bool {
        matches!(self, Variant::Full)
    }

    /// Returns `true` if parameters may use relative mode.
    pub const fn relative_mode(self) -> bool {
        matches!(self, Variant::Full)
    }
}

macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $variant:ident
        ),* $(,)?
    ) => {
        // =========================
        // VM instruction enum
        // =========================
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<i64> for Instruction {
            type Error = VMError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(VMError::UnknownOpcode {
                        opcode: value,
                        offset: 0,
                    }),
                }
            }
        }

        impl Instruction {
            /// All instructions in opcode order.
            pub const ALL: &'static [Instruction] = &[ $( Instruction::$name, )* ];

            /// Returns the numeric opcode.
            pub const fn opcode(&self) -> i64 {
                *self as i64
            }

            /// Returns the mnemonic used in executor logs.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $mnemonic, )*
                }
            }

            /// Returns the least capable [`Variant`] implementing this instruction.
            pub const fn variant(&self) -> Variant {
                match self {
                    $( Instruction::$name => Variant::$variant, )*
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);
