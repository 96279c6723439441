//! Instruction word decoding.
//!
//! An instruction word `ABCDE` splits into the opcode `DE` and the mode digits
//! `C`, `B`, `A` for parameters 0, 1, 2. Missing digits are [`Mode::Position`].
//! Decoding is pure: it never touches memory.

use crate::virtual_machine::errors::VMError;

/// Addressing mode of a single parameter.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// The parameter is an address.
    #[default]
    Position = 0,
    /// The parameter is the value itself.
    Immediate = 1,
    /// The parameter is an offset from the relative base.
    Relative = 2,
}

impl TryFrom<i64> for Mode {
    type Error = VMError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Position),
            1 => Ok(Self::Immediate),
            2 => Ok(Self::Relative),
            _ => Err(VMError::InvalidMode {
                mode: value,
                offset: 0,
            }),
        }
    }
}

/// A decoded instruction word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    opcode: i64,
    /// Remaining decimal digits, least significant = mode of parameter 0.
    modes: i64,
    /// Address of the instruction word, used for error reporting.
    offset: usize,
}

impl Decoded {
    /// Returns the opcode (word mod 100).
    pub const fn opcode(&self) -> i64 {
        self.opcode
    }

    /// Returns the address the word was read from.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the addressing mode of parameter `index` (0-based).
    pub fn mode(&self, index: usize) -> Result<Mode, VMError> {
        let mut digits = self.modes;
        for _ in 0..index {
            digits /= 10;
            if digits == 0 {
                return Ok(Mode::Position);
            }
        }
        Mode::try_from(digits % 10).map_err(|_| VMError::InvalidMode {
            mode: digits % 10,
            offset: self.offset(),
        })
    }
}

/// Splits `word`, read at `offset`, into opcode and mode digits.
///
/// Negative words carry no meaningful digits and are reported as unknown opcodes.
pub fn decode(word: i64, offset: usize) -> Result<Decoded, VMError> {
    if word < 0 {
        return Err(VMError::UnknownOpcode {
            opcode: word,
            offset,
        });
    }
    Ok(Decoded {
        opcode: word % 100,
        modes: word / 100,
        offset,
    })
}
