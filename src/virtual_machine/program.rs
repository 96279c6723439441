//! Program image representation and loading.
//!
//! A [`Program`] is the immutable initial memory image. Every [`VM`](super::vm::VM)
//! built from it copies the words into its own memory, so one program can back
//! any number of independent machines.

use crate::virtual_machine::errors::VMError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Immutable Intcode program image.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Program {
    words: Arc<[i64]>,
}

impl Program {
    /// Creates a program from raw words.
    pub fn new(words: Vec<i64>) -> Self {
        Self {
            words: words.into(),
        }
    }

    /// Parses comma-separated base-10 integers.
    ///
    /// Whitespace around tokens (including a trailing newline) is ignored. Any token
    /// that is not an integer, including an empty one, is
    /// [`VMError::MalformedProgram`].
    pub fn parse(source: &str) -> Result<Self, VMError> {
        let words = source
            .trim()
            .split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<i64>().map_err(|_| VMError::MalformedProgram {
                    token: token.to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(words))
    }

    /// Returns the program words.
    pub fn words(&self) -> &[i64] {
        &self.words
    }

    /// Returns the number of words in the image.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the image has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns a copy of this program with each `(address, value)` written into the image.
    ///
    /// Patches are applied in order; addresses must lie inside the image.
    pub fn with_patches(&self, patches: &[(usize, i64)]) -> Result<Self, VMError> {
        let mut words = self.words.to_vec();
        for &(address, value) in patches {
            let capacity = words.len();
            let slot = words
                .get_mut(address)
                .ok_or(VMError::OutOfRangeAddress {
                    address: address as i64,
                    capacity,
                })?;
            *slot = value;
        }
        Ok(Self::new(words))
    }
}

impl FromStr for Program {
    type Err = VMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<i64>> for Program {
    fn from(words: Vec<i64>) -> Self {
        Self::new(words)
    }
}

impl From<&[i64]> for Program {
    fn from(words: &[i64]) -> Self {
        Self::new(words.to_vec())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", word)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        let program = Program::parse("1,0,0,3,99").unwrap();
        assert_eq!(program.words(), &[1, 0, 0, 3, 99]);
        assert_eq!(program.len(), 5);
    }

    #[test]
    fn parse_negative_and_whitespace() {
        let program = Program::parse("  1101, 100,-1 ,4,0\n").unwrap();
        assert_eq!(program.words(), &[1101, 100, -1, 4, 0]);
    }

    #[test]
    fn parse_large_literal() {
        let program: Program = "104,1125899906842624,99".parse().unwrap();
        assert_eq!(program.words()[1], 1125899906842624);
    }

    #[test]
    fn parse_rejects_non_integer() {
        assert_eq!(
            Program::parse("1,2,x,4").unwrap_err(),
            VMError::MalformedProgram {
                token: "x".to_string(),
                index: 2
            }
        );
    }

    #[test]
    fn parse_rejects_empty_tokens() {
        assert!(matches!(
            Program::parse("1,,2"),
            Err(VMError::MalformedProgram { index: 1, .. })
        ));
        assert!(matches!(
            Program::parse("1,2,"),
            Err(VMError::MalformedProgram { index: 2, .. })
        ));
        assert!(matches!(
            Program::parse(""),
            Err(VMError::MalformedProgram { index: 0, .. })
        ));
    }

    #[test]
    fn parse_rejects_floats() {
        assert!(matches!(
            Program::parse("1.5,2"),
            Err(VMError::MalformedProgram { index: 0, .. })
        ));
    }

    #[test]
    fn display_round_trips() {
        let source = "109,1,204,-1,99";
        assert_eq!(Program::parse(source).unwrap().to_string(), source);
    }

    #[test]
    fn with_patches_copies() {
        let program = Program::new(vec![1, 0, 0, 0, 99]);
        let patched = program.with_patches(&[(1, 12), (2, 2)]).unwrap();
        assert_eq!(patched.words(), &[1, 12, 2, 0, 99]);
        assert_eq!(program.words(), &[1, 0, 0, 0, 99]);
    }

    #[test]
    fn with_patches_out_of_range() {
        let program = Program::new(vec![99]);
        assert_eq!(
            program.with_patches(&[(3, 1)]).unwrap_err(),
            VMError::OutOfRangeAddress {
                address: 3,
                capacity: 1
            }
        );
    }
}
