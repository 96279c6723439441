use crate::virtual_machine::errors::VMError;
use std::collections::HashMap;

/// Addresses below this bound live in the contiguous store; higher ones in a sparse map.
///
/// A write just below the limit grows the store to the limit: 8 MiB for that VM.
pub const DENSE_LIMIT: usize = 1 << 20;

/// Addressable integer storage owned by a single VM.
///
/// Memory layout: `[loaded image][zero-filled growth]` in `dense`, plus `far`
/// for isolated writes beyond [`DENSE_LIMIT`].
/// - **Bounded** memory has the exact size of the program image; any access past
///   it is [`VMError::OutOfRangeAddress`].
/// - **Sparse** memory accepts every non-negative address. Unwritten cells read as 0.
pub(super) struct Memory {
    dense: Vec<i64>,
    far: HashMap<usize, i64>,
    sparse: bool,
}

impl Memory {
    /// Creates fixed-size memory holding a copy of `image`.
    pub(super) fn bounded(image: &[i64]) -> Self {
        Self {
            dense: image.to_vec(),
            far: HashMap::new(),
            sparse: false,
        }
    }

    /// Creates auto-extending memory holding a copy of `image`.
    pub(super) fn sparse(image: &[i64]) -> Self {
        Self {
            dense: image.to_vec(),
            far: HashMap::new(),
            sparse: true,
        }
    }

    /// Validates `address` and converts it to an index.
    fn index(&self, address: i64) -> Result<usize, VMError> {
        let out_of_range = || VMError::OutOfRangeAddress {
            address,
            capacity: self.dense.len(),
        };
        let index = usize::try_from(address).map_err(|_| out_of_range())?;
        if !self.sparse && index >= self.dense.len() {
            return Err(out_of_range());
        }
        Ok(index)
    }

    /// Returns the value at `address`.
    pub(super) fn read(&self, address: i64) -> Result<i64, VMError> {
        let index = self.index(address)?;
        Ok(self.get(index))
    }

    /// Returns the value at an already validated `index`.
    fn get(&self, index: usize) -> i64 {
        match self.dense.get(index) {
            Some(value) => *value,
            None => self.far.get(&index).copied().unwrap_or(0),
        }
    }

    /// Reads the cell at `index`, used for instruction fetch.
    pub(super) fn fetch(&self, index: usize) -> Result<i64, VMError> {
        if !self.sparse && index >= self.dense.len() {
            return Err(VMError::OutOfRangeAddress {
                address: index as i64,
                capacity: self.dense.len(),
            });
        }
        Ok(self.get(index))
    }

    /// Stores `value` at `address`, growing sparse memory as needed.
    pub(super) fn write(&mut self, address: i64, value: i64) -> Result<(), VMError> {
        let index = self.index(address)?;
        if let Some(slot) = self.dense.get_mut(index) {
            *slot = value;
        } else if index < DENSE_LIMIT {
            self.dense.resize(index + 1, 0);
            self.dense[index] = value;
        } else {
            self.far.insert(index, value);
        }
        Ok(())
    }

    /// Returns the contiguous part of memory (the image plus any growth below [`DENSE_LIMIT`]).
    pub(super) fn image(&self) -> &[i64] {
        &self.dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_read_write() {
        let mut mem = Memory::bounded(&[1, 2, 3]);
        assert_eq!(mem.read(2).unwrap(), 3);
        mem.write(0, 42).unwrap();
        assert_eq!(mem.read(0).unwrap(), 42);
        assert_eq!(mem.image(), &[42, 2, 3]);
    }

    #[test]
    fn bounded_rejects_out_of_range() {
        let mut mem = Memory::bounded(&[1, 2, 3]);
        assert_eq!(
            mem.read(3).unwrap_err(),
            VMError::OutOfRangeAddress {
                address: 3,
                capacity: 3
            }
        );
        assert!(mem.write(10, 1).is_err());
        assert!(mem.fetch(3).is_err());
    }

    #[test]
    fn negative_address_always_rejected() {
        let mem = Memory::sparse(&[1]);
        assert_eq!(
            mem.read(-1).unwrap_err(),
            VMError::OutOfRangeAddress {
                address: -1,
                capacity: 1
            }
        );
        let mut mem = Memory::bounded(&[1]);
        assert!(mem.write(-5, 0).is_err());
    }

    #[test]
    fn sparse_unwritten_reads_zero() {
        let mem = Memory::sparse(&[7]);
        assert_eq!(mem.read(1000).unwrap(), 0);
        assert_eq!(mem.fetch(1000).unwrap(), 0);
        assert_eq!(mem.image().len(), 1);
    }

    #[test]
    fn sparse_grows_on_write() {
        let mut mem = Memory::sparse(&[7]);
        mem.write(4, 9).unwrap();
        assert_eq!(mem.image(), &[7, 0, 0, 0, 9]);
        assert_eq!(mem.read(4).unwrap(), 9);
        assert_eq!(mem.read(3).unwrap(), 0);
    }

    #[test]
    fn sparse_far_addresses_do_not_grow_dense() {
        let mut mem = Memory::sparse(&[7]);
        let far = (DENSE_LIMIT as i64) * 4;
        mem.write(far, -3).unwrap();
        assert_eq!(mem.read(far).unwrap(), -3);
        assert_eq!(mem.read(far + 1).unwrap(), 0);
        assert_eq!(mem.image().len(), 1);
    }

    #[test]
    fn dense_growth_stops_at_limit() {
        let mut mem = Memory::sparse(&[7]);
        mem.write(DENSE_LIMIT as i64 - 1, 1).unwrap();
        assert_eq!(mem.image().len(), DENSE_LIMIT);
        mem.write(DENSE_LIMIT as i64, 2).unwrap();
        assert_eq!(mem.image().len(), DENSE_LIMIT);
        assert_eq!(mem.read(DENSE_LIMIT as i64).unwrap(), 2);
    }

    #[test]
    fn overwrite_initialized_cell() {
        let mut mem = Memory::sparse(&[1, 2]);
        mem.write(1, 5).unwrap();
        mem.write(1, 6).unwrap();
        assert_eq!(mem.read(1).unwrap(), 6);
    }
}
