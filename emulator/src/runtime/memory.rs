use thiserror::Error;
use tracing::debug;

use crate::constants::{Word, MEMORY_SIZE};

/// Represents errors related to memory manipulations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The given address was outside of the memory
    #[error("invalid address {0:#x}")]
    InvalidAddress(usize),
}

/// Raised when a program does not fit in memory
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("program is {size} bytes long, but memory only holds {capacity} bytes")]
pub struct LoadError {
    pub size: usize,
    pub capacity: usize,
}

/// Holds the memory cells of the computer.
///
/// It has 256 byte-sized cells, shared by code and stack.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    inner: Box<[Word; MEMORY_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            inner: Box::new([0; MEMORY_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory {{ size: {} }}", self.inner.len())
    }
}

impl Memory {
    /// Get a cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get(&self, address: usize) -> Result<Word, MemoryError> {
        self.inner
            .get(address)
            .copied()
            .ok_or(MemoryError::InvalidAddress(address))
    }

    /// Get a mutable reference to a cell at an address
    ///
    /// # Errors
    ///
    /// It fails if the address is out of bounds.
    pub fn get_mut(&mut self, address: usize) -> Result<&mut Word, MemoryError> {
        self.inner
            .get_mut(address)
            .ok_or(MemoryError::InvalidAddress(address))
    }

    /// Copy a program at the start of the memory, overwriting what was there.
    ///
    /// Cells after the end of the program are left untouched.
    ///
    /// # Errors
    ///
    /// It fails if the program is longer than the memory.
    pub fn load(&mut self, program: &[Word]) -> Result<(), LoadError> {
        if program.len() > MEMORY_SIZE {
            return Err(LoadError {
                size: program.len(),
                capacity: MEMORY_SIZE,
            });
        }

        debug!(size = program.len(), "Loading program");
        self.inner[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// View the whole memory
    #[must_use]
    pub fn as_slice(&self) -> &[Word] {
        &self.inner[..]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn bounds_test() {
        let mut memory = Memory::default();
        assert_eq!(memory.get(0), Ok(0));
        assert_eq!(memory.get(255), Ok(0));
        assert_eq!(memory.get(256), Err(MemoryError::InvalidAddress(256)));

        *memory.get_mut(255).unwrap() = 42;
        assert_eq!(memory.get(255), Ok(42));
        assert!(memory.get_mut(1000).is_err());
    }

    #[test]
    fn load_test() {
        let mut memory = Memory::default();
        *memory.get_mut(3).unwrap() = 0xAA;

        memory.load(&[1, 2]).unwrap();
        assert_eq!(&memory.as_slice()[..4], &[1, 2, 0, 0xAA]);

        // A full-sized program fits exactly
        memory.load(&[7; MEMORY_SIZE]).unwrap();
        assert_eq!(memory.get(255), Ok(7));
    }

    #[test]
    fn load_too_large_test() {
        let mut memory = Memory::default();
        let err = memory.load(&[0; MEMORY_SIZE + 1]).unwrap_err();
        assert_eq!(
            err,
            LoadError {
                size: MEMORY_SIZE + 1,
                capacity: MEMORY_SIZE
            }
        );
        // Nothing was written
        assert_eq!(memory, Memory::default());
    }
}
