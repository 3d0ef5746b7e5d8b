//! Flat, fixed-size memory image with bounds-checked access.

use crate::program::Program;

/// Word-addressed storage the decoder and executor read through.
///
/// Addresses arrive as raw program words, so they may be negative; both
/// methods return `None` for any address outside the image.
pub trait Bus {
    fn load(&self, address: i64) -> Option<i64>;
    fn store(&mut self, address: i64, value: i64) -> Option<()>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Copy a program template into a fresh image of the same size.
    pub fn from_program(program: &Program) -> Self {
        Self {
            cells: program.words().to_vec(),
        }
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    fn index(&self, address: i64) -> Option<usize> {
        let index = usize::try_from(address).ok()?;
        (index < self.cells.len()).then_some(index)
    }
}

impl From<Vec<i64>> for Memory {
    fn from(cells: Vec<i64>) -> Self {
        Self { cells }
    }
}

impl Bus for Memory {
    fn load(&self, address: i64) -> Option<i64> {
        self.index(address).map(|index| self.cells[index])
    }

    fn store(&mut self, address: i64, value: i64) -> Option<()> {
        let index = self.index(address)?;
        self.cells[index] = value;
        Some(())
    }

    fn len(&self) -> usize {
        self.cells.len()
    }
}
