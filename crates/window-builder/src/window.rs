//! Fixed-Length Row Window

use crate::WindowError;
use ndarray::{Array2, ArrayView2};

/// Ordered window of exactly `len()` consecutive feature rows.
///
/// Stored as a ring: sliding in a new row overwrites the oldest one in place,
/// so a rollout never reallocates.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Pre-allocated row-major storage (length x width)
    storage: Box<[f64]>,
    /// Number of rows
    length: usize,
    /// Features per row
    width: usize,
    /// Physical slot of the oldest row
    head: usize,
}

impl Window {
    /// Create a window holding a copy of `rows`, oldest first
    pub fn from_rows(rows: ArrayView2<'_, f64>) -> Result<Self, WindowError> {
        let (length, width) = rows.dim();
        if length == 0 {
            return Err(WindowError::ZeroLength);
        }
        let storage: Vec<f64> = rows.iter().copied().collect();
        Ok(Self {
            storage: storage.into_boxed_slice(),
            length,
            width,
            head: 0,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.length
    }

    /// Always false; windows hold at least one row
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Features per row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Row `index`, counted from the oldest
    pub fn row(&self, index: usize) -> &[f64] {
        let slot = (self.head + index) % self.length;
        &self.storage[slot * self.width..(slot + 1) * self.width]
    }

    /// Most recent row
    pub fn last_row(&self) -> &[f64] {
        self.row(self.length - 1)
    }

    /// Rows from oldest to newest
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.length).map(move |i| self.row(i))
    }

    /// Drop the oldest row and append `row` as the newest
    pub fn slide(&mut self, row: &[f64]) -> Result<(), WindowError> {
        if row.len() != self.width {
            return Err(WindowError::WidthMismatch {
                expected: self.width,
                actual: row.len(),
            });
        }

        let start = self.head * self.width;
        self.storage[start..start + self.width].copy_from_slice(row);
        self.head = (self.head + 1) % self.length;
        Ok(())
    }

    /// Flatten oldest-first, row-major
    pub fn to_flat(&self) -> Vec<f64> {
        self.rows().flat_map(|r| r.iter().copied()).collect()
    }

    /// Copy into a (len x width) matrix
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.length, self.width), |(r, c)| self.row(r)[c])
    }
}
