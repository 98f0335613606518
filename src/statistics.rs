//! Summary statistics of a sparsity pattern.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-zero counts of the local slice of a distributed sparsity pattern.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStatistics {
    /// Global number of rows and columns.
    pub global_dims: [usize; 2],
    pub num_diagonal: usize,
    pub num_off_diagonal: usize,
    /// Entries still waiting to be sent to their owner (zero after finalization).
    pub num_non_local: usize,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl PatternStatistics {
    pub fn num_total(&self) -> usize {
        self.num_diagonal + self.num_off_diagonal + self.num_non_local
    }

    /// Percentage of all matrix entries that are structurally non-zero.
    pub fn fill_percentage(&self) -> f64 {
        percentage(self.num_total(), self.global_dims[0] * self.global_dims[1])
    }

    pub fn diagonal_percentage(&self) -> f64 {
        percentage(self.num_diagonal, self.num_total())
    }

    pub fn off_diagonal_percentage(&self) -> f64 {
        percentage(self.num_off_diagonal, self.num_total())
    }

    pub fn non_local_percentage(&self) -> f64 {
        percentage(self.num_non_local, self.num_total())
    }
}

impl fmt::Display for PatternStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matrix of size {} x {} has {} ({:.2}%) nonzero entries.",
            self.global_dims[0],
            self.global_dims[1],
            self.num_total(),
            self.fill_percentage()
        )?;
        if self.num_total() != self.num_diagonal {
            write!(
                f,
                "\nDiagonal: {} ({:.2}%), off-diagonal: {} ({:.2}%), non-local: {} ({:.2}%)",
                self.num_diagonal,
                self.diagonal_percentage(),
                self.num_off_diagonal,
                self.off_diagonal_percentage(),
                self.num_non_local,
                self.non_local_percentage()
            )?;
        }
        Ok(())
    }
}
