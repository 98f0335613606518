use crate::comm::Communicator;
use crate::error::SparsityError;
use crate::index_map::OwnershipMap;
use crate::pattern::DistributedSparsityPattern;
use nalgebra_sparse::pattern::SparsityPattern;
use rayon::prelude::*;

/// Builds a compressed pattern from rows of sorted, unique minor indices.
fn compress_rows(
    major_dim: usize,
    minor_dim: usize,
    rows: Vec<Vec<usize>>,
) -> Result<SparsityPattern, SparsityError> {
    let mut offsets = Vec::with_capacity(major_dim + 1);
    let mut minor_indices = Vec::with_capacity(rows.iter().map(Vec::len).sum());
    offsets.push(0);
    for row in rows {
        minor_indices.extend(row);
        offsets.push(minor_indices.len());
    }
    Ok(SparsityPattern::try_from_offsets_and_indices(
        major_dim,
        minor_dim,
        offsets,
        minor_indices,
    )?)
}

impl<'a, M, C> DistributedSparsityPattern<'a, M, C>
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    /// The local slice of the pattern in compressed form, for allocating matrix storage.
    ///
    /// The major dimension enumerates the locally owned primary indices, the minor dimension
    /// holds global codimension indices (diagonal and off-diagonal entries merged). For
    /// row-major patterns this is the CSR pattern of the local rows.
    pub fn to_local_csr_pattern(&self) -> Result<SparsityPattern, SparsityError> {
        if !self.finalized {
            return Err(SparsityError::NotFinalized);
        }

        let blocks = &self.blocks;
        let rows: Vec<Vec<usize>> = (0..blocks.num_rows())
            .into_par_iter()
            .map(|i| {
                let mut row: Vec<usize> = blocks.diagonal[i]
                    .iter()
                    .chain(&blocks.off_diagonal[i])
                    .copied()
                    .collect();
                row.sort_unstable();
                row
            })
            .collect();

        compress_rows(blocks.num_rows(), self.codim_map().size_global(), rows)
    }

    /// The diagonal block in compressed form, with codimension indices relative to the start of
    /// the locally owned codimension range.
    pub fn diagonal_block_csr_pattern(&self) -> Result<SparsityPattern, SparsityError> {
        if !self.finalized {
            return Err(SparsityError::NotFinalized);
        }

        let owned_cols = self.codim_map().local_range();
        let offset = owned_cols.start;
        let diagonal = &self.blocks.diagonal;
        let rows: Vec<Vec<usize>> = diagonal
            .par_iter()
            .map(|set| {
                let mut row: Vec<usize> = set.iter().map(|&j| j - offset).collect();
                row.sort_unstable();
                row
            })
            .collect();

        compress_rows(diagonal.len(), owned_cols.len(), rows)
    }
}
