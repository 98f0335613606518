//! The distributed sparsity pattern.
//!
//! A [`DistributedSparsityPattern`] collects the (row, column) coordinates that will hold
//! non-zero entries of a matrix whose rows are partitioned across processes. Each process
//! stores the entries of the rows it owns, split into
//!
//! - the *diagonal block*: entries whose column is also owned by this process, and
//! - the *off-diagonal block*: entries whose column is owned elsewhere.
//!
//! Entries for rows owned by another process can be inserted in local addressing. They are
//! buffered as *non-local* entries and sent to their owner by
//! [`finalize`](DistributedSparsityPattern::finalize), the only collective operation of the
//! pattern.
//!
//! All sets store global column indices. Which dimension plays the role of "row" is decided by
//! the [`PrimaryDim`]: with column-major storage, the roles of rows and columns are swapped
//! throughout.
use crate::comm::Communicator;
use crate::error::SparsityError;
use crate::index_map::OwnershipMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::ops::Range;

mod export;
mod finalize;
mod insert;
mod query;

/// The dimension whose ownership determines the layout of the local slice of the pattern.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryDim {
    /// Entries are grouped by row (dimension 0).
    Row,
    /// Entries are grouped by column (dimension 1).
    Column,
}

impl PrimaryDim {
    pub fn index(&self) -> usize {
        match self {
            PrimaryDim::Row => 0,
            PrimaryDim::Column => 1,
        }
    }

    pub fn codim(&self) -> usize {
        1 - self.index()
    }
}

impl TryFrom<usize> for PrimaryDim {
    type Error = SparsityError;

    fn try_from(dim: usize) -> Result<Self, Self::Error> {
        match dim {
            0 => Ok(PrimaryDim::Row),
            1 => Ok(PrimaryDim::Column),
            _ => Err(SparsityError::InvalidPrimaryDim(dim)),
        }
    }
}

/// The addressing used by the indices passed to an insertion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexSpace {
    /// Global indices. Primary indices must be owned by the inserting process.
    Global,
    /// Local indices, i.e. owned indices followed by ghosts. Entries for ghost primary indices
    /// are deferred to [`finalize`](DistributedSparsityPattern::finalize).
    Local,
}

/// Whether the column indices of exported rows are sorted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryOrder {
    Sorted,
    Unsorted,
}

/// Diagonal and off-diagonal column sets of the locally owned rows.
#[derive(Debug, Clone, Default)]
struct RowBlocks {
    diagonal: Vec<FxHashSet<usize>>,
    off_diagonal: Vec<FxHashSet<usize>>,
}

impl RowBlocks {
    fn with_rows(num_rows: usize) -> Self {
        Self {
            diagonal: vec![FxHashSet::default(); num_rows],
            off_diagonal: vec![FxHashSet::default(); num_rows],
        }
    }

    fn num_rows(&self) -> usize {
        self.diagonal.len()
    }

    /// Inserts a global column into the diagonal or off-diagonal set of `local_row`.
    #[inline]
    fn insert(&mut self, local_row: usize, global_col: usize, owned_cols: &Range<usize>) {
        if owned_cols.contains(&global_col) {
            self.diagonal[local_row].insert(global_col);
        } else {
            self.off_diagonal[local_row].insert(global_col);
        }
    }
}

/// The sparsity pattern of a matrix whose primary dimension is distributed across processes.
///
/// The pattern borrows its ownership maps and its communicator; neither is modified.
#[derive(Debug)]
pub struct DistributedSparsityPattern<'a, M: ?Sized, C: ?Sized> {
    comm: &'a C,
    index_maps: [&'a M; 2],
    primary_dim: PrimaryDim,
    blocks: RowBlocks,
    // Flat (local row, global column) pairs for rows owned by other processes
    non_local: Vec<usize>,
    finalized: bool,
    // Reused across insertions to hold translated codimension indices
    codim_workspace: Vec<usize>,
}

impl<'a, M, C> DistributedSparsityPattern<'a, M, C>
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    /// Creates an empty pattern.
    ///
    /// `index_maps[0]` describes the ownership of rows and `index_maps[1]` the ownership of
    /// columns, regardless of the primary dimension.
    pub fn new(comm: &'a C, index_maps: [&'a M; 2], primary_dim: PrimaryDim) -> Self {
        let local_size = index_maps[primary_dim.index()].size();
        Self {
            comm,
            index_maps,
            primary_dim,
            blocks: RowBlocks::with_rows(local_size),
            non_local: Vec::new(),
            finalized: false,
            codim_workspace: Vec::new(),
        }
    }

    /// Creates an empty pattern from untyped dimensions, validating the configuration.
    ///
    /// `dims` holds the global size of every dimension and must agree with the global sizes of
    /// the corresponding ownership maps.
    pub fn try_from_slices(
        comm: &'a C,
        dims: &[usize],
        index_maps: &[&'a M],
        primary_dim: usize,
    ) -> Result<Self, SparsityError> {
        if dims.len() != 2 {
            return Err(SparsityError::InvalidRank(dims.len()));
        }
        if index_maps.len() != 2 {
            return Err(SparsityError::InvalidRank(index_maps.len()));
        }
        let primary_dim = PrimaryDim::try_from(primary_dim)?;

        for (dim, (&expected, map)) in dims.iter().zip(index_maps).enumerate() {
            let actual = map.size_global();
            if expected != actual {
                return Err(SparsityError::DimensionMismatch { dim, expected, actual });
            }
        }

        Ok(Self::new(comm, [index_maps[0], index_maps[1]], primary_dim))
    }

    fn primary_map(&self) -> &'a M {
        self.index_maps[self.primary_dim.index()]
    }

    fn codim_map(&self) -> &'a M {
        self.index_maps[self.primary_dim.codim()]
    }
}
