//! Errors raised while building a distributed sparsity pattern.
use crate::comm::CommError;
use nalgebra_sparse::pattern::SparsityPatternFormatError;
use std::error::Error;
use std::fmt;
use std::ops::Range;

/// Structural errors of a [`DistributedSparsityPattern`](crate::DistributedSparsityPattern).
///
/// None of these are recoverable for the pattern at hand: the pattern determines the memory
/// layout of the numeric matrix, so callers are expected to treat any of them as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparsityError {
    /// Only patterns of rank 2 (matrices) are supported.
    InvalidRank(usize),
    /// The primary dimension must be 0 (row major) or 1 (column major).
    InvalidPrimaryDim(usize),
    /// The requested global dimension disagrees with the global size of its ownership map.
    DimensionMismatch { dim: usize, expected: usize, actual: usize },
    /// A global insertion referenced a primary index outside of the range owned by this process.
    RowOutOfRange { index: usize, range: Range<usize> },
    /// A global insertion referenced a codimension index outside of the global dimension.
    ColumnOutOfRange { index: usize, size_global: usize },
    /// A local insertion referenced an index beyond the owned and ghost indices of this process.
    LocalIndexOutOfRange { dim: usize, index: usize, extent: usize },
    /// The ownership map names a process that is not part of the communicator.
    InvalidOwner { owner: usize, num_processes: usize },
    /// An entry received during finalization does not belong to this process.
    ReceivedRowOutOfRange { index: usize, range: Range<usize>, source: usize },
    /// A buffer received during finalization does not consist of (row, column) pairs.
    MalformedPayload { source: usize, len: usize },
    AlreadyFinalized,
    NotFinalized,
    Communication(CommError),
    InvalidCsrPattern(SparsityPatternFormatError),
}

impl fmt::Display for SparsityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparsityError::InvalidRank(rank) => {
                write!(f, "Only rank 2 sparsity patterns are supported (got rank {}).", rank)
            }
            SparsityError::InvalidPrimaryDim(dim) => write!(
                f,
                "Primary dimension must be less than 2 (0=row major, 1=column major), got {}.",
                dim
            ),
            SparsityError::DimensionMismatch { dim, expected, actual } => write!(
                f,
                "Dimension {} has global size {}, but its ownership map has global size {}.",
                dim, expected, actual
            ),
            SparsityError::RowOutOfRange { index, range } => write!(
                f,
                "Cannot insert using global indices: index {} must be in the process range [{}, {}).",
                index, range.start, range.end
            ),
            SparsityError::ColumnOutOfRange { index, size_global } => write!(
                f,
                "Cannot insert using global indices: index {} exceeds global dimension {}.",
                index, size_global
            ),
            SparsityError::LocalIndexOutOfRange { dim, index, extent } => write!(
                f,
                "Local index {} in dimension {} exceeds the local extent {} (owned and ghost indices).",
                index, dim, extent
            ),
            SparsityError::InvalidOwner { owner, num_processes } => write!(
                f,
                "Ownership map refers to process {}, but the communicator only has {} processes.",
                owner, num_processes
            ),
            SparsityError::ReceivedRowOutOfRange { index, range, source } => write!(
                f,
                "Received illegal sparsity pattern entry for row/column {} from process {}, not in range [{}, {}).",
                index, source, range.start, range.end
            ),
            SparsityError::MalformedPayload { source, len } => write!(
                f,
                "Received buffer of odd length {} from process {}, expected (row, column) pairs.",
                len, source
            ),
            SparsityError::AlreadyFinalized => write!(f, "Sparsity pattern has already been finalized."),
            SparsityError::NotFinalized => write!(f, "Sparsity pattern must be finalized first."),
            SparsityError::Communication(err) => write!(f, "Communication failed: {}", err),
            SparsityError::InvalidCsrPattern(err) => write!(f, "Failed to build CSR pattern: {}", err),
        }
    }
}

impl Error for SparsityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SparsityError::Communication(err) => Some(err),
            SparsityError::InvalidCsrPattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommError> for SparsityError {
    fn from(err: CommError) -> Self {
        SparsityError::Communication(err)
    }
}

impl From<SparsityPatternFormatError> for SparsityError {
    fn from(err: SparsityPatternFormatError) -> Self {
        SparsityError::InvalidCsrPattern(err)
    }
}
