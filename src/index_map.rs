//! Ownership of matrix indices across processes.
//!
//! Every process owns a contiguous range of global indices in each matrix dimension. In
//! addition, a process may reference indices it does not own (ghosts). In *local addressing*,
//! the owned indices come first, followed by the ghost indices:
//!
//! ```text
//! local:   0 .. size()                      | size() .. size() + block_size * num_ghosts
//! global:  local_range().start + local      | block_size * ghost_block + component
//! ```
//!
//! Ghosts are stored per block (node) rather than per index, so that a vector-valued problem
//! with `block_size` components per node only stores one ghost entry per node.
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::ops::Range;

/// An oracle describing which indices of one matrix dimension this process owns.
pub trait OwnershipMap {
    /// The half-open range of global indices owned by this process.
    fn local_range(&self) -> Range<usize>;

    /// The global number of indices in this dimension.
    fn size_global(&self) -> usize;

    /// The number of indices per block.
    fn block_size(&self) -> usize;

    /// Global *block* indices of the ghosts, in local order.
    fn local_to_global_unowned(&self) -> &[usize];

    /// The owning process of each ghost block, in local order.
    fn off_process_owner(&self) -> &[usize];

    /// The number of indices owned by this process.
    fn size(&self) -> usize {
        self.local_range().len()
    }

    /// The number of indices addressable in local addressing, i.e. owned and ghost indices.
    fn local_extent(&self) -> usize {
        self.size() + self.block_size() * self.local_to_global_unowned().len()
    }

    /// Translates a local index to its global index.
    ///
    /// # Panics
    ///
    /// Panics if `local_index >= self.local_extent()`.
    fn local_to_global(&self, local_index: usize) -> usize {
        let size = self.size();
        if local_index < size {
            self.local_range().start + local_index
        } else {
            let bs = self.block_size();
            let offset = local_index - size;
            bs * self.local_to_global_unowned()[offset / bs] + offset % bs
        }
    }
}

impl<M: OwnershipMap + ?Sized> OwnershipMap for &M {
    fn local_range(&self) -> Range<usize> {
        (**self).local_range()
    }

    fn size_global(&self) -> usize {
        (**self).size_global()
    }

    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn local_to_global_unowned(&self) -> &[usize] {
        (**self).local_to_global_unowned()
    }

    fn off_process_owner(&self) -> &[usize] {
        (**self).off_process_owner()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexMapError {
    InvalidBlockSize,
    /// The owned range is not contained in the global index space or not aligned with blocks.
    InvalidRange { range: Range<usize>, size_global: usize },
    /// Ownership offsets must start at zero and be non-decreasing.
    InvalidOffsets,
    RankOutOfBounds { rank: usize, num_processes: usize },
    GhostCountMismatch { num_ghosts: usize, num_owners: usize },
    GhostOutOfBounds { ghost: usize, num_blocks: usize },
    GhostOwnedLocally { ghost: usize },
    /// Indices cannot be distributed across zero processes.
    NoProcesses,
}

impl fmt::Display for IndexMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexMapError::InvalidBlockSize => write!(f, "Block size must be positive."),
            IndexMapError::InvalidRange { range, size_global } => write!(
                f,
                "Owned range [{}, {}) is not a block-aligned subrange of [0, {}).",
                range.start, range.end, size_global
            ),
            IndexMapError::InvalidOffsets => {
                write!(f, "Ownership offsets must start at zero and be non-decreasing.")
            }
            IndexMapError::RankOutOfBounds { rank, num_processes } => {
                write!(f, "Rank {} is out of bounds for {} processes.", rank, num_processes)
            }
            IndexMapError::GhostCountMismatch { num_ghosts, num_owners } => write!(
                f,
                "Number of ghosts ({}) and ghost owners ({}) differ.",
                num_ghosts, num_owners
            ),
            IndexMapError::GhostOutOfBounds { ghost, num_blocks } => {
                write!(f, "Ghost block {} is out of bounds for {} blocks.", ghost, num_blocks)
            }
            IndexMapError::GhostOwnedLocally { ghost } => {
                write!(f, "Ghost block {} is owned by this process.", ghost)
            }
            IndexMapError::NoProcesses => write!(f, "Need at least one process."),
        }
    }
}

impl Error for IndexMapError {}

/// Contiguous ownership of one matrix dimension, with ghost blocks owned by other processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMap {
    local_range: Range<usize>,
    size_global: usize,
    block_size: usize,
    ghosts: Vec<usize>,
    ghost_owners: Vec<usize>,
}

impl IndexMap {
    /// Creates an index map from an owned index range and a list of ghost blocks with owners.
    ///
    /// `local_range` and `size_global` are given in indices, `ghosts` in blocks.
    pub fn new(
        local_range: Range<usize>,
        size_global: usize,
        block_size: usize,
        ghosts: Vec<usize>,
        ghost_owners: Vec<usize>,
    ) -> Result<Self, IndexMapError> {
        if block_size == 0 {
            return Err(IndexMapError::InvalidBlockSize);
        }

        let aligned = [local_range.start, local_range.end, size_global]
            .iter()
            .all(|&index| index % block_size == 0);
        if local_range.start > local_range.end || local_range.end > size_global || !aligned {
            return Err(IndexMapError::InvalidRange {
                range: local_range,
                size_global,
            });
        }

        if ghosts.len() != ghost_owners.len() {
            return Err(IndexMapError::GhostCountMismatch {
                num_ghosts: ghosts.len(),
                num_owners: ghost_owners.len(),
            });
        }

        let num_blocks = size_global / block_size;
        let owned_blocks = local_range.start / block_size..local_range.end / block_size;
        for &ghost in &ghosts {
            if ghost >= num_blocks {
                return Err(IndexMapError::GhostOutOfBounds { ghost, num_blocks });
            }
            if owned_blocks.contains(&ghost) {
                return Err(IndexMapError::GhostOwnedLocally { ghost });
            }
        }

        Ok(Self {
            local_range,
            size_global,
            block_size,
            ghosts,
            ghost_owners,
        })
    }

    /// Creates the index map of a single process owning all `size` indices.
    pub fn serial(size: usize) -> Self {
        Self {
            local_range: 0..size,
            size_global: size,
            block_size: 1,
            ghosts: Vec::new(),
            ghost_owners: Vec::new(),
        }
    }

    /// Creates the index map of process `rank` from block ownership offsets.
    ///
    /// Process `p` owns the blocks `offsets[p] .. offsets[p + 1]`, so `offsets` has one entry
    /// more than there are processes. Owners of the ghost blocks are looked up in `offsets`.
    pub fn from_ownership_offsets(
        offsets: &[usize],
        rank: usize,
        block_size: usize,
        ghosts: Vec<usize>,
    ) -> Result<Self, IndexMapError> {
        let valid_offsets = offsets.first() == Some(&0) && offsets.windows(2).all(|w| w[0] <= w[1]);
        if !valid_offsets {
            return Err(IndexMapError::InvalidOffsets);
        }

        let num_processes = offsets.len() - 1;
        if rank >= num_processes {
            return Err(IndexMapError::RankOutOfBounds { rank, num_processes });
        }

        let num_blocks = offsets[num_processes];
        let ghost_owners = ghosts
            .iter()
            .map(|&ghost| {
                if ghost < num_blocks {
                    // The owner is the last process whose first block is not after the ghost
                    Ok(offsets.partition_point(|&offset| offset <= ghost) - 1)
                } else {
                    Err(IndexMapError::GhostOutOfBounds { ghost, num_blocks })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let local_range = block_size * offsets[rank]..block_size * offsets[rank + 1];
        Self::new(local_range, block_size * num_blocks, block_size, ghosts, ghost_owners)
    }

    pub fn ghosts(&self) -> &[usize] {
        &self.ghosts
    }
}

impl OwnershipMap for IndexMap {
    fn local_range(&self) -> Range<usize> {
        self.local_range.clone()
    }

    fn size_global(&self) -> usize {
        self.size_global
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn local_to_global_unowned(&self) -> &[usize] {
        &self.ghosts
    }

    fn off_process_owner(&self) -> &[usize] {
        &self.ghost_owners
    }
}

/// Splits `num_blocks` blocks into contiguous ownership offsets for `num_processes` processes.
///
/// The first `num_blocks % num_processes` processes own one block more than the rest.
pub fn uniform_ownership_offsets(num_blocks: usize, num_processes: usize) -> Result<Vec<usize>, IndexMapError> {
    if num_processes == 0 {
        return Err(IndexMapError::NoProcesses);
    }
    let base = num_blocks / num_processes;
    let remainder = num_blocks % num_processes;
    let mut offsets = Vec::with_capacity(num_processes + 1);
    offsets.push(0);
    for p in 0..num_processes {
        let count = base + usize::from(p < remainder);
        offsets.push(offsets[p] + count);
    }
    Ok(offsets)
}
