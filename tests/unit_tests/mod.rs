use fenris_sparsity::comm::Communicator;
use fenris_sparsity::index_map::{uniform_ownership_offsets, IndexMap, OwnershipMap};
use fenris_sparsity::{DistributedSparsityPattern, EntryOrder};
use std::collections::BTreeSet;

mod finalize;

/// Index map of `rank` when `n` indices are split uniformly across `num_ranks` ranks.
fn uniform_map(n: usize, num_ranks: usize, rank: usize, ghosts: Vec<usize>) -> IndexMap {
    let offsets = uniform_ownership_offsets(n, num_ranks).unwrap();
    IndexMap::from_ownership_offsets(&offsets, rank, 1, ghosts).unwrap()
}

/// Index map of `rank` that references every index of the uniform split as a ghost.
fn fully_ghosted_map(n: usize, num_ranks: usize, rank: usize) -> IndexMap {
    let offsets = uniform_ownership_offsets(n, num_ranks).unwrap();
    let owned = offsets[rank]..offsets[rank + 1];
    let ghosts = (0..n).filter(|i| !owned.contains(i)).collect();
    IndexMap::from_ownership_offsets(&offsets, rank, 1, ghosts).unwrap()
}

/// All (global row, global column) entries stored for the locally owned rows of a row-major
/// pattern.
fn owned_entries<M, C>(pattern: &DistributedSparsityPattern<M, C>) -> BTreeSet<(usize, usize)>
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    let offset = pattern.local_range(0).start;
    let diagonal = pattern.diagonal_pattern(EntryOrder::Unsorted);
    let off_diagonal = pattern.off_diagonal_pattern(EntryOrder::Unsorted);
    diagonal
        .iter()
        .zip(&off_diagonal)
        .enumerate()
        .flat_map(|(i, (diag_row, off_row))| {
            diag_row
                .iter()
                .chain(off_row)
                .map(move |&col| (offset + i, col))
        })
        .collect()
}

/// Checks that the diagonal and off-diagonal blocks of every local row are disjoint and
/// classified by ownership of the column.
fn assert_blocks_consistent<M, C>(pattern: &DistributedSparsityPattern<M, C>)
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    let owned_cols = pattern.local_range(1);
    let diagonal = pattern.diagonal_pattern(EntryOrder::Sorted);
    let off_diagonal = pattern.off_diagonal_pattern(EntryOrder::Sorted);
    assert_eq!(diagonal.len(), pattern.local_range(0).len());
    assert_eq!(off_diagonal.len(), diagonal.len());
    for (diag_row, off_row) in diagonal.iter().zip(&off_diagonal) {
        assert!(diag_row.iter().all(|col| owned_cols.contains(col)));
        assert!(off_row.iter().all(|col| !owned_cols.contains(col)));
    }
}
