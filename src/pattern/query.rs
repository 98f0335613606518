use crate::comm::Communicator;
use crate::index_map::OwnershipMap;
use crate::pattern::{DistributedSparsityPattern, EntryOrder, PrimaryDim};
use crate::statistics::PatternStatistics;
use itertools::{izip, Itertools};
use log::info;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt;
use std::ops::Range;

fn collect_rows(sets: &[FxHashSet<usize>], order: EntryOrder) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = sets
        .iter()
        .map(|set| set.iter().copied().collect())
        .collect();
    if order == EntryOrder::Sorted {
        rows.par_iter_mut().for_each(|row| row.sort_unstable());
    }
    rows
}

impl<'a, M, C> DistributedSparsityPattern<'a, M, C>
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    /// The tensor rank of the pattern, which is always 2.
    pub fn rank(&self) -> usize {
        2
    }

    pub fn primary_dim(&self) -> PrimaryDim {
        self.primary_dim
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The range of global indices owned by this process in dimension `dim`.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= 2`.
    pub fn local_range(&self, dim: usize) -> Range<usize> {
        assert!(dim < 2, "Sparsity patterns only have dimensions 0 and 1");
        self.index_maps[dim].local_range()
    }

    /// The global number of rows and columns.
    pub fn global_dims(&self) -> [usize; 2] {
        [self.index_maps[0].size_global(), self.index_maps[1].size_global()]
    }

    /// Total number of entries in the diagonal and off-diagonal blocks.
    pub fn num_nonzeros(&self) -> usize {
        let diagonal: usize = self.blocks.diagonal.iter().map(FxHashSet::len).sum();
        let off_diagonal: usize = self.blocks.off_diagonal.iter().map(FxHashSet::len).sum();
        diagonal + off_diagonal
    }

    /// Number of diagonal block entries per local row.
    pub fn num_nonzeros_diagonal(&self) -> Vec<usize> {
        self.blocks.diagonal.iter().map(FxHashSet::len).collect()
    }

    /// Number of off-diagonal block entries per local row.
    pub fn num_nonzeros_off_diagonal(&self) -> Vec<usize> {
        self.blocks.off_diagonal.iter().map(FxHashSet::len).collect()
    }

    /// Number of entries per local row, summed over both blocks.
    pub fn num_local_nonzeros(&self) -> Vec<usize> {
        izip!(&self.blocks.diagonal, &self.blocks.off_diagonal)
            .map(|(diagonal, off_diagonal)| diagonal.len() + off_diagonal.len())
            .collect()
    }

    /// Number of buffered entries for rows owned by other processes.
    pub fn num_non_local(&self) -> usize {
        self.non_local.len() / 2
    }

    /// Global column indices of the diagonal block, per local row.
    pub fn diagonal_pattern(&self, order: EntryOrder) -> Vec<Vec<usize>> {
        collect_rows(&self.blocks.diagonal, order)
    }

    /// Global column indices of the off-diagonal block, per local row.
    pub fn off_diagonal_pattern(&self, order: EntryOrder) -> Vec<Vec<usize>> {
        collect_rows(&self.blocks.off_diagonal, order)
    }

    pub fn statistics(&self) -> PatternStatistics {
        PatternStatistics {
            global_dims: self.global_dims(),
            num_diagonal: self.blocks.diagonal.iter().map(FxHashSet::len).sum(),
            num_off_diagonal: self.blocks.off_diagonal.iter().map(FxHashSet::len).sum(),
            num_non_local: self.num_non_local(),
        }
    }

    /// Logs the statistics of this process and waits for all other processes.
    ///
    /// Collective: every process of the communicator must call it. No data is exchanged; the
    /// barrier only keeps diagnostic output of consecutive phases apart.
    pub fn report_statistics(&self) -> PatternStatistics {
        let statistics = self.statistics();
        for line in statistics.to_string().lines() {
            info!("Process {}: {}", self.comm.rank(), line);
        }
        self.comm.barrier();
        statistics
    }
}

/// Prints the diagonal block row by row, with sorted global column indices.
///
/// Rows are labelled with their global index. The alternate form (`{:#}`) additionally lists
/// the off-diagonal columns of each row after a `|`.
impl<'a, M, C> fmt::Display for DistributedSparsityPattern<'a, M, C>
where
    M: OwnershipMap + ?Sized,
    C: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.primary_dim {
            PrimaryDim::Row => "Row",
            PrimaryDim::Column => "Col",
        };
        let offset = self.index_maps[self.primary_dim.index()].local_range().start;
        let verbose = f.alternate();

        for (i, (diagonal, off_diagonal)) in
            izip!(&self.blocks.diagonal, &self.blocks.off_diagonal).enumerate()
        {
            write!(f, "{} {}:", label, offset + i)?;
            for col in diagonal.iter().sorted() {
                write!(f, " {}", col)?;
            }
            if verbose && !off_diagonal.is_empty() {
                write!(f, " |")?;
                for col in off_diagonal.iter().sorted() {
                    write!(f, " {}", col)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
