use crate::comm::Communicator;
use crate::error::SparsityError;
use crate::index_map::OwnershipMap;
use crate::pattern::{DistributedSparsityPattern, IndexSpace};
use log::trace;

impl<'a, M, C> DistributedSparsityPattern<'a, M, C>
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    /// Marks every pair `(rows[a], cols[b])` as structurally non-zero.
    ///
    /// This is typically called once per element with the element's row and column indices.
    /// Insertion is idempotent and order independent.
    ///
    /// With [`IndexSpace::Global`], every primary index must be owned by this process; there is
    /// no way to defer entries of other processes. With [`IndexSpace::Local`], primary indices
    /// referring to ghosts are buffered and sent to their owner during
    /// [`finalize`](Self::finalize). On a single process both variants insert directly.
    ///
    /// The whole batch is validated before anything is inserted, so a rejected batch leaves the
    /// pattern unchanged.
    pub fn insert(
        &mut self,
        index_space: IndexSpace,
        rows: &[usize],
        cols: &[usize],
    ) -> Result<(), SparsityError> {
        if self.finalized {
            return Err(SparsityError::AlreadyFinalized);
        }

        let (primary, codim) = match self.primary_dim.index() {
            0 => (rows, cols),
            _ => (cols, rows),
        };
        trace!(
            "Inserting {} x {} block ({:?} indices)",
            primary.len(),
            codim.len(),
            index_space
        );

        if self.comm.size() == 1 {
            self.insert_sequential(primary, codim)
        } else {
            match index_space {
                IndexSpace::Global => self.insert_global(primary, codim),
                IndexSpace::Local => self.insert_local(primary, codim),
            }
        }
    }

    /// Marks a single entry as structurally non-zero.
    pub fn insert_entry(
        &mut self,
        index_space: IndexSpace,
        row: usize,
        col: usize,
    ) -> Result<(), SparsityError> {
        self.insert(index_space, &[row], &[col])
    }

    /// A single process owns everything, so local and global indices coincide.
    fn insert_sequential(&mut self, primary: &[usize], codim: &[usize]) -> Result<(), SparsityError> {
        let owned_rows = 0..self.blocks.num_rows();
        if let Some(&index) = primary.iter().find(|&i| !owned_rows.contains(i)) {
            return Err(SparsityError::RowOutOfRange {
                index,
                range: owned_rows,
            });
        }
        check_global_indices(codim, self.codim_map().size_global())?;

        for &i in primary {
            self.blocks.diagonal[i].extend(codim.iter().copied());
        }
        Ok(())
    }

    fn insert_global(&mut self, primary: &[usize], codim: &[usize]) -> Result<(), SparsityError> {
        let owned_rows = self.primary_map().local_range();
        let owned_cols = self.codim_map().local_range();

        if let Some(&index) = primary.iter().find(|&i| !owned_rows.contains(i)) {
            return Err(SparsityError::RowOutOfRange {
                index,
                range: owned_rows,
            });
        }
        check_global_indices(codim, self.codim_map().size_global())?;

        for &i in primary {
            let local_row = i - owned_rows.start;
            for &j in codim {
                self.blocks.insert(local_row, j, &owned_cols);
            }
        }
        Ok(())
    }

    fn insert_local(&mut self, primary: &[usize], codim: &[usize]) -> Result<(), SparsityError> {
        let primary_map = self.primary_map();
        let codim_map = self.codim_map();
        check_local_indices(primary, self.primary_dim.index(), primary_map.local_extent())?;
        check_local_indices(codim, self.primary_dim.codim(), codim_map.local_extent())?;
        check_ghost_owners(primary, primary_map, self.comm.size())?;

        // Columns are classified by their global index, so translate them once per batch
        self.codim_workspace.clear();
        self.codim_workspace
            .extend(codim.iter().map(|&j| codim_map.local_to_global(j)));

        let local_size = primary_map.size();
        let owned_cols = codim_map.local_range();
        for &i in primary {
            if i < local_size {
                for &global_col in &self.codim_workspace {
                    self.blocks.insert(i, global_col, &owned_cols);
                }
            } else {
                for &global_col in &self.codim_workspace {
                    self.non_local.push(i);
                    self.non_local.push(global_col);
                }
            }
        }
        Ok(())
    }
}

fn check_global_indices(indices: &[usize], size_global: usize) -> Result<(), SparsityError> {
    match indices.iter().find(|&&j| j >= size_global) {
        Some(&index) => Err(SparsityError::ColumnOutOfRange { index, size_global }),
        None => Ok(()),
    }
}

/// Checks that every ghost among the local `indices` is owned by a process of the communicator.
///
/// Buffered entries are routed to these owners in `finalize`, which has no failure path before
/// the exchange.
fn check_ghost_owners<M>(indices: &[usize], map: &M, num_processes: usize) -> Result<(), SparsityError>
where
    M: OwnershipMap + ?Sized,
{
    let local_size = map.size();
    let block_size = map.block_size();
    let owners = map.off_process_owner();
    let invalid_owner = indices
        .iter()
        .filter(|&&i| i >= local_size)
        .map(|&i| owners[(i - local_size) / block_size])
        .find(|&owner| owner >= num_processes);
    match invalid_owner {
        Some(owner) => Err(SparsityError::InvalidOwner { owner, num_processes }),
        None => Ok(()),
    }
}

fn check_local_indices(indices: &[usize], dim: usize, extent: usize) -> Result<(), SparsityError> {
    match indices.iter().find(|&&i| i >= extent) {
        Some(&index) => Err(SparsityError::LocalIndexOutOfRange { dim, index, extent }),
        None => Ok(()),
    }
}
