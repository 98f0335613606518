use crate::comm::Communicator;
use crate::error::SparsityError;
use crate::index_map::OwnershipMap;
use crate::pattern::DistributedSparsityPattern;
use itertools::Itertools;
use log::{debug, log_enabled, Level};

impl<'a, M, C> DistributedSparsityPattern<'a, M, C>
where
    M: OwnershipMap + ?Sized,
    C: Communicator + ?Sized,
{
    /// Sends every buffered non-local entry to the process owning its row and merges the
    /// entries received from other processes.
    ///
    /// This is a collective operation: every process of the communicator must call it, and it
    /// must be called exactly once. A process that never calls it blocks all others. After
    /// finalization the pattern is read-only.
    ///
    /// Received entries are validated before any of them is merged. An entry whose row is not
    /// owned by this process indicates inconsistent ownership maps across processes and is
    /// reported as [`SparsityError::ReceivedRowOutOfRange`].
    pub fn finalize(&mut self) -> Result<(), SparsityError> {
        if self.finalized {
            return Err(SparsityError::AlreadyFinalized);
        }

        if log_enabled!(Level::Debug) {
            self.report_statistics();
        }

        if self.comm.size() > 1 {
            let outgoing = self.route_non_local();
            let num_sent = self.non_local.len() / 2;
            let received = self.comm.all_to_all(outgoing)?;
            let num_received = self.merge_received(&received)?;
            debug!(
                "Process {}: sent {} and received {} non-local sparsity entries",
                self.comm.rank(),
                num_sent,
                num_received
            );
        }

        self.non_local.clear();
        self.finalized = true;
        Ok(())
    }

    /// Buckets the non-local entries by owning process, translating rows to global indices.
    ///
    /// Owners were validated when the entries were buffered.
    fn route_non_local(&self) -> Vec<Vec<usize>> {
        let primary_map = self.primary_map();
        let local_size = primary_map.size();
        let block_size = primary_map.block_size();
        let owners = primary_map.off_process_owner();
        let ghosts = primary_map.local_to_global_unowned();
        let mut outgoing = vec![Vec::new(); self.comm.size()];
        for (local_row, global_col) in self.non_local.iter().copied().tuples::<(usize, usize)>() {
            debug_assert!(local_row >= local_size);
            let offset = local_row - local_size;
            let ghost = offset / block_size;
            let component = offset % block_size;

            let owner = owners[ghost];
            debug_assert_ne!(owner, self.comm.rank(), "Ghost rows must be owned by another process");

            let global_row = block_size * ghosts[ghost] + component;
            outgoing[owner].extend_from_slice(&[global_row, global_col]);
        }
        outgoing
    }

    /// Merges received (global row, global column) pairs and returns the number of pairs.
    fn merge_received(&mut self, received: &[Vec<usize>]) -> Result<usize, SparsityError> {
        let owned_rows = self.primary_map().local_range();
        let owned_cols = self.codim_map().local_range();

        for (source, payload) in received.iter().enumerate() {
            if payload.len() % 2 != 0 {
                return Err(SparsityError::MalformedPayload {
                    source,
                    len: payload.len(),
                });
            }
            let foreign_row = payload
                .iter()
                .step_by(2)
                .find(|&row| !owned_rows.contains(row));
            if let Some(&index) = foreign_row {
                return Err(SparsityError::ReceivedRowOutOfRange {
                    index,
                    range: owned_rows,
                    source,
                });
            }
        }

        let mut count = 0;
        for payload in received {
            for (global_row, global_col) in payload.iter().copied().tuples::<(usize, usize)>() {
                self.blocks
                    .insert(global_row - owned_rows.start, global_col, &owned_cols);
                count += 1;
            }
        }
        Ok(count)
    }
}
