use crate::comm::{check_buffer_count, CommError, Communicator};
use ::mpi::datatype::{Partition, PartitionMut};
use ::mpi::topology::SimpleCommunicator;
use ::mpi::traits::{Communicator as _, CommunicatorCollectives};
use ::mpi::Count;

/// A [`Communicator`] backed by an MPI communicator.
pub struct MpiComm {
    comm: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(comm: SimpleCommunicator) -> Self {
        Self { comm }
    }

    pub fn inner(&self) -> &SimpleCommunicator {
        &self.comm
    }
}

impl From<SimpleCommunicator> for MpiComm {
    fn from(comm: SimpleCommunicator) -> Self {
        Self::new(comm)
    }
}

fn to_count(len: usize) -> Result<Count, CommError> {
    Count::try_from(len).map_err(|_| CommError::MessageTooLarge { len })
}

/// Offsets of consecutive buffers with the given counts in one contiguous message.
fn displacements(counts: &[Count]) -> Result<Vec<Count>, CommError> {
    let mut displs = Vec::with_capacity(counts.len());
    let mut offset: Count = 0;
    for &count in counts {
        displs.push(offset);
        offset = offset.checked_add(count).ok_or_else(|| CommError::MessageTooLarge {
            len: counts.iter().map(|&count| count as usize).sum(),
        })?;
    }
    Ok(displs)
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.comm.rank() as usize
    }

    fn size(&self) -> usize {
        self.comm.size() as usize
    }

    fn all_to_all(&self, send: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>, CommError> {
        check_buffer_count(&send, self.size())?;

        // Exchange counts first, then the data as one variable-count all-to-all
        let send_counts = send
            .iter()
            .map(|buffer| to_count(buffer.len()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut recv_counts = vec![0 as Count; self.size()];
        self.comm.all_to_all_into(&send_counts[..], &mut recv_counts[..]);

        let send_data: Vec<u64> = send.iter().flatten().map(|&index| index as u64).collect();
        let send_displs = displacements(&send_counts)?;
        let recv_displs = displacements(&recv_counts)?;
        let total_received = recv_counts.iter().map(|&count| count as usize).sum();
        let mut recv_data = vec![0u64; total_received];

        {
            let send_partition = Partition::new(&send_data[..], &send_counts[..], &send_displs[..]);
            let mut recv_partition =
                PartitionMut::new(&mut recv_data[..], &recv_counts[..], &recv_displs[..]);
            self.comm
                .all_to_all_varcount_into(&send_partition, &mut recv_partition);
        }

        let received = recv_counts
            .iter()
            .zip(&recv_displs)
            .map(|(&count, &displ)| {
                let range = displ as usize..(displ + count) as usize;
                recv_data[range].iter().map(|&index| index as usize).collect()
            })
            .collect();
        Ok(received)
    }

    fn barrier(&self) {
        self.comm.barrier();
    }
}
