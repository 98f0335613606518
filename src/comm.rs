//! Collective transport used to exchange sparsity entries between processes.
//!
//! The pattern builder only needs three collective operations: an all-to-all exchange of
//! index buffers, a barrier, and rank/size queries. [`SerialComm`] covers the single-process
//! case, [`ThreadComm`] runs a group of ranks as threads inside one process and, with the
//! `mpi` feature, `MpiComm` wraps an MPI communicator.
use std::error::Error;
use std::fmt;

mod thread;

#[cfg(feature = "mpi")]
mod mpi_comm;

pub use thread::ThreadComm;

#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

pub trait Communicator {
    /// The rank of this process in `0 .. size()`.
    fn rank(&self) -> usize;

    /// The number of processes taking part in collective operations.
    fn size(&self) -> usize;

    /// Sends `send[p]` to process `p` and returns the buffers received from every process,
    /// indexed by source rank.
    ///
    /// This is a collective operation: it blocks until every process in the group has called it.
    fn all_to_all(&self, send: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>, CommError>;

    /// Blocks until every process in the group has reached the barrier.
    fn barrier(&self);
}

impl<C: Communicator + ?Sized> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn all_to_all(&self, send: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>, CommError> {
        (**self).all_to_all(send)
    }

    fn barrier(&self) {
        (**self).barrier()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// The number of outgoing buffers does not match the number of processes.
    BufferCountMismatch { expected: usize, actual: usize },
    /// A peer left the group before the exchange completed.
    Disconnected { rank: usize },
    /// A buffer exceeds what the transport can describe in a single message.
    MessageTooLarge { len: usize },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommError::BufferCountMismatch { expected, actual } => write!(
                f,
                "Expected one outgoing buffer per process ({}), got {}.",
                expected, actual
            ),
            CommError::Disconnected { rank } => {
                write!(f, "Process {} disconnected during collective operation.", rank)
            }
            CommError::MessageTooLarge { len } => {
                write!(f, "Buffer of length {} is too large for a single message.", len)
            }
        }
    }
}

impl Error for CommError {}

/// Checks that there is exactly one outgoing buffer per process.
pub(crate) fn check_buffer_count(send: &[Vec<usize>], size: usize) -> Result<(), CommError> {
    if send.len() == size {
        Ok(())
    } else {
        Err(CommError::BufferCountMismatch {
            expected: size,
            actual: send.len(),
        })
    }
}

/// A communicator consisting of the calling process only.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_to_all(&self, send: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>, CommError> {
        check_buffer_count(&send, 1)?;
        Ok(send)
    }

    fn barrier(&self) {}
}
