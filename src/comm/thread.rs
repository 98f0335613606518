use crate::comm::{check_buffer_count, CommError, Communicator};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::sync::{Arc, Barrier};

#[derive(Debug)]
struct Envelope {
    source: usize,
    payload: Vec<usize>,
}

/// A group of ranks living as threads in the same process.
///
/// Every rank owns one `ThreadComm`. Messages travel through unbounded channels, one inbox per
/// rank, so sending never blocks; collective operations end with a shared barrier, which keeps
/// messages of consecutive exchanges from mixing.
///
/// ```
/// use fenris_sparsity::comm::{Communicator, ThreadComm};
///
/// let received = ThreadComm::run(3, |comm| {
///     let send = (0..comm.size()).map(|p| vec![comm.rank(), p]).collect();
///     comm.all_to_all(send).unwrap()
/// });
/// assert_eq!(received[2][0], vec![0, 2]);
/// ```
#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    outboxes: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    barrier: Arc<Barrier>,
}

impl ThreadComm {
    /// Creates the communicators of a group with `size` ranks, ordered by rank.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        assert!(size > 0, "A communicator group must contain at least one rank.");
        let (outboxes, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();
        let barrier = Arc::new(Barrier::new(size));
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| ThreadComm {
                rank,
                outboxes: outboxes.clone(),
                inbox,
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }

    /// Runs `f` on `size` ranks, each on its own thread, and returns the results ordered by rank.
    ///
    /// Panics on any rank are propagated to the caller.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(ThreadComm) -> R + Sync,
    {
        let f = &f;
        std::thread::scope(|scope| {
            let handles: Vec<_> = Self::group(size)
                .into_iter()
                .map(|comm| scope.spawn(move || f(comm)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn all_to_all(&self, send: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>, CommError> {
        check_buffer_count(&send, self.size())?;

        for (target, payload) in send.into_iter().enumerate() {
            let envelope = Envelope {
                source: self.rank,
                payload,
            };
            self.outboxes[target]
                .send(envelope)
                .map_err(|_| CommError::Disconnected { rank: target })?;
        }

        let mut received = vec![None; self.size()];
        for _ in 0..self.size() {
            let Envelope { source, payload } = self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { rank: self.rank })?;
            debug_assert!(received[source].is_none(), "Received two buffers from rank {}", source);
            received[source] = Some(payload);
        }

        self.barrier.wait();
        Ok(received.into_iter().map(Option::unwrap_or_default).collect())
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}
