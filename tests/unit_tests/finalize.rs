use super::{assert_blocks_consistent, owned_entries, uniform_map};
use fenris_sparsity::comm::{Communicator, ThreadComm};
use fenris_sparsity::index_map::IndexMap;
use fenris_sparsity::{DistributedSparsityPattern, EntryOrder, IndexSpace, PrimaryDim, SparsityError};
use std::thread;
use std::time::Duration;

#[test]
fn ghost_row_entry_is_sent_to_its_owner() {
    // 4 x 4 matrix with two rows per process. Process 0 references global row 3 as its ghost
    // (local index 2) and inserts column 0 into it.
    let results = ThreadComm::run(2, |comm| {
        let ghosts = if comm.rank() == 0 { vec![3] } else { vec![] };
        let map = uniform_map(4, 2, comm.rank(), ghosts);
        let mut pattern = DistributedSparsityPattern::new(&comm, [&map, &map], PrimaryDim::Row);
        if comm.rank() == 0 {
            pattern.insert_entry(IndexSpace::Local, 2, 0).unwrap();
            assert_eq!(pattern.num_non_local(), 1);
        }
        pattern.finalize().unwrap();
        assert_eq!(pattern.num_non_local(), 0);
        (
            pattern.diagonal_pattern(EntryOrder::Sorted),
            pattern.off_diagonal_pattern(EntryOrder::Sorted),
        )
    });

    let (diagonal0, off_diagonal0) = &results[0];
    assert_eq!(diagonal0, &vec![Vec::<usize>::new(); 2]);
    assert_eq!(off_diagonal0, &vec![Vec::<usize>::new(); 2]);

    // Column 0 is owned by process 0, so the entry lands in the off-diagonal block of the
    // local row for global row 3
    let (diagonal1, off_diagonal1) = &results[1];
    assert_eq!(diagonal1, &vec![Vec::<usize>::new(); 2]);
    assert_eq!(off_diagonal1, &vec![vec![], vec![0]]);
}

#[test]
fn blocked_ghost_rows_are_resolved_per_component() {
    // Two processes, two blocks of size 2 each: process 0 owns indices 0..2, process 1 owns 2..4
    let results = ThreadComm::run(2, |comm| {
        let offsets = [0, 1, 2];
        let ghost = 1 - comm.rank();
        let map = IndexMap::from_ownership_offsets(&offsets, comm.rank(), 2, vec![ghost]).unwrap();
        let mut pattern = DistributedSparsityPattern::new(&comm, [&map, &map], PrimaryDim::Row);

        // Couple the second component of the ghost block with the first owned index
        pattern.insert(IndexSpace::Local, &[3], &[0]).unwrap();
        pattern.finalize().unwrap();
        assert_blocks_consistent(&pattern);
        owned_entries(&pattern)
    });

    // Process 0 sent (3, 0) to process 1, process 1 sent (1, 2) to process 0
    assert_eq!(results[0].iter().copied().collect::<Vec<_>>(), vec![(1, 2)]);
    assert_eq!(results[1].iter().copied().collect::<Vec<_>>(), vec![(3, 0)]);
}

#[test]
fn received_entries_merge_with_local_entries() {
    let results = ThreadComm::run(3, |comm| {
        // Every process references every other index as ghost
        let offsets = [0, 2, 4, 6];
        let owned = offsets[comm.rank()]..offsets[comm.rank() + 1];
        let ghosts: Vec<_> = (0..6).filter(|i| !owned.contains(i)).collect();
        let map = IndexMap::from_ownership_offsets(&offsets, comm.rank(), 1, ghosts).unwrap();
        let mut pattern = DistributedSparsityPattern::new(&comm, [&map, &map], PrimaryDim::Row);

        // All processes insert the full local block, i.e. the full matrix
        let all_local: Vec<_> = (0..6).collect();
        pattern.insert(IndexSpace::Local, &all_local, &all_local).unwrap();
        assert_eq!(pattern.num_non_local(), 4 * 6);
        pattern.finalize().unwrap();

        assert_blocks_consistent(&pattern);
        assert_eq!(pattern.num_nonzeros_diagonal(), vec![2, 2]);
        assert_eq!(pattern.num_nonzeros_off_diagonal(), vec![4, 4]);
        assert_eq!(pattern.num_local_nonzeros(), vec![6, 6]);
        owned_entries(&pattern)
    });

    for (rank, entries) in results.iter().enumerate() {
        let expected: Vec<_> = (2 * rank..2 * rank + 2)
            .flat_map(|i| (0..6).map(move |j| (i, j)))
            .collect();
        assert_eq!(entries.iter().copied().collect::<Vec<_>>(), expected);
    }
}

#[test]
fn entry_for_row_not_owned_by_receiver_is_a_protocol_violation() {
    // Process 0 believes global row 3 belongs to process 1, which only owns row 2
    let results = ThreadComm::run(2, |comm| {
        let (rows, cols) = if comm.rank() == 0 {
            (
                IndexMap::new(0..2, 4, 1, vec![3], vec![1]).unwrap(),
                IndexMap::new(0..2, 4, 1, vec![], vec![]).unwrap(),
            )
        } else {
            (
                IndexMap::new(2..3, 4, 1, vec![], vec![]).unwrap(),
                IndexMap::new(2..4, 4, 1, vec![], vec![]).unwrap(),
            )
        };
        let mut pattern = DistributedSparsityPattern::new(&comm, [&rows, &cols], PrimaryDim::Row);
        if comm.rank() == 0 {
            pattern.insert_entry(IndexSpace::Local, 2, 1).unwrap();
        }
        pattern.finalize()
    });

    assert_eq!(results[0], Ok(()));
    assert_eq!(
        results[1],
        Err(SparsityError::ReceivedRowOutOfRange {
            index: 3,
            range: 2..3,
            source: 0
        })
    );
}

#[test]
fn ghost_owner_outside_communicator_is_rejected_at_insertion() {
    let results = ThreadComm::run(2, |comm| {
        let map = if comm.rank() == 0 {
            IndexMap::new(0..2, 4, 1, vec![2, 3], vec![1, 5]).unwrap()
        } else {
            uniform_map(4, 2, 1, vec![])
        };
        let mut pattern = DistributedSparsityPattern::new(&comm, [&map, &map], PrimaryDim::Row);
        let rejected = if comm.rank() == 0 {
            pattern.insert_entry(IndexSpace::Local, 2, 0).unwrap();
            let rejected = pattern.insert(IndexSpace::Local, &[0, 3], &[1]);
            assert_eq!(pattern.num_non_local(), 1);
            assert_eq!(pattern.num_nonzeros(), 0);
            // Let process 1 enter the exchange first
            thread::sleep(Duration::from_millis(50));
            Some(rejected)
        } else {
            None
        };
        let finalized = pattern.finalize();
        (rejected, finalized, pattern.off_diagonal_pattern(EntryOrder::Sorted))
    });

    assert_eq!(
        results[0].0,
        Some(Err(SparsityError::InvalidOwner {
            owner: 5,
            num_processes: 2
        }))
    );
    assert_eq!(results[0].1, Ok(()));
    assert_eq!(results[1].1, Ok(()));
    assert_eq!(results[1].2, vec![vec![0], vec![]]);
}

#[test]
fn column_major_ghost_column_is_sent_to_its_owner() {
    // 4 x 4 matrix stored by column, two columns and two rows per process. Process 0 references
    // global column 3 as its ghost (local index 2).
    let results = ThreadComm::run(2, |comm| {
        let rows = uniform_map(4, 2, comm.rank(), vec![]);
        let ghosts = if comm.rank() == 0 { vec![3] } else { vec![] };
        let cols = uniform_map(4, 2, comm.rank(), ghosts);
        let mut pattern = DistributedSparsityPattern::new(&comm, [&rows, &cols], PrimaryDim::Column);
        if comm.rank() == 0 {
            pattern.insert(IndexSpace::Local, &[1], &[0]).unwrap();
            pattern.insert(IndexSpace::Local, &[0], &[2]).unwrap();
            assert_eq!(pattern.num_non_local(), 1);
        }
        pattern.finalize().unwrap();
        assert_eq!(pattern.num_non_local(), 0);
        (
            pattern.diagonal_pattern(EntryOrder::Sorted),
            pattern.off_diagonal_pattern(EntryOrder::Sorted),
            format!("{:#}", pattern),
        )
    });

    // Column 0 holds row 1 on process 0. Process 1 receives row 0 for column 3, which is
    // off-diagonal because row 0 is owned by process 0.
    assert_eq!(results[0].0, vec![vec![1], vec![]]);
    assert_eq!(results[0].1, vec![Vec::<usize>::new(); 2]);
    assert_eq!(results[1].0, vec![Vec::<usize>::new(); 2]);
    assert_eq!(results[1].1, vec![vec![], vec![0]]);
    assert_eq!(results[1].2, "Col 2:\nCol 3: | 0\n");
}

#[test]
fn finalize_without_non_local_entries_keeps_local_structure() {
    let results = ThreadComm::run(3, |comm| {
        let map = uniform_map(6, comm.size(), comm.rank(), vec![]);
        let mut pattern = DistributedSparsityPattern::new(&comm, [&map, &map], PrimaryDim::Row);
        let row = 2 * comm.rank();
        pattern.insert(IndexSpace::Global, &[row], &[0, 5]).unwrap();
        let before = owned_entries(&pattern);
        pattern.finalize().unwrap();
        assert_eq!(owned_entries(&pattern), before);
        pattern.num_nonzeros()
    });
    assert_eq!(results, vec![2, 2, 2]);
}
