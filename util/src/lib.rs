//! Test fixtures: structured quad grids partitioned across a number of ranks.
use itertools::iproduct;
use std::collections::BTreeSet;

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Cells of a uniform `nx` x `ny` quad grid with row-major node numbering.
pub fn unit_square_quad_cells(nx: usize, ny: usize) -> Vec<[usize; 4]> {
    let node = |i: usize, j: usize| j * (nx + 1) + i;
    iproduct!(0..ny, 0..nx)
        .map(|(j, i)| [node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1)])
        .collect()
}

/// All (row, column) pairs coupled by the given cells, with `sdim` indices per node.
pub fn expected_entries(cells: &[[usize; 4]], sdim: usize) -> BTreeSet<(usize, usize)> {
    let mut entries = BTreeSet::new();
    for cell in cells {
        for (node_i, node_j) in iproduct!(cell, cell) {
            for (s_i, s_j) in iproduct!(0..sdim, 0..sdim) {
                entries.insert((sdim * node_i + s_i, sdim * node_j + s_j));
            }
        }
    }
    entries
}

/// The view of one rank on a partitioned grid.
#[derive(Debug, Clone)]
pub struct RankGrid {
    /// Global indices of nodes referenced by this rank's cells but owned elsewhere.
    pub ghost_nodes: Vec<usize>,
    /// This rank's cells in local node numbering (owned nodes first, then ghosts).
    pub local_cells: Vec<[usize; 4]>,
}

#[derive(Debug, Clone)]
pub struct GridPartition {
    pub global_cells: Vec<[usize; 4]>,
    /// Rank `r` owns the nodes `node_offsets[r] .. node_offsets[r + 1]`.
    pub node_offsets: Vec<usize>,
    pub ranks: Vec<RankGrid>,
}

impl GridPartition {
    pub fn num_nodes(&self) -> usize {
        *self.node_offsets.last().unwrap()
    }
}

/// Partitions the nodes of an `nx` x `ny` quad grid into contiguous, nearly equal chunks.
///
/// A cell belongs to the rank owning its lowest-numbered node, so ranks regularly reference
/// nodes (and hence matrix rows) owned by their neighbors.
pub fn partition_quad_grid(nx: usize, ny: usize, num_ranks: usize) -> GridPartition {
    let num_nodes = (nx + 1) * (ny + 1);
    let base = num_nodes / num_ranks;
    let remainder = num_nodes % num_ranks;
    let mut node_offsets = vec![0];
    for r in 0..num_ranks {
        node_offsets.push(node_offsets[r] + base + usize::from(r < remainder));
    }
    let owner = |node: usize| node_offsets.partition_point(|&offset| offset <= node) - 1;

    let global_cells = unit_square_quad_cells(nx, ny);
    let ranks = (0..num_ranks)
        .map(|rank| {
            let owned = node_offsets[rank]..node_offsets[rank + 1];
            let cells: Vec<_> = global_cells
                .iter()
                .filter(|cell| owner(cell[0]) == rank)
                .collect();
            let ghost_nodes: Vec<usize> = cells
                .iter()
                .flat_map(|cell| cell.iter().copied())
                .filter(|node| !owned.contains(node))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let to_local = |node: usize| {
                if owned.contains(&node) {
                    node - owned.start
                } else {
                    owned.len() + ghost_nodes.binary_search(&node).unwrap()
                }
            };
            let local_cells = cells.iter().map(|&&cell| cell.map(&to_local)).collect();
            RankGrid {
                ghost_nodes,
                local_cells,
            }
        })
        .collect();

    GridPartition {
        global_cells,
        node_offsets,
        ranks,
    }
}
