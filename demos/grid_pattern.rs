//! Builds the sparsity pattern of a vector-valued problem on a quad grid, partitioned across
//! a number of threads that act as processes.
//!
//! Usage: `cargo run --example grid_pattern -- [resolution] [processes]`
use eyre::{eyre, WrapErr};
use fenris_sparsity::assembly::global::DistributedPatternAssembler;
use fenris_sparsity::assembly::local::LocalConnectivity;
use fenris_sparsity::comm::{Communicator, ThreadComm};
use fenris_sparsity::index_map::IndexMap;
use fenris_sparsity::statistics::PatternStatistics;
use util::partition_quad_grid;

const SOLUTION_DIM: usize = 2;

fn parse_arg(args: &[String], index: usize, default: usize) -> eyre::Result<usize> {
    match args.get(index) {
        Some(arg) => arg
            .parse()
            .wrap_err_with(|| format!("invalid argument {}: {}", index, arg)),
        None => Ok(default),
    }
}

fn main() -> eyre::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let resolution = parse_arg(&args, 1, 8)?;
    let num_processes = parse_arg(&args, 2, 3)?;
    if num_processes == 0 {
        return Err(eyre!("need at least one process"));
    }

    let partition = partition_quad_grid(resolution, resolution, num_processes);
    println!(
        "Grid {}x{} with {} nodes, {} unknowns per node, {} processes",
        resolution,
        resolution,
        partition.num_nodes(),
        SOLUTION_DIM,
        num_processes
    );

    let results = ThreadComm::run(num_processes, |comm| -> eyre::Result<(usize, PatternStatistics, usize)> {
        let grid = &partition.ranks[comm.rank()];
        let map = IndexMap::from_ownership_offsets(
            &partition.node_offsets,
            comm.rank(),
            SOLUTION_DIM,
            grid.ghost_nodes.clone(),
        )?;
        let connectivity = LocalConnectivity::new(&grid.local_cells).with_solution_dim(SOLUTION_DIM);
        let pattern = DistributedPatternAssembler::default().assemble_pattern(&comm, [&map, &map], &connectivity)?;
        let csr = pattern.to_local_csr_pattern()?;
        Ok((comm.rank(), pattern.statistics(), csr.nnz()))
    });

    let mut total = 0;
    for result in results {
        let (rank, statistics, csr_nnz) = result?;
        println!("Process {}: {}", rank, statistics.to_string().replace('\n', "\n    "));
        debug_assert_eq!(csr_nnz, statistics.num_total());
        total += statistics.num_total();
    }
    println!("Global number of nonzeros: {}", total);

    Ok(())
}
