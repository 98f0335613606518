use crate::assembly::local::ElementConnectivityAssembler;
use crate::comm::Communicator;
use crate::error::SparsityError;
use crate::index_map::OwnershipMap;
use crate::pattern::{DistributedSparsityPattern, IndexSpace, PrimaryDim};
use log::debug;
use std::cell::RefCell;

/// An assembler for distributed sparsity patterns.
///
/// Every element contributes the dense block coupling all of its matrix indices. Indices are
/// inserted in local addressing, so elements touching rows owned by other processes are
/// handled by the exchange in [`DistributedSparsityPattern::finalize`].
#[derive(Debug, Default)]
pub struct DistributedPatternAssembler {
    // Buffers reused across elements (and across patterns assembled with the same assembler)
    workspace: RefCell<PatternAssemblerWorkspace>,
}

#[derive(Debug, Default)]
struct PatternAssemblerWorkspace {
    element_nodes: Vec<usize>,
    element_indices: Vec<usize>,
}

impl DistributedPatternAssembler {
    /// Inserts the element blocks of all elements into `pattern` without finalizing it.
    pub fn insert_elements<M, C>(
        &self,
        pattern: &mut DistributedSparsityPattern<'_, M, C>,
        element_assembler: &dyn ElementConnectivityAssembler,
    ) -> Result<(), SparsityError>
    where
        M: OwnershipMap + ?Sized,
        C: Communicator + ?Sized,
    {
        let ws = &mut *self.workspace.borrow_mut();
        let sdim = element_assembler.solution_dim();

        for element_index in 0..element_assembler.num_elements() {
            let node_count = element_assembler.element_node_count(element_index);
            ws.element_nodes.resize(node_count, usize::MAX);
            element_assembler.populate_element_nodes(&mut ws.element_nodes, element_index);

            ws.element_indices.clear();
            for node in &ws.element_nodes {
                ws.element_indices.extend((0..sdim).map(|s| sdim * node + s));
            }

            pattern.insert(IndexSpace::Local, &ws.element_indices, &ws.element_indices)?;
        }

        debug!(
            "Inserted {} element blocks into sparsity pattern",
            element_assembler.num_elements()
        );
        Ok(())
    }

    /// Assembles and finalizes the row-major pattern of the given elements.
    ///
    /// Collective: every process of `comm` must call this with its own elements.
    pub fn assemble_pattern<'a, M, C>(
        &self,
        comm: &'a C,
        index_maps: [&'a M; 2],
        element_assembler: &dyn ElementConnectivityAssembler,
    ) -> Result<DistributedSparsityPattern<'a, M, C>, SparsityError>
    where
        M: OwnershipMap + ?Sized,
        C: Communicator + ?Sized,
    {
        let mut pattern = DistributedSparsityPattern::new(comm, index_maps, PrimaryDim::Row);
        self.insert_elements(&mut pattern, element_assembler)?;
        pattern.finalize()?;
        Ok(pattern)
    }
}
