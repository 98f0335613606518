/// Element connectivity expressed in the local addressing of one process.
///
/// Node indices refer to the local numbering of the process: owned nodes first, then ghost
/// nodes. Each node carries `solution_dim` consecutive matrix indices.
pub trait ElementConnectivityAssembler {
    fn solution_dim(&self) -> usize;

    fn num_elements(&self) -> usize;

    fn element_node_count(&self, element_index: usize) -> usize;

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize);
}

/// Connectivity of elements with a fixed number of nodes each.
#[derive(Debug, Clone, Copy)]
pub struct LocalConnectivity<'a, const N: usize> {
    cells: &'a [[usize; N]],
    solution_dim: usize,
}

impl<'a, const N: usize> LocalConnectivity<'a, N> {
    pub fn new(cells: &'a [[usize; N]]) -> Self {
        Self {
            cells,
            solution_dim: 1,
        }
    }

    pub fn with_solution_dim(self, solution_dim: usize) -> Self {
        Self { solution_dim, ..self }
    }
}

impl<'a, const N: usize> ElementConnectivityAssembler for LocalConnectivity<'a, N> {
    fn solution_dim(&self) -> usize {
        self.solution_dim
    }

    fn num_elements(&self) -> usize {
        self.cells.len()
    }

    fn element_node_count(&self, _element_index: usize) -> usize {
        N
    }

    fn populate_element_nodes(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.cells[element_index]);
    }
}
