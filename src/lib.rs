//! Construction of sparsity patterns for matrices distributed across processes.
//!
//! Before a distributed sparse matrix can be allocated, every process needs to know which
//! entries of its locally owned rows are structurally non-zero, and which of those couple to
//! columns owned by other processes. [`DistributedSparsityPattern`] collects this information
//! from element-wise insertions and reconciles entries inserted by processes that do not own
//! the row in a single collective exchange.
//!
//! ```
//! use fenris_sparsity::comm::SerialComm;
//! use fenris_sparsity::index_map::IndexMap;
//! use fenris_sparsity::{DistributedSparsityPattern, IndexSpace, PrimaryDim};
//!
//! let map = IndexMap::serial(3);
//! let mut pattern = DistributedSparsityPattern::new(&SerialComm, [&map, &map], PrimaryDim::Row);
//! pattern.insert(IndexSpace::Local, &[0, 1], &[0, 1]).unwrap();
//! pattern.insert(IndexSpace::Local, &[1, 2], &[1, 2]).unwrap();
//! pattern.finalize().unwrap();
//! assert_eq!(pattern.num_nonzeros(), 7);
//! ```
pub mod assembly;
pub mod comm;
pub mod error;
pub mod index_map;
pub mod pattern;
pub mod statistics;

pub use error::SparsityError;
pub use pattern::{DistributedSparsityPattern, EntryOrder, IndexSpace, PrimaryDim};

pub extern crate nalgebra_sparse;
