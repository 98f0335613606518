//! Sparsity pattern assembly from element connectivity.
pub mod global;
pub mod local;
