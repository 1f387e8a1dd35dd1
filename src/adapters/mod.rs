//! Adapters - implementations of the ports for real and test collaborators.

pub mod ai;
pub mod push;
pub mod store;
