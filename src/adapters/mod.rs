//! Adapters - implementations of the ports for real and test infrastructure.

pub mod ai;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod storage;
