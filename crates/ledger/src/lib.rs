//! Emberline external interface seams.
//!
//! The engines consume two collaborators specified only at their
//! boundary: a fungible/mintable token ledger and a verifiable
//! randomness provider. This crate defines the traits plus in-memory
//! implementations for node runtime and testing.

pub mod randomness;
pub mod token;

pub use randomness::*;
pub use token::*;
