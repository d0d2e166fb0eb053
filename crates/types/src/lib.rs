//! Emberline core types.
//!
//! Shared vocabulary for the mining and chance-game engines: account
//! identifiers with a human readable address encoding, token scalar
//! aliases, exact basis-point arithmetic, and the structured event model
//! emitted on every engine state transition.
//!
//! Monetary unit: spark. 1 EMBER = 100_000_000 sparks.

pub mod address;
pub mod events;
pub mod scalars;

pub use address::*;
pub use events::*;
pub use scalars::*;
