//! Emberline shared economic primitives.
//!
//! The pricing clock, emission curve, and fee splitter used by both the
//! slot-mining engine and the chance-game engine, plus the validation
//! error vocabulary shared by every engine entry point.
//!
//! All money math is integer-only: floor division, explicit remainders,
//! saturating/checked arithmetic. No floats anywhere near a balance.

pub mod emission;
pub mod errors;
pub mod fees;
pub mod pricing;

pub use emission::*;
pub use errors::*;
pub use fees::*;
pub use pricing::*;
