//! Emberline chance-game engine.
//!
//! A single global Dutch-auction prices each spin. Every spin mints the
//! accrued emission into the engine's own reward balance (the prize
//! pool) and issues a randomness request; the provider's callback
//! settles it later against the LIVE pool balance, after arbitrary
//! delay and in any order. Because every odds entry is capped well
//! below 100%, no adversarial settlement ordering can drain the pool
//! past solvency.

pub mod config;
pub mod engine;

pub use config::*;
pub use engine::*;
