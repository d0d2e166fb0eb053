//! Emberline slot-occupancy mining engine.
//!
//! N independently priced slots, each a reverse Dutch auction. Mining a
//! slot displaces the current occupant: the price is fee-split with the
//! largest share credited to the outgoing occupant's pull-payment
//! balance, and the emission accrued over their occupancy is minted to
//! them. Occupants may re-mine their own slot (self-displacement is a
//! first-class path).
//!
//! Capacity may only grow. Raising it does NOT rescale the emission
//! rate stored on already-active slots — an occupant keeps the rate
//! fixed at their last mine until displaced again. This is a documented
//! economic-drift hazard of the platform, replicated faithfully.

pub mod config;
pub mod engine;
pub mod slot;

pub use config::*;
pub use engine::*;
pub use slot::*;
