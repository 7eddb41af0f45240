//! The parallel walk engine
//!
//! Split into the coordinator (owns pending work and termination) and
//! the workers (read directories and run the callback).

mod coordinator;
mod worker;

pub use coordinator::walk;
