//! OSCE station practice engine
//!
//! Runs timed, multi-phase clinical examination stations: a candidate moves
//! through the phases of a scenario, ticks checklist items and writes notes,
//! and on completion receives a scored result that is appended to their
//! history.

pub mod cli;
pub mod error;
pub mod observability;
pub mod scenario;
pub mod session;
pub mod store;
