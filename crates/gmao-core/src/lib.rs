//! Preventive-maintenance scheduling: due evaluation, the duplicate guard,
//! technician assignment and order generation over a pluggable store.

pub mod assignment;
pub mod due;
pub mod generator;
pub mod guard;
pub mod import;
pub mod store;
