//! Donation types, backend wire types and the ports the coordinator talks through.

pub mod donation;
pub mod payment;
pub mod ports;
