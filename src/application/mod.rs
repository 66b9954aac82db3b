//! Application layer driving donation attempts.
//!
//! [`coordinator::DonationCoordinator`] is the entry point: it initiates donations,
//! verifies payments and resumes flows interrupted by the payment redirect. The
//! per-payment-identifier guard and retry state it relies on lives in
//! [`registry::VerificationRegistry`].

pub mod coordinator;
pub mod registry;
