//! # Demo Services
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide the calculator
//! and greeter toy services used by the `streambed` demo binaries and the
//! integration tests. It is not intended for production use.
//!
//! Each service is an `async_trait` trait over `streambed-core` channel
//! endpoints, a stateless reference implementation, and a thin client
//! wrapper that drives one [`streambed_core::Call`] per request.

pub mod calculator;
pub mod greeter;
