//! Adapters that live inside the domain crate for convenience.
//!
//! These back unit tests and local demos. The durable local store lives in the
//! `sqlite-adapter` crate.

pub mod memory_source;
pub mod simulated_remote;
