//! Sentier route table tool library.
//!
//! This library exposes the route table loader and the endpoint targets
//! used by the `sentier` binary.

pub mod config;
pub mod endpoint;
pub mod table;
