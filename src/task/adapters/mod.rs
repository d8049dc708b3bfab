//! Adapter implementations of the task ports.
//!
//! - [`memory`]: thread-safe in-memory implementations of every port
//! - [`postgres`]: Diesel-backed task, step and submission stores
//! - [`fs`]: directory-confined artifact storage

pub mod fs;
pub mod memory;
pub mod postgres;
