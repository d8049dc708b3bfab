//! Step definitions for access review BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
