//! Task review lifecycle and access control.
//!
//! A task passes through an ordered list of review phases. The assignee
//! submits proof for the current phase, reviewers approve or reject it, and
//! approving the final phase completes the task. Overdue tasks lock until a
//! reviewer grants access, closes the task or reassigns it. Per-phase
//! checklist steps gate proof submission. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
