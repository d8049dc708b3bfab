//! Phasegate: phase-gated task review engine.
//!
//! This crate tracks tasks through ordered review phases, gates each phase
//! on a checklist and submitted proof, and locks overdue tasks until a
//! reviewer decides on access.
//!
//! # Architecture
//!
//! Phasegate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, files, memory)
//!
//! # Modules
//!
//! - [`task`]: Task aggregate, review workflow services and adapters
//! - [`config`]: Engine configuration loaded from TOML
//! - [`notify`]: Notification message templates

pub mod config;
pub mod notify;
pub mod task;
