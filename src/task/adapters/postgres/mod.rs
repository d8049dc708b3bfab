//! `PostgreSQL` adapters for task review persistence.
//!
//! Embedded aggregate state (validations, access, closure, issues) is
//! stored as JSONB next to scalar columns; every task write is a
//! compare-and-swap on the `revision` column.

mod conversion;
mod models;
mod repository;
mod schema;
mod steps;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

pub use repository::PostgresTaskRepository;
pub use steps::{PostgresSubmissionRepository, PostgresTaskStepRepository};
