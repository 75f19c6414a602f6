/*!
 * Database module for the `students` table.
 *
 * This module provides SQLite-based persistence for:
 * - Schema creation with named integrity constraints
 * - Declarative queries (filters, ordering, projections, aggregates)
 * - A unit-of-work session for staged and set-based writes
 */

pub mod schema;
pub mod connection;
pub mod models;
pub mod query;
pub mod session;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{Column, FieldValue, Row, Student};
pub use query::{Assignment, Direction, Filter, Query};
pub use session::Session;
