/*!
 * # orm-sandbox
 *
 * A small walkthrough of object-relational mapping basics on top of an
 * embedded SQLite store.
 *
 * ## Features
 *
 * - Declare the `students` table with named integrity constraints
 *   (primary key, unique email, grade range, email length) and a name index
 * - Stage inserts, updates and deletes in a unit-of-work session
 * - Build queries with filters, ordering, limits, projections and counts
 * - Issue set-based updates and deletes without loading objects
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: SQLite persistence:
 *   - `database::schema`: Table, constraint and index definitions
 *   - `database::connection`: Connection handling
 *   - `database::models`: The `Student` record and column catalogue
 *   - `database::query`: Query description and SQL rendering
 *   - `database::session`: Unit-of-work session
 * - `demo`: The create/read/update/delete walkthrough
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod demo;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{Column, DatabaseConnection, Direction, Query, Session, Student};
pub use errors::{AppError, ConstraintKind, DatabaseError};
