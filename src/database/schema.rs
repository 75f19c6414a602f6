/*!
 * Database schema definitions.
 *
 * This module contains the SQL schema for the `students` table, its named
 * integrity constraints and secondary index. Creation is idempotent: every
 * statement is `IF NOT EXISTS`, so opening an existing store leaves it as is.
 */

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

/// Name of the primary key constraint
pub const PRIMARY_KEY_CONSTRAINT: &str = "id_pk";
/// Name of the unique email constraint
pub const UNIQUE_EMAIL_CONSTRAINT: &str = "unique_email";
/// Name of the grade range check
pub const GRADE_RANGE_CONSTRAINT: &str = "grade_between_1_and_12";
/// Name of the email length check
pub const EMAIL_LENGTH_CONSTRAINT: &str = "email_max_55";
/// Name of the secondary index on `students.name`
pub const NAME_INDEX: &str = "index_name";

/// Maximum stored email length
pub const EMAIL_MAX_LENGTH: usize = 55;

/// Create the `students` table and its index if they are missing
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // `id INTEGER` with a single-column primary key stays a rowid alias, so
    // the store assigns ids on insert.
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER,
            name TEXT NOT NULL,
            email VARCHAR({max_len}) NOT NULL,
            grade INTEGER,
            birthday DATETIME,
            enrolled_date DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CONSTRAINT {pk} PRIMARY KEY (id),
            CONSTRAINT {unique_email} UNIQUE (email),
            CONSTRAINT {grade_range} CHECK (grade BETWEEN 1 AND 12),
            CONSTRAINT {email_len} CHECK (length(email) <= {max_len})
        );

        CREATE INDEX IF NOT EXISTS {name_index} ON students(name);
        "#,
        max_len = EMAIL_MAX_LENGTH,
        pk = PRIMARY_KEY_CONSTRAINT,
        unique_email = UNIQUE_EMAIL_CONSTRAINT,
        grade_range = GRADE_RANGE_CONSTRAINT,
        email_len = EMAIL_LENGTH_CONSTRAINT,
        name_index = NAME_INDEX,
    ))
    .context("Failed to create the students schema")?;

    info!("Database schema ready");
    Ok(())
}

/// Names of the indexes declared on `students`
pub fn student_indexes(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='students' AND sql IS NOT NULL ORDER BY name",
    )?;

    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    Ok(names)
}
