/*!
 * Unit-of-work session over a database connection.
 *
 * The session stages inserts, updates and deletes of `Student` records and
 * writes them inside a lazily opened transaction. Reads flush staged work
 * first, so they always observe it. `commit` makes everything durable and
 * `rollback` discards it.
 *
 * Set-based operations (`update`, `delete_matching`) go straight to the store
 * inside the same transaction without loading any objects.
 */

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use rusqlite::{Connection, params_from_iter};

use super::connection::DatabaseConnection;
use super::models::{Column, FieldValue, Row, STUDENTS_TABLE, Student};
use super::query::{Assignment, Query};
use crate::app_config::DatabaseConfig;
use crate::errors::DatabaseError;

/// Log target for echoed SQL
pub const SQL_LOG_TARGET: &str = "orm_sandbox::sql";

/// A staged write
#[derive(Debug, Clone, PartialEq)]
enum PendingOp {
    Insert(Student),
    Update(Student),
    Delete(i64),
}

/// Unit-of-work session
pub struct Session {
    /// Underlying store
    db: DatabaseConnection,
    /// Writes waiting for the next flush, in staging order
    pending: Vec<PendingOp>,
    /// Log statements at info instead of debug
    echo: bool,
}

impl Session {
    /// Create a session over an open connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            pending: Vec::new(),
            echo: false,
        }
    }

    /// Open the configured store and wrap it in a session
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = DatabaseConnection::open(config)?;
        Ok(Self::new(db).with_echo(config.echo))
    }

    /// Create a session over a fresh in-memory store
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// Toggle SQL echo
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Number of staged writes not yet flushed
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        !self.db.is_autocommit()
    }

    // =========================================================================
    // Staging
    // =========================================================================

    /// Stage a new student for insertion; an explicit id is kept.
    /// The assigned id is reported by the `flush` or `commit` that writes it.
    pub fn add(&mut self, student: Student) {
        self.pending.push(PendingOp::Insert(student));
    }

    /// Stage several new students
    pub fn add_all<I>(&mut self, students: I)
    where
        I: IntoIterator<Item = Student>,
    {
        self.pending
            .extend(students.into_iter().map(PendingOp::Insert));
    }

    /// Stage the current field values of a persisted student
    pub fn merge(&mut self, student: &Student) -> Result<()> {
        if !student.is_persistent() {
            return Err(DatabaseError::NotPersistent(student.to_string()).into());
        }
        self.pending.push(PendingOp::Update(student.clone()));
        Ok(())
    }

    /// Stage deletion of a persisted student
    pub fn delete(&mut self, student: &Student) -> Result<()> {
        let id = student
            .id
            .ok_or_else(|| DatabaseError::NotPersistent(student.to_string()))?;
        self.pending.push(PendingOp::Delete(id));
        Ok(())
    }

    /// Write the given students right away: new ones are inserted, persisted
    /// ones updated. Returns the ids assigned to the inserted ones, in order.
    pub fn bulk_save_objects(&mut self, students: &[Student]) -> Result<Vec<i64>> {
        let ops = students
            .iter()
            .cloned()
            .map(|s| match s.id {
                Some(_) => PendingOp::Update(s),
                None => PendingOp::Insert(s),
            })
            .collect::<Vec<_>>();

        debug!("Bulk saving {} student(s)", ops.len());
        self.write(ops)
    }

    // =========================================================================
    // Transaction control
    // =========================================================================

    /// Write all staged operations inside the open transaction.
    /// Returns the ids of the inserted students, in staging order.
    pub fn flush(&mut self) -> Result<Vec<i64>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let ops = std::mem::take(&mut self.pending);
        debug!("Flushing {} staged operation(s)", ops.len());
        self.write(ops)
    }

    /// Flush and commit the open transaction; returns the ids of the
    /// students inserted by the flush
    pub fn commit(&mut self) -> Result<Vec<i64>> {
        let inserted = self.flush()?;

        if self.in_transaction() {
            let echo = self.echo;
            let committed = self.db.execute(|conn| {
                log_statement(echo, "COMMIT", &[]);
                conn.execute_batch("COMMIT").map_err(DatabaseError::from)?;
                Ok(())
            });

            if let Err(e) = committed {
                self.abort();
                return Err(e);
            }
            info!("Transaction committed");
        }

        Ok(inserted)
    }

    /// Discard staged operations and roll back the open transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.pending.clear();

        if self.in_transaction() {
            let echo = self.echo;
            self.db.execute(|conn| {
                log_statement(echo, "ROLLBACK", &[]);
                conn.execute_batch("ROLLBACK").map_err(DatabaseError::from)?;
                Ok(())
            })?;
            info!("Transaction rolled back");
        }

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every student matching the query
    pub fn all(&mut self, query: &Query) -> Result<Vec<Student>> {
        self.flush()?;

        let (sql, params) = query.select_sql(Student::select_columns());
        let echo = self.echo;

        self.db.execute(|conn| {
            log_statement(echo, &sql, &params);
            let mut stmt = conn.prepare(&sql).map_err(DatabaseError::from)?;
            let students = stmt
                .query_map(params_from_iter(params.iter()), Student::from_row)
                .map_err(DatabaseError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(DatabaseError::from)?;
            Ok(students)
        })
    }

    /// First student matching the query, if any
    pub fn first(&mut self, query: &Query) -> Result<Option<Student>> {
        let students = self.all(&query.clone().limit(1))?;
        Ok(students.into_iter().next())
    }

    /// Student with the given primary key
    pub fn get(&mut self, id: i64) -> Result<Option<Student>> {
        self.first(&Query::new().filter(Column::Id.equals(id)))
    }

    /// Selected columns of every matching row
    pub fn project(&mut self, query: &Query, columns: &[Column]) -> Result<Vec<Row>> {
        if columns.is_empty() {
            return Err(anyhow!("Projection requires at least one column"));
        }

        self.flush()?;

        let (sql, params) = query.select_sql(columns);
        let echo = self.echo;

        self.db.execute(|conn| {
            log_statement(echo, &sql, &params);
            let mut stmt = conn.prepare(&sql).map_err(DatabaseError::from)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    columns
                        .iter()
                        .enumerate()
                        .map(|(idx, column)| column.read(row, idx))
                        .collect::<rusqlite::Result<Vec<_>>>()
                        .map(Row)
                })
                .map_err(DatabaseError::from)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(DatabaseError::from)?;
            Ok(rows)
        })
    }

    /// Number of matching rows
    pub fn count(&mut self, query: &Query) -> Result<i64> {
        self.flush()?;

        let (sql, params) = query.count_sql();
        let echo = self.echo;

        self.db.execute(|conn| {
            log_statement(echo, &sql, &params);
            let count = conn
                .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
                .map_err(DatabaseError::from)?;
            Ok(count)
        })
    }

    // =========================================================================
    // Set-based writes
    // =========================================================================

    /// Apply assignments to every matching row; returns the affected count
    pub fn update(&mut self, query: &Query, assignments: &[Assignment]) -> Result<usize> {
        self.flush()?;
        let (sql, params) = query.update_sql(assignments)?;
        let affected = self.execute_write(&sql, &params)?;
        debug!("Set-based update touched {} row(s)", affected);
        Ok(affected)
    }

    /// Delete every matching row; returns the affected count
    pub fn delete_matching(&mut self, query: &Query) -> Result<usize> {
        self.flush()?;
        let (sql, params) = query.delete_sql();
        let affected = self.execute_write(&sql, &params)?;
        debug!("Query delete removed {} row(s)", affected);
        Ok(affected)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn execute_write(&mut self, sql: &str, params: &[FieldValue]) -> Result<usize> {
        let echo = self.echo;
        let result = self.db.execute(|conn| {
            begin_if_needed(conn, echo)?;
            log_statement(echo, sql, params);
            let affected = conn
                .execute(sql, params_from_iter(params.iter()))
                .map_err(DatabaseError::from)?;
            Ok(affected)
        });

        result.inspect_err(|_| self.abort())
    }

    fn write(&mut self, ops: Vec<PendingOp>) -> Result<Vec<i64>> {
        let echo = self.echo;
        let result = self.db.execute(|conn| {
            begin_if_needed(conn, echo)?;
            let mut inserted = Vec::new();
            for op in &ops {
                if let Some(id) = apply(conn, op, echo)? {
                    inserted.push(id);
                }
            }
            Ok(inserted)
        });

        result.inspect_err(|_| self.abort())
    }

    // A failed write leaves the session unusable until the transaction is
    // discarded, so roll it back and drop whatever was staged behind it.
    fn abort(&mut self) {
        if !self.pending.is_empty() {
            warn!("Discarding {} staged operation(s)", self.pending.len());
        }
        if let Err(e) = self.rollback() {
            warn!("Rollback after failed write also failed: {}", e);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.pending.is_empty() && !self.in_transaction() {
            return;
        }
        debug!("Session dropped with uncommitted work, rolling back");
        if let Err(e) = self.rollback() {
            warn!("Rollback on session drop failed: {}", e);
        }
    }
}

fn begin_if_needed(conn: &Connection, echo: bool) -> Result<()> {
    if conn.is_autocommit() {
        log_statement(echo, "BEGIN", &[]);
        conn.execute_batch("BEGIN").map_err(DatabaseError::from)?;
    }
    Ok(())
}

/// Run one staged write; inserts yield the id the store assigned
fn apply(conn: &Connection, op: &PendingOp, echo: bool) -> Result<Option<i64>> {
    match op {
        PendingOp::Insert(student) => {
            let mut columns = vec![
                Column::Name,
                Column::Email,
                Column::Grade,
                Column::Birthday,
                Column::EnrolledDate,
            ];
            let mut params = vec![
                FieldValue::from(student.name.as_str()),
                FieldValue::from(student.email.as_str()),
                FieldValue::from(student.grade),
                FieldValue::from(student.birthday),
                FieldValue::from(student.enrolled_date),
            ];
            if let Some(id) = student.id {
                columns.insert(0, Column::Id);
                params.insert(0, FieldValue::from(id));
            }

            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                STUDENTS_TABLE,
                columns.iter().map(Column::as_str).collect::<Vec<_>>().join(", "),
                vec!["?"; columns.len()].join(", ")
            );

            log_statement(echo, &sql, &params);
            conn.execute(&sql, params_from_iter(params.iter()))
                .map_err(DatabaseError::from)?;
            let id = conn.last_insert_rowid();
            debug!("Inserted {} as id {}", student.name, id);
            return Ok(Some(id));
        }
        PendingOp::Update(student) => {
            let id = student
                .id
                .ok_or_else(|| DatabaseError::NotPersistent(student.to_string()))?;
            let sql = format!(
                "UPDATE {} SET name = ?, email = ?, grade = ?, birthday = ?, enrolled_date = ? WHERE id = ?",
                STUDENTS_TABLE
            );
            let params = vec![
                FieldValue::from(student.name.as_str()),
                FieldValue::from(student.email.as_str()),
                FieldValue::from(student.grade),
                FieldValue::from(student.birthday),
                FieldValue::from(student.enrolled_date),
                FieldValue::from(id),
            ];

            log_statement(echo, &sql, &params);
            let affected = conn
                .execute(&sql, params_from_iter(params.iter()))
                .map_err(DatabaseError::from)?;
            if affected == 0 {
                return Err(DatabaseError::NotPersistent(student.to_string()).into());
            }
        }
        PendingOp::Delete(id) => {
            let sql = format!("DELETE FROM {} WHERE id = ?", STUDENTS_TABLE);
            let params = [FieldValue::from(*id)];

            log_statement(echo, &sql, &params);
            let affected = conn
                .execute(&sql, params_from_iter(params.iter()))
                .map_err(DatabaseError::from)?;
            if affected == 0 {
                return Err(DatabaseError::NotPersistent(format!("Student {}", id)).into());
            }
        }
    }

    Ok(None)
}

fn log_statement(echo: bool, sql: &str, params: &[FieldValue]) {
    if echo {
        info!(target: SQL_LOG_TARGET, "{} {:?}", sql, params);
    } else {
        debug!(target: SQL_LOG_TARGET, "{} {:?}", sql, params);
    }
}
