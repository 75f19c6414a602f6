/*!
 * Database entity models.
 *
 * `Student` maps directly to the `students` table. `Column` is the catalogue
 * of its columns and the entry point for building filters and assignments.
 * `FieldValue` and `Row` carry projected values back out of the store.
 */

use chrono::{Local, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use std::fmt;

use super::query::{Assignment, Filter};

/// Table backing the `Student` record
pub const STUDENTS_TABLE: &str = "students";

/// Display format used for timestamps
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of value stored in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Text,
    Timestamp,
}

/// Columns of the `students` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Name,
    Email,
    Grade,
    Birthday,
    EnrolledDate,
}

impl Column {
    /// Every column, in table order
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Name,
        Column::Email,
        Column::Grade,
        Column::Birthday,
        Column::EnrolledDate,
    ];

    /// SQL identifier of the column
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::Email => "email",
            Column::Grade => "grade",
            Column::Birthday => "birthday",
            Column::EnrolledDate => "enrolled_date",
        }
    }

    /// Kind of value the column holds
    pub fn kind(&self) -> ValueKind {
        match self {
            Column::Id | Column::Grade => ValueKind::Integer,
            Column::Name | Column::Email => ValueKind::Text,
            Column::Birthday | Column::EnrolledDate => ValueKind::Timestamp,
        }
    }

    /// `column = value`
    pub fn equals(self, value: impl Into<FieldValue>) -> Filter {
        Filter::Eq(self, value.into())
    }

    /// `column LIKE pattern`
    pub fn like(self, pattern: impl Into<String>) -> Filter {
        Filter::Like(self, pattern.into())
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<FieldValue>) -> Filter {
        Filter::Gt(self, value.into())
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<FieldValue>) -> Filter {
        Filter::Lt(self, value.into())
    }

    /// `SET column = value`
    pub fn set(self, value: impl Into<FieldValue>) -> Assignment {
        Assignment::Set(self, value.into())
    }

    /// `SET column = column + delta`
    pub fn increment(self, delta: i64) -> Assignment {
        Assignment::Increment(self, delta)
    }

    /// Read this column out of a result row at the given position
    pub(crate) fn read(&self, row: &rusqlite::Row, idx: usize) -> rusqlite::Result<FieldValue> {
        let value = match self.kind() {
            ValueKind::Integer => row
                .get::<_, Option<i64>>(idx)?
                .map(FieldValue::Integer),
            ValueKind::Text => row
                .get::<_, Option<String>>(idx)?
                .map(FieldValue::Text),
            ValueKind::Timestamp => row
                .get::<_, Option<NaiveDateTime>>(idx)?
                .map(FieldValue::Timestamp),
        };

        Ok(value.unwrap_or(FieldValue::Null))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single value read from or written to a column
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            FieldValue::Null => Ok(ToSqlOutput::Owned(Value::Null)),
            FieldValue::Integer(v) => Ok(ToSqlOutput::from(*v)),
            FieldValue::Text(v) => Ok(ToSqlOutput::from(v.as_str())),
            FieldValue::Timestamp(v) => v.to_sql(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "None"),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "'{}'", v.replace('\'', "\\'")),
            FieldValue::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// An ordered tuple of projected values
#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub Vec<FieldValue>);

impl Row {
    pub fn get(&self, idx: usize) -> Option<&FieldValue> {
        self.0.get(idx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Renders like a tuple literal: `('Alan Turing',)` or `('Alan Turing', 11)`
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// Student record
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    /// Primary key, `None` until the store assigns one
    pub id: Option<i64>,
    /// Full name
    pub name: String,
    /// Contact email, unique across students
    pub email: String,
    /// School grade, 1 through 12
    pub grade: i64,
    /// Date of birth
    pub birthday: Option<NaiveDateTime>,
    /// When the record was created
    pub enrolled_date: NaiveDateTime,
}

impl Student {
    /// Create a new, not yet persisted student
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        grade: i64,
        birthday: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            grade,
            birthday,
            enrolled_date: Local::now().naive_local(),
        }
    }

    /// Set an explicit primary key
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether the store has assigned this record an identity
    pub fn is_persistent(&self) -> bool {
        self.id.is_some()
    }

    /// Column list matching `from_row`
    pub(crate) fn select_columns() -> &'static [Column] {
        &Column::ALL
    }

    /// Build a student from a row selected with `select_columns`
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            grade: row.get(3)?,
            birthday: row.get(4)?,
            enrolled_date: row.get(5)?,
        })
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Student {}: {}, Grade {}", id, self.name, self.grade),
            None => write!(f, "Student None: {}, Grade {}", self.name, self.grade),
        }
    }
}
