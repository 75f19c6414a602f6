/*!
 * Declarative queries over the `students` table.
 *
 * A `Query` collects filters, ordering and a row limit. The session turns it
 * into SQL through the `*_sql` renderers, which always bind values as
 * parameters and never splice them into the statement text.
 */

use anyhow::Result;

use super::models::{Column, FieldValue, STUDENTS_TABLE, ValueKind};
use crate::errors::DatabaseError;

/// Rendered statement and its positional parameters
pub type Statement = (String, Vec<FieldValue>);

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Row predicate; several filters on one query are AND-combined
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Column, FieldValue),
    Like(Column, String),
    Gt(Column, FieldValue),
    Lt(Column, FieldValue),
}

impl Filter {
    fn render(&self, params: &mut Vec<FieldValue>) -> String {
        match self {
            Filter::Eq(column, FieldValue::Null) => format!("{} IS NULL", column),
            Filter::Eq(column, value) => {
                params.push(value.clone());
                format!("{} = ?", column)
            }
            Filter::Like(column, pattern) => {
                params.push(FieldValue::Text(pattern.clone()));
                format!("{} LIKE ?", column)
            }
            Filter::Gt(column, value) => {
                params.push(value.clone());
                format!("{} > ?", column)
            }
            Filter::Lt(column, value) => {
                params.push(value.clone());
                format!("{} < ?", column)
            }
        }
    }
}

/// Column assignment for a set-based update
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Set(Column, FieldValue),
    Increment(Column, i64),
}

impl Assignment {
    fn render(&self, params: &mut Vec<FieldValue>) -> Result<String> {
        match self {
            Assignment::Set(column, value) => {
                params.push(value.clone());
                Ok(format!("{} = ?", column))
            }
            Assignment::Increment(column, delta) => {
                if column.kind() != ValueKind::Integer {
                    return Err(DatabaseError::InvalidAssignment(column.to_string()).into());
                }
                params.push(FieldValue::Integer(*delta));
                Ok(format!("{0} = {0} + ?", column))
            }
        }
    }
}

/// Query over the `students` table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Vec<(Column, Direction)>,
    limit: Option<usize>,
}

impl Query {
    /// A query matching every student
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of `new` that reads better at call sites
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a filter; filters are AND-combined
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append a sort key
    pub fn order_by(mut self, column: Column, direction: Direction) -> Self {
        self.order.push((column, direction));
        self
    }

    /// Cap the number of rows
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// `SELECT <columns> FROM students ...`
    pub fn select_sql(&self, columns: &[Column]) -> Statement {
        let mut params = Vec::new();
        let column_list = columns
            .iter()
            .map(Column::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {} FROM {}", column_list, STUDENTS_TABLE);
        sql.push_str(&self.where_clause(&mut params));
        sql.push_str(&self.order_clause());
        sql.push_str(&self.limit_clause());

        (sql, params)
    }

    /// `SELECT COUNT(id) ...` honouring filters and limit
    pub fn count_sql(&self) -> Statement {
        if self.limit.is_some() {
            let (inner, params) = self.select_sql(&[Column::Id]);
            return (format!("SELECT COUNT(*) FROM ({})", inner), params);
        }

        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(id) FROM {}", STUDENTS_TABLE);
        sql.push_str(&self.where_clause(&mut params));
        (sql, params)
    }

    /// `UPDATE students SET ... WHERE <scope>`
    pub fn update_sql(&self, assignments: &[Assignment]) -> Result<Statement> {
        if assignments.is_empty() {
            return Err(DatabaseError::EmptyAssignment.into());
        }

        let mut params = Vec::new();
        let set_list = assignments
            .iter()
            .map(|a| a.render(&mut params))
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let mut sql = format!("UPDATE {} SET {}", STUDENTS_TABLE, set_list);
        sql.push_str(&self.scope_clause(&mut params));
        Ok((sql, params))
    }

    /// `DELETE FROM students WHERE <scope>`
    pub fn delete_sql(&self) -> Statement {
        let mut params = Vec::new();
        let mut sql = format!("DELETE FROM {}", STUDENTS_TABLE);
        sql.push_str(&self.scope_clause(&mut params));
        (sql, params)
    }

    fn where_clause(&self, params: &mut Vec<FieldValue>) -> String {
        if self.filters.is_empty() {
            return String::new();
        }

        let predicates = self
            .filters
            .iter()
            .map(|f| f.render(params))
            .collect::<Vec<_>>();

        format!(" WHERE {}", predicates.join(" AND "))
    }

    // Unordered reads come back in insertion order; ordered reads fall back to
    // id so ties stay stable.
    fn order_clause(&self) -> String {
        let mut keys = self
            .order
            .iter()
            .map(|(column, direction)| format!("{} {}", column, direction.as_sql()))
            .collect::<Vec<_>>();

        if !self.order.iter().any(|(column, _)| *column == Column::Id) {
            keys.push("id ASC".to_string());
        }

        format!(" ORDER BY {}", keys.join(", "))
    }

    fn limit_clause(&self) -> String {
        match self.limit {
            Some(limit) => format!(" LIMIT {}", limit),
            None => String::new(),
        }
    }

    // SQLite's UPDATE/DELETE take no ORDER BY/LIMIT in the default build, so a
    // limited query scopes by id through a subselect.
    fn scope_clause(&self, params: &mut Vec<FieldValue>) -> String {
        if self.limit.is_none() {
            return self.where_clause(params);
        }

        let (inner, inner_params) = self.select_sql(&[Column::Id]);
        params.extend(inner_params);
        format!(" WHERE id IN ({})", inner)
    }
}
