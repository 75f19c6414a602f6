/*!
 * The ORM walkthrough.
 *
 * `run` drives a session through a fixed create/read/update/delete sequence
 * over two sample students and prints what each step observes.
 */

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use std::fmt::Display;
use std::io::Write;

use crate::database::{Column, Direction, Query, Row, Session, Student};
use crate::errors::DatabaseError;

/// What the walkthrough observed along the way
#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    /// Count aggregate right after the initial insert
    pub initial_count: i64,
    /// Names matching `name LIKE '%Alan%' AND grade = 11`
    pub alan_matches: Vec<String>,
    /// (name, grade) after the per-object increment
    pub grades_after_object_update: Vec<(String, i64)>,
    /// (name, grade) after the set-based increment
    pub grades_after_bulk_update: Vec<(String, i64)>,
    /// Constraint violation that rejected the set-based increment, if any
    pub bulk_update_rejection: Option<String>,
    /// Lookup of Albert Einstein after deleting the fetched object
    pub einstein_after_delete: Option<Student>,
    /// Lookup of Albert Einstein after the query-scoped delete
    pub einstein_after_query_delete: Option<Student>,
    /// Students left at the end
    pub remaining: Vec<Student>,
}

fn midnight(year: i32, month: u32, day: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The two students the walkthrough works with
pub fn sample_students() -> Vec<Student> {
    vec![
        Student::new(
            "Albert Einstein",
            "albert.einstein@zurich.edu",
            6,
            midnight(1879, 3, 14),
        ),
        Student::new(
            "Alan Turing",
            "alan.turing@sherborne.edu",
            11,
            midnight(1912, 6, 23),
        ),
    ]
}

fn bracketed<T: Display>(items: &[T]) -> String {
    let inner = items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}

fn describe(student: Option<&Student>) -> String {
    student.map_or_else(|| "None".to_string(), |s| s.to_string())
}

fn name_grade_pairs(rows: &[Row]) -> Vec<(String, i64)> {
    rows.iter()
        .filter_map(|row| {
            let name = row.get(0)?.as_text()?.to_string();
            let grade = row.get(1)?.as_integer()?;
            Some((name, grade))
        })
        .collect()
}

/// Run the full walkthrough, printing each step to `out`
pub fn run<W: Write>(session: &mut Session, out: &mut W) -> Result<DemoReport> {
    // Create
    let students = sample_students();
    session
        .bulk_save_objects(&students)
        .context("Failed to save sample students")?;
    session.commit()?;
    info!("Inserted {} sample students", students.len());

    // Read
    let everyone = session.all(&Query::all())?;
    writeln!(out, "{}", bracketed(&everyone))?;

    let names = session.project(&Query::all(), &[Column::Name])?;
    writeln!(out, "{}", bracketed(&names))?;

    let by_name = session.project(
        &Query::all().order_by(Column::Name, Direction::Asc),
        &[Column::Name],
    )?;
    writeln!(out, "{}", bracketed(&by_name))?;

    let by_grade_desc = session.project(
        &Query::all().order_by(Column::Grade, Direction::Desc),
        &[Column::Name, Column::Grade],
    )?;
    writeln!(out, "{}", bracketed(&by_grade_desc))?;

    // Named "oldest" but ranked by grade, not birthday.
    let oldest = session.project(
        &Query::all().order_by(Column::Grade, Direction::Desc).limit(1),
        &[Column::Name, Column::Birthday],
    )?;
    writeln!(out, "{}", bracketed(&oldest))?;

    let initial_count = session.count(&Query::all())?;
    writeln!(out, "({},)", initial_count)?;

    let alan_query = Query::all()
        .filter(Column::Name.like("%Alan%"))
        .filter(Column::Grade.equals(11_i64));
    let alan_matches = session
        .all(&alan_query)?
        .into_iter()
        .map(|s| s.name)
        .collect::<Vec<_>>();
    for name in &alan_matches {
        writeln!(out, "{}", name)?;
    }

    // Update, one object at a time
    for mut student in session.all(&Query::all())? {
        student.grade += 1;
        session.merge(&student)?;
    }
    session.commit()?;

    let pairs = session.project(&Query::all(), &[Column::Name, Column::Grade])?;
    writeln!(out, "{}", bracketed(&pairs))?;
    let grades_after_object_update = name_grade_pairs(&pairs);

    // Update, set-based. Alan Turing is already in grade 12, so the range
    // check rejects the statement and the session rolls it back. Two
    // increments can never take him to 13.
    let bulk_update_rejection =
        match session.update(&Query::all(), &[Column::Grade.increment(1)]) {
            Ok(_) => None,
            Err(e) => match e.downcast::<DatabaseError>()? {
                violation @ DatabaseError::ConstraintViolation { .. } => {
                    warn!("Set-based update rejected: {}", violation);
                    writeln!(out, "{}", violation)?;
                    Some(violation.to_string())
                }
                other => return Err(other.into()),
            },
        };

    let pairs = session.project(&Query::all(), &[Column::Name, Column::Grade])?;
    writeln!(out, "{}", bracketed(&pairs))?;
    let grades_after_bulk_update = name_grade_pairs(&pairs);

    // Delete a fetched object
    let einstein_query = Query::all().filter(Column::Name.equals("Albert Einstein"));
    if let Some(albert) = session.first(&einstein_query)? {
        session.delete(&albert)?;
    }
    session.commit()?;

    let einstein_after_delete = session.first(&einstein_query)?;
    writeln!(out, "{}", describe(einstein_after_delete.as_ref()))?;

    // Delete by query
    let removed = session.delete_matching(&einstein_query)?;
    info!("Query delete removed {} row(s)", removed);

    let einstein_after_query_delete = session.first(&einstein_query)?;
    writeln!(out, "{}", describe(einstein_after_query_delete.as_ref()))?;

    let remaining = session.all(&Query::all())?;

    Ok(DemoReport {
        initial_count,
        alan_matches,
        grades_after_object_update,
        grades_after_bulk_update,
        bulk_update_rejection,
        einstein_after_delete,
        einstein_after_query_delete,
        remaining,
    })
}
