/*!
 * Common test utilities for the orm-sandbox test suite
 */

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use orm_sandbox::{DatabaseError, Session, Student};
use orm_sandbox::errors::ConstraintKind;

/// Route library logs through env_logger when RUST_LOG is set
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Midnight on the given date
pub fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid test date")
}

/// A transient student with a birthday in 2000
pub fn student(name: &str, email: &str, grade: i64) -> Student {
    Student::new(name, email, grade, Some(date(2000, 1, 1)))
}

/// A session over a fresh in-memory store
pub fn new_session() -> Result<Session> {
    init_logging();
    Session::new_in_memory()
}

/// A session holding the given students, committed
pub fn seeded_session(students: &[Student]) -> Result<Session> {
    let mut session = new_session()?;
    session.bulk_save_objects(students)?;
    session.commit()?;
    Ok(session)
}

/// Einstein and Turing as in the walkthrough
pub fn einstein_and_turing() -> Vec<Student> {
    vec![
        Student::new(
            "Albert Einstein",
            "albert.einstein@zurich.edu",
            6,
            Some(date(1879, 3, 14)),
        ),
        Student::new(
            "Alan Turing",
            "alan.turing@sherborne.edu",
            11,
            Some(date(1912, 6, 23)),
        ),
    ]
}

/// Constraint family carried by an error, if it is a violation
pub fn constraint_kind(err: &anyhow::Error) -> Option<ConstraintKind> {
    match err.downcast_ref::<DatabaseError>() {
        Some(DatabaseError::ConstraintViolation { kind, .. }) => Some(*kind),
        _ => None,
    }
}
