/*!
 * Tests for error types and conversions
 */

use orm_sandbox::errors::{AppError, ConstraintKind, DatabaseError};

#[test]
fn test_constraintViolation_shouldDisplayKindAndName() {
    let error = DatabaseError::ConstraintViolation {
        kind: ConstraintKind::Check,
        constraint: "grade_between_1_and_12".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "CHECK constraint failed: grade_between_1_and_12"
    );
    assert!(error.is_constraint(ConstraintKind::Check));
    assert!(!error.is_constraint(ConstraintKind::Unique));
}

#[test]
fn test_notPersistent_shouldDisplayStudent() {
    let error = DatabaseError::NotPersistent("Student None: Ada, Grade 3".to_string());
    let display = format!("{}", error);
    assert!(display.contains("not persistent"));
    assert!(display.contains("Ada"));
}

#[test]
fn test_invalidAssignment_shouldNameColumn() {
    let error = DatabaseError::InvalidAssignment("email".to_string());
    assert!(error.to_string().contains("email"));
}

#[test]
fn test_appError_fromDatabaseError_shouldWrap() {
    let app_error: AppError = DatabaseError::EmptyAssignment.into();
    assert!(matches!(app_error, AppError::Database(_)));
    assert!(app_error.to_string().starts_with("Database error"));
}

#[test]
fn test_appError_fromIoError_shouldBeFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
    let app_error: AppError = io_error.into();
    assert!(matches!(app_error, AppError::File(ref m) if m.contains("missing.json")));
}

#[test]
fn test_appError_fromPlainAnyhow_shouldBeUnknown() {
    let app_error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(app_error, AppError::Unknown(ref m) if m == "something odd"));
}
