/*!
 * Integrity constraints enforced by the store through the session
 */

use orm_sandbox::errors::ConstraintKind;
use orm_sandbox::{Column, Query};

use crate::common::{constraint_kind, einstein_and_turing, seeded_session, student};

#[test]
fn test_insert_withGradeZero_shouldFailAndKeepPriorRows() {
    let mut session = seeded_session(&einstein_and_turing()).unwrap();

    session.add(student("Too Young", "young@x.edu", 0));
    let err = session.commit().unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::Check));
    assert!(err.to_string().contains("grade_between_1_and_12"));
    assert_eq!(session.count(&Query::all()).unwrap(), 2);
}

#[test]
fn test_insert_withGradeThirteen_shouldFailAndKeepPriorRows() {
    let mut session = seeded_session(&einstein_and_turing()).unwrap();

    let err = session
        .bulk_save_objects(&[student("Too Old", "old@x.edu", 13)])
        .unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::Check));
    let names: Vec<String> = session
        .all(&Query::all())
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["Albert Einstein", "Alan Turing"]);
}

#[test]
fn test_insert_withBoundaryGrades_shouldSucceed() {
    let mut session = seeded_session(&[
        student("First", "first@x.edu", 1),
        student("Last", "last@x.edu", 12),
    ])
    .unwrap();

    assert_eq!(session.count(&Query::all()).unwrap(), 2);
}

#[test]
fn test_insert_withDuplicateEmail_shouldFail() {
    let mut session = seeded_session(&einstein_and_turing()).unwrap();

    session.add(student("Impostor", "alan.turing@sherborne.edu", 4));
    let err = session.commit().unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::Unique));
    assert!(err.to_string().contains("students.email"));
    assert_eq!(session.count(&Query::all()).unwrap(), 2);
}

#[test]
fn test_bulkSave_withDuplicateEmailInsideBatch_shouldInsertNothing() {
    let mut session = crate::common::new_session().unwrap();

    let err = session
        .bulk_save_objects(&[
            student("One", "same@x.edu", 3),
            student("Two", "same@x.edu", 4),
        ])
        .unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::Unique));
    assert_eq!(session.count(&Query::all()).unwrap(), 0);
}

#[test]
fn test_insert_withDuplicateId_shouldFail() {
    let mut session = seeded_session(&einstein_and_turing()).unwrap();

    session.add(student("Clash", "clash@x.edu", 4).with_id(2));
    let err = session.commit().unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::PrimaryKey));
}

#[test]
fn test_insert_withTooLongEmail_shouldFail() {
    let mut session = crate::common::new_session().unwrap();
    let email = format!("{}@example.edu", "x".repeat(50));

    session.add(student("Verbose", &email, 4));
    let err = session.commit().unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::Check));
    assert!(err.to_string().contains("email_max_55"));
}

#[test]
fn test_setBasedUpdate_toDuplicateEmail_shouldFail() {
    let mut session = seeded_session(&einstein_and_turing()).unwrap();

    let err = session
        .update(&Query::all(), &[Column::Email.set("shared@x.edu")])
        .unwrap_err();

    assert_eq!(constraint_kind(&err), Some(ConstraintKind::Unique));
    assert_eq!(
        session
            .count(&Query::all().filter(Column::Email.equals("shared@x.edu")))
            .unwrap(),
        0
    );
}
