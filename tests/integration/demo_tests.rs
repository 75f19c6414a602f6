/*!
 * End-to-end walkthrough tests
 */

use orm_sandbox::demo;
use orm_sandbox::{Query, Session};

use crate::common::new_session;

fn run_demo() -> (Session, demo::DemoReport, String) {
    let mut session = new_session().unwrap();
    let mut out = Vec::new();
    let report = demo::run(&mut session, &mut out).expect("walkthrough failed");
    (session, report, String::from_utf8(out).unwrap())
}

#[test]
fn test_run_shouldCountTwoStudentsBeforeAnyDeletion() {
    let (_, report, output) = run_demo();

    assert_eq!(report.initial_count, 2);
    assert!(output.contains("(2,)"));
}

#[test]
fn test_run_shouldFindOnlyTuringByPartialName() {
    let (_, report, _) = run_demo();
    assert_eq!(report.alan_matches, vec!["Alan Turing".to_string()]);
}

#[test]
fn test_run_objectUpdate_shouldIncrementEveryGrade() {
    let (_, report, _) = run_demo();

    assert_eq!(
        report.grades_after_object_update,
        vec![
            ("Albert Einstein".to_string(), 7),
            ("Alan Turing".to_string(), 12)
        ]
    );
}

#[test]
fn test_run_setBasedUpdate_shouldBeRejectedByGradeRange() {
    let (_, report, _) = run_demo();

    let rejection = report.bulk_update_rejection.expect("update should be rejected");
    assert!(rejection.contains("grade_between_1_and_12"));
    assert_eq!(report.grades_after_bulk_update, report.grades_after_object_update);
}

#[test]
fn test_run_shouldRemoveEinsteinAndKeepTuring() {
    let (mut session, report, output) = run_demo();

    assert!(report.einstein_after_delete.is_none());
    assert!(report.einstein_after_query_delete.is_none());
    assert_eq!(report.remaining.len(), 1);
    assert_eq!(report.remaining[0].name, "Alan Turing");
    assert_eq!(report.remaining[0].grade, 12);
    assert_eq!(session.count(&Query::all()).unwrap(), 1);
    assert!(output.trim_end().ends_with("None\nNone"));
}

#[test]
fn test_run_oldestStudent_shouldRankByGrade() {
    let (_, _, output) = run_demo();
    assert!(output.contains("[('Alan Turing', 1912-06-23 00:00:00)]"));
}
