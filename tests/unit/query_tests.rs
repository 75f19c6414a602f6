/*!
 * Tests for query construction and SQL rendering
 */

use orm_sandbox::database::{Column, Direction, FieldValue, Filter, Query};

#[test]
fn test_filterHelpers_shouldBuildMatchingVariants() {
    assert_eq!(
        Column::Name.like("%Alan%"),
        Filter::Like(Column::Name, "%Alan%".to_string())
    );
    assert_eq!(
        Column::Grade.equals(11_i64),
        Filter::Eq(Column::Grade, FieldValue::Integer(11))
    );
    assert_eq!(
        Column::Grade.lt(3_i64),
        Filter::Lt(Column::Grade, FieldValue::Integer(3))
    );
}

#[test]
fn test_builder_shouldKeepFiltersAndLimit() {
    let query = Query::all()
        .filter(Column::Name.like("A%"))
        .filter(Column::Grade.gt(2_i64))
        .limit(5);

    assert_eq!(query.filters().len(), 2);
    assert_eq!(query.limit_value(), Some(5));
}

#[test]
fn test_selectSql_withSeveralOrderKeys_shouldKeepOrderThenId() {
    let (sql, _) = Query::all()
        .order_by(Column::Grade, Direction::Desc)
        .order_by(Column::Name, Direction::Asc)
        .select_sql(&[Column::Name]);

    assert!(sql.ends_with("ORDER BY grade DESC, name ASC, id ASC"));
}

#[test]
fn test_updateSql_withSetTimestamp_shouldBindValue() {
    let when = chrono::NaiveDate::from_ymd_opt(2024, 9, 1)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap();

    let (sql, params) = Query::all()
        .update_sql(&[Column::EnrolledDate.set(when)])
        .unwrap();

    assert_eq!(sql, "UPDATE students SET enrolled_date = ?");
    assert_eq!(params, vec![FieldValue::Timestamp(when)]);
}

#[test]
fn test_deleteSql_withoutFilters_shouldTargetWholeTable() {
    let (sql, params) = Query::all().delete_sql();
    assert_eq!(sql, "DELETE FROM students");
    assert!(params.is_empty());
}

#[test]
fn test_renderedSql_shouldNeverInlineValues() {
    let (sql, params) = Query::all()
        .filter(Column::Name.equals("Robert'); DROP TABLE students;--"))
        .select_sql(&[Column::Id]);

    assert!(!sql.contains("DROP"));
    assert_eq!(params.len(), 1);
}
