#![cfg(feature = "derive")]

use chrono::{NaiveDate, NaiveDateTime};
use sqlkit::builder::{Builder, InsertInput, InsertMode, SelectParams};
use sqlkit::{FromRow, OrmError, Record, Value, mapping};

#[derive(Debug, Clone, PartialEq, Default, Record, FromRow)]
struct Audit {
    #[orm(column = "created_at")]
    created: NaiveDateTime,
    #[orm(omit_empty)]
    updated_by: String,
}

#[derive(Debug, Clone, PartialEq, Record, FromRow)]
#[orm(rename_all = "camelCase")]
struct User {
    user_id: i64,
    display_name: String,
    #[orm(omit_empty)]
    nickname: String,
    #[orm(omit_empty)]
    score: i32,
    deleted_at: Option<NaiveDateTime>,
    #[orm(flatten)]
    audit: Audit,
    #[orm(skip)]
    cached: bool,
}

fn ts() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
}

fn user(id: i64, name: &str) -> User {
    User {
        user_id: id,
        display_name: name.to_string(),
        nickname: String::new(),
        score: 0,
        deleted_at: None,
        audit: Audit {
            created: ts(),
            updated_by: String::new(),
        },
        cached: true,
    }
}

#[test]
fn to_mapping_flattens_and_omits() {
    let m = user(7, "Ann").to_mapping();
    assert_eq!(
        m.keys().collect::<Vec<_>>(),
        vec!["userId", "displayName", "deletedAt", "created_at"]
    );
    assert_eq!(m.get("userId"), Some(&Value::Int(7)));
    assert_eq!(m.get("deletedAt"), Some(&Value::Null));
    assert_eq!(m.get("created_at"), Some(&Value::DateTime(ts())));
}

#[test]
fn omitted_fields_appear_once_filled() {
    let mut u = user(1, "Bo");
    u.nickname = "b".into();
    u.score = 3;
    let m = u.to_mapping();
    assert_eq!(m.get("nickname"), Some(&Value::Text("b".into())));
    assert_eq!(m.get("score"), Some(&Value::Int(3)));
}

#[test]
fn schema_marks_nested_and_temporal_fields() {
    let schema = User::schema();
    let names: Vec<_> = schema.iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec![
            "userId",
            "displayName",
            "nickname",
            "score",
            "deletedAt",
            "created_at",
            "updated_by"
        ]
    );
    assert!(schema[2].omit_empty);
    assert!(schema[4].temporal && !schema[4].nested);
    assert!(schema[5].temporal && schema[5].nested);
    assert!(schema[6].omit_empty && schema[6].nested);
    assert_eq!(User::field_names(), names);
}

#[test]
fn from_row_round_trips_mapped_fields() {
    let original = user(9, "Cy");
    let back = User::from_row(&original.to_mapping()).unwrap();
    assert_eq!(
        back,
        User {
            cached: false,
            ..original
        }
    );
}

#[test]
fn from_row_reads_optional_and_text_values() {
    let row = mapping! {
        "userId" => "12",
        "displayName" => "Di",
        "deletedAt" => "2024-01-02 03:04:05",
        "created_at" => ts(),
        "updated_by" => "ops",
    };
    let u = User::from_row(&row).unwrap();
    assert_eq!(u.user_id, 12);
    assert_eq!(u.deleted_at, Some(ts()));
    assert_eq!(u.audit.updated_by, "ops");
    assert_eq!(u.score, 0);
}

#[test]
fn from_row_names_the_missing_column() {
    let row = mapping! { "userId" => 1, "created_at" => ts() };
    match User::from_row(&row).unwrap_err() {
        OrmError::Decode { column, .. } => assert_eq!(column, "displayName"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn select_columns_cover_nested_records() {
    assert_eq!(
        User::select_columns(),
        vec![
            "userId",
            "displayName",
            "nickname",
            "score",
            "deletedAt",
            "created_at",
            "updated_by"
        ]
    );
}

#[test]
fn record_as_filter_skips_nulls() {
    let u = user(7, "Ann");
    let stmt = Builder::default()
        .select(&SelectParams::new("users").filter(&u), &[])
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "select * from users where userId = ? and displayName = ? and created_at = ?"
    );
    assert_eq!(
        stmt.args(),
        &[
            Value::Int(7),
            Value::Text("Ann".into()),
            Value::DateTime(ts())
        ]
    );
}

#[test]
fn ragged_records_are_rejected_on_insert() {
    let mut second = user(2, "Bo");
    second.nickname = "bo".into();
    let users = [user(1, "Al"), second];
    let err = Builder::default()
        .insert("users", &InsertInput::records(&users), InsertMode::Insert)
        .unwrap_err();
    assert!(matches!(err, OrmError::SliceLengthMismatch { index: 1, .. }));
}
