mod common;

use common::MockDriver;
use sqlkit::builder::{OrderBy, SelectParams, UpdateInput, WhereInput};
use sqlkit::{Db, Mapping, OrmError, OrmResult, Row, RowExt, Value, args, mapping};

fn db() -> (Db<MockDriver>, MockDriver) {
    let driver = MockDriver::new();
    (Db::new(driver.clone()), driver)
}

#[tokio::test]
async fn select_compiles_filter_and_maps_rows() {
    let (db, driver) = db();
    driver.push_rows(vec![mapping! { "id" => 1, "name" => "a" }]);

    let rows: Vec<Row> = db
        .select(
            "users",
            "id, name",
            mapping! { "status" => 1, "id" => vec![1, 2] },
            &[],
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_as::<String>("name").unwrap(), "a");
    assert_eq!(
        driver.last_sql(),
        "select id, name from users where status = ? and id in (?, ?)"
    );
    assert_eq!(driver.last_args(), args![1, 1, 2]);
}

#[tokio::test]
async fn select_first_adds_limit_and_maps_not_found_to_none() {
    let (db, driver) = db();
    let row: Option<Row> = db
        .select_first("users", "*", mapping! { "id" => 5 }, &[])
        .await
        .unwrap();
    assert!(row.is_none());
    assert_eq!(driver.last_sql(), "select * from users where id = ? limit 1");
}

#[tokio::test]
async fn select_first_maps_driver_not_found_to_none() {
    let (db, driver) = db();
    driver.fail_next(OrmError::not_found("no rows"));
    let row: Option<Row> = db
        .select_first("users", "*", mapping! { "id" => 5 }, &[])
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn select_first_surfaces_other_driver_errors() {
    let (db, driver) = db();
    driver.fail_next(OrmError::driver("connection reset"));
    let res: OrmResult<Option<Row>> = db
        .select_first("users", "*", mapping! { "id" => 5 }, &[])
        .await;
    let err = res.unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));
    assert_eq!(driver.calls().len(), 1);
}

#[tokio::test]
async fn writes_surface_driver_errors() {
    let (db, driver) = db();
    driver.fail_next(OrmError::driver("deadlock"));
    let err = db.raw_exec("delete from t", &[]).await.unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));

    driver.fail_next(OrmError::driver("duplicate key"));
    let err = db.insert("t", mapping! { "a" => 1 }).await.unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));

    driver.fail_next(OrmError::driver("lock timeout"));
    let err = db
        .update("t", mapping! { "a" => 2 }, mapping! { "id" => 1 }, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Driver(_)));

    let count = db.count("t", (), &[]).await;
    assert_eq!(count.unwrap(), 0);
}

#[tokio::test]
async fn select_by_id_can_lock_the_row() {
    let (db, driver) = db();
    driver.push_rows(vec![mapping! { "id" => 3 }]);
    let row: Option<Row> = db.select_by_id("users", "*", 3, true).await.unwrap();
    assert_eq!(row.unwrap().get_as::<i64>("id").unwrap(), 3);
    assert_eq!(
        driver.last_sql(),
        "select * from users where id = ? limit 1 for update"
    );
}

#[tokio::test]
async fn select_with_orders_and_limits() {
    let (db, driver) = db();
    let params = SelectParams::new("orders")
        .filter(WhereInput::raw("amount > ?"))
        .order_by(OrderBy::desc("created_at"))
        .limit(20);
    let _: Vec<Row> = db.select_with(params, &args![100]).await.unwrap();
    assert_eq!(
        driver.last_sql(),
        "select * from orders where amount > ? order by created_at desc limit 20"
    );
    assert_eq!(driver.last_args(), args![100]);
}

#[tokio::test]
async fn select_by_str_uses_tail_verbatim() {
    let (db, driver) = db();
    let _: Vec<Row> = db
        .select_by_str("users", "", "where age > ? order by id", &args![18])
        .await
        .unwrap();
    assert_eq!(
        driver.last_sql(),
        "select * from users where age > ? order by id"
    );
}

#[tokio::test]
async fn raw_select_expands_list_arguments() {
    let (db, driver) = db();
    let _: Vec<Row> = db
        .raw_select(
            "select * from t where a = ? and id in (?)",
            &args!["x", vec![4, 5, 6]],
        )
        .await
        .unwrap();
    assert_eq!(
        driver.last_sql(),
        "select * from t where a = ? and id in (?, ?, ?)"
    );
    assert_eq!(driver.last_args(), args!["x", 4, 5, 6]);
}

#[tokio::test]
async fn raw_exec_expands_empty_list_to_null() {
    let (db, driver) = db();
    let empty: Vec<i64> = Vec::new();
    db.raw_exec("delete from t where id in (?)", &args![empty])
        .await
        .unwrap();
    assert_eq!(driver.last_sql(), "delete from t where id in (NULL)");
    assert!(driver.last_args().is_empty());
}

#[tokio::test]
async fn raw_placeholder_count_must_match() {
    let (db, driver) = db();
    let err = db
        .raw_exec("update t set a = ? where id in (?)", &args![vec![1, 2]])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn build_errors_never_reach_the_driver() {
    let (db, driver) = db();
    let err = db
        .update("t", Mapping::new(), mapping! { "id" => 1 }, &[])
        .await
        .unwrap_err();
    assert!(err.is_build_error());
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn insert_realigns_rows_by_column_name() {
    let (db, driver) = db();
    let rows = vec![
        mapping! { "a" => 1, "b" => 2 },
        mapping! { "b" => 4, "a" => 3 },
    ];
    let res = db.insert("t", rows).await.unwrap();
    assert_eq!(res.rows_affected, 1);
    assert_eq!(driver.last_sql(), "insert into t (a, b) values (?, ?), (?, ?)");
    assert_eq!(driver.last_args(), args![1, 2, 3, 4]);
}

#[tokio::test]
async fn insert_ignore_and_replace_use_mysql_forms() {
    let (db, driver) = db();
    db.insert_ignore("t", mapping! { "a" => 1 }).await.unwrap();
    assert_eq!(driver.last_sql(), "insert ignore into t (a) values (?)");
    db.replace_into("t", mapping! { "a" => 1 }).await.unwrap();
    assert_eq!(driver.last_sql(), "replace into t (a) values (?)");
}

#[tokio::test]
async fn insert_affected_requires_a_written_row() {
    let (db, driver) = db();
    driver.set_rows_affected(0);
    let err = db
        .insert_affected("t", mapping! { "a" => 1 })
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::NoAffectedRows));
}

#[tokio::test]
async fn update_orders_set_then_where_then_extra_args() {
    let (db, driver) = db();
    driver.set_rows_affected(2);
    let n = db
        .update(
            "users",
            mapping! { "name" => "x", "age" => 3 },
            WhereInput::raw("id = ? or id = ?"),
            &args![7, 8],
        )
        .await
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(
        driver.last_sql(),
        "update users set name = ?, age = ? where id = ? or id = ?"
    );
    assert_eq!(driver.last_args(), args!["x", 3, 7, 8]);
}

#[tokio::test]
async fn raw_set_arguments_precede_filter_arguments() {
    let (db, driver) = db();
    db.update(
        "accounts",
        UpdateInput::raw_with("balance = balance - ?", args![500]),
        mapping! { "id" => 1 },
        &[],
    )
    .await
    .unwrap();
    assert_eq!(
        driver.last_sql(),
        "update accounts set balance = balance - ? where id = ?"
    );
    assert_eq!(driver.last_args(), args![500, 1]);
}

#[tokio::test]
async fn bound_operator_filters_bind_their_operand() {
    let (db, driver) = db();
    let _: Vec<Row> = db
        .select(
            "users",
            "*",
            mapping! { "age" => Value::op(">=", 18), "id" => vec![1, 2] },
            &[],
        )
        .await
        .unwrap();
    assert_eq!(
        driver.last_sql(),
        "select * from users where age >= ? and id in (?, ?)"
    );
    assert_eq!(driver.last_args(), args![18, 1, 2]);
}

#[tokio::test]
async fn update_affected_fails_when_nothing_changed() {
    let (db, driver) = db();
    driver.set_rows_affected(0);
    let err = db
        .update_affected("users", "hits = hits + 1", mapping! { "id" => 1 }, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::NoAffectedRows));
}

#[tokio::test]
async fn count_reads_alias_and_defaults_to_zero() {
    let (db, driver) = db();
    driver.push_rows(vec![mapping! { "count" => 5 }]);
    assert_eq!(db.count("users", (), &[]).await.unwrap(), 5);
    assert_eq!(driver.last_sql(), "select count(*) as count from users");

    assert_eq!(db.count("users", (), &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn sum_is_text_and_zero_when_nothing_matches() {
    let (db, driver) = db();
    driver.push_rows(vec![mapping! { "sum" => "12.50" }]);
    assert_eq!(
        db.sum("orders", "amount", mapping! { "uid" => 1 }, &[])
            .await
            .unwrap(),
        "12.50"
    );
    assert_eq!(
        driver.last_sql(),
        "select sum(amount) as sum from orders where uid = ?"
    );

    let mut null_row = Mapping::new();
    null_row.insert("sum", Value::Null);
    driver.push_rows(vec![null_row]);
    assert_eq!(db.sum("orders", "amount", (), &[]).await.unwrap(), "0");
    assert_eq!(db.sum("orders", "amount", (), &[]).await.unwrap(), "0");
}

async fn debit(db: &Db<MockDriver>) -> OrmResult<i32> {
    sqlkit::transaction!(db, tx, {
        assert!(tx.tx_id().is_some());
        tx.update("accounts", "balance = balance - 1", mapping! { "id" => 1 }, &[])
            .await?;
        Ok(1)
    })
}

async fn failing_insert(db: &Db<MockDriver>) -> OrmResult<()> {
    sqlkit::transaction!(db, tx, {
        tx.insert("t", mapping! { "a" => 1 }).await?;
        Err(OrmError::validation("boom"))
    })
}

#[tokio::test]
async fn transaction_macro_commits_on_ok() {
    let (db, driver) = db();
    assert_eq!(debit(&db).await.unwrap(), 1);
    assert_eq!(driver.events(), vec!["begin", "commit"]);
    assert_eq!(
        driver.last_sql(),
        "update accounts set balance = balance - 1 where id = ?"
    );
    assert!(db.tx_id().is_none());
}

#[tokio::test]
async fn transaction_macro_rolls_back_on_err() {
    let (db, driver) = db();
    let err = failing_insert(&db).await.unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert_eq!(driver.events(), vec!["begin", "rollback"]);
}

#[tokio::test]
async fn explicit_transaction_handle() {
    let (db, driver) = db();
    let tx = db.begin().await.unwrap();
    tx.raw_exec("update t set a = 1", &[]).await.unwrap();
    tx.rollback().await.unwrap();
    assert_eq!(driver.events(), vec!["begin", "rollback"]);
}

#[cfg(feature = "derive")]
#[tokio::test]
async fn select_star_expands_to_declared_columns() {
    #[derive(Debug, sqlkit::FromRow)]
    struct Item {
        id: i64,
        #[orm(column = "title")]
        name: String,
    }

    let (db, driver) = db();
    driver.push_rows(vec![mapping! { "id" => 1, "title" => "x" }]);
    let items: Vec<Item> = db.select("items", "*", (), &[]).await.unwrap();
    assert_eq!(driver.last_sql(), "select id, title from items");
    assert_eq!(items[0].id, 1);
    assert_eq!(items[0].name, "x");
}
