//! End-to-end example against a local Postgres.
//!
//! Run with:
//!   cargo run --example select_records -p sqlkit
//!
//! Connection settings come from `.env` or the environment:
//!   DB_HOST=localhost DB_PORT=5432 DB_USER=postgres DB_PASSWORD=postgres DB_NAME=sqlkit_example

use chrono::NaiveDateTime;
use sqlkit::postgres::{Configuration, PgDriver};
use sqlkit::{Db, FromRow, InsertInput, OrmError, OrmResult, Record, UpdateInput, args, mapping};
use std::env;

#[derive(Debug, Record, FromRow)]
struct Account {
    #[orm(omit_empty)]
    id: i64,
    name: String,
    balance: i64,
    #[orm(omit_empty)]
    note: String,
    created_at: Option<NaiveDateTime>,
}

fn config_from_env() -> OrmResult<Configuration> {
    let var = |key: &str, default: &str| env::var(key).unwrap_or_else(|_| default.to_string());
    Configuration::from_map(serde_json::json!({
        "host": var("DB_HOST", "localhost"),
        "port": var("DB_PORT", "5432").parse::<u16>().unwrap_or(5432),
        "username": var("DB_USER", "postgres"),
        "password": var("DB_PASSWORD", "postgres"),
        "database": var("DB_NAME", "sqlkit_example"),
        "maxOpenConns": 4,
    }))
}

async fn transfer(db: &Db<PgDriver>, from: &str, to: &str, amount: i64) -> OrmResult<()> {
    sqlkit::transaction!(db, tx, {
        let payer: Option<Account> = tx
            .select_first("accounts", "*", mapping! { "name" => from }, &[])
            .await?;
        let payer = payer.ok_or_else(|| OrmError::not_found(format!("account {from}")))?;
        if payer.balance < amount {
            return Err(OrmError::Validation(format!(
                "insufficient balance: {} < {amount}",
                payer.balance
            )));
        }

        tx.update_affected(
            "accounts",
            UpdateInput::raw_with("balance = balance - ?", args![amount]),
            mapping! { "name" => from },
            &[],
        )
        .await?;
        tx.update_affected(
            "accounts",
            UpdateInput::raw_with("balance = balance + ?", args![amount]),
            mapping! { "name" => to },
            &[],
        )
        .await?;
        Ok(())
    })
}

#[tokio::main]
async fn main() -> OrmResult<()> {
    dotenvy::dotenv().ok();

    let driver = PgDriver::connect(&config_from_env()?).await?;
    let db = Db::new(driver.clone());

    db.raw_exec(
        "create table if not exists accounts (
            id bigserial primary key,
            name text not null unique,
            balance bigint not null,
            note text not null default '',
            created_at timestamp
        )",
        &[],
    )
    .await?;
    db.raw_exec("truncate accounts", &[]).await?;

    let seed = [
        Account {
            id: 0,
            name: "alice".into(),
            balance: 100,
            note: "founder".into(),
            created_at: Some(chrono::Utc::now().naive_utc()),
        },
        Account {
            id: 0,
            name: "bob".into(),
            balance: 20,
            note: "seed".into(),
            created_at: Some(chrono::Utc::now().naive_utc()),
        },
    ];
    let inserted = db.insert("accounts", InsertInput::records(&seed)).await?;
    println!("inserted {} rows", inserted.rows_affected);

    transfer(&db, "alice", "bob", 30).await?;
    if let Err(e) = transfer(&db, "bob", "alice", 1_000).await {
        println!("rejected transfer: {e}");
    }

    let accounts: Vec<Account> = db
        .select(
            "accounts",
            "id, name, balance, note, created_at",
            mapping! { "name" => vec!["alice", "bob"] },
            &[],
        )
        .await?;
    for account in &accounts {
        println!("{account:?}");
    }

    let rich = db
        .count("accounts", mapping! { "balance" => "s:>= 50" }, &[])
        .await?;
    let total = db.sum("accounts", "balance", (), &[]).await?;
    println!("{rich} account(s) with >= 50, total balance {total}");

    driver.close();
    Ok(())
}
