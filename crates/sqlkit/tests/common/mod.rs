//! Recording in-memory driver shared by the integration tests.

#![allow(dead_code)]

use sqlkit::{Connector, ExecResult, Executor, OrmError, OrmResult, Row, TxHandle, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct State {
    pub calls: Vec<(String, Vec<Value>)>,
    pub events: Vec<&'static str>,
    pub results: VecDeque<Vec<Row>>,
    pub rows_affected: u64,
    pub failure: Option<OrmError>,
}

/// Records every statement and answers queries from a queue of canned results.
#[derive(Debug, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<State>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                rows_affected: 1,
                ..State::default()
            })),
        }
    }

    /// Queue the rows returned by the next query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state.lock().unwrap().results.push_back(rows);
    }

    /// Fail the next statement with `err`. The statement is still recorded.
    pub fn fail_next(&self, err: OrmError) {
        self.state.lock().unwrap().failure = Some(err);
    }

    pub fn set_rows_affected(&self, n: u64) {
        self.state.lock().unwrap().rows_affected = n;
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_sql(&self) -> String {
        self.calls().last().map(|(sql, _)| sql.clone()).unwrap_or_default()
    }

    pub fn last_args(&self) -> Vec<Value> {
        self.calls().last().map(|(_, args)| args.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().events.clone()
    }
}

fn record_exec(state: &Mutex<State>, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
    let mut st = state.lock().unwrap();
    st.calls.push((sql.to_string(), args.to_vec()));
    if let Some(err) = st.failure.take() {
        return Err(err);
    }
    Ok(ExecResult {
        last_insert_id: st.calls.len() as u64,
        rows_affected: st.rows_affected,
    })
}

fn record_query(state: &Mutex<State>, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
    let mut st = state.lock().unwrap();
    st.calls.push((sql.to_string(), args.to_vec()));
    if let Some(err) = st.failure.take() {
        return Err(err);
    }
    Ok(st.results.pop_front().unwrap_or_default())
}

impl Executor for MockDriver {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        record_exec(&self.state, sql, args)
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        record_query(&self.state, sql, args)
    }
}

impl Connector for MockDriver {
    type Tx = MockTx;

    async fn begin(&self) -> OrmResult<MockTx> {
        self.state.lock().unwrap().events.push("begin");
        Ok(MockTx {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MockTx {
    state: Arc<Mutex<State>>,
}

impl Executor for MockTx {
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        record_exec(&self.state, sql, args)
    }

    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        record_query(&self.state, sql, args)
    }
}

impl TxHandle for MockTx {
    async fn commit(self) -> OrmResult<()> {
        self.state.lock().unwrap().events.push("commit");
        Ok(())
    }

    async fn rollback(self) -> OrmResult<()> {
        self.state.lock().unwrap().events.push("rollback");
        Ok(())
    }
}
