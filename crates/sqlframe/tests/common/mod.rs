//! In-memory client that records every statement it receives.

#![allow(dead_code)]

use sqlframe::{DbError, DbResult, Driver, ExecResult, GenericClient, RawRow, TxClient, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Recorder {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    events: Mutex<Vec<&'static str>>,
    responses: Mutex<VecDeque<Vec<RawRow>>>,
}

#[derive(Debug, Clone, Default)]
pub struct MockClient {
    recorder: Arc<Recorder>,
    exec: ExecResult,
    delay: Option<Duration>,
    fail_rollback: bool,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn with_rows(self, rows: Vec<RawRow>) -> Self {
        self.recorder.responses.lock().unwrap().push_back(rows);
        self
    }

    pub fn with_exec(mut self, exec: ExecResult) -> Self {
        self.exec = exec;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.recorder.statements.lock().unwrap().clone()
    }

    pub fn last_statement(&self) -> (String, Vec<Value>) {
        self.statements().pop().expect("no statement was sent")
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.recorder.events.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.recorder
            .statements
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl GenericClient for MockClient {
    type Row = RawRow;

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
        self.record(sql, args);
        self.pause().await;
        Ok(self.exec)
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<RawRow>> {
        self.record(sql, args);
        self.pause().await;
        Ok(self
            .recorder
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

impl Driver for MockClient {
    type Tx = MockTx;

    async fn begin(&self) -> DbResult<MockTx> {
        self.recorder.events.lock().unwrap().push("begin");
        Ok(MockTx {
            client: self.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockTx {
    client: MockClient,
}

impl GenericClient for MockTx {
    type Row = RawRow;

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
        self.client.execute(sql, args).await
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<RawRow>> {
        self.client.query(sql, args).await
    }
}

impl TxClient for MockTx {
    async fn commit(self) -> DbResult<()> {
        self.client.recorder.events.lock().unwrap().push("commit");
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        self.client.recorder.events.lock().unwrap().push("rollback");
        if self.client.fail_rollback {
            return Err(DbError::Transaction("connection lost".to_string()));
        }
        Ok(())
    }
}
