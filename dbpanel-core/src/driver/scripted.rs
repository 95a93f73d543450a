//! Deterministic scripted driver for tests and offline demos.
//!
//! Expectations are queued as `(sql, result)` pairs; each incoming query
//! consumes the first queued entry with the same statement text. Queries
//! without a queued expectation fail, and [`ScriptedDriver::assert_all_consumed`]
//! turns leftover expectations into a test failure. `select_db` and
//! `prepare` calls are recorded for assertions.

use super::{ConnectionRole, DriverAdapter, FieldMeta, ResultSet, Statement};
use crate::Result;
use crate::error::DbPanelError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
struct Expectation {
    sql: String,
    /// `None` scripts a query failure.
    result: Option<ResultSet>,
}

/// Driver whose every answer is scripted ahead of time.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    expectations: Mutex<VecDeque<Expectation>>,
    selected_dbs: Mutex<Vec<(ConnectionRole, String)>>,
    prepared: Mutex<Vec<(ConnectionRole, String)>>,
    queries_seen: Mutex<Vec<(ConnectionRole, String)>>,
}

impl ScriptedDriver {
    /// Creates a driver with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful result for `sql`.
    pub fn expect_query(&self, sql: &str, columns: &[&str], rows: Vec<Vec<Option<&str>>>) {
        let fields = columns.iter().map(|name| FieldMeta::named(*name)).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.map(str::to_string)).collect())
            .collect();
        self.push(sql, Some(ResultSet::new(fields, rows)));
    }

    /// Queues an empty result for a statement like `SET` or an insert.
    pub fn expect_ok(&self, sql: &str) {
        self.push(sql, Some(ResultSet::empty()));
    }

    /// Queues a failure for `sql`.
    pub fn expect_failure(&self, sql: &str) {
        self.push(sql, None);
    }

    fn push(&self, sql: &str, result: Option<ResultSet>) {
        self.expectations
            .lock()
            .unwrap()
            .push_back(Expectation {
                sql: sql.to_string(),
                result,
            });
    }

    /// Database names passed to `select_db`, in call order.
    pub fn selected_databases(&self) -> Vec<String> {
        self.selected_dbs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Statements passed to `prepare`, in call order.
    pub fn prepared_statements(&self) -> Vec<(ConnectionRole, String)> {
        self.prepared.lock().unwrap().clone()
    }

    /// Every statement the driver was asked to run, in call order.
    pub fn issued_queries(&self) -> Vec<(ConnectionRole, String)> {
        self.queries_seen.lock().unwrap().clone()
    }

    /// Panics when scripted expectations were left unconsumed.
    pub fn assert_all_consumed(&self) {
        let leftover: Vec<String> = self
            .expectations
            .lock()
            .unwrap()
            .iter()
            .map(|expectation| expectation.sql.clone())
            .collect();
        assert!(
            leftover.is_empty(),
            "unconsumed scripted queries: {:?}",
            leftover
        );
    }
}

#[async_trait]
impl DriverAdapter for ScriptedDriver {
    async fn query(&self, sql: &str, role: ConnectionRole) -> Result<ResultSet> {
        self.queries_seen
            .lock()
            .unwrap()
            .push((role, sql.to_string()));

        let expectation = {
            let mut queue = self.expectations.lock().unwrap();
            let position = queue.iter().position(|entry| entry.sql == sql);
            position.and_then(|i| queue.remove(i))
        };

        match expectation {
            Some(Expectation {
                result: Some(result),
                ..
            }) => Ok(result),
            Some(Expectation { result: None, .. }) => {
                Err(DbPanelError::query_failed(sql.to_string()))
            }
            None => Err(DbPanelError::query_failed(format!(
                "unscripted query: {}",
                sql
            ))),
        }
    }

    async fn prepare(&self, sql: &str, role: ConnectionRole) -> Result<Statement> {
        self.prepared.lock().unwrap().push((role, sql.to_string()));
        Ok(Statement::new(sql, role))
    }

    async fn select_db(&self, name: &str, role: ConnectionRole) -> Result<()> {
        self.selected_dbs
            .lock()
            .unwrap()
            .push((role, name.to_string()));
        Ok(())
    }
}
