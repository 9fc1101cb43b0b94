//! In-memory store double for driving the engines in tests.
//!
//! `MockSession` implements [`StoreSession`] over scripted rows: every
//! SELECT returns (or streams) the same row set, and executed statements
//! are recorded for assertion. Failures can be injected at a given execute
//! call or after a given number of streamed rows.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use chute_core::error::TransferError;

use crate::store::StoreSession;

/// Scripted [`StoreSession`] used by unit and integration tests.
#[derive(Debug, Default)]
pub struct MockSession {
    rows: Vec<Vec<String>>,
    /// SQL passed to `fetch_all` / `fetch_stream`, in call order.
    pub fetched: Vec<String>,
    /// SQL passed to `execute`, in call order (failed calls excluded).
    pub executed: Vec<String>,
    fail_execute_at: Option<usize>,
    fail_stream_after: Option<usize>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose queries all answer with `rows`.
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Fail the `n`-th (zero-based) `execute` call.
    pub fn fail_execute_at(mut self, n: usize) -> Self {
        self.fail_execute_at = Some(n);
        self
    }

    /// Stream `n` rows, then yield an error.
    pub fn fail_stream_after(mut self, n: usize) -> Self {
        self.fail_stream_after = Some(n);
        self
    }
}

#[async_trait]
impl StoreSession for MockSession {
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Vec<String>>, TransferError> {
        self.fetched.push(sql.to_string());
        Ok(self.rows.clone())
    }

    async fn fetch_stream<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> Result<BoxStream<'a, Result<Vec<String>, TransferError>>, TransferError> {
        self.fetched.push(sql.to_string());
        let mut items: Vec<Result<Vec<String>, TransferError>> =
            self.rows.clone().into_iter().map(Ok).collect();
        if let Some(n) = self.fail_stream_after {
            items.truncate(n);
            items.push(Err(TransferError::Query(
                "injected stream failure".to_string(),
            )));
        }
        Ok(futures::stream::iter(items).boxed())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, TransferError> {
        if self.fail_execute_at == Some(self.executed.len()) {
            return Err(TransferError::Query("injected failure".to_string()));
        }
        self.executed.push(sql.to_string());
        Ok(0)
    }
}
