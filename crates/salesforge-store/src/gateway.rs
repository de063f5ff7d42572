//! Read-only execution of ad-hoc SQL.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, Row, Sqlite, Statement, TypeInfo, ValueRef};
use tracing::{debug, warn};

use crate::error::{StoreError, is_connection_error};
use crate::store::SqliteStore;

/// One cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ScalarValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Blob(bytes) => write!(f, "x'{}'", hex::encode(bytes)),
        }
    }
}

/// Ordered columns and rows returned by a statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ScalarValue>>,
}

impl QueryResult {
    /// First cell of the first row.
    pub fn scalar(&self) -> Option<&ScalarValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Right-aligned text table with a header line.
    pub fn to_text(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                cells
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(name.chars().count(), usize::max)
            })
            .collect();

        let render = |values: &[String]| {
            values
                .iter()
                .zip(&widths)
                .map(|(value, &width)| format!("{value:>width$}"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut lines = Vec::with_capacity(cells.len() + 1);
        lines.push(render(&self.columns));
        lines.extend(cells.iter().map(|row| render(row)));
        lines.join("\n")
    }
}

/// The engine rejected the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub message: String,
}

/// Outcome of a gateway call that reached the database.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Table(QueryResult),
    Failure(QueryFailure),
}

impl QueryOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn table(&self) -> Option<&QueryResult> {
        match self {
            Self::Table(result) => Some(result),
            Self::Failure(_) => None,
        }
    }

    /// Text shown to an operator: the table, or the error line.
    pub fn to_text(&self) -> String {
        match self {
            Self::Table(result) => result.to_text(),
            Self::Failure(failure) => format!("SQL Execution Error: {}", failure.message),
        }
    }

    pub fn into_response(self) -> QueryResponse {
        match self {
            Self::Table(result) => QueryResponse {
                columns: result.columns,
                rows: result.rows,
                error: None,
            },
            Self::Failure(failure) => QueryResponse {
                columns: Vec::new(),
                rows: Vec::new(),
                error: Some(failure.message),
            },
        }
    }
}

/// Caller-facing result shape; `error` is set only when `rows` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ScalarValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SqliteStore {
    /// Run one SQL statement and return its rows without changing stored data.
    ///
    /// The statement runs on a connection switched to `query_only`, inside a
    /// transaction that is always rolled back. Engine errors and input with
    /// more than one statement become [`QueryOutcome::Failure`]; only a lost
    /// database is returned as `Err`.
    pub async fn execute(&self, sql: &str) -> Result<QueryOutcome, StoreError> {
        let statement = match split_statements(sql).as_slice() {
            [statement] => *statement,
            [] => return Ok(reject("empty query".to_string())),
            statements => {
                return Ok(reject(format!(
                    "expected a single statement, found {}",
                    statements.len()
                )));
            }
        };

        let mut conn = self.pool().acquire().await.map_err(StoreError::Unreachable)?;
        session(&mut conn, "PRAGMA query_only = ON").await?;
        session(&mut conn, "BEGIN").await?;

        let outcome = match run_statement(&mut conn, statement).await {
            Ok(result) => {
                debug!(columns = result.columns.len(), rows = result.rows.len(), "query executed");
                QueryOutcome::Table(result)
            }
            Err(err) if is_connection_error(&err) => {
                conn.close_on_drop();
                return Err(StoreError::Unreachable(err));
            }
            Err(err) => reject(failure_message(&err)),
        };

        // A COMMIT or ROLLBACK in the statement already closed the transaction.
        if let Err(err) = (&mut *conn).execute("ROLLBACK").await {
            if is_connection_error(&err) {
                conn.close_on_drop();
                return Err(StoreError::Unreachable(err));
            }
            debug!(error = %err, "no open transaction to roll back");
        }
        session(&mut conn, "PRAGMA query_only = OFF").await?;
        Ok(outcome)
    }
}

fn reject(message: String) -> QueryOutcome {
    warn!(error = %message, "query failed");
    QueryOutcome::Failure(QueryFailure { message })
}

async fn session(conn: &mut PoolConnection<Sqlite>, sql: &str) -> Result<(), StoreError> {
    if let Err(err) = (&mut **conn).execute(sql).await {
        conn.close_on_drop();
        return Err(StoreError::from_sqlx(err));
    }
    Ok(())
}

/// Split `sql` on top-level semicolons, skipping quoted text and comments.
///
/// Segments holding only whitespace or comments are dropped.
pub(crate) fn split_statements(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut has_code = false;
    let mut idx = 0;

    while idx < bytes.len() {
        match bytes[idx] {
            open @ (b'\'' | b'"' | b'`' | b'[') => {
                let close = if open == b'[' { b']' } else { open };
                has_code = true;
                idx += 1;
                while idx < bytes.len() && bytes[idx] != close {
                    idx += 1;
                }
                idx += 1;
            }
            b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                while idx < bytes.len() && bytes[idx] != b'\n' {
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                idx += 2;
                while idx < bytes.len() && !bytes[idx..].starts_with(b"*/") {
                    idx += 1;
                }
                idx += 2;
            }
            b';' => {
                if has_code {
                    statements.push(sql[start..idx].trim());
                }
                has_code = false;
                idx += 1;
                start = idx;
            }
            byte => {
                has_code |= !byte.is_ascii_whitespace();
                idx += 1;
            }
        }
    }
    if has_code {
        statements.push(sql[start..].trim());
    }
    statements
}

async fn run_statement(conn: &mut SqliteConnection, sql: &str) -> Result<QueryResult, sqlx::Error> {
    let columns: Vec<String> = {
        let statement = (&mut *conn).prepare(sql).await?;
        statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect()
    };
    let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
    let rows = rows
        .iter()
        .map(|row| decode_row(row, columns.len()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QueryResult { columns, rows })
}

pub(crate) fn decode_row(row: &SqliteRow, width: usize) -> Result<Vec<ScalarValue>, sqlx::Error> {
    (0..width.min(row.len()))
        .map(|index| decode_value(row, index))
        .collect()
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<ScalarValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(ScalarValue::Null);
    }
    let kind = raw.type_info().name().to_string();
    let value = match kind.as_str() {
        "INTEGER" | "BOOLEAN" => ScalarValue::Integer(row.try_get_unchecked(index)?),
        "REAL" | "NUMERIC" => ScalarValue::Real(row.try_get_unchecked(index)?),
        "BLOB" => ScalarValue::Blob(row.try_get_unchecked(index)?),
        _ => ScalarValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

fn failure_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}
