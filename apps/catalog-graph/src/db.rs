//! Aggregation queries over the catalog table.
//!
//! Every call opens its own connection, runs one fixed `GROUP BY` query and
//! closes the connection again. There is no pool.

use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx_core::any::AnyTypeInfoKind;
use sqlx::mysql::MySqlRow;
use sqlx::types::chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{AnyConnection, Connection, MySqlConnection, Row, TypeInfo, ValueRef};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::GraphError;

/// Columns the catalog is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupColumn {
    SellerId,
    CategoryName,
}

impl GroupColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupColumn::SellerId => "seller_id",
            GroupColumn::CategoryName => "category_name",
        }
    }

    fn count_alias(self) -> &'static str {
        match self {
            GroupColumn::SellerId => "seller_count",
            GroupColumn::CategoryName => "category_count",
        }
    }
}

/// A grouped column value, passed through with its database type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Null,
    Int(i64),
    UInt(u64),
    Text(String),
    Float(f64),
}

impl From<i64> for GroupKey {
    fn from(v: i64) -> Self {
        GroupKey::Int(v)
    }
}

impl From<&str> for GroupKey {
    fn from(v: &str) -> Self {
        GroupKey::Text(v.to_string())
    }
}

/// One `[key, count]` pair of an aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount(pub GroupKey, pub i64);

#[derive(Debug, Clone)]
pub struct CatalogDb {
    url: String,
    table: String,
}

impl CatalogDb {
    /// `table` must already be a plain identifier (see `config::parse_table_name`).
    pub fn new(url: impl Into<String>, table: impl Into<String>) -> Self {
        sqlx::any::install_default_drivers();
        Self { url: url.into(), table: table.into() }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Row count per distinct `seller_id`, in database order.
    pub async fn seller_counts(&self) -> Result<Vec<GroupCount>, GraphError> {
        self.count_by(GroupColumn::SellerId).await
    }

    /// Row count per distinct `category_name`, in database order.
    pub async fn category_counts(&self) -> Result<Vec<GroupCount>, GraphError> {
        self.count_by(GroupColumn::CategoryName).await
    }

    pub fn count_query(&self, column: GroupColumn) -> String {
        format!(
            "SELECT {col}, COUNT(*) AS {alias} FROM {table} GROUP BY {col}",
            col = column.as_str(),
            alias = column.count_alias(),
            table = self.table,
        )
    }

    async fn count_by(&self, column: GroupColumn) -> Result<Vec<GroupCount>, GraphError> {
        let started = Instant::now();
        let result = self.fetch_counts(column).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(GraphError::Connection(_)) => "connection_error",
            Err(GraphError::Query(_)) => "query_error",
        };
        metrics::histogram!("catalog_query_duration_seconds", "column" => column.as_str())
            .record(started.elapsed().as_secs_f64());
        metrics::counter!("catalog_queries_total", "column" => column.as_str(), "outcome" => outcome)
            .increment(1);
        result
    }

    /// MySQL/MariaDB URLs use the native driver, which knows every column
    /// type; anything else goes through the `Any` driver.
    pub fn uses_native_mysql(&self) -> bool {
        self.url.starts_with("mysql:") || self.url.starts_with("mariadb:")
    }

    async fn fetch_counts(&self, column: GroupColumn) -> Result<Vec<GroupCount>, GraphError> {
        let sql = self.count_query(column);
        let counts = if self.uses_native_mysql() {
            let mut conn = MySqlConnection::connect(&self.url)
                .await
                .map_err(GraphError::Connection)?;
            let rows = sqlx::query(&sql).fetch_all(&mut conn).await;
            close_connection(conn, column).await;
            decode_rows(&rows.map_err(GraphError::Query)?, decode_mysql_key)
                .map_err(GraphError::Query)?
        } else {
            let mut conn = AnyConnection::connect(&self.url)
                .await
                .map_err(GraphError::Connection)?;
            let rows = sqlx::query(&sql).fetch_all(&mut conn).await;
            close_connection(conn, column).await;
            decode_rows(&rows.map_err(GraphError::Query)?, decode_any_key)
                .map_err(GraphError::Query)?
        };

        debug!(column = column.as_str(), groups = counts.len(), "aggregation fetched");
        Ok(counts)
    }
}

async fn close_connection<C: Connection>(conn: C, column: GroupColumn) {
    if let Err(e) = conn.close().await {
        warn!(column = column.as_str(), error = %e, "closing database connection failed");
    }
}

fn decode_rows<R: Row>(
    rows: &[R],
    decode_key: fn(&R) -> Result<GroupKey, sqlx::Error>,
) -> Result<Vec<GroupCount>, sqlx::Error>
where
    usize: sqlx::ColumnIndex<R>,
    i64: for<'r> sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    rows.iter()
        .map(|row| {
            let key = decode_key(row)?;
            let count: i64 = row.try_get(1)?;
            Ok(GroupCount(key, count))
        })
        .collect()
}

// The `Any` value never reports NULL itself, so the column kind is checked
// before decoding.
fn decode_any_key(row: &AnyRow) -> Result<GroupKey, sqlx::Error> {
    let kind = row.try_get_raw(0)?.type_info().kind();
    match kind {
        AnyTypeInfoKind::Null => Ok(GroupKey::Null),
        AnyTypeInfoKind::Bool => row.try_get::<bool, _>(0).map(|b| GroupKey::Int(b.into())),
        AnyTypeInfoKind::SmallInt | AnyTypeInfoKind::Integer | AnyTypeInfoKind::BigInt => {
            row.try_get::<i64, _>(0).map(GroupKey::Int)
        }
        AnyTypeInfoKind::Real | AnyTypeInfoKind::Double => {
            row.try_get::<f64, _>(0).map(GroupKey::Float)
        }
        AnyTypeInfoKind::Text => row.try_get::<String, _>(0).map(GroupKey::Text),
        // BLOB, and MySQL TEXT which the `Any` mapping also reports as BLOB
        _ => row.try_get::<Vec<u8>, _>(0).map(bytes_key),
    }
}

fn decode_mysql_key(row: &MySqlRow) -> Result<GroupKey, sqlx::Error> {
    let raw = row.try_get_raw(0)?;
    if raw.is_null() {
        return Ok(GroupKey::Null);
    }
    let type_name = raw.type_info().name().to_string();

    if let Ok(v) = row.try_get::<i64, _>(0) {
        return Ok(GroupKey::Int(v));
    }
    if let Ok(v) = row.try_get::<u64, _>(0) {
        return Ok(GroupKey::UInt(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(0) {
        return Ok(GroupKey::Float(v));
    }
    if let Ok(v) = row.try_get::<f32, _>(0) {
        return Ok(GroupKey::Float(v.into()));
    }
    if let Ok(v) = row.try_get::<String, _>(0) {
        return Ok(GroupKey::Text(v));
    }
    // DECIMAL arrives as its textual form.
    if type_name == "DECIMAL" {
        return row.try_get_unchecked::<String, _>(0).map(GroupKey::Text);
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(0) {
        return Ok(GroupKey::Text(v.to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(0) {
        return Ok(GroupKey::Text(v.to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveTime, _>(0) {
        return Ok(GroupKey::Text(v.to_string()));
    }
    row.try_get::<Vec<u8>, _>(0).map(bytes_key)
}

fn bytes_key(bytes: Vec<u8>) -> GroupKey {
    GroupKey::Text(String::from_utf8_lossy(&bytes).into_owned())
}
