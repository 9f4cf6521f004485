//! Generic table introspection for the administrator's table browser.
//!
//! Table identifiers only ever reach SQL through [`Table`], a closed list of
//! the tables created by the migrations. Column names come from SQLite's own
//! catalogue, never from the caller.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, TypeInfo, ValueRef};
use utoipa::ToSchema;

use super::{
    error::{StoreError, StoreResult},
    Store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Roles,
    Users,
    Pools,
    Sensors,
    SensorReadings,
    Feedings,
    ControlCatches,
    Reports,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Roles,
        Table::Users,
        Table::Pools,
        Table::Sensors,
        Table::SensorReadings,
        Table::Feedings,
        Table::ControlCatches,
        Table::Reports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Roles => "roles",
            Table::Users => "users",
            Table::Pools => "pools",
            Table::Sensors => "sensors",
            Table::SensorReadings => "sensor_readings",
            Table::Feedings => "feedings",
            Table::ControlCatches => "control_catches",
            Table::Reports => "reports",
        }
    }

    /// Columns never returned by [`Store::get_all_data`].
    fn hidden_columns(self) -> &'static [&'static str] {
        match self {
            Table::Users => &["password_hash"],
            _ => &[],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StoreError::validation(format!("unknown table '{s}'")))
    }
}

/// One row of `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, empty when the column has none.
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// A dynamically typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Display form; `Empty` renders as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Integer(v) => v.to_string(),
            CellValue::Real(v) => v.to_string(),
            CellValue::Text(v) => v.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Real(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Empty, Into::into)
    }
}

/// Column headers plus rows, in header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TableData {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Store {
    /// Application tables present in the database file.
    pub async fn get_table_names(&self) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
              AND name <> '_sqlx_migrations'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    pub async fn get_table_columns(&self, table: Table) -> StoreResult<Vec<ColumnInfo>> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?1)
            ORDER BY cid
            "#,
        )
        .bind(table.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, not_null, default_value, pk)| ColumnInfo {
                name,
                data_type,
                not_null: not_null != 0,
                default_value,
                primary_key: pk != 0,
            })
            .collect())
    }

    /// Every row of `table`, ordered by rowid.
    pub async fn get_all_data(&self, table: Table) -> StoreResult<TableData> {
        let hidden = table.hidden_columns();
        let columns: Vec<String> = self
            .get_table_columns(table)
            .await?
            .into_iter()
            .map(|c| c.name)
            .filter(|name| !hidden.contains(&name.as_str()))
            .collect();

        let select_list = columns
            .iter()
            .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {select_list} FROM {table} ORDER BY rowid");

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(decode_row)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(TableData { columns, rows })
    }
}

fn decode_row(row: &SqliteRow) -> StoreResult<Vec<CellValue>> {
    (0..row.len()).map(|i| decode_cell(row, i)).collect()
}

// Storage class of the stored value decides the variant, not the declared
// column type.
fn decode_cell(row: &SqliteRow, index: usize) -> StoreResult<CellValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(CellValue::Empty);
    }
    let storage = raw.type_info().name().to_owned();

    let cell = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => CellValue::Integer(row.try_get_unchecked::<i64, _>(index)?),
        "REAL" => CellValue::Real(row.try_get_unchecked::<f64, _>(index)?),
        "BLOB" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            CellValue::Text(format!("<{} bytes>", bytes.len()))
        }
        _ => CellValue::Text(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(cell)
}
