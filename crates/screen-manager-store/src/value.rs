//! Tagged statement parameters and result cells.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use tracing::warn;

/// A positional statement parameter.
///
/// There is no null variant: every bound parameter carries a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Real(f64),
    /// UTF-8 text
    Text(String),
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Integer(v) => ToSqlOutput::from(*v),
            Param::Real(v) => ToSqlOutput::from(*v),
            Param::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Integer(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Integer(i64::from(v))
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Real(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

/// A decoded result value, tagged with the storage class it was read as.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// SQL NULL (also used for unsupported storage classes)
    Null,
    /// Integer storage class
    Integer(i64),
    /// Real storage class
    Real(f64),
    /// Text storage class
    Text(String),
}

impl Cell {
    /// Integer payload, if this is an integer cell.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Real payload, if this is a real cell.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this is a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this cell is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(v) => Cell::Integer(v),
            ValueRef::Real(v) => Cell::Real(v),
            ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => {
                warn!("Unsupported column type: blob ({} bytes)", bytes.len());
                Cell::Null
            }
        }
    }
}

/// One materialized result row, in column order.
pub type Row = Vec<Cell>;
