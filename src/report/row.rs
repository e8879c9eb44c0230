//! Result rows as returned by the report server.
//!
//! The server sends a flat JSON array of objects. Each object is either a
//! plain data row, a group header or a subtotal, distinguished by the
//! reserved `_type` key. This module turns that loosely-typed wire form into
//! [`ResultRow`], an explicit sum type, and back again.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator key carried by group header and subtotal rows.
pub const TYPE_KEY: &str = "_type";
/// Grouping values of a group header (and of the subtotal closing it).
pub const GROUP_KEY: &str = "_group_key";
/// Number of data rows in a group.
pub const RECORD_COUNT_KEY: &str = "_record_count";
/// Prefix marking keys that are never display columns.
pub const RESERVED_PREFIX: char = '_';
/// Suffix of the sibling key holding a column's aggregate on subtotal rows.
pub const SUBTOTAL_SUFFIX: &str = "_subtotal";

/// Whether `key` is reserved (never rendered as a column).
pub fn is_reserved(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

/// Key under which a subtotal row stores the aggregate for `column`.
pub fn subtotal_key(column: &str) -> String {
    format!("{column}{SUBTOTAL_SUFFIX}")
}

/// Errors raised while decoding rows from their wire form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("expected a row object, found {0}")]
    NotAnObject(&'static str),

    #[error("unknown row type {0:?}")]
    UnknownRowType(String),

    #[error("expected an array of rows, found {0}")]
    NotAnArray(&'static str),

    #[error("row {index}: {source}")]
    AtRow {
        index: usize,
        #[source]
        source: Box<RowError>,
    },
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Cell values
// ============================================================================

/// A scalar value in a result row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Convert a JSON value. Arrays and objects keep their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => CellValue::Text(value.to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => Value::from(*i),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Truthiness used when painting data rows: `null`, `false`, `0`, `NaN`
    /// and the empty string are all falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Int(i) => *i != 0,
            CellValue::Float(f) => *f != 0.0 && !f.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
        }
    }

    /// Numeric view of the value, if it has one.
    ///
    /// Numeric strings parse; booleans count as 1 and 0.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            // f64's Display already drops the fraction of integral values.
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

// ============================================================================
// Ordered fields
// ============================================================================

/// Column name to value mapping that keeps insertion order.
///
/// Header derivation depends on the order keys arrived in, so a hash map
/// will not do. Equality is order-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Fields(IndexMap<String, CellValue>);

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<CellValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_json_map(map: &Map<String, Value>) -> Self {
        map.iter()
            .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
            .collect()
    }

    fn to_json_map(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

// ============================================================================
// Row variants
// ============================================================================

/// Wire discriminator of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Data,
    GroupHeader,
    Subtotal,
}

impl RowKind {
    /// Value of `_type` on the wire; data rows carry none.
    pub fn wire_name(self) -> Option<&'static str> {
        match self {
            RowKind::Data => None,
            RowKind::GroupHeader => Some("GROUP_HEADER"),
            RowKind::Subtotal => Some("SUBTOTAL"),
        }
    }

    fn from_wire(value: Option<&Value>) -> Result<Self, RowError> {
        match value {
            None | Some(Value::Null) => Ok(RowKind::Data),
            Some(Value::String(s)) if s == "GROUP_HEADER" => Ok(RowKind::GroupHeader),
            Some(Value::String(s)) if s == "SUBTOTAL" => Ok(RowKind::Subtotal),
            Some(Value::String(s)) => Err(RowError::UnknownRowType(s.clone())),
            Some(other) => Err(RowError::UnknownRowType(other.to_string())),
        }
    }
}

/// A plain data row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow {
    pub fields: Fields,
}

/// Opens a group; carries the group's key values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupHeaderRow {
    /// Grouping column to grouping value.
    pub group_key: Fields,
    pub record_count: Option<u64>,
    /// Non-reserved keys the row happened to carry.
    pub fields: Fields,
}

/// Closes a group; carries `<column>_subtotal` aggregates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubtotalRow {
    pub group_key: Option<Fields>,
    pub fields: Fields,
}

impl SubtotalRow {
    /// Aggregate recorded for `column`, if any.
    pub fn subtotal(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(&subtotal_key(column))
    }
}

/// One element of a report's result sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRow {
    Data(DataRow),
    GroupHeader(GroupHeaderRow),
    Subtotal(SubtotalRow),
}

impl ResultRow {
    /// Build a data row from `(column, value)` pairs.
    pub fn data<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        ResultRow::Data(DataRow {
            fields: fields.into_iter().collect(),
        })
    }

    /// Build a group header from its grouping values.
    pub fn group_header<K, V, I>(group_key: I) -> Self
    where
        K: Into<String>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        ResultRow::GroupHeader(GroupHeaderRow {
            group_key: group_key.into_iter().collect(),
            ..Default::default()
        })
    }

    /// Build a subtotal row from `(column, aggregate)` pairs; the
    /// `_subtotal` suffix is added here.
    pub fn subtotal<K, V, I>(totals: I) -> Self
    where
        K: AsRef<str>,
        V: Into<CellValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        ResultRow::Subtotal(SubtotalRow {
            group_key: None,
            fields: totals
                .into_iter()
                .map(|(k, v)| (subtotal_key(k.as_ref()), v))
                .collect(),
        })
    }

    pub fn kind(&self) -> RowKind {
        match self {
            ResultRow::Data(_) => RowKind::Data,
            ResultRow::GroupHeader(_) => RowKind::GroupHeader,
            ResultRow::Subtotal(_) => RowKind::Subtotal,
        }
    }

    /// The row's non-reserved fields, in wire order.
    pub fn fields(&self) -> &Fields {
        match self {
            ResultRow::Data(row) => &row.fields,
            ResultRow::GroupHeader(row) => &row.fields,
            ResultRow::Subtotal(row) => &row.fields,
        }
    }

    /// Keys of this row that are display columns, in wire order.
    pub fn column_keys(&self) -> impl Iterator<Item = &str> {
        self.fields().keys().filter(|k| !is_reserved(k))
    }

    /// Decode one row from its JSON object form.
    pub fn from_object(map: &Map<String, Value>) -> Result<Self, RowError> {
        let kind = RowKind::from_wire(map.get(TYPE_KEY))?;
        let fields: Fields = map
            .iter()
            .filter(|(k, _)| !is_reserved(k))
            .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
            .collect();
        let group_key = match map.get(GROUP_KEY) {
            Some(Value::Object(key)) => Some(Fields::from_json_map(key)),
            _ => None,
        };

        Ok(match kind {
            RowKind::Data => ResultRow::Data(DataRow { fields }),
            RowKind::GroupHeader => ResultRow::GroupHeader(GroupHeaderRow {
                group_key: group_key.unwrap_or_default(),
                record_count: map.get(RECORD_COUNT_KEY).and_then(Value::as_u64),
                fields,
            }),
            RowKind::Subtotal => ResultRow::Subtotal(SubtotalRow { group_key, fields }),
        })
    }

    /// Decode one row from any JSON value.
    pub fn from_json(value: &Value) -> Result<Self, RowError> {
        match value {
            Value::Object(map) => Self::from_object(map),
            other => Err(RowError::NotAnObject(json_kind(other))),
        }
    }

    /// Encode back to the wire object form.
    pub fn to_object(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(name) = self.kind().wire_name() {
            map.insert(TYPE_KEY.to_string(), Value::String(name.to_string()));
        }
        match self {
            ResultRow::Data(_) => {}
            ResultRow::GroupHeader(row) => {
                map.insert(GROUP_KEY.to_string(), Value::Object(row.group_key.to_json_map()));
                if let Some(count) = row.record_count {
                    map.insert(RECORD_COUNT_KEY.to_string(), Value::from(count));
                }
            }
            ResultRow::Subtotal(row) => {
                if let Some(key) = &row.group_key {
                    map.insert(GROUP_KEY.to_string(), Value::Object(key.to_json_map()));
                }
            }
        }
        map.extend(self.fields().to_json_map());
        map
    }
}

impl Serialize for ResultRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResultRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        ResultRow::from_object(&map).map_err(de::Error::custom)
    }
}

/// Decode a full result set, reporting the index of the first bad row.
pub fn decode_rows(value: &Value) -> Result<Vec<ResultRow>, RowError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => return Err(RowError::NotAnArray(json_kind(other))),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            ResultRow::from_json(item).map_err(|source| RowError::AtRow {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Encode a result set to its wire array.
pub fn encode_rows(rows: &[ResultRow]) -> Value {
    Value::Array(rows.iter().map(|r| Value::Object(r.to_object())).collect())
}
