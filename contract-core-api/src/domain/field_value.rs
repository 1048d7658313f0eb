use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Sentinel field name for whole-entity create/delete records.
pub const WHOLE_ENTITY_FIELD: &str = "all";

/// A typed field value as seen by the change detector.
///
/// Equality is value equality appropriate to the type: dates compare by
/// instant, decimals compare numerically (`1.0 == 1.00`). Rendering for the
/// audit log is deterministic and keeps `Null` distinguishable from the
/// empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(DateTime<Utc>),
    Bool(bool),
}

impl FieldValue {
    /// Stringify for persistence in a change record.
    ///
    /// `Null` renders as `None` (an explicit SQL NULL), never as `""`.
    /// Dates use a fixed ISO-8601 form, decimals keep their original
    /// precision, booleans render as literal `true`/`false` tokens.
    pub fn render(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Decimal(d) => Some(d.to_string()),
            FieldValue::Date(ts) => Some(ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
            FieldValue::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Date(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl<V: Into<FieldValue>> From<Option<V>> for FieldValue {
    fn from(v: Option<V>) -> Self {
        match v {
            Some(v) => v.into(),
            None => FieldValue::Null,
        }
    }
}

/// The tracked business fields of an entity at one point in time.
///
/// Bookkeeping fields (`updated_by`, `updated_at`, version counters) never
/// appear here. BTreeMap keeps detector output deterministically ordered.
pub type FieldSnapshot = BTreeMap<String, FieldValue>;

/// One field's old/new value pair, pre-persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDelta {
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldDelta {
    /// The synthetic delta recorded for whole-entity create/delete events.
    pub fn whole_entity() -> Self {
        FieldDelta {
            field_name: WHOLE_ENTITY_FIELD.to_string(),
            old_value: None,
            new_value: None,
        }
    }
}
