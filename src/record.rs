//! Flat records as delivered by the backend, and the per-endpoint schemas
//! they are validated against when they enter the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ShapeError;

/// One flat row: field name to scalar.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn from_value(value: Value) -> Result<Self, ShapeError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(ShapeError::NotAnObject),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    fn require(&self, field: &str) -> Result<&Value, ShapeError> {
        self.get(field)
            .ok_or_else(|| ShapeError::MissingField(field.to_owned()))
    }

    pub fn text(&self, field: &str) -> Result<&str, ShapeError> {
        self.require(field)?
            .as_str()
            .ok_or_else(|| ShapeError::WrongType {
                field: field.to_owned(),
                expected: "string",
            })
    }

    /// Identifier fields are strings in most tables but numeric in a few.
    pub fn id(&self, field: &str) -> Result<String, ShapeError> {
        match self.require(field)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(ShapeError::WrongType {
                field: field.to_owned(),
                expected: "string or number",
            }),
        }
    }

    /// Numeric fields sometimes arrive as text (dwell is stored as text upstream).
    pub fn number(&self, field: &str) -> Result<f64, ShapeError> {
        let wrong_type = || ShapeError::WrongType {
            field: field.to_owned(),
            expected: "number",
        };
        match self.require(field)? {
            Value::Number(n) => n.as_f64().ok_or_else(wrong_type),
            Value::String(s) => s.trim().parse::<f64>().map_err(|_| wrong_type()),
            _ => Err(wrong_type()),
        }
    }

    /// Reads the `yyyy-MM-dd` prefix, so full timestamps are accepted too.
    pub fn date(&self, field: &str) -> Result<NaiveDate, ShapeError> {
        let text = self.text(field)?;
        text.get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .ok_or_else(|| ShapeError::WrongType {
                field: field.to_owned(),
                expected: "yyyy-MM-dd date",
            })
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Record {
    type Error = ShapeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    TransponderPings,
    HarborReports,
    TrendLine,
    TrendData,
    CargoVessel,
    Combined,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::TransponderPings => "/main/transponder-pings/",
            Endpoint::HarborReports => "/main/harbor-reports/",
            Endpoint::TrendLine => "/main/trend-line/",
            Endpoint::TrendData => "/main/trend-data/",
            Endpoint::CargoVessel => "/main/cargo-vessel/",
            Endpoint::Combined => "/main/combined/",
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Endpoint::TransponderPings => &[
                "vessel_name",
                "vessel_type",
                "location_name",
                "count",
                "dwellSum",
            ],
            Endpoint::HarborReports => &[
                "vessel_name",
                "vessel_type",
                "location_name",
                "vessel_count",
            ],
            Endpoint::TrendLine => &["week", "location_id", "dwell_count"],
            Endpoint::TrendData => &["week", "name", "location_id", "total_dwell"],
            Endpoint::CargoVessel => &[
                "location_id",
                "vessel_name",
                "delivery_report_id",
                "transaction_date",
            ],
            Endpoint::Combined => &["report_id", "fish_type_name", "location_id", "date"],
        }
    }

    pub fn validate(self, record: &Record) -> Result<(), ShapeError> {
        match self
            .required_fields()
            .iter()
            .find(|field| !record.has(field))
        {
            Some(field) => Err(ShapeError::MissingField((*field).to_owned())),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ingested {
    pub records: Vec<Record>,
    /// Position in the raw response and why the row was skipped.
    pub rejected: Vec<(usize, ShapeError)>,
}

/// Validates raw rows against the endpoint schema. Bad rows are skipped,
/// never fatal.
pub fn ingest(endpoint: Endpoint, values: Vec<Value>) -> Ingested {
    let _span = tracing::info_span!("ingest", endpoint = endpoint.path()).entered();
    let mut ingested = Ingested::default();
    for (index, value) in values.into_iter().enumerate() {
        let checked = Record::from_value(value)
            .and_then(|record| endpoint.validate(&record).map(|()| record));
        match checked {
            Ok(record) => ingested.records.push(record),
            Err(err) => {
                log::warn!("skipping row {index} from {}: {err}", endpoint.path());
                ingested.rejected.push((index, err));
            }
        }
    }
    ingested
}

/// Some views answer with a `{count, results}` envelope instead of a bare array.
pub fn unwrap_rows(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(rows) => Some(rows),
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(Value::Array(rows)) => Some(rows),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn accessors_coerce_ids_and_numeric_text() {
        let r = record(json!({
            "location_id": 17,
            "dwellSum": "1234.75",
            "date": "2035-03-04T10:00:00",
        }));
        assert_eq!(r.id("location_id").unwrap(), "17");
        assert_eq!(r.number("dwellSum").unwrap(), 1234.75);
        assert_eq!(
            r.date("date").unwrap(),
            NaiveDate::from_ymd_opt(2035, 3, 4).unwrap()
        );
    }

    #[test]
    fn null_fields_count_as_missing() {
        let r = record(json!({ "vessel_name": null }));
        assert_eq!(
            r.text("vessel_name"),
            Err(ShapeError::MissingField("vessel_name".to_owned()))
        );
    }

    #[test]
    fn ingest_skips_rows_without_required_fields() {
        let rows = vec![
            json!({"report_id": "r1", "fish_type_name": "f", "location_id": "l", "date": "2035-02-01"}),
            json!({"report_id": "r2", "location_id": "l", "date": "2035-02-01"}),
            json!("not a row"),
        ];
        let ingested = ingest(Endpoint::Combined, rows);
        assert_eq!(ingested.records.len(), 1);
        assert_eq!(
            ingested.rejected,
            vec![
                (1, ShapeError::MissingField("fish_type_name".to_owned())),
                (2, ShapeError::NotAnObject),
            ]
        );
    }

    #[test]
    fn envelopes_are_unwrapped() {
        let rows = unwrap_rows(json!({"count": 1, "results": [{"a": 1}]})).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(unwrap_rows(json!({"error": "nope"})).is_none());
    }
}
