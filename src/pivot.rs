use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::batch::MonthBatch;
use crate::error::ShapeError;
use crate::ordering::vessel_axis;
use crate::record::{Endpoint, Record};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    #[default]
    Occurrence,
    Dwell,
    Harbor,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Occurrence, MetricKind::Dwell, MetricKind::Harbor];

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::Occurrence => "Occurrence",
            MetricKind::Dwell => "Dwell",
            MetricKind::Harbor => "Harbor Report",
        }
    }

    /// The record field that carries this metric.
    pub fn field(self) -> &'static str {
        match self {
            MetricKind::Occurrence => "count",
            MetricKind::Dwell => "dwellSum",
            MetricKind::Harbor => "vessel_count",
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            MetricKind::Occurrence | MetricKind::Dwell => Endpoint::TransponderPings,
            MetricKind::Harbor => Endpoint::HarborReports,
        }
    }

    /// Dwell is summed seconds and shown whole.
    pub fn value(self, record: &Record) -> Result<f64, ShapeError> {
        let raw = record.number(self.field())?;
        Ok(match self {
            MetricKind::Dwell => raw.floor(),
            MetricKind::Occurrence | MetricKind::Harbor => raw,
        })
    }
}

/// entity -> location -> value for one date.
pub type DateCells = BTreeMap<String, BTreeMap<String, f64>>;

/// date -> entity -> location -> value. Stored sparse, read dense: any
/// triple that was never inserted reads as 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PivotTable {
    dates: BTreeMap<String, DateCells>,
}

impl PivotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins on a repeated triple.
    pub fn insert(
        &mut self,
        date: impl Into<String>,
        entity: impl Into<String>,
        location: impl Into<String>,
        value: f64,
    ) {
        self.dates
            .entry(date.into())
            .or_default()
            .entry(entity.into())
            .or_default()
            .insert(location.into(), value);
    }

    pub fn get(&self, date: &str, entity: &str, location: &str) -> f64 {
        self.dates
            .get(date)
            .and_then(|entities| entities.get(entity))
            .and_then(|locations| locations.get(location))
            .copied()
            .unwrap_or(0.0)
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.dates.keys().map(String::as_str)
    }

    pub fn cells(&self, date: &str) -> Option<&DateCells> {
        self.dates.get(date)
    }

    /// Entities seen on `date`, in display order: sorted by name with the
    /// priority vessels moved to the front. Insertion order is not kept.
    pub fn entities(&self, date: &str) -> Vec<String> {
        self.dates
            .get(date)
            .map(|entities| vessel_axis(entities.keys()))
            .unwrap_or_default()
    }

    pub fn row<S: AsRef<str>>(&self, date: &str, entity: &str, locations: &[S]) -> Vec<f64> {
        locations
            .iter()
            .map(|location| self.get(date, entity, location.as_ref()))
            .collect()
    }

    pub fn matrix<R: AsRef<str>, C: AsRef<str>>(
        &self,
        date: &str,
        entities: &[R],
        locations: &[C],
    ) -> Vec<Vec<f64>> {
        entities
            .iter()
            .map(|entity| self.row(date, entity.as_ref(), locations))
            .collect()
    }

    pub fn max_value(&self, date: &str) -> f64 {
        self.dates
            .get(date)
            .into_iter()
            .flat_map(|entities| entities.values())
            .flat_map(|locations| locations.values())
            .copied()
            .fold(0.0, f64::max)
    }

    /// Number of stored (non-defaulted) cells.
    pub fn cell_count(&self) -> usize {
        self.dates
            .values()
            .flat_map(|entities| entities.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Pivots one month batch. Every cell is keyed by the batch start date, not
/// the record's own date. Records missing a field or carrying a negative
/// value are skipped.
pub fn pivot(records: &[Record], metric: MetricKind, batch: &MonthBatch) -> PivotTable {
    let _span = tracing::info_span!("pivot", ?metric, records = records.len()).entered();
    let date_key = batch.date_key();
    let mut table = PivotTable::new();
    let mut skipped = 0usize;

    for record in records {
        let cell = record.text("vessel_name").and_then(|entity| {
            let location = record.text("location_name")?;
            let value = metric.value(record)?;
            Ok((entity, location, value))
        });
        match cell {
            Ok((entity, location, value)) if value.is_finite() && value >= 0.0 => {
                table.insert(date_key.as_str(), entity, location, value);
            }
            Ok((entity, _, value)) => {
                log::warn!("skipping {entity}: {} value {value} is not a valid metric", metric.label());
                skipped += 1;
            }
            Err(err) => {
                log::warn!("skipping record in pivot: {err}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::debug!("pivot kept {} cells, skipped {skipped} records", table.cell_count());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::MonthCode;
    use serde_json::json;

    fn ping(vessel: &str, location: &str, count: f64, dwell: f64) -> Record {
        Record::from_value(json!({
            "vessel_name": vessel,
            "vessel_type": "Entity.Vessel.FishingVessel",
            "location_name": location,
            "count": count,
            "dwellSum": dwell,
            "vessel_count": count,
        }))
        .unwrap()
    }

    fn march() -> MonthBatch {
        MonthBatch::new(2035, MonthCode::parse("03").unwrap()).unwrap()
    }

    #[test]
    fn metric_kind_picks_the_field() {
        let records = [ping("A", "Himark", 4.0, 1234.9)];
        let occurrence = pivot(&records, MetricKind::Occurrence, &march());
        let dwell = pivot(&records, MetricKind::Dwell, &march());
        assert_eq!(occurrence.get("2035-03-01", "A", "Himark"), 4.0);
        assert_eq!(dwell.get("2035-03-01", "A", "Himark"), 1234.0);
    }

    #[test]
    fn absent_cells_read_as_zero() {
        let table = pivot(&[ping("A", "Himark", 4.0, 1.0)], MetricKind::Occurrence, &march());
        assert_eq!(table.get("2035-03-01", "A", "Lomark"), 0.0);
        assert_eq!(table.get("2035-03-01", "B", "Himark"), 0.0);
        assert_eq!(table.get("2035-04-01", "A", "Himark"), 0.0);
        assert_eq!(PivotTable::new().get("x", "y", "z"), 0.0);
    }

    #[test]
    fn last_write_wins_on_collisions() {
        let records = [ping("A", "Himark", 4.0, 1.0), ping("A", "Himark", 9.0, 1.0)];
        let table = pivot(&records, MetricKind::Occurrence, &march());
        assert_eq!(table.get("2035-03-01", "A", "Himark"), 9.0);
        assert_eq!(table.cell_count(), 1);
    }

    #[test]
    fn all_cells_share_the_batch_date() {
        let mut record = ping("A", "Himark", 1.0, 1.0);
        record = Record::from_value({
            let mut value = serde_json::to_value(&record).unwrap();
            value["date"] = json!("2035-03-17");
            value
        })
        .unwrap();
        let table = pivot(&[record], MetricKind::Occurrence, &march());
        assert_eq!(table.dates().collect::<Vec<_>>(), ["2035-03-01"]);
    }

    #[test]
    fn broken_and_negative_records_are_skipped() {
        let missing = Record::from_value(json!({"vessel_name": "B", "count": 3})).unwrap();
        let records = [missing, ping("C", "Himark", -2.0, 1.0), ping("A", "Himark", 2.0, 1.0)];
        let table = pivot(&records, MetricKind::Occurrence, &march());
        assert_eq!(table.cell_count(), 1);
        assert_eq!(table.get("2035-03-01", "A", "Himark"), 2.0);
    }

    #[test]
    fn rows_follow_the_vessel_axis() {
        let records = [
            ping("Zulu", "Himark", 1.0, 1.0),
            ping("Snapper Snatcher", "Himark", 2.0, 1.0),
            ping("Alpha", "Lomark", 3.0, 1.0),
            ping("Roach Robber", "Lomark", 4.0, 1.0),
        ];
        let table = pivot(&records, MetricKind::Occurrence, &march());
        let rows = table.entities("2035-03-01");
        assert_eq!(rows, ["Roach Robber", "Snapper Snatcher", "Alpha", "Zulu"]);
        let matrix = table.matrix("2035-03-01", &rows, &["Himark", "Lomark"]);
        assert_eq!(
            matrix,
            vec![vec![0.0, 4.0], vec![2.0, 0.0], vec![0.0, 3.0], vec![1.0, 0.0]]
        );
        assert_eq!(table.max_value("2035-03-01"), 4.0);
    }
}
