use serde::{Deserialize, Serialize};

use crate::batch::{MonthBatch, MonthCode};
use crate::error::ValidationError;
use crate::record::Record;

pub const FISHING_VESSEL_TYPE: &str = "Entity.Vessel.FishingVessel";

/// Labels shown in the vessel-type menu and the type tags they stand for.
pub const VESSEL_TYPE_LABELS: [(&str, &str); 6] = [
    ("Ferry Passenger Vessel", "Entity.Vessel.Ferry.Passenger"),
    ("Cargo Vessel", "Entity.Vessel.CargoVessel"),
    ("Research Vessel", "Entity.Vessel.Research"),
    ("Tour Vessel", "Entity.Vessel.Tour"),
    ("Other Vessel", "Entity.Vessel.Other"),
    ("Ferry Cargo Vessel", "Entity.Vessel.Ferry.Cargo"),
];

const DATE_FIELDS: [&str; 2] = ["date", "transaction_date"];

pub fn vessel_type_for_label(label: &str) -> Result<&'static str, ValidationError> {
    VESSEL_TYPE_LABELS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, tag)| *tag)
        .ok_or_else(|| ValidationError::UnknownVesselLabel(label.to_owned()))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselCategory {
    #[default]
    Fishing,
    NonFishing,
}

impl VesselCategory {
    pub fn label(self) -> &'static str {
        match self {
            VesselCategory::Fishing => "Fishing Vessels",
            VesselCategory::NonFishing => "Non-Fishing Vessels",
        }
    }
}

/// Category, sub-type and date predicates over vessel records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordFilter {
    category: VesselCategory,
    subtypes: Vec<&'static str>,
    range: Option<MonthBatch>,
}

impl RecordFilter {
    pub fn new(category: VesselCategory) -> Self {
        Self {
            category,
            subtypes: Vec::new(),
            range: None,
        }
    }

    /// Restricts non-fishing records to the given menu labels. Every label
    /// must be known; an empty list keeps all non-fishing types.
    pub fn with_subtypes<I, S>(mut self, labels: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.subtypes = labels
            .into_iter()
            .map(|label| vessel_type_for_label(label.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn within(mut self, batch: MonthBatch) -> Self {
        self.range = Some(batch);
        self
    }

    pub fn category(&self) -> VesselCategory {
        self.category
    }

    pub fn subtypes(&self) -> &[&'static str] {
        &self.subtypes
    }

    pub fn matches(&self, record: &Record) -> bool {
        let Ok(vessel_type) = record.text("vessel_type") else {
            log::debug!("dropping record without vessel_type");
            return false;
        };
        let category_ok = match self.category {
            VesselCategory::Fishing => vessel_type == FISHING_VESSEL_TYPE,
            VesselCategory::NonFishing if !self.subtypes.is_empty() => {
                self.subtypes.contains(&vessel_type)
            }
            VesselCategory::NonFishing => vessel_type != FISHING_VESSEL_TYPE,
        };
        category_ok && self.range.is_none_or(|batch| in_range(record, &batch))
    }

    /// Returns a new sequence; the input is never touched.
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        let _span = tracing::info_span!("filter", category = ?self.category).entered();
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

pub fn filter(records: &[Record], predicate: &RecordFilter) -> Vec<Record> {
    predicate.apply(records)
}

/// Records without any date field were already scoped by the fetch window
/// and are kept; records with an unreadable date are dropped.
fn in_range(record: &Record, batch: &MonthBatch) -> bool {
    match DATE_FIELDS.iter().find(|field| record.has(field)) {
        None => true,
        Some(field) => match record.date(field) {
            Ok(date) => batch.contains(date),
            Err(err) => {
                log::warn!("dropping record with unreadable date: {err}");
                false
            }
        },
    }
}

pub fn within_batch(records: &[Record], batch: &MonthBatch) -> Vec<Record> {
    records
        .iter()
        .filter(|record| in_range(record, batch))
        .cloned()
        .collect()
}

/// Keeps records whose `field` date falls in `month` of any year.
pub fn in_month(records: &[Record], field: &str, month: MonthCode) -> Vec<Record> {
    records
        .iter()
        .filter(|record| record.date(field).is_ok_and(|date| month.matches(date)))
        .cloned()
        .collect()
}

pub fn where_field(records: &[Record], field: &str, value: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|record| record.id(field).is_ok_and(|id| id == value))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vessel(name: &str, vessel_type: &str, date: Option<&str>) -> Record {
        let mut value = json!({
            "vessel_name": name,
            "vessel_type": vessel_type,
            "location_name": "Himark",
            "count": 1,
        });
        if let Some(date) = date {
            value["date"] = json!(date);
        }
        Record::from_value(value).unwrap()
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.text("vessel_name").unwrap())
            .collect()
    }

    fn sample() -> Vec<Record> {
        vec![
            vessel("fisher", FISHING_VESSEL_TYPE, None),
            vessel("cargo", "Entity.Vessel.CargoVessel", None),
            vessel("tour", "Entity.Vessel.Tour", None),
        ]
    }

    #[test]
    fn fishing_keeps_only_the_fishing_tag() {
        let kept = RecordFilter::new(VesselCategory::Fishing).apply(&sample());
        assert_eq!(names(&kept), ["fisher"]);
    }

    #[test]
    fn non_fishing_without_allowlist_keeps_everything_else() {
        let kept = RecordFilter::new(VesselCategory::NonFishing).apply(&sample());
        assert_eq!(names(&kept), ["cargo", "tour"]);
    }

    #[test]
    fn allowlist_labels_map_to_type_tags() {
        let kept = RecordFilter::new(VesselCategory::NonFishing)
            .with_subtypes(["Tour Vessel"])
            .unwrap()
            .apply(&sample());
        assert_eq!(names(&kept), ["tour"]);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let err = RecordFilter::new(VesselCategory::NonFishing)
            .with_subtypes(["Submarine"])
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownVesselLabel("Submarine".into()));
    }

    #[test]
    fn date_range_is_half_open() {
        let batch = MonthBatch::new(2035, MonthCode::parse("03").unwrap()).unwrap();
        let records = vec![
            vessel("feb", FISHING_VESSEL_TYPE, Some("2035-02-28")),
            vessel("mar", FISHING_VESSEL_TYPE, Some("2035-03-31")),
            vessel("apr", FISHING_VESSEL_TYPE, Some("2035-04-01")),
            vessel("undated", FISHING_VESSEL_TYPE, None),
        ];
        let kept = RecordFilter::new(VesselCategory::Fishing)
            .within(batch)
            .apply(&records);
        assert_eq!(names(&kept), ["mar", "undated"]);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let predicate = RecordFilter::new(VesselCategory::NonFishing)
            .with_subtypes(["Cargo Vessel", "Tour Vessel"])
            .unwrap();
        let once = filter(&sample(), &predicate);
        let twice = filter(&once, &predicate);
        assert_eq!(once, twice);
    }

    #[test]
    fn field_helpers_select_by_value_and_month() {
        let records = vec![
            Record::from_value(json!({"location_id": "Himark", "transaction_date": "2035-02-10"}))
                .unwrap(),
            Record::from_value(json!({"location_id": "Lomark", "transaction_date": "2035-03-10"}))
                .unwrap(),
        ];
        assert_eq!(where_field(&records, "location_id", "Lomark").len(), 1);
        let feb = MonthCode::parse("02").unwrap();
        assert_eq!(in_month(&records, "transaction_date", feb).len(), 1);
        let batch = MonthBatch::new(2035, feb).unwrap();
        assert_eq!(within_batch(&records, &batch).len(), 1);
    }
}
