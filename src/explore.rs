//! The exploration pipeline: validate the user's selection, fetch, then
//! filter, pivot and order. Every step is an explicit call.

use egui::Color32;

use crate::batch::{MonthBatch, MonthCode, DEFAULT_YEAR};
use crate::client::Backend;
use crate::dashboard::{DashboardEntry, Payload, RenderParams};
use crate::error::{Result, ValidationError};
use crate::filter::{in_month, where_field, within_batch, RecordFilter, VesselCategory};
use crate::graph::{build, GraphModel, CARGO_DELIVERY, FISH_TRACKING};
use crate::locations::{columns, LocationType};
use crate::pivot::{pivot, MetricKind, PivotTable};
use crate::record::{ingest, Endpoint, Record};
use crate::themes::{HeatScale, ScaleProfile};
use crate::trend::{trend_grid, trend_line, TrendGrid, TrendLine};

/// Raw heatmap selection as the controls hold it.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapRequest {
    pub month: String,
    pub metric: MetricKind,
    pub category: VesselCategory,
    /// Vessel-type menu labels, only used for non-fishing vessels.
    pub vessel_labels: Vec<String>,
    pub location_types: Vec<String>,
}

impl Default for HeatmapRequest {
    fn default() -> Self {
        Self {
            month: MonthCode::default().code(),
            metric: MetricKind::default(),
            category: VesselCategory::default(),
            vessel_labels: Vec::new(),
            location_types: vec![LocationType::default().label().to_owned()],
        }
    }
}

/// A selection that passed validation and can be fetched.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapQuery {
    pub batch: MonthBatch,
    pub metric: MetricKind,
    pub filter: RecordFilter,
    pub location_types: Vec<LocationType>,
    pub columns: Vec<String>,
}

impl HeatmapRequest {
    pub fn validate(&self, year: i32) -> Result<HeatmapQuery, ValidationError> {
        let batch = MonthBatch::new(year, MonthCode::parse(&self.month)?)?;
        let mut filter = RecordFilter::new(self.category);
        if self.category == VesselCategory::NonFishing {
            filter = filter.with_subtypes(&self.vessel_labels)?;
        }
        let location_types = self
            .location_types
            .iter()
            .map(|label| LocationType::from_label(label))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HeatmapQuery {
            batch,
            metric: self.metric,
            filter: filter.within(batch),
            columns: columns(&location_types),
            location_types,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapView {
    pub batch: MonthBatch,
    pub metric: MetricKind,
    pub table: PivotTable,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
}

impl HeatmapView {
    pub fn date(&self) -> String {
        self.batch.date_key()
    }

    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.table.matrix(&self.date(), &self.rows, &self.columns)
    }

    pub fn scale(&self) -> HeatScale {
        HeatScale::for_metric(self.metric, ScaleProfile::Explore)
    }

    pub fn color(&self, value: f64) -> Result<Color32, ValidationError> {
        self.scale().color_for(value)
    }

    /// Snapshot for the dashboard, drawn with the compact breakpoints.
    pub fn pin(&self) -> DashboardEntry {
        DashboardEntry {
            payload: Payload::Heatmap(self.table.clone()),
            params: RenderParams {
                title: format!("{} · {}", self.metric.label(), self.batch.month().name()),
                date: self.date(),
                metric: Some(self.metric),
                locations: self.columns.clone(),
                rows: self.rows.clone(),
                profile: ScaleProfile::Compact,
            },
        }
    }
}

/// Filter, pivot and order one already-fetched month batch.
pub fn build_heatmap(records: &[Record], query: &HeatmapQuery) -> HeatmapView {
    let kept = query.filter.apply(records);
    let table = pivot(&kept, query.metric, &query.batch);
    let rows = table.entities(&query.batch.date_key());
    HeatmapView {
        batch: query.batch,
        metric: query.metric,
        table,
        rows,
        columns: query.columns.clone(),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkView {
    pub title: String,
    pub graph: GraphModel,
}

impl NetworkView {
    pub fn pin(&self) -> DashboardEntry {
        DashboardEntry {
            payload: Payload::Network(self.graph.clone()),
            params: RenderParams {
                title: self.title.clone(),
                ..RenderParams::default()
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CargoView {
    /// Every location in the cargo table, first-seen order.
    pub locations: Vec<String>,
    pub location: Option<String>,
    pub network: NetworkView,
}

/// Restricts cargo records to one month and one location. Without a
/// location the first known one is used.
pub fn cargo_view(records: &[Record], batch: &MonthBatch, location: Option<&str>) -> CargoView {
    let mut locations: Vec<String> = Vec::new();
    for record in records {
        if let Ok(id) = record.id("location_id") {
            if !locations.contains(&id) {
                locations.push(id);
            }
        }
    }
    let location = location
        .map(str::to_owned)
        .or_else(|| locations.first().cloned());
    let in_month = within_batch(records, batch);
    let selected = match &location {
        Some(location) => where_field(&in_month, "location_id", location),
        None => in_month,
    };
    let title = match &location {
        Some(location) => format!("Cargo deliveries · {location} · {}", batch.month().name()),
        None => format!("Cargo deliveries · {}", batch.month().name()),
    };
    CargoView {
        locations,
        location,
        network: NetworkView {
            title,
            graph: build(&selected, &CARGO_DELIVERY),
        },
    }
}

pub fn fish_view(records: &[Record], month: Option<MonthCode>) -> NetworkView {
    let (records, title) = match month {
        Some(month) => (
            in_month(records, "date", month),
            format!("Fish tracking · {}", month.name()),
        ),
        None => (records.to_vec(), "Fish tracking".to_owned()),
    };
    NetworkView {
        title,
        graph: build(&records, &FISH_TRACKING),
    }
}

/// Fetching front end over a [`Backend`].
#[derive(Clone, Debug)]
pub struct Explorer<B> {
    backend: B,
    year: i32,
}

impl<B: Backend> Explorer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            year: DEFAULT_YEAR,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn fetch(&self, endpoint: Endpoint, query: &[(&str, String)]) -> Result<Vec<Record>> {
        let rows = self.backend.get(endpoint, query)?;
        Ok(ingest(endpoint, rows).records)
    }

    /// The request is validated before anything is fetched.
    pub fn heatmap(&self, request: &HeatmapRequest) -> Result<HeatmapView> {
        let query = request.validate(self.year)?;
        let records = self.fetch(query.metric.endpoint(), &query.batch.query())?;
        Ok(build_heatmap(&records, &query))
    }

    pub fn cargo_graph(&self, month: &str, location: Option<&str>) -> Result<CargoView> {
        let batch = MonthBatch::new(self.year, MonthCode::parse(month)?)?;
        let records = self.fetch(Endpoint::CargoVessel, &[])?;
        Ok(cargo_view(&records, &batch, location))
    }

    pub fn fish_graph(&self, month: Option<&str>) -> Result<NetworkView> {
        let month = month.map(MonthCode::parse).transpose()?;
        let records = self.fetch(Endpoint::Combined, &[])?;
        Ok(fish_view(&records, month))
    }

    pub fn trend_line(&self, month: &str) -> Result<TrendLine> {
        let month = MonthCode::parse(month)?;
        let records = self.fetch(Endpoint::TrendLine, &[])?;
        Ok(trend_line(&records, month))
    }

    pub fn trend_grid(&self) -> Result<TrendGrid> {
        let records = self.fetch(Endpoint::TrendData, &[])?;
        Ok(trend_grid(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ping(vessel: &str, vessel_type: &str, location: &str) -> Record {
        Record::from_value(json!({
            "vessel_name": vessel,
            "vessel_type": vessel_type,
            "location_name": location,
            "count": 2,
            "dwellSum": "90.5",
            "vessel_count": 1,
        }))
        .unwrap()
    }

    #[test]
    fn validation_rejects_each_bad_field() {
        let bad_month = HeatmapRequest {
            month: "13".into(),
            ..HeatmapRequest::default()
        };
        assert_eq!(
            bad_month.validate(2035),
            Err(ValidationError::InvalidMonth("13".into()))
        );

        let bad_label = HeatmapRequest {
            category: VesselCategory::NonFishing,
            vessel_labels: vec!["Yacht".into()],
            ..HeatmapRequest::default()
        };
        assert!(matches!(
            bad_label.validate(2035),
            Err(ValidationError::UnknownVesselLabel(_))
        ));

        let bad_location = HeatmapRequest {
            location_types: vec!["Harbor".into()],
            ..HeatmapRequest::default()
        };
        assert!(matches!(
            bad_location.validate(2035),
            Err(ValidationError::UnknownLocationType(_))
        ));
    }

    #[test]
    fn default_request_is_valid() {
        let query = HeatmapRequest::default().validate(2035).unwrap();
        assert_eq!(query.batch.date_key(), "2035-02-01");
        assert_eq!(query.location_types, [LocationType::City]);
        assert_eq!(query.columns.len(), 6);
    }

    #[test]
    fn heatmap_rows_and_matrix_line_up() {
        let records = [
            ping("Zed", "Entity.Vessel.FishingVessel", "Himark"),
            ping("Roach Robber", "Entity.Vessel.FishingVessel", "Lomark"),
            ping("Cargo One", "Entity.Vessel.CargoVessel", "Himark"),
        ];
        let query = HeatmapRequest::default().validate(2035).unwrap();
        let view = build_heatmap(&records, &query);
        assert_eq!(view.rows, ["Roach Robber", "Zed"]);
        let matrix = view.matrix();
        assert_eq!(matrix[0][..3], [0.0, 0.0, 2.0]);
        assert_eq!(matrix[1][..3], [0.0, 2.0, 0.0]);
    }

    #[test]
    fn pinning_snapshots_the_table() {
        let query = HeatmapRequest::default().validate(2035).unwrap();
        let mut view = build_heatmap(&[ping("Zed", "Entity.Vessel.FishingVessel", "Himark")], &query);
        let entry = view.pin();
        view.table.insert("2035-02-01", "Zed", "Himark", 99.0);
        match entry.payload {
            Payload::Heatmap(table) => assert_eq!(table.get("2035-02-01", "Zed", "Himark"), 2.0),
            Payload::Network(_) => panic!("heatmap pinned as a network"),
        }
        assert_eq!(entry.params.profile, ScaleProfile::Compact);
        assert_eq!(entry.params.rows, ["Zed"]);
    }

    #[test]
    fn cargo_view_defaults_to_the_first_location() {
        let delivery = |location: &str, vessel: &str, date: &str| {
            Record::from_value(json!({
                "location_id": location,
                "vessel_name": vessel,
                "delivery_report_id": format!("{vessel}-{date}"),
                "transaction_date": date,
            }))
            .unwrap()
        };
        let records = [
            delivery("Himark", "A", "2035-02-03"),
            delivery("Lomark", "B", "2035-02-04"),
            delivery("Himark", "C", "2035-03-04"),
        ];
        let batch = MonthBatch::new(2035, MonthCode::parse("02").unwrap()).unwrap();
        let view = cargo_view(&records, &batch, None);
        assert_eq!(view.locations, ["Himark", "Lomark"]);
        assert_eq!(view.location.as_deref(), Some("Himark"));
        assert_eq!(view.network.graph.nodes.len(), 3);

        let lomark = cargo_view(&records, &batch, Some("Lomark"));
        assert!(lomark.network.graph.node("B").is_some());
        assert!(lomark.network.graph.node("A").is_none());
    }

    #[test]
    fn fish_view_filters_by_month_of_any_year() {
        let catch = |report: &str, date: &str| {
            Record::from_value(json!({
                "report_id": report,
                "fish_type_name": "Helenaa/Pisces satis",
                "location_id": "Nemo Reef",
                "date": date,
            }))
            .unwrap()
        };
        let records = [catch("r1", "2035-04-02"), catch("r2", "2034-04-20"), catch("r3", "2035-05-01")];
        let april = fish_view(&records, Some(MonthCode::parse("04").unwrap()));
        assert!(april.graph.node("r1").is_some());
        assert!(april.graph.node("r2").is_some());
        assert!(april.graph.node("r3").is_none());
        assert_eq!(fish_view(&records, None).graph.links.len(), 6);
    }
}
