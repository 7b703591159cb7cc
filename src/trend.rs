use std::collections::BTreeMap;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::batch::MonthCode;
use crate::ordering::vessel_axis;
use crate::record::Record;

/// Segment colors for the trend grid. Locations not listed are black.
const LOCATION_COLORS: [(&str, Color32); 29] = [
    ("Centralia", Color32::from_rgb(0xff, 0x00, 0x00)),
    ("Exit West", Color32::from_rgb(0x00, 0xff, 0x00)),
    ("Nav 3", Color32::from_rgb(0x00, 0x00, 0xff)),
    ("Nav D", Color32::from_rgb(0xff, 0xff, 0x00)),
    ("Nav B", Color32::from_rgb(0xff, 0x00, 0xff)),
    ("Nav A", Color32::from_rgb(0x00, 0xff, 0xff)),
    ("Nav C", Color32::from_rgb(0x80, 0x00, 0x00)),
    ("Nav 2", Color32::from_rgb(0x80, 0x80, 0x00)),
    ("Nav 1", Color32::from_rgb(0x80, 0x00, 0x80)),
    ("Exit East", Color32::from_rgb(0x00, 0x80, 0x00)),
    ("Exit South", Color32::from_rgb(0x00, 0x00, 0x80)),
    ("Exit North", Color32::from_rgb(0x80, 0x80, 0x80)),
    ("Nav E", Color32::from_rgb(0xff, 0xa5, 0x00)),
    ("Suna Island", Color32::from_rgb(0xff, 0xc0, 0xcb)),
    ("Thalassa Retreat", Color32::from_rgb(0xa5, 0x2a, 0x2a)),
    ("Makara Shoal", Color32::from_rgb(0x8a, 0x2b, 0xe2)),
    ("Silent Sanctuary", Color32::from_rgb(0xde, 0xb8, 0x87)),
    ("Cod Table", Color32::from_rgb(0x5f, 0x9e, 0xa0)),
    ("Ghoti Preserve", Color32::from_rgb(0xd2, 0x69, 0x1e)),
    ("Wrasse Beds", Color32::from_rgb(0xff, 0x7f, 0x50)),
    ("Nemo Reef", Color32::from_rgb(0x64, 0x95, 0xed)),
    ("Don Limpet Preserve", Color32::from_rgb(0xff, 0xf8, 0xdc)),
    ("Tuna Shelf", Color32::from_rgb(0xdc, 0x14, 0x3c)),
    ("City of Haacklee", Color32::from_rgb(0x00, 0xff, 0xff)),
    ("City of Himark", Color32::from_rgb(0x00, 0x00, 0x8b)),
    ("City of Lomark", Color32::from_rgb(0x00, 0x8b, 0x8b)),
    ("City of Paackland", Color32::from_rgb(0xb8, 0x86, 0x0b)),
    ("City of Port Grove", Color32::from_rgb(0xa9, 0xa9, 0xa9)),
    ("City of South Paackland", Color32::from_rgb(0x00, 0x64, 0x00)),
];

pub fn location_color(location: &str) -> Color32 {
    LOCATION_COLORS
        .iter()
        .find(|(name, _)| *name == location)
        .map_or(Color32::BLACK, |(_, color)| *color)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub location: String,
    pub dwell: f64,
}

/// Dwell per location for one month.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub month: MonthCode,
    /// Distinct locations in first-seen order.
    pub labels: Vec<String>,
    pub points: Vec<TrendPoint>,
}

/// The `week` column of `/main/trend-line/` holds a padded month code.
pub fn trend_line(records: &[Record], month: MonthCode) -> TrendLine {
    let code = month.code();
    let mut line = TrendLine {
        month,
        labels: Vec::new(),
        points: Vec::new(),
    };
    for record in records {
        let point = record.text("week").and_then(|week| {
            if week.trim() != code {
                return Ok(None);
            }
            let location = record.text("location_id")?.trim().to_owned();
            let dwell = record.number("dwell_count")?;
            Ok(Some(TrendPoint { location, dwell }))
        });
        match point {
            Ok(Some(point)) => {
                if !line.labels.contains(&point.location) {
                    line.labels.push(point.location.clone());
                }
                line.points.push(point);
            }
            Ok(None) => {}
            Err(err) => log::warn!("skipping trend-line record: {err}"),
        }
    }
    line
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendSegment {
    pub location: String,
    pub total_dwell: f64,
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendCell {
    pub week: String,
    pub vessel: String,
    pub segments: Vec<TrendSegment>,
}

/// Week x vessel grid whose cells are split into location segments.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendGrid {
    /// Ascending.
    pub weeks: Vec<String>,
    /// Same order as heatmap rows for the same vessels.
    pub vessels: Vec<String>,
    pub cells: Vec<TrendCell>,
}

impl TrendGrid {
    pub fn cell(&self, week: &str, vessel: &str) -> Option<&TrendCell> {
        self.cells
            .iter()
            .find(|cell| cell.week == week && cell.vessel == vessel)
    }
}

pub fn trend_grid(records: &[Record]) -> TrendGrid {
    let _span = tracing::info_span!("trend_grid", records = records.len()).entered();
    let mut cells: BTreeMap<(String, String), Vec<TrendSegment>> = BTreeMap::new();
    for record in records {
        let cell = record.text("week").and_then(|week| {
            let vessel = record.text("name")?;
            let location = record.text("location_id")?;
            let total_dwell = record.number("total_dwell")?;
            Ok((week, vessel, location, total_dwell))
        });
        match cell {
            Ok((week, vessel, location, total_dwell)) => {
                cells
                    .entry((week.to_owned(), vessel.to_owned()))
                    .or_default()
                    .push(TrendSegment {
                        location: location.to_owned(),
                        total_dwell,
                        color: location_color(location),
                    });
            }
            Err(err) => log::warn!("skipping trend-data record: {err}"),
        }
    }

    let mut weeks: Vec<String> = cells.keys().map(|(week, _)| week.clone()).collect();
    weeks.dedup();
    let vessels = vessel_axis(cells.keys().map(|(_, vessel)| vessel));
    let cells = cells
        .into_iter()
        .map(|((week, vessel), segments)| TrendCell {
            week,
            vessel,
            segments,
        })
        .collect();
    TrendGrid {
        weeks,
        vessels,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn trend_line_matches_trimmed_month_codes() {
        let records = [
            row(json!({"week": " 03 ", "location_id": " Nav 1", "dwell_count": 12})),
            row(json!({"week": "03", "location_id": "Exit East", "dwell_count": 4})),
            row(json!({"week": "03", "location_id": "Nav 1", "dwell_count": 7})),
            row(json!({"week": "04", "location_id": "Nav 2", "dwell_count": 1})),
        ];
        let line = trend_line(&records, MonthCode::parse("03").unwrap());
        assert_eq!(line.labels, ["Nav 1", "Exit East"]);
        assert_eq!(line.points.len(), 3);
        assert_eq!(line.points[0].dwell, 12.0);
    }

    #[test]
    fn grid_groups_segments_per_week_and_vessel() {
        let records = [
            row(json!({"week": "10", "name": "Zed", "location_id": "Nav 3", "total_dwell": 5})),
            row(json!({"week": "09", "name": "Zed", "location_id": "Nav 3", "total_dwell": 1})),
            row(json!({"week": "10", "name": "Zed", "location_id": "Nowhere", "total_dwell": 2})),
            row(json!({"week": "10", "name": "Snapper Snatcher", "location_id": "Nav 1", "total_dwell": 3})),
        ];
        let grid = trend_grid(&records);
        assert_eq!(grid.weeks, ["09", "10"]);
        assert_eq!(grid.vessels, ["Snapper Snatcher", "Zed"]);
        let cell = grid.cell("10", "Zed").unwrap();
        assert_eq!(cell.segments.len(), 2);
        assert_eq!(cell.segments[0].color, Color32::from_rgb(0, 0, 0xff));
        assert_eq!(cell.segments[1].color, Color32::BLACK);
    }

    #[test]
    fn grid_rows_agree_with_heatmap_rows() {
        use crate::batch::MonthBatch;
        use crate::pivot::{pivot, MetricKind};

        let names = ["Bravo", "Roach Robber", "Alpha", "Snapper Snatcher"];
        let trend: Vec<Record> = names
            .iter()
            .map(|name| row(json!({"week": "03", "name": name, "location_id": "Nav 1", "total_dwell": 1})))
            .collect();
        let pings: Vec<Record> = names
            .iter()
            .map(|name| row(json!({"vessel_name": name, "location_name": "Nav 1", "count": 1})))
            .collect();
        let batch = MonthBatch::new(2035, MonthCode::parse("03").unwrap()).unwrap();
        let table = pivot(&pings, MetricKind::Occurrence, &batch);
        assert_eq!(trend_grid(&trend).vessels, table.entities("2035-03-01"));
    }
}
