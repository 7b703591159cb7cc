//! Client-side reshaping of vessel-traffic records.
//!
//! Raw rows from the backend are validated ([`record`]), filtered
//! ([`filter`]), pivoted into date/vessel/location tables ([`pivot`]) or
//! tiered graphs ([`graph`]), colored ([`themes::heatscale`]) and, when the
//! user pins them, kept in a persistent [`dashboard`].

pub mod batch;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod dataflow;
pub mod error;
pub mod explore;
pub mod filter;
pub mod graph;
pub mod locations;
pub mod ordering;
pub mod pivot;
pub mod record;
pub mod storage;
pub mod telemetry;
pub mod themes;
pub mod trend;
pub mod widgets;

pub use batch::{MonthBatch, MonthCode};
pub use client::{Backend, HttpBackend};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardEntry, DashboardStore, EntryKind, Payload, RenderParams};
pub use error::{Error, Result};
pub use explore::{Explorer, HeatmapRequest, HeatmapView, NetworkView};
pub use filter::{filter, RecordFilter, VesselCategory};
pub use graph::{build, GraphModel, GraphSchema, CARGO_DELIVERY, FISH_TRACKING};
pub use ordering::prioritize_vessels;
pub use pivot::{pivot, MetricKind, PivotTable};
pub use record::Record;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use themes::heatscale::color_for;
