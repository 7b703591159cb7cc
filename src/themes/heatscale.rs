//! Piecewise value -> color mapping for heatmap cells.
//!
//! Each metric has an ordered list of bands covering `(0, ∞)`. Inside a band
//! the color is interpolated between the band's two endpoint colors; above
//! the last band everything is [`OVERFLOW_COLOR`]; exactly zero is always
//! [`ZERO_COLOR`]. Along the whole scale the "heat" (red minus blue channel)
//! never decreases as the value grows.

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pivot::MetricKind;

pub const ZERO_COLOR: Color32 = Color32::from_rgb(0x3f, 0x53, 0xc6);
pub const OVERFLOW_COLOR: Color32 = Color32::from_rgb(0xff, 0x45, 0x00);

const COOL_FROM: Color32 = Color32::from_rgb(120, 120, 255);
const COOL_TO: Color32 = Color32::from_rgb(155, 155, 255);
const WARM_FROM: Color32 = Color32::from_rgb(0, 255, 0);
const WARM_TO: Color32 = Color32::from_rgb(255, 128, 0);
const HOT_FROM: Color32 = Color32::from_rgb(255, 254, 0);
const HOT_TO: Color32 = Color32::from_rgb(255, 0, 0);

/// Top of the occurrence / harbor-report range in the exploration view.
pub const OCCURRENCE_MAX: f64 = 225.0;
/// Top of the dwell range in the exploration view, in seconds.
pub const DWELL_MAX: f64 = 28_735_322.833238;

/// Which set of breakpoints to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleProfile {
    /// Breakpoints relative to the full data range, for the exploration view.
    #[default]
    Explore,
    /// Fixed tighter breakpoints used by pinned dashboard tiles.
    Compact,
}

/// Values in `(lo, hi]` are interpolated from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
    pub from: Color32,
    pub to: Color32,
}

impl Band {
    fn contains(&self, value: f64) -> bool {
        value > self.lo && value <= self.hi
    }

    fn color_at(&self, value: f64) -> Color32 {
        let t = ((value - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color32::from_rgb(
            lerp(self.from.r(), self.to.r()),
            lerp(self.from.g(), self.to.g()),
            lerp(self.from.b(), self.to.b()),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeatScale {
    bands: Vec<Band>,
}

impl HeatScale {
    /// Builds bands from ascending upper bounds, one endpoint pair per bound.
    fn from_bounds(bounds: &[f64], colors: &[(Color32, Color32)]) -> Self {
        let mut lo = 0.0;
        let bands = bounds
            .iter()
            .zip(colors)
            .map(|(&hi, &(from, to))| {
                let band = Band { lo, hi, from, to };
                lo = hi;
                band
            })
            .collect();
        Self { bands }
    }

    pub fn for_metric(metric: MetricKind, profile: ScaleProfile) -> Self {
        let counts = [(COOL_FROM, COOL_TO), (WARM_FROM, WARM_TO)];
        let dwell = [(COOL_FROM, COOL_TO), (WARM_FROM, WARM_TO), (HOT_FROM, HOT_TO)];
        match (metric, profile) {
            (MetricKind::Occurrence | MetricKind::Harbor, ScaleProfile::Explore) => {
                Self::from_bounds(&[OCCURRENCE_MAX * 0.067, OCCURRENCE_MAX * 0.133], &counts)
            }
            (MetricKind::Occurrence | MetricKind::Harbor, ScaleProfile::Compact) => {
                Self::from_bounds(&[15.0, 30.0], &counts)
            }
            (MetricKind::Dwell, ScaleProfile::Explore) => Self::from_bounds(
                &[DWELL_MAX * 0.007, DWELL_MAX * 0.014, DWELL_MAX * 0.042],
                &dwell,
            ),
            (MetricKind::Dwell, ScaleProfile::Compact) => {
                Self::from_bounds(&[50_000.0, 100_000.0, 300_000.0], &dwell)
            }
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn color_for(&self, value: f64) -> Result<Color32, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidMetricValue(value));
        }
        if value == 0.0 {
            return Ok(ZERO_COLOR);
        }
        Ok(self
            .bands
            .iter()
            .find(|band| band.contains(value))
            .map_or(OVERFLOW_COLOR, |band| band.color_at(value)))
    }
}

/// Exploration-view color for `value` under `metric`.
pub fn color_for(value: f64, metric: MetricKind) -> Result<Color32, ValidationError> {
    HeatScale::for_metric(metric, ScaleProfile::Explore).color_for(value)
}

/// Red-over-blue dominance, the quantity the scale keeps monotone.
pub fn heat(color: Color32) -> i16 {
    color.r() as i16 - color.b() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_has_its_own_color_for_every_metric() {
        for metric in MetricKind::ALL {
            for profile in [ScaleProfile::Explore, ScaleProfile::Compact] {
                let scale = HeatScale::for_metric(metric, profile);
                assert_eq!(scale.color_for(0.0), Ok(ZERO_COLOR));
            }
        }
    }

    #[test]
    fn band_endpoints_interpolate_linearly() {
        let scale = HeatScale::for_metric(MetricKind::Occurrence, ScaleProfile::Compact);
        assert_eq!(scale.color_for(15.0), Ok(COOL_TO));
        assert_eq!(scale.color_for(30.0), Ok(WARM_TO));
        assert_eq!(scale.color_for(22.5), Ok(Color32::from_rgb(128, 192, 0)));
        assert_eq!(scale.color_for(30.5), Ok(OVERFLOW_COLOR));
    }

    #[test]
    fn dwell_uses_its_own_range() {
        let hot = color_for(DWELL_MAX * 0.042, MetricKind::Dwell).unwrap();
        assert_eq!(hot, HOT_TO);
        let count = color_for(DWELL_MAX * 0.042, MetricKind::Occurrence).unwrap();
        assert_eq!(count, OVERFLOW_COLOR);
        assert_eq!(color_for(1e12, MetricKind::Dwell), Ok(OVERFLOW_COLOR));
    }

    #[test]
    fn negative_and_nan_are_rejected() {
        assert_eq!(
            color_for(-1.0, MetricKind::Harbor),
            Err(ValidationError::InvalidMetricValue(-1.0))
        );
        assert!(color_for(f64::NAN, MetricKind::Dwell).is_err());
        assert!(color_for(f64::INFINITY, MetricKind::Dwell).is_err());
    }

    #[test]
    fn heat_never_decreases_as_values_grow() {
        for metric in MetricKind::ALL {
            for profile in [ScaleProfile::Explore, ScaleProfile::Compact] {
                let scale = HeatScale::for_metric(metric, profile);
                let top = scale.bands().last().unwrap().hi * 1.5;
                let mut previous = heat(scale.color_for(0.0).unwrap());
                for step in 1..=2000 {
                    let value = top * step as f64 / 2000.0;
                    let current = heat(scale.color_for(value).unwrap());
                    assert!(
                        current >= previous,
                        "{metric:?}/{profile:?}: heat dropped at {value}"
                    );
                    previous = current;
                }
            }
        }
    }
}
