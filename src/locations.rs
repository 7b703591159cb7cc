use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Location groups offered as heatmap column sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    #[default]
    City,
    Buoy,
    EcologicalPreserve,
    FishingGround,
}

impl LocationType {
    pub const ALL: [LocationType; 4] = [
        LocationType::City,
        LocationType::Buoy,
        LocationType::EcologicalPreserve,
        LocationType::FishingGround,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LocationType::City => "City",
            LocationType::Buoy => "Buoy",
            LocationType::EcologicalPreserve => "Ecological Preserve",
            LocationType::FishingGround => "Fishing Ground",
        }
    }

    pub fn from_label(label: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == label)
            .ok_or_else(|| ValidationError::UnknownLocationType(label.to_owned()))
    }

    pub fn locations(self) -> &'static [&'static str] {
        match self {
            LocationType::City => &[
                "Haacklee",
                "Himark",
                "Lomark",
                "Paackland",
                "Port Grove",
                "South Paackland",
            ],
            LocationType::Buoy => &[
                "Exit East",
                "Exit North",
                "Exit South",
                "Exit West",
                "Nav 1",
                "Nav 2",
                "Nav 3",
                "Nav A",
                "Nav B",
                "Nav C",
                "Nav D",
                "Nav E",
            ],
            LocationType::EcologicalPreserve => {
                &["Don Limpet Preserve", "Ghoti Preserve", "Nemo Reef"]
            }
            LocationType::FishingGround => &["Cod Table", "Tuna Shelf", "Wrasse Beds"],
        }
    }
}

/// Heatmap columns for a selection, in selection order.
pub fn columns(types: &[LocationType]) -> Vec<String> {
    types
        .iter()
        .flat_map(|kind| kind.locations())
        .map(|location| (*location).to_owned())
        .collect()
}

/// `"City of Himark"` -> `"Himark"`.
pub fn clean_location_name(location: &str) -> &str {
    location
        .strip_prefix("City of")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map_or(location, str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_and_unknown_labels_fail() {
        for kind in LocationType::ALL {
            assert_eq!(LocationType::from_label(kind.label()), Ok(kind));
        }
        assert_eq!(
            LocationType::from_label("Harbor"),
            Err(ValidationError::UnknownLocationType("Harbor".into()))
        );
    }

    #[test]
    fn columns_follow_selection_order() {
        let cols = columns(&[LocationType::FishingGround, LocationType::EcologicalPreserve]);
        assert_eq!(
            cols,
            ["Cod Table", "Tuna Shelf", "Wrasse Beds", "Don Limpet Preserve", "Ghoti Preserve", "Nemo Reef"]
        );
        assert_eq!(columns(&[LocationType::default()]).len(), 6);
    }

    #[test]
    fn city_prefix_is_stripped() {
        assert_eq!(clean_location_name("City of South Paackland"), "South Paackland");
        assert_eq!(clean_location_name("Cityscape"), "Cityscape");
        assert_eq!(clean_location_name("Nav 1"), "Nav 1");
    }
}
