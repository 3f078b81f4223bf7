use strum_macros::{Display, EnumIter, EnumString};

/// Central bodies available for the orbit geometry.
#[derive(
    Debug,
    Default,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Hash,
    Display,
    EnumString,
    EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum Planet {
    #[default]
    Earth,
    Mars,
    Moon,
}

impl Planet {
    /// Mean radius in kilometers.
    pub const fn radius_km(self) -> f64 {
        match self {
            Planet::Earth => 6371.0,
            Planet::Mars => 3389.5,
            Planet::Moon => 1737.4,
        }
    }
}
