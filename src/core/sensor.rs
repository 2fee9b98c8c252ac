use serde::Serialize;

/// FlexMeasures sensor ID.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    derive_more::Display,
    derive_more::FromStr,
    derive_more::From,
)]
#[serde(transparent)]
pub struct SensorId(pub u32);

impl SensorId {
    /// Entity address of the sensor as FlexMeasures expects it in the sensor data API.
    #[must_use]
    pub fn entity_address(self) -> String {
        format!("ea1.2021-01.io.flexmeasures:fm1.{}", self.0)
    }
}
