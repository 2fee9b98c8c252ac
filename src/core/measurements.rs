use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::core::sensor::SensorId;

/// Sensor readings to be forwarded to FlexMeasures as is.
#[must_use]
#[derive(Clone, Debug, PartialEq, bon::Builder)]
pub struct Measurements {
    pub sensor_id: SensorId,

    /// Start of the first value.
    pub start: DateTime<FixedOffset>,

    /// Total duration covered by the values.
    pub duration: TimeDelta,

    pub values: Vec<f64>,

    #[builder(into)]
    pub unit: String,

    /// Time at which the values were known, if other than the time of posting.
    pub prior: Option<DateTime<FixedOffset>>,
}
