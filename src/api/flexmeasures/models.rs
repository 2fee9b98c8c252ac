use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;
use serde_with::serde_as;

use crate::core::{measurements::Measurements, schedule::ScheduleRequest, sensor::SensorId};

#[derive(Serialize)]
pub struct AuthTokenRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[serde_as]
#[derive(Serialize)]
pub struct TriggerScheduleRequest<'a> {
    pub start: DateTime<FixedOffset>,

    /// ISO 8601.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub duration: TimeDelta,

    #[serde(rename = "flex-model")]
    pub flex_model: FlexModel<'a>,

    #[serde(rename = "flex-context")]
    pub flex_context: FlexContext,
}

impl<'a> From<&ScheduleRequest<'a>> for TriggerScheduleRequest<'a> {
    fn from(request: &ScheduleRequest<'a>) -> Self {
        let config = request.config;
        Self {
            start: request.start,
            duration: config.schedule_duration,
            flex_model: FlexModel {
                soc_unit: &config.soc_unit,
                soc_min: config.soc_min,
                soc_max: config.soc_max,
                soc_at_start: request.soc_at_start,
            },
            flex_context: FlexContext {
                consumption_price_sensor: config.consumption_price_sensor_id,
                production_price_sensor: config.production_price_sensor_id,
            },
        }
    }
}

#[derive(Serialize)]
pub struct FlexModel<'a> {
    #[serde(rename = "soc-unit")]
    pub soc_unit: &'a str,

    #[serde(rename = "soc-min")]
    pub soc_min: f64,

    #[serde(rename = "soc-max")]
    pub soc_max: f64,

    #[serde(rename = "soc-at-start", skip_serializing_if = "Option::is_none")]
    pub soc_at_start: Option<f64>,
}

#[derive(Serialize)]
pub struct FlexContext {
    #[serde(rename = "consumption-price-sensor")]
    pub consumption_price_sensor: SensorId,

    #[serde(rename = "production-price-sensor")]
    pub production_price_sensor: SensorId,
}

#[serde_as]
#[derive(Serialize)]
pub struct PostSensorDataRequest<'a> {
    /// Entity address.
    pub sensor: String,

    pub start: DateTime<FixedOffset>,

    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub duration: TimeDelta,

    pub values: &'a [f64],
    pub unit: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior: Option<DateTime<FixedOffset>>,
}

impl<'a> From<&'a Measurements> for PostSensorDataRequest<'a> {
    fn from(measurements: &'a Measurements) -> Self {
        Self {
            sensor: measurements.sensor_id.entity_address(),
            start: measurements.start,
            duration: measurements.duration,
            values: &measurements.values,
            unit: &measurements.unit,
            prior: measurements.prior,
        }
    }
}
