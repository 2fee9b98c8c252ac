//! Commands accepted from the home automation side.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::{
    api::{flexmeasures, home_assistant},
    core::{
        cem::{self, Cem},
        control_type::{ControlType, InvalidControlType},
        measurements::Measurements,
        schedule::{Schedule, ScheduleConfig, ScheduleRequest},
        time,
    },
    prelude::*,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidControlType(#[from] InvalidControlType),

    #[error("failed to activate the control type")]
    Cem(#[from] cem::Error),

    #[error("FlexMeasures call failed")]
    FlexMeasures(#[from] flexmeasures::Error),

    #[error("failed to align the schedule")]
    Time(#[from] time::Error),

    #[error("failed to publish the state")]
    Publish(#[from] home_assistant::Error),
}

/// Remote optimisation.
#[async_trait]
pub trait Scheduler: Sync {
    /// Trigger a new schedule and return one value per resolution step starting at the requested start.
    async fn trigger_and_get_schedule(
        &self,
        request: &ScheduleRequest<'_>,
    ) -> Result<Vec<f64>, flexmeasures::Error>;
}

#[async_trait]
pub trait MeasurementSink: Sync {
    async fn post_measurements(&self, measurements: &Measurements) -> Result<(), flexmeasures::Error>;
}

/// Receiver of the observable state.
#[async_trait]
pub trait Publisher: Sync {
    async fn publish_control_type(&self, control_type: ControlType) -> Result<(), home_assistant::Error>;

    async fn publish_schedule(&self, schedule: &Schedule) -> Result<(), home_assistant::Error>;
}

/// Absent publisher silently accepts everything.
#[async_trait]
impl<P: Publisher> Publisher for Option<P> {
    async fn publish_control_type(&self, control_type: ControlType) -> Result<(), home_assistant::Error> {
        match self {
            Some(publisher) => publisher.publish_control_type(control_type).await,
            None => Ok(()),
        }
    }

    async fn publish_schedule(&self, schedule: &Schedule) -> Result<(), home_assistant::Error> {
        match self {
            Some(publisher) => publisher.publish_schedule(schedule).await,
            None => Ok(()),
        }
    }
}

/// Activate the named control type on the CEM and publish it.
///
/// An unknown name leaves the CEM untouched.
#[instrument(skip_all, fields(name = name))]
pub async fn change_control_type(
    cem: &mut impl Cem,
    publisher: &impl Publisher,
    name: &str,
) -> Result<ControlType, Error> {
    let control_type = name.parse::<ControlType>()?;
    cem.activate_control_type(control_type).await?;
    let control_type = cem.control_type().unwrap_or(control_type);
    publisher.publish_control_type(control_type).await?;
    Ok(control_type)
}

/// Request the schedule starting at the next resolution boundary after `now`.
#[instrument(skip_all, fields(now = %now, resolution = %resolution))]
pub async fn request_schedule(
    scheduler: &impl Scheduler,
    config: &ScheduleConfig,
    resolution: TimeDelta,
    now: DateTime<FixedOffset>,
    soc_at_start: Option<f64>,
) -> Result<Schedule, Error> {
    let start = time::ceil(now, resolution)?;
    debug!(%start, sensor_ids = ?config.sensor_ids(), "requesting…");
    let request = ScheduleRequest { config, start, soc_at_start };
    let values = scheduler.trigger_and_get_schedule(&request).await?;
    let schedule = Schedule::project(start, resolution, values)?;
    info!(%start, n_entries = schedule.len(), "projected");
    Ok(schedule)
}

/// Request the schedule and publish it.
pub async fn trigger_and_get_schedule(
    scheduler: &impl Scheduler,
    publisher: &impl Publisher,
    config: &ScheduleConfig,
    resolution: TimeDelta,
    now: DateTime<FixedOffset>,
    soc_at_start: Option<f64>,
) -> Result<Schedule, Error> {
    let schedule = request_schedule(scheduler, config, resolution, now, soc_at_start).await?;
    publisher.publish_schedule(&schedule).await?;
    Ok(schedule)
}

pub async fn post_measurements(
    sink: &impl MeasurementSink,
    measurements: &Measurements,
) -> Result<(), Error> {
    Ok(sink.post_measurements(measurements).await?)
}
