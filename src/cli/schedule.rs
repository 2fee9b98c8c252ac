use chrono::{Local, TimeDelta};
use clap::Parser;

use crate::{
    cli::{ConnectionArgs, FlexMeasuresArgs, HomeAssistantArgs},
    core::{schedule::ScheduleConfig, sensor::SensorId},
    prelude::*,
    services,
    tables::build_schedule_table,
};

#[derive(Parser)]
pub struct ScheduleConfigArgs {
    #[clap(long = "power-sensor", env = "POWER_SENSOR")]
    pub power_sensor_id: SensorId,

    #[clap(long = "consumption-price-sensor", env = "CONSUMPTION_PRICE_SENSOR")]
    pub consumption_price_sensor_id: SensorId,

    #[clap(long = "production-price-sensor", env = "PRODUCTION_PRICE_SENSOR")]
    pub production_price_sensor_id: SensorId,

    #[clap(long = "soc-sensor", env = "SOC_SENSOR")]
    pub soc_sensor_id: SensorId,

    /// Resource manager discharge sensor.
    #[clap(long = "rm-discharge-sensor", env = "RM_DISCHARGE_SENSOR")]
    pub rm_discharge_sensor_id: SensorId,

    /// Horizon of the requested schedule, for example: `1day`.
    #[clap(long = "schedule-duration", env = "SCHEDULE_DURATION")]
    pub schedule_duration: humantime::Duration,

    #[clap(long = "soc-unit", env = "SOC_UNIT", default_value = "kWh")]
    pub soc_unit: String,

    #[clap(long = "soc-min", env = "SOC_MIN")]
    pub soc_min: f64,

    #[clap(long = "soc-max", env = "SOC_MAX")]
    pub soc_max: f64,

    /// Step between consecutive schedule entries.
    #[clap(long = "resolution", env = "RESOLUTION", default_value = "15min")]
    pub resolution: humantime::Duration,
}

impl ScheduleConfigArgs {
    pub fn config(&self) -> Result<ScheduleConfig> {
        Ok(ScheduleConfig::builder()
            .power_sensor_id(self.power_sensor_id)
            .consumption_price_sensor_id(self.consumption_price_sensor_id)
            .production_price_sensor_id(self.production_price_sensor_id)
            .soc_sensor_id(self.soc_sensor_id)
            .rm_discharge_sensor_id(self.rm_discharge_sensor_id)
            .schedule_duration(TimeDelta::from_std(self.schedule_duration.into())?)
            .soc_unit(&self.soc_unit)
            .soc_min(self.soc_min)
            .soc_max(self.soc_max)
            .build()?)
    }

    pub fn resolution(&self) -> Result<TimeDelta> {
        TimeDelta::from_std(self.resolution.into()).context("the resolution is too large")
    }
}

#[derive(Parser)]
pub struct TriggerAndGetScheduleArgs {
    /// State of charge at the start of the schedule, in the state-of-charge unit.
    #[clap(long = "soc-at-start", env = "SOC_AT_START")]
    pub soc_at_start: Option<f64>,

    #[clap(flatten)]
    pub schedule: ScheduleConfigArgs,

    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(flatten)]
    pub flexmeasures: FlexMeasuresArgs,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantArgs,
}

impl TriggerAndGetScheduleArgs {
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result {
        let config = self.schedule.config()?;
        let resolution = self.schedule.resolution()?;
        let client = self.connection.try_new_client()?;
        let publisher = self.home_assistant.try_new_publisher(client.clone())?;
        let session = self.flexmeasures.connect(client).await?;

        let schedule = services::trigger_and_get_schedule(
            &session,
            &publisher,
            &config,
            resolution,
            Local::now().fixed_offset(),
            self.soc_at_start,
        )
        .await?;
        if schedule.is_empty() {
            warn!("FlexMeasures returned an empty schedule");
        }
        println!("{}", build_schedule_table(&schedule));
        Ok(())
    }
}
