use chrono::{DateTime, FixedOffset, TimeDelta};
use clap::Parser;

use crate::{
    cli::{ConnectionArgs, FlexMeasuresArgs},
    core::{measurements::Measurements, sensor::SensorId},
    prelude::*,
    services,
};

#[derive(Parser)]
pub struct PostMeasurementsArgs {
    #[clap(long = "sensor-id")]
    pub sensor_id: SensorId,

    /// Start of the first value, RFC 3339.
    #[clap(long)]
    pub start: DateTime<FixedOffset>,

    /// Total duration covered by the values.
    #[clap(long)]
    pub duration: humantime::Duration,

    #[clap(long, value_delimiter = ',', num_args = 1.., allow_negative_numbers = true)]
    pub values: Vec<f64>,

    #[clap(long)]
    pub unit: String,

    /// Time at which the values were known, RFC 3339.
    #[clap(long)]
    pub prior: Option<DateTime<FixedOffset>>,

    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(flatten)]
    pub flexmeasures: FlexMeasuresArgs,
}

impl PostMeasurementsArgs {
    #[instrument(skip_all, fields(sensor_id = %self.sensor_id))]
    pub async fn run(&self) -> Result {
        let measurements = Measurements::builder()
            .sensor_id(self.sensor_id)
            .start(self.start)
            .duration(TimeDelta::from_std(self.duration.into())?)
            .values(self.values.clone())
            .unit(&self.unit)
            .maybe_prior(self.prior)
            .build();
        let session = self.flexmeasures.connect(self.connection.try_new_client()?).await?;
        services::post_measurements(&session, &measurements).await?;
        info!(n_values = measurements.values.len(), "posted");
        Ok(())
    }
}
