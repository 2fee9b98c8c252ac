use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::Serialize;

use crate::core::{sensor::SensorId, time};

#[derive(Debug, thiserror::Error)]
pub enum InvalidConfig {
    #[error("schedule duration must be positive, got `{0}`")]
    NonPositiveDuration(TimeDelta),

    #[error("minimal state of charge {min} exceeds the maximal one {max}")]
    SocBounds { min: f64, max: f64 },
}

/// Everything needed to request a schedule, fixed at start-up.
#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    pub power_sensor_id: SensorId,
    pub consumption_price_sensor_id: SensorId,
    pub production_price_sensor_id: SensorId,
    pub soc_sensor_id: SensorId,

    /// Resource manager discharge sensor.
    pub rm_discharge_sensor_id: SensorId,

    pub schedule_duration: TimeDelta,
    pub soc_unit: String,
    pub soc_min: f64,
    pub soc_max: f64,
}

#[bon::bon]
impl ScheduleConfig {
    #[builder]
    pub fn new(
        power_sensor_id: SensorId,
        consumption_price_sensor_id: SensorId,
        production_price_sensor_id: SensorId,
        soc_sensor_id: SensorId,
        rm_discharge_sensor_id: SensorId,
        schedule_duration: TimeDelta,
        #[builder(into)] soc_unit: String,
        soc_min: f64,
        soc_max: f64,
    ) -> Result<Self, InvalidConfig> {
        if schedule_duration <= TimeDelta::zero() {
            return Err(InvalidConfig::NonPositiveDuration(schedule_duration));
        }
        if soc_min > soc_max {
            return Err(InvalidConfig::SocBounds { min: soc_min, max: soc_max });
        }
        Ok(Self {
            power_sensor_id,
            consumption_price_sensor_id,
            production_price_sensor_id,
            soc_sensor_id,
            rm_discharge_sensor_id,
            schedule_duration,
            soc_unit,
            soc_min,
            soc_max,
        })
    }

    #[must_use]
    pub const fn sensor_ids(&self) -> [SensorId; 5] {
        [
            self.power_sensor_id,
            self.consumption_price_sensor_id,
            self.production_price_sensor_id,
            self.soc_sensor_id,
            self.rm_discharge_sensor_id,
        ]
    }
}

/// Parameters of a single remote optimisation.
#[derive(Copy, Clone, Debug)]
pub struct ScheduleRequest<'a> {
    pub config: &'a ScheduleConfig,

    /// Aligned start of the schedule.
    pub start: DateTime<FixedOffset>,

    pub soc_at_start: Option<f64>,
}

/// Single step of a charge/discharge plan.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, derive_more::Constructor)]
pub struct ScheduleEntry {
    pub start: DateTime<FixedOffset>,
    pub value: f64,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Schedule {
    pub start: DateTime<FixedOffset>,
    pub entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// Spread the values over consecutive steps of `resolution` beginning at `start`.
    ///
    /// The values are taken as is: no resampling, no gap filling.
    pub fn project(
        start: DateTime<FixedOffset>,
        resolution: TimeDelta,
        values: impl IntoIterator<Item = f64>,
    ) -> Result<Self, time::Error> {
        if resolution <= TimeDelta::zero() {
            return Err(time::Error::NonPositiveResolution(resolution));
        }
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let offset = i32::try_from(index)
                    .ok()
                    .and_then(|index| resolution.checked_mul(index))
                    .ok_or(time::Error::OutOfRange)?;
                let time = start.checked_add_signed(offset).ok_or(time::Error::OutOfRange)?;
                Ok::<_, time::Error>(ScheduleEntry::new(time, value))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { start, entries })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use itertools::Itertools;

    use super::*;

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn test_project_after_alignment() -> Result<(), time::Error> {
        let resolution = TimeDelta::minutes(15);
        let now = zone().with_ymd_and_hms(2024, 1, 1, 10, 0, 7).unwrap();
        let start = time::ceil(now, resolution)?;
        let schedule = Schedule::project(start, resolution, [1.0, 2.0, 3.0])?;
        assert_eq!(schedule.start, zone().with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap());
        assert_eq!(
            schedule.entries,
            [
                ScheduleEntry::new(zone().with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap(), 1.0),
                ScheduleEntry::new(zone().with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap(), 2.0),
                ScheduleEntry::new(zone().with_ymd_and_hms(2024, 1, 1, 10, 45, 0).unwrap(), 3.0),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_project_empty() -> Result<(), time::Error> {
        let start = zone().with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
        let schedule = Schedule::project(start, TimeDelta::minutes(15), Vec::new())?;
        assert!(schedule.is_empty());
        assert_eq!(schedule.start, start);
        Ok(())
    }

    #[test]
    fn test_project_spacing() -> Result<(), time::Error> {
        let start = zone().with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
        for resolution in [TimeDelta::seconds(1), TimeDelta::minutes(5), TimeDelta::hours(1)] {
            for n_values in [1_u32, 2, 96] {
                let values = (0..n_values).map(f64::from);
                let schedule = Schedule::project(start, resolution, values)?;
                assert_eq!(schedule.len(), n_values as usize);
                assert_eq!(schedule.entries[0].start, start);
                for (lhs, rhs) in schedule.entries.iter().tuple_windows() {
                    assert_eq!(rhs.start - lhs.start, resolution);
                    assert_eq!(rhs.value - lhs.value, 1.0);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_project_non_positive_resolution() {
        let start = zone().with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
        assert!(matches!(
            Schedule::project(start, TimeDelta::zero(), [1.0]),
            Err(time::Error::NonPositiveResolution(_)),
        ));
    }

    #[test]
    fn test_config_rejects_inverted_soc_bounds() {
        let result = ScheduleConfig::builder()
            .power_sensor_id(SensorId(1))
            .consumption_price_sensor_id(SensorId(2))
            .production_price_sensor_id(SensorId(3))
            .soc_sensor_id(SensorId(4))
            .rm_discharge_sensor_id(SensorId(5))
            .schedule_duration(TimeDelta::hours(24))
            .soc_unit("kWh")
            .soc_min(10.0)
            .soc_max(5.0)
            .build();
        assert!(matches!(result, Err(InvalidConfig::SocBounds { .. })));
    }

    #[test]
    fn test_config_rejects_zero_duration() {
        let result = ScheduleConfig::builder()
            .power_sensor_id(SensorId(1))
            .consumption_price_sensor_id(SensorId(2))
            .production_price_sensor_id(SensorId(3))
            .soc_sensor_id(SensorId(4))
            .rm_discharge_sensor_id(SensorId(5))
            .schedule_duration(TimeDelta::zero())
            .soc_unit("kWh")
            .soc_min(0.0)
            .soc_max(10.0)
            .build();
        assert!(matches!(result, Err(InvalidConfig::NonPositiveDuration(_))));
    }
}
