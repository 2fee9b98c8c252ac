use chrono::{DateTime, TimeDelta, TimeZone};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("resolution must be positive, got `{0}`")]
    NonPositiveResolution(TimeDelta),

    #[error("aligned timestamp is out of the representable range")]
    OutOfRange,
}

/// Round the timestamp up to the next multiple of the resolution.
///
/// Multiples are counted from the Unix epoch, so the result does not depend on the time zone
/// as long as the zone offset itself is a multiple of the resolution.
/// An already aligned timestamp is returned unchanged.
pub fn ceil<Tz: TimeZone>(
    time: DateTime<Tz>,
    resolution: TimeDelta,
) -> Result<DateTime<Tz>, Error> {
    if resolution <= TimeDelta::zero() {
        return Err(Error::NonPositiveResolution(resolution));
    }
    let step = resolution.num_nanoseconds().ok_or(Error::OutOfRange)?;
    let remainder = time.timestamp_nanos_opt().ok_or(Error::OutOfRange)?.rem_euclid(step);
    if remainder == 0 {
        return Ok(time);
    }
    time.checked_add_signed(TimeDelta::nanoseconds(step - remainder)).ok_or(Error::OutOfRange)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    #[test]
    fn test_ceil_seconds() -> Result<(), Error> {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 7).unwrap();
        assert_eq!(
            ceil(time, TimeDelta::seconds(15))?,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 15).unwrap(),
        );
        Ok(())
    }

    #[test]
    fn test_ceil_aligned_is_unchanged() -> Result<(), Error> {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap();
        assert_eq!(ceil(time, TimeDelta::minutes(15))?, time);
        Ok(())
    }

    #[test]
    fn test_ceil_sub_second() -> Result<(), Error> {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap() + TimeDelta::nanoseconds(1);
        assert_eq!(
            ceil(time, TimeDelta::minutes(15))?,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap(),
        );
        Ok(())
    }

    #[test]
    fn test_ceil_keeps_time_zone() -> Result<(), Error> {
        let zone = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = zone.with_ymd_and_hms(2024, 6, 1, 10, 0, 7).unwrap();
        let aligned = ceil(time, TimeDelta::minutes(15))?;
        assert_eq!(aligned, zone.with_ymd_and_hms(2024, 6, 1, 10, 15, 0).unwrap());
        assert_eq!(aligned.offset(), &zone);
        Ok(())
    }

    #[test]
    fn test_ceil_before_epoch() -> Result<(), Error> {
        let time = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 50).unwrap();
        assert_eq!(
            ceil(time, TimeDelta::seconds(15))?,
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
        );
        Ok(())
    }

    #[test]
    fn test_ceil_properties() -> Result<(), Error> {
        let base = Utc.with_ymd_and_hms(2024, 3, 31, 1, 59, 59).unwrap();
        let resolutions = [
            TimeDelta::milliseconds(250),
            TimeDelta::seconds(7),
            TimeDelta::minutes(15),
            TimeDelta::hours(1),
            TimeDelta::days(1),
        ];
        for offset_millis in [0, 1, 999, 60_001, 3_599_999] {
            let time = base + TimeDelta::milliseconds(offset_millis);
            for resolution in resolutions {
                let aligned = ceil(time, resolution)?;
                assert!(aligned >= time);
                assert!(aligned - time < resolution);
                assert_eq!(ceil(aligned, resolution)?, aligned);
            }
        }
        Ok(())
    }

    #[test]
    fn test_ceil_non_positive_resolution() {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 7).unwrap();
        assert!(matches!(ceil(time, TimeDelta::zero()), Err(Error::NonPositiveResolution(_))));
        assert!(matches!(
            ceil(time, TimeDelta::seconds(-15)),
            Err(Error::NonPositiveResolution(_)),
        ));
    }
}
