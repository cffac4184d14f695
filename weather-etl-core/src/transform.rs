use chrono::{Local, NaiveDateTime, TimeZone};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    PipelineError,
    convert::kelvin_to_fahrenheit,
    model::{CurrentWeatherPayload, WeatherReading},
};

impl WeatherReading {
    /// Build a reading from a raw API payload, rendering timestamps in the
    /// timezone of the running process.
    pub fn from_payload(payload: &Value) -> Result<Self, PipelineError> {
        Self::from_payload_in(payload, &Local)
    }

    /// Same as [`WeatherReading::from_payload`] with an explicit rendering zone.
    ///
    /// The payload's `timezone` offset is added to each epoch value and the sum
    /// is then rendered in `tz`. The result is the observation site's wall
    /// clock only when `tz` is UTC; with any other zone the machine's offset is
    /// applied on top.
    pub fn from_payload_in<Tz: TimeZone>(payload: &Value, tz: &Tz) -> Result<Self, PipelineError> {
        let parsed: CurrentWeatherPayload = CurrentWeatherPayload::deserialize_from(payload)?;

        let description = parsed
            .weather
            .first()
            .map(|w| w.description.clone())
            .ok_or_else(|| PipelineError::MalformedPayload("`weather` array is empty".into()))?;

        let offset = parsed.timezone;

        Ok(WeatherReading {
            city: parsed.name,
            description,
            temperature_f: kelvin_to_fahrenheit(parsed.main.temp),
            feels_like_f: kelvin_to_fahrenheit(parsed.main.feels_like),
            temp_min_f: kelvin_to_fahrenheit(parsed.main.temp_min),
            temp_max_f: kelvin_to_fahrenheit(parsed.main.temp_max),
            pressure: parsed.main.pressure,
            humidity_pct: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            observed_at: shifted_wall_clock(parsed.dt, offset, tz)?,
            sunrise: shifted_wall_clock(parsed.sys.sunrise, offset, tz)?,
            sunset: shifted_wall_clock(parsed.sys.sunset, offset, tz)?,
        })
    }
}

impl CurrentWeatherPayload {
    fn deserialize_from(payload: &Value) -> Result<Self, PipelineError> {
        CurrentWeatherPayload::deserialize(payload)
            .map_err(|e| PipelineError::MalformedPayload(e.to_string()))
    }
}

fn shifted_wall_clock<Tz: TimeZone>(
    epoch: i64,
    offset_secs: i64,
    tz: &Tz,
) -> Result<NaiveDateTime, PipelineError> {
    let shifted = epoch.checked_add(offset_secs).ok_or_else(|| {
        PipelineError::MalformedPayload(format!("timestamp {epoch} + offset {offset_secs} overflows"))
    })?;

    tz.timestamp_opt(shifted, 0)
        .single()
        .map(|dt| dt.naive_local())
        .ok_or_else(|| PipelineError::MalformedPayload(format!("timestamp {shifted} is out of range")))
}
