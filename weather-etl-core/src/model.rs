use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};

pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// CSV header, in column order. Spelling is kept as downstream consumers expect it.
pub const CSV_COLUMNS: [&str; 12] = [
    "City",
    "Description",
    "Temperature (F)",
    "Feels Like (F)",
    "Minimun Temp (F)",
    "Maximum Temp (F)",
    "Pressure",
    "Humidty",
    "Wind Speed",
    "Time of Record",
    "Sunrise (Local Time)",
    "Sunset (Local Time)",
];

/// One flattened observation, serialised as a single CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Temperature (F)")]
    pub temperature_f: f64,
    #[serde(rename = "Feels Like (F)")]
    pub feels_like_f: f64,
    #[serde(rename = "Minimun Temp (F)")]
    pub temp_min_f: f64,
    #[serde(rename = "Maximum Temp (F)")]
    pub temp_max_f: f64,
    #[serde(rename = "Pressure")]
    pub pressure: i64,
    #[serde(rename = "Humidty")]
    pub humidity_pct: u8,
    #[serde(rename = "Wind Speed")]
    pub wind_speed: f64,
    #[serde(rename = "Time of Record", serialize_with = "wall_clock")]
    pub observed_at: NaiveDateTime,
    #[serde(rename = "Sunrise (Local Time)", serialize_with = "wall_clock")]
    pub sunrise: NaiveDateTime,
    #[serde(rename = "Sunset (Local Time)", serialize_with = "wall_clock")]
    pub sunset: NaiveDateTime,
}

fn wall_clock<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(WALL_CLOCK_FORMAT))
}

// Subset of the OpenWeather "current weather" response. Unknown fields are ignored.

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherPayload {
    pub name: String,
    pub weather: Vec<OwWeather>,
    pub main: OwMain,
    pub wind: OwWind,
    pub dt: i64,
    pub timezone: i64,
    pub sys: OwSys,
}

#[derive(Debug, Deserialize)]
pub struct OwWeather {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: i64,
    pub humidity: u8,
}

#[derive(Debug, Deserialize)]
pub struct OwWind {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwSys {
    pub sunrise: i64,
    pub sunset: i64,
}
