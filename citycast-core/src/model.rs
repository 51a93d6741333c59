use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::icon::IconCategory;

/// A city resolved by the directory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub country_code: String,
    #[serde(default)]
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Inclusive bounds, in the location's local time, used to filter forecast series.
///
/// Nothing stops `start > end`; such a window simply matches no sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    pub const DEFAULT_SPAN_DAYS: u64 = 7;

    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whole calendar days: `first` at midnight through the last second of `last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
        Self {
            start: first.and_time(NaiveTime::default()),
            end: last.and_time(end_of_day),
        }
    }

    /// `[today, today + 7 days]`.
    pub fn default_from(today: NaiveDate) -> Self {
        let last = today
            .checked_add_days(Days::new(Self::DEFAULT_SPAN_DAYS))
            .unwrap_or(today);
        Self::from_dates(today, last)
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// Day-granular membership for daily series.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        !self.is_inverted() && self.start.date() <= date && date <= self.end.date()
    }
}

/// Which of the two forecast views to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Windowed fetch; chart and daily cards restricted to the window.
    CustomRange(DateWindow),
    /// Unwindowed fetch; first 24 hourly samples, every daily card.
    Next24h,
}

impl ViewMode {
    pub const CUSTOM_RANGE: &'static str = "custom-range";
    pub const NEXT_24H: &'static str = "next-24h";

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::CustomRange(_) => Self::CUSTOM_RANGE,
            ViewMode::Next24h => Self::NEXT_24H,
        }
    }

    pub fn window(&self) -> Option<&DateWindow> {
        match self {
            ViewMode::CustomRange(window) => Some(window),
            ViewMode::Next24h => None,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw forecast as returned by the forecast service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub current_weather: CurrentWeather,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
    #[serde(with = "local_time")]
    pub time: NaiveDateTime,
}

/// Parallel hourly arrays. The service writes `null` for samples it has no
/// value for, so every value series is optional per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(with = "local_time::seq")]
    pub time: Vec<NaiveDateTime>,
    pub temperature_2m: Vec<Option<f64>>,
    pub weathercode: Vec<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relativehumidity_2m: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windspeed_10m: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<NaiveDate>,
    pub weathercode: Vec<Option<i32>>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
}

/// Chart-ready temperature line: `labels[i]` belongs to `values[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartProjection {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartProjection {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCard {
    pub date: NaiveDate,
    pub icon: IconCategory,
    pub temp_max: f64,
    pub temp_min: f64,
}

/// Timestamps as the forecast service writes them: local time, no offset,
/// usually without seconds.
mod local_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%dT%H:%M";
    const FORMAT_SECS: &str = "%Y-%m-%dT%H:%M:%S";

    fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, FORMAT_SECS))
    }

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub mod seq {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S: Serializer>(ts: &[NaiveDateTime], s: S) -> Result<S::Ok, S::Error> {
            let mut seq = s.serialize_seq(Some(ts.len()))?;
            for t in ts {
                seq.serialize_element(&t.format(FORMAT).to_string())?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<NaiveDateTime>, D::Error> {
            let raw = Vec::<String>::deserialize(d)?;
            raw.iter()
                .map(|s| parse(s).map_err(D::Error::custom))
                .collect()
        }
    }
}
