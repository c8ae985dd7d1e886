//! Weather fusion
//!
//! Picks a forecast horizon for the requested date and normalizes whatever the
//! provider returns into a [`WeatherSummary`].
//!
//! Horizon selection is a fixed attempt plan keyed on how far ahead the date
//! is:
//!
//! | days ahead | attempts                      |
//! |------------|-------------------------------|
//! | `< 4`      | short-range                   |
//! | `>= 4`     | mid-range, then short-range   |
//!
//! A stage that cannot produce a record (missing field, non-2xx, malformed
//! body, no item for the date) yields to the next stage. When every stage
//! comes up empty the result is the uniform no-data summary. Weather never
//! fails the pipeline.
//!
//! Both sources use fixed locations: one forecast grid point for short-range
//! and one broad region code for mid-range. The `region` passed to
//! [`WeatherFusion::fetch`] is only logged.

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use sdk::errors::EngineError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use crate::config::WeatherConfig;
use crate::date::ResolvedDate;
use crate::secrets::SecretString;

pub mod mid_range;
pub mod short_range;

pub use mid_range::MidRangeSource;
pub use short_range::{latest_base_time, ShortRangeSource};

/// Sentinel for a field the provider did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel used for every field when no forecast could be found
pub const NO_DATA: &str = "데이터 없음";

/// Temperature text for mid-range forecasts, which carry no temperature
pub const MID_RANGE_TEMPERATURE: &str = "N/A (중기 예보는 기온 정보 없음)";

/// Rain probability above which a mid-range day is reported as rainy
pub const RAIN_PROBABILITY_THRESHOLD: u8 = 50;

/// Errors that make a forecast stage yield to the next one
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather service key is not configured")]
    MissingCredential,

    #[error("request failed: {0}")]
    Network(String),

    #[error("provider returned status {0}")]
    Upstream(u16),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("no forecast record: {0}")]
    NoRecord(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Temperature {
    /// Provider value, rendered with a `°C` suffix
    Celsius(String),
    /// Mid-range forecasts carry no temperature
    NotInMidRange,
    NotAvailable,
    NoData,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temperature::Celsius(value) => write!(f, "{}°C", value),
            Temperature::NotInMidRange => f.write_str(MID_RANGE_TEMPERATURE),
            Temperature::NotAvailable => f.write_str(NOT_AVAILABLE),
            Temperature::NoData => f.write_str(NO_DATA),
        }
    }
}

/// Short-range `PTY` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipitationType {
    None,
    Rain,
    RainSnow,
    Snow,
}

impl PrecipitationType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(Self::None),
            "1" => Some(Self::Rain),
            "2" => Some(Self::RainSnow),
            "3" => Some(Self::Snow),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "없음",
            Self::Rain => "비",
            Self::RainSnow => "비/눈",
            Self::Snow => "눈",
        }
    }

    /// Whether anything falls from the sky
    pub fn is_wet(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precipitation {
    /// Qualitative short-range type
    Kind(PrecipitationType),
    /// Mid-range rain probability in percent
    Probability(u8),
    NotAvailable,
    NoData,
}

impl fmt::Display for Precipitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precipitation::Kind(kind) => f.write_str(kind.label()),
            Precipitation::Probability(pct) => write!(f, "{}%", pct),
            Precipitation::NotAvailable => f.write_str(NOT_AVAILABLE),
            Precipitation::NoData => f.write_str(NO_DATA),
        }
    }
}

/// Short-range `SKY` codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyCondition {
    Clear,
    MostlyCloudy,
    Overcast,
}

impl SkyCondition {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(Self::Clear),
            "3" => Some(Self::MostlyCloudy),
            "4" => Some(Self::Overcast),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "맑음",
            Self::MostlyCloudy => "구름 많음",
            Self::Overcast => "흐림",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Sky(SkyCondition),
    /// Mid-range rain probability above the threshold
    RainExpected,
    NotAvailable,
    NoData,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Sky(sky) => f.write_str(sky.label()),
            Condition::RainExpected => f.write_str("비 예보 있음"),
            Condition::NotAvailable => f.write_str(NOT_AVAILABLE),
            Condition::NoData => f.write_str(NO_DATA),
        }
    }
}

macro_rules! serialize_as_display {
    ($($ty:ty),+) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }
        )+
    };
}

serialize_as_display!(Temperature, Precipitation, Condition);

/// Normalized forecast for one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherSummary {
    pub temperature: Temperature,
    pub precipitation: Precipitation,
    pub condition: Condition,
}

impl WeatherSummary {
    /// Uniform summary used when no source had a record for the date
    pub fn no_data() -> Self {
        Self {
            temperature: Temperature::NoData,
            precipitation: Precipitation::NoData,
            condition: Condition::NoData,
        }
    }

    pub fn is_no_data(&self) -> bool {
        *self == Self::no_data()
    }
}

impl fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "기온 {}, 강수 {}, 하늘 {}",
            self.temperature, self.precipitation, self.condition
        )
    }
}

/// Forecast horizons, in the order they may be attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    MidRange,
    ShortRange,
}

impl Horizon {
    /// First day covered by the mid-range forecast
    pub const MID_RANGE_MIN_DAYS: i64 = 4;

    /// Ordered attempt plan for a date `days_ahead` days from today
    pub fn plan(days_ahead: i64) -> &'static [Horizon] {
        if days_ahead >= Self::MID_RANGE_MIN_DAYS {
            &[Horizon::MidRange, Horizon::ShortRange]
        } else {
            &[Horizon::ShortRange]
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizon::MidRange => write!(f, "mid-range"),
            Horizon::ShortRange => write!(f, "short-range"),
        }
    }
}

/// Combines the short-range and mid-range sources behind one call
pub struct WeatherFusion {
    short_range: ShortRangeSource,
    mid_range: MidRangeSource,
    utc_offset: FixedOffset,
}

impl WeatherFusion {
    pub fn new(
        short_range: ShortRangeSource,
        mid_range: MidRangeSource,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            short_range,
            mid_range,
            utc_offset,
        }
    }

    /// Build both sources from the `[weather]` config section.
    ///
    /// A missing service key is not an error: every fetch then degrades to
    /// the no-data summary.
    pub fn from_config(
        config: &WeatherConfig,
        service_key: Option<SecretString>,
        utc_offset: FixedOffset,
    ) -> Result<Self, EngineError> {
        if service_key.is_none() {
            tracing::warn!("WEATHER_API_KEY is not set; forecasts will report no data");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let short_range = ShortRangeSource::new(
            client.clone(),
            config.short_range_url.clone(),
            config.nx,
            config.ny,
            service_key.clone(),
        );
        let mid_range = MidRangeSource::new(
            client,
            config.mid_range_url.clone(),
            config.mid_region_id.clone(),
            service_key,
        );

        Ok(Self::new(short_range, mid_range, utc_offset))
    }

    /// Forecast for `date`, never failing.
    ///
    /// `now` drives the provider issuance times and is converted to the
    /// provider's local time with the configured offset.
    pub async fn fetch(
        &self,
        region: &str,
        date: &ResolvedDate,
        now: DateTime<Utc>,
    ) -> WeatherSummary {
        let local_now = now.with_timezone(&self.utc_offset).naive_local();

        for horizon in Horizon::plan(date.days_ahead()) {
            let attempt = match horizon {
                Horizon::MidRange => self.mid_range.fetch(date, local_now).await,
                Horizon::ShortRange => self.short_range.fetch(date, local_now).await,
            };

            match attempt {
                Ok(summary) => {
                    tracing::info!(
                        "{} forecast for {} on {}: {}",
                        horizon,
                        region,
                        date,
                        summary
                    );
                    return summary;
                }
                Err(e) => {
                    tracing::warn!("No usable {} forecast for {}: {}", horizon, date, e);
                }
            }
        }

        WeatherSummary::no_data()
    }
}

/// Envelope shared by both forecast providers:
/// `{"response": {"body": {"items": {"item": [...]}}}}`
#[derive(Debug, Deserialize)]
struct ForecastEnvelope<T> {
    response: ForecastResponse<T>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse<T> {
    body: Option<ForecastBody<T>>,
}

#[derive(Debug, Deserialize)]
struct ForecastBody<T> {
    items: Option<ForecastItems<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ForecastItems<T> {
    #[serde(default)]
    item: Vec<T>,
}

impl<T> ForecastEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        self.response
            .body
            .and_then(|body| body.items)
            .map(|items| items.item)
            .unwrap_or_default()
    }
}

/// Accepts `"12"` as well as `12`; the providers are inconsistent about quoting.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
