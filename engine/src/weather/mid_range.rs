//! Mid-range land forecast source
//!
//! Covers days 4 to 10 ahead for a broad region. Rain probability per day is
//! published under dynamically named fields (`rnSt4Am`, `rnSt5Am`, ...); there
//! is no temperature.

use chrono::NaiveDateTime;
use reqwest::Client;
use serde_json::{Map, Value};

use super::{
    Condition, ForecastEnvelope, Precipitation, SkyCondition, Temperature, WeatherError,
    WeatherSummary, RAIN_PROBABILITY_THRESHOLD,
};
use crate::date::ResolvedDate;
use crate::secrets::SecretString;

/// Field carrying the morning rain probability `days_ahead` days out
pub fn rain_probability_field(days_ahead: i64) -> String {
    format!("rnSt{}Am", days_ahead)
}

/// Reads a rain probability given as a number or a numeric string
fn parse_probability(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Builds a summary from the first forecast item.
///
/// Returns `None` when the field for `days_ahead` is missing or not numeric.
pub fn summarize(item: &Map<String, Value>, days_ahead: i64) -> Option<WeatherSummary> {
    let probability = item
        .get(&rain_probability_field(days_ahead))
        .and_then(parse_probability)?;

    let condition = if probability > RAIN_PROBABILITY_THRESHOLD {
        Condition::RainExpected
    } else {
        Condition::Sky(SkyCondition::Clear)
    };

    Some(WeatherSummary {
        temperature: Temperature::NotInMidRange,
        precipitation: Precipitation::Probability(probability),
        condition,
    })
}

/// Client for the mid-range land forecast of one broad region
pub struct MidRangeSource {
    client: Client,
    url: String,
    region_id: String,
    service_key: Option<SecretString>,
}

impl MidRangeSource {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        region_id: impl Into<String>,
        service_key: Option<SecretString>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            region_id: region_id.into(),
            service_key,
        }
    }

    pub async fn fetch(
        &self,
        date: &ResolvedDate,
        local_now: NaiveDateTime,
    ) -> Result<WeatherSummary, WeatherError> {
        let service_key = self
            .service_key
            .as_ref()
            .ok_or(WeatherError::MissingCredential)?;

        // Morning issuance of the current day
        let tm_fc = format!("{}0600", local_now.date().format("%Y%m%d"));

        tracing::debug!(
            "Mid-range request tmFc={} regId={} days_ahead={}",
            tm_fc,
            self.region_id,
            date.days_ahead()
        );

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("serviceKey", service_key.unsecure()),
                ("numOfRows", "10"),
                ("pageNo", "1"),
                ("dataType", "JSON"),
                ("regId", self.region_id.as_str()),
                ("tmFc", tm_fc.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::Upstream(response.status().as_u16()));
        }

        let envelope: ForecastEnvelope<Map<String, Value>> = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.without_url().to_string()))?;

        let items = envelope.into_items();
        let first = items
            .first()
            .ok_or_else(|| WeatherError::NoRecord("mid-range response has no items".into()))?;

        summarize(first, date.days_ahead()).ok_or_else(|| {
            WeatherError::NoRecord(format!(
                "no usable {} field",
                rain_probability_field(date.days_ahead())
            ))
        })
    }
}
