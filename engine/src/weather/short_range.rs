//! Short-range (village) forecast source
//!
//! Issued every 3 hours and valid for roughly the next 3 days. Each item is
//! one `(fcstDate, fcstTime, category, fcstValue)` record; only `TMP`, `PTY`
//! and `SKY` are used.

use chrono::{Duration, NaiveDateTime, Timelike};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{
    string_or_number, Condition, ForecastEnvelope, Precipitation, PrecipitationType,
    SkyCondition, Temperature, WeatherError, WeatherSummary,
};
use crate::date::ResolvedDate;
use crate::secrets::SecretString;

/// Hours (provider-local) at which a new short-range forecast is issued
pub const ISSUANCE_HOURS: [u32; 8] = [2, 5, 8, 11, 14, 17, 20, 23];

/// One forecast record
#[derive(Debug, Clone, Deserialize)]
pub struct ShortRangeItem {
    #[serde(rename = "fcstDate", deserialize_with = "string_or_number")]
    pub fcst_date: String,
    pub category: String,
    #[serde(rename = "fcstValue", deserialize_with = "string_or_number")]
    pub fcst_value: String,
}

/// Latest `(base_date, base_time)` the provider has issued at `local_now`.
///
/// The hour is snapped down to the nearest issuance hour. Before the first
/// issuance of the day (00:00–01:59) the previous day's 23:00 run is used.
pub fn latest_base_time(local_now: NaiveDateTime) -> (String, String) {
    let hour = local_now.hour();

    match ISSUANCE_HOURS.iter().rev().find(|h| **h <= hour) {
        Some(h) => (
            local_now.date().format("%Y%m%d").to_string(),
            format!("{:02}00", h),
        ),
        None => {
            let yesterday = local_now.date() - Duration::days(1);
            (yesterday.format("%Y%m%d").to_string(), "2300".to_string())
        }
    }
}

/// Builds a summary from the records for `date` (`YYYYMMDD`).
///
/// Later records for a category override earlier ones. A missing `PTY` reads
/// as no precipitation and a missing `SKY` as clear; unknown codes and a
/// missing `TMP` become the not-available sentinel. Returns `None` when no
/// record matches the date.
pub fn summarize(items: &[ShortRangeItem], date: &str) -> Option<WeatherSummary> {
    let by_category: HashMap<&str, &str> = items
        .iter()
        .filter(|item| item.fcst_date == date)
        .map(|item| (item.category.as_str(), item.fcst_value.as_str()))
        .collect();

    if by_category.is_empty() {
        return None;
    }

    let temperature = by_category
        .get("TMP")
        .map(|value| Temperature::Celsius(value.to_string()))
        .unwrap_or(Temperature::NotAvailable);

    let precipitation =
        PrecipitationType::from_code(by_category.get("PTY").copied().unwrap_or("0"))
            .map(Precipitation::Kind)
            .unwrap_or(Precipitation::NotAvailable);

    let condition = SkyCondition::from_code(by_category.get("SKY").copied().unwrap_or("1"))
        .map(Condition::Sky)
        .unwrap_or(Condition::NotAvailable);

    Some(WeatherSummary {
        temperature,
        precipitation,
        condition,
    })
}

/// Client for the village forecast endpoint at a fixed grid point
pub struct ShortRangeSource {
    client: Client,
    url: String,
    nx: u32,
    ny: u32,
    service_key: Option<SecretString>,
}

impl ShortRangeSource {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        nx: u32,
        ny: u32,
        service_key: Option<SecretString>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            nx,
            ny,
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

        let (base_date, base_time) = latest_base_time(local_now);
        let nx = self.nx.to_string();
        let ny = self.ny.to_string();

        tracing::debug!(
            "Short-range request base={} {} grid={},{}",
            base_date,
            base_time,
            nx,
            ny
        );

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("serviceKey", service_key.unsecure()),
                ("numOfRows", "1000"),
                ("pageNo", "1"),
                ("dataType", "JSON"),
                ("base_date", base_date.as_str()),
                ("base_time", base_time.as_str()),
                ("nx", nx.as_str()),
                ("ny", ny.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::Upstream(response.status().as_u16()));
        }

        let envelope: ForecastEnvelope<ShortRangeItem> = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.without_url().to_string()))?;

        let target = date.compact();
        summarize(&envelope.into_items(), &target)
            .ok_or_else(|| WeatherError::NoRecord(format!("no short-range items for {}", target)))
    }
}
