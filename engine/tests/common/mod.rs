//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tourcast_engine::config::offset_from_hours;
use tourcast_engine::secrets::SecretString;
use tourcast_engine::weather::{MidRangeSource, ShortRangeSource, WeatherFusion};

pub const SHORT_RANGE_PATH: &str = "/short";
pub const MID_RANGE_PATH: &str = "/mid";
pub const SERVICE_KEY: &str = "weather-test-key";

/// 2025-03-11 (Tuesday) 10:00 in Seoul
pub fn tuesday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 11, 1, 0, 0).unwrap()
}

/// Weather fusion pointed at a mock server
pub fn weather_fusion(base: &str, key: Option<&str>) -> WeatherFusion {
    let client = reqwest::Client::new();
    let key = key.map(SecretString::from);

    WeatherFusion::new(
        ShortRangeSource::new(
            client.clone(),
            format!("{}{}", base, SHORT_RANGE_PATH),
            60,
            127,
            key.clone(),
        ),
        MidRangeSource::new(client, format!("{}{}", base, MID_RANGE_PATH), "11B00000", key),
        offset_from_hours(9),
    )
}

/// Provider envelope around a list of items
pub fn envelope(items: Vec<Value>) -> Value {
    json!({
        "response": {
            "header": {"resultCode": "00", "resultMsg": "NORMAL_SERVICE"},
            "body": {
                "dataType": "JSON",
                "items": {"item": items},
                "pageNo": 1,
                "numOfRows": 1000,
                "totalCount": 0
            }
        }
    })
}

/// One short-range record
pub fn short_item(fcst_date: &str, category: &str, value: &str) -> Value {
    json!({
        "baseDate": "20250311",
        "baseTime": "0800",
        "category": category,
        "fcstDate": fcst_date,
        "fcstTime": "1200",
        "fcstValue": value,
        "nx": 60,
        "ny": 127
    })
}

/// OpenAI-style chat completion body
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}
