//! Integration tests for forecast horizon selection
//!
//! Both providers are served by one mock server on separate paths.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use common::*;
use tourcast_engine::date::ResolvedDate;
use tourcast_engine::weather::{Condition, Precipitation, Temperature, NO_DATA};

fn resolved(y: i32, m: u32, d: u32) -> ResolvedDate {
    ResolvedDate::new(
        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
    )
}

#[tokio::test]
async fn test_near_date_uses_short_range_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .and(query_param("serviceKey", SERVICE_KEY))
        .and(query_param("base_date", "20250311"))
        .and(query_param("base_time", "0800"))
        .and(query_param("nx", "60"))
        .and(query_param("ny", "127"))
        .and(query_param("dataType", "JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
            short_item("20250313", "TMP", "12"),
            short_item("20250313", "PTY", "0"),
            short_item("20250313", "SKY", "3"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(MID_RANGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let fusion = weather_fusion(&server.uri(), Some(SERVICE_KEY));
    let date = resolved(2025, 3, 13);
    assert_eq!(date.days_ahead(), 2);

    let summary = fusion.fetch("강남구", &date, tuesday_morning()).await;

    assert_eq!(summary.temperature, Temperature::Celsius("12".to_string()));
    assert_eq!(summary.precipitation.to_string(), "없음");
    assert_eq!(summary.condition.to_string(), "구름 많음");
}

#[tokio::test]
async fn test_far_date_prefers_mid_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MID_RANGE_PATH))
        .and(query_param("regId", "11B00000"))
        .and(query_param("tmFc", "202503110600"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(vec![serde_json::json!({
                "regId": "11B00000",
                "rnSt5Am": 70,
                "rnSt5Pm": 40,
                "wf5Am": "구름많고 비"
            })])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let fusion = weather_fusion(&server.uri(), Some(SERVICE_KEY));
    let summary = fusion
        .fetch("서울", &resolved(2025, 3, 16), tuesday_morning())
        .await;

    assert_eq!(summary.temperature, Temperature::NotInMidRange);
    assert_eq!(summary.precipitation, Precipitation::Probability(70));
    assert_eq!(summary.condition, Condition::RainExpected);
    assert_eq!(
        summary.to_string(),
        "기온 N/A (중기 예보는 기온 정보 없음), 강수 70%, 하늘 비 예보 있음"
    );
}

#[tokio::test]
async fn test_mid_range_without_field_falls_back_to_short_range() {
    let server = MockServer::start().await;

    // Only day 5 is published; day 4 is requested
    Mock::given(method("GET"))
        .and(path(MID_RANGE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(vec![serde_json::json!({"rnSt5Am": 30})])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
            short_item("20250315", "TMP", "9"),
            short_item("20250315", "PTY", "1"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let fusion = weather_fusion(&server.uri(), Some(SERVICE_KEY));
    let date = resolved(2025, 3, 15);
    assert_eq!(date.days_ahead(), 4);

    let summary = fusion.fetch("서울", &date, tuesday_morning()).await;

    assert_eq!(summary.temperature.to_string(), "9°C");
    assert_eq!(summary.precipitation.to_string(), "비");
    assert_eq!(summary.condition.to_string(), "맑음");
}

#[tokio::test]
async fn test_every_stage_empty_yields_no_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(MID_RANGE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<OpenAPI_ServiceResponse>"))
        .mount(&server)
        .await;

    let fusion = weather_fusion(&server.uri(), Some(SERVICE_KEY));
    let summary = fusion
        .fetch("서울", &resolved(2025, 3, 15), tuesday_morning())
        .await;

    assert!(summary.is_no_data());
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["temperature"], NO_DATA);
}

#[tokio::test]
async fn test_missing_service_key_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let fusion = weather_fusion(&server.uri(), None);
    let summary = fusion
        .fetch("서울", &resolved(2025, 3, 16), tuesday_morning())
        .await;

    assert!(summary.is_no_data());
}

#[tokio::test]
async fn test_after_midnight_uses_previous_day_issuance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .and(query_param("base_date", "20250310"))
        .and(query_param("base_time", "2300"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(vec![short_item("20250311", "TMP", "-1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    // 2025-03-11 00:30 in Seoul
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap();
    let fusion = weather_fusion(&server.uri(), Some(SERVICE_KEY));
    let summary = fusion.fetch("서울", &resolved(2025, 3, 11), now).await;

    assert_eq!(summary.temperature.to_string(), "-1°C");
}
