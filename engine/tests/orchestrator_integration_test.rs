//! End-to-end tests for the recommendation pipeline
//!
//! Completion service, retrieval index and weather provider are all mocked.

mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use common::*;
use sdk::errors::EngineError;
use tourcast_engine::config::offset_from_hours;
use tourcast_engine::intent::{Preference, Proximity, Region};
use tourcast_engine::llm::openai::OpenAIProvider;
use tourcast_engine::llm::CompletionOptions;
use tourcast_engine::orchestrator::RecommendationOrchestrator;
use tourcast_engine::retrieval::HttpRetrievalIndex;
use tourcast_engine::secrets::SecretString;

const QUERY: &str = "내일 강남구 근처 조용한 곳 추천해줘";

fn orchestrator(server: &MockServer, completion_timeout: Duration) -> RecommendationOrchestrator {
    let llm = OpenAIProvider::new(
        "openai",
        server.uri(),
        "gpt-4o-mini",
        SecretString::from("sk-test"),
    )
    .unwrap();
    let retrieval = HttpRetrievalIndex::new(server.uri(), Duration::from_secs(5)).unwrap();

    RecommendationOrchestrator::new(
        Arc::new(llm),
        Arc::new(retrieval),
        weather_fusion(&server.uri(), Some(SERVICE_KEY)),
        CompletionOptions::default(),
        completion_timeout,
        offset_from_hours(9),
    )
}

async fn mount_retrieval(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "선릉과 정릉은 강남구 삼성동에 있는 조선 왕릉이다."
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_short_range(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .and(query_param("base_time", "0800"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
            short_item("20250312", "TMP", "14"),
            short_item("20250312", "PTY", "0"),
            short_item("20250312", "SKY", "1"),
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(MID_RANGE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![])))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_tuesday_query_end_to_end() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;
    mount_short_range(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("gpt-4o-mini"))
        .and(body_string_contains("오늘 날짜는 2025-03-11입니다."))
        .and(body_string_contains("20250312"))
        .and(body_string_contains("기온 14°C, 강수 없음, 하늘 맑음"))
        .and(body_string_contains("야외 활동하기 좋은 날이네요."))
        .and(body_string_contains("주요내용: 강남구, , 조용한, 근처"))
        .and(body_string_contains("선릉과 정릉은 강남구 삼성동에 있는 조선 왕릉이다."))
        .and(body_string_contains(QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(
            "**선정릉**에서 조용한 산책을 즐겨 보세요.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let rec = orchestrator(&server, Duration::from_secs(10))
        .handle_at(QUERY, tuesday_morning())
        .await
        .unwrap();

    assert_eq!(rec.date, "20250312");
    assert_eq!(rec.days_ahead, 1);
    assert_eq!(rec.intent.region, Some(Region::Gangnam));
    assert_eq!(rec.intent.preference, Some(Preference::Quiet));
    assert_eq!(rec.intent.proximity, Some(Proximity::Near));
    assert_eq!(rec.intent.keyword, None);
    assert_eq!(rec.weather.temperature.to_string(), "14°C");
    assert_eq!(rec.answer, "**선정릉**에서 조용한 산책을 즐겨 보세요.");

    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["intent"]["region"], "강남구");
    assert_eq!(json["weather"]["condition"], "맑음");
}

#[tokio::test]
async fn test_retrieval_failure_skips_completion() {
    let server = MockServer::start().await;
    mount_short_range(&server).await;

    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let err = orchestrator(&server, Duration::from_secs(10))
        .handle_at(QUERY, tuesday_morning())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Retrieval(_)));
}

#[tokio::test]
async fn test_completion_error_is_surfaced() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;
    mount_short_range(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("invalid key sk-abcdefghijklmnopqrstuvwxyz"),
        )
        .mount(&server)
        .await;

    let err = orchestrator(&server, Duration::from_secs(10))
        .handle_at(QUERY, tuesday_morning())
        .await
        .unwrap_err();

    match err {
        EngineError::LLMProvider(message) => {
            assert!(message.contains("Authentication failed"));
            assert!(!message.contains("sk-abcdefghijklmnopqrstuvwxyz"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_completion_times_out() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;
    mount_short_range(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = orchestrator(&server, Duration::from_secs(1))
        .handle_at(QUERY, tuesday_morning())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::LLMTimeout(1)));
}

#[tokio::test]
async fn test_weather_outage_does_not_fail_the_request() {
    let server = MockServer::start().await;
    mount_retrieval(&server).await;

    Mock::given(method("GET"))
        .and(path(SHORT_RANGE_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("데이터 없음"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("실내 위주로 추천합니다.")))
        .expect(1)
        .mount(&server)
        .await;

    let rec = orchestrator(&server, Duration::from_secs(10))
        .handle_at(QUERY, tuesday_morning())
        .await
        .unwrap();

    assert!(rec.weather.is_no_data());
    assert!(!rec.answer.is_empty());
}
