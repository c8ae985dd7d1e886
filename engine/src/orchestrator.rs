//! Recommendation orchestrator
//!
//! Runs one query through the pipeline:
//!
//! 1. Reject blank queries
//! 2. Resolve the date and extract intent (pure, synchronous)
//! 3. Fetch weather and query the retrieval index concurrently
//! 4. Assemble the prompt
//! 5. Call the completion service under a timeout
//!
//! Weather problems degrade to sentinel values. A retrieval failure, a
//! completion failure or a completion timeout fails the whole request; no
//! partial answer is returned and nothing is retried.

use chrono::{DateTime, FixedOffset, Utc};
use sdk::errors::EngineError;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::date::{self, ResolvedDate};
use crate::intent::{Intent, Term};
use crate::llm::{build_provider, CompletionOptions, LLMProvider};
use crate::prompt;
use crate::retrieval::{HttpRetrievalIndex, RetrievalIndex};
use crate::secrets::{SecretStore, WEATHER_API_KEY};
use crate::weather::{WeatherFusion, WeatherSummary};

/// Region name handed to the weather layer when the query names none
pub const DEFAULT_REGION: &str = "서울";

/// Result of one recommendation request
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Generated answer text
    pub answer: String,

    /// Resolved date, `YYYYMMDD`
    pub date: String,

    /// Calendar days between today and `date`
    pub days_ahead: i64,

    pub intent: Intent,
    pub weather: WeatherSummary,
}

/// Top-level coordinator, built once and shared across requests
pub struct RecommendationOrchestrator {
    llm: Arc<dyn LLMProvider>,
    retrieval: Arc<dyn RetrievalIndex>,
    weather: WeatherFusion,
    options: CompletionOptions,
    completion_timeout: Duration,
    utc_offset: FixedOffset,
}

impl RecommendationOrchestrator {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        retrieval: Arc<dyn RetrievalIndex>,
        weather: WeatherFusion,
        options: CompletionOptions,
        completion_timeout: Duration,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            llm,
            retrieval,
            weather,
            options,
            completion_timeout,
            utc_offset,
        }
    }

    /// Wire up every collaborator from configuration and credentials
    pub fn from_config(config: &Config, secrets: &SecretStore) -> Result<Self, EngineError> {
        let llm = build_provider(&config.llm, secrets)?;
        let retrieval = Arc::new(HttpRetrievalIndex::from_config(&config.retrieval)?);
        let weather = WeatherFusion::from_config(
            &config.weather,
            secrets.optional(WEATHER_API_KEY),
            config.utc_offset(),
        )?;

        Ok(Self::new(
            llm,
            retrieval,
            weather,
            CompletionOptions::from_config(&config.llm),
            config.llm_timeout(),
            config.utc_offset(),
        ))
    }

    /// Handle a query against the current wall clock
    pub async fn handle(&self, query: &str) -> Result<Recommendation, EngineError> {
        self.handle_at(query, Utc::now()).await
    }

    /// Handle a query as if it were asked at `now`
    pub async fn handle_at(
        &self,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<Recommendation, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidInput("query is empty".to_string()));
        }

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("recommend", %request_id);

        self.run(query, now).instrument(span).await
    }

    async fn run(&self, query: &str, now: DateTime<Utc>) -> Result<Recommendation, EngineError> {
        let today = now.with_timezone(&self.utc_offset).date_naive();
        let date = date::resolve_or_today(query, today);
        let intent = Intent::extract(query);

        info!(
            "Resolved date {} ({} days ahead), intent {:?}",
            date,
            date.days_ahead(),
            intent
        );

        let region = intent.region.map(|r| r.as_str()).unwrap_or(DEFAULT_REGION);

        let (weather, retrieved) = tokio::join!(
            self.weather.fetch(region, &date, now),
            self.retrieval.query(query)
        );

        let retrieved = retrieved.map_err(|e| {
            error!("Retrieval failed: {}", e);
            EngineError::from(e)
        })?;

        debug!("Weather: {}", weather);

        let assembled = prompt::assemble(query, &intent, &weather, &retrieved, &date, today);
        let answer = self.complete(&assembled).await?;

        Ok(Recommendation {
            answer,
            date: date.to_string(),
            days_ahead: date.days_ahead(),
            intent,
            weather,
        })
    }

    async fn complete(&self, assembled: &prompt::AssembledPrompt) -> Result<String, EngineError> {
        let messages = assembled.messages();

        match timeout(
            self.completion_timeout,
            self.llm.complete(&messages, &self.options),
        )
        .await
        {
            Ok(Ok(answer)) => {
                info!("{} answered with {} chars", self.llm.name(), answer.len());
                Ok(answer)
            }
            Ok(Err(e)) => {
                error!("Completion failed: {}", e);
                Err(e.into())
            }
            Err(_) => {
                error!(
                    "Completion timed out after {}s",
                    self.completion_timeout.as_secs()
                );
                Err(EngineError::LLMTimeout(self.completion_timeout.as_secs()))
            }
        }
    }

    /// Resolve the date and fetch its forecast without retrieval or completion
    pub async fn forecast_at(
        weather: &WeatherFusion,
        query: &str,
        now: DateTime<Utc>,
        utc_offset: FixedOffset,
    ) -> (ResolvedDate, WeatherSummary) {
        let today = now.with_timezone(&utc_offset).date_naive();
        let date = date::resolve_or_today(query, today);
        let region = Intent::extract(query)
            .region
            .map(|r| r.as_str())
            .unwrap_or(DEFAULT_REGION);

        let summary = weather.fetch(region, &date, now).await;
        (date, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMError, Message};
    use crate::retrieval::RetrievalError;
    use crate::weather::{MidRangeSource, ShortRangeSource};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct EchoLLM {
        seen: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl LLMProvider for EchoLLM {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> crate::llm::Result<String> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok("**선정릉** 산책을 추천합니다.".to_string())
        }
    }

    struct FixedIndex(Result<String, ()>);

    #[async_trait]
    impl RetrievalIndex for FixedIndex {
        async fn query(&self, _text: &str) -> Result<String, RetrievalError> {
            self.0
                .clone()
                .map_err(|_| RetrievalError::Unavailable("offline".to_string()))
        }
    }

    fn offline_weather() -> WeatherFusion {
        let client = reqwest::Client::new();
        WeatherFusion::new(
            ShortRangeSource::new(client.clone(), "http://127.0.0.1:9", 60, 127, None),
            MidRangeSource::new(client, "http://127.0.0.1:9", "11B00000", None),
            crate::config::offset_from_hours(9),
        )
    }

    fn orchestrator(llm: Arc<dyn LLMProvider>, index: FixedIndex) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(
            llm,
            Arc::new(index),
            offline_weather(),
            CompletionOptions::default(),
            Duration::from_secs(5),
            crate::config::offset_from_hours(9),
        )
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let llm = Arc::new(EchoLLM {
            seen: Mutex::new(Vec::new()),
        });
        let orch = orchestrator(llm.clone(), FixedIndex(Ok(String::new())));

        let err = orch.handle("   ").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(llm.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_without_weather_key() {
        let llm = Arc::new(EchoLLM {
            seen: Mutex::new(Vec::new()),
        });
        let orch = orchestrator(llm.clone(), FixedIndex(Ok("선정릉 소개".to_string())));

        // 2025-03-11 10:00 KST
        let now = Utc.with_ymd_and_hms(2025, 3, 11, 1, 0, 0).unwrap();
        let rec = orch.handle_at("모레 종로구 축제", now).await.unwrap();

        assert_eq!(rec.date, "20250313");
        assert_eq!(rec.days_ahead, 2);
        assert!(rec.weather.is_no_data());
        assert!(!rec.answer.is_empty());

        let seen = llm.seen.lock().unwrap();
        assert!(seen[0].content.contains("선정릉 소개"));
        assert_eq!(seen[1].content, "모레 종로구 축제");
    }

    #[tokio::test]
    async fn test_user_turn_keeps_query_verbatim() {
        let llm = Arc::new(EchoLLM {
            seen: Mutex::new(Vec::new()),
        });
        let orch = orchestrator(llm.clone(), FixedIndex(Ok("선정릉 소개".to_string())));

        let now = Utc.with_ymd_and_hms(2025, 3, 11, 1, 0, 0).unwrap();
        orch.handle_at("  내일 강남구 산책\n", now).await.unwrap();

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen[1].content, "  내일 강남구 산책\n");
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_fatal() {
        let llm = Arc::new(EchoLLM {
            seen: Mutex::new(Vec::new()),
        });
        let orch = orchestrator(llm.clone(), FixedIndex(Err(())));

        let err = orch.handle("내일 강남구").await.unwrap_err();
        assert!(matches!(err, EngineError::Retrieval(_)));
        assert!(llm.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forecast_today_uses_provider_offset() {
        // 2025-03-10 16:00 UTC is already 2025-03-11 in KST
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 16, 0, 0).unwrap();
        let (date, summary) = RecommendationOrchestrator::forecast_at(
            &offline_weather(),
            "강남구",
            now,
            crate::config::offset_from_hours(9),
        )
        .await;

        assert_eq!(date.to_string(), "20250311");
        assert!(summary.is_no_data());
    }

    struct FailingLLM;

    #[async_trait]
    impl LLMProvider for FailingLLM {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _options: &CompletionOptions,
        ) -> crate::llm::Result<String> {
            Err(LLMError::RateLimitExceeded)
        }
    }

    #[tokio::test]
    async fn test_completion_failure_is_fatal() {
        let orch = orchestrator(Arc::new(FailingLLM), FixedIndex(Ok("x".to_string())));

        let err = orch.handle("내일").await.unwrap_err();
        assert!(matches!(err, EngineError::LLMProvider(_)));
    }
}
