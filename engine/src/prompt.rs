//! Context assembly
//!
//! Builds the single instruction payload sent to the completion service. The
//! system turn is a named-slot template ([`SystemPrompt`]) carrying the
//! planner policy, the weather summary and its impact sentence, the extracted
//! intent and the retrieved documents. The user turn is the raw query.

use chrono::NaiveDate;
use std::fmt;

use crate::date::ResolvedDate;
use crate::intent::{Intent, Term};
use crate::llm::Message;
use crate::weather::{Condition, Precipitation, SkyCondition, WeatherSummary};

/// Fixed planner policy, one directive per line
const POLICY: &[&str] = &[
    "너는 도움되는 여행 플래너이다.",
    "도움이 되고 자세하게 답할 것. 답을 모르면 '잘 모르겠어요'라고 말할 것",
    "정확하고 구체적인 정보를 얻기 위해 제공된 맥락을 활용할 것",
    "기존 지식을 통합하여 답변의 깊이와 관련성을 높일 것",
    "출처를 밝힐 것",
    "답변은 반드시 한국어로 할 것",
];

/// Output formatting and recommendation rules that follow the grounding block
const RECOMMENDATION_RULES: &[&str] = &[
    "장소 이름은 반드시 **굵게(`**`)** 표기할 것. 예: **경복궁**, **남산타워**",
    "장소 이름 외에는 절대 **기호(`**`)**를 사용하지 말 것.",
    "강조나 다른 표현에서 `**`는 절대 사용하지 말 것.",
    "추천한 장소에서 갈 수 있는 여행 경로도 추천할 것.",
    "추천 시 사용자의 취향을 반영할 것.",
    "장소에 기반하여 근처에 갈 수 있는 취향에 맞는 관광지들을 묶어 여행 계획을 추천할 것.",
    "사용자의 취향을 반영하지 않을 때에는 유명한 장소 위주로 추천할 것.",
    "집중률이 높은 지역은 사람이 많고 유명한 관광지로 판별할 것",
    "집중률이 낮은 지역은 사람이 적고 덜 알려진 관광지로 판별할 것",
    "사용자의 취향을 반영할 때 사람이 많거나 적은 관광지에서 따라올 수 있는 상황을 고려할 것",
    "집중률이 높은 지역이라도 관광지의 특성을 반영하여 상황을 판단할 것",
    "아래 적힌 내용만 사용해서 검색할 것",
];

/// What the forecast means for the kind of places to recommend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherImpact {
    /// Mid-range forecast: only a rain probability is known
    RainChance { date: String, probability: u8 },
    /// Rain or snow expected, prefer indoor places
    Indoor,
    /// Cloudy, mix indoor and outdoor places
    Mixed,
    /// Clear, good for outdoor activities
    Outdoor,
}

impl WeatherImpact {
    /// Decision table over the summary, checked top to bottom:
    /// percentage precipitation, wet precipitation, cloudy sky, anything else.
    pub fn classify(weather: &WeatherSummary, date: &ResolvedDate) -> Self {
        match (&weather.precipitation, &weather.condition) {
            (Precipitation::Probability(pct), _) => WeatherImpact::RainChance {
                date: date.compact(),
                probability: *pct,
            },
            (Precipitation::Kind(kind), _) if kind.is_wet() => WeatherImpact::Indoor,
            (_, Condition::Sky(SkyCondition::MostlyCloudy | SkyCondition::Overcast)) => {
                WeatherImpact::Mixed
            }
            _ => WeatherImpact::Outdoor,
        }
    }
}

impl fmt::Display for WeatherImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherImpact::RainChance { date, probability } => {
                write!(f, "{}에는 강수 확률이 {}%입니다.", date, probability)
            }
            WeatherImpact::Indoor => f.write_str(
                "해당 날짜에는 비 또는 눈이 예상됩니다. 실내 관광지를 추천하겠습니다.",
            ),
            WeatherImpact::Mixed => {
                f.write_str("흐린 날씨입니다. 실내외 관광지를 적절히 섞어 추천하겠습니다.")
            }
            WeatherImpact::Outdoor => f.write_str("맑은 날씨입니다! 야외 활동하기 좋은 날이네요."),
        }
    }
}

/// System-role template. Every slot is rendered by [`fmt::Display`].
#[derive(Debug, Clone)]
pub struct SystemPrompt<'a> {
    pub today: NaiveDate,
    pub date: &'a ResolvedDate,
    pub weather: &'a WeatherSummary,
    pub impact: WeatherImpact,
    pub intent: &'a Intent,
    pub retrieved: &'a str,
}

fn term_or_empty<T: Term>(term: Option<T>) -> &'static str {
    term.map(|t| t.as_str()).unwrap_or("")
}

impl fmt::Display for SystemPrompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "지침:")?;
        writeln!(f, "- 오늘 날짜는 {}입니다.", self.today.format("%Y-%m-%d"))?;
        for line in POLICY {
            writeln!(f, "- {}", line)?;
        }
        writeln!(
            f,
            "- 사용자가 요청한 날짜({})의 날씨 정보를 활용하여 일정 추천할 것.",
            self.date
        )?;
        writeln!(f, "- 현재 날씨 정보: {}", self.weather)?;
        writeln!(f, "- {}", self.impact)?;
        writeln!(f, "- 검색된 여행 정보:")?;
        writeln!(f, "    {}", self.retrieved)?;
        for line in RECOMMENDATION_RULES {
            writeln!(f, "- {}", line)?;
        }
        writeln!(
            f,
            "주요내용: {}, {}, {}, {}",
            term_or_empty(self.intent.region),
            term_or_empty(self.intent.keyword),
            term_or_empty(self.intent.preference),
            term_or_empty(self.intent.proximity),
        )?;
        write!(f, "내용: {}", self.retrieved)
    }
}

/// Rendered system and user turns for one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system: String,
    pub user: String,
}

impl AssembledPrompt {
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system.clone()),
            Message::user(self.user.clone()),
        ]
    }
}

/// Combine the query with everything gathered for it
pub fn assemble(
    query: &str,
    intent: &Intent,
    weather: &WeatherSummary,
    retrieved: &str,
    date: &ResolvedDate,
    today: NaiveDate,
) -> AssembledPrompt {
    let system = SystemPrompt {
        today,
        date,
        weather,
        impact: WeatherImpact::classify(weather, date),
        intent,
        retrieved,
    };

    AssembledPrompt {
        system: system.to_string(),
        user: query.to_string(),
    }
}
