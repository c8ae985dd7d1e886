//! Query intent extraction
//!
//! Each category is a closed term set. Extraction is plain substring
//! containment against the raw query; the first term in declaration order
//! that occurs wins, so the order of the `ALL` tables is significant.

use serde::{Serialize, Serializer};
use std::fmt;

/// A closed, ordered set of terms matched against query text
pub trait Term: Copy + Sized + 'static {
    /// Every term, in match priority order
    const ALL: &'static [Self];

    /// The literal text matched against the query
    fn as_str(&self) -> &'static str;

    /// First term in declaration order that occurs in `text`
    fn find_in(text: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|term| text.contains(term.as_str()))
    }
}

macro_rules! term_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Term for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

term_set! {
    /// Seoul districts
    Region {
        Jongno => "종로구",
        Jung => "중구",
        Yongsan => "용산구",
        Seongdong => "성동구",
        Gwangjin => "광진구",
        Dongdaemun => "동대문구",
        Jungnang => "중랑구",
        Seongbuk => "성북구",
        Gangbuk => "강북구",
        Dobong => "도봉구",
        Nowon => "노원구",
        Eunpyeong => "은평구",
        Seodaemun => "서대문구",
        Mapo => "마포구",
        Yangcheon => "양천구",
        Gangseo => "강서구",
        Guro => "구로구",
        Geumcheon => "금천구",
        Yeongdeungpo => "영등포구",
        Dongjak => "동작구",
        Gwanak => "관악구",
        Seocho => "서초구",
        Gangnam => "강남구",
        Songpa => "송파구",
        Gangdong => "강동구",
    }
}

term_set! {
    /// Tourism content categories
    Keyword {
        CulturalFacility => "문화시설",
        Festival => "축제",
        Performance => "공연",
        Event => "행사",
        Attraction => "관광지",
        TravelCourse => "여행코스",
        Leisure => "레포츠",
        Lodging => "숙박",
        Shopping => "쇼핑",
        Restaurant => "음식점",
    }
}

term_set! {
    /// Crowd and popularity tags
    Preference {
        Crowded => "사람 많은",
        Uncrowded => "사람 적은",
        Famous => "유명한",
        Quiet => "조용한",
        Popular => "인기 많은",
    }
}

term_set! {
    /// Nearness words ("near", "around")
    Proximity {
        Near => "근처",
        Nearby => "인근",
        Around => "주변",
    }
}

/// Structured intent pulled out of a query. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub region: Option<Region>,
    pub keyword: Option<Keyword>,
    pub preference: Option<Preference>,
    pub proximity: Option<Proximity>,
}

impl Intent {
    pub fn extract(query: &str) -> Self {
        Self {
            region: Region::find_in(query),
            keyword: Keyword::find_in(query),
            preference: Preference::find_in(query),
            proximity: Proximity::find_in(query),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Extracts region, keyword, preference and proximity terms from `query`
pub fn extract(query: &str) -> Intent {
    Intent::extract(query)
}
