//! Identifier and enumeration types shared across the engine.
//!
//! Every enumeration keeps its stable identifier (used in comparisons and
//! persisted records) separate from its display label (used only in
//! user-facing text). Records store the stable key; prose uses the label.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Opaque identifier for any entity (character or player) in the world.
///
/// Entity ids come from definition records and are treated as opaque
/// strings; the engine never parses or derives meaning from them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Wrap a raw id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque identifier for a location within a world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

impl LocationId {
    /// Wrap a raw id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque identifier for a world definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    /// Wrap a raw id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Emotions
// ---------------------------------------------------------------------------

/// The fixed set of named emotions every character tracks.
///
/// Each emotion holds a scalar intensity in [0.0, 1.0], mutated only via
/// [`crate::Character::update_emotion`]'s bounded delta rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionKind {
    /// Joy / delight.
    Joy,
    /// Sadness / grief.
    Sadness,
    /// Anger / irritation.
    Anger,
    /// Fear / dread.
    Fear,
    /// Disgust / aversion.
    Disgust,
    /// Surprise / astonishment.
    Surprise,
    /// Trust / confidence in another.
    Trust,
    /// Anticipation / expectation.
    Anticipation,
}

impl EmotionKind {
    /// All emotions in stable (record) order.
    pub const ALL: [Self; 8] = [
        Self::Joy,
        Self::Sadness,
        Self::Anger,
        Self::Fear,
        Self::Disgust,
        Self::Surprise,
        Self::Trust,
        Self::Anticipation,
    ];

    /// Stable identifier used in records and backend payloads.
    #[must_use]
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Joy => "JOY",
            Self::Sadness => "SADNESS",
            Self::Anger => "ANGER",
            Self::Fear => "FEAR",
            Self::Disgust => "DISGUST",
            Self::Surprise => "SURPRISE",
            Self::Trust => "TRUST",
            Self::Anticipation => "ANTICIPATION",
        }
    }

    /// Human-readable display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Fear => "fear",
            Self::Disgust => "disgust",
            Self::Surprise => "surprise",
            Self::Trust => "trust",
            Self::Anticipation => "anticipation",
        }
    }

    /// Look up an emotion by its stable key. Unknown keys return `None`;
    /// callers decide whether that is a warning (record load) or a silent
    /// drop (backend deltas).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_key() == key)
    }
}

impl fmt::Display for EmotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Current weather over the whole world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weather {
    /// Clear skies — the default when a record carries no usable value.
    #[default]
    Sunny,
    /// Overcast.
    Cloudy,
    /// Rainfall.
    Rainy,
    /// Thunderstorm.
    Stormy,
    /// Thick fog.
    Foggy,
    /// Snowfall.
    Snowy,
}

impl Weather {
    /// Stable identifier used in records.
    #[must_use]
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Sunny => "SUNNY",
            Self::Cloudy => "CLOUDY",
            Self::Rainy => "RAINY",
            Self::Stormy => "STORMY",
            Self::Foggy => "FOGGY",
            Self::Snowy => "SNOWY",
        }
    }

    /// Human-readable display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
            Self::Foggy => "foggy",
            Self::Snowy => "snowy",
        }
    }

    /// Look up a weather by its stable key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        [
            Self::Sunny,
            Self::Cloudy,
            Self::Rainy,
            Self::Stormy,
            Self::Foggy,
            Self::Snowy,
        ]
        .into_iter()
        .find(|w| w.as_key() == key)
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// Discrete time-of-day bucket derived from the world clock.
///
/// Seven ordered bands cover the 24-hour day with fixed boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOfDay {
    /// 05:00–07:00.
    Dawn,
    /// 07:00–10:00.
    Morning,
    /// 10:00–14:00.
    Noon,
    /// 14:00–17:00.
    Afternoon,
    /// 17:00–20:00.
    Evening,
    /// 20:00–23:00.
    Night,
    /// 23:00–05:00.
    Midnight,
}

impl TimeOfDay {
    /// Bucket a clock hour (0–23) into its band.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=6 => Self::Dawn,
            7..=9 => Self::Morning,
            10..=13 => Self::Noon,
            14..=16 => Self::Afternoon,
            17..=19 => Self::Evening,
            20..=22 => Self::Night,
            _ => Self::Midnight,
        }
    }

    /// Human-readable display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dawn => "dawn",
            Self::Morning => "morning",
            Self::Noon => "midday",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Midnight => "the dead of night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_expose_their_raw_string() {
        assert_eq!(EntityId::new("mira").as_str(), "mira");
        assert_eq!(LocationId::new("inn").as_str(), "inn");
        assert_eq!(WorldId::new("vale").as_str(), "vale");
    }

    #[test]
    fn emotion_key_round_trip() {
        for emotion in EmotionKind::ALL {
            assert_eq!(EmotionKind::from_key(emotion.as_key()), Some(emotion));
        }
        assert_eq!(EmotionKind::from_key("MELANCHOLY"), None);
    }

    #[test]
    fn weather_falls_back_to_none_on_unknown_key() {
        assert_eq!(Weather::from_key("RAINY"), Some(Weather::Rainy));
        assert_eq!(Weather::from_key("HAIL"), None);
        assert_eq!(Weather::default(), Weather::Sunny);
    }

    #[test]
    fn time_of_day_band_boundaries() {
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_hour(7), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(10), TimeOfDay::Noon);
        assert_eq!(TimeOfDay::from_hour(13), TimeOfDay::Noon);
        assert_eq!(TimeOfDay::from_hour(14), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(22), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Midnight);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Midnight);
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Midnight);
    }
}
