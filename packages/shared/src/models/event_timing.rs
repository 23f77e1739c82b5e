use serde::{Deserialize, Serialize};

/// Timing presets for the supported memory-sport event formats.
/// Extensible by adding a variant and its timing row, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Speed,
    National,
    International,
    Hour,
}

/// Phase durations in seconds for one event format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTiming {
    pub countdown_secs: u32,
    pub memorization_secs: u32,
    pub recall_secs: u32,
}

impl EventType {
    /// Parses the wire name, falling back to `Speed` for anything unknown.
    pub fn parse_or_default(s: &str) -> EventType {
        match s {
            "national" => EventType::National,
            "international" => EventType::International,
            "hour" => EventType::Hour,
            _ => EventType::Speed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Speed => "speed",
            EventType::National => "national",
            EventType::International => "international",
            EventType::Hour => "hour",
        }
    }

    pub fn timing(&self) -> EventTiming {
        match self {
            EventType::Speed => EventTiming {
                countdown_secs: 5,
                memorization_secs: 300,
                recall_secs: 900,
            },
            EventType::National => EventTiming {
                countdown_secs: 5,
                memorization_secs: 900,
                recall_secs: 1800,
            },
            EventType::International => EventTiming {
                countdown_secs: 5,
                memorization_secs: 1800,
                recall_secs: 3600,
            },
            EventType::Hour => EventTiming {
                countdown_secs: 5,
                memorization_secs: 3600,
                recall_secs: 7200,
            },
        }
    }

    /// Number of digit pages generated for a match of this format.
    pub fn pages(&self) -> usize {
        match self {
            EventType::Speed => 1,
            EventType::National => 2,
            EventType::International => 3,
            EventType::Hour => 4,
        }
    }
}
