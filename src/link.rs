use serde::{Deserialize, Serialize};
use std::fmt;

/// Dependency relationship kind. Closed set; both scheduling passes match on
/// it exhaustively, so a new kind cannot be silently half-handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::FinishToStart => "FS",
            LinkType::StartToStart => "SS",
            LinkType::FinishToFinish => "FF",
            LinkType::StartToFinish => "SF",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FS" => Some(LinkType::FinishToStart),
            "SS" => Some(LinkType::StartToStart),
            "FF" => Some(LinkType::FinishToFinish),
            "SF" => Some(LinkType::StartToFinish),
            _ => None,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed typed dependency between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: i32,
    pub predecessor_id: i32,
    pub successor_id: i32,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    /// Signed offset in working days; positive delays, negative overlaps.
    #[serde(default)]
    pub lag_days: i64,
}

impl Link {
    pub fn new(id: i32, predecessor_id: i32, successor_id: i32, link_type: LinkType) -> Self {
        Self {
            id,
            predecessor_id,
            successor_id,
            link_type,
            lag_days: 0,
        }
    }

    pub fn with_lag(mut self, lag_days: i64) -> Self {
        self.lag_days = lag_days;
        self
    }
}
