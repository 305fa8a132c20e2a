mod aggregate;
pub mod ranking;
mod stats;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use aggregate::{NO_AGENT, Ratio, StatTotals, WinRate, league_points, most_used_agent};
pub use stats::{
    AgentCounters, AgentStat, MatchPlacement, MatchResult, MatchStat, correct_agent_stat,
    match_points, record_match,
};

/// Tier label shown for players that are not a member of any tier.
pub const UNASSIGNED_TIER: &str = "미배정";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "타격대")]
    Duelist,
    #[serde(rename = "척후대")]
    Initiator,
    #[serde(rename = "감시자")]
    Sentinel,
    #[serde(rename = "전략가")]
    Controller,
}

impl Position {
    /// Order in which position groups are listed in rankings.
    pub const RANKING_ORDER: [Position; 4] = [
        Position::Duelist,
        Position::Sentinel,
        Position::Controller,
        Position::Initiator,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Position::Duelist => "타격대",
            Position::Initiator => "척후대",
            Position::Sentinel => "감시자",
            Position::Controller => "전략가",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "타격대" => Ok(Position::Duelist),
            "척후대" => Ok(Position::Initiator),
            "감시자" => Ok(Position::Sentinel),
            "전략가" => Ok(Position::Controller),
            other => match other.to_ascii_lowercase().as_str() {
                "duelist" => Ok(Position::Duelist),
                "initiator" => Ok(Position::Initiator),
                "sentinel" => Ok(Position::Sentinel),
                "controller" => Ok(Position::Controller),
                _ => Err(format!("Unknown position: {}", s)),
            },
        }
    }
}
