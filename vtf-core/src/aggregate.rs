use std::{cmp::Ordering, fmt};

use serde::{Serialize, Serializer};

use crate::stats::AgentStat;

/// Most-used agent label for players without any recorded match.
pub const NO_AGENT: &str = "없음";

/// A performance ratio whose denominator (deaths) may be zero.
/// `Perfect` ranks above every finite value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ratio {
    Perfect,
    Value(f64),
}

impl Ratio {
    pub fn of(numerator: u32, denominator: u32) -> Self {
        if denominator == 0 {
            Ratio::Perfect
        } else {
            Ratio::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Perfect => None,
            Ratio::Value(v) => Some(*v),
        }
    }

    pub fn total_cmp(&self, other: &Ratio) -> Ordering {
        match (self, other) {
            (Ratio::Perfect, Ratio::Perfect) => Ordering::Equal,
            (Ratio::Perfect, Ratio::Value(_)) => Ordering::Greater,
            (Ratio::Value(_), Ratio::Perfect) => Ordering::Less,
            (Ratio::Value(a), Ratio::Value(b)) => a.total_cmp(b),
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Perfect => f.write_str("Perfect"),
            Ratio::Value(v) => write!(f, "{:.2}", v),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WinRate {
    pub wins: u32,
    pub losses: u32,
}

impl WinRate {
    pub fn new(wins: u32, losses: u32) -> Self {
        Self { wins, losses }
    }

    pub fn games(&self) -> u32 {
        self.wins.saturating_add(self.losses)
    }

    /// Percentage of won games, `None` if nothing was played.
    pub fn percent(&self) -> Option<f64> {
        match self.games() {
            0 => None,
            games => Some(self.wins as f64 / games as f64 * 100.0),
        }
    }
}

impl fmt::Display for WinRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            None => f.write_str("0%"),
            Some(p) => write!(f, "{:.1}%", p),
        }
    }
}

impl Serialize for WinRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counters summed over every agent of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct StatTotals {
    pub play_count: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub wins: u32,
    pub losses: u32,
}

impl StatTotals {
    pub fn of<'a>(stats: impl IntoIterator<Item = &'a AgentStat>) -> Self {
        stats.into_iter().fold(Self::default(), |acc, s| Self {
            play_count: acc.play_count.saturating_add(s.play_count),
            kills: acc.kills.saturating_add(s.kills),
            deaths: acc.deaths.saturating_add(s.deaths),
            assists: acc.assists.saturating_add(s.assists),
            wins: acc.wins.saturating_add(s.wins),
            losses: acc.losses.saturating_add(s.losses),
        })
    }

    pub fn kda(&self) -> Ratio {
        Ratio::of(self.kills.saturating_add(self.assists), self.deaths)
    }

    pub fn win_rate(&self) -> WinRate {
        WinRate::new(self.wins, self.losses)
    }

    pub fn games(&self) -> u32 {
        self.win_rate().games()
    }
}

/// The agent with the highest play count. Ties go to the better K/D and then
/// to the alphabetically first agent name, so the answer does not depend on
/// the order of `stats`.
pub fn most_used_agent(stats: &[AgentStat]) -> Option<&AgentStat> {
    stats.iter().max_by(|a, b| {
        a.play_count
            .cmp(&b.play_count)
            .then_with(|| a.kill_death().total_cmp(&b.kill_death()))
            .then_with(|| b.agent_name.cmp(&a.agent_name))
    })
}

/// Sum of the points of every recorded match, over all agents.
pub fn league_points(stats: &[AgentStat]) -> u32 {
    stats.iter().map(AgentStat::league_points).sum()
}
