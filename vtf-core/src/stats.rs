use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Ratio, WinRate};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStat {
    pub match_id: String,
    pub rank: u8,
    #[serde(rename = "isGameMVP", default)]
    pub is_game_mvp: bool,
    #[serde(rename = "isTeamMVP", default)]
    pub is_team_mvp: bool,
    pub date: DateTime<Utc>,
    pub points: u32,
}

/// Accumulated counters of one player on one agent.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStat {
    pub agent_name: String,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub match_stats: Vec<MatchStat>,
}

impl AgentStat {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            ..Default::default()
        }
    }

    /// (kills + assists) / deaths
    pub fn kda(&self) -> Ratio {
        Ratio::of(self.kills.saturating_add(self.assists), self.deaths)
    }

    /// kills / deaths
    pub fn kill_death(&self) -> Ratio {
        Ratio::of(self.kills, self.deaths)
    }

    pub fn win_rate(&self) -> WinRate {
        WinRate::new(self.wins, self.losses)
    }

    pub fn league_points(&self) -> u32 {
        self.match_stats.iter().map(|m| m.points).sum()
    }

    fn apply(&mut self, result: &MatchResult) {
        self.play_count = self.play_count.saturating_add(1);
        self.kills = self.kills.saturating_add(result.kills);
        self.deaths = self.deaths.saturating_add(result.deaths);
        self.assists = self.assists.saturating_add(result.assists);
        if result.is_win {
            self.wins = self.wins.saturating_add(1);
        } else {
            self.losses = self.losses.saturating_add(1);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchPlacement {
    /// Scoreboard position, 1..=10.
    pub rank: u8,
    pub is_game_mvp: bool,
    pub is_team_mvp: bool,
}

impl MatchPlacement {
    pub fn is_valid(&self) -> bool {
        (1..=10).contains(&self.rank)
    }

    pub fn points(&self) -> u32 {
        match_points(self.rank, self.is_game_mvp, self.is_team_mvp)
    }
}

/// The outcome of a single match for a single player.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub agent_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub is_win: bool,
    pub placement: Option<MatchPlacement>,
}

pub fn match_points(rank: u8, is_game_mvp: bool, is_team_mvp: bool) -> u32 {
    let base = match rank {
        1 => 10,
        2 => 9,
        3 => 8,
        4 => 7,
        5 => 6,
        _ => 5,
    };
    let game_mvp_bonus = if is_game_mvp { 2 } else { 0 };
    let team_mvp_bonus = if is_team_mvp { 1 } else { 0 };
    base + game_mvp_bonus + team_mvp_bonus
}

/// Absolute counter values for one agent, as set by an administrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentCounters {
    pub agent_name: String,
    pub play_count: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub wins: u32,
    pub losses: u32,
}

fn agent_index(agent_stats: &mut Vec<AgentStat>, agent_name: &str) -> usize {
    match agent_stats
        .iter()
        .position(|stat| stat.agent_name == agent_name)
    {
        Some(index) => index,
        None => {
            agent_stats.push(AgentStat::new(agent_name));
            agent_stats.len() - 1
        }
    }
}

/// Folds a match result into the stat record of its agent, creating the
/// record when the player has never played that agent before.
/// Returns the index of the updated record.
pub fn record_match(
    agent_stats: &mut Vec<AgentStat>,
    result: &MatchResult,
    match_id: String,
    date: DateTime<Utc>,
) -> usize {
    let index = agent_index(agent_stats, &result.agent_name);

    let stat = &mut agent_stats[index];
    stat.apply(result);
    if let Some(placement) = &result.placement {
        stat.match_stats.push(MatchStat {
            match_id,
            rank: placement.rank,
            is_game_mvp: placement.is_game_mvp,
            is_team_mvp: placement.is_team_mvp,
            date,
            points: placement.points(),
        });
    }
    index
}

/// Overwrites the counters of an agent record, creating it if absent.
/// The match history is left untouched.
pub fn correct_agent_stat(agent_stats: &mut Vec<AgentStat>, counters: &AgentCounters) -> usize {
    let index = agent_index(agent_stats, &counters.agent_name);
    let stat = &mut agent_stats[index];
    stat.play_count = counters.play_count;
    stat.kills = counters.kills;
    stat.deaths = counters.deaths;
    stat.assists = counters.assists;
    stat.wins = counters.wins;
    stat.losses = counters.losses;
    index
}
