use std::{cmp::Ordering, collections::BTreeMap, str::FromStr};

use serde::Serialize;

use crate::{
    AgentStat, NO_AGENT, Position, Ratio, StatTotals, UNASSIGNED_TIER, WinRate, league_points,
    most_used_agent,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RankingType {
    #[default]
    Overall,
    Agent,
    Position,
    Tier,
}

impl FromStr for RankingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "overall" => Ok(RankingType::Overall),
            "agent" => Ok(RankingType::Agent),
            "position" => Ok(RankingType::Position),
            "tier" => Ok(RankingType::Tier),
            _ => Err(format!("Unknown ranking type: {}", s)),
        }
    }
}

/// Everything the ranking builder needs to know about one player.
#[derive(Clone, Copy, Debug)]
pub struct PlayerEntry<'a> {
    pub user_id: &'a str,
    pub nickname: &'a str,
    pub position: Position,
    pub tier: &'a str,
    pub agent_stats: &'a [AgentStat],
}

impl PlayerEntry<'_> {
    fn totals(&self) -> StatTotals {
        StatTotals::of(self.agent_stats)
    }

    fn most_used_agent(&self) -> String {
        most_used_agent(self.agent_stats)
            .map(|stat| stat.agent_name.clone())
            .unwrap_or_else(|| NO_AGENT.to_string())
    }
}

/// Keys compared when ordering leaderboard rows.
pub trait RankKey {
    fn league_point(&self) -> Option<u32>;
    fn has_agent(&self) -> bool;
    fn kda(&self) -> Ratio;
}

/// Descending order: league points, then players without any agent sink,
/// then KDA with `Perfect` on top. Equal rows keep their input order.
pub fn compare_rows<R: RankKey>(a: &R, b: &R) -> Ordering {
    let by_points = match (a.league_point(), b.league_point()) {
        (Some(a), Some(b)) => b.cmp(&a),
        _ => Ordering::Equal,
    };
    by_points
        .then_with(|| b.has_agent().cmp(&a.has_agent()))
        .then_with(|| b.kda().total_cmp(&a.kda()))
}

pub fn sort_rows<R: RankKey>(rows: &mut [R]) {
    rows.sort_by(compare_rows);
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRow {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub nickname: String,
    pub preferred_position: Position,
    pub tier: String,
    pub most_used_agent: String,
    pub kda: Ratio,
    pub win_rate: WinRate,
    pub league_point: u32,
    pub total_games: u32,
}

impl RankKey for OverallRow {
    fn league_point(&self) -> Option<u32> {
        Some(self.league_point)
    }
    fn has_agent(&self) -> bool {
        self.most_used_agent != NO_AGENT
    }
    fn kda(&self) -> Ratio {
        self.kda
    }
}

/// A player's line inside an agent group, computed from that agent only.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRow {
    pub nickname: String,
    pub kda: Ratio,
    pub win_rate: WinRate,
    pub play_count: u32,
}

impl RankKey for AgentRow {
    fn league_point(&self) -> Option<u32> {
        None
    }
    fn has_agent(&self) -> bool {
        true
    }
    fn kda(&self) -> Ratio {
        self.kda
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRow {
    pub nickname: String,
    pub kda: Ratio,
    pub win_rate: WinRate,
    pub most_used_agent: String,
    pub league_point: u32,
}

impl RankKey for GroupRow {
    fn league_point(&self) -> Option<u32> {
        Some(self.league_point)
    }
    fn has_agent(&self) -> bool {
        self.most_used_agent != NO_AGENT
    }
    fn kda(&self) -> Ratio {
        self.kda
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentGroup {
    pub agent_name: String,
    pub users: Vec<AgentRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionGroup {
    pub position: Position,
    pub users: Vec<GroupRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TierGroup {
    pub tier: String,
    pub users: Vec<GroupRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rankings {
    Overall(Vec<OverallRow>),
    Agent(Vec<AgentGroup>),
    Position(Vec<PositionGroup>),
    Tier(Vec<TierGroup>),
}

fn group_row(entry: &PlayerEntry) -> GroupRow {
    let totals = entry.totals();
    GroupRow {
        nickname: entry.nickname.to_string(),
        kda: totals.kda(),
        win_rate: totals.win_rate(),
        most_used_agent: entry.most_used_agent(),
        league_point: league_points(entry.agent_stats),
    }
}

pub fn build_overall(entries: &[PlayerEntry]) -> Vec<OverallRow> {
    let mut rows: Vec<OverallRow> = entries
        .iter()
        .map(|entry| {
            let totals = entry.totals();
            OverallRow {
                user_id: entry.user_id.to_string(),
                nickname: entry.nickname.to_string(),
                preferred_position: entry.position,
                tier: entry.tier.to_string(),
                most_used_agent: entry.most_used_agent(),
                kda: totals.kda(),
                win_rate: totals.win_rate(),
                league_point: league_points(entry.agent_stats),
                total_games: totals.games(),
            }
        })
        .collect();
    sort_rows(&mut rows);
    rows
}

/// One group per agent anyone has played, ordered by agent name.
pub fn build_by_agent(entries: &[PlayerEntry]) -> Vec<AgentGroup> {
    let mut groups: BTreeMap<&str, Vec<AgentRow>> = BTreeMap::new();
    for entry in entries {
        for stat in entry.agent_stats {
            groups
                .entry(stat.agent_name.as_str())
                .or_default()
                .push(AgentRow {
                    nickname: entry.nickname.to_string(),
                    kda: stat.kda(),
                    win_rate: stat.win_rate(),
                    play_count: stat.play_count,
                });
        }
    }
    groups
        .into_iter()
        .map(|(agent_name, mut users)| {
            sort_rows(&mut users);
            AgentGroup {
                agent_name: agent_name.to_string(),
                users,
            }
        })
        .collect()
}

pub fn build_by_position(entries: &[PlayerEntry]) -> Vec<PositionGroup> {
    Position::RANKING_ORDER
        .iter()
        .filter_map(|&position| {
            let mut users: Vec<GroupRow> = entries
                .iter()
                .filter(|entry| entry.position == position)
                .map(group_row)
                .collect();
            if users.is_empty() {
                return None;
            }
            sort_rows(&mut users);
            Some(PositionGroup { position, users })
        })
        .collect()
}

/// Groups players by tier following `tier_order`. Unassigned players come
/// after the listed tiers, followed by tiers missing from `tier_order`.
pub fn build_by_tier(entries: &[PlayerEntry], tier_order: &[&str]) -> Vec<TierGroup> {
    let mut order: Vec<&str> = tier_order
        .iter()
        .copied()
        .filter(|tier| *tier != UNASSIGNED_TIER)
        .collect();
    order.push(UNASSIGNED_TIER);
    for entry in entries {
        if !order.contains(&entry.tier) {
            order.push(entry.tier);
        }
    }

    order
        .into_iter()
        .filter_map(|tier| {
            let mut users: Vec<GroupRow> = entries
                .iter()
                .filter(|entry| entry.tier == tier)
                .map(group_row)
                .collect();
            if users.is_empty() {
                return None;
            }
            sort_rows(&mut users);
            Some(TierGroup {
                tier: tier.to_string(),
                users,
            })
        })
        .collect()
}

pub fn build(ranking_type: RankingType, entries: &[PlayerEntry], tier_order: &[&str]) -> Rankings {
    match ranking_type {
        RankingType::Overall => Rankings::Overall(build_overall(entries)),
        RankingType::Agent => Rankings::Agent(build_by_agent(entries)),
        RankingType::Position => Rankings::Position(build_by_position(entries)),
        RankingType::Tier => Rankings::Tier(build_by_tier(entries, tier_order)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::MatchStat;

    fn stat(name: &str, play_count: u32, kills: u32, deaths: u32, assists: u32) -> AgentStat {
        AgentStat {
            agent_name: name.to_string(),
            play_count,
            kills,
            deaths,
            assists,
            wins: play_count,
            losses: 0,
            match_stats: vec![],
        }
    }

    fn with_points(mut stat: AgentStat, points: u32) -> AgentStat {
        stat.match_stats.push(MatchStat {
            match_id: format!("{}-{}", stat.agent_name, points),
            rank: 1,
            is_game_mvp: false,
            is_team_mvp: false,
            date: Utc::now(),
            points,
        });
        stat
    }

    fn entry<'a>(
        nickname: &'a str,
        position: Position,
        tier: &'a str,
        agent_stats: &'a [AgentStat],
    ) -> PlayerEntry<'a> {
        PlayerEntry {
            user_id: nickname,
            nickname,
            position,
            tier,
            agent_stats,
        }
    }

    #[test]
    fn test_ranking_type_parse() {
        assert_eq!("".parse::<RankingType>(), Ok(RankingType::Overall));
        assert_eq!("Agent".parse::<RankingType>(), Ok(RankingType::Agent));
        assert_eq!("tier".parse::<RankingType>(), Ok(RankingType::Tier));
        assert!("season".parse::<RankingType>().is_err());
    }

    #[test]
    fn test_overall_sorted_by_kda() {
        let a = vec![stat("Jett", 2, 10, 10, 0)];
        let b = vec![stat("Sage", 2, 30, 10, 0)];
        let c = vec![stat("Omen", 1, 3, 0, 0)];
        let entries = vec![
            entry("a", Position::Duelist, "1티어", &a),
            entry("b", Position::Sentinel, "2티어", &b),
            entry("c", Position::Controller, UNASSIGNED_TIER, &c),
        ];
        let rows = build_overall(&entries);
        let names: Vec<&str> = rows.iter().map(|r| r.nickname.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        assert_eq!(rows[0].kda, Ratio::Perfect);
        assert_eq!(rows[1].kda.to_string(), "3.00");
        assert_eq!(rows[1].win_rate.to_string(), "100.0%");
        assert_eq!(rows[1].most_used_agent, "Sage");
        assert_eq!(rows[1].tier, "2티어");
    }

    #[test]
    fn test_league_points_before_kda() {
        let a = vec![with_points(stat("Jett", 1, 1, 10, 0), 12)];
        let b = vec![stat("Sage", 1, 30, 1, 0)];
        let entries = vec![
            entry("b", Position::Duelist, UNASSIGNED_TIER, &b),
            entry("a", Position::Duelist, UNASSIGNED_TIER, &a),
        ];
        let rows = build_overall(&entries);
        assert_eq!(rows[0].nickname, "a");
        assert_eq!(rows[0].league_point, 12);
        assert_eq!(rows[1].nickname, "b");
    }

    #[test]
    fn test_players_without_agents_sink() {
        let empty: Vec<AgentStat> = vec![];
        let weak = vec![stat("Jett", 1, 0, 10, 0)];
        let entries = vec![
            entry("nobody", Position::Duelist, UNASSIGNED_TIER, &empty),
            entry("weak", Position::Duelist, UNASSIGNED_TIER, &weak),
        ];
        let rows = build_overall(&entries);
        assert_eq!(rows[0].nickname, "weak");
        assert_eq!(rows[1].nickname, "nobody");
        assert_eq!(rows[1].most_used_agent, NO_AGENT);
        assert_eq!(rows[1].kda, Ratio::Perfect);
        assert_eq!(rows[1].win_rate.to_string(), "0%");
    }

    #[test]
    fn test_equal_rows_keep_input_order() {
        let same = vec![stat("Jett", 1, 10, 5, 0)];
        let entries = vec![
            entry("first", Position::Duelist, UNASSIGNED_TIER, &same),
            entry("second", Position::Duelist, UNASSIGNED_TIER, &same),
            entry("third", Position::Duelist, UNASSIGNED_TIER, &same),
        ];
        let rows = build_overall(&entries);
        let names: Vec<&str> = rows.iter().map(|r| r.nickname.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_by_agent_groups() {
        let a = vec![stat("Jett", 3, 10, 10, 5), stat("Sage", 1, 2, 1, 8)];
        let b = vec![stat("Jett", 1, 9, 0, 0)];
        let entries = vec![
            entry("a", Position::Duelist, UNASSIGNED_TIER, &a),
            entry("b", Position::Duelist, UNASSIGNED_TIER, &b),
        ];
        let groups = build_by_agent(&entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].agent_name, "Jett");
        assert_eq!(groups[0].users[0].nickname, "b");
        assert_eq!(groups[0].users[0].kda, Ratio::Perfect);
        assert_eq!(groups[0].users[1].kda.to_string(), "1.50");
        assert_eq!(groups[0].users[1].play_count, 3);
        assert_eq!(groups[1].agent_name, "Sage");
        assert_eq!(groups[1].users.len(), 1);
        assert_eq!(groups[1].users[0].kda.to_string(), "10.00");
    }

    #[test]
    fn test_by_position_order() {
        let s = vec![stat("Jett", 1, 10, 5, 0)];
        let entries = vec![
            entry("init", Position::Initiator, UNASSIGNED_TIER, &s),
            entry("duel", Position::Duelist, UNASSIGNED_TIER, &s),
            entry("ctrl", Position::Controller, UNASSIGNED_TIER, &s),
        ];
        let groups = build_by_position(&entries);
        let positions: Vec<Position> = groups.iter().map(|g| g.position).collect();
        assert_eq!(
            positions,
            vec![Position::Duelist, Position::Controller, Position::Initiator]
        );
        assert_eq!(groups[0].users[0].nickname, "duel");
    }

    #[test]
    fn test_by_tier_order() {
        let s = vec![stat("Jett", 1, 10, 5, 0)];
        let entries = vec![
            entry("none", Position::Duelist, UNASSIGNED_TIER, &s),
            entry("three", Position::Duelist, "3티어", &s),
            entry("one", Position::Duelist, "1티어", &s),
            entry("odd", Position::Duelist, "6티어", &s),
        ];
        let order = ["1티어", "2티어", "3티어", "4티어", "5티어"];
        let groups = build_by_tier(&entries, &order);
        let tiers: Vec<&str> = groups.iter().map(|g| g.tier.as_str()).collect();
        assert_eq!(tiers, vec!["1티어", "3티어", UNASSIGNED_TIER, "6티어"]);
    }

    #[test]
    fn test_rankings_serialize() {
        let s = vec![stat("Jett", 4, 20, 10, 5)];
        let entries = vec![entry("a", Position::Duelist, "1티어", &s)];
        let rankings = build(RankingType::Overall, &entries, &[]);
        let json = serde_json::to_value(&rankings).unwrap();
        assert_eq!(json[0]["nickname"], "a");
        assert_eq!(json[0]["preferredPosition"], "타격대");
        assert_eq!(json[0]["kda"], "2.50");
        assert_eq!(json[0]["winRate"], "100.0%");
        assert_eq!(json[0]["mostUsedAgent"], "Jett");
        assert_eq!(json[0]["_id"], "a");
    }
}
