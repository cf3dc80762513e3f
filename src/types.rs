//! Type definitions for the game document
//!
//! Field names serialize in camelCase so the persisted JSON document stays
//! compatible with documents written by earlier versions of the server.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Bet lifecycle. A bet settles at most once: pending -> won | lost,
/// never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Finished,
}

/// Final score of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// Running per-user aggregates. The winnings counters only ever grow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub total_bets: u64,
    pub total_winnings: u64,
    pub biggest_win: u64,
    pub total_combined_odds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub coins: u64,
    pub joined_at: String,
    #[serde(default)]
    pub stats: UserStats,
}

/// A single offered price within a match market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOffer {
    pub label: String,
    pub odds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub date: String,
    pub time: String,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    /// Offered markets keyed by market code, then selection code
    #[serde(default)]
    pub markets: HashMap<String, HashMap<String, MarketOffer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: String,
    pub user_id: String,
    pub match_id: String,
    /// Market and selection are stored verbatim as submitted by the client;
    /// normalization happens at settlement time.
    pub market: String,
    pub selection: String,
    pub odds: f64,
    pub stake: u64,
    /// Precomputed at placement: round(stake * odds)
    pub potential_win: u64,
    pub placed_at: String,
    pub status: BetStatus,
    /// Leagues this bet counts toward for leaderboard aggregation
    #[serde(default)]
    pub league_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSettings {
    pub max_members: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub creator_id: String,
    pub invite_code: String,
    pub members: Vec<String>,
    pub created_at: String,
    pub settings: LeagueSettings,
}

/// The whole game state, persisted as one JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameData {
    pub users: HashMap<String, User>,
    pub leagues: HashMap<String, League>,
    pub matches: Vec<Match>,
    /// Bets grouped by owning user id
    pub bets: HashMap<String, Vec<Bet>>,
    pub version: String,
    pub last_updated: String,
}

impl Default for GameData {
    fn default() -> Self {
        GameData {
            users: HashMap::new(),
            leagues: HashMap::new(),
            matches: Vec::new(),
            bets: HashMap::new(),
            version: "1.0.0".to_string(),
            last_updated: now_rfc3339(),
        }
    }
}

impl GameData {
    pub fn match_by_id_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }
}

/// Generate a prefixed opaque identifier, e.g. `bet_6f9c...`
pub fn generate_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
