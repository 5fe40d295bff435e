use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

pub const TICK_HIGHSCORES: &str = "game.getTickHighscores";
pub const TICK_LEADERBOARDS: &str = "game.getTickLeaderboards";
pub const ROOMS_HIGHSCORES: &str = "game.getRoomsHighscores";

/// Best speed-run for one room.
#[derive(Debug, Clone, Deserialize)]
pub struct TickBest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    pub ticks: u32,
}

/// One entry of a room's top-runs board, ordered best-first.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardRun {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    pub ticks: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankBest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    pub rank: u32,
    /// Time the holder took to reach the rank score; absent on some
    /// older boards.
    #[serde(default)]
    pub ticks: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FloorBest {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(default)]
    pub floor: Option<u32>,
}

/// Per-room rank and floor bests; either map may be missing from the
/// payload entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomsHighscores {
    #[serde(default)]
    pub rank: HashMap<String, RankBest>,
    #[serde(default)]
    pub floor: HashMap<String, FloorBest>,
}

pub fn parse_tick_highscores(payload: Value) -> Result<HashMap<String, TickBest>> {
    if payload.is_null() {
        return Ok(HashMap::new());
    }
    serde_json::from_value(payload).context("malformed tick highscores payload")
}

pub fn parse_tick_leaderboards(payload: Value) -> Result<HashMap<String, Vec<LeaderboardRun>>> {
    if payload.is_null() {
        return Ok(HashMap::new());
    }
    serde_json::from_value(payload).context("malformed tick leaderboards payload")
}

pub fn parse_rooms_highscores(payload: Value) -> Result<RoomsHighscores> {
    if payload.is_null() {
        return Ok(RoomsHighscores::default());
    }
    serde_json::from_value(payload).context("malformed rooms highscores payload")
}
