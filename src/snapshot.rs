use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_SNAPSHOT_FILE: &str = "arena_snapshot.json";

/// The player's own record for one room.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomRecord {
    /// Best speed-run time, lower is better.
    pub ticks: u32,
    /// Rank score, higher is better.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Time taken to achieve the rank score (not the speed-run time).
    #[serde(rename = "rankTicks", default)]
    pub rank_ticks: Option<u32>,
    /// Deepest floor reached; absent means floor 0.
    #[serde(default)]
    pub floor: Option<u32>,
}

/// Read-only snapshot of the game client's player state: records,
/// identity, and the room-code-to-name lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSnapshot {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    /// RFC 3339 stamp written by the exporter.
    #[serde(rename = "exportedAt", default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub rooms: HashMap<String, RoomRecord>,
    #[serde(rename = "roomNames", default)]
    pub room_names: HashMap<String, String>,
}

impl PlayerSnapshot {
    /// Display name for a room, falling back to the code itself.
    pub fn room_name(&self, code: &str) -> String {
        self.room_names
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

pub fn snapshot_path() -> PathBuf {
    match std::env::var("ARENA_SNAPSHOT_PATH") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_SNAPSHOT_FILE),
    }
}

pub fn load_snapshot() -> Result<PlayerSnapshot> {
    let path = snapshot_path();
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    parse_snapshot(&raw)
}

pub fn parse_snapshot(raw: &str) -> Result<PlayerSnapshot> {
    serde_json::from_str(raw).context("malformed player snapshot")
}
