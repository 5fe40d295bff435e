use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::feed::run_provider;
use crate::records_fetch::{ROOMS_HIGHSCORES, TICK_HIGHSCORES, TICK_LEADERBOARDS};
use crate::snapshot::{self, PlayerSnapshot};
use crate::state::{Delta, ProviderCommand};
use crate::trpc;

static TICK_HIGHSCORES_JSON: &str = include_str!("../tests/fixtures/trpc_tick_highscores.json");
static TICK_LEADERBOARDS_JSON: &str =
    include_str!("../tests/fixtures/trpc_tick_leaderboards.json");
static ROOMS_HIGHSCORES_JSON: &str = include_str!("../tests/fixtures/trpc_rooms_highscores.json");
static SNAPSHOT_JSON: &str = include_str!("../tests/fixtures/player_snapshot.json");

/// Replays the bundled payloads through the normal pipeline; used when
/// ARENA_FEED=fixture so the popup can be exercised without the game API.
pub fn spawn_fixture_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || run_provider(tx, cmd_rx, fetch_fixture));
}

/// The snapshot matching the bundled payloads, for runs without an
/// exported snapshot file.
pub fn fixture_snapshot() -> Result<PlayerSnapshot> {
    snapshot::parse_snapshot(SNAPSHOT_JSON)
}

fn fetch_fixture(method: &str) -> Result<Value> {
    let raw = match method {
        TICK_HIGHSCORES => TICK_HIGHSCORES_JSON,
        TICK_LEADERBOARDS => TICK_LEADERBOARDS_JSON,
        ROOMS_HIGHSCORES => ROOMS_HIGHSCORES_JSON,
        other => return Err(anyhow!("no fixture for {other}")),
    };
    trpc::extract_payload(method, raw)
}
