use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::Result;
use serde_json::Value;

use crate::improvements::{self, ImprovementsReport};
use crate::records_fetch::{self, ROOMS_HIGHSCORES, TICK_HIGHSCORES, TICK_LEADERBOARDS};
use crate::snapshot::{self, PlayerSnapshot};
use crate::state::{Delta, ProviderCommand};
use crate::trpc;

pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || run_provider(tx, cmd_rx, trpc::fetch_trpc));
}

/// Command loop shared by the live and fixture providers; `fetch`
/// resolves one method name to its payload.
pub fn run_provider<F>(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, fetch: F)
where
    F: Fn(&str) -> Result<Value> + Sync,
{
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            ProviderCommand::FetchImprovements { snapshot } => {
                match fetch_report(&snapshot, &fetch) {
                    Ok(report) => {
                        let _ = tx.send(Delta::Log(format!(
                            "[INFO] Improvements: {} tick, {} rank, {} floor opportunities across {} rooms",
                            report.ticks.len(),
                            report.ranks.len(),
                            report.floors.len(),
                            snapshot.rooms.len(),
                        )));
                        let _ = tx.send(Delta::ImprovementsReady(report));
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::Log(format!(
                            "[WARN] Improvements fetch error: {err:#}"
                        )));
                        let _ = tx.send(Delta::ImprovementsFailed {
                            message: format!("{err:#}"),
                        });
                    }
                }
            }
            ProviderCommand::ReloadSnapshot => match snapshot::load_snapshot() {
                Ok(snap) => {
                    let _ = tx.send(Delta::SnapshotLoaded(snap));
                }
                Err(err) => {
                    let _ = tx.send(Delta::SnapshotFailed {
                        message: format!("{err:#}"),
                    });
                }
            },
        }
    }
}

/// The three queries settle together; any failure aborts the whole fetch.
/// No partial reports.
fn fetch_report<F>(snapshot: &PlayerSnapshot, fetch: &F) -> Result<ImprovementsReport>
where
    F: Fn(&str) -> Result<Value> + Sync,
{
    let (best_payload, (leaderboards_payload, rooms_payload)) = rayon::join(
        || fetch(TICK_HIGHSCORES),
        || rayon::join(|| fetch(TICK_LEADERBOARDS), || fetch(ROOMS_HIGHSCORES)),
    );
    let best = records_fetch::parse_tick_highscores(best_payload?)?;
    let leaderboards = records_fetch::parse_tick_leaderboards(leaderboards_payload?)?;
    let highscores = records_fetch::parse_rooms_highscores(rooms_payload?)?;
    Ok(improvements::build_report(
        snapshot,
        &best,
        &leaderboards,
        &highscores,
    ))
}
