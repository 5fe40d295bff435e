use std::collections::HashMap;

use crate::records_fetch::{LeaderboardRun, RoomsHighscores, TickBest};
use crate::snapshot::PlayerSnapshot;

/// Rooms excluded from all three categories (seasonal variants whose
/// boards are frozen).
pub const IGNORED_ROOMS: &[&str] = &["fxmas", "kxmas", "vxmas", "crxmas"];

fn is_ignored(code: &str) -> bool {
    IGNORED_ROOMS.contains(&code)
}

#[derive(Debug, Clone)]
pub struct TickOpportunity {
    pub code: String,
    pub name: String,
    pub your_ticks: u32,
    pub best_ticks: u32,
    pub diff: u32,
    /// Share of the player's time that the gap represents, preformatted
    /// to one decimal ("20.0").
    pub pct: String,
    pub holder: String,
    /// 1-based position on the room's top-runs board, when the player
    /// appears there.
    pub board_rank: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKind {
    /// The holder's rank score is higher than the player's.
    Score,
    /// Equal scores; the holder reached it in fewer ticks.
    Tick,
}

#[derive(Debug, Clone)]
pub struct RankOpportunity {
    pub code: String,
    pub name: String,
    pub your_score: u32,
    pub best_score: u32,
    pub diff: u32,
    pub kind: RankKind,
    pub your_rank_ticks: Option<u32>,
    pub best_rank_ticks: Option<u32>,
    pub holder: String,
}

#[derive(Debug, Clone)]
pub struct FloorOpportunity {
    pub code: String,
    pub name: String,
    pub your_floor: u32,
    pub best_floor: u32,
    pub diff: u32,
    pub holder: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickTotals {
    pub total: u64,
    pub min_theoretical: u64,
    pub possible_gain: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankSummary {
    pub score_rooms: usize,
    pub tick_rooms: usize,
    pub points_to_gain: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloorSummary {
    pub rooms: usize,
    pub floors_to_gain: u64,
}

/// Everything one trigger produces; recomputed from scratch on each
/// invocation, never persisted.
#[derive(Debug, Clone, Default)]
pub struct ImprovementsReport {
    pub ticks: Vec<TickOpportunity>,
    pub ranks: Vec<RankOpportunity>,
    pub floors: Vec<FloorOpportunity>,
    pub totals: TickTotals,
}

pub fn build_report(
    snapshot: &PlayerSnapshot,
    best: &HashMap<String, TickBest>,
    leaderboards: &HashMap<String, Vec<LeaderboardRun>>,
    highscores: &RoomsHighscores,
) -> ImprovementsReport {
    ImprovementsReport {
        ticks: compute_tick_opportunities(snapshot, best, leaderboards),
        ranks: compute_rank_opportunities(snapshot, highscores),
        floors: compute_floor_opportunities(snapshot, highscores),
        totals: compute_tick_totals(snapshot, best),
    }
}

pub fn compute_tick_opportunities(
    snapshot: &PlayerSnapshot,
    best: &HashMap<String, TickBest>,
    leaderboards: &HashMap<String, Vec<LeaderboardRun>>,
) -> Vec<TickOpportunity> {
    let mut out = Vec::new();
    for (code, record) in &snapshot.rooms {
        if is_ignored(code) {
            continue;
        }
        let Some(b) = best.get(code) else { continue };
        if record.ticks <= b.ticks || b.user_id == snapshot.user_id {
            continue;
        }
        let diff = record.ticks - b.ticks;
        let pct = format!("{:.1}", f64::from(diff) / f64::from(record.ticks) * 100.0);
        let board_rank = leaderboards.get(code).and_then(|runs| {
            runs.iter()
                .position(|run| run.user_id == snapshot.user_id)
                .map(|idx| idx + 1)
        });
        out.push(TickOpportunity {
            code: code.clone(),
            name: snapshot.room_name(code),
            your_ticks: record.ticks,
            best_ticks: b.ticks,
            diff,
            pct,
            holder: b.user_name.clone(),
            board_rank,
        });
    }
    out.sort_by(|a, b| b.diff.cmp(&a.diff));
    out
}

/// Aggregates run over the full record set; the ignore list only filters
/// opportunities.
pub fn compute_tick_totals(
    snapshot: &PlayerSnapshot,
    best: &HashMap<String, TickBest>,
) -> TickTotals {
    let mut total: u64 = 0;
    let mut min_theoretical: u64 = 0;
    for (code, record) in &snapshot.rooms {
        total += u64::from(record.ticks);
        let room_min = match best.get(code) {
            Some(b) => record.ticks.min(b.ticks),
            None => record.ticks,
        };
        min_theoretical += u64::from(room_min);
    }
    TickTotals {
        total,
        min_theoretical,
        possible_gain: total - min_theoretical,
    }
}

pub fn compute_rank_opportunities(
    snapshot: &PlayerSnapshot,
    highscores: &RoomsHighscores,
) -> Vec<RankOpportunity> {
    let mut out = Vec::new();
    for (code, record) in &snapshot.rooms {
        if is_ignored(code) {
            continue;
        }
        let Some(your_score) = record.rank else { continue };
        let Some(top) = highscores.rank.get(code) else {
            continue;
        };
        if top.rank > your_score {
            out.push(RankOpportunity {
                code: code.clone(),
                name: snapshot.room_name(code),
                your_score,
                best_score: top.rank,
                diff: top.rank - your_score,
                kind: RankKind::Score,
                your_rank_ticks: None,
                best_rank_ticks: None,
                holder: top.user_name.clone(),
            });
        } else if top.rank == your_score {
            // Tie-break on the time taken to reach the score, not the
            // room's speed-run time. Needs a value on both sides.
            if let (Some(yours), Some(best)) = (record.rank_ticks, top.ticks)
                && best < yours
            {
                out.push(RankOpportunity {
                    code: code.clone(),
                    name: snapshot.room_name(code),
                    your_score,
                    best_score: top.rank,
                    diff: 0,
                    kind: RankKind::Tick,
                    your_rank_ticks: Some(yours),
                    best_rank_ticks: Some(best),
                    holder: top.user_name.clone(),
                });
            }
        }
        // A player rank above the recorded best is left alone.
    }
    out.sort_by(|a, b| {
        let priority = sort_priority(a.kind).cmp(&sort_priority(b.kind));
        if priority != std::cmp::Ordering::Equal {
            return priority;
        }
        match a.kind {
            RankKind::Score => b.diff.cmp(&a.diff),
            RankKind::Tick => rank_tick_gap(b).cmp(&rank_tick_gap(a)),
        }
    });
    out
}

fn sort_priority(kind: RankKind) -> u8 {
    match kind {
        RankKind::Score => 0,
        RankKind::Tick => 1,
    }
}

fn rank_tick_gap(opportunity: &RankOpportunity) -> u32 {
    match (opportunity.your_rank_ticks, opportunity.best_rank_ticks) {
        (Some(yours), Some(best)) => yours.saturating_sub(best),
        _ => 0,
    }
}

pub fn compute_floor_opportunities(
    snapshot: &PlayerSnapshot,
    highscores: &RoomsHighscores,
) -> Vec<FloorOpportunity> {
    let mut out = Vec::new();
    for (code, record) in &snapshot.rooms {
        if is_ignored(code) {
            continue;
        }
        // Absent floors normalize to 0 on both sides.
        let your_floor = record.floor.unwrap_or(0);
        let Some(top) = highscores.floor.get(code) else {
            continue;
        };
        let best_floor = top.floor.unwrap_or(0);
        if best_floor <= your_floor {
            continue;
        }
        out.push(FloorOpportunity {
            code: code.clone(),
            name: snapshot.room_name(code),
            your_floor,
            best_floor,
            diff: best_floor - your_floor,
            holder: top.user_name.clone(),
        });
    }
    out.sort_by(|a, b| b.diff.cmp(&a.diff));
    out
}

pub fn rank_summary(ranks: &[RankOpportunity]) -> RankSummary {
    let mut summary = RankSummary::default();
    for opportunity in ranks {
        match opportunity.kind {
            RankKind::Score => {
                summary.score_rooms += 1;
                summary.points_to_gain += u64::from(opportunity.diff);
            }
            RankKind::Tick => summary.tick_rooms += 1,
        }
    }
    summary
}

pub fn floor_summary(floors: &[FloorOpportunity]) -> FloorSummary {
    FloorSummary {
        rooms: floors.len(),
        floors_to_gain: floors.iter().map(|o| u64::from(o.diff)).sum(),
    }
}
