use std::collections::HashMap;

use arena_terminal::improvements::{
    RankKind, build_report, compute_floor_opportunities, compute_rank_opportunities,
    compute_tick_opportunities, compute_tick_totals,
};
use arena_terminal::records_fetch::{
    FloorBest, LeaderboardRun, RankBest, RoomsHighscores, TickBest,
};
use arena_terminal::snapshot::{PlayerSnapshot, RoomRecord};

const YOU: &str = "u-self";

fn record(
    ticks: u32,
    rank: Option<u32>,
    rank_ticks: Option<u32>,
    floor: Option<u32>,
) -> RoomRecord {
    RoomRecord {
        ticks,
        rank,
        rank_ticks,
        floor,
    }
}

fn snapshot(rooms: Vec<(&str, RoomRecord)>) -> PlayerSnapshot {
    PlayerSnapshot {
        user_id: YOU.to_string(),
        user_name: "Rook".to_string(),
        exported_at: None,
        rooms: rooms
            .into_iter()
            .map(|(code, room)| (code.to_string(), room))
            .collect(),
        room_names: HashMap::new(),
    }
}

fn tick_best(user_id: &str, ticks: u32) -> TickBest {
    TickBest {
        user_id: user_id.to_string(),
        user_name: user_id.to_string(),
        ticks,
    }
}

fn rank_best(user_id: &str, rank: u32, ticks: Option<u32>) -> RankBest {
    RankBest {
        user_id: user_id.to_string(),
        user_name: user_id.to_string(),
        rank,
        ticks,
    }
}

fn floor_best(user_id: &str, floor: Option<u32>) -> FloorBest {
    FloorBest {
        user_id: user_id.to_string(),
        user_name: user_id.to_string(),
        floor,
    }
}

#[test]
fn no_tick_opportunity_when_player_matches_or_beats_best() {
    let snap = snapshot(vec![
        ("even", record(400, None, None, None)),
        ("ahead", record(380, None, None, None)),
    ]);
    let best = HashMap::from([
        ("even".to_string(), tick_best("u-top", 400)),
        ("ahead".to_string(), tick_best("u-top", 390)),
    ]);
    let opportunities = compute_tick_opportunities(&snap, &best, &HashMap::new());
    assert!(opportunities.is_empty());
}

#[test]
fn no_tick_opportunity_when_player_holds_the_best() {
    let snap = snapshot(vec![("mine", record(500, None, None, None))]);
    // The board still shows an older, faster run under the player's own id.
    let best = HashMap::from([("mine".to_string(), tick_best(YOU, 400))]);
    let opportunities = compute_tick_opportunities(&snap, &best, &HashMap::new());
    assert!(opportunities.is_empty());
}

#[test]
fn no_tick_opportunity_without_a_best_record() {
    let snap = snapshot(vec![("fresh", record(500, None, None, None))]);
    let opportunities = compute_tick_opportunities(&snap, &HashMap::new(), &HashMap::new());
    assert!(opportunities.is_empty());
}

#[test]
fn tick_opportunities_sorted_by_descending_gap() {
    let snap = snapshot(vec![
        ("small", record(420, None, None, None)),
        ("large", record(700, None, None, None)),
        ("medium", record(500, None, None, None)),
    ]);
    let best = HashMap::from([
        ("small".to_string(), tick_best("u-top", 400)),
        ("large".to_string(), tick_best("u-top", 450)),
        ("medium".to_string(), tick_best("u-top", 410)),
    ]);
    let opportunities = compute_tick_opportunities(&snap, &best, &HashMap::new());
    assert_eq!(opportunities.len(), 3);
    for pair in opportunities.windows(2) {
        assert!(pair[0].diff >= pair[1].diff);
    }
    assert_eq!(opportunities[0].code, "large");
}

#[test]
fn tick_percentage_has_one_decimal() {
    let snap = snapshot(vec![("abc", record(500, None, None, None))]);
    let best = HashMap::from([("abc".to_string(), tick_best("u-top", 400))]);
    let opportunities = compute_tick_opportunities(&snap, &best, &HashMap::new());
    assert_eq!(opportunities[0].pct, "20.0");
}

#[test]
fn tick_opportunity_carries_board_position_when_listed() {
    let snap = snapshot(vec![("abc", record(500, None, None, None))]);
    let best = HashMap::from([("abc".to_string(), tick_best("u-top", 400))]);
    let runs = vec![
        LeaderboardRun {
            user_id: "u-top".to_string(),
            user_name: "Top".to_string(),
            ticks: 400,
        },
        LeaderboardRun {
            user_id: "u-mid".to_string(),
            user_name: "Mid".to_string(),
            ticks: 450,
        },
        LeaderboardRun {
            user_id: YOU.to_string(),
            user_name: "Rook".to_string(),
            ticks: 500,
        },
    ];
    let leaderboards = HashMap::from([("abc".to_string(), runs)]);
    let opportunities = compute_tick_opportunities(&snap, &best, &leaderboards);
    assert_eq!(opportunities[0].board_rank, Some(3));

    let unlisted = compute_tick_opportunities(&snap, &best, &HashMap::new());
    assert_eq!(unlisted[0].board_rank, None);
}

#[test]
fn totals_use_per_room_minimum() {
    let snap = snapshot(vec![
        ("one", record(100, None, None, None)),
        ("two", record(200, None, None, None)),
    ]);
    let best = HashMap::from([("one".to_string(), tick_best("u-top", 90))]);
    let totals = compute_tick_totals(&snap, &best);
    assert_eq!(totals.total, 300);
    assert_eq!(totals.min_theoretical, 290);
    assert_eq!(totals.possible_gain, 10);
}

#[test]
fn totals_cover_ignored_rooms_too() {
    let snap = snapshot(vec![
        ("abc", record(100, None, None, None)),
        ("fxmas", record(50, None, None, None)),
    ]);
    let best = HashMap::from([("fxmas".to_string(), tick_best("u-top", 40))]);
    let totals = compute_tick_totals(&snap, &best);
    assert_eq!(totals.total, 150);
    assert_eq!(totals.min_theoretical, 140);
    assert_eq!(totals.possible_gain, 10);
}

#[test]
fn equal_rank_with_faster_holder_yields_single_tick_kind() {
    let snap = snapshot(vec![("abc", record(500, Some(12), Some(420), None))]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([("abc".to_string(), rank_best("u-top", 12, Some(400)))]),
        floor: HashMap::new(),
    };
    let opportunities = compute_rank_opportunities(&snap, &highscores);
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0].kind, RankKind::Tick);
    assert_eq!(opportunities[0].diff, 0);
    assert_eq!(opportunities[0].your_rank_ticks, Some(420));
    assert_eq!(opportunities[0].best_rank_ticks, Some(400));
}

#[test]
fn equal_rank_with_equal_or_slower_holder_yields_nothing() {
    let snap = snapshot(vec![
        ("even", record(500, Some(12), Some(400), None)),
        ("ahead", record(500, Some(12), Some(380), None)),
    ]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([
            ("even".to_string(), rank_best("u-top", 12, Some(400))),
            ("ahead".to_string(), rank_best("u-top", 12, Some(400))),
        ]),
        floor: HashMap::new(),
    };
    let opportunities = compute_rank_opportunities(&snap, &highscores);
    assert!(opportunities.is_empty());
}

#[test]
fn rank_tiebreak_needs_ticks_on_both_sides() {
    let snap = snapshot(vec![
        ("no-yours", record(500, Some(12), None, None)),
        ("no-theirs", record(500, Some(12), Some(420), None)),
    ]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([
            ("no-yours".to_string(), rank_best("u-top", 12, Some(300))),
            ("no-theirs".to_string(), rank_best("u-top", 12, None)),
        ]),
        floor: HashMap::new(),
    };
    let opportunities = compute_rank_opportunities(&snap, &highscores);
    assert!(opportunities.is_empty());
}

#[test]
fn rank_above_recorded_best_is_left_alone() {
    let snap = snapshot(vec![("abc", record(500, Some(15), Some(420), None))]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([("abc".to_string(), rank_best("u-top", 12, Some(300)))]),
        floor: HashMap::new(),
    };
    let opportunities = compute_rank_opportunities(&snap, &highscores);
    assert!(opportunities.is_empty());
}

#[test]
fn rank_sort_puts_score_gaps_before_tick_tiebreaks() {
    let snap = snapshot(vec![
        ("score-small", record(500, Some(10), Some(400), None)),
        ("score-large", record(500, Some(7), Some(400), None)),
        ("tick-small", record(500, Some(12), Some(410), None)),
        ("tick-large", record(500, Some(12), Some(490), None)),
    ]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([
            ("score-small".to_string(), rank_best("u-top", 12, Some(400))),
            ("score-large".to_string(), rank_best("u-top", 12, Some(400))),
            ("tick-small".to_string(), rank_best("u-top", 12, Some(400))),
            ("tick-large".to_string(), rank_best("u-top", 12, Some(400))),
        ]),
        floor: HashMap::new(),
    };
    let opportunities = compute_rank_opportunities(&snap, &highscores);
    let codes: Vec<&str> = opportunities.iter().map(|o| o.code.as_str()).collect();
    assert_eq!(
        codes,
        vec!["score-large", "score-small", "tick-large", "tick-small"]
    );
}

#[test]
fn floor_defaults_to_zero_when_absent() {
    let snap = snapshot(vec![("abc", record(500, None, None, None))]);
    let highscores = RoomsHighscores {
        rank: HashMap::new(),
        floor: HashMap::from([("abc".to_string(), floor_best("u-top", Some(3)))]),
    };
    let opportunities = compute_floor_opportunities(&snap, &highscores);
    assert_eq!(opportunities.len(), 1);
    assert_eq!(opportunities[0].your_floor, 0);
    assert_eq!(opportunities[0].diff, 3);
}

#[test]
fn no_floor_opportunity_without_leaderboard_entry_or_gap() {
    let snap = snapshot(vec![
        ("missing", record(500, None, None, Some(2))),
        ("even", record(500, None, None, Some(4))),
        ("ahead", record(500, None, None, Some(6))),
    ]);
    let highscores = RoomsHighscores {
        rank: HashMap::new(),
        floor: HashMap::from([
            ("even".to_string(), floor_best("u-top", Some(4))),
            ("ahead".to_string(), floor_best("u-top", Some(5))),
        ]),
    };
    let opportunities = compute_floor_opportunities(&snap, &highscores);
    assert!(opportunities.is_empty());
}

#[test]
fn ignored_room_yields_nothing_in_any_category() {
    let snap = snapshot(vec![("fxmas", record(900, Some(1), Some(880), None))]);
    let best = HashMap::from([("fxmas".to_string(), tick_best("u-top", 100))]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([("fxmas".to_string(), rank_best("u-top", 9, Some(80)))]),
        floor: HashMap::from([("fxmas".to_string(), floor_best("u-top", Some(5)))]),
    };
    let report = build_report(&snap, &best, &HashMap::new(), &highscores);
    assert!(report.ticks.is_empty());
    assert!(report.ranks.is_empty());
    assert!(report.floors.is_empty());
}

#[test]
fn end_to_end_report_for_single_room() {
    let snap = snapshot(vec![("abc", record(500, Some(10), Some(420), None))]);
    let best = HashMap::from([("abc".to_string(), tick_best("u-top", 400))]);
    let highscores = RoomsHighscores {
        rank: HashMap::from([("abc".to_string(), rank_best("u-top", 12, Some(350)))]),
        floor: HashMap::from([("abc".to_string(), floor_best("u-top", Some(5)))]),
    };
    let report = build_report(&snap, &best, &HashMap::new(), &highscores);

    assert_eq!(report.ticks.len(), 1);
    assert_eq!(report.ticks[0].diff, 100);
    assert_eq!(report.ticks[0].pct, "20.0");

    assert_eq!(report.ranks.len(), 1);
    assert_eq!(report.ranks[0].kind, RankKind::Score);
    assert_eq!(report.ranks[0].diff, 2);

    assert_eq!(report.floors.len(), 1);
    assert_eq!(report.floors[0].your_floor, 0);
    assert_eq!(report.floors[0].diff, 5);

    assert_eq!(report.totals.total, 500);
    assert_eq!(report.totals.min_theoretical, 400);
    assert_eq!(report.totals.possible_gain, 100);
}
