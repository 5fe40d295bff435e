use std::collections::VecDeque;

use crate::improvements::ImprovementsReport;
use crate::snapshot::{PlayerSnapshot, RoomRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Name,
    Ticks,
    Rank,
    Floor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprovementsTab {
    Tick,
    Rank,
    Floor,
}

impl ImprovementsTab {
    pub fn index(self) -> usize {
        match self {
            ImprovementsTab::Tick => 0,
            ImprovementsTab::Rank => 1,
            ImprovementsTab::Floor => 2,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ImprovementsTab::Tick => ImprovementsTab::Rank,
            ImprovementsTab::Rank => ImprovementsTab::Floor,
            ImprovementsTab::Floor => ImprovementsTab::Tick,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ImprovementsTab::Tick => ImprovementsTab::Floor,
            ImprovementsTab::Rank => ImprovementsTab::Tick,
            ImprovementsTab::Floor => ImprovementsTab::Rank,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImprovementsTab::Tick => "Tick",
            ImprovementsTab::Rank => "Rank",
            ImprovementsTab::Floor => "Floor",
        }
    }
}

/// The improvements popup lifecycle. A second trigger is rejected while
/// Loading, and results are only accepted while Loading, so a dismissed
/// popup cannot come back on a stale delta.
#[derive(Debug, Clone)]
pub enum ImprovementsFlow {
    Idle,
    Loading,
    Displayed(ImprovementsReport),
    Failed { message: String },
}

impl ImprovementsFlow {
    pub fn popup_open(&self) -> bool {
        !matches!(self, ImprovementsFlow::Idle)
    }
}

/// One line of the rooms table; the display name is resolved once when
/// the snapshot lands.
#[derive(Debug, Clone)]
pub struct RoomRow {
    pub code: String,
    pub name: String,
    pub record: RoomRecord,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot: Option<PlayerSnapshot>,
    pub rows: Vec<RoomRow>,
    pub sort: SortMode,
    pub selected: usize,
    pub flow: ImprovementsFlow,
    pub tab: ImprovementsTab,
    pub tab_selected: [usize; 3],
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            rows: Vec::new(),
            sort: SortMode::Ticks,
            selected: 0,
            flow: ImprovementsFlow::Idle,
            tab: ImprovementsTab::Tick,
            tab_selected: [0; 3],
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn set_snapshot(&mut self, snapshot: PlayerSnapshot) {
        self.rows = snapshot
            .rooms
            .iter()
            .map(|(code, record)| RoomRow {
                code: code.clone(),
                name: snapshot.room_name(code),
                record: record.clone(),
            })
            .collect();
        self.snapshot = Some(snapshot);
        self.sort_rows();
        self.clamp_selection();
    }

    pub fn cycle_sort(&mut self) {
        self.sort = match self.sort {
            SortMode::Name => SortMode::Ticks,
            SortMode::Ticks => SortMode::Rank,
            SortMode::Rank => SortMode::Floor,
            SortMode::Floor => SortMode::Name,
        };
        let selected_code = self.rows.get(self.selected).map(|row| row.code.clone());
        self.sort_rows();
        if let Some(code) = selected_code
            && let Some(pos) = self.rows.iter().position(|row| row.code == code)
        {
            self.selected = pos;
            return;
        }
        self.selected = 0;
    }

    pub fn sort_rows(&mut self) {
        use std::cmp::Ordering;
        match self.sort {
            SortMode::Name => self
                .rows
                .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code))),
            SortMode::Ticks => self.rows.sort_by(|a, b| {
                a.record
                    .ticks
                    .cmp(&b.record.ticks)
                    .then_with(|| a.code.cmp(&b.code))
            }),
            SortMode::Rank => self
                .rows
                .sort_by(|a, b| match (a.record.rank, b.record.rank) {
                    (Some(ra), Some(rb)) => rb.cmp(&ra).then_with(|| a.code.cmp(&b.code)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => a.code.cmp(&b.code),
                }),
            SortMode::Floor => self.rows.sort_by(|a, b| {
                b.record
                    .floor
                    .unwrap_or(0)
                    .cmp(&a.record.floor.unwrap_or(0))
                    .then_with(|| a.code.cmp(&b.code))
            }),
        }
    }

    pub fn select_next(&mut self) {
        let total = self.rows.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.rows.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.rows.len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    /// Move the rooms-table selection to a room by code. Returns false
    /// when the code is not in the snapshot.
    pub fn select_room(&mut self, code: &str) -> bool {
        if let Some(pos) = self.rows.iter().position(|row| row.code == code) {
            self.selected = pos;
            return true;
        }
        false
    }

    /// Enter Loading. Returns false (and changes nothing) when a fetch is
    /// already in flight.
    pub fn begin_improvements(&mut self) -> bool {
        if matches!(self.flow, ImprovementsFlow::Loading) {
            return false;
        }
        self.flow = ImprovementsFlow::Loading;
        self.tab = ImprovementsTab::Tick;
        self.tab_selected = [0; 3];
        true
    }

    /// Idempotent teardown: drop the report and reset the tab view, from
    /// any flow state.
    pub fn dismiss_improvements(&mut self) {
        self.flow = ImprovementsFlow::Idle;
        self.tab = ImprovementsTab::Tick;
        self.tab_selected = [0; 3];
    }

    pub fn set_tab(&mut self, tab: ImprovementsTab) {
        self.tab = tab;
    }

    pub fn cycle_tab(&mut self) {
        self.tab = self.tab.next();
    }

    pub fn cycle_tab_back(&mut self) {
        self.tab = self.tab.prev();
    }

    pub fn modal_len(&self) -> usize {
        let ImprovementsFlow::Displayed(report) = &self.flow else {
            return 0;
        };
        match self.tab {
            ImprovementsTab::Tick => report.ticks.len(),
            ImprovementsTab::Rank => report.ranks.len(),
            ImprovementsTab::Floor => report.floors.len(),
        }
    }

    pub fn modal_selected(&self) -> usize {
        self.tab_selected[self.tab.index()]
    }

    pub fn modal_select_next(&mut self) {
        let total = self.modal_len();
        let slot = &mut self.tab_selected[self.tab.index()];
        if total == 0 {
            *slot = 0;
            return;
        }
        *slot = (*slot + 1) % total;
    }

    pub fn modal_select_prev(&mut self) {
        let total = self.modal_len();
        let slot = &mut self.tab_selected[self.tab.index()];
        if total == 0 {
            *slot = 0;
            return;
        }
        if *slot == 0 {
            *slot = total - 1;
        } else {
            *slot -= 1;
        }
    }

    /// Room code under the cursor in the active tab, if any.
    pub fn modal_selected_code(&self) -> Option<String> {
        let ImprovementsFlow::Displayed(report) = &self.flow else {
            return None;
        };
        let idx = self.modal_selected();
        match self.tab {
            ImprovementsTab::Tick => report.ticks.get(idx).map(|o| o.code.clone()),
            ImprovementsTab::Rank => report.ranks.get(idx).map(|o| o.code.clone()),
            ImprovementsTab::Floor => report.floors.get(idx).map(|o| o.code.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SnapshotLoaded(PlayerSnapshot),
    SnapshotFailed { message: String },
    ImprovementsReady(ImprovementsReport),
    ImprovementsFailed { message: String },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    /// The snapshot travels with the command so the provider never
    /// reaches into shared state.
    FetchImprovements { snapshot: PlayerSnapshot },
    ReloadSnapshot,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SnapshotLoaded(snapshot) => {
            state.push_log(format!(
                "[INFO] Snapshot loaded: {} rooms for {}",
                snapshot.rooms.len(),
                snapshot.user_name
            ));
            state.set_snapshot(snapshot);
        }
        Delta::SnapshotFailed { message } => {
            state.push_log(format!("[WARN] Snapshot load failed: {message}"));
        }
        Delta::ImprovementsReady(report) => {
            if matches!(state.flow, ImprovementsFlow::Loading) {
                state.tab = ImprovementsTab::Tick;
                state.tab_selected = [0; 3];
                state.flow = ImprovementsFlow::Displayed(report);
            }
        }
        Delta::ImprovementsFailed { message } => {
            if matches!(state.flow, ImprovementsFlow::Loading) {
                state.flow = ImprovementsFlow::Failed { message };
            }
        }
        Delta::Log(message) => state.push_log(message),
    }
}
