use crate::api::DisplayError;
use crate::input::Action;
use crate::model::{ResourceKind, RowData, TableData, count_label};
use chrono::Local;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    RefreshAll,
    ExportReport,
}

/// Result of one loader finishing inside a refresh cycle. The generation
/// lets the app discard responses that a newer cycle has superseded.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub kind: ResourceKind,
    pub generation: u64,
    pub result: Result<TableData, DisplayError>,
}

pub struct App {
    running: bool,
    mode: InputMode,
    tabs: Vec<ResourceKind>,
    active_tab_index: usize,
    tables: HashMap<ResourceKind, TableData>,
    filters: HashMap<ResourceKind, String>,
    input: String,
    filter_before_edit: String,
    status: String,
    show_help: bool,
    pending_g: bool,
    generation: u64,
    issued: HashMap<ResourceKind, u64>,
    table_page_size: usize,
    backend_url: String,
    refresh_secs: u64,
}

impl App {
    pub fn new(backend_url: String, refresh_secs: u64) -> Self {
        let tabs = ResourceKind::ALL.to_vec();
        let tables = tabs
            .iter()
            .copied()
            .map(|kind| (kind, TableData::default()))
            .collect::<HashMap<_, _>>();
        let filters = tabs
            .iter()
            .copied()
            .map(|kind| (kind, String::new()))
            .collect::<HashMap<_, _>>();

        Self {
            running: true,
            mode: InputMode::Normal,
            tabs,
            active_tab_index: 0,
            tables,
            filters,
            input: String::new(),
            filter_before_edit: String::new(),
            status: "Ready".to_string(),
            show_help: false,
            pending_g: false,
            generation: 0,
            issued: HashMap::new(),
            table_page_size: 10,
            backend_url,
            refresh_secs,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn tabs(&self) -> &[ResourceKind] {
        &self.tabs
    }

    pub fn active_tab(&self) -> ResourceKind {
        self.tabs[self.active_tab_index]
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn refresh_secs(&self) -> u64 {
        self.refresh_secs
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn filter_for(&self, kind: ResourceKind) -> &str {
        self.filters.get(&kind).map(String::as_str).unwrap_or("")
    }

    pub fn active_filter(&self) -> &str {
        self.filter_for(self.active_tab())
    }

    pub fn set_table_page_size(&mut self, rows: usize) {
        self.table_page_size = rows.max(1);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = normalize_status_text(status.into());
    }

    /// Marks every table as in flight under a fresh generation. Returns
    /// the generation the spawned cycle must stamp on its outcomes.
    pub fn begin_refresh_cycle(&mut self) -> u64 {
        self.generation += 1;
        for kind in ResourceKind::ALL {
            self.issued.insert(kind, self.generation);
            if let Some(table) = self.tables.get_mut(&kind) {
                table.loading = true;
            }
        }
        self.status = "Refreshing pods, services, events…".to_string();
        self.generation
    }

    /// Applies a loader outcome unless a newer cycle has been issued for
    /// the same kind, in which case the stale response is dropped.
    pub fn apply_refresh_outcome(&mut self, outcome: RefreshOutcome) {
        let newest = self.issued.get(&outcome.kind).copied().unwrap_or(0);
        if outcome.generation < newest {
            return;
        }

        match outcome.result {
            Ok(mut table) => {
                let previous_selected = self
                    .tables
                    .get(&outcome.kind)
                    .map(|existing| existing.selected)
                    .unwrap_or(0);
                table.selected = previous_selected.min(table.rows.len().saturating_sub(1));
                self.tables.insert(outcome.kind, table);
                self.status = format!("{} updated", outcome.kind.title());
            }
            Err(error) => {
                if let Some(table) = self.tables.get_mut(&outcome.kind) {
                    table.set_error(error.message(), Local::now());
                }
                self.status = normalize_status_text(format!(
                    "{} refresh failed: {}",
                    outcome.kind.title(),
                    error.message()
                ));
            }
        }
    }

    pub fn table_for(&self, kind: ResourceKind) -> Option<&TableData> {
        self.tables.get(&kind)
    }

    /// Tables in tab order, for the report exporter.
    pub fn export_tables(&self) -> Vec<(ResourceKind, &TableData)> {
        self.tabs
            .iter()
            .filter_map(|kind| self.tables.get(kind).map(|table| (*kind, table)))
            .collect()
    }

    pub fn active_headers(&self) -> Vec<String> {
        self.tables
            .get(&self.active_tab())
            .map(|table| table.headers.clone())
            .unwrap_or_default()
    }

    /// The filter is a pure projection over the cached rows; the cache is
    /// never mutated by filtering.
    pub fn visible_rows_for(&self, kind: ResourceKind) -> Vec<&RowData> {
        let Some(table) = self.tables.get(&kind) else {
            return Vec::new();
        };
        let filter = self.filter_for(kind);
        table
            .rows
            .iter()
            .filter(|row| row.matches_filter(filter))
            .collect()
    }

    pub fn active_visible_rows(&self) -> Vec<&RowData> {
        self.visible_rows_for(self.active_tab())
    }

    /// Count label for the active tab, reflecting the filtered view.
    pub fn active_count_label(&self) -> String {
        count_label(self.active_tab(), self.active_visible_rows().len())
    }

    pub fn active_selected_index(&self) -> Option<usize> {
        let visible_len = self.active_visible_rows().len();
        if visible_len == 0 {
            return None;
        }
        let table = self.tables.get(&self.active_tab())?;
        Some(table.selected.min(visible_len.saturating_sub(1)))
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if !matches!(action, Action::GPrefix) {
            self.pending_g = false;
        }
        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
        }

        match self.mode {
            InputMode::Normal => self.apply_normal_action(action),
            InputMode::Filter => self.apply_filter_action(action),
        }
    }

    fn apply_normal_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::NextTab => {
                self.switch_tab_by_offset(1);
                AppCommand::None
            }
            Action::PrevTab => {
                self.switch_tab_by_offset(-1);
                AppCommand::None
            }
            Action::SwitchTab(number) => {
                let index = number.saturating_sub(1) as usize;
                if index < self.tabs.len() {
                    self.active_tab_index = index;
                    self.status = format!("Switched to {}", self.active_tab().title());
                }
                AppCommand::None
            }
            Action::Down => {
                self.move_selection(1);
                AppCommand::None
            }
            Action::Up => {
                self.move_selection(-1);
                AppCommand::None
            }
            Action::PageDown => {
                self.move_selection(self.table_page_size as isize);
                AppCommand::None
            }
            Action::PageUp => {
                self.move_selection(-(self.table_page_size as isize));
                AppCommand::None
            }
            Action::Bottom => {
                self.select_last();
                AppCommand::None
            }
            Action::GPrefix => {
                if self.pending_g {
                    self.pending_g = false;
                    self.select_first();
                } else {
                    self.pending_g = true;
                }
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::Refresh => {
                self.status = "Manual refresh requested".to_string();
                AppCommand::RefreshAll
            }
            Action::StartFilter => {
                self.mode = InputMode::Filter;
                self.input = self.active_filter().to_string();
                self.filter_before_edit = self.input.clone();
                self.status = format!("Filtering {}", self.active_tab().title());
                AppCommand::None
            }
            Action::ExportReport => AppCommand::ExportReport,
            Action::ClearFilter => {
                if !self.active_filter().is_empty() {
                    let kind = self.active_tab();
                    self.filters.insert(kind, String::new());
                    self.status = format!("Cleared {} filter", kind.title());
                }
                AppCommand::None
            }
            _ => AppCommand::None,
        }
    }

    fn apply_filter_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::InputChar(c) => {
                self.input.push(c);
                self.apply_live_filter();
            }
            Action::Backspace => {
                self.input.pop();
                self.apply_live_filter();
            }
            Action::DeleteWord => {
                while self.input.ends_with(' ') {
                    self.input.pop();
                }
                while !self.input.ends_with(' ') && !self.input.is_empty() {
                    self.input.pop();
                }
                self.apply_live_filter();
            }
            Action::SubmitInput => {
                self.mode = InputMode::Normal;
                self.status = if self.input.is_empty() {
                    "Filter cleared".to_string()
                } else {
                    format!("Filter applied: '{}'", self.input)
                };
                self.input.clear();
            }
            Action::CancelInput => {
                let restored = self.filter_before_edit.clone();
                self.filters.insert(self.active_tab(), restored);
                self.mode = InputMode::Normal;
                self.input.clear();
                self.status = "Filter edit cancelled".to_string();
            }
            _ => {}
        }
        AppCommand::None
    }

    /// No debounce: every keystroke re-applies the filter immediately.
    fn apply_live_filter(&mut self) {
        let kind = self.active_tab();
        self.filters.insert(kind, self.input.clone());
    }

    fn switch_tab_by_offset(&mut self, offset: isize) {
        let len = self.tabs.len() as isize;
        let next = (self.active_tab_index as isize + offset).rem_euclid(len);
        self.active_tab_index = next as usize;
        self.status = format!("Switched to {}", self.active_tab().title());
    }

    fn move_selection(&mut self, delta: isize) {
        let visible_len = self.active_visible_rows().len();
        let Some(table) = self.tables.get_mut(&self.active_tab()) else {
            return;
        };
        if visible_len == 0 {
            table.selected = 0;
            return;
        }
        let max_index = visible_len.saturating_sub(1) as isize;
        let current = table.selected.min(max_index as usize) as isize;
        table.selected = (current + delta).clamp(0, max_index) as usize;
    }

    fn select_first(&mut self) {
        if let Some(table) = self.tables.get_mut(&self.active_tab()) {
            table.selected = 0;
        }
    }

    fn select_last(&mut self) {
        let visible_len = self.active_visible_rows().len();
        if let Some(table) = self.tables.get_mut(&self.active_tab()) {
            table.selected = visible_len.saturating_sub(1);
        }
    }
}

fn normalize_status_text(status: String) -> String {
    const MAX_STATUS_LEN: usize = 180;
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }
    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, InputMode, RefreshOutcome};
    use crate::api::DisplayError;
    use crate::input::Action;
    use crate::model::{Records, ResourceKind, TableData};
    use crate::render::table_rows;
    use chrono::Local;

    fn app() -> App {
        App::new("http://backend:8000".to_string(), 60)
    }

    fn pods_table(names: &[&str]) -> TableData {
        let records = Records::Pods(
            names
                .iter()
                .map(|name| crate::model::Pod {
                    namespace: Some("default".to_string()),
                    name: Some(name.to_string()),
                    pod_ip: Some("10.0.0.1".to_string()),
                })
                .collect(),
        );
        let (headers, rows) = table_rows(&records);
        let mut table = TableData::default();
        table.set_rows(headers, rows, records, Local::now());
        table
    }

    fn load_pods(app: &mut App, generation: u64, names: &[&str]) {
        app.apply_refresh_outcome(RefreshOutcome {
            kind: ResourceKind::Pods,
            generation,
            result: Ok(pods_table(names)),
        });
    }

    #[test]
    fn tabs_cycle_with_wraparound() {
        let mut app = app();
        assert_eq!(app.active_tab(), ResourceKind::Pods);
        app.apply_action(Action::NextTab);
        assert_eq!(app.active_tab(), ResourceKind::Services);
        app.apply_action(Action::PrevTab);
        app.apply_action(Action::PrevTab);
        assert_eq!(app.active_tab(), ResourceKind::Events);
    }

    #[test]
    fn digit_switches_directly_to_tab() {
        let mut app = app();
        app.apply_action(Action::SwitchTab(3));
        assert_eq!(app.active_tab(), ResourceKind::Events);
        app.apply_action(Action::SwitchTab(9));
        assert_eq!(app.active_tab(), ResourceKind::Events);
    }

    #[test]
    fn refresh_action_requests_full_cycle() {
        let mut app = app();
        assert_eq!(app.apply_action(Action::Refresh), AppCommand::RefreshAll);
    }

    #[test]
    fn filter_keystrokes_apply_immediately() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        load_pods(&mut app, generation, &["api-0", "worker-1"]);

        app.apply_action(Action::StartFilter);
        assert_eq!(app.mode(), InputMode::Filter);
        for c in "api".chars() {
            app.apply_action(Action::InputChar(c));
        }
        assert_eq!(app.active_filter(), "api");
        assert_eq!(app.active_visible_rows().len(), 1);

        app.apply_action(Action::SubmitInput);
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.active_filter(), "api");
    }

    #[test]
    fn cancelled_filter_edit_restores_previous_query() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        load_pods(&mut app, generation, &["api-0", "worker-1"]);

        app.apply_action(Action::StartFilter);
        for c in "worker".chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput);

        app.apply_action(Action::StartFilter);
        app.apply_action(Action::Backspace);
        app.apply_action(Action::InputChar('x'));
        app.apply_action(Action::CancelInput);
        assert_eq!(app.active_filter(), "worker");
    }

    #[test]
    fn escape_clears_active_filter_only() {
        let mut app = app();
        app.apply_action(Action::StartFilter);
        app.apply_action(Action::InputChar('a'));
        app.apply_action(Action::SubmitInput);
        app.apply_action(Action::NextTab);
        app.apply_action(Action::StartFilter);
        app.apply_action(Action::InputChar('b'));
        app.apply_action(Action::SubmitInput);

        app.apply_action(Action::ClearFilter);
        assert_eq!(app.filter_for(ResourceKind::Services), "");
        assert_eq!(app.filter_for(ResourceKind::Pods), "a");
    }

    #[test]
    fn filtering_never_mutates_the_cache() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        load_pods(&mut app, generation, &["api-0", "worker-1"]);

        app.apply_action(Action::StartFilter);
        app.apply_action(Action::InputChar('z'));
        assert!(app.active_visible_rows().is_empty());
        let table = app.table_for(ResourceKind::Pods).expect("table");
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn count_label_reflects_filtered_view() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        load_pods(&mut app, generation, &["api-0", "api-1", "worker-1"]);
        assert_eq!(app.active_count_label(), "Total: 3 pods");

        app.apply_action(Action::StartFilter);
        for c in "worker".chars() {
            app.apply_action(Action::InputChar(c));
        }
        assert_eq!(app.active_count_label(), "Total: 1 pod");

        app.apply_action(Action::Backspace);
        app.apply_action(Action::InputChar('z'));
        assert_eq!(app.active_count_label(), "No pods");
    }

    #[test]
    fn stale_refresh_outcome_is_discarded() {
        let mut app = app();
        let first = app.begin_refresh_cycle();
        let second = app.begin_refresh_cycle();

        load_pods(&mut app, second, &["fresh"]);
        load_pods(&mut app, first, &["stale-0", "stale-1"]);

        let table = app.table_for(ResourceKind::Pods).expect("table");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].name, "fresh");
    }

    #[test]
    fn refresh_cycle_marks_every_table_loading() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        for kind in ResourceKind::ALL {
            assert!(app.table_for(kind).expect("table").loading);
        }
        load_pods(&mut app, generation, &["api-0"]);
        assert!(!app.table_for(ResourceKind::Pods).expect("table").loading);
        assert!(app.table_for(ResourceKind::Services).expect("table").loading);
    }

    #[test]
    fn failures_are_isolated_per_resource() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        load_pods(&mut app, generation, &["api-0"]);
        app.apply_refresh_outcome(RefreshOutcome {
            kind: ResourceKind::Events,
            generation,
            result: Err(DisplayError::new("boom")),
        });

        let events = app.table_for(ResourceKind::Events).expect("table");
        assert_eq!(events.error.as_deref(), Some("boom"));
        let pods = app.table_for(ResourceKind::Pods).expect("table");
        assert!(pods.error.is_none());
        assert_eq!(pods.rows.len(), 1);
    }

    #[test]
    fn reload_replaces_cache_and_filter_reapplies() {
        let mut app = app();
        let first = app.begin_refresh_cycle();
        load_pods(&mut app, first, &["api-0", "worker-1"]);

        app.apply_action(Action::StartFilter);
        for c in "api".chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput);
        assert_eq!(app.active_visible_rows().len(), 1);

        let second = app.begin_refresh_cycle();
        load_pods(&mut app, second, &["api-0", "api-1", "worker-1"]);
        assert_eq!(app.active_visible_rows().len(), 2);
    }

    #[test]
    fn selection_clamps_to_visible_rows() {
        let mut app = app();
        let generation = app.begin_refresh_cycle();
        load_pods(&mut app, generation, &["a", "b", "c"]);

        app.apply_action(Action::Bottom);
        assert_eq!(app.active_selected_index(), Some(2));
        app.apply_action(Action::Down);
        assert_eq!(app.active_selected_index(), Some(2));
        app.apply_action(Action::GPrefix);
        app.apply_action(Action::GPrefix);
        assert_eq!(app.active_selected_index(), Some(0));
    }
}
