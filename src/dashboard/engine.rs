//! Dashboard engine: the configuration-driven state machine behind one
//! mounted dashboard instance.
//!
//! State is the cross product of the active tab index and that tab's
//! control values, plus a batch date and pause flag shared across tabs.
//! Control state is per-tab and is discarded on navigation away: coming
//! back to a tab reinitializes it from its configured defaults.

use crate::api::{ApiClient, QueryParams};
use crate::dashboard::config::{
    ControlSpec, DashboardConfig, ProcessedTabConfig, VisibilityRule,
};
use crate::types::{PauseAction, PauseReleaseRequest};
use chrono::{Local, NaiveDate, Utc};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Current control values of the active tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabState {
    pub radio_value: String,
    pub toggle_value: String,
    pub dropdown_value: String,
}

impl TabState {
    /// Initial state for a tab: each control's configured default,
    /// falling back to its first option, falling back to empty when the
    /// control is absent.
    pub fn for_tab(tab: &ProcessedTabConfig) -> Self {
        fn initial(control: Option<&ControlSpec>) -> String {
            control.map(ControlSpec::initial_value).unwrap_or_default()
        }
        Self {
            radio_value: initial(tab.controls.radio.as_ref()),
            toggle_value: initial(tab.controls.toggle.as_ref()),
            dropdown_value: initial(tab.controls.dropdown.as_ref()),
        }
    }
}

/// Evaluate a visibility rule against the current tab state. A missing
/// rule means visible; included sub-rules all have to allow visibility.
pub fn control_visible(rule: Option<&VisibilityRule>, state: &TabState) -> bool {
    let Some(rule) = rule else {
        return true;
    };
    if let Some(toggle) = &rule.toggle {
        if let Some(equals) = &toggle.equals {
            if &state.toggle_value != equals {
                return false;
            }
        }
        if let Some(not_equals) = &toggle.not_equals {
            if &state.toggle_value == not_equals {
                return false;
            }
        }
    }
    if let Some(radio) = &rule.radio {
        if let Some(equals) = &radio.equals {
            if &state.radio_value != equals {
                return false;
            }
        }
        if let Some(not_equals) = &radio.not_equals {
            if &state.radio_value == not_equals {
                return false;
            }
        }
    }
    true
}

enum PauseOutcome {
    Applied(PauseAction),
    Failed(String),
}

pub struct DashboardEngine {
    config: DashboardConfig,
    active_tab: usize,
    tab_state: TabState,
    batch_date: NaiveDate,
    paused: bool,
    pause_pending: bool,
    pause_tx: Sender<PauseOutcome>,
    pause_rx: Receiver<PauseOutcome>,
    grid_page: usize,
    selected_row: Option<usize>,
}

impl DashboardEngine {
    pub fn new(config: DashboardConfig) -> Self {
        let tab_state = config.tabs.first().map(TabState::for_tab).unwrap_or_default();
        let (pause_tx, pause_rx) = channel();
        Self {
            config,
            active_tab: 0,
            tab_state,
            batch_date: Local::now().date_naive(),
            paused: false,
            pause_pending: false,
            pause_tx,
            pause_rx,
            grid_page: 0,
            selected_row: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn active_tab_index(&self) -> usize {
        self.active_tab
    }

    pub fn active_tab(&self) -> Option<&ProcessedTabConfig> {
        self.config.tabs.get(self.active_tab)
    }

    pub fn tab_state(&self) -> &TabState {
        &self.tab_state
    }

    pub fn batch_date(&self) -> NaiveDate {
        self.batch_date
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause_pending(&self) -> bool {
        self.pause_pending
    }

    /// Switch to tab `index`, resetting all control values to that tab's
    /// own defaults. Out-of-range indices are ignored.
    pub fn select_tab(&mut self, index: usize) {
        let Some(tab) = self.config.tabs.get(index) else {
            return;
        };
        self.active_tab = index;
        self.tab_state = TabState::for_tab(tab);
        self.grid_page = 0;
        self.selected_row = None;
    }

    pub fn grid_page(&self) -> usize {
        self.grid_page
    }

    pub fn set_grid_page(&mut self, page: usize) {
        self.grid_page = page;
        self.selected_row = None;
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    /// Selecting the already selected row deselects it.
    pub fn toggle_row_selection(&mut self, row: usize) {
        self.selected_row = if self.selected_row == Some(row) {
            None
        } else {
            Some(row)
        };
    }

    /// Control-change transitions update exactly one value each.
    pub fn set_radio_value(&mut self, value: impl Into<String>) {
        self.tab_state.radio_value = value.into();
    }

    pub fn set_toggle_value(&mut self, value: impl Into<String>) {
        self.tab_state.toggle_value = value.into();
    }

    pub fn set_dropdown_value(&mut self, value: impl Into<String>) {
        self.tab_state.dropdown_value = value.into();
    }

    pub fn set_batch_date(&mut self, date: Option<NaiveDate>) {
        self.batch_date = date.unwrap_or_else(|| Local::now().date_naive());
    }

    /// Derived query parameters for the active tab, in a stable order.
    pub fn query_params(&self) -> QueryParams {
        let mut params = Vec::new();
        if let Some(tab) = self.active_tab() {
            params.push(("tabLabel".to_string(), tab.label.clone()));
            params.push(("table".to_string(), tab.table.clone()));
        }
        if !self.tab_state.radio_value.is_empty() {
            params.push(("viewBy".to_string(), self.tab_state.radio_value.clone()));
        }
        if !self.tab_state.toggle_value.is_empty() {
            params.push(("view".to_string(), self.tab_state.toggle_value.clone()));
        }
        if !self.tab_state.dropdown_value.is_empty() {
            params.push(("timeframe".to_string(), self.tab_state.dropdown_value.clone()));
        }
        params.push((
            "batchDate".to_string(),
            self.batch_date.format("%Y-%m-%d").to_string(),
        ));
        params
    }

    /// Cache key for the active tab's data fetch. Any change to the tab
    /// or a derived parameter yields a new key; identical keys are served
    /// from cache.
    pub fn query_key(&self) -> String {
        let tab_id = self.active_tab().map(|t| t.id.as_str()).unwrap_or("");
        let mut key = format!("dashboard/{tab_id}");
        for (name, value) in self.query_params() {
            key.push('?');
            key.push_str(&name);
            key.push('=');
            key.push_str(&value);
        }
        key
    }

    /// Whether a control of the active tab is visible under the current
    /// state snapshot.
    pub fn is_visible(&self, control: Option<&ControlSpec>) -> bool {
        control
            .map(|c| control_visible(c.visible_when.as_ref(), &self.tab_state))
            .unwrap_or(false)
    }

    /// The action the pause button would submit next.
    pub fn next_pause_action(&self) -> PauseAction {
        if self.paused {
            PauseAction::Release
        } else {
            PauseAction::Pause
        }
    }

    /// Kick off the pause/release mutation on a worker thread. On success
    /// the local flag flips to match the action; on failure it is left
    /// unchanged and the failure is logged, never surfaced as blocking.
    pub fn submit_pause_release(&mut self, api: Arc<dyn ApiClient>) {
        if self.pause_pending {
            return;
        }
        let Some(tab) = self.active_tab() else {
            return;
        };
        let action = self.next_pause_action();
        let endpoint = self
            .config
            .pause_release_api_endpoint
            .clone()
            .unwrap_or_else(|| crate::dashboard::config::PAUSE_RELEASE_ENDPOINT.to_string());
        let request = PauseReleaseRequest {
            action,
            timestamp: Utc::now().to_rfc3339(),
            tab_id: tab.id.clone(),
            params: self.query_params().into_iter().collect(),
        };
        self.pause_pending = true;
        let tx = self.pause_tx.clone();
        std::thread::spawn(move || {
            let outcome = match api.pause_release(&endpoint, &request) {
                Ok(()) => PauseOutcome::Applied(action),
                Err(err) => PauseOutcome::Failed(format!("{err:#}")),
            };
            let _ = tx.send(outcome);
        });
    }

    /// Apply any finished pause/release mutation. Called once per frame.
    pub fn poll_pause_release(&mut self) {
        while let Ok(outcome) = self.pause_rx.try_recv() {
            self.pause_pending = false;
            match outcome {
                PauseOutcome::Applied(action) => {
                    self.paused = action == PauseAction::Pause;
                    tracing::info!(action = action.as_str(), "pause/release applied");
                }
                PauseOutcome::Failed(err) => {
                    tracing::warn!(error = %err, "pause/release failed, state unchanged");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::config::{generate_dashboard_config, MatchRule};
    use crate::types::{PageConfig, TabConfig, ViewByOption};

    fn two_tab_config() -> DashboardConfig {
        let page = PageConfig {
            show_batch_date_picker: Some(true),
            show_pause: Some(true),
            tabs: vec![
                TabConfig {
                    label: "Loans".into(),
                    table: "loans".into(),
                    show_summary_detailed_view: Some(true),
                    show_tenor_dropdown: vec!["T+0".into(), "T+1".into()],
                    show_view_by_options: vec![
                        ViewByOption {
                            label: "Percentage".into(),
                            value: 100.0,
                        },
                        ViewByOption {
                            label: "BPS".into(),
                            value: 0.1,
                        },
                    ],
                },
                TabConfig {
                    label: "Deposits".into(),
                    table: "deposits".into(),
                    show_summary_detailed_view: Some(true),
                    show_tenor_dropdown: vec![],
                    show_view_by_options: vec![ViewByOption {
                        label: "Percentage".into(),
                        value: 100.0,
                    }],
                },
            ],
            ..Default::default()
        };
        generate_dashboard_config("Rates Dashboard", Some(&page)).unwrap()
    }

    #[test]
    fn initial_state_uses_tab_defaults() {
        let engine = DashboardEngine::new(two_tab_config());
        assert_eq!(engine.active_tab_index(), 0);
        assert_eq!(engine.tab_state().toggle_value, "summary");
        assert_eq!(engine.tab_state().dropdown_value, "T+0");
        assert_eq!(engine.tab_state().radio_value, "100");
        assert!(!engine.is_paused());
    }

    #[test]
    fn tab_switch_resets_control_state() {
        let mut engine = DashboardEngine::new(two_tab_config());
        engine.set_radio_value("0.1");
        engine.set_toggle_value("detailed");
        engine.select_tab(1);
        assert_eq!(engine.tab_state().radio_value, "100");
        assert_eq!(engine.tab_state().toggle_value, "summary");
        // No memory of the earlier visit.
        engine.select_tab(0);
        assert_eq!(engine.tab_state().radio_value, "100");
        assert_eq!(engine.tab_state().toggle_value, "summary");
    }

    #[test]
    fn control_change_touches_only_that_value() {
        let mut engine = DashboardEngine::new(two_tab_config());
        engine.set_dropdown_value("T+1");
        assert_eq!(engine.tab_state().dropdown_value, "T+1");
        assert_eq!(engine.tab_state().toggle_value, "summary");
        assert_eq!(engine.tab_state().radio_value, "100");
        assert_eq!(engine.active_tab_index(), 0);
    }

    #[test]
    fn visibility_follows_toggle_value() {
        let mut engine = DashboardEngine::new(two_tab_config());
        let dropdown = engine.active_tab().unwrap().controls.dropdown.clone();
        assert!(!engine.is_visible(dropdown.as_ref()));
        engine.set_toggle_value("detailed");
        assert!(engine.is_visible(dropdown.as_ref()));
    }

    #[test]
    fn and_semantics_across_rule_fields() {
        let rule = VisibilityRule {
            toggle: Some(MatchRule {
                equals: Some("detailed".into()),
                not_equals: None,
            }),
            radio: Some(MatchRule {
                equals: None,
                not_equals: Some("0.1".into()),
            }),
        };
        let mut state = TabState {
            toggle_value: "detailed".into(),
            radio_value: "100".into(),
            dropdown_value: String::new(),
        };
        assert!(control_visible(Some(&rule), &state));
        state.radio_value = "0.1".into();
        assert!(!control_visible(Some(&rule), &state));
        state.radio_value = "100".into();
        state.toggle_value = "summary".into();
        assert!(!control_visible(Some(&rule), &state));
    }

    #[test]
    fn query_key_tracks_controls_and_date() {
        let mut engine = DashboardEngine::new(two_tab_config());
        let initial = engine.query_key();
        engine.set_dropdown_value("T+1");
        let after_dropdown = engine.query_key();
        assert_ne!(initial, after_dropdown);
        engine.set_batch_date(NaiveDate::from_ymd_opt(2026, 8, 20));
        assert_ne!(after_dropdown, engine.query_key());
        assert!(engine.query_key().contains("batchDate=2026-08-20"));
        // Unchanged state yields the identical key.
        assert_eq!(engine.query_key(), engine.query_key());
    }

    #[test]
    fn query_params_skip_absent_controls() {
        let page = PageConfig {
            tabs: vec![TabConfig {
                label: "Spot Utilization".into(),
                table: "spot".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let config = generate_dashboard_config("t", Some(&page)).unwrap();
        let engine = DashboardEngine::new(config);
        let params = engine.query_params();
        assert!(params.iter().all(|(k, _)| k != "viewBy" && k != "view" && k != "timeframe"));
        assert!(params.iter().any(|(k, _)| k == "batchDate"));
    }

    #[test]
    fn tab_switch_resets_grid_state() {
        let mut engine = DashboardEngine::new(two_tab_config());
        engine.set_grid_page(3);
        engine.toggle_row_selection(7);
        assert_eq!(engine.selected_row(), Some(7));
        engine.toggle_row_selection(7);
        assert_eq!(engine.selected_row(), None);
        engine.toggle_row_selection(7);
        engine.select_tab(1);
        assert_eq!(engine.grid_page(), 0);
        assert_eq!(engine.selected_row(), None);
    }

    struct FlakyApi {
        ok: bool,
    }

    impl crate::api::ApiClient for FlakyApi {
        fn user_profile(&self) -> anyhow::Result<crate::types::UserProfile> {
            unreachable!()
        }
        fn navigation_config(&self) -> anyhow::Result<crate::types::NavigationConfig> {
            unreachable!()
        }
        fn page_config(
            &self,
            _: &str,
            _: &str,
        ) -> anyhow::Result<crate::types::PageConfig> {
            unreachable!()
        }
        fn dashboard_data(
            &self,
            _: &str,
            _: &crate::api::QueryParams,
        ) -> anyhow::Result<crate::types::DashboardData> {
            unreachable!()
        }
        fn pause_release(
            &self,
            _: &str,
            _: &PauseReleaseRequest,
        ) -> anyhow::Result<()> {
            if self.ok {
                Ok(())
            } else {
                anyhow::bail!("mutation rejected")
            }
        }
    }

    fn settle(engine: &mut DashboardEngine) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        while engine.pause_pending() && std::time::Instant::now() < deadline {
            engine.poll_pause_release();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        engine.poll_pause_release();
    }

    #[test]
    fn pause_success_flips_flag() {
        let mut engine = DashboardEngine::new(two_tab_config());
        engine.submit_pause_release(Arc::new(FlakyApi { ok: true }));
        settle(&mut engine);
        assert!(engine.is_paused());
        assert_eq!(engine.next_pause_action(), PauseAction::Release);
    }

    #[test]
    fn pause_failure_leaves_flag_unchanged() {
        let mut engine = DashboardEngine::new(two_tab_config());
        engine.submit_pause_release(Arc::new(FlakyApi { ok: false }));
        settle(&mut engine);
        assert!(!engine.is_paused());
        assert_eq!(engine.next_pause_action(), PauseAction::Pause);
    }
}
