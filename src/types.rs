use serde::{Deserialize, Serialize};

/// Profile returned by the `/me` endpoint. The shell only needs the
/// ad-group ids, but the full shape is kept for collaborators reading it
/// out of the shared state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub ad_groups: Vec<String>,
    #[serde(default)]
    pub ad_group_ids: Vec<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Root of the `/navigationConfig` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NavigationConfig {
    #[serde(default)]
    pub modules: Vec<NavigationModule>,
}

/// One navigation module. `module_code` is a unique, stable identifier;
/// a module with no pages is directly navigable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationModule {
    pub module_code: String,
    pub module_name: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub pages: Vec<NavigationPage>,
}

/// One page under a module. `page_name` doubles as the business screen
/// name the registry keys on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigationPage {
    pub page_code: String,
    pub page_name: String,
    #[serde(default)]
    pub display_order: i64,
}

/// Per-page configuration from the `/pageConfig` endpoint. Field names
/// follow the backend's camelCase wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(default)]
    pub show_last_refreshed_date: Option<bool>,
    #[serde(default)]
    pub show_batch_date_picker: Option<bool>,
    #[serde(default)]
    pub show_pause: Option<bool>,
    #[serde(default)]
    pub tabs: Vec<TabConfig>,
}

/// Raw tab declaration inside a [`PageConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabConfig {
    pub label: String,
    pub table: String,
    #[serde(default)]
    pub show_summary_detailed_view: Option<bool>,
    #[serde(default)]
    pub show_tenor_dropdown: Vec<String>,
    #[serde(default)]
    pub show_view_by_options: Vec<ViewByOption>,
}

/// Radio option carried with a numeric value; the value is stringified
/// before it becomes control state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewByOption {
    pub label: String,
    pub value: f64,
}

/// Column definition delivered alongside dashboard rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub field: String,
    pub header_name: String,
    #[serde(default)]
    pub flex: Option<f32>,
}

/// Response of a dashboard tab data fetch: opaque rows plus the column
/// defs the grid should render them with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardData {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

/// Body of the pause/release mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PauseReleaseRequest {
    pub action: PauseAction,
    pub timestamp: String,
    pub tab_id: String,
    #[serde(flatten)]
    pub params: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PauseAction {
    Pause,
    Release,
}

impl PauseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseAction::Pause => "pause",
            PauseAction::Release => "release",
        }
    }
}
