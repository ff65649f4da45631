//! Derived dashboard configuration and the transform that builds it from
//! a raw [`PageConfig`].

use crate::types::{ColumnDef, PageConfig, TabConfig};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const PAUSE_RELEASE_ENDPOINT: &str = "/api/dashboard/pause-release";

/// Option shown by a control; `value` is what becomes control state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlOption {
    pub value: String,
    pub label: String,
}

/// Equality predicate of a visibility rule. Both fields may be set; each
/// one that is set must allow visibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRule {
    #[serde(default)]
    pub equals: Option<String>,
    #[serde(default)]
    pub not_equals: Option<String>,
}

/// Predicate over sibling control values deciding whether a control is
/// rendered. Sub-rules AND together: failing any included one hides the
/// control. Absence of a rule means always visible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityRule {
    #[serde(default)]
    pub toggle: Option<MatchRule>,
    #[serde(default)]
    pub radio: Option<MatchRule>,
}

/// A single configured control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlSpec {
    #[serde(default)]
    pub label: Option<String>,
    pub options: Vec<ControlOption>,
    pub default_value: String,
    #[serde(default)]
    pub visible_when: Option<VisibilityRule>,
}

impl ControlSpec {
    /// The value a freshly mounted tab starts with: the configured
    /// default, falling back to the first option.
    pub fn initial_value(&self) -> String {
        if !self.default_value.is_empty() {
            self.default_value.clone()
        } else {
            self.options
                .first()
                .map(|o| o.value.clone())
                .unwrap_or_default()
        }
    }
}

/// The controls a tab may carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlConfig {
    #[serde(default)]
    pub toggle: Option<ControlSpec>,
    #[serde(default)]
    pub dropdown: Option<ControlSpec>,
    #[serde(default)]
    pub radio: Option<ControlSpec>,
}

/// Fully-specified tab, derived from a [`TabConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedTabConfig {
    pub id: String,
    pub label: String,
    pub table: String,
    pub show_controls: bool,
    pub api_endpoint: String,
    /// Populated from the live API response, not from config.
    pub column_defs: Vec<ColumnDef>,
    pub controls: ControlConfig,
}

/// Configuration consumed by the dashboard engine. A pure transform of
/// the page config; replaced wholesale when the source changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    pub page_title: String,
    pub show_refresh_time: bool,
    #[serde(default)]
    pub pause_release_api_endpoint: Option<String>,
    pub show_batch_date: bool,
    pub show_pause_button: bool,
    pub tabs: Vec<ProcessedTabConfig>,
    pub active_tab: String,
}

/// Tab id: label lowercased with runs of whitespace collapsed to single
/// hyphens.
pub fn tab_slug(label: &str) -> String {
    label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Transform a page config into a dashboard config.
///
/// A missing page config is a valid, renderable state and yields the
/// minimal empty config. Two tab labels collapsing to the same slug is a
/// configuration error and is surfaced, never silently merged.
pub fn generate_dashboard_config(
    page_title: &str,
    page_config: Option<&PageConfig>,
) -> anyhow::Result<DashboardConfig> {
    let Some(config) = page_config else {
        return Ok(DashboardConfig {
            page_title: page_title.to_string(),
            show_refresh_time: true,
            pause_release_api_endpoint: None,
            show_batch_date: false,
            show_pause_button: false,
            tabs: Vec::new(),
            active_tab: String::new(),
        });
    };

    let tabs = generate_tabs(&config.tabs)?;
    let active_tab = tabs.first().map(|t| t.id.clone()).unwrap_or_default();

    Ok(DashboardConfig {
        page_title: page_title.to_string(),
        show_refresh_time: config.show_last_refreshed_date.unwrap_or(true),
        pause_release_api_endpoint: if tabs.is_empty() {
            None
        } else {
            Some(PAUSE_RELEASE_ENDPOINT.to_string())
        },
        show_batch_date: config.show_batch_date_picker.unwrap_or(false),
        show_pause_button: config.show_pause.unwrap_or(false),
        tabs,
        active_tab,
    })
}

fn generate_tabs(tabs: &[TabConfig]) -> anyhow::Result<Vec<ProcessedTabConfig>> {
    let mut seen = HashSet::new();
    let mut processed = Vec::with_capacity(tabs.len());
    for tab in tabs {
        let id = tab_slug(&tab.label);
        if !seen.insert(id.clone()) {
            bail!("duplicate tab id '{id}' generated from label '{}'", tab.label);
        }
        processed.push(ProcessedTabConfig {
            id,
            label: tab.label.clone(),
            table: tab.table.clone(),
            show_controls: tab.show_summary_detailed_view.unwrap_or(false),
            api_endpoint: format!(
                "/api/dashboard?table={}",
                urlencoding::encode(&tab.table)
            ),
            column_defs: Vec::new(),
            controls: generate_controls(tab),
        });
    }
    Ok(processed)
}

fn generate_controls(tab: &TabConfig) -> ControlConfig {
    let has_toggle = tab.show_summary_detailed_view.unwrap_or(false);
    let mut controls = ControlConfig::default();

    if has_toggle {
        controls.toggle = Some(ControlSpec {
            label: None,
            options: vec![
                ControlOption {
                    value: "summary".into(),
                    label: "Summary".into(),
                },
                ControlOption {
                    value: "detailed".into(),
                    label: "Detailed".into(),
                },
            ],
            default_value: "summary".into(),
            visible_when: None,
        });
    }

    if !tab.show_tenor_dropdown.is_empty() {
        controls.dropdown = Some(ControlSpec {
            label: None,
            options: tab
                .show_tenor_dropdown
                .iter()
                .map(|tenor| ControlOption {
                    value: tenor.clone(),
                    label: tenor.clone(),
                })
                .collect(),
            default_value: tab.show_tenor_dropdown[0].clone(),
            // The tenor dropdown only applies to the detailed view, so it
            // is tied to the toggle when one exists on this tab.
            visible_when: has_toggle.then(|| VisibilityRule {
                toggle: Some(MatchRule {
                    equals: Some("detailed".into()),
                    not_equals: None,
                }),
                radio: None,
            }),
        });
    }

    if !tab.show_view_by_options.is_empty() {
        controls.radio = Some(ControlSpec {
            label: Some("View By".into()),
            options: tab
                .show_view_by_options
                .iter()
                .map(|option| ControlOption {
                    value: format_view_by_value(option.value),
                    label: option.label.clone(),
                })
                .collect(),
            default_value: format_view_by_value(tab.show_view_by_options[0].value),
            visible_when: None,
        });
    }

    controls
}

/// Stringify a numeric view-by value the way the wire format reads it
/// back: integers without a fraction, everything else as-is.
fn format_view_by_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViewByOption;

    #[test]
    fn tab_slug_collapses_whitespace() {
        assert_eq!(tab_slug("Commitment Lines"), "commitment-lines");
        assert_eq!(tab_slug("  Spot   Utilization "), "spot-utilization");
        assert_eq!(tab_slug("Loans"), "loans");
    }

    #[test]
    fn view_by_values_stringify() {
        assert_eq!(format_view_by_value(100.0), "100");
        assert_eq!(format_view_by_value(0.1), "0.1");
        assert_eq!(format_view_by_value(0.00001), "0.00001");
    }

    #[test]
    fn duplicate_tab_slugs_are_an_error() {
        let config = PageConfig {
            tabs: vec![
                TabConfig {
                    label: "Spot Utilization".into(),
                    table: "a".into(),
                    ..Default::default()
                },
                TabConfig {
                    label: "spot   utilization".into(),
                    table: "b".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert!(generate_dashboard_config("Rates Dashboard", Some(&config)).is_err());
    }

    #[test]
    fn dropdown_rule_requires_toggle_on_same_tab() {
        let config = PageConfig {
            tabs: vec![TabConfig {
                label: "Loans".into(),
                table: "loans".into(),
                show_summary_detailed_view: None,
                show_tenor_dropdown: vec!["T+0".into(), "T+1".into()],
                show_view_by_options: vec![],
            }],
            ..Default::default()
        };
        let cfg = generate_dashboard_config("Rates Dashboard", Some(&config)).unwrap();
        let dropdown = cfg.tabs[0].controls.dropdown.as_ref().unwrap();
        assert!(dropdown.visible_when.is_none());
        assert_eq!(dropdown.default_value, "T+0");
    }

    #[test]
    fn endpoint_encodes_table_value() {
        let config = PageConfig {
            tabs: vec![TabConfig {
                label: "Loans".into(),
                table: "loan table".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let cfg = generate_dashboard_config("t", Some(&config)).unwrap();
        assert_eq!(cfg.tabs[0].api_endpoint, "/api/dashboard?table=loan%20table");
    }

    #[test]
    fn radio_default_falls_back_to_first_option() {
        let config = PageConfig {
            tabs: vec![TabConfig {
                label: "Loans".into(),
                table: "loans".into(),
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
                ..Default::default()
            }],
            ..Default::default()
        };
        let cfg = generate_dashboard_config("t", Some(&config)).unwrap();
        let radio = cfg.tabs[0].controls.radio.as_ref().unwrap();
        assert_eq!(radio.default_value, "100");
        assert_eq!(radio.initial_value(), "100");
    }
}
