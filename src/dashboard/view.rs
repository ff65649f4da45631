//! egui rendering of one dashboard instance: tab strip, controls, data
//! grid and the page-level actions (batch date, pause/release).

use crate::api::ApiClient;
use crate::dashboard::engine::DashboardEngine;
use crate::query::QueryCache;
use crate::types::{ColumnDef, DashboardData};
use chrono::{DateTime, Local};
use eframe::egui;
use egui_extras::{Column, DatePickerButton, TableBuilder};
use std::sync::Arc;

const ROW_HEIGHT: f32 = 22.0;
const HEADER_HEIGHT: f32 = 26.0;
const ROWS_PER_PAGE: usize = 25;

pub fn show(
    ui: &mut egui::Ui,
    engine: &mut DashboardEngine,
    data_cache: &QueryCache<DashboardData>,
    api: &Arc<dyn ApiClient>,
) {
    engine.poll_pause_release();

    ui.heading(&engine.config().page_title);
    ui.add_space(4.0);

    if engine.config().tabs.is_empty() {
        ui.label("No dashboard configuration is available for this page.");
        return;
    }

    show_tab_strip(ui, engine);
    ui.separator();
    show_page_actions(ui, engine, api);

    let Some(tab) = engine.active_tab().cloned() else {
        return;
    };

    show_controls(ui, engine, &tab.controls);
    ui.add_space(6.0);

    let key = engine.query_key();
    let endpoint = tab.api_endpoint.clone();
    let params = engine.query_params();
    let api = Arc::clone(api);
    let snapshot = data_cache.fetch_with(&key, move || api.dashboard_data(&endpoint, &params));

    if snapshot.error.is_some() {
        // Stale rows stay on screen; the failure is a caption, not a wall.
        // The detail is in the logs, not the UI.
        ui.colored_label(
            ui.visuals().error_fg_color,
            "Data refresh failed. Showing last known values.",
        );
    }
    if engine.config().show_refresh_time {
        if let Some(refreshed_at) = snapshot.refreshed_at {
            let local: DateTime<Local> = refreshed_at.into();
            ui.weak(format!("Last refreshed {}", local.format("%Y-%m-%d %H:%M:%S")));
        }
    }

    match snapshot.data {
        Some(data) => show_grid(ui, engine, &data),
        None if snapshot.loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.weak("Loading data...");
            });
        }
        None => {
            ui.weak("No data.");
        }
    }
}

fn show_tab_strip(ui: &mut egui::Ui, engine: &mut DashboardEngine) {
    let labels: Vec<String> = engine.config().tabs.iter().map(|t| t.label.clone()).collect();
    let active = engine.active_tab_index();
    ui.horizontal(|ui| {
        for (index, label) in labels.iter().enumerate() {
            if ui.selectable_label(index == active, label).clicked() && index != active {
                engine.select_tab(index);
            }
        }
    });
}

fn show_page_actions(ui: &mut egui::Ui, engine: &mut DashboardEngine, api: &Arc<dyn ApiClient>) {
    let show_batch_date = engine.config().show_batch_date;
    let show_pause = engine.config().show_pause_button;
    if !show_batch_date && !show_pause {
        return;
    }
    ui.horizontal(|ui| {
        if show_batch_date {
            ui.label("Batch date:");
            let mut date = engine.batch_date();
            let changed = ui
                .add(DatePickerButton::new(&mut date).id_source("batch-date"))
                .changed();
            // Past batch dates are not selectable.
            if changed && date >= Local::now().date_naive() {
                engine.set_batch_date(Some(date));
            }
        }
        if show_pause {
            let label = match engine.next_pause_action() {
                crate::types::PauseAction::Pause => "Pause",
                crate::types::PauseAction::Release => "Release",
            };
            let button = ui.add_enabled(!engine.pause_pending(), egui::Button::new(label));
            if button.clicked() {
                engine.submit_pause_release(Arc::clone(api));
            }
            if engine.pause_pending() {
                ui.spinner();
            } else if engine.is_paused() {
                ui.weak("Processing is paused");
            }
        }
    });
    ui.add_space(4.0);
}

fn show_controls(
    ui: &mut egui::Ui,
    engine: &mut DashboardEngine,
    controls: &crate::dashboard::config::ControlConfig,
) {
    ui.horizontal_wrapped(|ui| {
        if let Some(toggle) = &controls.toggle {
            if engine.is_visible(Some(toggle)) {
                let current = engine.tab_state().toggle_value.clone();
                for option in &toggle.options {
                    if ui
                        .selectable_label(current == option.value, &option.label)
                        .clicked()
                    {
                        engine.set_toggle_value(option.value.clone());
                    }
                }
                ui.separator();
            }
        }
        if let Some(radio) = &controls.radio {
            if engine.is_visible(Some(radio)) {
                if let Some(label) = &radio.label {
                    ui.label(label);
                }
                let current = engine.tab_state().radio_value.clone();
                for option in &radio.options {
                    if ui.radio(current == option.value, &option.label).clicked() {
                        engine.set_radio_value(option.value.clone());
                    }
                }
                ui.separator();
            }
        }
        if let Some(dropdown) = &controls.dropdown {
            if engine.is_visible(Some(dropdown)) {
                let current = engine.tab_state().dropdown_value.clone();
                let selected_label = dropdown
                    .options
                    .iter()
                    .find(|o| o.value == current)
                    .map(|o| o.label.clone())
                    .unwrap_or_else(|| current.clone());
                egui::ComboBox::from_id_source("tenor-dropdown")
                    .selected_text(selected_label)
                    .show_ui(ui, |ui| {
                        for option in &dropdown.options {
                            if ui
                                .selectable_label(current == option.value, &option.label)
                                .clicked()
                            {
                                engine.set_dropdown_value(option.value.clone());
                            }
                        }
                    });
            }
        }
    });
}

fn show_grid(ui: &mut egui::Ui, engine: &mut DashboardEngine, data: &DashboardData) {
    if data.columns.is_empty() {
        ui.weak("No columns configured.");
        return;
    }

    let page_count = data.data.len().div_ceil(ROWS_PER_PAGE).max(1);
    let page = engine.grid_page().min(page_count - 1);
    let start = page * ROWS_PER_PAGE;
    let page_rows = &data.data[start..data.data.len().min(start + ROWS_PER_PAGE)];

    let mut clicked_row: Option<usize> = None;
    let mut table = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .sense(egui::Sense::click())
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
    for _ in &data.columns {
        table = table.column(Column::remainder().at_least(60.0));
    }
    table
        .header(HEADER_HEIGHT, |mut header| {
            for column in &data.columns {
                header.col(|ui| {
                    ui.strong(&column.header_name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, page_rows.len(), |mut row| {
                let index = start + row.index();
                row.set_selected(engine.selected_row() == Some(index));
                let record = &page_rows[row.index()];
                for column in &data.columns {
                    row.col(|ui| {
                        ui.label(cell_text(record, column));
                    });
                }
                if row.response().clicked() {
                    clicked_row = Some(index);
                }
            });
        });
    if let Some(index) = clicked_row {
        engine.toggle_row_selection(index);
    }

    if page_count > 1 {
        ui.horizontal(|ui| {
            if ui.add_enabled(page > 0, egui::Button::new("<")).clicked() {
                engine.set_grid_page(page - 1);
            }
            ui.weak(format!("Page {} of {page_count}", page + 1));
            if ui
                .add_enabled(page + 1 < page_count, egui::Button::new(">"))
                .clicked()
            {
                engine.set_grid_page(page + 1);
            }
        });
    }
}

fn cell_text(record: &serde_json::Value, column: &ColumnDef) -> String {
    match record.get(&column.field) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_handles_shapes() {
        let record = serde_json::json!({"name": "loan 1", "value": 42.5, "gone": null});
        let col = |field: &str| ColumnDef {
            field: field.into(),
            header_name: field.into(),
            flex: None,
        };
        assert_eq!(cell_text(&record, &col("name")), "loan 1");
        assert_eq!(cell_text(&record, &col("value")), "42.5");
        assert_eq!(cell_text(&record, &col("gone")), "");
        assert_eq!(cell_text(&record, &col("missing")), "");
    }
}
