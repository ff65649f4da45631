//! The host application: owns the fetch caches, the navigation state and
//! the currently mounted screen, and renders the frame around them.
//!
//! Startup is ordered: the user profile is fetched first and the
//! navigation config only after the profile has arrived, so downstream
//! screens can rely on the profile being present in shared state.

use crate::api::ApiClient;
use crate::app_state::{AppStateKey, SharedAppState};
use crate::navigation::{
    default_navigation_path, generate_navigation_items, generate_routes, NavigationItem,
};
use crate::query::QueryCache;
use crate::settings::{Settings, SETTINGS_PATH};
use crate::shell::factory::{create_screen, Screen, ShellContext};
use crate::types::{NavigationConfig, UserProfile};
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const PROFILE_KEY: &str = "me";
const NAVIGATION_KEY: &str = "navigation";

pub struct PortalApp {
    ctx: ShellContext,
    profiles: QueryCache<UserProfile>,
    navigation: QueryCache<NavigationConfig>,
    current_path: String,
    /// Mounted screen and the path it was created for.
    screen: Option<(String, Box<dyn Screen>)>,
    toasts: Toasts,
    reported_errors: HashMap<&'static str, String>,
    profile_stored: bool,
    panic_message: Option<String>,
    settings: Settings,
}

impl PortalApp {
    pub fn new(api: Arc<dyn ApiClient>, settings: &Settings, app_state: SharedAppState) -> Self {
        let config_ttl = Duration::from_secs(settings.config_stale_after_secs);
        let data_ttl = Duration::from_secs(settings.stale_after_secs);
        Self {
            ctx: ShellContext {
                api,
                page_configs: Arc::new(QueryCache::new(config_ttl, settings.max_retries)),
                dashboard_data: Arc::new(QueryCache::new(data_ttl, settings.max_retries)),
                app_state,
            },
            profiles: QueryCache::new(config_ttl, settings.max_retries),
            navigation: QueryCache::new(config_ttl, settings.max_retries),
            current_path: "/".to_string(),
            screen: None,
            toasts: Toasts::new()
                .anchor(egui::Align2::RIGHT_TOP, (-12.0, 12.0))
                .direction(egui::Direction::TopDown),
            reported_errors: HashMap::new(),
            profile_stored: false,
            panic_message: None,
            settings: settings.clone(),
        }
    }

    fn navigate(&mut self, path: impl Into<String>) {
        let path = path.into();
        tracing::debug!(%path, "navigating");
        self.screen = None;
        self.ctx.app_state.update(AppStateKey::Navigation, &path);
        self.current_path = path;
    }

    /// Surface a fetch error as a toast once per distinct message.
    fn report_error(&mut self, source: &'static str, error: Option<&String>) {
        match error {
            Some(err) => {
                if self.reported_errors.get(source) != Some(err) {
                    self.reported_errors.insert(source, err.clone());
                    self.toasts.add(Toast {
                        kind: ToastKind::Error,
                        text: format!("{source}: {err}").into(),
                        options: ToastOptions::default()
                            .duration_in_seconds(6.0)
                            .show_progress(true),
                    });
                }
            }
            None => {
                self.reported_errors.remove(source);
            }
        }
    }

    fn show(&mut self, ctx: &egui::Context) {
        let api = Arc::clone(&self.ctx.api);
        let profile = self
            .profiles
            .fetch_with(PROFILE_KEY, move || api.user_profile());
        self.report_error("Profile", profile.error.as_ref());

        if let Some(profile) = &profile.data {
            if !self.profile_stored {
                self.ctx.app_state.update(AppStateKey::User, profile.as_ref());
                self.profile_stored = true;
            }
        }

        // Navigation waits for the profile fetch to settle either way.
        let profile_settled = profile.data.is_some() || profile.error.is_some();
        let nav = if profile_settled {
            let api = Arc::clone(&self.ctx.api);
            let snapshot = self
                .navigation
                .fetch_with(NAVIGATION_KEY, move || api.navigation_config());
            self.report_error("Navigation", snapshot.error.as_ref());
            snapshot.data
        } else {
            None
        };

        self.show_header(ctx, profile.data.as_deref());
        self.show_side_nav(ctx, nav.as_deref());
        self.show_content(ctx, nav.as_deref());

        self.toasts.show(ctx);

        let loading = self.profiles.any_loading()
            || self.navigation.any_loading()
            || self.ctx.page_configs.any_loading()
            || self.ctx.dashboard_data.any_loading();
        if loading {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let size = ctx.screen_rect().size();
        self.settings.window_size = Some((size.x, size.y));
    }

    fn show_header(&mut self, ctx: &egui::Context, profile: Option<&UserProfile>) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Rates Portal");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match profile {
                        Some(profile) => {
                            let display = profile
                                .name
                                .clone()
                                .or_else(|| profile.email.clone())
                                .unwrap_or_else(|| profile.tenant_id.clone());
                            ui.weak(display);
                        }
                        None => {
                            ui.spinner();
                        }
                    }
                });
            });
        });
    }

    fn show_side_nav(&mut self, ctx: &egui::Context, nav: Option<&NavigationConfig>) {
        let mut clicked: Option<String> = None;
        egui::SidePanel::left("navigation")
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| {
                let Some(nav) = nav else {
                    ui.spinner();
                    return;
                };
                for item in generate_navigation_items(nav) {
                    self.nav_item(ui, &item, &mut clicked);
                }
            });
        if let Some(path) = clicked {
            self.navigate(path);
        }
    }

    fn nav_item(&self, ui: &mut egui::Ui, item: &NavigationItem, clicked: &mut Option<String>) {
        if item.navigable {
            let selected = self.current_path == item.path;
            if ui.selectable_label(selected, &item.label).clicked() {
                *clicked = Some(item.path.clone());
            }
        } else {
            egui::CollapsingHeader::new(&item.label)
                .default_open(true)
                .show(ui, |ui| {
                    for child in &item.children {
                        self.nav_item(ui, child, clicked);
                    }
                });
        }
    }

    fn show_content(&mut self, ctx: &egui::Context, nav: Option<&NavigationConfig>) {
        enum Action {
            None,
            Redirect(String),
            GoHome,
        }
        let mut action = Action::None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(nav) = nav else {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Loading...");
                });
                return;
            };

            if self.current_path == "/" {
                action = Action::Redirect(default_navigation_path(nav));
                ui.spinner();
                return;
            }

            let route = generate_routes(nav)
                .into_iter()
                .find(|r| r.path == self.current_path);

            match route {
                Some(route) => {
                    let stale = self
                        .screen
                        .as_ref()
                        .map(|(path, _)| path != &self.current_path)
                        .unwrap_or(true);
                    if stale {
                        self.screen = Some((
                            self.current_path.clone(),
                            create_screen(&route.page_name, &route.module_code),
                        ));
                    }
                    if let Some((_, screen)) = &mut self.screen {
                        screen.ui(ui, &self.ctx);
                    }
                }
                None => {
                    ui.vertical_centered(|ui| {
                        ui.add_space(60.0);
                        ui.heading("404");
                        ui.label(format!("No page is mounted at {}", self.current_path));
                        ui.weak(
                            "Routes are generated from your permissions; \
                             this page may not be available to you.",
                        );
                        if ui.button("Go Home").clicked() {
                            action = Action::GoHome;
                        }
                    });
                }
            }
        });

        match action {
            Action::None => {}
            Action::Redirect(path) => {
                self.navigate(path);
                ctx.request_repaint();
            }
            Action::GoHome => self.navigate("/"),
        }
    }

    fn show_crash_screen(&mut self, ctx: &egui::Context, message: &str) {
        let mut recover = false;
        let mut go_home = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading("Something went wrong");
                ui.label("The current page hit an unexpected error.");
                ui.weak(message);
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    recover = ui.button("Reload").clicked();
                    go_home = ui.button("Go Home").clicked();
                });
            });
        });
        if recover || go_home {
            self.panic_message = None;
            self.screen = None;
            if go_home {
                self.navigate("/");
            }
        }
    }
}

impl eframe::App for PortalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(message) = self.panic_message.clone() {
            self.show_crash_screen(ctx, &message);
            return;
        }
        // A panicking screen must not take the whole shell down.
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.show(ctx)));
        if let Err(payload) = outcome {
            let message = panic_text(payload.as_ref());
            tracing::error!(%message, "frame panicked, showing recovery screen");
            self.panic_message = Some(message);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(err) = self.settings.save(&SETTINGS_PATH) {
            tracing::warn!(error = %err, "failed to persist settings on exit");
        }
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_text_extracts_common_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_text(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_text(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(17_u8);
        assert_eq!(panic_text(boxed.as_ref()), "unknown error");
    }
}
