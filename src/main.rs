use eframe::egui;
use portal_shell::api::{ApiClient, HttpApiClient, MockApiClient, StaticTokenProvider};
use portal_shell::app_state::SharedAppState;
use portal_shell::logging;
use portal_shell::settings::{Settings, SETTINGS_PATH};
use portal_shell::shell::app::PortalApp;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(&SETTINGS_PATH)?;
    logging::init(settings.debug_logging);

    let api: Arc<dyn ApiClient> = if settings.use_mock_api {
        tracing::info!("running against the in-process mock API");
        Arc::new(MockApiClient::default())
    } else {
        tracing::info!(base_url = %settings.api_base_url, "running against the backend API");
        let tokens = Arc::new(StaticTokenProvider::new(settings.api_token.clone()));
        Arc::new(HttpApiClient::new(settings.api_base_url.clone(), tokens)?)
    };

    let (width, height) = settings.window_size.unwrap_or((1280.0, 800.0));
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    let app_state = SharedAppState::new();
    let app = PortalApp::new(api, &settings, app_state);
    eframe::run_native(
        "Rates Portal",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("failed to start UI: {e}"))?;

    Ok(())
}
