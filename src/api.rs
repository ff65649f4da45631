//! Backend API surface. The shell only sees the [`ApiClient`] trait;
//! production uses the HTTP client, tests and the demo mode use the mock.

use crate::types::{
    DashboardData, NavigationConfig, PageConfig, PauseReleaseRequest, UserProfile,
};
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Query parameters of a dashboard tab data fetch, in a stable order.
pub type QueryParams = Vec<(String, String)>;

/// Opaque bearer-token source. Token acquisition mechanics are outside
/// the core; the client only needs something to put in the header.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token, or none at all. Enough for development and tests.
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

pub trait ApiClient: Send + Sync {
    fn user_profile(&self) -> anyhow::Result<UserProfile>;
    fn navigation_config(&self) -> anyhow::Result<NavigationConfig>;
    fn page_config(&self, module_code: &str, page_name: &str) -> anyhow::Result<PageConfig>;
    fn dashboard_data(&self, endpoint: &str, params: &QueryParams)
        -> anyhow::Result<DashboardData>;
    fn pause_release(&self, endpoint: &str, request: &PauseReleaseRequest) -> anyhow::Result<()>;
}

/// HTTP implementation over `reqwest`'s blocking client. Every request
/// carries the provider's bearer token when one is available.
pub struct HttpApiClient {
    base_url: String,
    client: reqwest::blocking::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> anyhow::Result<T> {
        let response = self
            .authorize(self.client.get(self.url(path)).query(params))
            .send()
            .with_context(|| format!("GET {path}"))?
            .error_for_status()
            .with_context(|| format!("GET {path}"))?;
        response.json().with_context(|| format!("decoding {path}"))
    }
}

impl ApiClient for HttpApiClient {
    fn user_profile(&self) -> anyhow::Result<UserProfile> {
        self.get_json("/me", &Vec::new())
    }

    fn navigation_config(&self) -> anyhow::Result<NavigationConfig> {
        self.get_json("/navigationConfig", &Vec::new())
    }

    fn page_config(&self, module_code: &str, page_name: &str) -> anyhow::Result<PageConfig> {
        let params = vec![
            ("moduleCode".to_string(), module_code.to_string()),
            ("pageName".to_string(), page_name.to_string()),
        ];
        self.get_json("/pageConfig", &params)
    }

    fn dashboard_data(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> anyhow::Result<DashboardData> {
        self.get_json(endpoint, params)
    }

    fn pause_release(&self, endpoint: &str, request: &PauseReleaseRequest) -> anyhow::Result<()> {
        self.authorize(self.client.post(self.url(endpoint)).json(request))
            .send()
            .with_context(|| format!("POST {endpoint}"))?
            .error_for_status()
            .with_context(|| format!("POST {endpoint}"))?;
        Ok(())
    }
}

/// In-process backend serving canned configuration and generated rows,
/// so the shell runs end to end without a server. A failure toggle lets
/// tests exercise the error paths.
pub struct MockApiClient {
    delay: Duration,
    fail: AtomicBool,
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

impl MockApiClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: AtomicBool::new(false),
        }
    }

    /// When set, every call returns an error until cleared.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn simulate(&self) -> anyhow::Result<()> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock API error");
        }
        Ok(())
    }
}

impl ApiClient for MockApiClient {
    fn user_profile(&self) -> anyhow::Result<UserProfile> {
        self.simulate()?;
        Ok(UserProfile {
            tenant_id: "tenant-001".into(),
            ad_groups: vec!["portal-users".into(), "rates-desk".into()],
            ad_group_ids: vec![1001, 2044],
            name: Some("Demo User".into()),
            email: Some("demo.user@example.com".into()),
        })
    }

    fn navigation_config(&self) -> anyhow::Result<NavigationConfig> {
        self.simulate()?;
        let config = serde_json::json!({
            "modules": [
                {
                    "module_code": "RATES",
                    "module_name": "Rates",
                    "display_order": 1,
                    "pages": [
                        {"page_code": "dashboard", "page_name": "Rates Dashboard", "display_order": 1},
                        {"page_code": "term-sofr", "page_name": "Term Sofr", "display_order": 2},
                        {"page_code": "logs", "page_name": "Logs", "display_order": 3}
                    ]
                },
                {
                    "module_code": "TRANSACTIONS",
                    "module_name": "Transactions",
                    "display_order": 2,
                    "pages": [
                        {"page_code": "active", "page_name": "Active Transaction", "display_order": 1},
                        {"page_code": "failed", "page_name": "Failed Transaction", "display_order": 2}
                    ]
                },
                {
                    "module_code": "TEMPLATES",
                    "module_name": "Templates",
                    "display_order": 3,
                    "pages": [
                        {"page_code": "templates", "page_name": "Templates", "display_order": 1},
                        {"page_code": "recalculate", "page_name": "Recalculate", "display_order": 2}
                    ]
                },
                {"module_code": "QRM", "module_name": "QRM", "display_order": 4},
                {"module_code": "CARTS", "module_name": "Carts", "display_order": 5}
            ]
        });
        Ok(serde_json::from_value(config)?)
    }

    fn page_config(&self, _module_code: &str, _page_name: &str) -> anyhow::Result<PageConfig> {
        self.simulate()?;
        let tenors = serde_json::json!(["T+0", "T+1", "T+7", "T+30"]);
        let view_by = serde_json::json!([
            {"label": "Percentage", "value": 100},
            {"label": "Basis Points (BPS)", "value": 0.1},
            {"label": "Decimal (0.00001)", "value": 0.00001}
        ]);
        let config = serde_json::json!({
            "showPause": true,
            "showBatchDatePicker": true,
            "showLastRefreshedDate": true,
            "tabs": [
                {
                    "label": "Loans",
                    "table": "loans",
                    "showSummaryDetailedView": true,
                    "showTenorDropdown": tenors,
                    "showViewByOptions": view_by
                },
                {
                    "label": "Deposits",
                    "table": "deposits",
                    "showSummaryDetailedView": true,
                    "showTenorDropdown": tenors,
                    "showViewByOptions": view_by
                },
                {
                    "label": "Commitment Lines",
                    "table": "commitment_lines",
                    "showSummaryDetailedView": true,
                    "showTenorDropdown": tenors,
                    "showViewByOptions": view_by
                },
                {"label": "Spot Utilization", "table": "spot_utilization"}
            ]
        });
        Ok(serde_json::from_value(config)?)
    }

    fn dashboard_data(
        &self,
        _endpoint: &str,
        params: &QueryParams,
    ) -> anyhow::Result<DashboardData> {
        use rand::Rng;
        self.simulate()?;
        let table = params
            .iter()
            .find(|(k, _)| k == "table")
            .map(|(_, v)| v.as_str())
            .unwrap_or("rows");
        let mut rng = rand::thread_rng();
        let rows: Vec<serde_json::Value> = (1..=20)
            .map(|i| {
                serde_json::json!({
                    "id": i,
                    "name": format!("{table} item {i}"),
                    "value": rng.gen_range(10.0..5000.0_f64).round(),
                    "status": if rng.gen_bool(0.7) { "Active" } else { "Inactive" },
                })
            })
            .collect();
        let response = serde_json::json!({
            "data": rows,
            "columns": [
                {"field": "id", "headerName": "ID", "flex": 1.0},
                {"field": "name", "headerName": "Name", "flex": 2.0},
                {"field": "value", "headerName": "Value", "flex": 1.0},
                {"field": "status", "headerName": "Status", "flex": 1.0}
            ]
        });
        Ok(serde_json::from_value(response)?)
    }

    fn pause_release(&self, _endpoint: &str, request: &PauseReleaseRequest) -> anyhow::Result<()> {
        self.simulate()?;
        tracing::info!(action = request.action.as_str(), tab = %request.tab_id, "mock pause/release accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation;

    #[test]
    fn mock_navigation_includes_denied_module() {
        let api = MockApiClient::new(Duration::ZERO);
        let config = api.navigation_config().unwrap();
        assert!(config.modules.iter().any(|m| m.module_code == "CARTS"));
        let items = navigation::generate_navigation_items(&config);
        assert!(items.iter().all(|i| i.id != "carts"));
    }

    #[test]
    fn mock_failure_toggle_propagates() {
        let api = MockApiClient::new(Duration::ZERO);
        api.set_failing(true);
        assert!(api.user_profile().is_err());
        api.set_failing(false);
        assert!(api.user_profile().is_ok());
    }

    #[test]
    fn mock_rows_carry_column_defs() {
        let api = MockApiClient::new(Duration::ZERO);
        let params = vec![("table".to_string(), "loans".to_string())];
        let data = api.dashboard_data("/api/dashboard?table=loans", &params).unwrap();
        assert_eq!(data.data.len(), 20);
        assert_eq!(data.columns.len(), 4);
        assert_eq!(data.columns[0].header_name, "ID");
    }
}
