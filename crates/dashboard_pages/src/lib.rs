//! Dashboard pages whose selection state lives in the URL and session storage.

use std::sync::Arc;

use page_state::{
    InitializeOutcome, NavigationManager, PageStateController, PageStateError,
    PageWithSessionAndUrlState, SessionStorage,
};
use serde_json::Value;
use shared::url_state::Location;
use tracing::debug;

pub mod console_logs;
pub mod metrics;
pub mod resources;
pub mod structured_logs;
pub mod urls;

pub use console_logs::ConsoleLogsPage;
pub use metrics::MetricsPage;
pub use resources::ResourceCatalog;
pub use structured_logs::StructuredLogsPage;

/// Any dashboard page, chosen by the first path segment of a location.
pub enum DashboardPage {
    ConsoleLogs(ConsoleLogsPage),
    Metrics(MetricsPage),
    StructuredLogs(StructuredLogsPage),
}

impl DashboardPage {
    pub fn for_location(
        location: &Location,
        navigation: Arc<dyn NavigationManager>,
        session_storage: Arc<dyn SessionStorage>,
        resources: ResourceCatalog,
    ) -> Option<Self> {
        let first = location.path.split('/').next().unwrap_or_default();
        let page = if first.eq_ignore_ascii_case(urls::CONSOLE_LOGS_BASE_PATH) {
            Self::ConsoleLogs(ConsoleLogsPage::new(navigation, session_storage, resources))
        } else if first.eq_ignore_ascii_case(urls::METRICS_BASE_PATH) {
            Self::Metrics(MetricsPage::new(navigation, session_storage, resources))
        } else if first.eq_ignore_ascii_case(urls::STRUCTURED_LOGS_BASE_PATH) {
            Self::StructuredLogs(StructuredLogsPage::new(
                navigation,
                session_storage,
                resources,
            ))
        } else {
            debug!(path = %location.path, "no dashboard page serves this location");
            return None;
        };
        Some(page)
    }

    pub fn base_path(&self) -> &str {
        match self {
            Self::ConsoleLogs(page) => page.base_path(),
            Self::Metrics(page) => page.base_path(),
            Self::StructuredLogs(page) => page.base_path(),
        }
    }

    /// Selects a known resource, or clears the selection with `None`.
    pub fn select_resource(&mut self, name: Option<&str>) -> bool {
        match self {
            Self::ConsoleLogs(page) => page.select_resource(name),
            Self::Metrics(page) => page.select_resource(name),
            Self::StructuredLogs(page) => page.select_resource(name),
        }
    }

    pub async fn initialize(&mut self) -> Result<InitializeOutcome, PageStateError> {
        match self {
            Self::ConsoleLogs(page) => PageStateController::initialize(page).await,
            Self::Metrics(page) => PageStateController::initialize(page).await,
            Self::StructuredLogs(page) => PageStateController::initialize(page).await,
        }
    }

    pub async fn after_view_model_changed(&mut self) -> Result<(), PageStateError> {
        match self {
            Self::ConsoleLogs(page) => PageStateController::after_view_model_changed(page).await,
            Self::Metrics(page) => PageStateController::after_view_model_changed(page).await,
            Self::StructuredLogs(page) => {
                PageStateController::after_view_model_changed(page).await
            }
        }
    }

    /// The page's current snapshot as JSON.
    pub fn snapshot(&self) -> serde_json::Result<Value> {
        match self {
            Self::ConsoleLogs(page) => {
                serde_json::to_value(page.convert_view_model_to_serializable())
            }
            Self::Metrics(page) => serde_json::to_value(page.convert_view_model_to_serializable()),
            Self::StructuredLogs(page) => {
                serde_json::to_value(page.convert_view_model_to_serializable())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
