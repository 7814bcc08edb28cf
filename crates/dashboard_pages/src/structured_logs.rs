use std::{fmt, str::FromStr, sync::Arc};

use page_state::{NavigationManager, PageWithSessionAndUrlState, SessionStorage};
use serde::{Deserialize, Serialize};
use shared::url_state::{Location, UrlState};

use crate::{
    resources::ResourceCatalog,
    urls::{resource_from_location, structured_logs_url, STRUCTURED_LOGS_BASE_PATH},
};

pub const STRUCTURED_LOGS_SESSION_KEY: &str = "Aspire_StructuredLogs_PageState";

/// Minimum severity shown. `None` on the view model means every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredLogsViewModel {
    pub selected_resource: Option<String>,
    pub log_level: Option<LogLevel>,
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredLogsPageState {
    pub selected_resource: Option<String>,
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub filter: Option<String>,
}

pub struct StructuredLogsPage {
    navigation: Arc<dyn NavigationManager>,
    session_storage: Arc<dyn SessionStorage>,
    resources: ResourceCatalog,
    view_model: Option<StructuredLogsViewModel>,
}

impl StructuredLogsPage {
    pub fn new(
        navigation: Arc<dyn NavigationManager>,
        session_storage: Arc<dyn SessionStorage>,
        resources: ResourceCatalog,
    ) -> Self {
        Self {
            navigation,
            session_storage,
            resources,
            view_model: Some(StructuredLogsViewModel::default()),
        }
    }

    pub fn select_resource(&mut self, name: Option<&str>) -> bool {
        let resolved = name.and_then(|n| self.resources.find(n)).map(str::to_string);
        if name.is_some() && resolved.is_none() {
            return false;
        }
        match self.view_model.as_mut() {
            Some(vm) => {
                vm.selected_resource = resolved;
                true
            }
            None => false,
        }
    }

    pub fn set_log_level(&mut self, level: Option<LogLevel>) {
        if let Some(vm) = self.view_model.as_mut() {
            vm.log_level = level;
        }
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        if let Some(vm) = self.view_model.as_mut() {
            vm.filter = filter.into();
        }
    }
}

impl PageWithSessionAndUrlState for StructuredLogsPage {
    type ViewModel = StructuredLogsViewModel;
    type Serializable = StructuredLogsPageState;

    fn base_path(&self) -> &str {
        STRUCTURED_LOGS_BASE_PATH
    }

    fn session_storage_key(&self) -> &str {
        STRUCTURED_LOGS_SESSION_KEY
    }

    fn navigation_manager(&self) -> &dyn NavigationManager {
        self.navigation.as_ref()
    }

    fn session_storage(&self) -> &dyn SessionStorage {
        self.session_storage.as_ref()
    }

    fn view_model(&self) -> Option<&StructuredLogsViewModel> {
        self.view_model.as_ref()
    }

    fn update_view_model_from_query(&mut self, location: &Location) {
        let selected_resource = resource_from_location(location, STRUCTURED_LOGS_BASE_PATH)
            .and_then(|name| self.resources.find(&name).map(str::to_string));
        let log_level = location
            .query
            .get("logLevel")
            .and_then(|raw| raw.parse().ok());
        let filter = location.query.get("filter").unwrap_or_default().to_string();

        if let Some(vm) = self.view_model.as_mut() {
            *vm = StructuredLogsViewModel {
                selected_resource,
                log_level,
                filter,
            };
        }
    }

    fn convert_view_model_to_serializable(&self) -> StructuredLogsPageState {
        let vm = self.view_model.clone().unwrap_or_default();
        StructuredLogsPageState {
            selected_resource: vm.selected_resource,
            log_level: vm.log_level,
            filter: Some(vm.filter).filter(|f| !f.is_empty()),
        }
    }

    fn get_url_from_serializable_view_model(
        &self,
        serializable: &StructuredLogsPageState,
    ) -> UrlState {
        structured_logs_url(
            serializable.selected_resource.as_deref(),
            serializable.log_level.map(LogLevel::as_str),
            serializable.filter.as_deref().filter(|f| !f.is_empty()),
        )
    }
}

#[cfg(test)]
#[path = "tests/structured_logs_tests.rs"]
mod tests;
