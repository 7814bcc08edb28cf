use std::sync::Arc;

use page_state::{NavigationManager, PageWithSessionAndUrlState, SessionStorage};
use serde::{Deserialize, Serialize};
use shared::url_state::{Location, UrlState};

use crate::{
    resources::ResourceCatalog,
    urls::{metrics_url, resource_from_location, METRICS_BASE_PATH},
};

pub const METRICS_SESSION_KEY: &str = "Aspire_Metrics_PageState";
pub const DEFAULT_DURATION_MINUTES: u32 = 5;
pub const SUPPORTED_DURATIONS_MINUTES: [u32; 8] = [1, 5, 15, 30, 60, 180, 360, 720];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricViewKind {
    #[default]
    Graph,
    Table,
}

impl MetricViewKind {
    fn from_query(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("table") => Self::Table,
            _ => Self::Graph,
        }
    }

    /// The default view is left out of URLs.
    fn query_value(self) -> Option<&'static str> {
        match self {
            Self::Graph => None,
            Self::Table => Some("table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsViewModel {
    pub selected_resource: Option<String>,
    pub selected_meter: Option<String>,
    pub selected_instrument: Option<String>,
    pub duration_minutes: u32,
    pub view: MetricViewKind,
}

impl Default for MetricsViewModel {
    fn default() -> Self {
        Self {
            selected_resource: None,
            selected_meter: None,
            selected_instrument: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            view: MetricViewKind::Graph,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPageState {
    pub selected_resource: Option<String>,
    pub selected_meter: Option<String>,
    pub selected_instrument: Option<String>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub view_kind: MetricViewKind,
}

pub struct MetricsPage {
    navigation: Arc<dyn NavigationManager>,
    session_storage: Arc<dyn SessionStorage>,
    resources: ResourceCatalog,
    view_model: Option<MetricsViewModel>,
}

impl MetricsPage {
    pub fn new(
        navigation: Arc<dyn NavigationManager>,
        session_storage: Arc<dyn SessionStorage>,
        resources: ResourceCatalog,
    ) -> Self {
        Self {
            navigation,
            session_storage,
            resources,
            view_model: Some(MetricsViewModel::default()),
        }
    }

    /// Selecting another resource clears the instrument selection.
    pub fn select_resource(&mut self, name: Option<&str>) -> bool {
        let resolved = name.and_then(|n| self.resources.find(n)).map(str::to_string);
        if name.is_some() && resolved.is_none() {
            return false;
        }
        let Some(vm) = self.view_model.as_mut() else {
            return false;
        };
        if vm.selected_resource != resolved {
            vm.selected_resource = resolved;
            vm.selected_meter = None;
            vm.selected_instrument = None;
        }
        true
    }

    pub fn select_instrument(&mut self, meter: &str, instrument: &str) -> bool {
        match self.view_model.as_mut() {
            Some(vm) if vm.selected_resource.is_some() => {
                vm.selected_meter = Some(meter.to_string());
                vm.selected_instrument = Some(instrument.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn set_duration(&mut self, minutes: u32) -> bool {
        if !SUPPORTED_DURATIONS_MINUTES.contains(&minutes) {
            return false;
        }
        match self.view_model.as_mut() {
            Some(vm) => {
                vm.duration_minutes = minutes;
                true
            }
            None => false,
        }
    }

    pub fn set_view(&mut self, view: MetricViewKind) {
        if let Some(vm) = self.view_model.as_mut() {
            vm.view = view;
        }
    }
}

impl PageWithSessionAndUrlState for MetricsPage {
    type ViewModel = MetricsViewModel;
    type Serializable = MetricsPageState;

    fn base_path(&self) -> &str {
        METRICS_BASE_PATH
    }

    fn session_storage_key(&self) -> &str {
        METRICS_SESSION_KEY
    }

    fn navigation_manager(&self) -> &dyn NavigationManager {
        self.navigation.as_ref()
    }

    fn session_storage(&self) -> &dyn SessionStorage {
        self.session_storage.as_ref()
    }

    fn view_model(&self) -> Option<&MetricsViewModel> {
        self.view_model.as_ref()
    }

    fn update_view_model_from_query(&mut self, location: &Location) {
        let selected_resource = resource_from_location(location, METRICS_BASE_PATH)
            .and_then(|name| self.resources.find(&name).map(str::to_string));
        let selected_meter = selected_resource
            .as_ref()
            .and(location.query.get("meter"))
            .map(str::to_string);
        let selected_instrument = selected_meter
            .as_ref()
            .and(location.query.get("instrument"))
            .map(str::to_string);
        let duration_minutes = location
            .query
            .get("duration")
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|minutes| SUPPORTED_DURATIONS_MINUTES.contains(minutes))
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        let view = MetricViewKind::from_query(location.query.get("view"));

        if let Some(vm) = self.view_model.as_mut() {
            *vm = MetricsViewModel {
                selected_resource,
                selected_meter,
                selected_instrument,
                duration_minutes,
                view,
            };
        }
    }

    fn convert_view_model_to_serializable(&self) -> MetricsPageState {
        let vm = self.view_model.clone().unwrap_or_default();
        MetricsPageState {
            selected_resource: vm.selected_resource,
            selected_meter: vm.selected_meter,
            selected_instrument: vm.selected_instrument,
            duration_minutes: vm.duration_minutes,
            view_kind: vm.view,
        }
    }

    fn get_url_from_serializable_view_model(&self, serializable: &MetricsPageState) -> UrlState {
        let resource = serializable.selected_resource.as_deref();
        let meter = resource.and(serializable.selected_meter.as_deref());
        let instrument = meter.and(serializable.selected_instrument.as_deref());
        let duration = Some(serializable.duration_minutes)
            .filter(|minutes| *minutes != DEFAULT_DURATION_MINUTES);

        metrics_url(
            resource,
            meter,
            instrument,
            duration,
            serializable.view_kind.query_value(),
        )
    }
}

#[cfg(test)]
#[path = "tests/metrics_tests.rs"]
mod tests;
