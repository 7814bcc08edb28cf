use std::sync::Arc;

use page_state::{NavigationManager, PageWithSessionAndUrlState, SessionStorage};
use serde::{Deserialize, Serialize};
use shared::url_state::{Location, UrlState};

use crate::{
    resources::ResourceCatalog,
    urls::{console_logs_url, resource_from_location, CONSOLE_LOGS_BASE_PATH},
};

pub const CONSOLE_LOGS_SESSION_KEY: &str = "Aspire_ConsoleLogs_PageState";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleLogsViewModel {
    pub selected_resource: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleLogsPageState {
    pub selected_resource: Option<String>,
}

pub struct ConsoleLogsPage {
    navigation: Arc<dyn NavigationManager>,
    session_storage: Arc<dyn SessionStorage>,
    resources: ResourceCatalog,
    view_model: Option<ConsoleLogsViewModel>,
}

impl ConsoleLogsPage {
    pub fn new(
        navigation: Arc<dyn NavigationManager>,
        session_storage: Arc<dyn SessionStorage>,
        resources: ResourceCatalog,
    ) -> Self {
        Self {
            navigation,
            session_storage,
            resources,
            view_model: Some(ConsoleLogsViewModel::default()),
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
}

impl PageWithSessionAndUrlState for ConsoleLogsPage {
    type ViewModel = ConsoleLogsViewModel;
    type Serializable = ConsoleLogsPageState;

    fn base_path(&self) -> &str {
        CONSOLE_LOGS_BASE_PATH
    }

    fn session_storage_key(&self) -> &str {
        CONSOLE_LOGS_SESSION_KEY
    }

    fn navigation_manager(&self) -> &dyn NavigationManager {
        self.navigation.as_ref()
    }

    fn session_storage(&self) -> &dyn SessionStorage {
        self.session_storage.as_ref()
    }

    fn view_model(&self) -> Option<&ConsoleLogsViewModel> {
        self.view_model.as_ref()
    }

    fn update_view_model_from_query(&mut self, location: &Location) {
        let selected_resource = resource_from_location(location, CONSOLE_LOGS_BASE_PATH)
            .and_then(|name| self.resources.find(&name).map(str::to_string));
        if let Some(vm) = self.view_model.as_mut() {
            vm.selected_resource = selected_resource;
        }
    }

    fn convert_view_model_to_serializable(&self) -> ConsoleLogsPageState {
        ConsoleLogsPageState {
            selected_resource: self
                .view_model
                .as_ref()
                .and_then(|vm| vm.selected_resource.clone()),
        }
    }

    fn get_url_from_serializable_view_model(
        &self,
        serializable: &ConsoleLogsPageState,
    ) -> UrlState {
        console_logs_url(serializable.selected_resource.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_state::{
        InitializeOutcome, MemoryNavigationManager, MemorySessionStorage, PageStateController,
    };

    fn page_at(
        url: &str,
    ) -> (
        ConsoleLogsPage,
        Arc<MemoryNavigationManager>,
        Arc<MemorySessionStorage>,
    ) {
        let navigation = Arc::new(MemoryNavigationManager::new(url));
        let storage = Arc::new(MemorySessionStorage::new());
        let page = ConsoleLogsPage::new(
            navigation.clone(),
            storage.clone(),
            ResourceCatalog::new(["api", "worker"]),
        );
        (page, navigation, storage)
    }

    #[tokio::test]
    async fn selects_resource_from_path() {
        let (mut page, _, storage) = page_at("/consolelogs/resource/worker");

        let outcome = PageStateController::initialize(&mut page).await.expect("initialize");

        assert_eq!(outcome, InitializeOutcome::Ready);
        assert_eq!(
            page.view_model().and_then(|vm| vm.selected_resource.as_deref()),
            Some("worker")
        );
        assert!(storage.keys().await.is_empty());
    }

    #[tokio::test]
    async fn clearing_selection_returns_to_base_path() {
        let (mut page, navigation, storage) = page_at("/consolelogs/resource/api");
        PageStateController::initialize(&mut page).await.expect("initialize");

        assert!(page.select_resource(None));
        PageStateController::after_view_model_changed(&mut page)
            .await
            .expect("after change");

        assert_eq!(navigation.current_url().await, "/consolelogs");
        assert_eq!(
            storage.get(CONSOLE_LOGS_SESSION_KEY).await.expect("get"),
            Some(serde_json::json!({ "selectedResource": null }))
        );
    }

    #[test]
    fn dot_segment_resource_cannot_be_selected() {
        let navigation = Arc::new(MemoryNavigationManager::new("/consolelogs"));
        let mut page = ConsoleLogsPage::new(
            navigation,
            Arc::new(MemorySessionStorage::new()),
            ResourceCatalog::new(["..", "api"]),
        );

        assert!(!page.select_resource(Some("..")));
        assert!(page.select_resource(Some("api")));
    }

    #[tokio::test]
    async fn stored_selection_redirects_bare_visit() {
        let (mut page, navigation, storage) = page_at("/consolelogs");
        storage
            .set(
                CONSOLE_LOGS_SESSION_KEY,
                serde_json::json!({ "selectedResource": "api" }),
            )
            .await
            .expect("seed");

        let outcome = PageStateController::initialize(&mut page).await.expect("initialize");

        assert_eq!(
            outcome,
            InitializeOutcome::Redirected {
                url: "consolelogs/resource/api".to_string()
            }
        );
        assert_eq!(navigation.history().await.len(), 1);
    }
}
