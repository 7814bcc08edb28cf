use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::url_state::{paths_match, Location, QueryParameters, UrlState};
use tracing::{debug, info, warn};

pub mod error;
mod navigation;
mod session;

pub use error::PageStateError;
pub use navigation::MemoryNavigationManager;
pub use session::MemorySessionStorage;

/// Changes and reports the current app location.
#[async_trait]
pub trait NavigationManager: Send + Sync {
    /// Current path relative to the app root, without a leading `/` or query.
    async fn current_relative_path(&self) -> String;
    async fn current_query(&self) -> QueryParameters;
    async fn navigate_to(&self, url: &str) -> Result<()>;

    async fn current_location(&self) -> Location {
        Location {
            path: self.current_relative_path().await,
            query: self.current_query().await,
        }
    }
}

/// Key-value store scoped to one browser session.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// A page whose view model is mirrored into the URL and session storage.
///
/// The page owns its view model; the controller only moves data between the
/// page's own conversion functions and the two collaborators.
pub trait PageWithSessionAndUrlState: Send + Sync {
    type ViewModel;
    type Serializable: Serialize + DeserializeOwned + Send + Sync;

    fn base_path(&self) -> &str;
    fn session_storage_key(&self) -> &str;
    fn navigation_manager(&self) -> &dyn NavigationManager;
    fn session_storage(&self) -> &dyn SessionStorage;
    fn view_model(&self) -> Option<&Self::ViewModel>;

    /// Populates the view model from `location`. Missing or unknown parameters
    /// fall back to defaults.
    fn update_view_model_from_query(&mut self, location: &Location);
    fn convert_view_model_to_serializable(&self) -> Self::Serializable;
    fn get_url_from_serializable_view_model(&self, serializable: &Self::Serializable)
        -> UrlState;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// Stored state pointed somewhere else. The host must re-create the page at
    /// `url` and initialize it again.
    Redirected { url: String },
    /// The view model was populated from the current location.
    Ready,
}

/// Reconciles a page's view model, its URL and its session-stored snapshot.
pub struct PageStateController;

impl PageStateController {
    /// Runs once per page instance, before first render.
    ///
    /// Stored state is only consulted when the visitor landed on the bare base
    /// path; any sub-path or query parameter makes the URL authoritative.
    pub async fn initialize<P>(page: &mut P) -> Result<InitializeOutcome, PageStateError>
    where
        P: PageWithSessionAndUrlState,
    {
        let location = page.navigation_manager().current_location().await;
        let at_base_path =
            paths_match(&location.path, page.base_path()) && location.query.is_empty();

        if at_base_path {
            if let Some(snapshot) = load_snapshot(page).await {
                let target = page
                    .get_url_from_serializable_view_model(&snapshot)
                    .to_relative_url();

                if !paths_match(&target, page.base_path()) {
                    info!(
                        base_path = page.base_path(),
                        target = %target,
                        "restoring page state from session storage"
                    );
                    page.navigation_manager()
                        .navigate_to(&target)
                        .await
                        .map_err(|source| PageStateError::Navigation {
                            url: target.clone(),
                            source,
                        })?;
                    return Ok(InitializeOutcome::Redirected { url: target });
                }

                debug!(
                    base_path = page.base_path(),
                    "stored page state maps to the base path; not redirecting"
                );
            }
        } else {
            debug!(
                base_path = page.base_path(),
                path = %location.path,
                "url carries page state; skipping session restore"
            );
        }

        if page.view_model().is_none() {
            return Err(PageStateError::MissingViewModel {
                base_path: page.base_path().to_string(),
            });
        }

        page.update_view_model_from_query(&location);
        Ok(InitializeOutcome::Ready)
    }

    /// Pushes the current view model into the URL, then into session storage.
    ///
    /// A storage failure is returned after navigation already happened, so the
    /// URL is current while the stored snapshot may be stale.
    pub async fn after_view_model_changed<P>(page: &mut P) -> Result<(), PageStateError>
    where
        P: PageWithSessionAndUrlState,
    {
        let snapshot = page.convert_view_model_to_serializable();
        let url = page
            .get_url_from_serializable_view_model(&snapshot)
            .to_rooted_url();

        page.navigation_manager()
            .navigate_to(&url)
            .await
            .map_err(|source| PageStateError::Navigation {
                url: url.clone(),
                source,
            })?;

        let key = page.session_storage_key();
        let value = serde_json::to_value(&snapshot).map_err(|source| PageStateError::Serialize {
            key: key.to_string(),
            source,
        })?;
        page.session_storage()
            .set(key, value)
            .await
            .map_err(|source| PageStateError::Storage {
                key: key.to_string(),
                source,
            })?;

        info!(key, url = %url, "page state persisted");
        Ok(())
    }
}

async fn load_snapshot<P>(page: &P) -> Option<P::Serializable>
where
    P: PageWithSessionAndUrlState,
{
    let key = page.session_storage_key();
    let value = match page.session_storage().get(key).await {
        Ok(Some(Value::Null)) | Ok(None) => return None,
        Ok(Some(value)) => value,
        Err(err) => {
            warn!(key, error = %err, "session storage read failed; ignoring stored page state");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(key, error = %err, "discarding malformed page state snapshot");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
