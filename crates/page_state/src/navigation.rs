use anyhow::{bail, Result};
use async_trait::async_trait;
use shared::url_state::{Location, QueryParameters};
use tokio::sync::RwLock;
use tracing::debug;

use crate::NavigationManager;

/// In-process navigation for hosts without a browser. Every navigation is
/// recorded so hosts can replay the redirect chain.
pub struct MemoryNavigationManager {
    current: RwLock<Location>,
    history: RwLock<Vec<String>>,
}

impl MemoryNavigationManager {
    pub fn new(initial_url: &str) -> Self {
        Self {
            current: RwLock::new(Location::parse(initial_url)),
            history: RwLock::new(Vec::new()),
        }
    }

    pub async fn current_url(&self) -> String {
        self.current.read().await.to_url()
    }

    /// URLs passed to `navigate_to`, oldest first.
    pub async fn history(&self) -> Vec<String> {
        self.history.read().await.clone()
    }
}

#[async_trait]
impl NavigationManager for MemoryNavigationManager {
    async fn current_relative_path(&self) -> String {
        self.current.read().await.path.clone()
    }

    async fn current_query(&self) -> QueryParameters {
        self.current.read().await.query.clone()
    }

    async fn navigate_to(&self, url: &str) -> Result<()> {
        if url.trim().is_empty() {
            bail!("cannot navigate to an empty url");
        }

        let location = Location::parse(url);
        debug!(url, path = %location.path, "navigating");
        *self.current.write().await = location;
        self.history.write().await.push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
