use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dashboard_pages::{DashboardPage, ResourceCatalog};
use page_state::{InitializeOutcome, MemoryNavigationManager, SessionStorage};
use serde_json::Value;
use shared::{domain::SessionId, Location};
use storage::SqliteSessionStorage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

/// Redirects followed before a visit is treated as a loop. A well-behaved page
/// restores state with a single redirect.
const MAX_REDIRECTS: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "page-state", about = "Replay and inspect dashboard page state")]
struct Cli {
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    session: Option<SessionId>,
    #[arg(long, value_delimiter = ',')]
    resources: Option<Vec<String>>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a dashboard URL the way a browser would, following restore redirects.
    Visit {
        url: String,
        /// Select this resource once the page is ready.
        #[arg(long, conflicts_with = "clear_selection")]
        select: Option<String>,
        #[arg(long)]
        clear_selection: bool,
    },
    /// List stored page state keys for the session.
    Keys,
    /// Print one stored snapshot.
    Show { key: String },
    /// Remove all stored state for the session.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = config::load_settings()?;
    if let Some(v) = cli.database_url {
        settings.database_url = v;
    }
    if let Some(v) = cli.session {
        settings.session_id = Some(v);
    }
    if let Some(v) = cli.resources {
        settings.resources = v;
    }

    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let session_id = match settings.session_id {
        Some(id) => id,
        None => {
            let id = SessionId::new();
            warn!(session_id = %id, "no session configured; started a new one");
            id
        }
    };
    let storage = SqliteSessionStorage::new(&settings.database_url, session_id).await?;
    storage.health_check().await?;

    match cli.command {
        Command::Visit {
            url,
            select,
            clear_selection,
        } => {
            let change = if clear_selection {
                Some(None)
            } else {
                select.map(Some)
            };
            let resources = ResourceCatalog::new(settings.resources);
            let storage: Arc<dyn SessionStorage> = Arc::new(storage);
            let visited = visit(storage, resources, url, change).await?;
            for hop in &visited.redirects {
                println!("redirect -> {hop}");
            }
            println!("{}", visited.url);
            println!("{}", serde_json::to_string_pretty(&visited.snapshot)?);
        }
        Command::Keys => {
            for entry in storage.list_entries().await? {
                println!("{}\t{}", entry.storage_key, entry.updated_at.to_rfc3339());
            }
        }
        Command::Show { key } => match storage.get(&key).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => bail!("no page state stored under '{key}' for session {session_id}"),
        },
        Command::Clear => {
            let removed = storage.clear_session().await?;
            println!("removed {removed} entries from session {session_id}");
        }
    }

    Ok(())
}

/// Where a replayed visit settled.
#[derive(Debug)]
struct Visit {
    /// Redirect targets, in the order they were followed.
    redirects: Vec<String>,
    url: String,
    snapshot: Value,
}

/// Each redirect re-creates the page at the new URL, as a browser router would.
async fn visit(
    storage: Arc<dyn SessionStorage>,
    resources: ResourceCatalog,
    url: String,
    change: Option<Option<String>>,
) -> Result<Visit> {
    let mut current = url.clone();
    let mut redirects = Vec::new();

    loop {
        let navigation = Arc::new(MemoryNavigationManager::new(&current));
        let location = Location::parse(&current);
        let Some(mut page) = DashboardPage::for_location(
            &location,
            navigation.clone(),
            storage.clone(),
            resources.clone(),
        ) else {
            bail!("no dashboard page serves '{current}'");
        };

        match page.initialize().await? {
            InitializeOutcome::Redirected { url: target } => {
                if redirects.len() == MAX_REDIRECTS {
                    bail!("gave up after {MAX_REDIRECTS} redirects starting from '{url}'");
                }
                info!(from = %current, to = %target, "following restore redirect");
                redirects.push(target.clone());
                current = target;
            }
            InitializeOutcome::Ready => {
                if let Some(selection) = &change {
                    if !page.select_resource(selection.as_deref()) {
                        bail!(
                            "unknown resource '{}' for {}",
                            selection.as_deref().unwrap_or_default(),
                            page.base_path()
                        );
                    }
                }
                page.after_view_model_changed().await?;

                let settled = navigation.current_url().await;
                info!(url = %settled, "page state settled");
                return Ok(Visit {
                    redirects,
                    url: settled,
                    snapshot: page.snapshot()?,
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
