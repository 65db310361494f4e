//! CLI command implementations.

mod auth;
mod catalog;
mod navigation;
mod orders;
mod reader;

pub use auth::{login, logout, register, status};
pub use catalog::{books_delete, books_list, books_publish, books_show, tags_list};
pub use navigation::open;
pub use orders::{orders_create, orders_list, orders_refresh, orders_show};
pub use reader::{progress_get, progress_set, token_ensure, token_invalidate};

use anyhow::{Context, Result};
use folio_config::{Config, Paths};
use folio_session::{
    ApiClient, ApiError, CatalogStore, DownloadTokenCache, Router, SessionError, SessionStore,
};
use folio_storage::{CredentialStore, FileStore, KeyValueStore};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs, wired from configuration.
pub struct App {
    pub api: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub tokens: Arc<DownloadTokenCache>,
    pub catalog: CatalogStore,
    pub router: Router,
}

impl App {
    pub fn open(config: &Config, paths: &Paths) -> Result<Self> {
        let storage_path = config.storage_file(paths);
        debug!(path = %storage_path.display(), api_url = %config.api_url, "Opening client");

        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(storage_path));
        let credentials = CredentialStore::new(storage.clone());
        let base_url = config.api_url().context("Invalid API URL")?;

        let api = Arc::new(ApiClient::with_reqwest(
            base_url,
            Arc::new(credentials.clone()),
        )?);
        let tokens = Arc::new(DownloadTokenCache::new(storage, api.clone()));
        let session = Arc::new(SessionStore::new(api.clone(), credentials, tokens.clone()));

        Ok(Self {
            catalog: CatalogStore::new(api.clone()),
            router: Router::new(session.clone()),
            api,
            session,
            tokens,
        })
    }
}

/// Error message for a failed API call, preferring the server's own wording.
fn describe(error: &ApiError) -> String {
    match error.server_message() {
        Some(message) => message,
        None => error.to_string(),
    }
}

fn describe_session(error: &SessionError) -> String {
    match error.api_error() {
        Some(api) => describe(api),
        None => error.to_string(),
    }
}

/// Wrap an API failure with what the command was trying to do.
fn api_failure(action: &str, error: ApiError) -> anyhow::Error {
    if error.is_unauthorized() {
        return anyhow::anyhow!("{}: not logged in (run 'folio login')", action);
    }
    anyhow::anyhow!("{}: {}", action, describe(&error))
}
