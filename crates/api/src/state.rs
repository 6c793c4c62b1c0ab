use std::sync::Arc;

use inspecta_core::service::EditService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Runs every edit-workflow operation against the configured store.
    pub edits: Arc<EditService>,
    pub config: Arc<ServerConfig>,
}
