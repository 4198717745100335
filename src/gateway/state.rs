//! Shared application state handed to every axum handler via `State<Arc<AppState>>`
//! (teacher's `gateway::state::AppState` pattern).

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;
use crate::kvstore::KvStore;
use crate::transfer::TransferOrchestrator;

pub struct AppState {
    pub orchestrator: TransferOrchestrator,
    pub db: Arc<Database>,
    pub kv: KvStore,
    pub config: Arc<AppConfig>,
}
