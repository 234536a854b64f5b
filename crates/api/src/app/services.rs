//! Shared state handed to every handler, and store wiring.

use std::sync::Arc;

use quizdesk_infra::{InMemoryStore, Persistence, PostgresStore, Store, StoreError};
use quizdesk_schema::AdminSite;

use crate::app::pagination::Paginator;
use crate::app::router::{Action, RouteTable};

/// Everything a request may touch. Built once in `build_app`.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub paginator: Paginator,
    pub admin: AdminSite,
    pub routes: RouteTable,
}

impl AppServices {
    /// Path of the detail route of `basename`, when that route can be read back with `GET`.
    pub fn detail_url(&self, basename: &str, lookup: &str) -> Option<String> {
        let name = format!("{basename}-detail");
        if !self.routes.serves(&name, Action::Retrieve) {
            return None;
        }
        self.routes.reverse(&name, Some(lookup))
    }
}

/// Open the configured store. Postgres gets its schema bootstrapped before use.
pub async fn build_store(persistence: &Persistence) -> Result<Arc<dyn Store>, StoreError> {
    match persistence {
        Persistence::InMemory => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        Persistence::Postgres { database_url } => {
            let store = PostgresStore::connect(database_url).await?;
            store.migrate().await?;
            tracing::info!("using postgres store");
            Ok(Arc::new(store))
        }
    }
}
