//! Store wiring shared by every request.

use std::sync::Arc;

use tracing::{info, warn};

use roster_auth::{CredentialStore, OwnershipLookup};
use roster_core::InfrastructureError;
use roster_infra::{EmployeeStore, InMemoryCredentialStore, InMemoryEmployeeStore, PostgresStore};

use crate::config::AppConfig;

/// The three store seams the handlers and middleware depend on.
///
/// Each backend fills all three from one underlying store.
#[derive(Clone)]
pub struct AppServices {
    pub employees: Arc<dyn EmployeeStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub ownership: Arc<dyn OwnershipLookup>,
}

impl AppServices {
    pub fn in_memory(
        employees: InMemoryEmployeeStore,
        credentials: InMemoryCredentialStore,
    ) -> Self {
        let employees = Arc::new(employees);
        Self {
            employees: employees.clone(),
            ownership: employees,
            credentials: Arc::new(credentials),
        }
    }

    pub fn postgres(store: PostgresStore) -> Self {
        let store = Arc::new(store);
        Self {
            employees: store.clone(),
            credentials: store.clone(),
            ownership: store,
        }
    }

    /// Postgres when `DATABASE_URL` is set, otherwise in-memory stores seeded
    /// with the configured API keys.
    pub fn from_config(config: &AppConfig) -> Result<Self, InfrastructureError> {
        if let Some(url) = &config.database_url {
            if !config.api_keys.is_empty() {
                warn!("ROSTER_API_KEYS is ignored when DATABASE_URL is set");
            }
            info!("using postgres stores");
            return Ok(Self::postgres(PostgresStore::connect_lazy(url)?));
        }

        if config.api_keys.is_empty() {
            warn!("no API keys configured; every request will be rejected");
        }
        info!(api_keys = config.api_keys.len(), "using in-memory stores");

        let credentials = InMemoryCredentialStore::with_credentials(
            config
                .api_keys
                .iter()
                .map(|entry| (entry.token.clone(), entry.record.clone())),
        );
        Ok(Self::in_memory(InMemoryEmployeeStore::new(), credentials))
    }
}
