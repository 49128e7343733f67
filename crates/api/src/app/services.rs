//! Service wiring: one storage backend shared by the catalog, ledger and
//! account services.

use std::sync::Arc;

use tracing::{info, warn};

use stockroom_auth::TokenIssuer;
use stockroom_infra::store::{Backend, InMemoryStore, SqliteStore, StoreError};
use stockroom_infra::{AccountService, AppConfig, CatalogService, StockLedger, StoreConfig};

pub struct AppServices {
    pub catalog: CatalogService<dyn Backend>,
    pub ledger: StockLedger<dyn Backend>,
    pub accounts: Arc<AccountService<dyn Backend>>,
}

impl AppServices {
    pub fn from_backend(backend: Arc<dyn Backend>, config: &AppConfig) -> Self {
        let issuer = TokenIssuer::new(config.jwt_secret.as_bytes(), config.session_ttl);
        Self {
            catalog: CatalogService::new(Arc::clone(&backend)),
            ledger: StockLedger::with_max_attempts(Arc::clone(&backend), config.ledger_max_attempts),
            accounts: Arc::new(AccountService::new(backend, issuer)),
        }
    }
}

pub async fn build_backend(store: &StoreConfig) -> Result<Arc<dyn Backend>, StoreError> {
    let backend: Arc<dyn Backend> = match store {
        StoreConfig::InMemory => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Arc::new(InMemoryStore::new())
        }
        StoreConfig::Sqlite {
            url,
            max_connections,
        } => {
            let store = SqliteStore::connect(url, *max_connections).await?;
            info!(max_connections = *max_connections, "sqlite store ready");
            Arc::new(store)
        }
    };
    Ok(backend)
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let backend = build_backend(&config.store).await?;
    Ok(AppServices::from_backend(backend, config))
}
