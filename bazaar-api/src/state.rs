use bazaar_catalog::{InMemoryProductRepository, LedgerSettings, StockLedger};
use bazaar_credit::{CreditService, InMemoryCreditStore};
use bazaar_order::{InMemoryOrderRepository, OrderManager};
use bazaar_store::{
    DbClient, RedisClient, StoreCreditRepository, StoreOrderRepository, StoreProductRepository,
};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct RateLimitConfig {
    pub redis: Arc<RedisClient>,
    pub limit: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: StockLedger,
    pub orders: OrderManager,
    pub credit: CreditService,
    pub auth: Option<AuthConfig>,
    pub rate_limit: Option<RateLimitConfig>,
    pub expose_error_details: bool,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(ledger: StockLedger, orders: OrderManager, credit: CreditService) -> Self {
        Self {
            ledger,
            orders,
            credit,
            auth: None,
            rate_limit: None,
            expose_error_details: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Process-local backends. Nothing survives a restart.
    pub fn in_memory(settings: LedgerSettings) -> Self {
        let credit_store = Arc::new(InMemoryCreditStore::new());
        Self::new(
            StockLedger::new(Arc::new(InMemoryProductRepository::new()), settings),
            OrderManager::new(Arc::new(InMemoryOrderRepository::new())),
            CreditService::new(credit_store.clone(), credit_store),
        )
    }

    pub fn postgres(db: &DbClient, settings: LedgerSettings) -> Self {
        let credit_store = Arc::new(StoreCreditRepository::new(db.pool.clone()));
        Self::new(
            StockLedger::new(Arc::new(StoreProductRepository::new(db.pool.clone())), settings),
            OrderManager::new(Arc::new(StoreOrderRepository::new(db.pool.clone()))),
            CreditService::new(credit_store.clone(), credit_store),
        )
    }

    pub fn with_auth(mut self, secret: impl Into<String>) -> Self {
        self.auth = Some(AuthConfig { secret: secret.into() });
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
