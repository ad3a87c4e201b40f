//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServiceConfig;
use crate::services::CustomerService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Arc<ServiceConfig>,
    pool: PgPool,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration, shared with the event consumer
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: Arc<ServiceConfig>, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Customer operations bound to this state's pool and loan policy.
    #[must_use]
    pub fn customers(&self) -> CustomerService<'_> {
        CustomerService::new(self.pool(), self.config().loans.default_limit)
    }
}
