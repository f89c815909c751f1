use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    config::Config,
    services::reconciliation::{PgReconciliationSource, ReconciliationSource},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub reconciliation: Arc<dyn ReconciliationSource>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let reconciliation = Arc::new(PgReconciliationSource::new(pool.clone()));
        Self {
            pool,
            config,
            reconciliation,
        }
    }
}
