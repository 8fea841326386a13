use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Roles;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub roles: Arc<Roles>,
}

impl AppState {
    pub fn new(db: PgPool, roles: Roles) -> Self {
        Self {
            db,
            roles: Arc::new(roles),
        }
    }
}
