use async_trait::async_trait;

use crate::application::ports::health_repository::HealthRepository;
use crate::infrastructure::db::PgPool;

pub struct SqlxHealthRepository {
    pub pool: PgPool,
}

impl SqlxHealthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthRepository for SqlxHealthRepository {
    async fn readiness(&self) -> anyhow::Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
