use std::sync::Arc;

use crate::application::ports::health_repository::HealthRepository;

pub struct HealthUseCase {
    repo: Arc<dyn HealthRepository>,
}

impl HealthUseCase {
    pub fn new(repo: Arc<dyn HealthRepository>) -> Self {
        Self { repo }
    }

    pub async fn readiness(&self) -> anyhow::Result<()> {
        self.repo.readiness().await
    }
}
