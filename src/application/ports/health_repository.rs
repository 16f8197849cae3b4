use async_trait::async_trait;

#[async_trait]
pub trait HealthRepository: Send + Sync {
    /// Fails when the backing store is unreachable or unhealthy.
    async fn readiness(&self) -> anyhow::Result<()>;
}
