//! Backing resources.
//!
//! Transports that talk to an external store (for example a Redis pool)
//! expose it through [`ResourcePool`]. A resource is released by dropping it.

use async_trait::async_trait;

/// A pool of resources that can be acquired and released
#[async_trait]
pub trait ResourcePool: Send + Sync {
    /// Acquired resource; returned to the pool on drop
    type Resource: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Acquire a resource, waiting for one to become available
    async fn acquire(&self) -> Result<Self::Resource, Self::Error>;

    /// Check that a resource can be acquired
    async fn health_check(&self) -> Result<(), Self::Error> {
        let _resource = self.acquire().await?;
        Ok(())
    }
}
