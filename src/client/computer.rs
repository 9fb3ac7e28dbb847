use async_trait::async_trait;

use super::{ApiClient, ApiError};
use crate::engine::{ComputeRequest, ComputedPosition};

/// Something that can turn a compute request into a position.
#[async_trait]
pub trait PositionComputer: Send + Sync {
    async fn compute(&self, request: ComputeRequest) -> Result<ComputedPosition, ApiError>;
}

#[async_trait]
impl PositionComputer for ApiClient {
    async fn compute(&self, request: ComputeRequest) -> Result<ComputedPosition, ApiError> {
        self.compute_position(&request).await
    }
}

/// Runs the engine in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalComputer;

#[async_trait]
impl PositionComputer for LocalComputer {
    async fn compute(&self, request: ComputeRequest) -> Result<ComputedPosition, ApiError> {
        Ok(request.compute()?)
    }
}
