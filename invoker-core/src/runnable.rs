use async_trait::async_trait;

use crate::InvokerError;

/// An async unit of work from `Input` to `Output`.
///
/// Agents, model clients and the request handler's collaborators all meet at
/// this seam, so a test double only has to implement `invoke`.
#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, InvokerError>;
}
