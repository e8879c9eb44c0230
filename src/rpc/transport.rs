//! The seam between the typed client and the wire.

use async_trait::async_trait;
use serde_json::Value;

use super::error::RpcResult;
use super::protocol::ResponseEnvelope;

/// Delivers one call to the report server and returns its envelope.
///
/// `method` is already fully qualified. Implementations return
/// `Ok` for any well-formed envelope, including `success: false`; the
/// client turns that into [`RpcError::Remote`](super::RpcError::Remote).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> RpcResult<ResponseEnvelope>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
