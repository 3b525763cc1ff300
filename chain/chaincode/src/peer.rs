//! Sibling invocation
//!
//! Cross-chaincode calls go through the host. A transport failure is an
//! `Err`; a reply with a non-200 status is still an `Ok(PeerResponse)`.

use async_trait::async_trait;

use types::errors::InvokeError;
use types::response::PeerResponse;

/// Invokes a named chaincode's entry point through the host runtime.
#[async_trait]
pub trait PeerInvoker: Send + Sync {
    async fn invoke(
        &self,
        service: &str,
        args: Vec<Vec<u8>>,
        channel: &str,
    ) -> Result<PeerResponse, InvokeError>;
}
