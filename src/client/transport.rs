//! # Transport seam for status requests.
//!
//! The [`Transport`] trait issues exactly one status request for an entity
//! using a given credential. Proxying, header fabrication and user-agent
//! rotation are transport-internal; the status client only sees a
//! [`RawResponse`] or a [`TransportError`].

use async_trait::async_trait;

use crate::credentials::Credential;
use crate::entity::EntityId;
use crate::error::TransportError;

/// HTTP status and raw body of one status request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body (may be empty).
    pub body: String,
}

impl RawResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues one status request.
///
/// Implementations must not retry internally; the status client owns the
/// retry policy. The client also wraps every call in its own timeout.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Requests the status of `entity` authenticated with `credential`.
    async fn issue_status_request(
        &self,
        entity: &EntityId,
        credential: &Credential,
    ) -> Result<RawResponse, TransportError>;
}
