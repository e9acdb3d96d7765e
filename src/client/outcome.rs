//! # Classification of one status check.
//!
//! [`classify`] turns the raw result of a transport call into a [`CheckOutcome`]:
//!
//! ```text
//! transport timeout             → Timeout
//! transport error               → TransientError(Transport)
//! 200 + user with matching id   → Active(attributes)
//! 200 + mismatch / no user      → Suspended
//! 200 + undecodable body        → Suspended
//! 404                           → Suspended
//! 429                           → RateLimited
//! 400 / 401                     → AuthError
//! anything else                 → TransientError(Status)
//! ```

use serde::{Deserialize, Serialize};

use crate::client::transport::RawResponse;
use crate::entity::EntityId;
use crate::error::TransportError;

/// Profile data collected from an active entity. Every field defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    /// Username as reported by the remote (original case).
    pub username: String,
    /// Follower count.
    pub follower_count: u64,
    /// Following count.
    pub following_count: u64,
    /// Number of posts.
    pub post_count: u64,
    /// Display name.
    pub display_name: String,
    /// Bio text.
    pub biography: String,
    /// Verification flag.
    pub is_verified: bool,
    /// Profile picture reference (HD when available).
    pub profile_pic_url: Option<String>,
}

/// Why a check failed transiently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransientKind {
    /// Transport-level failure (connection reset, DNS, TLS...).
    Transport(TransportError),
    /// Unexpected HTTP status.
    Status(u16),
    /// Anything else that went wrong (panicking transport, missing credential).
    Unclassified(String),
}

/// Result of one logical status check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The entity is active again.
    ///
    /// A single response classified as active is trusted as-is (no
    /// corroborating second check): notification latency is favored over
    /// false-positive avoidance.
    Active(ProfileAttributes),
    /// The entity is still suspended (steady state, not an error).
    Suspended,
    /// Transient failure, retried with backoff.
    TransientError(TransientKind),
    /// HTTP 429: retried after rotating the credential.
    RateLimited,
    /// HTTP 400/401: retried after rotating the credential.
    AuthError,
    /// The request timed out: retried with backoff.
    Timeout,
}

impl CheckOutcome {
    /// True for [`CheckOutcome::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, CheckOutcome::Active(_))
    }

    /// Outcomes that the status client retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckOutcome::RateLimited
                | CheckOutcome::AuthError
                | CheckOutcome::Timeout
                | CheckOutcome::TransientError(_)
        )
    }

    /// Outcomes that mark the current credential as tainted (rotate before retrying).
    pub fn taints_credential(&self) -> bool {
        matches!(self, CheckOutcome::RateLimited | CheckOutcome::AuthError)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CheckOutcome::Active(_) => "active",
            CheckOutcome::Suspended => "suspended",
            CheckOutcome::TransientError(_) => "transient_error",
            CheckOutcome::RateLimited => "rate_limited",
            CheckOutcome::AuthError => "auth_error",
            CheckOutcome::Timeout => "timeout",
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<EnvelopeData>,
}

#[derive(Deserialize)]
struct EnvelopeData {
    user: Option<UserPayload>,
}

#[derive(Deserialize)]
struct Counter {
    count: Option<u64>,
}

#[derive(Deserialize)]
struct UserPayload {
    username: Option<String>,
    full_name: Option<String>,
    biography: Option<String>,
    is_verified: Option<bool>,
    profile_pic_url: Option<String>,
    profile_pic_url_hd: Option<String>,
    edge_followed_by: Option<Counter>,
    edge_follow: Option<Counter>,
    edge_owner_to_timeline_media: Option<Counter>,
}

fn count(c: Option<Counter>) -> u64 {
    c.and_then(|c| c.count).unwrap_or(0)
}

impl From<UserPayload> for ProfileAttributes {
    fn from(u: UserPayload) -> Self {
        Self {
            username: u.username.unwrap_or_default(),
            follower_count: count(u.edge_followed_by),
            following_count: count(u.edge_follow),
            post_count: count(u.edge_owner_to_timeline_media),
            display_name: u.full_name.unwrap_or_default(),
            biography: u.biography.unwrap_or_default(),
            is_verified: u.is_verified.unwrap_or(false),
            profile_pic_url: u
                .profile_pic_url_hd
                .filter(|s| !s.is_empty())
                .or(u.profile_pic_url.filter(|s| !s.is_empty())),
        }
    }
}

/// Extracts profile attributes from a 200 payload, if it carries user data
/// for `requested`.
pub fn parse_profile(requested: &EntityId, body: &str) -> Option<ProfileAttributes> {
    let envelope: Envelope = serde_json::from_str(body).ok()?;
    let user = envelope.data?.user?;
    let attrs = ProfileAttributes::from(user);
    requested.matches(&attrs.username).then_some(attrs)
}

/// Classifies the result of one transport call for `requested`.
pub fn classify(
    requested: &EntityId,
    result: Result<RawResponse, TransportError>,
) -> CheckOutcome {
    let resp = match result {
        Ok(resp) => resp,
        Err(TransportError::Timeout) => return CheckOutcome::Timeout,
        Err(e) => return CheckOutcome::TransientError(TransientKind::Transport(e)),
    };

    match resp.status {
        200 => match parse_profile(requested, &resp.body) {
            Some(attrs) => CheckOutcome::Active(attrs),
            None => CheckOutcome::Suspended,
        },
        404 => CheckOutcome::Suspended,
        429 => CheckOutcome::RateLimited,
        400 | 401 => CheckOutcome::AuthError,
        other => CheckOutcome::TransientError(TransientKind::Status(other)),
    }
}
