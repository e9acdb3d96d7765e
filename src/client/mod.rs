//! # Status client: transport seam, classification and retry policy.
//!
//! - [`Transport`] issues one raw status request (HTTP implementation: [`HttpTransport`]).
//! - [`classify`] maps a raw response to a [`CheckOutcome`].
//! - [`StatusClient`] runs one logical check: jitter, credential, request,
//!   classification, bounded retries with backoff and credential rotation.

mod outcome;
mod status;
mod transport;

#[cfg(feature = "http")]
mod http;

pub use outcome::{CheckOutcome, ProfileAttributes, TransientKind, classify, parse_profile};
pub use status::{DEFAULT_MAX_RETRIES, StatusClient};
pub use transport::{RawResponse, Transport};

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};
