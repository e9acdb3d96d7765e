//! # Shared credential pool.
//!
//! Every polling task draws its request credential from one [`CredentialPool`].
//! A credential that triggered a rate-limit or auth failure is shed by
//! rotating the pool cursor; rotation is a single atomic increment-and-wrap so
//! concurrent tasks never lose or duplicate an advance.

mod pool;

pub use pool::{Credential, CredentialPool};
