use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::EngineError;

/// Opaque credential token (e.g. a session cookie value).
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wraps a raw token.
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// Raw token, for use by transports only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// Ordered, fixed set of credentials with a shared rotation cursor.
///
/// ### Invariants
/// - The token list never changes after construction.
/// - `cursor` is always in `[0, len)` for a non-empty pool.
/// - Each [`rotate`](Self::rotate) call advances the cursor by exactly one, modulo `len`.
pub struct CredentialPool {
    tokens: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Creates a pool from an ordered token list. Blank tokens are skipped.
    ///
    /// An empty pool can be constructed; [`current`](Self::current) then fails
    /// with [`EngineError::EmptyPool`] and the engine builder refuses it.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Credential::new)
            .collect();
        Self {
            tokens,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the credential under the cursor.
    pub fn current(&self) -> Result<Credential, EngineError> {
        if self.tokens.is_empty() {
            return Err(EngineError::EmptyPool);
        }
        let idx = self.cursor.load(Ordering::Acquire) % self.tokens.len();
        Ok(self.tokens[idx].clone())
    }

    /// Advances the cursor by one (wrapping) and returns the new position.
    ///
    /// A single atomic read-modify-write: concurrent callers each advance the
    /// cursor exactly once. No-op on an empty pool.
    pub fn rotate(&self) -> usize {
        let len = self.tokens.len();
        if len == 0 {
            return 0;
        }
        let prev = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
        {
            Ok(prev) | Err(prev) => prev,
        };
        let next = (prev + 1) % len;
        debug!(position = next + 1, total = len, "rotated credential");
        next
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the pool holds no credentials.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.tokens.len())
            .field("cursor", &self.cursor())
            .finish()
    }
}
