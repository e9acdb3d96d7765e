//! # Tracked entity identifiers.
//!
//! [`EntityId`] is the case-insensitive key of a tracked account. Its canonical
//! form is lower-case; two ids that differ only in case are the same entity.
//! [`Destination`] is an opaque routing token telling the notification sink
//! where a recovery notice should go.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

static PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:www\.)?(?:instagram|ig)\.com/([A-Za-z0-9._]+)/?(?:[?#].*)?$")
        .expect("static regex")
});

static VALID_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]+$").expect("static regex"));

/// Normalized, case-insensitive identifier of a tracked entity.
///
/// Cheap to clone (`Arc<str>` inside).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(Arc<str>);

impl EntityId {
    /// Parses a user-supplied id.
    ///
    /// Accepts `name`, `@name` and profile URLs (`instagram.com/name`,
    /// `ig.com/name`), trims whitespace and lower-cases. Returns `None` when
    /// nothing valid remains.
    ///
    /// ```
    /// use recoverwatch::EntityId;
    ///
    /// let id = EntityId::parse(" @Some.User ").unwrap();
    /// assert_eq!(id.as_str(), "some.user");
    /// assert_eq!(EntityId::parse("https://instagram.com/Some.User/"), Some(id));
    /// assert!(EntityId::parse("@").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let name = match PROFILE_URL.captures(raw) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
            None => raw.trim_start_matches('@'),
        };
        let canonical = name.to_lowercase();
        if canonical.is_empty() || !VALID_ID.is_match(&canonical) {
            return None;
        }
        Some(Self(Arc::from(canonical)))
    }

    /// Canonical (lower-case) form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw id reported by a remote.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EntityId::parse(&value).ok_or_else(|| format!("invalid entity id: {value:?}"))
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0.to_string()
    }
}

/// Opaque routing token for recovery notifications (a chat id, a webhook key...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Destination(Arc<str>);

impl Destination {
    /// Wraps a routing token.
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// Raw routing token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Destination {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Destination {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Destination> for String {
    fn from(value: Destination) -> Self {
        value.0.to_string()
    }
}

impl From<i64> for Destination {
    fn from(value: i64) -> Self {
        Self::new(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_prefixes() {
        let a = EntityId::parse("Foo_Bar").unwrap();
        let b = EntityId::parse("@foo_bar").unwrap();
        let c = EntityId::parse("ig.com/FOO_BAR").unwrap();
        let d = EntityId::parse("https://www.instagram.com/foo_bar/?hl=en").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
        assert_eq!(a.as_str(), "foo_bar");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(EntityId::parse("").is_none());
        assert!(EntityId::parse("   ").is_none());
        assert!(EntityId::parse("foo bar").is_none());
        assert!(EntityId::parse("foo/bar").is_none());
    }

    #[test]
    fn matches_is_case_insensitive() {
        let id = EntityId::parse("foo").unwrap();
        assert!(id.matches("FOO"));
        assert!(!id.matches("foo2"));
    }

    #[test]
    fn serde_uses_canonical_form() {
        let id: EntityId = serde_json::from_str("\"@Foo\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"foo\"");
        assert!(serde_json::from_str::<EntityId>("\"no way\"").is_err());
    }

    #[test]
    fn destination_serializes_as_plain_string() {
        let dest = Destination::from(-100_123_i64);
        let json = serde_json::to_string(&dest).unwrap();
        assert_eq!(json, "\"-100123\"");
        let back: Destination = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dest);
    }
}
