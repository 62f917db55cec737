//! Principals passed explicitly through every operation.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identifier of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wraps an existing account UUID.
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh time-ordered identifier.
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the wrapped UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// An authenticated principal.
///
/// Anonymous callers are represented by `None` wherever a `User` is
/// expected; there is no ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier.
    pub id: UserId,
    /// Preferred locale tag such as `de-DE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl User {
    /// Creates a principal without a locale preference.
    pub fn new(id: UserId) -> Self {
        Self { id, locale: None }
    }

    /// Sets the preferred locale.
    ///
    /// Underscore-separated tags (`pt_BR`) are normalized to `pt-BR`.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into().replace('_', "-"));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_normalization() {
        let user = User::new(UserId::new_v7()).with_locale("pt_BR");
        assert_eq!(user.locale.as_deref(), Some("pt-BR"));
    }

    #[test]
    fn test_user_id_serde_transparent() {
        let id = UserId::new(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }
}
