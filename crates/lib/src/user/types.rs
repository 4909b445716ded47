//! Core data types for the user directory

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::Permissions;

/// A user account as stored by a repository.
///
/// Records are created by the persistence layer and loaded on demand. The
/// administrative commands edit the permission model in place and hand the
/// same instance back to [`UserRepository::update`](crate::backend::UserRepository::update).
///
/// A record loaded from an older store may carry no permission model at all.
/// Such a record reads as "no model" when displayed and as an all-zero model
/// once edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    id: Uuid,

    /// Unique username (lookup key)
    pub username: String,

    /// Permission and flag masks
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl UserRecord {
    /// Create a record with a fresh random id and an all-zero permission model.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username, Some(Permissions::default()))
    }

    /// Create a record with an explicit id, used when loading from storage.
    pub fn with_id(
        id: Uuid,
        username: impl Into<String>,
        permissions: Option<Permissions>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            permissions,
        }
    }

    /// The record's immutable identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The permission model, materializing an all-zero one if it is missing.
    pub fn permissions_mut(&mut self) -> &mut Permissions {
        self.permissions.get_or_insert_with(Permissions::default)
    }

    /// Display adapter for the permission model that renders a missing model as `none`.
    pub fn permissions_display(&self) -> PermissionsDisplay<'_> {
        PermissionsDisplay(self.permissions.as_ref())
    }
}

/// See [`UserRecord::permissions_display`].
pub struct PermissionsDisplay<'a>(Option<&'a Permissions>);

impl fmt::Display for PermissionsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(perms) => fmt::Display::fmt(perms, f),
            None => f.write_str("none"),
        }
    }
}
