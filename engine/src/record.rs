//! Record types for the user session and the car catalog.

use crate::{error::Result, Error, LocalId, RemoteId, Revision};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The signed-in user, resident locally while a session is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier assigned by the local store on creation
    pub local_id: LocalId,
    /// Identifier assigned by the server
    pub remote_id: RemoteId,
    pub email: String,
    pub name: String,
    pub driver_license: String,
    pub avatar_uri: String,
    /// Bearer credential issued at sign-in
    pub session_token: String,
    /// Incremented on every local profile edit
    pub revision: Revision,
    /// Highest revision the server has acknowledged
    pub pushed_revision: Revision,
}

impl User {
    /// Create a freshly signed-in user with nothing pending.
    pub fn new(local_id: impl Into<LocalId>, fields: NewUser) -> Self {
        Self {
            local_id: local_id.into(),
            remote_id: fields.remote_id,
            email: fields.email,
            name: fields.name,
            driver_license: fields.driver_license,
            avatar_uri: fields.avatar_uri,
            session_token: fields.session_token,
            revision: 0,
            pushed_revision: 0,
        }
    }

    /// Whether local profile edits have not reached the server yet.
    pub fn has_pending_changes(&self) -> bool {
        self.revision > self.pushed_revision
    }

    /// Record that the server accepted the profile as of `revision`.
    ///
    /// Never lowers the acknowledged revision and never acknowledges a
    /// revision that does not exist yet.
    pub fn mark_pushed(&mut self, revision: Revision) {
        let revision = revision.min(self.revision);
        self.pushed_revision = self.pushed_revision.max(revision);
    }

    /// Check the invariants a resident user must hold.
    pub fn validate(&self) -> Result<()> {
        if self.local_id.is_empty() {
            return Err(Error::InvalidRecord("user local id is empty".into()));
        }
        if self.remote_id.is_empty() {
            return Err(Error::InvalidRecord("user remote id is empty".into()));
        }
        if self.session_token.is_empty() {
            return Err(Error::InvalidRecord(format!(
                "user {} has no session token",
                self.local_id
            )));
        }
        if self.pushed_revision > self.revision {
            return Err(Error::InvalidRecord(format!(
                "user {} acknowledged revision {} ahead of {}",
                self.local_id, self.pushed_revision, self.revision
            )));
        }
        Ok(())
    }
}

/// Fields needed to create a user at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub remote_id: RemoteId,
    pub email: String,
    pub name: String,
    pub driver_license: String,
    pub avatar_uri: String,
    pub session_token: String,
}

impl NewUser {
    pub fn new(
        remote_id: impl Into<RemoteId>,
        email: impl Into<String>,
        name: impl Into<String>,
        driver_license: impl Into<String>,
        avatar_uri: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            email: email.into(),
            name: name.into(),
            driver_license: driver_license.into(),
            avatar_uri: avatar_uri.into(),
            session_token: session_token.into(),
        }
    }
}

/// A partial edit of the editable profile fields.
///
/// Email and identifiers are fixed for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub driver_license: Option<String>,
    pub avatar_uri: Option<String>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn driver_license(mut self, driver_license: impl Into<String>) -> Self {
        self.driver_license = Some(driver_license.into());
        self
    }

    pub fn avatar_uri(mut self, avatar_uri: impl Into<String>) -> Self {
        self.avatar_uri = Some(avatar_uri.into());
        self
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.driver_license.is_none() && self.avatar_uri.is_none()
    }

    /// Write the present fields into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(driver_license) = &self.driver_license {
            user.driver_license = driver_license.clone();
        }
        if let Some(avatar_uri) = &self.avatar_uri {
            user.avatar_uri = avatar_uri.clone();
        }
    }
}

/// A car image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub uri: String,
}

impl Photo {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }
}

/// A car feature such as fuel type or seat count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Accessory {
    /// Accessory kind, used by the UI to pick an icon
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

impl Accessory {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// A car in the catalog. Mirrors the server; never edited locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub remote_id: RemoteId,
    pub brand: String,
    pub name: String,
    pub about: Option<String>,
    pub fuel_type: Option<String>,
    /// Rental price for one `period`
    pub daily_rate: u64,
    pub period: String,
    pub thumbnail_uri: String,
    pub photos: Option<Vec<Photo>>,
    pub accessories: Option<BTreeSet<Accessory>>,
}

impl Car {
    pub fn new(
        remote_id: impl Into<RemoteId>,
        brand: impl Into<String>,
        name: impl Into<String>,
        daily_rate: u64,
        period: impl Into<String>,
        thumbnail_uri: impl Into<String>,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            brand: brand.into(),
            name: name.into(),
            about: None,
            fuel_type: None,
            daily_rate,
            period: period.into(),
            thumbnail_uri: thumbnail_uri.into(),
            photos: None,
            accessories: None,
        }
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn with_fuel_type(mut self, fuel_type: impl Into<String>) -> Self {
        self.fuel_type = Some(fuel_type.into());
        self
    }

    pub fn with_photos(mut self, photos: Vec<Photo>) -> Self {
        self.photos = Some(photos);
        self
    }

    pub fn with_accessories(mut self, accessories: impl IntoIterator<Item = Accessory>) -> Self {
        self.accessories = Some(accessories.into_iter().collect());
        self
    }

    /// Check that the record can be stored.
    pub fn validate(&self) -> Result<()> {
        if self.remote_id.is_empty() {
            return Err(Error::InvalidRecord(format!(
                "car '{}' has an empty id",
                self.name
            )));
        }
        Ok(())
    }
}
