//! The single-value session slot.
//!
//! A device holds at most one signed-in user. Instead of a general collection
//! that might hold several rows, the slot is either absent or present.

use crate::{error::Result, Error, LocalId, NewUser, Revision, User};
use serde::{Deserialize, Serialize};

/// Either no user, or exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user", rename_all = "lowercase")]
pub enum SessionSlot {
    #[default]
    Absent,
    Present(User),
}

impl SessionSlot {
    /// Get the resident user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionSlot::Absent => None,
            SessionSlot::Present(user) => Some(user),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, SessionSlot::Present(_))
    }

    /// Place a new user in the slot.
    ///
    /// Fails with [`Error::UserAlreadyExists`] if the slot is occupied; the
    /// previous user must be deleted first.
    pub fn create(&mut self, local_id: impl Into<LocalId>, fields: NewUser) -> Result<User> {
        if let SessionSlot::Present(existing) = self {
            return Err(Error::UserAlreadyExists(existing.local_id.clone()));
        }

        let user = User::new(local_id, fields);
        user.validate()?;
        *self = SessionSlot::Present(user.clone());
        Ok(user)
    }

    /// Apply `mutator` to the resident user and bump its revision.
    ///
    /// The mutator may not change the local id. On any error the slot is
    /// left as it was.
    pub fn update<F>(&mut self, id: &str, mutator: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        let current = self.resident(id)?;

        let mut next = current.clone();
        mutator(&mut next);
        if next.local_id != current.local_id {
            return Err(Error::InvalidRecord(format!(
                "user {} cannot change its local id",
                current.local_id
            )));
        }
        next.revision = current.revision + 1;
        next.pushed_revision = current.pushed_revision;
        next.validate()?;

        *self = SessionSlot::Present(next.clone());
        Ok(next)
    }

    /// Acknowledge that `revision` of the resident user reached the server.
    pub fn mark_pushed(&mut self, id: &str, revision: Revision) -> Result<User> {
        self.resident(id)?;
        match self {
            SessionSlot::Present(user) => {
                user.mark_pushed(revision);
                Ok(user.clone())
            }
            SessionSlot::Absent => Err(Error::UserNotFound(id.to_string())),
        }
    }

    /// Remove the resident user permanently.
    pub fn delete(&mut self, id: &str) -> Result<User> {
        self.resident(id)?;
        match std::mem::take(self) {
            SessionSlot::Present(user) => Ok(user),
            SessionSlot::Absent => Err(Error::UserNotFound(id.to_string())),
        }
    }

    fn resident(&self, id: &str) -> Result<&User> {
        self.user()
            .filter(|user| user.local_id == id)
            .ok_or_else(|| Error::UserNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(token: &str) -> NewUser {
        NewUser::new("u1", "a@b.com", "Ana", "DL1", "", token)
    }

    #[test]
    fn starts_absent() {
        let slot = SessionSlot::default();
        assert!(!slot.is_present());
        assert!(slot.user().is_none());
    }

    #[test]
    fn create_then_create_again_conflicts() {
        let mut slot = SessionSlot::default();
        slot.create("local-1", fields("T1")).unwrap();

        let result = slot.create("local-2", fields("T2"));
        assert_eq!(result, Err(Error::UserAlreadyExists("local-1".into())));
        assert_eq!(slot.user().unwrap().session_token, "T1");
    }

    #[test]
    fn create_rejects_missing_token() {
        let mut slot = SessionSlot::default();
        let result = slot.create("local-1", fields(""));
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
        assert!(!slot.is_present());
    }

    #[test]
    fn update_bumps_revision() {
        let mut slot = SessionSlot::default();
        slot.create("local-1", fields("T1")).unwrap();

        let user = slot.update("local-1", |u| u.name = "Ana Maria".into()).unwrap();
        assert_eq!(user.revision, 1);
        assert!(user.has_pending_changes());
        assert_eq!(slot.user().unwrap().name, "Ana Maria");
    }

    #[test]
    fn update_with_wrong_id_is_not_found() {
        let mut slot = SessionSlot::default();
        slot.create("local-1", fields("T1")).unwrap();

        let result = slot.update("other", |u| u.name = "X".into());
        assert_eq!(result, Err(Error::UserNotFound("other".into())));
        assert_eq!(slot.user().unwrap().name, "Ana");
    }

    #[test]
    fn update_cannot_rewrite_identity() {
        let mut slot = SessionSlot::default();
        slot.create("local-1", fields("T1")).unwrap();

        let result = slot.update("local-1", |u| u.local_id = "hijack".into());
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
        assert_eq!(slot.user().unwrap().local_id, "local-1");
        assert_eq!(slot.user().unwrap().revision, 0);
    }

    #[test]
    fn delete_empties_slot() {
        let mut slot = SessionSlot::default();
        slot.create("local-1", fields("T1")).unwrap();

        let removed = slot.delete("local-1").unwrap();
        assert_eq!(removed.remote_id, "u1");
        assert!(!slot.is_present());

        assert_eq!(
            slot.delete("local-1"),
            Err(Error::UserNotFound("local-1".into()))
        );
    }

    #[test]
    fn mark_pushed_on_absent_slot() {
        let mut slot = SessionSlot::default();
        assert_eq!(
            slot.mark_pushed("local-1", 1),
            Err(Error::UserNotFound("local-1".into()))
        );
    }
}
